//! Runtime configuration

use serde::{Deserialize, Serialize};

/// How bank statement files are read
///
/// Every logical field lists the header names to try, in priority order.
/// Header names match exactly and case-sensitively.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImporterConfig {
    pub delimiter: char,
    pub booking_date_columns: Vec<String>,
    pub value_date_columns: Vec<String>,
    pub amount_columns: Vec<String>,
    pub balance_columns: Vec<String>,
    pub purpose_columns: Vec<String>,
    pub counterparty_name_columns: Vec<String>,
    pub counterparty_iban_columns: Vec<String>,
    /// `chrono` format strings, tried in order; date-time formats are cut to the date
    pub date_formats: Vec<String>,
}

fn owned(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

impl Default for ImporterConfig {
    fn default() -> Self {
        Self {
            delimiter: ';',
            booking_date_columns: owned(&["Buchungstag", "Buchung"]),
            value_date_columns: owned(&["Wertstellung", "Valuta"]),
            amount_columns: owned(&["Betrag", "Umsatz"]),
            balance_columns: owned(&["Saldo", "Kontostand"]),
            purpose_columns: owned(&["Verwendungszweck"]),
            counterparty_name_columns: owned(&["Name", "Begünstigter/Zahlungspflichtiger"]),
            counterparty_iban_columns: owned(&["IBAN"]),
            date_formats: owned(&[
                "%d.%m.%y",
                "%d.%m.%Y",
                "%Y-%m-%d",
                "%Y.%m.%d",
                "%Y%m%d",
                "%m/%d/%Y",
                "%Y/%m/%d",
                "%d-%m-%Y",
                "%d %B %Y",
                "%d %b %Y",
                "%B %d, %Y",
                "%b %d, %Y",
                "%B %d %Y",
                "%b %d %Y",
                "%d.%m.%Y %H:%M:%S",
                "%d.%m.%Y %H:%M",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M:%S",
            ]),
        }
    }
}

/// Administrator account created when the store has none
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialAdmin {
    pub email: String,
    pub password: String,
}

impl Default for InitialAdmin {
    fn default() -> Self {
        Self {
            email: "admin@example.com".to_string(),
            password: "admin123".to_string(),
        }
    }
}

/// Top-level configuration of an association backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AssociationConfig {
    pub importer: ImporterConfig,
    pub initial_admin: InitialAdmin,
}

impl AssociationConfig {
    pub const ADMIN_EMAIL_VAR: &'static str = "GARDEN_ADMIN_EMAIL";
    pub const ADMIN_PASSWORD_VAR: &'static str = "GARDEN_ADMIN_PASSWORD";

    /// Defaults, with the initial admin overridable from the environment
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(email) = std::env::var(Self::ADMIN_EMAIL_VAR) {
            config.initial_admin.email = email;
        }
        match std::env::var(Self::ADMIN_PASSWORD_VAR) {
            Ok(password) => config.initial_admin.password = password,
            Err(_) => log::warn!(
                "{} not set, using the default initial admin password",
                Self::ADMIN_PASSWORD_VAR
            ),
        }
        config
    }
}
