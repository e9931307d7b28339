//! Bank statement import
//!
//! Statements are delimited text files with a header row, as exported by
//! German online banking. Column names vary between banks, so every logical
//! field is looked up through an ordered alias list (see [`ImporterConfig`]).
//! Rows that do not have the shape of a transaction (footers, summaries,
//! broken lines) are skipped and the import carries on.

use std::str::FromStr;

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use csv::ReaderBuilder;
use serde::{Deserialize, Serialize};

use crate::config::ImporterConfig;
use crate::traits::*;
use crate::types::*;

/// Why a single statement row was not imported
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RowError {
    #[error("missing required field: {0}")]
    MissingField(&'static str),
    #[error("invalid {field} date '{value}'")]
    InvalidDate { field: &'static str, value: String },
    #[error("invalid {field} amount '{value}'")]
    InvalidAmount { field: &'static str, value: String },
    #[error("unreadable row: {0}")]
    Csv(String),
}

/// A row left out of an import
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SkippedRow {
    /// Line in the file, starting at 1 for the header
    pub line: u64,
    pub reason: String,
}

/// Outcome of an import
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ImportReport {
    pub created: usize,
    pub skipped: Vec<SkippedRow>,
}

/// Rows of one statement file, split into records and rejects
#[derive(Debug, Clone, Default)]
pub struct ParsedStatement {
    pub transactions: Vec<BankTransaction>,
    pub skipped: Vec<SkippedRow>,
}

/// Turn European amount notation into a plain decimal string
///
/// Removes every `.` and then turns `,` into `.`: `"1.234,56"` becomes
/// `"1234.56"`. This is a fixed textual substitution, so dot-decimal input
/// such as `"12.34"` comes out as `"1234"`.
pub fn normalize_amount(raw: &str) -> String {
    raw.trim().replace('.', "").replace(',', ".")
}

/// Parse a European formatted amount to two decimal places
pub fn parse_amount(raw: &str) -> Option<BigDecimal> {
    BigDecimal::from_str(&normalize_amount(raw))
        .ok()
        .map(|amount| amount.round(2))
}

/// Parse a date with the first matching format
pub fn parse_date(raw: &str, formats: &[String]) -> Option<NaiveDate> {
    let raw = raw.trim();
    formats.iter().find_map(|fmt| {
        NaiveDate::parse_from_str(raw, fmt)
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(raw, fmt).ok().map(|dt| dt.date()))
    })
}

/// Decode file bytes as UTF-8, dropping undecodable sequences
pub fn decode_lenient(bytes: &[u8]) -> String {
    let mut text = String::with_capacity(bytes.len());
    for chunk in bytes.utf8_chunks() {
        text.push_str(chunk.valid());
    }
    text
}

/// First non-empty value among the alias columns
fn resolve<'r>(row: &'r RawRow, aliases: &[String]) -> Option<&'r str> {
    aliases
        .iter()
        .filter_map(|alias| row.get(alias))
        .find(|value| !value.is_empty())
}

fn required_date(
    row: &RawRow,
    aliases: &[String],
    field: &'static str,
    formats: &[String],
) -> Result<NaiveDate, RowError> {
    let value = resolve(row, aliases).ok_or(RowError::MissingField(field))?;
    parse_date(value, formats).ok_or_else(|| RowError::InvalidDate {
        field,
        value: value.to_string(),
    })
}

fn optional_date(
    row: &RawRow,
    aliases: &[String],
    field: &'static str,
    formats: &[String],
) -> Result<Option<NaiveDate>, RowError> {
    resolve(row, aliases)
        .map(|value| {
            parse_date(value, formats).ok_or_else(|| RowError::InvalidDate {
                field,
                value: value.to_string(),
            })
        })
        .transpose()
}

fn optional_amount(
    row: &RawRow,
    aliases: &[String],
    field: &'static str,
) -> Result<Option<BigDecimal>, RowError> {
    resolve(row, aliases)
        .map(|value| {
            parse_amount(value).ok_or_else(|| RowError::InvalidAmount {
                field,
                value: value.to_string(),
            })
        })
        .transpose()
}

/// Build a transaction from one statement row
pub fn build_transaction(
    row: RawRow,
    filename: &str,
    config: &ImporterConfig,
) -> Result<BankTransaction, RowError> {
    let booking_date = required_date(
        &row,
        &config.booking_date_columns,
        "booking",
        &config.date_formats,
    )?;
    let value_date = optional_date(
        &row,
        &config.value_date_columns,
        "value",
        &config.date_formats,
    )?;
    let amount = optional_amount(&row, &config.amount_columns, "transaction")?
        .ok_or(RowError::MissingField("amount"))?;
    let balance = optional_amount(&row, &config.balance_columns, "balance")?;

    let purpose = resolve(&row, &config.purpose_columns)
        .unwrap_or_default()
        .to_string();
    let counterparty_name = resolve(&row, &config.counterparty_name_columns).map(str::to_string);
    let counterparty_iban = resolve(&row, &config.counterparty_iban_columns).map(str::to_string);

    let mut transaction = BankTransaction::new(booking_date, amount, row, filename);
    transaction.value_date = value_date;
    transaction.balance = balance;
    transaction.purpose = purpose;
    transaction.counterparty_name = counterparty_name;
    transaction.counterparty_iban = counterparty_iban;
    Ok(transaction)
}

/// Parse a whole statement without touching storage
pub fn parse_statement(
    content: &str,
    filename: &str,
    config: &ImporterConfig,
) -> AssociationResult<ParsedStatement> {
    let delimiter = u8::try_from(config.delimiter).map_err(|_| {
        AssociationError::Validation(format!(
            "delimiter '{}' is not a single-byte character",
            config.delimiter
        ))
    })?;

    let content = content.strip_prefix('\u{feff}').unwrap_or(content);
    let mut rdr = ReaderBuilder::new()
        .delimiter(delimiter)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = rdr
        .headers()
        .map_err(|e| AssociationError::Validation(format!("unreadable statement header: {e}")))?
        .clone();

    let mut parsed = ParsedStatement::default();

    for record in rdr.records() {
        let (line, result) = match record {
            Ok(record) => {
                let line = record.position().map(|p| p.line()).unwrap_or_default();
                let fields = record
                    .iter()
                    .enumerate()
                    .map(|(i, value)| {
                        let column = headers.get(i).unwrap_or_default();
                        (column.to_string(), value.to_string())
                    })
                    .collect();
                log::debug!("Parsing statement line {line}");
                (line, build_transaction(RawRow::new(fields), filename, config))
            }
            Err(e) => {
                let line = e.position().map(|p| p.line()).unwrap_or_default();
                (line, Err(RowError::Csv(e.to_string())))
            }
        };

        match result {
            Ok(transaction) => parsed.transactions.push(transaction),
            Err(e) => {
                log::debug!("Skipping statement line {line}: {e}");
                parsed.skipped.push(SkippedRow {
                    line,
                    reason: e.to_string(),
                });
            }
        }
    }

    Ok(parsed)
}

/// Imports bank statements into storage
pub struct StatementImporter<S: AssociationStorage> {
    storage: S,
    config: ImporterConfig,
}

impl<S: AssociationStorage> StatementImporter<S> {
    /// Create an importer for German bank exports
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, ImporterConfig::default())
    }

    pub fn with_config(storage: S, config: ImporterConfig) -> Self {
        Self { storage, config }
    }

    pub fn config(&self) -> &ImporterConfig {
        &self.config
    }

    /// Import a statement and return the number of created transactions
    pub async fn import(&mut self, content: &str, filename: &str) -> AssociationResult<usize> {
        Ok(self.import_with_report(content, filename).await?.created)
    }

    /// Import raw upload bytes, dropping anything that is not valid UTF-8
    pub async fn import_bytes(&mut self, bytes: &[u8], filename: &str) -> AssociationResult<usize> {
        self.import(&decode_lenient(bytes), filename).await
    }

    /// Import a statement and report the rows that were left out
    pub async fn import_with_report(
        &mut self,
        content: &str,
        filename: &str,
    ) -> AssociationResult<ImportReport> {
        let parsed = parse_statement(content, filename, &self.config)?;

        if !parsed.transactions.is_empty() {
            self.storage
                .save_bank_transactions(&parsed.transactions)
                .await?;
        }

        log::info!(
            "Imported {} transactions from {filename}, skipped {} rows",
            parsed.transactions.len(),
            parsed.skipped.len()
        );

        Ok(ImportReport {
            created: parsed.transactions.len(),
            skipped: parsed.skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn dec(s: &str) -> BigDecimal {
        BigDecimal::from_str(s).unwrap()
    }

    fn config() -> ImporterConfig {
        ImporterConfig::default()
    }

    #[test]
    fn test_normalize_amount() {
        assert_eq!(normalize_amount("12,34"), "12.34");
        assert_eq!(normalize_amount("1.234,56"), "1234.56");
        assert_eq!(normalize_amount("-1.000.000,00"), "-1000000.00");
        assert_eq!(normalize_amount("12.34"), "1234");
    }

    #[test]
    fn test_parse_amount() {
        assert_eq!(parse_amount("1.234,56"), Some(dec("1234.56")));
        assert_eq!(parse_amount("12,34"), Some(dec("12.34")));
        assert_eq!(parse_amount("0,50"), Some(dec("0.50")));
        assert_eq!(parse_amount(" -45,00 "), Some(dec("-45")));
        assert_eq!(parse_amount("abc"), None);
        assert_eq!(parse_amount(""), None);
    }

    #[test]
    fn test_parse_date_formats() {
        let formats = config().date_formats;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        assert_eq!(parse_date("05.03.2024", &formats), Some(expected));
        assert_eq!(parse_date("05.03.24", &formats), Some(expected));
        assert_eq!(parse_date("2024-03-05", &formats), Some(expected));
        assert_eq!(parse_date("5 March 2024", &formats), Some(expected));
        assert_eq!(parse_date("2024-03-05T10:15:00", &formats), Some(expected));
        assert_eq!(parse_date("Summe", &formats), None);
    }

    #[test]
    fn test_parse_compact_and_dotted_iso_dates() {
        let formats = config().date_formats;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        assert_eq!(parse_date("20240305", &formats), Some(expected));
        assert_eq!(parse_date("2024.03.05", &formats), Some(expected));
    }

    #[test]
    fn test_parse_month_name_first_without_comma() {
        let formats = config().date_formats;
        let expected = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        assert_eq!(parse_date("Mar 5 2024", &formats), Some(expected));
        assert_eq!(parse_date("March 5 2024", &formats), Some(expected));
        assert_eq!(parse_date("Mar 5, 2024", &formats), Some(expected));
    }

    #[test]
    fn test_ambiguous_dates_by_separator() {
        let formats = config().date_formats;
        let fifth_of_march = NaiveDate::from_ymd_opt(2024, 3, 5).unwrap();

        // Dotted dates are day first, slashed dates month first
        assert_eq!(parse_date("5.3.2024", &formats), Some(fifth_of_march));
        assert_eq!(parse_date("03/05/2024", &formats), Some(fifth_of_march));
        assert_eq!(parse_date("12/31/2024", &formats), NaiveDate::from_ymd_opt(2024, 12, 31));
    }

    #[test]
    fn test_decode_lenient_drops_invalid_bytes() {
        let bytes = b"Betrag;Name\n12,00;M\xfcller\n";
        assert_eq!(decode_lenient(bytes), "Betrag;Name\n12,00;Mller\n");
    }

    #[test]
    fn test_row_with_primary_aliases() {
        let content = "Buchungstag;Wertstellung;Betrag;Saldo;Verwendungszweck;Name;IBAN\n\
                       15.01.2024;16.01.2024;1.234,56;5.000,00;Pacht 2024;Erika Gärtner;DE02120300000000202051\n";
        let parsed = parse_statement(content, "jan.csv", &config()).unwrap();

        assert_eq!(parsed.transactions.len(), 1);
        let tx = &parsed.transactions[0];
        assert_eq!(tx.booking_date, NaiveDate::from_ymd_opt(2024, 1, 15).unwrap());
        assert_eq!(tx.value_date, NaiveDate::from_ymd_opt(2024, 1, 16));
        assert_eq!(tx.amount, dec("1234.56"));
        assert_eq!(tx.balance, Some(dec("5000.00")));
        assert_eq!(tx.purpose, "Pacht 2024");
        assert_eq!(tx.counterparty_name.as_deref(), Some("Erika Gärtner"));
        assert_eq!(
            tx.counterparty_iban.as_deref(),
            Some("DE02120300000000202051")
        );
        assert_eq!(tx.import_filename, "jan.csv");
        assert!(!tx.is_matched());
    }

    #[test]
    fn test_row_with_fallback_aliases() {
        let content = "Valuta;Umsatz;Buchung;Kontostand;Begünstigter/Zahlungspflichtiger\n\
                       02.02.2024;-12,34;01.02.2024;987,66;Stadtwerke\n";
        let parsed = parse_statement(content, "feb.csv", &config()).unwrap();

        let tx = &parsed.transactions[0];
        assert_eq!(tx.booking_date, NaiveDate::from_ymd_opt(2024, 2, 1).unwrap());
        assert_eq!(tx.value_date, NaiveDate::from_ymd_opt(2024, 2, 2));
        assert_eq!(tx.amount, dec("-12.34"));
        assert_eq!(tx.balance, Some(dec("987.66")));
        assert_eq!(tx.counterparty_name.as_deref(), Some("Stadtwerke"));
        assert_eq!(tx.purpose, "");
        assert_eq!(tx.counterparty_iban, None);
    }

    #[test]
    fn test_repeated_header_uses_last_cell() {
        let content = "Buchungstag;Name;Betrag;Name\n\
                       04.03.2024;Kontoinhaber;20,00;Erika Gärtner\n";
        let parsed = parse_statement(content, "mar.csv", &config()).unwrap();

        let tx = &parsed.transactions[0];
        assert_eq!(tx.counterparty_name.as_deref(), Some("Erika Gärtner"));
        assert_eq!(tx.raw_data.len(), 4);
    }

    #[test]
    fn test_raw_row_is_kept_verbatim() {
        let content = "Buchungstag;Betrag;Kategorie\n01.03.2024;10,00;Wasser\n";
        let parsed = parse_statement(content, "mar.csv", &config()).unwrap();

        let raw = &parsed.transactions[0].raw_data;
        let columns: Vec<_> = raw.iter().collect();
        assert_eq!(
            columns,
            vec![
                ("Buchungstag", "01.03.2024"),
                ("Betrag", "10,00"),
                ("Kategorie", "Wasser"),
            ]
        );
    }

    #[test]
    fn test_empty_primary_alias_falls_through() {
        let content = "Buchungstag;Buchung;Betrag\n;03.04.2024;1,00\n";
        let parsed = parse_statement(content, "apr.csv", &config()).unwrap();
        assert_eq!(
            parsed.transactions[0].booking_date,
            NaiveDate::from_ymd_opt(2024, 4, 3).unwrap()
        );
    }

    #[test]
    fn test_bad_rows_are_skipped() {
        let content = "Buchungstag;Wertstellung;Betrag\n\
                       kein Datum;;5,00\n\
                       01.05.2024;;\n\
                       01.05.2024;irgendwann;5,00\n\
                       01.05.2024;;fünf\n\
                       02.05.2024;;7,50\n\
                       Summe;;12,50\n";
        let parsed = parse_statement(content, "may.csv", &config()).unwrap();

        assert_eq!(parsed.transactions.len(), 1);
        assert_eq!(parsed.transactions[0].amount, dec("7.50"));
        assert_eq!(parsed.transactions[0].value_date, None);

        let lines: Vec<u64> = parsed.skipped.iter().map(|s| s.line).collect();
        assert_eq!(lines, vec![2, 3, 4, 5, 7]);
        assert!(parsed.skipped[1].reason.contains("amount"));
    }

    #[test]
    fn test_non_ascii_delimiter_rejected() {
        let config = ImporterConfig {
            delimiter: '§',
            ..ImporterConfig::default()
        };
        assert!(parse_statement("Betrag\n", "x.csv", &config).is_err());
    }

    #[tokio::test]
    async fn test_import_commits_successful_rows() {
        let storage = MemoryStorage::new();
        let mut importer = StatementImporter::new(storage.clone());

        let content = "Buchungstag;Betrag\n01.06.2024;10,00\nFooter\n02.06.2024;20,00\n";
        let report = importer
            .import_with_report(content, "jun.csv")
            .await
            .unwrap();

        assert_eq!(report.created, 2);
        assert_eq!(report.skipped.len(), 1);
        assert_eq!(storage.bank_transaction_count(), 2);
    }

    #[tokio::test]
    async fn test_header_only_file_imports_nothing() {
        let storage = MemoryStorage::new();
        let mut importer = StatementImporter::new(storage.clone());

        let created = importer
            .import("Buchungstag;Betrag;Saldo\n", "empty.csv")
            .await
            .unwrap();

        assert_eq!(created, 0);
        assert_eq!(storage.bank_transaction_count(), 0);
    }

    #[tokio::test]
    async fn test_import_bytes_with_bom_and_latin1_noise() {
        let storage = MemoryStorage::new();
        let mut importer = StatementImporter::new(storage.clone());

        let mut bytes = "\u{feff}Buchungstag;Betrag;Name\n".as_bytes().to_vec();
        bytes.extend_from_slice(b"01.07.2024;3,00;B\xe4cker\n");

        let created = importer.import_bytes(&bytes, "jul.csv").await.unwrap();
        assert_eq!(created, 1);
    }
}
