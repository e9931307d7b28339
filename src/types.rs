//! Core types and data structures for the association backend

use bigdecimal::BigDecimal;
use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type MemberId = Uuid;
pub type ParcelId = Uuid;
pub type ContractId = Uuid;
pub type InvoiceId = Uuid;
pub type TransactionId = Uuid;
pub type UserId = Uuid;

/// Lifecycle of a parcel lease
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ContractStatus {
    #[default]
    Active,
    Ended,
    Pending,
}

/// Payment state of an invoice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InvoiceStatus {
    #[default]
    Open,
    Paid,
    Partial,
    /// Cancelled invoices never count towards a member's balance
    Cancelled,
}

/// Direction of a cashbook entry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CashbookKind {
    Income,
    Expense,
}

/// The two roles known to the permission check
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum UserRole {
    Admin,
    #[default]
    Member,
}

fn default_true() -> bool {
    true
}

/// Input for a new member record
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewMember {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub street: Option<String>,
    #[serde(default)]
    pub zip_code: Option<String>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub iban: Option<String>,
    #[serde(default)]
    pub bic: Option<String>,
    #[serde(default)]
    pub member_since: Option<NaiveDate>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl NewMember {
    /// Minimal member with only the required name fields set
    pub fn named(first_name: impl Into<String>, last_name: impl Into<String>) -> Self {
        Self {
            first_name: first_name.into(),
            last_name: last_name.into(),
            email: None,
            phone: None,
            street: None,
            zip_code: None,
            city: None,
            iban: None,
            bic: None,
            member_since: None,
            is_active: true,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// Association member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Member {
    pub id: MemberId,
    pub first_name: String,
    pub last_name: String,
    pub email: Option<String>,
    pub phone: Option<String>,
    pub street: Option<String>,
    pub zip_code: Option<String>,
    pub city: Option<String>,
    pub iban: Option<String>,
    pub bic: Option<String>,
    pub member_since: Option<NaiveDate>,
    pub is_active: bool,
}

impl Member {
    pub fn new(new: NewMember) -> Self {
        Self {
            id: Uuid::new_v4(),
            first_name: new.first_name,
            last_name: new.last_name,
            email: new.email,
            phone: new.phone,
            street: new.street,
            zip_code: new.zip_code,
            city: new.city,
            iban: new.iban,
            bic: new.bic,
            member_since: new.member_since,
            is_active: new.is_active,
        }
    }

    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

/// Input for a new garden parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewParcel {
    pub number: String,
    #[serde(default)]
    pub size_sqm: Option<BigDecimal>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

/// A leasable garden parcel
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Parcel {
    pub id: ParcelId,
    /// Unique parcel number as painted on the gate
    pub number: String,
    pub size_sqm: Option<BigDecimal>,
    pub description: Option<String>,
    pub is_active: bool,
}

impl Parcel {
    pub fn new(new: NewParcel) -> Self {
        Self {
            id: Uuid::new_v4(),
            number: new.number,
            size_sqm: new.size_sqm,
            description: new.description,
            is_active: new.is_active,
        }
    }
}

/// Input for a new lease contract
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewContract {
    pub member_id: MemberId,
    pub parcel_id: ParcelId,
    pub start_date: NaiveDate,
    #[serde(default)]
    pub end_date: Option<NaiveDate>,
    #[serde(default)]
    pub status: ContractStatus,
    pub yearly_rent: BigDecimal,
    #[serde(default)]
    pub yearly_additional: BigDecimal,
}

/// Lease of one parcel to one member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contract {
    pub id: ContractId,
    pub member_id: MemberId,
    pub parcel_id: ParcelId,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub status: ContractStatus,
    pub yearly_rent: BigDecimal,
    /// Water, insurance and other yearly charges on top of the rent
    pub yearly_additional: BigDecimal,
}

impl Contract {
    pub fn new(new: NewContract) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id: new.member_id,
            parcel_id: new.parcel_id,
            start_date: new.start_date,
            end_date: new.end_date,
            status: new.status,
            yearly_rent: new.yearly_rent,
            yearly_additional: new.yearly_additional,
        }
    }

    /// Rent plus additional charges for one year
    pub fn yearly_total(&self) -> BigDecimal {
        &self.yearly_rent + &self.yearly_additional
    }
}

/// Single line of an invoice
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InvoiceItem {
    pub description: String,
    pub amount: BigDecimal,
}

impl InvoiceItem {
    pub fn new(description: impl Into<String>, amount: BigDecimal) -> Self {
        Self {
            description: description.into(),
            amount,
        }
    }
}

/// Invoice issued to a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Invoice {
    pub id: InvoiceId,
    pub member_id: MemberId,
    pub contract_id: Option<ContractId>,
    /// Billing year the invoice covers
    pub year: i32,
    pub invoice_date: NaiveDate,
    pub due_date: Option<NaiveDate>,
    /// Stated total; not recomputed from the items
    pub total_amount: BigDecimal,
    pub status: InvoiceStatus,
    pub items: Vec<InvoiceItem>,
}

impl Invoice {
    pub fn new(
        member_id: MemberId,
        year: i32,
        invoice_date: NaiveDate,
        total_amount: BigDecimal,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            member_id,
            contract_id: None,
            year,
            invoice_date,
            due_date: None,
            total_amount,
            status: InvoiceStatus::Open,
            items: Vec::new(),
        }
    }

    /// Whether the invoice counts towards the member's balance
    pub fn is_billable(&self) -> bool {
        self.status != InvoiceStatus::Cancelled
    }

    pub fn items_total(&self) -> BigDecimal {
        self.items.iter().map(|i| &i.amount).sum()
    }
}

/// One row of the bank statement, normalized
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTransaction {
    pub id: TransactionId,
    pub booking_date: NaiveDate,
    pub value_date: Option<NaiveDate>,
    /// Signed amount, negative for debits
    pub amount: BigDecimal,
    /// Running account balance as printed by the bank
    pub balance: Option<BigDecimal>,
    pub purpose: String,
    pub counterparty_name: Option<String>,
    pub counterparty_iban: Option<String>,
    /// The row exactly as it appeared in the file
    pub raw_data: RawRow,
    pub import_filename: String,
    pub matched_member_id: Option<MemberId>,
    pub matched_invoice_id: Option<InvoiceId>,
}

impl BankTransaction {
    pub fn new(
        booking_date: NaiveDate,
        amount: BigDecimal,
        raw_data: RawRow,
        import_filename: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            booking_date,
            value_date: None,
            amount,
            balance: None,
            purpose: String::new(),
            counterparty_name: None,
            counterparty_iban: None,
            raw_data,
            import_filename: import_filename.into(),
            matched_member_id: None,
            matched_invoice_id: None,
        }
    }

    pub fn is_matched(&self) -> bool {
        self.matched_member_id.is_some() || self.matched_invoice_id.is_some()
    }
}

/// Ordered column name to raw value capture of an imported row
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawRow(Vec<(String, String)>);

impl RawRow {
    pub fn new(fields: Vec<(String, String)>) -> Self {
        Self(fields)
    }

    /// Value of the column with exactly this name; a repeated header yields its last cell
    pub fn get(&self, column: &str) -> Option<&str> {
        self.0
            .iter()
            .rfind(|(name, _)| name == column)
            .map(|(_, value)| value.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Manual assignment of a bank transaction to a member and/or invoice
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchLink {
    pub member_id: Option<MemberId>,
    pub invoice_id: Option<InvoiceId>,
}

/// Input for a manual cashbook entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCashbookEntry {
    pub date: NaiveDate,
    pub kind: CashbookKind,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    pub amount: BigDecimal,
    #[serde(default)]
    pub invoice_id: Option<InvoiceId>,
}

/// Cash movement recorded by hand
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashbookEntry {
    pub id: Uuid,
    pub date: NaiveDate,
    pub kind: CashbookKind,
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: BigDecimal,
    pub invoice_id: Option<InvoiceId>,
}

impl CashbookEntry {
    pub fn new(new: NewCashbookEntry) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: new.date,
            kind: new.kind,
            category: new.category,
            description: new.description,
            amount: new.amount,
            invoice_id: new.invoice_id,
        }
    }

    /// Amount with the sign of the cash movement
    pub fn signed_amount(&self) -> BigDecimal {
        match self.kind {
            CashbookKind::Income => self.amount.clone(),
            CashbookKind::Expense => -self.amount.clone(),
        }
    }
}

/// Login account, either an administrator or a member of the portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub email: String,
    /// `salt$hex(sha256(salt || password))`
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: UserRole,
    pub member_id: Option<MemberId>,
}

impl User {
    pub fn new(
        email: impl Into<String>,
        password_hash: String,
        role: UserRole,
        member_id: Option<MemberId>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            email: email.into(),
            password_hash,
            role,
            member_id,
        }
    }

    pub fn is_admin(&self) -> bool {
        self.role == UserRole::Admin
    }
}

/// Input for a calendar event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub title: String,
    pub start: NaiveDateTime,
    #[serde(default)]
    pub end: Option<NaiveDateTime>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub is_public: bool,
}

/// Association event shown in the portal calendar
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: Option<NaiveDateTime>,
    pub description: Option<String>,
    pub is_public: bool,
}

impl CalendarEvent {
    pub fn new(new: NewCalendarEvent) -> Self {
        Self {
            id: Uuid::new_v4(),
            title: new.title,
            start: new.start,
            end: new.end,
            description: new.description,
            is_public: new.is_public,
        }
    }
}

/// A member's parcel as shown in the portal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberParcel {
    pub contract_id: ContractId,
    pub parcel_id: ParcelId,
    pub parcel_number: String,
    pub size_sqm: Option<BigDecimal>,
    pub status: ContractStatus,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub yearly_rent: BigDecimal,
    pub yearly_additional: BigDecimal,
}

/// Net financial position of a member
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MemberBalance {
    /// Payments minus invoices; negative means the member owes money
    pub balance: BigDecimal,
    pub total_invoices: BigDecimal,
    pub total_payments: BigDecimal,
}

/// Errors that can occur in the association backend
#[derive(Debug, thiserror::Error)]
pub enum AssociationError {
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("Member not found: {0}")]
    MemberNotFound(String),
    #[error("Parcel not found: {0}")]
    ParcelNotFound(String),
    #[error("Contract not found: {0}")]
    ContractNotFound(String),
    #[error("Invoice not found: {0}")]
    InvoiceNotFound(String),
    #[error("Bank transaction not found: {0}")]
    TransactionNotFound(String),
    #[error("Forbidden: {0}")]
    Forbidden(String),
    #[error("Already exists: {0}")]
    AlreadyExists(String),
    #[error("Validation error: {0}")]
    Validation(String),
    #[error("Invalid credentials")]
    InvalidCredentials,
    #[error("Mail delivery failed: {0}")]
    Mail(String),
}

/// Result type for association operations
pub type AssociationResult<T> = Result<T, AssociationError>;
