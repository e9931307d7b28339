//! Traits for storage abstraction and extensibility

use async_trait::async_trait;

use crate::types::*;
use crate::utils::validation;

/// Storage abstraction for the association backend
///
/// This trait allows the core to work with any keyed store (PostgreSQL,
/// SQLite, in-memory, etc.). Implementations are expected to enforce the
/// foreign-key and uniqueness constraints noted on each method and report
/// violations as [`AssociationError`]s.
#[async_trait]
pub trait AssociationStorage: Send + Sync {
    /// Save a member; the email, when set, must be unique
    async fn save_member(&mut self, member: &Member) -> AssociationResult<()>;

    async fn get_member(&self, member_id: &MemberId) -> AssociationResult<Option<Member>>;

    async fn list_members(&self) -> AssociationResult<Vec<Member>>;

    /// Save a parcel; the parcel number must be unique
    async fn save_parcel(&mut self, parcel: &Parcel) -> AssociationResult<()>;

    async fn get_parcel(&self, parcel_id: &ParcelId) -> AssociationResult<Option<Parcel>>;

    async fn list_parcels(&self) -> AssociationResult<Vec<Parcel>>;

    /// Save a contract; member and parcel must exist
    async fn save_contract(&mut self, contract: &Contract) -> AssociationResult<()>;

    async fn get_contract(&self, contract_id: &ContractId) -> AssociationResult<Option<Contract>>;

    async fn list_contracts(&self, member_id: Option<MemberId>) -> AssociationResult<Vec<Contract>>;

    /// Save an invoice together with its items; member and contract must exist
    async fn save_invoice(&mut self, invoice: &Invoice) -> AssociationResult<()>;

    async fn get_invoice(&self, invoice_id: &InvoiceId) -> AssociationResult<Option<Invoice>>;

    async fn list_invoices(&self, member_id: Option<MemberId>) -> AssociationResult<Vec<Invoice>>;

    /// Persist a batch of imported transactions as one unit
    ///
    /// Either every record is stored or none is.
    async fn save_bank_transactions(
        &mut self,
        transactions: &[BankTransaction],
    ) -> AssociationResult<()>;

    async fn get_bank_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> AssociationResult<Option<BankTransaction>>;

    /// List bank transactions, optionally only those matched to a member
    async fn list_bank_transactions(
        &self,
        matched_member_id: Option<MemberId>,
    ) -> AssociationResult<Vec<BankTransaction>>;

    /// Set the match link of a bank transaction
    async fn set_match_link(
        &mut self,
        transaction_id: &TransactionId,
        link: MatchLink,
    ) -> AssociationResult<()>;

    /// Save a cashbook entry; a referenced invoice must exist
    async fn save_cashbook_entry(&mut self, entry: &CashbookEntry) -> AssociationResult<()>;

    async fn list_cashbook_entries(&self) -> AssociationResult<Vec<CashbookEntry>>;

    /// Save a user; the email must be unique
    async fn save_user(&mut self, user: &User) -> AssociationResult<()>;

    async fn get_user_by_email(&self, email: &str) -> AssociationResult<Option<User>>;

    async fn list_users(&self, role: Option<UserRole>) -> AssociationResult<Vec<User>>;

    async fn save_event(&mut self, event: &CalendarEvent) -> AssociationResult<()>;

    async fn list_events(&self) -> AssociationResult<Vec<CalendarEvent>>;
}

/// Trait for implementing custom record validation rules
pub trait RecordValidator: Send + Sync {
    fn validate_member(&self, member: &Member) -> AssociationResult<()>;

    fn validate_parcel(&self, parcel: &Parcel) -> AssociationResult<()>;

    fn validate_contract(&self, contract: &Contract) -> AssociationResult<()>;

    fn validate_invoice(&self, invoice: &Invoice) -> AssociationResult<()>;

    fn validate_cashbook_entry(&self, entry: &CashbookEntry) -> AssociationResult<()>;

    fn validate_event(&self, event: &CalendarEvent) -> AssociationResult<()>;
}

/// Default validator enforcing required fields and column widths
pub struct DefaultRecordValidator;

impl RecordValidator for DefaultRecordValidator {
    fn validate_member(&self, member: &Member) -> AssociationResult<()> {
        validation::validate_member(member)
    }

    fn validate_parcel(&self, parcel: &Parcel) -> AssociationResult<()> {
        validation::validate_parcel(parcel)
    }

    fn validate_contract(&self, contract: &Contract) -> AssociationResult<()> {
        validation::validate_contract(contract)
    }

    fn validate_invoice(&self, invoice: &Invoice) -> AssociationResult<()> {
        validation::validate_invoice(invoice)
    }

    fn validate_cashbook_entry(&self, entry: &CashbookEntry) -> AssociationResult<()> {
        validation::validate_cashbook_entry(entry)
    }

    fn validate_event(&self, event: &CalendarEvent) -> AssociationResult<()> {
        validation::validate_event(event)
    }
}

/// Delivers freshly generated portal credentials to a member
pub trait CredentialMailer: Send + Sync {
    fn send_invite(&self, to_email: &str, password: &str) -> AssociationResult<()>;
}

/// Mailer used when no SMTP relay is configured: writes the invite to the log
pub struct LogMailer;

impl CredentialMailer for LogMailer {
    fn send_invite(&self, to_email: &str, password: &str) -> AssociationResult<()> {
        log::warn!("No mail relay configured, invite for {to_email} not sent");
        log::info!("Portal password for {to_email}: {password}");
        Ok(())
    }
}
