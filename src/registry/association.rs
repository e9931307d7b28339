//! Main association orchestrator that coordinates members, billing and the portal

use std::sync::Arc;

use crate::bank::{ImportReport, StatementImporter};
use crate::config::AssociationConfig;
use crate::reconciliation::BalanceReconciler;
use crate::registry::{BillingManager, CalendarManager, MemberManager, UserManager};
use crate::traits::*;
use crate::types::*;

/// Fail unless the caller is an administrator
pub fn require_admin(caller: &User) -> AssociationResult<()> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AssociationError::Forbidden(format!(
            "{} is not an administrator",
            caller.email
        )))
    }
}

/// The member a portal caller acts for
pub fn require_member(caller: &User) -> AssociationResult<MemberId> {
    caller.member_id.ok_or_else(|| {
        AssociationError::Forbidden(format!("{} is not linked to a member", caller.email))
    })
}

/// Main association backend that orchestrates all operations
///
/// Admin operations take the calling [`User`] and reject non-admins; portal
/// operations act on the member linked to the caller.
pub struct Association<S: AssociationStorage> {
    members: MemberManager<S>,
    billing: BillingManager<S>,
    calendar: CalendarManager<S>,
    users: UserManager<S>,
    importer: StatementImporter<S>,
    reconciler: BalanceReconciler<S>,
    mailer: Box<dyn CredentialMailer>,
}

impl<S: AssociationStorage + Clone> Association<S> {
    /// Create a new association with the given storage backend
    pub fn new(storage: S) -> Self {
        Self::with_config(storage, AssociationConfig::default())
    }

    pub fn with_config(storage: S, config: AssociationConfig) -> Self {
        Self::with_validator(storage, config, Arc::new(DefaultRecordValidator))
    }

    /// Create a new association with a custom validator
    pub fn with_validator(
        storage: S,
        config: AssociationConfig,
        validator: Arc<dyn RecordValidator>,
    ) -> Self {
        Self {
            members: MemberManager::with_validator(storage.clone(), validator.clone()),
            billing: BillingManager::with_validator(storage.clone(), validator.clone()),
            calendar: CalendarManager::with_validator(storage.clone(), validator),
            users: UserManager::new(storage.clone()),
            importer: StatementImporter::with_config(storage.clone(), config.importer),
            reconciler: BalanceReconciler::new(storage),
            mailer: Box::new(LogMailer),
        }
    }

    /// Replace the mailer used for member invites
    pub fn with_mailer(mut self, mailer: Box<dyn CredentialMailer>) -> Self {
        self.mailer = mailer;
        self
    }

    // Bootstrap and login
    /// Create the configured admin if the store has no administrator yet
    pub async fn ensure_initial_admin(
        &mut self,
        config: &AssociationConfig,
    ) -> AssociationResult<Option<User>> {
        self.users
            .ensure_initial_admin(&config.initial_admin.email, &config.initial_admin.password)
            .await
    }

    pub async fn authenticate(&self, email: &str, password: &str) -> AssociationResult<User> {
        self.users.authenticate(email, password).await
    }

    // Members, parcels, contracts
    pub async fn create_member(&mut self, caller: &User, new: NewMember) -> AssociationResult<Member> {
        require_admin(caller)?;
        self.members.create_member(new).await
    }

    pub async fn list_members(&self, caller: &User) -> AssociationResult<Vec<Member>> {
        require_admin(caller)?;
        self.members.list_members().await
    }

    pub async fn create_parcel(&mut self, caller: &User, new: NewParcel) -> AssociationResult<Parcel> {
        require_admin(caller)?;
        self.members.create_parcel(new).await
    }

    pub async fn list_parcels(&self, caller: &User) -> AssociationResult<Vec<Parcel>> {
        require_admin(caller)?;
        self.members.list_parcels().await
    }

    pub async fn create_contract(
        &mut self,
        caller: &User,
        new: NewContract,
    ) -> AssociationResult<Contract> {
        require_admin(caller)?;
        self.members.create_contract(new).await
    }

    pub async fn list_contracts(&self, caller: &User) -> AssociationResult<Vec<Contract>> {
        require_admin(caller)?;
        self.members.list_contracts(None).await
    }

    /// Create a portal login for a member and send them the password
    ///
    /// Returns the address the credentials went to.
    pub async fn invite_member(
        &mut self,
        caller: &User,
        member_id: &MemberId,
    ) -> AssociationResult<String> {
        require_admin(caller)?;
        let member = self.members.get_member_required(member_id).await?;
        self.users.invite_member(&member, self.mailer.as_ref()).await
    }

    // Billing
    pub async fn create_invoice(&mut self, caller: &User, invoice: Invoice) -> AssociationResult<Invoice> {
        require_admin(caller)?;
        self.billing.create_invoice(invoice).await
    }

    pub async fn list_invoices(&self, caller: &User) -> AssociationResult<Vec<Invoice>> {
        require_admin(caller)?;
        self.billing.list_invoices(None).await
    }

    pub async fn create_cashbook_entry(
        &mut self,
        caller: &User,
        new: NewCashbookEntry,
    ) -> AssociationResult<CashbookEntry> {
        require_admin(caller)?;
        self.billing.create_cashbook_entry(new).await
    }

    pub async fn list_cashbook_entries(&self, caller: &User) -> AssociationResult<Vec<CashbookEntry>> {
        require_admin(caller)?;
        self.billing.list_cashbook_entries().await
    }

    // Bank statements
    /// Import an uploaded statement file, returning the number of created transactions
    pub async fn import_bank_statement(
        &mut self,
        caller: &User,
        bytes: &[u8],
        filename: &str,
    ) -> AssociationResult<usize> {
        require_admin(caller)?;
        self.importer.import_bytes(bytes, filename).await
    }

    /// Import statement text and report the rows that were left out
    pub async fn import_bank_statement_with_report(
        &mut self,
        caller: &User,
        content: &str,
        filename: &str,
    ) -> AssociationResult<ImportReport> {
        require_admin(caller)?;
        self.importer.import_with_report(content, filename).await
    }

    pub async fn list_bank_transactions(&self, caller: &User) -> AssociationResult<Vec<BankTransaction>> {
        require_admin(caller)?;
        self.billing.list_bank_transactions().await
    }

    /// Record the manual match of a bank transaction
    pub async fn link_transaction(
        &mut self,
        caller: &User,
        transaction_id: &TransactionId,
        link: MatchLink,
    ) -> AssociationResult<BankTransaction> {
        require_admin(caller)?;
        self.billing.link_transaction(transaction_id, link).await
    }

    /// Balance of any member, for administrators
    pub async fn member_balance(
        &self,
        caller: &User,
        member_id: &MemberId,
    ) -> AssociationResult<MemberBalance> {
        require_admin(caller)?;
        self.reconciler.balance(member_id).await
    }

    // Calendar
    pub async fn create_event(
        &mut self,
        caller: &User,
        new: NewCalendarEvent,
    ) -> AssociationResult<CalendarEvent> {
        require_admin(caller)?;
        self.calendar.create_event(new).await
    }

    pub async fn list_public_events(&self) -> AssociationResult<Vec<CalendarEvent>> {
        self.calendar.list_public_events().await
    }

    // Member portal
    pub async fn my_profile(&self, caller: &User) -> AssociationResult<Member> {
        let member_id = require_member(caller)?;
        self.members.get_member_required(&member_id).await
    }

    pub async fn my_parcels(&self, caller: &User) -> AssociationResult<Vec<MemberParcel>> {
        let member_id = require_member(caller)?;
        self.members.member_parcels(&member_id).await
    }

    pub async fn my_invoices(&self, caller: &User) -> AssociationResult<Vec<Invoice>> {
        let member_id = require_member(caller)?;
        self.billing.list_invoices(Some(member_id)).await
    }

    pub async fn my_balance(&self, caller: &User) -> AssociationResult<MemberBalance> {
        let member_id = require_member(caller)?;
        self.reconciler.balance(&member_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;

    fn admin() -> User {
        User::new("admin@example.com", String::new(), UserRole::Admin, None)
    }

    #[tokio::test]
    async fn test_member_cannot_use_admin_operations() {
        let mut association = Association::new(MemoryStorage::new());
        let member_user = User::new(
            "erika@example.org",
            String::new(),
            UserRole::Member,
            Some(uuid::Uuid::new_v4()),
        );

        let err = association
            .create_member(&member_user, NewMember::named("Max", "Mustermann"))
            .await
            .unwrap_err();
        assert!(matches!(err, AssociationError::Forbidden(_)));

        let err = association
            .import_bank_statement(&member_user, b"Buchungstag;Betrag\n", "x.csv")
            .await
            .unwrap_err();
        assert!(matches!(err, AssociationError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_admin_without_member_has_no_portal() {
        let association = Association::new(MemoryStorage::new());
        let err = association.my_balance(&admin()).await.unwrap_err();
        assert!(matches!(err, AssociationError::Forbidden(_)));
    }

    #[tokio::test]
    async fn test_invite_requires_email() {
        let mut association = Association::new(MemoryStorage::new());
        let member = association
            .create_member(&admin(), NewMember::named("Max", "Mustermann"))
            .await
            .unwrap();

        let err = association
            .invite_member(&admin(), &member.id)
            .await
            .unwrap_err();
        assert!(matches!(err, AssociationError::MemberNotFound(_)));
    }
}
