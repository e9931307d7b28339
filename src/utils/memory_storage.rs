//! In-memory storage implementation for testing

use async_trait::async_trait;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::traits::*;
use crate::types::*;

type Table<T> = Arc<RwLock<Vec<T>>>;

fn read<T>(table: &Table<T>) -> AssociationResult<RwLockReadGuard<'_, Vec<T>>> {
    table
        .read()
        .map_err(|e| AssociationError::Storage(format!("table lock poisoned: {e}")))
}

fn write<T>(table: &Table<T>) -> AssociationResult<RwLockWriteGuard<'_, Vec<T>>> {
    table
        .write()
        .map_err(|e| AssociationError::Storage(format!("table lock poisoned: {e}")))
}

/// In-memory storage implementation for testing and development
///
/// Tables keep insertion order. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStorage {
    members: Table<Member>,
    parcels: Table<Parcel>,
    contracts: Table<Contract>,
    invoices: Table<Invoice>,
    bank_transactions: Table<BankTransaction>,
    cashbook: Table<CashbookEntry>,
    users: Table<User>,
    events: Table<CalendarEvent>,
}

impl MemoryStorage {
    /// Create a new memory storage instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored bank transactions
    pub fn bank_transaction_count(&self) -> usize {
        self.bank_transactions.read().map(|t| t.len()).unwrap_or(0)
    }

    fn member_exists(&self, member_id: &MemberId) -> AssociationResult<bool> {
        Ok(read(&self.members)?.iter().any(|m| &m.id == member_id))
    }

    fn invoice_exists(&self, invoice_id: &InvoiceId) -> AssociationResult<bool> {
        Ok(read(&self.invoices)?.iter().any(|i| &i.id == invoice_id))
    }
}

#[async_trait]
impl AssociationStorage for MemoryStorage {
    async fn save_member(&mut self, member: &Member) -> AssociationResult<()> {
        let mut members = write(&self.members)?;
        if let Some(email) = &member.email {
            if members.iter().any(|m| m.email.as_ref() == Some(email)) {
                return Err(AssociationError::AlreadyExists(format!(
                    "member with email '{email}'"
                )));
            }
        }
        members.push(member.clone());
        Ok(())
    }

    async fn get_member(&self, member_id: &MemberId) -> AssociationResult<Option<Member>> {
        Ok(read(&self.members)?
            .iter()
            .find(|m| &m.id == member_id)
            .cloned())
    }

    async fn list_members(&self) -> AssociationResult<Vec<Member>> {
        Ok(read(&self.members)?.clone())
    }

    async fn save_parcel(&mut self, parcel: &Parcel) -> AssociationResult<()> {
        let mut parcels = write(&self.parcels)?;
        if parcels.iter().any(|p| p.number == parcel.number) {
            return Err(AssociationError::AlreadyExists(format!(
                "parcel number '{}'",
                parcel.number
            )));
        }
        parcels.push(parcel.clone());
        Ok(())
    }

    async fn get_parcel(&self, parcel_id: &ParcelId) -> AssociationResult<Option<Parcel>> {
        Ok(read(&self.parcels)?
            .iter()
            .find(|p| &p.id == parcel_id)
            .cloned())
    }

    async fn list_parcels(&self) -> AssociationResult<Vec<Parcel>> {
        Ok(read(&self.parcels)?.clone())
    }

    async fn save_contract(&mut self, contract: &Contract) -> AssociationResult<()> {
        if !self.member_exists(&contract.member_id)? {
            return Err(AssociationError::MemberNotFound(
                contract.member_id.to_string(),
            ));
        }
        if !read(&self.parcels)?.iter().any(|p| p.id == contract.parcel_id) {
            return Err(AssociationError::ParcelNotFound(
                contract.parcel_id.to_string(),
            ));
        }
        write(&self.contracts)?.push(contract.clone());
        Ok(())
    }

    async fn get_contract(&self, contract_id: &ContractId) -> AssociationResult<Option<Contract>> {
        Ok(read(&self.contracts)?
            .iter()
            .find(|c| &c.id == contract_id)
            .cloned())
    }

    async fn list_contracts(&self, member_id: Option<MemberId>) -> AssociationResult<Vec<Contract>> {
        Ok(read(&self.contracts)?
            .iter()
            .filter(|c| member_id.is_none_or(|id| c.member_id == id))
            .cloned()
            .collect())
    }

    async fn save_invoice(&mut self, invoice: &Invoice) -> AssociationResult<()> {
        if !self.member_exists(&invoice.member_id)? {
            return Err(AssociationError::MemberNotFound(
                invoice.member_id.to_string(),
            ));
        }
        if let Some(contract_id) = invoice.contract_id {
            if !read(&self.contracts)?.iter().any(|c| c.id == contract_id) {
                return Err(AssociationError::ContractNotFound(contract_id.to_string()));
            }
        }
        write(&self.invoices)?.push(invoice.clone());
        Ok(())
    }

    async fn get_invoice(&self, invoice_id: &InvoiceId) -> AssociationResult<Option<Invoice>> {
        Ok(read(&self.invoices)?
            .iter()
            .find(|i| &i.id == invoice_id)
            .cloned())
    }

    async fn list_invoices(&self, member_id: Option<MemberId>) -> AssociationResult<Vec<Invoice>> {
        Ok(read(&self.invoices)?
            .iter()
            .filter(|i| member_id.is_none_or(|id| i.member_id == id))
            .cloned()
            .collect())
    }

    async fn save_bank_transactions(
        &mut self,
        transactions: &[BankTransaction],
    ) -> AssociationResult<()> {
        // One guard for the whole batch keeps the insert all-or-nothing
        let mut table = write(&self.bank_transactions)?;
        table.extend_from_slice(transactions);
        Ok(())
    }

    async fn get_bank_transaction(
        &self,
        transaction_id: &TransactionId,
    ) -> AssociationResult<Option<BankTransaction>> {
        Ok(read(&self.bank_transactions)?
            .iter()
            .find(|t| &t.id == transaction_id)
            .cloned())
    }

    async fn list_bank_transactions(
        &self,
        matched_member_id: Option<MemberId>,
    ) -> AssociationResult<Vec<BankTransaction>> {
        Ok(read(&self.bank_transactions)?
            .iter()
            .filter(|t| matched_member_id.is_none_or(|id| t.matched_member_id == Some(id)))
            .cloned()
            .collect())
    }

    async fn set_match_link(
        &mut self,
        transaction_id: &TransactionId,
        link: MatchLink,
    ) -> AssociationResult<()> {
        if let Some(member_id) = link.member_id {
            if !self.member_exists(&member_id)? {
                return Err(AssociationError::MemberNotFound(member_id.to_string()));
            }
        }
        if let Some(invoice_id) = link.invoice_id {
            if !self.invoice_exists(&invoice_id)? {
                return Err(AssociationError::InvoiceNotFound(invoice_id.to_string()));
            }
        }

        let mut table = write(&self.bank_transactions)?;
        let transaction = table
            .iter_mut()
            .find(|t| &t.id == transaction_id)
            .ok_or_else(|| AssociationError::TransactionNotFound(transaction_id.to_string()))?;
        transaction.matched_member_id = link.member_id;
        transaction.matched_invoice_id = link.invoice_id;
        Ok(())
    }

    async fn save_cashbook_entry(&mut self, entry: &CashbookEntry) -> AssociationResult<()> {
        if let Some(invoice_id) = entry.invoice_id {
            if !self.invoice_exists(&invoice_id)? {
                return Err(AssociationError::InvoiceNotFound(invoice_id.to_string()));
            }
        }
        write(&self.cashbook)?.push(entry.clone());
        Ok(())
    }

    async fn list_cashbook_entries(&self) -> AssociationResult<Vec<CashbookEntry>> {
        Ok(read(&self.cashbook)?.clone())
    }

    async fn save_user(&mut self, user: &User) -> AssociationResult<()> {
        if let Some(member_id) = user.member_id {
            if !self.member_exists(&member_id)? {
                return Err(AssociationError::MemberNotFound(member_id.to_string()));
            }
        }
        let mut users = write(&self.users)?;
        if users.iter().any(|u| u.email == user.email) {
            return Err(AssociationError::AlreadyExists(format!(
                "user with email '{}'",
                user.email
            )));
        }
        users.push(user.clone());
        Ok(())
    }

    async fn get_user_by_email(&self, email: &str) -> AssociationResult<Option<User>> {
        Ok(read(&self.users)?
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn list_users(&self, role: Option<UserRole>) -> AssociationResult<Vec<User>> {
        Ok(read(&self.users)?
            .iter()
            .filter(|u| role.is_none_or(|r| u.role == r))
            .cloned()
            .collect())
    }

    async fn save_event(&mut self, event: &CalendarEvent) -> AssociationResult<()> {
        write(&self.events)?.push(event.clone());
        Ok(())
    }

    async fn list_events(&self) -> AssociationResult<Vec<CalendarEvent>> {
        Ok(read(&self.events)?.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[tokio::test]
    async fn test_member_email_is_unique() {
        let mut storage = MemoryStorage::new();
        let first = Member::new(NewMember::named("Erika", "Gärtner").with_email("e@example.org"));
        let second = Member::new(NewMember::named("Max", "Gärtner").with_email("e@example.org"));

        storage.save_member(&first).await.unwrap();
        let err = storage.save_member(&second).await.unwrap_err();
        assert!(matches!(err, AssociationError::AlreadyExists(_)));

        // Members without email never collide
        storage
            .save_member(&Member::new(NewMember::named("A", "B")))
            .await
            .unwrap();
        storage
            .save_member(&Member::new(NewMember::named("C", "D")))
            .await
            .unwrap();
        assert_eq!(storage.list_members().await.unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_contract_requires_member_and_parcel() {
        let mut storage = MemoryStorage::new();
        let member = Member::new(NewMember::named("Erika", "Gärtner"));
        storage.save_member(&member).await.unwrap();

        let contract = Contract::new(NewContract {
            member_id: member.id,
            parcel_id: uuid::Uuid::new_v4(),
            start_date: date(2024, 1, 1),
            end_date: None,
            status: ContractStatus::Active,
            yearly_rent: BigDecimal::from(100),
            yearly_additional: BigDecimal::from(0),
        });

        let err = storage.save_contract(&contract).await.unwrap_err();
        assert!(matches!(err, AssociationError::ParcelNotFound(_)));
    }

    #[tokio::test]
    async fn test_match_link_on_unknown_transaction() {
        let mut storage = MemoryStorage::new();
        let err = storage
            .set_match_link(&uuid::Uuid::new_v4(), MatchLink::default())
            .await
            .unwrap_err();
        assert!(matches!(err, AssociationError::TransactionNotFound(_)));
    }

    #[tokio::test]
    async fn test_clones_share_tables() {
        let mut storage = MemoryStorage::new();
        let view = storage.clone();

        let tx = BankTransaction::new(
            date(2024, 3, 1),
            BigDecimal::from(10),
            RawRow::default(),
            "march.csv",
        );
        storage.save_bank_transactions(&[tx]).await.unwrap();

        assert_eq!(view.bank_transaction_count(), 1);
    }
}
