//! Invoices, cashbook and bank transaction bookkeeping

use std::sync::Arc;

use bigdecimal::BigDecimal;
use chrono::NaiveDate;

use crate::traits::*;
use crate::types::*;

/// Billing manager for invoices, the cashbook and imported bank transactions
pub struct BillingManager<S: AssociationStorage> {
    storage: S,
    validator: Arc<dyn RecordValidator>,
}

impl<S: AssociationStorage> BillingManager<S> {
    /// Create a new billing manager
    pub fn new(storage: S) -> Self {
        Self::with_validator(storage, Arc::new(DefaultRecordValidator))
    }

    /// Create a new billing manager with custom validator
    pub fn with_validator(storage: S, validator: Arc<dyn RecordValidator>) -> Self {
        Self { storage, validator }
    }

    /// Record an invoice together with its items
    pub async fn create_invoice(&mut self, invoice: Invoice) -> AssociationResult<Invoice> {
        self.validator.validate_invoice(&invoice)?;

        if self.storage.get_member(&invoice.member_id).await?.is_none() {
            return Err(AssociationError::MemberNotFound(
                invoice.member_id.to_string(),
            ));
        }
        if let Some(contract_id) = invoice.contract_id {
            if self.storage.get_contract(&contract_id).await?.is_none() {
                return Err(AssociationError::ContractNotFound(contract_id.to_string()));
            }
        }

        self.storage.save_invoice(&invoice).await?;
        log::debug!(
            "Created invoice {} over {} for member {}",
            invoice.id,
            invoice.total_amount,
            invoice.member_id
        );
        Ok(invoice)
    }

    /// Get an invoice by ID, returning an error if not found
    pub async fn get_invoice_required(&self, invoice_id: &InvoiceId) -> AssociationResult<Invoice> {
        self.storage
            .get_invoice(invoice_id)
            .await?
            .ok_or_else(|| AssociationError::InvoiceNotFound(invoice_id.to_string()))
    }

    /// List invoices, optionally only those of one member
    pub async fn list_invoices(&self, member_id: Option<MemberId>) -> AssociationResult<Vec<Invoice>> {
        self.storage.list_invoices(member_id).await
    }

    /// All imported bank transactions, newest booking first
    pub async fn list_bank_transactions(&self) -> AssociationResult<Vec<BankTransaction>> {
        let mut transactions = self.storage.list_bank_transactions(None).await?;
        transactions.sort_by(|a, b| b.booking_date.cmp(&a.booking_date));
        Ok(transactions)
    }

    /// Assign a bank transaction to a member and/or invoice
    pub async fn link_transaction(
        &mut self,
        transaction_id: &TransactionId,
        link: MatchLink,
    ) -> AssociationResult<BankTransaction> {
        if self
            .storage
            .get_bank_transaction(transaction_id)
            .await?
            .is_none()
        {
            return Err(AssociationError::TransactionNotFound(
                transaction_id.to_string(),
            ));
        }

        self.storage.set_match_link(transaction_id, link).await?;

        self.storage
            .get_bank_transaction(transaction_id)
            .await?
            .ok_or_else(|| AssociationError::TransactionNotFound(transaction_id.to_string()))
    }

    /// Record a manual cash movement
    pub async fn create_cashbook_entry(
        &mut self,
        new: NewCashbookEntry,
    ) -> AssociationResult<CashbookEntry> {
        let entry = CashbookEntry::new(new);
        self.validator.validate_cashbook_entry(&entry)?;
        self.storage.save_cashbook_entry(&entry).await?;
        Ok(entry)
    }

    /// Cashbook entries, newest first
    pub async fn list_cashbook_entries(&self) -> AssociationResult<Vec<CashbookEntry>> {
        let mut entries = self.storage.list_cashbook_entries().await?;
        entries.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(entries)
    }

    /// Income minus expenses over the whole cashbook
    pub async fn cashbook_total(&self) -> AssociationResult<BigDecimal> {
        let entries = self.storage.list_cashbook_entries().await?;
        Ok(entries.iter().map(CashbookEntry::signed_amount).sum())
    }
}

/// Invoice builder for assembling an invoice from its items
#[derive(Debug)]
pub struct InvoiceBuilder {
    invoice: Invoice,
    explicit_total: Option<BigDecimal>,
}

impl InvoiceBuilder {
    /// Start an invoice; the total defaults to the sum of the items
    pub fn new(member_id: MemberId, year: i32, invoice_date: NaiveDate) -> Self {
        Self {
            invoice: Invoice::new(member_id, year, invoice_date, BigDecimal::from(0)),
            explicit_total: None,
        }
    }

    pub fn contract(mut self, contract_id: ContractId) -> Self {
        self.invoice.contract_id = Some(contract_id);
        self
    }

    pub fn due_date(mut self, due_date: NaiveDate) -> Self {
        self.invoice.due_date = Some(due_date);
        self
    }

    pub fn status(mut self, status: InvoiceStatus) -> Self {
        self.invoice.status = status;
        self
    }

    pub fn item(mut self, description: impl Into<String>, amount: BigDecimal) -> Self {
        self.invoice.items.push(InvoiceItem::new(description, amount));
        self
    }

    /// Override the stated total instead of summing the items
    pub fn total(mut self, total: BigDecimal) -> Self {
        self.explicit_total = Some(total);
        self
    }

    /// Build and validate the invoice
    pub fn build(mut self) -> AssociationResult<Invoice> {
        self.invoice.total_amount = match self.explicit_total {
            Some(total) => total,
            None => self.invoice.items_total(),
        };
        crate::utils::validation::validate_invoice(&self.invoice)?;
        Ok(self.invoice)
    }
}

/// Common invoice patterns
pub mod patterns {
    use super::*;

    /// Yearly lease invoice: rent plus additional charges of a contract
    pub fn create_lease_invoice(
        contract: &Contract,
        year: i32,
        invoice_date: NaiveDate,
        due_date: Option<NaiveDate>,
    ) -> AssociationResult<Invoice> {
        let mut builder = InvoiceBuilder::new(contract.member_id, year, invoice_date)
            .contract(contract.id)
            .item(format!("Pacht {year}"), contract.yearly_rent.clone());

        if contract.yearly_additional != BigDecimal::from(0) {
            builder = builder.item(
                format!("Nebenkosten {year}"),
                contract.yearly_additional.clone(),
            );
        }
        if let Some(due) = due_date {
            builder = builder.due_date(due);
        }

        builder.build()
    }
}
