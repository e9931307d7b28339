//! Member balance reconciliation
//!
//! A member's balance is what they paid minus what they were billed. Payments
//! are the bank transactions an administrator matched to the member; bills are
//! the member's invoices, except cancelled ones. Matching itself happens by
//! hand elsewhere, this module only reads the result.

use bigdecimal::BigDecimal;

use crate::traits::*;
use crate::types::*;

/// Computes member balances from matched payments and invoices
pub struct BalanceReconciler<S: AssociationStorage> {
    storage: S,
}

impl<S: AssociationStorage> BalanceReconciler<S> {
    pub fn new(storage: S) -> Self {
        Self { storage }
    }

    /// Sum of all non-cancelled invoice totals for the member
    pub async fn total_invoices(&self, member_id: &MemberId) -> AssociationResult<BigDecimal> {
        let invoices = self.storage.list_invoices(Some(*member_id)).await?;
        Ok(invoices
            .iter()
            .filter(|invoice| invoice.is_billable())
            .map(|invoice| &invoice.total_amount)
            .sum())
    }

    /// Sum of all bank transactions matched to the member
    pub async fn total_payments(&self, member_id: &MemberId) -> AssociationResult<BigDecimal> {
        let transactions = self
            .storage
            .list_bank_transactions(Some(*member_id))
            .await?;
        Ok(transactions.iter().map(|tx| &tx.amount).sum())
    }

    /// Net position of a member
    pub async fn balance(&self, member_id: &MemberId) -> AssociationResult<MemberBalance> {
        if self.storage.get_member(member_id).await?.is_none() {
            return Err(AssociationError::MemberNotFound(member_id.to_string()));
        }

        let total_invoices = self.total_invoices(member_id).await?;
        let total_payments = self.total_payments(member_id).await?;

        Ok(MemberBalance {
            balance: &total_payments - &total_invoices,
            total_invoices,
            total_payments,
        })
    }
}
