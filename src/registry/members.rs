//! Member, parcel and contract management

use std::sync::Arc;

use crate::traits::*;
use crate::types::*;

/// Member manager for the association's people and parcels
pub struct MemberManager<S: AssociationStorage> {
    pub(crate) storage: S,
    validator: Arc<dyn RecordValidator>,
}

impl<S: AssociationStorage> MemberManager<S> {
    /// Create a new member manager
    pub fn new(storage: S) -> Self {
        Self::with_validator(storage, Arc::new(DefaultRecordValidator))
    }

    /// Create a new member manager with custom validator
    pub fn with_validator(storage: S, validator: Arc<dyn RecordValidator>) -> Self {
        Self { storage, validator }
    }

    /// Register a new member
    pub async fn create_member(&mut self, new: NewMember) -> AssociationResult<Member> {
        let member = Member::new(new);
        self.validator.validate_member(&member)?;
        self.storage.save_member(&member).await?;

        log::debug!("Created member {} ({})", member.id, member.full_name());
        Ok(member)
    }

    pub async fn get_member(&self, member_id: &MemberId) -> AssociationResult<Option<Member>> {
        self.storage.get_member(member_id).await
    }

    /// Get a member by ID, returning an error if not found
    pub async fn get_member_required(&self, member_id: &MemberId) -> AssociationResult<Member> {
        self.storage
            .get_member(member_id)
            .await?
            .ok_or_else(|| AssociationError::MemberNotFound(member_id.to_string()))
    }

    pub async fn list_members(&self) -> AssociationResult<Vec<Member>> {
        self.storage.list_members().await
    }

    /// Add a parcel to the garden plan
    pub async fn create_parcel(&mut self, new: NewParcel) -> AssociationResult<Parcel> {
        let parcel = Parcel::new(new);
        self.validator.validate_parcel(&parcel)?;
        self.storage.save_parcel(&parcel).await?;
        Ok(parcel)
    }

    pub async fn list_parcels(&self) -> AssociationResult<Vec<Parcel>> {
        self.storage.list_parcels().await
    }

    /// Lease a parcel to a member
    pub async fn create_contract(&mut self, new: NewContract) -> AssociationResult<Contract> {
        let contract = Contract::new(new);
        self.validator.validate_contract(&contract)?;

        // Report missing references before the store's constraint does
        self.get_member_required(&contract.member_id).await?;
        if self.storage.get_parcel(&contract.parcel_id).await?.is_none() {
            return Err(AssociationError::ParcelNotFound(
                contract.parcel_id.to_string(),
            ));
        }

        self.storage.save_contract(&contract).await?;
        Ok(contract)
    }

    pub async fn get_contract_required(
        &self,
        contract_id: &ContractId,
    ) -> AssociationResult<Contract> {
        self.storage
            .get_contract(contract_id)
            .await?
            .ok_or_else(|| AssociationError::ContractNotFound(contract_id.to_string()))
    }

    /// List contracts, optionally only those of one member
    pub async fn list_contracts(
        &self,
        member_id: Option<MemberId>,
    ) -> AssociationResult<Vec<Contract>> {
        self.storage.list_contracts(member_id).await
    }

    /// The member's contracts joined with their parcels
    pub async fn member_parcels(&self, member_id: &MemberId) -> AssociationResult<Vec<MemberParcel>> {
        let contracts = self.storage.list_contracts(Some(*member_id)).await?;
        let mut parcels = Vec::with_capacity(contracts.len());

        for contract in contracts {
            let parcel = self
                .storage
                .get_parcel(&contract.parcel_id)
                .await?
                .ok_or_else(|| AssociationError::ParcelNotFound(contract.parcel_id.to_string()))?;

            parcels.push(MemberParcel {
                contract_id: contract.id,
                parcel_id: parcel.id,
                parcel_number: parcel.number,
                size_sqm: parcel.size_sqm,
                status: contract.status,
                start_date: contract.start_date,
                end_date: contract.end_date,
                yearly_rent: contract.yearly_rent,
                yearly_additional: contract.yearly_additional,
            });
        }

        Ok(parcels)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::memory_storage::MemoryStorage;
    use bigdecimal::BigDecimal;
    use chrono::NaiveDate;

    fn parcel(number: &str) -> NewParcel {
        NewParcel {
            number: number.to_string(),
            size_sqm: Some(BigDecimal::from(350)),
            description: None,
            is_active: true,
        }
    }

    #[tokio::test]
    async fn test_member_parcels_join() {
        let mut manager = MemberManager::new(MemoryStorage::new());

        let member = manager
            .create_member(NewMember::named("Erika", "Gärtner"))
            .await
            .unwrap();
        let other = manager
            .create_member(NewMember::named("Max", "Mustermann"))
            .await
            .unwrap();
        let p12 = manager.create_parcel(parcel("12")).await.unwrap();
        let p13 = manager.create_parcel(parcel("13")).await.unwrap();

        for (member_id, parcel_id) in [(member.id, p12.id), (other.id, p13.id)] {
            manager
                .create_contract(NewContract {
                    member_id,
                    parcel_id,
                    start_date: NaiveDate::from_ymd_opt(2023, 4, 1).unwrap(),
                    end_date: None,
                    status: ContractStatus::Active,
                    yearly_rent: BigDecimal::from(180),
                    yearly_additional: BigDecimal::from(45),
                })
                .await
                .unwrap();
        }

        let parcels = manager.member_parcels(&member.id).await.unwrap();
        assert_eq!(parcels.len(), 1);
        assert_eq!(parcels[0].parcel_number, "12");
        assert_eq!(parcels[0].yearly_additional, BigDecimal::from(45));
    }

    #[tokio::test]
    async fn test_contract_for_unknown_member() {
        let mut manager = MemberManager::new(MemoryStorage::new());
        let p1 = manager.create_parcel(parcel("1")).await.unwrap();

        let err = manager
            .create_contract(NewContract {
                member_id: uuid::Uuid::new_v4(),
                parcel_id: p1.id,
                start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
                end_date: None,
                status: ContractStatus::Pending,
                yearly_rent: BigDecimal::from(100),
                yearly_additional: BigDecimal::from(0),
            })
            .await
            .unwrap_err();

        assert!(matches!(err, AssociationError::MemberNotFound(_)));
    }

    #[tokio::test]
    async fn test_duplicate_parcel_number() {
        let mut manager = MemberManager::new(MemoryStorage::new());
        manager.create_parcel(parcel("7")).await.unwrap();
        let err = manager.create_parcel(parcel("7")).await.unwrap_err();
        assert!(matches!(err, AssociationError::AlreadyExists(_)));
    }
}
