//! Import a bank statement and reconcile a member's balance

use garden_core::utils::MemoryStorage;
use garden_core::{
    patterns, Association, AssociationConfig, ContractStatus, MatchLink, NewContract, NewMember,
    NewParcel,
};
use bigdecimal::BigDecimal;
use chrono::NaiveDate;
use std::str::FromStr;

const STATEMENT: &str = "\
Buchungstag;Wertstellung;Verwendungszweck;Name;IBAN;Betrag;Saldo
02.01.2024;02.01.2024;Pacht Parzelle 7;Max Mustermann;DE89370400440532013000;150,00;2.150,00
05.01.2024;05.01.2024;Wasserzähler;Stadtwerke;DE12500105170648489890;-48,90;2.101,10
Summe;;;;;101,10;
";

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::init();

    let config = AssociationConfig::from_env();
    let mut association = Association::with_config(MemoryStorage::new(), config.clone());
    association.ensure_initial_admin(&config).await?;
    let admin = association
        .authenticate(&config.initial_admin.email, &config.initial_admin.password)
        .await?;

    let member = association
        .create_member(&admin, NewMember::named("Max", "Mustermann"))
        .await?;
    let parcel = association
        .create_parcel(
            &admin,
            NewParcel {
                number: "7".to_string(),
                size_sqm: Some(BigDecimal::from(280)),
                description: None,
                is_active: true,
            },
        )
        .await?;
    let contract = association
        .create_contract(
            &admin,
            NewContract {
                member_id: member.id,
                parcel_id: parcel.id,
                start_date: NaiveDate::from_ymd_opt(2021, 4, 1).ok_or("bad date")?,
                end_date: None,
                status: ContractStatus::Active,
                yearly_rent: BigDecimal::from_str("150.00")?,
                yearly_additional: BigDecimal::from_str("35.00")?,
            },
        )
        .await?;

    let invoice_date = NaiveDate::from_ymd_opt(2024, 1, 1).ok_or("bad date")?;
    let invoice = patterns::create_lease_invoice(&contract, 2024, invoice_date, None)?;
    association.create_invoice(&admin, invoice).await?;

    let report = association
        .import_bank_statement_with_report(&admin, STATEMENT, "januar.csv")
        .await?;
    println!("Imported {} transactions", report.created);
    for skipped in &report.skipped {
        println!("  skipped line {}: {}", skipped.line, skipped.reason);
    }

    for tx in association.list_bank_transactions(&admin).await? {
        if tx.counterparty_name.as_deref() == Some("Max Mustermann") {
            association
                .link_transaction(
                    &admin,
                    &tx.id,
                    MatchLink {
                        member_id: Some(member.id),
                        invoice_id: None,
                    },
                )
                .await?;
        }
    }

    let balance = association.member_balance(&admin, &member.id).await?;
    println!(
        "{}: invoiced {}, paid {}, balance {}",
        member.full_name(),
        balance.total_invoices,
        balance.total_payments,
        balance.balance
    );

    Ok(())
}
