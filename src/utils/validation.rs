//! Validation utilities

use bigdecimal::BigDecimal;

use crate::types::*;

/// Validate that a required text field is present and fits its column
pub fn validate_required(field: &str, value: &str, max_len: usize) -> AssociationResult<()> {
    if value.trim().is_empty() {
        return Err(AssociationError::Validation(format!(
            "{field} cannot be empty"
        )));
    }
    validate_length(field, value, max_len)
}

/// Validate that a text field fits its column
pub fn validate_length(field: &str, value: &str, max_len: usize) -> AssociationResult<()> {
    if value.chars().count() > max_len {
        return Err(AssociationError::Validation(format!(
            "{field} cannot exceed {max_len} characters"
        )));
    }
    Ok(())
}

fn validate_optional(field: &str, value: &Option<String>, max_len: usize) -> AssociationResult<()> {
    match value {
        Some(value) => validate_length(field, value, max_len),
        None => Ok(()),
    }
}

/// Validate that an amount is not negative
pub fn validate_non_negative(field: &str, amount: &BigDecimal) -> AssociationResult<()> {
    if *amount < BigDecimal::from(0) {
        Err(AssociationError::Validation(format!(
            "{field} cannot be negative"
        )))
    } else {
        Ok(())
    }
}

/// Validate that an amount is positive
pub fn validate_positive(field: &str, amount: &BigDecimal) -> AssociationResult<()> {
    if *amount <= BigDecimal::from(0) {
        Err(AssociationError::Validation(format!(
            "{field} must be positive"
        )))
    } else {
        Ok(())
    }
}

/// Validate an email address well enough to catch typos
pub fn validate_email(email: &str) -> AssociationResult<()> {
    validate_length("Email", email, 200)?;

    let valid = match email.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty() && domain.contains('.') && !domain.starts_with('.')
        }
        None => false,
    };

    if !valid || email.chars().any(char::is_whitespace) {
        return Err(AssociationError::Validation(format!(
            "'{email}' is not a valid email address"
        )));
    }
    Ok(())
}

pub fn validate_member(member: &Member) -> AssociationResult<()> {
    validate_required("First name", &member.first_name, 100)?;
    validate_required("Last name", &member.last_name, 100)?;
    if let Some(email) = &member.email {
        validate_email(email)?;
    }
    validate_optional("Phone", &member.phone, 50)?;
    validate_optional("Street", &member.street, 200)?;
    validate_optional("Zip code", &member.zip_code, 10)?;
    validate_optional("City", &member.city, 100)?;
    validate_optional("IBAN", &member.iban, 34)?;
    validate_optional("BIC", &member.bic, 11)?;
    Ok(())
}

pub fn validate_parcel(parcel: &Parcel) -> AssociationResult<()> {
    validate_required("Parcel number", &parcel.number, 50)?;
    if let Some(size) = &parcel.size_sqm {
        validate_non_negative("Parcel size", size)?;
    }
    Ok(())
}

pub fn validate_contract(contract: &Contract) -> AssociationResult<()> {
    validate_non_negative("Yearly rent", &contract.yearly_rent)?;
    validate_non_negative("Yearly additional costs", &contract.yearly_additional)?;

    if let Some(end) = contract.end_date {
        if end < contract.start_date {
            return Err(AssociationError::Validation(format!(
                "Contract end date {end} is before its start date {}",
                contract.start_date
            )));
        }
    }
    Ok(())
}

pub fn validate_invoice(invoice: &Invoice) -> AssociationResult<()> {
    if invoice.items.is_empty() {
        return Err(AssociationError::Validation(
            "Invoice must have at least one item".to_string(),
        ));
    }

    for item in &invoice.items {
        validate_required("Item description", &item.description, 255)?;
    }

    validate_non_negative("Invoice total", &invoice.total_amount)?;

    if let Some(due) = invoice.due_date {
        if due < invoice.invoice_date {
            return Err(AssociationError::Validation(format!(
                "Due date {due} is before the invoice date {}",
                invoice.invoice_date
            )));
        }
    }
    Ok(())
}

pub fn validate_cashbook_entry(entry: &CashbookEntry) -> AssociationResult<()> {
    validate_positive("Cashbook amount", &entry.amount)?;
    validate_optional("Category", &entry.category, 100)
}

pub fn validate_event(event: &CalendarEvent) -> AssociationResult<()> {
    validate_required("Event title", &event.title, 255)?;

    if let Some(end) = event.end {
        if end < event.start {
            return Err(AssociationError::Validation(
                "Event cannot end before it starts".to_string(),
            ));
        }
    }
    Ok(())
}
