//! Field validators shared by entity constructors and the service layer.

use crate::errors::ModelError;

pub fn validate_email(email: &str) -> Result<(), ModelError> {
    let email = email.trim();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') && !email.contains(char::is_whitespace) => Ok(()),
        _ => Err(ModelError::Validation("invalid email".into())),
    }
}

pub fn validate_name(name: &str) -> Result<(), ModelError> {
    if name.trim().is_empty() {
        return Err(ModelError::Validation("name required".into()));
    }
    if name.chars().count() > 200 {
        return Err(ModelError::Validation("name too long (<=200)".into()));
    }
    Ok(())
}

/// ISO-4217 style code: exactly three ASCII letters. Returns the upper-cased code.
pub fn validate_currency(code: &str) -> Result<String, ModelError> {
    let code = code.trim();
    if code.len() != 3 || !code.chars().all(|c| c.is_ascii_alphabetic()) {
        return Err(ModelError::Validation("currency must be a 3-letter code".into()));
    }
    Ok(code.to_ascii_uppercase())
}

/// Upper bound for any single money field: one trillion in major units.
pub const MAX_AMOUNT_CENTS: i64 = 100_000_000_000_000;

pub fn validate_positive_amount(field: &str, cents: i64) -> Result<(), ModelError> {
    if cents <= 0 {
        return Err(ModelError::Validation(format!("{field} must be positive")));
    }
    if cents > MAX_AMOUNT_CENTS {
        return Err(ModelError::Validation(format!("{field} exceeds {MAX_AMOUNT_CENTS}")));
    }
    Ok(())
}

pub fn validate_required(field: &str, value: &str) -> Result<(), ModelError> {
    if value.trim().is_empty() {
        return Err(ModelError::Validation(format!("{field} required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_rules() {
        assert!(validate_email("ana@fund.io").is_ok());
        assert!(validate_email("ana@localhost").is_err());
        assert!(validate_email("@fund.io").is_err());
        assert!(validate_email("a na@fund.io").is_err());
    }

    #[test]
    fn currency_is_uppercased() {
        assert_eq!(validate_currency("usd").unwrap(), "USD");
        assert!(validate_currency("US").is_err());
        assert!(validate_currency("U5D").is_err());
    }

    #[test]
    fn amounts_must_be_positive() {
        assert!(validate_positive_amount("amount", 1).is_ok());
        assert!(validate_positive_amount("amount", 0).is_err());
        assert!(validate_positive_amount("amount", MAX_AMOUNT_CENTS).is_ok());
        assert!(validate_positive_amount("amount", MAX_AMOUNT_CENTS + 1).is_err());
        assert!(validate_positive_amount("amount", i64::MAX).is_err());
    }
}
