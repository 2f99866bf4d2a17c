use crate::error::{Result, SesError};

/// Basic email address syntax check
///
/// Addresses are otherwise treated as opaque strings: no case folding or
/// other normalization happens anywhere in the service.
pub fn validate_email(email: &str) -> Result<()> {
    if email.is_empty() {
        return Err(SesError::InvalidEmail("Email is empty".to_string()));
    }

    if email.chars().any(char::is_whitespace) {
        return Err(SesError::InvalidEmail(format!(
            "{} contains whitespace",
            email
        )));
    }

    let Some((local, domain)) = email.split_once('@') else {
        return Err(SesError::InvalidEmail(format!("{} must contain @", email)));
    };

    if domain.contains('@') {
        return Err(SesError::InvalidEmail(format!("{} has more than one @", email)));
    }

    if local.is_empty() || domain.is_empty() {
        return Err(SesError::InvalidEmail(format!(
            "{} has an empty local part or domain",
            email
        )));
    }

    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(SesError::InvalidEmail(format!(
            "{} has an invalid domain",
            email
        )));
    }

    Ok(())
}
