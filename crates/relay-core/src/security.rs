use std::sync::OnceLock;

use rand::{distributions::Alphanumeric, rngs::OsRng, Rng};
use regex::Regex;

use crate::errors::RegistrationError;

pub const DEFAULT_TOKEN_LENGTH: usize = 30;
pub const MIN_TOKEN_LENGTH: usize = 16;
pub const MAX_COMPANY_NAME_LEN: usize = 100;

// ============== Tokens ==============

/// Fresh company token drawn from the OS CSPRNG over `[A-Za-z0-9]`.
pub fn generate_token(len: usize) -> String {
    OsRng
        .sample_iter(&Alphanumeric)
        .take(len.max(MIN_TOKEN_LENGTH))
        .map(char::from)
        .collect()
}

// ============== Registration Input ==============

fn email_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z0-9._%+\-]+@[A-Za-z0-9\-]+(\.[A-Za-z0-9\-]+)*\.[A-Za-z]{2,}$")
            .expect("static email regex")
    })
}

pub fn validate_email(email: &str) -> Result<(), RegistrationError> {
    if email_regex().is_match(email.trim()) {
        return Ok(());
    }
    Err(RegistrationError::Invalid(
        "email must be a valid email address".to_string(),
    ))
}

pub fn validate_company_name(name: &str) -> Result<(), RegistrationError> {
    let len = name.trim().chars().count();
    if len == 0 || len > MAX_COMPANY_NAME_LEN {
        return Err(RegistrationError::Invalid(format!(
            "company name must be between 1 and {MAX_COMPANY_NAME_LEN} characters"
        )));
    }
    Ok(())
}
