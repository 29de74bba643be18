//! Field validators shared by signup, user management and the catalog
//!
//! Each validator returns `Error::Validation` carrying a message from the
//! configured [`Messages`] table.

use crate::messages::{MessageKey, Messages};
use crate::{Error, Result};

/// Username reserved for the self-profile endpoint
pub const RESERVED_USERNAME: &str = "me";

pub const USERNAME_MAX_LEN: usize = 150;
pub const EMAIL_MAX_LEN: usize = 254;
pub const PERSON_NAME_MAX_LEN: usize = 150;
pub const CATALOG_NAME_MAX_LEN: usize = 256;
pub const SLUG_MAX_LEN: usize = 50;
pub const TITLE_NAME_MAX_LEN: usize = 200;
pub const SCORE_MIN: i64 = 1;
pub const SCORE_MAX: i64 = 10;

/// Error for a field that was not submitted at all
pub fn missing(messages: &Messages, field: &str) -> Error {
    Error::Validation(messages.render(MessageKey::FieldRequired, &[("field", field)]))
}

pub fn required(messages: &Messages, field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(missing(messages, field));
    }
    Ok(())
}

pub fn max_len(messages: &Messages, field: &str, value: &str, max: usize) -> Result<()> {
    if value.chars().count() > max {
        return Err(Error::Validation(messages.render(
            MessageKey::FieldTooLong,
            &[("field", field), ("max", &max.to_string())],
        )));
    }
    Ok(())
}

/// Letters, digits and `@.+-_`, at most 150 characters, never `"me"`
pub fn username(messages: &Messages, value: &str) -> Result<()> {
    if value == RESERVED_USERNAME {
        return Err(messages.validation(MessageKey::ReservedUsername));
    }
    required(messages, "username", value)?;
    max_len(messages, "username", value, USERNAME_MAX_LEN)?;

    let allowed = |c: char| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_');
    if !value.chars().all(allowed) {
        return Err(messages.validation(MessageKey::InvalidUsername));
    }
    Ok(())
}

/// Structural check only: `local@domain.tld`, no whitespace
pub fn email(messages: &Messages, value: &str) -> Result<()> {
    required(messages, "email", value)?;
    max_len(messages, "email", value, EMAIL_MAX_LEN)?;

    let invalid = || messages.validation(MessageKey::InvalidEmail);
    if value.chars().any(char::is_whitespace) {
        return Err(invalid());
    }
    let Some((local, domain)) = value.split_once('@') else {
        return Err(invalid());
    };
    if local.is_empty() || domain.contains('@') {
        return Err(invalid());
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return Err(invalid());
    };
    if host.is_empty() || tld.is_empty() {
        return Err(invalid());
    }
    Ok(())
}

/// `[-a-zA-Z0-9_]+`, at most 50 characters
pub fn slug(messages: &Messages, value: &str) -> Result<()> {
    required(messages, "slug", value)?;
    max_len(messages, "slug", value, SLUG_MAX_LEN)?;

    if !value
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
    {
        return Err(messages.validation(MessageKey::InvalidSlug));
    }
    Ok(())
}

/// Release year may not be in the future
pub fn year(messages: &Messages, value: i64, current_year: i64) -> Result<()> {
    if value > current_year {
        return Err(messages.validation(MessageKey::YearInFuture));
    }
    Ok(())
}

pub fn score(messages: &Messages, value: i64) -> Result<()> {
    if !(SCORE_MIN..=SCORE_MAX).contains(&value) {
        return Err(messages.validation(MessageKey::ScoreOutOfRange));
    }
    Ok(())
}
