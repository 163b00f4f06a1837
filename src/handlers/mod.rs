//! HTTP handlers for contacts, phone numbers, and unmatched requests.

pub mod contacts;
pub mod fallback;
pub mod phone_numbers;

use crate::error::AppError;

/// Ids in the URL are integers; anything else is a bad request.
fn parse_id(raw: &str) -> Result<i64, AppError> {
    raw.parse::<i64>()
        .map_err(|_| AppError::bad_request(format!("{} is not a valid id", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_must_be_integers() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("4.2").is_err());
    }
}
