//! HTTP 핸들러

pub mod health;
pub mod login;
pub mod records;
pub mod users;

use crate::error::{ApiError, Result};

/// 경로의 레코드 ID 파싱
pub(crate) fn parse_id(raw: &str) -> Result<i64> {
    raw.parse::<i64>()
        .map_err(|_| ApiError::bad_request(format!("invalid id: {}", raw)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_id() {
        assert_eq!(parse_id("42").unwrap(), 42);
        assert!(parse_id("abc").is_err());
        assert!(parse_id("").is_err());
        assert!(parse_id("1.5").is_err());
    }
}
