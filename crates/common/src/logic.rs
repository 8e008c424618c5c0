//! Small arithmetic dispatcher
//!
//! Not reachable from the HTTP surface; kept with its unit tests.

use crate::errors::{AppError, Result};

/// Apply `op` ("+" or "-") to the operands. Any other operator is rejected.
pub fn operations(a: i64, b: i64, op: &str) -> Result<i64> {
    match op {
        "+" => Ok(a + b),
        "-" => Ok(a - b),
        other => Err(AppError::validation(
            "op",
            format!("\"{}\" is not a supported operator.", other),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plus() {
        assert_eq!(operations(6, 8, "+").unwrap(), 14);
    }

    #[test]
    fn test_minus() {
        assert_eq!(operations(6, 8, "-").unwrap(), -2);
    }

    #[test]
    fn test_unknown_operator() {
        let err = operations(6, 8, "*").unwrap_err();
        assert_eq!(err.to_string(), "\"*\" is not a supported operator.");
    }
}
