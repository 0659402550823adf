//! Argument validation helpers shared by the metadata and engine layers.

use strata_commons::{EngineError, Result};

/// Reject empty or whitespace-only names.
pub fn non_empty_name(name: &str, what: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(EngineError::invalid_argument(format!(
            "{} must not be empty",
            what
        )));
    }
    Ok(())
}

/// Reject negative identifiers.
pub fn non_negative_id(id: i64, what: &str) -> Result<()> {
    if id < 0 {
        return Err(EngineError::invalid_argument(format!(
            "{} must be non-negative, got {}",
            what, id
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_non_empty_name() {
        assert!(non_empty_name("orders", "table name").is_ok());
        assert!(non_empty_name("", "table name").is_err());
        assert!(non_empty_name("   ", "table name").is_err());
    }

    #[test]
    fn test_non_negative_id() {
        assert!(non_negative_id(0, "table id").is_ok());
        assert!(non_negative_id(-1, "table id").is_err());
    }
}
