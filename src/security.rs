//! Identifier hygiene for the parts of SQL that cannot be bound as parameters.
//!
//! Collection (table) names come from configuration and are spliced into
//! statements, so they are restricted to plain lowercase identifiers.

use regex::Regex;
use validator::ValidationError;

lazy_static::lazy_static! {
    static ref COLLECTION_NAME_REGEX: Regex = Regex::new(r"^[a-z_][a-z0-9_]{0,62}$").unwrap();
}

pub fn validate_collection_name(name: &str) -> Result<(), ValidationError> {
    if COLLECTION_NAME_REGEX.is_match(name) {
        Ok(())
    } else {
        let mut error = ValidationError::new("collection_name");
        error.message = Some("must be a lowercase identifier of at most 63 characters".into());
        Err(error)
    }
}

/// Quotes a collection name for use as a SQL identifier, so names that are
/// also keywords (`user`, `order`) still work.
pub fn quote_identifier(name: &str) -> String {
    format!("\"{}\"", name.replace('"', "\"\""))
}
