use surrealdb::RecordId;

use crate::errors::{Error, Result};

/// Parses the raw id segment of a path into a record id for `table`. Path ids
/// arrive as either `table:key` or bare `key`.
pub fn record_id_from_path(table: &'static str, raw: &str) -> Result<RecordId> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(Error::NotFound(table));
    }
    match raw.split_once(':') {
        Some((t, key)) if t == table && !key.is_empty() => {
            Ok(RecordId::from_table_key(table, key))
        }
        Some(_) => Err(Error::NotFound(table)),
        None => Ok(RecordId::from_table_key(table, raw)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_bare_and_prefixed_keys() {
        let a = record_id_from_path("projects", "abc123").unwrap();
        let b = record_id_from_path("projects", "projects:abc123").unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn rejects_foreign_table_prefix() {
        assert!(record_id_from_path("projects", "users:abc").is_err());
        assert!(record_id_from_path("projects", "").is_err());
    }
}
