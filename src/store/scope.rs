//! Prefix composition shared by [`super::StoreReader`] and [`super::StoreWriter`].

pub fn key_with_prefix(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}{key}")
    }
}

/// Appends a new segment to an existing prefix so nested scopes concatenate
/// (`"a:"` scoped again with `"b"` becomes `"a:b:"`).
pub fn nested_prefix(existing: &str, segment: &str) -> String {
    format!("{existing}{segment}:")
}
