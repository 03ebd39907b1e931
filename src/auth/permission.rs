//! Permission key matching.
//!
//! Held permissions may be wildcards: `*` grants everything and `prefix.*`
//! grants every key under `prefix.`. Any other key must match exactly.

/// Check a single held permission against a required key.
pub fn permission_matches(held: &str, required: &str) -> bool {
    if held == "*" {
        return true;
    }
    if let Some(prefix) = held.strip_suffix('*') {
        if prefix.ends_with('.') {
            return required.starts_with(prefix);
        }
    }
    held == required
}

/// True if any held permission grants `required`.
pub fn is_granted<I, S>(held: I, required: &str) -> bool
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    held.into_iter()
        .any(|p| permission_matches(p.as_ref(), required))
}
