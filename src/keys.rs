//! Composite storage keys
//!
//! Rows that belong to a family (all roles of a user, all sequences of a
//! party) are keyed as `component \0 component`, so the family can be read
//! back with a single prefix scan.
use super::error::KeyError;

const SEPARATOR: u8 = 0;

pub fn check_component(component: &str) -> Result<(), KeyError> {
    if component.is_empty() {
        return Err(KeyError::Empty);
    }
    if component.as_bytes().contains(&SEPARATOR) {
        return Err(KeyError::ContainsNul(component.to_string()));
    }
    Ok(())
}

pub fn composite_key(head: &str, tail: &[u8]) -> Result<Vec<u8>, KeyError> {
    let mut key = family_prefix(head)?;
    key.extend_from_slice(tail);
    Ok(key)
}

/// Prefix shared by every key whose first component is `head`.
pub fn family_prefix(head: &str) -> Result<Vec<u8>, KeyError> {
    check_component(head)?;
    let mut key = Vec::with_capacity(head.len() + 1);
    key.extend_from_slice(head.as_bytes());
    key.push(SEPARATOR);
    Ok(key)
}

/// First component of a composite key as UTF-8.
pub fn head_str(key: &[u8]) -> Option<&str> {
    let pos = key.iter().position(|b| *b == SEPARATOR)?;
    std::str::from_utf8(&key[..pos]).ok()
}

/// Second component of a composite key as UTF-8, if it is one.
pub fn tail_str(key: &[u8]) -> Option<&str> {
    let pos = key.iter().position(|b| *b == SEPARATOR)?;
    std::str::from_utf8(&key[pos + 1..]).ok()
}
