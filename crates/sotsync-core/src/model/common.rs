// ── Shared model primitives ──

use std::collections::BTreeSet;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Separator used when rendering a natural key as one string. Kept out of
/// collected attribute values by the collectors.
const KEY_SEP: &str = "__";

/// Ordered tuple of identifying attribute values, unique per entity kind
/// within one graph. Independent of any store-assigned id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NaturalKey(Vec<String>);

impl NaturalKey {
    pub fn new<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(parts.into_iter().map(Into::into).collect())
    }

    pub fn single(part: impl Into<String>) -> Self {
        Self(vec![part.into()])
    }

    pub fn parts(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for NaturalKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join(KEY_SEP))
    }
}

impl From<&str> for NaturalKey {
    fn from(part: &str) -> Self {
        Self::single(part)
    }
}

impl<const N: usize> From<[&str; N]> for NaturalKey {
    fn from(parts: [&str; N]) -> Self {
        Self::new(parts)
    }
}

/// A generic key/value custom field carried by most entity kinds.
/// Diffed with set equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct CustomField {
    pub key: String,
    pub value: String,
}

impl CustomField {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

/// A port's membership in one VLAN. Diffed with set equality.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VlanMembership {
    pub name: String,
    pub vid: u16,
}

/// Set equality over slices: order and duplicates are irrelevant.
pub(crate) fn set_eq<T: Ord>(a: &[T], b: &[T]) -> bool {
    a.iter().collect::<BTreeSet<_>>() == b.iter().collect::<BTreeSet<_>>()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_display_joins_parts() {
        let key = NaturalKey::from(["RK1", "DC1", "R1"]);
        assert_eq!(key.to_string(), "RK1__DC1__R1");
    }

    #[test]
    fn set_eq_ignores_order_and_duplicates() {
        assert!(set_eq(&["a", "b"], &["b", "a"]));
        assert!(set_eq(&["a", "a", "b"], &["b", "a"]));
        assert!(!set_eq(&["a"], &["a", "b"]));
    }
}
