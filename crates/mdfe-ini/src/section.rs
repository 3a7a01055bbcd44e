//! Named section holding ordered, case-insensitive key/value pairs

use crate::error::{IniError, Result};
use indexmap::IndexMap;

/// One `[NAME]` block of an INI document.
///
/// Keys are compared case-insensitively. Re-assigning an existing key
/// replaces its value in place: the entry keeps its first position and
/// the spelling it was first inserted with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IniSection {
    name: String,
    // folded key -> (key as first written, value)
    entries: IndexMap<String, (String, String)>,
}

impl IniSection {
    /// Create an empty section. Fails when `name` is blank.
    pub fn new(name: impl Into<String>) -> Result<Self> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(IniError::EmptySectionName);
        }
        Ok(Self {
            name,
            entries: IndexMap::new(),
        })
    }

    /// Section name as written in the source
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Insert or overwrite a key. Last write wins.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        let key = key.into();
        let value = value.into();
        match self.entries.get_mut(&fold(&key)) {
            Some(slot) => slot.1 = value,
            None => {
                self.entries.insert(fold(&key), (key, value));
            }
        }
    }

    /// Builder-style [`IniSection::insert`]
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Look up a value, ignoring key case
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries.get(&fold(key)).map(|(_, v)| v.as_str())
    }

    /// Whether the key exists, ignoring case
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(&fold(key))
    }

    /// Keys in insertion order, original spelling
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.values().map(|(k, _)| k.as_str())
    }

    /// `(key, value)` pairs in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.values().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Number of keys
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when the section has no keys
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub(crate) fn fold(text: &str) -> String {
    text.to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_name_rejected() {
        assert_eq!(IniSection::new("").unwrap_err(), IniError::EmptySectionName);
        assert_eq!(IniSection::new("   ").unwrap_err(), IniError::EmptySectionName);
    }

    #[test]
    fn keys_are_case_insensitive_and_last_write_wins() {
        let mut section = IniSection::new("IDE").unwrap();
        section.insert("cUF", "35");
        section.insert("tpAmb", "2");
        section.insert("CUF", "41");

        assert_eq!(section.len(), 2);
        assert_eq!(section.get("cuf"), Some("41"));
        assert_eq!(section.keys().collect::<Vec<_>>(), vec!["cUF", "tpAmb"]);
    }

    #[test]
    fn builder_preserves_order() {
        let section = IniSection::new("TOT")
            .unwrap()
            .with("qCTe", "0")
            .with("qNFe", "2")
            .with("vCarga", "10.00");

        let pairs: Vec<_> = section.iter().collect();
        assert_eq!(pairs, vec![("qCTe", "0"), ("qNFe", "2"), ("vCarga", "10.00")]);
        assert!(section.contains_key("VCARGA"));
    }
}
