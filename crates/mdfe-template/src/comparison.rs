//! Outcome of comparing a candidate INI with the template

use indexmap::IndexMap;
use serde::ser::{Serialize, SerializeStruct, Serializer};

/// Per-section defect lists; section names and entries compare
/// case-insensitively and are kept once each
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SectionDefects {
    sections: IndexMap<String, (String, Vec<String>)>,
}

impl SectionDefects {
    pub(crate) fn add(&mut self, section: &str, key: &str) {
        let (_, keys) = self
            .sections
            .entry(section.to_ascii_lowercase())
            .or_insert_with(|| (section.to_string(), Vec::new()));
        push_unique(keys, key);
    }

    /// Entries recorded for a section
    #[must_use]
    pub fn get(&self, section: &str) -> Option<&[String]> {
        self.sections
            .get(&section.to_ascii_lowercase())
            .map(|(_, keys)| keys.as_slice())
    }

    /// `(section, entries)` in first-seen order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.sections
            .values()
            .map(|(name, keys)| (name.as_str(), keys.as_slice()))
    }

    /// True when no section has entries
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.values().all(|(_, keys)| keys.is_empty())
    }

    /// Total number of entries across sections
    #[must_use]
    pub fn count(&self) -> usize {
        self.sections.values().map(|(_, keys)| keys.len()).sum()
    }
}

impl Serialize for SectionDefects {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

fn push_unique(list: &mut Vec<String>, value: &str) {
    if !list.iter().any(|v| v.eq_ignore_ascii_case(value)) {
        list.push(value.to_string());
    }
}

/// Six independent defect collections
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComparisonResult {
    pub(crate) missing_sections: Vec<String>,
    pub(crate) extra_sections: Vec<String>,
    pub(crate) missing_keys: SectionDefects,
    pub(crate) extra_keys: SectionDefects,
    pub(crate) empty_values: SectionDefects,
    pub(crate) placeholder_values: SectionDefects,
    pub(crate) pattern_matches: IndexMap<String, usize>,
}

impl ComparisonResult {
    /// True iff every defect collection is empty
    #[must_use]
    pub fn is_match(&self) -> bool {
        self.missing_sections.is_empty()
            && self.extra_sections.is_empty()
            && self.missing_keys.is_empty()
            && self.extra_keys.is_empty()
            && self.empty_values.is_empty()
            && self.placeholder_values.is_empty()
    }

    /// Template sections the candidate never provided
    #[must_use]
    pub fn missing_sections(&self) -> &[String] {
        &self.missing_sections
    }

    /// Candidate sections unknown to the template
    #[must_use]
    pub fn extra_sections(&self) -> &[String] {
        &self.extra_sections
    }

    /// Template keys absent from a candidate section
    #[must_use]
    pub fn missing_keys(&self) -> &SectionDefects {
        &self.missing_keys
    }

    /// Candidate keys unknown to the template section
    #[must_use]
    pub fn extra_keys(&self) -> &SectionDefects {
        &self.extra_keys
    }

    /// Keys present but blank
    #[must_use]
    pub fn empty_values(&self) -> &SectionDefects {
        &self.empty_values
    }

    /// Values still holding a `<...>` placeholder
    #[must_use]
    pub fn placeholder_values(&self) -> &SectionDefects {
        &self.placeholder_values
    }

    /// How many candidate sections each wildcard template section absorbed
    #[must_use]
    pub fn pattern_matches(&self) -> &IndexMap<String, usize> {
        &self.pattern_matches
    }

    /// Number of individual defects
    #[must_use]
    pub fn defect_count(&self) -> usize {
        self.missing_sections.len()
            + self.extra_sections.len()
            + self.missing_keys.count()
            + self.extra_keys.count()
            + self.empty_values.count()
            + self.placeholder_values.count()
    }

    pub(crate) fn add_missing_section(&mut self, name: &str) {
        push_unique(&mut self.missing_sections, name);
    }

    pub(crate) fn add_extra_section(&mut self, name: &str) {
        push_unique(&mut self.extra_sections, name);
    }
}

impl Serialize for ComparisonResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("ComparisonResult", 7)?;
        s.serialize_field("is_match", &self.is_match())?;
        s.serialize_field("missing_sections", &self.missing_sections)?;
        s.serialize_field("extra_sections", &self.extra_sections)?;
        s.serialize_field("missing_keys", &self.missing_keys)?;
        s.serialize_field("extra_keys", &self.extra_keys)?;
        s.serialize_field("empty_values", &self.empty_values)?;
        s.serialize_field("placeholder_values", &self.placeholder_values)?;
        s.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entries_dedupe_case_insensitively() {
        let mut defects = SectionDefects::default();
        defects.add("IDE", "cUF");
        defects.add("ide", "CUF");
        defects.add("IDE", "tpAmb");
        assert_eq!(defects.get("Ide").unwrap(), ["cUF", "tpAmb"]);
        assert_eq!(defects.count(), 2);

        let mut result = ComparisonResult::default();
        result.add_extra_section("FOO");
        result.add_extra_section("foo");
        assert_eq!(result.extra_sections(), ["FOO"]);
        assert!(!result.is_match());
    }
}
