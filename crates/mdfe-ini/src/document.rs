//! Ordered collection of sections with a case-insensitive name index

use crate::section::{fold, IniSection};
use crate::writer::IniWriter;
use std::collections::HashMap;

/// A parsed or generated INI document.
///
/// Section order is preserved. Several sections may share a name; the
/// index keeps all of them in document order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct IniDocument {
    sections: Vec<IniSection>,
    index: HashMap<String, Vec<usize>>,
}

impl IniDocument {
    /// Create an empty document
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a section at the end of the document
    pub fn push(&mut self, section: IniSection) {
        self.index
            .entry(fold(section.name()))
            .or_default()
            .push(self.sections.len());
        self.sections.push(section);
    }

    /// All sections in document order
    #[inline]
    #[must_use]
    pub fn sections(&self) -> &[IniSection] {
        &self.sections
    }

    /// First section with the given name
    #[must_use]
    pub fn section(&self, name: &str) -> Option<&IniSection> {
        self.sections_named(name).next()
    }

    /// Last section with the given name
    #[must_use]
    pub fn last_section(&self, name: &str) -> Option<&IniSection> {
        self.sections_named(name).last()
    }

    /// Every section sharing `name`, in document order
    pub fn sections_named<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a IniSection> + 'a {
        self.index
            .get(&fold(name))
            .into_iter()
            .flatten()
            .map(move |&i| &self.sections[i])
    }

    /// Whether any section carries this name
    #[must_use]
    pub fn contains_section(&self, name: &str) -> bool {
        self.index.contains_key(&fold(name))
    }

    /// Number of sections
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.sections.len()
    }

    /// True when the document has no sections
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render using the default [`IniWriter`]
    #[must_use]
    pub fn to_ini_string(&self) -> String {
        IniWriter::new().write(self)
    }
}

impl FromIterator<IniSection> for IniDocument {
    fn from_iter<I: IntoIterator<Item = IniSection>>(iter: I) -> Self {
        let mut doc = Self::new();
        for section in iter {
            doc.push(section);
        }
        doc
    }
}
