//! Value formatting shared by the generators

use chrono::{DateTime, FixedOffset, NaiveDate};
use mdfe_ini::IniWriter;

/// `YYYY-MM-DDTHH:MM:SS±HH:MM`
#[must_use]
pub fn timestamp(value: &DateTime<FixedOffset>) -> String {
    value.format("%Y-%m-%dT%H:%M:%S%:z").to_string()
}

/// `YYYY-MM-DD`
#[must_use]
pub fn date(value: &NaiveDate) -> String {
    value.format("%Y-%m-%d").to_string()
}

/// Plate without the `-` separator
#[must_use]
pub fn plate(value: &str) -> String {
    value.trim().replace('-', "")
}

pub(crate) fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}

/// Ordered section under construction; repeated keys are kept
#[derive(Debug)]
pub(crate) struct SectionBuf {
    name: String,
    entries: Vec<(String, String)>,
}

impl SectionBuf {
    pub(crate) fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            entries: Vec::new(),
        }
    }

    pub(crate) fn put(&mut self, key: impl Into<String>, value: impl ToString) -> &mut Self {
        self.entries.push((key.into(), value.to_string()));
        self
    }

    pub(crate) fn put_opt(&mut self, key: &str, value: Option<&str>) -> &mut Self {
        if let Some(value) = non_blank(value) {
            self.put(key, value);
        }
        self
    }
}

/// Accumulates sections and renders them with [`IniWriter`]
#[derive(Debug, Default)]
pub(crate) struct IniBuilder {
    sections: Vec<SectionBuf>,
}

impl IniBuilder {
    pub(crate) fn push(&mut self, section: SectionBuf) {
        self.sections.push(section);
    }

    pub(crate) fn header(&mut self, name: &str) {
        self.sections.push(SectionBuf::new(name));
    }

    pub(crate) fn len(&self) -> usize {
        self.sections.len()
    }

    pub(crate) fn finish(self) -> String {
        let writer = IniWriter::new();
        let mut out = String::new();
        for section in &self.sections {
            writer.write_section(
                &mut out,
                &section.name,
                section.entries.iter().map(|(k, v)| (k.as_str(), v.as_str())),
            );
        }
        out
    }
}
