//! Line-oriented INI parser
//!
//! Two modes are provided:
//! - **Strict**: payload/template grammar. Rejects empty input and stray
//!   lines, treats `;` as a comment marker.
//! - **Lenient**: engine response grammar. Accepts empty input, ignores
//!   stray lines, keeps `;` inside values (responses embed XML and text).

use crate::document::IniDocument;
use crate::error::{IniError, Result};
use crate::section::IniSection;

/// Parsing mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ParseMode {
    /// Template and payload grammar
    #[default]
    Strict,
    /// Native engine response grammar
    Lenient,
}

/// Stateless INI parser
#[derive(Debug, Clone, Copy, Default)]
pub struct IniParser {
    mode: ParseMode,
}

impl IniParser {
    /// Create strict parser
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            mode: ParseMode::Strict,
        }
    }

    /// Create lenient parser for engine responses
    #[inline]
    #[must_use]
    pub const fn lenient() -> Self {
        Self {
            mode: ParseMode::Lenient,
        }
    }

    /// Active mode
    #[inline]
    #[must_use]
    pub const fn mode(&self) -> ParseMode {
        self.mode
    }

    /// Parse `text` into a document
    pub fn parse(&self, text: &str) -> Result<IniDocument> {
        match self.mode {
            ParseMode::Strict => parse_strict(text),
            ParseMode::Lenient => Ok(parse_lenient(text)),
        }
    }
}

fn section_header(line: &str) -> Option<&str> {
    if line.starts_with('[') && line.ends_with(']') && line.len() >= 2 {
        Some(line[1..line.len() - 1].trim())
    } else {
        None
    }
}

fn parse_strict(text: &str) -> Result<IniDocument> {
    if text.trim().is_empty() {
        return Err(IniError::EmptyInput);
    }

    let mut doc = IniDocument::new();
    let mut current: Option<IniSection> = None;

    for (number, raw) in text.lines().enumerate() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with(';') {
            continue;
        }

        if let Some(name) = section_header(line) {
            if let Some(done) = current.take() {
                doc.push(done);
            }
            current = Some(IniSection::new(name)?);
            continue;
        }

        let Some(section) = current.as_mut() else {
            return Err(IniError::outside_section(number + 1));
        };

        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let value = match value.find(';') {
            Some(pos) => &value[..pos],
            None => value,
        };
        section.insert(key.trim(), value.trim());
    }

    if let Some(done) = current {
        doc.push(done);
    }
    Ok(doc)
}

fn parse_lenient(text: &str) -> IniDocument {
    let mut doc = IniDocument::new();
    let mut current: Option<IniSection> = None;

    for raw in text.lines() {
        let line = raw.trim();
        if line.is_empty() {
            continue;
        }

        if let Some(name) = section_header(line) {
            if let Some(done) = current.take() {
                doc.push(done);
            }
            // `[]` opens nothing; its keys are dropped
            current = IniSection::new(name).ok();
            continue;
        }

        let Some(section) = current.as_mut() else {
            tracing::trace!(line = %line, "ignoring response line outside section");
            continue;
        };

        match line.split_once('=') {
            Some((key, value)) if !key.trim().is_empty() => {
                section.insert(key.trim(), value.trim());
            }
            _ => {}
        }
    }

    if let Some(done) = current {
        doc.push(done);
    }
    doc
}
