//! INI text emission

use crate::document::IniDocument;
use std::fmt::Write as _;

/// Renders documents as `[NAME]` headers followed by `key=value` lines.
///
/// Each section is followed by one blank line. Output does not attempt to
/// reproduce comments or spacing from a parsed source.
#[derive(Debug, Clone, Copy)]
pub struct IniWriter {
    line_ending: &'static str,
}

impl Default for IniWriter {
    fn default() -> Self {
        Self::new()
    }
}

impl IniWriter {
    /// Writer using `\n`
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { line_ending: "\n" }
    }

    /// Writer using `\r\n`, as some native engines expect
    #[inline]
    #[must_use]
    pub const fn crlf() -> Self {
        Self {
            line_ending: "\r\n",
        }
    }

    /// Render the whole document
    #[must_use]
    pub fn write(&self, doc: &IniDocument) -> String {
        let mut out = String::new();
        for section in doc.sections() {
            self.write_section(&mut out, section.name(), section.iter());
        }
        out
    }

    /// Append one section from raw pairs.
    ///
    /// Pairs are written as given, so repeated keys are kept; use this when
    /// the consumer reads keys positionally.
    pub fn write_section<'a>(
        &self,
        out: &mut String,
        name: &str,
        entries: impl IntoIterator<Item = (&'a str, &'a str)>,
    ) {
        // writing into a String cannot fail
        let _ = write!(out, "[{name}]{}", self.line_ending);
        for (key, value) in entries {
            let _ = write!(out, "{key}={value}{}", self.line_ending);
        }
        out.push_str(self.line_ending);
    }
}
