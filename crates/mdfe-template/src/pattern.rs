//! Wildcard section names
//!
//! A template section named e.g. `INFNFEXXX` stands for any candidate
//! section whose name has three digits in place of the `XXX` run. Runs of
//! `x`, `y` or `z` (case-insensitive) of length [`MIN_PLACEHOLDER_RUN`] or
//! more become digit runs of the same length; shorter runs and every other
//! character match literally.

use crate::error::{Result, TemplateError};
use mdfe_ini::IniSection;
use regex::{Regex, RegexBuilder};
use std::fmt::Write as _;

/// Shortest placeholder run that becomes a digit run
pub const MIN_PLACEHOLDER_RUN: usize = 3;

const PLACEHOLDER_CHARS: [char; 3] = ['x', 'y', 'z'];

/// True when `name` contains a placeholder run (`xxx`, `yyy` or `zzz`)
#[must_use]
pub fn is_placeholder_name(name: &str) -> bool {
    let lower = name.to_ascii_lowercase();
    PLACEHOLDER_CHARS
        .iter()
        .any(|c| lower.contains(&c.to_string().repeat(MIN_PLACEHOLDER_RUN)))
}

/// Anchored regex source for a template section name
#[must_use]
pub fn pattern_source(template_name: &str) -> String {
    let chars: Vec<char> = template_name.chars().collect();
    let mut source = String::with_capacity(chars.len() + 8);
    source.push('^');

    let mut index = 0;
    while index < chars.len() {
        let current = chars[index];
        let lower = current.to_ascii_lowercase();

        if PLACEHOLDER_CHARS.contains(&lower) {
            let run = chars[index..]
                .iter()
                .take_while(|c| c.to_ascii_lowercase() == lower)
                .count();
            if run >= MIN_PLACEHOLDER_RUN {
                let _ = write!(source, "[0-9]{{{run}}}");
                index += run;
                continue;
            }
        }

        source.push_str(&regex::escape(&current.to_string()));
        index += 1;
    }

    source.push('$');
    source
}

/// Compiled matcher for one placeholder section name
#[derive(Debug, Clone)]
pub struct SectionPattern {
    template_name: String,
    regex: Regex,
}

impl SectionPattern {
    /// Template section name the pattern was built from
    #[inline]
    #[must_use]
    pub fn template_name(&self) -> &str {
        &self.template_name
    }

    /// Whether a candidate section name matches
    #[inline]
    #[must_use]
    pub fn is_match(&self, section_name: &str) -> bool {
        self.regex.is_match(section_name)
    }

    /// Regex source, for diagnostics
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.regex.as_str()
    }
}

/// Compile a template section name into a case-insensitive matcher
pub fn compile_pattern(template_name: &str) -> Result<SectionPattern> {
    let regex = RegexBuilder::new(&pattern_source(template_name))
        .case_insensitive(true)
        .build()
        .map_err(|e| TemplateError::invalid_pattern(template_name, e))?;

    Ok(SectionPattern {
        template_name: template_name.to_string(),
        regex,
    })
}

/// Placeholder template section: its matcher plus the keys it requires
#[derive(Debug, Clone)]
pub struct TemplatePattern {
    pattern: SectionPattern,
    section: IniSection,
}

impl TemplatePattern {
    /// Build from a template section
    pub fn from_section(section: &IniSection) -> Result<Self> {
        Ok(Self {
            pattern: compile_pattern(section.name())?,
            section: section.clone(),
        })
    }

    /// Matcher
    #[inline]
    #[must_use]
    pub fn pattern(&self) -> &SectionPattern {
        &self.pattern
    }

    /// Template section holding the expected keys
    #[inline]
    #[must_use]
    pub fn section(&self) -> &IniSection {
        &self.section
    }

    /// Patterns are never required to match
    #[inline]
    #[must_use]
    pub const fn is_mandatory(&self) -> bool {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn three_run_becomes_digits() {
        let p = compile_pattern("MUNCARREGAXXX").unwrap();
        assert!(p.is_match("MUNCARREGA012"));
        assert!(p.is_match("muncarrega999"));
        assert!(!p.is_match("MUNCARREGA12"));
        assert!(!p.is_match("MUNCARREGA0123"));
        assert!(!p.is_match("MUNCARREGAXY"));
    }

    #[test]
    fn short_runs_stay_literal() {
        assert_eq!(pattern_source("CONDUTORXX"), "^CONDUTORXX$");
        let p = compile_pattern("CONDUTORXX").unwrap();
        assert!(p.is_match("condutorxx"));
        assert!(!p.is_match("CONDUTOR01"));
    }

    #[test]
    fn mixed_runs_and_escaping() {
        assert_eq!(pattern_source("A.YYYYzz"), r"^A\.[0-9]{4}zz$");
        assert!(is_placeholder_name("infctexxx"));
        assert!(is_placeholder_name("DISPZZZ"));
        assert!(!is_placeholder_name("EXXTRA"));
    }
}
