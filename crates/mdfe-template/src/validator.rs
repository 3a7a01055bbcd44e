//! Candidate-vs-template comparison

use crate::comparison::ComparisonResult;
use crate::error::{Result, TemplateError};
use crate::provider::TemplateProvider;
use indexmap::IndexMap;
use mdfe_ini::{IniDocument, IniParser, IniSection};
use std::collections::VecDeque;

/// Compares generated INI against the canonical template.
///
/// Candidate sections are visited in order. An exact-name template
/// section is consumed first-in first-out; otherwise the first matching
/// wildcard section is used; otherwise the section is extra. Exact
/// template sections left unconsumed are missing. Wildcards are optional.
#[derive(Debug, Clone)]
pub struct MdfeIniValidator {
    parser: IniParser,
    template: TemplateProvider,
}

impl MdfeIniValidator {
    /// Validator over a given template
    #[must_use]
    pub fn new(template: TemplateProvider) -> Self {
        Self {
            parser: IniParser::new(),
            template,
        }
    }

    /// Validator over the embedded template
    pub fn embedded() -> Result<Self> {
        TemplateProvider::embedded().map(Self::new)
    }

    /// Compare candidate text with the template
    pub fn compare_with_template(&self, ini: &str) -> Result<ComparisonResult> {
        if ini.trim().is_empty() {
            return Err(TemplateError::EmptyCandidate);
        }
        let candidate = self.parser.parse(ini)?;
        Ok(self.compare_document(&candidate))
    }

    /// Compare an already parsed candidate
    #[must_use]
    pub fn compare_document(&self, candidate: &IniDocument) -> ComparisonResult {
        let mut result = ComparisonResult::default();
        let mut exact = self.exact_queues();

        for section in candidate.sections() {
            let folded = section.name().to_ascii_lowercase();
            if let Some(template_section) = exact.get_mut(&folded).and_then(VecDeque::pop_front) {
                compare_section(template_section, section, &mut result);
                continue;
            }

            let matched = self
                .template
                .patterns()
                .iter()
                .find(|p| p.pattern().is_match(section.name()));

            match matched {
                Some(pattern) => {
                    *result
                        .pattern_matches
                        .entry(pattern.pattern().template_name().to_string())
                        .or_insert(0) += 1;
                    compare_section(pattern.section(), section, &mut result);
                }
                None => result.add_extra_section(section.name()),
            }
        }

        for remaining in exact.values().flatten() {
            result.add_missing_section(remaining.name());
        }

        for pattern in self.template.patterns() {
            let name = pattern.pattern().template_name();
            if pattern.is_mandatory() && !result.pattern_matches.contains_key(name) {
                result.add_missing_section(name);
            }
        }

        tracing::debug!(
            defects = result.defect_count(),
            is_match = result.is_match(),
            "template comparison finished"
        );
        result
    }

    /// Parse candidate text with the strict codec
    pub fn parse(&self, ini: &str) -> Result<IniDocument> {
        Ok(self.parser.parse(ini)?)
    }

    /// Raw template text
    #[must_use]
    pub fn template_content(&self) -> &str {
        self.template.content()
    }

    fn exact_queues(&self) -> IndexMap<String, VecDeque<&IniSection>> {
        let mut queues: IndexMap<String, VecDeque<&IniSection>> = IndexMap::new();
        for section in self.template.document().sections() {
            if crate::pattern::is_placeholder_name(section.name()) {
                continue;
            }
            queues
                .entry(section.name().to_ascii_lowercase())
                .or_default()
                .push_back(section);
        }
        queues
    }
}

fn compare_section(template: &IniSection, candidate: &IniSection, result: &mut ComparisonResult) {
    let name = candidate.name();

    for key in template.keys() {
        match candidate.get(key) {
            None => result.missing_keys.add(name, key),
            Some(value) if value.trim().is_empty() => result.empty_values.add(name, key),
            Some(value) if is_placeholder_value(value) => result.placeholder_values.add(name, key),
            Some(_) => {}
        }
    }

    for key in candidate.keys() {
        if !template.contains_key(key) {
            result.extra_keys.add(name, key);
        }
    }
}

fn is_placeholder_value(value: &str) -> bool {
    value.contains('<') && value.contains('>')
}
