//! Canonical template source
//!
//! The embedded template is parsed once per process and shared; custom
//! templates can be built with [`TemplateProvider::from_source`].

use crate::error::Result;
use crate::pattern::{is_placeholder_name, TemplatePattern};
use crate::TemplateError;
use mdfe_ini::{IniDocument, IniParser};
use once_cell::sync::Lazy;
use std::sync::Arc;

/// Template shipped with the crate
pub const EMBEDDED_TEMPLATE: &str = include_str!("../templates/mdfe_modelo.ini");

static EMBEDDED: Lazy<std::result::Result<TemplateProvider, TemplateError>> = Lazy::new(|| {
    tracing::debug!("loading embedded MDFe template");
    TemplateProvider::from_source(EMBEDDED_TEMPLATE)
});

#[derive(Debug)]
struct Inner {
    content: String,
    document: IniDocument,
    patterns: Vec<TemplatePattern>,
}

/// Read-only template: raw text, parsed document and compiled wildcards
#[derive(Debug, Clone)]
pub struct TemplateProvider {
    inner: Arc<Inner>,
}

impl TemplateProvider {
    /// Shared embedded template
    pub fn embedded() -> Result<Self> {
        (*EMBEDDED).clone()
    }

    /// Parse a template from text
    pub fn from_source(content: impl Into<String>) -> Result<Self> {
        let content = content.into();
        let document = IniParser::new().parse(&content)?;
        let patterns = document
            .sections()
            .iter()
            .filter(|s| is_placeholder_name(s.name()))
            .map(TemplatePattern::from_section)
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            inner: Arc::new(Inner {
                content,
                document,
                patterns,
            }),
        })
    }

    /// Parsed template
    #[inline]
    #[must_use]
    pub fn document(&self) -> &IniDocument {
        &self.inner.document
    }

    /// Raw template text
    #[inline]
    #[must_use]
    pub fn content(&self) -> &str {
        &self.inner.content
    }

    /// Wildcard sections in template order
    #[inline]
    #[must_use]
    pub fn patterns(&self) -> &[TemplatePattern] {
        &self.inner.patterns
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn embedded_template_parses_once() {
        let a = TemplateProvider::embedded().unwrap();
        let b = TemplateProvider::embedded().unwrap();
        assert!(Arc::ptr_eq(&a.inner, &b.inner));
        assert!(a.document().contains_section("IDE"));
        assert!(!a.patterns().is_empty());
    }

    #[test]
    fn placeholder_sections_become_patterns() {
        let provider =
            TemplateProvider::from_source("[TOT]\nqNFe=1\n\n[INFNFEXXX]\nchNFe=<chave>\n").unwrap();
        let names: Vec<_> = provider
            .patterns()
            .iter()
            .map(|p| p.pattern().template_name())
            .collect();
        assert_eq!(names, ["INFNFEXXX"]);
    }
}
