//! Event INI generation
//!
//! Every event payload is two sections: `[EVENTO]` carrying the lot id and
//! `[EVENTO001]` carrying the event header plus the code-specific fields.
//! Code-specific inputs travel in [`EventRequest::fields`] under the names
//! in [`params`].

use crate::error::{GenerateError, Result};
use crate::format::{date, non_blank, timestamp, IniBuilder, SectionBuf};
use chrono::{DateTime, FixedOffset, NaiveDate};
use indexmap::IndexMap;
use mdfe_core::document::digits_only;
use mdfe_core::manifest::DocumentKind;
use mdfe_core::uf::uf_code_or_default;

/// Event type codes
pub mod codes {
    //! `tpEvento` values
    /// Cancellation
    pub const CANCELLATION: &str = "110111";
    /// Closure
    pub const CLOSURE: &str = "110112";
    /// Conductor inclusion
    pub const CONDUCTOR_INCLUSION: &str = "110114";
    /// Referenced-document inclusion
    pub const DOCUMENT_INCLUSION: &str = "110115";
}

/// Field names understood by the typed event codes
pub mod params {
    //! Keys of [`super::EventRequest::fields`]
    /// Authorization protocol (falls back to the context protocol)
    pub const PROTOCOL: &str = "protocol";
    /// Cancellation justification
    pub const JUSTIFICATION: &str = "justification";
    /// Closure municipality code
    pub const MUNICIPALITY_CODE: &str = "municipality_code";
    /// Closure date, `YYYY-MM-DD`
    pub const CLOSURE_DATE: &str = "closure_date";
    /// Included conductor name
    pub const CONDUCTOR_NAME: &str = "conductor_name";
    /// Included conductor CPF
    pub const CONDUCTOR_CPF: &str = "conductor_cpf";
    /// Unloading municipality of the included document
    pub const UNLOADING_MUNICIPALITY_CODE: &str = "unloading_municipality_code";
    /// Included document access key
    pub const DOCUMENT_KEY: &str = "document_key";
    /// Included document kind, `NFe` or `CTe`
    pub const DOCUMENT_KIND: &str = "document_kind";
}

/// Shortest accepted cancellation justification, in characters
pub const MIN_JUSTIFICATION_LEN: usize = 15;
/// Longest accepted cancellation justification, in characters
pub const MAX_JUSTIFICATION_LEN: usize = 255;

const CPF_DIGITS: usize = 11;

/// Manifest the event refers to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventContext {
    /// Emitter UF abbreviation
    pub uf: String,
    /// Emitter CNPJ or CPF
    pub cnpj_cpf: String,
    /// 44-digit access key
    pub access_key: String,
    /// Authorization protocol, when known
    pub protocol: Option<String>,
}

/// One event to render
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRequest {
    /// Six-digit `tpEvento`
    pub code: String,
    /// Target manifest
    pub context: EventContext,
    /// Event timestamp
    pub occurred_at: DateTime<FixedOffset>,
    /// `nSeqEvento`
    pub sequence: u32,
    /// Code-specific fields, insertion ordered
    pub fields: IndexMap<String, String>,
}

impl EventRequest {
    /// Request with no fields
    #[must_use]
    pub fn new(code: impl Into<String>, context: EventContext, occurred_at: DateTime<FixedOffset>) -> Self {
        Self {
            code: code.into(),
            context,
            occurred_at,
            sequence: 1,
            fields: IndexMap::new(),
        }
    }

    /// Add a field
    #[must_use]
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Set `nSeqEvento`
    #[must_use]
    pub fn with_sequence(mut self, sequence: u32) -> Self {
        self.sequence = sequence;
        self
    }

    /// Cancellation (`110111`)
    #[must_use]
    pub fn cancellation(
        context: EventContext,
        occurred_at: DateTime<FixedOffset>,
        justification: impl Into<String>,
    ) -> Self {
        Self::new(codes::CANCELLATION, context, occurred_at)
            .with_field(params::JUSTIFICATION, justification)
    }

    /// Closure (`110112`)
    #[must_use]
    pub fn closure(
        context: EventContext,
        occurred_at: DateTime<FixedOffset>,
        municipality_code: impl Into<String>,
        closure_date: NaiveDate,
    ) -> Self {
        Self::new(codes::CLOSURE, context, occurred_at)
            .with_field(params::MUNICIPALITY_CODE, municipality_code)
            .with_field(params::CLOSURE_DATE, date(&closure_date))
    }

    /// Conductor inclusion (`110114`)
    #[must_use]
    pub fn conductor_inclusion(
        context: EventContext,
        occurred_at: DateTime<FixedOffset>,
        name: impl Into<String>,
        cpf: impl Into<String>,
    ) -> Self {
        Self::new(codes::CONDUCTOR_INCLUSION, context, occurred_at)
            .with_field(params::CONDUCTOR_NAME, name)
            .with_field(params::CONDUCTOR_CPF, cpf)
    }

    /// Referenced-document inclusion (`110115`)
    #[must_use]
    pub fn document_inclusion(
        context: EventContext,
        occurred_at: DateTime<FixedOffset>,
        unloading_municipality_code: impl Into<String>,
        document_key: impl Into<String>,
        document_kind: impl Into<String>,
    ) -> Self {
        Self::new(codes::DOCUMENT_INCLUSION, context, occurred_at)
            .with_field(params::UNLOADING_MUNICIPALITY_CODE, unloading_municipality_code)
            .with_field(params::DOCUMENT_KEY, document_key)
            .with_field(params::DOCUMENT_KIND, document_kind)
    }

    fn field(&self, name: &str) -> Option<&str> {
        non_blank(self.fields.get(name).map(String::as_str))
    }

    fn require(&self, name: &str) -> Result<&str> {
        self.field(name).ok_or_else(|| GenerateError::missing(name))
    }

    fn protocol(&self) -> Result<&str> {
        self.field(params::PROTOCOL)
            .or_else(|| non_blank(self.context.protocol.as_deref()))
            .ok_or_else(|| GenerateError::missing(params::PROTOCOL))
    }
}

/// Renders [`EventRequest`]s
#[derive(Debug, Clone, Copy, Default)]
pub struct EventIniGenerator;

impl EventIniGenerator {
    /// Create generator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Render the two-section event payload
    pub fn generate(&self, request: &EventRequest) -> Result<String> {
        let code = request.code.trim();
        if code.len() != 6 || !code.bytes().all(|b| b.is_ascii_digit()) {
            return Err(GenerateError::InvalidEventCode {
                code: request.code.clone(),
            });
        }

        let ctx = &request.context;
        let access_key =
            non_blank(Some(ctx.access_key.as_str())).ok_or_else(|| GenerateError::missing("chMDFe"))?;
        let uf_code = uf_code_or_default(&ctx.uf);

        let mut event = SectionBuf::new("EVENTO001");
        event
            .put("cOrgao", uf_code)
            .put("CNPJCPF", digits_only(&ctx.cnpj_cpf))
            .put("chMDFe", access_key)
            .put("dhEvento", timestamp(&request.occurred_at))
            .put("tpEvento", code)
            .put("nSeqEvento", request.sequence)
            .put("versaoEvento", crate::manifest::LAYOUT_VERSION);

        match code {
            codes::CANCELLATION => {
                let justification = justification(request.field(params::JUSTIFICATION))?;
                event
                    .put("nProt", request.protocol()?)
                    .put("xJust", justification);
            }
            codes::CLOSURE => {
                let municipality = request.require(params::MUNICIPALITY_CODE)?;
                let closed_on = NaiveDate::parse_from_str(request.require(params::CLOSURE_DATE)?, "%Y-%m-%d")
                    .map_err(|e| GenerateError::invalid(params::CLOSURE_DATE, e.to_string()))?;
                event
                    .put("nProt", request.protocol()?)
                    .put("dtEnc", date(&closed_on))
                    .put("cUF", uf_code)
                    .put("cMun", municipality);
            }
            codes::CONDUCTOR_INCLUSION => {
                let name = request.require(params::CONDUCTOR_NAME)?;
                let cpf = conductor_cpf(request.require(params::CONDUCTOR_CPF)?)?;
                event.put("xNome", name).put("CPF", cpf);
            }
            codes::DOCUMENT_INCLUSION => {
                let municipality = request.require(params::UNLOADING_MUNICIPALITY_CODE)?;
                let key = request.require(params::DOCUMENT_KEY)?;
                let kind_text = request.field(params::DOCUMENT_KIND).unwrap_or("NFe");
                let kind = DocumentKind::parse(kind_text).ok_or_else(|| {
                    GenerateError::invalid(
                        params::DOCUMENT_KIND,
                        format!("'{kind_text}' is neither NFe nor CTe"),
                    )
                })?;
                event
                    .put_opt("nProt", request.protocol().ok())
                    .put("cMunDescarga", municipality)
                    .put(kind.key_field(), key);
            }
            _ => {
                for (key, value) in &request.fields {
                    event.put(key.as_str(), value);
                }
            }
        }

        let mut lot = SectionBuf::new("EVENTO");
        lot.put("idLote", 1);

        let mut ini = IniBuilder::default();
        ini.push(lot);
        ini.push(event);

        tracing::debug!(code = %code, "event ini generated");
        Ok(ini.finish())
    }
}

fn justification(value: Option<&str>) -> Result<&str> {
    let text = value.ok_or_else(|| GenerateError::missing(params::JUSTIFICATION))?;
    let len = text.chars().count();
    if (MIN_JUSTIFICATION_LEN..=MAX_JUSTIFICATION_LEN).contains(&len) {
        Ok(text)
    } else {
        Err(GenerateError::invalid(
            params::JUSTIFICATION,
            format!(
                "must have {MIN_JUSTIFICATION_LEN} to {MAX_JUSTIFICATION_LEN} characters, got {len}"
            ),
        ))
    }
}

fn conductor_cpf(raw: &str) -> Result<String> {
    let cleaned: String = raw.chars().filter(|c| !matches!(c, '.' | '-')).collect();
    if !cleaned.chars().all(|c| c.is_ascii_digit()) {
        return Err(GenerateError::invalid(
            params::CONDUCTOR_CPF,
            "only digits, '.' and '-' are allowed",
        ));
    }
    if cleaned.len() != CPF_DIGITS {
        return Err(GenerateError::invalid(
            params::CONDUCTOR_CPF,
            format!("must have {CPF_DIGITS} digits, got {}", cleaned.len()),
        ));
    }
    Ok(cleaned)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cpf_cleanup_rejects_letters() {
        assert_eq!(conductor_cpf("529.982.247-25").unwrap(), "52998224725");
        assert!(conductor_cpf("529.982.247/25").is_err());
    }

    #[test]
    fn cpf_needs_eleven_digits() {
        assert!(conductor_cpf("..-").is_err());
        assert!(conductor_cpf("").is_err());
        assert!(conductor_cpf("529.982.247-2").is_err());
    }

    #[test]
    fn justification_is_measured_in_chars() {
        let accented = "ç".repeat(15);
        assert!(justification(Some(&accented)).is_ok());
        assert!(matches!(
            justification(None),
            Err(GenerateError::MissingField { .. })
        ));
    }
}
