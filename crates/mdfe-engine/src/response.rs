//! Engine response parsing
//!
//! Responses are INI text. Sections and keys are looked up
//! case-insensitively; when a section name repeats, the first one is read.
//! Success is exact string equality of `cStat` against the codes in
//! [`cstat`]. The raw text is kept on every parsed value.

use mdfe_ini::{IniDocument, IniParser};
use serde::{Deserialize, Serialize};

/// Authority status codes treated as success
pub mod cstat {
    //! `cStat` values
    /// Document authorized
    pub const AUTHORIZED: &str = "100";
    /// Service operational
    pub const SERVICE_OPERATIONAL: &str = "107";
    /// Event registered and linked
    pub const EVENT_REGISTERED: &str = "135";
    /// Event registered, not linked
    pub const EVENT_REGISTERED_UNLINKED: &str = "136";
    /// Distribution found documents
    pub const DOCUMENTS_FOUND: &str = "138";
}

/// Common view over parsed responses
pub trait AuthorityResponse {
    /// Whether `cStat` is a success code for this response kind
    fn is_success(&self) -> bool;
    /// `cStat`
    fn code(&self) -> Option<&str>;
    /// `xMotivo`
    fn reason(&self) -> Option<&str>;
    /// Unparsed response
    fn raw(&self) -> &str;
}

macro_rules! authority_response {
    ($ty:ty) => {
        impl AuthorityResponse for $ty {
            fn is_success(&self) -> bool {
                self.success
            }

            fn code(&self) -> Option<&str> {
                self.code.as_deref()
            }

            fn reason(&self) -> Option<&str> {
                self.reason.as_deref()
            }

            fn raw(&self) -> &str {
                &self.raw
            }
        }
    };
}

/// Document submission outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubmitResponse {
    /// `cStat == 100`
    pub success: bool,
    /// `[Envio] Lote`
    pub lot: Option<String>,
    /// `[Envio] VersaoAplicativo`
    pub app_version: Option<String>,
    /// `cStat`
    pub code: Option<String>,
    /// `xMotivo`
    pub reason: Option<String>,
    /// `nProt`
    pub protocol: Option<String>,
    /// `dhRecbto`
    pub received_at: Option<String>,
    /// `nRec`
    pub receipt: Option<String>,
    /// `[MDFE001] chMDFe`
    pub access_key: Option<String>,
    /// `[MDFE001] XML`
    pub authorized_xml: Option<String>,
    /// Response text
    pub raw: String,
}

/// Query by key or receipt outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryResponse {
    /// `cStat == 100`
    pub success: bool,
    /// `cStat`
    pub code: Option<String>,
    /// `xMotivo`
    pub reason: Option<String>,
    /// `nProt`
    pub protocol: Option<String>,
    /// `chMDFe`
    pub access_key: Option<String>,
    /// `dhRecbto`
    pub authorized_at: Option<String>,
    /// Response text
    pub raw: String,
}

/// Event submission outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventResponse {
    /// `cStat` is 135 or 136
    pub success: bool,
    /// `cStat`
    pub code: Option<String>,
    /// `xMotivo`
    pub reason: Option<String>,
    /// Event protocol (`nProt`)
    pub protocol: Option<String>,
    /// `chMDFe`
    pub access_key: Option<String>,
    /// `tpEvento`
    pub event_type: Option<String>,
    /// `dhRegEvento`
    pub registered_at: Option<String>,
    /// `[EVENTO001] XML`
    pub event_xml: Option<String>,
    /// Response text
    pub raw: String,
}

/// Service status outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatusResponse {
    /// `cStat == 107`
    pub success: bool,
    /// `cStat`
    pub code: Option<String>,
    /// `xMotivo`
    pub reason: Option<String>,
    /// `cUF`
    pub uf_code: Option<String>,
    /// `tpAmb`
    pub environment: Option<String>,
    /// `verAplic`
    pub app_version: Option<String>,
    /// `dhRecbto`
    pub received_at: Option<String>,
    /// Response text
    pub raw: String,
}

/// Distribution feed outcome
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DistributionResponse {
    /// `cStat == 138`
    pub success: bool,
    /// `cStat`
    pub code: Option<String>,
    /// `xMotivo`
    pub reason: Option<String>,
    /// `ultNSU`
    pub last_nsu: Option<String>,
    /// `maxNSU`
    pub max_nsu: Option<String>,
    /// `tpAmb`
    pub environment: Option<String>,
    /// Response text
    pub raw: String,
}

authority_response!(SubmitResponse);
authority_response!(QueryResponse);
authority_response!(EventResponse);
authority_response!(ServiceStatusResponse);
authority_response!(DistributionResponse);

struct Reader {
    doc: IniDocument,
}

impl Reader {
    fn new(raw: &str) -> Self {
        // lenient parsing never fails
        let doc = IniParser::lenient().parse(raw).unwrap_or_default();
        Self { doc }
    }

    fn get(&self, section: &str, key: &str) -> Option<String> {
        self.doc
            .section(section)
            .and_then(|s| s.get(key))
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    }
}

fn is_one_of(code: Option<&str>, accepted: &[&str]) -> bool {
    code.is_some_and(|c| accepted.contains(&c))
}

/// Parse a submission response
#[must_use]
pub fn parse_submit(raw: &str) -> SubmitResponse {
    let r = Reader::new(raw);
    let code = r.get("Retorno", "cStat");
    SubmitResponse {
        success: is_one_of(code.as_deref(), &[cstat::AUTHORIZED]),
        lot: r.get("Envio", "Lote"),
        app_version: r.get("Envio", "VersaoAplicativo"),
        reason: r.get("Retorno", "xMotivo"),
        protocol: r.get("Retorno", "nProt"),
        received_at: r.get("Retorno", "dhRecbto"),
        receipt: r.get("Retorno", "nRec"),
        access_key: r.get("MDFE001", "chMDFe"),
        authorized_xml: r.get("MDFE001", "XML"),
        code,
        raw: raw.to_string(),
    }
}

/// Parse a query response
#[must_use]
pub fn parse_query(raw: &str) -> QueryResponse {
    let r = Reader::new(raw);
    let code = r.get("Retorno", "cStat");
    QueryResponse {
        success: is_one_of(code.as_deref(), &[cstat::AUTHORIZED]),
        reason: r.get("Retorno", "xMotivo"),
        protocol: r.get("Retorno", "nProt"),
        access_key: r.get("Retorno", "chMDFe"),
        authorized_at: r.get("Retorno", "dhRecbto"),
        code,
        raw: raw.to_string(),
    }
}

/// Parse an event response
#[must_use]
pub fn parse_event(raw: &str) -> EventResponse {
    let r = Reader::new(raw);
    let code = r.get("Retorno", "cStat");
    EventResponse {
        success: is_one_of(
            code.as_deref(),
            &[cstat::EVENT_REGISTERED, cstat::EVENT_REGISTERED_UNLINKED],
        ),
        reason: r.get("Retorno", "xMotivo"),
        protocol: r.get("Retorno", "nProt"),
        access_key: r.get("Retorno", "chMDFe"),
        event_type: r.get("Retorno", "tpEvento"),
        registered_at: r.get("Retorno", "dhRegEvento"),
        event_xml: r.get("EVENTO001", "XML"),
        code,
        raw: raw.to_string(),
    }
}

/// Parse a service status response
#[must_use]
pub fn parse_service_status(raw: &str) -> ServiceStatusResponse {
    let r = Reader::new(raw);
    let code = r.get("Retorno", "cStat");
    ServiceStatusResponse {
        success: is_one_of(code.as_deref(), &[cstat::SERVICE_OPERATIONAL]),
        reason: r.get("Retorno", "xMotivo"),
        uf_code: r.get("Retorno", "cUF"),
        environment: r.get("Retorno", "tpAmb"),
        app_version: r.get("Retorno", "verAplic"),
        received_at: r.get("Retorno", "dhRecbto"),
        code,
        raw: raw.to_string(),
    }
}

/// Parse a distribution response
#[must_use]
pub fn parse_distribution(raw: &str) -> DistributionResponse {
    let r = Reader::new(raw);
    let code = r.get("DISTRIBUICAODFE", "cStat");
    DistributionResponse {
        success: is_one_of(code.as_deref(), &[cstat::DOCUMENTS_FOUND]),
        reason: r.get("DISTRIBUICAODFE", "xMotivo"),
        last_nsu: r.get("DISTRIBUICAODFE", "ultNSU"),
        max_nsu: r.get("DISTRIBUICAODFE", "maxNSU"),
        environment: r.get("DISTRIBUICAODFE", "tpAmb"),
        code,
        raw: raw.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn submit_reads_three_sections() {
        let raw = "[Envio]\nLote=1\nVersaoAplicativo=SP-MDFe\n\n[Retorno]\ncStat=100\nxMotivo=Autorizado o uso do MDF-e\nnProt=935240000000001\nnRec=351000000000001\ndhRecbto=2024-05-10T08:31:00-03:00\n\n[MDFE001]\nchMDFe=3524\nXML=<mdfeProc versao=\"3.00\"/>\n";
        let parsed = parse_submit(raw);
        assert!(parsed.is_success());
        assert_eq!(parsed.lot.as_deref(), Some("1"));
        assert_eq!(parsed.protocol.as_deref(), Some("935240000000001"));
        assert_eq!(parsed.receipt.as_deref(), Some("351000000000001"));
        assert_eq!(parsed.authorized_xml.as_deref(), Some("<mdfeProc versao=\"3.00\"/>"));
        assert_eq!(parsed.raw(), raw);
    }

    #[test]
    fn first_duplicate_section_wins() {
        let parsed = parse_query("[RETORNO]\ncstat=100\n[Retorno]\ncStat=217\n");
        assert_eq!(parsed.code(), Some("100"));
        assert!(parsed.success);
    }

    #[test]
    fn success_is_exact_match() {
        assert!(!parse_query("[Retorno]\ncStat= 1000\n").success);
        assert!(!parse_query("[Retorno]\ncStat=\n").success);
        assert!(parse_event("[Retorno]\ncStat=136\n").success);
        assert!(!parse_event("[Retorno]\ncStat=100\n").success);
        assert!(parse_service_status("[Retorno]\ncStat=107\n").success);
        assert!(parse_distribution("[DistribuicaoDFe]\ncStat=138\nultNSU=000000000000010\n").success);
    }

    #[test]
    fn empty_response_is_a_defined_failure() {
        let parsed = parse_submit("");
        assert!(!parsed.success);
        assert!(parsed.code.is_none());
        assert_eq!(parsed.raw, "");
    }
}
