//! Read-only manifest projection supplied by the persistence layer
//!
//! Field groups follow the document's blocks: identification, emitter,
//! road modal, vehicles, conductors, route, referenced documents, totals,
//! insurance, payments, toll vouchers and the trailing optional blocks.

use crate::amount::Decimal2;
use crate::document::digits_only;
use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Persistence identifier of a manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ManifestId(pub u64);

impl fmt::Display for ManifestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Authority environment
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    /// Production (`tpAmb=1`)
    Production,
    /// Homologation / test (`tpAmb=2`)
    #[default]
    Homologation,
}

impl Environment {
    /// Value for the document's `tpAmb` field
    #[must_use]
    pub const fn tp_amb(self) -> u8 {
        match self {
            Self::Production => 1,
            Self::Homologation => 2,
        }
    }

    /// Human label
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Production => "production",
            Self::Homologation => "homologation",
        }
    }

    /// Parse a `tpAmb` value
    #[must_use]
    pub fn from_tp_amb(value: &str) -> Option<Self> {
        match value.trim() {
            "1" => Some(Self::Production),
            "2" => Some(Self::Homologation),
            _ => None,
        }
    }
}

/// Kind of upstream fiscal document referenced by the manifest
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DocumentKind {
    /// Electronic invoice (NF-e)
    #[serde(rename = "NFe")]
    Nfe,
    /// Electronic transport bill (CT-e)
    #[serde(rename = "CTe")]
    Cte,
}

impl DocumentKind {
    /// Parse `NFe` / `CTe`, case-insensitive
    #[must_use]
    pub fn parse(text: &str) -> Option<Self> {
        match text.trim().to_ascii_uppercase().as_str() {
            "NFE" => Some(Self::Nfe),
            "CTE" => Some(Self::Cte),
            _ => None,
        }
    }

    /// Key field name used for this kind (`chNFe` / `chCTe`)
    #[must_use]
    pub const fn key_field(self) -> &'static str {
        match self {
            Self::Nfe => "chNFe",
            Self::Cte => "chCTe",
        }
    }
}

impl fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Nfe => "NFe",
            Self::Cte => "CTe",
        })
    }
}

/// `ide` block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Identification {
    /// Document series
    pub series: u32,
    /// Document number
    pub number: u64,
    /// 8-digit numeric code; random filler is generated when absent
    #[serde(default)]
    pub check_code: Option<String>,
    /// Key check digit (computed downstream)
    #[serde(default)]
    pub check_digit: Option<String>,
    /// 1 road, 2 air, 3 water, 4 rail
    #[serde(default = "default_modal")]
    pub modal: u8,
    /// 1 service provider, 2 own cargo, 3 global CT-e
    pub emitter_type: u8,
    /// 1 ETC, 2 TAC, 3 CTC
    #[serde(default)]
    pub transporter_type: Option<u8>,
    /// Authority environment
    #[serde(default)]
    pub environment: Environment,
    /// Emission timestamp
    pub emitted_at: DateTime<FixedOffset>,
    /// Trip start timestamp
    #[serde(default)]
    pub trip_start: Option<DateTime<FixedOffset>>,
    /// Loading UF
    pub uf_start: String,
    /// Unloading UF
    pub uf_end: String,
}

fn default_modal() -> u8 {
    1
}

/// `emit` block
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Emitter {
    /// Company number (takes precedence over `cpf`)
    #[serde(default)]
    pub cnpj: Option<String>,
    /// Individual number
    #[serde(default)]
    pub cpf: Option<String>,
    /// State registration
    #[serde(default)]
    pub ie: Option<String>,
    /// Legal name
    pub name: String,
    /// Trade name
    #[serde(default)]
    pub trade_name: Option<String>,
    /// Street
    pub street: String,
    /// Street number (`S/N` when absent)
    #[serde(default)]
    pub number: Option<String>,
    /// Address complement
    #[serde(default)]
    pub complement: Option<String>,
    /// District
    pub district: String,
    /// IBGE municipality code
    pub municipality_code: u32,
    /// Municipality name
    pub municipality: String,
    /// Postal code, formatting allowed
    pub cep: String,
    /// UF abbreviation
    pub uf: String,
}

impl Emitter {
    /// CNPJ if set, else CPF, as digits
    #[must_use]
    pub fn document(&self) -> Option<String> {
        non_blank(self.cnpj.as_deref())
            .or_else(|| non_blank(self.cpf.as_deref()))
            .map(digits_only)
    }
}

/// `rodo` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoadModal {
    /// Carrier registration (RNTRC)
    #[serde(default)]
    pub rntrc: Option<String>,
    /// Transport operation identifier (CIOT)
    #[serde(default)]
    pub ciot: Option<String>,
}

/// Owner of the tractor vehicle when it is not the emitter
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VehicleOwner {
    /// Individual number
    #[serde(default)]
    pub cpf: Option<String>,
    /// Company number
    #[serde(default)]
    pub cnpj: Option<String>,
    /// Carrier registration
    #[serde(default)]
    pub rntrc: Option<String>,
    /// Owner name
    #[serde(default)]
    pub name: Option<String>,
    /// State registration
    #[serde(default)]
    pub ie: Option<String>,
    /// Owner UF
    #[serde(default)]
    pub uf: Option<String>,
}

impl VehicleOwner {
    /// CPF if set, else CNPJ, as digits
    #[must_use]
    pub fn document(&self) -> Option<String> {
        non_blank(self.cpf.as_deref())
            .or_else(|| non_blank(self.cnpj.as_deref()))
            .map(digits_only)
    }

    /// True when this owner is a different party than the emitter
    #[must_use]
    pub fn differs_from(&self, emitter: &Emitter) -> bool {
        match (self.document(), emitter.document()) {
            (Some(owner), Some(emit)) => owner != emit,
            (Some(_), None) => true,
            (None, _) => false,
        }
    }
}

/// `veicTracao` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TractorVehicle {
    /// Plate, `-` allowed
    pub plate: String,
    /// Tare in kg
    #[serde(default)]
    pub tare_kg: Option<u32>,
    /// Wheel type (`tpRod`)
    pub wheel_type: String,
    /// Body type (`tpCar`)
    pub body_type: String,
    /// Licensing UF
    pub uf: String,
    /// Owner override
    #[serde(default)]
    pub owner: Option<VehicleOwner>,
}

/// Driver
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Conductor {
    /// Full name
    pub name: String,
    /// CPF, formatting allowed
    pub cpf: String,
}

/// `veicReboque` entry
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Trailer {
    /// Plate, `-` allowed
    pub plate: String,
    /// Tare in kg; zero is omitted
    #[serde(default)]
    pub tare_kg: u32,
    /// Body type
    #[serde(default)]
    pub body_type: Option<String>,
    /// Licensing UF
    #[serde(default)]
    pub uf: Option<String>,
}

/// Loading / unloading municipality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Municipality {
    /// IBGE code
    pub code: u32,
    /// Name
    pub name: String,
}

/// Referenced NF-e / CT-e
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferencedDocument {
    /// Document kind
    pub kind: DocumentKind,
    /// 44-digit access key
    pub key: String,
    /// Contingency barcode segment
    #[serde(default)]
    pub barcode_segment: Option<String>,
    /// Redelivery indicator
    #[serde(default)]
    pub redelivery: Option<String>,
}

/// Declared cargo totals (document counts are derived)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CargoTotals {
    /// Declared cargo value
    #[serde(default)]
    pub value: Decimal2,
    /// Unit code (`01` kg, `02` ton)
    #[serde(default = "default_unit")]
    pub unit: String,
    /// Declared gross weight
    #[serde(default)]
    pub gross_weight: Decimal2,
    /// Count of transported manifests (`qMDFe`)
    #[serde(default)]
    pub transported_manifests: u32,
}

impl Default for CargoTotals {
    fn default() -> Self {
        Self {
            value: Decimal2::ZERO,
            unit: default_unit(),
            gross_weight: Decimal2::ZERO,
            transported_manifests: 0,
        }
    }
}

fn default_unit() -> String {
    "01".to_string()
}

/// `seg` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Insurance {
    /// Responsible party (`infResp`, default `1`)
    #[serde(default)]
    pub responsible: Option<String>,
    /// Insurer CNPJ; the block is emitted only when set
    #[serde(default)]
    pub insurer_cnpj: Option<String>,
    /// Policy number
    #[serde(default)]
    pub policy_number: Option<String>,
    /// Endorsement number
    #[serde(default)]
    pub endorsement: Option<String>,
}

/// Payment component
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentComponent {
    /// Component type (`tpComp`)
    pub kind: String,
    /// Amount
    pub value: Decimal2,
    /// Description
    #[serde(default)]
    pub description: Option<String>,
}

/// Payment installment
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Installment {
    /// Installment number
    pub number: u32,
    /// Due date
    pub due: NaiveDate,
    /// Amount
    pub value: Decimal2,
}

/// Bank data for a payment
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankData {
    /// Bank code
    #[serde(default)]
    pub bank_code: Option<String>,
    /// Agency code
    #[serde(default)]
    pub agency: Option<String>,
    /// Payment institution CNPJ (IPEF)
    #[serde(default)]
    pub ipef_cnpj: Option<String>,
    /// PIX key
    #[serde(default)]
    pub pix: Option<String>,
}

/// `infPag` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Payment {
    /// Contractor name
    #[serde(default)]
    pub name: Option<String>,
    /// CNPJ (14 digits) or CPF
    #[serde(default)]
    pub document: Option<String>,
    /// Contract value
    #[serde(default)]
    pub contract_value: Option<Decimal2>,
    /// 0 paid, 1 to pay
    #[serde(default)]
    pub indicator: u8,
    /// Components
    #[serde(default)]
    pub components: Vec<PaymentComponent>,
    /// Installments
    #[serde(default)]
    pub installments: Vec<Installment>,
    /// Bank data
    #[serde(default)]
    pub bank: Option<BankData>,
}

/// Toll voucher disbursement
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Disbursement {
    /// Supplier CNPJ
    pub supplier_cnpj: String,
    /// Payer CNPJ
    #[serde(default)]
    pub payer_cnpj: Option<String>,
    /// Purchase number
    pub purchase_number: String,
    /// Voucher value
    pub value: Decimal2,
}

/// `valePed` block
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum TollVouchers {
    /// Trip declared without toll voucher
    NoVoucher,
    /// One or more disbursements
    Disbursements {
        /// Vouchers in stored order
        items: Vec<Disbursement>,
    },
}

/// `infRespTec` block
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnicalResponsible {
    /// Company number
    #[serde(default)]
    pub cnpj: Option<String>,
    /// Contact name
    #[serde(default)]
    pub contact: Option<String>,
    /// Contact e-mail
    #[serde(default)]
    pub email: Option<String>,
    /// Contact phone
    #[serde(default)]
    pub phone: Option<String>,
    /// CSRT identifier
    #[serde(default)]
    pub csrt_id: Option<String>,
    /// CSRT hash
    #[serde(default)]
    pub csrt_hash: Option<String>,
}

/// Lifecycle flags and authority identifiers written back by the bridge
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ManifestStatus {
    /// 44-digit access key
    #[serde(default)]
    pub access_key: Option<String>,
    /// Authorization protocol
    #[serde(default)]
    pub protocol: Option<String>,
    /// Submission receipt
    #[serde(default)]
    pub receipt: Option<String>,
    /// Authorized XML
    #[serde(default)]
    pub authorized_xml: Option<String>,
    /// Authorization timestamp
    #[serde(default)]
    pub authorized_at: Option<DateTime<FixedOffset>>,
    /// Sent to the authority
    #[serde(default)]
    pub transmitted: bool,
    /// Authorized by the authority
    #[serde(default)]
    pub authorized: bool,
    /// Cancelled
    #[serde(default)]
    pub cancelled: bool,
    /// Closed
    #[serde(default)]
    pub closed: bool,
}

/// Complete manifest projection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ManifestAggregate {
    /// Persistence id
    pub id: ManifestId,
    /// `ide`
    pub identification: Identification,
    /// `emit`
    pub emitter: Emitter,
    /// `rodo`
    #[serde(default)]
    pub road: RoadModal,
    /// `veicTracao`
    pub vehicle: TractorVehicle,
    /// Primary conductor
    #[serde(default)]
    pub primary_conductor: Option<Conductor>,
    /// Additional conductors in stored order
    #[serde(default)]
    pub additional_conductors: Vec<Conductor>,
    /// Trailers
    #[serde(default)]
    pub trailers: Vec<Trailer>,
    /// Road seal numbers
    #[serde(default)]
    pub seals: Vec<String>,
    /// Route UFs
    #[serde(default)]
    pub route_ufs: Vec<String>,
    /// Loading municipalities (1..N)
    pub loading: Vec<Municipality>,
    /// Unloading municipalities (1..N)
    pub unloading: Vec<Municipality>,
    /// Referenced NF-e / CT-e in stored order
    #[serde(default)]
    pub documents: Vec<ReferencedDocument>,
    /// Declared totals
    #[serde(default)]
    pub totals: CargoTotals,
    /// Insurance
    #[serde(default)]
    pub insurance: Option<Insurance>,
    /// Payment blocks
    #[serde(default)]
    pub payments: Vec<Payment>,
    /// Toll vouchers
    #[serde(default)]
    pub toll_vouchers: Option<TollVouchers>,
    /// Free text for the tax authority
    #[serde(default)]
    pub additional_info: Option<String>,
    /// CPF / CNPJ allowed to download the XML
    #[serde(default)]
    pub xml_authorizations: Vec<String>,
    /// Technical responsible
    #[serde(default)]
    pub technical_responsible: Option<TechnicalResponsible>,
    /// Lifecycle projection
    #[serde(default)]
    pub status: ManifestStatus,
}

impl ManifestAggregate {
    /// Primary conductor followed by additional ones
    pub fn conductors(&self) -> impl Iterator<Item = &Conductor> {
        self.primary_conductor
            .iter()
            .chain(self.additional_conductors.iter())
    }

    /// Referenced documents of one kind, stored order
    pub fn documents_of(&self, kind: DocumentKind) -> impl Iterator<Item = &ReferencedDocument> {
        self.documents.iter().filter(move |d| d.kind == kind)
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn emitter(cnpj: &str) -> Emitter {
        Emitter {
            cnpj: Some(cnpj.to_string()),
            ..Emitter::default()
        }
    }

    #[test]
    fn owner_comparison_ignores_formatting() {
        let owner = VehicleOwner {
            cnpj: Some("11.222.333/0001-81".into()),
            ..VehicleOwner::default()
        };
        assert!(!owner.differs_from(&emitter("11222333000181")));
        assert!(owner.differs_from(&emitter("99888777000166")));
        assert!(!VehicleOwner::default().differs_from(&emitter("11222333000181")));
    }

    #[test]
    fn document_kind_parsing() {
        assert_eq!(DocumentKind::parse("nfe"), Some(DocumentKind::Nfe));
        assert_eq!(DocumentKind::parse(" CTe "), Some(DocumentKind::Cte));
        assert_eq!(DocumentKind::parse("MDFe"), None);
        assert_eq!(DocumentKind::Cte.key_field(), "chCTe");
    }
}
