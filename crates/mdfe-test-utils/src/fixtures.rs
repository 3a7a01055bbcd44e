//! Sample manifests and engine responses

use chrono::DateTime;
use mdfe_core::manifest::{
    CargoTotals, Conductor, DocumentKind, Emitter, Identification, Municipality,
    ReferencedDocument, RoadModal, TollVouchers, TractorVehicle,
};
use mdfe_core::{Decimal2, Environment, ManifestAggregate, ManifestId, ManifestStatus};

/// Access key of [`authorized_manifest`]
pub const SAMPLE_ACCESS_KEY: &str = "35240511222333000181580010000010011123456780";
/// Authorization protocol in fixture responses
pub const SAMPLE_PROTOCOL: &str = "935240000000001";
/// Submission receipt in fixture responses
pub const SAMPLE_RECEIPT: &str = "351000000000001";
/// Authorized XML in fixture responses
pub const SAMPLE_XML: &str = "<mdfeProc versao=\"3.00\"/>";

/// Draft manifest SP → RJ with one NF-e and one CT-e
pub fn sample_manifest() -> ManifestAggregate {
    ManifestAggregate {
        id: ManifestId(1),
        identification: Identification {
            series: 1,
            number: 1001,
            check_code: Some("12345678".into()),
            check_digit: None,
            modal: 1,
            emitter_type: 2,
            transporter_type: None,
            environment: Environment::Homologation,
            emitted_at: DateTime::parse_from_rfc3339("2024-05-10T08:30:00-03:00").unwrap(),
            trip_start: Some(DateTime::parse_from_rfc3339("2024-05-10T09:00:00-03:00").unwrap()),
            uf_start: "SP".into(),
            uf_end: "RJ".into(),
        },
        emitter: Emitter {
            cnpj: Some("11.222.333/0001-81".into()),
            cpf: None,
            ie: Some("111222333".into()),
            name: "Transportadora Exemplo LTDA".into(),
            trade_name: None,
            street: "Av. Paulista".into(),
            number: Some("1000".into()),
            complement: None,
            district: "Bela Vista".into(),
            municipality_code: 3_550_308,
            municipality: "Sao Paulo".into(),
            cep: "01310-100".into(),
            uf: "SP".into(),
        },
        road: RoadModal {
            rntrc: Some("12345678".into()),
            ciot: None,
        },
        vehicle: TractorVehicle {
            plate: "ABC-1D23".into(),
            tare_kg: Some(8500),
            wheel_type: "03".into(),
            body_type: "02".into(),
            uf: "SP".into(),
            owner: None,
        },
        primary_conductor: Some(Conductor {
            name: "Ana Souza".into(),
            cpf: "529.982.247-25".into(),
        }),
        additional_conductors: Vec::new(),
        trailers: Vec::new(),
        seals: Vec::new(),
        route_ufs: Vec::new(),
        loading: vec![Municipality {
            code: 3_550_308,
            name: "Sao Paulo".into(),
        }],
        unloading: vec![Municipality {
            code: 3_304_557,
            name: "Rio de Janeiro".into(),
        }],
        documents: vec![
            ReferencedDocument {
                kind: DocumentKind::Nfe,
                key: "35240511222333000181550010000001231000001234".into(),
                barcode_segment: None,
                redelivery: None,
            },
            ReferencedDocument {
                kind: DocumentKind::Cte,
                key: "35240511222333000181570010000004561000004567".into(),
                barcode_segment: None,
                redelivery: None,
            },
        ],
        totals: CargoTotals {
            value: Decimal2::from_cents(1_500_000),
            unit: "01".into(),
            gross_weight: Decimal2::from_cents(120_050),
            transported_manifests: 0,
        },
        insurance: None,
        payments: Vec::new(),
        toll_vouchers: Some(TollVouchers::NoVoucher),
        additional_info: None,
        xml_authorizations: Vec::new(),
        technical_responsible: None,
        status: ManifestStatus::default(),
    }
}

/// [`sample_manifest`] after authorization
pub fn authorized_manifest() -> ManifestAggregate {
    let mut manifest = sample_manifest();
    manifest.status = ManifestStatus {
        access_key: Some(SAMPLE_ACCESS_KEY.into()),
        protocol: Some(SAMPLE_PROTOCOL.into()),
        receipt: Some(SAMPLE_RECEIPT.into()),
        authorized_xml: Some(SAMPLE_XML.into()),
        authorized_at: Some(DateTime::parse_from_rfc3339("2024-05-10T08:31:00-03:00").unwrap()),
        transmitted: true,
        authorized: true,
        cancelled: false,
        closed: false,
    };
    manifest
}

/// Engine answer to a document submission
pub fn submit_response(cstat: &str, reason: &str) -> String {
    format!(
        "[Envio]\nLote=1\nVersaoAplicativo=SP-MDFe-1.0\n\n\
         [Retorno]\ncStat={cstat}\nxMotivo={reason}\nnProt={SAMPLE_PROTOCOL}\n\
         nRec={SAMPLE_RECEIPT}\ndhRecbto=2024-05-10T08:31:00-03:00\n\n\
         [MDFE001]\nchMDFe={SAMPLE_ACCESS_KEY}\nXML={SAMPLE_XML}\n"
    )
}

/// Engine answer to an event submission
pub fn event_response(cstat: &str, reason: &str) -> String {
    format!(
        "[Evento]\nidLote=1\n\n\
         [Retorno]\ncStat={cstat}\nxMotivo={reason}\nchMDFe={SAMPLE_ACCESS_KEY}\n\
         nProt=935240000000002\ndhRegEvento=2024-05-11T14:00:05-03:00\n"
    )
}

/// Engine answer to a service status request
pub fn status_response(cstat: &str, environment: &str) -> String {
    format!(
        "[Status]\n\n[Retorno]\ncStat={cstat}\nxMotivo=Servico em Operacao\ncUF=35\n\
         tpAmb={environment}\nverAplic=SP-MDFe-1.0\ndhRecbto=2024-05-10T08:00:00-03:00\n"
    )
}
