//! Document and event INI grammar

use chrono::{DateTime, NaiveDate};
use mdfe_core::manifest::{
    BankData, Conductor, Disbursement, DocumentKind, Insurance, Installment, Payment,
    PaymentComponent, ReferencedDocument, TechnicalResponsible, TollVouchers, Trailer,
    VehicleOwner,
};
use mdfe_core::{Decimal2, ManifestAggregate};
use mdfe_generator::{codes, params, EventContext, EventIniGenerator, EventRequest, GenerateError, ManifestGenerator};
use mdfe_ini::{IniDocument, IniParser};
use mdfe_test_utils::fixtures::{sample_manifest, SAMPLE_ACCESS_KEY};
use pretty_assertions::assert_eq;

fn generate(manifest: &ManifestAggregate) -> IniDocument {
    let text = ManifestGenerator::with_seed(1).generate(manifest).unwrap();
    IniParser::new().parse(&text).unwrap()
}

fn names(doc: &IniDocument) -> Vec<&str> {
    doc.sections().iter().map(|s| s.name()).collect()
}

fn conductor(name: &str, cpf: &str) -> Conductor {
    Conductor {
        name: name.into(),
        cpf: cpf.into(),
    }
}

fn full_manifest() -> ManifestAggregate {
    let mut m = sample_manifest();
    m.trailers = vec![Trailer {
        plate: "XYZ-9876".into(),
        tare_kg: 4200,
        body_type: Some("02".into()),
        uf: Some("SP".into()),
    }];
    m.seals = vec!["L-001".into(), "L-002".into()];
    m.route_ufs = vec!["MG".into()];
    m.insurance = Some(Insurance {
        responsible: None,
        insurer_cnpj: Some("99888777000166".into()),
        policy_number: Some("APL-1".into()),
        endorsement: Some("AV-9".into()),
    });
    m.payments = vec![Payment {
        name: Some("Contratante SA".into()),
        document: Some("99.888.777/0001-66".into()),
        contract_value: Some(Decimal2::from_cents(250_000)),
        indicator: 1,
        components: vec![PaymentComponent {
            kind: "01".into(),
            value: Decimal2::from_cents(250_000),
            description: None,
        }],
        installments: vec![Installment {
            number: 1,
            due: NaiveDate::from_ymd_opt(2024, 6, 10).unwrap(),
            value: Decimal2::from_cents(250_000),
        }],
        bank: Some(BankData {
            pix: Some("pix@exemplo.com".into()),
            ..BankData::default()
        }),
    }];
    m.toll_vouchers = Some(TollVouchers::Disbursements {
        items: vec![Disbursement {
            supplier_cnpj: "12345678000195".into(),
            payer_cnpj: None,
            purchase_number: "C-77".into(),
            value: Decimal2::from_cents(4_550),
        }],
    });
    m.additional_info = Some("Carga fragil".into());
    m.xml_authorizations = vec!["52998224725".into(), "99888777000166".into()];
    m.technical_responsible = Some(TechnicalResponsible {
        cnpj: Some("11222333000181".into()),
        contact: Some("Suporte".into()),
        email: Some("suporte@exemplo.com".into()),
        phone: Some("11999999999".into()),
        ..TechnicalResponsible::default()
    });
    m
}

#[test]
fn sections_follow_fixed_order() {
    let doc = generate(&full_manifest());
    assert_eq!(
        names(&doc),
        [
            "MDFE",
            "IDE",
            "EMIT",
            "RODO",
            "VEICTRACAO",
            "CONDUTOR01",
            "REBOQUE01",
            "LACRODOVIA",
            "LACROD01",
            "LACROD02",
            "INFPERCURSO",
            "UFPER01",
            "INFMUNCARREGA",
            "MUNCARREGA01",
            "INFMUNDESCARREGA",
            "MUNDESCARREGA01",
            "INFNFE001",
            "INFCTE002",
            "TOT",
            "SEG",
            "AVERB01",
            "INFPAG01",
            "COMP001",
            "INFPRAZO001",
            "INFBANC01",
            "VALEPEDAGIO",
            "DISP01",
            "INFADIPOLO",
            "AUTXML",
            "AUT01",
            "AUT02",
            "INFRESPTEC",
        ]
    );

    let pag = doc.section("INFPAG01").unwrap();
    assert_eq!(pag.get("CNPJ"), Some("99888777000166"));
    assert_eq!(pag.get("vContrato"), Some("2500.00"));
    assert_eq!(doc.section("INFPRAZO001").unwrap().get("dVenc"), Some("2024-06-10"));
    assert_eq!(doc.section("INFBANC01").unwrap().get("PIX"), Some("pix@exemplo.com"));
    assert_eq!(doc.section("DISP01").unwrap().get("vValePed"), Some("45.50"));
    assert_eq!(doc.section("AUT01").unwrap().get("CPF"), Some("52998224725"));
    assert_eq!(doc.section("AUT02").unwrap().get("CNPJ"), Some("99888777000166"));
    assert_eq!(doc.section("SEG").unwrap().get("infResp"), Some("1"));
}

#[test]
fn identification_and_totals_are_formatted() {
    let doc = generate(&sample_manifest());

    let ide = doc.section("IDE").unwrap();
    assert_eq!(ide.get("cUF"), Some("35"));
    assert_eq!(ide.get("tpAmb"), Some("2"));
    assert_eq!(ide.get("mod"), Some("58"));
    assert_eq!(ide.get("cMDF"), Some("12345678"));
    assert_eq!(ide.get("dhEmi"), Some("2024-05-10T08:30:00-03:00"));
    assert_eq!(ide.get("cMunCarrega"), Some("3550308"));
    assert_eq!(ide.get("xMunDescarrega"), Some("Rio de Janeiro"));

    let emit = doc.section("EMIT").unwrap();
    assert_eq!(emit.get("CNPJ"), Some("11222333000181"));
    assert_eq!(emit.get("CEP"), Some("01310100"));

    assert_eq!(doc.section("VEICTRACAO").unwrap().get("placa"), Some("ABC1D23"));

    let tot = doc.section("TOT").unwrap();
    assert_eq!(tot.get("qNFe"), Some("1"));
    assert_eq!(tot.get("qCTe"), Some("1"));
    assert_eq!(tot.get("vCarga"), Some("15000.00"));
    assert_eq!(tot.get("qCarga"), Some("1200.50"));

    assert_eq!(doc.section("VALEPEDAGIO").unwrap().get("semValePed"), Some("1"));
    assert!(!doc.contains_section("SEG"));
    assert!(!doc.contains_section("LACRODOVIA"));
}

#[test]
fn conductors_are_numbered_primary_first() {
    let mut m = sample_manifest();
    m.primary_conductor = Some(conductor("Primeiro", "529.982.247-25"));
    m.additional_conductors = vec![
        conductor("Segundo", "111.444.777-35"),
        conductor("Terceiro", "123.456.789-09"),
    ];
    let doc = generate(&m);

    let conductors: Vec<_> = doc
        .sections()
        .iter()
        .filter(|s| s.name().starts_with("CONDUTOR"))
        .map(|s| (s.name(), s.get("xNome").unwrap(), s.get("CPF").unwrap()))
        .collect();
    assert_eq!(
        conductors,
        [
            ("CONDUTOR01", "Primeiro", "52998224725"),
            ("CONDUTOR02", "Segundo", "11144477735"),
            ("CONDUTOR03", "Terceiro", "12345678909"),
        ]
    );
}

#[test]
fn owner_block_only_for_third_party_vehicle() {
    let mut m = sample_manifest();
    m.vehicle.owner = Some(VehicleOwner {
        cnpj: Some("11222333000181".into()),
        ..VehicleOwner::default()
    });
    let text = ManifestGenerator::with_seed(1).generate(&m).unwrap();
    assert!(!text.contains("tpProp"));

    m.vehicle.owner = Some(VehicleOwner {
        cpf: Some("529.982.247-25".into()),
        name: Some("Dono".into()),
        uf: Some("PR".into()),
        ..VehicleOwner::default()
    });
    let text = ManifestGenerator::with_seed(1).generate(&m).unwrap();
    assert!(text.contains("tpProp=2\ntpVinc=0\nCPF=52998224725\nRNTRC=\nxNome=Dono\nUF=PR\n"));
    assert!(text.contains("tpRod=03\ntpCar=02\nUF=SP\n"));
}

#[test]
fn documents_share_one_counter_nfe_first() {
    let mut m = sample_manifest();
    m.documents.reverse();
    m.documents.push(ReferencedDocument {
        kind: DocumentKind::Nfe,
        key: "35240511222333000181550010000009991000009991".into(),
        barcode_segment: None,
        redelivery: Some("1".into()),
    });
    let doc = generate(&m);

    let docs: Vec<_> = names(&doc)
        .into_iter()
        .filter(|n| n.starts_with("INFNFE") || n.starts_with("INFCTE"))
        .collect();
    assert_eq!(docs, ["INFNFE001", "INFNFE002", "INFCTE003"]);
    assert_eq!(doc.section("INFNFE002").unwrap().get("indReentrega"), Some("1"));
}

#[test]
fn missing_check_code_uses_seeded_filler() {
    let mut m = sample_manifest();
    m.identification.check_code = None;

    let a = ManifestGenerator::with_seed(42).generate(&m).unwrap();
    let b = ManifestGenerator::with_seed(42).generate(&m).unwrap();
    assert_eq!(a, b);

    let doc = IniParser::new().parse(&a).unwrap();
    let code = doc.section("IDE").unwrap().get("cMDF").unwrap();
    assert_eq!(code.len(), 8);
    assert!(code.chars().all(|c| c.is_ascii_digit()));
}

#[test]
fn structural_gaps_are_reported_by_field() {
    let mut m = sample_manifest();
    m.loading.clear();
    assert_eq!(
        ManifestGenerator::new().generate(&m),
        Err(GenerateError::missing("infMunCarrega"))
    );

    let mut m = sample_manifest();
    m.xml_authorizations = vec!["123".into()];
    assert!(matches!(
        ManifestGenerator::new().generate(&m),
        Err(GenerateError::InvalidField { .. })
    ));
}

fn context() -> EventContext {
    EventContext {
        uf: "SP".into(),
        cnpj_cpf: "11.222.333/0001-81".into(),
        access_key: SAMPLE_ACCESS_KEY.into(),
        protocol: Some("935240000000001".into()),
    }
}

fn at() -> DateTime<chrono::FixedOffset> {
    DateTime::parse_from_rfc3339("2024-05-11T14:00:00-03:00").unwrap()
}

#[test]
fn cancellation_justification_bounds() {
    let generator = EventIniGenerator::new();
    for (len, ok) in [(14, false), (15, true), (255, true), (256, false)] {
        let request = EventRequest::cancellation(context(), at(), "j".repeat(len));
        assert_eq!(generator.generate(&request).is_ok(), ok, "length {len}");
    }
}

#[test]
fn closure_event_text() {
    let request = EventRequest::closure(
        context(),
        at(),
        "3304557",
        NaiveDate::from_ymd_opt(2024, 5, 11).unwrap(),
    );
    let text = EventIniGenerator::new().generate(&request).unwrap();
    assert_eq!(
        text,
        format!(
            "[EVENTO]\nidLote=1\n\n[EVENTO001]\ncOrgao=35\nCNPJCPF=11222333000181\nchMDFe={SAMPLE_ACCESS_KEY}\n\
             dhEvento=2024-05-11T14:00:00-03:00\ntpEvento=110112\nnSeqEvento=1\nversaoEvento=3.00\n\
             nProt=935240000000001\ndtEnc=2024-05-11\ncUF=35\ncMun=3304557\n\n"
        )
    );
}

#[test]
fn closure_requires_municipality_and_date() {
    let generator = EventIniGenerator::new();
    let request = EventRequest::new(codes::CLOSURE, context(), at())
        .with_field(params::MUNICIPALITY_CODE, "3550308");
    assert_eq!(
        generator.generate(&request),
        Err(GenerateError::missing(params::CLOSURE_DATE))
    );

    let request = EventRequest::new(codes::CLOSURE, context(), at())
        .with_field(params::CLOSURE_DATE, "2024-05-11");
    assert_eq!(
        generator.generate(&request),
        Err(GenerateError::missing(params::MUNICIPALITY_CODE))
    );

    let request = EventRequest::new(codes::CLOSURE, context(), at())
        .with_field(params::MUNICIPALITY_CODE, "3550308")
        .with_field(params::CLOSURE_DATE, "11/05/2024");
    assert!(matches!(
        generator.generate(&request),
        Err(GenerateError::InvalidField { field, .. }) if field == params::CLOSURE_DATE
    ));
}

#[test]
fn document_inclusion_picks_key_field_by_kind() {
    let generator = EventIniGenerator::new();
    let request = EventRequest::document_inclusion(context(), at(), "3304557", "1".repeat(44), "cte");
    let doc = IniParser::new()
        .parse(&generator.generate(&request).unwrap())
        .unwrap();
    let event = doc.section("EVENTO001").unwrap();
    assert_eq!(event.get("chCTe"), Some("1".repeat(44).as_str()));
    assert_eq!(event.get("cMunDescarga"), Some("3304557"));
    assert!(event.get("chNFe").is_none());

    let mut unprotocolled = context();
    unprotocolled.protocol = None;
    let request = EventRequest::document_inclusion(unprotocolled, at(), "3304557", "1".repeat(44), "NFe");
    let text = generator.generate(&request).unwrap();
    assert!(!text.contains("nProt="));
    assert!(text.contains("chNFe="));

    let request = EventRequest::document_inclusion(context(), at(), "3304557", "1".repeat(44), "MDFe");
    assert!(matches!(
        generator.generate(&request),
        Err(GenerateError::InvalidField { field, .. }) if field == params::DOCUMENT_KIND
    ));
}

#[test]
fn conductor_inclusion_requires_each_field() {
    let generator = EventIniGenerator::new();
    let request = EventRequest::new(codes::CONDUCTOR_INCLUSION, context(), at())
        .with_field(params::CONDUCTOR_CPF, "529.982.247-25");
    assert_eq!(
        generator.generate(&request),
        Err(GenerateError::missing(params::CONDUCTOR_NAME))
    );

    let request = EventRequest::conductor_inclusion(context(), at(), "Ana", "529 982 247 25");
    assert!(generator.generate(&request).is_err());

    for cpf in ["..-", "529.982"] {
        let request = EventRequest::conductor_inclusion(context(), at(), "Joao", cpf);
        assert!(
            matches!(
                generator.generate(&request),
                Err(GenerateError::InvalidField { ref field, .. }) if field == params::CONDUCTOR_CPF
            ),
            "cpf {cpf:?}"
        );
    }
}

#[test]
fn unknown_codes_pass_fields_through() {
    let generator = EventIniGenerator::new();
    let request = EventRequest::new("110116", context(), at())
        .with_field("zeta", "1")
        .with_field("alpha", "2");
    let text = generator.generate(&request).unwrap();
    assert!(text.ends_with("versaoEvento=3.00\nzeta=1\nalpha=2\n\n"));

    let request = EventRequest::new("11011", context(), at());
    assert!(matches!(
        generator.generate(&request),
        Err(GenerateError::InvalidEventCode { .. })
    ));
}

proptest::proptest! {
    #[test]
    fn any_seed_yields_parseable_ini_with_eight_digit_filler(seed in proptest::prelude::any::<u64>()) {
        let mut m = sample_manifest();
        m.identification.check_code = None;

        let text = ManifestGenerator::with_seed(seed).generate(&m).unwrap();
        let doc = IniParser::new().parse(&text).unwrap();
        let code = doc.section("IDE").unwrap().get("cMDF").unwrap();
        proptest::prop_assert_eq!(code.len(), 8);
        proptest::prop_assert!(code.chars().all(|c| c.is_ascii_digit()));
    }

    #[test]
    fn justification_accepted_only_within_bounds(len in 0usize..300) {
        let request = EventRequest::cancellation(context(), at(), "x".repeat(len));
        let accepted = EventIniGenerator::new().generate(&request).is_ok();
        proptest::prop_assert_eq!(accepted, (15..=255).contains(&len));
    }
}
