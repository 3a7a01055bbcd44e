//! Lifecycle, amount and manifest-loading tests

use mdfe_core::lifecycle::{allowed_transitions, status, validate_transition};
use mdfe_core::manifest::TollVouchers;
use mdfe_core::prelude::*;
use mdfe_core::ManifestFieldValidator;
use pretty_assertions::assert_eq;
use proptest::prelude::*;

const MANIFEST_JSON: &str = r#"{
    "id": 42,
    "identification": {
        "series": 1,
        "number": 123,
        "emitter_type": 2,
        "emitted_at": "2024-05-10T08:30:00-03:00",
        "uf_start": "SP",
        "uf_end": "MG"
    },
    "emitter": {
        "cnpj": "11.222.333/0001-81",
        "ie": "111222333",
        "name": "Transportadora Exemplo",
        "street": "Av. Brasil",
        "district": "Centro",
        "municipality_code": 3550308,
        "municipality": "Sao Paulo",
        "cep": "01001000",
        "uf": "SP"
    },
    "vehicle": {
        "plate": "ABC-1D23",
        "wheel_type": "03",
        "body_type": "02",
        "uf": "SP"
    },
    "primary_conductor": { "name": "Ana", "cpf": "52998224725" },
    "loading": [{ "code": 3550308, "name": "Sao Paulo" }],
    "unloading": [{ "code": 3106200, "name": "Belo Horizonte" }],
    "documents": [
        { "kind": "NFe", "key": "35240511222333000181550010000001231000001234" }
    ],
    "totals": { "value": "1500.5", "gross_weight": 800 },
    "toll_vouchers": { "kind": "no_voucher" }
}"#;

#[test]
fn manifest_loads_from_json_with_defaults() {
    let manifest: ManifestAggregate = serde_json::from_str(MANIFEST_JSON).unwrap();

    assert_eq!(manifest.id, ManifestId(42));
    assert_eq!(manifest.identification.modal, 1);
    assert_eq!(manifest.totals.unit, "01");
    assert_eq!(manifest.totals.value.to_string(), "1500.50");
    assert_eq!(manifest.totals.gross_weight.to_string(), "800.00");
    assert_eq!(manifest.toll_vouchers, Some(TollVouchers::NoVoucher));
    assert_eq!(manifest.emitter.document().as_deref(), Some("11222333000181"));
    assert!(ManifestFieldValidator::new().validate(&manifest).is_empty());
    assert_eq!(
        LifecycleState::from_status(&manifest.status),
        LifecycleState::Draft
    );
}

#[test]
fn full_lifecycle_leaves_verifiable_history() {
    let tracker = LifecycleTracker::new();
    let id = ManifestId(1);

    tracker
        .transition(id, LifecycleState::Transmitted, TransitionNote::default())
        .unwrap();
    tracker
        .transition(
            id,
            LifecycleState::Authorized,
            TransitionNote::reason("Protocolo: 135240000001").traced("t-1"),
        )
        .unwrap();
    tracker
        .record_event(id, status::CONDUCTOR_INCLUDED, TransitionNote::reason("Ana"))
        .unwrap();
    tracker
        .transition(id, LifecycleState::Closed, TransitionNote::default())
        .unwrap();

    let labels: Vec<_> = tracker.history(id).into_iter().map(|e| e.status).collect();
    assert_eq!(labels, ["AUTORIZADO", "CONDUTOR_INCLUIDO", "ENCERRADO"]);
    assert!(tracker.verify_integrity(id).is_ok());

    let logged = tracker.logged(id);
    assert_eq!(logged[1].prev_hash, logged[0].hash);

    assert!(tracker
        .transition(id, LifecycleState::Cancelled, TransitionNote::default())
        .is_err());
}

fn any_state() -> impl Strategy<Value = LifecycleState> {
    prop_oneof![
        Just(LifecycleState::Draft),
        Just(LifecycleState::Transmitted),
        Just(LifecycleState::Authorized),
        Just(LifecycleState::Cancelled),
        Just(LifecycleState::Closed),
    ]
}

proptest! {
    #[test]
    fn prop_validate_matches_table(from in any_state(), to in any_state()) {
        let allowed = allowed_transitions(from).contains(&to);
        prop_assert_eq!(validate_transition(from, to).is_ok(), allowed);
    }

    #[test]
    fn prop_amount_text_is_exact(cents in -10_000_000_000i64..10_000_000_000i64) {
        let amount = Decimal2::from_cents(cents);
        let text = amount.to_string();
        prop_assert_eq!(text.split('.').nth(1).map(str::len), Some(2));
        prop_assert_eq!(text.parse::<Decimal2>().unwrap(), amount);
    }
}
