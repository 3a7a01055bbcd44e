//! Bridge behaviour against a recording engine and an in-memory store

use chrono::NaiveDate;
use mdfe_core::lifecycle::status;
use mdfe_core::{ErrorKind, LifecycleState, ManifestAggregate, ManifestId};
use mdfe_engine::config::{CONFIG_FILE_NAME, OUTPUT_DIRS};
use mdfe_engine::stub::{UnavailableEngine, UNAVAILABLE_MESSAGE};
use mdfe_engine::{EngineBridge, EngineHandle, InitGuard, KeyRequest, NativeEngine};
use mdfe_test_utils::fixtures::{
    authorized_manifest, event_response, sample_manifest, status_response, submit_response,
    SAMPLE_ACCESS_KEY, SAMPLE_PROTOCOL, SAMPLE_XML,
};
use mdfe_test_utils::{test_config, InMemoryStore, RecordingEngine};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;
use tempfile::TempDir;

const SUBMIT_SEQUENCE: [&str; 5] = ["clear_documents", "load_ini", "sign", "validate", "submit"];
const JUSTIFICATION: &str = "Carga nao embarcada por avaria";

struct Harness {
    bridge: Arc<EngineBridge>,
    engine: RecordingEngine,
    store: Arc<InMemoryStore>,
    _dir: TempDir,
}

fn harness(manifests: impl IntoIterator<Item = ManifestAggregate>) -> Harness {
    let engine = RecordingEngine::new();
    let store = Arc::new(InMemoryStore::with(manifests));
    let dir = TempDir::new().unwrap();
    let bridge = bridge_over(engine.clone(), &store, &dir);
    Harness {
        bridge: Arc::new(bridge),
        engine,
        store,
        _dir: dir,
    }
}

fn bridge_over(engine: impl NativeEngine + 'static, store: &Arc<InMemoryStore>, dir: &TempDir) -> EngineBridge {
    EngineBridge::builder(EngineHandle::new(engine), store.clone())
        .config(test_config(dir.path()))
        .init_guard(Arc::new(InitGuard::new()))
        .operator("operador")
        .build()
}

fn native_calls(engine: &RecordingEngine) -> Vec<String> {
    engine
        .calls()
        .into_iter()
        .filter(|c| !matches!(c.as_str(), "initialize" | "name" | "version"))
        .collect()
}

fn statuses(store: &InMemoryStore, id: ManifestId) -> Vec<String> {
    store.history(id).into_iter().map(|e| e.status).collect()
}

#[tokio::test]
async fn authorized_submission_writes_back_and_records_history() {
    let h = harness([sample_manifest()]);
    h.engine.respond("submit", submit_response("100", "Autorizado o uso do MDF-e"));

    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert!(result.is_success(), "{:?}", result.message());
    let response = result.data().unwrap();
    assert_eq!(response.protocol.as_deref(), Some(SAMPLE_PROTOCOL));

    assert_eq!(native_calls(&h.engine), SUBMIT_SEQUENCE);
    assert!(h.engine.payloads()[0].starts_with("[MDFE]\n"));

    let stored = h.store.get(ManifestId(1)).unwrap();
    assert!(stored.status.transmitted && stored.status.authorized);
    assert_eq!(stored.status.access_key.as_deref(), Some(SAMPLE_ACCESS_KEY));
    assert_eq!(stored.status.authorized_xml.as_deref(), Some(SAMPLE_XML));
    assert!(stored.status.authorized_at.is_some());

    let history = h.store.history(ManifestId(1));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, status::AUTHORIZED);
    assert_eq!(history[0].responsible.as_deref(), Some("operador"));
    assert!(history[0].trace_id.is_some());

    let tracker = h.bridge.tracker();
    assert_eq!(tracker.state(ManifestId(1)), Some(LifecycleState::Authorized));
    assert!(tracker.verify_integrity(ManifestId(1)).is_ok());
}

#[tokio::test]
async fn rejected_submission_exposes_code_and_stays_draft() {
    let h = harness([sample_manifest()]);
    h.engine.respond("submit", submit_response("150", "Rejeicao: Duplicidade de MDF-e"));

    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert!(!result.is_success());
    assert_eq!(result.error_kind(), ErrorKind::AuthorityRejection);
    assert_eq!(result.meta("cStat"), Some("150"));
    assert_eq!(result.meta("xMotivo"), Some("Rejeicao: Duplicidade de MDF-e"));
    assert!(result.meta("raw").unwrap().contains("[Retorno]"));
    assert!(result.meta("trace_id").is_some());

    let stored = h.store.get(ManifestId(1)).unwrap();
    assert!(!stored.status.authorized && !stored.status.transmitted);
    let history = h.store.history(ManifestId(1));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, status::REJECTED);
    assert_eq!(history[0].reason.as_deref(), Some("150 - Rejeicao: Duplicidade de MDF-e"));
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Draft));

    h.engine.respond("submit", submit_response("100", "Autorizado o uso do MDF-e"));
    assert!(h.bridge.submit_manifest(ManifestId(1)).await.is_success());
    assert_eq!(statuses(&h.store, ManifestId(1)), [status::REJECTED, status::AUTHORIZED]);
}

#[tokio::test]
async fn transport_failure_reverts_without_history() {
    let h = harness([sample_manifest()]);
    h.engine.fail("submit", "timeout connecting to SEFAZ");

    let result = h.bridge.submit(ManifestId(1), "[MDFE]\nversao=3.00\n".into()).await;
    assert_eq!(result.error_kind(), ErrorKind::Transmission);
    assert!(result.message().unwrap().contains("timeout connecting to SEFAZ"));
    assert_eq!(result.meta("step"), Some("submit"));

    assert!(h.store.history(ManifestId(1)).is_empty());
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Draft));
    assert_eq!(h.engine.payloads(), ["[MDFE]\nversao=3.00\n"]);
}

#[tokio::test]
async fn abandoned_submission_returns_to_draft() {
    let h = harness([sample_manifest()]);
    assert!(h.bridge.initialize().await.is_success());
    h.engine
        .respond("submit", submit_response("100", "Autorizado o uso do MDF-e"))
        .pause(Duration::from_millis(300));

    let first = tokio::time::timeout(Duration::from_millis(50), h.bridge.submit_manifest(ManifestId(1))).await;
    assert!(first.is_err());
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Draft));
    let stored = h.store.get(ManifestId(1)).unwrap();
    assert!(!stored.status.transmitted && !stored.status.authorized);

    h.engine.pause(Duration::ZERO);
    let retry = h.bridge.submit_manifest(ManifestId(1)).await;
    assert!(retry.is_success(), "{:?}", retry.message());
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Authorized));
    assert!(h.store.get(ManifestId(1)).unwrap().status.authorized);
    assert_eq!(statuses(&h.store, ManifestId(1)), [status::AUTHORIZED]);
}

#[tokio::test]
async fn failed_write_back_keeps_tracker_and_store_in_step() {
    let h = harness([sample_manifest()]);
    h.engine.respond("submit", submit_response("100", "Autorizado o uso do MDF-e"));
    h.store.refuse_writes(true);

    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert_eq!(result.error_kind(), ErrorKind::Internal);
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Draft));
    assert!(!h.store.get(ManifestId(1)).unwrap().status.authorized);
    assert!(h.bridge.tracker().history(ManifestId(1)).is_empty());

    h.store.refuse_writes(false);
    assert!(h.bridge.submit_manifest(ManifestId(1)).await.is_success());
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Authorized));
    assert!(h.store.get(ManifestId(1)).unwrap().status.authorized);
}

#[tokio::test]
async fn failing_step_selects_error_kind() {
    let h = harness([sample_manifest()]);

    h.engine.fail("sign", "certificado vencido");
    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert_eq!(result.error_kind(), ErrorKind::Certificate);
    h.engine.recover("sign");

    h.engine.fail("validate", "");
    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert_eq!(result.error_kind(), ErrorKind::Validation);
    assert_eq!(result.message(), Some("validate failed: native status -1"));
}

#[tokio::test]
async fn invalid_manifest_never_reaches_the_engine() {
    let mut manifest = sample_manifest();
    manifest.identification.series = 0;
    manifest.totals.gross_weight = mdfe_core::Decimal2::ZERO;
    let h = harness([manifest]);

    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert_eq!(result.error_kind(), ErrorKind::Validation);
    let message = result.message().unwrap();
    assert!(message.contains("serie") && message.contains("qCarga"), "{message}");
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn unknown_manifest_is_not_found() {
    let h = harness(Vec::<ManifestAggregate>::new());
    let result = h.bridge.submit_manifest(ManifestId(9)).await;
    assert_eq!(result.error_kind(), ErrorKind::NotFound);

    let result = h.bridge.cancel(SAMPLE_ACCESS_KEY, JUSTIFICATION).await;
    assert_eq!(result.error_kind(), ErrorKind::NotFound);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_submissions_never_interleave() {
    let manifests = (1..=4).map(|n| {
        let mut m = sample_manifest();
        m.id = ManifestId(n);
        m.identification.number = 1000 + n;
        m
    });
    let h = harness(manifests);
    h.engine
        .respond("submit", submit_response("100", "Autorizado o uso do MDF-e"))
        .pause(Duration::from_millis(5));

    let tasks: Vec<_> = (1..=4)
        .map(|n| {
            let bridge = Arc::clone(&h.bridge);
            tokio::spawn(async move { bridge.submit_manifest(ManifestId(n)).await })
        })
        .collect();
    for task in tasks {
        assert!(task.await.unwrap().is_success());
    }

    let calls = native_calls(&h.engine);
    assert_eq!(calls.len(), 4 * SUBMIT_SEQUENCE.len());
    for chunk in calls.chunks(SUBMIT_SEQUENCE.len()) {
        assert_eq!(chunk, SUBMIT_SEQUENCE);
    }
    assert_eq!(h.engine.count("initialize"), 1);
}

#[tokio::test]
async fn second_submit_of_authorized_manifest_is_refused() {
    let h = harness([authorized_manifest()]);
    let result = h.bridge.submit_manifest(ManifestId(1)).await;
    assert_eq!(result.error_kind(), ErrorKind::Validation);
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn initialization_runs_once_and_provisions_files() {
    let h = harness(Vec::<ManifestAggregate>::new());
    assert!(h.bridge.initialize().await.is_success());
    let info = h.bridge.engine_info().await.into_data().unwrap();
    assert_eq!(info.name, "ACBrLibMDFe");
    assert_eq!(info.version, "1.0.0.0");
    assert_eq!(h.engine.count("initialize"), 1);

    let base = h.bridge.config().base_path.clone();
    assert!(base.join(CONFIG_FILE_NAME).is_file());
    for dir in OUTPUT_DIRS {
        assert!(base.join(dir).is_dir(), "{dir}");
    }
    let ini = std::fs::read_to_string(base.join(CONFIG_FILE_NAME)).unwrap();
    assert!(ini.starts_with("[Principal]\n"));
}

#[tokio::test]
async fn failed_initialization_is_retried() {
    let h = harness(Vec::<ManifestAggregate>::new());
    h.engine.fail("initialize", "arquivo de configuracao invalido");

    let result = h.bridge.engine_info().await;
    assert_eq!(result.error_kind(), ErrorKind::Internal);
    assert!(result.message().unwrap().contains("arquivo de configuracao invalido"));

    h.engine.recover("initialize");
    assert!(h.bridge.engine_info().await.is_success());
    assert_eq!(h.engine.count("initialize"), 2);
}

#[tokio::test]
async fn unavailable_engine_yields_typed_failures() {
    let store = Arc::new(InMemoryStore::with([sample_manifest()]));
    let dir = TempDir::new().unwrap();
    let bridge = bridge_over(UnavailableEngine, &store, &dir);

    let status = bridge.service_status().await;
    assert_eq!(status.error_kind(), ErrorKind::Internal);
    assert!(status.message().unwrap().contains(UNAVAILABLE_MESSAGE));

    let submitted = bridge.submit_manifest(ManifestId(1)).await;
    assert!(!submitted.is_success());
    assert_eq!(bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Draft));
    assert!(store.history(ManifestId(1)).is_empty());
}

#[tokio::test]
async fn cancellation_rejection_leaves_flags_untouched() {
    let h = harness([authorized_manifest()]);
    h.engine.respond("send_event", event_response("215", "Rejeicao: Falha no schema XML"));

    let result = h.bridge.cancel(SAMPLE_ACCESS_KEY, JUSTIFICATION).await;
    assert_eq!(result.error_kind(), ErrorKind::AuthorityRejection);
    assert_eq!(result.meta("cStat"), Some("215"));

    let stored = h.store.get(ManifestId(1)).unwrap();
    assert_eq!(stored.status, authorized_manifest().status);

    let history = h.store.history(ManifestId(1));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, status::REJECTED);
    assert_eq!(history[0].reason.as_deref(), Some("215 - Rejeicao: Falha no schema XML"));
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Authorized));
}

#[tokio::test]
async fn cancellation_is_terminal() {
    let h = harness([authorized_manifest()]);
    h.engine.respond("send_event", event_response("135", "Evento registrado e vinculado a MDF-e"));

    let result = h.bridge.cancel(SAMPLE_ACCESS_KEY, JUSTIFICATION).await;
    assert!(result.is_success(), "{:?}", result.message());
    assert_eq!(
        native_calls(&h.engine),
        ["clear_events", "load_event_ini", "send_event"]
    );
    let payload = &h.engine.payloads()[0];
    assert!(payload.contains("tpEvento=110111\n"));
    assert!(payload.contains(&format!("nProt={SAMPLE_PROTOCOL}\n")));
    assert!(payload.contains(&format!("xJust={JUSTIFICATION}\n")));

    assert!(h.store.get(ManifestId(1)).unwrap().status.cancelled);
    let history = h.store.history(ManifestId(1));
    assert_eq!(history.len(), 1);
    assert_eq!(history[0].status, status::CANCELLED);
    assert_eq!(history[0].reason.as_deref(), Some(&*format!("Justificativa: {JUSTIFICATION}")));

    let again = h.bridge.cancel(SAMPLE_ACCESS_KEY, JUSTIFICATION).await;
    assert_eq!(again.error_kind(), ErrorKind::Validation);
    assert_eq!(h.engine.count("send_event"), 1);
}

#[tokio::test]
async fn short_justification_fails_before_the_engine() {
    let h = harness([authorized_manifest()]);
    let result = h.bridge.cancel(SAMPLE_ACCESS_KEY, "curta demais").await;
    assert_eq!(result.error_kind(), ErrorKind::Validation);
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn closure_marks_closed() {
    let h = harness([authorized_manifest()]);
    h.engine.respond("send_event", event_response("135", "Evento registrado e vinculado a MDF-e"));

    let closed_on = NaiveDate::from_ymd_opt(2024, 5, 11).unwrap();
    let result = h.bridge.close(SAMPLE_ACCESS_KEY, "3304557", closed_on).await;
    assert!(result.is_success(), "{:?}", result.message());
    assert!(h.engine.payloads()[0].contains("dtEnc=2024-05-11\ncUF=35\ncMun=3304557\n"));

    assert!(h.store.get(ManifestId(1)).unwrap().status.closed);
    assert_eq!(statuses(&h.store, ManifestId(1)), [status::CLOSED]);
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Closed));
}

#[tokio::test]
async fn events_require_an_authorized_manifest() {
    let mut draft = sample_manifest();
    draft.status.access_key = Some(SAMPLE_ACCESS_KEY.into());
    let h = harness([draft]);

    let result = h.bridge.include_conductor(SAMPLE_ACCESS_KEY, "Bruno Lima", "11144477735").await;
    assert_eq!(result.error_kind(), ErrorKind::Validation);
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn inclusions_append_history_without_state_change() {
    let h = harness([authorized_manifest()]);
    h.engine.respond("send_event", event_response("136", "Evento registrado, mas nao vinculado a MDF-e"));

    let conductor = h
        .bridge
        .include_conductor(SAMPLE_ACCESS_KEY, "Bruno Lima", "111.444.777-35")
        .await;
    assert!(conductor.is_success(), "{:?}", conductor.message());

    let document = h
        .bridge
        .include_document(SAMPLE_ACCESS_KEY, "3304557", &"3".repeat(44), "NFe")
        .await;
    assert!(document.is_success(), "{:?}", document.message());

    let payloads = h.engine.payloads();
    assert!(payloads[0].contains("tpEvento=110114\n"));
    assert!(payloads[1].contains("tpEvento=110115\n"));

    assert_eq!(
        statuses(&h.store, ManifestId(1)),
        [status::CONDUCTOR_INCLUDED, status::DOCUMENT_INCLUDED]
    );
    assert_eq!(h.bridge.tracker().state(ManifestId(1)), Some(LifecycleState::Authorized));
}

#[tokio::test]
async fn query_failure_codes_are_data_not_errors() {
    let h = harness(Vec::<ManifestAggregate>::new());
    h.engine.respond("query", "[Retorno]\ncStat=217\nxMotivo=Rejeicao: MDF-e nao consta na base\n");

    let result = h.bridge.query_by_key(SAMPLE_ACCESS_KEY).await;
    let response = result.into_data().unwrap();
    assert!(!response.success);
    assert_eq!(response.code.as_deref(), Some("217"));

    h.engine.respond(
        "query_receipt",
        format!("[Retorno]\ncStat=100\nnProt={SAMPLE_PROTOCOL}\nchMDFe={SAMPLE_ACCESS_KEY}\n"),
    );
    let response = h.bridge.query_receipt("351000000000001").await.into_data().unwrap();
    assert!(response.success);
    assert_eq!(response.protocol.as_deref(), Some(SAMPLE_PROTOCOL));
}

#[tokio::test]
async fn service_status_reports_environment_and_library() {
    let h = harness(Vec::<ManifestAggregate>::new());
    h.engine.respond("service_status", status_response("107", "1"));

    let status = h.bridge.service_status().await.into_data().unwrap();
    assert!(status.operational);
    assert_eq!(status.environment, "production");
    assert_eq!(status.library_version, "1.0.0.0");
    assert_eq!(status.uf.as_deref(), Some("35"));
    assert_eq!(status.app_version.as_deref(), Some("SP-MDFe-1.0"));

    h.engine.respond("service_status", status_response("108", "2"));
    let status = h.bridge.service_status().await.into_data().unwrap();
    assert!(!status.operational);
    assert_eq!(status.environment, "homologation");
}

#[tokio::test]
async fn pdf_bytes_are_read_from_the_saved_path() {
    let h = harness(Vec::<ManifestAggregate>::new());
    let pdf = h.bridge.config().pdf_dir().join("damdfe.pdf");
    std::fs::create_dir_all(pdf.parent().unwrap()).unwrap();
    std::fs::write(&pdf, b"%PDF-1.4 sample").unwrap();
    h.engine.respond("save_pdf", format!("{}\n", pdf.display()));

    let bytes = h.bridge.render_pdf(SAMPLE_ACCESS_KEY).await.into_data().unwrap();
    assert_eq!(bytes, b"%PDF-1.4 sample");
    assert_eq!(native_calls(&h.engine), ["query", "render_pdf", "save_pdf"]);

    h.engine.respond("save_pdf", pdf.with_file_name("missing.pdf").display().to_string());
    let missing = h.bridge.render_pdf(SAMPLE_ACCESS_KEY).await;
    assert_eq!(missing.error_kind(), ErrorKind::Internal);

    h.engine.fail("render_pdf", "layout nao encontrado");
    assert_eq!(
        h.bridge.render_pdf(SAMPLE_ACCESS_KEY).await.error_kind(),
        ErrorKind::Internal
    );
}

#[tokio::test]
async fn authorized_xml_comes_from_the_store() {
    let mut draft = sample_manifest();
    draft.id = ManifestId(2);
    let h = harness([authorized_manifest(), draft]);

    let xml = h.bridge.authorized_xml(ManifestId(1)).await;
    assert_eq!(xml.data().map(String::as_str), Some(SAMPLE_XML));

    assert_eq!(
        h.bridge.authorized_xml(ManifestId(2)).await.error_kind(),
        ErrorKind::NotFound
    );
    assert_eq!(
        h.bridge.authorized_xml(ManifestId(3)).await.error_kind(),
        ErrorKind::NotFound
    );
    assert!(h.engine.calls().is_empty());
}

#[tokio::test]
async fn access_key_generation_passes_yymm() {
    let h = harness(Vec::<ManifestAggregate>::new());
    h.engine.respond("generate_key", format!("{SAMPLE_ACCESS_KEY}\n"));

    let request = KeyRequest {
        uf_code: 35,
        numeric_code: 12_345_678,
        model: 58,
        series: 1,
        number: 1001,
        emission_type: 1,
        emitted_on: NaiveDate::from_ymd_opt(2024, 5, 10).unwrap(),
        cnpj_cpf: "11222333000181".into(),
    };
    let key = h.bridge.generate_key(request).await.into_data().unwrap();
    assert_eq!(key, SAMPLE_ACCESS_KEY);
    assert_eq!(h.engine.payloads(), ["2405"]);
}

#[tokio::test]
async fn distribution_maps_uf_and_failures() {
    let h = harness(Vec::<ManifestAggregate>::new());
    h.engine.respond(
        "distribution_by_last_nsu",
        "[DistribuicaoDFe]\ncStat=138\nxMotivo=Documento localizado\nultNSU=000000000000012\nmaxNSU=000000000000040\n",
    );

    let feed = h
        .bridge
        .distribution_by_last_nsu("SP", "11222333000181", "000000000000010")
        .await
        .into_data()
        .unwrap();
    assert!(feed.success);
    assert_eq!(feed.last_nsu.as_deref(), Some("000000000000012"));

    let unknown = h.bridge.distribution_by_nsu("XX", "11222333000181", "1").await;
    assert_eq!(unknown.error_kind(), ErrorKind::Validation);

    h.engine.fail("distribution_by_key", "servico indisponivel");
    let failed = h
        .bridge
        .distribution_by_key("SP", "11222333000181", SAMPLE_ACCESS_KEY)
        .await;
    assert_eq!(failed.error_kind(), ErrorKind::Distribution);
}
