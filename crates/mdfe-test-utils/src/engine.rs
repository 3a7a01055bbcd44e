//! Scriptable in-process engine

use mdfe_engine::native::{NATIVE_FAILURE, NATIVE_OK};
use mdfe_engine::{KeyRequest, NativeEngine, NativeStatus, ResponseBuffer};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug, Default)]
struct Script {
    responses: HashMap<String, String>,
    failures: HashMap<String, String>,
    pause: Option<Duration>,
}

#[derive(Debug, Default)]
struct Journal {
    calls: Vec<String>,
    payloads: Vec<String>,
    last_error: String,
}

/// Engine that records every call and answers from a script.
///
/// Clones share state, so a test can keep one clone for inspection after
/// handing another to an [`mdfe_engine::EngineHandle`].
#[derive(Debug, Clone, Default)]
pub struct RecordingEngine {
    script: Arc<Mutex<Script>>,
    journal: Arc<Mutex<Journal>>,
}

impl RecordingEngine {
    /// Engine that reports a library name and version and succeeds elsewhere
    pub fn new() -> Self {
        let engine = Self::default();
        engine.respond("name", "ACBrLibMDFe");
        engine.respond("version", "1.0.0.0");
        engine
    }

    /// Text returned by a text-producing call
    pub fn respond(&self, call: &str, text: impl Into<String>) -> &Self {
        self.script.lock().responses.insert(call.to_string(), text.into());
        self
    }

    /// Make a call fail with `message` as the engine's last error
    pub fn fail(&self, call: &str, message: impl Into<String>) -> &Self {
        self.script.lock().failures.insert(call.to_string(), message.into());
        self
    }

    /// Undo [`RecordingEngine::fail`]
    pub fn recover(&self, call: &str) -> &Self {
        self.script.lock().failures.remove(call);
        self
    }

    /// Sleep inside every call
    pub fn pause(&self, pause: Duration) -> &Self {
        self.script.lock().pause = Some(pause);
        self
    }

    /// Calls in order, `last_error` excluded
    pub fn calls(&self) -> Vec<String> {
        self.journal.lock().calls.clone()
    }

    /// Number of times `call` ran
    pub fn count(&self, call: &str) -> usize {
        self.journal.lock().calls.iter().filter(|c| *c == call).count()
    }

    /// INI texts passed to `load_ini` / `load_event_ini`
    pub fn payloads(&self) -> Vec<String> {
        self.journal.lock().payloads.clone()
    }

    fn record(&self, call: &str) -> NativeStatus {
        let pause = {
            let script = self.script.lock();
            let failure = script.failures.get(call).cloned();
            let mut journal = self.journal.lock();
            journal.calls.push(call.to_string());
            if let Some(message) = failure {
                journal.last_error = message;
                return NATIVE_FAILURE;
            }
            script.pause
        };
        if let Some(pause) = pause {
            std::thread::sleep(pause);
        }
        NATIVE_OK
    }

    fn record_text(&self, call: &str, out: &mut ResponseBuffer) -> NativeStatus {
        let status = self.record(call);
        if status == NATIVE_OK {
            let text = self.script.lock().responses.get(call).cloned().unwrap_or_default();
            out.fill_str(&text);
        }
        status
    }

    fn record_payload(&self, call: &str, payload: &str) -> NativeStatus {
        self.journal.lock().payloads.push(payload.to_string());
        self.record(call)
    }
}

impl NativeEngine for RecordingEngine {
    fn initialize(&mut self, _config_path: &Path, _crypt_key: &str) -> NativeStatus {
        self.record("initialize")
    }

    fn finalize(&mut self) -> NativeStatus {
        self.record("finalize")
    }

    fn name(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("name", out)
    }

    fn version(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("version", out)
    }

    fn last_error(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        out.fill_str(&self.journal.lock().last_error);
        NATIVE_OK
    }

    fn clear_documents(&mut self) -> NativeStatus {
        self.record("clear_documents")
    }

    fn load_ini(&mut self, ini: &str) -> NativeStatus {
        self.record_payload("load_ini", ini)
    }

    fn sign(&mut self) -> NativeStatus {
        self.record("sign")
    }

    fn validate(&mut self) -> NativeStatus {
        self.record("validate")
    }

    fn submit(&mut self, _lot: u32, _print: bool, _sync: bool, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("submit", out)
    }

    fn query(&mut self, _key: &str, _extract_events: bool, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("query", out)
    }

    fn query_receipt(&mut self, _receipt: &str, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("query_receipt", out)
    }

    fn service_status(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("service_status", out)
    }

    fn clear_events(&mut self) -> NativeStatus {
        self.record("clear_events")
    }

    fn load_event_ini(&mut self, ini: &str) -> NativeStatus {
        self.record_payload("load_event_ini", ini)
    }

    fn send_event(&mut self, _lot: u32, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("send_event", out)
    }

    fn render_pdf(&mut self) -> NativeStatus {
        self.record("render_pdf")
    }

    fn save_pdf(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        self.record_text("save_pdf", out)
    }

    fn distribution_by_nsu(
        &mut self,
        _uf_code: u8,
        _cnpj_cpf: &str,
        _nsu: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus {
        self.record_text("distribution_by_nsu", out)
    }

    fn distribution_by_last_nsu(
        &mut self,
        _uf_code: u8,
        _cnpj_cpf: &str,
        _last_nsu: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus {
        self.record_text("distribution_by_last_nsu", out)
    }

    fn distribution_by_key(
        &mut self,
        _uf_code: u8,
        _cnpj_cpf: &str,
        _key: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus {
        self.record_text("distribution_by_key", out)
    }

    fn generate_key(&mut self, request: &KeyRequest, out: &mut ResponseBuffer) -> NativeStatus {
        self.journal.lock().payloads.push(request.yymm());
        self.record_text("generate_key", out)
    }
}
