//! Shared engine handle and the lease guarding its call sequences

use crate::error::{EngineError, NativeStep, Result};
use crate::native::{KeyRequest, NativeEngine, ResponseBuffer, DEFAULT_BUFFER_CAPACITY, NATIVE_OK};
use parking_lot::{Mutex, MutexGuard};
use std::path::Path;
use std::sync::Arc;

/// Cloneable handle to the single native engine instance.
///
/// The handle itself exposes no calls; take an [`EngineLease`] to run a
/// sequence.
#[derive(Clone)]
pub struct EngineHandle {
    engine: Arc<Mutex<Box<dyn NativeEngine>>>,
    buffer_capacity: usize,
}

impl std::fmt::Debug for EngineHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineHandle")
            .field("buffer_capacity", &self.buffer_capacity)
            .finish_non_exhaustive()
    }
}

impl EngineHandle {
    /// Wrap an engine
    pub fn new(engine: impl NativeEngine + 'static) -> Self {
        Self::from_boxed(Box::new(engine))
    }

    /// Wrap a boxed engine
    #[must_use]
    pub fn from_boxed(engine: Box<dyn NativeEngine>) -> Self {
        Self {
            engine: Arc::new(Mutex::new(engine)),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
        }
    }

    /// Override the response buffer size
    #[must_use]
    pub fn with_buffer_capacity(mut self, capacity: usize) -> Self {
        self.buffer_capacity = capacity;
        self
    }

    /// Response buffer size
    #[inline]
    #[must_use]
    pub fn buffer_capacity(&self) -> usize {
        self.buffer_capacity
    }

    /// Block until the engine is free and hold it for one sequence
    #[must_use]
    pub fn lease(&self) -> EngineLease<'_> {
        EngineLease {
            engine: self.engine.lock(),
            buffer: ResponseBuffer::with_capacity(self.buffer_capacity),
        }
    }
}

/// Exclusive access to the engine for one call sequence.
///
/// Every failing call fetches the engine's last error text before the
/// lease can be used for anything else.
pub struct EngineLease<'a> {
    engine: MutexGuard<'a, Box<dyn NativeEngine>>,
    buffer: ResponseBuffer,
}

impl EngineLease<'_> {
    fn check(&mut self, step: NativeStep, status: i32) -> Result<()> {
        if status == NATIVE_OK {
            return Ok(());
        }
        self.buffer.clear();
        // the failure text is best-effort; its own status is not checked
        let _ = self.engine.last_error(&mut self.buffer);
        let message = self.buffer.text();
        tracing::warn!(step = %step, status, message = %message, "native call failed");
        Err(EngineError::native(step, status, message))
    }

    fn call(&mut self, step: NativeStep, f: impl FnOnce(&mut dyn NativeEngine) -> i32) -> Result<()> {
        let status = f(&mut **self.engine);
        self.check(step, status)
    }

    fn call_text(
        &mut self,
        step: NativeStep,
        f: impl FnOnce(&mut dyn NativeEngine, &mut ResponseBuffer) -> i32,
    ) -> Result<String> {
        self.buffer.clear();
        let status = f(&mut **self.engine, &mut self.buffer);
        self.check(step, status)?;
        if self.buffer.is_truncated() {
            tracing::warn!(
                step = %step,
                reported = self.buffer.reported_len(),
                capacity = self.buffer.capacity(),
                "native response truncated"
            );
        }
        Ok(self.buffer.text())
    }

    /// Start the engine
    pub fn initialize(&mut self, config_path: &Path, crypt_key: &str) -> Result<()> {
        self.call(NativeStep::Initialize, |e| e.initialize(config_path, crypt_key))
    }

    /// Stop the engine
    pub fn finalize(&mut self) -> Result<()> {
        self.call(NativeStep::Initialize, |e| e.finalize())
    }

    /// Library name
    pub fn name(&mut self) -> Result<String> {
        self.call_text(NativeStep::Info, |e, out| e.name(out))
    }

    /// Library version
    pub fn version(&mut self) -> Result<String> {
        self.call_text(NativeStep::Info, |e, out| e.version(out))
    }

    /// Drop loaded documents
    pub fn clear_documents(&mut self) -> Result<()> {
        self.call(NativeStep::Load, |e| e.clear_documents())
    }

    /// Load document INI
    pub fn load_ini(&mut self, ini: &str) -> Result<()> {
        self.call(NativeStep::Load, |e| e.load_ini(ini))
    }

    /// Sign loaded documents
    pub fn sign(&mut self) -> Result<()> {
        self.call(NativeStep::Sign, |e| e.sign())
    }

    /// Validate loaded documents
    pub fn validate(&mut self) -> Result<()> {
        self.call(NativeStep::Validate, |e| e.validate())
    }

    /// Send loaded documents synchronously, without printing
    pub fn submit(&mut self, lot: u32) -> Result<String> {
        self.call_text(NativeStep::Submit, |e, out| e.submit(lot, false, true, out))
    }

    /// Query by access key
    pub fn query(&mut self, key: &str, extract_events: bool) -> Result<String> {
        self.call_text(NativeStep::Query, |e, out| e.query(key, extract_events, out))
    }

    /// Query by receipt
    pub fn query_receipt(&mut self, receipt: &str) -> Result<String> {
        self.call_text(NativeStep::Receipt, |e, out| e.query_receipt(receipt, out))
    }

    /// Service status
    pub fn service_status(&mut self) -> Result<String> {
        self.call_text(NativeStep::Status, |e, out| e.service_status(out))
    }

    /// Drop loaded events
    pub fn clear_events(&mut self) -> Result<()> {
        self.call(NativeStep::Load, |e| e.clear_events())
    }

    /// Load event INI
    pub fn load_event_ini(&mut self, ini: &str) -> Result<()> {
        self.call(NativeStep::Load, |e| e.load_event_ini(ini))
    }

    /// Send loaded events
    pub fn send_event(&mut self, lot: u32) -> Result<String> {
        self.call_text(NativeStep::Event, |e, out| e.send_event(lot, out))
    }

    /// Render the loaded document's PDF
    pub fn render_pdf(&mut self) -> Result<()> {
        self.call(NativeStep::Render, |e| e.render_pdf())
    }

    /// Save the rendered PDF and return its path
    pub fn save_pdf(&mut self) -> Result<String> {
        self.call_text(NativeStep::Render, |e, out| e.save_pdf(out))
    }

    /// Distribution by NSU
    pub fn distribution_by_nsu(&mut self, uf_code: u8, cnpj_cpf: &str, nsu: &str) -> Result<String> {
        self.call_text(NativeStep::Distribution, |e, out| {
            e.distribution_by_nsu(uf_code, cnpj_cpf, nsu, out)
        })
    }

    /// Distribution from the last NSU
    pub fn distribution_by_last_nsu(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        last_nsu: &str,
    ) -> Result<String> {
        self.call_text(NativeStep::Distribution, |e, out| {
            e.distribution_by_last_nsu(uf_code, cnpj_cpf, last_nsu, out)
        })
    }

    /// Distribution by access key
    pub fn distribution_by_key(&mut self, uf_code: u8, cnpj_cpf: &str, key: &str) -> Result<String> {
        self.call_text(NativeStep::Distribution, |e, out| {
            e.distribution_by_key(uf_code, cnpj_cpf, key, out)
        })
    }

    /// Compute an access key
    pub fn generate_key(&mut self, request: &KeyRequest) -> Result<String> {
        self.call_text(NativeStep::Key, |e, out| e.generate_key(request, out))
    }
}
