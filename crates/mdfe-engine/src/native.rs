//! Native engine call surface
//!
//! [`NativeEngine`] mirrors the vendor library one call per method. Calls
//! return a [`NativeStatus`] (zero is success); text results are written
//! into a caller-owned [`ResponseBuffer`].

use chrono::{Datelike, NaiveDate};
use std::path::Path;

/// Status returned by every native call
pub type NativeStatus = i32;

/// Success status
pub const NATIVE_OK: NativeStatus = 0;

/// Generic failure status used by in-process engines
pub const NATIVE_FAILURE: NativeStatus = -1;

/// Default response buffer size in bytes
pub const DEFAULT_BUFFER_CAPACITY: usize = 256_000;

/// Fixed-capacity output buffer for text-returning calls.
///
/// The engine writes at most `capacity` bytes and reports the full length
/// of its response; only the bytes actually written are ever read back.
#[derive(Debug, Clone)]
pub struct ResponseBuffer {
    data: Vec<u8>,
    len: usize,
    reported: usize,
}

impl Default for ResponseBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl ResponseBuffer {
    /// Buffer with [`DEFAULT_BUFFER_CAPACITY`]
    #[must_use]
    pub fn new() -> Self {
        Self::with_capacity(DEFAULT_BUFFER_CAPACITY)
    }

    /// Buffer with an explicit capacity
    #[must_use]
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            data: vec![0; capacity],
            len: 0,
            reported: 0,
        }
    }

    /// Capacity in bytes
    #[inline]
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.data.len()
    }

    /// Bytes written by the last call
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether nothing was written
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Response length reported by the engine, possibly above capacity
    #[inline]
    #[must_use]
    pub fn reported_len(&self) -> usize {
        self.reported
    }

    /// Whether the response did not fit
    #[inline]
    #[must_use]
    pub fn is_truncated(&self) -> bool {
        self.reported > self.len
    }

    /// Reset before reuse
    pub fn clear(&mut self) {
        self.len = 0;
        self.reported = 0;
    }

    /// Copy a response in, truncating at capacity
    pub fn fill(&mut self, bytes: &[u8]) {
        let n = bytes.len().min(self.data.len());
        self.data[..n].copy_from_slice(&bytes[..n]);
        self.len = n;
        self.reported = bytes.len();
    }

    /// Convenience for [`ResponseBuffer::fill`] with text
    pub fn fill_str(&mut self, text: &str) {
        self.fill(text.as_bytes());
    }

    /// Raw storage for foreign writers
    pub fn spare_mut(&mut self) -> &mut [u8] {
        &mut self.data
    }

    /// Record the length a foreign writer reported
    pub fn set_reported(&mut self, reported: usize) {
        self.reported = reported;
        self.len = reported.min(self.data.len());
    }

    /// Written bytes, lossily decoded
    #[must_use]
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.data[..self.len]).into_owned()
    }
}

/// Inputs for access-key generation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyRequest {
    /// IBGE UF code
    pub uf_code: u8,
    /// Eight-digit numeric code (`cNF`)
    pub numeric_code: u32,
    /// Document model
    pub model: u8,
    /// Series
    pub series: u32,
    /// Number
    pub number: u64,
    /// Emission type (`tpEmis`)
    pub emission_type: u8,
    /// Emission date; only year and month are used
    pub emitted_on: NaiveDate,
    /// Emitter CNPJ or CPF, digits
    pub cnpj_cpf: String,
}

impl KeyRequest {
    /// `YYMM` emission string
    #[must_use]
    pub fn yymm(&self) -> String {
        format!(
            "{:02}{:02}",
            self.emitted_on.year().rem_euclid(100),
            self.emitted_on.month()
        )
    }
}

/// Call surface of the stateful, non-reentrant vendor engine.
///
/// Implementations are only reached through an
/// [`EngineLease`](crate::handle::EngineLease), which holds the process
/// lock for a whole call sequence.
pub trait NativeEngine: Send {
    /// Load configuration and start the engine
    fn initialize(&mut self, config_path: &Path, crypt_key: &str) -> NativeStatus;
    /// Release engine resources
    fn finalize(&mut self) -> NativeStatus;
    /// Library name
    fn name(&mut self, out: &mut ResponseBuffer) -> NativeStatus;
    /// Library version
    fn version(&mut self, out: &mut ResponseBuffer) -> NativeStatus;
    /// Text of the last failure
    fn last_error(&mut self, out: &mut ResponseBuffer) -> NativeStatus;

    /// Drop loaded documents
    fn clear_documents(&mut self) -> NativeStatus;
    /// Load a document from INI text
    fn load_ini(&mut self, ini: &str) -> NativeStatus;
    /// Sign loaded documents
    fn sign(&mut self) -> NativeStatus;
    /// Schema-validate loaded documents
    fn validate(&mut self) -> NativeStatus;
    /// Send loaded documents
    fn submit(&mut self, lot: u32, print: bool, sync: bool, out: &mut ResponseBuffer) -> NativeStatus;

    /// Query by access key
    fn query(&mut self, key: &str, extract_events: bool, out: &mut ResponseBuffer) -> NativeStatus;
    /// Query by submission receipt
    fn query_receipt(&mut self, receipt: &str, out: &mut ResponseBuffer) -> NativeStatus;
    /// Authority service status
    fn service_status(&mut self, out: &mut ResponseBuffer) -> NativeStatus;

    /// Drop loaded events
    fn clear_events(&mut self) -> NativeStatus;
    /// Load an event from INI text
    fn load_event_ini(&mut self, ini: &str) -> NativeStatus;
    /// Send loaded events
    fn send_event(&mut self, lot: u32, out: &mut ResponseBuffer) -> NativeStatus;

    /// Render the loaded document's DAMDFe
    fn render_pdf(&mut self) -> NativeStatus;
    /// Save the rendered PDF; `out` receives its path
    fn save_pdf(&mut self, out: &mut ResponseBuffer) -> NativeStatus;

    /// Distribution feed, single NSU
    fn distribution_by_nsu(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        nsu: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus;
    /// Distribution feed from the last NSU
    fn distribution_by_last_nsu(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        last_nsu: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus;
    /// Distribution feed by access key
    fn distribution_by_key(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        key: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus;

    /// Compute an access key
    fn generate_key(&mut self, request: &KeyRequest, out: &mut ResponseBuffer) -> NativeStatus;
}
