//! Engine used when the native library is not linked

use crate::native::{KeyRequest, NativeEngine, NativeStatus, ResponseBuffer, NATIVE_FAILURE, NATIVE_OK};
use std::path::Path;

/// Text reported by every [`UnavailableEngine`] failure
pub const UNAVAILABLE_MESSAGE: &str = "native engine unavailable";

/// Engine that refuses every call, so bridge operations return typed
/// failures instead of linking errors.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableEngine;

impl NativeEngine for UnavailableEngine {
    fn initialize(&mut self, _config_path: &Path, _crypt_key: &str) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn finalize(&mut self) -> NativeStatus {
        NATIVE_OK
    }

    fn name(&mut self, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn version(&mut self, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn last_error(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        out.fill_str(UNAVAILABLE_MESSAGE);
        NATIVE_OK
    }

    fn clear_documents(&mut self) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn load_ini(&mut self, _ini: &str) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn sign(&mut self) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn validate(&mut self) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn submit(&mut self, _lot: u32, _print: bool, _sync: bool, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn query(&mut self, _key: &str, _extract_events: bool, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn query_receipt(&mut self, _receipt: &str, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn service_status(&mut self, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn clear_events(&mut self) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn load_event_ini(&mut self, _ini: &str) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn send_event(&mut self, _lot: u32, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn render_pdf(&mut self) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn save_pdf(&mut self, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn distribution_by_nsu(
        &mut self,
        _uf_code: u8,
        _cnpj_cpf: &str,
        _nsu: &str,
        _out: &mut ResponseBuffer,
    ) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn distribution_by_last_nsu(
        &mut self,
        _uf_code: u8,
        _cnpj_cpf: &str,
        _last_nsu: &str,
        _out: &mut ResponseBuffer,
    ) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn distribution_by_key(
        &mut self,
        _uf_code: u8,
        _cnpj_cpf: &str,
        _key: &str,
        _out: &mut ResponseBuffer,
    ) -> NativeStatus {
        NATIVE_FAILURE
    }

    fn generate_key(&mut self, _request: &KeyRequest, _out: &mut ResponseBuffer) -> NativeStatus {
        NATIVE_FAILURE
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_diagnostics_succeed() {
        let mut engine = UnavailableEngine;
        let mut out = ResponseBuffer::with_capacity(64);
        assert_eq!(engine.initialize(Path::new("ACBrLib.ini"), ""), NATIVE_FAILURE);
        assert_eq!(engine.version(&mut out), NATIVE_FAILURE);
        assert_eq!(engine.last_error(&mut out), NATIVE_OK);
        assert_eq!(out.text(), UNAVAILABLE_MESSAGE);
        assert_eq!(engine.finalize(), NATIVE_OK);
    }
}
