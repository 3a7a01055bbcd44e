//! Binding to the vendor `ACBrMDFe64` library
//!
//! Single-instance C API: every function returns an `int` status, text
//! results are written into a caller buffer whose size is passed in and
//! read back through an `int*`.

#![allow(unsafe_code)]

use crate::native::{KeyRequest, NativeEngine, NativeStatus, ResponseBuffer, NATIVE_FAILURE};
use std::ffi::{c_char, c_int, CString};
use std::path::Path;

#[link(name = "ACBrMDFe64")]
extern "C" {
    fn MDFE_Inicializar(config: *const c_char, crypt_key: *const c_char) -> c_int;
    fn MDFE_Finalizar() -> c_int;
    fn MDFE_Nome(out: *mut c_char, size: *mut c_int) -> c_int;
    fn MDFE_Versao(out: *mut c_char, size: *mut c_int) -> c_int;
    fn MDFE_UltimoRetorno(out: *mut c_char, size: *mut c_int) -> c_int;

    fn MDFE_LimparLista() -> c_int;
    fn MDFE_CarregarINI(ini: *const c_char) -> c_int;
    fn MDFE_Assinar() -> c_int;
    fn MDFE_Validar() -> c_int;
    fn MDFE_Enviar(lot: c_int, print: bool, sync: bool, out: *mut c_char, size: *mut c_int) -> c_int;

    fn MDFE_Consultar(key: *const c_char, extract: bool, out: *mut c_char, size: *mut c_int) -> c_int;
    fn MDFE_ConsultarRecibo(receipt: *const c_char, out: *mut c_char, size: *mut c_int) -> c_int;
    fn MDFE_StatusServico(out: *mut c_char, size: *mut c_int) -> c_int;

    fn MDFE_LimparListaEventos() -> c_int;
    fn MDFE_CarregarEventoINI(ini: *const c_char) -> c_int;
    fn MDFE_EnviarEvento(lot: c_int, out: *mut c_char, size: *mut c_int) -> c_int;

    fn MDFE_ImprimirPDF() -> c_int;
    fn MDFE_SalvarPDF(out: *mut c_char, size: *mut c_int) -> c_int;

    fn MDFE_DistribuicaoDFePorNSU(
        uf: c_int,
        cnpj_cpf: *const c_char,
        nsu: *const c_char,
        out: *mut c_char,
        size: *mut c_int,
    ) -> c_int;
    fn MDFE_DistribuicaoDFePorUltNSU(
        uf: c_int,
        cnpj_cpf: *const c_char,
        last_nsu: *const c_char,
        out: *mut c_char,
        size: *mut c_int,
    ) -> c_int;
    fn MDFE_DistribuicaoDFePorChave(
        uf: c_int,
        cnpj_cpf: *const c_char,
        key: *const c_char,
        out: *mut c_char,
        size: *mut c_int,
    ) -> c_int;

    #[allow(clippy::too_many_arguments)]
    fn MDFE_GerarChave(
        uf: c_int,
        numeric_code: c_int,
        model: c_int,
        series: c_int,
        number: c_int,
        emission_type: c_int,
        emission: *const c_char,
        cnpj_cpf: *const c_char,
        out: *mut c_char,
        size: *mut c_int,
    ) -> c_int;
}

/// [`NativeEngine`] over the linked vendor library.
///
/// Only one instance should exist per process; the library keeps global
/// state.
#[derive(Debug, Default)]
pub struct AcbrEngine {
    local_error: Option<String>,
}

impl AcbrEngine {
    /// Engine over the linked library
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn cstring(&mut self, value: &str) -> Option<CString> {
        match CString::new(value) {
            Ok(s) => Some(s),
            Err(_) => {
                self.local_error = Some("argument contains a NUL byte".to_string());
                None
            }
        }
    }

    fn int(&mut self, value: impl TryInto<c_int>, what: &str) -> Option<c_int> {
        if let Ok(v) = value.try_into() {
            Some(v)
        } else {
            self.local_error = Some(format!("{what} out of range"));
            None
        }
    }

    /// Run a text-returning call against `out`
    fn text(out: &mut ResponseBuffer, call: impl FnOnce(*mut c_char, *mut c_int) -> c_int) -> NativeStatus {
        let spare = out.spare_mut();
        let mut size = c_int::try_from(spare.len()).unwrap_or(c_int::MAX);
        let status = call(spare.as_mut_ptr().cast::<c_char>(), &mut size);
        out.set_reported(usize::try_from(size).unwrap_or(0));
        status
    }
}

impl NativeEngine for AcbrEngine {
    fn initialize(&mut self, config_path: &Path, crypt_key: &str) -> NativeStatus {
        let Some(config) = self.cstring(&config_path.to_string_lossy()) else {
            return NATIVE_FAILURE;
        };
        let Some(key) = self.cstring(crypt_key) else {
            return NATIVE_FAILURE;
        };
        unsafe { MDFE_Inicializar(config.as_ptr(), key.as_ptr()) }
    }

    fn finalize(&mut self) -> NativeStatus {
        unsafe { MDFE_Finalizar() }
    }

    fn name(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        Self::text(out, |p, n| unsafe { MDFE_Nome(p, n) })
    }

    fn version(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        Self::text(out, |p, n| unsafe { MDFE_Versao(p, n) })
    }

    fn last_error(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        if let Some(message) = self.local_error.take() {
            out.fill_str(&message);
            return 0;
        }
        Self::text(out, |p, n| unsafe { MDFE_UltimoRetorno(p, n) })
    }

    fn clear_documents(&mut self) -> NativeStatus {
        unsafe { MDFE_LimparLista() }
    }

    fn load_ini(&mut self, ini: &str) -> NativeStatus {
        let Some(ini) = self.cstring(ini) else {
            return NATIVE_FAILURE;
        };
        unsafe { MDFE_CarregarINI(ini.as_ptr()) }
    }

    fn sign(&mut self) -> NativeStatus {
        unsafe { MDFE_Assinar() }
    }

    fn validate(&mut self) -> NativeStatus {
        unsafe { MDFE_Validar() }
    }

    fn submit(&mut self, lot: u32, print: bool, sync: bool, out: &mut ResponseBuffer) -> NativeStatus {
        let Some(lot) = self.int(lot, "lot") else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe { MDFE_Enviar(lot, print, sync, p, n) })
    }

    fn query(&mut self, key: &str, extract_events: bool, out: &mut ResponseBuffer) -> NativeStatus {
        let Some(key) = self.cstring(key) else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe { MDFE_Consultar(key.as_ptr(), extract_events, p, n) })
    }

    fn query_receipt(&mut self, receipt: &str, out: &mut ResponseBuffer) -> NativeStatus {
        let Some(receipt) = self.cstring(receipt) else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe { MDFE_ConsultarRecibo(receipt.as_ptr(), p, n) })
    }

    fn service_status(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        Self::text(out, |p, n| unsafe { MDFE_StatusServico(p, n) })
    }

    fn clear_events(&mut self) -> NativeStatus {
        unsafe { MDFE_LimparListaEventos() }
    }

    fn load_event_ini(&mut self, ini: &str) -> NativeStatus {
        let Some(ini) = self.cstring(ini) else {
            return NATIVE_FAILURE;
        };
        unsafe { MDFE_CarregarEventoINI(ini.as_ptr()) }
    }

    fn send_event(&mut self, lot: u32, out: &mut ResponseBuffer) -> NativeStatus {
        let Some(lot) = self.int(lot, "lot") else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe { MDFE_EnviarEvento(lot, p, n) })
    }

    fn render_pdf(&mut self) -> NativeStatus {
        unsafe { MDFE_ImprimirPDF() }
    }

    fn save_pdf(&mut self, out: &mut ResponseBuffer) -> NativeStatus {
        Self::text(out, |p, n| unsafe { MDFE_SalvarPDF(p, n) })
    }

    fn distribution_by_nsu(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        nsu: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus {
        let (Some(doc), Some(nsu)) = (self.cstring(cnpj_cpf), self.cstring(nsu)) else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe {
            MDFE_DistribuicaoDFePorNSU(c_int::from(uf_code), doc.as_ptr(), nsu.as_ptr(), p, n)
        })
    }

    fn distribution_by_last_nsu(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        last_nsu: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus {
        let (Some(doc), Some(last)) = (self.cstring(cnpj_cpf), self.cstring(last_nsu)) else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe {
            MDFE_DistribuicaoDFePorUltNSU(c_int::from(uf_code), doc.as_ptr(), last.as_ptr(), p, n)
        })
    }

    fn distribution_by_key(
        &mut self,
        uf_code: u8,
        cnpj_cpf: &str,
        key: &str,
        out: &mut ResponseBuffer,
    ) -> NativeStatus {
        let (Some(doc), Some(key)) = (self.cstring(cnpj_cpf), self.cstring(key)) else {
            return NATIVE_FAILURE;
        };
        Self::text(out, |p, n| unsafe {
            MDFE_DistribuicaoDFePorChave(c_int::from(uf_code), doc.as_ptr(), key.as_ptr(), p, n)
        })
    }

    fn generate_key(&mut self, request: &KeyRequest, out: &mut ResponseBuffer) -> NativeStatus {
        let (Some(numeric), Some(series), Some(number)) = (
            self.int(request.numeric_code, "numeric code"),
            self.int(request.series, "series"),
            self.int(request.number, "number"),
        ) else {
            return NATIVE_FAILURE;
        };
        let (Some(emission), Some(doc)) = (self.cstring(&request.yymm()), self.cstring(&request.cnpj_cpf)) else {
            return NATIVE_FAILURE;
        };
        let uf = c_int::from(request.uf_code);
        let model = c_int::from(request.model);
        let emission_type = c_int::from(request.emission_type);
        Self::text(out, |p, n| unsafe {
            MDFE_GerarChave(
                uf,
                numeric,
                model,
                series,
                number,
                emission_type,
                emission.as_ptr(),
                doc.as_ptr(),
                p,
                n,
            )
        })
    }
}
