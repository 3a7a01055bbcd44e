//! Field-level checks run before a manifest is turned into INI
//!
//! The checks are shallow: presence, length and positivity of the fields
//! the authority rejects most often. The authority remains the final word.

use crate::document::digits_only;
use crate::manifest::ManifestAggregate;
use serde::{Deserialize, Serialize};
use std::fmt;

/// How serious a finding is
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    /// Blocks submission
    #[default]
    Error,
    /// Reported only
    Warn,
}

/// One finding
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldError {
    /// Document block (`ide`, `emit`, `veicTracao`, ...)
    pub section: String,
    /// Field name in the document grammar
    pub field: String,
    /// Rule that failed
    pub rule: String,
    /// Human message
    pub message: String,
    /// Severity
    #[serde(default)]
    pub severity: Severity,
}

impl fmt::Display for FieldError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{} [{}]: {}", self.section, self.field, self.rule, self.message)
    }
}

struct Findings<'a> {
    section: &'a str,
    out: &'a mut Vec<FieldError>,
}

impl Findings<'_> {
    fn add(&mut self, field: &str, rule: &str, message: &str) {
        self.out.push(FieldError {
            section: self.section.to_string(),
            field: field.to_string(),
            rule: rule.to_string(),
            message: message.to_string(),
            severity: Severity::Error,
        });
    }
}

fn blank(value: &str) -> bool {
    value.trim().is_empty()
}

fn blank_opt(value: Option<&str>) -> bool {
    value.map_or(true, blank)
}

/// Pre-generation manifest validator
#[derive(Debug, Clone, Copy, Default)]
pub struct ManifestFieldValidator;

impl ManifestFieldValidator {
    /// Create validator
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Run every rule; an empty list means the manifest passed
    #[must_use]
    pub fn validate(&self, manifest: &ManifestAggregate) -> Vec<FieldError> {
        let mut errors = Vec::new();
        Self::check_identification(manifest, &mut errors);
        Self::check_emitter(manifest, &mut errors);
        Self::check_vehicle(manifest, &mut errors);
        Self::check_conductors(manifest, &mut errors);
        Self::check_totals(manifest, &mut errors);

        if !errors.is_empty() {
            tracing::debug!(
                manifest_id = %manifest.id,
                count = errors.len(),
                "manifest field validation failed"
            );
        }
        errors
    }

    fn check_identification(manifest: &ManifestAggregate, out: &mut Vec<FieldError>) {
        let ide = &manifest.identification;
        let mut f = Findings { section: "ide", out };

        if blank(&manifest.emitter.uf) {
            f.add("cUF", "required", "emitter UF missing");
        }
        if ide.series == 0 {
            f.add("serie", ">0", "series must be greater than zero");
        }
        if ide.number == 0 {
            f.add("nMDF", ">0", "document number must be greater than zero");
        }
        if let Some(code) = ide.check_code.as_deref() {
            if code.len() != 8 || !code.chars().all(|c| c.is_ascii_digit()) {
                f.add("cMDF", "8 digits", "cMDF must have 8 numeric digits");
            }
        }
        if ide.modal == 0 {
            f.add("modal", "required", "modal must be set");
        }
        if blank(&ide.uf_start) {
            f.add("UFIni", "required", "UFIni missing");
        }
        if blank(&ide.uf_end) {
            f.add("UFFim", "required", "UFFim missing");
        }
    }

    fn check_emitter(manifest: &ManifestAggregate, out: &mut Vec<FieldError>) {
        let emit = &manifest.emitter;
        let mut f = Findings { section: "emit", out };

        if emit.document().is_none() {
            f.add("CNPJCPF", "required", "emitter CNPJ or CPF required");
        }
        if blank_opt(emit.ie.as_deref()) {
            f.add("IE", "required", "state registration required");
        }
        if blank(&emit.name) {
            f.add("xNome", "required", "legal name required");
        }
        if emit.municipality_code == 0 {
            f.add("cMun", ">0", "invalid IBGE municipality code");
        }
        if blank(&emit.municipality) {
            f.add("xMun", "required", "emitter municipality required");
        }
        if emit.uf.trim().chars().count() != 2 {
            f.add("UF", "UF 2", "UF must have 2 characters");
        }
        if digits_only(&emit.cep).len() != 8 {
            f.add("CEP", "CEP8", "CEP must have 8 digits");
        }
    }

    fn check_vehicle(manifest: &ManifestAggregate, out: &mut Vec<FieldError>) {
        let vehicle = &manifest.vehicle;
        let mut f = Findings {
            section: "veicTracao",
            out,
        };

        if blank(&vehicle.plate) {
            f.add("placa", "required", "vehicle plate required");
        }
        if vehicle.uf.trim().chars().count() != 2 {
            f.add("UF", "UF 2", "vehicle UF must have 2 characters");
        }
    }

    fn check_conductors(manifest: &ManifestAggregate, out: &mut Vec<FieldError>) {
        for (index, conductor) in manifest.conductors().enumerate() {
            let section = format!("moto{:03}", index + 1);
            let mut f = Findings {
                section: &section,
                out: &mut *out,
            };
            if blank(&conductor.cpf) {
                f.add("CPF", "required", "conductor CPF required");
            } else if digits_only(&conductor.cpf).len() != 11 {
                f.add("CPF", "11 digits", "conductor CPF must have 11 digits");
            }
        }
    }

    fn check_totals(manifest: &ManifestAggregate, out: &mut Vec<FieldError>) {
        let totals = &manifest.totals;
        let mut f = Findings { section: "tot", out };

        if !totals.value.is_positive() {
            f.add("vCarga", ">0", "cargo value must be greater than zero");
        }
        if !totals.gross_weight.is_positive() {
            f.add("qCarga", ">0", "gross weight must be greater than zero");
        }
    }
}
