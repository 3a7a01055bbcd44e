//! Async facade over the native engine
//!
//! Every public operation:
//! - checks the lifecycle precondition before touching the engine,
//! - runs its whole native sequence under one [`EngineLease`] on the
//!   blocking pool,
//! - writes results back to the [`ManifestStore`] after the lease is
//!   released,
//! - returns a [`ProviderResult`]; faults never escape as panics.

use crate::config::EngineConfig;
use crate::error::{EngineError, Result};
use crate::handle::{EngineHandle, EngineLease};
use crate::init::InitGuard;
use crate::native::KeyRequest;
use crate::response::{
    parse_distribution, parse_event, parse_query, parse_service_status, parse_submit,
    AuthorityResponse, DistributionResponse, EventResponse, QueryResponse, SubmitResponse,
};
use crate::store::{Authorization, ManifestStore};
use chrono::{DateTime, FixedOffset, Local, NaiveDate, Utc};
use mdfe_core::lifecycle::status;
use mdfe_core::uf::uf_code;
use mdfe_core::{
    LifecycleState, LifecycleTracker, ManifestAggregate, ManifestFieldValidator, ManifestId,
    ProviderResult, TransitionNote,
};
use mdfe_generator::{EventContext, EventIniGenerator, EventRequest, ManifestGenerator};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Lot number used for every submission
const LOT: u32 = 1;

/// Engine identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineInfo {
    /// Library name
    pub name: String,
    /// Library version
    pub version: String,
}

/// Authority service availability
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceStatus {
    /// `production` or `homologation`
    pub environment: String,
    /// Native library version
    pub library_version: String,
    /// `cStat == 107`
    pub operational: bool,
    /// `cStat`
    pub code: Option<String>,
    /// `xMotivo`
    pub reason: Option<String>,
    /// `cUF`
    pub uf: Option<String>,
    /// Authority application version
    pub app_version: Option<String>,
    /// `dhRecbto`
    pub received_at: Option<String>,
}

#[derive(Debug, Clone)]
enum GuardRef {
    ProcessWide,
    Owned(Arc<InitGuard>),
}

impl GuardRef {
    fn get(&self) -> &InitGuard {
        match self {
            Self::ProcessWide => InitGuard::process_wide(),
            Self::Owned(guard) => guard,
        }
    }
}

/// Builder for [`EngineBridge`]
pub struct EngineBridgeBuilder {
    handle: EngineHandle,
    store: Arc<dyn ManifestStore>,
    config: EngineConfig,
    tracker: Option<Arc<LifecycleTracker>>,
    guard: GuardRef,
    generator: Option<ManifestGenerator>,
    operator: Option<String>,
}

impl EngineBridgeBuilder {
    /// Engine configuration
    #[must_use]
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Share a lifecycle tracker
    #[must_use]
    pub fn tracker(mut self, tracker: Arc<LifecycleTracker>) -> Self {
        self.tracker = Some(tracker);
        self
    }

    /// Use a private init guard instead of the process-wide one
    #[must_use]
    pub fn init_guard(mut self, guard: Arc<InitGuard>) -> Self {
        self.guard = GuardRef::Owned(guard);
        self
    }

    /// Manifest generator used by [`EngineBridge::submit_manifest`]
    #[must_use]
    pub fn generator(mut self, generator: ManifestGenerator) -> Self {
        self.generator = Some(generator);
        self
    }

    /// Identity recorded as responsible in history rows
    #[must_use]
    pub fn operator(mut self, operator: impl Into<String>) -> Self {
        self.operator = Some(operator.into());
        self
    }

    /// Finish
    #[must_use]
    pub fn build(self) -> EngineBridge {
        EngineBridge {
            handle: self.handle,
            store: self.store,
            config: Arc::new(self.config),
            tracker: self.tracker.unwrap_or_default(),
            guard: self.guard,
            generator: Arc::new(self.generator.unwrap_or_else(ManifestGenerator::new)),
            events: EventIniGenerator::new(),
            validator: ManifestFieldValidator::new(),
            operator: self.operator,
        }
    }
}

/// Serialized, lifecycle-aware access to the native engine
pub struct EngineBridge {
    handle: EngineHandle,
    store: Arc<dyn ManifestStore>,
    config: Arc<EngineConfig>,
    tracker: Arc<LifecycleTracker>,
    guard: GuardRef,
    generator: Arc<ManifestGenerator>,
    events: EventIniGenerator,
    validator: ManifestFieldValidator,
    operator: Option<String>,
}

impl std::fmt::Debug for EngineBridge {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineBridge")
            .field("handle", &self.handle)
            .field("environment", &self.config.environment)
            .finish_non_exhaustive()
    }
}

fn new_trace() -> String {
    uuid::Uuid::new_v4().to_string()
}

fn now_local() -> DateTime<FixedOffset> {
    Local::now().fixed_offset()
}

fn into_result<T>(outcome: Result<T>, trace: &str) -> ProviderResult<T> {
    let err = match outcome {
        Ok(data) => return ProviderResult::ok(data),
        Err(err) => err,
    };

    let kind = err.kind();
    tracing::warn!(error = %err, kind = %kind, trace_id = %trace, "bridge operation failed");

    let mut result = ProviderResult::failure(kind, err.to_string()).with_metadata("trace_id", trace);
    match &err {
        EngineError::Rejected { code, reason, raw } => {
            result = result
                .with_metadata("cStat", code.as_str())
                .with_metadata("xMotivo", reason.as_str())
                .with_metadata("raw", raw.as_str());
        }
        EngineError::Native { step, status, .. } => {
            result = result
                .with_metadata("step", step.as_str())
                .with_metadata("status", status.to_string());
        }
        _ => {}
    }
    result
}

impl EngineBridge {
    /// Start building a bridge
    #[must_use]
    pub fn builder(handle: EngineHandle, store: Arc<dyn ManifestStore>) -> EngineBridgeBuilder {
        EngineBridgeBuilder {
            handle,
            store,
            config: EngineConfig::default(),
            tracker: None,
            guard: GuardRef::ProcessWide,
            generator: None,
            operator: None,
        }
    }

    /// Lifecycle tracker in use
    #[inline]
    #[must_use]
    pub fn tracker(&self) -> &Arc<LifecycleTracker> {
        &self.tracker
    }

    /// Engine configuration in use
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn note(&self, reason: Option<String>, trace: &str) -> TransitionNote {
        TransitionNote {
            reason,
            ..TransitionNote::default()
        }
        .by(self.operator.clone())
        .traced(trace)
    }

    async fn ensure_initialized(&self) -> Result<()> {
        if self.guard.get().is_initialized() {
            return Ok(());
        }
        let guard = self.guard.clone();
        let handle = self.handle.clone();
        let config = Arc::clone(&self.config);
        tokio::task::spawn_blocking(move || guard.get().ensure(&handle, &config).map(|_| ()))
            .await
            .map_err(|e| EngineError::Join(e.to_string()))?
    }

    async fn run_native<T, F>(&self, sequence: F) -> Result<T>
    where
        T: Send + 'static,
        F: FnOnce(&mut EngineLease<'_>) -> Result<T> + Send + 'static,
    {
        self.ensure_initialized().await?;
        let handle = self.handle.clone();
        tokio::task::spawn_blocking(move || {
            let mut lease = handle.lease();
            sequence(&mut lease)
        })
        .await
        .map_err(|e| EngineError::Join(e.to_string()))?
    }

    async fn load(&self, id: ManifestId) -> Result<ManifestAggregate> {
        let manifest = self
            .store
            .load(id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("manifest {id}")))?;
        self.tracker
            .register(id, LifecycleState::from_status(&manifest.status));
        Ok(manifest)
    }

    async fn load_authorized(&self, access_key: &str) -> Result<ManifestAggregate> {
        let manifest = self
            .store
            .find_by_key(access_key)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("manifest with key {access_key}")))?;
        self.tracker
            .register(manifest.id, LifecycleState::from_status(&manifest.status));
        self.tracker.require(manifest.id, LifecycleState::Authorized)?;
        Ok(manifest)
    }

    async fn reject(
        &self,
        id: ManifestId,
        response: &impl AuthorityResponse,
        trace: &str,
    ) -> EngineError {
        let code = response.code().unwrap_or_default().to_string();
        let reason = response.reason().unwrap_or_default().to_string();
        let entry = self
            .tracker
            .record_rejection(id, &code, &reason, self.note(None, trace));
        if let Err(err) = self.store.append_history(id, entry).await {
            return err.into();
        }
        EngineError::Rejected {
            code,
            reason,
            raw: response.raw().to_string(),
        }
    }

    /// Provision configuration and start the engine if not yet done
    #[tracing::instrument(skip(self))]
    pub async fn initialize(&self) -> ProviderResult<EngineInfo> {
        let trace = new_trace();
        into_result(self.engine_info_inner().await, &trace)
    }

    /// Library name and version
    #[tracing::instrument(skip(self))]
    pub async fn engine_info(&self) -> ProviderResult<EngineInfo> {
        let trace = new_trace();
        into_result(self.engine_info_inner().await, &trace)
    }

    async fn engine_info_inner(&self) -> Result<EngineInfo> {
        self.run_native(|lease| {
            Ok(EngineInfo {
                name: lease.name()?,
                version: lease.version()?,
            })
        })
        .await
    }

    /// Submit caller-supplied document INI
    #[tracing::instrument(skip(self, ini), fields(manifest_id = %id, trace_id = tracing::field::Empty))]
    pub async fn submit(&self, id: ManifestId, ini: String) -> ProviderResult<SubmitResponse> {
        let trace = new_trace();
        tracing::Span::current().record("trace_id", trace.as_str());
        let outcome = match self.load(id).await {
            Ok(_) => self.submit_inner(id, ini, &trace).await,
            Err(err) => Err(err),
        };
        into_result(outcome, &trace)
    }

    /// Validate, generate and submit a stored manifest
    #[tracing::instrument(skip(self), fields(manifest_id = %id, trace_id = tracing::field::Empty))]
    pub async fn submit_manifest(&self, id: ManifestId) -> ProviderResult<SubmitResponse> {
        let trace = new_trace();
        tracing::Span::current().record("trace_id", trace.as_str());
        into_result(self.submit_manifest_inner(id, &trace).await, &trace)
    }

    async fn submit_manifest_inner(&self, id: ManifestId, trace: &str) -> Result<SubmitResponse> {
        let manifest = self.load(id).await?;

        let errors = self.validator.validate(&manifest);
        if !errors.is_empty() {
            let summary = errors
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join("; ");
            return Err(EngineError::Invalid(summary));
        }

        let ini = self.generator.generate(&manifest)?;
        self.submit_inner(id, ini, trace).await
    }

    async fn submit_inner(&self, id: ManifestId, ini: String, trace: &str) -> Result<SubmitResponse> {
        self.tracker
            .transition(id, LifecycleState::Transmitted, self.note(None, trace))?;
        let pending = PendingSubmission::new(&self.tracker, id, self.note(None, trace));
        let transmitted_at = Utc::now();

        let raw = self
            .run_native(move |lease| {
                lease.clear_documents()?;
                lease.load_ini(&ini)?;
                lease.sign()?;
                lease.validate()?;
                lease.submit(LOT)
            })
            .await?;

        let response = parse_submit(&raw);
        tracing::info!(
            cstat = response.code().unwrap_or_default(),
            reason = response.reason().unwrap_or_default(),
            "submission answered"
        );
        if !response.is_success() {
            pending.settle();
            return Err(self.reject(id, &response, trace).await);
        }

        let protocol = response.protocol.clone().unwrap_or_default();
        let authorization = Authorization {
            access_key: response.access_key.clone(),
            protocol: response.protocol.clone(),
            receipt: response.receipt.clone(),
            authorized_xml: response.authorized_xml.clone(),
            authorized_at: response
                .received_at
                .as_deref()
                .and_then(|s| DateTime::parse_from_rfc3339(s).ok()),
            transmitted_at,
        };
        self.store.record_authorization(id, authorization).await?;

        let entry = self.tracker.transition(
            id,
            LifecycleState::Authorized,
            self.note(Some(format!("Protocolo: {protocol}")), trace),
        )?;
        pending.settle();
        if let Some(entry) = entry {
            self.store.append_history(id, entry).await?;
        }
        Ok(response)
    }

    /// Query a document by access key
    #[tracing::instrument(skip(self))]
    pub async fn query_by_key(&self, access_key: &str) -> ProviderResult<QueryResponse> {
        let trace = new_trace();
        let key = access_key.to_string();
        let outcome = self
            .run_native(move |lease| lease.query(&key, true))
            .await
            .map(|raw| parse_query(&raw));
        into_result(outcome, &trace)
    }

    /// Query a submission by receipt
    #[tracing::instrument(skip(self))]
    pub async fn query_receipt(&self, receipt: &str) -> ProviderResult<QueryResponse> {
        let trace = new_trace();
        let receipt = receipt.to_string();
        let outcome = self
            .run_native(move |lease| lease.query_receipt(&receipt))
            .await
            .map(|raw| parse_query(&raw));
        into_result(outcome, &trace)
    }

    /// Authority service availability
    #[tracing::instrument(skip(self))]
    pub async fn service_status(&self) -> ProviderResult<ServiceStatus> {
        let trace = new_trace();
        let outcome = self
            .run_native(|lease| {
                let raw = lease.service_status()?;
                let version = lease.version()?;
                Ok((raw, version))
            })
            .await
            .map(|(raw, library_version)| {
                let parsed = parse_service_status(&raw);
                let environment = match parsed.environment.as_deref() {
                    Some("1") => "production",
                    _ => "homologation",
                };
                ServiceStatus {
                    environment: environment.to_string(),
                    library_version,
                    operational: parsed.success,
                    code: parsed.code,
                    reason: parsed.reason,
                    uf: parsed.uf_code,
                    app_version: parsed.app_version,
                    received_at: parsed.received_at,
                }
            });
        into_result(outcome, &trace)
    }

    fn event_context(manifest: &ManifestAggregate, access_key: &str) -> EventContext {
        EventContext {
            uf: manifest.emitter.uf.clone(),
            cnpj_cpf: manifest.emitter.document().unwrap_or_default(),
            access_key: access_key.to_string(),
            protocol: manifest.status.protocol.clone(),
        }
    }

    async fn send_event(&self, request: &EventRequest) -> Result<EventResponse> {
        let ini = self.events.generate(request)?;
        let raw = self
            .run_native(move |lease| {
                lease.clear_events()?;
                lease.load_event_ini(&ini)?;
                lease.send_event(LOT)
            })
            .await?;
        let response = parse_event(&raw);
        tracing::info!(
            code = %request.code,
            cstat = response.code().unwrap_or_default(),
            "event answered"
        );
        Ok(response)
    }

    /// Cancel an authorized document
    #[tracing::instrument(skip(self, justification), fields(trace_id = tracing::field::Empty))]
    pub async fn cancel(&self, access_key: &str, justification: &str) -> ProviderResult<EventResponse> {
        let trace = new_trace();
        tracing::Span::current().record("trace_id", trace.as_str());
        into_result(self.cancel_inner(access_key, justification, &trace).await, &trace)
    }

    async fn cancel_inner(&self, access_key: &str, justification: &str, trace: &str) -> Result<EventResponse> {
        let manifest = self.load_authorized(access_key).await?;
        let request = EventRequest::cancellation(
            Self::event_context(&manifest, access_key),
            now_local(),
            justification,
        );
        let response = self.send_event(&request).await?;
        if !response.is_success() {
            return Err(self.reject(manifest.id, &response, trace).await);
        }

        let entry = self.tracker.transition(
            manifest.id,
            LifecycleState::Cancelled,
            self.note(Some(format!("Justificativa: {justification}")), trace),
        )?;
        self.store.record_cancellation(manifest.id, Utc::now()).await?;
        if let Some(entry) = entry {
            self.store.append_history(manifest.id, entry).await?;
        }
        Ok(response)
    }

    /// Close an authorized document
    #[tracing::instrument(skip(self), fields(trace_id = tracing::field::Empty))]
    pub async fn close(
        &self,
        access_key: &str,
        municipality_code: &str,
        closed_on: NaiveDate,
    ) -> ProviderResult<EventResponse> {
        let trace = new_trace();
        tracing::Span::current().record("trace_id", trace.as_str());
        into_result(
            self.close_inner(access_key, municipality_code, closed_on, &trace)
                .await,
            &trace,
        )
    }

    async fn close_inner(
        &self,
        access_key: &str,
        municipality_code: &str,
        closed_on: NaiveDate,
        trace: &str,
    ) -> Result<EventResponse> {
        let manifest = self.load_authorized(access_key).await?;
        let request = EventRequest::closure(
            Self::event_context(&manifest, access_key),
            now_local(),
            municipality_code,
            closed_on,
        );
        let response = self.send_event(&request).await?;
        if !response.is_success() {
            return Err(self.reject(manifest.id, &response, trace).await);
        }

        let entry = self.tracker.transition(
            manifest.id,
            LifecycleState::Closed,
            self.note(Some(format!("Municipio: {municipality_code}")), trace),
        )?;
        self.store.record_closure(manifest.id, Utc::now()).await?;
        if let Some(entry) = entry {
            self.store.append_history(manifest.id, entry).await?;
        }
        Ok(response)
    }

    /// Register an additional conductor on an authorized document
    #[tracing::instrument(skip(self, cpf), fields(trace_id = tracing::field::Empty))]
    pub async fn include_conductor(
        &self,
        access_key: &str,
        name: &str,
        cpf: &str,
    ) -> ProviderResult<EventResponse> {
        let trace = new_trace();
        tracing::Span::current().record("trace_id", trace.as_str());
        let outcome = async {
            let manifest = self.load_authorized(access_key).await?;
            let request = EventRequest::conductor_inclusion(
                Self::event_context(&manifest, access_key),
                now_local(),
                name,
                cpf,
            );
            self.finish_inclusion(&manifest, &request, status::CONDUCTOR_INCLUDED, name, &trace)
                .await
        }
        .await;
        into_result(outcome, &trace)
    }

    /// Register an additional NF-e / CT-e on an authorized document
    #[tracing::instrument(skip(self), fields(trace_id = tracing::field::Empty))]
    pub async fn include_document(
        &self,
        access_key: &str,
        unloading_municipality_code: &str,
        document_key: &str,
        document_kind: &str,
    ) -> ProviderResult<EventResponse> {
        let trace = new_trace();
        tracing::Span::current().record("trace_id", trace.as_str());
        let outcome = async {
            let manifest = self.load_authorized(access_key).await?;
            let request = EventRequest::document_inclusion(
                Self::event_context(&manifest, access_key),
                now_local(),
                unloading_municipality_code,
                document_key,
                document_kind,
            );
            self.finish_inclusion(
                &manifest,
                &request,
                status::DOCUMENT_INCLUDED,
                document_key,
                &trace,
            )
            .await
        }
        .await;
        into_result(outcome, &trace)
    }

    async fn finish_inclusion(
        &self,
        manifest: &ManifestAggregate,
        request: &EventRequest,
        label: &str,
        reason: &str,
        trace: &str,
    ) -> Result<EventResponse> {
        let response = self.send_event(request).await?;
        if !response.is_success() {
            return Err(self.reject(manifest.id, &response, trace).await);
        }
        let entry = self
            .tracker
            .record_event(manifest.id, label, self.note(Some(reason.to_string()), trace))?;
        self.store.append_history(manifest.id, entry).await?;
        Ok(response)
    }

    /// Render the DAMDFe of a document and return the PDF bytes
    #[tracing::instrument(skip(self))]
    pub async fn render_pdf(&self, access_key: &str) -> ProviderResult<Vec<u8>> {
        let trace = new_trace();
        let key = access_key.to_string();
        let outcome = async {
            let path = self
                .run_native(move |lease| {
                    lease.query(&key, false)?;
                    lease.render_pdf()?;
                    lease.save_pdf()
                })
                .await?;
            let path = path.trim().to_string();
            tokio::fs::read(&path)
                .await
                .map_err(|e| EngineError::io(format!("reading rendered PDF {path}"), e))
        }
        .await;
        into_result(outcome, &trace)
    }

    /// Stored authorized XML
    #[tracing::instrument(skip(self))]
    pub async fn authorized_xml(&self, id: ManifestId) -> ProviderResult<String> {
        let trace = new_trace();
        let outcome = async {
            let manifest = self.load(id).await?;
            manifest
                .status
                .authorized_xml
                .filter(|xml| !xml.trim().is_empty())
                .ok_or_else(|| EngineError::not_found(format!("authorized XML of manifest {id}")))
        }
        .await;
        into_result(outcome, &trace)
    }

    /// Compute an access key
    #[tracing::instrument(skip(self))]
    pub async fn generate_key(&self, request: KeyRequest) -> ProviderResult<String> {
        let trace = new_trace();
        let outcome = self
            .run_native(move |lease| lease.generate_key(&request))
            .await
            .map(|key| key.trim().to_string());
        into_result(outcome, &trace)
    }

    fn uf(uf: &str) -> Result<u8> {
        uf_code(uf).ok_or_else(|| EngineError::Invalid(format!("unknown UF '{uf}'")))
    }

    /// Distribution feed for one NSU
    #[tracing::instrument(skip(self))]
    pub async fn distribution_by_nsu(
        &self,
        uf: &str,
        cnpj_cpf: &str,
        nsu: &str,
    ) -> ProviderResult<DistributionResponse> {
        let trace = new_trace();
        let (cnpj, nsu) = (cnpj_cpf.to_string(), nsu.to_string());
        let outcome = match Self::uf(uf) {
            Ok(code) => self
                .run_native(move |lease| lease.distribution_by_nsu(code, &cnpj, &nsu))
                .await
                .map(|raw| parse_distribution(&raw)),
            Err(err) => Err(err),
        };
        into_result(outcome, &trace)
    }

    /// Distribution feed after the last seen NSU
    #[tracing::instrument(skip(self))]
    pub async fn distribution_by_last_nsu(
        &self,
        uf: &str,
        cnpj_cpf: &str,
        last_nsu: &str,
    ) -> ProviderResult<DistributionResponse> {
        let trace = new_trace();
        let (cnpj, last) = (cnpj_cpf.to_string(), last_nsu.to_string());
        let outcome = match Self::uf(uf) {
            Ok(code) => self
                .run_native(move |lease| lease.distribution_by_last_nsu(code, &cnpj, &last))
                .await
                .map(|raw| parse_distribution(&raw)),
            Err(err) => Err(err),
        };
        into_result(outcome, &trace)
    }

    /// Distribution feed for one access key
    #[tracing::instrument(skip(self))]
    pub async fn distribution_by_key(
        &self,
        uf: &str,
        cnpj_cpf: &str,
        access_key: &str,
    ) -> ProviderResult<DistributionResponse> {
        let trace = new_trace();
        let (cnpj, key) = (cnpj_cpf.to_string(), access_key.to_string());
        let outcome = match Self::uf(uf) {
            Ok(code) => self
                .run_native(move |lease| lease.distribution_by_key(code, &cnpj, &key))
                .await
                .map(|raw| parse_distribution(&raw)),
            Err(err) => Err(err),
        };
        into_result(outcome, &trace)
    }
}

/// Returns a `Transmitted` manifest to `Draft` unless settled.
///
/// Covers every early exit of a submission: native faults, store failures
/// and the caller dropping the future mid-await. The revert writes no
/// history row.
struct PendingSubmission<'a> {
    tracker: &'a LifecycleTracker,
    id: ManifestId,
    note: Option<TransitionNote>,
}

impl<'a> PendingSubmission<'a> {
    fn new(tracker: &'a LifecycleTracker, id: ManifestId, note: TransitionNote) -> Self {
        Self {
            tracker,
            id,
            note: Some(note),
        }
    }

    /// The submission reached an outcome; keep the current state
    fn settle(mut self) {
        self.note = None;
    }
}

impl Drop for PendingSubmission<'_> {
    fn drop(&mut self) {
        let Some(note) = self.note.take() else {
            return;
        };
        if self.tracker.state(self.id) != Some(LifecycleState::Transmitted) {
            return;
        }
        match self.tracker.transition(self.id, LifecycleState::Draft, note) {
            Ok(_) => tracing::debug!(manifest_id = %self.id, "unfinished submission returned to draft"),
            Err(err) => tracing::warn!(manifest_id = %self.id, %err, "could not return submission to draft"),
        }
    }
}
