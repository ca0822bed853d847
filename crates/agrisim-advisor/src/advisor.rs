//! The advisory engine.
//!
//! [`Advisor::analyze`] never fails. A cache hit returns the stored report
//! unchanged; a miss issues at most one bounded request per crop (concurrent
//! callers await the same shared future) and degrades to the heuristics on
//! any failure. Cheap to clone; clones share all state.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use agrisim_types::{AdvisoryReport, AdvisoryStatus, CropId, CropKind, EnvironmentState, GeneticVariation};
use futures::FutureExt;
use futures::future::{BoxFuture, Shared};
use tokio::time::timeout;
use tracing::{debug, info, warn};

use crate::config::AdvisorConfig;
use crate::error::AdvisorError;
use crate::heuristics;
use crate::llm::{LlmBackend, create_backend};
use crate::parse::{parse_sections, parse_variation_hint};
use crate::prompt::{PromptEngine, RenderedPrompt};
use crate::status::StatusTracker;
use crate::subject::{AdvisorySubject, Fingerprint};

/// A report computation that several callers can await together.
type SharedReport = Shared<BoxFuture<'static, AdvisoryReport>>;

/// Per-species state of the genetic-variation hint.
#[derive(Debug, Clone, Copy)]
enum HintSlot {
    Pending,
    Ready(GeneticVariation),
    Failed,
}

struct Inner {
    backend: Option<LlmBackend>,
    prompts: PromptEngine,
    status: StatusTracker,
    request_timeout: Duration,
    reprobe_interval: Duration,
    cache: Mutex<HashMap<Fingerprint, AdvisoryReport>>,
    in_flight: Mutex<HashMap<CropId, SharedReport>>,
    hints: Mutex<HashMap<CropKind, HintSlot>>,
}

/// Cache-backed advisory report generator.
#[derive(Clone)]
pub struct Advisor {
    inner: Arc<Inner>,
}

impl core::fmt::Debug for Advisor {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Advisor")
            .field("backend", &self.inner.backend.as_ref().map(LlmBackend::name))
            .field("status", &self.inner.status)
            .finish_non_exhaustive()
    }
}

/// Lock a mutex, recovering the data if a holder panicked.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    match mutex.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}

impl Advisor {
    /// Build from configuration, reading the credential from the environment.
    ///
    /// A missing credential is not an error: the network path is simply
    /// disabled and every report comes from the heuristics.
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Template`] if a template override is broken.
    pub fn new(config: &AdvisorConfig) -> Result<Self, AdvisorError> {
        let credential = config.resolve_credential();
        if credential.is_none() {
            info!(
                credential_env = %config.credential_env,
                "no advisory credential configured, using deterministic fallback only"
            );
        }
        let backend = create_backend(config, credential);
        Self::with_backend(config, backend)
    }

    /// Build around an explicit backend (`None` disables the network path).
    ///
    /// # Errors
    ///
    /// Returns [`AdvisorError::Template`] if a template override is broken.
    pub fn with_backend(
        config: &AdvisorConfig,
        backend: Option<LlmBackend>,
    ) -> Result<Self, AdvisorError> {
        let prompts = PromptEngine::new(config.templates_dir.as_deref())?;
        let has_credential = backend.as_ref().is_some_and(LlmBackend::holds_credential);
        let status = StatusTracker::new(has_credential, config.model.clone());
        Ok(Self {
            inner: Arc::new(Inner {
                backend,
                prompts,
                status,
                request_timeout: config.request_timeout(),
                reprobe_interval: config.reprobe_interval(),
                cache: Mutex::new(HashMap::new()),
                in_flight: Mutex::new(HashMap::new()),
                hints: Mutex::new(HashMap::new()),
            }),
        })
    }

    /// Whether a backend is configured at all.
    pub fn is_enabled(&self) -> bool {
        self.inner.backend.is_some()
    }

    /// Whether the last request or probe succeeded.
    pub fn is_connected(&self) -> bool {
        self.inner.status.is_connected()
    }

    /// Read-only status snapshot.
    pub fn status(&self) -> AdvisoryStatus {
        self.inner.status.snapshot()
    }

    // -----------------------------------------------------------------------
    // Connectivity
    // -----------------------------------------------------------------------

    /// Issue a tiny request to check the service is reachable.
    ///
    /// Bounded by the request timeout. Not counted as a request.
    pub async fn probe(&self) -> bool {
        self.inner.status.mark_probed();
        self.probe_once().await
    }

    async fn probe_once(&self) -> bool {
        let Some(backend) = self.inner.backend.as_ref() else {
            return false;
        };
        let prompt = match self.inner.prompts.render_probe() {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!(error = %e, "failed to render probe prompt");
                return false;
            }
        };
        match timeout(self.inner.request_timeout, backend.complete(&prompt)).await {
            Ok(Ok(_)) => {
                self.inner.status.record_success();
                info!(backend = backend.name(), "advisory service connected");
                true
            }
            Ok(Err(e)) => {
                self.inner.status.record_disconnect();
                warn!(backend = backend.name(), error = %e, "advisory probe failed");
                false
            }
            Err(_) => {
                self.inner.status.record_disconnect();
                warn!(
                    backend = backend.name(),
                    timeout_ms = self.inner.request_timeout.as_millis(),
                    "advisory probe timed out"
                );
                false
            }
        }
    }

    /// Connected, or reconnected by a probe if one is due.
    async fn ensure_connected(&self) -> bool {
        if self.inner.status.is_connected() {
            return true;
        }
        if self.inner.status.claim_probe(self.inner.reprobe_interval) {
            return self.probe_once().await;
        }
        false
    }

    // -----------------------------------------------------------------------
    // Analysis
    // -----------------------------------------------------------------------

    /// Produce a report for `subject`. Never fails.
    ///
    /// Requests are coalesced per crop: a caller arriving while a request
    /// for the same crop is in flight gets that request's report, even if
    /// its own snapshot has since moved to another fingerprint.
    pub async fn analyze(&self, subject: AdvisorySubject) -> AdvisoryReport {
        let fingerprint = subject.fingerprint();
        if let Some(report) = self.cached(&fingerprint) {
            debug!(crop_id = %subject.crop, fingerprint = %fingerprint, "advisory cache hit");
            return report;
        }

        let shared = {
            let mut in_flight = lock(&self.inner.in_flight);
            if let Some(existing) = in_flight.get(&subject.crop) {
                debug!(crop_id = %subject.crop, "joining in-flight advisory request");
                existing.clone()
            } else if let Some(report) = self.cached(&fingerprint) {
                // Finished between the first lookup and taking the lock.
                return report;
            } else {
                debug!(crop_id = %subject.crop, fingerprint = %fingerprint, "advisory cache miss");
                let crop = subject.crop;
                let future = self.clone().compute(subject).boxed().shared();
                in_flight.insert(crop, future.clone());
                future
            }
        };

        shared.await
    }

    /// Whether a report for `crop` is being computed.
    pub fn is_in_flight(&self, crop: CropId) -> bool {
        lock(&self.inner.in_flight).contains_key(&crop)
    }

    /// Cached report for a fingerprint, if any.
    pub fn cached(&self, fingerprint: &Fingerprint) -> Option<AdvisoryReport> {
        lock(&self.inner.cache).get(fingerprint).cloned()
    }

    /// Number of cached reports.
    pub fn cache_len(&self) -> usize {
        lock(&self.inner.cache).len()
    }

    /// Drop every cached report. The next `analyze` for any state misses.
    pub fn clear_cache(&self) {
        let mut cache = lock(&self.inner.cache);
        let cleared = cache.len();
        cache.clear();
        info!(cleared, "advisory cache cleared");
    }

    /// Report from the cache or the heuristics, synchronously and without
    /// touching the network. Used where no runtime is available or the
    /// service is disabled; the result is cached like any other.
    pub fn analyze_offline(&self, subject: &AdvisorySubject) -> AdvisoryReport {
        let fingerprint = subject.fingerprint();
        let mut cache = lock(&self.inner.cache);
        if let Some(report) = cache.get(&fingerprint) {
            debug!(crop_id = %subject.crop, fingerprint = %fingerprint, "advisory cache hit");
            return report.clone();
        }
        let report = heuristics::fallback_report(subject);
        cache.insert(fingerprint, report.clone());
        report
    }

    /// Yield text without touching the network: the cached report's if
    /// present, otherwise the heuristic prediction.
    pub fn yield_text(&self, subject: &AdvisorySubject) -> String {
        self.cached(&subject.fingerprint())
            .map_or_else(|| heuristics::predict_yield(subject), |report| report.yield_prediction)
    }

    async fn compute(self, subject: AdvisorySubject) -> AdvisoryReport {
        let report = match self.request_report(&subject).await {
            Ok(report) => report,
            Err(AdvisorError::Disabled) => {
                debug!(crop_id = %subject.crop, "advisory service disabled, using heuristics");
                heuristics::fallback_report(&subject)
            }
            Err(e) => {
                warn!(crop_id = %subject.crop, error = %e, "advisory request failed, using heuristics");
                heuristics::fallback_report(&subject)
            }
        };

        // Cache before leaving the in-flight table so a caller arriving in
        // between hits the cache instead of issuing a new request.
        lock(&self.inner.cache).insert(subject.fingerprint(), report.clone());
        lock(&self.inner.in_flight).remove(&subject.crop);
        report
    }

    async fn request_report(&self, subject: &AdvisorySubject) -> Result<AdvisoryReport, AdvisorError> {
        if self.inner.backend.is_none() {
            return Err(AdvisorError::Disabled);
        }
        if !self.ensure_connected().await {
            return Err(AdvisorError::Transport("service unreachable".to_owned()));
        }

        let prompt = self.inner.prompts.render_analysis(subject)?;
        let reply = self.send(&prompt).await?;
        let sections = parse_sections(&reply).inspect_err(|_| {
            self.inner.status.record_malformed();
        })?;

        let confidence = heuristics::confidence(subject, self.inner.status.is_connected());
        info!(crop_id = %subject.crop, confidence, "advisory report from service");
        Ok(sections.into_report(subject, confidence))
    }

    /// One counted request, bounded by the timeout.
    async fn send(&self, prompt: &RenderedPrompt) -> Result<String, AdvisorError> {
        let Some(backend) = self.inner.backend.as_ref() else {
            return Err(AdvisorError::Disabled);
        };
        self.inner.status.record_request();
        match timeout(self.inner.request_timeout, backend.complete(prompt)).await {
            Ok(Ok(reply)) => {
                self.inner.status.record_success();
                Ok(reply)
            }
            Ok(Err(e)) => {
                self.inner.status.record_failure();
                Err(e)
            }
            Err(_) => {
                self.inner.status.record_failure();
                let millis = u64::try_from(self.inner.request_timeout.as_millis()).unwrap_or(u64::MAX);
                Err(AdvisorError::Timeout(millis))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Genetic-variation hints
    // -----------------------------------------------------------------------

    /// Cached hint for a species, if one arrived.
    pub fn variation_hint(&self, kind: CropKind) -> Option<GeneticVariation> {
        match lock(&self.inner.hints).get(&kind) {
            Some(HintSlot::Ready(hint)) => Some(*hint),
            _ => None,
        }
    }

    /// Reserve the one hint request allowed per species.
    ///
    /// Returns `true` if the caller should now run
    /// [`Advisor::fetch_variation_hint`]. Only while connected.
    pub fn claim_variation_request(&self, kind: CropKind) -> bool {
        if !self.is_enabled() || !self.is_connected() {
            return false;
        }
        let mut hints = lock(&self.inner.hints);
        if hints.contains_key(&kind) {
            return false;
        }
        hints.insert(kind, HintSlot::Pending);
        true
    }

    /// Request, parse and store a hint for `kind`.
    pub async fn fetch_variation_hint(
        &self,
        kind: CropKind,
        environment: EnvironmentState,
    ) -> Option<GeneticVariation> {
        let result = match self.inner.prompts.render_variation(kind, &environment) {
            Ok(prompt) => match self.send(&prompt).await {
                Ok(reply) => parse_variation_hint(&reply).inspect_err(|_| {
                    self.inner.status.record_malformed();
                }),
                Err(e) => Err(e),
            },
            Err(e) => Err(e),
        };

        let slot = match result {
            Ok(hint) => {
                debug!(species = %kind, "genetic variation hint stored");
                HintSlot::Ready(hint)
            }
            Err(e) => {
                warn!(species = %kind, error = %e, "variation hint request failed, using randomized genetics");
                HintSlot::Failed
            }
        };
        lock(&self.inner.hints).insert(kind, slot);
        match slot {
            HintSlot::Ready(hint) => Some(hint),
            HintSlot::Pending | HintSlot::Failed => None,
        }
    }
}
