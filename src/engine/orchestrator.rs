//! Validation orchestration.
//!
//! Runs phases in the fixed order connectivity → platform → health →
//! performance → security, one after another, and records the result.
//!
//! # Graceful Degradation
//!
//! - Probe failures: absorbed by the probe, surfaced as `passed: false`
//! - Phase below threshold: recorded as failed, later phases still run
//! - Invalid `DeploymentConfig`: run ends with status `error`
//! - Panic inside a phase: caught, run ends with status `error`
//! - Listener panic: logged, run continues
//!
//! Every call to `validate_deployment` stores exactly one result and emits
//! exactly one `complete` or `error` event. No function in this module panics.

use crate::checks::{self, ProbeContext};
use crate::engine::events::{EventBus, SubscriptionId, ValidationEvent};
use crate::engine::phase::{Phase, PhaseResult};
use crate::engine::result::ValidationResult;
use crate::engine::store::ResultStore;
use crate::net::{ReqwestTransport, Transport};
use crate::settings::Settings;
use crate::{DeployCheckError, DeploymentConfig};
use chrono::Utc;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::{error, info, info_span};

/// Shared by every validator so ids stay unique across the process.
static NEXT_RUN: AtomicU64 = AtomicU64::new(0);

/// Runs validations and keeps their results.
///
/// `Send + Sync`: independent runs may be started from several threads at
/// once. Each gets its own id and store entry.
pub struct DeploymentValidator {
    transport: Arc<dyn Transport>,
    settings: Settings,
    phases: Vec<Phase>,
    events: EventBus,
    store: ResultStore,
}

impl DeploymentValidator {
    /// Create a validator over the given transport, running every phase.
    pub fn new(transport: Arc<dyn Transport>, settings: Settings) -> Self {
        let store = ResultStore::new(settings.store.capacity);
        DeploymentValidator {
            transport,
            settings,
            phases: Phase::ALL.to_vec(),
            events: EventBus::new(),
            store,
        }
    }

    /// Create a validator using the reqwest transport.
    pub fn with_http(settings: Settings) -> Result<Self, DeployCheckError> {
        let transport = ReqwestTransport::new(&settings.http)?;
        Ok(Self::new(Arc::new(transport), settings))
    }

    /// Restrict the run to a subset of phases. Order and duplicates in
    /// `phases` are ignored; the fixed order always applies.
    pub fn with_phases(mut self, phases: &[Phase]) -> Self {
        let mut selected: Vec<Phase> = phases.to_vec();
        selected.sort();
        selected.dedup();
        self.phases = selected;
        self
    }

    pub fn phases(&self) -> &[Phase] {
        &self.phases
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn subscribe<F>(&self, listener: F) -> SubscriptionId
    where
        F: Fn(&ValidationEvent) + Send + Sync + 'static,
    {
        self.events.subscribe(listener)
    }

    pub fn unsubscribe(&self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    /// Stored result for a run, if still retained.
    pub fn get_validation_results(&self, validation_id: &str) -> Option<Arc<ValidationResult>> {
        self.store.get(validation_id)
    }

    /// Ids of retained runs, oldest first.
    pub fn list_validations(&self) -> Vec<String> {
        self.store.ids()
    }

    /// Validate one deployment.
    pub fn validate_deployment(&self, config: &DeploymentConfig) -> Arc<ValidationResult> {
        let validation_id = self.next_validation_id();
        let span = info_span!("validation", id = %validation_id, url = %config.url);
        let _guard = span.enter();

        let start_time = Utc::now();
        info!(platform = %config.platform, phases = self.phases.len(), "validation started");
        self.events.emit(&ValidationEvent::Start {
            validation_id: validation_id.clone(),
            url: config.url.clone(),
            platform: config.platform,
        });

        let outcome = config.validate().and_then(|()| {
            catch_unwind(AssertUnwindSafe(|| self.run_phases(&validation_id, config)))
                .map_err(|payload| DeployCheckError::Internal(panic_message(payload.as_ref())))
        });
        let end_time = Utc::now();

        match outcome {
            Ok(phases) => {
                let result = Arc::new(ValidationResult::completed(
                    validation_id.clone(),
                    config.platform,
                    config.url.clone(),
                    phases,
                    start_time,
                    end_time,
                ));
                self.store.insert(Arc::clone(&result));
                info!(
                    status = %result.status,
                    duration_ms = result.duration_ms,
                    "validation complete"
                );
                self.events.emit(&ValidationEvent::Complete {
                    validation_id,
                    result: Arc::clone(&result),
                });
                result
            }
            Err(e) => {
                let message = e.to_string();
                let result = Arc::new(ValidationResult::errored(
                    validation_id.clone(),
                    config.platform,
                    config.url.clone(),
                    message.clone(),
                    start_time,
                    end_time,
                ));
                self.store.insert(Arc::clone(&result));
                error!(error = %message, "validation aborted");
                self.events.emit(&ValidationEvent::Error {
                    validation_id,
                    error: message,
                });
                result
            }
        }
    }

    fn run_phases(&self, validation_id: &str, config: &DeploymentConfig) -> Vec<PhaseResult> {
        let ctx = ProbeContext {
            transport: self.transport.as_ref(),
            config,
            settings: &self.settings,
        };

        let total = self.phases.len();
        let mut results = Vec::with_capacity(total);

        for (index, phase) in self.phases.iter().enumerate() {
            let result = checks::run_phase(*phase, &ctx);
            info!(
                phase = %phase,
                status = %result.status,
                passed = result.passed,
                total = result.total,
                "phase finished"
            );
            self.events.emit(&ValidationEvent::Progress {
                validation_id: validation_id.to_string(),
                phase: *phase,
                result: result.clone(),
                completed: index + 1,
                total,
            });
            results.push(result);
        }

        results
    }

    /// `validation_<unix-millis>_<counter>`, unique within the process.
    fn next_validation_id(&self) -> String {
        let seq = NEXT_RUN.fetch_add(1, Ordering::Relaxed);
        format!("validation_{}_{}", Utc::now().timestamp_millis(), seq)
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "validation panicked".to_string()
    }
}
