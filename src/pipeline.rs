//! Request pipeline: artifacts in, two prices out.
//!
//! Artifacts are loaded once into a [`PredictionContext`]. A [`PricePipeline`]
//! is either ready (holding that context) or degraded (holding the load
//! failure), in which case every request fails fast with `NotReady`.

use crate::config::ArtifactsConfig;
use crate::error::{PredictorError, Result};
use crate::feature_builder::{ColumnOrder, FeatureBuilder, FeatureRecord};
use crate::metrics::PipelineMetrics;
use crate::models::{ArtifactLoader, InferenceEngine, Regressor};
use crate::types::{PhoneSpecs, PricePrediction};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error, info};

/// The three loaded artifacts, immutable for the process lifetime
#[derive(Debug, Clone)]
pub struct PredictionContext {
    pub linear: Arc<dyn Regressor>,
    pub tree: Arc<dyn Regressor>,
    pub columns: Arc<ColumnOrder>,
}

impl PredictionContext {
    /// Load all three artifacts; the first failure aborts
    pub fn load(loader: &mut ArtifactLoader, artifacts: &ArtifactsConfig) -> Result<Self> {
        let linear = loader.load_model(artifacts.linear_model_path())?;
        let tree = loader.load_model(artifacts.tree_model_path())?;
        let columns = loader.load_columns(artifacts.columns_path())?;

        info!(
            linear = %linear.name(),
            tree = %tree.name(),
            columns = columns.len(),
            "Prediction context ready"
        );

        Ok(Self {
            linear,
            tree,
            columns,
        })
    }
}

/// Lifecycle of a single prediction request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestState {
    Idle,
    Building,
    Built,
    Predicting,
    Done,
    Errored,
}

impl RequestState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, RequestState::Done | RequestState::Errored)
    }
}

/// One prediction request, walked through its states exactly once
#[derive(Debug)]
pub struct PredictionRequest {
    specs: PhoneSpecs,
    state: RequestState,
    history: Vec<RequestState>,
    record: Option<FeatureRecord>,
}

impl PredictionRequest {
    pub fn new(specs: PhoneSpecs) -> Self {
        Self {
            specs,
            state: RequestState::Idle,
            history: vec![RequestState::Idle],
            record: None,
        }
    }

    pub fn state(&self) -> RequestState {
        self.state
    }

    /// Every state the request has passed through, starting at `Idle`
    pub fn history(&self) -> &[RequestState] {
        &self.history
    }

    /// Encoded record, once the build step succeeded
    pub fn record(&self) -> Option<&FeatureRecord> {
        self.record.as_ref()
    }

    /// Build then predict. Calling this on a finished request is an error.
    pub fn execute(
        &mut self,
        context: &PredictionContext,
        builder: &FeatureBuilder,
        engine: &InferenceEngine,
    ) -> Result<PricePrediction> {
        if self.state != RequestState::Idle {
            return Err(PredictorError::InvalidState(format!(
                "request already {:?}",
                self.state
            )));
        }

        self.transition(RequestState::Building);
        let record = match builder.build(&self.specs, &context.columns) {
            Ok(record) => record,
            Err(e) => {
                self.transition(RequestState::Errored);
                return Err(e);
            }
        };
        self.transition(RequestState::Built);

        self.transition(RequestState::Predicting);
        let outcome = engine.predict(&record, [context.linear.as_ref(), context.tree.as_ref()]);
        self.record = Some(record);

        match outcome {
            Ok((linear_price, tree_price)) => {
                self.transition(RequestState::Done);
                Ok(PricePrediction::new(linear_price, tree_price))
            }
            Err(e) => {
                self.transition(RequestState::Errored);
                Err(e)
            }
        }
    }

    fn transition(&mut self, next: RequestState) {
        debug!(from = ?self.state, to = ?next, "Request state change");
        self.state = next;
        self.history.push(next);
    }
}

/// Outcome of one pipeline run
#[derive(Debug)]
pub struct RequestOutcome {
    pub result: Result<PricePrediction>,
    /// Encoded features, present when the build step succeeded
    pub record: Option<FeatureRecord>,
    pub final_state: RequestState,
}

enum Readiness {
    Ready(PredictionContext),
    Degraded(PredictorError),
}

/// Entry point for prediction requests
pub struct PricePipeline {
    readiness: Readiness,
    builder: FeatureBuilder,
    engine: InferenceEngine,
    metrics: Arc<PipelineMetrics>,
}

impl PricePipeline {
    /// Load artifacts and build the pipeline.
    ///
    /// A load failure does not abort: the pipeline comes up degraded and
    /// refuses every request.
    pub fn load(
        loader: &mut ArtifactLoader,
        artifacts: &ArtifactsConfig,
        metrics: Arc<PipelineMetrics>,
    ) -> Self {
        match PredictionContext::load(loader, artifacts) {
            Ok(context) => Self::ready(context, metrics),
            Err(e) => {
                error!(error = %e, "Artifacts failed to load, predictor is not ready");
                Self::degraded(e, metrics)
            }
        }
    }

    pub fn ready(context: PredictionContext, metrics: Arc<PipelineMetrics>) -> Self {
        Self::with_readiness(Readiness::Ready(context), metrics)
    }

    pub fn degraded(cause: PredictorError, metrics: Arc<PipelineMetrics>) -> Self {
        Self::with_readiness(Readiness::Degraded(cause), metrics)
    }

    fn with_readiness(readiness: Readiness, metrics: Arc<PipelineMetrics>) -> Self {
        Self {
            readiness,
            builder: FeatureBuilder::new(),
            engine: InferenceEngine::new(metrics.clone()),
            metrics,
        }
    }

    pub fn is_ready(&self) -> bool {
        matches!(self.readiness, Readiness::Ready(_))
    }

    /// Load failure that put the pipeline in degraded mode
    pub fn degraded_cause(&self) -> Option<&PredictorError> {
        match &self.readiness {
            Readiness::Ready(_) => None,
            Readiness::Degraded(cause) => Some(cause),
        }
    }

    pub fn metrics(&self) -> &Arc<PipelineMetrics> {
        &self.metrics
    }

    /// Run one request from a fresh `Idle` state
    pub fn run(&self, specs: PhoneSpecs) -> RequestOutcome {
        let start = Instant::now();

        let context = match &self.readiness {
            Readiness::Ready(context) => context,
            Readiness::Degraded(cause) => {
                self.metrics.record_failure("not_ready");
                return RequestOutcome {
                    result: Err(PredictorError::NotReady(cause.to_string())),
                    record: None,
                    final_state: RequestState::Errored,
                };
            }
        };

        for field in specs.out_of_catalog_fields() {
            debug!(field = field, "Input value outside training catalogue");
        }

        let mut request = PredictionRequest::new(specs);
        let result = request.execute(context, &self.builder, &self.engine);

        match &result {
            Ok(prediction) => {
                self.metrics
                    .record_success(start.elapsed(), prediction.spread());
                debug!(
                    request_id = %prediction.request_id,
                    processing_time_us = start.elapsed().as_micros() as u64,
                    "Request complete"
                );
            }
            Err(e) => {
                self.metrics.record_failure(e.kind());
                error!(error = %e, state = ?request.state(), "Request failed");
            }
        }

        RequestOutcome {
            result,
            final_state: request.state(),
            record: request.record,
        }
    }
}
