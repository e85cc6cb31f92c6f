//! Phone Price Predictor Library
//!
//! Predicts mobile phone prices from hardware specs with two pre-trained
//! regression models (linear regression and decision tree) that share one
//! one-hot encoded feature layout.

pub mod config;
pub mod error;
pub mod feature_builder;
pub mod metrics;
pub mod models;
pub mod pipeline;
pub mod types;

pub use config::AppConfig;
pub use error::PredictorError;
pub use feature_builder::{ColumnOrder, FeatureBuilder, FeatureRecord};
pub use models::{ArtifactLoader, InferenceEngine, Regressor};
pub use pipeline::{PredictionContext, PricePipeline, RequestState};
pub use types::{phone::PhoneSpecs, prediction::PricePrediction};
