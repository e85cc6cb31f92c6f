//! Type definitions for the price predictor

pub mod phone;
pub mod prediction;

pub use phone::{PhoneSpecs, ProcessorBrand};
pub use prediction::{format_price, PricePrediction};
