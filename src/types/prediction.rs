//! Price prediction output

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Prices predicted by both models for one request
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PricePrediction {
    /// Unique request identifier
    pub request_id: String,

    /// Linear regression estimate
    pub linear_price: f64,

    /// Decision tree estimate
    pub tree_price: f64,

    /// Prediction timestamp
    pub timestamp: DateTime<Utc>,
}

impl PricePrediction {
    pub fn new(linear_price: f64, tree_price: f64) -> Self {
        Self {
            request_id: uuid::Uuid::new_v4().to_string(),
            linear_price,
            tree_price,
            timestamp: Utc::now(),
        }
    }

    /// Absolute difference between the two estimates
    pub fn spread(&self) -> f64 {
        (self.linear_price - self.tree_price).abs()
    }
}

/// Format a price as `<symbol> 12,345.67`.
pub fn format_price(value: f64, symbol: &str, decimals: usize) -> String {
    if !value.is_finite() {
        return format!("{} {}", symbol, value);
    }

    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((int_part, frac_part)) => (int_part, Some(frac_part)),
        None => (rendered.as_str(), None),
    };

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value.is_sign_negative() { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{} {}{}.{}", symbol, sign, grouped, frac),
        None => format!("{} {}{}", symbol, sign, grouped),
    }
}
