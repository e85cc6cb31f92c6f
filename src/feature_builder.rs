//! Feature vector assembly for price model inference.
//!
//! Turns raw phone specs into the single-row record the models were trained
//! on: seven numeric columns passed through unchanged plus a one-hot encoding
//! of the processor brand with `Exynos` as the dropped baseline. The record is
//! always laid out in the order of the training column list.

use crate::error::{PredictorError, Result};
use crate::types::phone::{PhoneSpecs, ProcessorBrand};
use serde::ser::SerializeMap;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;
use tracing::{debug, warn};

/// Numeric columns, in training order
pub const NUMERIC_COLUMNS: [&str; 7] = [
    "RAM",
    "ROM",
    "Battery",
    "Size Cam Blkg",
    "Total Cam Blkg",
    "Size Cam Dpn",
    "Total Cam Dpn",
];

/// Indicator column for every non-baseline processor brand
pub const PROCESSOR_INDICATORS: [(ProcessorBrand, &str); 6] = [
    (ProcessorBrand::Google, "Upd_Processor_Google"),
    (ProcessorBrand::Huawei, "Upd_Processor_Huawei"),
    (ProcessorBrand::Ios, "Upd_Processor_IOS"),
    (ProcessorBrand::Mediatek, "Upd_Processor_Mediatek"),
    (ProcessorBrand::Other, "Upd_Processor_Other"),
    (ProcessorBrand::Snapdragon, "Upd_Processor_Snapdragon"),
];

/// Indicator column for a brand; `None` for the baseline.
pub fn indicator_column(brand: ProcessorBrand) -> Option<&'static str> {
    PROCESSOR_INDICATORS
        .iter()
        .find(|(b, _)| *b == brand)
        .map(|(_, column)| *column)
}

/// Ordered list of feature names the models expect
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ColumnOrder(Vec<String>);

impl ColumnOrder {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    /// Column order produced by the training pipeline
    pub fn training_default() -> Self {
        Self::new(
            NUMERIC_COLUMNS
                .iter()
                .copied()
                .chain(PROCESSOR_INDICATORS.iter().map(|(_, column)| *column)),
        )
    }

    pub fn names(&self) -> &[String] {
        &self.0
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.0.iter().any(|c| c == name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// One encoded input row, ordered by column
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureRecord {
    entries: Vec<(String, f64)>,
}

impl FeatureRecord {
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(name, _)| name.as_str())
    }

    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|(_, value)| *value).collect()
    }

    /// Values as `f32`, for tensor backed models
    pub fn values_f32(&self) -> Vec<f32> {
        self.entries.iter().map(|(_, value)| *value as f32).collect()
    }

    pub fn get(&self, name: &str) -> Option<f64> {
        self.entries
            .iter()
            .find(|(column, _)| column == name)
            .map(|(_, value)| *value)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.entries.iter().map(|(name, value)| (name.as_str(), *value))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Serialize for FeatureRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (name, value) in &self.entries {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

/// Two-column table of the encoded record
impl fmt::Display for FeatureRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let width = self
            .entries
            .iter()
            .map(|(name, _)| name.len())
            .max()
            .unwrap_or(0)
            .max("column".len());

        writeln!(f, "{:<width$} | value", "column", width = width)?;
        writeln!(f, "{}-+-{}", "-".repeat(width), "-".repeat(10))?;
        for (name, value) in &self.entries {
            writeln!(f, "{:<width$} | {}", name, value, width = width)?;
        }
        Ok(())
    }
}

/// Builds feature records from phone specs.
pub struct FeatureBuilder;

impl FeatureBuilder {
    pub fn new() -> Self {
        Self
    }

    /// Build a record laid out exactly as `columns`.
    ///
    /// A column that the encoding does not produce is a
    /// [`PredictorError::SchemaMismatch`]; it is never filled with a default.
    /// An unrecognized processor brand encodes like the baseline.
    pub fn build(&self, specs: &PhoneSpecs, columns: &ColumnOrder) -> Result<FeatureRecord> {
        let encoded = self.encode(specs);

        for name in encoded.keys() {
            if !columns.contains(name) {
                debug!(column = %name, "Encoded column not in column order, dropping");
            }
        }

        let entries = columns
            .iter()
            .map(|column| {
                encoded
                    .get(column)
                    .map(|value| (column.to_string(), *value))
                    .ok_or_else(|| PredictorError::SchemaMismatch {
                        column: column.to_string(),
                    })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(FeatureRecord { entries })
    }

    /// Encode specs into column values, unordered
    fn encode(&self, specs: &PhoneSpecs) -> HashMap<&'static str, f64> {
        let mut values = HashMap::with_capacity(NUMERIC_COLUMNS.len() + PROCESSOR_INDICATORS.len());

        let numeric = [
            specs.ram,
            specs.rom,
            specs.battery,
            specs.rear_cam_size,
            specs.rear_cam_count,
            specs.front_cam_size,
            specs.front_cam_count,
        ];
        for (column, value) in NUMERIC_COLUMNS.iter().zip(numeric) {
            values.insert(*column, f64::from(value));
        }

        for (_, column) in &PROCESSOR_INDICATORS {
            values.insert(*column, 0.0);
        }

        match specs.processor_brand() {
            Some(brand) => {
                if let Some(column) = indicator_column(brand) {
                    values.insert(column, 1.0);
                }
            }
            None => {
                warn!(
                    processor = %specs.processor,
                    "Unrecognized processor brand, encoding as baseline"
                );
            }
        }

        values
    }

    /// Number of columns the encoding produces
    pub fn feature_count(&self) -> usize {
        NUMERIC_COLUMNS.len() + PROCESSOR_INDICATORS.len()
    }
}

impl Default for FeatureBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specs_with(processor: &str) -> PhoneSpecs {
        PhoneSpecs {
            processor: processor.to_string(),
            ..PhoneSpecs::default()
        }
    }

    fn indicators(record: &FeatureRecord) -> Vec<(&'static str, f64)> {
        PROCESSOR_INDICATORS
            .iter()
            .map(|(_, column)| (*column, record.get(column).unwrap()))
            .collect()
    }

    #[test]
    fn test_record_follows_column_order() {
        let columns = ColumnOrder::new([
            "Upd_Processor_Snapdragon",
            "RAM",
            "Total Cam Dpn",
            "Upd_Processor_Google",
            "ROM",
            "Battery",
            "Size Cam Blkg",
            "Upd_Processor_IOS",
            "Total Cam Blkg",
            "Size Cam Dpn",
            "Upd_Processor_Other",
            "Upd_Processor_Huawei",
            "Upd_Processor_Mediatek",
        ]);

        let record = FeatureBuilder::new()
            .build(&PhoneSpecs::default(), &columns)
            .unwrap();

        assert_eq!(record.columns().collect::<Vec<_>>(), columns.names());
        assert_eq!(record.values()[0], 1.0);
        assert_eq!(record.values()[1], 4.0);
    }

    #[test]
    fn test_reference_phone_encoding() {
        let specs = PhoneSpecs {
            ram: 4,
            rom: 128,
            battery: 5000,
            rear_cam_size: 50,
            rear_cam_count: 3,
            front_cam_size: 12,
            front_cam_count: 1,
            processor: "Snapdragon".to_string(),
        };

        let record = FeatureBuilder::new()
            .build(&specs, &ColumnOrder::training_default())
            .unwrap();

        assert_eq!(
            record.values(),
            vec![4.0, 128.0, 5000.0, 50.0, 3.0, 12.0, 1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 1.0]
        );
        assert_eq!(record.get("Upd_Processor_Snapdragon"), Some(1.0));
    }

    #[test]
    fn test_baseline_brand_has_no_indicator() {
        let record = FeatureBuilder::new()
            .build(&specs_with("Exynos"), &ColumnOrder::training_default())
            .unwrap();

        assert!(indicators(&record).iter().all(|(_, v)| *v == 0.0));
        assert_eq!(record.get("Upd_Processor_Exynos"), None);
    }

    #[test]
    fn test_each_brand_sets_exactly_one_indicator() {
        let builder = FeatureBuilder::new();
        let columns = ColumnOrder::training_default();

        for (brand, expected_column) in &PROCESSOR_INDICATORS {
            let record = builder.build(&specs_with(brand.as_str()), &columns).unwrap();
            let set: Vec<_> = indicators(&record)
                .into_iter()
                .filter(|(_, v)| *v == 1.0)
                .map(|(c, _)| c)
                .collect();

            assert_eq!(set, vec![*expected_column], "brand {}", brand);
            assert_eq!(
                indicators(&record).iter().filter(|(_, v)| *v == 0.0).count(),
                5
            );
        }
    }

    #[test]
    fn test_unrecognized_brand_falls_back_to_baseline() {
        let builder = FeatureBuilder::new();
        let columns = ColumnOrder::training_default();

        let unknown = builder.build(&specs_with("Tensor"), &columns).unwrap();
        let baseline = builder.build(&specs_with("Exynos"), &columns).unwrap();

        assert_eq!(unknown, baseline);
        let lowercase = builder.build(&specs_with("ios"), &columns).unwrap();
        assert_eq!(lowercase.get("Upd_Processor_IOS"), Some(0.0));
    }

    #[test]
    fn test_unknown_column_is_schema_mismatch() {
        let mut names = ColumnOrder::training_default().names().to_vec();
        names.push("Upd_Processor_Exynos".to_string());

        let err = FeatureBuilder::new()
            .build(&PhoneSpecs::default(), &ColumnOrder::new(names))
            .unwrap_err();

        assert_eq!(
            err,
            PredictorError::SchemaMismatch {
                column: "Upd_Processor_Exynos".to_string()
            }
        );
    }

    #[test]
    fn test_columns_outside_order_are_dropped() {
        let columns = ColumnOrder::new(["RAM", "ROM"]);
        let record = FeatureBuilder::new()
            .build(&PhoneSpecs::default(), &columns)
            .unwrap();

        assert_eq!(record.len(), 2);
        assert_eq!(record.values(), vec![4.0, 128.0]);
    }

    #[test]
    fn test_feature_count() {
        let builder = FeatureBuilder::new();
        assert_eq!(builder.feature_count(), 13);
        assert_eq!(ColumnOrder::training_default().len(), 13);
    }

    #[test]
    fn test_record_serializes_in_order() {
        let record = FeatureBuilder::new()
            .build(&PhoneSpecs::default(), &ColumnOrder::new(["ROM", "RAM"]))
            .unwrap();

        assert_eq!(
            serde_json::to_string(&record).unwrap(),
            r#"{"ROM":128.0,"RAM":4.0}"#
        );
    }

    #[test]
    fn test_record_table() {
        let record = FeatureBuilder::new()
            .build(&PhoneSpecs::default(), &ColumnOrder::new(["RAM", "Battery"]))
            .unwrap();

        let table = record.to_string();
        let lines: Vec<_> = table.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "column  | value");
        assert_eq!(lines[2], "RAM     | 4");
        assert_eq!(lines[3], "Battery | 5000");
    }
}
