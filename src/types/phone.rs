//! Phone hardware specifications supplied per prediction request

use serde::{Deserialize, Serialize};
use std::fmt;

/// RAM sizes (GB) present in the training data
pub const RAM_OPTIONS: [u32; 6] = [2, 3, 4, 6, 8, 12];

/// Storage sizes (GB) present in the training data
pub const ROM_OPTIONS: [u32; 6] = [16, 32, 64, 128, 256, 512];

/// Battery capacities (mAh) present in the training data
pub const BATTERY_OPTIONS: [u32; 9] = [0, 1000, 1500, 2000, 2500, 4000, 4500, 5000, 5500];

/// Processor brand as seen in training.
///
/// `Exynos` is the baseline category: it was dropped during one-hot encoding
/// and is represented by all brand indicators being zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ProcessorBrand {
    Exynos,
    Google,
    Huawei,
    #[serde(rename = "IOS")]
    Ios,
    Mediatek,
    Other,
    Snapdragon,
}

impl ProcessorBrand {
    /// All brands, baseline first
    pub const ALL: [ProcessorBrand; 7] = [
        ProcessorBrand::Exynos,
        ProcessorBrand::Google,
        ProcessorBrand::Huawei,
        ProcessorBrand::Ios,
        ProcessorBrand::Mediatek,
        ProcessorBrand::Other,
        ProcessorBrand::Snapdragon,
    ];

    /// Exact, case-sensitive match against the training labels
    pub fn parse(label: &str) -> Option<Self> {
        Self::ALL.iter().copied().find(|b| b.as_str() == label)
    }

    /// Label used in the training data
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorBrand::Exynos => "Exynos",
            ProcessorBrand::Google => "Google",
            ProcessorBrand::Huawei => "Huawei",
            ProcessorBrand::Ios => "IOS",
            ProcessorBrand::Mediatek => "Mediatek",
            ProcessorBrand::Other => "Other",
            ProcessorBrand::Snapdragon => "Snapdragon",
        }
    }

    pub fn is_baseline(&self) -> bool {
        *self == ProcessorBrand::Exynos
    }
}

impl fmt::Display for ProcessorBrand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw hardware attributes of one phone
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhoneSpecs {
    /// Memory in GB
    #[serde(alias = "RAM")]
    pub ram: u32,

    /// Storage in GB
    #[serde(alias = "ROM")]
    pub rom: u32,

    /// Battery capacity in mAh
    #[serde(alias = "Battery")]
    pub battery: u32,

    /// Main rear camera resolution in MP
    #[serde(alias = "Size Cam Blkg")]
    pub rear_cam_size: u32,

    /// Number of rear cameras
    #[serde(alias = "Total Cam Blkg")]
    pub rear_cam_count: u32,

    /// Main front camera resolution in MP (0 when absent)
    #[serde(alias = "Size Cam Dpn")]
    pub front_cam_size: u32,

    /// Number of front cameras
    #[serde(alias = "Total Cam Dpn")]
    pub front_cam_count: u32,

    /// Processor brand label; unknown labels are accepted
    #[serde(alias = "Upd_Processor")]
    pub processor: String,
}

impl PhoneSpecs {
    /// Recognized processor brand, if the label is one of the known ones
    pub fn processor_brand(&self) -> Option<ProcessorBrand> {
        ProcessorBrand::parse(&self.processor)
    }

    /// Fields whose value never occurred in the training data.
    ///
    /// Such inputs are still predicted; callers may want to warn about them.
    pub fn out_of_catalog_fields(&self) -> Vec<&'static str> {
        let mut fields = Vec::new();
        if !RAM_OPTIONS.contains(&self.ram) {
            fields.push("ram");
        }
        if !ROM_OPTIONS.contains(&self.rom) {
            fields.push("rom");
        }
        if !BATTERY_OPTIONS.contains(&self.battery) {
            fields.push("battery");
        }
        if self.processor_brand().is_none() {
            fields.push("processor");
        }
        fields
    }
}

impl Default for PhoneSpecs {
    fn default() -> Self {
        Self {
            ram: 4,
            rom: 128,
            battery: 5000,
            rear_cam_size: 50,
            rear_cam_count: 3,
            front_cam_size: 12,
            front_cam_count: 1,
            processor: ProcessorBrand::Snapdragon.to_string(),
        }
    }
}
