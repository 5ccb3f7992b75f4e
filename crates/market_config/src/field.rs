//! Field classes and the static field table.

use serde::{Deserialize, Serialize};

/// Name of the start date field.
pub const START_DATE: &str = "start_date";
/// Name of the end date field.
pub const END_DATE: &str = "end_date";
/// Name of the GPU field.
pub const GPU: &str = "gpu";
/// Name of the region field.
pub const REGION: &str = "region";

/// Numeric domain and default of a quantified field.
///
/// `min`, `max` and `step` are advisory: presentation layers use them for
/// widgets, the reconciler never enforces them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub key: &'static str,
    pub label: &'static str,
    pub min: i64,
    pub max: i64,
    pub step: i64,
    pub default: i64,
}

impl FieldSpec {
    /// Clamp into `[min, max]` and snap down onto the step grid from `min`.
    pub fn clamp(&self, value: i64) -> i64 {
        let clamped = value.clamp(self.min, self.max);
        if self.step <= 1 {
            return clamped;
        }
        self.min + (clamped - self.min) / self.step * self.step
    }
}

/// Fields with a numeric domain that can be removed and restored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuantifiedField {
    Compute,
    Memory,
    Storage,
    Budget,
}

impl QuantifiedField {
    pub const ALL: [QuantifiedField; 4] = [
        QuantifiedField::Compute,
        QuantifiedField::Memory,
        QuantifiedField::Storage,
        QuantifiedField::Budget,
    ];

    pub fn spec(&self) -> FieldSpec {
        match self {
            QuantifiedField::Compute => FieldSpec {
                key: "compute",
                label: "vCPUs",
                min: 1,
                max: 128,
                step: 1,
                default: 4,
            },
            QuantifiedField::Memory => FieldSpec {
                key: "memory",
                label: "Memory (GB)",
                min: 1,
                max: 1024,
                step: 1,
                default: 16,
            },
            QuantifiedField::Storage => FieldSpec {
                key: "storage",
                label: "Storage (GB)",
                min: 1,
                max: 20000,
                step: 10,
                default: 100,
            },
            QuantifiedField::Budget => FieldSpec {
                key: "budget",
                label: "Budget (USD)",
                min: 0,
                max: 100000,
                step: 100,
                default: 1000,
            },
        }
    }

    pub fn as_str(&self) -> &'static str {
        self.spec().key
    }

    pub fn default_value(&self) -> i64 {
        self.spec().default
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|field| field.as_str() == name)
    }
}

impl std::fmt::Display for QuantifiedField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The class a field name belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldClass {
    Quantified(QuantifiedField),
    Temporal,
    FreeForm,
}

impl FieldClass {
    pub fn of(name: &str) -> Self {
        if let Some(field) = QuantifiedField::from_name(name) {
            FieldClass::Quantified(field)
        } else if name == START_DATE || name == END_DATE {
            FieldClass::Temporal
        } else {
            FieldClass::FreeForm
        }
    }
}

/// GPU models the price catalog is queried for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GpuModel {
    #[serde(rename = "NVIDIA T4")]
    NvidiaT4,
    #[serde(rename = "NVIDIA A100")]
    NvidiaA100,
    #[serde(rename = "NVIDIA V100")]
    NvidiaV100,
}

impl GpuModel {
    pub fn all() -> Vec<Self> {
        vec![GpuModel::NvidiaA100, GpuModel::NvidiaT4, GpuModel::NvidiaV100]
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            GpuModel::NvidiaT4 => "NVIDIA T4",
            GpuModel::NvidiaA100 => "NVIDIA A100",
            GpuModel::NvidiaV100 => "NVIDIA V100",
        }
    }

    /// Parse a display name. `"None"`, empty and unknown names give `None`.
    pub fn from_name(name: &str) -> Option<Self> {
        let name = name.trim();
        Self::all()
            .into_iter()
            .find(|gpu| gpu.display_name().eq_ignore_ascii_case(name))
    }
}

impl std::fmt::Display for GpuModel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}
