use lazy_static::lazy_static;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::error::ConversionError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ComputingType {
    LoadFlow,
    SecurityAnalysis,
    SensitivityAnalysis,
    NonEvacuatedEnergyAnalysis,
    ShortCircuit,
    ShortCircuitOneBus,
    DynamicSimulation,
    VoltageInitialization,
    StateEstimation,
}

impl ComputingType {
    pub const ALL: [ComputingType; 9] = [
        ComputingType::LoadFlow,
        ComputingType::SecurityAnalysis,
        ComputingType::SensitivityAnalysis,
        ComputingType::NonEvacuatedEnergyAnalysis,
        ComputingType::ShortCircuit,
        ComputingType::ShortCircuitOneBus,
        ComputingType::DynamicSimulation,
        ComputingType::VoltageInitialization,
        ComputingType::StateEstimation,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComputingType::LoadFlow => "LOAD_FLOW",
            ComputingType::SecurityAnalysis => "SECURITY_ANALYSIS",
            ComputingType::SensitivityAnalysis => "SENSITIVITY_ANALYSIS",
            ComputingType::NonEvacuatedEnergyAnalysis => "NON_EVACUATED_ENERGY_ANALYSIS",
            ComputingType::ShortCircuit => "SHORT_CIRCUIT",
            ComputingType::ShortCircuitOneBus => "SHORT_CIRCUIT_ONE_BUS",
            ComputingType::DynamicSimulation => "DYNAMIC_SIMULATION",
            ComputingType::VoltageInitialization => "VOLTAGE_INITIALIZATION",
            ComputingType::StateEstimation => "STATE_ESTIMATION",
        }
    }

    /// Prefix the backend uses in the `updateType` header for this computation.
    pub fn notification_base(&self) -> &'static str {
        match self {
            ComputingType::LoadFlow => "loadflow",
            ComputingType::SecurityAnalysis => "securityAnalysis",
            ComputingType::SensitivityAnalysis => "sensitivityAnalysis",
            ComputingType::NonEvacuatedEnergyAnalysis => "nonEvacuatedEnergy",
            ComputingType::ShortCircuit => "shortCircuitAnalysis",
            ComputingType::ShortCircuitOneBus => "oneBusShortCircuitAnalysis",
            ComputingType::DynamicSimulation => "dynamicSimulation",
            ComputingType::VoltageInitialization => "voltageInit",
            ComputingType::StateEstimation => "stateEstimation",
        }
    }

    pub fn status_tags(&self) -> &'static StatusTags {
        // The table is built from ALL, so every variant is present.
        &STATUS_TAGS[self]
    }

    pub fn invalidation_tags(&self) -> &'static HashSet<String> {
        &self.status_tags().invalidations
    }

    pub fn completion_tags(&self) -> &'static HashSet<String> {
        &self.status_tags().completions
    }
}

impl fmt::Display for ComputingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for ComputingType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ComputingType::ALL
            .into_iter()
            .find(|computing_type| computing_type.as_str() == s)
            .ok_or_else(|| ConversionError::UnknownComputingType(s.to_string()))
    }
}

/// Notification types relevant to one computing type.
#[derive(Debug, Clone)]
pub struct StatusTags {
    /// `updateType` values meaning "status changed, refetch".
    pub invalidations: HashSet<String>,

    /// `updateType` values meaning "the computation just finished".
    pub completions: HashSet<String>,
}

impl StatusTags {
    fn for_base(base: &str) -> Self {
        let failed = format!("{}_failed", base);
        Self {
            invalidations: HashSet::from([format!("{}_status", base), failed.clone()]),
            completions: HashSet::from([format!("{}Result", base), failed]),
        }
    }
}

lazy_static! {
    static ref STATUS_TAGS: HashMap<ComputingType, StatusTags> =
        ComputingType::ALL.into_iter().map(|computing_type| (computing_type, StatusTags::for_base(computing_type.notification_base()))).collect();
}
