use serde::{Deserialize, Serialize};
use std::fmt;

use crate::domain::computing_status::computing_type::ComputingType;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunningStatus {
    Idle,
    Running,
    Succeed,
    Failed,
}

impl RunningStatus {
    /// `Succeed` and `Failed` end a computation.
    pub fn is_terminal(&self) -> bool {
        matches!(self, RunningStatus::Succeed | RunningStatus::Failed)
    }
}

impl fmt::Display for RunningStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            RunningStatus::Idle => "IDLE",
            RunningStatus::Running => "RUNNING",
            RunningStatus::Succeed => "SUCCEED",
            RunningStatus::Failed => "FAILED",
        };
        f.pad(name)
    }
}

/// Status as returned by the study server, before conversion. `None` means
/// the server has no status for the node (HTTP 204 or empty body).
pub type RawStatus = Option<String>;

/// Maps a raw backend status onto a [`RunningStatus`].
pub type StatusConverter = fn(Option<&str>) -> RunningStatus;

/// The study server returns plain text, sometimes as a JSON string literal.
fn normalize(raw: Option<&str>) -> Option<&str> {
    raw.map(|s| s.trim().trim_matches('"')).filter(|s| !s.is_empty())
}

/// Load flow and security analysis report convergence.
pub fn convergence_status(raw: Option<&str>) -> RunningStatus {
    match normalize(raw) {
        Some("CONVERGED") => RunningStatus::Succeed,
        Some("DIVERGED") | Some("FAILED") => RunningStatus::Failed,
        Some("RUNNING") => RunningStatus::Running,
        _ => RunningStatus::Idle,
    }
}

pub fn voltage_init_status(raw: Option<&str>) -> RunningStatus {
    match normalize(raw) {
        Some("OK") => RunningStatus::Succeed,
        Some("NOT_OK") | Some("FAILED") => RunningStatus::Failed,
        Some("RUNNING") => RunningStatus::Running,
        _ => RunningStatus::Idle,
    }
}

pub fn outcome_status(raw: Option<&str>) -> RunningStatus {
    match normalize(raw) {
        Some("SUCCEED") => RunningStatus::Succeed,
        Some("FAILED") => RunningStatus::Failed,
        Some("RUNNING") => RunningStatus::Running,
        _ => RunningStatus::Idle,
    }
}

/// Converter the study server's status vocabulary calls for, per computing type.
pub fn default_converter(computing_type: ComputingType) -> StatusConverter {
    match computing_type {
        ComputingType::LoadFlow | ComputingType::SecurityAnalysis => convergence_status,
        ComputingType::VoltageInitialization => voltage_init_status,
        ComputingType::SensitivityAnalysis
        | ComputingType::NonEvacuatedEnergyAnalysis
        | ComputingType::ShortCircuit
        | ComputingType::ShortCircuitOneBus
        | ComputingType::DynamicSimulation
        | ComputingType::StateEstimation => outcome_status,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states() {
        assert!(RunningStatus::Succeed.is_terminal());
        assert!(RunningStatus::Failed.is_terminal());
        assert!(!RunningStatus::Running.is_terminal());
        assert!(!RunningStatus::Idle.is_terminal());
    }

    #[test]
    fn test_convergence_status() {
        assert_eq!(convergence_status(Some("CONVERGED")), RunningStatus::Succeed);
        assert_eq!(convergence_status(Some("DIVERGED")), RunningStatus::Failed);
        assert_eq!(convergence_status(Some("RUNNING")), RunningStatus::Running);
        assert_eq!(convergence_status(Some("NOT_DONE")), RunningStatus::Idle);
        assert_eq!(convergence_status(None), RunningStatus::Idle);
    }

    #[test]
    fn test_quoted_and_padded_values() {
        assert_eq!(outcome_status(Some("\"SUCCEED\"")), RunningStatus::Succeed);
        assert_eq!(voltage_init_status(Some(" NOT_OK\n")), RunningStatus::Failed);
        assert_eq!(outcome_status(Some("  ")), RunningStatus::Idle);
    }

    #[test]
    fn test_default_converter_per_type() {
        assert_eq!(default_converter(ComputingType::LoadFlow)(Some("CONVERGED")), RunningStatus::Succeed);
        assert_eq!(default_converter(ComputingType::VoltageInitialization)(Some("OK")), RunningStatus::Succeed);
        assert_eq!(default_converter(ComputingType::DynamicSimulation)(Some("CONVERGED")), RunningStatus::Idle);
        assert_eq!(default_converter(ComputingType::ShortCircuitOneBus)(Some("FAILED")), RunningStatus::Failed);
    }
}
