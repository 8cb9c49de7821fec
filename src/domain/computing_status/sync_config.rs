use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;
use std::time::Duration;

use crate::api::sync_config_dto::SyncConfigDto;
use crate::domain::computing_status::computing_type::ComputingType;
use crate::error::{ConversionError, Error, Result};
use crate::loader::parser::parse_json_file;

pub const DEFAULT_REQUEST_TIMEOUT_MS: u64 = 10_000;

/// Whether the backend service behind a computing type can be queried.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceAvailability {
    Up,
    Down,
    Pending,
}

impl FromStr for ServiceAvailability {
    type Err = ConversionError;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s {
            "UP" => Ok(ServiceAvailability::Up),
            "DOWN" => Ok(ServiceAvailability::Down),
            "PENDING" => Ok(ServiceAvailability::Pending),
            _ => Err(ConversionError::UnknownServiceAvailability(s.to_string())),
        }
    }
}

/// Validated synchronizer configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct SyncConfig {
    pub study_server_url: String,
    pub request_timeout: Duration,
    pub computations: BTreeMap<ComputingType, ServiceAvailability>,
}

impl SyncConfig {
    pub fn load(file_path: &str) -> Result<Self> {
        let dto: SyncConfigDto = parse_json_file(file_path)?;
        log::info!("Synchronizer configuration '{}' parsed.", file_path);
        SyncConfig::try_from(dto)
    }
}

impl TryFrom<SyncConfigDto> for SyncConfig {
    type Error = Error;

    fn try_from(dto: SyncConfigDto) -> Result<Self> {
        let study_server_url = dto.study_server_url.trim().trim_end_matches('/').to_string();
        if study_server_url.is_empty() {
            return Err(Error::InvalidConfig("studyServerUrl must not be empty".to_string()));
        }

        let timeout_ms = dto.request_timeout_ms.unwrap_or(DEFAULT_REQUEST_TIMEOUT_MS);
        if timeout_ms == 0 {
            return Err(Error::InvalidConfig("requestTimeoutMs must be positive".to_string()));
        }

        let mut computations = BTreeMap::new();
        for computation in dto.computations {
            let computing_type = computation.computing_type.parse::<ComputingType>()?;
            let availability = match computation.availability {
                Some(availability) => availability.parse::<ServiceAvailability>()?,
                None => ServiceAvailability::Up,
            };

            if computations.insert(computing_type, availability).is_some() {
                return Err(Error::InvalidConfig(format!("{} is configured twice", computing_type)));
            }
        }

        Ok(SyncConfig { study_server_url, request_timeout: Duration::from_millis(timeout_ms), computations })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dto(json: &str) -> SyncConfigDto {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_valid_config() {
        let config = SyncConfig::try_from(dto(r#"{
            "studyServerUrl": "http://localhost:5001/",
            "computations": [
                { "computingType": "LOAD_FLOW" },
                { "computingType": "STATE_ESTIMATION", "availability": "DOWN" }
            ]
        }"#))
        .unwrap();

        assert_eq!(config.study_server_url, "http://localhost:5001");
        assert_eq!(config.request_timeout, Duration::from_millis(DEFAULT_REQUEST_TIMEOUT_MS));
        assert_eq!(config.computations[&ComputingType::LoadFlow], ServiceAvailability::Up);
        assert_eq!(config.computations[&ComputingType::StateEstimation], ServiceAvailability::Down);
    }

    #[test]
    fn test_unknown_computing_type() {
        let result = SyncConfig::try_from(dto(r#"{
            "studyServerUrl": "http://study",
            "computations": [{ "computingType": "POWER_FLOW" }]
        }"#));
        assert!(matches!(result, Err(Error::Conversion(ConversionError::UnknownComputingType(name))) if name == "POWER_FLOW"));
    }

    #[test]
    fn test_unknown_availability() {
        let result = SyncConfig::try_from(dto(r#"{
            "studyServerUrl": "http://study",
            "computations": [{ "computingType": "LOAD_FLOW", "availability": "MAYBE" }]
        }"#));
        assert!(matches!(result, Err(Error::Conversion(ConversionError::UnknownServiceAvailability(_)))));
    }

    #[test]
    fn test_rejects_duplicates_and_empty_url() {
        let duplicate = SyncConfig::try_from(dto(r#"{
            "studyServerUrl": "http://study",
            "computations": [{ "computingType": "LOAD_FLOW" }, { "computingType": "LOAD_FLOW" }]
        }"#));
        assert!(matches!(duplicate, Err(Error::InvalidConfig(_))));

        let empty_url = SyncConfig::try_from(dto(r#"{ "studyServerUrl": "  ", "computations": [] }"#));
        assert!(matches!(empty_url, Err(Error::InvalidConfig(_))));

        let zero_timeout = SyncConfig::try_from(dto(r#"{ "studyServerUrl": "http://s", "requestTimeoutMs": 0, "computations": [] }"#));
        assert!(matches!(zero_timeout, Err(Error::InvalidConfig(_))));
    }
}
