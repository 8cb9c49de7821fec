use futures::FutureExt;
use futures::future::BoxFuture;
use reqwest::{StatusCode, Url};
use std::fmt;
use std::time::Duration;

use crate::domain::computing_status::computing_type::ComputingType;
use crate::domain::computing_status::notification::ObservationKey;
use crate::domain::computing_status::running_status::RawStatus;
use crate::error::{FetchError, Result};

/// Source of the raw status of one computing type.
///
/// `fetch_status` is called synchronously when a fetch epoch opens; the
/// returned future is then driven on a spawned task. Implementations should
/// capture what they need from `key` before returning.
pub trait StatusFetcher: fmt::Debug + Send + Sync {
    fn fetch_status(&self, key: &ObservationKey) -> BoxFuture<'static, std::result::Result<RawStatus, FetchError>>;
}

/// Study server status endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEndpoint {
    LoadFlow,
    SecurityAnalysis,
    SensitivityAnalysis,
    NonEvacuatedEnergy,
    ShortCircuitAllBuses,
    ShortCircuitOneBus,
    DynamicSimulation,
    VoltageInit,
    StateEstimation,
}

impl StatusEndpoint {
    pub fn for_type(computing_type: ComputingType) -> Self {
        match computing_type {
            ComputingType::LoadFlow => Self::LoadFlow,
            ComputingType::SecurityAnalysis => Self::SecurityAnalysis,
            ComputingType::SensitivityAnalysis => Self::SensitivityAnalysis,
            ComputingType::NonEvacuatedEnergyAnalysis => Self::NonEvacuatedEnergy,
            ComputingType::ShortCircuit => Self::ShortCircuitAllBuses,
            ComputingType::ShortCircuitOneBus => Self::ShortCircuitOneBus,
            ComputingType::DynamicSimulation => Self::DynamicSimulation,
            ComputingType::VoltageInitialization => Self::VoltageInit,
            ComputingType::StateEstimation => Self::StateEstimation,
        }
    }

    pub fn path(&self) -> &'static str {
        match self {
            Self::LoadFlow => "loadflow",
            Self::SecurityAnalysis => "security-analysis",
            Self::SensitivityAnalysis => "sensitivity-analysis",
            Self::NonEvacuatedEnergy => "non-evacuated-energy",
            Self::ShortCircuitAllBuses | Self::ShortCircuitOneBus => "shortcircuit",
            Self::DynamicSimulation => "dynamic-simulation",
            Self::VoltageInit => "voltage-init",
            Self::StateEstimation => "state-estimation",
        }
    }

    pub fn query(&self) -> Option<(&'static str, &'static str)> {
        match self {
            Self::ShortCircuitAllBuses => Some(("type", "ALL_BUSES")),
            Self::ShortCircuitOneBus => Some(("type", "ONE_BUS")),
            _ => None,
        }
    }

    pub fn url(&self, base_url: &str, key: &ObservationKey) -> std::result::Result<Url, FetchError> {
        let raw = format!("{}/v1/studies/{}/nodes/{}/{}/status", base_url.trim_end_matches('/'), key.study_id, key.node_id, self.path());
        let mut url = Url::parse(&raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;
        if let Some((name, value)) = self.query() {
            url.query_pairs_mut().append_pair(name, value);
        }
        Ok(url)
    }
}

/// Fetches a status from the study server REST API.
#[derive(Debug, Clone)]
pub struct HttpStatusFetcher {
    client: reqwest::Client,
    base_url: String,
    endpoint: StatusEndpoint,
}

impl HttpStatusFetcher {
    pub fn new(client: reqwest::Client, base_url: impl Into<String>, computing_type: ComputingType) -> Self {
        Self { client, base_url: base_url.into(), endpoint: StatusEndpoint::for_type(computing_type) }
    }

    /// Client shared by all fetchers of a session.
    pub fn build_client(request_timeout: Duration) -> Result<reqwest::Client> {
        Ok(reqwest::Client::builder().timeout(request_timeout).build()?)
    }
}

impl StatusFetcher for HttpStatusFetcher {
    fn fetch_status(&self, key: &ObservationKey) -> BoxFuture<'static, std::result::Result<RawStatus, FetchError>> {
        let client = self.client.clone();
        let url = self.endpoint.url(&self.base_url, key);

        async move {
            let url = url?;
            log::debug!("Fetching status from {}", url);

            let response = client.get(url).send().await?;
            let status = response.status();

            if status == StatusCode::NO_CONTENT {
                return Ok(None);
            }

            let body = response.text().await?;
            if !status.is_success() {
                return Err(FetchError::HttpStatus { status: status.as_u16(), body });
            }

            Ok(Some(body).filter(|body| !body.trim().is_empty()))
        }
        .boxed()
    }
}
