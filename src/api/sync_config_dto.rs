use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncConfigDto {
    pub study_server_url: String,
    pub request_timeout_ms: Option<u64>,
    pub computations: Vec<ComputationDto>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComputationDto {
    pub computing_type: String,
    pub availability: Option<String>,
}
