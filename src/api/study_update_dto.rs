use serde::Deserialize;

/// Study update message as pushed on the study notification websocket.
#[derive(Debug, Deserialize)]
pub struct StudyUpdateDto {
    pub headers: StudyUpdateHeadersDto,
    #[serde(default)]
    pub payload: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyUpdateHeadersDto {
    pub update_type: Option<String>,
    pub node: Option<String>,
    pub nodes: Option<Vec<String>>,
}
