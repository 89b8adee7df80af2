pub mod report;

use std::fmt::{self, Display};
use std::str::FromStr;

use reqwest::{Method, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, trace};
use url::Url;

#[derive(Error, Debug)]
pub enum GizmoError {
    #[error("report {0} is not in available methods: {}", ReportType::supported_names())]
    UnsupportedReport(String),
    #[error("invalid Gizmo URL \"{0}\"")]
    InvalidUrl(String),
    #[error("request to Gizmo failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("Gizmo responded with unexpected status {0}")]
    Status(StatusCode),
    #[error("malformed response from Gizmo: {0}")]
    MalformedResponse(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
pub struct GizmoConfig {
    pub username: String,
    pub password: String,
    /// Host (and optional port) of the Gizmo server, without a scheme.
    pub url: String,
}

/// A query parameter value. `Absent` values are left out of the request.
#[derive(Debug, Clone, PartialEq)]
pub enum QueryValue {
    Text(String),
    Number(f64),
    Bool(bool),
    Absent,
}

impl QueryValue {
    fn to_query_string(&self) -> Option<String> {
        match self {
            QueryValue::Text(text) => Some(text.clone()),
            QueryValue::Number(number) => Some(number.to_string()),
            QueryValue::Bool(flag) => Some(flag.to_string()),
            QueryValue::Absent => None,
        }
    }
}

/// The reports the Gizmo server knows how to produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ReportType {
    OverviewReport,
    FinancialReport,
    HostUsageReport,
    ShiftsLogReport,
}

impl ReportType {
    pub const ALL: [ReportType; 4] = [
        ReportType::OverviewReport,
        ReportType::FinancialReport,
        ReportType::HostUsageReport,
        ReportType::ShiftsLogReport,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            ReportType::OverviewReport => "OverviewReport",
            ReportType::FinancialReport => "FinancialReport",
            ReportType::HostUsageReport => "HostUsageReport",
            ReportType::ShiftsLogReport => "ShiftsLogReport",
        }
    }

    /// The path segment under `reports/` serving this report.
    pub fn resource_path(self) -> &'static str {
        match self {
            ReportType::OverviewReport => "overview",
            ReportType::FinancialReport => "financial",
            ReportType::HostUsageReport => "hostusage",
            ReportType::ShiftsLogReport => "shiftlog",
        }
    }

    fn supported_names() -> String {
        Self::ALL.map(ReportType::as_str).join(", ")
    }
}

impl Display for ReportType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReportType {
    type Err = GizmoError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|report| report.as_str() == s)
            .ok_or_else(|| GizmoError::UnsupportedReport(s.to_owned()))
    }
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: T,
}

#[derive(Debug, Clone)]
pub struct GizmoClient {
    http: reqwest::Client,
    config: GizmoConfig,
    api_base: Url,
}

impl GizmoClient {
    pub fn new(http: reqwest::Client, config: GizmoConfig) -> Result<Self, GizmoError> {
        debug!("initializing Gizmo communication service");
        let api_base = Url::parse(&format!("http://{}/api/", config.url))
            .map_err(|_| GizmoError::InvalidUrl(config.url.clone()))?;
        Ok(Self { http, config, api_base })
    }

    /// Sends a request for the resource at `path` (relative to `/api/`) and
    /// returns the `result` field of the response envelope.
    pub async fn resource<T: DeserializeOwned>(
        &self,
        path: &str,
        method: Method,
        query: &[(String, QueryValue)],
        body: Option<&serde_json::Value>,
    ) -> Result<T, GizmoError> {
        let url = self.api_base.join(path).map_err(|_| GizmoError::InvalidUrl(path.to_owned()))?;
        let query: Vec<(&str, String)> = query
            .iter()
            .filter_map(|(key, value)| value.to_query_string().map(|value| (key.as_str(), value)))
            .collect();
        debug!("gizmo resource {} -> {} {:?}", method, path, query);

        let mut request = self
            .http
            .request(method, url)
            .basic_auth(&self.config.username, Some(&self.config.password))
            .query(&query);
        if let Some(body) = body {
            trace!("request body: {}", body);
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(GizmoError::Status(status));
        }
        let bytes = response.bytes().await?;
        let Envelope { result } = serde_json::from_slice(&bytes)?;
        Ok(result)
    }

    pub async fn get_report<T: DeserializeOwned>(
        &self,
        report: ReportType,
        query: &[(String, QueryValue)],
    ) -> Result<T, GizmoError> {
        let path = format!("reports/{}", report.resource_path());
        self.resource(&path, Method::GET, query, None).await
    }
}
