mod auth;
pub mod spreadsheet;

use std::path::Path;

use async_trait::async_trait;
use reqwest::{Response, StatusCode};
use spreadsheet::update::{BatchUpdate, Request};
use spreadsheet::{
    InsertDataOption, SheetProperties, SheetType, Spreadsheet, ValueInputOption, ValueRange,
};
use thiserror::Error;
use tracing::{debug, info, trace};
use url::Url;

pub use auth::{read_service_account_key, ServiceAccountTokens, TokenSource, SCOPES};

const ENDPOINT_SPREADSHEETS: &str = "https://sheets.googleapis.com/v4/spreadsheets";

/// One row of cell values, in column order.
pub type Row = Vec<serde_json::Value>;

#[derive(Error, Debug)]
pub enum SheetsError {
    #[error("invalid service account credentials: {0}")]
    Credentials(String),
    #[error("failed to obtain an access token: {0}")]
    Auth(#[from] yup_oauth2::Error),
    #[error("no access token was returned for the requested scopes")]
    MissingToken,
    #[error(
        "failed to find spreadsheet {0}; check the ID and that it is shared with the service \
         account"
    )]
    SpreadsheetNotFound(String),
    #[error("request to {action} was unauthorized with status code: {status}")]
    Unauthorized { action: &'static str, status: StatusCode },
    #[error("request to {action} failed with status code {status}: {body}")]
    Status { action: &'static str, status: StatusCode, body: String },
    #[error("request to Google Sheets failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("invalid Google Sheets URL: {0}")]
    InvalidUrl(String),
}

/// The spreadsheet operations needed to upload a report.
#[async_trait]
pub trait SheetsApi: Send + Sync {
    /// Titles of all sheets currently in the spreadsheet.
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError>;

    /// Adds a grid sheet with the given title.
    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), SheetsError>;

    /// Appends rows after the last row of the table found at `range`.
    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Row>,
    ) -> Result<(), SheetsError>;
}

/// The A1 range that appends into the sheet named `sheet_name`.
pub fn append_range(sheet_name: &str) -> String {
    format!("{sheet_name}!A1")
}

/// Creates the sheet named `sheet_name` with `header` as its first row, unless
/// a sheet with that title already exists. Returns whether the sheet was
/// created.
pub async fn ensure_sheet<S: SheetsApi + ?Sized>(
    sheets: &S,
    spreadsheet_id: &str,
    sheet_name: &str,
    header: &[&str],
) -> Result<bool, SheetsError> {
    let titles = sheets.sheet_titles(spreadsheet_id).await?;
    if titles.iter().any(|title| title == sheet_name) {
        trace!("sheet {} already exists", sheet_name);
        return Ok(false);
    }

    info!("creating {} sheet in spreadsheet", sheet_name);
    sheets.add_sheet(spreadsheet_id, sheet_name).await?;
    let header_row: Row = header.iter().map(|&cell| serde_json::Value::from(cell)).collect();
    sheets.append_rows(spreadsheet_id, &append_range(sheet_name), vec![header_row]).await?;
    Ok(true)
}

/// Talks to the Google Sheets REST API as a service account.
pub struct GoogleSheetsClient {
    http: reqwest::Client,
    tokens: Box<dyn TokenSource>,
    endpoint: String,
}

impl GoogleSheetsClient {
    /// Authenticates with the service account described by
    /// `credentials_file`.
    pub async fn new(http: reqwest::Client, credentials_file: &Path) -> Result<Self, SheetsError> {
        let tokens = ServiceAccountTokens::from_credentials_file(credentials_file).await?;
        Ok(Self::with_token_source(http, Box::new(tokens)))
    }

    pub fn with_token_source(http: reqwest::Client, tokens: Box<dyn TokenSource>) -> Self {
        Self { http, tokens, endpoint: ENDPOINT_SPREADSHEETS.to_owned() }
    }

    /// Override the spreadsheets endpoint (useful for tests or proxies).
    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    async fn access_token(&self) -> Result<String, SheetsError> {
        self.tokens.access_token().await
    }

    /// Fetches the spreadsheet's metadata. Google answers 404 for an unknown
    /// ID and 403 for a spreadsheet not shared with the service account; both
    /// are [`SheetsError::SpreadsheetNotFound`].
    pub async fn get_spreadsheet(&self, spreadsheet_id: &str) -> Result<Spreadsheet, SheetsError> {
        let mut url = resource_url(&self.endpoint, &[spreadsheet_id])?;
        url.query_pairs_mut()
            .append_pair("fields", "spreadsheetId,spreadsheetUrl,sheets.properties");
        let response = self.http.get(url).bearer_auth(self.access_token().await?).send().await?;
        if matches!(response.status(), StatusCode::NOT_FOUND | StatusCode::FORBIDDEN) {
            return Err(SheetsError::SpreadsheetNotFound(spreadsheet_id.to_owned()));
        }
        let response = check_status(response, "get spreadsheet").await?;
        Ok(response.json().await?)
    }

    /// Fails with [`SheetsError::SpreadsheetNotFound`] if the spreadsheet
    /// does not exist or is not shared with the service account.
    pub async fn verify_spreadsheet(&self, spreadsheet_id: &str) -> Result<(), SheetsError> {
        let spreadsheet = self.get_spreadsheet(spreadsheet_id).await?;
        debug!(
            "found spreadsheet {}",
            spreadsheet.spreadsheet_url.as_deref().unwrap_or(spreadsheet_id)
        );
        Ok(())
    }
}

#[async_trait]
impl SheetsApi for GoogleSheetsClient {
    async fn sheet_titles(&self, spreadsheet_id: &str) -> Result<Vec<String>, SheetsError> {
        Ok(self.get_spreadsheet(spreadsheet_id).await?.sheet_titles())
    }

    async fn add_sheet(&self, spreadsheet_id: &str, title: &str) -> Result<(), SheetsError> {
        let url = resource_url(&self.endpoint, &[&format!("{spreadsheet_id}:batchUpdate")])?;
        let body = BatchUpdate {
            requests: vec![Request::AddSheet {
                properties: SheetProperties {
                    title: Some(title.to_owned()),
                    sheet_type: Some(SheetType::Grid),
                    ..Default::default()
                },
            }],
        };
        trace!("sending request to add sheet {}", title);
        let response =
            self.http.post(url).bearer_auth(self.access_token().await?).json(&body).send().await?;
        check_status(response, "add sheet").await?;
        Ok(())
    }

    async fn append_rows(
        &self,
        spreadsheet_id: &str,
        range: &str,
        rows: Vec<Row>,
    ) -> Result<(), SheetsError> {
        let mut url =
            resource_url(&self.endpoint, &[spreadsheet_id, "values", &format!("{range}:append")])?;
        url.query_pairs_mut()
            .append_pair("valueInputOption", ValueInputOption::UserEntered.as_str())
            .append_pair("insertDataOption", InsertDataOption::InsertRows.as_str());
        trace!("appending {} rows to {}", rows.len(), range);
        let body = ValueRange { range: Some(range.to_owned()), values: rows };
        let response =
            self.http.post(url).bearer_auth(self.access_token().await?).json(&body).send().await?;
        check_status(response, "append values").await?;
        Ok(())
    }
}

fn resource_url(endpoint: &str, segments: &[&str]) -> Result<Url, SheetsError> {
    let mut url = Url::parse(endpoint).map_err(|_| SheetsError::InvalidUrl(endpoint.to_owned()))?;
    url.path_segments_mut()
        .map_err(|_| SheetsError::InvalidUrl(endpoint.to_owned()))?
        .pop_if_empty()
        .extend(segments);
    Ok(url)
}

async fn check_status(response: Response, action: &'static str) -> Result<Response, SheetsError> {
    let status = response.status();
    match status {
        status if status.is_success() => Ok(response),
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
            Err(SheetsError::Unauthorized { action, status })
        }
        status => {
            let body = response.text().await.unwrap_or_default();
            Err(SheetsError::Status { action, status, body })
        }
    }
}
