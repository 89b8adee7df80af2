use std::path::Path;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, trace};
use yup_oauth2::authenticator::DefaultAuthenticator;
use yup_oauth2::{ServiceAccountAuthenticator, ServiceAccountKey};

use super::SheetsError;

const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

pub const SCOPES: &[&str] = &[
    "https://www.googleapis.com/auth/drive",
    "https://www.googleapis.com/auth/drive.file",
    "https://www.googleapis.com/auth/spreadsheets",
];

/// The parts of a service-account credentials file that are used.
#[derive(Deserialize)]
struct CredentialsFile {
    client_email: String,
    client_id: Option<String>,
    private_key: String,
    private_key_id: Option<String>,
    project_id: Option<String>,
    token_uri: Option<String>,
}

/// Reads a service-account credentials file. Keys exported through
/// environment tooling often carry literal `\n` sequences instead of line
/// breaks; those are restored.
pub async fn read_service_account_key(path: &Path) -> Result<ServiceAccountKey, SheetsError> {
    trace!("reading service account credentials from {}", path.display());
    let contents = tokio::fs::read_to_string(path)
        .await
        .map_err(|e| SheetsError::Credentials(format!("{}: {}", path.display(), e)))?;
    parse_service_account_key(&contents)
        .map_err(|e| SheetsError::Credentials(format!("{}: {}", path.display(), e)))
}

fn parse_service_account_key(contents: &str) -> serde_json::Result<ServiceAccountKey> {
    let file: CredentialsFile = serde_json::from_str(contents)?;
    serde_json::from_value(json!({
        "type": "service_account",
        "client_email": file.client_email,
        "client_id": file.client_id,
        "private_key": file.private_key.replace("\\n", "\n"),
        "private_key_id": file.private_key_id,
        "project_id": file.project_id,
        "token_uri": file.token_uri.as_deref().unwrap_or(DEFAULT_TOKEN_URI),
    }))
}

/// Supplies bearer tokens for requests to the Sheets API.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn access_token(&self) -> Result<String, SheetsError>;
}

/// Tokens minted for a service account, refreshed by yup-oauth2 as they
/// expire.
pub struct ServiceAccountTokens {
    auth: DefaultAuthenticator,
}

impl ServiceAccountTokens {
    pub async fn from_credentials_file(credentials_file: &Path) -> Result<Self, SheetsError> {
        let key = read_service_account_key(credentials_file).await?;
        debug!("authenticating to Google as {}", key.client_email);
        let auth = ServiceAccountAuthenticator::builder(key)
            .build()
            .await
            .map_err(|e| SheetsError::Credentials(e.to_string()))?;
        Ok(Self { auth })
    }
}

#[async_trait]
impl TokenSource for ServiceAccountTokens {
    async fn access_token(&self) -> Result<String, SheetsError> {
        let token = self.auth.token(SCOPES).await?;
        token.token().map(str::to_owned).ok_or(SheetsError::MissingToken)
    }
}
