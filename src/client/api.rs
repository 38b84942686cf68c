use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;

use super::models::{AuthToken, Credentials, Notebook, User, Workspace};
use super::{Backend, ClientError};
use crate::config::ApiConfig;

/// HTTP client for the notebook backend
pub struct ApiClient {
    client: Client,
    base_url: String,
}

impl ApiClient {
    pub fn new(config: &ApiConfig) -> Result<Self, ClientError> {
        // Normalize URL - ensure no trailing slash
        let base_url = config.base_url.trim_end_matches('/').to_string();

        if !base_url.starts_with("http://") && !base_url.starts_with("https://") {
            return Err(ClientError::InvalidUrl(
                "URL must start with http:// or https://".to_string(),
            ));
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Build full URL for an API path
    fn url(&self, path: &str) -> String {
        format!("{}/api/{}", self.base_url, path.trim_start_matches('/'))
    }

    async fn send(&self, request: RequestBuilder, resource: &str) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let message = response.text().await.unwrap_or_default();
        Err(status_error(status, resource, message))
    }

    async fn get_json<T: DeserializeOwned>(&self, token: &AuthToken, path: &str) -> Result<T, ClientError> {
        let request = self.client.get(self.url(path)).bearer_auth(&token.access_token);
        let body = self.send(request, path).await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }
}

/// Map a non-success status to the matching error
fn status_error(status: StatusCode, resource: &str, message: String) -> ClientError {
    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ClientError::Unauthorized,
        StatusCode::NOT_FOUND => ClientError::NotFound(resource.to_string()),
        status => ClientError::Server {
            status: status.as_u16(),
            message,
        },
    }
}

#[async_trait]
impl Backend for ApiClient {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError> {
        let request = self.client.post(self.url("auth/login")).json(credentials);
        let body = self.send(request, "auth/login").await?.text().await?;
        Ok(serde_json::from_str(&body)?)
    }

    async fn current_user(&self, token: &AuthToken) -> Result<User, ClientError> {
        self.get_json(token, "auth/me").await
    }

    async fn list_workspaces(&self, token: &AuthToken) -> Result<Vec<Workspace>, ClientError> {
        self.get_json(token, "workspaces").await
    }

    async fn list_notebooks(
        &self,
        token: &AuthToken,
        workspace_id: &str,
    ) -> Result<Vec<Notebook>, ClientError> {
        self.get_json(token, &format!("workspaces/{}/notebooks", workspace_id))
            .await
    }

    async fn get_notebook(&self, token: &AuthToken, notebook_id: &str) -> Result<Notebook, ClientError> {
        self.get_json(token, &format!("notebooks/{}", notebook_id)).await
    }

    async fn download_notebook(
        &self,
        token: &AuthToken,
        notebook_id: &str,
    ) -> Result<Vec<u8>, ClientError> {
        let path = format!("notebooks/{}/export", notebook_id);
        let request = self.client.get(self.url(&path)).bearer_auth(&token.access_token);
        let bytes = self.send(request, &path).await?.bytes().await?;
        log::debug!("Downloaded notebook {} ({} bytes)", notebook_id, bytes.len());
        Ok(bytes.to_vec())
    }
}
