//! Backend access: login, workspace and notebook retrieval, archive download

mod api;
pub mod models;
mod session;

pub use api::ApiClient;
pub use models::{AuthToken, Credentials, Notebook, User, Workspace};
pub use session::{Session, SessionFile};

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Authentication failed")]
    Unauthorized,
    #[error("Resource not found: {0}")]
    NotFound(String),
    #[error("Server error: {status} - {message}")]
    Server { status: u16, message: String },
    #[error("Invalid URL: {0}")]
    InvalidUrl(String),
    #[error("Not logged in")]
    NotAuthenticated,
    #[error("Unknown workspace: {0}")]
    UnknownWorkspace(String),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Operations the session needs from the notebook backend
#[async_trait]
pub trait Backend: Send + Sync {
    async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError>;

    async fn current_user(&self, token: &AuthToken) -> Result<User, ClientError>;

    async fn list_workspaces(&self, token: &AuthToken) -> Result<Vec<Workspace>, ClientError>;

    async fn list_notebooks(
        &self,
        token: &AuthToken,
        workspace_id: &str,
    ) -> Result<Vec<Notebook>, ClientError>;

    async fn get_notebook(&self, token: &AuthToken, notebook_id: &str) -> Result<Notebook, ClientError>;

    /// Fetch the notebook's zip bundle
    async fn download_notebook(
        &self,
        token: &AuthToken,
        notebook_id: &str,
    ) -> Result<Vec<u8>, ClientError>;
}
