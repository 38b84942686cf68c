//! Client-side session state
//!
//! Holds the logged-in user, the token and the workspaces/notebooks fetched
//! so far. A saved `SessionFile` lets the CLI reuse a token across runs.

use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::models::{AuthToken, Credentials, Notebook, User, Workspace};
use super::{Backend, ClientError};
use crate::bundle::{ImportReport, NotebookImporter};
use crate::notify::{Notification, Notifier};
use crate::sinks::ImportTargets;

pub struct Session<B: Backend> {
    backend: B,
    token: Option<AuthToken>,
    user: Option<User>,
    workspaces: Vec<Workspace>,
    current_workspace: Option<String>,
    notebooks: Vec<Notebook>,
}

impl<B: Backend> Session<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            token: None,
            user: None,
            workspaces: Vec::new(),
            current_workspace: None,
            notebooks: Vec::new(),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn user(&self) -> Option<&User> {
        self.user.as_ref()
    }

    pub fn token(&self) -> Result<&AuthToken, ClientError> {
        self.token.as_ref().ok_or(ClientError::NotAuthenticated)
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.is_some() && self.user.is_some()
    }

    pub fn workspaces(&self) -> &[Workspace] {
        &self.workspaces
    }

    pub fn current_workspace(&self) -> Option<&Workspace> {
        let id = self.current_workspace.as_deref()?;
        self.workspaces.iter().find(|w| w.id == id)
    }

    pub fn notebooks(&self) -> &[Notebook] {
        &self.notebooks
    }

    /// Log in and load the user's profile
    ///
    /// State is only replaced once both requests succeed.
    pub async fn login(&mut self, credentials: &Credentials) -> Result<&User, ClientError> {
        let token = self.backend.login(credentials).await?;
        let user = self.backend.current_user(&token).await?;
        log::info!("Logged in as {}", user.username);
        self.reset();
        self.token = Some(token);
        Ok(&*self.user.insert(user))
    }

    /// Reuse a previously issued token, checking it is still accepted
    pub async fn restore(&mut self, token: AuthToken) -> Result<&User, ClientError> {
        let user = self.backend.current_user(&token).await?;
        self.reset();
        self.token = Some(token);
        Ok(&*self.user.insert(user))
    }

    pub fn logout(&mut self) {
        if let Some(user) = &self.user {
            log::info!("Logged out {}", user.username);
        }
        self.reset();
    }

    fn reset(&mut self) {
        self.token = None;
        self.user = None;
        self.workspaces.clear();
        self.current_workspace = None;
        self.notebooks.clear();
    }

    pub async fn refresh_workspaces(&mut self) -> Result<&[Workspace], ClientError> {
        let token = self.token()?;
        let workspaces = self.backend.list_workspaces(token).await?;
        log::debug!("Loaded {} workspaces", workspaces.len());

        // Drop the selection if the workspace disappeared
        if let Some(current) = &self.current_workspace {
            if !workspaces.iter().any(|w| &w.id == current) {
                self.current_workspace = None;
                self.notebooks.clear();
            }
        }
        self.workspaces = workspaces;
        Ok(&self.workspaces)
    }

    /// Make `workspace_id` current and load its notebooks
    pub async fn select_workspace(&mut self, workspace_id: &str) -> Result<&[Notebook], ClientError> {
        if self.workspaces.is_empty() {
            self.refresh_workspaces().await?;
        }
        if !self.workspaces.iter().any(|w| w.id == workspace_id) {
            return Err(ClientError::UnknownWorkspace(workspace_id.to_string()));
        }

        let token = self.token()?;
        let notebooks = self.backend.list_notebooks(token, workspace_id).await?;
        self.current_workspace = Some(workspace_id.to_string());
        self.notebooks = notebooks;
        Ok(&self.notebooks)
    }

    pub async fn fetch_notebook(&self, notebook_id: &str) -> Result<Notebook, ClientError> {
        let token = self.token()?;
        self.backend.get_notebook(token, notebook_id).await
    }

    /// Download a notebook's bundle and import it into `targets`
    ///
    /// Failures are reported through `notifier`, like the import itself.
    pub async fn import_notebook<'a>(
        &self,
        notebook_id: &str,
        targets: ImportTargets<'a>,
        notifier: &'a dyn Notifier,
    ) -> ImportReport {
        let downloaded = match self.token() {
            Ok(token) => self.backend.download_notebook(token, notebook_id).await,
            Err(e) => Err(e),
        };

        match downloaded {
            Ok(bytes) => NotebookImporter::new(targets, notifier).import_bytes(&bytes),
            Err(e) => {
                log::error!("Failed to download notebook {}: {}", notebook_id, e);
                notifier.notify(Notification::error("Download failed", e.to_string()));
                ImportReport::aborted(e.to_string())
            }
        }
    }
}

/// Token persisted between CLI runs
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SessionFile {
    pub base_url: String,
    pub token: AuthToken,
    pub username: String,
    pub saved_at: DateTime<Utc>,
}

impl SessionFile {
    pub fn new(base_url: &str, token: AuthToken, username: &str) -> Self {
        Self {
            base_url: base_url.to_string(),
            token,
            username: username.to_string(),
            saved_at: Utc::now(),
        }
    }

    pub fn path(data_dir: &Path) -> PathBuf {
        data_dir.join("session.json")
    }

    pub fn load(data_dir: &Path) -> Result<Option<Self>, ClientError> {
        let path = Self::path(data_dir);
        if !path.exists() {
            return Ok(None);
        }
        let content = fs::read_to_string(&path)?;
        Ok(Some(serde_json::from_str(&content)?))
    }

    pub fn save(&self, data_dir: &Path) -> Result<(), ClientError> {
        fs::create_dir_all(data_dir)?;
        let content = serde_json::to_string_pretty(self)?;
        fs::write(Self::path(data_dir), content)?;
        Ok(())
    }

    pub fn clear(data_dir: &Path) -> Result<(), ClientError> {
        let path = Self::path(data_dir);
        if path.exists() {
            fs::remove_file(path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;
    use std::sync::Mutex;

    use async_trait::async_trait;
    use serde_json::json;
    use tempfile::TempDir;

    use crate::bundle::{BundleWriter, Kind};
    use crate::notify::RecordingNotifier;
    use crate::sinks::Stores;

    const TOKEN: &str = "secret-token";

    struct FakeBackend {
        bundle: Vec<u8>,
        workspaces: Mutex<Vec<Workspace>>,
    }

    impl FakeBackend {
        fn new() -> Self {
            let mut writer = BundleWriter::new(Cursor::new(Vec::new()));
            writer
                .add_json("dashboard.json", Kind::Dashboard, Kind::Dashboard, &json!([{"id": "d"}]))
                .unwrap();
            let (_, cursor) = writer.finish().unwrap();

            Self {
                bundle: cursor.into_inner(),
                workspaces: Mutex::new(vec![workspace("w1"), workspace("w2")]),
            }
        }

        fn check(&self, token: &AuthToken) -> Result<(), ClientError> {
            if token.access_token == TOKEN {
                Ok(())
            } else {
                Err(ClientError::Unauthorized)
            }
        }
    }

    fn workspace(id: &str) -> Workspace {
        Workspace {
            id: id.to_string(),
            name: format!("Workspace {}", id),
            description: None,
            updated_at: None,
        }
    }

    fn notebook(id: &str, workspace_id: &str) -> Notebook {
        Notebook {
            id: id.to_string(),
            name: format!("Notebook {}", id),
            workspace_id: workspace_id.to_string(),
            description: None,
            updated_at: None,
        }
    }

    #[async_trait]
    impl Backend for FakeBackend {
        async fn login(&self, credentials: &Credentials) -> Result<AuthToken, ClientError> {
            if credentials.password == "hunter2" {
                Ok(AuthToken {
                    access_token: TOKEN.to_string(),
                    token_type: "bearer".to_string(),
                })
            } else {
                Err(ClientError::Unauthorized)
            }
        }

        async fn current_user(&self, token: &AuthToken) -> Result<User, ClientError> {
            self.check(token)?;
            Ok(User {
                id: "u1".to_string(),
                username: "ada".to_string(),
                email: None,
            })
        }

        async fn list_workspaces(&self, token: &AuthToken) -> Result<Vec<Workspace>, ClientError> {
            self.check(token)?;
            Ok(self.workspaces.lock().unwrap().clone())
        }

        async fn list_notebooks(
            &self,
            token: &AuthToken,
            workspace_id: &str,
        ) -> Result<Vec<Notebook>, ClientError> {
            self.check(token)?;
            Ok(vec![notebook("n1", workspace_id), notebook("n2", workspace_id)])
        }

        async fn get_notebook(&self, token: &AuthToken, notebook_id: &str) -> Result<Notebook, ClientError> {
            self.check(token)?;
            Ok(notebook(notebook_id, "w1"))
        }

        async fn download_notebook(
            &self,
            token: &AuthToken,
            notebook_id: &str,
        ) -> Result<Vec<u8>, ClientError> {
            self.check(token)?;
            if notebook_id == "n1" {
                Ok(self.bundle.clone())
            } else {
                Err(ClientError::NotFound(notebook_id.to_string()))
            }
        }
    }

    fn credentials(password: &str) -> Credentials {
        Credentials {
            username: "ada".to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_and_logout() {
        let mut session = Session::new(FakeBackend::new());
        assert!(!session.is_authenticated());

        let user = session.login(&credentials("hunter2")).await.unwrap();
        assert_eq!(user.username, "ada");
        assert!(session.is_authenticated());

        session.logout();
        assert!(!session.is_authenticated());
        assert!(matches!(session.token(), Err(ClientError::NotAuthenticated)));
    }

    #[tokio::test]
    async fn test_failed_login_keeps_state_empty() {
        let mut session = Session::new(FakeBackend::new());
        let result = session.login(&credentials("wrong")).await;

        assert!(matches!(result, Err(ClientError::Unauthorized)));
        assert!(session.user().is_none());
    }

    #[tokio::test]
    async fn test_requests_need_login() {
        let mut session = Session::new(FakeBackend::new());
        assert!(matches!(
            session.refresh_workspaces().await,
            Err(ClientError::NotAuthenticated)
        ));
        assert!(matches!(
            session.fetch_notebook("n1").await,
            Err(ClientError::NotAuthenticated)
        ));
    }

    #[tokio::test]
    async fn test_restore_rejects_stale_token() {
        let mut session = Session::new(FakeBackend::new());
        let stale = AuthToken {
            access_token: "expired".to_string(),
            token_type: "bearer".to_string(),
        };
        assert!(session.restore(stale).await.is_err());

        let fresh = AuthToken {
            access_token: TOKEN.to_string(),
            token_type: "bearer".to_string(),
        };
        assert_eq!(session.restore(fresh).await.unwrap().id, "u1");
    }

    #[tokio::test]
    async fn test_select_workspace_loads_notebooks() {
        let mut session = Session::new(FakeBackend::new());
        session.login(&credentials("hunter2")).await.unwrap();

        let notebooks = session.select_workspace("w2").await.unwrap();
        assert_eq!(notebooks.len(), 2);
        assert_eq!(notebooks[0].workspace_id, "w2");
        assert_eq!(session.current_workspace().unwrap().id, "w2");

        assert!(matches!(
            session.select_workspace("nope").await,
            Err(ClientError::UnknownWorkspace(_))
        ));
    }

    #[tokio::test]
    async fn test_refresh_drops_vanished_selection() {
        let mut session = Session::new(FakeBackend::new());
        session.login(&credentials("hunter2")).await.unwrap();
        session.select_workspace("w2").await.unwrap();

        session.backend().workspaces.lock().unwrap().retain(|w| w.id != "w2");
        session.refresh_workspaces().await.unwrap();

        assert!(session.current_workspace().is_none());
        assert!(session.notebooks().is_empty());
    }

    #[tokio::test]
    async fn test_import_notebook() {
        let mut session = Session::new(FakeBackend::new());
        session.login(&credentials("hunter2")).await.unwrap();
        let mut stores = Stores::new();
        let notifier = RecordingNotifier::new();

        let report = session.import_notebook("n1", stores.targets(), &notifier).await;

        assert!(report.is_complete());
        assert_eq!(stores.dashboards.len(), 1);
    }

    #[tokio::test]
    async fn test_import_notebook_download_failure_notifies() {
        let mut session = Session::new(FakeBackend::new());
        session.login(&credentials("hunter2")).await.unwrap();
        let mut stores = Stores::new();
        let notifier = RecordingNotifier::new();

        let report = session.import_notebook("missing", stores.targets(), &notifier).await;

        assert!(report.is_aborted());
        assert_eq!(notifier.errors().len(), 1);
        assert!(stores.dashboards.is_empty());
    }

    #[test]
    fn test_session_file_round_trip() {
        let temp = TempDir::new().unwrap();
        assert!(SessionFile::load(temp.path()).unwrap().is_none());

        let token = AuthToken {
            access_token: TOKEN.to_string(),
            token_type: "bearer".to_string(),
        };
        let saved = SessionFile::new("http://localhost:8000", token, "ada");
        saved.save(temp.path()).unwrap();
        assert_eq!(SessionFile::load(temp.path()).unwrap(), Some(saved));

        SessionFile::clear(temp.path()).unwrap();
        assert!(SessionFile::load(temp.path()).unwrap().is_none());
    }
}
