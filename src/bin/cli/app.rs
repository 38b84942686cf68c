use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use notebook_bundle::client::{ApiClient, Session, SessionFile};
use notebook_bundle::notify::{LogNotifier, Notification, Notifier, RecordingNotifier};
use notebook_bundle::Config;

/// Shared state for CLI commands
pub struct App {
    pub config: Config,
    pub data_dir: PathBuf,
}

impl App {
    pub fn new(config_path: Option<&Path>) -> Result<Self> {
        let config_path = match config_path {
            Some(path) => path.to_path_buf(),
            None => Config::default_path().context("Failed to get config directory")?,
        };
        let config = Config::load(&config_path)
            .with_context(|| format!("Failed to load config from {}", config_path.display()))?
            .with_env();
        let data_dir = Config::default_data_dir().context("Failed to get data directory")?;

        Ok(Self { config, data_dir })
    }

    /// Replay recorded notifications to the log when configured to
    pub fn forward_notifications(&self, recorded: &RecordingNotifier) -> Vec<Notification> {
        let notifications = recorded.notifications();
        if self.config.import.log_notifications {
            for notification in &notifications {
                LogNotifier.notify(notification.clone());
            }
        }
        notifications
    }

    pub fn runtime(&self) -> Result<tokio::runtime::Runtime> {
        tokio::runtime::Runtime::new().context("Failed to start async runtime")
    }

    pub fn client(&self) -> Result<ApiClient> {
        ApiClient::new(&self.config.api).context("Failed to create API client")
    }

    /// Session restored from the saved token
    pub async fn session(&self) -> Result<Session<ApiClient>> {
        let saved = SessionFile::load(&self.data_dir)
            .context("Failed to read saved session")?
            .context("Not logged in. Run `nbundle remote login <username>` first")?;

        let client = self.client()?;
        if saved.base_url != client.base_url() {
            log::warn!(
                "Saved session is for {}, configured backend is {}",
                saved.base_url,
                client.base_url()
            );
        }

        let mut session = Session::new(client);
        session
            .restore(saved.token)
            .await
            .context("Saved session is no longer valid, log in again")?;
        Ok(session)
    }
}
