use std::path::Path;

use anyhow::{Context, Result};

use notebook_bundle::client::{Credentials, Session, SessionFile};
use notebook_bundle::notify::RecordingNotifier;
use notebook_bundle::Stores;

use crate::app::App;
use crate::OutputFormat;

pub fn run_login(app: &App, username: &str, password: String, format: &OutputFormat) -> Result<()> {
    let runtime = app.runtime()?;
    let client = app.client()?;
    let base_url = client.base_url().to_string();
    let mut session = Session::new(client);

    let credentials = Credentials {
        username: username.to_string(),
        password,
    };
    let user = runtime
        .block_on(session.login(&credentials))
        .context("Login failed")?
        .clone();

    let token = session.token()?.clone();
    SessionFile::new(&base_url, token, &user.username)
        .save(&app.data_dir)
        .context("Failed to save session")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&user)?),
        OutputFormat::Plain => println!("Logged in as {} ({})", user.username, base_url),
    }
    Ok(())
}

pub fn run_logout(app: &App) -> Result<()> {
    SessionFile::clear(&app.data_dir).context("Failed to remove saved session")?;
    println!("Logged out");
    Ok(())
}

pub fn run_whoami(app: &App, format: &OutputFormat) -> Result<()> {
    let runtime = app.runtime()?;
    let session = runtime.block_on(app.session())?;
    let user = session.user().context("No user in session")?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(user)?),
        OutputFormat::Plain => {
            print!("{}", user.username);
            if let Some(email) = &user.email {
                print!(" <{}>", email);
            }
            println!();
        }
    }
    Ok(())
}

pub fn run_workspaces(app: &App, format: &OutputFormat) -> Result<()> {
    let runtime = app.runtime()?;
    let workspaces = runtime.block_on(async {
        let mut session = app.session().await?;
        let workspaces = session
            .refresh_workspaces()
            .await
            .context("Failed to list workspaces")?
            .to_vec();
        anyhow::Ok(workspaces)
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&workspaces)?),
        OutputFormat::Plain => {
            if workspaces.is_empty() {
                println!("(no workspaces)");
            }
            for workspace in &workspaces {
                println!("{}  {}", workspace.id, workspace.name);
            }
        }
    }
    Ok(())
}

pub fn run_notebooks(app: &App, workspace_id: &str, format: &OutputFormat) -> Result<()> {
    let runtime = app.runtime()?;
    let notebooks = runtime.block_on(async {
        let mut session = app.session().await?;
        let notebooks = session
            .select_workspace(workspace_id)
            .await
            .with_context(|| format!("Failed to list notebooks of {}", workspace_id))?
            .to_vec();
        anyhow::Ok(notebooks)
    })?;

    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&notebooks)?),
        OutputFormat::Plain => {
            if notebooks.is_empty() {
                println!("(no notebooks)");
            }
            for notebook in &notebooks {
                let updated = notebook
                    .updated_at
                    .map(|t| format!("  updated {}", t.format("%Y-%m-%d %H:%M")))
                    .unwrap_or_default();
                println!("{}  {}{}", notebook.id, notebook.name, updated);
            }
        }
    }
    Ok(())
}

pub fn run_pull(
    app: &App,
    notebook_id: &str,
    out: Option<&Path>,
    format: &OutputFormat,
    use_color: bool,
) -> Result<()> {
    let runtime = app.runtime()?;
    let mut stores = Stores::new();
    let notifier = RecordingNotifier::new();

    let report = runtime.block_on(async {
        let session = app.session().await?;
        anyhow::Ok(
            session
                .import_notebook(notebook_id, stores.targets(), &notifier)
                .await,
        )
    })?;
    let notifications = app.forward_notifications(&notifier);

    super::import::finish(&stores, &report, &notifications, out, format, use_color)
}
