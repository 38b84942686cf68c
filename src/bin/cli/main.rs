mod app;
mod commands;
mod render;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "nbundle", about = "Import, inspect and pack notebook bundles", version)]
struct Cli {
    /// Config file (default: platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Output format
    #[arg(long, global = true, default_value = "plain")]
    format: OutputFormat,

    /// Disable ANSI colors
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Clone, Debug, clap::ValueEnum)]
pub enum OutputFormat {
    Plain,
    Json,
}

#[derive(Subcommand)]
enum Command {
    /// Import a bundle into in-memory stores and report the result
    Import {
        /// Bundle zip file
        archive: PathBuf,
        /// Write each store's contents as JSON into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },

    /// Show a bundle's manifest and which entries resolve
    Inspect {
        /// Bundle zip file
        archive: PathBuf,
    },

    /// Pack a directory holding parse_map.json into a bundle
    Pack {
        /// Directory to pack
        dir: PathBuf,
        /// Output zip file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Import a bundle and write it back out in normalized form
    Export {
        /// Bundle zip file
        archive: PathBuf,
        /// Output zip file
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Backend login and notebook retrieval
    #[command(subcommand)]
    Remote(RemoteCommand),
}

#[derive(Subcommand)]
enum RemoteCommand {
    /// Log in and save the session
    Login {
        username: String,
        /// Password (use "-" or omit to read from stdin)
        #[arg(long)]
        password: Option<String>,
    },

    /// Forget the saved session
    Logout,

    /// Show the logged-in user
    Whoami,

    /// List workspaces
    Workspaces,

    /// List notebooks in a workspace
    Notebooks {
        /// Workspace id
        workspace: String,
    },

    /// Download a notebook bundle and import it
    Pull {
        /// Notebook id
        notebook: String,
        /// Write each store's contents as JSON into this directory
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

/// Resolve a password argument, reading stdin for "-" or when absent
fn resolve_password(password: Option<String>) -> anyhow::Result<String> {
    match password.as_deref() {
        Some("-") | None => {
            if stdin_is_tty() {
                eprint!("Password: ");
            }
            let mut buf = String::new();
            std::io::stdin().read_line(&mut buf)?;
            Ok(buf.trim_end_matches(['\r', '\n']).to_string())
        }
        Some(_) => Ok(password.unwrap_or_default()),
    }
}

/// Check if stdin is a terminal (not piped)
fn stdin_is_tty() -> bool {
    unsafe { libc_isatty(0) != 0 }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();

    let cli = Cli::parse();
    let use_color = !cli.no_color && atty_check();
    let app = app::App::new(cli.config.as_deref())?;

    match cli.command {
        Command::Import { archive, out } => {
            commands::import::run(&app, &archive, out.as_deref(), &cli.format, use_color)?;
        }
        Command::Inspect { archive } => {
            commands::inspect::run(&archive, &cli.format, use_color)?;
        }
        Command::Pack { dir, output } => {
            commands::pack::run_pack(&dir, &output, &cli.format)?;
        }
        Command::Export { archive, output } => {
            commands::pack::run_export(&app, &archive, &output, &cli.format)?;
        }
        Command::Remote(subcmd) => match subcmd {
            RemoteCommand::Login { username, password } => {
                let password = resolve_password(password)?;
                commands::remote::run_login(&app, &username, password, &cli.format)?;
            }
            RemoteCommand::Logout => commands::remote::run_logout(&app)?,
            RemoteCommand::Whoami => commands::remote::run_whoami(&app, &cli.format)?,
            RemoteCommand::Workspaces => commands::remote::run_workspaces(&app, &cli.format)?,
            RemoteCommand::Notebooks { workspace } => {
                commands::remote::run_notebooks(&app, &workspace, &cli.format)?;
            }
            RemoteCommand::Pull { notebook, out } => {
                commands::remote::run_pull(&app, &notebook, out.as_deref(), &cli.format, use_color)?;
            }
        },
    }

    Ok(())
}

/// Check if stdout is a terminal (for color support)
fn atty_check() -> bool {
    unsafe { libc_isatty(1) != 0 }
}

extern "C" {
    #[link_name = "isatty"]
    fn libc_isatty(fd: i32) -> i32;
}
