use crate::session::Credentials;
use clap::Parser;
use std::path::{Path, PathBuf};

/// School office records sidecar. Speaks JSON lines over stdin/stdout.
#[derive(Debug, Clone, Parser)]
#[command(name = "schoold", version)]
pub struct Args {
    /// Workspace directory to open at startup (database + photos)
    #[arg(long, env = "SCHOOLD_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Admin username for the login gate
    #[arg(long, env = "SCHOOLD_ADMIN_USERNAME", default_value = "admin")]
    pub admin_username: String,

    /// Admin password for the login gate
    #[arg(
        long,
        env = "SCHOOLD_ADMIN_PASSWORD",
        default_value = "admin123",
        hide_env_values = true
    )]
    pub admin_password: String,

    /// School name shown in the UI header
    #[arg(long, env = "SCHOOLD_SCHOOL_NAME", default_value = "ABC Public School")]
    pub school_name: String,

    /// School logo; relative paths resolve against the open workspace
    #[arg(long, env = "SCHOOLD_LOGO", default_value = "assets/logo.png")]
    pub logo: PathBuf,

    /// Log filter directive, e.g. "info" or "schoold=debug"
    #[arg(long = "log", env = "SCHOOLD_LOG", default_value = "info")]
    pub log_filter: String,
}

#[derive(Debug, Clone)]
pub struct Config {
    pub credentials: Credentials,
    pub school_name: String,
    pub logo: PathBuf,
    pub initial_workspace: Option<PathBuf>,
    pub log_filter: String,
}

impl From<Args> for Config {
    fn from(args: Args) -> Self {
        Self {
            credentials: Credentials {
                username: args.admin_username,
                password: args.admin_password,
            },
            school_name: args.school_name,
            logo: args.logo,
            initial_workspace: args.workspace,
            log_filter: args.log_filter,
        }
    }
}

impl Config {
    pub fn logo_path(&self, workspace: Option<&Path>) -> PathBuf {
        match workspace {
            Some(ws) if self.logo.is_relative() => ws.join(&self.logo),
            _ => self.logo.clone(),
        }
    }

    /// Logs a warning when the logo is absent; rendering goes on without it.
    pub fn check_logo(&self, workspace: Option<&Path>) -> bool {
        let logo = self.logo_path(workspace);
        let available = logo.is_file();
        if !available {
            tracing::warn!(path = %logo.display(), "school logo not found, rendering without it");
        }
        available
    }
}
