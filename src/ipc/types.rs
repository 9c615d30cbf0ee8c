use crate::config::Config;
use crate::db;
use crate::photos::PhotoArchive;
use crate::session::Session;
use rusqlite::Connection;
use serde::Deserialize;
use std::path::{Path, PathBuf};

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub config: Config,
    pub session: Session,
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub photos: Option<PhotoArchive>,
}

impl AppState {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            session: Session::default(),
            workspace: None,
            db: None,
            photos: None,
        }
    }

    /// Opens (creating if needed) the database and photo archive under `path`.
    /// On failure the previously open workspace stays active.
    pub fn open_workspace(&mut self, path: &Path) -> anyhow::Result<()> {
        let conn = db::open_db(path)?;
        let archive = PhotoArchive::for_workspace(path);
        tracing::debug!(photos = %archive.root().display(), "photo archive");
        self.db = Some(conn);
        self.photos = Some(archive);
        self.workspace = Some(path.to_path_buf());

        self.config.check_logo(Some(path));
        tracing::info!(workspace = %path.display(), "workspace opened");
        Ok(())
    }
}
