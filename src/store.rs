use chrono::Local;
use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::info;

use crate::config;
use crate::session::normalize_state;
use crate::types::*;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("read state {path}: {source}")]
    Read { path: String, source: std::io::Error },
    #[error("parse state {path}: {source}")]
    Parse {
        path: String,
        source: serde_json::Error,
    },
    #[error("write state {path}: {source}")]
    Write { path: String, source: std::io::Error },
    #[error("encode state: {0}")]
    Encode(serde_json::Error),
}

pub struct StateStore {
    state_path: PathBuf,
    audit_path: PathBuf,
}

impl StateStore {
    pub fn from_config(config: &AppConfig) -> Self {
        StateStore {
            state_path: config::resolve_repo_path(&config.state_path),
            audit_path: config::repo_root().join("logs").join("state_changes.log"),
        }
    }

    pub fn with_paths(state_path: PathBuf, audit_path: PathBuf) -> Self {
        StateStore {
            state_path,
            audit_path,
        }
    }

    pub fn state_path(&self) -> &Path {
        &self.state_path
    }

    // First run writes and returns the default state. A present but
    // unreadable/unparseable file is an error; the file is left in place
    // for the operator.
    pub fn load(&self) -> Result<AllSetupsState, StoreError> {
        if !self.state_path.is_file() {
            let state = self.save(&AllSetupsState::bootstrap())?;
            info!("wrote default state to {}", self.state_path.display());
            return Ok(state);
        }
        let data = fs::read_to_string(&self.state_path).map_err(|e| StoreError::Read {
            path: self.state_path.display().to_string(),
            source: e,
        })?;
        let state: AllSetupsState = serde_json::from_str(&data).map_err(|e| StoreError::Parse {
            path: self.state_path.display().to_string(),
            source: e,
        })?;
        Ok(normalize_state(state))
    }

    pub fn save(&self, state: &AllSetupsState) -> Result<AllSetupsState, StoreError> {
        if let Some(parent) = self.state_path.parent() {
            fs::create_dir_all(parent).map_err(|e| StoreError::Write {
                path: self.state_path.display().to_string(),
                source: e,
            })?;
        }
        let payload = serde_json::to_string_pretty(state).map_err(StoreError::Encode)?;
        fs::write(&self.state_path, payload).map_err(|e| StoreError::Write {
            path: self.state_path.display().to_string(),
            source: e,
        })?;
        Ok(state.clone())
    }

    pub fn audit(&self, line: &str) {
        let Some(dir) = self.audit_path.parent() else {
            return;
        };
        if fs::create_dir_all(dir).is_err() {
            return;
        }
        let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
        let entry = format!("[{timestamp}] {line}\n");
        if let Ok(mut file) = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.audit_path)
        {
            let _ = file.write_all(entry.as_bytes());
        }
    }
}
