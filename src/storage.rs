// Copyright (c) 2026 rezky_nightky

use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::StorageError;

pub const DEGRADATION_KEY: &str = "systemDegradation";
const FILE_NAME: &str = "state.json";

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct StateFile(BTreeMap<String, Value>);

/// Tiny JSON key-value file. Only the degradation level lives here.
#[derive(Debug)]
pub struct KvStore {
    path: PathBuf,
    data: StateFile,
}

pub fn data_dir() -> Result<PathBuf, StorageError> {
    ProjectDirs::from("com", "hollowterm", "Hollowterm")
        .map(|p| p.data_local_dir().to_path_buf())
        .ok_or(StorageError::NoDataDir)
}

pub fn default_path() -> Result<PathBuf, StorageError> {
    data_dir().map(|d| d.join(FILE_NAME))
}

impl KvStore {
    /// Opens `path`. A missing file is an empty store; an unreadable or
    /// corrupt one is logged and treated the same.
    pub fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let data = match Self::load(&path) {
            Ok(d) => d,
            Err(StorageError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                StateFile::default()
            }
            Err(err) => {
                tracing::warn!(path = %path.display(), %err, "ignoring unreadable state file");
                StateFile::default()
            }
        };
        Self { path, data }
    }

    fn load(path: &Path) -> Result<StateFile, StorageError> {
        let text = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&text)?)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn get_f32(&self, key: &str) -> Option<f32> {
        self.data
            .0
            .get(key)
            .and_then(Value::as_f64)
            .map(|v| v as f32)
            .filter(|v| v.is_finite())
    }

    pub fn set_f32(&mut self, key: &str, value: f32) {
        self.data.0.insert(key.to_string(), Value::from(value as f64));
    }

    pub fn remove(&mut self, key: &str) {
        self.data.0.remove(key);
    }

    /// Writes through a temp file and renames it over the target.
    pub fn save(&self) -> Result<(), StorageError> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)?;
        }
        let tmp = self.path.with_extension("json.tmp");
        {
            let mut writer = BufWriter::new(File::create(&tmp)?);
            serde_json::to_writer_pretty(&mut writer, &self.data)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp, &self.path)?;
        tracing::debug!(path = %self.path.display(), keys = self.data.0.len(), "state saved");
        Ok(())
    }
}
