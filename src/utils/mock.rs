use std::{
    fs,
    path::PathBuf,
    sync::atomic::{AtomicUsize, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use tempfile::env::temp_dir;

use crate::{
    config::MapConfig,
    storage::{
        block_store::FileBlockStore,
        map_file::{Extent, MapFile},
    },
    types::error::Result,
};

static TEMP_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn get_unix_timestamp_millis() -> u128 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis())
        .unwrap_or_default()
}

pub fn create_temp_map_path() -> PathBuf {
    create_temp_map_path_with_prefix("tabmap_test")
}

pub fn create_temp_map_path_with_prefix(prefix: &str) -> PathBuf {
    let mut temp_path = temp_dir();
    temp_path.push(format!(
        "{}_{}_{}_{}.map",
        prefix,
        std::process::id(),
        get_unix_timestamp_millis(),
        TEMP_COUNTER.fetch_add(1, Ordering::Relaxed)
    ));
    temp_path
}

/// A scratch .MAP path removed on drop.
pub struct TempMapFile {
    pub path: PathBuf,
    pub map_file: Option<MapFile<FileBlockStore>>,
}

impl TempMapFile {
    pub fn new() -> Self {
        Self {
            path: create_temp_map_path(),
            map_file: None,
        }
    }

    pub fn with_prefix(prefix: &str) -> Self {
        Self {
            path: create_temp_map_path_with_prefix(prefix),
            map_file: None,
        }
    }

    pub fn create_map_file(&mut self, extent: Extent, config: &MapConfig) -> Result<&mut MapFile<FileBlockStore>> {
        let map_file = MapFile::create(&self.path, extent, config)?;
        Ok(self.map_file.insert(map_file))
    }

    /// Closes any open handle and reopens the file read-only.
    pub fn reopen(&mut self) -> Result<&mut MapFile<FileBlockStore>> {
        if let Some(mut current) = self.map_file.take() {
            current.close()?;
        }
        let map_file = MapFile::open(&self.path)?;
        Ok(self.map_file.insert(map_file))
    }

    pub fn get_map_file(&mut self) -> Option<&mut MapFile<FileBlockStore>> {
        self.map_file.as_mut()
    }
}

impl Default for TempMapFile {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TempMapFile {
    fn drop(&mut self) {
        self.map_file = None;
        if self.path.exists() {
            let _ = fs::remove_file(&self.path);
        }
    }
}
