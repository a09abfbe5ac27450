//! # JSON file path store
//!
//! Stores each path as a pretty-printed JSON file named `path_<id>.json` in a single directory.
//! Files are written to a temporary name and renamed into place so a reader never sees a partial
//! record.

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{info, warn};
use std::{
    fs,
    io::{self, Write},
    path::PathBuf,
};

// Internal
use super::{validate, PathStore, PathStoreError};
use comms_if::path::{NewPath, Path, PathId};

// ---------------------------------------------------------------------------
// CONSTANTS
// ---------------------------------------------------------------------------

const FILE_PREFIX: &str = "path_";
const FILE_EXT: &str = "json";

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

#[derive(Debug)]
pub struct JsonFilePathStore {
    dir: PathBuf,
    next_id: PathId,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl JsonFilePathStore {
    /// Open the store in `dir`, creating the directory if needed.
    ///
    /// Ids continue from the largest id already present.
    pub fn open<P: Into<PathBuf>>(dir: P) -> Result<Self, PathStoreError> {
        let dir = dir.into();
        fs::create_dir_all(&dir)?;

        let max_id = Self::stored_ids(&dir)?.into_iter().max().unwrap_or(0);

        info!(
            "Path store opened in {:?}, next path id is {}",
            dir,
            max_id + 1
        );

        Ok(Self {
            dir,
            next_id: max_id + 1,
        })
    }

    pub fn dir(&self) -> &std::path::Path {
        &self.dir
    }

    fn record_path(&self, id: PathId) -> PathBuf {
        self.dir.join(format!("{}{}.{}", FILE_PREFIX, id, FILE_EXT))
    }

    /// Parse an id out of a record file name.
    fn parse_id(file_name: &str) -> Option<PathId> {
        file_name
            .strip_prefix(FILE_PREFIX)?
            .strip_suffix(&format!(".{}", FILE_EXT))?
            .parse()
            .ok()
    }

    /// Ids of every record file in `dir`, unsorted.
    fn stored_ids(dir: &std::path::Path) -> Result<Vec<PathId>, PathStoreError> {
        let mut ids = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            if let Some(id) = entry.file_name().to_str().and_then(Self::parse_id) {
                ids.push(id);
            }
        }

        Ok(ids)
    }

    fn read_record(&self, id: PathId) -> Result<Option<Path>, PathStoreError> {
        let contents = match fs::read_to_string(self.record_path(id)) {
            Ok(c) => c,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into())
        };

        serde_json::from_str(&contents)
            .map(Some)
            .map_err(|e| PathStoreError::CorruptRecord(id, e))
    }
}

impl PathStore for JsonFilePathStore {
    fn save(&mut self, new_path: NewPath) -> Result<PathId, PathStoreError> {
        validate(&new_path)?;

        let id = self.next_id;
        let path = Path::from_new(id, new_path);

        let json = serde_json::to_string_pretty(&path)
            .map_err(PathStoreError::SerializationError)?;

        let final_path = self.record_path(id);
        let tmp_path = final_path.with_extension("tmp");

        {
            let mut file = fs::File::create(&tmp_path)?;
            file.write_all(json.as_bytes())?;
            file.sync_all()?;
        }

        if let Err(e) = fs::rename(&tmp_path, &final_path) {
            fs::remove_file(&tmp_path).ok();
            return Err(e.into())
        }

        self.next_id = id + 1;

        Ok(id)
    }

    fn list(&self) -> Result<Vec<Path>, PathStoreError> {
        let mut ids = Self::stored_ids(&self.dir)?;
        ids.sort_unstable();

        let mut paths = Vec::with_capacity(ids.len());

        for id in ids {
            match self.read_record(id) {
                Ok(Some(p)) => paths.push(p),
                Ok(None) => (),
                // A single bad record should not hide the rest of the store
                Err(e) => warn!("Skipping stored path {}: {}", id, e)
            }
        }

        Ok(paths)
    }

    fn get(&self, id: PathId) -> Result<Option<Path>, PathStoreError> {
        self.read_record(id)
    }
}
