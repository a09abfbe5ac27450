//! # Path store
//!
//! Persistent storage of recorded paths. Stores are accessed through the [`PathStore`] trait so
//! the executive can run with either the file-backed store or the volatile in-memory one.
//!
//! Paths are immutable once saved. Ids are allocated by the store, are never reused, and increase
//! with each save.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

pub mod file_store;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

// External
use log::{debug, warn};

// Internal
use comms_if::path::{NewPath, Path, PathId, PathReq, PathResponse};
pub use file_store::JsonFilePathStore;

// ---------------------------------------------------------------------------
// TRAITS
// ---------------------------------------------------------------------------

/// Storage backend for recorded paths.
pub trait PathStore {
    /// Save a new path, returning the id allocated to it.
    fn save(&mut self, new_path: NewPath) -> Result<PathId, PathStoreError>;

    /// All stored paths in id order.
    fn list(&self) -> Result<Vec<Path>, PathStoreError>;

    /// The path with the given id, `None` if there is no such path.
    fn get(&self, id: PathId) -> Result<Option<Path>, PathStoreError>;
}

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// Volatile path store, used when no store directory is configured.
#[derive(Debug, Default)]
pub struct MemPathStore {
    paths: Vec<Path>,
    next_id: PathId,
}

// ---------------------------------------------------------------------------
// ENUMERATIONS
// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum PathStoreError {
    #[error("The path is not valid: {0}")]
    InvalidPath(String),

    #[error("Could not access the path store: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Could not serialize the path: {0}")]
    SerializationError(serde_json::Error),

    #[error("Stored path {0} could not be read: {1}")]
    CorruptRecord(PathId, serde_json::Error),
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl MemPathStore {
    pub fn new() -> Self {
        Self {
            paths: Vec::new(),
            next_id: 1,
        }
    }
}

impl PathStore for MemPathStore {
    fn save(&mut self, new_path: NewPath) -> Result<PathId, PathStoreError> {
        validate(&new_path)?;

        let id = self.next_id.max(1);
        self.next_id = id + 1;
        self.paths.push(Path::from_new(id, new_path));

        Ok(id)
    }

    fn list(&self) -> Result<Vec<Path>, PathStoreError> {
        Ok(self.paths.clone())
    }

    fn get(&self, id: PathId) -> Result<Option<Path>, PathStoreError> {
        Ok(self.paths.iter().find(|p| p.id == id).cloned())
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Check that a new path can be stored.
///
/// A path needs a name and at least one point, and every pose in it must be finite.
pub fn validate(new_path: &NewPath) -> Result<(), PathStoreError> {
    if new_path.name.trim().is_empty() {
        return Err(PathStoreError::InvalidPath("the name is empty".into()))
    }

    if new_path.points.is_empty() {
        return Err(PathStoreError::InvalidPath("the path has no points".into()))
    }

    if let Some(i) = new_path.points.iter().position(|p| !p.pose.is_finite()) {
        return Err(PathStoreError::InvalidPath(format!("point {} is not finite", i)))
    }

    if let Some(s) = new_path.stations.iter().find(|s| !s.pose.is_finite()) {
        return Err(PathStoreError::InvalidPath(format!("station {:?} is not finite", s.label)))
    }

    Ok(())
}

/// Execute a path store request.
///
/// Failures are reported in the response, they are never propagated.
pub fn exec(store: &mut dyn PathStore, req: PathReq) -> PathResponse {
    match req {
        PathReq::Save(new_path) => {
            let name = new_path.name.clone();

            match store.save(new_path) {
                Ok(id) => {
                    debug!("Saved path {:?} as {}", name, id);
                    PathResponse::Saved { id }
                },
                Err(e @ PathStoreError::InvalidPath(_)) => {
                    PathResponse::Invalid { reason: e.to_string() }
                },
                Err(e) => {
                    warn!("Could not save path {:?}: {}", name, e);
                    PathResponse::Failed { reason: e.to_string() }
                }
            }
        },
        PathReq::List => match store.list() {
            Ok(paths) => PathResponse::Paths { paths },
            Err(e) => {
                warn!("Could not list paths: {}", e);
                PathResponse::Failed { reason: e.to_string() }
            }
        },
        PathReq::Get { id } => match store.get(id) {
            Ok(Some(path)) => PathResponse::Path { path },
            Ok(None) => PathResponse::NotFound { id },
            Err(e) => {
                warn!("Could not get path {}: {}", id, e);
                PathResponse::Failed { reason: e.to_string() }
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod test {
    use super::*;
    use chrono::Utc;
    use comms_if::{
        path::{PathPoint, Station, END_STATION_LABEL, START_STATION_LABEL},
        pose::Pose,
    };

    /// A straight path along X from `x0` to `x1` with start and end stations.
    pub(crate) fn straight_path(name: &str, x0: f64, x1: f64) -> NewPath {
        let points: Vec<PathPoint> = (0..=4)
            .map(|i| PathPoint {
                pose: Pose::new(x0 + (x1 - x0) * (i as f64) / 4.0, 0.0, 0.0),
                timestamp: Utc::now(),
            })
            .collect();

        NewPath {
            name: name.into(),
            stations: vec![
                Station { label: START_STATION_LABEL.into(), pose: points[0].pose },
                Station { label: END_STATION_LABEL.into(), pose: points[4].pose },
            ],
            points,
        }
    }

    #[test]
    fn test_mem_store() {
        let mut store = MemPathStore::new();
        assert!(store.list().unwrap().is_empty());

        let a = store.save(straight_path("a", 0.0, 1.0)).unwrap();
        let b = store.save(straight_path("b", 0.0, 2.0)).unwrap();
        assert!(b > a);

        let listed = store.list().unwrap();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].name, "a");
        assert_eq!(store.get(b).unwrap().unwrap().name, "b");
        assert!(store.get(b + 1).unwrap().is_none());
    }

    #[test]
    fn test_validate() {
        let mut p = straight_path("ok", 0.0, 1.0);
        assert!(validate(&p).is_ok());

        p.name = "  ".into();
        assert!(matches!(validate(&p), Err(PathStoreError::InvalidPath(_))));

        let mut p = straight_path("nan", 0.0, 1.0);
        p.points[2].pose.y_m = std::f64::NAN;
        assert!(validate(&p).is_err());

        let mut p = straight_path("empty", 0.0, 1.0);
        p.points.clear();
        assert!(validate(&p).is_err());
    }

    #[test]
    fn test_exec() {
        let mut store = MemPathStore::new();

        let id = match exec(&mut store, PathReq::Save(straight_path("a", 0.0, 1.0))) {
            PathResponse::Saved { id } => id,
            r => panic!("Unexpected response {:?}", r),
        };

        match exec(&mut store, PathReq::Get { id }) {
            PathResponse::Path { path } => assert_eq!(path.id, id),
            r => panic!("Unexpected response {:?}", r),
        }

        assert_eq!(
            exec(&mut store, PathReq::Get { id: id + 10 }),
            PathResponse::NotFound { id: id + 10 }
        );

        match exec(&mut store, PathReq::List) {
            PathResponse::Paths { paths } => assert_eq!(paths.len(), 1),
            r => panic!("Unexpected response {:?}", r),
        }

        let mut bad = straight_path("bad", 0.0, 1.0);
        bad.points.clear();
        assert!(matches!(
            exec(&mut store, PathReq::Save(bad)),
            PathResponse::Invalid { .. }
        ));
    }
}
