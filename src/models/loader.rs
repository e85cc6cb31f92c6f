//! Artifact loader with a write-once cache

use super::{ModelDocument, Regressor};
use crate::error::{PredictorError, Result};
use crate::feature_builder::ColumnOrder;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;
use tracing::{debug, info};

/// Loads models and column lists from disk.
///
/// Every successfully loaded artifact is cached by path; loading the same
/// path again returns the cached `Arc` without touching the disk. Paths are
/// compared lexically after dropping `.` components and repeated separators,
/// so `models/x.json` and `./models//x.json` share an entry. Symlinks and
/// `..` are not resolved. Failed loads are not cached.
pub struct ArtifactLoader {
    /// Number of threads for ONNX inference
    onnx_threads: usize,
    models: HashMap<PathBuf, Arc<dyn Regressor>>,
    columns: HashMap<PathBuf, Arc<ColumnOrder>>,
    disk_reads: usize,
}

impl ArtifactLoader {
    /// Create a new loader with default settings (1 ONNX thread)
    pub fn new() -> Self {
        Self::with_threads(1)
    }

    pub fn with_threads(onnx_threads: usize) -> Self {
        Self {
            onnx_threads,
            models: HashMap::new(),
            columns: HashMap::new(),
            disk_reads: 0,
        }
    }

    /// Load a model, dispatching on the file extension
    pub fn load_model<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<dyn Regressor>> {
        let path = path.as_ref();
        let key = cache_key(path);

        if let Some(model) = self.models.get(&key) {
            debug!(path = %path.display(), "Model cache hit");
            return Ok(Arc::clone(model));
        }

        let model = match extension(path).as_deref() {
            Some("json") => {
                let bytes = self.read(path)?;
                let document: ModelDocument =
                    serde_json::from_slice(&bytes).map_err(|e| PredictorError::load(path, e))?;
                document
                    .into_regressor()
                    .map_err(|reason| PredictorError::load(path, reason))?
            }
            Some("onnx") => self.load_onnx(path)?,
            _ => {
                self.ensure_exists(path)?;
                return Err(PredictorError::load(path, "unsupported model format"));
            }
        };

        info!(model = %model.name(), path = %path.display(), "Model loaded");
        self.models.insert(key, Arc::clone(&model));
        Ok(model)
    }

    /// Load the ordered training column list (a JSON array of names)
    pub fn load_columns<P: AsRef<Path>>(&mut self, path: P) -> Result<Arc<ColumnOrder>> {
        let path = path.as_ref();
        let key = cache_key(path);

        if let Some(columns) = self.columns.get(&key) {
            debug!(path = %path.display(), "Column list cache hit");
            return Ok(Arc::clone(columns));
        }

        let bytes = self.read(path)?;
        let columns: ColumnOrder =
            serde_json::from_slice(&bytes).map_err(|e| PredictorError::load(path, e))?;
        if columns.is_empty() {
            return Err(PredictorError::load(path, "column list is empty"));
        }

        info!(path = %path.display(), columns = columns.len(), "Column list loaded");
        let columns = Arc::new(columns);
        self.columns.insert(key, Arc::clone(&columns));
        Ok(columns)
    }

    /// Number of times an artifact was read from disk
    pub fn disk_reads(&self) -> usize {
        self.disk_reads
    }

    /// Number of artifacts held in the cache
    pub fn cached_count(&self) -> usize {
        self.models.len() + self.columns.len()
    }

    fn ensure_exists(&self, path: &Path) -> Result<()> {
        if path.exists() {
            Ok(())
        } else {
            Err(PredictorError::FileNotFound {
                path: path.to_path_buf(),
            })
        }
    }

    fn read(&mut self, path: &Path) -> Result<Vec<u8>> {
        self.ensure_exists(path)?;
        self.disk_reads += 1;
        fs::read(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => PredictorError::FileNotFound {
                path: path.to_path_buf(),
            },
            _ => PredictorError::load(path, e),
        })
    }

    #[cfg(feature = "onnx")]
    fn load_onnx(&mut self, path: &Path) -> Result<Arc<dyn Regressor>> {
        self.ensure_exists(path)?;
        self.disk_reads += 1;
        let model = super::onnx::OnnxRegressor::load(path, self.onnx_threads)?;
        Ok(Arc::new(model))
    }

    #[cfg(not(feature = "onnx"))]
    fn load_onnx(&mut self, path: &Path) -> Result<Arc<dyn Regressor>> {
        self.ensure_exists(path)?;
        debug!(threads = self.onnx_threads, "ONNX support not compiled in");
        Err(PredictorError::load(
            path,
            "ONNX models require the `onnx` feature",
        ))
    }
}

impl Default for ArtifactLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn cache_key(path: &Path) -> PathBuf {
    path.components()
        .filter(|component| !matches!(component, Component::CurDir))
        .collect()
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    const LINEAR: &str = r#"{"type": "linear_regression", "coefficients": [2.0], "intercept": 1.0}"#;

    #[test]
    fn test_repeated_load_hits_cache() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "linear.json", LINEAR);
        let mut loader = ArtifactLoader::new();

        let first = loader.load_model(&path).unwrap();
        let second = loader.load_model(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(loader.disk_reads(), 1);
        assert_eq!(loader.cached_count(), 1);
    }

    #[test]
    fn test_columns_cached() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "cols.json", r#"["RAM", "ROM"]"#);
        let mut loader = ArtifactLoader::new();

        let first = loader.load_columns(&path).unwrap();
        let second = loader.load_columns(&path).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.names(), ["RAM", "ROM"]);
        assert_eq!(loader.disk_reads(), 1);
    }

    #[test]
    fn test_missing_file() {
        let dir = TempDir::new().unwrap();
        let mut loader = ArtifactLoader::new();

        for name in ["nope.json", "nope.onnx", "nope.pkl"] {
            let path = dir.path().join(name);
            let err = loader.load_model(&path).unwrap_err();
            assert_eq!(err, PredictorError::FileNotFound { path });
        }
        let err = loader.load_columns(dir.path().join("cols.json")).unwrap_err();
        assert_eq!(err.kind(), "file_not_found");
        assert_eq!(loader.disk_reads(), 0);
    }

    #[test]
    fn test_corrupt_artifacts_are_load_errors() {
        let dir = TempDir::new().unwrap();
        let mut loader = ArtifactLoader::new();

        let garbage = write(&dir, "garbage.json", "\u{0080}not json");
        assert_eq!(loader.load_model(&garbage).unwrap_err().kind(), "load_error");

        let invalid_tree = write(
            &dir,
            "tree.json",
            r#"{"type": "decision_tree", "n_features_in": 1,
                "children_left": [1], "children_right": [2],
                "feature": [0], "threshold": [0.5], "value": [1.0]}"#,
        );
        assert_eq!(loader.load_model(&invalid_tree).unwrap_err().kind(), "load_error");

        let empty_columns = write(&dir, "cols.json", "[]");
        assert_eq!(loader.load_columns(&empty_columns).unwrap_err().kind(), "load_error");

        let pickle = write(&dir, "model.pkl", "binary");
        assert_eq!(loader.load_model(&pickle).unwrap_err().kind(), "load_error");

        assert_eq!(loader.cached_count(), 0);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("linear.json");
        let mut loader = ArtifactLoader::new();

        assert!(loader.load_model(&path).is_err());
        fs::write(&path, LINEAR).unwrap();
        assert!(loader.load_model(&path).is_ok());
    }

    #[test]
    fn test_equivalent_paths_share_cache_entry() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "linear.json", LINEAR);
        let cols = write(&dir, "cols.json", r#"["RAM"]"#);
        let mut loader = ArtifactLoader::new();

        let first = loader.load_model(&path).unwrap();
        let dotted = loader.load_model(dir.path().join(".").join("linear.json")).unwrap();
        let doubled = format!("{}//linear.json", dir.path().display());
        let second = loader.load_model(&doubled).unwrap();

        assert!(Arc::ptr_eq(&first, &dotted));
        assert!(Arc::ptr_eq(&first, &second));

        loader.load_columns(&cols).unwrap();
        loader.load_columns(dir.path().join("./cols.json")).unwrap();

        assert_eq!(loader.disk_reads(), 2);
        assert_eq!(loader.cached_count(), 2);
        assert_eq!(
            cache_key(Path::new("./models/./x.json")),
            PathBuf::from("models/x.json")
        );
    }

    #[test]
    fn test_tree_without_explicit_width() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "tree.json",
            r#"{"type": "decision_tree", "feature_names": ["RAM"],
                "children_left": [-1], "children_right": [-1],
                "feature": [-2], "threshold": [-2.0], "value": [42.0]}"#,
        );
        let mut loader = ArtifactLoader::new();

        let tree = loader.load_model(&path).unwrap();
        let record = crate::feature_builder::FeatureBuilder::new()
            .build(
                &crate::types::PhoneSpecs::default(),
                &ColumnOrder::new(["RAM"]),
            )
            .unwrap();
        assert_eq!(tree.predict(&record).unwrap(), 42.0);

        let unnamed = write(
            &dir,
            "unnamed.json",
            r#"{"type": "decision_tree",
                "children_left": [-1], "children_right": [-1],
                "feature": [-2], "threshold": [-2.0], "value": [42.0]}"#,
        );
        assert_eq!(loader.load_model(&unnamed).unwrap_err().kind(), "load_error");
    }
}
