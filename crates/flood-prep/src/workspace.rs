//! Run-scoped temporary files.
//!
//! Every run gets a short random token so that concurrent runs on the same
//! flood map never share a temporary file. Files are tracked as they are
//! created and deleted at the end of the run, whether it succeeded or not,
//! according to the delete flags.

use std::path::{Path, PathBuf};

use tracing::{debug, warn};
use uuid::Uuid;

/// What a tracked temporary file holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TempKind {
    /// Flood map in processor encoding.
    Converted,
    /// Permanent-water mask.
    Mask,
    /// Processor parameter file.
    Params,
    /// DEM produced by the DEM service.
    GeneratedDem,
}

impl TempKind {
    fn should_delete(self, delete_converted: bool, delete_dem: bool) -> bool {
        match self {
            Self::Converted | Self::Mask | Self::Params => delete_converted,
            Self::GeneratedDem => delete_dem,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackedFile {
    pub path: PathBuf,
    pub kind: TempKind,
}

/// Scratch files of a single preparation run.
#[derive(Debug)]
pub struct RunWorkspace {
    work_dir: PathBuf,
    base_name: String,
    token: String,
    tracked: Vec<TrackedFile>,
}

impl RunWorkspace {
    pub fn new(work_dir: impl Into<PathBuf>, flood_map: &str) -> Self {
        let token = Uuid::new_v4().simple().to_string()[..8].to_string();
        Self {
            work_dir: work_dir.into(),
            base_name: base_name(flood_map),
            token,
            tracked: Vec::new(),
        }
    }

    pub fn base_name(&self) -> &str {
        &self.base_name
    }

    pub fn token(&self) -> &str {
        &self.token
    }

    pub fn work_dir(&self) -> &Path {
        &self.work_dir
    }

    fn scratch(&self, suffix: &str) -> PathBuf {
        self.work_dir
            .join(format!("{}_{}_{}", self.base_name, self.token, suffix))
    }

    pub fn converted_path(&self) -> PathBuf {
        self.scratch("converted.tif")
    }

    pub fn mask_path(&self) -> PathBuf {
        self.scratch("PW_Mask.tif")
    }

    pub fn params_path(&self) -> PathBuf {
        self.scratch("params.json")
    }

    /// Register a file for end-of-run cleanup.
    pub fn track(&mut self, path: impl Into<PathBuf>, kind: TempKind) {
        let path = path.into();
        if !self.tracked.iter().any(|f| f.path == path) {
            self.tracked.push(TrackedFile { path, kind });
        }
    }

    pub fn tracked(&self) -> &[TrackedFile] {
        &self.tracked
    }

    /// Delete tracked files selected by the flags and return what was removed.
    ///
    /// Files that were never created are skipped. Failures to delete are
    /// logged and do not fail the run.
    pub fn cleanup(&mut self, delete_converted: bool, delete_dem: bool) -> Vec<PathBuf> {
        let mut deleted = Vec::new();

        for file in self.tracked.drain(..) {
            if !file.kind.should_delete(delete_converted, delete_dem) {
                debug!(path = %file.path.display(), kind = ?file.kind, "Keeping file");
                continue;
            }

            if !file.path.exists() {
                continue;
            }

            match std::fs::remove_file(&file.path) {
                Ok(()) => {
                    debug!(path = %file.path.display(), "Deleted temporary file");
                    deleted.push(file.path);
                }
                Err(e) => {
                    warn!(path = %file.path.display(), error = %e, "Failed to delete temporary file");
                }
            }
        }

        deleted
    }
}

/// Base name of a flood map: the file name up to the first `_`, or the
/// name without its `.tif` extension when it has no `_`.
pub fn base_name(flood_map: &str) -> String {
    let file_name = Path::new(flood_map)
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or(flood_map);

    match file_name.split_once('_') {
        Some((head, _)) if !head.is_empty() => head.to_string(),
        _ => file_name
            .strip_suffix(".tif")
            .unwrap_or(file_name)
            .to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("20240915_floodmap.tif"), "20240915");
        assert_eq!(base_name("a_b_c.tif"), "a");
        assert_eq!(base_name("floodmap.tif"), "floodmap");
        assert_eq!(base_name("/data/in/EMSR123_AOI01.tif"), "EMSR123");
        assert_eq!(base_name("_odd.tif"), "_odd");
    }

    #[test]
    fn test_scratch_paths_are_run_scoped() {
        let a = RunWorkspace::new("/work", "scene_map.tif");
        let b = RunWorkspace::new("/work", "scene_map.tif");

        assert_ne!(a.token(), b.token());
        assert_ne!(a.converted_path(), b.converted_path());
        assert_eq!(a.token().len(), 8);

        let name = a.converted_path().file_name().unwrap().to_string_lossy().to_string();
        assert_eq!(name, format!("scene_{}_converted.tif", a.token()));
        assert!(a.mask_path().to_string_lossy().ends_with("_PW_Mask.tif"));
    }

    #[test]
    fn test_cleanup_honours_flags() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = RunWorkspace::new(dir.path(), "scene_map.tif");

        let converted = ws.converted_path();
        let mask = ws.mask_path();
        let dem = dir.path().join("scene_DEM.tif");
        for path in [&converted, &mask, &dem] {
            std::fs::write(path, b"x").unwrap();
        }

        ws.track(&converted, TempKind::Converted);
        ws.track(&mask, TempKind::Mask);
        ws.track(&dem, TempKind::GeneratedDem);

        let deleted = ws.cleanup(true, false);

        assert_eq!(deleted, vec![converted.clone(), mask.clone()]);
        assert!(!converted.exists());
        assert!(!mask.exists());
        assert!(dem.exists());
    }

    #[test]
    fn test_cleanup_skips_missing_files() {
        let dir = tempfile::tempdir().unwrap();
        let mut ws = RunWorkspace::new(dir.path(), "scene.tif");
        ws.track(ws.converted_path(), TempKind::Converted);
        ws.track(ws.converted_path(), TempKind::Converted);
        assert_eq!(ws.tracked().len(), 1);

        assert!(ws.cleanup(true, true).is_empty());
        assert!(ws.tracked().is_empty());
    }
}
