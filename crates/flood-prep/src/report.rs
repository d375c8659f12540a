//! Summary of a completed run.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use flood_common::MapEncoding;
use serde::Serialize;

use crate::strategy::MaskStrategy;
use crate::validate::ValidationResult;

/// What a run did and which files it left behind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RunReport {
    /// Processing case, 1 to 4.
    pub case: u8,
    pub encoding: MapEncoding,
    pub strategy: MaskStrategy,
    pub validation: ValidationResult,
    pub flood_map: PathBuf,
    pub converted_file: PathBuf,
    pub mask_file: Option<PathBuf>,
    pub dem: Option<PathBuf>,
    pub dem_generated: bool,
    pub water_depth: PathBuf,
    pub water_surface: Option<PathBuf>,
    pub simulated: bool,
    /// Temporary files removed during cleanup.
    pub deleted_files: Vec<PathBuf>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl RunReport {
    /// Final outputs in the order they were requested.
    pub fn outputs(&self) -> Vec<&PathBuf> {
        std::iter::once(&self.water_depth)
            .chain(self.water_surface.as_ref())
            .collect()
    }

    pub fn duration_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}
