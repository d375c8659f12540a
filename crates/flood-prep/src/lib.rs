//! Flood-map preparation for a thresholding processor.
//!
//! A flood extent map is normalised into the two-state encoding the
//! thresholding processor expects, checked for water, paired with a
//! permanent-water mask when removal is requested, and the processor's
//! outputs are clipped back to the original water footprint.
//!
//! # Processing cases
//!
//! | Case | Source encoding | Remove permanent water | Mask     |
//! |------|-----------------|------------------------|----------|
//! | 1    | three-state     | yes                    | internal |
//! | 2    | three-state     | no                     | none     |
//! | 3    | two-state       | yes                    | external |
//! | 4    | two-state       | no                     | none     |
//!
//! # Example
//!
//! ```ignore
//! use flood_prep::{Collaborators, FloodPrepConfig, FloodPrepPipeline};
//!
//! let config = FloodPrepConfig::from_file("params.json")?;
//! let report = FloodPrepPipeline::new(config, collaborators)
//!     .with_data_dir("/data")
//!     .run()
//!     .await?;
//! println!("{}", report.water_depth.display());
//! ```

pub mod clip;
pub mod collaborators;
pub mod config;
pub mod error;
pub mod mask;
pub mod pipeline;
pub mod remap;
pub mod report;
pub mod strategy;
pub mod validate;
pub mod workspace;

pub use clip::{clip, finalize, remove_permanent_water, ArtifactExtentMask};
pub use collaborators::{
    CollaboratorError, DemRequest, DemService, LandCoverRequest, LandCoverService,
    SimulatedProcessor, ThresholdingOutputs, ThresholdingProcessor, ThresholdingRequest,
};
pub use config::{DemResolution, FloodPrepConfig, ThresholdingParams};
pub use error::{PrepError, Result};
pub use mask::{build_internal_mask, ExternalMaskAdapter};
pub use pipeline::{Collaborators, FloodPrepPipeline};
pub use remap::{remap, remap_value};
pub use report::RunReport;
pub use strategy::{MaskStrategy, PrepCase};
pub use validate::{validate, ValidationResult};
pub use workspace::{base_name, RunWorkspace, TempKind};
