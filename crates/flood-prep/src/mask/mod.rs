//! Permanent-water masks.
//!
//! ```text
//!   MaskStrategy::Internal                MaskStrategy::External
//!          │                                      │
//!          ▼                                      ▼
//!  original three-state map          LandCoverService (class 80)
//!          │                                      │
//!          ▼                                      ▼
//!   value == 2 ──────► MaskRaster ◄────── align_nearest onto working grid
//! ```
//!
//! Both paths yield a [`MaskRaster`](raster_io::MaskRaster) on the working
//! grid, `true` where water is permanent.

mod external;
mod internal;

pub use external::ExternalMaskAdapter;
pub use internal::build_internal_mask;
