//! FreeSurfer and FSL interface definitions.
//!
//! Each interface module exposes `NAME`, `COMMAND` and a `definition`
//! function building its [`InterfaceDefinition`] from an [`EnvConfig`].
//! The [`catalog`] lists them all.
//!
//! | interface          | command         |
//! |--------------------|-----------------|
//! | `SampleToSurface`  | `mri_vol2surf`  |
//! | `SurfaceSmooth`    | `mri_surf2surf` |
//! | `SurfaceTransform` | `mri_surf2surf` |
//! | `SurfaceSnapshots` | `tksurfer`      |
//! | `SegmentWM`        | `mri_segment`   |
//! | `ProjThresh`       | `proj_thresh`   |
//!
//! [`InterfaceDefinition`]: neurowrap_spec::InterfaceDefinition

pub mod base;
pub mod catalog;
pub mod config;
pub mod freesurfer;
pub mod fsl;

pub use catalog::{CatalogEntry, Package};
pub use config::{ConfigError, EnvConfig};
pub use fsl::FslOutputType;
