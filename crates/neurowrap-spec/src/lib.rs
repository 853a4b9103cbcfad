//! Declarative command-line synthesis for wrapped tools.
//!
//! An external tool is described by two registries of [`FieldSpec`]s, one
//! for inputs and one for outputs. A [`SpecInstance`] holds the values a
//! caller assigns; [`CommandRenderer`] turns it into a token sequence and
//! [`OutputPathPredictor`] computes the paths the tool will write.
//! [`Interface`] ties these together for one base command.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use neurowrap_spec::{FieldKind, FieldSpec, Interface, InterfaceDefinition};
//!
//! let definition = InterfaceDefinition::builder("SegmentWM", "mri_segment")
//!     .input(FieldSpec::new("in_file", FieldKind::File).argstr("%s").position(-2).mandatory())
//!     .input(FieldSpec::new("out_file", FieldKind::File).argstr("%s").position(-1).mandatory())
//!     .output(FieldSpec::new("out_file", FieldKind::File))
//!     .build()
//!     .unwrap();
//!
//! let mut segment = Interface::new(Arc::new(definition), "/work");
//! segment.set("in_file", "a.nii").unwrap();
//! segment.set("out_file", "b.mgz").unwrap();
//! assert_eq!(segment.cmdline().unwrap(), "mri_segment a.nii b.mgz");
//! ```
//!
//! # Modules
//!
//! - [`value`]: field kinds, values and constraints
//! - [`argstr`]: printf-style argument templates
//! - [`naming`]: file name helpers and name templates
//! - [`field`]: field specifications
//! - [`registry`]: field registries
//! - [`instance`]: field values and default resolution
//! - [`render`]: command-line rendering
//! - [`predict`]: output path prediction
//! - [`hash`]: call signatures
//! - [`interface`]: interfaces and their states
//! - [`error`]: error types

pub mod argstr;
pub mod error;
pub mod field;
pub mod hash;
pub mod instance;
pub mod interface;
pub mod naming;
pub mod predict;
pub mod registry;
pub mod render;
pub mod value;

pub use argstr::ArgTemplate;
pub use error::{ErrorCode, SpecError, UnmetRequirement};
pub use field::{
    ArgRule, DefaultPolicy, DeriveFn, Derivation, FieldSpec, FieldSummary, FormatFn,
};
pub use hash::call_signature;
pub use instance::{Resolver, SpecInstance};
pub use interface::{
    Interface, InterfaceDefinition, InterfaceDefinitionBuilder, InterfaceState, InterfaceSummary,
};
pub use naming::{fname_presuffix, split_filename, NameTemplate};
pub use predict::{OutputPathPredictor, PredictedPath};
pub use registry::{RegistryBuilder, SpecRegistry};
pub use render::CommandRenderer;
pub use value::{Constraint, FieldKind, FieldValue};
