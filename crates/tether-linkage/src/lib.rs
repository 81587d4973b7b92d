//! Partial linkage for the Tether IR.
//!
//! A library compiled against one version of its dependencies may be linked
//! against another, where some declarations it references were removed,
//! changed incompatibly or made private. Instead of refusing to link, this
//! crate rewrites the affected parts of the tree so that they throw a linkage
//! error at run time, with a message naming what went wrong.
//!
//! The pass is made of:
//! - [`ClassifierExplorer`]: memoized analysis of which classifiers are
//!   missing or transitively broken,
//! - [`LinkageCase`] and [`render`]: the reasons for a rewrite and their
//!   messages,
//! - [`PartiallyLinkedTreePatcher`]: the two sweeps rewriting declarations
//!   and expressions in place.

mod case;
mod config;
mod explorer;
mod location;
mod logger;
mod marker;
mod patcher;
mod render;
mod scan;

pub use case::LinkageCase;
pub use config::{
    ConfigError, PartialLinkageConfig, PartialLinkageConfigBuilder, PartialLinkageLogLevel,
    PartialLinkageMode,
};
pub use explorer::{ClassifierExplorer, LinkageStatus, Partially};
pub use location::{declaration_location, expression_location, file_location};
pub use logger::{
    CollectingLogger, Location, MessageLogger, Report, Severity, TracingLogger, UNDEFINED_COLUMN,
    UNDEFINED_LINE,
};
pub use marker::{precalculated_cause, to_marker_type_or_none};
pub use patcher::{module_roots, patch_module, PartiallyLinkedTreePatcher, PatchSummary, Root};
pub use render::{declaration_kind, render, DeclarationKind, ExpressionKind};
pub use scan::find_unlinked_symbols;
