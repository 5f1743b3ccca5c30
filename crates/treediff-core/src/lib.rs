//! Structural diff engine for keyed trees and generic JSON documents.
//!
//! `treediff-core` canonicalizes JSON or YAML into [`Node`] values and
//! compares them in one of two modes:
//!
//! * [`compare_keyed_trees`] correlates siblings by an identity field and
//!   reports additions, deletions, field modifications and moves through a
//!   nested children field;
//! * [`compare_values`] walks arbitrary documents structurally.
//!
//! Both produce a pruned [`Diff`] tree whose nodes carry machine, readable and
//! business paths.
//!
//! ```
//! use treediff_core::{diff::ChangeKind, DiffOptions, Node};
//!
//! fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let options = DiffOptions::default().with_label_field("name")?;
//!     let old = Node::from_json_str(r#"[{"id":1,"name":"Home"},{"id":2,"name":"About"}]"#)?;
//!     let new = Node::from_json_str(r#"[{"id":2,"name":"About us"},{"id":1,"name":"Home"}]"#)?;
//!
//!     let diff = old.diff_keyed(&new, &options);
//!     let about = &diff.nodes()[0];
//!     assert_eq!(about.kind, ChangeKind::Modified);
//!     assert_eq!(about.business_path, "About us");
//!     assert_eq!(diff.summary().changes(), 2);
//!
//!     let base = Node::from_json_str(r#"{"name":"treediff","version":1}"#)?;
//!     let target = Node::from_json_str(r#"{"name":"treediff","version":2}"#)?;
//!     let generic = base.diff(&target, &DiffOptions::default());
//!     assert_eq!(base.apply_diff(&generic)?, target);
//!     Ok(())
//! }
//! ```
#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod diff;
mod error;
mod ids;
mod node;
mod number;
mod options;
mod patch;
mod validate;

pub use diff::{
    compare_keyed_trees, compare_values, compare_values_with, try_compare_keyed_trees, Diff,
    DiffNode, DiffSummary, Path, PathSegment,
};
pub use error::{CanonicalizeError, OptionsError, PathError, ValidationError};
pub use ids::{IdSource, NodeId, NodeIds};
pub use node::Node;
pub use number::Number;
pub use options::{Correlation, DiffOptions};
pub use patch::PatchError;
pub use validate::validate_identities;

/// Returns the semantic version of the `treediff-core` crate.
///
/// ```
/// assert!(!treediff_core::version().is_empty());
/// ```
#[must_use]
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
