#![forbid(unsafe_code)]

//! Scene-graph geometry normalization (headless).
//!
//! An interactive vector editor layers transient transform operations on a
//! node while a drag/resize/rotate gesture runs; persisted documents and
//! anything that reads `x`/`y`/`width`/`height` need those values in the
//! attributes themselves. This crate rewrites a node (and, where needed,
//! its descendants) so the same rendered geometry is expressed with as few
//! residual transform operations as possible.
//!
//! Design goals:
//! - deterministic, in-place tree edits with one reversible batch per call
//! - no fatal paths: degenerate input degrades to "leave unchanged"
//! - host collaborators (bounding boxes) injected, never assumed

pub mod bounds;
pub mod document;
pub mod error;
pub mod geom;
pub mod history;
pub mod node;
pub mod path;
pub mod recalculate;
mod reduce;
mod remap;
pub mod transform;

pub use bounds::{BoundsProvider, GeometricBounds};
pub use document::{Document, NodeId};
pub use error::{Error, Result};
pub use history::{BatchCommand, ChangeAttributesCommand, Command, NodeSnapshot};
pub use node::{Attr, AttrMap, AttrValue, NodeTag, SceneNode};
pub use path::{PathData, PathSeg};
pub use recalculate::Engine;
pub use transform::{TransformList, TransformOp};
