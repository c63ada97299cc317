#![forbid(unsafe_code)]

//! `plaice` normalizes the geometry of vector-editor scene graphs: after an
//! edit gesture leaves a node with a chain of transform operations, the
//! engine absorbs that chain into native attributes (position, size, path
//! data) or pushes it down into children, and hands back one reversible
//! edit batch for the host's undo stack.
//!
//! ```
//! use plaice::{Attr, Engine, Document, NodeTag, TransformOp};
//!
//! let mut doc = Document::new();
//! let rect = doc.create_node(doc.root(), NodeTag::Rect).unwrap();
//! {
//!     let node = doc.get_mut(rect).unwrap();
//!     node.set_num(Attr::Width, 10.0);
//!     node.set_num(Attr::Height, 10.0);
//!     node.transform.push(TransformOp::Translate { tx: 5.0, ty: 5.0 });
//! }
//!
//! let batch = Engine::new().recalculate(&mut doc, rect).unwrap();
//! assert!(!batch.is_empty());
//! assert_eq!(doc.get(rect).unwrap().num(Attr::X), 5.0);
//! assert!(doc.get(rect).unwrap().transform.is_empty());
//! ```

pub use plaice_core::*;
