use rustc_hash::FxHashSet;

use crate::document::{Document, NodeId};
use crate::geom::{Rect, rect, transformed_box};
use crate::node::{Attr, NodeTag};

/// Local-space bounding boxes, as the host renderer defines them.
///
/// `None` is a legitimate answer for nodes that cannot be measured yet
/// (e.g. geometry still inside an unattached definitions container); the
/// engine tolerates it for `path` nodes and otherwise treats it as
/// nothing-to-do.
pub trait BoundsProvider {
    fn bounding_box(&self, doc: &Document, id: NodeId) -> Option<Rect>;
}

/// Pure-geometry bounds: exact for shapes, control-point hulls for paths,
/// zero-size anchors for text (real text extents are a renderer concern).
#[derive(Debug, Default, Clone, Copy)]
pub struct GeometricBounds;

impl BoundsProvider for GeometricBounds {
    fn bounding_box(&self, doc: &Document, id: NodeId) -> Option<Rect> {
        self.measure(doc, id, &mut FxHashSet::default())
    }
}

impl GeometricBounds {
    fn measure(&self, doc: &Document, id: NodeId, visiting: &mut FxHashSet<NodeId>) -> Option<Rect> {
        // Alias chains may be cyclic; a node being measured twice on one
        // stack has no finite box.
        if !visiting.insert(id) {
            return None;
        }
        let result = self.measure_inner(doc, id, visiting);
        visiting.remove(&id);
        result
    }

    fn measure_inner(
        &self,
        doc: &Document,
        id: NodeId,
        visiting: &mut FxHashSet<NodeId>,
    ) -> Option<Rect> {
        let node = doc.get(id)?;
        match node.tag {
            NodeTag::Rect | NodeTag::Image | NodeTag::ForeignObject => Some(rect(
                node.num(Attr::X),
                node.num(Attr::Y),
                node.num(Attr::Width),
                node.num(Attr::Height),
            )),
            NodeTag::Circle => {
                let r = node.num(Attr::R);
                Some(rect(
                    node.num(Attr::Cx) - r,
                    node.num(Attr::Cy) - r,
                    2.0 * r,
                    2.0 * r,
                ))
            }
            NodeTag::Ellipse => {
                let (rx, ry) = (node.num(Attr::Rx), node.num(Attr::Ry));
                Some(rect(
                    node.num(Attr::Cx) - rx,
                    node.num(Attr::Cy) - ry,
                    2.0 * rx,
                    2.0 * ry,
                ))
            }
            NodeTag::Line => {
                let (x1, y1) = (node.num(Attr::X1), node.num(Attr::Y1));
                let (x2, y2) = (node.num(Attr::X2), node.num(Attr::Y2));
                Some(rect(
                    x1.min(x2),
                    y1.min(y2),
                    (x2 - x1).abs(),
                    (y2 - y1).abs(),
                ))
            }
            NodeTag::Polygon | NodeTag::Polyline => {
                let points = node.points()?;
                let first = points.first()?;
                let (mut min, mut max) = (*first, *first);
                for p in &points[1..] {
                    min.x = min.x.min(p.x);
                    min.y = min.y.min(p.y);
                    max.x = max.x.max(p.x);
                    max.y = max.y.max(p.y);
                }
                Some(rect(min.x, min.y, max.x - min.x, max.y - min.y))
            }
            NodeTag::Path => node.path().and_then(|p| p.control_box()),
            NodeTag::Text | NodeTag::TSpan => {
                Some(rect(node.num(Attr::X), node.num(Attr::Y), 0.0, 0.0))
            }
            NodeTag::Use => {
                let target = node.href?;
                let tb = self.measure(doc, target, visiting)?;
                let chain = doc.get(target)?.transform.to_matrix();
                let tb = transformed_box(&tb, &chain);
                Some(tb.translate(crate::geom::vector(
                    node.num(Attr::X),
                    node.num(Attr::Y),
                )))
            }
            NodeTag::Group | NodeTag::Anchor | NodeTag::ClipPath => {
                let mut acc: Option<Rect> = None;
                for &child in node.children() {
                    let Some(cb) = self.measure(doc, child, visiting) else {
                        continue;
                    };
                    let chain = doc.get(child).map(|n| n.transform.to_matrix());
                    let cb = match chain {
                        Some(m) => transformed_box(&cb, &m),
                        None => cb,
                    };
                    acc = Some(match acc {
                        Some(u) => u.union(&cb),
                        None => cb,
                    });
                }
                acc
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geom::point;
    use crate::transform::TransformOp;

    #[test]
    fn rect_box_is_its_attributes() {
        let mut doc = Document::new();
        let r = doc.create_node(doc.root(), NodeTag::Rect).unwrap();
        {
            let node = doc.get_mut(r).unwrap();
            node.set_num(Attr::X, 2.0);
            node.set_num(Attr::Y, 3.0);
            node.set_num(Attr::Width, 10.0);
            node.set_num(Attr::Height, 20.0);
        }
        let b = GeometricBounds.bounding_box(&doc, r).unwrap();
        assert_eq!((b.min_x(), b.min_y(), b.width(), b.height()), (2.0, 3.0, 10.0, 20.0));
    }

    #[test]
    fn group_box_unions_transformed_children() {
        let mut doc = Document::new();
        let g = doc.create_node(doc.root(), NodeTag::Group).unwrap();
        let a = doc.create_node(g, NodeTag::Circle).unwrap();
        {
            let node = doc.get_mut(a).unwrap();
            node.set_num(Attr::R, 1.0);
            node.transform.push(TransformOp::Translate { tx: 10.0, ty: 0.0 });
        }
        let b = doc.create_node(g, NodeTag::Circle).unwrap();
        doc.get_mut(b).unwrap().set_num(Attr::R, 1.0);

        let bb = GeometricBounds.bounding_box(&doc, g).unwrap();
        assert_eq!((bb.min_x(), bb.max_x()), (-1.0, 11.0));
    }

    #[test]
    fn use_box_offsets_the_target() {
        let mut doc = Document::new();
        let r = doc.create_node(doc.root(), NodeTag::Rect).unwrap();
        {
            let node = doc.get_mut(r).unwrap();
            node.set_num(Attr::Width, 4.0);
            node.set_num(Attr::Height, 4.0);
        }
        let u = doc.create_node(doc.root(), NodeTag::Use).unwrap();
        doc.set_use_target(u, r).unwrap();
        doc.get_mut(u).unwrap().set_num(Attr::X, 100.0);

        let b = GeometricBounds.bounding_box(&doc, u).unwrap();
        assert_eq!((b.min_x(), b.min_y()), (100.0, 0.0));
    }

    #[test]
    fn unmeasurable_nodes_yield_none() {
        let mut doc = Document::new();
        let p = doc.create_node(doc.root(), NodeTag::Path).unwrap();
        assert!(GeometricBounds.bounding_box(&doc, p).is_none());

        let u = doc.create_node(doc.root(), NodeTag::Use).unwrap();
        assert!(GeometricBounds.bounding_box(&doc, u).is_none());
    }

    #[test]
    fn text_box_is_a_zero_size_anchor() {
        let mut doc = Document::new();
        let t = doc.create_node(doc.root(), NodeTag::Text).unwrap();
        let node = doc.get_mut(t).unwrap();
        node.set_num(Attr::X, 5.0);
        node.set_num(Attr::Y, 6.0);
        let b = GeometricBounds.bounding_box(&doc, t).unwrap();
        assert_eq!((b.min_x(), b.min_y(), b.width(), b.height()), (5.0, 6.0, 0.0, 0.0));
    }

    #[test]
    fn polyline_with_points_measures_their_hull() {
        let mut doc = Document::new();
        let p = doc.create_node(doc.root(), NodeTag::Polyline).unwrap();
        doc.get_mut(p)
            .unwrap()
            .set_points(vec![point(1.0, 1.0), point(4.0, -2.0), point(2.0, 7.0)]);
        let b = GeometricBounds.bounding_box(&doc, p).unwrap();
        assert_eq!((b.min_x(), b.min_y(), b.max_x(), b.max_y()), (1.0, -2.0, 4.0, 7.0));
    }
}
