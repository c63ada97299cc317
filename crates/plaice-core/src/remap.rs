use crate::geom::{Transform, transform_point};
use crate::node::{Attr, AttrValue, NodeTag, SceneNode};

/// Rewrites a node's native geometry attributes through `m`, so that the
/// matrix can be dropped from its transform chain. Tag-dependent: box tags
/// scale width/height by the diagonal, point tags remap raw coordinates.
pub(crate) fn remap_node(node: &mut SceneNode, m: &Transform) {
    let (a, d) = (m.m11, m.m22);
    match node.tag {
        NodeTag::Line => {
            let p1 = transform_point(node.num(Attr::X1), node.num(Attr::Y1), m);
            let p2 = transform_point(node.num(Attr::X2), node.num(Attr::Y2), m);
            node.set_num(Attr::X1, p1.x);
            node.set_num(Attr::Y1, p1.y);
            node.set_num(Attr::X2, p2.x);
            node.set_num(Attr::Y2, p2.y);
        }
        NodeTag::Circle => {
            let c = transform_point(node.num(Attr::Cx), node.num(Attr::Cy), m);
            node.set_num(Attr::Cx, c.x);
            node.set_num(Attr::Cy, c.y);
            // Non-uniform scale cannot stay a circle; keep the smaller radius.
            let r = node.num(Attr::R);
            node.set_num(Attr::R, (r * a.abs()).min(r * d.abs()));
        }
        NodeTag::Ellipse => {
            let c = transform_point(node.num(Attr::Cx), node.num(Attr::Cy), m);
            node.set_num(Attr::Cx, c.x);
            node.set_num(Attr::Cy, c.y);
            node.set_num(Attr::Rx, node.num(Attr::Rx) * a.abs());
            node.set_num(Attr::Ry, node.num(Attr::Ry) * d.abs());
        }
        NodeTag::Rect | NodeTag::Image | NodeTag::ForeignObject => {
            let p = transform_point(node.num(Attr::X), node.num(Attr::Y), m);
            let mut x = p.x;
            let mut y = p.y;
            let mut w = node.num(Attr::Width) * a;
            let mut h = node.num(Attr::Height) * d;
            // A mirroring scale flips the box over its origin corner.
            if w < 0.0 {
                x += w;
                w = -w;
            }
            if h < 0.0 {
                y += h;
                h = -h;
            }
            node.set_num(Attr::X, x);
            node.set_num(Attr::Y, y);
            node.set_num(Attr::Width, w);
            node.set_num(Attr::Height, h);
        }
        NodeTag::Use | NodeTag::Text | NodeTag::TSpan => {
            let p = transform_point(node.num(Attr::X), node.num(Attr::Y), m);
            node.set_num(Attr::X, p.x);
            node.set_num(Attr::Y, p.y);
        }
        NodeTag::Polygon | NodeTag::Polyline => {
            if let Some(points) = node.points() {
                let mapped = points.iter().map(|p| m.transform_point(*p)).collect();
                node.attrs.insert(Attr::Points, AttrValue::Points(mapped));
            }
            if node.tag == NodeTag::Polygon {
                if let (Some(cx), Some(cy)) = (node.get_num(Attr::Cx), node.get_num(Attr::Cy)) {
                    let c = transform_point(cx, cy, m);
                    node.set_num(Attr::Cx, c.x);
                    node.set_num(Attr::Cy, c.y);
                }
            }
        }
        NodeTag::Path => {
            if let Some(path) = node.path() {
                let mut path = path.clone();
                path.transform(m);
                node.set_path(path);
            }
        }
        // Containers carry no native geometry to remap.
        NodeTag::Group | NodeTag::Anchor | NodeTag::ClipPath => {}
    }
}
