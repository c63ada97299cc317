use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::document::NodeId;
use crate::geom::Point;
use crate::path::PathData;
use crate::transform::TransformList;

/// Closed set of scene-node kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NodeTag {
    Group,
    /// Group-like link wrapper.
    Anchor,
    ClipPath,
    Line,
    Circle,
    Ellipse,
    Rect,
    Image,
    ForeignObject,
    Use,
    Text,
    TSpan,
    Polygon,
    Polyline,
    Path,
}

impl NodeTag {
    /// Tags whose nodes may own children.
    pub fn is_container(self) -> bool {
        matches!(
            self,
            NodeTag::Group | NodeTag::Anchor | NodeTag::ClipPath | NodeTag::Text
        )
    }

    /// Tags that carry a transform chain of their own. `tspan` does not; group
    /// propagation skips such children the way it skips defs/metadata nodes.
    pub fn is_transformable(self) -> bool {
        !matches!(self, NodeTag::TSpan)
    }

    /// Tags whose geometry is raw point/path data rather than box semantics.
    pub fn is_point_based(self) -> bool {
        matches!(
            self,
            NodeTag::Line | NodeTag::Polyline | NodeTag::Polygon | NodeTag::Path
        )
    }

    /// The native geometry fields of this tag.
    pub fn geometry_attrs(self) -> &'static [Attr] {
        match self {
            NodeTag::Line => &[Attr::X1, Attr::Y1, Attr::X2, Attr::Y2],
            NodeTag::Circle => &[Attr::Cx, Attr::Cy, Attr::R],
            NodeTag::Ellipse => &[Attr::Cx, Attr::Cy, Attr::Rx, Attr::Ry],
            NodeTag::Rect | NodeTag::Image | NodeTag::ForeignObject => {
                &[Attr::X, Attr::Y, Attr::Width, Attr::Height]
            }
            NodeTag::Use | NodeTag::Text | NodeTag::TSpan => &[Attr::X, Attr::Y],
            NodeTag::Polygon => &[Attr::Points, Attr::Cx, Attr::Cy],
            NodeTag::Polyline => &[Attr::Points],
            NodeTag::Path => &[Attr::D],
            NodeTag::Group | NodeTag::Anchor | NodeTag::ClipPath => &[],
        }
    }
}

/// Attribute keys. Geometry keys are tag-dependent (see
/// [`NodeTag::geometry_attrs`]); `stroke-width` is presentation and only ever
/// rescaled, never remapped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attr {
    X,
    Y,
    Width,
    Height,
    Cx,
    Cy,
    R,
    Rx,
    Ry,
    X1,
    Y1,
    X2,
    Y2,
    Points,
    D,
    #[serde(rename = "stroke-width")]
    StrokeWidth,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Number(f64),
    Points(Vec<Point>),
    Path(PathData),
}

impl AttrValue {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            AttrValue::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_points(&self) -> Option<&[Point]> {
        match self {
            AttrValue::Points(p) => Some(p),
            _ => None,
        }
    }

    pub fn as_path(&self) -> Option<&PathData> {
        match self {
            AttrValue::Path(p) => Some(p),
            _ => None,
        }
    }
}

pub type AttrMap = IndexMap<Attr, AttrValue>;

/// A node of the scene tree. Attributes are always local-space, i.e. the
/// space before the node's own transform chain applies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SceneNode {
    pub tag: NodeTag,
    pub attrs: AttrMap,
    pub transform: TransformList,
    /// Alias target for `use` nodes. A weak relation: never traversed as a
    /// child edge.
    pub href: Option<NodeId>,
    pub(crate) parent: Option<NodeId>,
    pub(crate) children: Vec<NodeId>,
}

impl SceneNode {
    pub fn new(tag: NodeTag) -> Self {
        Self {
            tag,
            attrs: AttrMap::new(),
            transform: TransformList::new(),
            href: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    /// Numeric attribute, defaulting to 0 like an unset SVG geometry field.
    pub fn num(&self, attr: Attr) -> f64 {
        self.attrs.get(&attr).and_then(AttrValue::as_number).unwrap_or(0.0)
    }

    pub fn get_num(&self, attr: Attr) -> Option<f64> {
        self.attrs.get(&attr).and_then(AttrValue::as_number)
    }

    pub fn set_num(&mut self, attr: Attr, value: f64) {
        self.attrs.insert(attr, AttrValue::Number(value));
    }

    pub fn points(&self) -> Option<&[Point]> {
        self.attrs.get(&Attr::Points).and_then(AttrValue::as_points)
    }

    pub fn set_points(&mut self, points: Vec<Point>) {
        self.attrs.insert(Attr::Points, AttrValue::Points(points));
    }

    pub fn path(&self) -> Option<&PathData> {
        self.attrs.get(&Attr::D).and_then(AttrValue::as_path)
    }

    pub fn set_path(&mut self, path: PathData) {
        self.attrs.insert(Attr::D, AttrValue::Path(path));
    }
}
