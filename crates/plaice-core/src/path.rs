use serde::{Deserialize, Serialize};

use crate::geom::{Point, Rect, Transform, rect};

/// One absolute path segment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum PathSeg {
    Move(Point),
    Line(Point),
    Cubic { c1: Point, c2: Point, to: Point },
    Quad { c: Point, to: Point },
    Arc {
        rx: f64,
        ry: f64,
        /// Degrees, x-axis rotation of the ellipse.
        x_rotation: f64,
        large_arc: bool,
        sweep: bool,
        to: Point,
    },
    Close,
}

/// Path geometry as a list of absolute segments.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PathData(pub Vec<PathSeg>);

impl PathData {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Maps every coordinate through `m`, preserving segment types.
    ///
    /// Arc parameters cannot be mapped exactly through a general affine map
    /// while staying an arc: radii are scaled by the row norms, the axis
    /// rotation is shifted by the matrix rotation, and the sweep direction
    /// flips under a reflecting matrix. Exact for similarity transforms.
    pub fn transform(&mut self, m: &Transform) {
        let sx = (m.m11 * m.m11 + m.m12 * m.m12).sqrt();
        let sy = (m.m21 * m.m21 + m.m22 * m.m22).sqrt();
        let rot = m.m12.atan2(m.m11).to_degrees();
        let reflects = m.determinant() < 0.0;
        for seg in &mut self.0 {
            match seg {
                PathSeg::Move(p) | PathSeg::Line(p) => *p = m.transform_point(*p),
                PathSeg::Cubic { c1, c2, to } => {
                    *c1 = m.transform_point(*c1);
                    *c2 = m.transform_point(*c2);
                    *to = m.transform_point(*to);
                }
                PathSeg::Quad { c, to } => {
                    *c = m.transform_point(*c);
                    *to = m.transform_point(*to);
                }
                PathSeg::Arc { rx, ry, x_rotation, sweep, to, .. } => {
                    *rx *= sx;
                    *ry *= sy;
                    *x_rotation += rot;
                    if reflects {
                        *sweep = !*sweep;
                    }
                    *to = m.transform_point(*to);
                }
                PathSeg::Close => {}
            }
        }
    }

    /// Hull of every on-curve and control point. Not the tight curve bounds.
    pub fn control_box(&self) -> Option<Rect> {
        let mut min: Option<Point> = None;
        let mut max: Option<Point> = None;
        let mut grow = |p: Point| {
            min = Some(match min {
                Some(q) => Point::new(q.x.min(p.x), q.y.min(p.y)),
                None => p,
            });
            max = Some(match max {
                Some(q) => Point::new(q.x.max(p.x), q.y.max(p.y)),
                None => p,
            });
        };
        for seg in &self.0 {
            match *seg {
                PathSeg::Move(p) | PathSeg::Line(p) => grow(p),
                PathSeg::Cubic { c1, c2, to } => {
                    grow(c1);
                    grow(c2);
                    grow(to);
                }
                PathSeg::Quad { c, to } => {
                    grow(c);
                    grow(to);
                }
                PathSeg::Arc { to, .. } => grow(to),
                PathSeg::Close => {}
            }
        }
        let (min, max) = (min?, max?);
        Some(rect(min.x, min.y, max.x - min.x, max.y - min.y))
    }
}
