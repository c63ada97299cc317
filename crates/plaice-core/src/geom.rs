pub type Unit = euclid::UnknownUnit;

pub type Point = euclid::Point2D<f64, Unit>;
pub type Vector = euclid::Vector2D<f64, Unit>;
pub type Size = euclid::Size2D<f64, Unit>;
pub type Rect = euclid::Rect<f64, Unit>;
pub type Transform = euclid::Transform2D<f64, Unit, Unit>;

pub fn point(x: f64, y: f64) -> Point {
    euclid::point2(x, y)
}

pub fn vector(x: f64, y: f64) -> Vector {
    euclid::vec2(x, y)
}

pub fn rect(x: f64, y: f64, w: f64, h: f64) -> Rect {
    euclid::rect(x, y, w, h)
}

/// Threshold below which residual skew terms are treated as zero.
pub const NEGLIGIBLE: f64 = 1e-7;

/// Product snapping threshold; accumulated float dust below this collapses to zero.
const NEAR_ZERO: f64 = 1e-14;

pub fn is_negligible(value: f64) -> bool {
    value.abs() < NEGLIGIBLE
}

/// Builds a transform from SVG `matrix(a b c d e f)` components.
pub fn matrix(a: f64, b: f64, c: f64, d: f64, e: f64, f: f64) -> Transform {
    Transform::new(a, b, c, d, e, f)
}

pub fn translation(tx: f64, ty: f64) -> Transform {
    Transform::translation(tx, ty)
}

pub fn scaling(sx: f64, sy: f64) -> Transform {
    Transform::scale(sx, sy)
}

/// Rotation by `angle` degrees about the point (`cx`, `cy`).
pub fn rotation_about(angle: f64, cx: f64, cy: f64) -> Transform {
    Transform::translation(-cx, -cy)
        .then(&Transform::rotation(euclid::Angle::degrees(angle)))
        .then(&Transform::translation(cx, cy))
}

pub fn is_identity(m: &Transform) -> bool {
    m.m11 == 1.0
        && m.m12 == 0.0
        && m.m21 == 0.0
        && m.m22 == 1.0
        && m.m31 == 0.0
        && m.m32 == 0.0
}

/// Multiplies transforms in SVG composition order: `multiply(&[a, b, c])` is
/// the matrix that applies `c` to a point first and `a` last. Components that
/// come out as float dust are snapped to zero.
pub fn multiply(factors: &[Transform]) -> Transform {
    let Some((last, rest)) = factors.split_last() else {
        return Transform::identity();
    };
    let mut m = *last;
    for f in rest.iter().rev() {
        m = m.then(f);
    }
    snap(m)
}

fn snap(mut m: Transform) -> Transform {
    for v in [
        &mut m.m11, &mut m.m12, &mut m.m21, &mut m.m22, &mut m.m31, &mut m.m32,
    ] {
        if v.abs() < NEAR_ZERO {
            *v = 0.0;
        }
    }
    m
}

pub fn transform_point(x: f64, y: f64, m: &Transform) -> Point {
    m.transform_point(point(x, y))
}

/// Axis-aligned box of `r` mapped through `m` (the hull of its four corners).
pub fn transformed_box(r: &Rect, m: &Transform) -> Rect {
    let corners = [
        transform_point(r.min_x(), r.min_y(), m),
        transform_point(r.max_x(), r.min_y(), m),
        transform_point(r.min_x(), r.max_y(), m),
        transform_point(r.max_x(), r.max_y(), m),
    ];
    let mut min = corners[0];
    let mut max = corners[0];
    for c in &corners[1..] {
        min.x = min.x.min(c.x);
        min.y = min.y.min(c.y);
        max.x = max.x.max(c.x);
        max.y = max.y.max(c.y);
    }
    rect(min.x, min.y, max.x - min.x, max.y - min.y)
}
