use serde::{Deserialize, Serialize};

use crate::geom::{self, Transform};

/// One entry of a node's transform chain.
///
/// Chains apply first-entry-outermost: `point' = op1(op2(.. opN(point)))`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum TransformOp {
    Translate { tx: f64, ty: f64 },
    Scale { sx: f64, sy: f64 },
    /// Rotation in degrees about (`cx`, `cy`) in the node's local space.
    Rotate { angle: f64, cx: f64, cy: f64 },
    Matrix(Transform),
}

impl TransformOp {
    pub fn matrix(&self) -> Transform {
        match *self {
            TransformOp::Translate { tx, ty } => geom::translation(tx, ty),
            TransformOp::Scale { sx, sy } => geom::scaling(sx, sy),
            TransformOp::Rotate { angle, cx, cy } => geom::rotation_about(angle, cx, cy),
            TransformOp::Matrix(m) => m,
        }
    }

    pub fn is_translate(&self) -> bool {
        matches!(self, TransformOp::Translate { .. })
    }

    pub fn is_scale(&self) -> bool {
        matches!(self, TransformOp::Scale { .. })
    }

    pub fn is_rotate(&self) -> bool {
        matches!(self, TransformOp::Rotate { .. })
    }

    pub fn is_matrix(&self) -> bool {
        matches!(self, TransformOp::Matrix(_))
    }
}

/// Ordered transform chain of a scene node.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TransformList(Vec<TransformOp>);

impl TransformList {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&TransformOp> {
        self.0.get(index)
    }

    pub fn last(&self) -> Option<&TransformOp> {
        self.0.last()
    }

    pub fn ops(&self) -> &[TransformOp] {
        &self.0
    }

    pub fn push(&mut self, op: TransformOp) {
        self.0.push(op);
    }

    pub fn insert(&mut self, index: usize, op: TransformOp) {
        self.0.insert(index, op);
    }

    /// Inserts at the front (the outermost position).
    pub fn insert_front(&mut self, op: TransformOp) {
        self.0.insert(0, op);
    }

    pub fn remove(&mut self, index: usize) -> TransformOp {
        self.0.remove(index)
    }

    pub fn replace(&mut self, index: usize, op: TransformOp) {
        self.0[index] = op;
    }

    pub fn clear(&mut self) {
        self.0.clear();
    }

    pub fn set(&mut self, ops: Vec<TransformOp>) {
        self.0 = ops;
    }

    /// The single matrix equivalent of the whole chain (identity when empty).
    pub fn to_matrix(&self) -> Transform {
        self.to_matrix_range(0..self.0.len())
    }

    /// Matrix equivalent of `ops()[range]`.
    pub fn to_matrix_range(&self, range: std::ops::Range<usize>) -> Transform {
        let factors: Vec<Transform> = self.0[range].iter().map(TransformOp::matrix).collect();
        geom::multiply(&factors)
    }

    /// Angle of the first `Rotate` entry, in degrees; 0 when none is present.
    pub fn rotation_angle(&self) -> f64 {
        self.0
            .iter()
            .find_map(|op| match op {
                TransformOp::Rotate { angle, .. } => Some(*angle),
                _ => None,
            })
            .unwrap_or(0.0)
    }

    /// Index of the first `Rotate` entry.
    pub fn find_rotate(&self) -> Option<usize> {
        self.0.iter().position(TransformOp::is_rotate)
    }

    pub fn has_matrix(&self) -> bool {
        self.0.iter().any(TransformOp::is_matrix)
    }
}

impl From<Vec<TransformOp>> for TransformList {
    fn from(ops: Vec<TransformOp>) -> Self {
        Self(ops)
    }
}
