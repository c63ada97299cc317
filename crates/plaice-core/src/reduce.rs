use tracing::trace;

use crate::geom::{self, is_negligible};
use crate::node::NodeTag;
use crate::transform::{TransformList, TransformOp};

/// Outcome of the pre-classification reduction pass.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Reduction {
    /// The chain still carries something worth classifying.
    Proceed,
    /// Fully reduced (empty, a lone residual rotation, or an
    /// unabsorbable matrix); the caller reports no change.
    Stop,
}

/// Strips no-op entries and merges redundant matrix entries in place.
pub(crate) fn reduce(tag: NodeTag, list: &mut TransformList) -> Reduction {
    let before = list.len();

    // Remove the entries that do nothing, last to first.
    let mut k = list.len();
    while k > 0 {
        k -= 1;
        match list.ops()[k] {
            TransformOp::Matrix(m) => {
                if geom::is_identity(&m) {
                    list.remove(k);
                } else if m.m11 == 1.0
                    && m.m22 == 1.0
                    && is_negligible(m.m12)
                    && is_negligible(m.m21)
                {
                    list.replace(k, TransformOp::Translate { tx: m.m31, ty: m.m32 });
                }
            }
            TransformOp::Rotate { angle, .. } if angle == 0.0 => {
                list.remove(k);
            }
            _ => {}
        }
    }

    if before != list.len() {
        trace!(removed = before - list.len(), "dropped no-op chain entries");
    }

    // A lone residual rotation is already as reduced as it gets. Text and
    // `use` nodes still proceed: their x/y can absorb more.
    if tag != NodeTag::Text
        && tag != NodeTag::Use
        && list.len() == 1
        && list.rotation_angle() != 0.0
    {
        return Reduction::Stop;
    }

    if list.is_empty() {
        return Reduction::Stop;
    }

    // A pair of adjacent matrices at the head collapses into one; the
    // earlier entry is the left factor.
    let lead = list.ops().iter().take_while(|op| op.is_matrix()).count();
    if lead == 2 {
        let merged = geom::multiply(&[list.ops()[0].matrix(), list.ops()[1].matrix()]);
        list.remove(1);
        list.replace(0, TransformOp::Matrix(merged));
    }

    // A trailing [Matrix][Translate] collapses into one matrix.
    let k = list.len();
    if k >= 2 && list.ops()[k - 2].is_matrix() && list.ops()[k - 1].is_translate() {
        let merged = geom::multiply(&[list.ops()[k - 2].matrix(), list.ops()[k - 1].matrix()]);
        list.remove(k - 2);
        list.remove(k - 2);
        list.push(TransformOp::Matrix(merged));
    }

    // Box-semantics tags cannot absorb a skewed matrix into attributes.
    let keeps_matrix = matches!(
        tag,
        NodeTag::Line | NodeTag::Polyline | NodeTag::Polygon | NodeTag::Path | NodeTag::Group
    );
    if !keeps_matrix && list.len() == 1 {
        if let TransformOp::Matrix(m) = list.ops()[0] {
            if !is_negligible(m.m12) || !is_negligible(m.m21) {
                return Reduction::Stop;
            }
        }
    }

    Reduction::Proceed
}
