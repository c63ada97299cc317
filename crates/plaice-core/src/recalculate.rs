//! Transform-chain normalization.
//!
//! One entry point, [`Engine::recalculate`]: given a node whose transform
//! chain changed, absorb as much of the chain as possible into native
//! geometry attributes (leaves) or push it down into children (groups),
//! leaving at most a residual rotation or an unabsorbable matrix behind.
//! Every observable mutation is recorded in one reversible [`BatchCommand`].

use tracing::trace;

use crate::bounds::{BoundsProvider, GeometricBounds};
use crate::document::{Document, NodeId};
use crate::geom::{self, Transform, is_negligible, point, rotation_about, translation};
use crate::history::{BatchCommand, ChangeAttributesCommand, NodeSnapshot};
use crate::node::{Attr, NodeTag};
use crate::reduce::{self, Reduction};
use crate::remap;
use crate::transform::{TransformList, TransformOp};

/// How a leaf's reduced chain was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LeafOp {
    Translate,
    Scale,
    /// Point/path data is remapped through the raw matrix directly.
    PointRemap,
}

/// How a group's reduced chain was classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GroupOp {
    Translate,
    Scale,
    /// A parent-imposed matrix keeps travelling down to the children.
    Imposition,
}

/// The normalization engine. Stateless apart from the injected bounds
/// collaborator; safe to reuse across documents.
#[derive(Clone, Copy)]
pub struct Engine<'a> {
    bounds: &'a dyn BoundsProvider,
}

impl std::fmt::Debug for Engine<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Engine").finish_non_exhaustive()
    }
}

impl Engine<'static> {
    /// Engine with the built-in geometric bounds.
    pub fn new() -> Self {
        Self {
            bounds: &GeometricBounds,
        }
    }
}

impl Default for Engine<'static> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a> Engine<'a> {
    /// Engine with host-provided bounds (e.g. renderer-measured text).
    pub fn with_bounds(bounds: &'a dyn BoundsProvider) -> Self {
        Self { bounds }
    }

    /// Normalizes `id` in place and returns the reversible record of what
    /// changed, or `None` when nothing observable changed. Recurses into
    /// children whenever a group pushes part of its chain down.
    pub fn recalculate(&self, doc: &mut Document, id: NodeId) -> Option<BatchCommand> {
        self.recalculate_from(doc, id, None)
    }

    /// `start` is the snapshot a recursive caller took before pushing part
    /// of its own chain onto this node; the node's command diffs against it
    /// so the push itself stays undoable, whatever this pass decides.
    fn recalculate_from(
        &self,
        doc: &mut Document,
        id: NodeId,
        start: Option<NodeSnapshot>,
    ) -> Option<BatchCommand> {
        let tag = doc.get(id)?.tag;
        if !tag.is_transformable() {
            return None;
        }
        if reduce::reduce(tag, tf_mut(doc, id)) == Reduction::Stop {
            return stranded_record(doc, id, start);
        }

        let from_parent = start.is_some();
        let initial = match start {
            Some(snapshot) => snapshot,
            None => NodeSnapshot::of(doc.get(id)?),
        };
        let mut batch = BatchCommand::new("Transform");

        let recorded = match tag {
            NodeTag::Group | NodeTag::Anchor => self.flatten_group(doc, id, &mut batch),
            NodeTag::ClipPath => {
                // Clip geometry has no interpretable attribute set; the whole
                // chain always collapses to one matrix.
                let list = tf_mut(doc, id);
                let m = list.to_matrix();
                list.set(vec![TransformOp::Matrix(m)]);
                true
            }
            _ => self.flatten_leaf(doc, id, &mut batch),
        };
        if !recorded {
            return stranded_record(doc, id, from_parent.then_some(initial));
        }

        let after = NodeSnapshot::of(doc.get(id)?);
        batch.add_sub_command(Some(ChangeAttributesCommand::new(id, initial, after).into()));
        if batch.is_empty() { None } else { Some(batch) }
    }

    /// Snapshots a child right before this pass mutates it, then recurses
    /// with that snapshot as the child's recorded starting point.
    fn push_and_recurse(
        &self,
        doc: &mut Document,
        child: NodeId,
        batch: &mut BatchCommand,
        mutate: impl FnOnce(&mut Document),
    ) {
        let Some(node) = doc.get(child) else {
            return;
        };
        let before = NodeSnapshot::of(node);
        mutate(doc);
        let sub = self.recalculate_from(doc, child, Some(before));
        batch.add_sub_command(sub.map(Into::into));
    }

    /// Absorbs a leaf's classified chain into its native attributes.
    fn flatten_leaf(&self, doc: &mut Document, id: NodeId, batch: &mut BatchCommand) -> bool {
        let tag = doc.get(id).expect("node checked at entry").tag;
        let bbox = self.bounds.bounding_box(doc, id);
        // Paths may be unmeasurable (e.g. still inside an unattached defs
        // container) yet still need their chain reduced.
        if bbox.is_none() && tag != NodeTag::Path {
            return false;
        }
        let center = bbox.map(|b| b.center()).unwrap_or_else(|| point(0.0, 0.0));

        let angle = tf(doc, id).rotation_angle();
        let mut oldcenter = center;
        let mut newcenter = center;
        let mut newcenter_with_rotate = center;
        let mut old_rotate: Option<TransformOp> = None;

        if angle != 0.0 {
            let list = tf_mut(doc, id);
            newcenter_with_rotate = list.to_matrix().transform_point(center);
            if let Some(i) = list.find_rotate() {
                old_rotate = Some(list.remove(i));
            }
            newcenter = list.to_matrix().transform_point(center);
            // The rendered center of a matrix-bearing element sits behind
            // that matrix, not at the raw attribute box.
            if let Some(&TransformOp::Matrix(last)) = list.last() {
                oldcenter = last.transform_point(oldcenter);
            }
        }

        let mut op: Option<LeafOp> = None;
        let mut m = Transform::identity();
        {
            let list = tf_mut(doc, id);
            let n = list.len();
            let pivot_triple = n >= 3
                && list.ops()[n - 2].is_scale()
                && list.ops()[n - 3].is_translate()
                && list.ops()[n - 1].is_translate();

            if pivot_triple {
                op = Some(LeafOp::Scale);
                m = list.to_matrix_range(n - 3..n);
                list.remove(n - 1);
                list.remove(n - 2);
                list.remove(n - 3);
            } else if n == 4 && list.ops()[3].is_matrix() {
                // A skewed element mid-resize; fold everything into one
                // matrix and leave the attributes alone.
                op = Some(LeafOp::Scale);
                let full = list.to_matrix();
                list.set(vec![TransformOp::Matrix(full)]);
            } else if list.ops().first().is_some_and(TransformOp::is_translate)
                && (n == 1 || !list.ops()[1].is_scale())
            {
                // Re-express the outer translation in the element's own
                // space: T2 = M⁻¹ · T · M.
                let t = list.ops()[0].matrix();
                let meq = list.to_matrix_range(1..n);
                if let Some(meq_inv) = meq.inverse() {
                    op = Some(LeafOp::Translate);
                    m = geom::multiply(&[meq_inv, t, meq]);
                    list.remove(0);
                }
            } else if list.ops().first().is_some_and(TransformOp::is_matrix)
                || (n == 1 && list.ops()[0].is_scale())
            {
                let full = list.to_matrix();
                if tag.is_point_based() && angle == 0.0 {
                    op = Some(LeafOp::PointRemap);
                    m = full;
                    list.clear();
                } else if is_negligible(full.m12) && is_negligible(full.m21) {
                    op = Some(LeafOp::Scale);
                    m = full;
                    list.remove(0);
                }
            }
        }

        let Some(op) = op else {
            // Nothing absorbable. Re-seat the rotation that was stripped
            // above, centered where the element actually renders.
            if angle != 0.0 {
                tf_mut(doc, id).insert_front(TransformOp::Rotate {
                    angle,
                    cx: newcenter_with_rotate.x,
                    cy: newcenter_with_rotate.y,
                });
            }
            return false;
        };

        trace!(?tag, ?op, "absorbing chain into attributes");
        remap::remap_node(doc.get_mut(id).expect("node checked at entry"), &m);

        match op {
            LeafOp::Translate => {
                if angle != 0.0 {
                    if !tf(doc, id).has_matrix() && tag != NodeTag::Text {
                        newcenter = point(oldcenter.x + m.m31, oldcenter.y + m.m32);
                    }
                    tf_mut(doc, id).insert_front(TransformOp::Rotate {
                        angle,
                        cx: newcenter.x,
                        cy: newcenter.y,
                    });
                }
                // Tspans are not transformable but carry x/y of their own.
                if tag == NodeTag::Text {
                    self.remap_tspans(doc, id, &m, batch);
                }
            }
            LeafOp::Scale => {
                if angle != 0.0 {
                    // [Rold][M][T][S][-T] became [Rold][M]; make it
                    // [Rnew][M][Tr] with Tr = M⁻¹·Rnew⁻¹·Rold·M.
                    let m2 = tf(doc, id).to_matrix();
                    let rold = old_rotate.map(|r| r.matrix()).unwrap_or_else(|| {
                        rotation_about(angle, oldcenter.x, oldcenter.y)
                    });
                    let rnew =
                        rotation_about(angle, newcenter_with_rotate.x, newcenter_with_rotate.y);
                    if let (Some(m2_inv), Some(rnew_inv)) = (m2.inverse(), rnew.inverse()) {
                        let extrat = geom::multiply(&[m2_inv, rnew_inv, rold, m2]);
                        if tag == NodeTag::Text {
                            self.remap_tspans(doc, id, &extrat, batch);
                        }
                        remap::remap_node(doc.get_mut(id).expect("node checked at entry"), &extrat);
                    }
                    tf_mut(doc, id).insert_front(TransformOp::Rotate {
                        angle,
                        cx: newcenter_with_rotate.x,
                        cy: newcenter_with_rotate.y,
                    });
                }
            }
            LeafOp::PointRemap => {}
        }
        true
    }

    /// Pushes a group's classified chain down into its children instead of
    /// touching attributes, recursing the whole engine on each child.
    fn flatten_group(&self, doc: &mut Document, id: NodeId, batch: &mut BatchCommand) -> bool {
        let bbox = self.bounds.bounding_box(doc, id);
        let center = bbox.map(|b| b.center()).unwrap_or_else(|| point(0.0, 0.0));
        let newcenter = tf(doc, id).to_matrix().transform_point(center);
        let gangle = tf(doc, id).rotation_angle();
        let mut oldcenter = center;
        if gangle != 0.0 {
            let list = tf_mut(doc, id);
            if let Some(i) = list.find_rotate() {
                if let TransformOp::Rotate { cx, cy, .. } = list.remove(i) {
                    oldcenter = point(cx, cy);
                }
            }
        }

        let first_op = tf(doc, id).ops().first().copied();
        let n = tf(doc, id).len();
        let children: Vec<NodeId> = doc.children(id).to_vec();

        let mut op: Option<GroupOp> = None;

        let pivot_triple = n >= 3
            && tf(doc, id).ops()[n - 2].is_scale()
            && tf(doc, id).ops()[n - 3].is_translate()
            && tf(doc, id).ops()[n - 1].is_translate();

        if pivot_triple {
            op = Some(GroupOp::Scale);
            let tm = tf(doc, id).ops()[n - 3].matrix();
            let sm = tf(doc, id).ops()[n - 2].matrix();
            let tmn = tf(doc, id).ops()[n - 1].matrix();
            let group_matrix = tf(doc, id).to_matrix();

            for &child in children.iter().rev() {
                let Some(child_node) = doc.get(child) else {
                    continue;
                };
                if !child_node.tag.is_transformable() {
                    continue;
                }
                let child_rotate = match child_node.transform.ops().first() {
                    Some(&TransformOp::Rotate { angle, cx, cy }) => Some((angle, point(cx, cy))),
                    _ => None,
                };
                let m = child_node.transform.to_matrix();
                let rotated_or_skewed = child_node.transform.rotation_angle() != 0.0
                    || child_node.transform.has_matrix();

                let new_ops: Vec<TransformOp> = if rotated_or_skewed {
                    // Pass the equivalent matrix down, re-seating a leading
                    // child rotation in the scaled frame.
                    if let Some((ra, rc)) = child_rotate {
                        let nc = group_matrix.transform_point(rc);
                        let back = rotation_about(-ra, nc.x, nc.y);
                        let e2t = geom::multiply(&[back, tm, sm, tmn, m]);
                        vec![
                            TransformOp::Rotate { angle: ra, cx: nc.x, cy: nc.y },
                            TransformOp::Matrix(e2t),
                        ]
                    } else {
                        vec![TransformOp::Matrix(geom::multiply(&[tm, sm, tmn, m]))]
                    }
                } else {
                    // Slide the scale-about-pivot through the child's own
                    // matrix: [T][S][-T][M] = [M][T2][S2][-T2], with
                    // [-T2] = M⁻¹·[-T]·M.
                    let Some(m_inv) = m.inverse() else {
                        continue;
                    };
                    let t2n = geom::multiply(&[m_inv, tmn, m]);
                    let t2 = translation(-t2n.m31, -t2n.m32);
                    let t2_inv = translation(t2n.m31, t2n.m32);
                    let Some(t2n_inv) = t2n.inverse() else {
                        continue;
                    };
                    let s2 = geom::multiply(&[t2_inv, m_inv, tm, sm, tmn, m, t2n_inv]);
                    let mut ops = child_node.transform.ops().to_vec();
                    ops.push(TransformOp::Translate { tx: t2.m31, ty: t2.m32 });
                    ops.push(TransformOp::Scale { sx: s2.m11, sy: s2.m22 });
                    ops.push(TransformOp::Translate { tx: t2n.m31, ty: t2n.m32 });
                    ops
                };
                self.push_and_recurse(doc, child, batch, |doc| {
                    tf_mut(doc, child).set(new_ops);
                });
            }

            let list = tf_mut(doc, id);
            list.remove(n - 1);
            list.remove(n - 2);
            list.remove(n - 3);
        } else if n >= 3 && tf(doc, id).ops()[n - 1].is_matrix() {
            op = Some(GroupOp::Scale);
            let list = tf_mut(doc, id);
            let m = list.to_matrix();
            list.set(vec![TransformOp::Matrix(m)]);
        } else if first_op.is_some_and(|f| f.is_translate())
            && (n == 1 || !tf(doc, id).ops()[1].is_scale())
        {
            let t_m = tf(doc, id).to_matrix();
            let m_rest = tf(doc, id).to_matrix_range(1..n);
            if let Some(m_inv) = m_rest.inverse() {
                op = Some(GroupOp::Translate);
                let m2 = geom::multiply(&[m_inv, t_m]);
                let (tx, ty) = (m2.m31, m2.m32);
                tf_mut(doc, id).remove(0);

                if tx != 0.0 || ty != 0.0 {
                    for &child in children.iter().rev() {
                        let transformable =
                            doc.get(child).is_some_and(|c| c.tag.is_transformable());
                        if !transformable {
                            continue;
                        }
                        self.push_and_recurse(doc, child, batch, |doc| {
                            tf_mut(doc, child).insert_front(TransformOp::Translate { tx, ty });
                        });

                        // Aliases render the child a second time; cancel the
                        // translation they would otherwise pick up twice.
                        for use_id in doc.referencing_use_nodes(child) {
                            self.push_and_recurse(doc, use_id, batch, |doc| {
                                tf_mut(doc, use_id)
                                    .insert_front(TransformOp::Translate { tx: -tx, ty: -ty });
                            });
                        }
                    }
                }
            }
        }

        if op.is_none() {
            if n == 1 && first_op.is_some_and(|f| f.is_matrix()) && gangle == 0.0 {
                op = Some(GroupOp::Imposition);
                let m = first_op.expect("checked above").matrix();
                for &child in children.iter().rev() {
                    let Some(child_node) = doc.get(child) else {
                        continue;
                    };
                    if !child_node.tag.is_transformable() {
                        continue;
                    }
                    let em = geom::multiply(&[m, child_node.transform.to_matrix()]);
                    // Visually the stroke scales with the imposed matrix;
                    // the rescale happens before the child recurses, so it
                    // lands inside the child's own reversible command.
                    let avg = (em.m11.abs() + em.m22.abs()) / 2.0;
                    let new_stroke = child_node.get_num(Attr::StrokeWidth).map(|sw| sw * avg);
                    self.push_and_recurse(doc, child, batch, |doc| {
                        let node = doc.get_mut(child).expect("child checked above");
                        if let Some(sw) = new_stroke {
                            node.set_num(Attr::StrokeWidth, sw);
                        }
                        node.transform.set(vec![TransformOp::Matrix(em)]);
                    });
                }
                tf_mut(doc, id).clear();
            } else if n > 1 {
                // Nothing matched; concatenate the whole chain and keep
                // pushing it down.
                op = Some(GroupOp::Imposition);
                let m = tf(doc, id).to_matrix();
                for &child in children.iter().rev() {
                    let transformable = doc.get(child).is_some_and(|c| c.tag.is_transformable());
                    if !transformable {
                        continue;
                    }
                    self.push_and_recurse(doc, child, batch, |doc| {
                        tf_mut(doc, child).insert_front(TransformOp::Matrix(m));
                    });
                }
                tf_mut(doc, id).clear();
            } else {
                // Rotation only: re-seat it in the new frame and stop.
                if gangle != 0.0 {
                    tf_mut(doc, id).insert_front(TransformOp::Rotate {
                        angle: gangle,
                        cx: newcenter.x,
                        cy: newcenter.y,
                    });
                }
                return false;
            }
        }

        trace!(?op, "propagated group chain into children");

        match op {
            Some(GroupOp::Translate) => {
                if gangle != 0.0 {
                    // The rotation survives the absorbed translation; its
                    // center moves by the original leading translate.
                    let (tx0, ty0) = match first_op {
                        Some(TransformOp::Translate { tx, ty }) => (tx, ty),
                        _ => (0.0, 0.0),
                    };
                    tf_mut(doc, id).insert_front(TransformOp::Rotate {
                        angle: gangle,
                        cx: oldcenter.x + tx0,
                        cy: oldcenter.y + ty0,
                    });
                }
            }
            Some(GroupOp::Scale) => {
                // [Rold][rest] must render as [Rnew][rest][Tr]:
                // Tr = rest⁻¹·Rnew⁻¹·Rold·rest, pushed down as a translate.
                let m = tf(doc, id).to_matrix();
                let rold = rotation_about(gangle, oldcenter.x, oldcenter.y);
                let rnew = rotation_about(gangle, newcenter.x, newcenter.y);
                if let (Some(m_inv), Some(rnew_inv)) = (m.inverse(), rnew.inverse()) {
                    let extrat = geom::multiply(&[m_inv, rnew_inv, rold, m]);
                    let (tx, ty) = (extrat.m31, extrat.m32);
                    if tx != 0.0 || ty != 0.0 {
                        for &child in children.iter().rev() {
                            let transformable =
                                doc.get(child).is_some_and(|c| c.tag.is_transformable());
                            if !transformable {
                                continue;
                            }
                            self.push_and_recurse(doc, child, batch, |doc| {
                                tf_mut(doc, child)
                                    .insert_front(TransformOp::Translate { tx, ty });
                            });
                        }
                    }
                }
                if gangle != 0.0 {
                    tf_mut(doc, id).insert_front(TransformOp::Rotate {
                        angle: gangle,
                        cx: newcenter.x,
                        cy: newcenter.y,
                    });
                }
            }
            Some(GroupOp::Imposition) | None => {}
        }
        true
    }

    /// Applies `m` to every tspan child's x/y, one reversible command each.
    fn remap_tspans(
        &self,
        doc: &mut Document,
        text: NodeId,
        m: &Transform,
        batch: &mut BatchCommand,
    ) {
        let children: Vec<NodeId> = doc.children(text).to_vec();
        for child in children.into_iter().rev() {
            let before = {
                let Some(node) = doc.get_mut(child) else {
                    continue;
                };
                if node.tag != NodeTag::TSpan {
                    continue;
                }
                let before = NodeSnapshot::of(node);
                remap::remap_node(node, m);
                before
            };
            let after = NodeSnapshot::of(doc.get(child).expect("tspan checked above"));
            batch.add_sub_command(Some(ChangeAttributesCommand::new(child, before, after).into()));
        }
    }
}

/// A recursive caller already mutated this node, but the node itself had
/// nothing further to do; the caller's push must still be undoable.
fn stranded_record(
    doc: &Document,
    id: NodeId,
    start: Option<NodeSnapshot>,
) -> Option<BatchCommand> {
    let before = start?;
    let after = NodeSnapshot::of(doc.get(id)?);
    if before == after {
        return None;
    }
    let mut batch = BatchCommand::new("Transform");
    batch.add_sub_command(Some(ChangeAttributesCommand::new(id, before, after).into()));
    Some(batch)
}

// Node existence is established once at the entry of `recalculate`; the
// tree is never restructured while a pass runs.
fn tf(doc: &Document, id: NodeId) -> &TransformList {
    &doc.get(id).expect("node belongs to the document").transform
}

fn tf_mut(doc: &mut Document, id: NodeId) -> &mut TransformList {
    &mut doc.get_mut(id).expect("node belongs to the document").transform
}
