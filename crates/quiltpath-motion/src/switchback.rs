//! Switchback composition: sew a whole layout as one continuous path.
//!
//! Rows are sewn top to bottom. Even rows run in column order, odd rows
//! run backwards with each copy traversed in reverse, so the machine
//! snakes across the quilt without lifting the needle between rows.
//! Consecutive copies are joined by a stitched connector.

use std::collections::BTreeMap;

use crate::layout::{LayoutInstance, PantographLayout, layout};
use crate::types::{MotionError, MotionPath, Segment, TOLERANCE_MM};

/// Reverse a run of segments so it is traversed end to start.
fn reverse_run(segments: &mut [Segment]) {
    segments.reverse();
    for segment in segments {
        *segment = segment.reversed();
    }
}

/// Join every instance into one continuous path in switchback order.
///
/// The result has one segment per materialized base segment plus
/// `instances.len() - 1` stitched connectors. Travel segments inside the
/// base pattern stay travel segments.
///
/// # Errors
///
/// Returns [`MotionError::EmptyPattern`] if `instances` is empty or
/// `base` has no length to place.
pub fn compose_switchback(
    base: &MotionPath,
    instances: &[LayoutInstance],
) -> Result<MotionPath, MotionError> {
    if instances.is_empty() || base.length() <= TOLERANCE_MM {
        return Err(MotionError::EmptyPattern);
    }

    let mut rows: BTreeMap<u32, Vec<&LayoutInstance>> = BTreeMap::new();
    for instance in instances {
        rows.entry(instance.row).or_default().push(instance);
    }

    let mut segments: Vec<Segment> =
        Vec::with_capacity(instances.len() * (base.len() + 1));
    for (row, mut row_instances) in rows {
        row_instances.sort_by_key(|i| i.column);
        let backwards = row % 2 == 1;
        if backwards {
            row_instances.reverse();
        }

        for instance in row_instances {
            let mut placed = instance.materialize(base);
            if backwards {
                reverse_run(&mut placed);
            }
            if let (Some(prev), Some(next)) = (segments.last(), placed.first()) {
                segments.push(Segment::stitch(prev.to, next.from));
            }
            segments.extend(placed);
        }
    }

    let path = MotionPath::from_segments(segments)?;
    tracing::debug!(
        instances = instances.len(),
        segments = path.len(),
        "composed switchback layout"
    );
    Ok(path)
}

/// Lay out `base` with `params` and compose the result.
///
/// # Errors
///
/// Returns [`MotionError::EmptyPattern`] if `base` has no length.
pub fn compose_layout(
    base: &MotionPath,
    params: &PantographLayout,
) -> Result<MotionPath, MotionError> {
    compose_switchback(base, &layout(base, params))
}
