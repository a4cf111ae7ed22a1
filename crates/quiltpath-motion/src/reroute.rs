//! Overlap-reducing reroute of a single stitch run.
//!
//! Digitized designs often sew the same stretch twice to get from one
//! part of the motif to another. This module rebuilds a run so that
//! only the retracing strictly needed to get from the run's start
//! anchor to its end anchor remains.
//!
//! # Algorithm overview
//!
//! 1. **Graph:** Vertices are the run's points quantized to 1e-6 mm.
//!    Each distinct undirected edge is kept once, weighted by its length.
//!
//! 2. **Fix parity:** An Eulerian trail from `s` to `e` needs `s` and `e`
//!    odd (or both even when `s == e`) and every other vertex even.
//!    Vertices that violate this are greedily paired and the shortest
//!    path between each pair is duplicated (a deliberate retrace).
//!
//! 3. **Hierholzer:** Walk every edge exactly once starting at `s`.
//!
//! 4. **Accept:** The new run replaces the old one only if the walk ends
//!    at `e`, covers every edge, and retraces strictly less than before.

use std::collections::{BTreeSet, HashMap, HashSet};

use petgraph::algo::dijkstra;
use petgraph::graph::{NodeIndex, UnGraph};
use petgraph::visit::EdgeRef;

use crate::types::{Point, TOLERANCE_MM};

/// Quantization steps per millimetre for vertex identity.
const QUANTUM_PER_MM: f64 = 1e6;

/// Above this many parity violations the run is left unchanged.
pub const MAX_PARITY_VERTICES: usize = 24;

/// Grid cell used as the identity of a vertex.
#[allow(clippy::cast_possible_truncation)]
fn vertex_key(p: Point) -> (i64, i64) {
    (
        (p.x * QUANTUM_PER_MM).round() as i64,
        (p.y * QUANTUM_PER_MM).round() as i64,
    )
}

/// Graph of the distinct edges of one run.
struct RunGraph {
    graph: UnGraph<(), f64>,
    coords: Vec<Point>,
    start: NodeIndex,
    end: NodeIndex,
}

impl RunGraph {
    fn build(points: &[Point]) -> Self {
        let mut graph = UnGraph::new_undirected();
        let mut coords = Vec::new();
        let mut nodes: HashMap<(i64, i64), NodeIndex> = HashMap::new();
        let mut node_for = |graph: &mut UnGraph<(), f64>, p: Point| {
            *nodes.entry(vertex_key(p)).or_insert_with(|| {
                coords.push(p);
                graph.add_node(())
            })
        };

        let mut seen = HashSet::new();
        let mut indices = Vec::with_capacity(points.len());
        for &p in points {
            indices.push(node_for(&mut graph, p));
        }
        for (w, pair) in indices.windows(2).zip(points.windows(2)) {
            let (a, b) = (w[0], w[1]);
            if a == b {
                continue;
            }
            if seen.insert((a.min(b), a.max(b))) {
                graph.add_edge(a, b, pair[0].distance(pair[1]));
            }
        }

        let start = indices.first().copied().unwrap_or_else(|| NodeIndex::new(0));
        let end = indices.last().copied().unwrap_or(start);
        Self {
            graph,
            coords,
            start,
            end,
        }
    }

    fn total_weight(&self) -> f64 {
        self.graph.edge_weights().sum()
    }
}

/// Vertices whose parity must flip for a trail from `start` to `end`.
fn parity_violations(
    graph: &UnGraph<(), f64>,
    start: NodeIndex,
    end: NodeIndex,
) -> Vec<NodeIndex> {
    let mut odd: BTreeSet<NodeIndex> = graph
        .node_indices()
        .filter(|&n| graph.edges(n).count() % 2 != 0)
        .collect();
    if start != end {
        for anchor in [start, end] {
            if !odd.remove(&anchor) {
                odd.insert(anchor);
            }
        }
    }
    odd.into_iter().collect()
}

/// Pair up parity violations and duplicate the shortest path between
/// each pair.
///
/// Greedily pairs the two closest remaining vertices by Euclidean
/// distance, then uses Dijkstra to reconstruct the path to duplicate.
///
/// # Errors
///
/// Returns an error if shortest-path reconstruction fails for a pair.
fn fix_parity(
    graph: &mut UnGraph<(), f64>,
    coords: &[Point],
    mut pending: Vec<NodeIndex>,
) -> Result<(), String> {
    while pending.len() >= 2 {
        let mut best_i = 0;
        let mut best_j = 1;
        let mut best_dist = f64::INFINITY;
        for (i, &ni) in pending.iter().enumerate() {
            for (j, &nj) in pending.iter().enumerate().skip(i + 1) {
                let d = coords[ni.index()].distance_squared(coords[nj.index()]);
                if d < best_dist {
                    best_dist = d;
                    best_i = i;
                    best_j = j;
                }
            }
        }

        let path = shortest_path(graph, pending[best_i], pending[best_j])?;
        for window in path.windows(2) {
            let (a, b) = (window[0], window[1]);
            let weight = graph
                .edges(a)
                .find(|e| e.target() == b)
                .map_or(0.0, |e| *e.weight());
            graph.add_edge(a, b, weight);
        }

        // best_j > best_i, so remove the higher index first.
        pending.swap_remove(best_j);
        pending.swap_remove(best_i);
    }
    Ok(())
}

/// Reconstruct the shortest path from `start` to `end` using Dijkstra.
///
/// Returns the node sequence `[start, ..., end]`.
///
/// # Errors
///
/// Returns an error if `end` is unreachable or reconstruction stalls.
fn shortest_path(
    graph: &UnGraph<(), f64>,
    start: NodeIndex,
    end: NodeIndex,
) -> Result<Vec<NodeIndex>, String> {
    let costs = dijkstra(graph, start, Some(end), |e| *e.weight());
    if !costs.contains_key(&end) {
        return Err(format!("node {end:?} unreachable from {start:?}"));
    }

    // Walk back from `end` along edges that are tight with respect to
    // the Dijkstra costs. Parallel edges can make two nodes tight in
    // both directions, so visited nodes are skipped.
    let mut visited = HashSet::from([end]);
    let mut path = vec![end];
    let mut current = end;
    while current != start {
        let current_cost = costs.get(&current).copied().unwrap_or(f64::INFINITY);
        let next = graph.edges(current).find_map(|edge| {
            let neighbor = edge.target();
            let neighbor_cost = costs.get(&neighbor).copied().unwrap_or(f64::INFINITY);
            let tight = (neighbor_cost + *edge.weight() - current_cost).abs() < 1e-10;
            (tight && !visited.contains(&neighbor)).then_some(neighbor)
        });
        let Some(n) = next else {
            return Err(format!(
                "reconstruction stalled at {current:?} (start={start:?}, end={end:?})"
            ));
        };
        path.push(n);
        visited.insert(n);
        current = n;
    }
    path.reverse();
    Ok(path)
}

/// Hierholzer's algorithm from a fixed start vertex.
///
/// Returns the node sequence of a trail using every edge exactly once,
/// provided the graph is connected and parity allows it.
fn hierholzer(graph: &UnGraph<(), f64>, start: NodeIndex) -> Vec<NodeIndex> {
    let mut stack = vec![start];
    let mut trail = Vec::with_capacity(graph.edge_count() + 1);
    let mut used_edges = vec![false; graph.edge_count()];

    while let Some(&current) = stack.last() {
        let next_edge = graph
            .edges(current)
            .find(|e| !used_edges[e.id().index()])
            .map(|e| (e.id(), e.target()));

        if let Some((edge_id, target)) = next_edge {
            used_edges[edge_id.index()] = true;
            stack.push(target);
        } else {
            trail.push(stack.pop().unwrap_or(start));
        }
    }

    trail.reverse();
    trail
}

/// Rebuild one stitch run with less retracing.
///
/// Returns `None` when the run is already as short as this method can
/// make it, or when it cannot be rerouted within budget.
pub(crate) fn reroute_run(points: &[Point]) -> Option<Vec<Point>> {
    let (first, last) = (*points.first()?, *points.last()?);
    if points.len() < 3 {
        return None;
    }

    let original_length: f64 = points.windows(2).map(|w| w[0].distance(w[1])).sum();
    let mut run = RunGraph::build(points);
    let distinct_length = run.total_weight();
    let retrace_before = original_length - distinct_length;
    if retrace_before <= TOLERANCE_MM {
        return None;
    }

    let pending = parity_violations(&run.graph, run.start, run.end);
    if pending.len() > MAX_PARITY_VERTICES {
        tracing::warn!(
            vertices = pending.len(),
            "too many parity violations, run left unchanged"
        );
        return None;
    }
    if let Err(e) = fix_parity(&mut run.graph, &run.coords, pending) {
        tracing::warn!("parity fix failed, run left unchanged: {e}");
        return None;
    }

    let trail = hierholzer(&run.graph, run.start);
    if trail.first() != Some(&run.start)
        || trail.last() != Some(&run.end)
        || trail.len() != run.graph.edge_count() + 1
    {
        tracing::warn!("trail does not cover the run end to end, run left unchanged");
        return None;
    }

    let retrace_after = run.total_weight() - distinct_length;
    if retrace_after >= retrace_before - TOLERANCE_MM {
        return None;
    }

    let mut rerouted: Vec<Point> = trail.iter().map(|n| run.coords[n.index()]).collect();
    // Anchors are reproduced exactly, not from their quantized cells.
    if let Some(p) = rerouted.first_mut() {
        *p = first;
    }
    if let Some(p) = rerouted.last_mut() {
        *p = last;
    }
    tracing::debug!(retrace_before, retrace_after, "rerouted stitch run");
    Some(rerouted)
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use crate::optimize::{OptimizerKind, PathOptimizer};
    use crate::types::{MotionPath, Segment, SegmentKind};

    fn pts(coords: &[(f64, f64)]) -> Vec<Point> {
        coords.iter().map(|&(x, y)| Point::new(x, y)).collect()
    }

    fn length(points: &[Point]) -> f64 {
        points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    /// A three-armed star around (10, 0) sewn with two needless retraces.
    fn star_with_retrace() -> Vec<Point> {
        pts(&[
            (0.0, 0.0),
            (10.0, 0.0),
            (20.0, 0.0),
            (10.0, 0.0),
            (10.0, 10.0),
            (10.0, 0.0),
            (20.0, 0.0),
        ])
    }

    fn edge_set(points: &[Point]) -> BTreeSet<((i64, i64), (i64, i64))> {
        points
            .windows(2)
            .map(|w| {
                let (a, b) = (vertex_key(w[0]), vertex_key(w[1]));
                (a.min(b), a.max(b))
            })
            .filter(|(a, b)| a != b)
            .collect()
    }

    #[test]
    fn star_retrace_removed() {
        let original = star_with_retrace();
        let rerouted = reroute_run(&original).unwrap();
        assert_eq!(rerouted.first(), original.first());
        assert_eq!(rerouted.last(), original.last());
        assert!((length(&rerouted) - 40.0).abs() < 1e-9);
        assert_eq!(edge_set(&rerouted), edge_set(&original));
    }

    #[test]
    fn necessary_retrace_kept() {
        // The spur to (10, 5) must be sewn out and back.
        let spur = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 5.0), (10.0, 0.0), (20.0, 0.0)]);
        assert!(reroute_run(&spur).is_none());
    }

    #[test]
    fn run_without_retrace_untouched() {
        let square = pts(&[(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0), (0.0, 0.0)]);
        assert!(reroute_run(&square).is_none());
    }

    /// A spine along the X axis with a one-unit tooth sewn out and
    /// back at every interior grid point.
    fn comb(teeth: u32) -> Vec<Point> {
        let mut points = vec![Point::new(0.0, 0.0)];
        for i in 1..=teeth {
            let x = f64::from(i);
            points.push(Point::new(x, 0.0));
            points.push(Point::new(x, 1.0));
            points.push(Point::new(x, 0.0));
        }
        points.push(Point::new(f64::from(teeth + 1), 0.0));
        points
    }

    #[test]
    fn too_many_odd_vertices_warns_and_keeps_run() {
        let run = comb(13);
        let graph = RunGraph::build(&run);
        assert!(parity_violations(&graph.graph, graph.start, graph.end).len() > MAX_PARITY_VERTICES);

        let (rerouted, logs) = crate::log_capture::warnings(|| reroute_run(&run));
        assert!(rerouted.is_none());
        assert!(logs.contains("WARN"));
        assert!(logs.contains("too many parity violations"));
    }

    #[test]
    fn successful_reroute_does_not_warn() {
        let (rerouted, logs) = crate::log_capture::warnings(|| reroute_run(&star_with_retrace()));
        assert!(rerouted.is_some());
        assert!(logs.is_empty());
    }

    #[test]
    fn parity_violations_account_for_anchors() {
        let run = RunGraph::build(&star_with_retrace());
        let pending = parity_violations(&run.graph, run.start, run.end);
        let coords: Vec<Point> = pending.iter().map(|n| run.coords[n.index()]).collect();
        assert_eq!(coords, pts(&[(10.0, 0.0), (10.0, 10.0)]));
    }

    #[test]
    fn duplicate_edges_collapse() {
        let run = RunGraph::build(&star_with_retrace());
        assert_eq!(run.graph.node_count(), 4);
        assert_eq!(run.graph.edge_count(), 3);
    }

    #[test]
    fn reroute_strategy_preserves_travel_and_anchors() {
        let mut segments: Vec<Segment> = star_with_retrace()
            .windows(2)
            .map(|w| Segment::stitch(w[0], w[1]))
            .collect();
        segments.push(Segment::travel(Point::new(20.0, 0.0), Point::new(50.0, 0.0)));
        segments.push(Segment::stitch(Point::new(50.0, 0.0), Point::new(60.0, 0.0)));
        let path = MotionPath::from_segments(segments).unwrap();

        let optimized = OptimizerKind::Reroute.optimize(&path);
        assert_eq!(optimized.first_point(), path.first_point());
        assert_eq!(optimized.last_point(), path.last_point());
        assert_eq!(optimized.count(SegmentKind::Travel), 1);
        assert!(optimized.length() < path.length());
    }

    #[test]
    fn shortest_path_on_chain() {
        let mut graph: UnGraph<(), f64> = UnGraph::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        graph.add_edge(a, b, 1.0);
        graph.add_edge(b, c, 1.0);
        graph.add_edge(a, b, 1.0);
        assert_eq!(shortest_path(&graph, a, c).unwrap(), vec![a, b, c]);
    }

    #[test]
    fn hierholzer_walks_every_edge() {
        let mut graph: UnGraph<(), f64> = UnGraph::new_undirected();
        let a = graph.add_node(());
        let b = graph.add_node(());
        let c = graph.add_node(());
        graph.add_edge(a, b, 1.0);
        graph.add_edge(b, c, 1.0);
        graph.add_edge(c, a, 1.0);
        let trail = hierholzer(&graph, a);
        assert_eq!(trail.len(), 4);
        assert_eq!(trail.first(), Some(&a));
        assert_eq!(trail.last(), Some(&a));
    }
}
