//! Table finding from ruling lines.
//!
//! Edges are prefiltered by length, snapped onto shared rulings, joined into
//! continuous segments, filtered again by their joined length and intersected.
//! Rectangles closed by four joined intersections become cells; cells sharing
//! a side belong to one table.

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashMap};

use crate::model::BoundingBox;
use crate::options::{EdgeStrategy, TableSettings};

const EPSILON: f64 = 1e-6;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Orientation {
    Horizontal,
    Vertical,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum EdgeSource {
    Line,
    Rect,
}

/// An axis-aligned ruling segment in top-left page coordinates.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Edge {
    pub x0: f64,
    pub top: f64,
    pub x1: f64,
    pub bottom: f64,
    pub orientation: Orientation,
    pub source: EdgeSource,
}

impl Edge {
    pub(crate) fn horizontal(x0: f64, x1: f64, y: f64, source: EdgeSource) -> Self {
        Self {
            x0: x0.min(x1),
            top: y,
            x1: x0.max(x1),
            bottom: y,
            orientation: Orientation::Horizontal,
            source,
        }
    }

    pub(crate) fn vertical(x: f64, top: f64, bottom: f64, source: EdgeSource) -> Self {
        Self {
            x0: x,
            top: top.min(bottom),
            x1: x,
            bottom: top.max(bottom),
            orientation: Orientation::Vertical,
            source,
        }
    }

    fn length(&self) -> f64 {
        match self.orientation {
            Orientation::Horizontal => self.x1 - self.x0,
            Orientation::Vertical => self.bottom - self.top,
        }
    }

    fn allowed_by(&self, settings: &TableSettings) -> bool {
        let strategy = match self.orientation {
            Orientation::Horizontal => settings.horizontal_strategy,
            Orientation::Vertical => settings.vertical_strategy,
        };
        strategy == EdgeStrategy::Lines || self.source == EdgeSource::Line
    }
}

/// Cells of one detected table, in no particular order.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct CellGroup {
    pub bbox: BoundingBox,
    pub cells: Vec<BoundingBox>,
}

impl CellGroup {
    /// Cell boxes laid out as a grid: one row per distinct cell top, one column
    /// per distinct cell left edge, `None` where no cell starts.
    pub(crate) fn grid(&self) -> Vec<Vec<Option<BoundingBox>>> {
        let mut columns = self
            .cells
            .iter()
            .map(|cell| float_key(cell.left))
            .collect::<Vec<_>>();
        columns.sort_unstable();
        columns.dedup();

        let mut rows: BTreeMap<i64, HashMap<i64, BoundingBox>> = BTreeMap::new();
        for cell in &self.cells {
            rows.entry(float_key(cell.top))
                .or_default()
                .insert(float_key(cell.left), *cell);
        }

        rows.into_values()
            .map(|row| {
                columns
                    .iter()
                    .map(|column| row.get(column).copied())
                    .collect()
            })
            .collect()
    }
}

pub(crate) fn find_cell_groups(edges: &[Edge], settings: &TableSettings) -> Vec<CellGroup> {
    let edges = edges
        .iter()
        .filter(|edge| {
            edge.allowed_by(settings) && edge.length() >= settings.edge_min_length_prefilter
        })
        .cloned()
        .collect::<Vec<_>>();
    if edges.is_empty() {
        return Vec::new();
    }

    let edges = snap_edges(edges, settings.snap_tolerance);
    let edges = join_edges(edges, settings.join_tolerance)
        .into_iter()
        .filter(|edge| edge.length() >= settings.edge_min_length)
        .collect::<Vec<_>>();
    let intersections = intersections(&edges, settings.intersection_tolerance);
    let cells =
        cells_from_intersections(&intersections, &edges, settings.intersection_tolerance);
    group_cells(cells)
}

fn cmp_f64(a: f64, b: f64) -> Ordering {
    a.partial_cmp(&b).unwrap_or(Ordering::Equal)
}

#[allow(clippy::cast_possible_truncation)]
fn float_key(value: f64) -> i64 {
    (value * 1000.0).round() as i64
}

fn split_by_orientation(edges: Vec<Edge>) -> (Vec<Edge>, Vec<Edge>) {
    edges
        .into_iter()
        .partition(|edge| edge.orientation == Orientation::Horizontal)
}

fn snap_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let (mut horizontals, mut verticals) = split_by_orientation(edges);
    snap_cluster(
        &mut horizontals,
        tolerance,
        |edge| edge.top,
        |edge, value| {
            edge.top = value;
            edge.bottom = value;
        },
    );
    snap_cluster(
        &mut verticals,
        tolerance,
        |edge| edge.x0,
        |edge, value| {
            edge.x0 = value;
            edge.x1 = value;
        },
    );
    horizontals.extend(verticals);
    horizontals
}

/// Moves parallel edges whose positions lie within `tolerance` of a cluster's
/// first member onto the cluster mean.
#[allow(clippy::cast_precision_loss)]
fn snap_cluster<K, S>(edges: &mut [Edge], tolerance: f64, key: K, mut set: S)
where
    K: Fn(&Edge) -> f64,
    S: FnMut(&mut Edge, f64),
{
    edges.sort_by(|a, b| cmp_f64(key(a), key(b)));

    let mut start = 0;
    for index in 1..=edges.len() {
        let closes_cluster =
            index == edges.len() || key(&edges[index]) - key(&edges[start]) > tolerance;
        if closes_cluster {
            let count = (index - start) as f64;
            let mean = edges[start..index].iter().map(&key).sum::<f64>() / count;
            for edge in &mut edges[start..index] {
                set(edge, mean);
            }
            start = index;
        }
    }
}

fn join_edges(edges: Vec<Edge>, tolerance: f64) -> Vec<Edge> {
    let (horizontals, verticals) = split_by_orientation(edges);
    let mut joined = join_collinear(
        horizontals,
        tolerance,
        |edge| (edge.top, edge.x0, edge.x1),
        |proto, start, end| Edge::horizontal(start, end, proto.top, proto.source),
    );
    joined.extend(join_collinear(
        verticals,
        tolerance,
        |edge| (edge.x0, edge.top, edge.bottom),
        |proto, start, end| Edge::vertical(proto.x0, start, end, proto.source),
    ));
    joined
}

/// Merges segments lying on the same ruling whose gap is at most `tolerance`.
/// `span` returns (ruling position, segment start, segment end).
fn join_collinear<S, B>(mut edges: Vec<Edge>, tolerance: f64, span: S, build: B) -> Vec<Edge>
where
    S: Fn(&Edge) -> (f64, f64, f64),
    B: Fn(&Edge, f64, f64) -> Edge,
{
    edges.sort_by(|a, b| {
        let (a_pos, a_start, _) = span(a);
        let (b_pos, b_start, _) = span(b);
        cmp_f64(a_pos, b_pos).then_with(|| cmp_f64(a_start, b_start))
    });

    let mut joined = Vec::new();
    let mut current: Option<(usize, f64, f64)> = None;
    for (index, edge) in edges.iter().enumerate() {
        let (position, start, end) = span(edge);
        current = match current {
            Some((proto, cur_start, cur_end))
                if (span(&edges[proto]).0 - position).abs() < EPSILON
                    && start <= cur_end + tolerance =>
            {
                Some((proto, cur_start, cur_end.max(end)))
            }
            Some((proto, cur_start, cur_end)) => {
                joined.push(build(&edges[proto], cur_start, cur_end));
                Some((index, start, end))
            }
            None => Some((index, start, end)),
        };
    }
    if let Some((proto, start, end)) = current {
        joined.push(build(&edges[proto], start, end));
    }
    joined
}

fn intersections(edges: &[Edge], tolerance: f64) -> Vec<(f64, f64)> {
    let (horizontals, verticals): (Vec<&Edge>, Vec<&Edge>) = edges
        .iter()
        .partition(|edge| edge.orientation == Orientation::Horizontal);

    let mut points = Vec::new();
    for h in &horizontals {
        for v in &verticals {
            if v.x0 >= h.x0 - tolerance
                && v.x0 <= h.x1 + tolerance
                && h.top >= v.top - tolerance
                && h.top <= v.bottom + tolerance
            {
                points.push((v.x0, h.top));
            }
        }
    }

    points.sort_by(|a, b| cmp_f64(a.0, b.0).then_with(|| cmp_f64(a.1, b.1)));
    points.dedup_by(|a, b| (a.0 - b.0).abs() < EPSILON && (a.1 - b.1).abs() < EPSILON);
    points
}

/// Builds cells from intersection points. For each point, the nearest point
/// below and the nearest point to the right that are joined to it by a ruling
/// and that close a rectangle with a fourth joined corner form a cell, so
/// merged cells spanning several columns or rows are kept whole.
fn cells_from_intersections(
    points: &[(f64, f64)],
    edges: &[Edge],
    tolerance: f64,
) -> Vec<BoundingBox> {
    let same = |a: f64, b: f64| (a - b).abs() < EPSILON;
    let connected = |a: (f64, f64), b: (f64, f64)| {
        edges.iter().any(|edge| match edge.orientation {
            Orientation::Vertical => {
                same(a.0, b.0)
                    && same(edge.x0, a.0)
                    && edge.top <= a.1.min(b.1) + tolerance
                    && edge.bottom >= a.1.max(b.1) - tolerance
            }
            Orientation::Horizontal => {
                same(a.1, b.1)
                    && same(edge.top, a.1)
                    && edge.x0 <= a.0.min(b.0) + tolerance
                    && edge.x1 >= a.0.max(b.0) - tolerance
            }
        })
    };
    let has_point = |x: f64, y: f64| points.iter().any(|&(px, py)| same(px, x) && same(py, y));

    let mut cells = Vec::new();
    for (index, &corner) in points.iter().enumerate() {
        let rest = &points[index + 1..];
        let below = rest
            .iter()
            .filter(|point| same(point.0, corner.0) && point.1 > corner.1)
            .collect::<Vec<_>>();
        let right = rest
            .iter()
            .filter(|point| same(point.1, corner.1) && point.0 > corner.0)
            .collect::<Vec<_>>();

        'search: for &&bottom_left in &below {
            if !connected(corner, bottom_left) {
                continue;
            }
            for &&top_right in &right {
                if !connected(corner, top_right) {
                    continue;
                }
                let bottom_right = (top_right.0, bottom_left.1);
                if has_point(bottom_right.0, bottom_right.1)
                    && connected(bottom_right, top_right)
                    && connected(bottom_right, bottom_left)
                {
                    cells.push(BoundingBox::new(
                        corner.0,
                        corner.1,
                        bottom_right.0,
                        bottom_right.1,
                    ));
                    break 'search;
                }
            }
        }
    }
    cells
}

fn share_side(a: &BoundingBox, b: &BoundingBox) -> bool {
    let vertical = ((a.right - b.left).abs() < EPSILON || (a.left - b.right).abs() < EPSILON)
        && a.top < b.bottom - EPSILON
        && b.top < a.bottom - EPSILON;
    let horizontal = ((a.bottom - b.top).abs() < EPSILON || (a.top - b.bottom).abs() < EPSILON)
        && a.left < b.right - EPSILON
        && b.left < a.right - EPSILON;
    vertical || horizontal
}

fn group_cells(cells: Vec<BoundingBox>) -> Vec<CellGroup> {
    fn find(parent: &mut [usize], mut index: usize) -> usize {
        while parent[index] != index {
            parent[index] = parent[parent[index]];
            index = parent[index];
        }
        index
    }

    let mut parent = (0..cells.len()).collect::<Vec<_>>();
    for i in 0..cells.len() {
        for j in (i + 1)..cells.len() {
            if share_side(&cells[i], &cells[j]) {
                let (root_i, root_j) = (find(&mut parent, i), find(&mut parent, j));
                if root_i != root_j {
                    parent[root_j] = root_i;
                }
            }
        }
    }

    let mut members: BTreeMap<usize, Vec<BoundingBox>> = BTreeMap::new();
    for (index, cell) in cells.iter().enumerate() {
        let root = find(&mut parent, index);
        members.entry(root).or_default().push(*cell);
    }

    let mut groups = members
        .into_values()
        .map(|cells| {
            let bbox = cells
                .iter()
                .skip(1)
                .fold(cells[0], |acc, cell| acc.union(cell));
            CellGroup { bbox, cells }
        })
        .collect::<Vec<_>>();
    groups.sort_by(|a, b| {
        cmp_f64(a.bbox.top, b.bbox.top).then_with(|| cmp_f64(a.bbox.left, b.bbox.left))
    });
    groups
}
