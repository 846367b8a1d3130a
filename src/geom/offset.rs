use std::f64::consts::FRAC_PI_2;
use std::f64::consts::PI;

use geo::{BooleanOps, Coord, LineString, MultiPolygon, Polygon};

/// Side of the direction of travel along a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Left,
    Right,
}

/// End cap shape for open line buffers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CapStyle {
    Round,
    Flat,
    Square,
}

/// Corner shape where consecutive offset segments meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinStyle {
    Round,
    Miter,
    Bevel,
}

/// Join configuration shared by the buffer constructions.
///
/// `segments` is the arc resolution per quarter circle; `miter_limit` is the
/// maximum miter length as a multiple of the offset distance (past it the
/// join falls back to a bevel).
#[derive(Debug, Clone, Copy)]
pub(crate) struct JoinParams {
    pub join: JoinStyle,
    pub segments: u32,
    pub miter_limit: f64,
}

const EPS: f64 = 1e-12;

#[inline]
fn offset_pt(p: Coord<f64>, dir: Coord<f64>, dist: f64) -> Coord<f64> {
    Coord { x: p.x + dir.x * dist, y: p.y + dir.y * dist }
}

#[inline]
fn unit(from: Coord<f64>, to: Coord<f64>) -> Option<Coord<f64>> {
    let (dx, dy) = (to.x - from.x, to.y - from.y);
    let len = (dx * dx + dy * dy).sqrt();
    (len > EPS).then(|| Coord { x: dx / len, y: dy / len })
}

/// Unit normal of a direction of travel, on the given side.
#[inline]
fn normal(u: Coord<f64>, side: Side) -> Coord<f64> {
    match side {
        Side::Right => Coord { x: u.y, y: -u.x },
        Side::Left => Coord { x: -u.y, y: u.x },
    }
}

#[inline]
fn cross(a: Coord<f64>, b: Coord<f64>) -> f64 {
    a.x * b.y - a.y * b.x
}

/// Collapse consecutive duplicate points.
fn clean_points(line: &LineString<f64>) -> Vec<Coord<f64>> {
    let mut pts: Vec<Coord<f64>> = Vec::with_capacity(line.0.len());
    for &c in &line.0 {
        if pts.last().is_none_or(|p| (p.x - c.x).abs() > EPS || (p.y - c.y).abs() > EPS) {
            pts.push(c);
        }
    }
    pts
}

/// Quad covering the strip between a segment and its offset image.
fn segment_quad(p0: Coord<f64>, p1: Coord<f64>, n: Coord<f64>, dist: f64) -> Polygon<f64> {
    let a = offset_pt(p0, n, dist);
    let b = offset_pt(p1, n, dist);
    Polygon::new(LineString::new(vec![p0, p1, b, a]), vec![])
}

/// Points on the arc of radius `dist` around `center`, swept from direction
/// `n0` to `n1` the short way. Includes both endpoints.
fn arc_points(center: Coord<f64>, n0: Coord<f64>, n1: Coord<f64>, dist: f64, segments: u32) -> Vec<Coord<f64>> {
    let a0 = n0.y.atan2(n0.x);
    let mut delta = n1.y.atan2(n1.x) - a0;
    if delta > PI { delta -= 2.0 * PI }
    if delta < -PI { delta += 2.0 * PI }

    let steps = ((segments.max(1) as f64) * delta.abs() / FRAC_PI_2).ceil().max(1.0) as usize;
    (0..=steps)
        .map(|k| {
            let a = a0 + delta * (k as f64) / (steps as f64);
            Coord { x: center.x + dist * a.cos(), y: center.y + dist * a.sin() }
        })
        .collect()
}

fn bevel_wedge(p: Coord<f64>, n0: Coord<f64>, n1: Coord<f64>, dist: f64) -> Option<Polygon<f64>> {
    if cross(n0, n1).abs() < EPS {
        return None;
    }
    let ring = vec![p, offset_pt(p, n0, dist), offset_pt(p, n1, dist)];
    Some(Polygon::new(LineString::new(ring), vec![]))
}

/// Wedge filling the gap between consecutive offset segments at a vertex,
/// spanning from `p + n0·dist` to `p + n1·dist`.
fn join_wedge(
    p: Coord<f64>,
    n0: Coord<f64>,
    n1: Coord<f64>,
    dist: f64,
    params: &JoinParams,
) -> Option<Polygon<f64>> {
    match params.join {
        JoinStyle::Bevel => bevel_wedge(p, n0, n1, dist),
        JoinStyle::Miter => {
            let bis = Coord { x: n0.x + n1.x, y: n0.y + n1.y };
            let len = (bis.x * bis.x + bis.y * bis.y).sqrt();
            if len < EPS {
                return bevel_wedge(p, n0, n1, dist); // near-reversal
            }
            let bu = Coord { x: bis.x / len, y: bis.y / len };
            let cos_half = bu.x * n0.x + bu.y * n0.y;
            if cos_half < EPS {
                return bevel_wedge(p, n0, n1, dist);
            }
            let miter_len = dist / cos_half;
            if miter_len > params.miter_limit * dist {
                return bevel_wedge(p, n0, n1, dist);
            }
            let m = offset_pt(p, bu, miter_len);
            let ring = vec![p, offset_pt(p, n0, dist), m, offset_pt(p, n1, dist)];
            Some(Polygon::new(LineString::new(ring), vec![]))
        }
        JoinStyle::Round => {
            let mut ring = vec![p];
            ring.extend(arc_points(p, n0, n1, dist, params.segments));
            Some(Polygon::new(LineString::new(ring), vec![]))
        }
    }
}

/// Strip and join pieces for one side of an open polyline.
fn side_pieces(
    pts: &[Coord<f64>],
    side: Side,
    dist: f64,
    params: &JoinParams,
    out: &mut Vec<Polygon<f64>>,
) {
    for w in pts.windows(2) {
        if let Some(u) = unit(w[0], w[1]) {
            out.push(segment_quad(w[0], w[1], normal(u, side), dist));
        }
    }
    for i in 1..pts.len().saturating_sub(1) {
        let (Some(u0), Some(u1)) = (unit(pts[i - 1], pts[i]), unit(pts[i], pts[i + 1])) else {
            continue;
        };
        let turn = cross(u0, u1);
        // The gap opens on the side the line turns away from.
        let gap = match side {
            Side::Right => turn > EPS,
            Side::Left => turn < -EPS,
        };
        if gap {
            let wedge = join_wedge(pts[i], normal(u0, side), normal(u1, side), dist, params);
            out.extend(wedge);
        }
    }
}

/// Half-disc / square / nothing past an endpoint `p`, pointing along the
/// outward unit direction `w`.
fn cap_piece(
    p: Coord<f64>,
    w: Coord<f64>,
    dist: f64,
    cap: CapStyle,
    segments: u32,
) -> Option<Polygon<f64>> {
    let a = normal(w, Side::Left);
    let b = normal(w, Side::Right);
    match cap {
        CapStyle::Flat => None,
        CapStyle::Square => {
            let ring = vec![
                offset_pt(p, a, dist),
                offset_pt(offset_pt(p, a, dist), w, dist),
                offset_pt(offset_pt(p, b, dist), w, dist),
                offset_pt(p, b, dist),
            ];
            Some(Polygon::new(LineString::new(ring), vec![]))
        }
        CapStyle::Round => {
            // Two unambiguous quarter sweeps: a -> w -> b.
            let mut ring = vec![p];
            ring.extend(arc_points(p, a, w, dist, segments));
            ring.extend(arc_points(p, w, b, dist, segments));
            Some(Polygon::new(LineString::new(ring), vec![]))
        }
    }
}

/// Strip and join pieces on both sides of a closed ring, covering its full
/// `dist`-neighborhood.
fn ring_pieces(ring: &LineString<f64>, dist: f64, params: &JoinParams, out: &mut Vec<Polygon<f64>>) {
    let mut pts = clean_points(ring);
    if pts.len() > 1 {
        let (first, last) = (pts[0], pts[pts.len() - 1]);
        if (first.x - last.x).abs() <= EPS && (first.y - last.y).abs() <= EPS {
            pts.pop();
        }
    }
    if pts.len() < 2 {
        return;
    }

    let n = pts.len();
    for i in 0..n {
        let (p0, p1) = (pts[i], pts[(i + 1) % n]);
        if let Some(u) = unit(p0, p1) {
            out.push(segment_quad(p0, p1, normal(u, Side::Left), dist));
            out.push(segment_quad(p0, p1, normal(u, Side::Right), dist));
        }
    }
    for i in 0..n {
        let (prev, p, next) = (pts[(i + n - 1) % n], pts[i], pts[(i + 1) % n]);
        let (Some(u0), Some(u1)) = (unit(prev, p), unit(p, next)) else { continue };
        let turn = cross(u0, u1);
        let side = if turn > EPS {
            Side::Right // left turn leaves a gap on the right
        } else if turn < -EPS {
            Side::Left
        } else {
            continue;
        };
        let wedge = join_wedge(p, normal(u0, side), normal(u1, side), dist, params);
        out.extend(wedge);
    }
}

/// Union a pile of overlapping pieces into one multipolygon.
pub(crate) fn union_pieces(pieces: Vec<Polygon<f64>>) -> Option<MultiPolygon<f64>> {
    pieces
        .into_iter()
        .map(|piece| MultiPolygon::new(vec![piece]))
        .reduce(|a, b| a.union(&b))
}

/// Polygon offset from a line on one side of its direction of travel.
/// Returns `None` for degenerate lines and non-positive distances.
pub(crate) fn single_sided(
    line: &LineString<f64>,
    side: Side,
    distance: f64,
    params: &JoinParams,
) -> Option<MultiPolygon<f64>> {
    if !(distance > EPS) {
        return None;
    }
    let pts = clean_points(line);
    if pts.len() < 2 {
        return None;
    }
    let mut pieces = Vec::new();
    side_pieces(&pts, side, distance, params, &mut pieces);
    union_pieces(pieces)
}

/// Symmetric buffer of an open line, with end caps.
pub(crate) fn buffer_line(
    line: &LineString<f64>,
    distance: f64,
    cap: CapStyle,
    params: &JoinParams,
) -> Option<MultiPolygon<f64>> {
    if !(distance > EPS) {
        return None;
    }
    let pts = clean_points(line);
    if pts.len() < 2 {
        return None;
    }
    let mut pieces = Vec::new();
    side_pieces(&pts, Side::Left, distance, params, &mut pieces);
    side_pieces(&pts, Side::Right, distance, params, &mut pieces);

    let first = unit(pts[0], pts[1])?;
    let last = unit(pts[pts.len() - 2], pts[pts.len() - 1])?;
    let start = cap_piece(pts[0], Coord { x: -first.x, y: -first.y }, distance, cap, params.segments);
    let end = cap_piece(pts[pts.len() - 1], last, distance, cap, params.segments);
    pieces.extend(start);
    pieces.extend(end);

    union_pieces(pieces)
}

/// Outward offset of a polygon: the polygon itself plus the full
/// neighborhood of its boundary rings.
pub(crate) fn buffer_polygon(
    poly: &Polygon<f64>,
    distance: f64,
    params: &JoinParams,
) -> Option<MultiPolygon<f64>> {
    if !(distance > EPS) {
        return Some(MultiPolygon::new(vec![poly.clone()]));
    }
    let mut pieces = vec![poly.clone()];
    ring_pieces(poly.exterior(), distance, params, &mut pieces);
    for hole in poly.interiors() {
        ring_pieces(hole, distance, params, &mut pieces);
    }
    union_pieces(pieces)
}
