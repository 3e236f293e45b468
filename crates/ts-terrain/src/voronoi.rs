//! Delaunay triangulation, Voronoi cells, and Lloyd relaxation.
//!
//! # Construction
//!
//! The Delaunay triangulation is built incrementally (Bowyer–Watson).  The
//! Voronoi cell of a site is the polygon through the circumcentres of the
//! triangles around it, taken in angular order.
//!
//! Sites on the convex hull have unbounded cells.  To keep every real site
//! interior, four *frame* sites are placed well outside the region's
//! corners; they take part in triangulation but are never relaxed or
//! returned.  Each cell is then clipped to the region rectangle.
//!
//! Everything here is order-deterministic: no hash maps, and ties are broken
//! by index.

use ts_core::{Point, Rect};

const EPSILON: f64 = 1e-9;

// ── Triangulation ─────────────────────────────────────────────────────────────

#[derive(Copy, Clone, Debug)]
struct Triangle {
    v:      [usize; 3],
    center: Point,
    r2:     f64,
}

impl Triangle {
    fn new(points: &[Point], a: usize, b: usize, c: usize) -> Self {
        let (center, r2) = circumcircle(points[a], points[b], points[c]);
        Self { v: [a, b, c], center, r2 }
    }

    #[inline]
    fn circumcircle_contains(&self, p: Point) -> bool {
        let dx = p.x - self.center.x;
        let dy = p.y - self.center.y;
        dx * dx + dy * dy < self.r2 - EPSILON
    }

    #[inline]
    fn has_vertex(&self, i: usize) -> bool {
        self.v.contains(&i)
    }
}

/// Circumcentre and squared radius.  Collinear input yields an infinite
/// circle, which every later point falls inside, so the sliver is replaced.
fn circumcircle(a: Point, b: Point, c: Point) -> (Point, f64) {
    let d = 2.0 * (a.x * (b.y - c.y) + b.x * (c.y - a.y) + c.x * (a.y - b.y));
    if d.abs() < EPSILON {
        return (Point::new(a.x, a.y), f64::INFINITY);
    }
    let a2 = a.x * a.x + a.y * a.y;
    let b2 = b.x * b.x + b.y * b.y;
    let c2 = c.x * c.x + c.y * c.y;
    let ux = (a2 * (b.y - c.y) + b2 * (c.y - a.y) + c2 * (a.y - b.y)) / d;
    let uy = (a2 * (c.x - b.x) + b2 * (a.x - c.x) + c2 * (b.x - a.x)) / d;
    let center = Point::new(ux, uy);
    let r2 = (a.x - ux).powi(2) + (a.y - uy).powi(2);
    (center, r2)
}

/// Bowyer–Watson.  Returns triangles as vertex-index triples into `points`,
/// each paired with its circumcentre.
pub(crate) fn triangulate(points: &[Point]) -> Vec<([usize; 3], Point)> {
    let n = points.len();
    if n < 3 {
        return Vec::new();
    }

    let (mut min_x, mut min_y, mut max_x, mut max_y) = (f64::MAX, f64::MAX, f64::MIN, f64::MIN);
    for p in points {
        min_x = min_x.min(p.x);
        min_y = min_y.min(p.y);
        max_x = max_x.max(p.x);
        max_y = max_y.max(p.y);
    }
    let span = (max_x - min_x).max(max_y - min_y).max(1.0);
    let mid = Point::new((min_x + max_x) * 0.5, (min_y + max_y) * 0.5);

    // Super-triangle comfortably enclosing every point.
    let mut work: Vec<Point> = points.to_vec();
    work.push(Point::new(mid.x - 20.0 * span, mid.y - span));
    work.push(Point::new(mid.x, mid.y + 20.0 * span));
    work.push(Point::new(mid.x + 20.0 * span, mid.y - span));

    let mut triangles = vec![Triangle::new(&work, n, n + 1, n + 2)];
    let mut edges: Vec<(usize, usize)> = Vec::new();

    for i in 0..n {
        let p = work[i];
        edges.clear();

        triangles.retain(|t| {
            if t.circumcircle_contains(p) {
                for k in 0..3 {
                    let (a, b) = (t.v[k], t.v[(k + 1) % 3]);
                    edges.push(if a < b { (a, b) } else { (b, a) });
                }
                false
            } else {
                true
            }
        });

        // The cavity boundary is the set of edges owned by exactly one
        // removed triangle.
        edges.sort_unstable();
        let mut k = 0;
        while k < edges.len() {
            let e = edges[k];
            let mut run = 1;
            while k + run < edges.len() && edges[k + run] == e {
                run += 1;
            }
            if run == 1 {
                triangles.push(Triangle::new(&work, e.0, e.1, i));
            }
            k += run;
        }
    }

    triangles
        .into_iter()
        .filter(|t| !(n..n + 3).any(|s| t.has_vertex(s)))
        .map(|t| (t.v, t.center))
        .collect()
}

// ── Voronoi cells ─────────────────────────────────────────────────────────────

/// Clip a polygon to an axis-aligned rectangle (Sutherland–Hodgman).
pub(crate) fn clip_to_rect(polygon: &[Point], rect: Rect) -> Vec<Point> {
    type Inside = fn(Point, Rect) -> bool;
    type Cross = fn(Point, Point, Rect) -> Point;

    fn lerp_at_x(a: Point, b: Point, x: f64) -> Point {
        let t = (x - a.x) / (b.x - a.x);
        Point::new(x, a.y + (b.y - a.y) * t)
    }
    fn lerp_at_y(a: Point, b: Point, y: f64) -> Point {
        let t = (y - a.y) / (b.y - a.y);
        Point::new(a.x + (b.x - a.x) * t, y)
    }

    let planes: [(Inside, Cross); 4] = [
        (|p, r| p.x >= r.min.x, |a, b, r| lerp_at_x(a, b, r.min.x)),
        (|p, r| p.x <= r.max.x, |a, b, r| lerp_at_x(a, b, r.max.x)),
        (|p, r| p.y >= r.min.y, |a, b, r| lerp_at_y(a, b, r.min.y)),
        (|p, r| p.y <= r.max.y, |a, b, r| lerp_at_y(a, b, r.max.y)),
    ];

    let mut output = polygon.to_vec();
    for (inside, cross) in planes {
        if output.is_empty() {
            break;
        }
        let input = std::mem::take(&mut output);
        let mut prev = input[input.len() - 1];
        for &cur in &input {
            match (inside(prev, rect), inside(cur, rect)) {
                (true, true) => output.push(cur),
                (true, false) => output.push(cross(prev, cur, rect)),
                (false, true) => {
                    output.push(cross(prev, cur, rect));
                    output.push(cur);
                }
                (false, false) => {}
            }
            prev = cur;
        }
    }
    output
}

/// Area-weighted centroid (shoelace).  Falls back to the vertex mean for
/// degenerate polygons, and `None` for an empty one.
pub(crate) fn centroid(polygon: &[Point]) -> Option<Point> {
    if polygon.is_empty() {
        return None;
    }
    let mut area2 = 0.0;
    let (mut cx, mut cy) = (0.0, 0.0);
    for (i, a) in polygon.iter().enumerate() {
        let b = polygon[(i + 1) % polygon.len()];
        let cross = a.x * b.y - b.x * a.y;
        area2 += cross;
        cx += (a.x + b.x) * cross;
        cy += (a.y + b.y) * cross;
    }
    if area2.abs() < EPSILON {
        let n = polygon.len() as f64;
        let (sx, sy) = polygon.iter().fold((0.0, 0.0), |(sx, sy), p| (sx + p.x, sy + p.y));
        return Some(Point::new(sx / n, sy / n));
    }
    Some(Point::new(cx / (3.0 * area2), cy / (3.0 * area2)))
}

/// Voronoi cell of every site in `sites`, clipped to `region`.
///
/// Cells are returned in site order.  A site whose cell cannot be formed
/// (fewer than three sites in total) gets an empty polygon.
pub fn voronoi_cells(sites: &[Point], region: Rect) -> Vec<Vec<Point>> {
    let n = sites.len();
    let mut all = sites.to_vec();
    all.extend(frame_sites(region));

    let triangles = triangulate(&all);

    let mut corners: Vec<Vec<Point>> = vec![Vec::new(); n];
    for (v, center) in &triangles {
        for &i in v {
            if i < n {
                corners[i].push(*center);
            }
        }
    }

    corners
        .into_iter()
        .enumerate()
        .map(|(i, mut ring)| {
            let s = sites[i];
            ring.sort_by(|a, b| {
                let ta = (a.y - s.y).atan2(a.x - s.x);
                let tb = (b.y - s.y).atan2(b.x - s.x);
                ta.total_cmp(&tb)
            });
            ring.dedup_by(|a, b| (a.x - b.x).abs() < EPSILON && (a.y - b.y).abs() < EPSILON);
            if ring.len() < 3 {
                return Vec::new();
            }
            clip_to_rect(&ring, region)
        })
        .collect()
}

fn frame_sites(region: Rect) -> [Point; 4] {
    let m = region.width().max(region.height()) * 3.0;
    [
        Point::new(region.min.x - m, region.min.y - m),
        Point::new(region.max.x + m, region.min.y - m),
        Point::new(region.max.x + m, region.max.y + m),
        Point::new(region.min.x - m, region.max.y + m),
    ]
}

// ── Lloyd relaxation ──────────────────────────────────────────────────────────

/// Move every site to the centroid of its Voronoi cell, `iterations` times.
///
/// Sites whose cell degenerates stay where they are.
pub fn lloyd_relax(sites: &mut [Point], region: Rect, iterations: u32) {
    for _ in 0..iterations {
        let cells = voronoi_cells(sites, region);
        for (site, cell) in sites.iter_mut().zip(&cells) {
            if let Some(c) = centroid(cell) {
                *site = c;
            }
        }
    }
}
