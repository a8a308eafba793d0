//! Ring geometry and the even-odd containment test.

use geo::{Coord, LineString};

/// Iterate the edges of a ring as `(current, previous)` vertex pairs.
///
/// Vertex `i` is paired with vertex `(i - 1) mod n`, so the ring is treated
/// as closed whether or not the data repeats its first vertex.
pub fn ring_edges(ring: &[Coord<f64>]) -> impl Iterator<Item = (Coord<f64>, Coord<f64>)> + '_ {
    let n = ring.len();
    (0..n).map(move |i| (ring[i], ring[(i + n - 1) % n]))
}

/// Ray casting (even-odd rule).
///
/// Casts a horizontal ray from `point` towards +x and toggles on every edge
/// it crosses. Points exactly on an edge or vertex have no guaranteed answer.
pub fn ring_contains(ring: &LineString<f64>, point: Coord<f64>) -> bool {
    let mut inside = false;

    for (current, previous) in ring_edges(&ring.0) {
        // Exactly one endpoint strictly above the ray; also rules out yi == yj
        if (current.y > point.y) != (previous.y > point.y) {
            let x_cross = current.x
                + (previous.x - current.x) * (point.y - current.y) / (previous.y - current.y);
            if point.x < x_cross {
                inside = !inside;
            }
        }
    }

    inside
}
