use super::Vec2;
use std::f64::consts::PI;

/// Rotate `p` around `center` by `angle` decidegrees, using the host's
/// y-down rotation sense.
pub fn rotate_about(p: Vec2, center: Vec2, angle: f64) -> Vec2 {
    if angle == 0.0 {
        return p;
    }
    let rad = angle / 10.0 * PI / 180.0;
    let (sin_a, cos_a) = rad.sin_cos();
    let dx = (p.x - center.x) as f64;
    let dy = (p.y - center.y) as f64;
    let rx = dx * cos_a + dy * sin_a;
    let ry = -dx * sin_a + dy * cos_a;
    Vec2::new(center.x + rx.round() as i64, center.y + ry.round() as i64)
}

/// Axis-aligned box in host units.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HostBox {
    pub min: Vec2,
    pub max: Vec2,
}

impl HostBox {
    pub fn at(p: Vec2) -> Self {
        Self { min: p, max: p }
    }

    pub fn expand(&mut self, p: Vec2) {
        self.min.x = self.min.x.min(p.x);
        self.min.y = self.min.y.min(p.y);
        self.max.x = self.max.x.max(p.x);
        self.max.y = self.max.y.max(p.y);
    }

    pub fn inflate(&mut self, by: i64) {
        self.min = Vec2::new(self.min.x - by, self.min.y - by);
        self.max = Vec2::new(self.max.x + by, self.max.y + by);
    }

    pub fn merge(&mut self, other: &HostBox) {
        self.expand(other.min);
        self.expand(other.max);
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.max.x - self.min.x, self.max.y - self.min.y)
    }
}

/// Grow an optional box by a point.
pub fn expand_opt(bbox: &mut Option<HostBox>, p: Vec2) {
    match bbox {
        Some(b) => b.expand(p),
        None => *bbox = Some(HostBox::at(p)),
    }
}

/// Box of an arc around `center`, including the axis extremes its sweep
/// passes through. Angles in decidegrees.
pub fn arc_box(center: Vec2, radius: f64, start: f64, sweep: f64) -> HostBox {
    let (from, to) = if sweep < 0.0 {
        (start + sweep, start)
    } else {
        (start, start + sweep)
    };
    let at = |decideg: f64| {
        let rad = (decideg / 10.0).to_radians();
        Vec2::new(
            center.x + (radius * rad.cos()).round() as i64,
            center.y + (radius * rad.sin()).round() as i64,
        )
    };
    let mut bbox = HostBox::at(at(from));
    bbox.expand(at(to));
    if to - from >= 3600.0 {
        bbox.expand(at(0.0));
        bbox.expand(at(900.0));
        bbox.expand(at(1800.0));
        bbox.expand(at(2700.0));
        return bbox;
    }
    let mut quadrant = (from / 900.0).ceil() * 900.0;
    while quadrant <= to {
        bbox.expand(at(quadrant));
        quadrant += 900.0;
    }
    bbox
}

fn orientation(a: Vec2, b: Vec2, c: Vec2) -> i8 {
    let v = (b.x - a.x) as i128 * (c.y - a.y) as i128 - (b.y - a.y) as i128 * (c.x - a.x) as i128;
    v.signum() as i8
}

fn on_segment(a: Vec2, b: Vec2, p: Vec2) -> bool {
    p.x >= a.x.min(b.x) && p.x <= a.x.max(b.x) && p.y >= a.y.min(b.y) && p.y <= a.y.max(b.y)
}

/// Whether segments `p1-p2` and `q1-q2` touch or cross.
pub fn segments_intersect(p1: Vec2, p2: Vec2, q1: Vec2, q2: Vec2) -> bool {
    let d1 = orientation(q1, q2, p1);
    let d2 = orientation(q1, q2, p2);
    let d3 = orientation(p1, p2, q1);
    let d4 = orientation(p1, p2, q2);

    if d1 != d2 && d3 != d4 && d1 != 0 && d2 != 0 && d3 != 0 && d4 != 0 {
        return true;
    }
    (d1 == 0 && on_segment(q1, q2, p1))
        || (d2 == 0 && on_segment(q1, q2, p2))
        || (d3 == 0 && on_segment(p1, p2, q1))
        || (d4 == 0 && on_segment(p1, p2, q2))
}

/// Whether a closed contour crosses itself. Adjacent edges share a vertex
/// and are not counted.
pub fn contour_self_intersects(points: &[Vec2]) -> bool {
    let n = points.len();
    if n < 4 {
        return false;
    }
    let edge = |i: usize| (points[i], points[(i + 1) % n]);
    for i in 0..n {
        for j in (i + 2)..n {
            if i == 0 && j == n - 1 {
                continue;
            }
            let (a1, a2) = edge(i);
            let (b1, b2) = edge(j);
            if segments_intersect(a1, a2, b1, b2) {
                return true;
            }
        }
    }
    false
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rotate_quarter_turn() {
        // +90 deg moves +x onto -y in y-down coordinates
        let p = rotate_about(Vec2::new(1000, 0), Vec2::new(0, 0), 900.0);
        assert_eq!(p, Vec2::new(0, -1000));
        let back = rotate_about(p, Vec2::new(0, 0), -900.0);
        assert_eq!(back, Vec2::new(1000, 0));
    }

    #[test]
    fn test_rotate_about_center() {
        let p = rotate_about(Vec2::new(2000, 1000), Vec2::new(1000, 1000), 1800.0);
        assert_eq!(p, Vec2::new(0, 1000));
    }

    #[test]
    fn test_box_merge() {
        let mut a = HostBox::at(Vec2::new(0, 0));
        a.expand(Vec2::new(10, 5));
        let mut b = HostBox::at(Vec2::new(-3, 2));
        b.expand(Vec2::new(4, 20));
        a.merge(&b);
        assert_eq!(a.min, Vec2::new(-3, 0));
        assert_eq!(a.max, Vec2::new(10, 20));
        assert_eq!(a.size(), Vec2::new(13, 20));
    }

    #[test]
    fn test_square_is_simple() {
        let square = [
            Vec2::new(0, 0),
            Vec2::new(10, 0),
            Vec2::new(10, 10),
            Vec2::new(0, 10),
        ];
        assert!(!contour_self_intersects(&square));
    }

    #[test]
    fn test_bowtie_self_intersects() {
        let bowtie = [
            Vec2::new(0, 0),
            Vec2::new(10, 10),
            Vec2::new(10, 0),
            Vec2::new(0, 10),
        ];
        assert!(contour_self_intersects(&bowtie));
    }
}
