use nalgebra::{Point3, Vector3};

use crate::types::Sphere;

/// Tolerance for floating-point comparisons.
pub const EPSILON: f64 = 1e-10;

/// Distance from a cutting plane below which a vertex counts as lying on it.
/// Looser than [`EPSILON`] because clipped vertices accumulate rounding
/// across successive cuts.
pub const PLANE_EPSILON: f64 = 1e-9;

/// Epsilon-based floating point comparisons.
mod float_cmp {
    use super::EPSILON;

    #[inline]
    pub const fn eq(a: f64, b: f64) -> bool {
        (a - b).abs() <= EPSILON
    }
}

use float_cmp::eq;

/// Oriented plane `normal · x = offset` with unit normal. The inside
/// halfspace is `normal · x <= offset`.
#[derive(Debug, Clone, Copy)]
pub struct Plane {
    pub normal: Vector3<f64>,
    pub offset: f64,
}

impl Plane {
    /// Signed distance of `x` from the plane, positive outside.
    #[inline]
    pub fn signed_distance(&self, x: &Point3<f64>) -> f64 {
        self.normal.dot(&x.coords) - self.offset
    }
}

/// Distance from a point to the sphere surface (negative inside).
#[inline]
pub fn surface_distance(s: &Sphere, p: &Point3<f64>) -> f64 {
    (p - s.center).norm() - s.r
}

/// Radical plane separating sphere `a` from sphere `b`. Points on the inside
/// have lower power with respect to `a` than to `b`.
///
/// Returns `None` for concentric spheres.
pub fn radical_plane(a: &Sphere, b: &Sphere) -> Option<Plane> {
    let d = b.center - a.center;
    let dist = d.norm();
    if dist < EPSILON {
        return None;
    }
    let normal = d / dist;
    // 2 x·d <= |cb|^2 - |ca|^2 - rb^2 + ra^2
    let rhs = b.center.coords.norm_squared() - a.center.coords.norm_squared() - b.r * b.r
        + a.r * a.r;
    Some(Plane {
        normal,
        offset: rhs / (2.0 * dist),
    })
}

/// Find the intersection of a plane and a segment from the signed distances
/// of its endpoints.
#[inline]
pub fn intersection_of_plane_and_segment(
    a: &Point3<f64>,
    b: &Point3<f64>,
    da: f64,
    db: f64,
) -> Point3<f64> {
    if (da - db).abs() < EPSILON {
        *a
    } else {
        let t = da / (da - db);
        a + (b - a) * t
    }
}

/// Closest point to `o` on segment `ab`.
#[allow(clippy::many_single_char_names)]
pub fn closest_point_on_segment(
    o: &Point3<f64>,
    a: &Point3<f64>,
    b: &Point3<f64>,
) -> Point3<f64> {
    let v = b - a;
    let len_sq = v.norm_squared();
    if len_sq < EPSILON * EPSILON {
        return *a;
    }
    let t = (v.dot(&(o - a)) / len_sq).clamp(0.0, 1.0);
    a + v * t
}

/// Smallest distance between the segment `ab` and the surface of `s`.
pub fn segment_surface_distance(s: &Sphere, a: &Point3<f64>, b: &Point3<f64>) -> f64 {
    surface_distance(s, &closest_point_on_segment(&s.center, a, b))
}

/// Unsigned volume of the tetrahedron `abcd`.
#[inline]
pub fn tetrahedron_volume(
    a: &Point3<f64>,
    b: &Point3<f64>,
    c: &Point3<f64>,
    d: &Point3<f64>,
) -> f64 {
    (b - a).cross(&(c - a)).dot(&(d - a)).abs() / 6.0
}

/// Find any vector perpendicular to the given vector
pub fn any_normal_of_vector(a: &Vector3<f64>) -> Vector3<f64> {
    let mut b = *a;

    if !eq(b.x, 0.0) && (!eq(b.y, 0.0) || !eq(b.z, 0.0)) {
        b.x = -b.x;
        return a.cross(&b).normalize();
    } else if !eq(b.y, 0.0) && (!eq(b.x, 0.0) || !eq(b.z, 0.0)) {
        b.y = -b.y;
        return a.cross(&b).normalize();
    } else if !eq(b.x, 0.0) {
        return Vector3::new(0.0, 1.0, 0.0);
    }
    Vector3::new(1.0, 0.0, 0.0)
}
