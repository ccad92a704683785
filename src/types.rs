use nalgebra::Point3;

use crate::lattice::Shift;

/// Internal sphere representation with nalgebra Point3
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Sphere {
    pub center: Point3<f64>,
    pub r: f64,
}

impl Sphere {
    pub const fn new(center: Point3<f64>, r: f64) -> Self {
        Self { center, r }
    }

    #[cfg(test)]
    pub const fn from_coords(x: f64, y: f64, z: f64, r: f64) -> Self {
        Self {
            center: Point3::new(x, y, z),
            r,
        }
    }
}

/// A periodic image of an atom: the atom index, the lattice shift of the
/// image and its sphere in Cartesian space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Site {
    pub atom: usize,
    pub shift: Shift,
    pub sphere: Sphere,
}

/// Site together with its distance from the centre of the cell being built,
/// ordered by distance with ties broken by atom index and shift.
#[derive(Debug, Clone, Copy)]
pub struct ValuedSite {
    pub value: f64,
    pub site: Site,
}

impl ValuedSite {
    pub const fn new(value: f64, site: Site) -> Self {
        Self { value, site }
    }

    fn key(&self) -> (usize, [i32; 3]) {
        let s = self.site.shift;
        (self.site.atom, [s.x, s.y, s.z])
    }
}

impl PartialEq for ValuedSite {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == std::cmp::Ordering::Equal
    }
}

impl Eq for ValuedSite {}

impl PartialOrd for ValuedSite {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for ValuedSite {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.value
            .total_cmp(&other.value)
            .then_with(|| self.key().cmp(&other.key()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn site(atom: usize, x: f64) -> Site {
        Site {
            atom,
            shift: Shift::zeros(),
            sphere: Sphere::from_coords(x, 0.0, 0.0, 0.0),
        }
    }

    #[test]
    fn valued_sites_sort_by_distance_then_index() {
        let mut sites = vec![
            ValuedSite::new(2.0, site(0, 2.0)),
            ValuedSite::new(1.0, site(3, 1.0)),
            ValuedSite::new(1.0, site(1, -1.0)),
        ];
        sites.sort();
        let order: Vec<usize> = sites.iter().map(|v| v.site.atom).collect();
        assert_eq!(order, vec![1, 3, 0]);
    }
}
