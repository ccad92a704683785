//! Enumeration of periodic atom images around a central atom.
//!
//! Images are handed out in distance shells so that cell construction can
//! ask for more neighbours only when the cell is not yet closed.

use nalgebra::Vector3;
use rayon::prelude::*;

use crate::lattice::{Lattice, Shift};
use crate::types::{Site, Sphere, ValuedSite};

/// Periodic neighbour search over the atoms of one unit cell.
pub struct ImageSearcher<'a> {
    lattice: &'a Lattice,
    spheres: Vec<Sphere>,
    fractional: Vec<Vector3<f64>>,
    max_radius: f64,
}

impl<'a> ImageSearcher<'a> {
    pub fn new(lattice: &'a Lattice, spheres: Vec<Sphere>) -> Self {
        let fractional = spheres
            .iter()
            .map(|s| lattice.to_fractional(&s.center))
            .collect();
        let max_radius = spheres.iter().map(|s| s.r).fold(0.0, f64::max);
        Self {
            lattice,
            spheres,
            fractional,
            max_radius,
        }
    }

    #[inline]
    pub fn spheres(&self) -> &[Sphere] {
        &self.spheres
    }

    #[inline]
    pub const fn max_radius(&self) -> f64 {
        self.max_radius
    }

    /// Radius of the first neighbour shell: a few typical interatomic
    /// spacings, widened by the largest atom so radical planes of big
    /// neighbours are not missed early on.
    #[allow(clippy::cast_precision_loss)]
    pub fn initial_radius(&self) -> f64 {
        if self.spheres.is_empty() {
            return 0.0;
        }
        let spacing = (self.lattice.volume() / self.spheres.len() as f64).cbrt();
        spacing.mul_add(1.5, 2.0 * self.max_radius)
    }

    /// All atom images whose distance from atom `central_id` lies in
    /// `(inner, outer]`, excluding the atom itself, sorted by distance.
    pub fn sites_in_shell(&self, central_id: usize, inner: f64, outer: f64) -> Vec<ValuedSite> {
        let mut result = Vec::new();
        if central_id >= self.spheres.len() {
            return result;
        }

        let center = &self.spheres[central_id];
        let bounds = self.lattice.image_bounds(outer);

        for (atom, (sphere, frac)) in self.spheres.iter().zip(&self.fractional).enumerate() {
            // Start from the image closest in fractional terms
            let base = self.fractional[central_id] - frac;
            let nearest = base.map(round_to_i32);
            let offset = sphere.center - center.center;

            for da in -bounds[0]..=bounds[0] {
                for db in -bounds[1]..=bounds[1] {
                    for dc in -bounds[2]..=bounds[2] {
                        let shift = nearest + Shift::new(da, db, dc);
                        if atom == central_id && shift == Shift::zeros() {
                            continue;
                        }
                        let d = offset + self.lattice.translation(&shift);
                        let dist = d.norm();
                        if dist > inner && dist <= outer {
                            let site = Site {
                                atom,
                                shift,
                                sphere: Sphere::new(center.center + d, sphere.r),
                            };
                            result.push(ValuedSite::new(dist, site));
                        }
                    }
                }
            }
        }

        result.sort();
        result
    }

    /// First pair of atoms (in index order) whose closest periodic images
    /// are within `tolerance` of each other.
    pub fn find_coincident(&self, tolerance: f64) -> Option<(usize, usize, f64)> {
        let n = self.fractional.len();
        (0..n).into_par_iter().find_map_first(|i| {
            ((i + 1)..n).find_map(|j| {
                let df = self.fractional[j] - self.fractional[i];
                let distance = self.lattice.minimum_image_norm(&df);
                (distance < tolerance).then_some((i, j, distance))
            })
        })
    }
}

#[allow(clippy::cast_possible_truncation)]
fn round_to_i32(x: f64) -> i32 {
    x.round() as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn first_shell_of_simple_cubic() {
        let lattice = Lattice::cubic(2.0).unwrap();
        let spheres = vec![Sphere::new(Point3::origin(), 0.5)];
        let searcher = ImageSearcher::new(&lattice, spheres);

        let sites = searcher.sites_in_shell(0, 0.0, 2.0);
        assert_eq!(sites.len(), 6);
        assert!(sites.iter().all(|s| s.site.atom == 0));
        assert_relative_eq!(sites[0].value, 2.0, epsilon = 1e-12);

        let second = searcher.sites_in_shell(0, 2.0, 3.0);
        // 12 face diagonals at 2*sqrt(2)
        assert_eq!(second.len(), 12);
    }

    #[test]
    fn shells_do_not_overlap() {
        let lattice = Lattice::from_parameters(3.0, 4.0, 5.0, 80.0, 100.0, 95.0).unwrap();
        let spheres = vec![
            Sphere::new(Point3::new(0.1, 0.2, 0.3), 1.0),
            Sphere::new(Point3::new(1.5, 2.0, 2.5), 1.2),
        ];
        let searcher = ImageSearcher::new(&lattice, spheres);

        let all = searcher.sites_in_shell(1, 0.0, 8.0);
        let inner = searcher.sites_in_shell(1, 0.0, 4.0);
        let outer = searcher.sites_in_shell(1, 4.0, 8.0);
        assert_eq!(all.len(), inner.len() + outer.len());
        assert!(all.windows(2).all(|w| w[0].value <= w[1].value));
    }

    #[test]
    fn coincident_images_are_found() {
        let lattice = Lattice::cubic(4.0).unwrap();
        let spheres = vec![
            Sphere::new(Point3::new(0.0, 0.0, 0.0), 1.0),
            Sphere::new(Point3::new(2.0, 2.0, 2.0), 1.0),
            Sphere::new(Point3::new(4.0, 0.0, 1e-7), 1.0),
        ];
        let searcher = ImageSearcher::new(&lattice, spheres);
        let (i, j, distance) = searcher.find_coincident(1e-4).unwrap();
        assert_eq!((i, j), (0, 2));
        assert!(distance < 1e-6);
        assert!(searcher.find_coincident(1e-8).is_none());
    }
}
