//! Periodic lattice: three basis vectors and the conversions between
//! Cartesian and fractional coordinates.

use nalgebra::{Matrix3, Point3, Vector3};

use crate::error::{Error, Result};

/// Integer lattice translation, in units of the basis vectors.
pub type Shift = Vector3<i32>;

/// Relative determinant below which a set of basis vectors is treated as
/// linearly dependent.
const SINGULARITY_TOLERANCE: f64 = 1e-8;

/// Periodic repeat unit defined by three basis vectors.
#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Lattice {
    /// Columns are the basis vectors a, b, c.
    to_cartesian: Matrix3<f64>,
    to_fractional: Matrix3<f64>,
}

impl Lattice {
    /// Create from three basis vectors.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] if a vector is non-finite or the
    /// three vectors are (nearly) linearly dependent.
    pub fn new(a: Vector3<f64>, b: Vector3<f64>, c: Vector3<f64>) -> Result<Self> {
        if [a, b, c].iter().any(|v| v.iter().any(|x| !x.is_finite())) {
            return Err(Error::geometry("lattice vectors must be finite"));
        }

        let to_cartesian = Matrix3::from_columns(&[a, b, c]);
        let det = to_cartesian.determinant();
        let scale = a.norm() * b.norm() * c.norm();
        if scale <= 0.0 || det.abs() <= SINGULARITY_TOLERANCE * scale {
            return Err(Error::geometry(format!(
                "lattice vectors are linearly dependent (determinant {det:.3e})"
            )));
        }

        let to_fractional = to_cartesian
            .try_inverse()
            .ok_or_else(|| Error::geometry("lattice matrix is not invertible"))?;

        Ok(Self {
            to_cartesian,
            to_fractional,
        })
    }

    /// Create from three shift direction vectors given as tuples.
    ///
    /// # Errors
    /// See [`Lattice::new`].
    pub fn from_vectors(
        a: (f64, f64, f64),
        b: (f64, f64, f64),
        c: (f64, f64, f64),
    ) -> Result<Self> {
        Self::new(
            Vector3::new(a.0, a.1, a.2),
            Vector3::new(b.0, b.1, b.2),
            Vector3::new(c.0, c.1, c.2),
        )
    }

    /// Create an orthorhombic lattice from two corner points.
    ///
    /// # Errors
    /// See [`Lattice::new`].
    pub fn from_corners(min: (f64, f64, f64), max: (f64, f64, f64)) -> Result<Self> {
        Self::from_vectors(
            (max.0 - min.0, 0.0, 0.0),
            (0.0, max.1 - min.1, 0.0),
            (0.0, 0.0, max.2 - min.2),
        )
    }

    /// Create a cubic lattice with edge length `edge`.
    ///
    /// # Errors
    /// See [`Lattice::new`].
    pub fn cubic(edge: f64) -> Result<Self> {
        Self::from_corners((0.0, 0.0, 0.0), (edge, edge, edge))
    }

    /// Create from crystallographic cell parameters (lengths and angles in
    /// degrees), with `a` along x and `b` in the xy plane.
    ///
    /// # Errors
    /// Returns [`Error::InvalidGeometry`] if the parameters do not describe a
    /// valid cell.
    #[allow(clippy::many_single_char_names)]
    pub fn from_parameters(
        a: f64,
        b: f64,
        c: f64,
        alpha: f64,
        beta: f64,
        gamma: f64,
    ) -> Result<Self> {
        if [a, b, c].iter().any(|&l| !(l.is_finite() && l > 0.0)) {
            return Err(Error::geometry("cell lengths must be positive"));
        }

        let (cos_a, cos_b) = (alpha.to_radians().cos(), beta.to_radians().cos());
        let (sin_g, cos_g) = gamma.to_radians().sin_cos();
        if sin_g.abs() < SINGULARITY_TOLERANCE {
            return Err(Error::geometry(format!("invalid cell angle gamma = {gamma}")));
        }

        let cx = c * cos_b;
        let cy = c * cos_b.mul_add(-cos_g, cos_a) / sin_g;
        let cz_sq = cx.mul_add(-cx, cy.mul_add(-cy, c * c));
        if cz_sq <= 0.0 {
            return Err(Error::geometry(format!(
                "cell angles ({alpha}, {beta}, {gamma}) do not form a valid cell"
            )));
        }

        Self::new(
            Vector3::new(a, 0.0, 0.0),
            Vector3::new(b * cos_g, b * sin_g, 0.0),
            Vector3::new(cx, cy, cz_sq.sqrt()),
        )
    }

    #[inline]
    #[must_use]
    pub fn a(&self) -> Vector3<f64> {
        self.to_cartesian.column(0).into_owned()
    }

    #[inline]
    #[must_use]
    pub fn b(&self) -> Vector3<f64> {
        self.to_cartesian.column(1).into_owned()
    }

    #[inline]
    #[must_use]
    pub fn c(&self) -> Vector3<f64> {
        self.to_cartesian.column(2).into_owned()
    }

    /// Matrix whose columns are the basis vectors.
    #[inline]
    #[must_use]
    pub const fn matrix(&self) -> &Matrix3<f64> {
        &self.to_cartesian
    }

    /// Cell volume.
    #[must_use]
    pub fn volume(&self) -> f64 {
        self.to_cartesian.determinant().abs()
    }

    /// Fractional coordinates of a Cartesian point.
    #[inline]
    #[must_use]
    pub fn to_fractional(&self, p: &Point3<f64>) -> Vector3<f64> {
        self.to_fractional * p.coords
    }

    /// Cartesian point for fractional coordinates.
    #[inline]
    #[must_use]
    pub fn to_cartesian(&self, f: &Vector3<f64>) -> Point3<f64> {
        Point3::from(self.to_cartesian * f)
    }

    /// Cartesian displacement of an integer lattice translation.
    #[inline]
    #[must_use]
    pub fn translation(&self, shift: &Shift) -> Vector3<f64> {
        self.to_cartesian * shift.cast::<f64>()
    }

    /// Shift a point by weighted basis vectors.
    #[must_use]
    pub fn shift_point(&self, p: &Point3<f64>, wa: f64, wb: f64, wc: f64) -> Point3<f64> {
        let (a, b, c) = (self.a(), self.b(), self.c());
        Point3::new(
            c.x.mul_add(wc, b.x.mul_add(wb, a.x.mul_add(wa, p.x))),
            c.y.mul_add(wc, b.y.mul_add(wb, a.y.mul_add(wa, p.y))),
            c.z.mul_add(wc, b.z.mul_add(wb, a.z.mul_add(wa, p.z))),
        )
    }

    /// Split fractional coordinates into the part inside `[0, 1)` and the
    /// integer shift of the image they belong to.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn wrap_fractional(f: &Vector3<f64>) -> (Vector3<f64>, Shift) {
        let shift = f.map(|x| x.floor() as i32);
        let mut reduced = f - shift.cast::<f64>();
        // floor() of values a hair below an integer can leave exactly 1.0
        for x in reduced.iter_mut() {
            if *x >= 1.0 {
                *x = 0.0;
            }
        }
        let shift = f.zip_map(&reduced, |x, r| (x - r).round() as i32);
        (reduced, shift)
    }

    /// Cartesian length of the shortest periodic image of a fractional
    /// displacement. Exact for displacements much shorter than the cell.
    #[must_use]
    pub fn minimum_image_norm(&self, df: &Vector3<f64>) -> f64 {
        let wrapped = df.map(|x| x - x.round());
        (self.to_cartesian * wrapped).norm()
    }

    /// Per-axis bound on the integer shifts needed to reach every image
    /// within `radius` of a point.
    #[allow(clippy::cast_possible_truncation)]
    #[must_use]
    pub fn image_bounds(&self, radius: f64) -> [i32; 3] {
        std::array::from_fn(|axis| {
            let reach = radius * self.to_fractional.row(axis).norm();
            reach.ceil() as i32 + 1
        })
    }

    /// Distance between neighbouring lattice planes spanned by the two basis
    /// vectors other than `axis`.
    #[must_use]
    pub fn plane_spacing(&self, axis: usize) -> f64 {
        1.0 / self.to_fractional.row(axis).norm()
    }

    /// Length of the shortest basis vector.
    #[must_use]
    pub fn min_edge(&self) -> f64 {
        self.a().norm().min(self.b().norm()).min(self.c().norm())
    }

    /// Sum of the basis vector lengths, an upper bound on the cell diameter.
    #[must_use]
    pub fn perimeter(&self) -> f64 {
        self.a().norm() + self.b().norm() + self.c().norm()
    }
}
