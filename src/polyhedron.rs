//! Convex polyhedron clipped by halfspaces, used to build one radical
//! Voronoi cell at a time.
//!
//! Coordinates are relative to the cell's own atom. Every face remembers
//! the site whose radical plane produced it; the initial bounding cube has
//! unlabelled faces that must all be cut away before the cell is complete.

use std::collections::{BTreeMap, HashMap};

use nalgebra::{Point3, Vector3};

use crate::geometry::{
    PLANE_EPSILON, Plane, any_normal_of_vector, intersection_of_plane_and_segment,
    tetrahedron_volume,
};

#[derive(Debug, Clone)]
struct Face {
    /// Index of the cutting site, `None` for bounding-cube faces.
    site: Option<usize>,
    /// Vertex indices in cyclic order.
    vertices: Vec<usize>,
}

/// Result of cutting a cell with a halfspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CutOutcome {
    /// No vertex lay outside the plane.
    Unchanged,
    Cut,
    /// Nothing with positive volume remains.
    Emptied,
}

/// Edge of a cell with the sites of its two faces.
#[derive(Debug, Clone, PartialEq)]
pub struct CellEdge {
    pub a: usize,
    pub b: usize,
    pub sites: Vec<usize>,
}

/// Centroid and area of a face produced by a cut.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FaceGeometry {
    pub site: usize,
    pub centroid: Point3<f64>,
    pub area: f64,
}

/// Convex polyhedron built by successive plane cuts.
#[derive(Debug, Clone)]
pub struct ConvexCell {
    vertices: Vec<Point3<f64>>,
    faces: Vec<Face>,
}

impl ConvexCell {
    /// Axis-aligned cube centred on the origin.
    pub fn cube(half_width: f64) -> Self {
        let h = half_width;
        let vertices = (0..8)
            .map(|i| {
                let pick = |bit: usize| if i & bit == 0 { -h } else { h };
                Point3::new(pick(1), pick(2), pick(4))
            })
            .collect();

        let faces = [
            [0, 2, 6, 4],
            [1, 3, 7, 5],
            [0, 1, 5, 4],
            [2, 3, 7, 6],
            [0, 1, 3, 2],
            [4, 5, 7, 6],
        ]
        .into_iter()
        .map(|vertices| Face {
            site: None,
            vertices: vertices.to_vec(),
        })
        .collect();

        Self { vertices, faces }
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3<f64>] {
        &self.vertices
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.faces.is_empty()
    }

    /// Whether any face of the bounding cube survives.
    pub fn has_boundary_faces(&self) -> bool {
        self.faces.iter().any(|f| f.site.is_none())
    }

    /// Distance from the origin beyond which no sphere of radius at most
    /// `max_radius` can cut this cell, given the cell's own atom radius.
    pub fn reach(&self, own_radius: f64, max_radius: f64) -> f64 {
        self.vertices
            .iter()
            .map(|v| {
                let own_power = own_radius.mul_add(-own_radius, v.coords.norm_squared());
                let slack = max_radius.mul_add(max_radius, own_power).max(0.0);
                v.coords.norm() + slack.sqrt()
            })
            .fold(0.0, f64::max)
    }

    /// Keep the part of the cell on the inside of `plane`, labelling the new
    /// face with `site`.
    pub fn cut(&mut self, plane: &Plane, site: usize) -> CutOutcome {
        let distances: Vec<f64> = self
            .vertices
            .iter()
            .map(|v| plane.signed_distance(v))
            .collect();
        let outside: Vec<bool> = distances.iter().map(|&d| d > PLANE_EPSILON).collect();

        if !outside.iter().any(|&o| o) {
            return CutOutcome::Unchanged;
        }
        if distances.iter().all(|&d| d >= -PLANE_EPSILON) {
            self.vertices.clear();
            self.faces.clear();
            return CutOutcome::Emptied;
        }

        let mut crossings: HashMap<(usize, usize), usize> = HashMap::new();
        let mut cap: Vec<usize> = Vec::new();
        let mut faces = Vec::with_capacity(self.faces.len() + 1);

        for face in &self.faces {
            let n = face.vertices.len();
            let mut polygon = Vec::with_capacity(n + 1);

            for k in 0..n {
                let a = face.vertices[k];
                let b = face.vertices[(k + 1) % n];

                if !outside[a] {
                    polygon.push(a);
                    if distances[a] >= -PLANE_EPSILON {
                        cap.push(a);
                    }
                }

                if outside[a] != outside[b] {
                    let inner = if outside[a] { b } else { a };
                    // A vertex on the plane already marks the crossing
                    if distances[inner] < -PLANE_EPSILON {
                        let key = (a.min(b), a.max(b));
                        let index = *crossings.entry(key).or_insert_with(|| {
                            let p = intersection_of_plane_and_segment(
                                &self.vertices[a],
                                &self.vertices[b],
                                distances[a],
                                distances[b],
                            );
                            self.vertices.push(p);
                            self.vertices.len() - 1
                        });
                        polygon.push(index);
                        cap.push(index);
                    }
                }
            }

            polygon.dedup();
            if polygon.len() >= 3 {
                faces.push(Face {
                    site: face.site,
                    vertices: polygon,
                });
            }
        }

        cap.sort_unstable();
        cap.dedup();
        if cap.len() >= 3 {
            let ordered = order_around_normal(&self.vertices, cap, &plane.normal);
            faces.push(Face {
                site: Some(site),
                vertices: ordered,
            });
        }

        self.faces = faces;
        self.compact();

        if self.faces.len() < 4 {
            self.vertices.clear();
            self.faces.clear();
            return CutOutcome::Emptied;
        }
        CutOutcome::Cut
    }

    /// Drop vertices no face refers to and renumber the rest.
    fn compact(&mut self) {
        let mut remap = vec![usize::MAX; self.vertices.len()];
        let mut vertices = Vec::with_capacity(self.vertices.len());
        for face in &mut self.faces {
            for v in &mut face.vertices {
                if remap[*v] == usize::MAX {
                    remap[*v] = vertices.len();
                    vertices.push(self.vertices[*v]);
                }
                *v = remap[*v];
            }
        }
        self.vertices = vertices;
    }

    /// For every vertex, the sites of the faces meeting there (ascending,
    /// bounding-cube faces omitted).
    pub fn vertex_sites(&self) -> Vec<Vec<usize>> {
        let mut sites = vec![Vec::new(); self.vertices.len()];
        for face in &self.faces {
            if let Some(site) = face.site {
                for &v in &face.vertices {
                    sites[v].push(site);
                }
            }
        }
        for list in &mut sites {
            list.sort_unstable();
            list.dedup();
        }
        sites
    }

    /// Every edge once, ordered by endpoint indices.
    pub fn edges(&self) -> Vec<CellEdge> {
        let mut edges: BTreeMap<(usize, usize), Vec<usize>> = BTreeMap::new();
        for face in &self.faces {
            let n = face.vertices.len();
            for k in 0..n {
                let (a, b) = (face.vertices[k], face.vertices[(k + 1) % n]);
                let entry = edges.entry((a.min(b), a.max(b))).or_default();
                if let Some(site) = face.site
                    && !entry.contains(&site)
                {
                    entry.push(site);
                }
            }
        }
        edges
            .into_iter()
            .map(|((a, b), mut sites)| {
                sites.sort_unstable();
                CellEdge { a, b, sites }
            })
            .collect()
    }

    /// Area-weighted centroid and area of every labelled face with
    /// non-zero area.
    pub fn face_geometry(&self) -> Vec<FaceGeometry> {
        self.faces
            .iter()
            .filter_map(|face| {
                let site = face.site?;
                let first = self.vertices[face.vertices[0]];
                let (weighted, area) = face.vertices[1..].windows(2).fold(
                    (Vector3::zeros(), 0.0),
                    |(weighted, area), w| {
                        let (b, c) = (self.vertices[w[0]], self.vertices[w[1]]);
                        let triangle = (b - first).cross(&(c - first)).norm() / 2.0;
                        let centroid = (first.coords + b.coords + c.coords) / 3.0;
                        (weighted + centroid * triangle, area + triangle)
                    },
                );
                (area > PLANE_EPSILON).then(|| FaceGeometry {
                    site,
                    centroid: Point3::from(weighted / area),
                    area,
                })
            })
            .collect()
    }

    /// Enclosed volume.
    #[allow(clippy::cast_precision_loss)]
    pub fn volume(&self) -> f64 {
        if self.vertices.is_empty() {
            return 0.0;
        }
        let centroid = Point3::from(
            self.vertices.iter().map(|v| v.coords).sum::<Vector3<f64>>()
                / self.vertices.len() as f64,
        );
        self.faces
            .iter()
            .map(|face| {
                let first = &self.vertices[face.vertices[0]];
                face.vertices[1..]
                    .windows(2)
                    .map(|w| {
                        tetrahedron_volume(
                            &centroid,
                            first,
                            &self.vertices[w[0]],
                            &self.vertices[w[1]],
                        )
                    })
                    .sum::<f64>()
            })
            .sum()
    }
}

/// Sort coplanar points by angle around their centroid.
#[allow(clippy::cast_precision_loss)]
fn order_around_normal(
    vertices: &[Point3<f64>],
    mut indices: Vec<usize>,
    normal: &Vector3<f64>,
) -> Vec<usize> {
    let centroid = indices
        .iter()
        .map(|&i| vertices[i].coords)
        .sum::<Vector3<f64>>()
        / indices.len() as f64;
    let u = any_normal_of_vector(normal);
    let w = normal.cross(&u);
    let angle = |i: usize| {
        let d = vertices[i].coords - centroid;
        d.dot(&w).atan2(d.dot(&u))
    };
    indices.sort_by(|&a, &b| angle(a).total_cmp(&angle(b)).then(a.cmp(&b)));
    indices
}
