/// Geometry primitives for 3D rendering
use nalgebra::{Point3, Vector3};
use std::f32::consts::TAU;

/// Triangles with less area than this are dropped when building meshes
const MIN_TRIANGLE_AREA: f32 = 1e-6;

/// A 3D vertex with position and normal
#[derive(Debug, Clone, Copy)]
pub struct Vertex {
    pub position: Point3<f32>,
    pub normal: Vector3<f32>,
}

impl Vertex {
    pub fn new(x: f32, y: f32, z: f32, nx: f32, ny: f32, nz: f32) -> Self {
        Self {
            position: Point3::new(x, y, z),
            normal: Vector3::new(nx, ny, nz),
        }
    }
}

/// A triangle face defined by three vertices
#[derive(Debug, Clone)]
pub struct Triangle {
    pub vertices: [Vertex; 3],
}

impl Triangle {
    pub fn new(v0: Vertex, v1: Vertex, v2: Vertex) -> Self {
        Self {
            vertices: [v0, v1, v2],
        }
    }

    fn edge_cross(&self) -> Vector3<f32> {
        let v0 = self.vertices[0].position;
        let edge1 = self.vertices[1].position - v0;
        let edge2 = self.vertices[2].position - v0;
        edge1.cross(&edge2)
    }

    /// Face normal from counter-clockwise winding
    pub fn calculate_normal(&self) -> Vector3<f32> {
        self.edge_cross().normalize()
    }

    pub fn area(&self) -> f32 {
        self.edge_cross().norm() * 0.5
    }

    pub fn centroid(&self) -> Point3<f32> {
        let sum = self.vertices[0].position.coords
            + self.vertices[1].position.coords
            + self.vertices[2].position.coords;
        Point3::from(sum / 3.0)
    }
}

/// A 3D mesh composed of triangles
#[derive(Debug, Clone)]
pub struct Mesh {
    pub triangles: Vec<Triangle>,
}

impl Mesh {
    pub fn new() -> Self {
        Self {
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            triangles: Vec::with_capacity(capacity),
        }
    }

    pub fn add_triangle(&mut self, triangle: Triangle) {
        self.triangles.push(triangle);
    }

    fn add_solid(&mut self, triangle: Triangle) {
        if triangle.area() > MIN_TRIANGLE_AREA {
            self.add_triangle(triangle);
        }
    }

    /// Capped cylinder section centered on the origin, axis along +Y.
    ///
    /// Ring vertex `k` sits at angle `2πk/n` measured from +Z towards +X, so
    /// with three segments the result is a triangular frustum (or a
    /// tetrahedron-like cone when `top_radius` is zero). Side normals are
    /// smooth per vertex, caps are flat. A cap is only emitted for a ring with
    /// a non-zero radius.
    pub fn frustum(top_radius: f32, bottom_radius: f32, height: f32, radial_segments: u32) -> Self {
        let segments = radial_segments.max(3) as usize;
        let half = height / 2.0;
        let slope = (bottom_radius - top_radius) / height;

        let ring = |radius: f32, y: f32| -> Vec<Vertex> {
            (0..=segments)
                .map(|k| {
                    let (sin, cos) = (k as f32 / segments as f32 * TAU).sin_cos();
                    let normal = Vector3::new(sin, slope, cos).normalize();
                    Vertex::new(radius * sin, y, radius * cos, normal.x, normal.y, normal.z)
                })
                .collect()
        };
        let top = ring(top_radius, half);
        let bottom = ring(bottom_radius, -half);

        let mut mesh = Self::with_capacity(segments * 4);
        for k in 0..segments {
            let (a, b, c, d) = (top[k], bottom[k], bottom[k + 1], top[k + 1]);
            mesh.add_solid(Triangle::new(a, b, d));
            mesh.add_solid(Triangle::new(b, c, d));
        }
        if top_radius > 0.0 {
            mesh.add_cap(top_radius, half, segments, true);
        }
        if bottom_radius > 0.0 {
            mesh.add_cap(bottom_radius, -half, segments, false);
        }
        mesh
    }

    fn add_cap(&mut self, radius: f32, y: f32, segments: usize, top: bool) {
        let ny = if top { 1.0 } else { -1.0 };
        let center = Vertex::new(0.0, y, 0.0, 0.0, ny, 0.0);
        let rim = |k: usize| {
            let (sin, cos) = (k as f32 / segments as f32 * TAU).sin_cos();
            Vertex::new(radius * sin, y, radius * cos, 0.0, ny, 0.0)
        };
        for k in 0..segments {
            let (p0, p1) = (rim(k), rim(k + 1));
            if top {
                self.add_solid(Triangle::new(p0, p1, center));
            } else {
                self.add_solid(Triangle::new(p1, p0, center));
            }
        }
    }

    /// Axis-aligned bounds, `None` for an empty mesh
    pub fn bounds(&self) -> Option<(Point3<f32>, Point3<f32>)> {
        let mut points = self
            .triangles
            .iter()
            .flat_map(|t| t.vertices.iter().map(|v| v.position));
        let first = points.next()?;
        Some(points.fold((first, first), |(lo, hi), p| {
            (
                Point3::new(lo.x.min(p.x), lo.y.min(p.y), lo.z.min(p.z)),
                Point3::new(hi.x.max(p.x), hi.y.max(p.y), hi.z.max(p.z)),
            )
        }))
    }

    pub fn vertex_count(&self) -> usize {
        self.triangles.len() * 3
    }
}

impl Default for Mesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_frustum_triangle_counts() {
        // 3 sides x 2 triangles + 3 top + 3 bottom
        assert_eq!(Mesh::frustum(2.3, 3.5, 1.7, 3).triangles.len(), 12);
        // apex: one side triangle per segment collapses, no top cap
        assert_eq!(Mesh::frustum(0.0, 1.1, 1.7, 3).triangles.len(), 6);
    }

    #[test]
    fn test_frustum_bounds() {
        let mesh = Mesh::frustum(1.3, 2.1, 1.5, 3);
        let (lo, hi) = mesh.bounds().unwrap();
        assert_relative_eq!(lo.y, -0.75);
        assert_relative_eq!(hi.y, 0.75);
        assert_relative_eq!(hi.z, 2.1, epsilon = 1e-5);
    }

    #[test]
    fn test_frustum_faces_point_outward() {
        let mesh = Mesh::frustum(2.3, 3.5, 1.7, 3);
        for triangle in &mesh.triangles {
            let normal = triangle.calculate_normal();
            let outward = triangle.centroid().coords;
            assert!(normal.dot(&outward) > 0.0, "inward face: {:?}", triangle);
        }
    }

    #[test]
    fn test_empty_bounds() {
        assert!(Mesh::new().bounds().is_none());
    }
}
