use glam::{Mat4, Vec2, Vec3};

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfacePoint {
    pub position: Vec3,
}

impl SurfacePoint {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DisplacedPoint {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl DisplacedPoint {
    pub fn to_array(self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

/// Subdivided plane in the local XY plane, facing +Z.
///
/// Points are stored row-major starting at the top edge (`y = +height / 2`),
/// which puts `v = 1` on the first row.
pub struct PlaneGeometry {
    pub points: Vec<SurfacePoint>,
    pub uvs: Vec<Vec2>,
    pub indices: Vec<u32>,
    pub columns: usize,
    pub rows: usize,
}

impl PlaneGeometry {
    pub fn new(width: f32, height: f32, segments_x: u32, segments_y: u32) -> Self {
        let segments_x = segments_x.max(1) as usize;
        let segments_y = segments_y.max(1) as usize;
        let columns = segments_x + 1;
        let rows = segments_y + 1;

        let half_w = width / 2.0;
        let half_h = height / 2.0;
        let dx = width / segments_x as f32;
        let dy = height / segments_y as f32;

        let mut points = Vec::with_capacity(columns * rows);
        let mut uvs = Vec::with_capacity(columns * rows);

        for iy in 0..rows {
            let y = half_h - iy as f32 * dy;
            for ix in 0..columns {
                let x = -half_w + ix as f32 * dx;
                points.push(SurfacePoint::new(Vec3::new(x, y, 0.0)));
                uvs.push(Vec2::new(
                    ix as f32 / segments_x as f32,
                    1.0 - iy as f32 / segments_y as f32,
                ));
            }
        }

        let mut plane = Self {
            points,
            uvs,
            indices: Vec::with_capacity(segments_x * segments_y * 6),
            columns,
            rows,
        };

        for iy in 0..segments_y {
            for ix in 0..segments_x {
                let tl = plane.index(ix, iy) as u32;
                let tr = plane.index(ix + 1, iy) as u32;
                let bl = plane.index(ix, iy + 1) as u32;
                let br = plane.index(ix + 1, iy + 1) as u32;

                plane.indices.extend_from_slice(&[tl, bl, tr, bl, br, tr]);
            }
        }

        plane
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn index(&self, column: usize, row: usize) -> usize {
        row * self.columns + column
    }
}

/// Lays the plane flat, turning local +Z into world +Y.
pub fn terrain_model_matrix() -> Mat4 {
    Mat4::from_rotation_x(-std::f32::consts::FRAC_PI_2)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plane_has_expected_counts() {
        let plane = PlaneGeometry::new(10.0, 10.0, 200, 200);
        assert_eq!(plane.len(), 201 * 201);
        assert_eq!(plane.uvs.len(), plane.len());
        assert_eq!(plane.indices.len(), 200 * 200 * 6);
        assert!(plane.indices.iter().all(|&i| (i as usize) < plane.len()));
    }

    #[test]
    fn plane_spans_extent_and_uv_square() {
        let plane = PlaneGeometry::new(10.0, 4.0, 5, 2);
        let first = plane.points[0].position;
        let last = plane.points[plane.len() - 1].position;
        assert_eq!(first, Vec3::new(-5.0, 2.0, 0.0));
        assert_eq!(last, Vec3::new(5.0, -2.0, 0.0));
        assert_eq!(plane.uvs[0], Vec2::new(0.0, 1.0));
        assert_eq!(plane.uvs[plane.len() - 1], Vec2::new(1.0, 0.0));

        let mid = plane.index(2, 1);
        assert_eq!(plane.points[mid].position, Vec3::new(-1.0, 0.0, 0.0));
        assert!((plane.uvs[mid].y - 0.5).abs() < 1e-6);
    }

    #[test]
    fn zero_segments_still_make_one_quad() {
        let plane = PlaneGeometry::new(1.0, 1.0, 0, 0);
        assert_eq!(plane.len(), 4);
        assert_eq!(plane.indices.len(), 6);
    }

    #[test]
    fn model_matrix_lifts_local_z_to_world_y() {
        let up = terrain_model_matrix().transform_vector3(Vec3::Z);
        assert!((up - Vec3::Y).length() < 1e-6);
        let forward = terrain_model_matrix().transform_point3(Vec3::new(0.0, 1.0, 0.0));
        assert!((forward - Vec3::new(0.0, 0.0, -1.0)).length() < 1e-6);
    }
}
