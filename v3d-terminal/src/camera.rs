/// Camera framing and model orbit for the terminal view
use nalgebra::{Matrix4, Point3, Vector3, Vector4};

/// Terminal cells are roughly twice as tall as they are wide
const CELL_ASPECT: f32 = 0.5;

/// Perspective camera looking at the model from the (+x, -y, +z) octant, Z up
pub struct Camera {
    pub position: Point3<f32>,
    pub target: Point3<f32>,
    pub up: Vector3<f32>,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Camera {
    pub fn new(columns: u16, rows: u16) -> Self {
        Self {
            position: Point3::new(5.0, -5.0, 5.0),
            target: Point3::origin(),
            up: Vector3::z(),
            fov: std::f32::consts::FRAC_PI_4,
            aspect: Self::aspect_for(columns, rows),
            near: 0.1,
            far: 10000.0,
        }
    }

    fn aspect_for(columns: u16, rows: u16) -> f32 {
        columns.max(1) as f32 * CELL_ASPECT / rows.max(1) as f32
    }

    /// Update the aspect ratio after the terminal was resized
    pub fn resize(&mut self, columns: u16, rows: u16) {
        self.aspect = Self::aspect_for(columns, rows);
    }

    /// Aim at the centre of a bounding box from far enough away to see all of it
    pub fn frame_bounds(&mut self, min: Point3<f64>, max: Point3<f64>) {
        let min = min.cast::<f32>();
        let max = max.cast::<f32>();
        let center = nalgebra::center(&min, &max);
        let radius = ((max - min).norm() * 0.5).max(1e-3);
        let distance = radius / (self.fov * 0.5).sin() * 1.1;
        let direction = Vector3::new(1.0, -1.0, 1.0).normalize();
        self.target = center;
        self.position = center + direction * distance;
        self.near = (distance - radius).max(distance * 1e-3);
        self.far = distance + radius * 2.0;
    }

    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.target, &self.up)
    }

    pub fn projection_matrix(&self) -> Matrix4<f32> {
        Matrix4::new_perspective(self.aspect, self.fov, self.near, self.far)
    }

    /// Project a model-space point to (column, row, depth); `None` when behind
    /// the camera or outside the view.
    pub fn project_to_screen(
        &self,
        point: &Point3<f32>,
        model_matrix: &Matrix4<f32>,
        columns: usize,
        rows: usize,
    ) -> Option<(f32, f32, f32)> {
        let mvp = self.projection_matrix() * self.view_matrix() * model_matrix;
        let clip = mvp * Vector4::new(point.x, point.y, point.z, 1.0);
        if clip.w <= 1e-6 {
            return None;
        }

        let ndc = clip.xyz() / clip.w;
        if ndc.z < -1.0 || ndc.z > 1.0 {
            return None;
        }

        let x = (ndc.x + 1.0) * 0.5 * columns as f32;
        let y = (1.0 - ndc.y) * 0.5 * rows as f32;
        Some((x, y, ndc.z))
    }
}

/// Interactive rotation of the model about its own centre
#[derive(Debug, Clone, Copy)]
pub struct Orbit {
    /// Rotation about the vertical (Z) axis, radians
    pub yaw: f32,
    /// Rotation about the camera's horizontal axis, radians
    pub pitch: f32,
    pub center: Point3<f32>,
}

impl Orbit {
    pub fn new(center: Point3<f32>) -> Self {
        Self {
            yaw: 0.0,
            pitch: 0.0,
            center,
        }
    }

    /// Rotate by the given deltas, keeping pitch short of the poles.
    pub fn rotate(&mut self, d_yaw: f32, d_pitch: f32) {
        let limit = std::f32::consts::FRAC_PI_2 - 0.01;
        self.yaw = (self.yaw + d_yaw) % std::f32::consts::TAU;
        self.pitch = (self.pitch + d_pitch).clamp(-limit, limit);
    }

    pub fn model_matrix(&self) -> Matrix4<f32> {
        let to_origin = Matrix4::new_translation(&-self.center.coords);
        let back = Matrix4::new_translation(&self.center.coords);
        let yaw = Matrix4::new_rotation(Vector3::z() * self.yaw);
        // Pitch about the axis perpendicular to the default view direction
        let axis = Vector3::new(1.0, 1.0, 0.0).normalize();
        let pitch = Matrix4::new_rotation(axis * self.pitch);
        back * pitch * yaw * to_origin
    }
}

impl Default for Orbit {
    fn default() -> Self {
        Self::new(Point3::origin())
    }
}
