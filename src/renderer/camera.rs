use glam::{Mat4, Vec2, Vec3};

use crate::config::CameraConfig;

const MAX_PITCH_DEGREES: f32 = 89.0;

/// Orbits `target` at a fixed distance; dragging changes yaw and pitch.
pub struct Camera {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,

    pub target: Vec3,
    pub orbital_distance: f32,

    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,

    pub mouse_sensitivity: f32,
    pub zoom_speed: f32,
    pub enable_zoom: bool,
    pub min_distance: f32,
    pub max_distance: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_config(&CameraConfig::default())
    }
}

impl Camera {
    pub fn from_config(config: &CameraConfig) -> Self {
        let mut camera = Self {
            position: Vec3::from(config.position),
            yaw: 0.0,
            pitch: 0.0,

            target: Vec3::ZERO,
            orbital_distance: 1.0,

            fov: config.fov_degrees.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.1,
            far: 1000.0,

            mouse_sensitivity: 0.005,
            zoom_speed: 0.5,
            enable_zoom: config.enable_zoom,
            min_distance: 1.0,
            max_distance: 50.0,
        };
        camera.look_from(camera.position);
        camera
    }

    /// Re-derives yaw, pitch and distance so the camera sits at `position`.
    pub fn look_from(&mut self, position: Vec3) {
        let offset = position - self.target;
        self.orbital_distance = offset.length().max(self.near);

        let dir = offset.try_normalize().unwrap_or(Vec3::Z);
        self.yaw = dir.z.atan2(dir.x);
        self.pitch = dir.y.asin();

        self.update_orbital_position();
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection_matrix(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    pub fn process_mouse_movement(&mut self, delta: Vec2) {
        self.yaw += delta.x * self.mouse_sensitivity;
        self.pitch += delta.y * self.mouse_sensitivity;

        let max_pitch = MAX_PITCH_DEGREES.to_radians();
        self.pitch = self.pitch.clamp(-max_pitch, max_pitch);

        self.update_orbital_position();
    }

    pub fn process_scroll(&mut self, delta: f32) {
        if !self.enable_zoom {
            return;
        }
        self.orbital_distance = (self.orbital_distance - delta * self.zoom_speed)
            .clamp(self.min_distance, self.max_distance);
        self.update_orbital_position();
    }

    fn update_orbital_position(&mut self) {
        self.position = self.target
            + Vec3::new(
                self.orbital_distance * self.yaw.cos() * self.pitch.cos(),
                self.orbital_distance * self.pitch.sin(),
                self.orbital_distance * self.yaw.sin() * self.pitch.cos(),
            );
    }

    pub fn set_aspect(&mut self, width: f32, height: f32) {
        self.aspect = width / height.max(1.0);
    }
}

#[repr(C)]
#[derive(Clone, Copy, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub camera_pos: [f32; 3],
    pub _padding: f32,
    pub viewport: [f32; 2],
    pub _padding2: [f32; 2],
}

impl CameraUniform {
    pub fn from_camera(camera: &Camera, viewport: [f32; 2]) -> Self {
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array_2d(),
            camera_pos: camera.position.to_array(),
            _padding: 0.0,
            viewport,
            _padding2: [0.0; 2],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starts_at_configured_position() {
        let camera = Camera::default();
        assert!((camera.position - Vec3::new(0.0, 2.0, 5.0)).length() < 1e-5);
        assert!((camera.orbital_distance - 29.0_f32.sqrt()).abs() < 1e-5);
        assert!((camera.fov - 60.0_f32.to_radians()).abs() < 1e-6);
    }

    #[test]
    fn orbiting_keeps_distance_to_target() {
        let mut camera = Camera::default();
        let distance = camera.orbital_distance;
        camera.process_mouse_movement(Vec2::new(120.0, -40.0));
        assert!((camera.position.distance(camera.target) - distance).abs() < 1e-4);
    }

    #[test]
    fn pitch_is_clamped_short_of_the_pole() {
        let mut camera = Camera::default();
        camera.process_mouse_movement(Vec2::new(0.0, 100_000.0));
        assert!(camera.pitch <= MAX_PITCH_DEGREES.to_radians() + 1e-6);
        assert!(camera.view_matrix().is_finite());
    }

    #[test]
    fn scroll_is_ignored_when_zoom_disabled() {
        let mut camera = Camera::default();
        let before = camera.orbital_distance;
        camera.process_scroll(3.0);
        assert_eq!(camera.orbital_distance, before);

        camera.enable_zoom = true;
        camera.process_scroll(3.0);
        assert!(camera.orbital_distance < before);
        camera.process_scroll(-1000.0);
        assert_eq!(camera.orbital_distance, camera.max_distance);
    }

    #[test]
    fn uniform_carries_viewport() {
        let camera = Camera::default();
        let u = CameraUniform::from_camera(&camera, [1600.0, 900.0]);
        assert_eq!(u.viewport, [1600.0, 900.0]);
        assert_eq!(std::mem::size_of::<CameraUniform>(), 96);
    }
}
