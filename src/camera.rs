//! Camera, projection and the fly-camera controller.
//!
//! The camera is stored as a position plus yaw/pitch so that mouse look and
//! keyboard movement stay independent. [`SceneUniform`] is what the shaders see
//! at bind group 0.

use std::f32::consts::FRAC_PI_2;

use cgmath::{InnerSpace, Matrix4, Point3, Rad, Vector3, perspective};
use instant::Duration;
use winit::keyboard::KeyCode;

use crate::{config::ControllerConfig, input::Input};

/// cgmath builds OpenGL clip space (z in -1..1), wgpu expects z in 0..1.
#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: Matrix4<f32> = Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.0,
    0.0, 0.0, 0.5, 1.0,
);

/// Pitch is kept just short of straight up/down so the view never flips.
const SAFE_FRAC_PI_2: f32 = FRAC_PI_2 - 0.0174533;

#[derive(Debug, Clone, Copy)]
pub struct Camera {
    pub position: Point3<f32>,
    yaw: Rad<f32>,
    pitch: Rad<f32>,
}

impl Camera {
    pub fn new<V: Into<Point3<f32>>, Y: Into<Rad<f32>>, P: Into<Rad<f32>>>(
        position: V,
        yaw: Y,
        pitch: P,
    ) -> Self {
        Self {
            position: position.into(),
            yaw: yaw.into(),
            pitch: clamp_pitch(pitch.into()),
        }
    }

    /// Camera at `position` whose front vector points at `target`.
    pub fn looking_at<V: Into<Point3<f32>>>(position: V, target: V) -> Self {
        let position = position.into();
        let direction = target.into() - position;
        if direction.magnitude2() <= f32::EPSILON {
            return Self::new(position, Rad(-FRAC_PI_2), Rad(0.0));
        }
        let direction = direction.normalize();
        let yaw = Rad(direction.z.atan2(direction.x));
        let pitch = Rad(direction.y.clamp(-1.0, 1.0).asin());
        Self::new(position, yaw, pitch)
    }

    pub fn yaw(&self) -> Rad<f32> {
        self.yaw
    }

    pub fn pitch(&self) -> Rad<f32> {
        self.pitch
    }

    pub fn front(&self) -> Vector3<f32> {
        let (sin_pitch, cos_pitch) = self.pitch.0.sin_cos();
        let (sin_yaw, cos_yaw) = self.yaw.0.sin_cos();
        Vector3::new(cos_yaw * cos_pitch, sin_pitch, sin_yaw * cos_pitch).normalize()
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_to_rh(self.position, self.front(), Vector3::unit_y())
    }
}

fn clamp_pitch(pitch: Rad<f32>) -> Rad<f32> {
    Rad(pitch.0.clamp(-SAFE_FRAC_PI_2, SAFE_FRAC_PI_2))
}

#[derive(Debug, Clone, Copy)]
pub struct Projection {
    aspect: f32,
    fovy: Rad<f32>,
    znear: f32,
    zfar: f32,
}

impl Projection {
    pub fn new<F: Into<Rad<f32>>>(width: u32, height: u32, fovy: F, znear: f32, zfar: f32) -> Self {
        Self {
            aspect: width as f32 / height.max(1) as f32,
            fovy: fovy.into(),
            znear,
            zfar,
        }
    }

    pub fn resize(&mut self, width: u32, height: u32) {
        if height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    pub fn calc_matrix(&self) -> Matrix4<f32> {
        OPENGL_TO_WGPU_MATRIX * perspective(self.fovy, self.aspect, self.znear, self.zfar)
    }
}

/// Free-flying camera: WASD on the view plane, space/shift along world up and
/// mouse look.
#[derive(Debug, Clone)]
pub struct CameraController {
    speed: f32,
    sensitivity: f32,
    rotate_horizontal: f32,
    rotate_vertical: f32,
}

impl CameraController {
    pub fn new(speed: f32, sensitivity: f32) -> Self {
        Self {
            speed,
            sensitivity,
            rotate_horizontal: 0.0,
            rotate_vertical: 0.0,
        }
    }

    /// Accumulates raw mouse motion until the next [`update`](Self::update).
    pub fn handle_mouse(&mut self, mouse_dx: f64, mouse_dy: f64) {
        self.rotate_horizontal += mouse_dx as f32;
        self.rotate_vertical += mouse_dy as f32;
    }

    pub fn update(&mut self, camera: &mut Camera, input: &Input, dt: Duration) {
        let dt = dt.as_secs_f32();
        let step = self.speed * dt;

        let front = camera.front();
        let right = front.cross(Vector3::unit_y()).normalize();

        camera.position += front * input.axis(KeyCode::KeyW, KeyCode::KeyS) * step;
        camera.position += right * input.axis(KeyCode::KeyD, KeyCode::KeyA) * step;
        camera.position += Vector3::unit_y() * input.axis(KeyCode::Space, KeyCode::ShiftLeft) * step;

        // Mouse y grows downwards, pitch grows upwards.
        camera.yaw += Rad::from(cgmath::Deg(self.rotate_horizontal * self.sensitivity));
        camera.pitch = clamp_pitch(
            camera.pitch - Rad::from(cgmath::Deg(self.rotate_vertical * self.sensitivity)),
        );

        self.rotate_horizontal = 0.0;
        self.rotate_vertical = 0.0;
    }
}

impl From<ControllerConfig> for CameraController {
    fn from(config: ControllerConfig) -> Self {
        Self::new(config.speed, config.sensitivity)
    }
}

/// Per-frame data shared by every pipeline at bind group 0.
#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    view: [[f32; 4]; 4],
    projection: [[f32; 4]; 4],
    camera_position: [f32; 3],
    // Due to uniforms requiring 16 byte (4 float) spacing, we need to use a padding field here
    _padding: u32,
    light: [f32; 3],
    _padding2: u32,
}

impl SceneUniform {
    pub fn new() -> Self {
        use cgmath::SquareMatrix;
        Self {
            view: Matrix4::identity().into(),
            projection: Matrix4::identity().into(),
            camera_position: [0.0; 3],
            _padding: 0,
            light: [0.0; 3],
            _padding2: 0,
        }
    }

    pub fn update_view_proj(&mut self, camera: &Camera, projection: &Projection) {
        self.view = camera.calc_matrix().into();
        self.projection = projection.calc_matrix().into();
        self.camera_position = camera.position.into();
    }

    pub fn set_light(&mut self, light: [f32; 3]) {
        self.light = light;
    }
}

impl Default for SceneUniform {
    fn default() -> Self {
        Self::new()
    }
}

/// Camera state together with the GPU objects that carry it to the shaders.
#[derive(Debug)]
pub struct CameraResources {
    pub camera: Camera,
    pub controller: Option<CameraController>,
    pub uniform: SceneUniform,
    pub buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    pub bind_group_layout: wgpu::BindGroupLayout,
}
