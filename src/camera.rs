// camera.rs - view parameters for the skybox

pub const MIN_FOV: f32 = 20.0;
pub const MAX_FOV: f32 = 120.0;
pub const MAX_PITCH: f32 = 89.9;

/// Orientation in degrees. Yaw 0 looks down +Z, positive yaw turns towards +X.
pub struct SkyboxCamera {
    pub yaw: f32,
    pub pitch: f32,
    pub fov: f32,
    pub exposure: f32,
    pub sensitivity_scale: f32,
    pub is_fullscreen: bool,
    default_fov: f32,
}

impl SkyboxCamera {
    pub fn new(fov: f32, exposure: f32) -> Self {
        let fov = fov.clamp(MIN_FOV, MAX_FOV);
        Self {
            yaw: 0.0,
            pitch: 0.0,
            fov,
            exposure,
            sensitivity_scale: 1.0,
            is_fullscreen: false,
            default_fov: fov,
        }
    }

    pub fn reset(&mut self) {
        self.yaw = 0.0;
        self.pitch = 0.0;
        self.fov = self.default_fov;
    }

    /// Drag by `(dx, dy)` pixels on a `width x height` view; the scene follows the cursor.
    pub fn drag(&mut self, dx: f32, dy: f32, width: f32, height: f32) {
        if width <= 0.0 || height <= 0.0 {
            return;
        }
        let v_f = self.fov.to_radians();
        let aspect = width / height;
        let h_f = 2.0 * ((v_f / 2.0).tan() * aspect).atan();

        let yaw_per_px_deg = (h_f / width).to_degrees();
        let pitch_per_px_deg = (v_f / height).to_degrees();

        self.yaw = (self.yaw - dx * yaw_per_px_deg * self.sensitivity_scale).rem_euclid(360.0);
        self.pitch = (self.pitch + dy * pitch_per_px_deg * self.sensitivity_scale)
            .clamp(-MAX_PITCH, MAX_PITCH);
    }

    /// Wheel zoom; positive `scroll` narrows the view.
    pub fn zoom(&mut self, scroll: f32) {
        self.fov = (self.fov - scroll * 2.5).clamp(MIN_FOV, MAX_FOV);
    }
}
