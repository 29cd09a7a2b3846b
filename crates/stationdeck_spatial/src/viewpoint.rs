//! The camera: where the user stands and looks, and how screen points
//! become world rays.

use glam::{Mat4, Vec2, Vec3, Vec4};

use crate::config::PlayAreaConfig;
use crate::geometry::{Ray, clamp_to_radius};

/// The camera/rig moved by locomotion components.
///
/// Yaw rotates around +Y, zero yaw looks down -Z. Pitch is positive when
/// looking up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewpoint {
    pub position: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub fov_y: f32,
    pub znear: f32,
    pub zfar: f32,
}

impl Default for Viewpoint {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 1.6, 10.0),
            yaw: 0.0,
            pitch: 0.0,
            fov_y: 60_f32.to_radians(),
            znear: 0.1,
            zfar: 1000.0,
        }
    }
}

impl Viewpoint {
    pub fn new(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    /// Look direction including pitch.
    pub fn forward(&self) -> Vec3 {
        Vec3::new(
            -self.yaw.sin() * self.pitch.cos(),
            self.pitch.sin(),
            -self.yaw.cos() * self.pitch.cos(),
        )
    }

    /// Look direction projected onto the ground plane.
    pub fn flat_forward(&self) -> Vec3 {
        Vec3::new(-self.yaw.sin(), 0.0, -self.yaw.cos())
    }

    /// Right direction (always horizontal).
    pub fn right(&self) -> Vec3 {
        Vec3::new(self.yaw.cos(), 0.0, -self.yaw.sin())
    }

    /// Yaw and pitch that would make the view face `target`.
    pub fn angles_toward(&self, target: Vec3) -> Option<(f32, f32)> {
        let dir = (target - self.position).normalize_or_zero();
        if dir == Vec3::ZERO {
            return None;
        }
        let yaw = (-dir.x).atan2(-dir.z);
        let pitch = dir.y.clamp(-1.0, 1.0).asin();
        Some((yaw, pitch))
    }

    pub fn look_at(&mut self, target: Vec3) {
        if let Some((yaw, pitch)) = self.angles_toward(target) {
            self.yaw = yaw;
            self.pitch = pitch;
        }
    }

    fn view_proj(&self, viewport: Vec2) -> Mat4 {
        let aspect = viewport.x / viewport.y.max(1.0);
        let proj = Mat4::perspective_rh(self.fov_y, aspect, self.znear, self.zfar);
        let view = Mat4::look_to_rh(self.position, self.forward(), Vec3::Y);
        proj * view
    }

    /// World-space ray through a viewport pixel, (0,0) being top-left.
    pub fn screen_ray(&self, screen: Vec2, viewport: Vec2) -> Ray {
        let ndc_x = (screen.x / viewport.x.max(1.0)) * 2.0 - 1.0;
        let ndc_y = 1.0 - (screen.y / viewport.y.max(1.0)) * 2.0;
        let inv_vp = self.view_proj(viewport).inverse();
        let near4 = inv_vp * Vec4::new(ndc_x, ndc_y, 0.0, 1.0);
        let far4 = inv_vp * Vec4::new(ndc_x, ndc_y, 1.0, 1.0);
        let near = near4.truncate() / near4.w;
        let far = far4.truncate() / far4.w;
        Ray::new(near, far - near)
    }

    /// Apply the floor and radial soft boundary.
    pub fn clamp_to_play_area(&mut self, area: &PlayAreaConfig) {
        self.position.y = self.position.y.max(area.min_height);
        self.position = clamp_to_radius(self.position, area.max_radius);
    }
}
