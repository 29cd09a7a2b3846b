//! Pointer-capture mouse look with WASD/fly movement for the desktop rig.

use std::f32::consts::{PI, TAU};

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::config::{DesktopConfig, PlayAreaConfig};
use crate::geometry::{ease_out_cubic, smooth_toward};
use crate::viewpoint::Viewpoint;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveKey {
    Forward,
    Back,
    Left,
    Right,
    Up,
    Down,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct MovementKeys {
    forward: bool,
    back: bool,
    left: bool,
    right: bool,
    up: bool,
    down: bool,
}

impl MovementKeys {
    fn set(&mut self, key: MoveKey, pressed: bool) {
        match key {
            MoveKey::Forward => self.forward = pressed,
            MoveKey::Back => self.back = pressed,
            MoveKey::Left => self.left = pressed,
            MoveKey::Right => self.right = pressed,
            MoveKey::Up => self.up = pressed,
            MoveKey::Down => self.down = pressed,
        }
    }

    fn axis(positive: bool, negative: bool) -> f32 {
        (positive as i8 - negative as i8) as f32
    }
}

#[derive(Debug, Clone, Copy)]
struct FocusAnimation {
    from: Vec3,
    to: Vec3,
    from_yaw: f32,
    yaw_delta: f32,
    from_pitch: f32,
    to_pitch: f32,
    elapsed: f32,
    duration: f32,
}

/// Wrap an angle difference into (-PI, PI]
fn shortest_angle(delta: f32) -> f32 {
    (delta + PI).rem_euclid(TAU) - PI
}

#[derive(Debug, Clone)]
pub struct DesktopLocomotion {
    config: DesktopConfig,
    enabled: bool,
    locked: bool,
    keys: MovementKeys,
    sprint: bool,
    velocity: Vec3,
    focus: Option<FocusAnimation>,
}

impl DesktopLocomotion {
    pub fn new(config: DesktopConfig) -> Self {
        Self {
            config,
            enabled: true,
            locked: false,
            keys: MovementKeys::default(),
            sprint: false,
            velocity: Vec3::ZERO,
            focus: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Release capture and drop all motion state.
    pub fn disable(&mut self) {
        self.unlock();
        self.velocity = Vec3::ZERO;
        self.focus = None;
        self.enabled = false;
    }

    /// Enter pointer capture (on click). Returns false while disabled.
    pub fn lock(&mut self) -> bool {
        if !self.enabled {
            return false;
        }
        self.locked = true;
        true
    }

    /// Leave pointer capture (escape/cancel).
    pub fn unlock(&mut self) {
        self.locked = false;
        // a key released while capture was lost never reaches us
        self.keys = MovementKeys::default();
        self.sprint = false;
    }

    /// The platform dropped capture on its own.
    pub fn capture_lost(&mut self) {
        debug!("pointer capture lost, clearing movement keys");
        self.unlock();
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    /// Movement keys only register while the pointer is captured.
    pub fn set_key(&mut self, key: MoveKey, pressed: bool) {
        if self.locked {
            self.keys.set(key, pressed);
        }
    }

    pub fn set_sprint(&mut self, sprint: bool) {
        if self.locked {
            self.sprint = sprint;
        }
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn is_focusing(&self) -> bool {
        self.focus.is_some()
    }

    /// Relative pointer motion in pixels.
    pub fn look(&mut self, delta: Vec2, viewpoint: &mut Viewpoint) {
        if !self.enabled || !self.locked || self.focus.is_some() {
            return;
        }
        let max_pitch = self.config.max_pitch_deg.to_radians();
        viewpoint.yaw -= delta.x * self.config.look_sensitivity;
        viewpoint.pitch =
            (viewpoint.pitch - delta.y * self.config.look_sensitivity).clamp(-max_pitch, max_pitch);
    }

    /// Animate the viewpoint to a spot in front of `target`, ending up
    /// looking at it. Input-driven movement is suspended until it lands.
    pub fn focus_on(&mut self, target: Vec3, viewpoint: &Viewpoint) -> bool {
        if !self.enabled {
            return false;
        }

        let mut away = viewpoint.position - target;
        away.y = 0.0;
        let away = away.try_normalize().unwrap_or(Vec3::Z);
        let to = target + away * self.config.focus_distance + Vec3::Y * self.config.focus_height;

        let end = Viewpoint {
            position: to,
            ..*viewpoint
        };
        let (to_yaw, to_pitch) = end
            .angles_toward(target)
            .unwrap_or((viewpoint.yaw, viewpoint.pitch));

        self.focus = Some(FocusAnimation {
            from: viewpoint.position,
            to,
            from_yaw: viewpoint.yaw,
            yaw_delta: shortest_angle(to_yaw - viewpoint.yaw),
            from_pitch: viewpoint.pitch,
            to_pitch,
            elapsed: 0.0,
            duration: self.config.focus_duration,
        });
        self.velocity = Vec3::ZERO;
        true
    }

    pub fn update(&mut self, dt: f32, area: &PlayAreaConfig, viewpoint: &mut Viewpoint) {
        if !self.enabled {
            return;
        }

        if let Some(mut focus) = self.focus.take() {
            focus.elapsed += dt;
            let t = ease_out_cubic(focus.elapsed / focus.duration);
            viewpoint.position = focus.from.lerp(focus.to, t);
            viewpoint.yaw = focus.from_yaw + focus.yaw_delta * t;
            viewpoint.pitch = focus.from_pitch + (focus.to_pitch - focus.from_pitch) * t;
            if focus.elapsed < focus.duration {
                self.focus = Some(focus);
            }
            return;
        }

        let keys = &self.keys;
        let forward = MovementKeys::axis(keys.forward, keys.back);
        let strafe = MovementKeys::axis(keys.right, keys.left);
        let lift = MovementKeys::axis(keys.up, keys.down);

        let direction = (viewpoint.flat_forward() * forward
            + viewpoint.right() * strafe
            + Vec3::Y * lift)
            .normalize_or_zero();

        let mut speed = self.config.base_speed;
        if self.sprint {
            speed *= self.config.sprint_multiplier;
        }

        self.velocity = smooth_toward(self.velocity, direction * speed, self.config.smoothing, dt);
        viewpoint.position += self.velocity * dt;
        viewpoint.clamp_to_play_area(area);
    }
}
