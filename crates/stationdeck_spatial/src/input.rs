//! Input sources: the desktop pointer, 6-DoF controllers and tracked hands.

use glam::{Quat, Vec2, Vec3};

use crate::geometry::Ray;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Handedness {
    Left,
    Right,
    None,
}

/// Stable identity of an input device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceId {
    Pointer,
    Controller(Handedness),
    Hand(Handedness),
}

/// Desktop pointer sample for one frame
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct PointerState {
    /// Position in viewport pixels, (0,0) top-left
    pub position: Vec2,
    /// Relative motion since the last sample (used while captured)
    pub delta: Vec2,
    pub primary_down: bool,
}

/// Tracked 6-DoF controller sample
#[derive(Debug, Clone, PartialEq)]
pub struct ControllerState {
    pub handedness: Handedness,
    pub connected: bool,
    pub position: Vec3,
    pub orientation: Quat,
    pub trigger: bool,
    pub squeeze: bool,
    /// Raw gamepad axes. Four-axis layouts carry the stick in 2/3,
    /// two-axis layouts in 0/1.
    pub axes: Vec<f32>,
}

impl ControllerState {
    pub fn new(handedness: Handedness) -> Self {
        Self {
            handedness,
            connected: true,
            position: Vec3::ZERO,
            orientation: Quat::IDENTITY,
            trigger: false,
            squeeze: false,
            axes: Vec::new(),
        }
    }

    pub fn id(&self) -> SourceId {
        SourceId::Controller(self.handedness)
    }

    /// Pointing direction (-Z in controller space).
    pub fn forward(&self) -> Vec3 {
        self.orientation * Vec3::NEG_Z
    }

    /// Thumbstick (x, y). Pushing forward is negative y.
    pub fn stick(&self) -> Vec2 {
        match self.axes.as_slice() {
            [_, _, x, y, ..] => Vec2::new(*x, *y),
            [x, y] | [x, y, _] => Vec2::new(*x, *y),
            _ => Vec2::ZERO,
        }
    }
}

/// The joints the gesture recognizer reads. Any of them may be
/// unavailable on a given frame.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct HandJoints {
    pub thumb_tip: Option<Vec3>,
    pub index_tip: Option<Vec3>,
    pub wrist: Option<Vec3>,
}

impl HandJoints {
    pub fn new(thumb_tip: Vec3, index_tip: Vec3, wrist: Vec3) -> Self {
        Self {
            thumb_tip: Some(thumb_tip),
            index_tip: Some(index_tip),
            wrist: Some(wrist),
        }
    }

    /// All three joints, or None if any is missing this frame.
    pub fn complete(&self) -> Option<(Vec3, Vec3, Vec3)> {
        Some((self.thumb_tip?, self.index_tip?, self.wrist?))
    }
}

/// Optically tracked hand sample
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct HandState {
    pub handedness: Handedness,
    pub connected: bool,
    pub joints: HandJoints,
}

impl HandState {
    pub fn new(handedness: Handedness, joints: HandJoints) -> Self {
        Self {
            handedness,
            connected: true,
            joints,
        }
    }

    pub fn id(&self) -> SourceId {
        SourceId::Hand(self.handedness)
    }
}

/// Something that can point into the world.
pub trait RaySource {
    fn world_ray(&self) -> Option<Ray>;
}

impl RaySource for ControllerState {
    fn world_ray(&self) -> Option<Ray> {
        self.connected
            .then(|| Ray::new(self.position, self.forward()))
    }
}

impl RaySource for HandState {
    /// Cast from the index tip along the wrist to index direction.
    fn world_ray(&self) -> Option<Ray> {
        if !self.connected {
            return None;
        }
        let index = self.joints.index_tip?;
        let wrist = self.joints.wrist?;
        let ray = Ray::new(index, index - wrist);
        (!ray.is_degenerate()).then_some(ray)
    }
}

/// External UI hit test (wrist menu, floating panels) offered a ray
/// before any object pick.
pub trait RayInterceptor {
    /// Returns true when the ray was consumed.
    fn intercept(&mut self, source: SourceId, ray: &Ray) -> bool;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Edge {
    Idle,
    Pressed,
    Held,
    Released,
}

/// Turns a sampled boolean into press/release edges.
#[derive(Debug, Clone, Copy, Default)]
pub struct ButtonEdge {
    down: bool,
}

impl ButtonEdge {
    pub fn sample(&mut self, down: bool) -> Edge {
        let edge = match (self.down, down) {
            (false, true) => Edge::Pressed,
            (true, true) => Edge::Held,
            (true, false) => Edge::Released,
            (false, false) => Edge::Idle,
        };
        self.down = down;
        edge
    }

    pub fn reset(&mut self) {
        self.down = false;
    }
}
