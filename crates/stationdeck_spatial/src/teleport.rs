//! Ballistic arc teleport with a two-phase screen fade.

use std::collections::HashMap;

use glam::Vec3;
use tracing::{debug, info};

use crate::config::TeleportConfig;
use crate::geometry::TeleportSurface;
use crate::input::{ControllerState, SourceId};
use crate::viewpoint::Viewpoint;

/// Colour hint for the arc and landing marker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArcTint {
    Valid,
    Invalid,
}

/// Latest arc sample for one controller
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TeleportState {
    /// Arc polyline, truncated at the first surface hit
    pub points: Vec<Vec3>,
    pub valid: bool,
    pub landing: Option<Vec3>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FadePhase {
    Idle,
    FadingOut { elapsed: f32, destination: Vec3 },
    FadingIn { elapsed: f32 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportCompleted {
    pub source: SourceId,
    pub from: Vec3,
    pub to: Vec3,
}

#[derive(Debug, Clone)]
pub struct ArcTeleport {
    config: TeleportConfig,
    enabled: bool,
    arcs: HashMap<SourceId, TeleportState>,
    fade: FadePhase,
    fade_source: Option<SourceId>,
}

impl ArcTeleport {
    pub fn new(config: TeleportConfig) -> Self {
        Self {
            config,
            enabled: true,
            arcs: HashMap::new(),
            fade: FadePhase::Idle,
            fade_source: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Clear every arc and abort any fade without moving the viewpoint.
    pub fn disable(&mut self) {
        self.enabled = false;
        self.arcs.clear();
        self.fade = FadePhase::Idle;
        self.fade_source = None;
    }

    pub fn state(&self, source: SourceId) -> Option<&TeleportState> {
        self.arcs.get(&source)
    }

    pub fn arc_tint(&self, source: SourceId) -> Option<ArcTint> {
        self.arcs.get(&source).map(|state| {
            if state.valid {
                ArcTint::Valid
            } else {
                ArcTint::Invalid
            }
        })
    }

    /// Forget a controller's arc (disconnect).
    pub fn clear_arc(&mut self, source: SourceId) {
        self.arcs.remove(&source);
    }

    /// Re-sample the arc for one controller against the teleport surfaces.
    pub fn update_arc(&mut self, controller: &ControllerState, surfaces: &[TeleportSurface]) {
        if !self.enabled || !controller.connected {
            self.arcs.remove(&controller.id());
            return;
        }

        let state = self.arcs.entry(controller.id()).or_default();
        state.points.clear();
        state.valid = false;
        state.landing = None;

        let start = controller.position;
        let velocity = controller.forward() * self.config.launch_speed;
        let gravity = Vec3::new(0.0, -self.config.gravity, 0.0);

        let mut prev = start;
        state.points.push(start);

        for i in 1..=self.config.steps {
            let t = i as f32 * self.config.step_time;
            let point = start + velocity * t + 0.5 * gravity * t * t;

            let hit = surfaces
                .iter()
                .filter_map(|s| s.intersect_segment(prev, point).map(|p| (s, p)))
                .min_by(|(_, a), (_, b)| {
                    a.distance_squared(prev).total_cmp(&b.distance_squared(prev))
                });

            if let Some((surface, at)) = hit {
                state.points.push(at);
                // exactly at the threshold counts as walkable
                state.valid = surface.normal.y >= self.config.min_up_normal;
                state.landing = state.valid.then_some(at);
                return;
            }

            state.points.push(point);
            prev = point;
        }
    }

    pub fn fade_phase(&self) -> FadePhase {
        self.fade
    }

    pub fn is_fading(&self) -> bool {
        self.fade != FadePhase::Idle
    }

    /// Start a teleport from `source`'s current arc. Refused while a fade
    /// is already running or the arc has no valid landing.
    pub fn request(&mut self, source: SourceId) -> bool {
        if !self.enabled || self.fade != FadePhase::Idle {
            return false;
        }
        let Some(destination) = self.arcs.get(&source).and_then(|s| s.landing) else {
            debug!("teleport: {source:?} has no valid landing");
            return false;
        };
        self.fade = FadePhase::FadingOut {
            elapsed: 0.0,
            destination,
        };
        self.fade_source = Some(source);
        true
    }

    /// Advance the fade. The viewpoint jumps at full opacity, and that
    /// frame reports the completed teleport.
    pub fn update_fade(&mut self, dt: f32, viewpoint: &mut Viewpoint) -> Option<TeleportCompleted> {
        let duration = self.config.fade_duration;
        match self.fade {
            FadePhase::Idle => None,
            FadePhase::FadingOut {
                elapsed,
                destination,
            } => {
                let elapsed = elapsed + dt;
                if elapsed < duration {
                    self.fade = FadePhase::FadingOut {
                        elapsed,
                        destination,
                    };
                    return None;
                }

                let from = viewpoint.position;
                viewpoint.position = destination;
                self.fade = FadePhase::FadingIn { elapsed: 0.0 };
                let source = self.fade_source.take()?;
                info!("teleported {from} -> {destination}");
                Some(TeleportCompleted {
                    source,
                    from,
                    to: destination,
                })
            }
            FadePhase::FadingIn { elapsed } => {
                let elapsed = elapsed + dt;
                self.fade = if elapsed < duration {
                    FadePhase::FadingIn { elapsed }
                } else {
                    FadePhase::Idle
                };
                None
            }
        }
    }

    /// Overlay opacity in [0, 1].
    pub fn opacity(&self) -> f32 {
        let duration = self.config.fade_duration;
        match self.fade {
            FadePhase::Idle => 0.0,
            FadePhase::FadingOut { elapsed, .. } => (elapsed / duration).min(1.0),
            FadePhase::FadingIn { elapsed } => (1.0 - elapsed / duration).max(0.0),
        }
    }

    /// The overlay is pinned to the viewpoint so it covers the whole view.
    pub fn overlay_position(&self, viewpoint: &Viewpoint) -> Vec3 {
        viewpoint.position
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::SurfaceShape;
    use crate::input::Handedness;

    fn pointer_at(position: Vec3) -> ControllerState {
        let mut c = ControllerState::new(Handedness::Right);
        c.position = position;
        c
    }

    fn tilted(normal_y: f32) -> TeleportSurface {
        TeleportSurface {
            id: "ramp".to_string(),
            center: Vec3::ZERO,
            normal: Vec3::new((1.0 - normal_y * normal_y).sqrt(), normal_y, 0.0),
            shape: SurfaceShape::Disc { radius: 50.0 },
        }
    }

    #[test]
    fn arc_lands_on_floor() {
        let mut tp = ArcTeleport::new(TeleportConfig::default());
        let floor = TeleportSurface::disc("floor", Vec3::ZERO, Vec3::Y, 20.0);
        let c = pointer_at(Vec3::new(0.0, 1.5, 0.0));

        tp.update_arc(&c, &[floor]);
        let state = tp.state(c.id()).expect("state");
        assert!(state.valid);
        let landing = state.landing.expect("landing");
        assert!(landing.y.abs() < 1e-4);
        assert!(landing.z < -4.0 && landing.z > -5.0);
        assert_eq!(state.points.last(), Some(&landing));
        assert!(state.points.len() < 31);
        assert_eq!(tp.arc_tint(c.id()), Some(ArcTint::Valid));
    }

    #[test]
    fn normal_threshold_is_inclusive() {
        let c = pointer_at(Vec3::new(0.0, 1.5, 0.0));

        let mut tp = ArcTeleport::new(TeleportConfig::default());
        tp.update_arc(&c, &[tilted(0.7)]);
        assert!(tp.state(c.id()).expect("state").valid);

        tp.update_arc(&c, &[tilted(0.69)]);
        let state = tp.state(c.id()).expect("state");
        assert!(!state.valid);
        assert_eq!(state.landing, None);
        assert_eq!(tp.arc_tint(c.id()), Some(ArcTint::Invalid));
        assert!(!tp.request(c.id()));
    }

    #[test]
    fn arc_into_the_sky_has_no_landing() {
        let mut tp = ArcTeleport::new(TeleportConfig::default());
        let floor = TeleportSurface::disc("floor", Vec3::ZERO, Vec3::Y, 20.0);
        let mut c = pointer_at(Vec3::new(0.0, 1.5, 0.0));
        c.orientation = glam::Quat::from_rotation_x(std::f32::consts::FRAC_PI_2);

        tp.update_arc(&c, &[floor]);
        let state = tp.state(c.id()).expect("state");
        assert!(!state.valid);
        assert_eq!(state.points.len(), 31);
    }

    #[test]
    fn two_phase_fade_moves_at_full_opacity() {
        let mut tp = ArcTeleport::new(TeleportConfig::default());
        let floor = TeleportSurface::disc("floor", Vec3::ZERO, Vec3::Y, 20.0);
        let c = pointer_at(Vec3::new(0.0, 1.5, 0.0));
        let mut vp = Viewpoint::new(Vec3::new(0.0, 0.0, 0.0));

        tp.update_arc(&c, &[floor]);
        let landing = tp.state(c.id()).and_then(|s| s.landing).expect("landing");

        assert!(tp.request(c.id()));
        assert!(!tp.request(c.id()));

        assert_eq!(tp.update_fade(0.1, &mut vp), None);
        assert!(tp.opacity() > 0.5 && tp.opacity() < 1.0);
        assert_eq!(vp.position, Vec3::ZERO);

        let done = tp.update_fade(0.1, &mut vp).expect("completed");
        assert_eq!(done.to, landing);
        assert_eq!(vp.position, landing);
        assert_eq!(tp.opacity(), 1.0);
        assert_eq!(tp.overlay_position(&vp), landing);

        tp.update_fade(0.2, &mut vp);
        assert_eq!(tp.fade_phase(), FadePhase::Idle);
        assert_eq!(tp.opacity(), 0.0);
    }

    #[test]
    fn disable_aborts_fade_in_place() {
        let mut tp = ArcTeleport::new(TeleportConfig::default());
        let floor = TeleportSurface::disc("floor", Vec3::ZERO, Vec3::Y, 20.0);
        let c = pointer_at(Vec3::new(0.0, 1.5, 0.0));
        let mut vp = Viewpoint::new(Vec3::new(1.0, 0.0, 1.0));

        tp.update_arc(&c, &[floor]);
        assert!(tp.request(c.id()));
        tp.update_fade(0.05, &mut vp);
        tp.disable();

        assert_eq!(tp.update_fade(1.0, &mut vp), None);
        assert_eq!(vp.position, Vec3::new(1.0, 0.0, 1.0));
        assert!(tp.state(c.id()).is_none());
    }
}
