//! Desktop click-drag of stations across a horizontal plane.
//!
//! The pointer ray is projected onto a plane at the station's resting
//! height. The resulting point, after optional grid snap and the circular
//! boundary clamp, becomes the drag *target*; the station itself follows it
//! through a damped spring so motion lags slightly behind the cursor.

use glam::Vec3;
use tracing::{debug, info};

use crate::command::{Command, CommandStack};
use crate::config::DragConfig;
use crate::geometry::{Ray, clamp_to_radius, ray_plane_y, snap_within_radius};
use crate::input::SourceId;
use crate::station::StationSet;

#[derive(Debug, Clone, PartialEq)]
struct DragSession {
    station: String,
    start: Vec3,
    /// Horizontal offset from the plane hit to the station centre
    offset: Vec3,
    plane_height: f32,
    target: Vec3,
    position: Vec3,
    velocity: Vec3,
}

/// Outcome of one spring step
#[derive(Debug, Clone, PartialEq)]
pub enum DragStep {
    Inactive,
    Moved(Vec3),
    /// The station disappeared mid-drag; the session was dropped.
    Lost(String),
}

#[derive(Debug, Clone)]
pub struct DragController {
    config: DragConfig,
    enabled: bool,
    session: Option<DragSession>,
}

impl DragController {
    pub fn new(config: DragConfig) -> Self {
        Self {
            config,
            enabled: true,
            session: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Cancel any drag in flight and stop accepting new ones.
    pub fn disable(&mut self, stations: &mut StationSet) -> Option<String> {
        self.enabled = false;
        self.cancel(stations)
    }

    pub fn is_active(&self) -> bool {
        self.session.is_some()
    }

    /// Id of the station being dragged.
    pub fn station(&self) -> Option<&str> {
        self.session.as_ref().map(|s| s.station.as_str())
    }

    /// Where the station will land if the drag ends now.
    pub fn ghost_position(&self) -> Option<Vec3> {
        self.session.as_ref().map(|s| s.target)
    }

    pub fn begin(&mut self, stations: &mut StationSet, id: &str, ray: &Ray) -> bool {
        if !self.enabled || self.session.is_some() {
            return false;
        }

        let Some(start) = stations.position(id) else {
            debug!("drag: no station {id}");
            return false;
        };

        let Some(hit) = ray_plane_y(ray, start.y) else {
            debug!("drag: pointer ray misses the plane at y={}", start.y);
            return false;
        };

        if !stations.try_acquire(id, SourceId::Pointer) {
            return false;
        }
        stations.set_dragging(id, true);

        let mut offset = start - hit;
        offset.y = 0.0;

        self.session = Some(DragSession {
            station: id.to_string(),
            start,
            offset,
            plane_height: start.y,
            target: start,
            position: start,
            velocity: Vec3::ZERO,
        });
        debug!("drag started on {id} at {start}");
        true
    }

    /// Re-project the pointer and move the drag target. Returns false if
    /// no drag is active or the ray misses the plane (the previous target
    /// is kept).
    pub fn update(&mut self, ray: &Ray) -> bool {
        let Some(session) = self.session.as_ref() else {
            return false;
        };
        let Some(hit) = ray_plane_y(ray, session.plane_height) else {
            return false;
        };

        let plane_height = session.plane_height;
        let mut point = self.bounded(hit + session.offset);
        point.y = plane_height;

        if let Some(session) = self.session.as_mut() {
            session.target = point;
        }
        true
    }

    /// Boundary clamp, then grid snap when enabled, never leaving the circle.
    fn bounded(&self, point: Vec3) -> Vec3 {
        if self.config.snap_to_grid {
            snap_within_radius(point, self.config.grid_size, self.config.boundary_radius)
        } else {
            clamp_to_radius(point, self.config.boundary_radius)
        }
    }

    /// Advance the spring and write the new position into the station.
    pub fn step(&mut self, stations: &mut StationSet, dt: f32) -> DragStep {
        let Some(session) = self.session.as_mut() else {
            return DragStep::Inactive;
        };

        let accel = -self.config.stiffness * (session.position - session.target);
        session.velocity += accel * dt;
        session.velocity *= self.config.damping;
        session.position += session.velocity * dt;

        if stations.set_position(&session.station, session.position) {
            DragStep::Moved(session.position)
        } else {
            let id = session.station.clone();
            debug!("drag: station {id} removed mid-drag");
            self.session = None;
            DragStep::Lost(id)
        }
    }

    /// Commit the drag. A `Move` command is pushed when the final position
    /// differs from the start.
    pub fn end(&mut self, stations: &mut StationSet, history: &mut CommandStack) -> Option<Command> {
        let session = self.session.take()?;

        let mut landing = self.bounded(session.target);
        landing.y = session.plane_height;

        if !stations.set_position(&session.station, landing) {
            debug!("drag: station {} vanished before commit", session.station);
            return None;
        }
        stations.set_dragging(&session.station, false);
        stations.release(&session.station, SourceId::Pointer);

        if landing == session.start {
            return None;
        }

        let command = Command::moved(session.station, session.start, landing);
        info!("drag committed {} {} -> {}", command.target, command.before, command.after);
        history.push(command.clone());
        Some(command)
    }

    /// Abort without recording anything. The station goes back to where
    /// the drag began.
    pub fn cancel(&mut self, stations: &mut StationSet) -> Option<String> {
        let session = self.session.take()?;
        stations.set_position(&session.station, session.start);
        stations.set_dragging(&session.station, false);
        stations.release(&session.station, SourceId::Pointer);
        debug!("drag cancelled on {}", session.station);
        Some(session.station)
    }
}
