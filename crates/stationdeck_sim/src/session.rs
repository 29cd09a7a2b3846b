use glam::{Quat, Vec2, Vec3};
use stationdeck_spatial::{
    ControllerState, DriverMode, EventTopic, FrameInput, HandJoints, HandState, Handedness,
    InteractionCore, InteractionEvent, MoveKey, PointerState, Station, TeleportSurface,
};
use tracing::{debug, info, warn};

const DT: f32 = 1.0 / 60.0;

/// Scripted walk through every interaction path, driven one frame at a
/// time the way a renderer would.
pub struct Session {
    core: InteractionCore,
    now: f64,
    frames: u32,
}

impl Session {
    pub fn new(mut core: InteractionCore, frames: u32) -> Self {
        core.stations_mut()
            .insert(Station::new("comms", "Comms", Vec3::ZERO));
        core.stations_mut()
            .insert(Station::new("nav", "Navigation", Vec3::new(4.0, 0.0, -4.0)));
        core.stations_mut()
            .insert(Station::new("ops", "Operations", Vec3::new(0.0, 0.0, -4.0)));
        core.add_surface(TeleportSurface::disc("deck", Vec3::ZERO, Vec3::Y, 30.0));

        core.subscribe(
            EventTopic::All,
            Box::new(|e: &InteractionEvent| {
                info!(
                    "[{:.2}] {:?} station={:?} source={:?}",
                    e.timestamp, e.kind, e.station, e.source
                )
            }),
        );

        Self {
            core,
            now: 0.0,
            frames: frames.max(1),
        }
    }

    pub fn core(&self) -> &InteractionCore {
        &self.core
    }

    fn frame(&mut self, controllers: &[ControllerState], hands: &[HandState]) {
        self.now += DT as f64;
        self.core.update(&FrameInput {
            now: self.now,
            dt: DT,
            controllers,
            hands,
        });
    }

    fn desktop_frames(&mut self, n: u32) {
        for _ in 0..n {
            self.frame(&[], &[]);
        }
    }

    pub fn run(&mut self) {
        self.desktop();
        self.immersive();
        self.core.set_mode(DriverMode::Standard);

        let positions: Vec<String> = self
            .core
            .stations()
            .iter()
            .map(|s| format!("{}@{:.2?}", s.id, s.position))
            .collect();
        info!("session done: {}", positions.join(" "));
    }

    fn desktop(&mut self) {
        info!("desktop: drag comms");
        {
            let vp = self.core.viewpoint_mut();
            vp.position = Vec3::new(0.0, 5.0, 5.0);
            vp.pitch = -std::f32::consts::FRAC_PI_4;
        }
        let center = PointerState {
            position: Vec2::new(640.0, 360.0),
            delta: Vec2::ZERO,
            primary_down: true,
        };

        if !self.core.pointer_pressed(center) {
            warn!("nothing under the pointer, skipping drag");
        }
        for i in 1..=self.frames {
            let mut moved = center;
            moved.position.x += 150.0 * i as f32 / self.frames as f32;
            self.core.pointer_moved(moved);
            self.frame(&[], &[]);
        }
        match self.core.pointer_released() {
            Some(command) => info!("committed {:?} -> {:?}", command.before, command.after),
            None => debug!("drag released without moving"),
        }

        self.core.undo();
        self.core.redo();

        info!("desktop: fly");
        // empty sky under the pointer, so the press captures it
        let sky = PointerState {
            position: Vec2::new(640.0, 20.0),
            ..Default::default()
        };
        self.core.pointer_pressed(sky);
        self.core.key(MoveKey::Forward, true);
        self.core.sprint(true);
        self.desktop_frames(self.frames);
        self.core.key(MoveKey::Forward, false);
        self.core.escape();

        if self.core.focus("nav") {
            info!("desktop: focus nav");
            while self.core.desktop().is_focusing() {
                self.frame(&[], &[]);
            }
        }
        info!("viewpoint now at {:?}", self.core.viewpoint().position);
    }

    fn immersive(&mut self) {
        info!("immersive: grab ops");
        self.core.set_mode(DriverMode::Immersive);
        self.core.viewpoint_mut().position = Vec3::ZERO;

        let mut right = ControllerState::new(Handedness::Right);
        right.squeeze = true;
        self.frame(std::slice::from_ref(&right), &[]);
        for _ in 0..self.frames {
            right.position.x += 2.0 / self.frames as f32;
            self.frame(std::slice::from_ref(&right), &[]);
        }
        right.squeeze = false;
        self.frame(std::slice::from_ref(&right), &[]);

        info!("immersive: teleport");
        right.position = Vec3::new(0.0, 1.5, 0.0);
        right.orientation = Quat::from_rotation_y(std::f32::consts::PI);
        self.frame(std::slice::from_ref(&right), &[]);
        right.trigger = true;
        self.frame(std::slice::from_ref(&right), &[]);
        right.trigger = false;
        while self.core.teleport().is_fading() {
            self.frame(std::slice::from_ref(&right), &[]);
        }
        info!("viewpoint now at {:?}", self.core.viewpoint().position);

        info!("immersive: two hand scale");
        let pinch = |side, x: f32| {
            let c = Vec3::new(x, 1.2, 0.0);
            let half = Vec3::new(0.005, 0.0, 0.0);
            HandState::new(
                side,
                HandJoints::new(c - half, c + half, c + Vec3::new(0.0, 0.0, 0.1)),
            )
        };
        for i in 0..self.frames {
            let spread = 0.25 + 0.5 * i as f32 / self.frames as f32;
            let hands = [
                pinch(Handedness::Left, -spread),
                pinch(Handedness::Right, spread),
            ];
            self.frame(&[], &hands);
        }
        self.frame(&[], &[]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use stationdeck_spatial::{InteractionConfig, PositionPersister};

    #[test]
    fn session_moves_stations_and_keeps_them_inside() {
        let core = InteractionCore::new(InteractionConfig::default(), PositionPersister::none());
        let mut session = Session::new(core, 20);
        session.run();

        let core = session.core();
        let radius = core.config().drag.boundary_radius;
        for station in core.stations().iter() {
            let flat = Vec2::new(station.position.x, station.position.z);
            assert!(flat.length() <= radius + 1e-4, "{} outside", station.id);
            assert_eq!(station.holder(), None);
        }
        assert!(core.can_undo());
        assert_eq!(core.mode(), DriverMode::Standard);
    }
}
