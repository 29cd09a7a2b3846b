//! Handheld controller input: thumbstick locomotion, squeeze-to-grab and
//! trigger select.

use std::collections::{HashMap, HashSet};

use glam::{Vec2, Vec3};
use tracing::{debug, info};

use crate::command::{Command, CommandStack};
use crate::config::{ControllerConfig, PlayAreaConfig};
use crate::geometry::{clamp_to_radius, smooth_toward};
use crate::input::{ButtonEdge, ControllerState, Edge, RayInterceptor, RaySource, SourceId};
use crate::selector::{HoverSlot, RaySelector};
use crate::station::StationSet;
use crate::viewpoint::Viewpoint;

/// Something a controller did this frame that the caller may want to
/// surface as an event.
#[derive(Debug, Clone, PartialEq)]
pub enum ControllerAction {
    GrabStarted {
        source: SourceId,
        station: String,
    },
    GrabEnded {
        source: SourceId,
        station: String,
        /// Present when the station actually moved
        command: Option<Command>,
    },
    GrabCancelled {
        source: SourceId,
        station: String,
    },
    MenuConsumed {
        source: SourceId,
    },
    SelectionToggled {
        source: SourceId,
        station: String,
        selected: bool,
    },
    /// Trigger hit nothing; the teleporter decides if the arc is valid.
    TeleportRequested {
        source: SourceId,
    },
}

#[derive(Debug, Clone, Copy)]
struct Buttons {
    connected: bool,
    trigger: ButtonEdge,
    squeeze: ButtonEdge,
    trigger_edge: Edge,
    squeeze_edge: Edge,
}

impl Default for Buttons {
    fn default() -> Self {
        Self {
            connected: false,
            trigger: ButtonEdge::default(),
            squeeze: ButtonEdge::default(),
            trigger_edge: Edge::Idle,
            squeeze_edge: Edge::Idle,
        }
    }
}

impl Buttons {
    fn reset(&mut self) {
        self.connected = false;
        self.trigger.reset();
        self.squeeze.reset();
        self.trigger_edge = Edge::Idle;
        self.squeeze_edge = Edge::Idle;
    }
}

#[derive(Debug, Clone, PartialEq)]
struct Grab {
    source: SourceId,
    station: String,
    /// Object position minus controller position at grab start
    offset: Vec3,
    start: Vec3,
    height: f32,
}

#[derive(Debug, Clone)]
pub struct ControllerLocomotion {
    config: ControllerConfig,
    boundary_radius: f32,
    enabled: bool,
    velocity: Vec3,
    buttons: HashMap<SourceId, Buttons>,
    hover: HashMap<SourceId, HoverSlot>,
    grab: Option<Grab>,
}

impl ControllerLocomotion {
    /// `boundary_radius` is the floor circle shared with desktop dragging.
    pub fn new(config: ControllerConfig, boundary_radius: f32) -> Self {
        Self {
            config,
            boundary_radius,
            enabled: true,
            velocity: Vec3::ZERO,
            buttons: HashMap::new(),
            hover: HashMap::new(),
            grab: None,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Drop every piece of in-flight state: the grab is cancelled (station
    /// restored), hover cleared and buttons forgotten.
    pub fn disable(&mut self, stations: &mut StationSet) -> Option<ControllerAction> {
        self.enabled = false;
        let cancelled = self.cancel_grab(stations);
        self.clear_hover(stations);
        self.buttons.clear();
        self.velocity = Vec3::ZERO;
        cancelled
    }

    pub fn velocity(&self) -> Vec3 {
        self.velocity
    }

    pub fn grabbed(&self) -> Option<(SourceId, &str)> {
        self.grab.as_ref().map(|g| (g.source, g.station.as_str()))
    }

    pub fn is_grabbing(&self) -> bool {
        self.grab.is_some()
    }

    /// Per-source hover targets.
    pub fn hover_slots(&self) -> impl Iterator<Item = (SourceId, Option<&str>)> {
        self.hover.iter().map(|(id, slot)| (*id, slot.current()))
    }

    /// Record button edges for this frame. Returns the controllers that
    /// disconnected (or vanished from the list) since the last sample.
    pub fn sample_buttons(&mut self, controllers: &[ControllerState]) -> Vec<SourceId> {
        let mut seen = HashSet::new();
        let mut lost = Vec::new();

        for controller in controllers {
            let id = controller.id();
            seen.insert(id);
            let buttons = self.buttons.entry(id).or_default();

            if !controller.connected || !self.enabled {
                if buttons.connected {
                    lost.push(id);
                }
                buttons.reset();
                continue;
            }

            buttons.connected = true;
            buttons.trigger_edge = buttons.trigger.sample(controller.trigger);
            buttons.squeeze_edge = buttons.squeeze.sample(controller.squeeze);
        }

        for (id, buttons) in self.buttons.iter_mut() {
            if !seen.contains(id) && buttons.connected {
                lost.push(*id);
                buttons.reset();
            }
        }

        lost
    }

    fn edges(&self, id: SourceId) -> (Edge, Edge) {
        self.buttons
            .get(&id)
            .map(|b| (b.trigger_edge, b.squeeze_edge))
            .unwrap_or((Edge::Idle, Edge::Idle))
    }

    /// Combined stick input, zero when no stick leaves the deadzone.
    fn stick_input(&self, controllers: &[ControllerState]) -> Vec2 {
        let sum: Vec2 = controllers
            .iter()
            .filter(|c| c.connected)
            .map(|c| c.stick())
            .filter(|s| s.length() > self.config.deadzone)
            .sum();
        sum.clamp_length_max(1.0)
    }

    pub fn update_movement(
        &mut self,
        controllers: &[ControllerState],
        viewpoint: &mut Viewpoint,
        area: &PlayAreaConfig,
        dt: f32,
    ) {
        if !self.enabled {
            return;
        }

        let stick = self.stick_input(controllers);
        // pushing the stick away from you is negative y
        let desired = (viewpoint.flat_forward() * -stick.y + viewpoint.right() * stick.x)
            * self.config.speed;

        self.velocity = smooth_toward(self.velocity, desired, self.config.smoothing, dt);
        viewpoint.position += self.velocity * dt;
        viewpoint.position = clamp_to_radius(viewpoint.position, area.max_radius);
    }

    /// Point each connected controller's ray at the stations and update
    /// its hover slot. The grabbed station is ignored.
    pub fn update_hover(&mut self, controllers: &[ControllerState], stations: &mut StationSet) {
        if !self.enabled {
            return;
        }
        let exclude = self.grab.as_ref().map(|g| g.station.clone());

        for controller in controllers {
            let slot = self.hover.entry(controller.id()).or_default();
            let target = controller
                .world_ray()
                .and_then(|ray| RaySelector.pick_excluding(&ray, stations, exclude.as_deref()))
                .map(|pick| pick.id);
            slot.update(stations, target.as_deref());
        }
    }

    pub fn clear_hover(&mut self, stations: &mut StationSet) {
        for slot in self.hover.values_mut() {
            slot.clear(stations);
        }
    }

    /// Drop the hover slot of a source that went away.
    pub fn clear_hover_for(&mut self, source: SourceId, stations: &mut StationSet) {
        if let Some(mut slot) = self.hover.remove(&source) {
            slot.clear(stations);
        }
    }

    /// Act on squeeze and trigger presses sampled this frame.
    pub fn handle_presses(
        &mut self,
        controllers: &[ControllerState],
        stations: &mut StationSet,
        mut interceptor: Option<&mut dyn RayInterceptor>,
        out: &mut Vec<ControllerAction>,
    ) {
        if !self.enabled {
            return;
        }

        for controller in controllers {
            let id = controller.id();
            let (trigger, squeeze) = self.edges(id);
            let Some(ray) = controller.world_ray() else {
                continue;
            };

            if squeeze == Edge::Pressed && self.grab.is_none() {
                if let Some(pick) = RaySelector.pick(&ray, stations)
                    && let Some(start) = stations.position(&pick.id)
                    && stations.try_acquire(&pick.id, id)
                {
                    stations.set_dragging(&pick.id, true);
                    info!("{id:?} grabbed {}", pick.id);
                    out.push(ControllerAction::GrabStarted {
                        source: id,
                        station: pick.id.clone(),
                    });
                    self.grab = Some(Grab {
                        source: id,
                        station: pick.id,
                        offset: start - controller.position,
                        start,
                        height: start.y,
                    });
                } else {
                    debug!("{id:?} squeeze found nothing to grab");
                }
            }

            if trigger != Edge::Pressed || self.grab.is_some() {
                continue;
            }

            if let Some(interceptor) = interceptor.as_deref_mut()
                && interceptor.intercept(id, &ray)
            {
                out.push(ControllerAction::MenuConsumed { source: id });
                continue;
            }

            let picked = RaySelector.pick(&ray, stations).and_then(|pick| {
                let selected = stations.toggle_selected(&pick.id)?;
                Some((pick.id, selected))
            });
            match picked {
                Some((station, selected)) => out.push(ControllerAction::SelectionToggled {
                    source: id,
                    station,
                    selected,
                }),
                None => out.push(ControllerAction::TeleportRequested { source: id }),
            }
        }
    }

    /// Make the grabbed station follow its controller. Returns a
    /// cancellation if the station disappeared.
    pub fn update_grab(
        &mut self,
        stations: &mut StationSet,
        controllers: &[ControllerState],
    ) -> Option<ControllerAction> {
        let grab = self.grab.as_ref()?;
        let controller = controllers
            .iter()
            .find(|c| c.id() == grab.source && c.connected)?;

        let mut position = controller.position + grab.offset;
        position.y = grab.height;
        // only floor-level grabs are kept inside the circle
        if (grab.height - self.config.floor_height).abs() <= self.config.near_floor_threshold {
            position = clamp_to_radius(position, self.boundary_radius);
        }

        if stations.set_position(&grab.station, position) {
            return None;
        }

        let grab = self.grab.take()?;
        debug!("grabbed station {} removed", grab.station);
        Some(ControllerAction::GrabCancelled {
            source: grab.source,
            station: grab.station,
        })
    }

    /// Commit the grab if its squeeze was released this frame.
    pub fn handle_releases(
        &mut self,
        stations: &mut StationSet,
        history: &mut CommandStack,
    ) -> Option<ControllerAction> {
        let source = self.grab.as_ref()?.source;
        let (_, squeeze) = self.edges(source);
        if squeeze != Edge::Released {
            return None;
        }

        let grab = self.grab.take()?;
        stations.set_dragging(&grab.station, false);
        stations.release(&grab.station, grab.source);

        let command = stations
            .position(&grab.station)
            .filter(|end| *end != grab.start)
            .map(|end| Command::moved(grab.station.clone(), grab.start, end));
        if let Some(command) = &command {
            info!("grab committed {} {} -> {}", command.target, command.before, command.after);
            history.push(command.clone());
        }

        Some(ControllerAction::GrabEnded {
            source: grab.source,
            station: grab.station,
            command,
        })
    }

    /// Abort the grab, putting the station back where it was picked up.
    pub fn cancel_grab(&mut self, stations: &mut StationSet) -> Option<ControllerAction> {
        let grab = self.grab.take()?;
        stations.set_position(&grab.station, grab.start);
        stations.set_dragging(&grab.station, false);
        stations.release(&grab.station, grab.source);
        debug!("grab on {} cancelled", grab.station);
        Some(ControllerAction::GrabCancelled {
            source: grab.source,
            station: grab.station,
        })
    }

    /// Cancel only if `source` is the one holding the grab.
    pub fn cancel_grab_for(
        &mut self,
        source: SourceId,
        stations: &mut StationSet,
    ) -> Option<ControllerAction> {
        if self.grab.as_ref().is_some_and(|g| g.source == source) {
            self.cancel_grab(stations)
        } else {
            None
        }
    }
}
