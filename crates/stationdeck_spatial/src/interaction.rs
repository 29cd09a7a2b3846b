//! The interaction core: owns every component and runs them in a fixed
//! per-frame order.
//!
//! Frame order is locomotion, zones, hover and presses, drag/grab
//! physics, then releases and commits. Pointer and keyboard entry points
//! are discrete events handled between frames.
//!
//! Every position write that ends up in history (drag commit, grab commit,
//! undo, redo) goes through one apply path, which writes the station,
//! hands the value to the persister and emits [`EventKind::Moved`]. The
//! local write always happens first.

use glam::{Vec2, Vec3};
use tracing::{debug, info, trace};

use crate::command::{Command, CommandStack};
use crate::config::InteractionConfig;
use crate::controller::{ControllerAction, ControllerLocomotion};
use crate::desktop::{DesktopLocomotion, MoveKey};
use crate::drag::{DragController, DragStep};
use crate::events::{EventBus, EventHandler, EventKind, EventTopic, InteractionEvent, SubscriptionId};
use crate::geometry::{Ray, TeleportSurface};
use crate::gesture::{GestureEvent, HandGestureRecognizer};
use crate::input::{ControllerState, HandState, PointerState, RayInterceptor, SourceId};
use crate::persist::{PositionPersister, PositionUpdate};
use crate::selector::{HoverSlot, RaySelector};
use crate::station::StationSet;
use crate::teleport::ArcTeleport;
use crate::viewpoint::Viewpoint;
use crate::zone::{ZoneMonitor, ZoneTransition};

/// Which presentation loop is driving frames. Only one runs at a time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverMode {
    /// Timer-driven desktop loop
    Standard,
    /// Headset-driven loop
    Immersive,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Component {
    Desktop,
    Drag,
    Controllers,
    Teleport,
    Gestures,
}

/// Everything sampled for one frame.
#[derive(Debug, Clone, Copy)]
pub struct FrameInput<'a> {
    /// Frame clock in seconds, used for event timestamps
    pub now: f64,
    pub dt: f32,
    pub controllers: &'a [ControllerState],
    pub hands: &'a [HandState],
}

impl FrameInput<'_> {
    /// A frame with no tracked devices.
    pub fn desktop(now: f64, dt: f32) -> Self {
        FrameInput {
            now,
            dt,
            controllers: &[],
            hands: &[],
        }
    }
}

pub struct InteractionCore {
    config: InteractionConfig,
    mode: DriverMode,
    stations: StationSet,
    surfaces: Vec<TeleportSurface>,
    viewpoint: Viewpoint,
    viewport: Vec2,
    pointer: PointerState,
    pointer_hover: HoverSlot,

    desktop: DesktopLocomotion,
    drag: DragController,
    controllers: ControllerLocomotion,
    teleport: ArcTeleport,
    gestures: HandGestureRecognizer,
    zones: ZoneMonitor,

    history: CommandStack,
    events: EventBus,
    persister: PositionPersister,
    interceptor: Option<Box<dyn RayInterceptor>>,
    now: f64,
}

impl InteractionCore {
    pub fn new(config: InteractionConfig, persister: PositionPersister) -> Self {
        let mut core = Self {
            desktop: DesktopLocomotion::new(config.desktop.clone()),
            drag: DragController::new(config.drag.clone()),
            controllers: ControllerLocomotion::new(
                config.controller.clone(),
                config.drag.boundary_radius,
            ),
            teleport: ArcTeleport::new(config.teleport.clone()),
            gestures: HandGestureRecognizer::new(config.gesture.clone()),
            zones: ZoneMonitor::new(&config.zones),
            history: CommandStack::new(config.history.capacity),
            mode: DriverMode::Standard,
            stations: StationSet::new(),
            surfaces: Vec::new(),
            viewpoint: Viewpoint::default(),
            viewport: Vec2::new(1280.0, 720.0),
            pointer: PointerState::default(),
            pointer_hover: HoverSlot::default(),
            events: EventBus::new(),
            persister,
            interceptor: None,
            now: 0.0,
            config,
        };

        // immersive components stay off until a session starts
        core.controllers.disable(&mut core.stations);
        core.teleport.disable();
        core.gestures.disable(&mut core.stations, &mut Vec::new());
        core
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn mode(&self) -> DriverMode {
        self.mode
    }

    pub fn stations(&self) -> &StationSet {
        &self.stations
    }

    pub fn stations_mut(&mut self) -> &mut StationSet {
        &mut self.stations
    }

    pub fn viewpoint(&self) -> &Viewpoint {
        &self.viewpoint
    }

    pub fn viewpoint_mut(&mut self) -> &mut Viewpoint {
        &mut self.viewpoint
    }

    pub fn set_viewport(&mut self, viewport: Vec2) {
        self.viewport = viewport;
    }

    pub fn add_surface(&mut self, surface: TeleportSurface) {
        self.surfaces.push(surface);
    }

    pub fn set_interceptor(&mut self, interceptor: Option<Box<dyn RayInterceptor>>) {
        self.interceptor = interceptor;
    }

    pub fn history(&self) -> &CommandStack {
        &self.history
    }

    /// For subscribing to raw command replays.
    pub fn history_mut(&mut self) -> &mut CommandStack {
        &mut self.history
    }

    pub fn desktop(&self) -> &DesktopLocomotion {
        &self.desktop
    }

    pub fn drag(&self) -> &DragController {
        &self.drag
    }

    pub fn controllers(&self) -> &ControllerLocomotion {
        &self.controllers
    }

    pub fn teleport(&self) -> &ArcTeleport {
        &self.teleport
    }

    pub fn gestures(&self) -> &HandGestureRecognizer {
        &self.gestures
    }

    pub fn pointer_hovered(&self) -> Option<&str> {
        self.pointer_hover.current()
    }

    pub fn subscribe(&mut self, topic: EventTopic, handler: EventHandler) -> SubscriptionId {
        self.events.subscribe(topic, handler)
    }

    pub fn unsubscribe(&mut self, id: SubscriptionId) -> bool {
        self.events.unsubscribe(id)
    }

    fn emit(&mut self, kind: EventKind, station: Option<String>, source: Option<SourceId>) {
        let event = InteractionEvent {
            kind,
            station,
            source,
            timestamp: self.now,
        };
        self.events.emit(&event);
    }

    /// Write a position locally, then persist and announce it.
    fn apply_position(&mut self, id: &str, position: Vec3, source: Option<SourceId>) {
        if !self.stations.set_position(id, position) {
            debug!("apply: station {id} no longer exists");
            return;
        }
        self.persister.persist(PositionUpdate::new(id, position));
        self.emit(EventKind::Moved { position }, Some(id.to_string()), source);
    }

    // -- modes and toggles --

    /// Stop one driver's components and start the other's.
    pub fn set_mode(&mut self, mode: DriverMode) {
        if self.mode == mode {
            return;
        }
        match mode {
            DriverMode::Immersive => {
                self.set_enabled(Component::Desktop, false);
                self.set_enabled(Component::Drag, false);
                self.set_enabled(Component::Controllers, true);
                self.set_enabled(Component::Teleport, true);
                self.set_enabled(Component::Gestures, true);
            }
            DriverMode::Standard => {
                self.set_enabled(Component::Controllers, false);
                self.set_enabled(Component::Teleport, false);
                self.set_enabled(Component::Gestures, false);
                self.set_enabled(Component::Desktop, true);
                self.set_enabled(Component::Drag, true);
            }
        }
        info!("driver mode {:?} -> {mode:?}", self.mode);
        self.mode = mode;
    }

    /// Toggle one component. Disabling releases anything it holds and
    /// clears the hover it owns.
    pub fn set_enabled(&mut self, component: Component, enabled: bool) {
        match (component, enabled) {
            (Component::Desktop, true) => self.desktop.enable(),
            (Component::Desktop, false) => {
                self.desktop.disable();
                self.pointer_hover.clear(&mut self.stations);
            }
            (Component::Drag, true) => self.drag.enable(),
            (Component::Drag, false) => {
                if let Some(id) = self.drag.disable(&mut self.stations) {
                    self.emit(EventKind::DragCancelled, Some(id), Some(SourceId::Pointer));
                }
                self.pointer_hover.clear(&mut self.stations);
            }
            (Component::Controllers, true) => self.controllers.enable(),
            (Component::Controllers, false) => {
                if let Some(action) = self.controllers.disable(&mut self.stations) {
                    self.handle_controller_action(action);
                }
            }
            (Component::Teleport, true) => self.teleport.enable(),
            (Component::Teleport, false) => self.teleport.disable(),
            (Component::Gestures, true) => self.gestures.enable(),
            (Component::Gestures, false) => {
                let mut ended = Vec::new();
                self.gestures.disable(&mut self.stations, &mut ended);
                for event in ended {
                    self.handle_gesture_event(event);
                }
            }
        }
    }

    pub fn is_enabled(&self, component: Component) -> bool {
        match component {
            Component::Desktop => self.desktop.is_enabled(),
            Component::Drag => self.drag.is_enabled(),
            Component::Controllers => self.controllers.is_enabled(),
            Component::Teleport => self.teleport.is_enabled(),
            Component::Gestures => self.gestures.is_enabled(),
        }
    }

    // -- per frame --

    pub fn update(&mut self, input: &FrameInput<'_>) {
        self.now = input.now;
        let dt = input.dt;

        // locomotion
        match self.mode {
            DriverMode::Standard => {
                self.desktop
                    .update(dt, &self.config.play_area, &mut self.viewpoint);
            }
            DriverMode::Immersive => {
                for lost in self.controllers.sample_buttons(input.controllers) {
                    info!("{lost:?} disconnected");
                    self.teleport.clear_arc(lost);
                    self.controllers
                        .clear_hover_for(lost, &mut self.stations);
                    if let Some(action) = self.controllers.cancel_grab_for(lost, &mut self.stations)
                    {
                        self.handle_controller_action(action);
                    }
                }
                self.controllers.update_movement(
                    input.controllers,
                    &mut self.viewpoint,
                    &self.config.play_area,
                    dt,
                );
                if let Some(done) = self.teleport.update_fade(dt, &mut self.viewpoint) {
                    self.emit(
                        EventKind::Teleported {
                            from: done.from,
                            to: done.to,
                        },
                        None,
                        Some(done.source),
                    );
                }
            }
        }

        for transition in self.zones.update(self.viewpoint.position) {
            let kind = match transition {
                ZoneTransition::Entered(zone) => EventKind::ZoneEntered { zone },
                ZoneTransition::Exited(zone) => EventKind::ZoneExited { zone },
            };
            self.emit(kind, None, None);
        }

        // hover and presses
        match self.mode {
            DriverMode::Standard => self.update_pointer_hover(),
            DriverMode::Immersive => self.update_immersive_input(input),
        }

        // physics
        if let DragStep::Lost(id) = self.drag.step(&mut self.stations, dt) {
            self.emit(EventKind::DragCancelled, Some(id), Some(SourceId::Pointer));
        }
        if let Some(action) = self.controllers.update_grab(&mut self.stations, input.controllers) {
            self.handle_controller_action(action);
        }

        // commits
        if let Some(action) = self
            .controllers
            .handle_releases(&mut self.stations, &mut self.history)
        {
            self.handle_controller_action(action);
        }
    }

    fn update_pointer_hover(&mut self) {
        // the dragged station keeps everything else from lighting up
        if self.drag.is_active() || !self.desktop.is_enabled() {
            return;
        }
        let ray = self.pointer_ray();
        let target = RaySelector.pick(&ray, &self.stations).map(|p| p.id);
        self.pointer_hover
            .update(&mut self.stations, target.as_deref());
    }

    fn update_immersive_input(&mut self, input: &FrameInput<'_>) {
        self.controllers
            .update_hover(input.controllers, &mut self.stations);
        for controller in input.controllers {
            self.teleport.update_arc(controller, &self.surfaces);
        }

        let mut actions = Vec::new();
        self.controllers.handle_presses(
            input.controllers,
            &mut self.stations,
            self.interceptor
                .as_deref_mut()
                .map(|i| i as &mut dyn RayInterceptor),
            &mut actions,
        );
        for action in actions {
            self.handle_controller_action(action);
        }

        let mut gestures = Vec::new();
        self.gestures.update(
            input.hands,
            &mut self.stations,
            self.interceptor
                .as_deref_mut()
                .map(|i| i as &mut dyn RayInterceptor),
            &mut gestures,
        );
        for event in gestures {
            self.handle_gesture_event(event);
        }
    }

    fn handle_controller_action(&mut self, action: ControllerAction) {
        match action {
            ControllerAction::GrabStarted { source, station } => {
                self.emit(EventKind::GrabStarted, Some(station), Some(source));
            }
            ControllerAction::GrabEnded {
                source,
                station,
                command,
            } => {
                if let Some(command) = command {
                    self.apply_position(&station, command.after, Some(source));
                }
                let position = self.stations.position(&station).unwrap_or_default();
                self.emit(EventKind::GrabEnded { position }, Some(station), Some(source));
            }
            ControllerAction::GrabCancelled { source, station } => {
                self.emit(EventKind::GrabCancelled, Some(station), Some(source));
            }
            ControllerAction::MenuConsumed { source } => {
                trace!("{source:?} trigger consumed by menu");
            }
            ControllerAction::SelectionToggled {
                source,
                station,
                selected,
            } => {
                self.emit(
                    EventKind::SelectionChanged { selected },
                    Some(station),
                    Some(source),
                );
            }
            ControllerAction::TeleportRequested { source } => {
                self.teleport.request(source);
            }
        }
    }

    fn handle_gesture_event(&mut self, event: GestureEvent) {
        match event {
            GestureEvent::PinchStarted { hand, origin } => {
                self.emit(
                    EventKind::PinchStarted { origin },
                    None,
                    Some(SourceId::Hand(hand)),
                );
            }
            GestureEvent::PinchSelected { hand, station } => {
                self.emit(
                    EventKind::SelectionChanged { selected: true },
                    Some(station),
                    Some(SourceId::Hand(hand)),
                );
            }
            GestureEvent::PinchConsumed { hand } => trace!("{hand:?} pinch consumed"),
            GestureEvent::PinchEnded { hand } => trace!("{hand:?} pinch ended"),
            GestureEvent::ScaleStarted { baseline } => {
                self.emit(EventKind::ScaleStarted { baseline }, None, None);
            }
            GestureEvent::ScaleUpdated { factor } => {
                self.emit(EventKind::ScaleUpdated { factor }, None, None);
            }
            GestureEvent::ScaleEnded => self.emit(EventKind::ScaleEnded, None, None),
        }
    }

    // -- desktop entry points --

    fn pointer_ray(&self) -> Ray {
        let screen = if self.desktop.is_locked() {
            self.viewport * 0.5
        } else {
            self.pointer.position
        };
        self.viewpoint.screen_ray(screen, self.viewport)
    }

    /// Primary button down. Starts a drag on a station under the pointer,
    /// otherwise captures the pointer. While captured, a press toggles
    /// the selection of whatever is at the centre of the view.
    pub fn pointer_pressed(&mut self, pointer: PointerState) -> bool {
        if self.mode != DriverMode::Standard {
            return false;
        }
        self.pointer = pointer;
        let ray = self.pointer_ray();
        let pick = RaySelector.pick(&ray, &self.stations);

        if self.desktop.is_locked() {
            let Some(pick) = pick else {
                return false;
            };
            let Some(selected) = self.stations.toggle_selected(&pick.id) else {
                return false;
            };
            self.emit(
                EventKind::SelectionChanged { selected },
                Some(pick.id),
                Some(SourceId::Pointer),
            );
            return true;
        }

        match pick {
            Some(pick) => {
                if !self.drag.begin(&mut self.stations, &pick.id, &ray) {
                    return false;
                }
                self.emit(EventKind::DragStarted, Some(pick.id), Some(SourceId::Pointer));
                true
            }
            None => self.desktop.lock(),
        }
    }

    pub fn pointer_moved(&mut self, pointer: PointerState) {
        if self.mode != DriverMode::Standard {
            return;
        }
        self.pointer = pointer;
        if self.desktop.is_locked() {
            self.desktop.look(pointer.delta, &mut self.viewpoint);
        } else if self.drag.is_active() {
            let ray = self.pointer_ray();
            self.drag.update(&ray);
        }
    }

    /// Primary button up. Commits a drag in progress; a drag that never
    /// moved counts as a click and toggles selection.
    pub fn pointer_released(&mut self) -> Option<Command> {
        let id = self.drag.station()?.to_string();
        if !self.stations.contains(&id) {
            self.drag.cancel(&mut self.stations);
            self.emit(EventKind::DragCancelled, Some(id), Some(SourceId::Pointer));
            return None;
        }
        let committed = self.drag.end(&mut self.stations, &mut self.history);

        match &committed {
            Some(command) => {
                self.apply_position(&command.target, command.after, Some(SourceId::Pointer));
            }
            None => {
                if let Some(selected) = self.stations.toggle_selected(&id) {
                    self.emit(
                        EventKind::SelectionChanged { selected },
                        Some(id.clone()),
                        Some(SourceId::Pointer),
                    );
                }
            }
        }

        let position = self.stations.position(&id).unwrap_or_default();
        self.emit(
            EventKind::DragEnded { position },
            Some(id),
            Some(SourceId::Pointer),
        );
        committed
    }

    pub fn key(&mut self, key: MoveKey, pressed: bool) {
        self.desktop.set_key(key, pressed);
    }

    pub fn sprint(&mut self, held: bool) {
        self.desktop.set_sprint(held);
    }

    /// Cancel a drag if one is running, otherwise leave pointer capture.
    pub fn escape(&mut self) {
        if let Some(id) = self.drag.cancel(&mut self.stations) {
            self.emit(EventKind::DragCancelled, Some(id), Some(SourceId::Pointer));
        } else {
            self.desktop.unlock();
        }
    }

    pub fn lock(&mut self) -> bool {
        self.mode == DriverMode::Standard && self.desktop.lock()
    }

    pub fn unlock(&mut self) {
        self.desktop.unlock();
    }

    pub fn is_locked(&self) -> bool {
        self.desktop.is_locked()
    }

    pub fn capture_lost(&mut self) {
        self.desktop.capture_lost();
    }

    /// Fly the desktop camera to a station.
    pub fn focus(&mut self, id: &str) -> bool {
        let Some(target) = self.stations.position(id) else {
            return false;
        };
        self.desktop.focus_on(target, &self.viewpoint)
    }

    // -- history --

    fn is_holding(&self) -> bool {
        self.drag.is_active() || self.controllers.is_grabbing()
    }

    pub fn can_undo(&self) -> bool {
        !self.is_holding() && self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        !self.is_holding() && self.history.can_redo()
    }

    /// Step history back. Ignored while a drag or grab is in progress.
    pub fn undo(&mut self) -> Option<Command> {
        if self.is_holding() {
            debug!("undo ignored while holding a station");
            return None;
        }
        let command = self.history.undo()?;
        self.apply_position(&command.target, command.before, None);
        self.emit(
            EventKind::Undo {
                position: command.before,
            },
            Some(command.target.clone()),
            None,
        );
        Some(command)
    }

    pub fn redo(&mut self) -> Option<Command> {
        if self.is_holding() {
            debug!("redo ignored while holding a station");
            return None;
        }
        let command = self.history.redo()?;
        self.apply_position(&command.target, command.after, None);
        self.emit(
            EventKind::Redo {
                position: command.after,
            },
            Some(command.target.clone()),
            None,
        );
        Some(command)
    }
}

impl std::fmt::Debug for InteractionCore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InteractionCore")
            .field("mode", &self.mode)
            .field("stations", &self.stations.len())
            .field("viewpoint", &self.viewpoint)
            .field("history", &self.history.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::Handedness;
    use crate::station::Station;
    use std::cell::RefCell;
    use std::rc::Rc;

    const DT: f32 = 1.0 / 60.0;

    fn core() -> InteractionCore {
        let mut core = InteractionCore::new(InteractionConfig::default(), PositionPersister::none());
        core.stations_mut()
            .insert(Station::new("a", "Alpha", Vec3::new(0.0, 0.0, 0.0)));
        // looking down at the origin
        let vp = core.viewpoint_mut();
        vp.position = Vec3::new(0.0, 5.0, 5.0);
        vp.pitch = -std::f32::consts::FRAC_PI_4;
        core
    }

    fn at_center(core: &InteractionCore) -> PointerState {
        PointerState {
            position: core.viewport * 0.5,
            delta: Vec2::ZERO,
            primary_down: true,
        }
    }

    fn record(core: &mut InteractionCore, topic: EventTopic) -> Rc<RefCell<Vec<EventKind>>> {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = seen.clone();
        core.subscribe(
            topic,
            Box::new(move |e: &InteractionEvent| sink.borrow_mut().push(e.kind.clone())),
        );
        seen
    }

    #[test]
    fn press_on_empty_space_locks() {
        let mut core = core();
        core.stations_mut().remove("a");
        assert!(core.pointer_pressed(at_center(&core)));
        assert!(core.is_locked());
        core.escape();
        assert!(!core.is_locked());
    }

    #[test]
    fn drag_commit_goes_through_apply_path() {
        let mut core = core();
        let moves = record(&mut core, EventTopic::Move);

        assert!(core.pointer_pressed(at_center(&core)));
        assert_eq!(core.stations().holder("a"), Some(SourceId::Pointer));

        let mut moved = at_center(&core);
        moved.position.x += 100.0;
        core.pointer_moved(moved);
        core.update(&FrameInput::desktop(0.1, DT));

        let command = core.pointer_released().expect("command");
        assert!(command.after.x > 0.0);
        assert_eq!(core.stations().position("a"), Some(command.after));
        assert_eq!(
            *moves.borrow(),
            vec![EventKind::Moved {
                position: command.after
            }]
        );
        assert!(core.can_undo());
    }

    #[test]
    fn click_without_motion_selects() {
        let mut core = core();
        core.pointer_pressed(at_center(&core));
        assert_eq!(core.pointer_released(), None);
        assert!(core.stations().get("a").expect("a").flags.selected);
        assert!(core.history().is_empty());
    }

    #[test]
    fn release_after_station_removed_cancels() {
        let mut core = core();
        let drags = record(&mut core, EventTopic::Drag);
        assert!(core.pointer_pressed(at_center(&core)));
        core.stations_mut().remove("a");

        assert_eq!(core.pointer_released(), None);
        assert!(!core.drag().is_active());
        assert!(core.history().is_empty());
        assert_eq!(
            *drags.borrow(),
            vec![EventKind::DragStarted, EventKind::DragCancelled]
        );
    }

    #[test]
    fn undo_is_ignored_mid_drag() {
        let mut core = core();
        core.history_mut()
            .push(Command::moved("a", Vec3::new(-1.0, 0.0, 0.0), Vec3::ZERO));

        core.pointer_pressed(at_center(&core));
        assert!(!core.can_undo());
        assert_eq!(core.undo(), None);

        core.escape();
        assert!(core.undo().is_some());
        assert_eq!(core.stations().position("a"), Some(Vec3::new(-1.0, 0.0, 0.0)));
    }

    #[test]
    fn hover_freezes_while_dragging() {
        let mut core = core();
        core.stations_mut()
            .insert(Station::new("b", "Beta", Vec3::new(3.0, 0.0, 0.0)));

        core.pointer_moved(at_center(&core));
        core.update(&FrameInput::desktop(0.0, DT));
        assert_eq!(core.pointer_hovered(), Some("a"));

        core.pointer_pressed(at_center(&core));
        core.stations_mut().set_position("b", Vec3::ZERO);
        core.update(&FrameInput::desktop(0.1, DT));
        assert!(!core.stations().get("b").expect("b").flags.hovered);
    }

    #[test]
    fn switching_modes_cancels_drag() {
        let mut core = core();
        let drags = record(&mut core, EventTopic::Drag);

        core.pointer_pressed(at_center(&core));
        let mut moved = at_center(&core);
        moved.position.x += 50.0;
        core.pointer_moved(moved);
        core.update(&FrameInput::desktop(0.0, DT));

        core.set_mode(DriverMode::Immersive);
        let a = core.stations().get("a").expect("a");
        assert_eq!(a.position, Vec3::ZERO);
        assert!(!a.flags.dragging && !a.flags.hovered);
        assert_eq!(a.holder(), None);
        assert_eq!(
            *drags.borrow(),
            vec![EventKind::DragStarted, EventKind::DragCancelled]
        );
        assert!(!core.is_enabled(Component::Desktop));
        assert!(core.is_enabled(Component::Teleport));

        // desktop entry points are inert in immersive mode
        assert!(!core.pointer_pressed(at_center(&core)));
        assert!(!core.lock());
    }

    #[test]
    fn controller_disconnect_mid_grab_restores() {
        let mut core = core();
        core.set_mode(DriverMode::Immersive);
        let drags = record(&mut core, EventTopic::Drag);

        let mut c = ControllerState::new(Handedness::Left);
        c.position = Vec3::new(0.0, 0.0, 5.0);
        c.squeeze = true;
        core.update(&FrameInput {
            now: 0.0,
            dt: DT,
            controllers: std::slice::from_ref(&c),
            hands: &[],
        });
        assert_eq!(core.stations().holder("a"), Some(c.id()));

        c.position.x = 2.0;
        core.update(&FrameInput {
            now: 0.1,
            dt: DT,
            controllers: std::slice::from_ref(&c),
            hands: &[],
        });
        assert_eq!(core.stations().position("a"), Some(Vec3::new(2.0, 0.0, 0.0)));

        core.update(&FrameInput::desktop(0.2, DT));
        assert_eq!(core.stations().position("a"), Some(Vec3::ZERO));
        assert_eq!(core.stations().holder("a"), None);
        assert_eq!(
            *drags.borrow(),
            vec![EventKind::GrabStarted, EventKind::GrabCancelled]
        );
        assert!(core.history().is_empty());
        assert!(!core.stations().get("a").expect("a").flags.hovered);
    }

    #[test]
    fn disconnected_controller_leaves_no_hover() {
        let mut core = core();
        core.set_mode(DriverMode::Immersive);

        let mut c = ControllerState::new(Handedness::Right);
        c.position = Vec3::new(0.0, 0.0, 5.0);
        core.update(&FrameInput {
            now: 0.0,
            dt: DT,
            controllers: std::slice::from_ref(&c),
            hands: &[],
        });
        assert!(core.stations().get("a").expect("a").flags.hovered);

        core.update(&FrameInput::desktop(0.1, DT));
        assert!(!core.stations().get("a").expect("a").flags.hovered);
        assert_eq!(core.controllers().hover_slots().count(), 0);
    }

    #[test]
    fn leaving_immersive_ends_scale() {
        let mut core = core();
        core.set_mode(DriverMode::Immersive);
        let gestures = record(&mut core, EventTopic::Gesture);

        let pinch = |side, x: f32| {
            let c = Vec3::new(x, 1.2, 0.0);
            let half = Vec3::new(0.005, 0.0, 0.0);
            HandState::new(
                side,
                crate::input::HandJoints::new(c - half, c + half, c + Vec3::new(0.0, 0.0, 0.1)),
            )
        };
        core.update(&FrameInput {
            now: 0.0,
            dt: DT,
            controllers: &[],
            hands: &[pinch(Handedness::Left, -0.3), pinch(Handedness::Right, 0.3)],
        });
        assert!(core.gestures().is_scaling());

        core.set_mode(DriverMode::Standard);
        assert!(!core.gestures().is_scaling());
        assert_eq!(gestures.borrow().last(), Some(&EventKind::ScaleEnded));
    }

    #[test]
    fn zone_events_follow_viewpoint() {
        let mut config = InteractionConfig::default();
        config.zones.push(crate::config::ZoneConfig {
            name: "ops".to_string(),
            center: [0.0, 0.0],
            radius: 3.0,
        });
        let mut core = InteractionCore::new(config, PositionPersister::none());
        let zones = record(&mut core, EventTopic::Zone);

        core.viewpoint_mut().position = Vec3::new(0.0, 1.6, 10.0);
        core.update(&FrameInput::desktop(0.0, DT));
        core.viewpoint_mut().position = Vec3::new(0.0, 1.6, 1.0);
        core.update(&FrameInput::desktop(0.1, DT));

        assert_eq!(
            *zones.borrow(),
            vec![EventKind::ZoneEntered {
                zone: "ops".to_string()
            }]
        );
    }
}
