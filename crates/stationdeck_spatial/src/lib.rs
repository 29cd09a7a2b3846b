//! Spatial interaction and locomotion core for the stationdeck command
//! center.
//!
//! Converts pointer, controller and hand input into hover, selection,
//! drag/grab, camera movement and teleportation over a set of stations.
//! Every committed move is recorded in a bounded undo/redo history.
//!
//! Everything here is single-threaded and frame-driven. The only async
//! work is persisting committed positions, which is spawned onto a tokio
//! runtime and never awaited by the frame loop.

mod command;
mod config;
mod controller;
mod desktop;
mod drag;
mod error;
mod events;
mod geometry;
mod gesture;
mod input;
mod interaction;
mod persist;
mod selector;
mod station;
mod teleport;
mod viewpoint;
mod zone;

pub use command::{Command, CommandKind, CommandListener, CommandStack, ListenerId};
pub use config::{
    ControllerConfig, DesktopConfig, DragConfig, GestureConfig, HistoryConfig, InteractionConfig,
    PlayAreaConfig, TeleportConfig, ZoneConfig,
};
pub use controller::{ControllerAction, ControllerLocomotion};
pub use desktop::{DesktopLocomotion, MoveKey};
pub use drag::{DragController, DragStep};
pub use error::{ConfigError, Error, PersistError, Result};
pub use events::{EventBus, EventHandler, EventKind, EventTopic, InteractionEvent, SubscriptionId};
pub use geometry::{
    Bounds, Ray, SurfaceShape, TeleportSurface, clamp_to_radius, ease_out_cubic, ray_plane_y,
    smooth_toward, smoothing_factor, snap_to_grid, snap_within_radius,
};
pub use gesture::{GestureEvent, HandGestureRecognizer, PinchState};
pub use input::{
    ButtonEdge, ControllerState, Edge, HandJoints, HandState, Handedness, PointerState,
    RayInterceptor, RaySource, SourceId,
};
pub use interaction::{Component, DriverMode, FrameInput, InteractionCore};
pub use persist::{PersistFuture, PositionPersister, PositionStore, PositionUpdate};
pub use selector::{HoverSlot, RayPick, RaySelector};
pub use station::{Station, StationFlags, StationSet};
pub use teleport::{ArcTeleport, ArcTint, FadePhase, TeleportCompleted, TeleportState};
pub use viewpoint::Viewpoint;
pub use zone::{ZoneMonitor, ZoneTransition};

pub use glam;
