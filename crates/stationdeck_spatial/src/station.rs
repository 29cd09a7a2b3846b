//! Stations: the pickable, movable objects of the command center.

use glam::Vec3;
use tracing::debug;

use crate::geometry::Bounds;
use crate::input::SourceId;

/// Visual interaction state of a station
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StationFlags {
    pub hovered: bool,
    pub selected: bool,
    pub dragging: bool,
}

/// A station in the workspace (a project or agent)
#[derive(Clone, Debug)]
pub struct Station {
    pub id: String,
    pub name: String,
    /// World-space position
    pub position: Vec3,
    /// Picking proxy, centred on `position`
    pub bounds: Bounds,
    pub flags: StationFlags,
    /// Input source currently holding this station (drag or grab)
    holder: Option<SourceId>,
}

impl Station {
    pub fn new(id: impl Into<String>, name: impl Into<String>, position: Vec3) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            position,
            bounds: Bounds::Sphere { radius: 1.0 },
            flags: StationFlags::default(),
            holder: None,
        }
    }

    pub fn with_bounds(mut self, bounds: Bounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn holder(&self) -> Option<SourceId> {
        self.holder
    }
}

/// The set of stations exposed to the interaction core by the scene layer.
#[derive(Debug, Default)]
pub struct StationSet {
    stations: Vec<Station>,
}

impl StationSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a station, or replace the record of an existing one. Interaction
    /// state (flags and holder) survives a replace.
    pub fn insert(&mut self, station: Station) {
        if let Some(existing) = self.get_mut(&station.id) {
            let flags = existing.flags;
            let holder = existing.holder;
            *existing = station;
            existing.flags = flags;
            existing.holder = holder;
        } else {
            self.stations.push(station);
        }
    }

    pub fn remove(&mut self, id: &str) -> Option<Station> {
        let index = self.stations.iter().position(|s| s.id == id)?;
        Some(self.stations.remove(index))
    }

    pub fn get(&self, id: &str) -> Option<&Station> {
        self.stations.iter().find(|s| s.id == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Station> {
        self.stations.iter_mut().find(|s| s.id == id)
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Station> {
        self.stations.iter()
    }

    /// The proxy list scanned by picking.
    pub fn as_slice(&self) -> &[Station] {
        &self.stations
    }

    pub fn len(&self) -> usize {
        self.stations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stations.is_empty()
    }

    pub fn position(&self, id: &str) -> Option<Vec3> {
        self.get(id).map(|s| s.position)
    }

    pub fn set_position(&mut self, id: &str, position: Vec3) -> bool {
        match self.get_mut(id) {
            Some(station) => {
                station.position = position;
                true
            }
            None => false,
        }
    }

    pub fn set_hovered(&mut self, id: &str, hovered: bool) {
        if let Some(station) = self.get_mut(id) {
            station.flags.hovered = hovered;
        }
    }

    pub fn set_selected(&mut self, id: &str, selected: bool) {
        if let Some(station) = self.get_mut(id) {
            station.flags.selected = selected;
        }
    }

    /// Flip the selection of a station, returning the new state.
    pub fn toggle_selected(&mut self, id: &str) -> Option<bool> {
        let station = self.get_mut(id)?;
        station.flags.selected = !station.flags.selected;
        Some(station.flags.selected)
    }

    pub fn set_dragging(&mut self, id: &str, dragging: bool) {
        if let Some(station) = self.get_mut(id) {
            station.flags.dragging = dragging;
        }
    }

    pub fn holder(&self, id: &str) -> Option<SourceId> {
        self.get(id).and_then(|s| s.holder)
    }

    /// Take exclusive hold of a station for `source`. Fails if the station
    /// is missing or already held by any source.
    pub fn try_acquire(&mut self, id: &str, source: SourceId) -> bool {
        let Some(station) = self.get_mut(id) else {
            return false;
        };
        if let Some(current) = station.holder {
            debug!("{id} already held by {current:?}, rejecting {source:?}");
            return false;
        }
        station.holder = Some(source);
        true
    }

    /// Release a hold. Only the current holder can release.
    pub fn release(&mut self, id: &str, source: SourceId) -> bool {
        match self.get_mut(id) {
            Some(station) if station.holder == Some(source) => {
                station.holder = None;
                true
            }
            _ => false,
        }
    }
}
