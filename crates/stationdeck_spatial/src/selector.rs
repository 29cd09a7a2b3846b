//! Ray picking and per-source hover tracking.

use crate::geometry::Ray;
use crate::station::{Station, StationSet};

/// Result of a successful pick
#[derive(Debug, Clone, PartialEq)]
pub struct RayPick {
    pub id: String,
    pub distance: f32,
}

/// Resolves rays to the nearest station. Stateless, so it can be queried
/// once per input source every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct RaySelector;

impl RaySelector {
    pub fn pick(&self, ray: &Ray, stations: &StationSet) -> Option<RayPick> {
        self.pick_excluding(ray, stations, None)
    }

    /// Pick, ignoring the station with id `exclude` (e.g. the one being
    /// carried along the ray).
    pub fn pick_excluding(
        &self,
        ray: &Ray,
        stations: &StationSet,
        exclude: Option<&str>,
    ) -> Option<RayPick> {
        let mut closest: Option<(&Station, f32)> = None;
        for station in stations.as_slice() {
            if exclude == Some(station.id.as_str()) {
                continue;
            }
            let Some(t) = station.bounds.intersect(ray, station.position) else {
                continue;
            };
            if closest.is_none_or(|(_, d)| t < d) {
                closest = Some((station, t));
            }
        }
        closest.map(|(station, distance)| RayPick {
            id: station.id.clone(),
            distance,
        })
    }
}

/// The hover target of one input source.
///
/// Different sources keep independent slots, so they may hover different
/// stations at once. When two sources share a target the last write to
/// its hovered flag wins.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HoverSlot {
    current: Option<String>,
}

impl HoverSlot {
    pub fn current(&self) -> Option<&str> {
        self.current.as_deref()
    }

    /// Move hover to `target`. Returns true when the target changed.
    pub fn update(&mut self, stations: &mut StationSet, target: Option<&str>) -> bool {
        if self.current.as_deref() == target {
            return false;
        }
        if let Some(old) = self.current.take() {
            stations.set_hovered(&old, false);
        }
        if let Some(new) = target {
            stations.set_hovered(new, true);
            self.current = Some(new.to_string());
        }
        true
    }

    pub fn clear(&mut self, stations: &mut StationSet) {
        self.update(stations, None);
    }
}
