//! Named circular floor-plan zones and the boundary crossings of the
//! viewpoint between them.

use glam::{Vec2, Vec3};
use tracing::debug;

use crate::config::ZoneConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ZoneTransition {
    Entered(String),
    Exited(String),
}

#[derive(Debug, Clone)]
struct Zone {
    name: String,
    center: Vec2,
    radius: f32,
    inside: bool,
}

/// Tracks which floor-plan zones the viewpoint is standing in.
#[derive(Debug, Clone, Default)]
pub struct ZoneMonitor {
    zones: Vec<Zone>,
}

impl ZoneMonitor {
    pub fn new(zones: &[ZoneConfig]) -> Self {
        Self {
            zones: zones
                .iter()
                .map(|z| Zone {
                    name: z.name.clone(),
                    center: Vec2::from(z.center),
                    radius: z.radius,
                    inside: false,
                })
                .collect(),
        }
    }

    /// Report every boundary crossed since the last update. Exits come
    /// before entries.
    pub fn update(&mut self, position: Vec3) -> Vec<ZoneTransition> {
        let flat = Vec2::new(position.x, position.z);
        let mut exited = Vec::new();
        let mut entered = Vec::new();

        for zone in &mut self.zones {
            let inside = flat.distance(zone.center) <= zone.radius;
            if inside == zone.inside {
                continue;
            }
            zone.inside = inside;
            debug!("zone {} inside={inside}", zone.name);
            if inside {
                entered.push(ZoneTransition::Entered(zone.name.clone()));
            } else {
                exited.push(ZoneTransition::Exited(zone.name.clone()));
            }
        }

        exited.extend(entered);
        exited
    }

    pub fn current(&self) -> impl Iterator<Item = &str> {
        self.zones.iter().filter(|z| z.inside).map(|z| z.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn monitor() -> ZoneMonitor {
        ZoneMonitor::new(&[
            ZoneConfig {
                name: "ops".to_string(),
                center: [0.0, 0.0],
                radius: 5.0,
            },
            ZoneConfig {
                name: "lab".to_string(),
                center: [10.0, 0.0],
                radius: 5.0,
            },
        ])
    }

    #[test]
    fn crossing_reports_once() {
        let mut zones = monitor();
        assert_eq!(
            zones.update(Vec3::new(1.0, 1.6, 0.0)),
            vec![ZoneTransition::Entered("ops".to_string())]
        );
        assert!(zones.update(Vec3::new(2.0, 1.6, 0.0)).is_empty());

        assert_eq!(
            zones.update(Vec3::new(9.0, 1.6, 0.0)),
            vec![
                ZoneTransition::Exited("ops".to_string()),
                ZoneTransition::Entered("lab".to_string()),
            ]
        );
        assert_eq!(zones.current().collect::<Vec<_>>(), vec!["lab"]);
    }

    #[test]
    fn height_is_ignored() {
        let mut zones = monitor();
        assert_eq!(zones.update(Vec3::new(0.0, 50.0, 0.0)).len(), 1);
    }
}
