//! Optical hand tracking: pinch select with hysteresis, point hover and the
//! two-hand scale gesture.

use std::collections::{HashMap, HashSet};

use glam::Vec3;
use tracing::{debug, trace};

use crate::config::GestureConfig;
use crate::geometry::Ray;
use crate::input::{HandState, Handedness, RayInterceptor, SourceId};
use crate::selector::{HoverSlot, RaySelector};
use crate::station::StationSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PinchState {
    #[default]
    Open,
    Pinching,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum ScaleGesture {
    Idle,
    Active { baseline: f32 },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GestureEvent {
    PinchStarted { hand: Handedness, origin: Vec3 },
    /// The interceptor took the pinch; nothing was picked.
    PinchConsumed { hand: Handedness },
    PinchSelected { hand: Handedness, station: String },
    PinchEnded { hand: Handedness },
    ScaleStarted { baseline: f32 },
    ScaleUpdated { factor: f32 },
    ScaleEnded,
}

#[derive(Debug, Clone, Copy, Default)]
struct HandTrack {
    pinch: PinchState,
    /// Thumb/index midpoint
    point: Vec3,
}

#[derive(Debug, Clone)]
pub struct HandGestureRecognizer {
    config: GestureConfig,
    enabled: bool,
    hands: HashMap<Handedness, HandTrack>,
    scale: ScaleGesture,
    hover: HoverSlot,
}

impl HandGestureRecognizer {
    pub fn new(config: GestureConfig) -> Self {
        Self {
            config,
            enabled: true,
            hands: HashMap::new(),
            scale: ScaleGesture::Idle,
            hover: HoverSlot::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn enable(&mut self) {
        self.enabled = true;
    }

    /// Forget all hands and clear hand hover. Pinches and a scale in
    /// progress are ended through `out` like any other release.
    pub fn disable(&mut self, stations: &mut StationSet, out: &mut Vec<GestureEvent>) {
        self.enabled = false;
        for (side, track) in self.hands.drain() {
            if track.pinch == PinchState::Pinching {
                out.push(GestureEvent::PinchEnded { hand: side });
            }
        }
        if self.is_scaling() {
            out.push(GestureEvent::ScaleEnded);
        }
        self.scale = ScaleGesture::Idle;
        self.hover.clear(stations);
    }

    pub fn pinch_state(&self, hand: Handedness) -> PinchState {
        self.hands.get(&hand).map(|t| t.pinch).unwrap_or_default()
    }

    pub fn is_scaling(&self) -> bool {
        matches!(self.scale, ScaleGesture::Active { .. })
    }

    /// The station hovered by hand input, shared by both hands.
    pub fn hovered(&self) -> Option<&str> {
        self.hover.current()
    }

    pub fn update(
        &mut self,
        hands: &[HandState],
        stations: &mut StationSet,
        mut interceptor: Option<&mut dyn RayInterceptor>,
        out: &mut Vec<GestureEvent>,
    ) {
        if !self.enabled {
            return;
        }

        let mut seen = HashSet::new();
        let mut best_hover: Option<(f32, String)> = None;

        for hand in hands {
            let side = hand.handedness;
            seen.insert(side);
            let track = self.hands.entry(side).or_default();

            let joints = hand.joints.complete().filter(|_| hand.connected);
            let Some((thumb, index, wrist)) = joints else {
                trace!("{side:?} hand joints unavailable");
                if track.pinch == PinchState::Pinching {
                    out.push(GestureEvent::PinchEnded { hand: side });
                }
                track.pinch = PinchState::Open;
                continue;
            };

            let gap = thumb.distance(index);
            track.point = (thumb + index) * 0.5;
            let pointing = index - wrist;

            match track.pinch {
                PinchState::Open if gap < self.config.pinch_start => {
                    track.pinch = PinchState::Pinching;
                    out.push(GestureEvent::PinchStarted {
                        hand: side,
                        origin: track.point,
                    });

                    let ray = Ray::new(index, pointing);
                    if ray.is_degenerate() {
                        continue;
                    }
                    let source = SourceId::Hand(side);
                    if let Some(interceptor) = interceptor.as_deref_mut()
                        && interceptor.intercept(source, &ray)
                    {
                        out.push(GestureEvent::PinchConsumed { hand: side });
                    } else if let Some(pick) = RaySelector.pick(&ray, stations) {
                        stations.set_selected(&pick.id, true);
                        debug!("{side:?} pinch selected {}", pick.id);
                        out.push(GestureEvent::PinchSelected {
                            hand: side,
                            station: pick.id,
                        });
                    }
                }
                PinchState::Pinching if gap > self.config.pinch_end => {
                    track.pinch = PinchState::Open;
                    out.push(GestureEvent::PinchEnded { hand: side });
                }
                PinchState::Open => {
                    if pointing.length() <= self.config.min_point_length {
                        continue;
                    }
                    let ray = Ray::new(index, pointing);
                    if let Some(pick) = RaySelector.pick(&ray, stations)
                        && best_hover.as_ref().is_none_or(|(d, _)| pick.distance < *d)
                    {
                        best_hover = Some((pick.distance, pick.id));
                    }
                }
                PinchState::Pinching => {}
            }
        }

        // hands that dropped out of tracking entirely
        for (side, track) in self.hands.iter_mut() {
            if !seen.contains(side) && track.pinch == PinchState::Pinching {
                track.pinch = PinchState::Open;
                out.push(GestureEvent::PinchEnded { hand: *side });
            }
        }

        let target = best_hover.map(|(_, id)| id);
        self.hover.update(stations, target.as_deref());

        self.update_scale(out);
    }

    fn update_scale(&mut self, out: &mut Vec<GestureEvent>) {
        let pinched: Vec<Vec3> = self
            .hands
            .values()
            .filter(|t| t.pinch == PinchState::Pinching)
            .map(|t| t.point)
            .collect();

        let [a, b] = pinched.as_slice() else {
            if self.is_scaling() {
                out.push(GestureEvent::ScaleEnded);
            }
            self.scale = ScaleGesture::Idle;
            return;
        };

        let distance = a.distance(*b);
        match self.scale {
            ScaleGesture::Idle => {
                if distance > f32::EPSILON {
                    self.scale = ScaleGesture::Active { baseline: distance };
                    out.push(GestureEvent::ScaleStarted { baseline: distance });
                }
            }
            ScaleGesture::Active { baseline } => {
                out.push(GestureEvent::ScaleUpdated {
                    factor: distance / baseline,
                });
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::input::HandJoints;
    use crate::station::Station;

    /// A hand pointing down -Z from `center` with the given thumb/index gap.
    fn hand(side: Handedness, center: Vec3, gap: f32) -> HandState {
        let half = Vec3::new(gap * 0.5, 0.0, 0.0);
        HandState::new(
            side,
            HandJoints::new(center - half, center + half, center + Vec3::new(0.0, 0.0, 0.1)),
        )
    }

    fn target() -> StationSet {
        let mut stations = StationSet::new();
        stations.insert(Station::new("a", "Alpha", Vec3::new(0.0, 1.0, -4.0)));
        stations
    }

    struct Panel;

    impl RayInterceptor for Panel {
        fn intercept(&mut self, _source: SourceId, _ray: &Ray) -> bool {
            true
        }
    }

    #[test]
    fn pinch_hysteresis() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = StationSet::new();
        let mut out = Vec::new();
        let center = Vec3::new(0.0, 1.0, 0.0);

        let steps = [
            (0.050, PinchState::Open),
            (0.024, PinchState::Pinching),
            (0.035, PinchState::Pinching),
            (0.044, PinchState::Pinching),
            (0.020, PinchState::Pinching),
            (0.046, PinchState::Open),
            (0.030, PinchState::Open),
        ];
        for (gap, expected) in steps {
            rec.update(&[hand(Handedness::Left, center, gap)], &mut stations, None, &mut out);
            assert_eq!(rec.pinch_state(Handedness::Left), expected, "gap {gap}");
        }

        let starts = out
            .iter()
            .filter(|e| matches!(e, GestureEvent::PinchStarted { .. }))
            .count();
        assert_eq!(starts, 1);
    }

    #[test]
    fn pinch_selects_picked_station() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = target();
        let mut out = Vec::new();
        let center = Vec3::new(0.0, 1.0, 0.0);

        rec.update(&[hand(Handedness::Right, center, 0.06)], &mut stations, None, &mut out);
        rec.update(&[hand(Handedness::Right, center, 0.01)], &mut stations, None, &mut out);

        assert!(out.contains(&GestureEvent::PinchSelected {
            hand: Handedness::Right,
            station: "a".to_string(),
        }));
        assert!(stations.get("a").expect("a").flags.selected);
    }

    #[test]
    fn interceptor_takes_priority() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = target();
        let mut out = Vec::new();
        let mut panel = Panel;

        rec.update(
            &[hand(Handedness::Right, Vec3::new(0.0, 1.0, 0.0), 0.01)],
            &mut stations,
            Some(&mut panel),
            &mut out,
        );
        assert!(out.contains(&GestureEvent::PinchConsumed {
            hand: Handedness::Right
        }));
        assert!(!stations.get("a").expect("a").flags.selected);
    }

    #[test]
    fn missing_joint_releases_pinch() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = StationSet::new();
        let mut out = Vec::new();
        let pinching = hand(Handedness::Left, Vec3::ZERO, 0.01);

        rec.update(&[pinching], &mut stations, None, &mut out);
        assert_eq!(rec.pinch_state(Handedness::Left), PinchState::Pinching);

        let mut blind = pinching;
        blind.joints.thumb_tip = None;
        out.clear();
        rec.update(&[blind], &mut stations, None, &mut out);
        assert_eq!(rec.pinch_state(Handedness::Left), PinchState::Open);
        assert_eq!(out, vec![GestureEvent::PinchEnded {
            hand: Handedness::Left
        }]);
    }

    #[test]
    fn two_hand_scale() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = StationSet::new();
        let mut out = Vec::new();
        let pair = |spread: f32| {
            [
                hand(Handedness::Left, Vec3::new(-spread, 1.0, 0.0), 0.01),
                hand(Handedness::Right, Vec3::new(spread, 1.0, 0.0), 0.01),
            ]
        };

        rec.update(&pair(0.2), &mut stations, None, &mut out);
        assert!(rec.is_scaling());
        assert!(out.iter().any(|e| matches!(e, GestureEvent::ScaleStarted { baseline } if (baseline - 0.4).abs() < 1e-5)));
        assert!(!out.iter().any(|e| matches!(e, GestureEvent::ScaleUpdated { .. })));

        out.clear();
        rec.update(&pair(0.4), &mut stations, None, &mut out);
        let GestureEvent::ScaleUpdated { factor } = out[0] else {
            panic!("expected scale update, got {out:?}");
        };
        assert!((factor - 2.0).abs() < 1e-4);

        // drop one pinch
        out.clear();
        let [left, right] = pair(0.4);
        let open_right = hand(Handedness::Right, right.joints.index_tip.expect("tip"), 0.08);
        rec.update(&[left, open_right], &mut stations, None, &mut out);
        assert!(out.contains(&GestureEvent::ScaleEnded));
        assert!(!rec.is_scaling());

        out.clear();
        rec.update(&[left, open_right], &mut stations, None, &mut out);
        assert!(out.is_empty());

        // a fresh two-pinch starts over with a new baseline
        rec.update(&pair(0.5), &mut stations, None, &mut out);
        assert!(matches!(out.last(), Some(GestureEvent::ScaleStarted { .. })));
    }

    #[test]
    fn closest_pointing_hand_hovers() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = StationSet::new();
        stations.insert(Station::new("near", "Near", Vec3::new(-1.0, 1.0, -3.0)));
        stations.insert(Station::new("far", "Far", Vec3::new(1.0, 1.0, -8.0)));
        let mut out = Vec::new();

        // open hands with the index pointing straight down -Z
        let pointing = |side, at: Vec3| {
            HandState::new(
                side,
                HandJoints::new(at + Vec3::new(0.05, 0.0, 0.0), at, at + Vec3::new(0.0, 0.0, 0.1)),
            )
        };
        let hands = [
            pointing(Handedness::Left, Vec3::new(-1.0, 1.0, 0.0)),
            pointing(Handedness::Right, Vec3::new(1.0, 1.0, 0.0)),
        ];
        rec.update(&hands, &mut stations, None, &mut out);
        assert_eq!(rec.hovered(), Some("near"));
        assert!(stations.get("near").expect("near").flags.hovered);

        rec.disable(&mut stations, &mut out);
        assert!(!stations.get("near").expect("near").flags.hovered);
        assert_eq!(rec.hovered(), None);
    }

    #[test]
    fn disable_mid_scale_ends_everything() {
        let mut rec = HandGestureRecognizer::new(GestureConfig::default());
        let mut stations = StationSet::new();
        let mut out = Vec::new();
        let hands = [
            hand(Handedness::Left, Vec3::new(-0.3, 1.0, 0.0), 0.01),
            hand(Handedness::Right, Vec3::new(0.3, 1.0, 0.0), 0.01),
        ];
        rec.update(&hands, &mut stations, None, &mut out);
        assert!(rec.is_scaling());

        out.clear();
        rec.disable(&mut stations, &mut out);
        assert_eq!(out.len(), 3, "{out:?}");
        assert!(out.contains(&GestureEvent::PinchEnded { hand: Handedness::Left }));
        assert!(out.contains(&GestureEvent::PinchEnded { hand: Handedness::Right }));
        assert_eq!(out.last(), Some(&GestureEvent::ScaleEnded));
        assert!(!rec.is_scaling());
        assert_eq!(rec.pinch_state(Handedness::Left), PinchState::Open);

        // nothing left to end
        out.clear();
        rec.disable(&mut stations, &mut out);
        assert!(out.is_empty());
    }
}
