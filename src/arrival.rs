//! Arrival detection: deciding when the walker has reached a stop.
//!
//! A [`WalkSession`] holds the state one walk-mode session needs: which stops
//! have already fired, and when the last auto-advance happened. Each fix is
//! assessed against the active route:
//!
//! 1. Resolve the target stop from the target mode (clamped, no wraparound).
//! 2. Measure the distance to it, rounded to whole meters.
//! 3. Declare arrival only when the walker is inside the geofence, the
//!    cooldown has elapsed since the last auto-advance, and the target has not
//!    fired before in this session.
//!
//! Cooldown and dedup are independent gates: either one alone blocks a repeat.

use std::collections::HashSet;

use jiff::Timestamp;
use log::{debug, info};
use uuid::Uuid;

use crate::config::WalkConfig;
use crate::geo::distance_meters;
use crate::model::{PositionFix, Route, TargetMode};
use crate::throttle::RateLimiter;

/// A stop the walker reached.
#[derive(Debug, Clone, PartialEq)]
pub struct Arrival {
    pub stop_id: String,
    pub stop_index: usize,

    /// New active index, when arrival moves the tour forward.
    pub advanced_to: Option<usize>,

    /// The stop is the last one on the route.
    pub completes_tour: bool,

    pub at: Timestamp,
}

/// Outcome of assessing one fix.
#[derive(Debug, Clone, PartialEq)]
pub struct Assessment {
    pub target_index: usize,
    pub distance_m: u32,
    pub arrival: Option<Arrival>,
}

/// Mutable state of one walk-mode session.
#[derive(Debug, Clone)]
pub struct WalkSession {
    id: Uuid,
    config: WalkConfig,
    arrived: HashSet<String>,
    cooldown: RateLimiter,
}

impl WalkSession {
    pub fn new(config: WalkConfig) -> Self {
        let cooldown = RateLimiter::new(config.cooldown());
        Self {
            id: Uuid::new_v4(),
            config,
            arrived: HashSet::new(),
            cooldown,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn config(&self) -> &WalkConfig {
        &self.config
    }

    /// Applies new tuning. Arrivals and the last auto-advance are kept.
    pub fn set_config(&mut self, config: WalkConfig) {
        self.cooldown.set_interval(config.cooldown());
        self.config = config;
    }

    #[cfg(test)]
    pub fn has_arrived(&self, stop_id: &str) -> bool {
        self.arrived.contains(stop_id)
    }

    pub fn arrived_count(&self) -> usize {
        self.arrived.len()
    }

    #[cfg(test)]
    pub fn last_auto_advance(&self) -> Option<Timestamp> {
        self.cooldown.last()
    }

    /// Forgets which stops have fired, so every stop can fire again.
    ///
    /// The cooldown is untouched.
    pub fn clear_arrivals(&mut self) {
        self.arrived.clear();
    }

    /// Assesses `fix` against `route` with the tour at `active_index`.
    ///
    /// `route` must have at least one stop. The session records an arrival,
    /// but moving the tour cursor is left to the caller.
    pub fn assess(&mut self, route: &Route, active_index: usize, fix: &PositionFix) -> Assessment {
        let target_index = self
            .config
            .target
            .target_index(active_index, route.stops.len());
        let target = &route.stops[target_index];
        let distance_m = distance_meters(fix.coordinate, target.coordinate).round() as u32;
        let now = fix.at;

        let inside = distance_m <= self.config.radius_m;
        let cooled = self.cooldown.is_ready(now);
        let fresh = !self.arrived.contains(&target.id);
        debug!(
            "session {}: {distance_m}m to '{}' (inside={inside}, cooled={cooled}, fresh={fresh})",
            self.short_id(),
            target.id,
        );

        let arrival = if inside && cooled && fresh {
            self.arrived.insert(target.id.clone());
            self.cooldown.mark(now);
            info!(
                "session {}: arrived at '{}' (stop {})",
                self.short_id(),
                target.id,
                target_index + 1
            );

            let advances = self.config.target == TargetMode::Next && target_index != active_index;
            Some(Arrival {
                stop_id: target.id.clone(),
                stop_index: target_index,
                advanced_to: advances.then_some(target_index),
                completes_tour: target_index == route.last_index(),
                at: now,
            })
        } else {
            None
        };

        Assessment {
            target_index,
            distance_m,
            arrival,
        }
    }

    fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use jiff::SignedDuration;

    use crate::model::{Coordinate, Stop};

    fn stop(id: &str, lat: f64, lng: f64) -> Stop {
        Stop {
            id: id.into(),
            title: id.to_uppercase(),
            coordinate: Coordinate::new(lat, lng),
            location: None,
            walk_from_prev_min: None,
        }
    }

    /// Two stops ~111 m apart on the same meridian.
    fn honolulu() -> Route {
        Route {
            id: "downtown".into(),
            name: "Downtown".into(),
            description: None,
            city: None,
            stops: vec![
                stop("palace", 21.3000, -157.8500),
                stop("statue", 21.3010, -157.8500),
            ],
            line: vec![],
        }
    }

    fn at(secs: i64) -> Timestamp {
        Timestamp::from_second(1_700_000_000 + secs).unwrap()
    }

    fn fix_at(lat: f64, lng: f64, secs: i64) -> PositionFix {
        PositionFix::new(Coordinate::new(lat, lng), 5.0, at(secs))
    }

    /// A fix `meters` due south of the statue, as measured by the haversine.
    fn fix_south_of_statue(meters: f64, secs: i64) -> PositionFix {
        let deg = meters / (crate::geo::EARTH_RADIUS_M * std::f64::consts::PI / 180.0);
        fix_at(21.3010 - deg, -157.8500, secs)
    }

    #[test]
    fn walking_toward_next_stop_arrives_and_advances() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());

        let assessment = session.assess(&route, 0, &fix_at(21.30085, -157.8500, 0));

        assert_eq!(assessment.target_index, 1);
        assert_eq!(assessment.distance_m, 17);
        let arrival = assessment.arrival.unwrap();
        assert_eq!(arrival.stop_id, "statue");
        assert_eq!(arrival.advanced_to, Some(1));
        assert!(session.has_arrived("statue"));
        assert_eq!(session.last_auto_advance(), Some(at(0)));
    }

    #[test]
    fn geofence_boundary_is_inclusive() {
        let route = honolulu();

        let mut session = WalkSession::new(WalkConfig::default());
        let exactly = session.assess(&route, 0, &fix_south_of_statue(60.0, 0));
        assert_eq!(exactly.distance_m, 60);
        assert!(exactly.arrival.is_some());

        let mut session = WalkSession::new(WalkConfig::default());
        let outside = session.assess(&route, 0, &fix_south_of_statue(61.0, 0));
        assert_eq!(outside.distance_m, 61);
        assert!(outside.arrival.is_none());
    }

    #[test]
    fn far_fix_only_reports_distance() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());

        let assessment = session.assess(&route, 0, &fix_at(21.2990, -157.8500, 0));

        assert_eq!(assessment.distance_m, 222);
        assert!(assessment.arrival.is_none());
        assert_eq!(session.last_auto_advance(), None);
    }

    #[test]
    fn duplicate_fix_does_not_fire_twice() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());
        let fix = fix_at(21.30085, -157.8500, 0);

        assert!(session.assess(&route, 0, &fix).arrival.is_some());
        assert!(session.assess(&route, 0, &fix).arrival.is_none());
        assert_eq!(session.arrived_count(), 1);
    }

    #[test]
    fn cooldown_blocks_even_when_arrivals_are_cleared() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());

        assert!(session.assess(&route, 0, &fix_at(21.30085, -157.85, 0)).arrival.is_some());
        session.clear_arrivals();

        let within = session.assess(&route, 0, &fix_at(21.30085, -157.85, 35));
        assert!(within.arrival.is_none());

        let after = session.assess(&route, 0, &fix_at(21.30085, -157.85, 36));
        assert!(after.arrival.is_some());
    }

    #[test]
    fn dedup_blocks_after_cooldown_elapses() {
        let route = honolulu();
        let config = WalkConfig {
            target: TargetMode::Current,
            ..WalkConfig::default()
        };
        let mut session = WalkSession::new(config);

        let first = session.assess(&route, 1, &fix_at(21.3010, -157.85, 0));
        let arrival = first.arrival.unwrap();
        assert_eq!(arrival.advanced_to, None);

        let lingering = session.assess(&route, 1, &fix_at(21.3010, -157.85, 600));
        assert!(lingering.arrival.is_none());
    }

    #[test]
    fn current_mode_rearrives_once_arrivals_are_cleared() {
        let route = honolulu();
        let config = WalkConfig {
            target: TargetMode::Current,
            cooldown_secs: 1,
            ..WalkConfig::default()
        };
        let mut session = WalkSession::new(config);

        assert!(session.assess(&route, 0, &fix_at(21.3, -157.85, 0)).arrival.is_some());
        session.clear_arrivals();
        assert!(session.assess(&route, 0, &fix_at(21.3, -157.85, 2)).arrival.is_some());
    }

    #[test]
    fn next_target_clamps_at_final_stop() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());

        let assessment = session.assess(&route, 1, &fix_at(21.3010, -157.85, 0));

        assert_eq!(assessment.target_index, 1);
        let arrival = assessment.arrival.unwrap();
        assert_eq!(arrival.advanced_to, None);
    }

    #[test]
    fn reaching_final_stop_completes_tour() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());

        let arrival = session
            .assess(&route, 0, &fix_at(21.3010, -157.85, 0))
            .arrival
            .unwrap();
        assert!(arrival.completes_tour);

        let config = WalkConfig {
            target: TargetMode::Current,
            ..WalkConfig::default()
        };
        let mut session = WalkSession::new(config);
        let arrival = session
            .assess(&route, 0, &fix_at(21.3000, -157.85, 0))
            .arrival
            .unwrap();
        assert!(!arrival.completes_tour);
    }

    #[test]
    fn out_of_order_fix_respects_cooldown() {
        let route = honolulu();
        let mut session = WalkSession::new(WalkConfig::default());

        assert!(session.assess(&route, 0, &fix_at(21.30085, -157.85, 100)).arrival.is_some());
        session.clear_arrivals();
        let stale = session.assess(&route, 0, &fix_at(21.30085, -157.85, 0));
        assert!(stale.arrival.is_none());
    }

    #[test]
    fn new_config_keeps_arrivals_and_cooldown() {
        let mut session = WalkSession::new(WalkConfig::default());
        session.assess(&honolulu(), 0, &fix_at(21.30085, -157.85, 0));

        session.set_config(WalkConfig {
            cooldown_secs: 5,
            ..WalkConfig::default()
        });

        assert!(session.has_arrived("statue"));
        assert_eq!(session.config().cooldown(), SignedDuration::from_secs(5));
        assert_eq!(session.last_auto_advance(), Some(at(0)));
    }
}
