//! Walk mode: the lifecycle around arrival detection.
//!
//! [`WalkController`] owns the position stream, the walk session, and the tour
//! cursor (active route and stop). It reacts to three kinds of input, each
//! handled to completion before the next:
//!
//! - toggles and configuration: [`enable`](WalkController::enable),
//!   [`disable`](WalkController::disable),
//!   [`change_route`](WalkController::change_route)
//! - app visibility: [`set_visibility`](WalkController::set_visibility)
//! - position events, drained in delivery order by
//!   [`pump`](WalkController::pump)
//!
//! No input can fail the controller. Position errors and narration failures
//! end up as status lines or log records, and a later enable always works.

use log::{debug, info, warn};

use crate::arrival::{Arrival, Assessment, WalkSession};
use crate::config::WalkConfig;
use crate::geo::{
    DEFAULT_WALK_MPS, bearing_degrees, eta_seconds, point_to_polyline_distance, remaining_meters,
};
use crate::host::{Guidance, WalkHost, WalkStatus};
use crate::model::{PositionFix, Route};
use crate::position::{PositionError, PositionEvent, PositionSource, PositionStream};
use crate::throttle::{RateLimiter, RefreshThrottle};

/// Minimum time between off-route notices.
const OFF_ROUTE_NOTICE_INTERVAL: jiff::SignedDuration = jiff::SignedDuration::from_secs(60);

/// Whether the host app is in the foreground.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Visibility {
    #[default]
    Visible,
    Hidden,
}

/// Where walk mode stands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalkState {
    /// Walk mode is off.
    Idle,

    /// Watching, no fix yet.
    Seeking,

    /// At least one fix received.
    Tracking { target_index: usize, distance_m: u32 },

    /// Walk mode is on, but the app is in the background.
    Paused,

    /// Walk mode is on, but location is refused or missing.
    Blocked(PositionError),
}

/// Drives walk mode for one host.
pub struct WalkController<S, H> {
    stream: PositionStream<S>,
    host: H,
    route: Route,
    active_index: usize,
    session: Option<WalkSession>,
    state: WalkState,
    visibility: Visibility,
    refresh: RefreshThrottle,
    off_route_notice: RateLimiter,
}

impl<S: PositionSource, H: WalkHost> WalkController<S, H> {
    /// A controller on `route`, walk mode off, first stop active.
    pub fn new(source: S, host: H, route: Route) -> Self {
        Self {
            stream: PositionStream::new(source),
            host,
            route,
            active_index: 0,
            session: None,
            state: WalkState::Idle,
            visibility: Visibility::Visible,
            refresh: RefreshThrottle::new(false),
            off_route_notice: RateLimiter::new(OFF_ROUTE_NOTICE_INTERVAL),
        }
    }

    pub fn state(&self) -> WalkState {
        self.state
    }

    #[cfg(test)]
    pub fn is_enabled(&self) -> bool {
        self.session.is_some()
    }

    #[cfg(test)]
    pub fn session(&self) -> Option<&WalkSession> {
        self.session.as_ref()
    }

    pub fn route(&self) -> &Route {
        &self.route
    }

    pub fn active_index(&self) -> usize {
        self.active_index
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Turns walk mode on with `config`, or retunes it when already on.
    ///
    /// Arrivals and the cooldown survive a retune.
    pub fn enable(&mut self, config: WalkConfig) {
        self.refresh.set_power_saving(config.power_saving);
        match &mut self.session {
            Some(session) => {
                info!("walk mode retuned ({config:?})");
                session.set_config(config);
            }
            None => {
                let session = WalkSession::new(config);
                info!("walk mode on, session {} ({:?})", session.id(), session.config());
                self.session = Some(session);
            }
        }

        if self.visibility == Visibility::Hidden {
            self.pause();
        } else {
            self.start_tracking();
        }
    }

    /// Turns walk mode off and ends the session. Idempotent.
    pub fn disable(&mut self) {
        let Some(session) = self.session.take() else {
            return;
        };
        self.stream.stop();
        self.state = WalkState::Idle;
        self.host.show_status(&WalkStatus::Off);
        info!(
            "walk mode off, session {} ({} arrivals)",
            session.id(),
            session.arrived_count()
        );
    }

    /// Pauses tracking in the background and resumes it in the foreground.
    ///
    /// The session is kept across a pause. Resuming restarts the watch with
    /// the same configuration as enabling would.
    pub fn set_visibility(&mut self, visibility: Visibility) {
        if self.visibility == visibility {
            return;
        }
        self.visibility = visibility;
        if self.session.is_none() {
            return;
        }
        match visibility {
            Visibility::Hidden => self.pause(),
            Visibility::Visible => {
                info!("walk mode resumed in foreground");
                self.start_tracking();
            }
        }
    }

    /// Switches to `route` and starts over at its first stop.
    ///
    /// Every stop may fire again. Walk mode stays on or off as it was.
    pub fn change_route(&mut self, route: Route) {
        info!("route changed to '{}'", route.id);
        self.route = route;
        self.active_index = 0;
        if let Some(session) = &mut self.session {
            session.clear_arrivals();
        }
    }

    /// Steps the tour by hand. Out-of-range indexes are clamped.
    pub fn set_active_stop(&mut self, index: usize) {
        self.active_index = self.route.clamp_index(index);
    }

    /// Handles every pending position event, in delivery order.
    ///
    /// Returns the arrivals that fired.
    pub fn pump(&mut self) -> Vec<Arrival> {
        let mut arrivals = Vec::new();
        while let Some(event) = self.stream.next_event() {
            match event {
                PositionEvent::Fix(fix) => arrivals.extend(self.handle_fix(&fix)),
                PositionEvent::Error(error) => self.handle_error(error),
            }
        }
        arrivals
    }

    fn start_tracking(&mut self) {
        let Some(session) = &self.session else {
            return;
        };
        match self.stream.start(session.config().power_mode()) {
            Ok(true) => {
                self.state = WalkState::Seeking;
                self.host.show_status(&WalkStatus::Seeking);
            }
            Ok(false) => debug!("position watch already running, state kept"),
            Err(error) => self.block(error),
        }
    }

    fn pause(&mut self) {
        self.stream.stop();
        self.state = WalkState::Paused;
        self.host.show_status(&WalkStatus::Paused);
        info!("walk mode paused in background");
    }

    fn block(&mut self, error: PositionError) {
        self.stream.stop();
        self.state = WalkState::Blocked(error);
        self.host.show_status(&WalkStatus::Position(error));
        warn!("walk mode blocked: {error}");
    }

    fn handle_error(&mut self, error: PositionError) {
        if error.is_terminal() {
            self.block(error);
        } else {
            warn!("{error}");
            self.host.show_status(&WalkStatus::Position(error));
        }
    }

    fn handle_fix(&mut self, fix: &PositionFix) -> Option<Arrival> {
        if !matches!(self.state, WalkState::Seeking | WalkState::Tracking { .. }) {
            debug!("fix at {} ignored in {:?}", fix.coordinate, self.state);
            return None;
        }
        if self.route.stops.is_empty() {
            debug!("fix ignored, route '{}' has no stops", self.route.id);
            return None;
        }
        let session = self.session.as_mut()?;
        let config = session.config().clone();
        let assessment = session.assess(&self.route, self.active_index, fix);

        self.state = WalkState::Tracking {
            target_index: assessment.target_index,
            distance_m: assessment.distance_m,
        };
        self.host.show_status(&WalkStatus::Distance {
            meters: assessment.distance_m,
            target: config.target,
        });

        let off_route_m = point_to_polyline_distance(fix.coordinate, &self.route.line);
        if self.refresh.allow(fix.at) {
            let guidance = guidance(
                &self.route,
                self.active_index,
                fix,
                &assessment,
                config.speed_mps,
                off_route_m,
            );
            self.host.redraw(&guidance);
        }
        if off_route_m.is_finite()
            && off_route_m > f64::from(config.off_route_m)
            && self.off_route_notice.try_acquire(fix.at)
        {
            debug!("{off_route_m:.0}m off route");
            self.host.off_route(off_route_m);
        }

        let arrival = assessment.arrival?;
        self.host.notify_arrival(&self.route.stops[arrival.stop_index]);
        if let Some(index) = arrival.advanced_to {
            self.active_index = index;
        }

        let active = &self.route.stops[self.active_index];
        if let Err(e) = self.host.play_narration(active) {
            debug!("narration for '{}' not started: {e}", active.id);
        }
        if arrival.completes_tour {
            info!("tour '{}' completed", self.route.id);
            self.host.tour_completed(&self.route);
        }
        Some(arrival)
    }
}

fn guidance(
    route: &Route,
    active_index: usize,
    fix: &PositionFix,
    assessment: &Assessment,
    speed_mps: f64,
    off_route_m: f64,
) -> Guidance {
    let target = &route.stops[assessment.target_index];
    let to_end = remaining_meters(fix.coordinate, &route.stops, active_index);
    Guidance {
        position: fix.coordinate,
        active_index,
        target_index: assessment.target_index,
        distance_m: assessment.distance_m,
        bearing_deg: bearing_degrees(fix.coordinate, target.coordinate),
        eta_to_target_secs: eta(f64::from(assessment.distance_m), speed_mps),
        eta_to_end_secs: eta(to_end, speed_mps),
        off_route_m,
    }
}

fn eta(distance_m: f64, speed_mps: f64) -> f64 {
    eta_seconds(distance_m, speed_mps).unwrap_or_else(|e| {
        warn!("{e}");
        distance_m / DEFAULT_WALK_MPS
    })
}
