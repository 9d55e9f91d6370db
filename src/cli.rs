//! CLI interface for stroll.
//!
//! Two non-interactive commands:
//!
//! - `stroll routes <catalog>`: list the routes in a catalog.
//! - `stroll walk <catalog> <track>`: replay a recorded walk through walk mode
//!   and print what the walker would see.
//!
//! Walk tuning resolves flag → `~/.stroll/config.toml` → default.

mod format;

use std::io::{self, Write};
use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use log::debug;

use crate::config::{Config, Setting, WalkConfig, WalkSettings};
use crate::host::{Guidance, NarrationError, WalkHost, WalkStatus};
use crate::model::{Route, RouteCatalog, Stop};
use crate::position::{PositionEvent, ScriptedSource};
use crate::track::{self, TrackEvent};
use crate::walk::{Visibility, WalkController};

use format::{format_guidance, format_route_line, format_stop, format_summary};

/// stroll: self-guided walking tours.
#[derive(Debug, Parser)]
#[command(name = "stroll", after_long_help = USAGE_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const USAGE_HELP: &str = r#"Replaying a walk:
  stroll routes tours.json
  stroll walk tours.json morning.jsonl --route downtown --radius 40

Track files hold one event per line:
  {"event":"enable"}
  {"event":"fix","lat":21.3008,"lng":-157.85,"accuracy":6,"at":"2024-05-01T08:00:00Z"}
  {"event":"hidden"}   {"event":"visible"}   {"event":"disable"}"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// List the routes in a catalog.
    Routes {
        /// Route catalog (JSON).
        catalog: PathBuf,
    },

    /// Replay a recorded walk.
    ///
    /// Prints status lines, guidance, arrivals, and a closing summary.
    Walk {
        /// Route catalog (JSON).
        catalog: PathBuf,

        /// Recorded walk (JSONL).
        track: PathBuf,

        /// Route to start on. Defaults to the first in the catalog.
        #[arg(long)]
        route: Option<String>,

        /// Arrival radius in meters.
        #[arg(long)]
        radius: Option<String>,

        /// Seconds between auto-advances.
        #[arg(long)]
        cooldown: Option<String>,

        /// Which stop to watch for: `current` or `next`.
        #[arg(long)]
        target: Option<String>,

        /// Walking speed in m/s, for ETAs.
        #[arg(long)]
        speed: Option<String>,

        /// Sample location less often to save battery.
        #[arg(long)]
        power_saving: bool,
    },
}

/// Run the CLI, returning an error message on failure.
pub fn run() -> Result<(), String> {
    let cli = Cli::parse();

    match cli.command {
        Command::Routes { catalog } => cmd_routes(&catalog),
        Command::Walk {
            catalog,
            track,
            route,
            radius,
            cooldown,
            target,
            speed,
            power_saving,
        } => {
            let flags = WalkSettings {
                radius: radius.as_deref().map(Setting::from),
                cooldown: cooldown.as_deref().map(Setting::from),
                target,
                speed: speed.as_deref().map(Setting::from),
                power_saving: power_saving.then_some(true),
                off_route: None,
            };
            let config = resolve_config(flags)?;
            cmd_walk(&catalog, &track, route.as_deref(), &config)
        }
    }
}

fn resolve_config(flags: WalkSettings) -> Result<WalkConfig, String> {
    let file = Config::load().map_err(|e| e.to_string())?;
    let (config, issues) = flags.or(file.walk).normalize();
    for issue in &issues {
        eprintln!("warning: {issue}");
    }
    Ok(config)
}

fn load_catalog(path: &Path) -> Result<RouteCatalog, String> {
    RouteCatalog::load(path).map_err(|e| format!("failed to load {}: {e}", path.display()))
}

fn cmd_routes(catalog: &Path) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let config = resolve_config(WalkSettings::default())?;

    if catalog.routes().is_empty() {
        println!("No routes");
        return Ok(());
    }
    for route in catalog.routes() {
        println!("{}", format_route_line(route, config.speed_mps));
        if let Some(description) = &route.description {
            println!("    {description}");
        }
    }
    Ok(())
}

fn cmd_walk(
    catalog: &Path,
    track: &Path,
    route: Option<&str>,
    config: &WalkConfig,
) -> Result<(), String> {
    let catalog = load_catalog(catalog)?;
    let route = match route {
        Some(id) => catalog.get(id).map_err(|e| e.to_string())?,
        None => catalog.first().ok_or("catalog has no routes")?,
    };
    let events = track::load(track).map_err(|e| format!("failed to read {}: {e}", track.display()))?;

    let summary = replay(&catalog, route.clone(), config, events, io::stdout().lock())?;
    println!("{summary}");
    Ok(())
}

/// Drives a walk controller through `events`, writing what the host shows
/// to `out`. Returns the closing summary line.
fn replay<W: Write>(
    catalog: &RouteCatalog,
    route: Route,
    config: &WalkConfig,
    events: Vec<TrackEvent>,
    out: W,
) -> Result<String, String> {
    let source = ScriptedSource::new();
    let host = ConsoleHost::new(out, route.clone());
    let mut controller = WalkController::new(source.clone(), host, route);
    let mut arrivals = 0;

    for event in events {
        match event {
            TrackEvent::Enable => controller.enable(config.clone()),
            TrackEvent::Disable => controller.disable(),
            TrackEvent::Hidden => controller.set_visibility(Visibility::Hidden),
            TrackEvent::Visible => controller.set_visibility(Visibility::Visible),
            TrackEvent::Route { id } => {
                let next = catalog.get(&id).map_err(|e| e.to_string())?.clone();
                controller.host_mut().set_route(next.clone());
                controller.change_route(next);
            }
            TrackEvent::Stop { index } => controller.set_active_stop(index),
            TrackEvent::Refuse { kind } => source.set_refusal(Some(kind)),
            TrackEvent::Grant => source.set_refusal(None),
            TrackEvent::Fix(fix) => deliver(&source, PositionEvent::Fix(fix)),
            TrackEvent::Error { kind } => deliver(&source, PositionEvent::Error(kind)),
        }
        arrivals += controller.pump().len();
    }

    Ok(format_summary(
        controller.route(),
        controller.active_index(),
        arrivals,
        controller.state(),
    ))
}

fn deliver(source: &ScriptedSource, event: PositionEvent) {
    if !source.emit(event) {
        debug!("no active watch, position event dropped");
    }
}

/// Prints walk-mode effects as text.
///
/// Repeated status lines are collapsed. Write failures are ignored: a host
/// must never fail the engine.
struct ConsoleHost<W> {
    out: W,
    route: Route,
    last_status: Option<WalkStatus>,
}

impl<W: Write> ConsoleHost<W> {
    fn new(out: W, route: Route) -> Self {
        Self {
            out,
            route,
            last_status: None,
        }
    }

    fn set_route(&mut self, route: Route) {
        self.route = route;
    }

    fn line(&mut self, text: &str) {
        let _ = writeln!(self.out, "{text}");
    }
}

impl<W: Write> WalkHost for ConsoleHost<W> {
    fn show_status(&mut self, status: &WalkStatus) {
        if self.last_status.as_ref() == Some(status) {
            return;
        }
        self.line(&status.to_string());
        self.last_status = Some(status.clone());
    }

    fn play_narration(&mut self, stop: &Stop) -> Result<(), NarrationError> {
        self.line(&format!("  ▶ narrating {}", stop.title));
        Ok(())
    }

    fn notify_arrival(&mut self, stop: &Stop) {
        self.line(&format!("  ✓ arrived at {}", format_stop(stop)));
    }

    fn redraw(&mut self, guidance: &Guidance) {
        let text = format_guidance(&self.route, guidance);
        self.line(&format!("  · {text}"));
    }

    fn off_route(&mut self, meters: f64) {
        self.line(&format!("  ! {meters:.0}m off route"));
    }

    fn tour_completed(&mut self, route: &Route) {
        self.line(&format!("  ★ {} complete", route.name));
    }
}
