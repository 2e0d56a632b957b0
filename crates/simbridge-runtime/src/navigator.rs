//! [`NavigationLoop`] – reactive perceive/decide/act driver.
//!
//! Each step fetches a capture through the bridge, runs an
//! [`ObstacleDetector`] over it, and sends one `move_relative`.  The policy
//! is memoryless: turn by a fixed angle when an obstacle is close to the
//! image centre, otherwise go straight.
//!
//! Two presets reproduce the bundled autopilots:
//!
//! | | [`NavigatorConfig::single_goal`] | [`NavigatorConfig::corner_tour`] |
//! |---|---|---|
//! | Capture | trigger, settle 0.2 s, poll | poll only |
//! | Obstacle rule | any obstacle | within ±20 px of centre |
//! | Turn / step | 45° / 10 | 15° / 5 |
//! | Goals | `(50, 50)` | `NE`, `NW`, `SE`, `SW` |
//! | Pacing | 0.5 s | 0.3 s |
//! | Blind cycle | skip move | move forward |
//!
//! Capture and move failures inside a step are logged and the loop moves on.
//! Only the upfront self-test is fatal.
//!
//! The early-exit check compares the goal's distance *from the origin*
//! against the safe distance.  It does not track the robot and is kept as a
//! rough placeholder; with the preset goals it never fires, so runs end on
//! the step budget or on shutdown.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use serde::Serialize;
use simbridge_perception::{decode_capture_image, GrayFrame, Obstacle, ObstacleDetector};
use simbridge_types::{corner_to_position, ObstacleMotion, Position, DEFAULT_CORNER_MARGIN};
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::client::{BridgeApi, ClientError};

/// Longest uninterrupted sleep while pacing; bounds shutdown latency.
const PAUSE_SLICE: Duration = Duration::from_millis(50);

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("movement self-test failed: {0}")]
    SelfTestFailed(#[source] ClientError),
}

// ─────────────────────────────────────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────────────────────────────────────

/// How a step obtains its frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CaptureMode {
    /// `POST /capture`, wait `settle`, then read the latest capture.
    Trigger { settle: Duration },
    /// Read whatever capture the simulator last pushed.
    Poll,
}

/// When a detection counts as "in the way".
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProximityRule {
    AnyObstacle,
    /// Obstacle centre strictly within `half_width` px of the frame centre on
    /// both axes.
    CenterWindow { half_width: u32 },
}

impl ProximityRule {
    pub fn blocks(&self, obstacle: &Obstacle, center: (u32, u32)) -> bool {
        match *self {
            ProximityRule::AnyObstacle => true,
            ProximityRule::CenterWindow { half_width } => {
                let dx = i64::from(obstacle.center_x) - i64::from(center.0);
                let dy = i64::from(obstacle.center_y) - i64::from(center.1);
                dx.abs() < i64::from(half_width) && dy.abs() < i64::from(half_width)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Goal {
    pub label: String,
    pub position: Position,
}

impl Goal {
    pub fn point(x: f64, z: f64) -> Self {
        Self {
            label: format!("({x}, {z})"),
            position: Position::goal(x, z, None),
        }
    }

    pub fn corner(name: &str) -> Self {
        Self {
            label: name.to_string(),
            position: corner_to_position(name, DEFAULT_CORNER_MARGIN),
        }
    }
}

/// Pre-flight move pair.  Any error aborts the run.
#[derive(Debug, Clone, PartialEq)]
pub struct SelfTest {
    /// `(turn, distance)` pairs sent in order.
    pub moves: Vec<(f64, f64)>,
    pub pause: Duration,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NavigatorConfig {
    pub capture: CaptureMode,
    pub proximity: ProximityRule,
    /// Degrees to turn when an obstacle blocks.
    pub avoid_turn: f64,
    pub step_distance: f64,
    pub safe_distance: f64,
    pub goals: Vec<Goal>,
    /// Step budget per goal.
    pub max_steps: usize,
    pub step_delay: Duration,
    pub self_test: Option<SelfTest>,
    /// Move forward on steps where no frame was available.
    pub blind_forward: bool,
    /// Sent once before the self-test.
    pub obstacle_motion: Option<ObstacleMotion>,
    /// Detector area cut-off for this preset.
    pub min_area: u32,
}

impl NavigatorConfig {
    /// Head for a fixed point, turning 45° whenever anything is detected.
    pub fn single_goal() -> Self {
        Self {
            capture: CaptureMode::Trigger {
                settle: Duration::from_millis(200),
            },
            proximity: ProximityRule::AnyObstacle,
            avoid_turn: 45.0,
            step_distance: 10.0,
            safe_distance: 40.0,
            goals: vec![Goal::point(50.0, 50.0)],
            max_steps: 500,
            step_delay: Duration::from_millis(500),
            self_test: Some(SelfTest {
                moves: vec![(0.0, 10.0), (180.0, 10.0)],
                pause: Duration::from_secs(1),
            }),
            blind_forward: false,
            obstacle_motion: None,
            min_area: 200,
        }
    }

    /// Visit the four floor corners with moving obstacles enabled.
    pub fn corner_tour() -> Self {
        Self {
            capture: CaptureMode::Poll,
            proximity: ProximityRule::CenterWindow { half_width: 20 },
            avoid_turn: 15.0,
            step_distance: 5.0,
            safe_distance: 20.0,
            goals: ["NE", "NW", "SE", "SW"].into_iter().map(Goal::corner).collect(),
            max_steps: 500,
            step_delay: Duration::from_millis(300),
            self_test: Some(SelfTest {
                moves: vec![(0.0, 5.0), (0.0, -5.0)],
                pause: Duration::from_millis(500),
            }),
            blind_forward: true,
            obstacle_motion: Some(ObstacleMotion::new(true)),
            min_area: 100,
        }
    }

    /// Zero every pause.  Used by tests and dry runs.
    pub fn without_delays(mut self) -> Self {
        self.step_delay = Duration::ZERO;
        if let CaptureMode::Trigger { settle } = &mut self.capture {
            *settle = Duration::ZERO;
        }
        if let Some(test) = &mut self.self_test {
            test.pause = Duration::ZERO;
        }
        self
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Decision
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Decision {
    pub turn: f64,
    pub distance: f64,
    pub blocked: bool,
}

/// Pick the next relative move from the obstacles seen in one frame.
pub fn decide(config: &NavigatorConfig, center: (u32, u32), obstacles: &[Obstacle]) -> Decision {
    let blocked = obstacles.iter().any(|o| config.proximity.blocks(o, center));
    Decision {
        turn: if blocked { config.avoid_turn } else { 0.0 },
        distance: config.step_distance,
        blocked,
    }
}

/// Placeholder early-exit heuristic; see the module docs.
fn goal_heuristic_met(config: &NavigatorConfig, goal: &Goal) -> bool {
    Position::ground(0.0, 0.0).planar_distance(&goal.position) < config.safe_distance
}

// ─────────────────────────────────────────────────────────────────────────────
// Loop
// ─────────────────────────────────────────────────────────────────────────────

/// Counters describing a finished run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct NavigationReport {
    pub steps: usize,
    pub moves_sent: usize,
    pub move_failures: usize,
    pub blind_cycles: usize,
    pub obstacle_cycles: usize,
    pub goals_reached: Vec<String>,
    pub interrupted: bool,
}

pub struct NavigationLoop<B, D> {
    api: B,
    detector: D,
    config: NavigatorConfig,
    shutdown: Arc<AtomicBool>,
}

impl<B: BridgeApi, D: ObstacleDetector> NavigationLoop<B, D> {
    pub fn new(api: B, detector: D, config: NavigatorConfig) -> Self {
        Self {
            api,
            detector,
            config,
            shutdown: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Stop at the next step boundary once `flag` is set.
    pub fn with_shutdown(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown = flag;
        self
    }

    pub fn api(&self) -> &B {
        &self.api
    }

    pub fn config(&self) -> &NavigatorConfig {
        &self.config
    }

    fn stopped(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    fn pause(&self, duration: Duration) {
        let deadline = Instant::now() + duration;
        while !self.stopped() {
            let now = Instant::now();
            if now >= deadline {
                break;
            }
            std::thread::sleep(PAUSE_SLICE.min(deadline - now));
        }
    }

    /// Run every goal in order.
    ///
    /// # Errors
    ///
    /// Returns [`NavigationError::SelfTestFailed`] if a pre-flight move
    /// fails.  Nothing after the self-test can fail the run.
    pub fn run(&self) -> Result<NavigationReport, NavigationError> {
        let mut report = NavigationReport::default();

        if let Some(motion) = &self.config.obstacle_motion {
            match self.api.set_obstacle_motion(motion) {
                Ok(()) => info!(speed = motion.speed, "moving obstacles enabled"),
                Err(e) => warn!(error = %e, "could not enable obstacle motion"),
            }
        }

        if let Some(test) = &self.config.self_test {
            self.self_test(test)?;
        }

        'goals: for goal in &self.config.goals {
            info!(goal = %goal.label, x = goal.position.x, z = goal.position.z, "navigating");
            for step in 1..=self.config.max_steps {
                if self.stopped() {
                    report.interrupted = true;
                    break 'goals;
                }
                report.steps += 1;

                let decision = match self.perceive() {
                    Some(frame) => {
                        let obstacles = self.detector.detect(&frame);
                        let decision = decide(&self.config, frame.center(), &obstacles);
                        if decision.blocked {
                            report.obstacle_cycles += 1;
                            info!(step, detected = obstacles.len(), turn = decision.turn, "obstacle ahead, turning");
                        }
                        decision
                    }
                    None => {
                        report.blind_cycles += 1;
                        if self.config.blind_forward {
                            self.send_move(&mut report, 0.0, self.config.step_distance);
                        }
                        debug!(step, "no frame this step");
                        self.pause(self.config.step_delay);
                        continue;
                    }
                };

                self.send_move(&mut report, decision.turn, decision.distance);
                info!(step, goal = %goal.label, turn = decision.turn, distance = decision.distance, "step");

                if goal_heuristic_met(&self.config, goal) {
                    info!(goal = %goal.label, "goal reached");
                    report.goals_reached.push(goal.label.clone());
                    break;
                }

                self.pause(self.config.step_delay);
            }
        }

        if self.stopped() {
            report.interrupted = true;
        }
        info!(
            steps = report.steps,
            moves = report.moves_sent,
            blind = report.blind_cycles,
            interrupted = report.interrupted,
            "navigation finished"
        );
        Ok(report)
    }

    fn self_test(&self, test: &SelfTest) -> Result<(), NavigationError> {
        info!("running movement self-test");
        for &(turn, distance) in &test.moves {
            self.api
                .move_relative(turn, distance)
                .map_err(NavigationError::SelfTestFailed)?;
            self.pause(test.pause);
        }
        info!("movement self-test passed");
        Ok(())
    }

    fn send_move(&self, report: &mut NavigationReport, turn: f64, distance: f64) {
        match self.api.move_relative(turn, distance) {
            Ok(()) => report.moves_sent += 1,
            Err(e) => {
                report.move_failures += 1;
                warn!(error = %e, turn, distance, "move failed");
            }
        }
    }

    /// Fetch and decode the current frame.  Every failure yields `None`.
    fn perceive(&self) -> Option<GrayFrame> {
        if let CaptureMode::Trigger { settle } = self.config.capture {
            if let Err(e) = self.api.request_capture() {
                warn!(error = %e, "capture request failed");
                return None;
            }
            self.pause(settle);
        }

        let capture = match self.api.latest_capture() {
            Ok(Some(capture)) => capture,
            Ok(None) => return None,
            Err(e) => {
                warn!(error = %e, "could not fetch latest capture");
                return None;
            }
        };
        let image = capture.image.as_deref().filter(|s| !s.is_empty())?;
        decode_capture_image(image)
            .map_err(|e| warn!(error = %e, "capture image undecodable"))
            .ok()
    }
}
