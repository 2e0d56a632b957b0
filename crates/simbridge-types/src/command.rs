//! Commands sent from the bridge to a connected simulator.
//!
//! Each [`Command`] serialises to exactly one JSON object discriminated by a
//! `command` field, e.g. `{"command":"move_relative","turn":15.0,"distance":5.0}`.
//! Defaults that the HTTP surface fills in for omitted fields live in the
//! constructors here, not at the call sites.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Height given to a goal marker when the caller omits `y`.
pub const GOAL_DEFAULT_Y: f64 = 0.0;
/// Height given to an obstacle when the caller omits `y`.
pub const OBSTACLE_DEFAULT_Y: f64 = 2.0;
/// Obstacle drift speed used when `/obstacles/motion` omits `speed`.
pub const DEFAULT_OBSTACLE_SPEED: f64 = 0.05;

/// A point in simulator world space.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Position {
    pub x: f64,
    #[serde(default)]
    pub y: f64,
    pub z: f64,
}

impl Position {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Ground-level target for a `move` command (`y` is always 0).
    pub fn ground(x: f64, z: f64) -> Self {
        Self::new(x, 0.0, z)
    }

    /// Goal marker position; `y` falls back to [`GOAL_DEFAULT_Y`].
    pub fn goal(x: f64, z: f64, y: Option<f64>) -> Self {
        Self::new(x, y.unwrap_or(GOAL_DEFAULT_Y), z)
    }

    /// Obstacle position; `y` falls back to [`OBSTACLE_DEFAULT_Y`].
    pub fn obstacle(x: f64, z: f64, y: Option<f64>) -> Self {
        Self::new(x, y.unwrap_or(OBSTACLE_DEFAULT_Y), z)
    }

    /// Planar (x/z) distance between two positions.
    pub fn planar_distance(&self, other: &Position) -> f64 {
        ((self.x - other.x).powi(2) + (self.z - other.z).powi(2)).sqrt()
    }
}

/// Axis-aligned rectangle that moving obstacles stay inside.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObstacleBounds {
    pub min_x: f64,
    pub max_x: f64,
    pub min_z: f64,
    pub max_z: f64,
}

impl Default for ObstacleBounds {
    fn default() -> Self {
        Self {
            min_x: -45.0,
            max_x: 45.0,
            min_z: -45.0,
            max_z: 45.0,
        }
    }
}

/// Parameters of a `set_obstacle_motion` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ObstacleMotion {
    pub enabled: bool,
    pub speed: f64,
    /// Per-obstacle velocities, forwarded to the simulator untouched.
    pub velocities: Option<Value>,
    pub bounds: ObstacleBounds,
    pub bounce: bool,
}

impl ObstacleMotion {
    /// Motion settings with every optional field at its default.
    pub fn new(enabled: bool) -> Self {
        Self {
            enabled,
            speed: DEFAULT_OBSTACLE_SPEED,
            velocities: None,
            bounds: ObstacleBounds::default(),
            bounce: true,
        }
    }

    pub fn with_speed(mut self, speed: f64) -> Self {
        self.speed = speed;
        self
    }

    pub fn with_bounds(mut self, bounds: ObstacleBounds) -> Self {
        self.bounds = bounds;
        self
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    pub fn with_velocities(mut self, velocities: Option<Value>) -> Self {
        self.velocities = velocities;
        self
    }
}

/// Every message the bridge can send to a simulator.
///
/// Constructed once per request and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum Command {
    /// Drive to an absolute ground position.
    Move { target: Position },
    /// Turn by `turn` degrees, then travel `distance` units.
    #[serde(rename = "move_relative")]
    MoveRelative { turn: f64, distance: f64 },
    Stop,
    /// Ask the simulator to render and send back a camera frame.
    #[serde(rename = "capture_image")]
    CaptureRequest,
    SetGoal { position: Position },
    #[serde(rename = "set_obstacles")]
    SetObstaclePositions { positions: Vec<Position> },
    SetObstacleMotion(ObstacleMotion),
    Reset,
}

impl Command {
    pub fn move_to(x: f64, z: f64) -> Self {
        Command::Move {
            target: Position::ground(x, z),
        }
    }

    pub fn move_relative(turn: f64, distance: f64) -> Self {
        Command::MoveRelative { turn, distance }
    }

    /// The wire discriminant, e.g. `"move_relative"`.
    pub fn kind(&self) -> &'static str {
        match self {
            Command::Move { .. } => "move",
            Command::MoveRelative { .. } => "move_relative",
            Command::Stop => "stop",
            Command::CaptureRequest => "capture_image",
            Command::SetGoal { .. } => "set_goal",
            Command::SetObstaclePositions { .. } => "set_obstacles",
            Command::SetObstacleMotion(_) => "set_obstacle_motion",
            Command::Reset => "reset",
        }
    }

    /// Serialise to the single-line JSON frame sent over the WebSocket.
    pub fn to_wire(&self) -> Result<String, crate::BridgeError> {
        serde_json::to_string(self).map_err(|e| crate::BridgeError::Serialization(e.to_string()))
    }

    /// The wire form as a JSON value, for echoing back in HTTP responses.
    pub fn to_value(&self) -> Result<Value, crate::BridgeError> {
        serde_json::to_value(self).map_err(|e| crate::BridgeError::Serialization(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(cmd: &Command) -> Value {
        serde_json::from_str(&cmd.to_wire().unwrap()).unwrap()
    }

    #[test]
    fn move_targets_ground_level() {
        let v = wire(&Command::move_to(5.0, -3.0));
        assert_eq!(v["command"], "move");
        assert_eq!(v["target"]["x"].as_f64(), Some(5.0));
        assert_eq!(v["target"]["y"].as_f64(), Some(0.0));
        assert_eq!(v["target"]["z"].as_f64(), Some(-3.0));
    }

    #[test]
    fn move_relative_carries_turn_and_distance() {
        let v = wire(&Command::move_relative(0.0, 10.0));
        assert_eq!(v["command"], "move_relative");
        assert_eq!(v["turn"].as_f64(), Some(0.0));
        assert_eq!(v["distance"].as_f64(), Some(10.0));
        assert_eq!(v.as_object().unwrap().len(), 3);
    }

    #[test]
    fn unit_commands_are_bare_discriminants() {
        assert_eq!(wire(&Command::Stop), json!({"command": "stop"}));
        assert_eq!(wire(&Command::CaptureRequest), json!({"command": "capture_image"}));
        assert_eq!(wire(&Command::Reset), json!({"command": "reset"}));
    }

    #[test]
    fn obstacle_positions_use_set_obstacles_discriminant() {
        let cmd = Command::SetObstaclePositions {
            positions: vec![Position::obstacle(1.0, 2.0, None)],
        };
        let v = wire(&cmd);
        assert_eq!(v["command"], "set_obstacles");
        assert_eq!(v["positions"][0]["y"].as_f64(), Some(OBSTACLE_DEFAULT_Y));
    }

    #[test]
    fn obstacle_motion_is_flattened_with_camel_case_bounds() {
        let v = wire(&Command::SetObstacleMotion(ObstacleMotion::new(true)));
        assert_eq!(v["command"], "set_obstacle_motion");
        assert_eq!(v["enabled"], true);
        assert_eq!(v["speed"].as_f64(), Some(DEFAULT_OBSTACLE_SPEED));
        assert!(v["velocities"].is_null());
        assert!(v.as_object().unwrap().contains_key("velocities"));
        assert_eq!(v["bounds"]["minX"].as_f64(), Some(-45.0));
        assert_eq!(v["bounds"]["maxZ"].as_f64(), Some(45.0));
        assert_eq!(v["bounce"], true);
    }

    #[test]
    fn kind_matches_wire_discriminant() {
        let all = [
            Command::move_to(0.0, 0.0),
            Command::move_relative(1.0, 1.0),
            Command::Stop,
            Command::CaptureRequest,
            Command::SetGoal { position: Position::goal(1.0, 1.0, None) },
            Command::SetObstaclePositions { positions: vec![] },
            Command::SetObstacleMotion(ObstacleMotion::new(false)),
            Command::Reset,
        ];
        for cmd in all {
            assert_eq!(wire(&cmd)["command"], cmd.kind());
        }
    }

    #[test]
    fn goal_and_obstacle_heights_default_differently() {
        assert_eq!(Position::goal(1.0, 2.0, None).y, 0.0);
        assert_eq!(Position::obstacle(1.0, 2.0, None).y, 2.0);
        assert_eq!(Position::obstacle(1.0, 2.0, Some(7.5)).y, 7.5);
    }

    #[test]
    fn position_y_defaults_when_absent_on_decode() {
        let p: Position = serde_json::from_str(r#"{"x":1.5,"z":-2}"#).unwrap();
        assert_eq!(p, Position::new(1.5, 0.0, -2.0));
    }

    #[test]
    fn planar_distance_ignores_height() {
        let a = Position::new(0.0, 10.0, 0.0);
        let b = Position::new(3.0, -4.0, 4.0);
        assert!((a.planar_distance(&b) - 5.0).abs() < 1e-9);
    }
}
