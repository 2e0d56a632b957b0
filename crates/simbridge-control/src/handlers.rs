//! Request handlers for the control surface.
//!
//! Handlers are stateless: each one validates its body, builds a
//! [`Command`] and hands it to the broadcaster, or reads the telemetry store.
//! Bodies are parsed leniently, so an empty or non-JSON body behaves like
//! `{}` and produces the endpoint's own validation message.

use std::sync::Arc;

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Query, State};
use serde::Deserialize;
use serde_json::{Map, Value, json};
use simbridge_middleware::{CommandBroadcaster, TelemetryStore};
use simbridge_types::telemetry::is_truthy;
use simbridge_types::{
    corner_to_position, Command, ObstacleBounds, ObstacleMotion, Position, DEFAULT_CORNER_MARGIN,
};

use crate::error::ApiError;

type ApiResult = Result<Json<Value>, ApiError>;

/// State shared by every handler.
#[derive(Clone)]
pub struct AppState {
    pub broadcaster: CommandBroadcaster,
    pub store: Arc<TelemetryStore>,
}

// ---------------------------------------------------------------------------
// Body helpers
// ---------------------------------------------------------------------------

fn parse_body(body: &Bytes) -> Map<String, Value> {
    match serde_json::from_slice::<Value>(body) {
        Ok(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

/// Read `key` as a number.  Numeric strings are accepted.
///
/// `Ok(None)` when the key is absent.
fn number(map: &Map<String, Value>, key: &str) -> Result<Option<f64>, ApiError> {
    let Some(value) = map.get(key) else {
        return Ok(None);
    };
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    parsed
        .map(Some)
        .ok_or_else(|| ApiError::validation(format!("\"{key}\" must be a number.")))
}

fn has_all(map: &Map<String, Value>, keys: &[&str]) -> bool {
    keys.iter().all(|k| map.contains_key(*k))
}

/// Read `key` as a number that the caller already checked is present.
fn present_number(map: &Map<String, Value>, key: &str) -> Result<f64, ApiError> {
    number(map, key)?.ok_or_else(|| ApiError::validation(format!("Missing \"{key}\".")))
}

fn dispatch(state: &AppState, command: &Command) -> Result<(), ApiError> {
    if state.broadcaster.broadcast(command)? {
        Ok(())
    } else {
        Err(ApiError::NoSimulator)
    }
}

fn sent(state: &AppState, command: Command, status: &str) -> ApiResult {
    dispatch(state, &command)?;
    Ok(Json(json!({ "status": status, "command": command.to_value()? })))
}

// ---------------------------------------------------------------------------
// Movement
// ---------------------------------------------------------------------------

/// `POST /move {x, z}`
pub async fn move_to(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let data = parse_body(&body);
    if !has_all(&data, &["x", "z"]) {
        return Err(ApiError::validation(
            "Missing parameters. Please provide \"x\" and \"z\".",
        ));
    }
    let command = Command::move_to(present_number(&data, "x")?, present_number(&data, "z")?);
    sent(&state, command, "move command sent")
}

/// `POST /move_rel {turn, distance}`
pub async fn move_relative(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let data = parse_body(&body);
    if !has_all(&data, &["turn", "distance"]) {
        return Err(ApiError::validation(
            "Missing parameters. Please provide \"turn\" and \"distance\".",
        ));
    }
    let command = Command::move_relative(
        present_number(&data, "turn")?,
        present_number(&data, "distance")?,
    );
    sent(&state, command, "move relative command sent")
}

/// `POST /stop`
pub async fn stop(State(state): State<AppState>) -> ApiResult {
    sent(&state, Command::Stop, "stop command sent")
}

/// `POST /capture`
pub async fn capture(State(state): State<AppState>) -> ApiResult {
    sent(&state, Command::CaptureRequest, "capture command sent")
}

// ---------------------------------------------------------------------------
// Scene setup
// ---------------------------------------------------------------------------

/// `POST /goal {corner}` or `{x, z[, y]}`.  A corner wins over coordinates.
pub async fn set_goal(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let data = parse_body(&body);

    let position = if let Some(corner) = data.get("corner") {
        let name = match corner {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        corner_to_position(&name, DEFAULT_CORNER_MARGIN)
    } else if has_all(&data, &["x", "z"]) {
        Position::goal(
            present_number(&data, "x")?,
            present_number(&data, "z")?,
            number(&data, "y")?,
        )
    } else {
        return Err(ApiError::validation(
            "Provide {\"corner\":\"NE|NW|SE|SW\"} OR {\"x\":..,\"z\":..}",
        ));
    };

    dispatch(&state, &Command::SetGoal { position })?;
    Ok(Json(json!({ "status": "goal set", "goal": position })))
}

/// `POST /obstacles/positions {positions: [{x, z[, y]}, ...]}`
pub async fn set_obstacle_positions(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let data = parse_body(&body);
    let entries = match data.get("positions") {
        Some(Value::Array(list)) if !list.is_empty() => list,
        _ => {
            return Err(ApiError::validation(
                "Provide \"positions\" as a non-empty list.",
            ));
        }
    };

    let mut positions = Vec::with_capacity(entries.len());
    for entry in entries {
        let Some(p) = entry.as_object().filter(|p| has_all(p, &["x", "z"])) else {
            return Err(ApiError::validation("Each position needs \"x\" and \"z\"."));
        };
        positions.push(Position::obstacle(
            present_number(p, "x")?,
            present_number(p, "z")?,
            number(p, "y")?,
        ));
    }

    let count = positions.len();
    dispatch(&state, &Command::SetObstaclePositions { positions })?;
    Ok(Json(json!({ "status": "obstacles updated", "count": count })))
}

/// `POST /obstacles/motion {enabled[, speed, velocities, bounds, bounce]}`
pub async fn set_obstacle_motion(State(state): State<AppState>, body: Bytes) -> ApiResult {
    let data = parse_body(&body);
    let Some(enabled) = data.get("enabled") else {
        return Err(ApiError::validation("Missing \"enabled\" boolean."));
    };

    let mut motion = ObstacleMotion::new(is_truthy(enabled));
    if let Some(speed) = number(&data, "speed")? {
        motion = motion.with_speed(speed);
    }
    if let Some(bounce) = data.get("bounce") {
        motion = motion.with_bounce(is_truthy(bounce));
    }
    match data.get("bounds") {
        None | Some(Value::Null) => {}
        Some(raw) => {
            let bounds: ObstacleBounds = serde_json::from_value(raw.clone()).map_err(|_| {
                ApiError::validation("\"bounds\" needs numeric minX, maxX, minZ and maxZ.")
            })?;
            motion = motion.with_bounds(bounds);
        }
    }
    motion = motion.with_velocities(data.get("velocities").filter(|v| !v.is_null()).cloned());

    let command = Command::SetObstacleMotion(motion);
    dispatch(&state, &command)?;
    Ok(Json(json!({ "status": "obstacle motion updated", "config": command.to_value()? })))
}

// ---------------------------------------------------------------------------
// Telemetry
// ---------------------------------------------------------------------------

/// `GET /collisions`
pub async fn collisions(State(state): State<AppState>) -> Json<Value> {
    Json(json!({ "count": state.store.collision_count() }))
}

/// `POST /reset` – zero the counter, then tell any simulator to reset.
///
/// Succeeds whether or not a simulator is connected.
pub async fn reset(State(state): State<AppState>) -> ApiResult {
    state.store.reset_collisions();
    let status = if state.broadcaster.broadcast(&Command::Reset)? {
        "reset broadcast"
    } else {
        "reset done (no simulators connected)"
    };
    Ok(Json(json!({
        "status": status,
        "collisions": state.store.collision_count(),
    })))
}

#[derive(Debug, Deserialize)]
pub struct CaptureQuery {
    meta: Option<String>,
}

/// `GET /latest_capture[?meta=1]`
pub async fn latest_capture(
    State(state): State<AppState>,
    Query(query): Query<CaptureQuery>,
) -> Json<Value> {
    let Some(capture) = state.store.latest_capture() else {
        return Json(json!({ "available": false }));
    };
    let mut body = if query.meta.as_deref() == Some("1") {
        capture.metadata()
    } else {
        capture.to_map()
    };
    body.insert("available".to_string(), Value::Bool(true));
    Json(Value::Object(body))
}

/// `GET /latest_event`
pub async fn latest_event(State(state): State<AppState>) -> Json<Value> {
    let Some(event) = state.store.latest_event() else {
        return Json(json!({ "available": false }));
    };
    let mut body = event.to_map();
    body.insert("available".to_string(), Value::Bool(true));
    Json(Value::Object(body))
}
