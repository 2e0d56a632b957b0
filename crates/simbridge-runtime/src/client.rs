//! Blocking HTTP client for the bridge's control API.
//!
//! [`BridgeApi`] is the narrow surface the navigation loop needs; the real
//! implementation is [`BridgeClient`], tests substitute an in-memory fake.

use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use serde_json::{Value, json};
use simbridge_types::{Capture, ObstacleMotion};
use thiserror::Error;
use tracing::debug;

/// Default request timeout, matching the bridge CLI config.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum ClientError {
    /// The bridge could not be reached or did not answer in time.
    #[error("bridge unreachable: {0}")]
    Transport(#[from] reqwest::Error),
    /// The bridge is up but has no simulator to forward to.
    #[error("no simulator: {0}")]
    NoSimulator(String),
    #[error("bridge rejected request ({status}): {message}")]
    Rejected { status: u16, message: String },
    #[error("unexpected response: {0}")]
    BadResponse(String),
}

/// Operations the navigation loop performs against the bridge.
pub trait BridgeApi {
    /// `POST /move_rel`
    fn move_relative(&self, turn: f64, distance: f64) -> Result<(), ClientError>;
    /// `POST /capture`
    fn request_capture(&self) -> Result<(), ClientError>;
    /// `GET /latest_capture`.  `Ok(None)` when nothing has been captured yet.
    fn latest_capture(&self) -> Result<Option<Capture>, ClientError>;
    /// `POST /obstacles/motion`
    fn set_obstacle_motion(&self, motion: &ObstacleMotion) -> Result<(), ClientError>;
}

/// A status code and JSON body, as returned by [`BridgeClient::exchange`].
#[derive(Debug, Clone, PartialEq)]
pub struct Reply {
    pub status: u16,
    pub body: Value,
}

impl Reply {
    fn error_message(&self) -> String {
        self.body
            .get("error")
            .and_then(Value::as_str)
            .map(str::to_string)
            .unwrap_or_else(|| self.body.to_string())
    }

    /// Turn a non-2xx reply into the matching [`ClientError`].
    pub fn into_result(self) -> Result<Value, ClientError> {
        match self.status {
            200..=299 => Ok(self.body),
            409 => Err(ClientError::NoSimulator(self.error_message())),
            status => Err(ClientError::Rejected {
                status,
                message: self.error_message(),
            }),
        }
    }
}

pub struct BridgeClient {
    base_url: String,
    http: Client,
}

impl BridgeClient {
    /// # Errors
    ///
    /// Returns [`ClientError::Transport`] if the HTTP client cannot be built.
    pub fn new(base_url: impl Into<String>, timeout: Duration) -> Result<Self, ClientError> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send one request and return whatever the bridge answered, without
    /// interpreting the status code.
    pub fn exchange(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Reply, ClientError> {
        let url = format!("{}{path}", self.base_url);
        debug!(%method, %url, "bridge request");
        let mut request = self.http.request(method, &url);
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send()?;
        let status = response.status().as_u16();
        let text = response.text()?;
        let body = serde_json::from_str(&text)
            .map_err(|e| ClientError::BadResponse(format!("{path}: {e}")))?;
        Ok(Reply { status, body })
    }

    fn post(&self, path: &str, body: &Value) -> Result<Value, ClientError> {
        self.exchange(Method::POST, path, Some(body))?.into_result()
    }

    fn get(&self, path: &str) -> Result<Value, ClientError> {
        self.exchange(Method::GET, path, None)?.into_result()
    }
}

impl BridgeApi for BridgeClient {
    fn move_relative(&self, turn: f64, distance: f64) -> Result<(), ClientError> {
        self.post("/move_rel", &json!({ "turn": turn, "distance": distance }))
            .map(drop)
    }

    fn request_capture(&self) -> Result<(), ClientError> {
        self.post("/capture", &json!({})).map(drop)
    }

    fn latest_capture(&self) -> Result<Option<Capture>, ClientError> {
        let body = self.get("/latest_capture")?;
        if !body.get("available").and_then(Value::as_bool).unwrap_or(false) {
            return Ok(None);
        }
        serde_json::from_value(body)
            .map(Some)
            .map_err(|e| ClientError::BadResponse(format!("/latest_capture: {e}")))
    }

    fn set_obstacle_motion(&self, motion: &ObstacleMotion) -> Result<(), ClientError> {
        let body = serde_json::to_value(motion)
            .map_err(|e| ClientError::BadResponse(e.to_string()))?;
        self.post("/obstacles/motion", &body).map(drop)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn conflict_maps_to_no_simulator() {
        let reply = Reply {
            status: 409,
            body: json!({"error": "No connected simulators."}),
        };
        match reply.into_result() {
            Err(ClientError::NoSimulator(msg)) => assert_eq!(msg, "No connected simulators."),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn other_failures_are_rejections() {
        let reply = Reply {
            status: 400,
            body: json!({"error": "Missing parameters."}),
        };
        assert!(matches!(
            reply.into_result(),
            Err(ClientError::Rejected { status: 400, ref message }) if message == "Missing parameters."
        ));

        let reply = Reply {
            status: 500,
            body: json!("boom"),
        };
        assert!(matches!(
            reply.into_result(),
            Err(ClientError::Rejected { status: 500, ref message }) if message == "\"boom\""
        ));
    }

    #[test]
    fn success_passes_body_through() {
        let reply = Reply {
            status: 200,
            body: json!({"status": "ok"}),
        };
        assert_eq!(reply.into_result().unwrap(), json!({"status": "ok"}));
    }

    #[test]
    fn base_url_trailing_slash_is_dropped() {
        let client = BridgeClient::new("http://localhost:5000/", DEFAULT_TIMEOUT).unwrap();
        assert_eq!(client.base_url(), "http://localhost:5000");
    }
}
