//! Full relay over real sockets: reqwest plays the HTTP caller and a
//! tokio-tungstenite client plays the simulator.

use std::net::SocketAddr;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use reqwest::StatusCode;
use serde_json::{Value, json};
use simbridge_control::ControlServer;
use simbridge_middleware::{Relay, SimulatorServer};
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};

type Sim = WebSocketStream<MaybeTlsStream<TcpStream>>;

struct Harness {
    relay: Relay,
    http: String,
    ws: String,
    client: reqwest::Client,
}

impl Harness {
    async fn start() -> Self {
        let relay = Relay::new();
        let local = SocketAddr::from(([127, 0, 0, 1], 0));

        let sim_server = SimulatorServer::bind(local, relay.clone()).await.unwrap();
        let ws = format!("ws://{}", sim_server.local_addr().unwrap());
        tokio::spawn(sim_server.run());

        let control = ControlServer::bind(local, &relay).await.unwrap();
        let http = format!("http://{}", control.local_addr().unwrap());
        tokio::spawn(control.run());

        Self {
            relay,
            http,
            ws,
            client: reqwest::Client::new(),
        }
    }

    async fn connect_simulator(&self) -> Sim {
        let before = self.relay.registry().len();
        let (sim, _) = connect_async(&self.ws).await.unwrap();
        self.wait_for(|| self.relay.registry().len() > before).await;
        sim
    }

    async fn wait_for<F: Fn() -> bool>(&self, cond: F) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !cond() {
                tokio::time::sleep(Duration::from_millis(10)).await;
            }
        })
        .await
        .expect("condition not reached in time");
    }

    async fn post(&self, path: &str, body: Value) -> (StatusCode, Value) {
        let resp = self
            .client
            .post(format!("{}{path}", self.http))
            .json(&body)
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }

    async fn get(&self, path: &str) -> (StatusCode, Value) {
        let resp = self
            .client
            .get(format!("{}{path}", self.http))
            .send()
            .await
            .unwrap();
        let status = resp.status();
        (status, resp.json().await.unwrap())
    }
}

async fn next_command(sim: &mut Sim) -> Value {
    let frame = tokio::time::timeout(Duration::from_secs(5), sim.next())
        .await
        .expect("no frame from bridge")
        .unwrap()
        .unwrap();
    match frame {
        Message::Text(text) => serde_json::from_str(text.as_str()).unwrap(),
        other => panic!("unexpected frame {other:?}"),
    }
}

async fn send_telemetry(sim: &mut Sim, body: Value) {
    sim.send(Message::Text(body.to_string().into())).await.unwrap();
}

#[tokio::test]
async fn move_collide_reset_scenario() {
    let h = Harness::start().await;
    let mut sim = h.connect_simulator().await;

    let (status, body) = h.post("/move_rel", json!({"turn": 0, "distance": 10})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["command"]["command"], "move_relative");

    let cmd = next_command(&mut sim).await;
    assert_eq!(cmd["command"], "move_relative");
    assert_eq!(cmd["turn"].as_f64(), Some(0.0));
    assert_eq!(cmd["distance"].as_f64(), Some(10.0));
    assert_eq!(cmd.as_object().unwrap().len(), 3);

    send_telemetry(&mut sim, json!({"type": "collision", "collision": true})).await;
    h.wait_for(|| h.relay.store().collision_count() == 1).await;
    assert_eq!(h.get("/collisions").await.1, json!({"count": 1}));

    let (status, body) = h.post("/reset", json!({})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["collisions"], 0);
    assert_eq!(next_command(&mut sim).await, json!({"command": "reset"}));
    assert_eq!(h.get("/collisions").await.1, json!({"count": 0}));
}

#[tokio::test]
async fn broadcasts_without_simulator_are_distinct_client_errors() {
    let h = Harness::start().await;

    let (no_target, body) = h.post("/move_rel", json!({"turn": 0, "distance": 10})).await;
    assert!(no_target.is_client_error());
    assert_eq!(body["error"], "No connected simulators.");

    let (invalid, body) = h.post("/move_rel", json!({"turn": 0})).await;
    assert!(invalid.is_client_error());
    assert_ne!(invalid, no_target);
    assert!(body["error"].as_str().unwrap().contains("distance"));

    for path in ["/stop", "/capture"] {
        let (status, body) = h.post(path, json!({})).await;
        assert_eq!(status, no_target, "{path}");
        assert!(body["error"].is_string());
    }
}

#[tokio::test]
async fn capture_without_simulator_leaves_latest_capture_untouched() {
    let h = Harness::start().await;
    h.post("/capture", json!({})).await;
    h.post("/capture", json!({})).await;
    assert_eq!(h.get("/latest_capture").await.1, json!({"available": false}));
    assert_eq!(h.relay.store().collision_count(), 0);
}

#[tokio::test]
async fn validation_errors_name_missing_fields() {
    let h = Harness::start().await;
    let _sim = h.connect_simulator().await;

    let cases = [
        ("/move", json!({"x": 1})),
        ("/move", json!({"x": "left", "z": 1})),
        ("/goal", json!({"y": 3})),
        ("/obstacles/positions", json!({"positions": []})),
        ("/obstacles/positions", json!({"positions": [{"x": 1}]})),
        ("/obstacles/motion", json!({"speed": 1})),
        ("/obstacles/motion", json!({"enabled": true, "bounds": {"minX": "a"}})),
    ];
    for (path, body) in cases {
        let (status, resp) = h.post(path, body.clone()).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "{path} {body}");
        assert!(resp["error"].is_string(), "{path} {body}");
    }
}

#[tokio::test]
async fn corner_goal_matches_explicit_coordinates() {
    let h = Harness::start().await;
    let mut sim = h.connect_simulator().await;

    let (_, by_corner) = h.post("/goal", json!({"corner": "NE"})).await;
    let corner_cmd = next_command(&mut sim).await;
    let (_, by_coords) = h.post("/goal", json!({"x": 45, "z": -45})).await;
    let coords_cmd = next_command(&mut sim).await;

    assert_eq!(by_corner["goal"], by_coords["goal"]);
    assert_eq!(corner_cmd, coords_cmd);
    assert_eq!(corner_cmd["command"], "set_goal");
    assert_eq!(corner_cmd["position"]["x"].as_f64(), Some(45.0));
    assert_eq!(corner_cmd["position"]["z"].as_f64(), Some(-45.0));
}

#[tokio::test]
async fn obstacle_commands_fill_defaults() {
    let h = Harness::start().await;
    let mut sim = h.connect_simulator().await;

    let (status, body) = h
        .post("/obstacles/positions", json!({"positions": [{"x": 1, "z": 2}, {"x": 3, "y": 4, "z": 5}]}))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["count"], 2);
    let cmd = next_command(&mut sim).await;
    assert_eq!(cmd["command"], "set_obstacles");
    assert_eq!(cmd["positions"][0]["y"].as_f64(), Some(2.0));
    assert_eq!(cmd["positions"][1]["y"].as_f64(), Some(4.0));

    h.post("/obstacles/motion", json!({"enabled": true})).await;
    let cmd = next_command(&mut sim).await;
    assert_eq!(cmd["command"], "set_obstacle_motion");
    assert_eq!(cmd["speed"].as_f64(), Some(0.05));
    assert!(cmd["velocities"].is_null());
    assert_eq!(cmd["bounds"]["minX"].as_f64(), Some(-45.0));
    assert_eq!(cmd["bounce"], true);
}

#[tokio::test]
async fn latest_capture_meta_omits_image_and_latest_wins() {
    let h = Harness::start().await;
    let mut sim = h.connect_simulator().await;

    for ts in ["T1", "T2"] {
        send_telemetry(
            &mut sim,
            json!({
                "type": "capture_image_response",
                "timestamp": ts,
                "image": format!("data:image/png;base64,{ts}"),
                "position": {"x": 1.0, "y": 0.0, "z": 2.0}
            }),
        )
        .await;
    }
    h.wait_for(|| {
        h.relay
            .store()
            .latest_capture()
            .is_some_and(|c| c.timestamp == json!("T2"))
    })
    .await;

    let (_, full) = h.get("/latest_capture").await;
    assert_eq!(full["available"], true);
    assert_eq!(full["timestamp"], "T2");
    assert_eq!(full["image"], "data:image/png;base64,T2");

    let (_, meta) = h.get("/latest_capture?meta=1").await;
    assert_eq!(
        meta,
        json!({"available": true, "timestamp": "T2", "position": {"x": 1.0, "y": 0.0, "z": 2.0}})
    );

    let (_, event) = h.get("/latest_event").await;
    assert_eq!(event, json!({"available": true, "type": "capture_ack", "timestamp": "T2"}));
}

#[tokio::test]
async fn latest_event_tracks_goal_and_ignores_unknown_types() {
    let h = Harness::start().await;
    let mut sim = h.connect_simulator().await;
    assert_eq!(h.get("/latest_event").await.1, json!({"available": false}));

    send_telemetry(&mut sim, json!({"type": "goal_reached", "goal": "NE"})).await;
    send_telemetry(&mut sim, json!({"type": "odometry", "x": 3})).await;
    send_telemetry(&mut sim, json!({"type": "confirmation", "of": "set_goal"})).await;
    h.wait_for(|| h.relay.store().latest_event().is_some_and(|e| e.kind() == "confirmation"))
        .await;

    let (_, event) = h.get("/latest_event").await;
    assert_eq!(event["type"], "confirmation");
    assert_eq!(event["of"], "set_goal");
    assert_eq!(event["available"], true);
}

#[tokio::test]
async fn reset_is_idempotent_and_works_without_simulator() {
    let h = Harness::start().await;
    for _ in 0..2 {
        let (status, body) = h.post("/reset", json!({})).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["collisions"], 0);
        assert_eq!(body["status"], "reset done (no simulators connected)");
    }
    assert_eq!(h.get("/collisions").await.1, json!({"count": 0}));
}

#[tokio::test]
async fn disconnected_simulator_stops_receiving() {
    let h = Harness::start().await;
    let sim = h.connect_simulator().await;
    drop(sim);
    h.wait_for(|| h.relay.registry().is_empty()).await;

    let (status, body) = h.post("/stop", json!({})).await;
    assert!(status.is_client_error());
    assert_eq!(body["error"], "No connected simulators.");
}

#[tokio::test]
async fn any_origin_is_allowed() {
    let h = Harness::start().await;
    let resp = h
        .client
        .get(format!("{}/collisions", h.http))
        .header("Origin", "http://control.example")
        .send()
        .await
        .unwrap();
    assert_eq!(
        resp.headers()
            .get("access-control-allow-origin")
            .and_then(|v| v.to_str().ok()),
        Some("*")
    );
}
