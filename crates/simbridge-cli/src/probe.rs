//! `simbridge probe` – four-request smoke test against a running bridge.

use std::time::Duration;

use colored::Colorize;
use reqwest::Method;
use serde_json::{Value, json};
use simbridge_runtime::{BridgeClient, ClientError, Reply};

pub(crate) fn steps() -> Vec<(&'static str, Method, &'static str, Option<Value>)> {
    vec![
        ("move", Method::POST, "/move", Some(json!({"x": 5, "z": 0}))),
        ("goal", Method::POST, "/goal", Some(json!({"corner": "NE"}))),
        ("capture", Method::POST, "/capture", Some(json!({}))),
        ("latest_capture meta", Method::GET, "/latest_capture?meta=1", None),
    ]
}

fn print_reply(label: &str, result: &Result<Reply, ClientError>) {
    match result {
        Ok(reply) => {
            let status = if (200..300).contains(&reply.status) {
                reply.status.to_string().green()
            } else {
                reply.status.to_string().yellow()
            };
            println!("  {label} -> {status} {}", reply.body);
        }
        Err(e) => println!("  {label} -> {}", e.to_string().red()),
    }
}

/// Returns the number of requests that got a 2xx answer.
pub fn run(bridge_url: &str, timeout: Duration) -> Result<usize, String> {
    let client = BridgeClient::new(bridge_url, timeout).map_err(|e| e.to_string())?;
    println!("  Probing {}\n", client.base_url().bold());

    let mut ok = 0;
    for (label, method, path, body) in steps() {
        let result = client.exchange(method, path, body.as_ref());
        if matches!(&result, Ok(r) if (200..300).contains(&r.status)) {
            ok += 1;
        }
        print_reply(label, &result);
    }
    Ok(ok)
}
