//! Common test utilities for integration tests

use serde_json::{json, Map, Value};
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

/// Minimal HTTP server standing in for the ECB data API.
///
/// Every request path (including the query) is recorded in `requests`.
#[allow(dead_code)]
pub struct MockEcb {
    pub base_url: String,
    pub requests: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MockEcb {
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }
}

/// Starts a mock server; `respond` maps (request path, request index) to (status, body).
#[allow(dead_code)]
pub async fn spawn_mock_ecb<F>(respond: F) -> MockEcb
where
    F: Fn(&str, usize) -> (u16, String) + Send + Sync + 'static,
{
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let requests = Arc::new(Mutex::new(Vec::new()));
    let respond = Arc::new(respond);

    let recorded = requests.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let recorded = recorded.clone();
            let respond = respond.clone();
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => return,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }
                let head = String::from_utf8_lossy(&request).into_owned();
                let path = head
                    .lines()
                    .next()
                    .and_then(|line| line.split_whitespace().nth(1))
                    .unwrap_or_default()
                    .to_string();

                let index = {
                    let mut recorded = recorded.lock().unwrap();
                    recorded.push(path.clone());
                    recorded.len() - 1
                };
                let (status, body) = respond(&path, index);
                let response = format!(
                    "HTTP/1.1 {status} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    reason(status),
                    body.len()
                );
                let _ = socket.write_all(response.as_bytes()).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    MockEcb {
        base_url: format!("http://{addr}/service/data/EXR/"),
        requests,
    }
}

fn reason(status: u16) -> &'static str {
    match status {
        200 => "OK",
        404 => "Not Found",
        429 => "Too Many Requests",
        500 => "Internal Server Error",
        503 => "Service Unavailable",
        _ => "Unknown",
    }
}

/// Builds an SDMX-JSON message holding one series with the given observations.
#[allow(dead_code)]
pub fn sdmx_json(observations: &[(&str, f64)]) -> String {
    let values: Vec<Value> = observations
        .iter()
        .map(|(date, _)| json!({"id": date, "name": date}))
        .collect();
    let mut series_observations = Map::new();
    for (index, (_, rate)) in observations.iter().enumerate() {
        series_observations.insert(index.to_string(), json!([rate]));
    }

    json!({
        "header": {"id": "test", "test": false},
        "dataSets": [{
            "action": "Replace",
            "series": {"0:0:0:0:0": {"observations": series_observations}}
        }],
        "structure": {
            "dimensions": {
                "series": [],
                "observation": [{"id": "TIME_PERIOD", "values": values}]
            }
        }
    })
    .to_string()
}

/// Builds an SDMX-ML structure-specific message holding one series.
#[allow(dead_code)]
pub fn sdmx_xml(currency: &str, observations: &[(&str, f64)]) -> String {
    let obs: String = observations
        .iter()
        .map(|(date, rate)| format!("<Obs TIME_PERIOD=\"{date}\" OBS_VALUE=\"{rate}\"/>"))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?>
<message:StructureSpecificData xmlns:message="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message">
<message:DataSet><Series FREQ="D" CURRENCY="{currency}" CURRENCY_DENOM="EUR" EXR_TYPE="SP00" EXR_SUFFIX="A">{obs}</Series></message:DataSet>
</message:StructureSpecificData>"#
    )
}

/// Parses newline delimited Singer output.
#[allow(dead_code)]
pub fn parse_messages(output: &[u8]) -> Vec<Value> {
    String::from_utf8_lossy(output)
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| serde_json::from_str(line).unwrap())
        .collect()
}
