use std::time::Instant;

use async_trait::async_trait;
use chrono::Local;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use tracing::{debug, error, info, warn};

use super::{DeviceEndpoint, Delivery, Transport, TransportError};
use crate::controller::ControllerSnapshot;

/// Posts snapshots as JSON to the device's controller endpoint
pub struct HttpTransport {
    client: Client,
    endpoint: DeviceEndpoint,
    url: String,
}

impl HttpTransport {
    pub fn new(endpoint: DeviceEndpoint) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(endpoint.request_timeout)
            .user_agent(concat!("switch-remote/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TransportError::ClientError(e.to_string()))?;
        let url = endpoint.url();
        info!(
            "HTTP transport ready for {} (timeout {}ms)",
            url,
            endpoint.request_timeout.as_millis()
        );

        Ok(Self {
            client,
            endpoint,
            url,
        })
    }

    fn map_request_error(&self, e: reqwest::Error) -> TransportError {
        if e.is_timeout() {
            TransportError::Timeout(self.endpoint.request_timeout)
        } else {
            TransportError::ConnectionError(e.to_string())
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, snapshot: &ControllerSnapshot) -> Result<Delivery, TransportError> {
        let out_of_range = snapshot.out_of_range_sticks();
        let payload = if out_of_range.is_empty() {
            *snapshot
        } else {
            warn!(
                "Clamping out-of-range stick values {:?} before sending: {}",
                out_of_range, snapshot
            );
            snapshot.clamped()
        };

        let body = serde_json::to_string(&payload)?;
        debug!("POST {} {}", self.url, body);

        let sent_at = Local::now();
        let started = Instant::now();
        let response = self
            .client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                let err = self.map_request_error(e);
                error!("✗ Send failed: {}", err);
                err
            })?;

        let status = response.status();
        let round_trip = started.elapsed();

        if status.is_success() {
            info!(
                "✓ Sent at {} ({}ms): {}",
                sent_at.format("%H:%M:%S.%3f"),
                round_trip.as_millis(),
                payload
            );
            Ok(Delivery {
                status: status.as_u16(),
                sent_at,
                round_trip,
            })
        } else {
            let body = response.text().await.unwrap_or_default();
            error!("✗ Send failed: {} - {}", status, body);
            Err(TransportError::Status {
                status: status.as_u16(),
                body,
            })
        }
    }

    fn describe(&self) -> String {
        self.url.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::controller::{build, Button, MainButton, PartialCommand, Stick};
    use serde_json::json;
    use std::time::Duration;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn endpoint_for(server: &MockServer) -> DeviceEndpoint {
        let addr = server.address();
        DeviceEndpoint::new(addr.ip().to_string(), addr.port())
    }

    #[tokio::test]
    async fn posts_complete_snapshot_as_json() -> Result<(), TransportError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/controller"))
            .and(header("content-type", "application/json"))
            .and(body_json(json!({
                "buttons": {"A": true, "B": false, "X": false, "Y": false},
                "lstick": {"x": 0, "y": 0},
                "rstick": {"x": 0, "y": 0},
                "shoulder": {"L": false, "R": false, "ZL": false, "ZR": false},
                "system": {"plus": false, "minus": false, "home": false}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"status": "OK"})))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(endpoint_for(&server))?;
        let snapshot = build(&PartialCommand::new().with_button(Button::Main(MainButton::A), true));
        let delivery = transport.send(&snapshot).await?;

        assert_eq!(delivery.status, 200);
        Ok(())
    }

    #[tokio::test]
    async fn non_success_status_is_reported_with_body() -> Result<(), TransportError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/controller"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string(r#"{"error":"Invalid JSON"}"#),
            )
            .mount(&server)
            .await;

        let transport = HttpTransport::new(endpoint_for(&server))?;
        let result = transport.send(&ControllerSnapshot::rest()).await;

        match result {
            Err(TransportError::Status { status, body }) => {
                assert_eq!(status, 400);
                assert!(body.contains("Invalid JSON"));
            }
            other => panic!("expected status error, got {:?}", other),
        }
        Ok(())
    }

    #[tokio::test]
    async fn out_of_range_sticks_are_clamped_on_the_wire() -> Result<(), TransportError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(body_json(json!({
                "buttons": {"A": false, "B": false, "X": false, "Y": false},
                "lstick": {"x": 100, "y": -100},
                "rstick": {"x": 0, "y": 0},
                "shoulder": {"L": false, "R": false, "ZL": false, "ZR": false},
                "system": {"plus": false, "minus": false, "home": false}
            })))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&server)
            .await;

        let transport = HttpTransport::new(endpoint_for(&server))?;
        let snapshot = build(&PartialCommand::new().with_stick(Stick::Left, 500, -101));
        transport.send(&snapshot).await?;
        Ok(())
    }

    #[tokio::test]
    async fn slow_device_times_out() -> Result<(), TransportError> {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_delay(Duration::from_millis(500)))
            .mount(&server)
            .await;

        let endpoint = endpoint_for(&server).with_timeout(Duration::from_millis(50));
        let transport = HttpTransport::new(endpoint)?;
        let result = transport.send(&ControllerSnapshot::rest()).await;

        assert!(matches!(result, Err(TransportError::Timeout(_))));
        Ok(())
    }

    #[tokio::test]
    async fn unreachable_device_is_a_connection_error() -> Result<(), TransportError> {
        // Reserve a port, then free it so nothing is listening
        let port = {
            let listener = std::net::TcpListener::bind("127.0.0.1:0")
                .map_err(|e| TransportError::ClientError(e.to_string()))?;
            listener
                .local_addr()
                .map_err(|e| TransportError::ClientError(e.to_string()))?
                .port()
        };

        let transport = HttpTransport::new(DeviceEndpoint::new("127.0.0.1", port))?;
        let result = transport.send(&ControllerSnapshot::rest()).await;

        assert!(matches!(result, Err(TransportError::ConnectionError(_))));
        Ok(())
    }

    #[test]
    fn describe_names_the_endpoint_url() -> Result<(), TransportError> {
        let transport = HttpTransport::new(DeviceEndpoint::new("10.1.2.3", 80))?;
        assert_eq!(transport.describe(), "http://10.1.2.3/controller");
        Ok(())
    }
}
