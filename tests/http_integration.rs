// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the HTTP transport using wiremock.

#![cfg(feature = "http")]

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use merosync::command::{SystemAllCommand, ToggleCommand};
use merosync::response::SystemAllResponse;
use merosync::transport::{CommandRequest, CommandTransport, HttpTransportConfig};
use merosync::types::ProtocolVariant;

fn transport_for(server: &MockServer) -> merosync::transport::HttpTransport {
    HttpTransportConfig::new(server.uri())
        .with_key("unit-test-key")
        .into_transport()
        .unwrap()
}

// ============================================================================
// Transport envelope
// ============================================================================

mod envelope {
    use super::*;

    #[tokio::test]
    async fn toggle_posts_signed_set_request() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/config"))
            .and(body_partial_json(json!({
                "header": {
                    "namespace": "Appliance.Control.ToggleX",
                    "method": "SET",
                    "payloadVersion": 1
                },
                "payload": {"togglex": {"channel": 0, "onoff": 1}}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "header": {"method": "SETACK"},
                "payload": {}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let transport = transport_for(&mock_server);
        let request =
            CommandRequest::from_command(&ToggleCommand::new(true, ProtocolVariant::Extended));

        transport.send(request).await.unwrap();
    }

    #[tokio::test]
    async fn system_all_round_trip_parses() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/config"))
            .and(body_partial_json(json!({
                "header": {"namespace": "Appliance.System.All", "method": "GET"}
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "header": {"method": "GETACK"},
                "payload": {"all": {
                    "digest": {"togglex": [{"channel": 0, "onoff": 1}]},
                    "system": {"firmware": {"innerIp": "192.168.1.42"}}
                }}
            })))
            .mount(&mock_server)
            .await;

        let transport = transport_for(&mock_server);
        let payload = transport
            .send(CommandRequest::from_command(&SystemAllCommand))
            .await
            .unwrap();

        let response: SystemAllResponse = serde_json::from_value(payload).unwrap();
        assert_eq!(response.detected_variant(), ProtocolVariant::Extended);
        assert_eq!(response.onoff(), Some(true));
        assert_eq!(response.inner_ip(), Some("192.168.1.42"));
    }
}

// ============================================================================
// Failure mapping
// ============================================================================

mod failures {
    use super::*;
    use merosync::error::ProtocolError;

    #[tokio::test]
    async fn device_error_reply_is_a_transport_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "header": {"method": "ERROR"},
                "payload": {"error": {"code": 5001, "detail": "sign error"}}
            })))
            .mount(&mock_server)
            .await;

        let transport = transport_for(&mock_server);
        let err = transport
            .send(CommandRequest::from_command(&SystemAllCommand))
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::Transport(message) if message.contains("5001")));
    }

    #[tokio::test]
    async fn http_failure_status_is_connection_failed() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/config"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&mock_server)
            .await;

        let transport = transport_for(&mock_server);
        let err = transport
            .send(CommandRequest::from_command(&SystemAllCommand))
            .await
            .unwrap_err();

        assert!(matches!(err, ProtocolError::ConnectionFailed(message) if message.contains("500")));
    }
}

// ============================================================================
// Full device over HTTP
// ============================================================================

mod device {
    use super::*;
    use merosync::config::{ConnectionProfile, DeviceConfig};
    use merosync::device::PlugDevice;

    #[tokio::test]
    async fn set_desired_state_over_http() {
        let mock_server = MockServer::start().await;

        Mock::given(method("POST"))
            .and(path("/config"))
            .and(body_partial_json(
                json!({"header": {"namespace": "Appliance.Control.ToggleX"}}),
            ))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "header": {"method": "SETACK"},
                "payload": {}
            })))
            .expect(1)
            .mount(&mock_server)
            .await;

        let device = PlugDevice::http(HttpTransportConfig::new(mock_server.uri()))
            .unwrap()
            .with_config(DeviceConfig::new(ConnectionProfile::Local))
            .build();

        device.set_desired_state(true).await.unwrap();
        assert!(device.state().commanded_on());
    }
}
