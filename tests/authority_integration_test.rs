//! 授权服务 HTTP 接口集成测试

#[cfg(all(test, feature = "authority"))]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use axum::{
        body::{to_bytes, Body},
        http::{header, Method, Request, StatusCode},
        Router,
    };
    use maestro::authority::{create_router, AuthorityState};
    use maestro::core::ManualClock;
    use maestro::provider::{MockMediaProvider, PlayerQuery};
    use maestro::state::{ControlStore, Module, StateFile, Token};
    use serde_json::{json, Value};
    use tower::ServiceExt;

    struct Harness {
        app: Router,
        store: Arc<ControlStore>,
        provider: Arc<MockMediaProvider>,
        clock: ManualClock,
    }

    fn harness() -> Harness {
        harness_with(None)
    }

    fn harness_with(state_file: Option<StateFile>) -> Harness {
        let clock = ManualClock::new();
        let store = Arc::new(ControlStore::new(Arc::new(clock.clone()), Duration::from_millis(1000)));
        let provider = Arc::new(MockMediaProvider::new());
        let mut state = AuthorityState::new(store.clone(), provider.clone());
        if let Some(file) = state_file {
            state = state.with_state_file(file);
        }
        Harness {
            app: create_router(Arc::new(state)),
            store,
            provider,
            clock,
        }
    }

    async fn send(app: &Router, method: Method, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
        let body = match body {
            Some(v) => Body::from(v.to_string()),
            None => Body::empty(),
        };
        let request = Request::builder()
            .method(method)
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(body)
            .unwrap();
        let response = app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let value = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()))
        };
        (status, value)
    }

    #[tokio::test]
    async fn test_initial_status_is_all_off() {
        let h = harness();
        let (status, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "voice_active": false,
                "hand_active": false,
                "voice_ready": false,
                "hand_ready": false,
                "system_active": false,
                "logged_in": false
            })
        );
    }

    #[tokio::test]
    async fn test_health() {
        let h = harness();
        let (status, body) = send(&h.app, Method::GET, "/health", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::String("OK".to_string()));
    }

    #[tokio::test]
    async fn test_toggle_updates_switches() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/toggle",
            Some(json!({"module": "hand", "active": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success", "voice_active": false, "hand_active": true}));

        let (_, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(body["hand_active"], json!(true));
        assert_eq!(body["system_active"], json!(true));
        assert!(h.store.is_active(Module::Hand));
    }

    #[tokio::test]
    async fn test_bad_toggle_sets_error_until_next_good_toggle() {
        let h = harness();
        let (status, _) = send(&h.app, Method::POST, "/api/toggle", Some(json!({"module": "voice"}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (_, err) = send(&h.app, Method::GET, "/api/error", None).await;
        assert_eq!(err["code"], json!(400));
        assert!(err["dev_info"].as_str().unwrap().contains("active"));

        let (status, _) = send(
            &h.app,
            Method::POST,
            "/api/toggle",
            Some(json!({"module": "camera", "active": true})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(!h.store.system_active());

        send(&h.app, Method::POST, "/api/toggle", Some(json!({"module": "voice", "active": true}))).await;
        let (_, err) = send(&h.app, Method::GET, "/api/error", None).await;
        assert_eq!(err, json!({"code": null, "message": null, "dev_info": null}));
    }

    #[tokio::test]
    async fn test_heartbeat_sets_ready() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            Method::POST,
            "/api/engine/status",
            Some(json!({"module": "voice", "ready": true})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok", "module": "voice", "ready": true}));

        let (_, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(body["voice_ready"], json!(true));
        assert_eq!(body["hand_ready"], json!(false));

        send(&h.app, Method::POST, "/api/engine/status", Some(json!({"module": "voice", "ready": false}))).await;
        let (_, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(body["voice_ready"], json!(false));
    }

    // 心跳截止：崩溃的引擎不告别也会在 2 × poll_interval 后显示为未就绪
    #[tokio::test]
    async fn test_stale_engine_reported_not_ready_hardening() {
        let h = harness();
        send(&h.app, Method::POST, "/api/engine/status", Some(json!({"module": "hand", "ready": true}))).await;

        h.clock.advance_ms(1900);
        let (_, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(body["hand_ready"], json!(true));

        h.clock.advance_ms(200);
        let (_, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(body["hand_ready"], json!(false));
    }

    #[tokio::test]
    async fn test_bad_heartbeat_is_rejected_without_error_record() {
        let h = harness();
        let (status, _) = send(&h.app, Method::POST, "/api/engine/status", Some(json!({"ready": true}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        let (status, _) = send(
            &h.app,
            Method::POST,
            "/api/engine/status",
            Some(json!({"module": "feet", "ready": true})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(h.store.error().is_none());
    }

    #[tokio::test]
    async fn test_token_lifecycle() {
        let h = harness();
        let (status, body) = send(&h.app, Method::GET, "/internal/token", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["error"], json!("No user logged in"));

        let (status, _) = send(
            &h.app,
            Method::POST,
            "/internal/token",
            Some(json!({"token": "abc", "expires_in": 3600})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, body) = send(&h.app, Method::GET, "/internal/token", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["token"], json!("abc"));
        assert!(body["expires_at"].is_string());

        let (_, body) = send(&h.app, Method::GET, "/api/status", None).await;
        assert_eq!(body["logged_in"], json!(true));

        let (status, _) = send(&h.app, Method::DELETE, "/internal/token", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (status, _) = send(&h.app, Method::GET, "/internal/token", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_empty_token_is_rejected() {
        let h = harness();
        let (status, _) = send(&h.app, Method::POST, "/internal/token", Some(json!({"token": ""}))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(h.store.get_credential().is_none());
        assert_eq!(h.store.error().map(|e| e.code), Some(400));
    }

    #[tokio::test]
    async fn test_internal_status_reasons() {
        let h = harness();
        let (status, body) = send(&h.app, Method::GET, "/internal/status?module=hand", None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body, json!({"active": false, "reason": "no_token"}));

        h.store.set_credential(Token::new("abc"));
        let (status, body) = send(&h.app, Method::GET, "/internal/status?module=hand", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"active": false, "reason": "paused_by_user"}));

        h.store.update_active(Module::Hand, true);
        let (_, body) = send(&h.app, Method::GET, "/internal/status?module=hand", None).await;
        assert_eq!(body, json!({"active": true, "token": "abc"}));

        let (_, body) = send(&h.app, Method::GET, "/internal/status?module=voice", None).await;
        assert_eq!(body["active"], json!(false));
        let (_, body) = send(&h.app, Method::GET, "/internal/status", None).await;
        assert_eq!(body["active"], json!(true));

        let (status, _) = send(&h.app, Method::GET, "/internal/status?module=nose", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_player_relay_requires_login() {
        let h = harness();
        let (status, body) = send(&h.app, Method::POST, "/api/player/next", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("Failed to skip to next track: User not logged in."));
        assert!(h.provider.calls().is_empty());

        let (_, err) = send(&h.app, Method::GET, "/api/error", None).await;
        assert_eq!(err["code"], json!(401));
    }

    #[tokio::test]
    async fn test_player_relay_reports_and_clears_provider_errors() {
        let h = harness();
        h.store.set_credential(Token::new("abc"));
        h.provider.push_response(403, "{\"error\":\"premium required\"}");

        let (status, body) = send(&h.app, Method::POST, "/api/player/pause", None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"], json!("Provider API error"));

        let (_, err) = send(&h.app, Method::GET, "/api/error", None).await;
        assert_eq!(err["code"], json!(403));
        assert_eq!(err["message"], json!("Provider error: failed to pause playback"));

        let (status, body) = send(&h.app, Method::POST, "/api/player/play", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "success", "action": "resume playback"}));
        assert!(h.store.error().is_none());

        assert_eq!(h.provider.calls().len(), 2);
        assert_eq!(h.provider.calls()[1].1, "abc");
    }

    #[tokio::test]
    async fn test_player_relay_unknown_command() {
        let h = harness();
        let (status, _) = send(&h.app, Method::POST, "/api/player/shuffle", None).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_engine_error_report_and_clear() {
        let h = harness();
        let (status, _) = send(
            &h.app,
            Method::POST,
            "/api/engine/error",
            Some(json!({"code": 502, "message": "Provider error: failed to pause playback", "dev_info": "Status: 502"})),
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        let (_, err) = send(&h.app, Method::GET, "/api/error", None).await;
        assert_eq!(err["code"], json!(502));

        let (status, _) = send(&h.app, Method::DELETE, "/api/engine/error", None).await;
        assert_eq!(status, StatusCode::NO_CONTENT);
        assert!(h.store.error().is_none());
    }

    #[tokio::test]
    async fn test_toggle_is_persisted_to_state_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = StateFile::new(dir.path().join("system_status.json"));
        let h = harness_with(Some(file.clone()));

        send(&h.app, Method::POST, "/api/toggle", Some(json!({"module": "voice", "active": true}))).await;

        let persisted = file.load().unwrap().unwrap();
        assert!(persisted.voice_active);
        assert!(!persisted.hand_active);
    }

    #[tokio::test]
    async fn test_out_of_range_expiry_is_rejected() {
        let h = harness();
        let (status, body) = send(
            &h.app,
            Method::POST,
            "/internal/token",
            Some(json!({"token": "abc", "expires_in": i64::MAX})),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert!(body["details"].as_str().unwrap().contains("expires_in"));
        assert!(h.store.get_credential().is_none());
        assert_eq!(h.store.error().map(|e| e.code), Some(400));
    }

    #[tokio::test]
    async fn test_player_queries_require_login() {
        let h = harness();
        let (status, body) = send(&h.app, Method::GET, "/api/player/state", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], json!("Failed to fetch state: User not logged in."));

        let (status, _) = send(&h.app, Method::GET, "/api/player/devices", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        let (_, err) = send(&h.app, Method::GET, "/api/error", None).await;
        assert_eq!(err["code"], json!(401));
        assert_eq!(err["message"], json!("Failed to fetch devices: User not logged in."));
        assert!(h.provider.queries().is_empty());
    }

    #[tokio::test]
    async fn test_player_state_is_trimmed() {
        let h = harness();
        h.store.set_credential(Token::new("abc"));
        let raw = json!({
            "is_playing": true,
            "progress_ms": 42000,
            "repeat_state": "off",
            "item": {
                "name": "Clair de Lune",
                "duration_ms": 300000,
                "explicit": false,
                "artists": [{"name": "Debussy", "uri": "artist:1"}],
                "album": {"name": "Suite", "images": [{"url": "http://img/640", "width": 640, "height": 640}]}
            },
            "device": {"id": "dev-1", "name": "Living Room", "volume_percent": 30}
        });
        h.provider.push_response(200, &raw.to_string());

        let (status, body) = send(&h.app, Method::GET, "/api/player/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            body,
            json!({
                "is_playing": true,
                "progress_ms": 42000,
                "item": {
                    "name": "Clair de Lune",
                    "duration_ms": 300000,
                    "artists": [{"name": "Debussy"}],
                    "album": {"images": [{"url": "http://img/640", "width": 640, "height": 640}]}
                },
                "device": {"name": "Living Room", "volume_percent": 30}
            })
        );
        assert_eq!(h.provider.queries(), vec![PlayerQuery::State]);
        assert!(h.provider.calls().is_empty());
    }

    #[tokio::test]
    async fn test_player_state_null_when_nothing_plays() {
        let h = harness();
        h.store.set_credential(Token::new("abc"));

        h.provider.push_response(204, "");
        let (status, body) = send(&h.app, Method::GET, "/api/player/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);

        h.provider.push_response(200, r#"{"is_playing": true, "item": null, "device": {"name": "Phone"}}"#);
        let (status, body) = send(&h.app, Method::GET, "/api/player/state", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, Value::Null);
    }

    #[tokio::test]
    async fn test_player_devices_passthrough_and_errors() {
        let h = harness();
        h.store.set_credential(Token::new("abc"));

        h.provider.push_response(200, r#"{"devices": [{"id": "d1", "name": "Kitchen", "is_active": true}]}"#);
        let (status, body) = send(&h.app, Method::GET, "/api/player/devices", None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([{"id": "d1", "name": "Kitchen", "is_active": true}]));

        h.provider.push_response(401, "token expired");
        let (status, body) = send(&h.app, Method::GET, "/api/player/devices", None).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["details"], json!("token expired"));

        h.provider.push_transport_error("connection reset");
        let (status, _) = send(&h.app, Method::GET, "/api/player/state", None).await;
        assert_eq!(status, StatusCode::BAD_GATEWAY);
    }
}
