//! Router tests through the full middleware stack

#[cfg(test)]
mod helpers {
    use axum::{
        Router,
        body::{Body, to_bytes},
        http::{Request, Response},
    };
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::{Ctx, build_router, config::AppConfig};

    pub fn router(config: AppConfig) -> Router {
        build_router(Ctx::new(config).unwrap())
    }

    pub fn fast_config() -> AppConfig {
        let mut config = AppConfig::default();
        config.poller.interval_ms = 1;
        config
    }

    pub async fn get(router: &Router, uri: &str) -> Response<Body> {
        router
            .clone()
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    pub async fn post_json(router: &Router, uri: &str, body: Value) -> Response<Body> {
        router
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri(uri)
                    .header("content-type", "application/json")
                    .body(Body::from(body.to_string()))
                    .unwrap(),
            )
            .await
            .unwrap()
    }

    pub async fn json(response: Response<Body>) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }
}

#[cfg(test)]
mod envelope_tests {
    use super::helpers::{get, json, router};
    use crate::config::{AppConfig, Environment};
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use tower::ServiceExt;

    #[tokio::test]
    async fn test_success_envelope() {
        let app = router(AppConfig::default());
        let response = get(&app, "/api/v1/info").await;

        assert_eq!(response.status(), StatusCode::OK);
        let header_id = response.headers()["x-request-id"]
            .to_str()
            .unwrap()
            .to_string();
        let body = json(response).await;

        assert_eq!(body["success"], true);
        assert_eq!(body["statusCode"], 200);
        assert_eq!(body["data"]["name"], "Sawit Gateway");
        assert_eq!(body["data"]["apiPrefix"], "/api/v1");
        assert_eq!(body["data"]["endpoints"][0]["path"], "/api/v1/health");
        assert_eq!(body["requestId"], header_id.as_str());
        assert!(body["timestamp"].is_string());
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_inbound_request_id_is_echoed() {
        let app = router(AppConfig::default());
        let response = app
            .oneshot(
                Request::builder()
                    .uri("/api/v1/health")
                    .header("x-correlation-id", "trace-42")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        assert_eq!(response.headers()["x-request-id"], "trace-42");
        let body = json(response).await;
        assert_eq!(body["requestId"], "trace-42");
        assert_eq!(body["data"]["status"], "alive");
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let app = router(AppConfig::default());
        let response = get(&app, "/api/v1/nope").await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Route /api/v1/nope not found");
        assert_eq!(body["error"]["type"], "Not Found");
        assert!(body["error"]["details"]["debug"].is_string());
    }

    #[tokio::test]
    async fn test_production_hides_debug_details() {
        let mut config = AppConfig::default();
        config.server.environment = Environment::Production;
        let app = router(config);

        let body = json(get(&app, "/api/v1/nope").await).await;
        assert!(body["error"].get("details").is_none());
    }

    #[tokio::test]
    async fn test_root_redirects_to_info() {
        let app = router(AppConfig::default());
        let response = get(&app, "/").await;

        assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
        assert_eq!(response.headers()[header::LOCATION], "/api/v1/info");
    }

    #[tokio::test]
    async fn test_security_headers() {
        let app = router(AppConfig::default());
        let response = get(&app, "/api/v1/health").await;

        assert_eq!(response.headers()["x-content-type-options"], "nosniff");
        assert_eq!(response.headers()["x-frame-options"], "DENY");
    }
}

#[cfg(test)]
mod rate_limit_tests {
    use super::helpers::{get, json, router};
    use crate::config::AppConfig;
    use axum::http::{StatusCode, header};

    fn limited(max_requests: u32) -> AppConfig {
        let mut config = AppConfig::default();
        config.rate_limit.max_requests = max_requests;
        config.rate_limit.window_secs = 60;
        config
    }

    #[tokio::test]
    async fn test_third_request_is_rejected() {
        let app = router(limited(2));

        for remaining in ["1", "0"] {
            let response = get(&app, "/api/v1/info").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert_eq!(response.headers()["x-ratelimit-limit"], "2");
            assert_eq!(response.headers()["x-ratelimit-remaining"], remaining);
        }

        let response = get(&app, "/api/v1/info").await;
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

        let retry_after: u64 = response.headers()[header::RETRY_AFTER]
            .to_str()
            .unwrap()
            .parse()
            .unwrap();
        assert!((1..=60).contains(&retry_after));
        assert!(response.headers().contains_key("x-request-id"));

        let body = json(response).await;
        assert_eq!(body["statusCode"], 429);
        assert_eq!(body["error"]["type"], "Too Many Requests");
        assert_eq!(body["error"]["details"]["retryAfter"], retry_after);
    }

    #[tokio::test]
    async fn test_health_routes_are_exempt() {
        let app = router(limited(1));

        assert_eq!(get(&app, "/api/v1/info").await.status(), StatusCode::OK);
        for _ in 0..3 {
            assert_eq!(get(&app, "/api/v1/health").await.status(), StatusCode::OK);
        }
        assert_eq!(
            get(&app, "/api/v1/info").await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
    }

    #[tokio::test]
    async fn test_nested_health_paths_are_counted() {
        let app = router(limited(1));

        let first = get(&app, "/api/v1/tools/x/health").await;
        assert_eq!(first.status(), StatusCode::NOT_FOUND);
        assert_eq!(first.headers()["x-ratelimit-remaining"], "0");

        assert_eq!(
            get(&app, "/api/v1/tools/x/health").await.status(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(get(&app, "/api/v1/health").await.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_disabled_limiter() {
        let mut config = limited(1);
        config.rate_limit.enabled = false;
        let app = router(config);

        for _ in 0..3 {
            let response = get(&app, "/api/v1/info").await;
            assert_eq!(response.status(), StatusCode::OK);
            assert!(!response.headers().contains_key("x-ratelimit-limit"));
        }
    }
}

#[cfg(test)]
mod health_tests {
    use super::helpers::{get, json, router};
    use crate::config::AppConfig;
    use axum::http::StatusCode;

    #[tokio::test]
    async fn test_ready() {
        let app = router(AppConfig::default());
        let response = get(&app, "/api/v1/ready").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"]["status"], "ready");
        assert_eq!(body["data"]["checks"]["cache"]["status"], "ok");
    }

    #[tokio::test]
    async fn test_not_ready_is_503() {
        let mut config = AppConfig::default();
        config.upstream.imagy_base_url = "imagy".to_string();
        let app = router(config);

        let response = get(&app, "/api/v1/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
        let body = json(response).await;
        assert_eq!(body["success"], false);
        assert_eq!(body["data"]["status"], "not_ready");
    }

    #[tokio::test]
    async fn test_metrics_count_requests() {
        let app = router(AppConfig::default());
        get(&app, "/api/v1/info").await;
        get(&app, "/api/v1/missing").await;

        let body = json(get(&app, "/api/v1/metrics").await).await;
        let requests = &body["data"]["requests"];
        assert_eq!(requests["total"], 2);
        assert_eq!(requests["clientErrors"], 1);
        assert_eq!(requests["serverErrors"], 0);
        assert_eq!(body["data"]["cache"]["enabled"], true);
    }
}

#[cfg(test)]
mod ai_tests {
    use super::helpers::{fast_config, json, post_json, router};
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_sora2_generation() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "task_123" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/task_123"))
            .and(query_param("channel", "SORA2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "state": 0 } })))
            .up_to_n_times(2)
            .with_priority(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/task_123"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": { "state": 1, "completeData": "{\"videoUrl\":\"https://x/a.mp4\"}" }
            })))
            .with_priority(2)
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.sora2_base_url = server.uri();
        let app = router(config);

        let response = post_json(
            &app,
            "/api/v1/ai/sora2",
            json!({ "prompt": "a cat in space", "ratio": "portrait" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);

        let body = json(response).await;
        assert_eq!(body["data"]["taskId"], "task_123");
        assert_eq!(body["data"]["aspectRatio"], "portrait");
        assert_eq!(body["data"]["video"]["url"], "https://x/a.mp4");
        assert_eq!(body["data"]["attempts"], 3);
    }

    #[tokio::test]
    async fn test_sora2_timeout_is_504() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/video/create"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "task_1" })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/task_1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": { "state": 0 } })))
            .expect(2)
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.sora2_base_url = server.uri();
        config.poller.video_max_attempts = 2;
        let app = router(config);

        let response = post_json(
            &app,
            "/api/v1/ai/sora2",
            json!({ "prompt": "a cat in space" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
        let body = json(response).await;
        assert_eq!(body["error"]["type"], "Gateway Timeout");
        assert_eq!(body["error"]["details"]["attempts"], 2);
    }

    #[tokio::test]
    async fn test_sora2_validation() {
        let app = router(fast_config());

        let response = post_json(&app, "/api/v1/ai/sora2", json!({ "prompt": "short" })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let body = json(response).await;
        assert_eq!(body["error"]["type"], "Validation Error");
        assert_eq!(
            body["error"]["details"]["prompt"][0]["message"],
            "Prompt must be at least 10 characters"
        );

        let response = post_json(
            &app,
            "/api/v1/ai/sora2",
            json!({ "prompt": "a cat in space", "ratio": "square" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_blank_prompts_never_reach_upstream() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "data": "task_1" })))
            .expect(0)
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.sora2_base_url = server.uri();
        config.upstream.wainsfw_base_url = server.uri();
        let app = router(config);

        let response = post_json(&app, "/api/v1/ai/sora2", json!({ "prompt": "          " })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json(response).await["error"]["details"]["prompt"][0]["message"],
            "Prompt must be at least 10 characters"
        );

        let response = post_json(&app, "/api/v1/ai/wainsfw", json!({ "prompt": "  ab   " })).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response =
            super::helpers::get(&app, "/api/v1/ai/gemini?text=%20%20&apikey=0123456789abcdef").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert!(json(response).await["error"]["details"].get("text").is_some());
    }

    #[tokio::test]
    async fn test_wainsfw_dimension_bounds() {
        let app = router(fast_config());

        let response = post_json(
            &app,
            "/api/v1/ai/wainsfw",
            json!({ "prompt": "a lighthouse", "width": 4096, "inferenceSteps": 0 }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let details = &json(response).await["error"]["details"];
        assert!(details.get("width").is_some());
        assert!(details.get("inference_steps").is_some());
    }

    #[tokio::test]
    async fn test_gemini_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/models/gemini-2.5-flash-lite:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "candidates": [{ "content": { "parts": [{ "text": "Hi there" }] } }]
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.gemini_base_url = server.uri();
        let app = router(config);
        let uri = "/api/v1/ai/gemini?text=hello&apikey=AIzaTestKey123";

        let first = json(super::helpers::get(&app, uri).await).await;
        assert_eq!(first["data"]["text"], "Hi there");
        assert_eq!(first["meta"]["cached"], false);

        let second = json(super::helpers::get(&app, uri).await).await;
        assert_eq!(second["message"], "Response from cache");
        assert_eq!(second["meta"]["cached"], true);
        assert_eq!(second["data"]["text"], "Hi there");
    }

    #[tokio::test]
    async fn test_gemini_requires_a_key() {
        let app = router(fast_config());

        let response = super::helpers::get(&app, "/api/v1/ai/gemini?text=hello").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(json(response).await["message"], "Parameter apikey is required");

        let response = super::helpers::get(&app, "/api/v1/ai/gemini?text=hello&apikey=short").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_upstream_error_is_preserved() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(403).set_body_json(json!({
                "error": { "message": "Permission denied" }
            })))
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.gemini_base_url = server.uri();
        let app = router(config);

        let response = super::helpers::get(
            &app,
            "/api/v1/ai/gemini-with-system?text=hello&system=be%20brief&apikey=AIzaTestKey123",
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);

        let details = &json(response).await["error"]["details"];
        assert_eq!(details["service"], "gemini");
        assert_eq!(details["upstreamStatus"], 403);
        assert_eq!(details["upstreamMessage"], "Permission denied");
    }

    #[tokio::test]
    async fn test_waifu2x_returns_image_bytes() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/in.jpg"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![7u8; 10], "image/jpeg"))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![9u8; 40], "image/png"))
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.waifu2x_base_url = server.uri();
        let app = router(config);

        let response = post_json(
            &app,
            "/api/v1/ai/waifu2x",
            json!({ "image": format!("{}/in.jpg", server.uri()), "noice": "low", "upscaling": "1.6x" }),
        )
        .await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()["content-type"], "image/png");
        assert_eq!(response.headers()["x-original-size"], "10");
        assert_eq!(response.headers()["x-result-size"], "40");

        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(bytes.len(), 40);
    }
}

#[cfg(test)]
mod downloader_tests {
    use super::helpers::{fast_config, get, json, router};
    use axum::http::StatusCode;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_videy_link() {
        let app = router(fast_config());
        let response = get(&app, "/api/v1/downloader/videy?url=https%3A%2F%2Fvidey.co%2Fv%3Fid%3DAbC123").await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = json(response).await;
        assert_eq!(body["data"]["videoId"], "AbC123");
        assert_eq!(body["data"]["downloadUrl"], "https://cdn.videy.co/AbC123.mp4");
    }

    #[tokio::test]
    async fn test_missing_url_parameter() {
        let app = router(fast_config());
        let response = get(&app, "/api/v1/downloader/videy").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_threads_is_cached() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/download"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "directLink": "https://cdn/t.jpg",
                "type": "image"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let mut config = fast_config();
        config.upstream.snapthreads_base_url = server.uri();
        let app = router(config);
        let uri = "/api/v1/downloader/threads?url=https%3A%2F%2Fwww.threads.net%2F%40a%2Fpost%2F1";

        let first = json(get(&app, uri).await).await;
        assert_eq!(first["data"]["downloadUrl"], "https://cdn/t.jpg");
        assert_eq!(first["meta"]["cached"], false);

        let second = json(get(&app, uri).await).await;
        assert_eq!(second["meta"]["cached"], true);
        assert_eq!(second["data"]["type"], "image");
    }

    #[tokio::test]
    async fn test_aio_unknown_platform() {
        let app = router(fast_config());
        let response = get(&app, "/api/v1/downloader/aio?url=https%3A%2F%2Fexample.org%2Fv").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}

#[cfg(test)]
mod tools_tests {
    use super::helpers::{fast_config, get, json, router};
    use axum::http::{StatusCode, header};
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn imagy(server: &MockServer) {
        Mock::given(method("POST"))
            .and(path("/screenshot/createscreenshot"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "fileUrl": format!("{}/shot.png", server.uri()) })),
            )
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path("/shot.png"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(vec![0x89u8, b'P', b'N', b'G'], "image/png"))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_ssweb_returns_url() {
        let server = MockServer::start().await;
        imagy(&server).await;

        let mut config = fast_config();
        config.upstream.imagy_base_url = server.uri();
        let app = router(config);

        let body = json(get(&app, "/api/v1/tools/ssweb?url=https%3A%2F%2Fexample.com&width=800&height=600&fullPage=true").await).await;
        assert_eq!(body["data"]["url"], format!("{}/shot.png", server.uri()));
        assert_eq!(body["data"]["metadata"]["dimensions"]["width"], 800);
        assert_eq!(body["data"]["metadata"]["fullPage"], true);
    }

    #[tokio::test]
    async fn test_ssweb_png_proxy() {
        let server = MockServer::start().await;
        imagy(&server).await;

        let mut config = fast_config();
        config.upstream.imagy_base_url = server.uri();
        let app = router(config);

        let response = get(&app, "/api/v1/tools/ssweb-pc?url=https%3A%2F%2Fexample.com").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers()[header::CONTENT_TYPE], "image/png");
        assert_eq!(response.headers()[header::CACHE_CONTROL], "public, max-age=3600");
    }

    #[tokio::test]
    async fn test_ssweb_rejects_small_viewport() {
        let app = router(fast_config());
        let response = get(&app, "/api/v1/tools/ssweb?url=https%3A%2F%2Fexample.com&width=50").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = get(&app, "/api/v1/tools/ssweb-hp?url=example.com").await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_preview() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/post"))
            .respond_with(ResponseTemplate::new(200).set_body_raw(
                "<html><head><title>Release notes</title><meta name=\"description\" content=\"What changed\"></head></html>",
                "text/html",
            ))
            .mount(&server)
            .await;

        let app = router(fast_config());
        let uri = format!("/api/v1/tools/preview?url={}/post", server.uri());
        let body = json(get(&app, &uri).await).await;

        assert_eq!(body["data"]["title"], "Release notes");
        assert_eq!(body["data"]["description"], "What changed");
        assert_eq!(body["data"]["favicon"], format!("{}/favicon.ico", server.uri()));
    }
}
