//! Pipeline tests driven through the assembled router, without a socket.

mod common;

use axum::body::Body;
use axum::Router;
use axum::http::{header, StatusCode};
use chrono::{Duration, Utc};
use common::{bearer, request, test_config, token_service, TestGateway, SECRET};
use equipment_gateway::auth::{Claims, TokenType};
use equipment_gateway::Collaborators;
use equipment_gateway::config::{Secret, MAX_UPLOAD_BYTES};
use equipment_gateway::store::{BlacklistEntry, TokenBlacklist};
use serde_json::json;

fn json_body(value: serde_json::Value) -> Body {
    Body::from(value.to_string())
}

// ---------------------------------------------------------------------------
// Health
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_health_hides_debug_mode() {
    let mut config = test_config();
    config.debug = true;
    let gateway = TestGateway::new(config);

    let res = gateway
        .send(request("GET", "/health/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["message"], "EquipSense Backend is running");
    assert_eq!(body["debug_mode"], false);
    assert!(body["python_version"].is_string());
}

#[tokio::test]
async fn test_health_is_stable_and_ignores_credentials() {
    let gateway = TestGateway::new(test_config());

    let first = gateway
        .send(request("GET", "/health/").body(Body::empty()).unwrap())
        .await;
    let second = gateway
        .send(
            request("GET", "/health/")
                .header(header::AUTHORIZATION, "Bearer not-a-token")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(first.status, StatusCode::OK);
    assert_eq!(second.status, StatusCode::OK);
    assert_eq!(first.body, second.body);
}

#[tokio::test]
async fn test_health_rejects_other_methods() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(request("POST", "/health/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(res.header("allow"), Some("GET"));
}

// ---------------------------------------------------------------------------
// Routing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_unmatched_path_is_not_found() {
    let gateway = TestGateway::new(test_config());

    for path in ["/", "/apix/", "/health", "/health/extra", "/unknown/thing"] {
        let res = gateway
            .send(request("GET", path).body(Body::empty()).unwrap())
            .await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "path {path}");
        assert_eq!(res.json()["error"], "not_found");
    }
    assert_eq!(gateway.hits(), 0);
}

#[tokio::test]
async fn test_unmounted_group_is_unavailable() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(request("GET", "/admin/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_static_files_served_only_in_debug() {
    let dir = tempfile::tempdir().unwrap();
    let static_root = dir.path().join("staticfiles");
    std::fs::create_dir_all(&static_root).unwrap();
    std::fs::write(static_root.join("app.css"), "body {}").unwrap();

    let mut config = test_config();
    config.static_files.static_root = static_root.clone();

    let production = TestGateway::new(config.clone());
    let res = production
        .send(request("GET", "/static/app.css").body(Body::empty()).unwrap())
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);

    config.debug = true;
    let debug = TestGateway::new(config);
    let res = debug
        .send(request("GET", "/static/app.css").body(Body::empty()).unwrap())
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.body, b"body {}");

    let res = debug
        .send(request("POST", "/static/app.css").body(Body::empty()).unwrap())
        .await;
    assert_eq!(res.status, StatusCode::METHOD_NOT_ALLOWED);
}

// ---------------------------------------------------------------------------
// Authentication
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_api_requires_token() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(request("GET", "/api/equipment/").body(Body::empty()).unwrap())
        .await;

    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.header("www-authenticate"), Some("Bearer realm=\"api\""));
    assert_eq!(res.json()["error"], "not_authenticated");
    assert_eq!(gateway.hits(), 0);
}

#[tokio::test]
async fn test_valid_token_reaches_collaborator() {
    let gateway = TestGateway::new(test_config());
    let access = gateway.tokens.issue("42", TokenType::Access).unwrap();

    let res = gateway
        .send(
            request("GET", "/api/equipment/7/")
                .header(header::AUTHORIZATION, bearer(&access))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    let body = res.json();
    assert_eq!(body["user_id"], "42");
    assert_eq!(body["path"], "/api/equipment/7/");
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn test_numeric_user_id_from_auth_service_is_admitted() {
    let gateway = TestGateway::new(test_config());
    let now = Utc::now().timestamp();
    let claims = json!({
        "token_type": "access",
        "exp": now + 3600,
        "iat": now,
        "jti": "abc123",
        "user_id": 42,
    });
    let token = jsonwebtoken::encode(
        &jsonwebtoken::Header::new(jsonwebtoken::Algorithm::HS256),
        &claims,
        &jsonwebtoken::EncodingKey::from_secret(SECRET.as_bytes()),
    )
    .unwrap();

    let res = gateway
        .send(
            request("GET", "/api/equipment/")
                .header(header::AUTHORIZATION, bearer(&token))
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["user_id"], "42");
}

#[tokio::test]
async fn test_every_rejection_looks_the_same() {
    let config = test_config();
    let gateway = TestGateway::new(config.clone());
    let tokens = &gateway.tokens;

    let expired = tokens
        .sign(&Claims::new(
            "42",
            TokenType::Access,
            Utc::now() - Duration::hours(6),
            Duration::hours(5),
        ))
        .unwrap();

    let mut foreign_config = config.clone();
    foreign_config.secret_key = Secret::new(format!("{SECRET}-other"));
    let foreign = token_service(&foreign_config)
        .issue("42", TokenType::Access)
        .unwrap();

    let refresh = tokens.issue("42", TokenType::Refresh).unwrap();

    let revoked = tokens.issue("42", TokenType::Access).unwrap();
    let claims = tokens.validate(&revoked, TokenType::Access).await.unwrap();
    tokens
        .blacklist()
        .blacklist(&BlacklistEntry {
            jti: claims.jti,
            user_id: claims.user_id,
            token_type: "access".to_string(),
            expires_at: claims.exp,
        })
        .unwrap();

    let headers = [
        None,
        Some("Bearer".to_string()),
        Some("Token abc".to_string()),
        Some("Bearer garbage".to_string()),
        Some(bearer(&expired)),
        Some(bearer(&foreign)),
        Some(bearer(&refresh)),
        Some(bearer(&revoked)),
    ];

    let mut bodies = Vec::new();
    for value in headers {
        let mut builder = request("GET", "/api/equipment/");
        if let Some(value) = &value {
            builder = builder.header(header::AUTHORIZATION, value.as_str());
        }
        let res = gateway.send(builder.body(Body::empty()).unwrap()).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "header {value:?}");
        bodies.push(res.body);
    }

    assert!(bodies.windows(2).all(|pair| pair[0] == pair[1]));
    assert_eq!(gateway.hits(), 0);
}

#[tokio::test]
async fn test_refresh_issues_usable_access_token() {
    let gateway = TestGateway::new(test_config());
    let pair = gateway.tokens.issue_pair("9").unwrap();

    let res = gateway
        .send(
            request("POST", "/api/auth/token/refresh/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(json_body(json!({ "refresh": pair.refresh })))
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    let access = res.json()["access"].as_str().unwrap().to_string();

    let res = gateway
        .send(
            request("GET", "/api/equipment/")
                .header(header::AUTHORIZATION, bearer(&access))
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["user_id"], "9");
}

#[tokio::test]
async fn test_logout_blacklists_refresh_token() {
    let gateway = TestGateway::new(test_config());
    let pair = gateway.tokens.issue_pair("9").unwrap();

    let logout = || {
        request("POST", "/api/auth/logout/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body(json!({ "refresh": pair.refresh })))
            .unwrap()
    };

    let res = gateway.send(logout()).await;
    assert_eq!(res.status, StatusCode::RESET_CONTENT);

    let res = gateway
        .send(
            request("POST", "/api/auth/token/refresh/")
                .header(header::CONTENT_TYPE, "application/json")
                .body(json_body(json!({ "refresh": pair.refresh })))
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    let res = gateway.send(logout()).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_verify_endpoint() {
    let gateway = TestGateway::new(test_config());
    let access = gateway.tokens.issue("3", TokenType::Access).unwrap();

    let verify = |token: &str| {
        request("POST", "/api/auth/token/verify/")
            .header(header::CONTENT_TYPE, "application/json")
            .body(json_body(json!({ "token": token })))
            .unwrap()
    };

    assert_eq!(gateway.send(verify(&access)).await.status, StatusCode::OK);
    assert_eq!(
        gateway.send(verify("garbage")).await.status,
        StatusCode::UNAUTHORIZED
    );
}

// ---------------------------------------------------------------------------
// CORS
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_cors_listed_origin() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(
            request("GET", "/health/")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.header("access-control-allow-origin"),
        Some("http://localhost:3000")
    );
    assert_eq!(res.header("access-control-allow-credentials"), Some("true"));
}

#[tokio::test]
async fn test_cors_unlisted_origin_gets_nothing() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(
            request("GET", "/health/")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(!res.has_cors_headers());

    let res = gateway
        .send(
            request("OPTIONS", "/api/equipment/")
                .header(header::ORIGIN, "https://evil.example")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert!(!res.has_cors_headers());
}

#[tokio::test]
async fn test_collaborator_cors_headers_never_leak() {
    let admin = Router::new().fallback(|| async {
        (
            [
                (header::ACCESS_CONTROL_ALLOW_ORIGIN, "*"),
                (header::ACCESS_CONTROL_ALLOW_CREDENTIALS, "true"),
            ],
            "admin",
        )
    });
    let gateway =
        TestGateway::with_collaborators(test_config(), Collaborators::new().with_admin(admin));

    let res = gateway
        .send(
            request("GET", "/admin/")
                .header(header::ORIGIN, "https://evil.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert!(!res.has_cors_headers());

    let res = gateway
        .send(
            request("GET", "/admin/")
                .header(header::ORIGIN, "http://localhost:3000")
                .body(Body::empty())
                .unwrap(),
        )
        .await;
    assert_eq!(
        res.header("access-control-allow-origin"),
        Some("http://localhost:3000")
    );
}

#[tokio::test]
async fn test_cors_preflight_for_listed_origin() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(
            request("OPTIONS", "/api/equipment/")
                .header(header::ORIGIN, "http://127.0.0.1:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "PATCH")
                .header(header::ACCESS_CONTROL_REQUEST_HEADERS, "authorization")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(
        res.header("access-control-allow-origin"),
        Some("http://127.0.0.1:3000")
    );
    assert_eq!(
        res.header("access-control-allow-methods"),
        Some("DELETE, GET, OPTIONS, PATCH, POST, PUT")
    );
    assert!(res
        .header("access-control-allow-headers")
        .unwrap()
        .contains("authorization"));
    assert_eq!(res.header("access-control-max-age"), Some("86400"));
    assert_eq!(gateway.hits(), 0);
}

// ---------------------------------------------------------------------------
// Admission
// ---------------------------------------------------------------------------

#[tokio::test]
async fn test_disallowed_host_is_rejected() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(
            axum::http::Request::builder()
                .uri("/health/")
                .header(header::HOST, "attacker.example")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_host_port_is_ignored() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(
            axum::http::Request::builder()
                .uri("/health/")
                .header(header::HOST, "127.0.0.1:8000")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
}

#[tokio::test]
async fn test_oversized_body_is_rejected_before_collaborator() {
    let gateway = TestGateway::new(test_config());
    let access = gateway.tokens.issue("42", TokenType::Access).unwrap();
    let size = MAX_UPLOAD_BYTES + 1;

    let res = gateway
        .send(
            request("POST", "/api/equipment/upload/")
                .header(header::AUTHORIZATION, bearer(&access))
                .header(header::CONTENT_LENGTH, size)
                .body(Body::from(vec![0u8; size]))
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(gateway.hits(), 0);
}

#[tokio::test]
async fn test_oversized_stream_without_length_is_cut_off() {
    let gateway = TestGateway::new(test_config());
    let access = gateway.tokens.issue("42", TokenType::Access).unwrap();
    let chunk = 1024 * 1024;
    let chunks = (0..11).map(move |_| Ok::<_, std::io::Error>(vec![0u8; chunk]));

    let res = gateway
        .send(
            request("POST", "/api/equipment/upload/")
                .header(header::AUTHORIZATION, bearer(&access))
                .body(Body::from_stream(futures_util::stream::iter(chunks)))
                .unwrap(),
        )
        .await;

    // The collaborator runs, but its body read fails at the limit.
    assert_eq!(res.status, StatusCode::OK);
    assert!(res.json()["body_len"].is_null());
    assert_eq!(gateway.hits(), 1);
}

#[tokio::test]
async fn test_body_at_limit_is_accepted() {
    let gateway = TestGateway::new(test_config());
    let access = gateway.tokens.issue("42", TokenType::Access).unwrap();

    let res = gateway
        .send(
            request("POST", "/api/equipment/upload/")
                .header(header::AUTHORIZATION, bearer(&access))
                .header(header::CONTENT_LENGTH, MAX_UPLOAD_BYTES)
                .body(Body::from(vec![0u8; MAX_UPLOAD_BYTES]))
                .unwrap(),
        )
        .await;

    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["body_len"], MAX_UPLOAD_BYTES);
}

#[tokio::test]
async fn test_security_headers_and_request_id() {
    let gateway = TestGateway::new(test_config());

    let res = gateway
        .send(
            request("GET", "/health/")
                .header("x-request-id", "trace-me")
                .body(Body::empty())
                .unwrap(),
        )
        .await;

    assert_eq!(res.header("x-frame-options"), Some("DENY"));
    assert_eq!(res.header("x-content-type-options"), Some("nosniff"));
    assert_eq!(res.header("referrer-policy"), Some("same-origin"));
    assert_eq!(res.header("x-request-id"), Some("trace-me"));
}
