use axum::Router;
use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use tokio::time::{Duration, advance};
use tower::ServiceExt;

use tidekv_server::{AppState, ServerConfig, router};

const ADMIN: &str = "admin-secret";
const USER: &str = "user-secret";

fn app() -> (Router, AppState) {
    app_with_body_limit(1024 * 1024)
}

fn app_with_body_limit(max_body_bytes: usize) -> (Router, AppState) {
    // Reaper praticamente desligado: os testes enxergam só a expiração lógica
    let config = ServerConfig::default()
        .with_admin_key(ADMIN)
        .with_user_key(USER)
        .with_reap_interval(Duration::from_secs(3600));
    let state = AppState::new(&config);
    (router(state.clone(), max_body_bytes), state)
}

async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    key: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(key) = key {
        req = req.header("x-api-key", key);
    }
    let req = match body {
        Some(body) => req
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => req.body(Body::empty()).unwrap(),
    };

    let res = app.clone().oneshot(req).await.unwrap();
    let status = res.status();
    let bytes = to_bytes(res.into_body(), usize::MAX).await.unwrap();
    let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, value)
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    call(app, Method::GET, uri, Some(USER), None).await
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    call(app, Method::POST, uri, Some(USER), Some(body)).await
}

#[tokio::test]
async fn set_get_delete() {
    let (app, _) = app();

    let (status, body) = post(&app, "/set", json!({"key": "a", "value": "1"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Stored 'a' successfully!"}));

    let (status, body) = get(&app, "/get?key=a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "a", "value": "1"}));

    for _ in 0..2 {
        let (status, body) = call(
            &app,
            Method::DELETE,
            "/delete",
            Some(USER),
            Some(json!({"key": "a"})),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"message": "Deleted 'a' successfully!"}));
    }

    let (status, body) = get(&app, "/get?key=a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Key not found"}));
}

#[tokio::test]
async fn list_keys_is_sorted() {
    let (app, _) = app();
    for key in ["b", "a", "c"] {
        post(&app, "/set", json!({"key": key, "value": "x"})).await;
    }

    let (status, body) = get(&app, "/list_keys").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"keys": ["a", "b", "c"]}));
}

#[tokio::test]
async fn missing_fields_are_bad_requests() {
    let (app, state) = app();

    let (status, body) = post(&app, "/set", json!({"value": "1"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "key is required"}));

    let (status, body) = post(&app, "/set", json!({"key": "a"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "value is required"}));

    let (status, _) = post(&app, "/expire", json!({"key": "a", "ttl": "soon"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = get(&app, "/get").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    assert!(state.db.is_empty());
}

#[tokio::test]
async fn malformed_json_is_bad_request() {
    let (app, _) = app();
    let req = Request::builder()
        .method(Method::POST)
        .uri("/set")
        .header("x-api-key", USER)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();

    let res = app.oneshot(req).await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn oversized_body_is_rejected() {
    let (app, state) = app_with_body_limit(64);
    let big = "x".repeat(1024);

    let (status, _) = post(&app, "/set", json!({"key": "a", "value": big})).await;
    assert!(status.is_client_error());
    assert!(state.db.is_empty());
}

#[tokio::test(start_paused = true)]
async fn ttl_lifecycle() {
    let (app, _) = app();

    post(&app, "/set", json!({"key": "a", "value": "1"})).await;
    let (status, body) = get(&app, "/ttl?key=a").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "a", "ttl": -1}));

    let (status, body) = post(&app, "/expire", json!({"key": "a", "ttl": 10})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "TTL set for 'a' to 10 seconds"}));

    let (_, body) = get(&app, "/ttl?key=a").await;
    let ttl = body["ttl"].as_i64().unwrap();
    assert!(ttl > 0 && ttl <= 10);

    advance(Duration::from_secs(4)).await;
    let (_, body) = get(&app, "/ttl?key=a").await;
    assert!(body["ttl"].as_i64().unwrap() < ttl);

    advance(Duration::from_secs(7)).await;
    let (status, _) = get(&app, "/ttl?key=a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = get(&app, "/get?key=a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test(start_paused = true)]
async fn non_positive_expire_hides_key_immediately() {
    let (app, _) = app();
    for ttl in [0, -5] {
        post(&app, "/set", json!({"key": "a", "value": "1"})).await;
        let (status, _) = post(&app, "/expire", json!({"key": "a", "ttl": ttl})).await;
        assert_eq!(status, StatusCode::OK);

        let (status, _) = get(&app, "/get?key=a").await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}

#[tokio::test]
async fn expire_on_absent_key() {
    let (app, _) = app();
    let (status, body) = post(&app, "/expire", json!({"key": "ghost", "ttl": 5})).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Key not found"}));
}

#[tokio::test(start_paused = true)]
async fn set_with_ttl_and_overwrite_clears_it() {
    let (app, _) = app();

    let (status, _) = post(&app, "/set", json!({"key": "s", "value": "1", "ttl": 5})).await;
    assert_eq!(status, StatusCode::OK);
    let (_, body) = get(&app, "/ttl?key=s").await;
    assert_eq!(body["ttl"], json!(5));

    post(&app, "/set", json!({"key": "s", "value": "2"})).await;
    advance(Duration::from_secs(6)).await;
    let (status, body) = get(&app, "/get?key=s").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["value"], json!("2"));

    let (status, _) = post(&app, "/set", json!({"key": "s", "value": "1", "ttl": 0})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test(start_paused = true)]
async fn concrete_scenario() {
    let (app, _) = app();

    post(&app, "/set", json!({"key": "a", "value": "1"})).await;
    let (_, body) = get(&app, "/get?key=a").await;
    assert_eq!(body["value"], json!("1"));

    post(&app, "/expire", json!({"key": "a", "ttl": 1})).await;
    advance(Duration::from_millis(1500)).await;
    let (status, _) = get(&app, "/get?key=a").await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    post(&app, "/enqueue", json!({"queue": "q", "value": "x"})).await;
    post(&app, "/enqueue", json!({"queue": "q", "value": "y"})).await;

    let (_, body) = get(&app, "/dequeue?queue=q").await;
    assert_eq!(body, json!({"queue": "q", "value": "x"}));
    let (_, body) = get(&app, "/dequeue?queue=q").await;
    assert_eq!(body, json!({"queue": "q", "value": "y"}));

    let (status, body) = get(&app, "/dequeue?queue=q").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Queue is empty"}));
}

#[tokio::test]
async fn queues_are_independent_and_listed() {
    let (app, _) = app();

    let (status, body) = post(&app, "/enqueue", json!({"queue": "q1", "value": "a"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Enqueued 'a' to queue 'q1'"}));
    post(&app, "/enqueue", json!({"queue": "q2", "value": "z"})).await;
    post(&app, "/enqueue", json!({"queue": "q1", "value": "b"})).await;

    let (_, body) = get(&app, "/list_queues").await;
    assert_eq!(body, json!({"queues": ["q1", "q2"]}));

    let (_, body) = get(&app, "/dequeue?queue=q1").await;
    assert_eq!(body["value"], json!("a"));
    let (_, body) = get(&app, "/dequeue?queue=q1").await;
    assert_eq!(body["value"], json!("b"));

    // Fila esvaziada some da listagem
    let (_, body) = get(&app, "/list_queues").await;
    assert_eq!(body, json!({"queues": ["q2"]}));

    // Nunca usada e esvaziada respondem igual
    let never = get(&app, "/dequeue?queue=never").await;
    let drained = get(&app, "/dequeue?queue=q1").await;
    assert_eq!(never, drained);
}

#[tokio::test]
async fn counters_and_hashes() {
    let (app, _) = app();

    let (status, body) = post(&app, "/incr", json!({"key": "hits"})).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"key": "hits", "value": 1}));
    post(&app, "/incr", json!({"key": "hits"})).await;
    let (_, body) = post(&app, "/decr", json!({"key": "hits"})).await;
    assert_eq!(body["value"], json!(1));

    post(&app, "/set", json!({"key": "name", "value": "bob"})).await;
    let (status, body) = post(&app, "/incr", json!({"key": "name"})).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "value is not an integer or out of range"}));

    let (status, body) = post(
        &app,
        "/hset",
        json!({"hash": "user:1", "field": "name", "value": "Ana"}),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"message": "Stored field 'name' in hash 'user:1'"}));

    let (_, body) = get(&app, "/hget?hash=user:1&field=name").await;
    assert_eq!(body, json!({"hash": "user:1", "field": "name", "value": "Ana"}));

    let (status, body) = get(&app, "/hget?hash=user:1&field=age").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, json!({"error": "Field not found"}));

    let (status, _) = get(&app, "/get?key=user:1").await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = post(&app, "/incr", json!({"key": "user:1"})).await;
    assert_eq!(status, StatusCode::CONFLICT);
    let (status, _) = post(
        &app,
        "/hset",
        json!({"hash": "name", "field": "f", "value": "v"}),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn unauthorized_requests_have_no_side_effects() {
    let (app, state) = app();
    post(&app, "/set", json!({"key": "a", "value": "1"})).await;
    post(&app, "/enqueue", json!({"queue": "q", "value": "x"})).await;

    let attempts: Vec<(Method, &str, Option<Value>)> = vec![
        (Method::POST, "/set", Some(json!({"key": "a", "value": "2"}))),
        (Method::DELETE, "/delete", Some(json!({"key": "a"}))),
        (Method::POST, "/expire", Some(json!({"key": "a", "ttl": 0}))),
        (Method::POST, "/enqueue", Some(json!({"queue": "q", "value": "y"}))),
        (Method::GET, "/dequeue?queue=q", None),
        (Method::GET, "/get?key=a", None),
        (Method::GET, "/list_keys", None),
        (Method::GET, "/logs", None),
    ];

    let logged_before = state.request_log.len();
    let mut bodies = Vec::new();
    for (method, uri, body) in attempts {
        for key in [None, Some(""), Some("wrong"), Some("USER-SECRET")] {
            let (status, body) = call(&app, method.clone(), uri, key, body.clone()).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{method} {uri} {key:?}");
            bodies.push(body);
        }
    }

    // Mesmo corpo para toda causa de rejeição
    assert!(bodies.iter().all(|b| *b == bodies[0]));
    assert_eq!(bodies[0], json!({"error": "Unauthorized. Invalid API Key"}));
    assert_eq!(state.request_log.len(), logged_before);

    let (_, body) = get(&app, "/get?key=a").await;
    assert_eq!(body["value"], json!("1"));
    let (_, body) = get(&app, "/ttl?key=a").await;
    assert_eq!(body["ttl"], json!(-1));
    assert_eq!(state.queues.len("q"), 1);
}

#[tokio::test]
async fn generate_key_requires_admin() {
    let (app, _) = app();

    let (status, body) = post(&app, "/generate_key", json!({"user_id": "eve"})).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, json!({"error": "Forbidden. Admin access required"}));

    let (status, body) = call(
        &app,
        Method::POST,
        "/generate_key",
        Some(ADMIN),
        Some(json!({"user_id": "eve"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["role"], json!("user"));
    let new_key = body["api_key"].as_str().unwrap().to_string();
    assert_eq!(new_key.len(), 32);

    // A chave emitida funciona imediatamente, com o papel pedido
    let (status, _) = call(
        &app,
        Method::POST,
        "/set",
        Some(&new_key),
        Some(json!({"key": "k", "value": "v"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::GET, "/logs", Some(&new_key), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &app,
        Method::POST,
        "/generate_key",
        Some(ADMIN),
        Some(json!({"user_id": "eve", "role": "root"})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, json!({"error": "role must be 'admin' or 'user', got 'root'"}));
}

#[tokio::test]
async fn logs_are_masked_and_admin_only() {
    let (app, _) = app();
    get(&app, "/list_keys").await;
    post(&app, "/set", json!({"key": "a", "value": "1"})).await;

    let (status, _) = get(&app, "/logs").await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&app, Method::GET, "/logs", Some(ADMIN), None).await;
    assert_eq!(status, StatusCode::OK);

    let logs = body["logs"].as_array().unwrap();
    let endpoints: Vec<_> = logs.iter().map(|e| e["endpoint"].clone()).collect();
    assert_eq!(endpoints, vec![json!("/list_keys"), json!("/set"), json!("/logs"), json!("/logs")]);

    assert_eq!(logs[0]["api_key"], json!("user****"));
    assert_eq!(logs[0]["user_id"], json!("config:user"));
    assert_eq!(logs[3]["user_id"], json!("config:admin"));
    assert!(logs.iter().all(|e| !e["api_key"].as_str().unwrap().contains("secret")));
}

#[tokio::test]
async fn health_is_public() {
    let (app, _) = app();
    post(&app, "/set", json!({"key": "a", "value": "1"})).await;

    let (status, body) = call(&app, Method::GET, "/health", None, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], json!("ok"));
    assert_eq!(body["keys"], json!(1));
    assert_eq!(body["queues"], json!(0));
    assert!(body["version"].is_string());
}
