use axum::Router;
use axum::body::Body;
use axum::http::{Request, StatusCode, header};
use axum::response::Response;
use http_body_util::BodyExt;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use chirpy_api::auth::TokenService;
use chirpy_api::{AppState, AppStateInner, build_router};
use chirpy_db::Database;

const POLKA_KEY: &str = "polka-test-key";

struct TestApp {
    _dir: TempDir,
    state: AppState,
    router: Router,
}

fn setup() -> TestApp {
    let dir = TempDir::new().unwrap();
    let static_dir = dir.path().join("static");
    std::fs::create_dir(&static_dir).unwrap();
    std::fs::write(static_dir.join("index.html"), "<h1>Welcome to Chirpy</h1>").unwrap();

    let db = Database::open(&dir.path().join("database.json")).unwrap();
    let state = AppStateInner::new(db, TokenService::new("test-secret"), POLKA_KEY.to_string());
    let router = build_router(state.clone(), &static_dir);

    TestApp {
        _dir: dir,
        state,
        router,
    }
}

fn json_request(method: &str, uri: &str, auth: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

fn empty_request(method: &str, uri: &str, auth: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(auth) = auth {
        builder = builder.header(header::AUTHORIZATION, auth);
    }
    builder.body(Body::empty()).unwrap()
}

async fn send(app: &TestApp, req: Request<Body>) -> Response {
    app.router.clone().oneshot(req).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

async fn body_text(response: Response) -> String {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Register and log in; returns (user id, access token, refresh token).
async fn signup(app: &TestApp, email: &str, password: &str) -> (u64, String, String) {
    let res = send(
        app,
        json_request(
            "POST",
            "/api/users",
            None,
            json!({"email": email, "password": password}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);

    let res = send(
        app,
        json_request(
            "POST",
            "/api/login",
            None,
            json!({"email": email, "password": password}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    let body = body_json(res).await;
    (
        body["id"].as_u64().unwrap(),
        body["token"].as_str().unwrap().to_string(),
        body["refresh_token"].as_str().unwrap().to_string(),
    )
}

fn bearer(token: &str) -> String {
    format!("Bearer {token}")
}

#[tokio::test]
async fn healthz_reports_ok() {
    let app = setup();
    let res = send(&app, empty_request("GET", "/api/healthz", None)).await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(body_text(res).await, "OK");
}

#[tokio::test]
async fn static_hits_are_counted_and_reset() {
    let app = setup();

    for _ in 0..2 {
        let res = send(&app, empty_request("GET", "/app/index.html", None)).await;
        assert_eq!(res.status(), StatusCode::OK);
    }
    // API traffic does not count.
    send(&app, empty_request("GET", "/api/healthz", None)).await;

    let res = send(&app, empty_request("GET", "/admin/metrics", None)).await;
    assert!(body_text(res).await.contains("visited 2 times"));

    let res = send(&app, empty_request("POST", "/api/reset", None)).await;
    assert_eq!(body_text(res).await, "Hits: 0");
    assert_eq!(app.state.metrics.hits(), 0);
}

#[tokio::test]
async fn create_user_rejects_duplicates() {
    let app = setup();

    let res = send(
        &app,
        json_request("POST", "/api/users", None, json!({"email": "a@x.com", "password": "p"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let body = body_json(res).await;
    assert_eq!(body, json!({"id": 1, "email": "a@x.com", "is_chirpy_red": false}));

    let res = send(
        &app,
        json_request("POST", "/api/users", None, json!({"email": "A@X.COM", "password": "q"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn login_with_wrong_password_is_unauthorized() {
    let app = setup();
    signup(&app, "a@x.com", "right").await;

    let res = send(
        &app,
        json_request("POST", "/api/login", None, json!({"email": "a@x.com", "password": "wrong"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn chirp_lifecycle() {
    let app = setup();
    let (user_id, token, _) = signup(&app, "a@x.com", "pw").await;

    let res = send(
        &app,
        json_request(
            "POST",
            "/api/chirps",
            Some(&bearer(&token)),
            json!({"body": "kerfuffle is fun"}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::CREATED);
    let chirp = body_json(res).await;
    assert_eq!(chirp, json!({"id": 1, "body": "**** is fun", "author_id": user_id}));

    let res = send(&app, empty_request("GET", "/api/chirps/1", None)).await;
    assert_eq!(res.status(), StatusCode::OK);

    let res = send(&app, empty_request("DELETE", "/api/chirps/1", Some(&bearer(&token)))).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(&app, empty_request("GET", "/api/chirps/1", None)).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn chirp_requires_valid_token_and_length() {
    let app = setup();
    let (_, token, _) = signup(&app, "a@x.com", "pw").await;

    let res = send(
        &app,
        json_request("POST", "/api/chirps", None, json!({"body": "hi"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &app,
        json_request("POST", "/api/chirps", Some("Bearer not-a-jwt"), json!({"body": "hi"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &app,
        json_request(
            "POST",
            "/api/chirps",
            Some(&bearer(&token)),
            json!({"body": "x".repeat(141)}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn list_chirps_filters_and_sorts() {
    let app = setup();
    let (alice, alice_token, _) = signup(&app, "alice@x.com", "pw").await;
    let (_, bob_token, _) = signup(&app, "bob@x.com", "pw").await;

    for (token, body) in [(&alice_token, "one"), (&bob_token, "two"), (&alice_token, "three")] {
        let res = send(
            &app,
            json_request("POST", "/api/chirps", Some(&bearer(token)), json!({"body": body})),
        )
        .await;
        assert_eq!(res.status(), StatusCode::CREATED);
    }

    let ids = |v: Value| -> Vec<u64> {
        v.as_array()
            .unwrap()
            .iter()
            .map(|c| c["id"].as_u64().unwrap())
            .collect()
    };

    let res = send(&app, empty_request("GET", "/api/chirps", None)).await;
    assert_eq!(ids(body_json(res).await), [1, 2, 3]);

    let res = send(&app, empty_request("GET", "/api/chirps?sort=desc", None)).await;
    assert_eq!(ids(body_json(res).await), [3, 2, 1]);

    let uri = format!("/api/chirps?author_id={alice}&sort=desc");
    let res = send(&app, empty_request("GET", &uri, None)).await;
    assert_eq!(ids(body_json(res).await), [3, 1]);

    let res = send(&app, empty_request("GET", "/api/chirps?sort=sideways", None)).await;
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn only_author_can_delete() {
    let app = setup();
    let (_, alice_token, _) = signup(&app, "alice@x.com", "pw").await;
    let (_, bob_token, _) = signup(&app, "bob@x.com", "pw").await;

    send(
        &app,
        json_request("POST", "/api/chirps", Some(&bearer(&alice_token)), json!({"body": "mine"})),
    )
    .await;

    let res = send(&app, empty_request("DELETE", "/api/chirps/1", Some(&bearer(&bob_token)))).await;
    assert_eq!(res.status(), StatusCode::FORBIDDEN);

    let res = send(&app, empty_request("DELETE", "/api/chirps/9", Some(&bearer(&bob_token)))).await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn refresh_and_revoke() {
    let app = setup();
    let (user_id, _, refresh_token) = signup(&app, "a@x.com", "pw").await;

    let auth = bearer(&refresh_token);

    let res = send(&app, empty_request("POST", "/api/refresh", Some(&auth))).await;
    assert_eq!(res.status(), StatusCode::OK);
    let token = body_json(res).await["token"].as_str().unwrap().to_string();
    assert_eq!(app.state.tokens.verify(&token).unwrap(), user_id);

    let res = send(&app, empty_request("POST", "/api/revoke", Some(&auth))).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(&app, empty_request("POST", "/api/refresh", Some(&auth))).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Revoking an unknown token is not an error.
    let res = send(&app, empty_request("POST", "/api/revoke", Some("Bearer deadbeef"))).await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);
}

#[tokio::test]
async fn padded_email_logs_in_with_same_payload() {
    let app = setup();
    let creds = json!({"email": " a@x.com ", "password": "pw"});

    let res = send(&app, json_request("POST", "/api/users", None, creds.clone())).await;
    assert_eq!(res.status(), StatusCode::CREATED);
    assert_eq!(body_json(res).await["email"], json!("a@x.com"));

    let res = send(&app, json_request("POST", "/api/login", None, creds)).await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn update_user_changes_email() {
    let app = setup();
    let (user_id, token, _) = signup(&app, "a@x.com", "pw").await;

    let res = send(
        &app,
        json_request("PUT", "/api/users", Some(&bearer(&token)), json!({"email": "b@x.com"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
    assert_eq!(
        body_json(res).await,
        json!({"id": user_id, "email": "b@x.com", "is_chirpy_red": false})
    );

    let res = send(
        &app,
        json_request("POST", "/api/login", None, json!({"email": "b@x.com", "password": "pw"})),
    )
    .await;
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn webhook_upgrades_user() {
    let app = setup();
    let (user_id, _, _) = signup(&app, "a@x.com", "pw").await;
    let event = json!({"event": "user.upgraded", "data": {"user_id": user_id}});

    let res = send(&app, json_request("POST", "/api/polka/webhooks", None, event.clone())).await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = send(
        &app,
        json_request("POST", "/api/polka/webhooks", Some("ApiKey wrong"), event.clone()),
    )
    .await;
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let api_key = format!("ApiKey {POLKA_KEY}");
    let res = send(
        &app,
        json_request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key),
            json!({"event": "user.payment_failed", "data": {"user_id": user_id}}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(
        &app,
        json_request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key),
            json!({"event": "User.Upgraded", "data": {"user_id": user_id}}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NO_CONTENT);

    let res = send(
        &app,
        json_request(
            "POST",
            "/api/polka/webhooks",
            Some(&api_key),
            json!({"event": "user.upgraded", "data": {"user_id": 999}}),
        ),
    )
    .await;
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let res = send(
        &app,
        json_request("POST", "/api/login", None, json!({"email": "a@x.com", "password": "pw"})),
    )
    .await;
    assert_eq!(body_json(res).await["is_chirpy_red"], json!(true));
}
