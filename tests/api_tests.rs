use axum::{
    Router,
    body::Body,
    http::{Request, StatusCode, header},
    response::Response,
};
use http_body_util::BodyExt;
use tower::ServiceExt;

use alumnet::config::Config;

/// Router plus a cookie jar of one: the session cookie issued by the server
/// is carried into every subsequent request, like a browser would.
struct TestApp {
    router: Router,
    cookie: Option<String>,
}

impl TestApp {
    async fn new() -> Self {
        let mut config = Config::default();
        config.general.database_path = "sqlite::memory:".to_string();
        // Cheap Argon2 params keep the suite fast; strength is not under test.
        config.security.argon2_memory_cost_kib = 1024;
        config.security.argon2_time_cost = 1;

        let state = alumnet::api::create_app_state_from_config(config)
            .await
            .expect("Failed to create app state");

        Self {
            router: alumnet::api::router(state).await,
            cookie: None,
        }
    }

    async fn request(&mut self, method: &str, uri: &str, form_body: Option<String>) -> Response {
        let mut builder = Request::builder().method(method).uri(uri);

        if let Some(cookie) = &self.cookie {
            builder = builder.header(header::COOKIE, cookie);
        }

        let request = match form_body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
                .body(Body::from(body))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();

        if let Some(set_cookie) = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
        {
            self.cookie = Some(set_cookie.to_string());
        }

        response
    }

    async fn get(&mut self, uri: &str) -> Response {
        self.request("GET", uri, None).await
    }

    async fn post_form(&mut self, uri: &str, pairs: &[(&str, &str)]) -> Response {
        self.request("POST", uri, Some(encode_form(pairs))).await
    }

    /// Register and log in one member, leaving the session in the jar.
    async fn login_as(&mut self, name: &str, email: &str, password: &str) {
        let response = self
            .post_form(
                "/register",
                &[("name", name), ("email", email), ("password", password)],
            )
            .await;
        assert_redirect(&response, "/login");

        let response = self
            .post_form("/login", &[("email", email), ("password", password)])
            .await;
        assert_redirect(&response, "/dashboard");
    }
}

fn encode_form(pairs: &[(&str, &str)]) -> String {
    pairs
        .iter()
        .map(|(k, v)| format!("{}={}", k, urlencoding::encode(v)))
        .collect::<Vec<_>>()
        .join("&")
}

fn location(response: &Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
}

fn assert_redirect(response: &Response, expected: &str) {
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(response), expected);
}

async fn json_body(response: Response) -> serde_json::Value {
    let body = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&body).unwrap()
}

#[tokio::test]
async fn test_health_probes() {
    let mut app = TestApp::new().await;

    let response = app.get("/health/live").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["status"], "alive");

    let response = app.get("/health/ready").await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"]["ready"], true);
    assert_eq!(body["data"]["checks"]["database"], true);
}

#[tokio::test]
async fn test_register_rejects_duplicate_email() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Alice"),
                ("email", "a@x.com"),
                ("password", "pw123"),
                ("year", "2015"),
                ("company", "Acme"),
            ],
        )
        .await;
    assert_redirect(&response, "/login");

    // Same address with different casing: normalization makes it a duplicate.
    let response = app
        .post_form(
            "/register",
            &[
                ("name", "Alice Again"),
                ("email", "A@X.com"),
                ("password", "other"),
            ],
        )
        .await;
    assert_redirect(&response, "/login");

    let body = json_body(app.get("/login").await).await;
    assert_eq!(body["message"], "Email already registered. Please login.");

    let body = json_body(app.get("/search?q=Alice").await).await;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_register_requires_all_fields() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form(
            "/register",
            &[("name", "   "), ("email", "b@x.com"), ("password", "pw")],
        )
        .await;
    assert_redirect(&response, "/register");

    let body = json_body(app.get("/register").await).await;
    assert_eq!(body["message"], "Name, email and password are required");

    // The rejected registration must not leave a partial write behind.
    let response = app
        .post_form("/login", &[("email", "b@x.com"), ("password", "pw")])
        .await;
    assert_redirect(&response, "/login");
}

#[tokio::test]
async fn test_login_failure_is_generic() {
    let mut app = TestApp::new().await;

    app.post_form(
        "/register",
        &[
            ("name", "Alice"),
            ("email", "a@x.com"),
            ("password", "pw123"),
        ],
    )
    .await;

    // Known email, wrong password.
    let response = app
        .post_form("/login", &[("email", "a@x.com"), ("password", "wrong")])
        .await;
    assert_redirect(&response, "/login");
    let body = json_body(app.get("/login").await).await;
    assert_eq!(body["message"], "Invalid credentials");

    // Unknown email: exactly the same message.
    let response = app
        .post_form("/login", &[("email", "nobody@x.com"), ("password", "pw123")])
        .await;
    assert_redirect(&response, "/login");
    let body = json_body(app.get("/login").await).await;
    assert_eq!(body["message"], "Invalid credentials");

    // No session was established either way.
    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));
}

#[tokio::test]
async fn test_guarded_routes_redirect_without_mutation() {
    let mut app = TestApp::new().await;

    let response = app
        .post_form("/create_post", &[("title", "Hi"), ("body", "Body")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fcreate_post");

    let response = app
        .post_form(
            "/create_event",
            &[
                ("title", "Meetup"),
                ("description", "Annual"),
                ("date", "2026-09-01"),
            ],
        )
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));

    let response = app.post_form("/rsvp/1", &[]).await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));

    let response = app
        .post_form("/mentorship", &[("topic", "Careers"), ("role", "mentor")])
        .await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));

    // Nothing was written.
    let body = json_body(app.get("/posts").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
    let body = json_body(app.get("/events").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_register_login_post_dashboard_flow() {
    let mut app = TestApp::new().await;

    app.login_as("Alice", "a@x.com", "pw123").await;

    let response = app
        .post_form("/create_post", &[("title", "Hi"), ("body", "Body")])
        .await;
    assert_redirect(&response, "/dashboard");

    let body = json_body(app.get("/dashboard").await).await;
    assert_eq!(body["message"], "Post created");
    assert_eq!(body["data"]["user"]["name"], "Alice");

    let posts = body["data"]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 1);
    assert_eq!(posts[0]["title"], "Hi");
}

#[tokio::test]
async fn test_dashboard_posts_are_most_recent_first() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    app.post_form("/create_post", &[("title", "First"), ("body", "one")])
        .await;
    app.post_form("/create_post", &[("title", "Second"), ("body", "two")])
        .await;

    let body = json_body(app.get("/dashboard").await).await;
    let posts = body["data"]["posts"].as_array().unwrap();
    assert_eq!(posts.len(), 2);
    assert_eq!(posts[0]["title"], "Second");
    assert_eq!(posts[1]["title"], "First");

    // The public feed carries the author name.
    let body = json_body(app.get("/posts").await).await;
    let posts = body["data"].as_array().unwrap();
    assert_eq!(posts[0]["author_name"], "Alice");
}

#[tokio::test]
async fn test_rsvp_is_idempotent_per_member() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    let response = app
        .post_form(
            "/create_event",
            &[
                ("title", "Reunion"),
                ("description", "Class of 2015"),
                ("date", "2026-09-01"),
                ("location", "Main Hall"),
            ],
        )
        .await;
    assert_redirect(&response, "/dashboard");

    let body = json_body(app.get("/events").await).await;
    let event_id = body["data"][0]["id"].as_i64().unwrap();

    let response = app.post_form(&format!("/rsvp/{event_id}"), &[]).await;
    assert_redirect(&response, "/events");

    // Second RSVP for the same pair: informational no-op.
    let response = app.post_form(&format!("/rsvp/{event_id}"), &[]).await;
    assert_redirect(&response, "/events");

    let body = json_body(app.get("/events").await).await;
    assert_eq!(body["message"], "You have already RSVPed");
    assert_eq!(body["data"][0]["rsvp_count"], 1);

    // A second member gets their own RSVP.
    app.get("/logout").await;
    app.login_as("Bob", "b@x.com", "pw456").await;
    let response = app.post_form(&format!("/rsvp/{event_id}"), &[]).await;
    assert_redirect(&response, "/events");

    let body = json_body(app.get("/events").await).await;
    assert_eq!(body["data"][0]["rsvp_count"], 2);
}

#[tokio::test]
async fn test_rsvp_unknown_event_recovers_locally() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    let response = app.post_form("/rsvp/999", &[]).await;
    assert_redirect(&response, "/events");

    let body = json_body(app.get("/events").await).await;
    assert_eq!(body["message"], "Event not found");
    assert_eq!(body["data"].as_array().unwrap().len(), 0);
}

#[tokio::test]
async fn test_search_semantics() {
    let mut app = TestApp::new().await;

    app.post_form(
        "/register",
        &[
            ("name", "Alice"),
            ("email", "a@x.com"),
            ("password", "pw123"),
            ("year", "2015"),
            ("company", "Acme"),
        ],
    )
    .await;

    // Blank query: empty result set, not "match everything".
    let body = json_body(app.get("/search?q=").await).await;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 0);
    let body = json_body(app.get("/search?q=%20%20").await).await;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 0);

    // No match.
    let body = json_body(app.get("/search?q=zzz").await).await;
    assert_eq!(body["data"]["members"].as_array().unwrap().len(), 0);

    // Case-insensitive substring over name, company and year.
    for q in ["ALI", "acme", "2015"] {
        let body = json_body(app.get(&format!("/search?q={q}")).await).await;
        let members = body["data"]["members"].as_array().unwrap();
        assert_eq!(members.len(), 1, "query {q:?} should match");
        assert_eq!(members[0]["name"], "Alice");
    }
}

#[tokio::test]
async fn test_profile_lookup() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    let body = json_body(app.get("/dashboard").await).await;
    let user_id = body["data"]["user"]["id"].as_i64().unwrap();

    let body = json_body(app.get(&format!("/profile/{user_id}")).await).await;
    assert_eq!(body["data"]["name"], "Alice");
    assert_eq!(body["data"]["email"], "a@x.com");

    // Unknown member: back to the landing view with a message.
    let response = app.get("/profile/999").await;
    assert_redirect(&response, "/");
    let body = json_body(app.get("/").await).await;
    assert_eq!(body["message"], "User not found");
}

#[tokio::test]
async fn test_home_excerpts_are_capped() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    for i in 0..8 {
        app.post_form(
            "/create_post",
            &[("title", format!("Post {i}").as_str()), ("body", "text")],
        )
        .await;
        app.post_form(
            "/create_event",
            &[
                ("title", format!("Event {i}").as_str()),
                ("description", "desc"),
                ("date", format!("2026-09-{:02}", i + 1).as_str()),
            ],
        )
        .await;
    }

    let body = json_body(app.get("/").await).await;
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 6);
    assert_eq!(body["data"]["posts"][0]["title"], "Post 7");

    let body = json_body(app.get("/dashboard").await).await;
    assert_eq!(body["data"]["events"].as_array().unwrap().len(), 5);
    assert_eq!(body["data"]["posts"].as_array().unwrap().len(), 8);

    // Full listings are uncapped.
    let body = json_body(app.get("/posts").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 8);
    let body = json_body(app.get("/events").await).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 8);
}

#[tokio::test]
async fn test_mentorship_board() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    let response = app
        .post_form("/mentorship", &[("topic", "Careers"), ("role", "mentor")])
        .await;
    assert_redirect(&response, "/mentorship");

    let response = app
        .post_form("/mentorship", &[("topic", "Resumes"), ("role", "mentee")])
        .await;
    assert_redirect(&response, "/mentorship");

    // Invalid role is rejected without a write.
    let response = app
        .post_form("/mentorship", &[("topic", "Intros"), ("role", "wizard")])
        .await;
    assert_redirect(&response, "/mentorship");

    let body = json_body(app.get("/mentorship").await).await;
    let mentors = body["data"]["mentors"].as_array().unwrap();
    let mentees = body["data"]["mentees"].as_array().unwrap();
    assert_eq!(mentors.len(), 1);
    assert_eq!(mentors[0]["topic"], "Careers");
    assert_eq!(mentors[0]["member_name"], "Alice");
    assert_eq!(mentees.len(), 1);
    assert_eq!(mentees[0]["topic"], "Resumes");
}

#[tokio::test]
async fn test_login_resumes_preserved_destination() {
    let mut app = TestApp::new().await;

    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert_eq!(location(&response), "/login?next=%2Fdashboard");

    app.post_form(
        "/register",
        &[
            ("name", "Alice"),
            ("email", "a@x.com"),
            ("password", "pw123"),
        ],
    )
    .await;

    let response = app
        .post_form(
            "/login",
            &[
                ("email", "a@x.com"),
                ("password", "pw123"),
                ("next", "/mentorship"),
            ],
        )
        .await;
    assert_redirect(&response, "/mentorship");

    // Off-site resume targets are ignored.
    app.get("/logout").await;
    let response = app
        .post_form(
            "/login",
            &[
                ("email", "a@x.com"),
                ("password", "pw123"),
                ("next", "https://evil.example"),
            ],
        )
        .await;
    assert_redirect(&response, "/dashboard");
}

#[tokio::test]
async fn test_logout_invalidates_session() {
    let mut app = TestApp::new().await;
    app.login_as("Alice", "a@x.com", "pw123").await;

    let response = app.get("/logout").await;
    assert_redirect(&response, "/");

    let body = json_body(app.get("/").await).await;
    assert_eq!(body["message"], "Logged out");

    let response = app.get("/dashboard").await;
    assert_eq!(response.status(), StatusCode::SEE_OTHER);
    assert!(location(&response).starts_with("/login?next="));
}
