use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use serde_json::{json, Value};
use tower::ServiceExt;
use uuid::Uuid;

use crate::database::MemoryStore;
use crate::{app, AppState};

/// Router wired to a fresh in-memory store, driven without a socket
pub struct TestContext {
    app: Router,
}

#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub username: String,
    pub token: String,
}

impl TestContext {
    pub fn new() -> Self {
        let store = Arc::new(MemoryStore::new());
        Self {
            app: app(AppState::new(store)),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        token: Option<&str>,
        body: Option<Value>,
    ) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let body = match body {
            Some(value) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(value.to_string())
            }
            None => Body::empty(),
        };

        let response = self
            .app
            .clone()
            .oneshot(builder.body(body).unwrap())
            .await
            .unwrap();

        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let value = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
        (status, value)
    }

    /// Register a user with a unique name and return its token and id
    pub async fn register_user(&self, prefix: &str) -> TestUser {
        let username = format!("{}_{}", prefix, Uuid::new_v4().simple());
        let (status, body) = self
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "username": username, "password": "somepassword1" })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);

        let token = body["data"]["token"].as_str().unwrap().to_string();
        let id = crate::auth::validate_jwt(&token).unwrap().sub;
        TestUser { id, username, token }
    }

    pub async fn create_portfolio(&self, user: &TestUser, funds: Value) -> (StatusCode, Value) {
        self.request(
            Method::POST,
            "/portfolios",
            Some(&user.token),
            Some(json!({ "name": "SomePortfolio", "funds": funds })),
        )
        .await
    }
}

fn vti_vxus(a: &str, b: &str) -> Value {
    json!([
        { "symbol": "VTI", "portfolioPercentage": a },
        { "symbol": "VXUS", "portfolioPercentage": b }
    ])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn health_and_root_are_public() {
        let ctx = TestContext::new();

        let (status, body) = ctx.request(Method::GET, "/health", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["status"], "ok");

        let (status, body) = ctx.request(Method::GET, "/", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Folio API");
    }

    #[tokio::test]
    async fn register_then_login() {
        let ctx = TestContext::new();
        let user = ctx.register_user("testuser").await;

        let (status, body) = ctx
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": user.username, "password": "somepassword1" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["auth"], true);

        let token = body["data"]["token"].as_str().unwrap();
        assert_eq!(crate::auth::validate_jwt(token).unwrap().sub, user.id);
    }

    #[tokio::test]
    async fn register_requires_username_and_password() {
        let ctx = TestContext::new();
        let (status, body) = ctx
            .request(Method::POST, "/auth/register", None, Some(json!({ "username": "x" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Incomplete request");

        let (status, _) = ctx
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({ "username": "", "password": "p" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn duplicate_registration_conflicts() {
        let ctx = TestContext::new();
        let payload = json!({
            "username": "testuser1",
            "password": "somepassword1",
            "email": "testuser1@email.com"
        });
        let (status, _) = ctx
            .request(Method::POST, "/auth/register", None, Some(payload.clone()))
            .await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, body) = ctx
            .request(Method::POST, "/auth/register", None, Some(payload))
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "User already exists");

        // Same email, different username
        let (status, _) = ctx
            .request(
                Method::POST,
                "/auth/register",
                None,
                Some(json!({
                    "username": "testuser2",
                    "password": "p",
                    "email": "testuser1@email.com"
                })),
            )
            .await;
        assert_eq!(status, StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn login_failures() {
        let ctx = TestContext::new();
        let user = ctx.register_user("testuser").await;

        let (status, _) = ctx
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": "nobody", "password": "x" })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, body) = ctx
            .request(
                Method::POST,
                "/auth/login",
                None,
                Some(json!({ "username": user.username, "password": "wrong" })),
            )
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);

        let (status, _) = ctx
            .request(Method::POST, "/auth/login", None, Some(json!({ "password": "x" })))
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn protected_routes_require_token() {
        let ctx = TestContext::new();
        for uri in ["/users", "/portfolios"] {
            let (status, body) = ctx.request(Method::GET, uri, None, None).await;
            assert_eq!(status, StatusCode::UNAUTHORIZED, "{}", uri);
            assert_eq!(body["code"], "UNAUTHORIZED");
        }

        let (status, _) = ctx
            .request(Method::GET, "/users", Some("not-a-jwt"), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn users_are_listed_without_passwords() {
        let ctx = TestContext::new();
        let user = ctx.register_user("testuser").await;
        ctx.register_user("other").await;

        let (status, body) = ctx.request(Method::GET, "/users", Some(&user.token), None).await;
        assert_eq!(status, StatusCode::OK);
        let users = body["data"].as_array().unwrap();
        assert_eq!(users.len(), 2);
        assert!(users.iter().all(|u| u.get("password").is_none()));
    }

    #[tokio::test]
    async fn users_may_only_read_themselves() {
        let ctx = TestContext::new();
        let user = ctx.register_user("testuser").await;
        let other = ctx.register_user("other").await;

        let (status, body) = ctx
            .request(Method::GET, &format!("/users/{}", user.id), Some(&user.token), None)
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["username"], user.username.as_str());

        let (status, body) = ctx
            .request(Method::GET, &format!("/users/{}", other.id), Some(&user.token), None)
            .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"], "Not authorized");

        let (status, _) = ctx
            .request(Method::GET, "/users/not-a-uuid", Some(&user.token), None)
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_user_returns_removed_record() {
        let ctx = TestContext::new();
        let user = ctx.register_user("testuser").await;
        let uri = format!("/users/{}", user.id);

        let (status, body) = ctx.request(Method::DELETE, &uri, Some(&user.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], user.id.to_string());

        let (status, _) = ctx.request(Method::DELETE, &uri, Some(&user.token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn create_portfolio_enforces_allocation() {
        let ctx = TestContext::new();
        let user = ctx.register_user("investor").await;

        let (status, body) = ctx.create_portfolio(&user, vti_vxus("90", "10")).await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(body["data"]["user"], user.id.to_string());
        assert_eq!(body["data"]["funds"][0]["portfolioPercentage"], "90");

        let (status, body) = ctx.create_portfolio(&user, vti_vxus("80", "10")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["code"], "VALIDATION_ERROR");

        let (status, _) = ctx.create_portfolio(&user, json!([])).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = ctx.create_portfolio(&user, vti_vxus("100", "abc")).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = ctx
            .request(
                Method::POST,
                "/portfolios",
                Some(&user.token),
                Some(json!({ "name": "NoFunds" })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"], "Incomplete request");
    }

    #[tokio::test]
    async fn portfolios_are_listed_for_current_user() {
        let ctx = TestContext::new();
        let user = ctx.register_user("investor").await;
        let other = ctx.register_user("other").await;

        ctx.create_portfolio(&user, vti_vxus("92", "8")).await;
        ctx.create_portfolio(&user, vti_vxus("50", "50")).await;
        ctx.create_portfolio(&other, vti_vxus("70", "30")).await;

        let (status, body) = ctx.request(Method::GET, "/portfolios", Some(&user.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"].as_array().unwrap().len(), 2);

        let (_, body) = ctx
            .request(Method::GET, &format!("/users/{}", user.id), Some(&user.token), None)
            .await;
        assert_eq!(body["data"]["portfolios"].as_array().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn update_portfolio_checks_funds_only_when_present() {
        let ctx = TestContext::new();
        let user = ctx.register_user("investor").await;
        let (_, created) = ctx.create_portfolio(&user, vti_vxus("80", "20")).await;
        let uri = format!("/portfolios/{}", created["data"]["id"].as_str().unwrap());

        let (status, body) = ctx
            .request(
                Method::PUT,
                &uri,
                Some(&user.token),
                Some(json!({ "updatedFields": { "name": "Renamed" } })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["name"], "Renamed");
        assert_eq!(body["data"]["funds"][0]["portfolioPercentage"], "80");

        let (status, _) = ctx
            .request(
                Method::PUT,
                &uri,
                Some(&user.token),
                Some(json!({ "updatedFields": { "funds": vti_vxus("60", "30") } })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, _) = ctx
            .request(
                Method::PUT,
                &uri,
                Some(&user.token),
                Some(json!({ "updatedFields": { "funds": [] } })),
            )
            .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = ctx
            .request(
                Method::PUT,
                &uri,
                Some(&user.token),
                Some(json!({ "updatedFields": { "funds": vti_vxus("60", "40") } })),
            )
            .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["funds"][1]["portfolioPercentage"], "40");
        assert_eq!(body["data"]["name"], "Renamed");
    }

    #[tokio::test]
    async fn mistyped_bodies_are_json_bad_requests() {
        let ctx = TestContext::new();
        let user = ctx.register_user("investor").await;
        let (_, created) = ctx.create_portfolio(&user, vti_vxus("80", "20")).await;
        let uri = format!("/portfolios/{}", created["data"]["id"].as_str().unwrap());

        let cases = [
            (
                Method::POST,
                "/portfolios".to_string(),
                json!({ "name": "Numeric", "funds": [{ "symbol": "VTI", "portfolioPercentage": 100 }] }),
            ),
            (Method::PUT, uri.clone(), json!({ "updatedFields": { "funds": "oops" } })),
            (Method::POST, "/auth/register".to_string(), json!({ "username": 5 })),
            (Method::POST, "/auth/login".to_string(), json!({ "password": ["x"] })),
        ];

        for (method, uri, body) in cases {
            let (status, response) = ctx.request(method, &uri, Some(&user.token), Some(body)).await;
            assert_eq!(status, StatusCode::BAD_REQUEST, "{} {}", uri, response);
            assert_eq!(response["success"], false);
            assert_eq!(response["code"], "INVALID_JSON");
        }

        // Rejected update left the portfolio untouched
        let (_, body) = ctx.request(Method::GET, &uri, Some(&user.token), None).await;
        assert_eq!(body["data"]["funds"], created["data"]["funds"]);
    }

    #[tokio::test]
    async fn get_and_delete_portfolio() {
        let ctx = TestContext::new();
        let user = ctx.register_user("investor").await;
        let (_, created) = ctx.create_portfolio(&user, vti_vxus("80", "20")).await;
        let uri = format!("/portfolios/{}", created["data"]["id"].as_str().unwrap());

        let (status, body) = ctx.request(Method::GET, &uri, Some(&user.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"], created["data"]);

        let (status, body) = ctx.request(Method::DELETE, &uri, Some(&user.token), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["data"]["id"], created["data"]["id"]);

        let (status, _) = ctx.request(Method::GET, &uri, Some(&user.token), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND);

        let (status, _) = ctx
            .request(
                Method::PUT,
                &uri,
                Some(&user.token),
                Some(json!({ "updatedFields": { "name": "Gone" } })),
            )
            .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }
}
