//! インメモリモックで組み立てたアプリケーション
//!
//! [`build_app`] に本番と同じ配線でモックを渡し、`oneshot` でリクエストを送る。
//!
//! ```ignore
//! let app = TestApp::new();
//! let user = UserId::new();
//! let course_id = app.create_course(&user, "Algorithms").await;
//! let (status, body) = app.send(Method::GET, "/courses", Some(&user), None).await;
//! ```

use std::sync::Arc;

use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use chrono::Duration;
use courseworker_domain::{clock::SystemClock, user::UserId};
use courseworker_infra::{
    JwtTokenIssuer,
    TokenIssuer,
    mock::{MockCacheStore, MockConfirmationMailer, MockDatabase, MockPasswordHasher},
};
use tower::ServiceExt;

use crate::app_builder::{AppDependencies, build_app};

/// 確認リンクの公開 URL
pub const BASE_URL: &str = "http://localhost:8000";

const JWT_SECRET: &str = "test-secret";

/// テスト用アプリケーションと観測用のモック
pub struct TestApp {
    pub db:     MockDatabase,
    pub cache:  MockCacheStore,
    pub mailer: MockConfirmationMailer,
    pub tokens: Arc<JwtTokenIssuer>,
    router:     Router,
}

impl Default for TestApp {
    fn default() -> Self {
        Self::new()
    }
}

impl TestApp {
    pub fn new() -> Self {
        let db = MockDatabase::new();
        let cache = MockCacheStore::new();
        let mailer = MockConfirmationMailer::new();
        let tokens = Arc::new(JwtTokenIssuer::new(
            JWT_SECRET,
            Duration::hours(3),
            Arc::new(SystemClock),
        ));

        let router = build_app(AppDependencies {
            users:    Arc::new(db.clone()),
            courses:  Arc::new(db.clone()),
            tasks:    Arc::new(db.clone()),
            owners:   Arc::new(db.clone()),
            cache:    Arc::new(cache.clone()),
            hasher:   Arc::new(MockPasswordHasher),
            tokens:   tokens.clone(),
            mailer:   Arc::new(mailer.clone()),
            clock:    Arc::new(SystemClock),
            base_url: BASE_URL.to_string(),
        });

        Self {
            db,
            cache,
            mailer,
            tokens,
            router,
        }
    }

    /// リクエストを送り、ステータスと JSON ボディを返す
    ///
    /// `user` を指定するとそのユーザーのアクセストークンを付ける。
    /// ボディが空の場合は `Value::Null` を返す。
    pub async fn send(
        &self,
        method: Method,
        path: &str,
        user: Option<&UserId>,
        body: Option<serde_json::Value>,
    ) -> (StatusCode, serde_json::Value) {
        let mut builder = Request::builder().method(method).uri(path);
        if let Some(user) = user {
            let token = self.tokens.issue_access(user).unwrap();
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        let json = if bytes.is_empty() {
            serde_json::Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, json)
    }

    /// API 経由で講座を作成し、採番された ID を返す
    pub async fn create_course(&self, user: &UserId, name: &str) -> i64 {
        let (status, body) = self
            .send(
                Method::POST,
                "/courses",
                Some(user),
                Some(serde_json::json!({ "name": name })),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "講座の作成に失敗: {body}");
        body["data"]["id"].as_i64().unwrap()
    }
}
