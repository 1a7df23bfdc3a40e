//! # リクエストコンテキスト
//!
//! HTTP メソッドとパスを task-local に保存する。
//!
//! エラー変換器（[`crate::error::render`]）はハンドラの戻り値から呼ばれるため、
//! リクエスト本体にアクセスできない。ログに必要なメソッドとパスは
//! このミドルウェアが保存した値から取り出す。

use std::future::Future;

use axum::{body::Body, http::Request, middleware::Next, response::Response};

tokio::task_local! {
    static REQUEST_CONTEXT: RequestContext;
}

/// エラーログに載せるリクエスト情報
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    pub method: String,
    pub path:   String,
}

impl RequestContext {
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path:   path.into(),
        }
    }

    /// 現在のリクエストのコンテキストを取得する
    ///
    /// task-local スコープ外（テスト等）では `-` で埋めた値を返す。
    pub fn current() -> Self {
        REQUEST_CONTEXT
            .try_with(Clone::clone)
            .unwrap_or_else(|_| Self::new("-", "-"))
    }

    /// このコンテキストを task-local に設定して `f` を実行する
    pub async fn scope<F: Future>(self, f: F) -> F::Output {
        REQUEST_CONTEXT.scope(self, f).await
    }
}

/// リクエストコンテキストを task-local に保存するミドルウェア
pub async fn store_request_context(request: Request<Body>, next: Next) -> Response {
    let context = RequestContext::new(request.method().as_str(), request.uri().path());
    context.scope(next.run(request)).await
}

#[cfg(test)]
mod tests {
    use axum::{Router, http::StatusCode, middleware::from_fn, routing::get};
    use pretty_assertions::assert_eq;
    use tower::ServiceExt;

    use super::*;

    #[test]
    fn test_スコープ外では未設定の値を返す() {
        assert_eq!(RequestContext::current(), RequestContext::new("-", "-"));
    }

    #[tokio::test]
    async fn test_スコープ内では設定した値を返す() {
        let context = RequestContext::new("GET", "/courses/42");

        let result = context.clone().scope(async { RequestContext::current() }).await;

        assert_eq!(result, context);
    }

    #[tokio::test]
    async fn test_ミドルウェアがメソッドとパスを保存する() {
        // Given
        async fn echo() -> String {
            let context = RequestContext::current();
            format!("{} {}", context.method, context.path)
        }
        let sut = Router::new()
            .route("/courses/{course_id}", get(echo))
            .layer(from_fn(store_request_context));

        // When
        let response = sut
            .oneshot(
                Request::builder()
                    .uri("/courses/42?verbose=true")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();

        // Then
        assert_eq!(response.status(), StatusCode::OK);
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        assert_eq!(&body[..], b"GET /courses/42");
    }
}
