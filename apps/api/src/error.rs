//! # エラーレスポンス変換
//!
//! ハンドラから返されたエラーを HTTP レスポンスに変換する唯一の場所。
//!
//! ## 設計方針
//!
//! - **単一の出口**: ハンドラは `Result<_, ApiError>` を返し、変換は [`render`] に集約する
//! - **対応表はここだけ**: [`Kind`] から HTTP ステータス・ログラベルへの対応はこのモジュールが持つ
//! - **5xx は内部情報を出さない**: レスポンスには相関 ID と kind だけを載せ、
//!   生のエラーメッセージはログにのみ出力する
//! - **相関 ID は変換ごとに採番**: UUID v7 をレスポンスとログの両方に載せる
//!
//! ## Kind とステータスの対応
//!
//! | Kind | ステータス | ラベル |
//! |------|-----------|-------|
//! | `NotExist` | 404 | `resource_not_found` |
//! | `Forbidden` | 403 | `forbidden` |
//! | `InvalidRequest` | 400 | `invalid_request` |
//! | `Database` | 500 | `database_error` |
//! | `Internal` | 500 | `internal_server_error` |
//! | `Exist` | 500 | `resource_already_exist` |
//! | `Validation` | 500 | `validation_error` |
//! | `Other` | 500 | `other_error` |

use std::error::Error as StdError;

use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use courseworker_domain::error::{BoxError, Kind, ProblemParam, find_problem, op_stack};
use courseworker_shared::{ErrorDetail, ErrorParam, ErrorResponse};
use uuid::Uuid;
use validator::ValidationErrors;

use crate::middleware::RequestContext;

/// 5xx レスポンスの detail（固定値）
pub const INTERNAL_ERROR_DETAIL: &str =
    "Internal server error has occurred - please contact support";

const INVALID_JSON_DETAIL: &str =
    "the request payload contains invalid JSON format - please correct it";
const TYPE_MISMATCH_DETAIL: &str = "the request payload contains type mismatch";
const FIELD_VALIDATION_DETAIL: &str = "The request body contains failed field validation";

/// ハンドラが返すエラー
///
/// 任意のエラーを保持し、[`render`] でレスポンスに変換する。
/// `Problem` でないエラーは「予期しないエラー」として扱われる。
#[derive(Debug)]
pub struct ApiError(BoxError);

impl ApiError {
    pub fn inner(&self) -> &(dyn StdError + Send + Sync + 'static) {
        self.0.as_ref()
    }
}

impl<E> From<E> for ApiError
where
    E: StdError + Send + Sync + 'static,
{
    fn from(err: E) -> Self {
        Self(Box::new(err))
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        render(&RequestContext::current(), self.0.as_ref())
    }
}

/// Kind → HTTP ステータス
pub fn status_for(kind: Kind) -> StatusCode {
    match kind {
        Kind::NotExist => StatusCode::NOT_FOUND,
        Kind::Forbidden => StatusCode::FORBIDDEN,
        Kind::InvalidRequest => StatusCode::BAD_REQUEST,
        Kind::Database | Kind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        Kind::Other | Kind::Exist | Kind::Validation => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// Kind → ログ・レスポンス用ラベル
pub fn kind_label(kind: Kind) -> &'static str {
    match kind {
        Kind::Other => "other_error",
        Kind::InvalidRequest => "invalid_request",
        Kind::Exist => "resource_already_exist",
        Kind::NotExist => "resource_not_found",
        Kind::Validation => "validation_error",
        Kind::Forbidden => "forbidden",
        Kind::Database => "database_error",
        Kind::Internal => "internal_server_error",
    }
}

/// エラーを HTTP レスポンスに変換する
///
/// エラーチェーン中の最初の `Problem` を探し、その kind でステータスを決める。
/// 変換のたびにエラーログを 1 件出力する。
pub fn render(context: &RequestContext, err: &(dyn StdError + 'static)) -> Response {
    let request_id = Uuid::now_v7().to_string();

    let Some(problem) = find_problem(err) else {
        tracing::error!(
            request_id = %request_id,
            status = StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
            method = %context.method,
            path = %context.path,
            stack = ?["unexpected error occurred"],
            kind = kind_label(Kind::Other),
            error = %err,
            "Unexpected error"
        );
        return (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse::new("Unexpected error", ErrorDetail::new(request_id))),
        )
            .into_response();
    };

    let kind = problem.kind();
    let status = status_for(kind);
    let label = kind_label(kind);
    let message = problem
        .title()
        .map(str::to_string)
        .unwrap_or_else(|| status.canonical_reason().unwrap_or("Error").to_string());
    let params = problem.params();

    tracing::error!(
        request_id = %request_id,
        status = status.as_u16(),
        method = %context.method,
        path = %context.path,
        stack = ?op_stack(err),
        kind = label,
        error = %err,
        params = ?params,
        "{message}"
    );

    let detail = if status.is_server_error() {
        ErrorDetail::new(request_id)
            .with_kind(label)
            .with_detail(INTERNAL_ERROR_DETAIL)
    } else {
        let text = problem
            .detail()
            .map(str::to_string)
            .unwrap_or_else(|| err.to_string());
        ErrorDetail::new(request_id)
            .with_kind(label)
            .with_detail(text)
            .with_params(params.iter().map(to_error_param))
    };

    (status, Json(ErrorResponse::new(message, detail))).into_response()
}

/// 認証失敗を 401 レスポンスに変換する
///
/// 認証ミドルウェアから呼ばれる。Problem を経由しないが、相関 ID の採番と
/// ログ出力は [`render`] と同じ形式で行う。
pub fn render_unauthorized(
    context: &RequestContext,
    message: &str,
    cause: Option<&(dyn StdError + 'static)>,
) -> Response {
    let request_id = Uuid::now_v7().to_string();
    let status = StatusCode::UNAUTHORIZED;

    tracing::warn!(
        request_id = %request_id,
        status = status.as_u16(),
        method = %context.method,
        path = %context.path,
        error = cause.map(tracing::field::display),
        "{message}"
    );

    (
        status,
        Json(ErrorResponse::new(message, ErrorDetail::new(request_id))),
    )
        .into_response()
}

fn to_error_param(param: &ProblemParam) -> ErrorParam {
    ErrorParam::new(param.name.clone(), param.reason.clone())
}

// ===== リクエストボディのバインド失敗 =====

/// リクエストボディのバインド失敗
///
/// | 失敗 | ステータス | kind |
/// |------|-----------|------|
/// | JSON 構文エラー / Content-Type 不正 | 400 | `invalid_request` |
/// | 型の不一致 / 必須フィールド欠落 | 400 | `invalid_request` |
/// | フィールド検証（validator）失敗 | 422 | `validation_error` |
#[derive(Debug)]
pub enum BindingError {
    Json(JsonRejection),
    Validation(ValidationErrors),
}

impl From<JsonRejection> for BindingError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Json(rejection)
    }
}

impl From<ValidationErrors> for BindingError {
    fn from(errors: ValidationErrors) -> Self {
        Self::Validation(errors)
    }
}

impl IntoResponse for BindingError {
    fn into_response(self) -> Response {
        render_binding(&RequestContext::current(), &self)
    }
}

/// バインド失敗を HTTP レスポンスに変換する
pub fn render_binding(context: &RequestContext, err: &BindingError) -> Response {
    let request_id = Uuid::now_v7().to_string();

    let (status, kind, detail, params, raw) = match err {
        BindingError::Json(JsonRejection::JsonDataError(e)) => {
            let body = e.body_text();
            (
                StatusCode::BAD_REQUEST,
                Kind::InvalidRequest,
                TYPE_MISMATCH_DETAIL,
                vec![type_mismatch_param(&body)],
                body,
            )
        }
        BindingError::Json(rejection) => (
            StatusCode::BAD_REQUEST,
            Kind::InvalidRequest,
            INVALID_JSON_DETAIL,
            Vec::new(),
            rejection.body_text(),
        ),
        BindingError::Validation(errors) => (
            StatusCode::UNPROCESSABLE_ENTITY,
            Kind::Validation,
            FIELD_VALIDATION_DETAIL,
            validation_params(errors),
            errors.to_string(),
        ),
    };
    let label = kind_label(kind);

    tracing::error!(
        request_id = %request_id,
        status = status.as_u16(),
        method = %context.method,
        path = %context.path,
        kind = label,
        error = %raw,
        params = ?params,
        "Invalid request"
    );

    let detail = ErrorDetail::new(request_id)
        .with_kind(label)
        .with_detail(detail)
        .with_params(params);

    (status, Json(ErrorResponse::new("Invalid request", detail))).into_response()
}

const JSON_DATA_ERROR_PREFIX: &str = "Failed to deserialize the JSON body into the target type: ";

/// serde のデシリアライズエラー文からフィールド名と理由を取り出す
///
/// `title: invalid type: integer `1`, expected a string at line 1 column 11` の形式を想定する。
fn type_mismatch_param(body_text: &str) -> ErrorParam {
    let text = body_text
        .strip_prefix(JSON_DATA_ERROR_PREFIX)
        .unwrap_or(body_text);
    let text = text.split(" at line ").next().unwrap_or(text);

    if let Some(field) = text
        .strip_prefix("missing field `")
        .and_then(|rest| rest.split('`').next())
    {
        return ErrorParam::new(field, "this field is required");
    }

    match text.split_once(": ") {
        Some((path, reason)) if !path.contains(' ') => ErrorParam::new(path, reason),
        _ => ErrorParam::new("body", text),
    }
}

/// validator の検証エラーをフィールドごとの理由に変換する（フィールド名順）
fn validation_params(errors: &ValidationErrors) -> Vec<ErrorParam> {
    let mut params: Vec<ErrorParam> = errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, errs)| {
            errs.iter()
                .map(move |e| ErrorParam::new(field.to_string(), validation_reason(e)))
        })
        .collect();
    params.sort_by(|a, b| a.name.cmp(&b.name));
    params
}

fn validation_reason(error: &validator::ValidationError) -> String {
    let param = |name: &str| error.params.get(name).map(ToString::to_string);

    match error.code.as_ref() {
        "required" => "this field is required".to_string(),
        "email" => "must be a valid email format".to_string(),
        "url" => "must be a valid URL format".to_string(),
        "length" => match (param("min"), param("max")) {
            (Some(min), Some(max)) => format!("must be between {min} and {max} characters"),
            (Some(min), None) => format!("must be at least {min} characters"),
            (None, Some(max)) => format!("must be at most {max} characters"),
            (None, None) => "failed validation for tag 'length'".to_string(),
        },
        code => format!("failed validation for tag '{code}'"),
    }
}

#[cfg(test)]
mod tests {
    use courseworker_domain::error::Problem;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use validator::Validate;

    use super::*;
    use crate::test_utils::log_capture::setup_capture;

    fn context() -> RequestContext {
        RequestContext::new("DELETE", "/courses/42")
    }

    async fn response_body(response: Response) -> serde_json::Value {
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&body).unwrap()
    }

    fn leaf(kind: Kind) -> Problem {
        Problem::builder()
            .op("repo/DeleteCourse")
            .kind(kind)
            .title("Course not found")
            .detail("The requested course with id 42 does not exist")
            .cause("sql: no rows in result set")
            .build()
    }

    #[rstest]
    #[case(Kind::NotExist, StatusCode::NOT_FOUND)]
    #[case(Kind::Forbidden, StatusCode::FORBIDDEN)]
    #[case(Kind::InvalidRequest, StatusCode::BAD_REQUEST)]
    #[case(Kind::Database, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Kind::Internal, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Kind::Other, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Kind::Exist, StatusCode::INTERNAL_SERVER_ERROR)]
    #[case(Kind::Validation, StatusCode::INTERNAL_SERVER_ERROR)]
    fn test_kindに対応するステータスを返す(#[case] kind: Kind, #[case] expected: StatusCode) {
        let response = render(&context(), &leaf(kind));

        assert_eq!(response.status(), expected);
    }

    #[tokio::test]
    async fn test_4xxはtitleとdetailをそのまま返す() {
        // Given
        let problem = Problem::builder()
            .op("serv/DeleteCourse")
            .title("Failed to delete course")
            .cause(leaf(Kind::NotExist))
            .build();

        // When
        let response = render(&context(), &problem);

        // Then
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let json = response_body(response).await;
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "Failed to delete course");
        assert_eq!(json["error"]["kind"], "resource_not_found");
        assert_eq!(
            json["error"]["detail"],
            "The requested course with id 42 does not exist"
        );
        assert!(json["error"]["request_id"].as_str().is_some());
    }

    #[tokio::test]
    async fn test_detailがなければ生のエラーメッセージを返す() {
        let problem = Problem::builder()
            .kind(Kind::Forbidden)
            .title("Forbidden action")
            .cause("owner mismatch")
            .build();

        let json = response_body(render(&context(), &problem)).await;

        assert_eq!(json["error"]["detail"], "owner mismatch");
    }

    #[tokio::test]
    async fn test_5xxは内部メッセージを含まない() {
        // Given
        let problem = Problem::builder()
            .op("repo/GetCourseByID")
            .kind(Kind::Database)
            .title("Failed to get course")
            .detail("connection to 10.0.0.5:5432 refused")
            .cause("pq: password authentication failed for user courseworker")
            .build();

        // When
        let response = render(&context(), &problem);

        // Then
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_body(response).await;
        let text = json.to_string();
        assert!(!text.contains("10.0.0.5"));
        assert!(!text.contains("password authentication"));
        assert_eq!(json["message"], "Failed to get course");
        assert_eq!(json["error"]["kind"], "database_error");
        assert_eq!(json["error"]["detail"], INTERNAL_ERROR_DETAIL);
        assert!(!json["error"]["request_id"].as_str().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_problemでないエラーは予期しないエラーとして扱う() {
        let err = std::io::Error::other("disk on fire");

        let response = render(&context(), &err);

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let json = response_body(response).await;
        assert_eq!(json["message"], "Unexpected error");
        assert!(json["error"]["request_id"].as_str().is_some());
        assert!(json["error"].get("kind").is_none());
        assert!(!json.to_string().contains("disk on fire"));
    }

    #[tokio::test]
    async fn test_相関idは変換ごとに異なる() {
        let a = response_body(render(&context(), &leaf(Kind::NotExist))).await;
        let b = response_body(render(&context(), &leaf(Kind::NotExist))).await;

        assert_ne!(a["error"]["request_id"], b["error"]["request_id"]);
    }

    #[tokio::test]
    async fn test_paramsは4xxのレスポンスに含まれる() {
        let problem = Problem::builder()
            .kind(Kind::InvalidRequest)
            .title("Invalid deadline")
            .param("deadline", "must match format 'YYYY-MM-DD HH:MM'")
            .build();

        let json = response_body(render(&context(), &problem)).await;

        assert_eq!(
            json["error"]["param"],
            serde_json::json!([{ "name": "deadline", "reason": "must match format 'YYYY-MM-DD HH:MM'" }])
        );
    }

    #[tokio::test]
    async fn test_api_errorはproblemを包んでも同じ変換結果になる() {
        let err = ApiError::from(leaf(Kind::Forbidden));

        let response = err.into_response();

        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    // ===== エラーログ =====

    #[tokio::test]
    async fn test_problemの変換でレスポンスと同じ相関idのエラーログが出力される() {
        // Given
        let (_guard, events) = setup_capture();
        let problem = Problem::builder()
            .op("serv/DeleteCourse")
            .title("Failed to delete course")
            .cause(leaf(Kind::NotExist))
            .build();

        // When
        let json = response_body(render(&context(), &problem)).await;

        // Then
        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let event = &captured[0];
        assert_eq!(event.level, tracing::Level::ERROR);
        assert_eq!(event.message, "Failed to delete course");
        assert_eq!(
            event.field("request_id"),
            json["error"]["request_id"].as_str()
        );
        assert_eq!(event.field("status"), Some("404"));
        assert_eq!(event.field("method"), Some("DELETE"));
        assert_eq!(event.field("path"), Some("/courses/42"));
        assert_eq!(event.field("kind"), Some("resource_not_found"));
        assert_eq!(
            event.field("stack"),
            Some(r#"["repo/DeleteCourse", "serv/DeleteCourse"]"#)
        );
        assert_eq!(event.field("error"), Some("sql: no rows in result set"));
    }

    #[tokio::test]
    async fn test_5xxでも生のメッセージはログにだけ出力される() {
        // Given
        let (_guard, events) = setup_capture();
        let problem = Problem::builder()
            .op("repo/GetCourseByID")
            .kind(Kind::Database)
            .title("Failed to get course")
            .cause("pool timed out")
            .build();

        // When
        let json = response_body(render(&context(), &problem)).await;

        // Then
        assert!(!json.to_string().contains("pool timed out"));
        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        assert_eq!(captured[0].field("error"), Some("pool timed out"));
        assert_eq!(captured[0].field("kind"), Some("database_error"));
        assert_eq!(
            captured[0].field("request_id"),
            json["error"]["request_id"].as_str()
        );
    }

    #[tokio::test]
    async fn test_problemでないエラーも相関id付きでログに出力される() {
        // Given
        let (_guard, events) = setup_capture();
        let err = std::io::Error::other("disk on fire");

        // When
        let json = response_body(render(&context(), &err)).await;

        // Then
        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let event = &captured[0];
        assert_eq!(event.message, "Unexpected error");
        assert_eq!(
            event.field("request_id"),
            json["error"]["request_id"].as_str()
        );
        assert_eq!(event.field("status"), Some("500"));
        assert_eq!(event.field("method"), Some("DELETE"));
        assert_eq!(event.field("path"), Some("/courses/42"));
        assert_eq!(event.field("kind"), Some("other_error"));
        assert_eq!(event.field("stack"), Some(r#"["unexpected error occurred"]"#));
        assert_eq!(event.field("error"), Some("disk on fire"));
    }

    #[tokio::test]
    async fn test_認証失敗は相関id付きの401でログにも同じidが出力される() {
        // Given
        let (_guard, events) = setup_capture();
        let cause = std::io::Error::other("InvalidSignature");

        // When
        let response = render_unauthorized(&context(), "Failed Decode Token", Some(&cause));

        // Then
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let json = response_body(response).await;
        assert_eq!(json["status"], false);
        assert_eq!(json["message"], "Failed Decode Token");
        let request_id = json["error"]["request_id"].as_str().unwrap().to_string();
        assert!(json["error"].get("kind").is_none());

        let captured = events.lock().unwrap();
        assert_eq!(captured.len(), 1);
        let event = &captured[0];
        assert_eq!(event.level, tracing::Level::WARN);
        assert_eq!(event.message, "Failed Decode Token");
        assert_eq!(event.field("request_id"), Some(request_id.as_str()));
        assert_eq!(event.field("status"), Some("401"));
        assert_eq!(event.field("method"), Some("DELETE"));
        assert_eq!(event.field("path"), Some("/courses/42"));
        assert_eq!(event.field("error"), Some("InvalidSignature"));
    }

    // ===== バインド失敗 =====

    #[rstest]
    #[case(
        "Failed to deserialize the JSON body into the target type: name: invalid type: integer `1`, expected a string at line 1 column 9",
        "name",
        "invalid type: integer `1`, expected a string"
    )]
    #[case(
        "Failed to deserialize the JSON body into the target type: missing field `name` at line 1 column 2",
        "name",
        "this field is required"
    )]
    #[case(
        "Failed to deserialize the JSON body into the target type: invalid type: sequence, expected struct CreateCourseRequest at line 1 column 0",
        "body",
        "invalid type: sequence, expected struct CreateCourseRequest"
    )]
    fn test_型の不一致からフィールド名を取り出す(
        #[case] body_text: &str,
        #[case] name: &str,
        #[case] reason: &str,
    ) {
        assert_eq!(type_mismatch_param(body_text), ErrorParam::new(name, reason));
    }

    #[derive(Validate)]
    struct SampleRequest {
        #[validate(length(min = 1, max = 10))]
        name:    String,
        #[validate(email)]
        email:   String,
        #[validate(url)]
        website: String,
    }

    #[tokio::test]
    async fn test_フィールド検証の失敗は422で理由を返す() {
        // Given
        let request = SampleRequest {
            name:    String::new(),
            email:   "not-an-email".to_string(),
            website: "nope".to_string(),
        };
        let errors = request.validate().unwrap_err();

        // When
        let response = render_binding(&context(), &BindingError::Validation(errors));

        // Then
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let json = response_body(response).await;
        assert_eq!(json["message"], "Invalid request");
        assert_eq!(json["error"]["kind"], "validation_error");
        assert_eq!(json["error"]["detail"], FIELD_VALIDATION_DETAIL);
        assert_eq!(
            json["error"]["param"],
            serde_json::json!([
                { "name": "email", "reason": "must be a valid email format" },
                { "name": "name", "reason": "must be between 1 and 10 characters" },
                { "name": "website", "reason": "must be a valid URL format" },
            ])
        );
    }
}
