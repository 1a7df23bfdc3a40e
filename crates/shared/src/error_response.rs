//! # エラーレスポンス
//!
//! 全エンドポイントで共通のエラーレスポンス構造体を提供する。
//!
//! ```json
//! {
//!   "status": false,
//!   "message": "Forbidden action",
//!   "error": {
//!     "request_id": "0190...",
//!     "kind": "forbidden",
//!     "detail": "The requested course with id 42 does not belong to user"
//!   }
//! }
//! ```
//!
//! ## 設計
//!
//! - 純粋なデータ構造（`Serialize` / `Deserialize` のみ）
//! - axum の `IntoResponse` 変換は API 側の責務
//! - `request_id` はログと突き合わせるための相関 ID で、常に出力する

use serde::{Deserialize, Serialize};

/// エラーレスポンス
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub status:  bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error:   Option<ErrorDetail>,
}

/// エラー詳細
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub request_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub kind:       Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub detail:     Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub param:      Vec<ErrorParam>,
}

/// 問題のあったリクエストフィールド
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorParam {
    pub name:   String,
    pub reason: String,
}

impl ErrorResponse {
    /// 詳細付きのエラーレスポンスを作成する
    pub fn new(message: impl Into<String>, error: ErrorDetail) -> Self {
        Self {
            status:  false,
            message: message.into(),
            error:   Some(error),
        }
    }
}

impl ErrorDetail {
    /// 相関 ID のみを持つ詳細を作成する
    pub fn new(request_id: impl Into<String>) -> Self {
        Self {
            request_id: request_id.into(),
            kind:       None,
            detail:     None,
            param:      Vec::new(),
        }
    }

    pub fn with_kind(mut self, kind: impl Into<String>) -> Self {
        self.kind = Some(kind.into());
        self
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn with_params(mut self, params: impl IntoIterator<Item = ErrorParam>) -> Self {
        self.param.extend(params);
        self
    }
}

impl ErrorParam {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            reason: reason.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_全フィールドを持つレスポンスのjson形状() {
        let response = ErrorResponse::new(
            "Invalid field value",
            ErrorDetail::new("req-1")
                .with_kind("validation_error")
                .with_detail("The request body contains failed field validation")
                .with_params([ErrorParam::new("name", "this field is required")]),
        );

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": false,
                "message": "Invalid field value",
                "error": {
                    "request_id": "req-1",
                    "kind": "validation_error",
                    "detail": "The request body contains failed field validation",
                    "param": [{ "name": "name", "reason": "this field is required" }]
                }
            })
        );
    }

    #[test]
    fn test_空のフィールドは出力しない() {
        let response = ErrorResponse::new("Unexpected error", ErrorDetail::new("req-2"));

        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({
                "status": false,
                "message": "Unexpected error",
                "error": { "request_id": "req-2" }
            })
        );
    }

    #[test]
    fn test_jsonデシリアライズが正しく動作する() {
        let json = r#"{
            "status": false,
            "message": "Forbidden action",
            "error": { "request_id": "r", "kind": "forbidden" }
        }"#;

        let response: ErrorResponse = serde_json::from_str(json).unwrap();

        assert!(!response.status);
        let error = response.error.unwrap();
        assert_eq!(error.kind.as_deref(), Some("forbidden"));
        assert!(error.param.is_empty());
    }
}
