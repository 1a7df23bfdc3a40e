//! # API レスポンスエンベロープ
//!
//! 成功時の統一レスポンス形式 `{ "status": true, "message": ..., "data": T }` を提供する。

use serde::{Deserialize, Serialize};

/// 成功レスポンスの統一型
///
/// `data` を持たない応答（削除など）は [`ApiResponse::message_only`] で作る。
///
/// ## 使用例
///
/// ```
/// use courseworker_shared::ApiResponse;
///
/// let response = ApiResponse::new("Course retrieved successfully", 42);
/// assert!(response.status);
/// assert_eq!(response.data, Some(42));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub status:  bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data:    Option<T>,
}

impl<T> ApiResponse<T> {
    /// データ付きの成功レスポンスを作成する
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            status:  true,
            message: message.into(),
            data:    Some(data),
        }
    }
}

impl ApiResponse<()> {
    /// メッセージのみの成功レスポンスを作成する
    pub fn message_only(message: impl Into<String>) -> Self {
        Self {
            status:  true,
            message: message.into(),
            data:    None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_serializeを正しいjson形状にする() {
        let response = ApiResponse::new("ok", vec!["a", "b"]);
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "status": true, "message": "ok", "data": ["a", "b"] })
        );
    }

    #[test]
    fn test_message_onlyはdataフィールドを出力しない() {
        let response = ApiResponse::message_only("Course successfully deleted");
        let json = serde_json::to_value(&response).unwrap();

        assert_eq!(
            json,
            serde_json::json!({ "status": true, "message": "Course successfully deleted" })
        );
    }

    #[test]
    fn test_deserializeでjsonからオブジェクトに変換する() {
        let json = r#"{"status": true, "message": "m", "data": "world"}"#;
        let response: ApiResponse<String> = serde_json::from_str(json).unwrap();

        assert_eq!(response.data.as_deref(), Some("world"));
    }
}
