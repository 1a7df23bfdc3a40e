//! # リクエスト抽出
//!
//! JSON ボディのデシリアライズと `validator` によるフィールド検証をまとめて行う抽出器。
//! 失敗はすべて [`BindingError`] として返り、エラー変換器の同じ形式で描画される。

use axum::{
    Json,
    extract::{FromRequest, Request},
};
use serde::de::DeserializeOwned;
use validator::Validate;

use crate::error::BindingError;

/// 検証済み JSON ボディ
#[derive(Debug, Clone, Copy, Default)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = BindingError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state).await?;
        value.validate()?;
        Ok(Self(value))
    }
}
