//! # 所有者の解決と認可判定
//!
//! 講座・タスクの所有者を cache-aside で解決し、呼び出し元ユーザーが
//! 所有者であるかを判定する。
//!
//! ## 設計方針
//!
//! - **キャッシュ障害でリクエストを失敗させない**: 読み取り・書き戻し・削除の
//!   いずれの失敗も `warn` で記録し、正本（[`OwnershipRepository`]）にフォールバックする
//! - **有効期限なし**: 所有者は作成後に変わらないため、キャッシュに TTL を付けない
//! - **正本は変更しない**: 読み取り専用の問い合わせだけを行う
//!
//! ## 処理フロー
//!
//! ```text
//! resolve_owner(resource)
//!   ├─ cache.get(key) ── hit ──────────────────────────────→ owner
//!   └─ miss / error / 解析不能
//!        └─ store.find_*_owner ── None → NotExist
//!                              ── Err  → Database
//!                              ── Some(owner) → cache.set(key, owner) → owner
//! ```

use std::sync::Arc;

use courseworker_domain::{
    error::{Kind, Problem},
    ownership::ResourceRef,
    user::UserId,
};
use courseworker_infra::{CacheStore, repository::OwnershipRepository};

use super::helpers::{InfraResultExt, OptionExt};

/// 所有者の解決と認可判定を行うガード
pub struct OwnershipGuard {
    cache: Arc<dyn CacheStore>,
    store: Arc<dyn OwnershipRepository>,
}

impl OwnershipGuard {
    pub fn new(cache: Arc<dyn CacheStore>, store: Arc<dyn OwnershipRepository>) -> Self {
        Self { cache, store }
    }

    /// リソースの所有者を解決する
    ///
    /// # Errors
    ///
    /// - リソースが存在しない場合: `Kind::NotExist`
    /// - 正本への問い合わせに失敗した場合: `Kind::Database`
    #[tracing::instrument(skip_all, level = "debug", fields(resource = %resource.cache_key()))]
    pub async fn resolve_owner(&self, resource: &ResourceRef) -> Result<UserId, Problem> {
        const OP: &str = "ownership/ResolveOwner";

        let key = resource.cache_key();
        match self.cache.get(&key).await {
            Ok(Some(cached)) => match cached.parse::<UserId>() {
                Ok(owner) => return Ok(owner),
                Err(e) => {
                    tracing::warn!(%key, value = %cached, error = %e, "キャッシュの所有者を解析できません");
                }
            },
            Ok(None) => {
                tracing::debug!(%key, "キャッシュに所有者がないため正本を参照します");
            }
            Err(e) => {
                tracing::warn!(%key, error = %e, "キャッシュの読み取りに失敗したため正本を参照します");
            }
        }

        let (title, found) = match resource {
            ResourceRef::Course(course_id) => (
                "Course not found",
                self.store.find_course_owner(*course_id).await,
            ),
            ResourceRef::Task { course_id, task_id } => (
                "Task not found",
                self.store.find_task_owner(*course_id, task_id).await,
            ),
        };
        let owner = found
            .or_database(OP, "Failed to get owner")?
            .or_not_exist(OP, title, || {
                format!(
                    "The requested {} with id {} does not exist",
                    resource.label(),
                    resource.id_string()
                )
            })?;

        self.remember(resource, &owner).await;
        Ok(owner)
    }

    /// 呼び出し元がリソースの所有者であることを確認する
    ///
    /// # Errors
    ///
    /// - 所有者でない場合: `Kind::Forbidden`
    /// - 所有者の解決に失敗した場合: [`resolve_owner`](Self::resolve_owner) の kind
    pub async fn assert_ownership(
        &self,
        caller: &UserId,
        resource: &ResourceRef,
    ) -> Result<(), Problem> {
        const OP: &str = "ownership/AssertOwnership";

        let owner = self
            .resolve_owner(resource)
            .await
            .map_err(|e| Problem::wrap(OP, e))?;

        if &owner != caller {
            return Err(Problem::builder()
                .op(OP)
                .kind(Kind::Forbidden)
                .title("Forbidden action")
                .detail(format!(
                    "The requested {} with id {} does not belong to user",
                    resource.label(),
                    resource.id_string()
                ))
                .build());
        }

        Ok(())
    }

    /// 作成直後のリソースの所有者をキャッシュに書き込む
    pub async fn remember(&self, resource: &ResourceRef, owner: &UserId) {
        let key = resource.cache_key();
        if let Err(e) = self.cache.set(&key, &owner.to_string(), None).await {
            tracing::warn!(%key, error = %e, "所有者のキャッシュ書き込みに失敗しました");
        }
    }

    /// 削除したリソースの所有者をキャッシュから取り除く
    pub async fn forget(&self, resource: &ResourceRef) {
        let key = resource.cache_key();
        if let Err(e) = self.cache.delete(&key).await {
            tracing::warn!(%key, error = %e, "所有者のキャッシュ削除に失敗しました");
        }
    }
}
