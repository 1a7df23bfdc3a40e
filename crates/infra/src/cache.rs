//! # キャッシュストア
//!
//! Redis を使ったキー・バリューキャッシュ。所有者解決のキャッシュ層として使う。
//!
//! ## Redis キー設計
//!
//! | キー | 値 | TTL |
//! |-----|-----|-----|
//! | `course:{course_id}` | 所有者のユーザー ID | なし |
//! | `task:{task_id}` | 所有者のユーザー ID | なし |
//!
//! 所有者は作成後に変わらないため TTL を付けない。
//! エントリはリソース削除時に明示的に消す。

use std::time::Duration;

use async_trait::async_trait;
use redis::{AsyncCommands, aio::ConnectionManager};

use crate::InfraError;

/// キャッシュストアトレイト
///
/// 呼び出し側はキャッシュの失敗を致命的に扱わない前提で、
/// 失敗はそのまま `InfraError` として返す。
#[async_trait]
pub trait CacheStore: Send + Sync {
    /// 値を取得する。キーが存在しなければ `None`
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError>;

    /// 値を保存する。`ttl` が `None` なら期限なし
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), InfraError>;

    /// 値を削除する。存在しないキーを削除しても成功とする
    async fn delete(&self, key: &str) -> Result<(), InfraError>;
}

/// Redis を使用したキャッシュストア
#[derive(Clone)]
pub struct RedisCacheStore {
    conn: ConnectionManager,
}

impl RedisCacheStore {
    /// 新しい RedisCacheStore を作成する
    ///
    /// # 引数
    ///
    /// - `redis_url`: Redis 接続 URL（例: `redis://localhost:6379`）
    pub async fn new(redis_url: &str) -> Result<Self, InfraError> {
        let client = redis::Client::open(redis_url)?;
        let conn = ConnectionManager::new(client).await?;
        Ok(Self { conn })
    }
}

#[async_trait]
impl CacheStore for RedisCacheStore {
    #[tracing::instrument(skip_all, level = "debug", fields(%key))]
    async fn get(&self, key: &str) -> Result<Option<String>, InfraError> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;
        Ok(value)
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%key))]
    async fn set(&self, key: &str, value: &str, ttl: Option<Duration>) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        match ttl {
            Some(ttl) => {
                let _: () = conn.set_ex(key, value, ttl.as_secs().max(1)).await?;
            }
            None => {
                let _: () = conn.set(key, value).await?;
            }
        }
        Ok(())
    }

    #[tracing::instrument(skip_all, level = "debug", fields(%key))]
    async fn delete(&self, key: &str) -> Result<(), InfraError> {
        let mut conn = self.conn.clone();
        let _: () = conn.del(key).await?;
        Ok(())
    }
}
