//! # PostgreSQL データベース接続管理
//!
//! 接続プールの作成とマイグレーションの適用を行う。
//!
//! ## 接続プール設定
//!
//! | 項目 | 値 |
//! |------|----|
//! | 最大接続数 | 10 |
//! | 接続取得タイムアウト | 5 秒 |
//!
//! 取得タイムアウトを超えたクエリは `sqlx::Error::PoolTimedOut` で失敗し、
//! ユースケース層で `Kind::Database` の Problem に変換される。

use std::time::Duration;

use sqlx::{PgPool, postgres::PgPoolOptions};

/// データベース接続プールを作成する
pub async fn create_pool(database_url: &str) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(10)
        .acquire_timeout(Duration::from_secs(5))
        .connect(database_url)
        .await
}

/// マイグレーションを適用する
///
/// `sqlx::migrate!()` マクロでワークスペース直下の `migrations/` を埋め込む。
pub async fn run_migrations(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("../../migrations").run(pool).await
}
