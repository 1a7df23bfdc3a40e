//! # courseworker API サーバー
//!
//! 講座とタスクを管理する REST API。
//!
//! ## 環境変数
//!
//! | 変数名 | 必須 | 説明 |
//! |--------|------|------|
//! | `API_HOST` | No | バインドアドレス（デフォルト: `0.0.0.0`） |
//! | `API_PORT` | No | ポート番号（デフォルト: `8000`） |
//! | `DATABASE_URL` | **Yes** | PostgreSQL 接続 URL |
//! | `REDIS_URL` | **Yes** | Redis 接続 URL（所有者キャッシュ） |
//! | `JWT_SECRET_KEY` | **Yes** | トークン署名鍵 |
//! | `JWT_EXP_SECONDS` | No | トークン有効期限（デフォルト: `10800`） |
//! | `BASE_URL` | No | 確認リンクの公開 URL（デフォルト: `http://localhost:8000`） |
//! | `MAIL_BACKEND` | No | `smtp` または `noop`（デフォルト: `smtp`） |
//! | `SMTP_HOST` / `SMTP_PORT` / `SMTP_USER` / `SMTP_PASS` | `smtp` 時 | SMTP 接続設定 |
//! | `FROM_EMAIL` / `FROM_NAME` | `smtp` 時 | 送信元 |
//! | `LOG_FORMAT` | No | `json` または `pretty` |
//!
//! ## 起動方法
//!
//! ```bash
//! DATABASE_URL=postgres://... REDIS_URL=redis://... JWT_SECRET_KEY=... \
//!   cargo run -p courseworker-api
//! ```

use std::{net::SocketAddr, sync::Arc};

use anyhow::Context as _;
use courseworker_api::{
    app_builder::{AppDependencies, build_app},
    config::{ApiConfig, MailBackend},
};
use courseworker_domain::clock::{Clock, SystemClock};
use courseworker_infra::{
    Argon2PasswordHasher,
    ConfirmationMailer,
    JwtTokenIssuer,
    RedisCacheStore,
    db,
    mailer::{NoopConfirmationMailer, SmtpConfirmationMailer, SmtpSettings},
    repository::{
        PostgresCourseRepository,
        PostgresOwnershipRepository,
        PostgresTaskRepository,
        PostgresUserRepository,
    },
};
use courseworker_shared::observability::{TracingConfig, init_tracing};
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env ファイルを読み込む（存在する場合）
    dotenvy::dotenv().ok();

    init_tracing(TracingConfig::from_env("courseworker-api"));

    let config = ApiConfig::from_env().context("設定の読み込みに失敗しました")?;

    tracing::info!(
        "API サーバーを起動します: {}:{}",
        config.host,
        config.port
    );

    let pool = db::create_pool(&config.database_url)
        .await
        .context("データベース接続に失敗しました")?;
    db::run_migrations(&pool)
        .await
        .context("マイグレーションに失敗しました")?;
    tracing::info!("データベースに接続しました");

    let cache = RedisCacheStore::new(&config.redis_url)
        .await
        .context("Redis 接続に失敗しました")?;
    tracing::info!("Redis に接続しました");

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let tokens = JwtTokenIssuer::new(
        &config.jwt_secret,
        chrono::Duration::seconds(config.jwt_exp_seconds),
        clock.clone(),
    );
    let hasher = Argon2PasswordHasher::new().context("パスワードハッシュの初期化に失敗しました")?;
    let mailer: Arc<dyn ConfirmationMailer> = match config.mail_backend {
        MailBackend::Smtp => {
            let smtp = config.smtp.clone();
            Arc::new(
                SmtpConfirmationMailer::new(SmtpSettings {
                    host:       smtp.host,
                    port:       smtp.port,
                    username:   smtp.username,
                    password:   smtp.password,
                    from_email: smtp.from_email,
                    from_name:  smtp.from_name,
                })
                .context("SMTP の初期化に失敗しました")?,
            )
        }
        MailBackend::Noop => {
            tracing::warn!("MAIL_BACKEND=noop: 確認メールは送信されません");
            Arc::new(NoopConfirmationMailer)
        }
    };

    let app = build_app(AppDependencies {
        users: Arc::new(PostgresUserRepository::new(pool.clone())),
        courses: Arc::new(PostgresCourseRepository::new(pool.clone())),
        tasks: Arc::new(PostgresTaskRepository::new(pool.clone())),
        owners: Arc::new(PostgresOwnershipRepository::new(pool)),
        cache: Arc::new(cache),
        hasher: Arc::new(hasher),
        tokens: Arc::new(tokens),
        mailer,
        clock,
        base_url: config.base_url.clone(),
    });

    let addr: SocketAddr = format!("{}:{}", config.host, config.port)
        .parse()
        .context("バインドアドレスが不正です")?;
    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("{addr} にバインドできません"))?;
    tracing::info!("API サーバーが起動しました: {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
