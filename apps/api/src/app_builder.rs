//! # アプリケーション構築
//!
//! DI（ユースケース・State）の初期化とルーター構築を担当する。
//! `main.rs` はインフラ初期化とサーバー起動に集中する。
//!
//! ## ルートグループ
//!
//! | グループ | 認証 | ルート |
//! |---------|------|-------|
//! | 公開 | 不要 | `/health`, `/users`, `/register`, `/account-confirm`, `/login` |
//! | 講座 | Bearer | `/courses`, `/courses/{course_id}` |
//! | タスク | Bearer | `/tasks`, `/courses/{course_id}/tasks/**` |

use std::sync::Arc;

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, patch, post},
};
use courseworker_domain::clock::Clock;
use courseworker_infra::{
    CacheStore,
    ConfirmationMailer,
    PasswordHasher,
    TokenIssuer,
    repository::{CourseRepository, OwnershipRepository, TaskRepository, UserRepository},
};
use courseworker_shared::observability::{MakeRequestUuidV7, make_request_span};
use tower_http::{
    request_id::{PropagateRequestIdLayer, SetRequestIdLayer},
    trace::TraceLayer,
};

use crate::{
    handler::{
        CourseState,
        TaskState,
        UserState,
        confirm_account,
        create_course,
        create_task,
        delete_course,
        delete_task,
        get_course,
        get_task,
        get_user,
        health_check,
        list_all_tasks,
        list_course_tasks,
        list_courses,
        list_users,
        login,
        register,
        toggle_task_highlight,
        update_course,
        update_task,
    },
    middleware::{AuthState, require_auth, store_request_context},
    usecase::{CourseUseCaseImpl, OwnershipGuard, TaskUseCaseImpl, UserUseCaseImpl},
};

/// ルーター構築に必要な依存
///
/// インフラ初期化済みの実装を `Arc<dyn Trait>` で受け取る。
/// テストではインメモリモックを渡す。
pub struct AppDependencies {
    pub users:    Arc<dyn UserRepository>,
    pub courses:  Arc<dyn CourseRepository>,
    pub tasks:    Arc<dyn TaskRepository>,
    pub owners:   Arc<dyn OwnershipRepository>,
    pub cache:    Arc<dyn CacheStore>,
    pub hasher:   Arc<dyn PasswordHasher>,
    pub tokens:   Arc<dyn TokenIssuer>,
    pub mailer:   Arc<dyn ConfirmationMailer>,
    pub clock:    Arc<dyn Clock>,
    /// 確認リンクの組み立てに使う公開 URL（末尾の `/` なし）
    pub base_url: String,
}

/// DI コンテナの構築とルーター定義を行う
///
/// ガード → ユースケース → State → Router の順に組み立てる。
pub fn build_app(deps: AppDependencies) -> Router {
    // 講座とタスクで同じガード（= 同じキャッシュ）を共有する
    let guard = Arc::new(OwnershipGuard::new(deps.cache, deps.owners));

    let user_state = Arc::new(UserState {
        usecase: UserUseCaseImpl::new(
            deps.users,
            deps.hasher,
            deps.tokens.clone(),
            deps.mailer,
            deps.clock.clone(),
            deps.base_url,
        ),
    });
    let course_state = Arc::new(CourseState {
        usecase: CourseUseCaseImpl::new(
            deps.courses,
            deps.tasks.clone(),
            guard.clone(),
            deps.clock.clone(),
        ),
    });
    let task_state = Arc::new(TaskState {
        usecase: TaskUseCaseImpl::new(deps.tasks, guard, deps.clock),
    });

    let auth_state = AuthState {
        token_issuer: deps.tokens,
    };

    Router::new()
        .route("/health", get(health_check))
        // ユーザー API（認証不要）
        .merge(
            Router::new()
                .route("/users", get(list_users))
                .route("/users/{user_id}", get(get_user))
                .route("/register", post(register))
                .route("/account-confirm", get(confirm_account))
                .route("/login", post(login))
                .with_state(user_state),
        )
        // 講座 API（認証必須）
        .merge(
            Router::new()
                .route("/courses", get(list_courses).post(create_course))
                .route(
                    "/courses/{course_id}",
                    get(get_course).put(update_course).delete(delete_course),
                )
                .route_layer(from_fn_with_state(auth_state.clone(), require_auth))
                .with_state(course_state),
        )
        // タスク API（認証必須）
        .merge(
            Router::new()
                .route("/tasks", get(list_all_tasks))
                .route(
                    "/courses/{course_id}/tasks",
                    get(list_course_tasks).post(create_task),
                )
                .route(
                    "/courses/{course_id}/tasks/{task_id}",
                    get(get_task).put(update_task).delete(delete_task),
                )
                .route(
                    "/courses/{course_id}/tasks/{task_id}/highlight",
                    patch(toggle_task_highlight),
                )
                .route_layer(from_fn_with_state(auth_state, require_auth))
                .with_state(task_state),
        )
        // レイヤー順序: 下に書いたものが外側
        // 1. SetRequestIdLayer（最外）: x-request-id を採番（クライアント提供値があればそれを使う）
        // 2. TraceLayer: request_id を含むスパンを作成
        // 3. PropagateRequestIdLayer: レスポンスヘッダーに x-request-id をコピー
        // 4. store_request_context: エラーログ用にメソッドとパスを task-local に保存
        .layer(from_fn(store_request_context))
        .layer(PropagateRequestIdLayer::x_request_id())
        .layer(TraceLayer::new_for_http().make_span_with(make_request_span))
        .layer(SetRequestIdLayer::x_request_id(MakeRequestUuidV7))
}
