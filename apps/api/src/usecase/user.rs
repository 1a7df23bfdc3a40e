//! # ユーザーユースケース
//!
//! ユーザー一覧・取得と、メール確認付きの登録・ログインを実装する。
//!
//! ## 登録フロー
//!
//! ```text
//! register ──→ 検証 → パスワードハッシュ → 登録確認トークン → 確認メール送信
//!                                                             │
//! confirm_account(token) ←──── {base_url}/account-confirm?token=...
//!   └─ トークン検証 → 重複確認 → ユーザー作成
//! ```
//!
//! 確認前の登録内容はトークンにだけ存在し、データベースには書き込まない。

use std::sync::Arc;

use courseworker_domain::{
    clock::Clock,
    error::{Kind, Problem},
    password::{PasswordHash, PlainPassword},
    user::{Email, PendingRegistration, User, UserId, UserName},
};
use courseworker_infra::{
    ConfirmationMailer,
    PasswordHasher,
    TokenIssuer,
    repository::UserRepository,
};

use super::helpers::{FindResultExt, InfraResultExt, internal_problem, invalid_input};

/// 登録申請の入力
#[derive(Debug, Clone)]
pub struct RegisterInput {
    pub name:             String,
    pub email:            String,
    pub password:         PlainPassword,
    pub confirm_password: PlainPassword,
}

/// ログインの入力
#[derive(Debug, Clone)]
pub struct LoginInput {
    pub email:    String,
    pub password: PlainPassword,
}

/// ユーザーユースケース実装
pub struct UserUseCaseImpl {
    users:    Arc<dyn UserRepository>,
    hasher:   Arc<dyn PasswordHasher>,
    tokens:   Arc<dyn TokenIssuer>,
    mailer:   Arc<dyn ConfirmationMailer>,
    clock:    Arc<dyn Clock>,
    base_url: String,
}

impl UserUseCaseImpl {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
        mailer: Arc<dyn ConfirmationMailer>,
        clock: Arc<dyn Clock>,
        base_url: impl Into<String>,
    ) -> Self {
        Self {
            users,
            hasher,
            tokens,
            mailer,
            clock,
            base_url: base_url.into(),
        }
    }

    /// 全ユーザーを取得する
    #[tracing::instrument(skip_all)]
    pub async fn list_users(&self) -> Result<Vec<User>, Problem> {
        self.users
            .find_all()
            .await
            .or_database("serv/GetUsers", "Failed to get users")
    }

    /// ユーザーを取得する
    #[tracing::instrument(skip_all, fields(%user_id))]
    pub async fn get_user(&self, user_id: &UserId) -> Result<User, Problem> {
        self.users
            .find_by_id(user_id)
            .await
            .or_not_found("serv/GetUserByID", "Failed to get user", || {
                format!("The requested user with id {user_id} does not exist")
            })
    }

    /// 登録申請を受け付け、確認メールを送信する
    ///
    /// 送信先のメールアドレスを返す。
    #[tracing::instrument(skip_all)]
    pub async fn register(&self, input: RegisterInput) -> Result<Email, Problem> {
        const OP: &str = "serv/RegisterUser";
        const TITLE: &str = "Failed to register user";

        let name = UserName::new(input.name).map_err(invalid_input(OP))?;
        let email = Email::new(input.email).map_err(invalid_input(OP))?;

        let exists = self
            .users
            .email_exists(&email)
            .await
            .or_database(OP, "Failed to check email existence")?;
        if exists {
            return Err(email_taken(OP, TITLE));
        }

        if input.password.as_str() != input.confirm_password.as_str() {
            return Err(Problem::builder()
                .op(OP)
                .kind(Kind::InvalidRequest)
                .title(TITLE)
                .detail("password confirmation does not match")
                .build());
        }

        let password_hash = self
            .hasher
            .hash(&input.password)
            .map_err(|e| internal_problem(OP, "Failed to create user", e))?;

        let registration = PendingRegistration {
            name:          name.into_string(),
            email:         email.as_str().to_string(),
            password_hash: password_hash.into_string(),
        };
        let token = self
            .tokens
            .issue_registration(&registration)
            .map_err(|e| internal_problem(OP, "Failed to send email", e))?;

        let link = format!("{}/account-confirm?token={token}", self.base_url);
        self.mailer
            .send_confirmation(&email, &link)
            .await
            .map_err(|e| internal_problem(OP, "Failed to send email", e))?;

        tracing::info!("確認メールを送信しました");
        Ok(email)
    }

    /// 確認トークンを検証し、ユーザーを作成する
    #[tracing::instrument(skip_all)]
    pub async fn confirm_account(&self, token: &str) -> Result<UserId, Problem> {
        const OP: &str = "serv/CreateConfirmedUser";
        const TITLE: &str = "Failed to create user";

        let registration = self.tokens.verify_registration(token).map_err(|e| {
            Problem::builder()
                .op(OP)
                .kind(Kind::InvalidRequest)
                .title(TITLE)
                .detail("the confirmation token is invalid or has expired")
                .cause(e)
                .build()
        })?;

        let name = UserName::new(registration.name).map_err(invalid_input(OP))?;
        let email = Email::new(registration.email).map_err(invalid_input(OP))?;

        // 同じリンクを二度開いた場合など
        let exists = self
            .users
            .email_exists(&email)
            .await
            .or_database(OP, "Failed to check email existence")?;
        if exists {
            return Err(email_taken(OP, TITLE));
        }

        let user = User::new(
            name,
            email,
            PasswordHash::new(registration.password_hash),
            self.clock.now(),
        );
        self.users.insert(&user).await.or_database(OP, TITLE)?;

        tracing::info!(user_id = %user.id(), "ユーザーを作成しました");
        Ok(user.id().clone())
    }

    /// メールアドレスとパスワードで認証し、アクセストークンを発行する
    #[tracing::instrument(skip_all)]
    pub async fn login(&self, input: LoginInput) -> Result<String, Problem> {
        const OP: &str = "serv/LoginUser";

        let email = Email::new(input.email).map_err(invalid_input(OP))?;
        let user = self
            .users
            .find_by_email(&email)
            .await
            .or_not_found(OP, "Failed to get user", || {
                "no user is registered with the given email".to_string()
            })?;

        let verified = self
            .hasher
            .verify(&input.password, user.password())
            .map_err(|e| internal_problem(OP, "Failed to validate password", e))?;
        if !verified.is_match() {
            return Err(Problem::builder()
                .op(OP)
                .kind(Kind::InvalidRequest)
                .title("Failed to validate password")
                .detail("the password is incorrect")
                .build());
        }

        self.tokens
            .issue_access(user.id())
            .map_err(|e| internal_problem(OP, "Failed to generate token", e))
    }
}

fn email_taken(op: &'static str, title: &str) -> Problem {
    Problem::builder()
        .op(op)
        .kind(Kind::Forbidden)
        .title(title)
        .detail("email has been used")
        .build()
}

#[cfg(test)]
mod tests {
    use chrono::{DateTime, Duration};
    use courseworker_domain::clock::FixedClock;
    use courseworker_infra::{
        JwtTokenIssuer,
        mock::{MockConfirmationMailer, MockDatabase, MockPasswordHasher},
    };
    use pretty_assertions::assert_eq;

    use super::*;

    const BASE_URL: &str = "http://localhost:8000";

    struct Fixture {
        db:      MockDatabase,
        mailer:  MockConfirmationMailer,
        tokens:  Arc<JwtTokenIssuer>,
        usecase: UserUseCaseImpl,
    }

    fn fixture() -> Fixture {
        let db = MockDatabase::new();
        let mailer = MockConfirmationMailer::new();
        let clock: Arc<dyn Clock> = Arc::new(FixedClock::new(chrono::Utc::now()));
        let tokens = Arc::new(JwtTokenIssuer::new("test-secret", Duration::hours(3), clock.clone()));
        let usecase = UserUseCaseImpl::new(
            Arc::new(db.clone()),
            Arc::new(MockPasswordHasher),
            tokens.clone(),
            Arc::new(mailer.clone()),
            clock,
            BASE_URL,
        );
        Fixture {
            db,
            mailer,
            tokens,
            usecase,
        }
    }

    fn register_input(password: &str, confirm: &str) -> RegisterInput {
        RegisterInput {
            name:             "Alice".to_string(),
            email:            "alice@example.com".to_string(),
            password:         PlainPassword::new(password),
            confirm_password: PlainPassword::new(confirm),
        }
    }

    fn token_from(link: &str) -> String {
        link.split_once("token=").unwrap().1.to_string()
    }

    fn existing_user(db: &MockDatabase) -> User {
        let user = User::new(
            UserName::new("Alice").unwrap(),
            Email::new("alice@example.com").unwrap(),
            PasswordHash::new("hashed:password123"),
            DateTime::from_timestamp(1_700_000_000, 0).unwrap(),
        );
        db.add_user(user.clone());
        user
    }

    #[tokio::test]
    async fn test_登録申請で確認メールが送られる() {
        // Given
        let f = fixture();

        // When
        let email = f
            .usecase
            .register(register_input("password123", "password123"))
            .await
            .unwrap();

        // Then
        let sent = f.mailer.sent();
        assert_eq!(email.as_str(), "alice@example.com");
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "alice@example.com");
        assert!(sent[0].1.starts_with("http://localhost:8000/account-confirm?token="));
        assert!(f.usecase.list_users().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_確認リンクのトークンでユーザーが作成される() {
        // Given
        let f = fixture();
        f.usecase
            .register(register_input("password123", "password123"))
            .await
            .unwrap();
        let token = token_from(&f.mailer.sent()[0].1);

        // When
        let user_id = f.usecase.confirm_account(&token).await.unwrap();

        // Then
        let user = f.usecase.get_user(&user_id).await.unwrap();
        assert_eq!(user.email().as_str(), "alice@example.com");
        assert_eq!(user.password().as_str(), "hashed:password123");
    }

    #[tokio::test]
    async fn test_同じ確認リンクを二度使うとforbidden() {
        let f = fixture();
        f.usecase
            .register(register_input("password123", "password123"))
            .await
            .unwrap();
        let token = token_from(&f.mailer.sent()[0].1);
        f.usecase.confirm_account(&token).await.unwrap();

        let problem = f.usecase.confirm_account(&token).await.unwrap_err();

        assert_eq!(problem.kind(), Kind::Forbidden);
        assert_eq!(problem.detail(), Some("email has been used"));
    }

    #[tokio::test]
    async fn test_不正な確認トークンはinvalid_request() {
        let f = fixture();

        let problem = f.usecase.confirm_account("garbage").await.unwrap_err();

        assert_eq!(problem.kind(), Kind::InvalidRequest);
    }

    #[tokio::test]
    async fn test_使用済みのメールアドレスはforbidden() {
        let f = fixture();
        existing_user(&f.db);

        let problem = f
            .usecase
            .register(register_input("password123", "password123"))
            .await
            .unwrap_err();

        assert_eq!(problem.kind(), Kind::Forbidden);
        assert_eq!(problem.title(), Some("Failed to register user"));
        assert_eq!(problem.detail(), Some("email has been used"));
        assert!(f.mailer.sent().is_empty());
    }

    #[tokio::test]
    async fn test_確認用パスワードの不一致はinvalid_request() {
        let f = fixture();

        let problem = f
            .usecase
            .register(register_input("password123", "password124"))
            .await
            .unwrap_err();

        assert_eq!(problem.kind(), Kind::InvalidRequest);
        assert_eq!(problem.detail(), Some("password confirmation does not match"));
    }

    #[tokio::test]
    async fn test_ログインでアクセストークンが発行される() {
        // Given
        let f = fixture();
        let user = existing_user(&f.db);

        // When
        let token = f
            .usecase
            .login(LoginInput {
                email:    "alice@example.com".to_string(),
                password: PlainPassword::new("password123"),
            })
            .await
            .unwrap();

        // Then
        assert_eq!(&f.tokens.verify_access(&token).unwrap(), user.id());
    }

    #[tokio::test]
    async fn test_パスワード誤りはinvalid_request() {
        let f = fixture();
        existing_user(&f.db);

        let problem = f
            .usecase
            .login(LoginInput {
                email:    "alice@example.com".to_string(),
                password: PlainPassword::new("wrong"),
            })
            .await
            .unwrap_err();

        assert_eq!(problem.kind(), Kind::InvalidRequest);
        assert_eq!(problem.title(), Some("Failed to validate password"));
    }

    #[tokio::test]
    async fn test_未登録のメールアドレスでのログインはnot_exist() {
        let f = fixture();

        let problem = f
            .usecase
            .login(LoginInput {
                email:    "nobody@example.com".to_string(),
                password: PlainPassword::new("password123"),
            })
            .await
            .unwrap_err();

        assert_eq!(problem.kind(), Kind::NotExist);
    }

    #[tokio::test]
    async fn test_存在しないユーザーの取得はnot_exist() {
        let f = fixture();

        let problem = f.usecase.get_user(&UserId::new()).await.unwrap_err();

        assert_eq!(problem.kind(), Kind::NotExist);
        assert_eq!(problem.title(), Some("Failed to get user"));
    }
}
