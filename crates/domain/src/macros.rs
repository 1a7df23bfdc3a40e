/// UUID ベースの ID 型を定義する宣言型マクロ
///
/// 以下を一括生成する:
/// - Newtype 構造体（`Uuid` をラップ）
/// - `derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Display)`
/// - `new()`: UUID v7 を生成
/// - `from_uuid()` / `as_uuid()`
/// - `FromStr`（パース失敗は `uuid::Error`）
///
/// # 使用例
///
/// ```rust
/// use courseworker_domain::user::UserId;
///
/// let id = UserId::new();
/// let restored: UserId = id.to_string().parse().unwrap();
/// assert_eq!(id, restored);
/// ```
macro_rules! define_uuid_id {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident;
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq, Hash,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(uuid::Uuid);

        impl $Name {
            /// 新しい ID を生成する（UUID v7）
            pub fn new() -> Self {
                Self(uuid::Uuid::now_v7())
            }

            pub fn from_uuid(uuid: uuid::Uuid) -> Self {
                Self(uuid)
            }

            pub fn as_uuid(&self) -> &uuid::Uuid {
                &self.0
            }
        }

        impl Default for $Name {
            fn default() -> Self {
                Self::new()
            }
        }

        impl std::str::FromStr for $Name {
            type Err = uuid::Error;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                uuid::Uuid::parse_str(s).map(Self)
            }
        }
    };
}

/// 検証付き String Newtype を定義する宣言型マクロ
///
/// - `new()`: trim + 空チェック + 最大長チェック。失敗時は
///   `Kind::Validation` の [`Problem`](crate::error::Problem) を返し、
///   params に `field` 名と理由を積む
/// - `as_str()` / `into_string()`
///
/// # 引数
///
/// - `field`: リクエスト上のフィールド名（params の name に使う）
/// - `max_length`: 最大文字数（`chars().count()` でカウント）
macro_rules! define_validated_string {
    (
        $(#[$meta:meta])*
        $vis:vis struct $Name:ident {
            field: $field:expr,
            max_length: $max_length:expr $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(
            Debug, Clone, PartialEq, Eq,
            serde::Serialize, serde::Deserialize,
            derive_more::Display,
        )]
        #[display("{_0}")]
        #[serde(transparent)]
        $vis struct $Name(String);

        impl $Name {
            pub fn new(value: impl Into<String>) -> Result<Self, $crate::error::Problem> {
                let value = value.into().trim().to_string();

                if value.is_empty() {
                    return Err($crate::error::Problem::builder()
                        .kind($crate::error::Kind::Validation)
                        .title("Invalid field value")
                        .detail(format!("{} must not be empty", $field))
                        .param($field, "this field is required")
                        .build());
                }

                if value.chars().count() > $max_length {
                    return Err($crate::error::Problem::builder()
                        .kind($crate::error::Kind::Validation)
                        .title("Invalid field value")
                        .detail(format!(
                            "{} must be at most {} characters",
                            $field, $max_length
                        ))
                        .param(
                            $field,
                            format!("must be at most {} characters", $max_length),
                        )
                        .build());
                }

                Ok(Self(value))
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            pub fn into_string(self) -> String {
                self.0
            }
        }
    };
}
