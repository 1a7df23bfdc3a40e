//! ユースケース層の共通ヘルパー
//!
//! リポジトリ呼び出し結果を `Problem` に変換するパターンを共通化する。
//!
//! | 入力 | 変換 |
//! |------|------|
//! | `InfraError` | `Kind::Database` |
//! | `Ok(None)` / `None` | `Kind::NotExist` |
//! | `Ok(false)`（影響行なし） | `Kind::NotExist`（title: `No row affected`） |
//! | 下位の `Problem` | op と title だけを付けてラップ（kind は引き継ぐ） |
//! | 値オブジェクトの検証エラー | `Kind::InvalidRequest`（detail / params は引き継ぐ） |

use courseworker_domain::error::{Kind, Problem};
use courseworker_infra::InfraError;

/// `InfraError` を `Kind::Database` の Problem に変換する
pub(crate) fn database_problem(op: &'static str, title: &str, err: InfraError) -> Problem {
    Problem::builder()
        .op(op)
        .kind(Kind::Database)
        .title(title)
        .cause(err)
        .build()
}

/// 下位の Problem に op と title を付けてラップする
///
/// kind は設定しないため、下位の kind（Forbidden / NotExist / Database）がそのまま残る。
pub(crate) fn rewrap(op: &'static str, title: &'static str) -> impl FnOnce(Problem) -> Problem {
    move |inner| Problem::builder().op(op).title(title).cause(inner).build()
}

/// 入力値の検証エラー（`Kind::Validation`）をクライアント起因のエラーとしてラップする
///
/// 検証理由（detail / params）は内側から引き継がれる。
pub(crate) fn invalid_input(op: &'static str) -> impl FnOnce(Problem) -> Problem {
    move |inner| {
        Problem::builder()
            .op(op)
            .kind(Kind::InvalidRequest)
            .title("Invalid request")
            .cause(inner)
            .build()
    }
}

/// 外部サービス（トークン・メール・ハッシュ）の失敗を `Kind::Internal` に変換する
pub(crate) fn internal_problem(op: &'static str, title: &str, err: InfraError) -> Problem {
    Problem::builder()
        .op(op)
        .kind(Kind::Internal)
        .title(title)
        .cause(err)
        .build()
}

/// リポジトリの `Result<T, InfraError>` を `Result<T, Problem>` に変換する
pub(crate) trait InfraResultExt<T> {
    fn or_database(self, op: &'static str, title: &str) -> Result<T, Problem>;
}

impl<T> InfraResultExt<T> for Result<T, InfraError> {
    fn or_database(self, op: &'static str, title: &str) -> Result<T, Problem> {
        self.map_err(|e| database_problem(op, title, e))
    }
}

/// 検索結果の `Option<T>` を `Result<T, Problem>` に変換する
///
/// 取得失敗と未存在で title を分けたいときは [`InfraResultExt::or_database`] と組み合わせる。
///
/// ```ignore
/// let course = self.courses.find_by_id(course_id).await
///     .or_database(OP, "Failed to get course")?
///     .or_not_exist(OP, "Course not found", || format!("..."))?;
/// ```
pub(crate) trait OptionExt<T> {
    fn or_not_exist(
        self,
        op: &'static str,
        title: &str,
        detail: impl FnOnce() -> String,
    ) -> Result<T, Problem>;
}

impl<T> OptionExt<T> for Option<T> {
    fn or_not_exist(
        self,
        op: &'static str,
        title: &str,
        detail: impl FnOnce() -> String,
    ) -> Result<T, Problem> {
        self.ok_or_else(|| {
            Problem::builder()
                .op(op)
                .kind(Kind::NotExist)
                .title(title)
                .detail(detail())
                .build()
        })
    }
}

/// リポジトリの `Result<Option<T>, InfraError>` を `Result<T, Problem>` に変換する
///
/// 取得失敗（`Kind::Database`）と未存在（`Kind::NotExist`）に同じ title を使う。
pub(crate) trait FindResultExt<T> {
    fn or_not_found(
        self,
        op: &'static str,
        title: &str,
        detail: impl FnOnce() -> String,
    ) -> Result<T, Problem>;
}

impl<T> FindResultExt<T> for Result<Option<T>, InfraError> {
    fn or_not_found(
        self,
        op: &'static str,
        title: &str,
        detail: impl FnOnce() -> String,
    ) -> Result<T, Problem> {
        self.or_database(op, title)?.or_not_exist(op, title, detail)
    }
}

/// 更新・削除の `Result<bool, InfraError>` を `Result<(), Problem>` に変換する
pub(crate) trait AffectedResultExt {
    fn or_no_row(self, op: &'static str, title: &str) -> Result<(), Problem>;
}

impl AffectedResultExt for Result<bool, InfraError> {
    fn or_no_row(self, op: &'static str, title: &str) -> Result<(), Problem> {
        if self.or_database(op, title)? {
            Ok(())
        } else {
            Err(Problem::builder()
                .op(op)
                .kind(Kind::NotExist)
                .title("No row affected")
                .detail(format!("{title}: the target row no longer exists"))
                .build())
        }
    }
}
