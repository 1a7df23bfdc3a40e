//! # 構造化エラー（Problem）
//!
//! 呼び出し経路（op）・分類（kind）・利用者向けの説明（title / detail）を
//! レイヤーを跨いで運ぶための連鎖型エラー。
//!
//! ## 設計方針
//!
//! - **ビルダーで構築**: [`Problem::builder`] で必要な断片だけを指定する。
//!   断片を一つも指定しない `build()` は呼び出し側のバグとして panic する
//! - **構築時マージ**: 原因（cause）が `Problem` の場合、構築時に一度だけ
//!   マージ規則を適用し、新しい合成値を返す。既存の値を書き換えることはない
//! - **メッセージは原因に委譲**: `Display` は原因のメッセージをそのまま返す。
//!   title / detail は構造化メタデータであり、フラットなメッセージには含めない
//! - **分類は閉じた列挙型**: [`Kind`] は実行時に拡張しない。
//!   HTTP ステータスやログラベルへの対応表は API 層の変換器だけが持つ
//!
//! ## マージ規則
//!
//! 外側（これから作る Problem）と内側（cause の Problem）について:
//!
//! | # | 条件 | 結果 |
//! |---|------|------|
//! | 1 | 外側の kind が未設定（`Other`） | 内側の kind を採用し、内側は `Other` に戻す |
//! | 2 | title が同一 | 内側の title を消す |
//! | 3 | 外側の title が未設定 | 内側の title をコピーする（内側は保持） |
//! | 4 | detail が同一 | 内側の detail を消す |
//! | 5 | 外側の detail が未設定 | 内側の detail を外側へ移動する |
//!
//! params は detail と同じく、外側が空なら外側へ移動する。
//!
//! ## 使用例
//!
//! ```rust
//! use courseworker_domain::error::{Kind, Problem, op_stack};
//!
//! let repo = Problem::builder()
//!     .op("repo/GetCourseByID")
//!     .kind(Kind::NotExist)
//!     .title("Course not found")
//!     .detail("The requested course with id 42 could not be found")
//!     .cause("no rows in result set")
//!     .build();
//! let serv = Problem::builder()
//!     .op("serv/GetCourseByID")
//!     .title("Failed to get course")
//!     .cause(repo)
//!     .build();
//!
//! assert_eq!(serv.kind(), Kind::NotExist);
//! assert_eq!(serv.title(), Some("Failed to get course"));
//! assert_eq!(serv.to_string(), "no rows in result set");
//! assert_eq!(op_stack(&serv), vec!["repo/GetCourseByID", "serv/GetCourseByID"]);
//! ```

use std::{error::Error as StdError, fmt};

use serde::{Deserialize, Serialize};

/// 任意のエラーを保持するための型
///
/// `&str` / `String` からも `Into` で変換できる（終端メッセージとして扱われる）。
pub type BoxError = Box<dyn StdError + Send + Sync + 'static>;

/// エラーの分類
///
/// `Other` は「未設定」を意味し、ラップ時に内側の分類で上書きされる。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Kind {
    /// 未分類
    #[default]
    Other,
    /// 呼び出し側の入力が不正
    InvalidRequest,
    /// 作成しようとしたリソースが既に存在する
    Exist,
    /// リソースが存在しない
    NotExist,
    /// フィールドの意味的な検証に失敗した
    Validation,
    /// 認可されていない操作
    Forbidden,
    /// 永続化層の障害
    Database,
    /// 上記以外の想定外だが識別済みの障害
    Internal,
}

/// リクエストのどのフィールドがなぜ不正かを表す
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProblemParam {
    pub name:   String,
    pub reason: String,
}

impl ProblemParam {
    pub fn new(name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            name:   name.into(),
            reason: reason.into(),
        }
    }
}

/// 構造化エラー
///
/// 詳細はモジュールドキュメントを参照。
#[derive(Debug)]
pub struct Problem {
    op:     Option<&'static str>,
    kind:   Kind,
    title:  Option<String>,
    detail: Option<String>,
    params: Vec<ProblemParam>,
    cause:  Option<BoxError>,
}

impl Problem {
    /// ビルダーを作成する
    pub fn builder() -> ProblemBuilder {
        ProblemBuilder::default()
    }

    /// op ラベルだけを付けて既存のエラーをラップする
    ///
    /// kind / title / detail は内側から引き継がれる。
    pub fn wrap(op: &'static str, cause: impl Into<BoxError>) -> Self {
        Self::builder().op(op).cause(cause).build()
    }

    pub fn op(&self) -> Option<&'static str> {
        self.op
    }

    pub fn kind(&self) -> Kind {
        self.kind
    }

    pub fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    pub fn detail(&self) -> Option<&str> {
        self.detail.as_deref()
    }

    pub fn params(&self) -> &[ProblemParam] {
        &self.params
    }

    /// 内側の Problem を取り込み、マージ後の内側を返す
    fn absorb(&mut self, mut inner: Problem) -> Problem {
        if self.kind == Kind::Other {
            self.kind = inner.kind;
            inner.kind = Kind::Other;
        }

        if inner.title.is_some() && inner.title == self.title {
            inner.title = None;
        }
        if self.title.is_none() {
            self.title.clone_from(&inner.title);
        }

        if inner.detail.is_some() && inner.detail == self.detail {
            inner.detail = None;
        }
        if self.detail.is_none() {
            self.detail = inner.detail.take();
        }

        if self.params.is_empty() {
            self.params = std::mem::take(&mut inner.params);
        }

        inner
    }
}

impl fmt::Display for Problem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.cause, &self.detail, &self.title) {
            (Some(cause), _, _) => write!(f, "{cause}"),
            (None, Some(detail), _) => f.write_str(detail),
            (None, None, Some(title)) => f.write_str(title),
            (None, None, None) => Ok(()),
        }
    }
}

impl StdError for Problem {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.cause
            .as_deref()
            .map(|cause| cause as &(dyn StdError + 'static))
    }
}

/// [`Problem`] のビルダー
#[derive(Debug, Default)]
#[must_use]
pub struct ProblemBuilder {
    op:     Option<&'static str>,
    kind:   Option<Kind>,
    title:  Option<String>,
    detail: Option<String>,
    params: Vec<ProblemParam>,
    cause:  Option<BoxError>,
}

impl ProblemBuilder {
    /// 呼び出し元のラベル（例: `"serv/GetCourseByID"`）
    pub fn op(mut self, op: &'static str) -> Self {
        self.op = Some(op);
        self
    }

    pub fn kind(mut self, kind: Kind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }

    pub fn param(mut self, name: impl Into<String>, reason: impl Into<String>) -> Self {
        self.params.push(ProblemParam::new(name, reason));
        self
    }

    pub fn params(mut self, params: impl IntoIterator<Item = ProblemParam>) -> Self {
        self.params.extend(params);
        self
    }

    /// 原因となるエラー
    ///
    /// `Problem` を渡すと構築時にマージ規則が適用される。
    pub fn cause(mut self, cause: impl Into<BoxError>) -> Self {
        self.cause = Some(cause.into());
        self
    }

    fn is_empty(&self) -> bool {
        self.op.is_none()
            && self.kind.is_none()
            && self.title.is_none()
            && self.detail.is_none()
            && self.params.is_empty()
            && self.cause.is_none()
    }

    /// Problem を構築する
    ///
    /// # Panics
    ///
    /// 断片が一つも指定されていない場合。
    pub fn build(self) -> Problem {
        assert!(
            !self.is_empty(),
            "Problem を断片なしで構築することはできません"
        );

        let mut problem = Problem {
            op:     self.op,
            kind:   self.kind.unwrap_or_default(),
            title:  self.title,
            detail: self.detail,
            params: self.params,
            cause:  None,
        };

        let cause = self.cause.map(|cause| match cause.downcast::<Problem>() {
            Ok(inner) => Box::new(problem.absorb(*inner)) as BoxError,
            Err(other) => other,
        });
        problem.cause = cause;

        problem
    }
}

/// エラー連鎖から最初に見つかった [`Problem`] を返す
pub fn find_problem<'a>(err: &'a (dyn StdError + 'static)) -> Option<&'a Problem> {
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(problem) = e.downcast_ref::<Problem>() {
            return Some(problem);
        }
        current = e.source();
    }
    None
}

/// エラー連鎖に含まれる op ラベルを、積み上げられた順（最も内側が先頭）で返す
///
/// 外側から内側へ `source()` を辿りながら発見順の番号付きで集め、
/// 番号の降順に並べ替える。
pub fn op_stack(err: &(dyn StdError + 'static)) -> Vec<&'static str> {
    let mut found: Vec<(usize, &'static str)> = Vec::new();
    let mut current = Some(err);
    let mut depth = 0;

    while let Some(e) = current {
        if let Some(op) = e.downcast_ref::<Problem>().and_then(Problem::op) {
            found.push((depth, op));
        }
        depth += 1;
        current = e.source();
    }

    found.sort_by(|a, b| b.0.cmp(&a.0));
    found.into_iter().map(|(_, op)| op).collect()
}
