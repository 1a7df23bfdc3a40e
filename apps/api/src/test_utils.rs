//! # テストユーティリティ
//!
//! ハンドラテスト・結合テストで使う、インメモリモックで組み立てたアプリケーション。

#[cfg(test)]
pub(crate) mod log_capture;
mod test_app;

pub use test_app::{BASE_URL, TestApp};
