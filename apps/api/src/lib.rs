//! # courseworker API ライブラリ
//!
//! 講座・タスク管理 API のユースケース・ハンドラ・ルーター構築を公開する。
//! バイナリ（`main.rs`）はインフラ初期化とサーバー起動だけを行う。
//!
//! ## モジュール構成
//!
//! - `app_builder`: DI とルーター構築
//! - `config`: 環境変数からの設定読み込み
//! - `error`: エラーから HTTP レスポンスへの変換
//! - `extract`: 検証付き JSON 抽出器
//! - `handler`: HTTP ハンドラ
//! - `middleware`: 認証・リクエストコンテキスト
//! - `usecase`: ビジネスロジック

pub mod app_builder;
pub mod config;
pub mod error;
pub mod extract;
pub mod handler;
pub mod middleware;
pub mod usecase;

// テストユーティリティ（内部実装、ドキュメントからは隠す）
#[cfg(any(test, feature = "test-utils"))]
#[doc(hidden)]
pub mod test_utils;
