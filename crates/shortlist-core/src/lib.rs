//! shortlist-core
//!
//! 失敗しうる作業単位（ドキュメント解析、ソース検索、スコアリング呼び出し）を
//! 並行に実行し、成功した結果をマージしてショートリストにランク付けします。
//! 1 つの単位が失敗しても、兄弟の単位は巻き込まれません。
//!
//! # モジュール構成
//! - **domain**: レコード、origin、エンベロープ、Outcome、スコア、エラー
//! - **ports**: 協調者の trait（extractor, parser, source, scorer, clock, ids）
//! - **app**: runner, fan-out, aggregator, ranking engine, orchestrator
//! - **impls**: ローカル実装
//! - **config** / **logging**: 設定と tracing の初期化

pub mod app;
pub mod config;
pub mod domain;
pub mod impls;
pub mod logging;
pub mod ports;

pub use app::{OrchestrationReport, OrchestrationRequest, Orchestrator, OrchestratorBuilder};
pub use config::Settings;
pub use domain::{CoreError, CoreResult};
