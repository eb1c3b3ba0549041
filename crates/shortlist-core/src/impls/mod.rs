//! Impls - 協調者のローカル実装
//!
//! - **PlainTextExtractor** / **FieldRecordParser**: テキスト文書 → レコード
//! - **StaticSource** / **UnavailableSource**: プロセス内のソース
//! - **KeywordScorer** / **NeutralScorer**: `ScoringBackend` で選ぶスコアリング
//!
//! ネットワーク越しのソースやモデルベースの scorer はこの crate の外に置き、
//! 同じ ports 経由で差し込みます。

pub mod document;
pub mod scoring;
pub mod source;

pub use self::document::{FieldRecordParser, PlainTextExtractor};
pub use self::scoring::{KeywordScorer, NeutralScorer, quality_band};
pub use self::source::{StaticSource, UnavailableSource};
