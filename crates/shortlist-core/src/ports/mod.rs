//! Ports - 協調者インターフェース
//!
//! 各 trait はコアの外側との継ぎ目です（文書読み込み、外部ソース、
//! スコアリング判断、時刻、ID 生成）。app レイヤーはこれらの trait にだけ
//! 依存し、ローカル実装は `impls` にあります。

pub mod clock;
pub mod extractor;
pub mod id_generator;
pub mod scorer;
pub mod source;

pub use self::clock::{Clock, FixedClock, SystemClock};
pub use self::extractor::{RecordParser, TextExtractor};
pub use self::id_generator::{IdGenerator, UlidGenerator};
pub use self::scorer::{Scorer, Summarizer};
pub use self::source::{SearchRequest, SourceQuery};
