//! Document ports - アップロードされたファイルをレコードにする
//!
//! 2 段階に分かれています:
//! - `TextExtractor`: ファイルを生テキストに読む（形式ごと）
//! - `RecordParser`: 生テキストを `Record` に構造化する

use std::path::Path;

use async_trait::async_trait;

use crate::domain::errors::ExtractError;
use crate::domain::record::Record;

#[async_trait]
pub trait TextExtractor: Send + Sync {
    /// Read `path` into raw text. Fails with `UnsupportedFormat` for formats
    /// this extractor does not handle.
    async fn extract(&self, path: &Path) -> Result<String, ExtractError>;
}

#[async_trait]
pub trait RecordParser: Send + Sync {
    async fn parse(&self, text: &str) -> Result<Record, ExtractError>;
}
