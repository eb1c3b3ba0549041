//! SourceQuery port - 候補レコードを返す外部ソース 1 つ分

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::errors::SourceError;
use crate::domain::record::Record;

/// Query sent to every selected source.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchRequest {
    pub title: String,

    #[serde(default)]
    pub location: String,

    #[serde(default)]
    pub keywords: Vec<String>,

    /// Upper bound on records a source should return.
    #[serde(default)]
    pub limit: Option<usize>,
}

impl SearchRequest {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}

/// 外部ソース
///
/// # 並行性
/// 実装は再入可能であること。fan-out は他のソースや他の run と並行に
/// `search` を呼ぶ。
#[async_trait]
pub trait SourceQuery: Send + Sync {
    /// 安定したソース名。返すレコードの `Origin::Source` タグになる
    fn name(&self) -> &str;

    async fn search(&self, request: &SearchRequest) -> Result<Vec<Record>, SourceError>;
}
