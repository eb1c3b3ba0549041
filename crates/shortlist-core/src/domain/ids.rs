//! Domain identifiers (strongly-typed IDs).
//!
//! # ULID ベースの ID + ジェネリック実装
//! `Id<T>` というジェネリック型で共通実装を提供し、`T` は実行時には使わない
//! マーカー型（PhantomData）としてコンパイル時の型安全性を与えます。
//!
//! ## ULID の特性
//! - **時刻でソート可能**: 生成順に並ぶので、実行一覧が起動順になる
//! - **分散生成可能**: 調整なしで生成できる
//!
//! ## 型の種類
//! - `RunId`: `run-...`（オーケストレーション 1 回分）
//! - `PassId`: `pass-...`（ランキング 1 回分）

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use ulid::Ulid;

/// IdMarker は各 ID 型のマーカー trait
pub trait IdMarker: Send + Sync + 'static {
    /// Display prefix (e.g. `"run-"`).
    fn prefix() -> &'static str;
}

/// ULID ベースの汎用 ID
#[repr(transparent)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Id<T: IdMarker> {
    ulid: Ulid,
    #[serde(skip)]
    _marker: PhantomData<T>,
}

impl<T: IdMarker> Id<T> {
    pub fn from_ulid(ulid: Ulid) -> Self {
        Self {
            ulid,
            _marker: PhantomData,
        }
    }

    pub fn as_ulid(&self) -> Ulid {
        self.ulid
    }
}

impl<T: IdMarker> From<Ulid> for Id<T> {
    fn from(ulid: Ulid) -> Self {
        Self::from_ulid(ulid)
    }
}

impl<T: IdMarker> fmt::Display for Id<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", T::prefix(), self.ulid)
    }
}

/// Marker for one orchestrator run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Run {}

impl IdMarker for Run {
    fn prefix() -> &'static str {
        "run-"
    }
}

/// Marker for one ranking pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Pass {}

impl IdMarker for Pass {
    fn prefix() -> &'static str {
        "pass-"
    }
}

/// Identifier of an orchestrator `run` invocation.
pub type RunId = Id<Run>;

/// Identifier of a ranking pass (one `rank` + `shortlist` over a record set).
pub type PassId = Id<Pass>;
