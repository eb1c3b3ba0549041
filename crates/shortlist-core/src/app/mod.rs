//! App - ports の上に構築する協調レイヤー
//!
//! # コンポーネント（葉から順に）
//! - **TaskRunner**: エンベロープを 1 つ実行し、あらゆる失敗を `Outcome` にする
//! - **FanOut**: 複数のエンベロープを並行に起動し、すべてを join する
//! - **aggregate**: ステージ出力を origin 付きでマージし、件数を数える
//! - **RankingEngine**: スコア → 安定ソート → ランク → ショートリスト
//! - **Orchestrator**: モードに従ってステージを順序付ける
//! - **OrchestratorBuilder**: 配線と fail-fast な検証

pub mod aggregate;
pub mod builder;
pub mod fan_out;
pub mod orchestrator;
pub mod ranking;
pub mod runner;
pub mod status;

pub use self::aggregate::{Aggregation, StageOutputs, adopt_aggregated, aggregate};
pub use self::builder::OrchestratorBuilder;
pub use self::fan_out::{FanOut, FanOutReport, Unit, UnitOutcome};
pub use self::orchestrator::{
    Mode, OrchestrationReport, OrchestrationRequest, Orchestrator, SOURCE_FILE_KEY,
};
pub use self::ranking::{NOTHING_TO_RANK, RankingEngine, order_and_rank};
pub use self::runner::TaskRunner;
pub use self::status::{Stage, StageFailure, StageStatus};
