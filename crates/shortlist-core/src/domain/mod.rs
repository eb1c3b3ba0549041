//! Domain モデル（ID、エンベロープ、Outcome、レコード、スコア、ランキング）

pub mod envelope;
pub mod errors;
pub mod ids;
pub mod outcome;
pub mod ranking;
pub mod record;
pub mod score;
pub mod state;
pub mod target;
pub mod task_type;

pub use self::envelope::{EnvelopeSummary, ErrorEntry, ResultEntry, TaskEnvelope};
pub use self::errors::{
    CoreError, CoreResult, ExtractError, ScoringError, SourceError, SummaryError, TaskError,
};
pub use self::ids::{PassId, RunId};
pub use self::outcome::{Outcome, OutcomeKind};
pub use self::ranking::{RankedRecord, RankingReport, RankingStatus, Shortlist};
pub use self::record::{ORIGIN_KEY, Origin, Record};
pub use self::score::{FALLBACK_OVERALL, FALLBACK_QUALITY, ScoreBlock};
pub use self::state::EnvelopeState;
pub use self::target::TargetSpec;
pub use self::task_type::TaskKind;
