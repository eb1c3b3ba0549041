//! IdGenerator port - `Clock` 駆動の ULID 生成

use crate::domain::ids::{PassId, RunId};
use crate::ports::Clock;
use ulid::Ulid;

/// IdGenerator は run / pass の ID を生成
///
/// 1 つのオーケストレーターが重なった run を処理するので `Send + Sync`。
pub trait IdGenerator: Send + Sync {
    fn generate_run_id(&self) -> RunId;

    fn generate_pass_id(&self) -> PassId;
}

/// UlidGenerator - タイムスタンプは clock から、残りは乱数
pub struct UlidGenerator<C> {
    clock: C,
}

impl<C: Clock> UlidGenerator<C> {
    pub fn new(clock: C) -> Self {
        Self { clock }
    }

    fn next_ulid(&self) -> Ulid {
        let timestamp_ms = self.clock.now().timestamp_millis() as u64;
        Ulid::from_parts(timestamp_ms, rand::random())
    }
}

impl<C: Clock> IdGenerator for UlidGenerator<C> {
    fn generate_run_id(&self) -> RunId {
        RunId::from(self.next_ulid())
    }

    fn generate_pass_id(&self) -> PassId {
        PassId::from(self.next_ulid())
    }
}
