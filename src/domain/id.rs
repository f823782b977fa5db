//! 64-bit identifiers and the allocator seam.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Mutex;

/// Opaque, comparable entity id. Non-positive values are never issued.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Id(i64);

impl Id {
    pub const INVALID: Id = Id(0);

    pub const fn new(raw: i64) -> Self {
        Self(raw)
    }

    pub const fn get(self) -> i64 {
        self.0
    }

    pub const fn is_valid(self) -> bool {
        self.0 > 0
    }
}

impl fmt::Display for Id {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for Id {
    fn from(raw: i64) -> Self {
        Self(raw)
    }
}

/// Produces fresh, non-zero ids.
pub trait IdGenerator: Send + Sync {
    fn next_id(&self) -> Id;
}

/// 2020-01-01T00:00:00Z in unix milliseconds.
const EPOCH_MS: i64 = 1_577_836_800_000;
const SHARD_BITS: u32 = 13;
const SEQ_BITS: u32 = 9;
const SHARD_MASK: u64 = (1 << SHARD_BITS) - 1;
const SEQ_MASK: u64 = (1 << SEQ_BITS) - 1;

/// Time-ordered ids: `millis(41) | shard(13) | sequence(9)`, always positive.
///
/// The sequence restarts every millisecond. Once 512 ids are handed out in
/// one millisecond the generator waits for the clock to move on.
#[derive(Debug)]
pub struct ShardedIdGenerator {
    shard: u64,
    /// `(millis of the last id, sequence used in that millisecond)`.
    state: Mutex<(u64, u64)>,
}

impl ShardedIdGenerator {
    pub fn new(shard: u16) -> Self {
        Self {
            shard: u64::from(shard) & SHARD_MASK,
            state: Mutex::new((0, 0)),
        }
    }

    /// Picks the shard from random bytes.
    pub fn random() -> Self {
        let bytes = uuid::Uuid::new_v4().into_bytes();
        Self::new(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    pub fn shard(&self) -> u16 {
        self.shard as u16
    }
}

impl IdGenerator for ShardedIdGenerator {
    fn next_id(&self) -> Id {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        let (last, used) = *state;
        // A clock step backwards keeps issuing from the last millisecond.
        let mut millis = elapsed_millis().max(last);
        let seq = if millis == last {
            if used >= SEQ_MASK {
                while millis <= last {
                    std::hint::spin_loop();
                    millis = elapsed_millis();
                }
                0
            } else {
                used + 1
            }
        } else {
            0
        };
        *state = (millis, seq);
        drop(state);

        let raw = (millis << (SHARD_BITS + SEQ_BITS)) | (self.shard << SEQ_BITS) | seq;
        Id((raw & i64::MAX as u64) as i64)
    }
}

fn elapsed_millis() -> u64 {
    (Utc::now().timestamp_millis() - EPOCH_MS).max(1) as u64
}
