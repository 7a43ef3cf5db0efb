//! Ids for sub-records created during an editing session.

use crate::clock::Clock;
use std::sync::Arc;

/// Mints ids for new sub-records before they join the draft.
///
/// Ids are `<millis>-<counter>`: the millisecond part never goes backwards
/// (a clock that steps back is clamped to the last value seen) and the
/// counter distinguishes ids minted within the same millisecond. Two ids from
/// one allocator are therefore always distinct.
pub struct IdentityAllocator {
    clock: Arc<dyn Clock>,
    last_millis: i64,
    counter: u32,
}

impl IdentityAllocator {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            last_millis: i64::MIN,
            counter: 0,
        }
    }

    pub fn next_id(&mut self) -> String {
        let now = self.clock.now().timestamp_millis();
        if now > self.last_millis {
            self.last_millis = now;
            self.counter = 0;
        } else {
            self.counter += 1;
        }
        format!("{}-{}", self.last_millis, self.counter)
    }
}
