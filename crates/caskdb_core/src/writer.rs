//! Writer loop.
//!
//! All mutations funnel through one rendezvous queue consumed by a
//! single dedicated thread. The writer is the sole mutator of the
//! active file handle, the write offset, the segment list, and the
//! index, which removes any need for locking around the append path
//! and makes crash recovery exactly "replay the append log".
//!
//! Per request the loop:
//!
//! 1. encodes the record and appends it to the active segment;
//! 2. installs `index[key] = (active_id, offset)` under the state
//!    mutex;
//! 3. rolls to a fresh segment once the offset reaches the size
//!    threshold, and invokes the compactor synchronously when the
//!    post-roll segment list holds [`MERGE_SEGMENT_COUNT`] segments;
//! 4. sends the outcome on the request's reply channel.
//!
//! The first error from encode/append/roll/merge is surfaced on the
//! reply channel; nothing is retried or re-queued.

use crate::compact;
use crate::error::CoreResult;
use crate::keydir::Position;
use crate::record::Record;
use crate::segment::ActiveSegment;
use crate::store::Shared;
use crossbeam_channel::{Receiver, Sender};
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::debug;

/// Segment count that triggers a merge after rollover.
pub(crate) const MERGE_SEGMENT_COUNT: usize = 3;

/// One queued mutation, paired with the channel its outcome is
/// reported on.
pub(crate) struct WriteRequest {
    pub key: Vec<u8>,
    pub value: Vec<u8>,
    pub reply: Sender<CoreResult<()>>,
}

/// The single serializing agent. Owns the active segment for the life
/// of the store.
pub(crate) struct WriterLoop {
    shared: Arc<Shared>,
    active: ActiveSegment,
}

impl WriterLoop {
    pub fn new(shared: Arc<Shared>, active: ActiveSegment) -> Self {
        Self { shared, active }
    }

    /// Consumes requests until every sender is dropped, then exits,
    /// closing the active file.
    pub fn run(mut self, requests: Receiver<WriteRequest>) {
        for request in requests.iter() {
            let result = self.apply(request.key, request.value);
            // A caller that gave up on the reply doesn't fail the loop.
            let _ = request.reply.send(result);
        }
        debug!("writer loop stopped");
    }

    fn apply(&mut self, key: Vec<u8>, value: Vec<u8>) -> CoreResult<()> {
        let record = Record::new(key, value);
        let encoded = record.encode()?;
        let at = self.active.append(&encoded)?;

        {
            let mut state = self.shared.state.lock();
            state.index.insert(
                record.key,
                Position {
                    segment: self.active.id,
                    offset: at,
                },
            );
        }

        if self.active.offset >= self.shared.segment_size.load(Ordering::Relaxed) {
            self.roll()?;
        }

        Ok(())
    }

    /// Seals the active segment and opens a fresh one. A failure here
    /// leaves the old active segment in place.
    fn roll(&mut self) -> CoreResult<()> {
        let path = self.shared.dir.fresh_segment_path();
        let id = self.shared.state.lock().segments.len();
        let next = ActiveSegment::create(path.clone(), id)?;
        self.shared.dir.sync_dir()?;

        let count = {
            let mut state = self.shared.state.lock();
            state.segments.push(path);
            state.segments.len()
        };
        // The previous active file handle closes here; the segment it
        // wrote is sealed from now on.
        self.active = next;

        debug!(
            sealed = self.active.id.saturating_sub(1),
            segments = count,
            "rolled to new active segment"
        );

        if count >= MERGE_SEGMENT_COUNT {
            compact::merge(&self.shared, &mut self.active)?;
        }

        Ok(())
    }
}
