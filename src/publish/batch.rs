use crate::blocks::Block;
use crate::normalize::normalize;
use crate::publish::store::Reply;
use crate::publish::{BlockStore, PublishError, PublishReport};
use serde_json::Value;
use std::ops::Range;

/// The remote store's limit on children per request.
pub const MAX_BLOCKS_PER_REQUEST: usize = 100;

/// Sends blocks to a [`BlockStore`] in order, in chunks, recovering from rejected chunks.
///
/// If the store rejects a chunk with a structured error, the chunk is bisected: each half is sent on its own, and a
/// half that fails is bisected again, until the failure is pinned on single blocks. Those are skipped with a warning
/// and everything else lands. Bisection works through an explicit task stack, first half before second half, so
/// blocks still land in document order.
///
/// Transport failures without a structured body, and replies that aren't JSON objects, abort the publish.
pub struct BatchPublisher<'s, S> {
    store: &'s mut S,
    chunk_size: usize,
}

/// One step of bisecting a rejected chunk.
enum Task {
    Send(Range<usize>),
    Split { range: Range<usize>, reason: String },
}

/// How a single request went, once transport and reply are both accounted for.
enum Attempt {
    Landed { reply: Value, count: usize, ids: Vec<String> },
    Rejected(String),
}

impl<'s, S: BlockStore> BatchPublisher<'s, S> {
    pub fn new(store: &'s mut S) -> Self {
        Self {
            store,
            chunk_size: MAX_BLOCKS_PER_REQUEST,
        }
    }

    /// Uses smaller chunks than the store allows. Values are clamped to `1..=MAX_BLOCKS_PER_REQUEST`.
    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.clamp(1, MAX_BLOCKS_PER_REQUEST);
        self
    }

    /// Normalizes `blocks` and appends them under `parent_id`.
    ///
    /// Empty input makes no requests.
    pub fn publish(&mut self, parent_id: &str, blocks: Vec<Block>) -> Result<PublishReport, PublishError> {
        let mut report = PublishReport::default();
        if blocks.is_empty() {
            return Ok(report);
        }
        let normalized = normalize(blocks);
        report.warnings = normalized.warnings;
        let blocks = normalized.blocks;

        for (idx, chunk_start) in (0..blocks.len()).step_by(self.chunk_size).enumerate() {
            let chunk_number = idx + 1;
            let range = chunk_start..(chunk_start + self.chunk_size).min(blocks.len());
            report.chunk_count += 1;
            tracing::debug!(parent_id, chunk = chunk_number, blocks = range.len(), "appending children");
            match self.attempt(parent_id, &blocks[range.clone()], chunk_number)? {
                Attempt::Landed { reply, count, ids } => report.record_landed(reply, count, ids),
                Attempt::Rejected(reason) => {
                    tracing::debug!(chunk = chunk_number, %reason, "chunk rejected; bisecting");
                    self.bisect(parent_id, &blocks, range, reason, chunk_number, &mut report)?;
                }
            }
        }
        tracing::info!(
            parent_id,
            added = report.added_count,
            chunks = report.chunk_count,
            warnings = report.warnings.len(),
            "published blocks"
        );
        Ok(report)
    }

    fn bisect(
        &mut self,
        parent_id: &str,
        blocks: &[Block],
        range: Range<usize>,
        reason: String,
        chunk_number: usize,
        report: &mut PublishReport,
    ) -> Result<(), PublishError> {
        let mut tasks = vec![Task::Split { range, reason }];
        while let Some(task) = tasks.pop() {
            match task {
                Task::Split { range, reason } => {
                    if range.len() <= 1 {
                        let warning = format!("Skipping problematic block: {reason}");
                        tracing::warn!(chunk = chunk_number, block = range.start, "{warning}");
                        report.warnings.push(warning);
                        continue;
                    }
                    let mid = range.start + range.len() / 2;
                    tasks.push(Task::Send(mid..range.end));
                    tasks.push(Task::Send(range.start..mid));
                }
                Task::Send(range) => {
                    tracing::debug!(parent_id, chunk = chunk_number, blocks = range.len(), "retrying part of chunk");
                    match self.attempt(parent_id, &blocks[range.clone()], chunk_number)? {
                        Attempt::Landed { reply, count, ids } => report.record_landed(reply, count, ids),
                        Attempt::Rejected(reason) => tasks.push(Task::Split { range, reason }),
                    }
                }
            }
        }
        Ok(())
    }

    fn attempt(&mut self, parent_id: &str, blocks: &[Block], chunk_number: usize) -> Result<Attempt, PublishError> {
        let reply = match self.store.append_children(parent_id, blocks) {
            Ok(reply) => reply,
            Err(error) => {
                return match error.api_error() {
                    Some(api_error) => Ok(Attempt::Rejected(api_error.describe())),
                    None => Err(PublishError::Transport {
                        chunk: chunk_number,
                        error,
                    }),
                }
            }
        };
        match Reply::read(&reply) {
            Reply::Created { count, ids } => Ok(Attempt::Landed { reply, count, ids }),
            Reply::Rejected(api_error) => Ok(Attempt::Rejected(api_error.describe())),
            Reply::Unrecognized => Err(PublishError::UnexpectedResponse {
                chunk: chunk_number,
                response: reply,
            }),
        }
    }
}

impl PublishReport {
    fn record_landed(&mut self, reply: Value, count: usize, ids: Vec<String>) {
        self.added_count += count;
        self.created_ids.extend(ids);
        self.raw_responses.push(reply);
    }
}
