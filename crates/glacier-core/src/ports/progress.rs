//! DeleteProgress port - 一括削除の進捗通知

use crate::domain::ArchiveId;

/// Receives one call per finished delete attempt, success or failure.
///
/// `done` increases by one per call and reaches `total` exactly once.
pub trait DeleteProgress: Send + Sync {
    fn on_attempt(&self, archive_id: &ArchiveId, ok: bool, done: usize, total: usize);

    /// Called once after every worker has been joined.
    fn on_finish(&self) {}
}

/// Progress sink that ignores everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopProgress;

impl DeleteProgress for NoopProgress {
    fn on_attempt(&self, _archive_id: &ArchiveId, _ok: bool, _done: usize, _total: usize) {}
}
