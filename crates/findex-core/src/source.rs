//! Source engine seam.

use crossbeam_channel::Receiver;

use crate::models::FileRecord;

/// Anything that can enumerate file records for an index.
///
/// The scan coordinator is generic over this trait even though only the
/// `"local"` engine ships; unsupported engines are reported and skipped
/// at scan time.
pub trait FileSource {
    /// Engine identifier, e.g. `"local"`.
    fn name(&self) -> &'static str;

    /// Start producing records. The returned channel yields every entry
    /// of every root and closes when the walk completes.
    fn walk(&self) -> Receiver<FileRecord>;
}
