pub mod engine;
pub mod snapshot;
pub mod store;
pub mod tokenizer;

use serde::{Deserialize, Serialize};

pub use engine::{ClassifyError, Classifier};
pub use snapshot::{Snapshot, SnapshotError, SnapshotFile};
pub use store::{AccountId, StatisticsStore};
pub use tokenizer::{UnicodeWordSegmenter, WhitespaceSegmenter, WordSegmenter};

/// A category needs at least this many matched words before it can win.
pub const MIN_MATCHED_WORDS: u32 = 10;
/// Relative frequencies closer than this ratio make a word common to both categories.
pub const COMMON_WORD_FACTOR: f64 = 0.75;
/// Required ratio between the best and the worst category chance.
pub const CHANCE_THRESHOLD: f64 = 2.0;

/// Whether a message arrived in or left its category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Direction {
    Added,
    Removed,
}
