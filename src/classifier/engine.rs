use std::{collections::BTreeMap, path::PathBuf};

use thiserror::Error;

use super::{
    snapshot::{SnapshotError, SnapshotFile},
    store::{AccountId, AccountStats, CategoryFrequency, CounterOverflow, StatisticsStore, StoreState},
    tokenizer::{tokenize, UnicodeWordSegmenter, WordSegmenter},
    Direction, CHANCE_THRESHOLD, COMMON_WORD_FACTOR, MIN_MATCHED_WORDS,
};
use crate::config::ClassifierConfig;

#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("statistics unavailable: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error(transparent)]
    Overflow(#[from] CounterOverflow),
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
struct Tally {
    matched_words: u32,
    total_frequency: u64,
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Chance {
    category: String,
    chance: f64,
}

/// Running per-category match statistics of one message.
#[derive(Debug, Default)]
struct PassTally {
    stats: BTreeMap<String, Tally>,
    max_matched_words: u32,
}

impl PassTally {
    fn record(&mut self, frequencies: &CategoryFrequency, candidates: &[&str]) {
        for &category in candidates {
            let frequency = frequencies.get(category).copied().unwrap_or(0);
            let tally = self.stats.entry(category.to_string()).or_default();
            tally.matched_words += 1;
            tally.total_frequency += u64::from(frequency);
            self.max_matched_words = self.max_matched_words.max(tally.matched_words);
        }
    }

    fn chances(&self, stats: &AccountStats) -> Vec<Chance> {
        if self.max_matched_words == 0 {
            return Vec::new();
        }
        self.stats
            .iter()
            .filter_map(|(category, tally)| {
                let messages = stats.category_count(category);
                if messages == 0 {
                    return None;
                }
                let chance = tally.total_frequency as f64
                    / f64::from(messages)
                    / f64::from(self.max_matched_words);
                tracing::debug!(
                    target: "classifier",
                    category = %category,
                    chance,
                    frequency = tally.total_frequency,
                    messages,
                    matched = tally.matched_words,
                    max_matched = self.max_matched_words,
                    "category chance"
                );
                Some(Chance {
                    category: category.clone(),
                    chance,
                })
            })
            .collect()
    }
}

/// Categories of `frequencies` that remain after dropping those whose relative
/// frequency is too close to a later category's.
///
/// Only the first category of a colliding pair is dropped, so the outcome depends on
/// category order.
fn distinctive_categories<'a>(
    word: &str,
    frequencies: &'a CategoryFrequency,
    stats: &AccountStats,
) -> Vec<&'a str> {
    let entries: Vec<(&str, u32)> = frequencies
        .iter()
        .map(|(category, &frequency)| (category.as_str(), frequency))
        .collect();
    let mut candidates = Vec::with_capacity(entries.len());

    for (index, &(class1, frequency1)) in entries.iter().enumerate() {
        let mut common = false;
        for &(class2, frequency2) in &entries[index + 1..] {
            let messages1 = stats.category_count(class1);
            let messages2 = stats.category_count(class2);
            if messages1 == 0 || messages2 == 0 || frequency1 == 0 || frequency2 == 0 {
                continue;
            }

            let percentage1 = f64::from(frequency1) / f64::from(messages1);
            let percentage2 = f64::from(frequency2) / f64::from(messages2);
            let factor = (percentage1 / percentage2).min(percentage2 / percentage1);
            if factor > COMMON_WORD_FACTOR {
                tracing::trace!(target: "classifier", category = class1, word, "skip common word");
                common = true;
                break;
            }
        }
        if !common {
            candidates.push(class1);
        }
    }
    candidates
}

/// The top category when it dominates the weakest one by [`CHANCE_THRESHOLD`].
pub(crate) fn pick_dominant(mut chances: Vec<Chance>, max_matched_words: u32) -> Option<String> {
    if chances.len() < 2 || max_matched_words < MIN_MATCHED_WORDS {
        return None;
    }
    chances.sort_by(|a, b| b.chance.total_cmp(&a.chance));
    let max_chance = chances.first()?.chance;
    let min_chance = chances.last()?.chance;
    if max_chance / min_chance >= CHANCE_THRESHOLD {
        chances.into_iter().next().map(|chance| chance.category)
    } else {
        None
    }
}

/// Word-frequency folder classifier over a shared [`StatisticsStore`].
pub struct Classifier {
    store: StatisticsStore,
    snapshot: SnapshotFile,
    segmenter: Box<dyn WordSegmenter>,
    enabled: bool,
}

impl Classifier {
    pub fn new(config: &ClassifierConfig, snapshot_path: impl Into<PathBuf>) -> Self {
        Self {
            store: StatisticsStore::new(),
            snapshot: SnapshotFile::new(snapshot_path),
            segmenter: Box::new(UnicodeWordSegmenter),
            enabled: config.enabled,
        }
    }

    pub fn with_segmenter(mut self, segmenter: impl WordSegmenter + 'static) -> Self {
        self.segmenter = Box::new(segmenter);
        self
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    pub fn store(&self) -> &StatisticsStore {
        &self.store
    }

    /// Reads the snapshot file once per process. Does nothing while disabled.
    pub fn load(&self) -> Result<(), SnapshotError> {
        let mut state = self.store.lock();
        self.load_locked(&mut state)
    }

    /// Marks the store loaded and empty without reading the file.
    /// Used after a failed [`Classifier::load`].
    pub fn start_empty(&self) {
        self.store.lock().reset_from(None);
        tracing::warn!(target: "snapshot", "classifier starting with empty statistics");
    }

    /// Writes the snapshot when something changed since the last save.
    /// Returns whether a write happened.
    pub fn save(&self) -> Result<bool, SnapshotError> {
        let mut state = self.store.lock();
        if !state.is_dirty() {
            return Ok(false);
        }
        self.snapshot.write(&state.snapshot())?;
        state.mark_clean();
        tracing::info!(
            target: "snapshot",
            path = %self.snapshot.path().display(),
            "classifier data saved"
        );
        Ok(true)
    }

    pub fn clear(&self) {
        tracing::info!(target: "classifier", "classifier clear");
        self.store.clear();
    }

    /// Learns one message and, for [`Direction::Added`], predicts its category.
    ///
    /// Never fails: errors are logged and yield no classification.
    pub fn classify(
        &self,
        account: AccountId,
        category: &str,
        text: &str,
        direction: Direction,
    ) -> Option<String> {
        match self.learn(account, category, text, direction) {
            Ok(classified) => classified,
            Err(err) => {
                tracing::error!(
                    target: "classifier",
                    error = %err,
                    account,
                    category,
                    ?direction,
                    "classification pass failed"
                );
                None
            }
        }
    }

    /// The fallible pass behind [`Classifier::classify`]. A failure part way through
    /// may leave the statistics partially updated.
    pub fn learn(
        &self,
        account: AccountId,
        category: &str,
        text: &str,
        direction: Direction,
    ) -> Result<Option<String>, ClassifyError> {
        if !self.enabled || text.is_empty() {
            return Ok(None);
        }

        let mut state = self.store.lock();
        self.load_locked(&mut state)?;
        state.get_or_create_account(account);

        match direction {
            Direction::Added => self.learn_added(&mut state, account, category, text),
            Direction::Removed => {
                self.learn_removed(&mut state, account, category, text);
                Ok(None)
            }
        }
    }

    fn learn_added(
        &self,
        state: &mut StoreState,
        account: AccountId,
        category: &str,
        text: &str,
    ) -> Result<Option<String>, ClassifyError> {
        let mut tally = PassTally::default();
        let mut words = 0usize;

        for word in tokenize(self.segmenter.as_ref(), text) {
            words += 1;
            if let Some(stats) = state.account(account) {
                if let Some(frequencies) = stats.word_frequencies(&word) {
                    let candidates = distinctive_categories(&word, frequencies, stats);
                    tally.record(frequencies, &candidates);
                }
            }
            state.increment_word_frequency(account, &word, category)?;
        }

        let chances = state
            .account(account)
            .map(|stats| tally.chances(stats))
            .unwrap_or_default();
        let classified = pick_dominant(chances, tally.max_matched_words);

        let messages = state.increment_category_count(account, category)?;
        tracing::debug!(
            target: "classifier",
            account,
            category,
            words,
            messages,
            classified = ?classified,
            "learned added message"
        );
        Ok(classified)
    }

    fn learn_removed(&self, state: &mut StoreState, account: AccountId, category: &str, text: &str) {
        for word in tokenize(self.segmenter.as_ref(), text) {
            state.decrement_word_frequency(account, &word, category);
        }
        let messages = state.decrement_category_count(account, category);
        tracing::debug!(target: "classifier", account, category, messages, "learned removed message");
    }

    fn load_locked(&self, state: &mut StoreState) -> Result<(), SnapshotError> {
        if state.is_loaded() || !self.enabled {
            return Ok(());
        }
        let snapshot = self.snapshot.read()?;
        let found = snapshot.is_some();
        state.reset_from(snapshot);
        tracing::info!(
            target: "snapshot",
            path = %self.snapshot.path().display(),
            found,
            "classifier data loaded"
        );
        Ok(())
    }
}
