use std::collections::BTreeMap;

use parking_lot::{Mutex, MutexGuard};
use thiserror::Error;

use super::snapshot::{MessageRecord, Snapshot, WordRecord};

pub type AccountId = i64;

/// Category -> frequency for a single word. Sorted so category iteration is stable.
pub type CategoryFrequency = BTreeMap<String, u32>;

#[derive(Debug, Error)]
#[error("counter overflow for category {category:?} in account {account}")]
pub struct CounterOverflow {
    pub account: AccountId,
    pub category: String,
}

/// Statistics of one account. Never shared between accounts.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountStats {
    class_messages: BTreeMap<String, u32>,
    word_frequency: BTreeMap<String, CategoryFrequency>,
}

impl AccountStats {
    pub fn category_count(&self, category: &str) -> u32 {
        self.class_messages.get(category).copied().unwrap_or(0)
    }

    pub fn word_frequencies(&self, word: &str) -> Option<&CategoryFrequency> {
        self.word_frequency.get(word)
    }

    pub fn categories(&self) -> impl Iterator<Item = (&str, u32)> {
        self.class_messages.iter().map(|(name, count)| (name.as_str(), *count))
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_frequency.len()
    }
}

#[derive(Debug, Default)]
pub struct StoreState {
    accounts: BTreeMap<AccountId, AccountStats>,
    dirty: bool,
    loaded: bool,
}

impl StoreState {
    pub fn get_or_create_account(&mut self, account: AccountId) -> &mut AccountStats {
        self.accounts.entry(account).or_default()
    }

    pub fn account(&self, account: AccountId) -> Option<&AccountStats> {
        self.accounts.get(&account)
    }

    pub fn category_count(&self, account: AccountId, category: &str) -> u32 {
        self.account(account)
            .map(|stats| stats.category_count(category))
            .unwrap_or(0)
    }

    pub fn word_frequencies(&self, account: AccountId, word: &str) -> Option<&CategoryFrequency> {
        self.account(account)
            .and_then(|stats| stats.word_frequencies(word))
    }

    pub fn increment_category_count(
        &mut self,
        account: AccountId,
        category: &str,
    ) -> Result<u32, CounterOverflow> {
        self.dirty = true;
        let count = self
            .get_or_create_account(account)
            .class_messages
            .entry(category.to_string())
            .or_insert(0);
        *count = count.checked_add(1).ok_or_else(|| CounterOverflow {
            account,
            category: category.to_string(),
        })?;
        Ok(*count)
    }

    /// Floors at zero; the entry itself is kept.
    pub fn decrement_category_count(&mut self, account: AccountId, category: &str) -> u32 {
        self.dirty = true;
        let count = self
            .get_or_create_account(account)
            .class_messages
            .entry(category.to_string())
            .or_insert(0);
        *count = count.saturating_sub(1);
        *count
    }

    pub fn increment_word_frequency(
        &mut self,
        account: AccountId,
        word: &str,
        category: &str,
    ) -> Result<u32, CounterOverflow> {
        self.dirty = true;
        let frequency = self
            .get_or_create_account(account)
            .word_frequency
            .entry(word.to_string())
            .or_default()
            .entry(category.to_string())
            .or_insert(0);
        *frequency = frequency.checked_add(1).ok_or_else(|| CounterOverflow {
            account,
            category: category.to_string(),
        })?;
        Ok(*frequency)
    }

    /// Returns the remaining frequency, or `None` when the category entry was dropped
    /// (or never existed). Words left without any category are dropped too.
    pub fn decrement_word_frequency(
        &mut self,
        account: AccountId,
        word: &str,
        category: &str,
    ) -> Option<u32> {
        self.dirty = true;
        let words = &mut self.get_or_create_account(account).word_frequency;
        let frequencies = words.get_mut(word)?;
        let remaining = match frequencies.get_mut(category) {
            Some(frequency) if *frequency > 1 => {
                *frequency -= 1;
                Some(*frequency)
            }
            Some(_) => {
                frequencies.remove(category);
                None
            }
            None => None,
        };
        if frequencies.is_empty() {
            words.remove(word);
        }
        remaining
    }

    pub fn snapshot(&self) -> Snapshot {
        let mut snapshot = Snapshot::default();
        for (&account, stats) in &self.accounts {
            snapshot
                .messages
                .extend(stats.class_messages.iter().map(|(category, &count)| MessageRecord {
                    account,
                    category: category.clone(),
                    count,
                }));
            for (word, frequencies) in &stats.word_frequency {
                snapshot
                    .words
                    .extend(frequencies.iter().map(|(category, &frequency)| WordRecord {
                        account,
                        word: word.clone(),
                        category: category.clone(),
                        frequency,
                    }));
            }
        }
        snapshot
    }

    /// Merges the records into the current tables; colliding keys are overwritten.
    /// Does not touch the dirty flag.
    pub fn restore(&mut self, snapshot: Snapshot) {
        for record in snapshot.messages {
            self.get_or_create_account(record.account)
                .class_messages
                .insert(record.category, record.count);
        }
        for record in snapshot.words {
            self.get_or_create_account(record.account)
                .word_frequency
                .entry(record.word)
                .or_default()
                .insert(record.category, record.frequency);
        }
    }

    pub fn clear(&mut self) {
        self.accounts.clear();
        self.dirty = true;
    }

    pub fn account_ids(&self) -> impl Iterator<Item = AccountId> + '_ {
        self.accounts.keys().copied()
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded
    }

    pub(crate) fn reset_from(&mut self, snapshot: Option<Snapshot>) {
        self.accounts.clear();
        if let Some(snapshot) = snapshot {
            self.restore(snapshot);
        }
        self.loaded = true;
        self.dirty = false;
    }

    pub(crate) fn mark_clean(&mut self) {
        self.dirty = false;
    }
}

/// Per-process statistics. Every access goes through one lock.
#[derive(Debug, Default)]
pub struct StatisticsStore {
    state: Mutex<StoreState>,
}

impl StatisticsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Holds the store lock for the lifetime of the guard.
    pub fn lock(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock()
    }

    pub fn snapshot(&self) -> Snapshot {
        self.lock().snapshot()
    }

    pub fn restore(&self, snapshot: Snapshot) {
        self.lock().restore(snapshot);
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn is_dirty(&self) -> bool {
        self.lock().is_dirty()
    }

    pub fn account(&self, account: AccountId) -> Option<AccountStats> {
        self.lock().account(account).cloned()
    }
}
