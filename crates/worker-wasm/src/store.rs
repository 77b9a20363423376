//! Slide record and quota collaborators.
//!
//! Persistence and quota accounting live outside this crate. The service
//! reaches them through these traits; the in-memory versions back tests and
//! the worker's own session state.

use chrono::NaiveDate;
use slide_core::TemplateProps;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// A saved slide as the store returns it.
#[derive(Debug, Clone, PartialEq)]
pub struct SlideRecord {
    pub slide_id: String,
    pub owner_id: String,
    pub archetype_id: String,
    pub template_props: TemplateProps,
}

/// Read access to saved slides.
pub trait SlideStore {
    /// Look up a slide owned by `owner_id`.
    ///
    /// A record owned by someone else is reported as missing.
    fn find_for_owner(&self, slide_id: &str, owner_id: &str) -> Option<SlideRecord>;
}

/// Daily export allowance per account.
pub trait QuotaGate {
    /// Count one export against `account_id` for `day`. Returns false when the
    /// allowance is already used up, in which case nothing is counted.
    fn check_and_increment(&self, account_id: &str, day: NaiveDate) -> bool;

    /// Called once after every admitted export, successful or not.
    fn report_completion(&self, account_id: &str, success: bool);
}

#[derive(Debug, Clone, Default)]
pub struct InMemorySlideStore {
    records: Arc<Mutex<HashMap<String, SlideRecord>>>,
}

impl InMemorySlideStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace a record by slide id.
    pub fn insert(&self, record: SlideRecord) {
        let mut map = self.records.lock().unwrap_or_else(|e| e.into_inner());
        map.insert(record.slide_id.clone(), record);
    }

    pub fn len(&self) -> usize {
        self.records.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl SlideStore for InMemorySlideStore {
    fn find_for_owner(&self, slide_id: &str, owner_id: &str) -> Option<SlideRecord> {
        let map = self.records.lock().unwrap_or_else(|e| e.into_inner());
        map.get(slide_id).filter(|r| r.owner_id == owner_id).cloned()
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct DailyCount {
    day: Option<NaiveDate>,
    used: u32,
}

/// Quota gate counting exports per account and calendar day.
///
/// The count resets the first time an account is checked on a new day. Read,
/// reset and increment happen under one lock.
#[derive(Debug, Clone)]
pub struct InMemoryQuotaGate {
    daily_limit: u32,
    counts: Arc<Mutex<HashMap<String, DailyCount>>>,
    completions: Arc<Mutex<Vec<(String, bool)>>>,
}

impl InMemoryQuotaGate {
    pub fn new(daily_limit: u32) -> Self {
        Self {
            daily_limit,
            counts: Arc::new(Mutex::new(HashMap::new())),
            completions: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub fn daily_limit(&self) -> u32 {
        self.daily_limit
    }

    /// Exports counted for `account_id` on `day`.
    pub fn used(&self, account_id: &str, day: NaiveDate) -> u32 {
        let map = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        map.get(account_id)
            .filter(|c| c.day == Some(day))
            .map_or(0, |c| c.used)
    }

    /// Completion reports received so far, oldest first.
    pub fn completions(&self) -> Vec<(String, bool)> {
        self.completions.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

impl QuotaGate for InMemoryQuotaGate {
    fn check_and_increment(&self, account_id: &str, day: NaiveDate) -> bool {
        let mut map = self.counts.lock().unwrap_or_else(|e| e.into_inner());
        let count = map.entry(account_id.to_string()).or_default();
        if count.day != Some(day) {
            *count = DailyCount { day: Some(day), used: 0 };
        }
        if count.used >= self.daily_limit {
            log::debug!("Quota exhausted for {} on {}", account_id, day);
            return false;
        }
        count.used += 1;
        true
    }

    fn report_completion(&self, account_id: &str, success: bool) {
        let mut list = self.completions.lock().unwrap_or_else(|e| e.into_inner());
        list.push((account_id.to_string(), success));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 3, d).unwrap()
    }

    fn record(slide_id: &str, owner: &str) -> SlideRecord {
        SlideRecord {
            slide_id: slide_id.to_string(),
            owner_id: owner.to_string(),
            archetype_id: "title-only".to_string(),
            template_props: TemplateProps::with_title("Q3"),
        }
    }

    #[test]
    fn test_store_hides_other_owners() {
        let store = InMemorySlideStore::new();
        store.insert(record("s1", "alice"));

        assert!(store.find_for_owner("s1", "alice").is_some());
        assert!(store.find_for_owner("s1", "bob").is_none());
        assert!(store.find_for_owner("s2", "alice").is_none());
    }

    #[test]
    fn test_quota_limit_and_day_reset() {
        let gate = InMemoryQuotaGate::new(2);

        assert!(gate.check_and_increment("alice", day(1)));
        assert!(gate.check_and_increment("alice", day(1)));
        assert!(!gate.check_and_increment("alice", day(1)));
        assert_eq!(gate.used("alice", day(1)), 2);

        // Other accounts are independent.
        assert!(gate.check_and_increment("bob", day(1)));

        assert!(gate.check_and_increment("alice", day(2)));
        assert_eq!(gate.used("alice", day(2)), 1);
        assert_eq!(gate.used("alice", day(1)), 0);
    }

    #[test]
    fn test_quota_is_serialized_across_threads() {
        let gate = InMemoryQuotaGate::new(10);
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let gate = gate.clone();
                std::thread::spawn(move || (0..5).filter(|_| gate.check_and_increment("alice", day(1))).count())
            })
            .collect();
        let admitted: usize = handles.into_iter().map(|h| h.join().unwrap()).sum();

        assert_eq!(admitted, 10);
        assert_eq!(gate.used("alice", day(1)), 10);
    }
}
