//! Order-keyed state store.
//!
//! A sharded concurrent map: each order id hashes to one shard, and a
//! mutation holds that order's entry for its whole duration. Samples for one
//! order are therefore serialized while different orders run in parallel.
//!
//! State is created only through [`GeofenceStore::get_or_create`] and removed
//! only through [`GeofenceStore::clear`]. Orders never expire on their own;
//! only each order's sample history is trimmed (see [`HistoryConfig`]).

use std::collections::VecDeque;

use chrono::Duration;
use dashmap::mapref::one::RefMut;
use dashmap::DashMap;

use crate::config::HistoryConfig;
use crate::stationary::MIN_STATIONARY_SAMPLES;
use crate::types::{ActiveState, GeofenceState, OrderId, PositionSample};

/// Everything the engine keeps for one order.
#[derive(Clone, Debug, Default)]
pub struct OrderSlot {
    pub state: GeofenceState,
    history: VecDeque<PositionSample>,
}

impl OrderSlot {
    /// Append a sample, then trim the front: first to the sample cap, then
    /// every fix the window can lose while still reaching back
    /// `max_span_secs` from `sample`.
    pub fn record(&mut self, sample: PositionSample, retention: &HistoryConfig) {
        self.history.push_back(sample);
        let cap = retention.max_samples.max(MIN_STATIONARY_SAMPLES);
        while self.history.len() > cap {
            self.history.pop_front();
        }

        let horizon = sample.timestamp - Duration::seconds(retention.max_span_secs);
        while self.history.len() > MIN_STATIONARY_SAMPLES
            && self.history.get(1).is_some_and(|next| next.timestamp <= horizon)
        {
            self.history.pop_front();
        }
    }

    pub fn history(&self) -> Vec<PositionSample> {
        self.history.iter().copied().collect()
    }
}

#[derive(Debug)]
pub struct GeofenceStore {
    slots: DashMap<OrderId, OrderSlot>,
    retention: HistoryConfig,
}

impl GeofenceStore {
    pub fn new(retention: HistoryConfig) -> Self {
        Self {
            slots: DashMap::new(),
            retention,
        }
    }

    pub fn retention(&self) -> &HistoryConfig {
        &self.retention
    }

    /// Exclusive handle on the order's slot, creating default state on first
    /// access. Do not call other store methods while holding it.
    pub fn get_or_create(&self, order_id: &OrderId) -> RefMut<'_, OrderId, OrderSlot> {
        self.slots.entry(order_id.clone()).or_default()
    }

    pub fn state(&self, order_id: &OrderId) -> Option<GeofenceState> {
        self.slots.get(order_id).map(|slot| slot.state.clone())
    }

    pub fn recent_samples(&self, order_id: &OrderId) -> Vec<PositionSample> {
        self.slots
            .get(order_id)
            .map(|slot| slot.history())
            .unwrap_or_default()
    }

    /// Returns `true` if the order was tracked.
    pub fn clear(&self, order_id: &OrderId) -> bool {
        self.slots.remove(order_id).is_some()
    }

    /// Snapshot of every tracked order, sorted by order id.
    pub fn list(&self) -> Vec<ActiveState> {
        let mut out: Vec<ActiveState> = self
            .slots
            .iter()
            .map(|e| ActiveState {
                order_id: e.key().clone(),
                state: e.value().state.clone(),
            })
            .collect();
        out.sort_by(|a, b| a.order_id.cmp(&b.order_id));
        out
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn sample_at_secs(secs: i64) -> PositionSample {
        let t = Utc.with_ymd_and_hms(2026, 3, 4, 6, 0, 0).unwrap() + Duration::seconds(secs);
        PositionSample::new(50.0 + secs as f64 * 0.00001, 3.0, t)
    }

    fn sample(i: i64) -> PositionSample {
        sample_at_secs(i * 60)
    }

    fn retention(max_span_secs: i64, max_samples: usize) -> HistoryConfig {
        HistoryConfig {
            max_span_secs,
            max_samples,
        }
    }

    #[test]
    fn fast_cadence_keeps_full_span() {
        let store = GeofenceStore::new(retention(300, 720));
        let id = OrderId::new("a");
        for i in 0..40 {
            store
                .get_or_create(&id)
                .record(sample_at_secs(i * 30), store.retention());
        }
        let recent = store.recent_samples(&id);
        // 1170 s latest; horizon 870 s; one fix kept at the horizon.
        assert_eq!(recent.first(), Some(&sample_at_secs(870)));
        assert_eq!(recent.len(), 11);
    }

    #[test]
    fn slow_cadence_keeps_three_samples_past_span() {
        let store = GeofenceStore::new(retention(300, 720));
        let id = OrderId::new("s");
        for i in 0..5 {
            store
                .get_or_create(&id)
                .record(sample_at_secs(i * 600), store.retention());
        }
        let recent = store.recent_samples(&id);
        assert_eq!(
            recent,
            vec![sample_at_secs(1200), sample_at_secs(1800), sample_at_secs(2400)]
        );
    }

    #[test]
    fn sample_cap_bounds_history() {
        let store = GeofenceStore::new(retention(3600, 4));
        let id = OrderId::new("c");
        for i in 0..10 {
            store.get_or_create(&id).record(sample(i), store.retention());
        }
        let recent = store.recent_samples(&id);
        assert_eq!(recent, vec![sample(6), sample(7), sample(8), sample(9)]);
    }

    #[test]
    fn get_or_create_then_clear() {
        let store = GeofenceStore::new(HistoryConfig::default());
        let id = OrderId::new("b");
        assert!(store.state(&id).is_none());
        {
            let slot = store.get_or_create(&id);
            assert_eq!(slot.state, GeofenceState::default());
        }
        assert_eq!(store.len(), 1);
        assert!(store.clear(&id));
        assert!(!store.clear(&id));
        assert!(store.is_empty());
    }

    #[test]
    fn list_is_sorted_by_order_id() {
        let store = GeofenceStore::new(HistoryConfig::default());
        for id in ["zeta", "alpha", "mid"] {
            drop(store.get_or_create(&OrderId::new(id)));
        }
        let ids: Vec<_> = store.list().into_iter().map(|a| a.order_id.0).collect();
        assert_eq!(ids, ["alpha", "mid", "zeta"]);
    }
}
