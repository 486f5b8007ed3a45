use chrono::Utc;
use std::collections::{HashMap, HashSet};

use crate::{
    error::AppResult,
    models::{InteractionEvent, InteractionKind, TrackedInteraction},
};

/// Identity under which repeated tracking calls collapse to one record
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct InteractionKey {
    user_id: String,
    item_id: String,
    kind: InteractionKind,
}

/// Map from dedup key to the latest record, flattened in first-seen order
#[derive(Debug, Clone, Default)]
struct InteractionTable {
    positions: HashMap<InteractionKey, usize>,
    entries: Vec<TrackedInteraction>,
}

impl InteractionTable {
    /// Replaces the stored record for an existing key in place, appends otherwise
    fn upsert(&mut self, record: TrackedInteraction) {
        let key = InteractionKey {
            user_id: record.event.user_id.clone(),
            item_id: record.event.item_id.clone(),
            kind: record.interaction_type,
        };

        match self.positions.get(&key) {
            Some(&idx) => self.entries[idx] = record,
            None => {
                self.positions.insert(key, self.entries.len());
                self.entries.push(record);
            }
        }
    }

    fn clear(&mut self) {
        self.positions.clear();
        self.entries.clear();
    }
}

/// Interaction state of one live session
///
/// Owned by whatever serves the session; callers sharing it across requests must
/// serialize mutation. Per-user state is partitioned by `user_id`.
#[derive(Debug, Clone, Default)]
pub struct TrackerState {
    interactions: InteractionTable,
    liked_items: HashMap<String, HashSet<String>>,
    current_items: HashMap<String, Vec<String>>,
    last_interaction: HashMap<String, String>,
}

fn now_seconds() -> i64 {
    Utc::now().timestamp()
}

impl TrackerState {
    pub fn new() -> Self {
        tracing::info!("Initialized interaction tracker");
        Self::default()
    }

    /// Records that a ranked list of items was displayed to the user
    ///
    /// Every displayed item the user has not liked gets an `ignore` record chained
    /// to the item shown before it (the first item points at itself). All records
    /// share one timestamp.
    pub fn track_shown_items(&mut self, user_id: &str, items_with_scores: &[(String, f64)]) {
        self.track_shown_items_at(user_id, items_with_scores, now_seconds());
    }

    pub fn track_shown_items_at(
        &mut self,
        user_id: &str,
        items_with_scores: &[(String, f64)],
        timestamp: i64,
    ) {
        let item_ids: Vec<String> = items_with_scores.iter().map(|(id, _)| id.clone()).collect();

        for (idx, item_id) in item_ids.iter().enumerate() {
            if !self.should_show_item(user_id, item_id) {
                continue;
            }
            let prev = if idx > 0 { &item_ids[idx - 1] } else { item_id };
            self.interactions.upsert(TrackedInteraction::new(
                timestamp,
                user_id,
                item_id,
                InteractionKind::Ignore,
                prev,
            ));
        }

        tracing::info!(user_id = %user_id, count = item_ids.len(), "Tracked shown items");
        self.current_items.insert(user_id.to_string(), item_ids);
    }

    /// Records a single interaction named by its string kind
    ///
    /// Unknown kinds fail with `InvalidInteractionKind` and leave the state untouched.
    pub fn track(&mut self, user_id: &str, item_id: &str, interaction_type: &str) -> AppResult<()> {
        let kind = interaction_type.parse::<InteractionKind>()?;
        self.track_at(user_id, item_id, kind, now_seconds());
        Ok(())
    }

    /// Records a single interaction at an explicit timestamp
    ///
    /// The record chains to the user's last click or like, or to the item itself
    /// when there is none yet.
    pub fn track_at(&mut self, user_id: &str, item_id: &str, kind: InteractionKind, timestamp: i64) {
        let prev = self
            .last_interaction
            .get(user_id)
            .map(String::as_str)
            .unwrap_or(item_id)
            .to_string();

        self.interactions
            .upsert(TrackedInteraction::new(timestamp, user_id, item_id, kind, &prev));

        tracing::debug!(
            user_id = %user_id,
            item_id = %item_id,
            kind = %kind,
            score = kind.score(),
            "Added interaction"
        );

        match kind {
            InteractionKind::Like => {
                self.liked_items
                    .entry(user_id.to_string())
                    .or_default()
                    .insert(item_id.to_string());
                tracing::info!(user_id = %user_id, item_id = %item_id, "Tracked like");
            }
            InteractionKind::Click => {
                tracing::info!(user_id = %user_id, item_id = %item_id, "Tracked click");
            }
            InteractionKind::Ignore => {}
        }

        if kind.is_engagement() {
            self.last_interaction
                .insert(user_id.to_string(), item_id.to_string());
        }
    }

    /// Recorded interactions in first-seen order per dedup key
    pub fn get_interactions_data(&self) -> Vec<TrackedInteraction> {
        if self.interactions.entries.is_empty() {
            tracing::info!("No interactions recorded yet");
        }
        self.interactions.entries.clone()
    }

    /// Recorded interactions reduced to sink rows
    pub fn interaction_events(&self) -> Vec<InteractionEvent> {
        self.interactions
            .entries
            .iter()
            .cloned()
            .map(TrackedInteraction::into_event)
            .collect()
    }

    pub fn interaction_count(&self) -> usize {
        self.interactions.entries.len()
    }

    /// Liked items are never shown again
    pub fn should_show_item(&self, user_id: &str, item_id: &str) -> bool {
        !self
            .liked_items
            .get(user_id)
            .is_some_and(|liked| liked.contains(item_id))
    }

    pub fn get_current_items(&self, user_id: &str) -> Vec<String> {
        self.current_items.get(user_id).cloned().unwrap_or_default()
    }

    pub fn last_interaction(&self, user_id: &str) -> Option<&str> {
        self.last_interaction.get(user_id).map(String::as_str)
    }

    /// Empties the interaction table; liked, shown and last-interaction state survive
    pub fn clear_interactions(&mut self) {
        self.interactions.clear();
        tracing::info!("Cleared all recorded interactions");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;

    fn shown(items: &[(&str, f64)]) -> Vec<(String, f64)> {
        items.iter().map(|(id, s)| (id.to_string(), *s)).collect()
    }

    #[test]
    fn test_like_hides_item() {
        let mut state = TrackerState::new();
        assert!(state.should_show_item("u1", "a1"));
        state.track("u1", "a1", "like").unwrap();
        assert!(!state.should_show_item("u1", "a1"));
        assert!(state.should_show_item("u2", "a1"));
    }

    #[test]
    fn test_ignore_does_not_like_or_advance_chain() {
        let mut state = TrackerState::new();
        state.track("u1", "a1", "ignore").unwrap();
        assert!(state.should_show_item("u1", "a1"));
        assert_eq!(state.last_interaction("u1"), None);
    }

    #[test]
    fn test_repeat_click_keeps_one_record_with_latest_timestamp() {
        let mut state = TrackerState::new();
        state.track_at("u1", "a1", InteractionKind::Click, 100);
        state.track_at("u1", "a2", InteractionKind::Click, 150);
        let before = state.get_interactions_data().len();

        state.track_at("u1", "a1", InteractionKind::Click, 200);
        let records = state.get_interactions_data();

        assert_eq!(records.len(), before);
        let clicks: Vec<_> = records
            .iter()
            .filter(|r| r.event.item_id == "a1" && r.interaction_type == InteractionKind::Click)
            .collect();
        assert_eq!(clicks.len(), 1);
        assert_eq!(clicks[0].event.timestamp, 200);
    }

    #[test]
    fn test_overwrite_preserves_first_seen_position() {
        let mut state = TrackerState::new();
        state.track_at("u1", "a1", InteractionKind::Click, 100);
        state.track_at("u1", "a2", InteractionKind::Click, 110);
        state.track_at("u1", "a1", InteractionKind::Click, 120);

        let order: Vec<(String, i64)> = state
            .interaction_events()
            .into_iter()
            .map(|e| (e.item_id, e.timestamp))
            .collect();
        assert_eq!(order, vec![("a1".to_string(), 120), ("a2".to_string(), 110)]);
    }

    #[test]
    fn test_same_item_different_kinds_are_separate_records() {
        let mut state = TrackerState::new();
        state.track_at("u1", "a1", InteractionKind::Click, 100);
        state.track_at("u1", "a1", InteractionKind::Like, 110);
        assert_eq!(state.interaction_count(), 2);
    }

    #[test]
    fn test_chain_follows_last_engagement() {
        let mut state = TrackerState::new();
        state.track_at("u1", "a1", InteractionKind::Click, 1);
        state.track_at("u1", "a2", InteractionKind::Ignore, 2);
        state.track_at("u1", "a3", InteractionKind::Like, 3);
        state.track_at("u1", "a4", InteractionKind::Click, 4);

        let prevs: Vec<String> = state
            .interaction_events()
            .into_iter()
            .map(|e| e.prev_item_id)
            .collect();
        assert_eq!(prevs, vec!["a1", "a1", "a1", "a3"]);
    }

    #[test]
    fn test_invalid_kind_leaves_state_unchanged() {
        let mut state = TrackerState::new();
        state.track("u1", "a1", "click").unwrap();

        let err = state.track("u1", "a2", "purchase").unwrap_err();
        assert!(matches!(err, AppError::InvalidInteractionKind(_)));
        assert_eq!(state.interaction_count(), 1);
        assert_eq!(state.last_interaction("u1"), Some("a1"));
    }

    #[test]
    fn test_shown_items_chain_within_list() {
        let mut state = TrackerState::new();
        state.track_shown_items_at("u1", &shown(&[("a", 0.9), ("b", 0.8)]), 500);

        let events = state.interaction_events();
        assert_eq!(events.len(), 2);
        assert_eq!((events[0].item_id.as_str(), events[0].prev_item_id.as_str()), ("a", "a"));
        assert_eq!((events[1].item_id.as_str(), events[1].prev_item_id.as_str()), ("b", "a"));
        assert!(events.iter().all(|e| e.score == 0 && e.timestamp == 500));
        assert_eq!(state.get_current_items("u1"), vec!["a", "b"]);
    }

    #[test]
    fn test_shown_items_skip_liked_but_keep_them_current() {
        let mut state = TrackerState::new();
        state.track_at("u1", "b", InteractionKind::Like, 1);
        state.track_shown_items_at("u1", &shown(&[("a", 0.9), ("b", 0.8), ("c", 0.7)]), 2);

        let ignores: Vec<(String, String)> = state
            .get_interactions_data()
            .into_iter()
            .filter(|r| r.interaction_type == InteractionKind::Ignore)
            .map(|r| (r.event.item_id, r.event.prev_item_id))
            .collect();
        assert_eq!(
            ignores,
            vec![
                ("a".to_string(), "a".to_string()),
                ("c".to_string(), "b".to_string())
            ]
        );
        assert_eq!(state.get_current_items("u1"), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_current_items_default_empty() {
        let state = TrackerState::new();
        assert!(state.get_current_items("nobody").is_empty());
        assert!(state.get_interactions_data().is_empty());
    }

    #[test]
    fn test_clear_keeps_liked_state() {
        let mut state = TrackerState::new();
        state.track("u1", "a1", "like").unwrap();
        state.track_shown_items("u1", &shown(&[("a2", 0.5)]));

        state.clear_interactions();

        assert!(state.get_interactions_data().is_empty());
        assert!(!state.should_show_item("u1", "a1"));
        assert_eq!(state.get_current_items("u1"), vec!["a2"]);
        assert_eq!(state.last_interaction("u1"), Some("a1"));

        // re-tracking after a clear starts a fresh table
        state.track("u1", "a3", "click").unwrap();
        assert_eq!(state.interaction_count(), 1);
    }

    #[test]
    fn test_interaction_events_drop_type_in_table_order() {
        let mut state = TrackerState::new();
        state.track_shown_items_at("u1", &shown(&[("a", 0.9)]), 1);
        state.track_at("u1", "a", InteractionKind::Click, 2);

        let expected: Vec<InteractionEvent> = state
            .get_interactions_data()
            .into_iter()
            .map(TrackedInteraction::into_event)
            .collect();
        let events = state.interaction_events();

        assert_eq!(events, expected);
        assert_eq!(events.iter().map(|e| e.score).collect::<Vec<_>>(), vec![0, 1]);
        let row = serde_json::to_value(&events[1]).unwrap();
        assert!(row.get("interaction_type").is_none());
    }
}
