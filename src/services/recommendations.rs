use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

use crate::services::tracker::TrackerState;

/// Items displayed to a user plus the ranked backlog used to back-fill the page
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecommendationPage {
    pub shown: Vec<(String, f64)>,
    pub extras: VecDeque<(String, f64)>,
}

/// Turns a model ranking into the page shown to the user
///
/// Items the user already liked are dropped, the first `page_size` of the rest are
/// shown (and tracked as shown), the remainder is kept as back-fill.
pub fn present_recommendations(
    state: &mut TrackerState,
    user_id: &str,
    ranked: &[(String, f64)],
    page_size: usize,
) -> RecommendationPage {
    let mut shown: Vec<(String, f64)> = ranked
        .iter()
        .filter(|(item_id, _)| state.should_show_item(user_id, item_id))
        .cloned()
        .collect();
    let extras: VecDeque<_> = shown.split_off(page_size.min(shown.len())).into();

    tracing::info!(
        user_id = %user_id,
        ranked = ranked.len(),
        shown = shown.len(),
        extras = extras.len(),
        "Presenting recommendations"
    );

    state.track_shown_items(user_id, &shown);

    RecommendationPage { shown, extras }
}

impl RecommendationPage {
    /// Drops items the user has liked since the page was built, back-filling from
    /// `extras` in ranking order. Returns how many items were dropped.
    pub fn replace_liked(&mut self, state: &TrackerState, user_id: &str) -> usize {
        let target = self.shown.len();
        self.shown
            .retain(|(item_id, _)| state.should_show_item(user_id, item_id));
        let removed = target - self.shown.len();

        while self.shown.len() < target {
            let Some(next) = self.extras.pop_front() else {
                break;
            };
            if state.should_show_item(user_id, &next.0) {
                self.shown.push(next);
            }
        }

        removed
    }
}
