use rand::{rngs::StdRng, seq::SliceRandom, Rng, SeedableRng};
use rayon::prelude::*;
use serde::Serialize;
use serde_json::Value;
use std::collections::{BTreeMap, HashSet};
use std::ops::{Range, RangeInclusive};
use std::time::Instant;

use crate::{
    error::AppResult,
    models::{Catalog, InteractionEvent, InteractionKind, LikeRecord, LikesTable, START_SENTINEL},
};

/// Milliseconds in one hour, the unit of `t_dat` in the likes source
pub const MILLIS_PER_HOUR: i64 = 3_600_000;

/// Users handled per chunk
pub const DEFAULT_CHUNK_SIZE: usize = 1000;

/// Fixed heuristic used to fabricate a browsing history around confirmed likes
///
/// Hour ranges are offsets *before* an anchor timestamp: the user's last like for
/// ignores and exploratory clicks, the like itself for pre-like clicks.
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisPolicy {
    pub ignore_count: Range<usize>,
    pub ignore_window_hours: Range<i64>,
    pub ignore_jitter_hours: Range<i64>,
    pub ignore_repeats: RangeInclusive<usize>,
    pub pre_like_click_prob: f64,
    pub pre_like_clicks: RangeInclusive<usize>,
    pub pre_like_window_hours: Range<i64>,
    pub extra_click_prob: f64,
    pub extra_clicks: RangeInclusive<usize>,
    pub extra_window_hours: Range<i64>,
    /// Timestamp units per hour
    pub unit_per_hour: i64,
}

impl Default for SynthesisPolicy {
    fn default() -> Self {
        Self {
            ignore_count: 40..60,
            ignore_window_hours: 1..96,
            ignore_jitter_hours: 1..12,
            ignore_repeats: 1..=2,
            pre_like_click_prob: 0.9,
            pre_like_clicks: 1..=2,
            pre_like_window_hours: 1..48,
            extra_click_prob: 0.95,
            extra_clicks: 5..=8,
            extra_window_hours: 1..72,
            unit_per_hour: MILLIS_PER_HOUR,
        }
    }
}

/// Counts reported after a synthesis run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SynthesisSummary {
    pub users_processed: usize,
    pub users_skipped: usize,
    pub ignores: usize,
    pub clicks: usize,
    pub likes: usize,
}

impl SynthesisSummary {
    fn record(&mut self, events: &[InteractionEvent]) {
        for event in events {
            match event.kind() {
                Some(InteractionKind::Ignore) => self.ignores += 1,
                Some(InteractionKind::Click) => self.clicks += 1,
                Some(InteractionKind::Like) => self.likes += 1,
                None => {}
            }
        }
    }
}

/// Synthesized history sorted by `(user_id, t_dat)` and chained
#[derive(Debug, Clone, Default, Serialize)]
pub struct SynthesisOutput {
    pub events: Vec<InteractionEvent>,
    pub summary: SynthesisSummary,
}

/// Offline generator of ignore/click/like histories from confirmed likes
#[derive(Debug, Clone)]
pub struct Synthesizer {
    policy: SynthesisPolicy,
    seed: Option<u64>,
    chunk_size: usize,
}

impl Default for Synthesizer {
    fn default() -> Self {
        Self::new(SynthesisPolicy::default())
    }
}

impl Synthesizer {
    pub fn new(policy: SynthesisPolicy) -> Self {
        Self {
            policy,
            seed: None,
            chunk_size: DEFAULT_CHUNK_SIZE,
        }
    }

    /// Makes every run over the same input produce the same output
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    pub fn policy(&self) -> &SynthesisPolicy {
        &self.policy
    }

    /// Validates raw likes rows, then generates
    ///
    /// Schema problems fail the call before any user is processed. Without an
    /// explicit catalog the distinct liked items are used as the item pool.
    pub fn synthesize_rows(
        &self,
        rows: &[Value],
        catalog: Option<Catalog>,
    ) -> AppResult<SynthesisOutput> {
        let likes = LikesTable::from_rows(rows)?;
        let catalog = catalog.unwrap_or_else(|| Catalog::from_likes(&likes));
        Ok(self.generate(&likes, &catalog))
    }

    /// Generates the full synthetic history for every user in `likes`
    pub fn generate(&self, likes: &LikesTable, catalog: &Catalog) -> SynthesisOutput {
        if likes.is_empty() {
            tracing::info!("No confirmed likes, nothing to synthesize");
            return SynthesisOutput::default();
        }

        let start = Instant::now();
        let base_seed = self.seed.unwrap_or_else(|| rand::thread_rng().gen());

        let mut by_user: BTreeMap<&str, Vec<&LikeRecord>> = BTreeMap::new();
        for row in likes.rows() {
            by_user.entry(row.user_id.as_str()).or_default().push(row);
        }
        let users: Vec<(&str, Vec<&LikeRecord>)> = by_user.into_iter().collect();

        tracing::info!(
            users = users.len(),
            likes = likes.len(),
            catalog = catalog.len(),
            chunk_size = self.chunk_size,
            "Starting interaction synthesis"
        );

        let chunk_size = self.chunk_size;
        let per_user: Vec<Option<Vec<InteractionEvent>>> = users
            .par_chunks(chunk_size)
            .enumerate()
            .flat_map_iter(|(chunk_idx, chunk)| {
                let generated: Vec<_> = chunk
                    .iter()
                    .enumerate()
                    .map(|(offset, (user_id, user_likes))| {
                        let user_idx = chunk_idx * chunk_size + offset;
                        let mut rng = StdRng::seed_from_u64(user_seed(base_seed, user_idx));
                        self.generate_user(&mut rng, user_id, user_likes, catalog)
                    })
                    .collect();
                tracing::debug!(chunk = chunk_idx, users = chunk.len(), "Processed user chunk");
                generated
            })
            .collect();

        let mut summary = SynthesisSummary::default();
        let mut events = Vec::new();
        for user_events in per_user {
            match user_events {
                Some(user_events) => {
                    summary.users_processed += 1;
                    events.extend(user_events);
                }
                None => summary.users_skipped += 1,
            }
        }

        chain_by_user(&mut events);
        summary.record(&events);

        tracing::info!(
            users_processed = summary.users_processed,
            users_skipped = summary.users_skipped,
            ignores = summary.ignores,
            clicks = summary.clicks,
            likes = summary.likes,
            elapsed_ms = start.elapsed().as_millis(),
            "Interaction synthesis completed"
        );

        SynthesisOutput { events, summary }
    }

    /// Events for one user in generation order; `None` when the user has no likes
    fn generate_user<R: Rng>(
        &self,
        rng: &mut R,
        user_id: &str,
        likes: &[&LikeRecord],
        catalog: &Catalog,
    ) -> Option<Vec<InteractionEvent>> {
        let Some(last_like_ts) = likes.iter().map(|like| like.timestamp).max() else {
            tracing::warn!(user_id = %user_id, "Skipping user without confirmed likes");
            return None;
        };

        let policy = &self.policy;
        let unit = policy.unit_per_hour;

        let mut events = Vec::new();
        let mut ignored: HashSet<&str> = HashSet::new();
        let mut clicked: HashSet<&str> = HashSet::new();
        let mut liked: HashSet<&str> = HashSet::new();

        let requested = rng.gen_range(policy.ignore_count.clone());
        let take = requested.min(catalog.len());
        let sampled: Vec<&String> = catalog.items().choose_multiple(rng, take).collect();
        for item_id in sampled {
            let base_ts = hours_before(last_like_ts, rng, &policy.ignore_window_hours, unit);
            let repeats = rng.gen_range(policy.ignore_repeats.clone());
            for _ in 0..repeats {
                let ts = hours_before(base_ts, rng, &policy.ignore_jitter_hours, unit);
                events.push(unchained(ts, user_id, item_id, InteractionKind::Ignore));
            }
            ignored.insert(item_id.as_str());
        }

        for like in likes {
            if rng.gen_bool(policy.pre_like_click_prob.clamp(0.0, 1.0)) {
                let clicks = rng.gen_range(policy.pre_like_clicks.clone());
                for _ in 0..clicks {
                    let ts = hours_before(like.timestamp, rng, &policy.pre_like_window_hours, unit);
                    events.push(unchained(ts, user_id, &like.item_id, InteractionKind::Click));
                }
                clicked.insert(like.item_id.as_str());
            }
            events.push(unchained(like.timestamp, user_id, &like.item_id, InteractionKind::Like));
            liked.insert(like.item_id.as_str());
        }

        if rng.gen_bool(policy.extra_click_prob.clamp(0.0, 1.0)) {
            let requested = rng.gen_range(policy.extra_clicks.clone());
            let pool: Vec<&String> = catalog
                .items()
                .iter()
                .filter(|id| {
                    let id = id.as_str();
                    !liked.contains(id) && !clicked.contains(id) && !ignored.contains(id)
                })
                .collect();

            if pool.is_empty() {
                tracing::debug!(user_id = %user_id, "No unseen items left for exploratory clicks");
            } else {
                let take = requested.min(pool.len());
                let sampled: Vec<&&String> = pool.choose_multiple(rng, take).collect();
                for item_id in sampled {
                    let ts = hours_before(last_like_ts, rng, &policy.extra_window_hours, unit);
                    events.push(unchained(ts, user_id, item_id, InteractionKind::Click));
                }
            }
        }

        Some(events)
    }
}

/// `anchor` moved back by a random number of hours, clamped at `i64::MIN`
fn hours_before<R: Rng>(anchor: i64, rng: &mut R, range: &Range<i64>, unit: i64) -> i64 {
    anchor.saturating_sub(rng.gen_range(range.clone()).saturating_mul(unit))
}

fn unchained(timestamp: i64, user_id: &str, item_id: &str, kind: InteractionKind) -> InteractionEvent {
    InteractionEvent::new(timestamp, user_id, item_id, kind, String::new())
}

/// Per-user seed that depends only on the user's position in the sorted user list
fn user_seed(base_seed: u64, user_idx: usize) -> u64 {
    base_seed ^ (user_idx as u64).wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15)
}

/// Sorts by `(user_id, t_dat)` and links each event to the user's previous item
///
/// The sort is stable, so events sharing a timestamp keep their relative order.
/// The first event of every user points at `START`.
pub fn chain_by_user(events: &mut [InteractionEvent]) {
    events.sort_by(|a, b| {
        a.user_id
            .cmp(&b.user_id)
            .then_with(|| a.timestamp.cmp(&b.timestamp))
    });

    for idx in 0..events.len() {
        let prev = match idx.checked_sub(1).map(|p| &events[p]) {
            Some(prev) if prev.user_id == events[idx].user_id => prev.item_id.clone(),
            _ => START_SENTINEL.to_string(),
        };
        events[idx].prev_item_id = prev;
    }
}
