use serde::{Deserialize, Serialize};
use std::{fmt::Display, str::FromStr};

use crate::error::AppError;

/// `prev_artwork_id` of a user's first synthesized event
pub const START_SENTINEL: &str = "START";

/// Kind of engagement a user had with an item, ordered by strength
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    Ignore,
    Click,
    Like,
}

impl InteractionKind {
    /// Score written to the `interaction_score` column
    pub fn score(self) -> i64 {
        match self {
            InteractionKind::Ignore => 0,
            InteractionKind::Click => 1,
            InteractionKind::Like => 2,
        }
    }

    pub fn from_score(score: i64) -> Option<Self> {
        match score {
            0 => Some(InteractionKind::Ignore),
            1 => Some(InteractionKind::Click),
            2 => Some(InteractionKind::Like),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            InteractionKind::Ignore => "ignore",
            InteractionKind::Click => "click",
            InteractionKind::Like => "like",
        }
    }

    /// Clicks and likes move the user's chain forward; ignores do not
    pub fn is_engagement(self) -> bool {
        matches!(self, InteractionKind::Click | InteractionKind::Like)
    }
}

impl Display for InteractionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for InteractionKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "like" => Ok(InteractionKind::Like),
            "click" => Ok(InteractionKind::Click),
            "ignore" => Ok(InteractionKind::Ignore),
            _ => Err(AppError::InvalidInteractionKind(s.to_string())),
        }
    }
}

/// One row of the interactions table handed to the sink
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InteractionEvent {
    #[serde(rename = "t_dat")]
    pub timestamp: i64,
    pub user_id: String,
    #[serde(rename = "artwork_id")]
    pub item_id: String,
    #[serde(rename = "interaction_score")]
    pub score: i64,
    #[serde(rename = "prev_artwork_id")]
    pub prev_item_id: String,
}

impl InteractionEvent {
    pub fn new(
        timestamp: i64,
        user_id: impl Into<String>,
        item_id: impl Into<String>,
        kind: InteractionKind,
        prev_item_id: impl Into<String>,
    ) -> Self {
        Self {
            timestamp,
            user_id: user_id.into(),
            item_id: item_id.into(),
            score: kind.score(),
            prev_item_id: prev_item_id.into(),
        }
    }

    pub fn kind(&self) -> Option<InteractionKind> {
        InteractionKind::from_score(self.score)
    }
}

/// Tracker record: an event that still carries its `interaction_type`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrackedInteraction {
    #[serde(flatten)]
    pub event: InteractionEvent,
    pub interaction_type: InteractionKind,
}

impl TrackedInteraction {
    pub fn new(
        timestamp: i64,
        user_id: &str,
        item_id: &str,
        kind: InteractionKind,
        prev_item_id: &str,
    ) -> Self {
        Self {
            event: InteractionEvent::new(timestamp, user_id, item_id, kind, prev_item_id),
            interaction_type: kind,
        }
    }

    /// Drops the interaction type, leaving the sink row
    pub fn into_event(self) -> InteractionEvent {
        self.event
    }
}
