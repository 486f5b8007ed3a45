use chrono::{DateTime, Datelike, Utc};
use serde::{Deserialize, Serialize};

/// Row recorded in the transactions source when a user likes an item live
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransactionRecord {
    /// Seconds since epoch
    pub t_dat: i64,
    pub user_id: String,
    pub artwork_id: String,
    pub year: i32,
    pub month: u32,
    pub day: u32,
    /// Monday = 0
    pub day_of_week: u32,
}

impl TransactionRecord {
    pub fn from_like(user_id: &str, artwork_id: &str, at: DateTime<Utc>) -> Self {
        Self {
            t_dat: at.timestamp(),
            user_id: user_id.to_string(),
            artwork_id: artwork_id.to_string(),
            year: at.year(),
            month: at.month(),
            day: at.day(),
            day_of_week: at.weekday().num_days_from_monday(),
        }
    }
}
