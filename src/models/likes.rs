use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashSet;

use crate::error::{AppError, AppResult};

/// Columns every confirmed-likes row must carry
pub const REQUIRED_COLUMNS: [&str; 3] = ["t_dat", "user_id", "artwork_id"];

/// A confirmed "like" from the transactions source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LikeRecord {
    #[serde(rename = "t_dat")]
    pub timestamp: i64,
    pub user_id: String,
    #[serde(rename = "artwork_id")]
    pub item_id: String,
}

impl LikeRecord {
    pub fn new(timestamp: i64, user_id: impl Into<String>, item_id: impl Into<String>) -> Self {
        Self {
            timestamp,
            user_id: user_id.into(),
            item_id: item_id.into(),
        }
    }
}

/// Validated table of confirmed likes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LikesTable {
    rows: Vec<LikeRecord>,
}

impl LikesTable {
    pub fn new(rows: Vec<LikeRecord>) -> Self {
        Self { rows }
    }

    /// Builds a table from loosely typed rows, validating the whole input first
    ///
    /// Every missing required column is reported in one `Schema` error. Ids may be
    /// strings or integers; `t_dat` must be an integer.
    pub fn from_rows(rows: &[Value]) -> AppResult<Self> {
        let mut objects = Vec::with_capacity(rows.len());
        let mut missing: Vec<&str> = Vec::new();

        for (idx, row) in rows.iter().enumerate() {
            let object = row
                .as_object()
                .ok_or_else(|| AppError::Schema(format!("Row {} is not an object", idx)))?;
            for column in REQUIRED_COLUMNS {
                if !object.contains_key(column) && !missing.contains(&column) {
                    missing.push(column);
                }
            }
            objects.push(object);
        }

        if !missing.is_empty() {
            return Err(AppError::Schema(format!(
                "Columns {} not found",
                missing.join(", ")
            )));
        }

        let rows = objects
            .into_iter()
            .enumerate()
            .map(|(idx, object)| parse_row(idx, object))
            .collect::<AppResult<Vec<_>>>()?;

        tracing::debug!(rows = rows.len(), "Validated likes table");

        Ok(Self { rows })
    }

    pub fn rows(&self) -> &[LikeRecord] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn parse_row(idx: usize, object: &Map<String, Value>) -> AppResult<LikeRecord> {
    let timestamp = object["t_dat"].as_i64().ok_or_else(|| {
        AppError::Schema(format!("Row {}: column t_dat must be an integer", idx))
    })?;

    Ok(LikeRecord {
        timestamp,
        user_id: id_value(idx, "user_id", &object["user_id"])?,
        item_id: id_value(idx, "artwork_id", &object["artwork_id"])?,
    })
}

fn id_value(idx: usize, column: &str, value: &Value) -> AppResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(n.to_string()),
        _ => Err(AppError::Schema(format!(
            "Row {}: column {} must be a string or integer id",
            idx, column
        ))),
    }
}

/// Every known item id, in first-seen order without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    items: Vec<String>,
}

impl Catalog {
    pub fn new<I, S>(items: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut seen = HashSet::new();
        let items = items
            .into_iter()
            .map(Into::into)
            .filter(|id: &String| seen.insert(id.clone()))
            .collect();
        Self { items }
    }

    /// Catalog made of the distinct items that appear in the likes table
    pub fn from_likes(likes: &LikesTable) -> Self {
        Self::new(likes.rows().iter().map(|row| row.item_id.clone()))
    }

    pub fn items(&self) -> &[String] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
