use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier handed out by the local store, stable for the lifetime of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LocalId(pub u64);

impl fmt::Display for LocalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Identifier assigned by the remote record store on create.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RemoteId(pub u64);

impl fmt::Display for RemoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Counter {
    pub local_id: LocalId,
    pub remote_id: Option<RemoteId>,
    pub name: String,
    pub count: u64,
    pub max: Option<u64>,
    pub category: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl Counter {
    pub fn is_completed(&self) -> bool {
        self.max.is_some_and(|max| self.count >= max)
    }

    /// Fraction of the bound reached, `None` for unbounded counters.
    pub fn progress(&self) -> Option<f64> {
        self.max
            .map(|max| (self.count as f64 / max as f64).clamp(0.0, 1.0))
    }

    /// `count + delta` clamped into `[0, max]`.
    pub fn clamped(&self, delta: i64) -> u64 {
        let raised = if delta >= 0 {
            self.count.saturating_add(delta.unsigned_abs())
        } else {
            self.count.saturating_sub(delta.unsigned_abs())
        };
        match self.max {
            Some(max) => raised.min(max),
            None => raised,
        }
    }
}

/// A counter as the remote store reports it, before the local store assigns a `LocalId`.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteCounter {
    pub id: RemoteId,
    pub name: String,
    pub count: u64,
    pub max: Option<u64>,
    pub category: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

impl RemoteCounter {
    pub fn into_counter(self, local_id: LocalId) -> Counter {
        Counter {
            local_id,
            remote_id: Some(self.id),
            name: self.name,
            count: self.count,
            max: self.max,
            category: self.category,
            updated_at: self.updated_at,
        }
    }
}

/// Validated input for creating a counter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewCounter {
    pub name: String,
    pub max: Option<u64>,
    pub category: Option<String>,
}

/// The editable subset of a counter. `count` is deliberately absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CounterDetails {
    pub name: String,
    pub max: Option<u64>,
    pub category: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: u64,
    pub username: String,
    pub email: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub user: User,
}

/// Parses a user-entered bound. Anything that is not a positive integer counts as unset.
pub fn parse_max(input: &str) -> Option<u64> {
    input.trim().parse::<u64>().ok().filter(|max| *max >= 1)
}

/// Trims free text, mapping blank input to unset.
pub fn normalize_category(input: &str) -> Option<String> {
    let trimmed = input.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}
