//! Request and response DTOs for the query surface.

use crate::{AttrValue, Gender, Predicate, UserId};
use serde::{Deserialize, Serialize};

/// Base response envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BaseResponse<T> {
    #[serde(default = "default_code")]
    pub code: i32,
    pub message: String,
    #[serde(default)]
    pub data: Option<T>,
}

fn default_code() -> i32 {
    200
}

impl<T> BaseResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            code: 200,
            message: "Success".to_string(),
            data: Some(data),
        }
    }

    pub fn error(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }
}

/// Attribute search request.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchRequest {
    pub attribute: String,
    pub predicate: Predicate,
    /// Stop after this many matches (in ascending user id order).
    #[serde(default)]
    pub limit: Option<usize>,
}

/// A resolved path, `path[0] == from` and `path.last() == to`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PathResponse {
    pub from: UserId,
    pub to: UserId,
    pub hops: usize,
    pub path: Vec<UserId>,
}

impl PathResponse {
    pub fn new(path: Vec<UserId>) -> Option<Self> {
        let from = *path.first()?;
        let to = *path.last()?;
        Some(Self {
            from,
            to,
            hops: path.len() - 1,
            path,
        })
    }
}

/// One bucket of a distribution or top-k listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueCount {
    pub value: AttrValue,
    pub count: usize,
}

/// A user and its out-degree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegreeEntry {
    pub user_id: UserId,
    pub degree: usize,
}

/// A user reached by a traversal and its hop distance from the start.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReachEntry {
    pub user_id: UserId,
    pub hops: usize,
}

/// Out-degree statistics over all users.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeSummary {
    pub users: usize,
    pub edges: usize,
    pub average: f64,
    pub median: f64,
    pub max: usize,
}

/// Average age for one gender group (users without an age are left out).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderAge {
    pub gender: Gender,
    pub users: usize,
    pub average_age: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct GenderCount {
    pub gender: Gender,
    pub users: usize,
}

/// Body of `GET /stats/gender`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenderReport {
    pub counts: Vec<GenderCount>,
    pub average_age: Vec<GenderAge>,
}

/// Body of `GET /stats/degrees`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DegreeReport {
    pub summary: DegreeSummary,
    /// `(out_degree, users)` pairs, ascending by degree.
    pub distribution: Vec<(usize, usize)>,
    pub most_connected: Vec<DegreeEntry>,
    pub least_connected: Vec<DegreeEntry>,
}

/// Body of `POST /users/search`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResponse {
    /// Matches before `limit` was applied.
    pub total: usize,
    pub users: Vec<crate::UserRecord>,
}
