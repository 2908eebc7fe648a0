//! User records: the fixed attribute schema and raw ingestion rows.
//!
//! A [`RawUserRow`] is what ingestion hands over (every field still text);
//! [`RawUserRow::parse`] turns it into an immutable [`UserRecord`] plus the
//! user's outgoing friend ids, or rejects the whole row.

use crate::attribute::{AttrValue, Attribute};
use serde::{Deserialize, Serialize};

/// Dense user id, `0..N-1`, assigned at load time.
pub type UserId = u32;

/// Gender as recorded in the dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

impl Gender {
    pub fn as_str(self) -> &'static str {
        match self {
            Gender::Male => "male",
            Gender::Female => "female",
            Gender::Unknown => "unknown",
        }
    }

    /// Parse from dataset text (case-insensitive). Anything unrecognised is `Unknown`.
    pub fn parse(s: &str) -> Self {
        match s.trim().to_ascii_lowercase().as_str() {
            "male" | "m" => Gender::Male,
            "female" | "f" => Gender::Female,
            _ => Gender::Unknown,
        }
    }
}

impl std::fmt::Display for Gender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One user's attributes. Immutable once constructed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub user_id: UserId,
    #[serde(default)]
    pub gender: Gender,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub eye_color: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub education: Option<String>,
    /// Comma-separated list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub hobbies: Option<String>,
    /// Comma-separated list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub languages: Option<String>,
    /// Comma-separated list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub music: Option<String>,
}

impl UserRecord {
    /// Record with every attribute absent.
    pub fn new(user_id: UserId) -> Self {
        Self {
            user_id,
            gender: Gender::Unknown,
            age: None,
            eye_color: None,
            education: None,
            hobbies: None,
            languages: None,
            music: None,
        }
    }

    pub fn with_age(mut self, age: u32) -> Self {
        self.age = Some(age);
        self
    }

    pub fn with_gender(mut self, gender: Gender) -> Self {
        self.gender = gender;
        self
    }

    pub fn with_text(mut self, attr: Attribute, value: &str) -> Self {
        let slot = match attr {
            Attribute::EyeColor => &mut self.eye_color,
            Attribute::Education => &mut self.education,
            Attribute::Hobbies => &mut self.hobbies,
            Attribute::Languages => &mut self.languages,
            Attribute::Music => &mut self.music,
            Attribute::Age | Attribute::Gender => return self,
        };
        *slot = non_empty(value);
        self
    }

    /// Indexable values this record holds for `attr`.
    ///
    /// Absent values yield nothing. Multi-valued attributes yield one value per
    /// distinct non-empty token, in the order they first appear.
    pub fn attribute_values(&self, attr: Attribute) -> Vec<AttrValue> {
        match attr {
            Attribute::Age => self
                .age
                .map(|a| vec![AttrValue::Int(i64::from(a))])
                .unwrap_or_default(),
            Attribute::Gender => match self.gender {
                Gender::Unknown => Vec::new(),
                g => vec![AttrValue::Text(g.as_str().to_string())],
            },
            Attribute::EyeColor | Attribute::Education => self
                .text(attr)
                .map(|s| vec![AttrValue::Text(s.to_string())])
                .unwrap_or_default(),
            Attribute::Hobbies | Attribute::Languages | Attribute::Music => {
                let mut out: Vec<AttrValue> = Vec::new();
                if let Some(raw) = self.text(attr) {
                    for token in raw.split(',').map(str::trim).filter(|t| !t.is_empty()) {
                        let v = AttrValue::Text(token.to_string());
                        if !out.contains(&v) {
                            out.push(v);
                        }
                    }
                }
                out
            }
        }
    }

    fn text(&self, attr: Attribute) -> Option<&str> {
        match attr {
            Attribute::EyeColor => self.eye_color.as_deref(),
            Attribute::Education => self.education.as_deref(),
            Attribute::Hobbies => self.hobbies.as_deref(),
            Attribute::Languages => self.languages.as_deref(),
            Attribute::Music => self.music.as_deref(),
            Attribute::Age | Attribute::Gender => None,
        }
    }
}

/// Why a raw row was rejected.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RowError {
    #[error("missing user_id")]
    MissingUserId,
    #[error("invalid user_id: {0:?}")]
    InvalidUserId(String),
    #[error("invalid age: {0:?}")]
    InvalidAge(String),
    #[error("invalid friend id: {0:?}")]
    InvalidFriend(String),
}

/// A user row as supplied by ingestion, before validation.
///
/// Column names match the dataset header. `friends` is a `;`-separated list of
/// user ids.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RawUserRow {
    #[serde(default)]
    pub user_id: Option<String>,
    #[serde(default)]
    pub gender: Option<String>,
    #[serde(default)]
    pub age: Option<String>,
    #[serde(default)]
    pub eye_color: Option<String>,
    #[serde(default)]
    pub education: Option<String>,
    #[serde(default)]
    pub hobbies: Option<String>,
    #[serde(default)]
    pub languages: Option<String>,
    #[serde(default)]
    pub music: Option<String>,
    #[serde(default)]
    pub friends: Option<String>,
}

/// A validated row: the record and its outgoing friend ids in column order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedRow {
    pub record: UserRecord,
    pub friends: Vec<UserId>,
}

impl RawUserRow {
    /// Validate every field. Either the whole row parses or nothing is returned.
    pub fn parse(&self) -> Result<ParsedRow, RowError> {
        let raw_id = self
            .user_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .ok_or(RowError::MissingUserId)?;
        let user_id = parse_id(raw_id).ok_or_else(|| RowError::InvalidUserId(raw_id.to_string()))?;

        let age = match self.age.as_deref().map(str::trim).filter(|s| !s.is_empty()) {
            None => None,
            Some(raw) => parse_age(raw).ok_or_else(|| RowError::InvalidAge(raw.to_string()))?,
        };

        let mut friends = Vec::new();
        if let Some(raw) = self.friends.as_deref() {
            for token in raw.split(';').map(str::trim).filter(|t| !t.is_empty()) {
                let id = parse_id(token).ok_or_else(|| RowError::InvalidFriend(token.to_string()))?;
                friends.push(id);
            }
        }

        let record = UserRecord {
            user_id,
            gender: self.gender.as_deref().map(Gender::parse).unwrap_or_default(),
            age,
            eye_color: self.eye_color.as_deref().and_then(non_empty),
            education: self.education.as_deref().and_then(non_empty),
            hobbies: self.hobbies.as_deref().and_then(non_empty),
            languages: self.languages.as_deref().and_then(non_empty),
            music: self.music.as_deref().and_then(non_empty),
        };
        Ok(ParsedRow { record, friends })
    }
}

fn non_empty(s: &str) -> Option<String> {
    let t = s.trim();
    (!t.is_empty()).then(|| t.to_string())
}

/// Integral number, tolerating the `"12.0"` form some exports produce.
fn parse_integral(s: &str) -> Option<f64> {
    if let Ok(v) = s.parse::<i64>() {
        return Some(v as f64);
    }
    let v = s.parse::<f64>().ok()?;
    (v.is_finite() && v.fract() == 0.0).then_some(v)
}

fn parse_id(s: &str) -> Option<UserId> {
    let v = parse_integral(s)?;
    (v >= 0.0 && v <= f64::from(UserId::MAX)).then_some(v as UserId)
}

/// `Ok(None)` for non-positive ages, which the dataset uses for "unknown".
fn parse_age(s: &str) -> Option<Option<u32>> {
    let v = parse_integral(s)?;
    if v <= 0.0 {
        Some(None)
    } else if v <= f64::from(u32::MAX) {
        Some(Some(v as u32))
    } else {
        None
    }
}
