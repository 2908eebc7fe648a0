//! Indexable attributes, their values, and query predicates.

use crate::QueryError;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Attributes of a [`crate::UserRecord`] that can be indexed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Attribute {
    Age,
    Gender,
    EyeColor,
    Education,
    Hobbies,
    Languages,
    Music,
}

/// Value type an attribute's index is keyed by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ValueKind {
    Integer,
    Text,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValueKind::Integer => f.write_str("integer"),
            ValueKind::Text => f.write_str("text"),
        }
    }
}

impl Attribute {
    pub const ALL: [Attribute; 7] = [
        Attribute::Age,
        Attribute::Gender,
        Attribute::EyeColor,
        Attribute::Education,
        Attribute::Hobbies,
        Attribute::Languages,
        Attribute::Music,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Attribute::Age => "age",
            Attribute::Gender => "gender",
            Attribute::EyeColor => "eye_color",
            Attribute::Education => "education",
            Attribute::Hobbies => "hobbies",
            Attribute::Languages => "languages",
            Attribute::Music => "music",
        }
    }

    pub fn kind(self) -> ValueKind {
        match self {
            Attribute::Age => ValueKind::Integer,
            _ => ValueKind::Text,
        }
    }

    /// Comma-separated list attributes; each token is indexed on its own.
    pub fn is_multi_valued(self) -> bool {
        matches!(
            self,
            Attribute::Hobbies | Attribute::Languages | Attribute::Music
        )
    }
}

impl std::fmt::Display for Attribute {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Attribute {
    type Err = QueryError;

    /// Case-insensitive; `-`, `_` and spaces are ignored.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase().replace(['-', '_', ' '], "");
        match normalized.as_str() {
            "age" => Ok(Attribute::Age),
            "gender" | "sex" => Ok(Attribute::Gender),
            "eyecolor" | "eyecolour" => Ok(Attribute::EyeColor),
            "education" => Ok(Attribute::Education),
            "hobbies" | "hobby" => Ok(Attribute::Hobbies),
            "languages" | "language" => Ok(Attribute::Languages),
            "music" => Ok(Attribute::Music),
            _ => Err(QueryError::InvalidAttribute(s.to_string())),
        }
    }
}

/// An index key. Integers order before text; an index never mixes the two.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttrValue {
    Int(i64),
    Text(String),
}

impl AttrValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            AttrValue::Int(_) => ValueKind::Integer,
            AttrValue::Text(_) => ValueKind::Text,
        }
    }
}

impl std::fmt::Display for AttrValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Text(v.to_string())
    }
}

/// Attribute predicate: equality or an inclusive range with optional bounds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Predicate {
    Equals {
        value: AttrValue,
    },
    Range {
        #[serde(default)]
        low: Option<AttrValue>,
        #[serde(default)]
        high: Option<AttrValue>,
    },
}

impl Predicate {
    pub fn equals(value: impl Into<AttrValue>) -> Self {
        Predicate::Equals {
            value: value.into(),
        }
    }

    pub fn range(low: Option<AttrValue>, high: Option<AttrValue>) -> Self {
        Predicate::Range { low, high }
    }

    /// Whether `value` satisfies the predicate (`low <= value <= high`).
    pub fn matches(&self, value: &AttrValue) -> bool {
        match self {
            Predicate::Equals { value: v } => v == value,
            Predicate::Range { low, high } => {
                low.as_ref().map_or(true, |l| l <= value) && high.as_ref().map_or(true, |h| value <= h)
            }
        }
    }

    /// Every bound must have the attribute's value kind.
    pub fn check_kind(&self, attr: Attribute) -> Result<(), QueryError> {
        let expected = attr.kind();
        let ok = match self {
            Predicate::Equals { value } => value.kind() == expected,
            Predicate::Range { low, high } => [low, high]
                .into_iter()
                .flatten()
                .all(|v| v.kind() == expected),
        };
        if ok {
            Ok(())
        } else {
            Err(QueryError::TypeMismatch {
                attribute: attr,
                expected,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attribute_names_round_trip() {
        for attr in Attribute::ALL {
            assert_eq!(attr.as_str().parse::<Attribute>().unwrap(), attr);
        }
        assert_eq!("Eye-Color".parse::<Attribute>().unwrap(), Attribute::EyeColor);
        assert!(matches!(
            "salary".parse::<Attribute>(),
            Err(QueryError::InvalidAttribute(_))
        ));
    }

    #[test]
    fn range_bounds_are_inclusive_and_optional() {
        let p = Predicate::range(Some(AttrValue::Int(20)), Some(AttrValue::Int(30)));
        assert!(p.matches(&AttrValue::Int(20)));
        assert!(p.matches(&AttrValue::Int(30)));
        assert!(!p.matches(&AttrValue::Int(31)));
        let open = Predicate::range(None, Some(AttrValue::Int(30)));
        assert!(open.matches(&AttrValue::Int(-5)));
        assert!(!Predicate::range(Some(AttrValue::Int(5)), Some(AttrValue::Int(1))).matches(&AttrValue::Int(3)));
    }

    #[test]
    fn kind_mismatch_is_reported() {
        let p = Predicate::equals("old");
        assert_eq!(
            p.check_kind(Attribute::Age),
            Err(QueryError::TypeMismatch {
                attribute: Attribute::Age,
                expected: ValueKind::Integer
            })
        );
        assert!(Predicate::equals(3i64).check_kind(Attribute::Age).is_ok());
    }

    #[test]
    fn predicate_json_shape() {
        let p: Predicate = serde_json::from_str(r#"{"op":"range","low":18,"high":30}"#).unwrap();
        assert_eq!(p, Predicate::range(Some(AttrValue::Int(18)), Some(AttrValue::Int(30))));
        let p: Predicate = serde_json::from_str(r#"{"op":"equals","value":"rock"}"#).unwrap();
        assert_eq!(p, Predicate::equals("rock"));
    }
}
