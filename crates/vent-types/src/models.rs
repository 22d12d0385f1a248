use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// The emotion a story is tagged with. Closed set — anything else is
/// rejected at the JSON boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Happy,
    Sad,
    Frustrated,
    Excited,
}

impl Emotion {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Happy => "happy",
            Self::Sad => "sad",
            Self::Frustrated => "frustrated",
            Self::Excited => "excited",
        }
    }
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "happy" => Ok(Self::Happy),
            "sad" => Ok(Self::Sad),
            "frustrated" => Ok(Self::Frustrated),
            "excited" => Ok(Self::Excited),
            other => Err(format!("unknown emotion: {other}")),
        }
    }
}

/// Story category. The wire strings are capitalized, matching what clients
/// display directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Category {
    General,
    College,
    Relationships,
    Work,
    Family,
    Health,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::General => "General",
            Self::College => "College",
            Self::Relationships => "Relationships",
            Self::Work => "Work",
            Self::Family => "Family",
            Self::Health => "Health",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "General" => Ok(Self::General),
            "College" => Ok(Self::College),
            "Relationships" => Ok(Self::Relationships),
            "Work" => Ok(Self::Work),
            "Family" => Ok(Self::Family),
            "Health" => Ok(Self::Health),
            other => Err(format!("unknown category: {other}")),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn emotion_round_trips_through_strings() {
        for e in [
            Emotion::Happy,
            Emotion::Sad,
            Emotion::Frustrated,
            Emotion::Excited,
        ] {
            assert_eq!(e.as_str().parse::<Emotion>().unwrap(), e);
        }
        assert!("angry".parse::<Emotion>().is_err());
    }

    #[test]
    fn category_round_trips_through_strings() {
        for c in [
            Category::General,
            Category::College,
            Category::Relationships,
            Category::Work,
            Category::Family,
            Category::Health,
        ] {
            assert_eq!(c.as_str().parse::<Category>().unwrap(), c);
        }
        assert!("Sports".parse::<Category>().is_err());
    }

    #[test]
    fn emotion_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Emotion::Frustrated).unwrap(),
            "\"frustrated\""
        );
        assert!(serde_json::from_str::<Emotion>("\"Frustrated\"").is_err());
    }
}
