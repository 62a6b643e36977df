use crate::error::Error;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Longest accepted action name, in characters.
pub const MAX_ACTION_NAME_LEN: usize = 128;

/// Store-generated identifier of an action dictionary entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActionId(pub i64);

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One timing sample as submitted by a caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionTiming {
    #[serde(rename = "Action", alias = "action")]
    pub action: String,
    #[serde(rename = "Time", alias = "time")]
    pub time: f64,
}

impl ActionTiming {
    pub fn new<A: Into<String>>(action: A, time: f64) -> Self {
        Self {
            action: action.into(),
            time,
        }
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.action.is_empty() {
            return Err(Error::validation("action name cannot be empty"));
        }

        let len = self.action.chars().count();
        if len > MAX_ACTION_NAME_LEN {
            return Err(Error::validation(format!(
                "action name is {} characters, at most {} allowed",
                len, MAX_ACTION_NAME_LEN
            )));
        }

        if !self.time.is_finite() {
            return Err(Error::validation(format!(
                "time must be a finite number, got {}",
                self.time
            )));
        }

        Ok(())
    }
}

/// Mean duration of one action over all of its recorded samples.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActionStatistic {
    #[serde(rename = "Name")]
    pub name: String,
    #[serde(rename = "Avg")]
    pub avg: f64,
}
