use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Error;

/// Number of activities Strava returns at most per page.
pub const MAX_PER_PAGE: u32 = 200;

/// Identifier of a Strava activity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ActivityId(pub u64);

impl fmt::Display for ActivityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ActivityId {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse::<u64>()
            .map(Self)
            .map_err(|_| Error::InvalidActivityId(s.to_string()))
    }
}

impl From<u64> for ActivityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

/// An activity as returned by the API.
///
/// Only `id` is modelled; every other attribute, `name` included, stays in
/// `other` exactly as received so the activity serializes back to the same
/// document.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Activity {
    pub id: ActivityId,
    #[serde(flatten)]
    pub other: Map<String, Value>,
}

impl Activity {
    /// The activity name, if present and a string.
    #[must_use]
    pub fn name(&self) -> Option<&str> {
        self.other.get("name").and_then(Value::as_str)
    }

    /// Look up a raw attribute that is not modelled explicitly.
    #[must_use]
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.other.get(key)
    }
}

/// Query parameters for listing the athlete's activities.
#[derive(Debug, Clone, Serialize)]
pub struct ListParameters {
    pub page: u32,
    pub per_page: u32,
}

impl Default for ListParameters {
    fn default() -> Self {
        Self {
            page: 1,
            per_page: 30,
        }
    }
}

impl ListParameters {
    /// First page with `per_page` entries, capped at [`MAX_PER_PAGE`].
    #[must_use]
    pub fn first_page(per_page: u32) -> Self {
        Self {
            per_page: per_page.clamp(1, MAX_PER_PAGE),
            ..Self::default()
        }
    }
}

/// Form body of an activity update.
#[derive(Debug, Clone, Serialize)]
pub struct UpdatableActivity {
    pub name: String,
}

impl UpdatableActivity {
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }
}
