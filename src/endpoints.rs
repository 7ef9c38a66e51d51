use url::Url;

use crate::entities::activity::ActivityId;
use crate::error::{Error, Result};

pub const BASE_URL: &str = "https://www.strava.com/api/v3/";
pub const TOKEN_URL: &str = "https://www.strava.com/oauth/token";

/// A typed representation of the Strava API endpoints this crate talks to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StravaEndpoint {
    /// Activities of the authenticated athlete, newest first.
    AthleteActivities,
    Activity(ActivityId),
}

impl StravaEndpoint {
    /// Converts the endpoint to a URL below `base`.
    ///
    /// `base` must end with a `/`, otherwise its last segment is replaced.
    pub fn to_url(&self, base: &Url) -> Result<Url> {
        let path = match self {
            Self::AthleteActivities => "athlete/activities".to_string(),
            Self::Activity(id) => format!("activities/{id}"),
        };

        base.join(&path).map_err(|_| Error::InvalidEndpoint)
    }

    /// Name of the resource behind the endpoint, used in error reports.
    #[must_use]
    pub fn entity(&self) -> &'static str {
        match self {
            Self::AthleteActivities | Self::Activity(_) => "Activity",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse(BASE_URL).unwrap()
    }

    #[test]
    fn athlete_activities_url() {
        assert_eq!(
            StravaEndpoint::AthleteActivities.to_url(&base()).unwrap().as_str(),
            "https://www.strava.com/api/v3/athlete/activities"
        );
    }

    #[test]
    fn activity_url_contains_id() {
        let url = StravaEndpoint::Activity(ActivityId(12_345_678_987))
            .to_url(&base())
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://www.strava.com/api/v3/activities/12345678987"
        );
    }

    #[test]
    fn custom_base_is_respected() {
        let base = Url::parse("http://127.0.0.1:8080/api/v3/").unwrap();
        let url = StravaEndpoint::Activity(ActivityId(42)).to_url(&base).unwrap();
        assert_eq!(url.as_str(), "http://127.0.0.1:8080/api/v3/activities/42");
    }
}
