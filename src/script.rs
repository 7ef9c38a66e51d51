//! The run-once rename flow.
//!
//! Every step reports to the output writer and turns failures into `None`,
//! so one failing request never aborts the process.

use std::fmt;
use std::io::Write;

use oauth2::AccessToken;

use crate::client::Client;
use crate::config::Config;
use crate::error::Result;
use crate::entities::activity::{ActivityId, ListParameters, MAX_PER_PAGE};

/// Name used when a caller has no better idea.
pub const DEFAULT_NEW_NAME: &str = "funny_test_name";
/// Name the scripted run gives to the selected activity.
pub const SCRIPT_NEW_NAME: &str = "funny_test_name2";

/// Runs the individual steps and writes human-readable progress to `out`.
#[derive(Debug)]
pub struct Script<W> {
    out: W,
}

impl<W: Write> Script<W> {
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Gives back the output writer, e.g. to inspect captured output.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn say(&mut self, line: fmt::Arguments<'_>) {
        if let Err(e) = writeln!(self.out, "{line}") {
            warn!("failed to write output: {}", e);
        }
    }

    /// Reports a configuration that failed to load and passes a loaded one on.
    pub fn configure(&mut self, config: Result<Config>) -> Option<Config> {
        match config {
            Ok(config) => Some(config),
            Err(e) => {
                self.say(format_args!("Failed to load configuration: {e}"));
                error!("{:?}", miette::Report::new(e));
                None
            }
        }
    }

    /// Exchanges the refresh token for a fresh access token.
    pub async fn reauthorize(&mut self, config: &Config) -> Option<AccessToken> {
        match Client::refresh_access_token(config).await {
            Ok(token) => Some(token),
            Err(e) => {
                error!(error = ?e, "token refresh failed");
                self.say(format_args!("Failed to reauthorize: {e}"));
                None
            }
        }
    }

    /// Prints the first page of activities as one JSON document per line.
    pub async fn get_activities(&mut self, client: &Client) {
        let activities = match client
            .activities()
            .list(ListParameters::first_page(MAX_PER_PAGE))
            .await
        {
            Ok(activities) => activities,
            Err(e) => {
                error!(error = ?e, "listing activities failed");
                self.say(format_args!("Failed to retrieve activities: {e}"));
                return;
            }
        };

        debug!("retrieved {} activities", activities.len());
        for activity in &activities {
            match serde_json::to_string(activity) {
                Ok(json) => self.say(format_args!("{json}")),
                Err(e) => warn!(id = %activity.id, "failed to encode activity: {}", e),
            }
        }
    }

    /// Finds the most recent activity and prints its id and name.
    pub async fn get_latest_activity_id(&mut self, client: &Client) -> Option<ActivityId> {
        match client.activities().latest().await {
            Ok(Some(activity)) => {
                self.say(format_args!("Latest Activity ID: {}", activity.id));
                self.say(format_args!(
                    "Latest Activity Name: {}",
                    activity.name().unwrap_or("None")
                ));
                Some(activity.id)
            }
            Ok(None) => {
                self.say(format_args!("No activities found."));
                None
            }
            Err(e) => {
                error!(error = ?e, "fetching latest activity failed");
                self.say(format_args!("Request failed: {e}"));
                None
            }
        }
    }

    /// Fetches one activity and returns its name.
    pub async fn get_activity_name_by_id(
        &mut self,
        client: &Client,
        activity_id: ActivityId,
    ) -> Option<String> {
        match client.activities().get(activity_id).await {
            Ok(activity) => {
                self.say(format_args!(
                    "Activity ID {activity_id} Name: {}",
                    activity.name().unwrap_or("None")
                ));
                activity.name().map(str::to_owned)
            }
            Err(e) => {
                error!(error = ?e, %activity_id, "fetching activity failed");
                self.say(format_args!("Failed to retrieve activity name: {e}"));
                None
            }
        }
    }

    /// Renames an activity and reports the outcome.
    pub async fn rename_activity(&mut self, client: &Client, activity_id: ActivityId, new_name: &str) {
        match client.activities().rename(activity_id, new_name).await {
            Ok(()) => {
                info!(%activity_id, new_name, "activity renamed");
                self.say(format_args!("Activity ID {activity_id} renamed to: {new_name}"));
            }
            Err(e) => {
                error!(error = ?e, %activity_id, "renaming activity failed");
                self.say(format_args!("Failed to rename activity: {e}"));
            }
        }
    }

    /// Refresh, pick an activity and rename it.
    ///
    /// The configured test activity wins over the latest one.
    pub async fn run(&mut self, config: &Config) {
        let Some(access_token) = self.reauthorize(config).await else {
            return;
        };
        let client = Client::new(config.api_base_url.clone(), access_token);

        let latest_activity_id = self.get_latest_activity_id(&client).await;
        let Some(activity_id) = config.test_activity_id.or(latest_activity_id) else {
            info!("no activity to rename");
            return;
        };

        let name = self.get_activity_name_by_id(&client, activity_id).await;
        self.say(format_args!(
            "Name before renaming: {}",
            name.as_deref().unwrap_or("None")
        ));
        self.rename_activity(&client, activity_id, SCRIPT_NEW_NAME)
            .await;
    }
}
