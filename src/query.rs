// Data retrieval on top of the token manager
// One method per CoffeeCup resource, sorted and filtered client-side

use chrono::NaiveDate;
use serde_json::json;
use std::cmp::Ordering;
use std::sync::Arc;

use crate::auth::TokenManager;
use crate::error::Result;
use crate::models::coffeecup::{
    ClientsResponse, ProjectsResponse, TimeEntriesResponse, UsersResponse,
};
use crate::models::{Client, Project, SimpleUser, TimeEntry, User};

const DAY_FORMAT: &str = "%Y-%m-%d";

/// Query service for CoffeeCup resources
#[derive(Clone)]
pub struct QueryService {
    tokens: Arc<TokenManager>,
}

impl QueryService {
    pub fn new(tokens: Arc<TokenManager>) -> Self {
        Self { tokens }
    }

    /// All clients, ordered by name
    pub async fn get_clients(&self) -> Result<Vec<Client>> {
        let resp: ClientsResponse = self.tokens.authenticated_get("clients").await?;
        let mut clients = resp.clients;
        clients.sort_by(|a, b| compare_names(&a.name, &b.name));
        Ok(clients)
    }

    /// All projects, ordered by name
    pub async fn get_projects(&self) -> Result<Vec<Project>> {
        let resp: ProjectsResponse = self.tokens.authenticated_get("projects").await?;
        let mut projects = resp.projects;
        projects.sort_by(|a, b| compare_names(&a.name, &b.name));
        Ok(projects)
    }

    /// All time entries
    pub async fn get_time_entries(&self) -> Result<Vec<TimeEntry>> {
        self.fetch_time_entries("timeEntries").await
    }

    /// Time entries from `day` onwards
    pub async fn get_time_entries_by_day(&self, day: NaiveDate) -> Result<Vec<TimeEntry>> {
        self.fetch_time_entries(&time_entries_by_day_path(day)).await
    }

    /// Time entries between `from` and `to`, both inclusive
    pub async fn get_time_entries_by_day_range(
        &self,
        from: NaiveDate,
        to: NaiveDate,
    ) -> Result<Vec<TimeEntry>> {
        if from > to {
            tracing::warn!(%from, %to, "Day range is inverted, result will be empty");
        }
        self.fetch_time_entries(&time_entries_by_day_range_path(from, to))
            .await
    }

    /// Users ordered by last name, then first name
    ///
    /// With `only_valid`, only users shown in the planner are returned.
    pub async fn get_users(&self, only_valid: bool) -> Result<Vec<User>> {
        let resp: UsersResponse = self.tokens.authenticated_get("users").await?;
        let mut users = resp.users;
        if only_valid {
            users.retain(|u| u.show_in_planner);
        }
        sort_users(&mut users);
        Ok(users)
    }

    /// Simplified users ordered by last name, then first name
    ///
    /// With `only_valid`, only currently valid users are returned.
    pub async fn get_users_simple(&self, only_valid: bool) -> Result<Vec<SimpleUser>> {
        let resp: UsersResponse = self.tokens.authenticated_get("users").await?;
        let mut users: Vec<SimpleUser> = resp
            .users
            .iter()
            .map(User::to_simple)
            .filter(|u| !only_valid || u.is_currently_valid)
            .collect();
        users.sort_by(|a, b| {
            compare_person(&a.lastname, &a.firstname, &b.lastname, &b.firstname)
        });
        Ok(users)
    }

    async fn fetch_time_entries(&self, path: &str) -> Result<Vec<TimeEntry>> {
        let resp: TimeEntriesResponse = self.tokens.authenticated_get(path).await?;
        let mut entries = resp.time_entries;
        tracing::debug!(count = entries.len(), path = path, "Fetched time entries");
        sort_time_entries(&mut entries);
        Ok(entries)
    }
}

/// `timeEntries?where={"day":{">=":"YYYY-MM-DD"}}`
pub fn time_entries_by_day_path(day: NaiveDate) -> String {
    let filter = json!({ "day": { ">=": day.format(DAY_FORMAT).to_string() } });
    format!("timeEntries?where={}", filter)
}

/// `timeEntries?where={"day":{">=":from,"<=":to}}`
pub fn time_entries_by_day_range_path(from: NaiveDate, to: NaiveDate) -> String {
    let filter = json!({
        "day": {
            ">=": from.format(DAY_FORMAT).to_string(),
            "<=": to.format(DAY_FORMAT).to_string(),
        }
    });
    format!("timeEntries?where={}", filter)
}

/// Order by day, then start time, then user id
pub fn sort_time_entries(entries: &mut [TimeEntry]) {
    entries.sort_by(|a, b| {
        a.day
            .cmp(&b.day)
            .then_with(|| a.start_time.cmp(&b.start_time))
            .then_with(|| a.user_id.cmp(&b.user_id))
    });
}

/// Order by last name, then first name
pub fn sort_users(users: &mut [User]) {
    users.sort_by(|a, b| compare_person(&a.lastname, &a.firstname, &b.lastname, &b.firstname));
}

fn compare_person(a_last: &str, a_first: &str, b_last: &str, b_first: &str) -> Ordering {
    compare_names(a_last, b_last).then_with(|| compare_names(a_first, b_first))
}

// Case-insensitive first, exact spelling as tie-break
fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}
