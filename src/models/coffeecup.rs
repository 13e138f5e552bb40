use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

// ==================================================================================================
// Resource Models
// ==================================================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Client {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client: Option<i64>,
    #[serde(default)]
    pub billable: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntry {
    pub id: i64,
    pub day: NaiveDate,
    /// Wall clock start, `HH:MM` or `HH:MM:SS`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "user")]
    pub user_id: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub project: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task: Option<i64>,
    /// Seconds
    #[serde(default)]
    pub duration: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: i64,
    #[serde(default)]
    pub firstname: String,
    #[serde(default)]
    pub lastname: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    /// Plannable in CoffeeCup
    #[serde(default)]
    pub show_in_planner: bool,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl User {
    pub fn to_simple(&self) -> SimpleUser {
        SimpleUser {
            id: self.id,
            firstname: self.firstname.clone(),
            lastname: self.lastname.clone(),
            email: self.email.clone(),
            department: self.department.clone(),
            birthday: self.birthday,
            is_currently_valid: self.show_in_planner && self.is_active,
        }
    }
}

/// Reduced user view for consumers that only need identity data
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimpleUser {
    pub id: i64,
    pub firstname: String,
    pub lastname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub birthday: Option<NaiveDate>,
    pub is_currently_valid: bool,
}

fn default_true() -> bool {
    true
}

// ==================================================================================================
// Response Envelopes
// ==================================================================================================

#[derive(Debug, Deserialize)]
pub struct ClientsResponse {
    #[serde(default)]
    pub clients: Vec<Client>,
}

#[derive(Debug, Deserialize)]
pub struct ProjectsResponse {
    #[serde(default)]
    pub projects: Vec<Project>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TimeEntriesResponse {
    #[serde(default)]
    pub time_entries: Vec<TimeEntry>,
}

#[derive(Debug, Deserialize)]
pub struct UsersResponse {
    #[serde(default)]
    pub users: Vec<User>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_time_entry_wire_names() {
        let resp: TimeEntriesResponse = serde_json::from_str(
            r#"{"timeEntries":[{"id":1,"day":"2024-01-02","startTime":"08:30","user":7,"project":3,"duration":3600,"comment":"review"}]}"#,
        )
        .unwrap();

        let entry = &resp.time_entries[0];
        assert_eq!(entry.day, NaiveDate::from_ymd_opt(2024, 1, 2).unwrap());
        assert_eq!(entry.start_time.as_deref(), Some("08:30"));
        assert_eq!(entry.user_id, 7);
        assert_eq!(entry.project, Some(3));
    }

    #[test]
    fn test_user_defaults() {
        let resp: UsersResponse =
            serde_json::from_str(r#"{"users":[{"id":1,"firstname":"Anna","lastname":"Smith"}]}"#)
                .unwrap();

        let user = &resp.users[0];
        assert!(!user.show_in_planner);
        assert!(user.is_active);
        assert_eq!(user.birthday, None);
    }

    #[test]
    fn test_to_simple_validity() {
        let mut user = User {
            id: 1,
            firstname: "Anna".into(),
            lastname: "Smith".into(),
            email: Some("anna@example.com".into()),
            department: None,
            birthday: NaiveDate::from_ymd_opt(1990, 5, 17),
            show_in_planner: true,
            is_active: true,
        };
        let simple = user.to_simple();
        assert!(simple.is_currently_valid);
        assert_eq!(simple.email.as_deref(), Some("anna@example.com"));
        assert_eq!(simple.birthday, NaiveDate::from_ymd_opt(1990, 5, 17));

        user.is_active = false;
        assert!(!user.to_simple().is_currently_valid);

        user.is_active = true;
        user.show_in_planner = false;
        assert!(!user.to_simple().is_currently_valid);
    }

    #[test]
    fn test_missing_envelope_is_empty() {
        let resp: ClientsResponse = serde_json::from_str("{}").unwrap();
        assert!(resp.clients.is_empty());
    }
}
