use serde::{Deserialize, Serialize};

/// Column headers of the export, in output order.
pub const EXPORT_HEADERS: [&str; 5] = [
    "User Name",
    "Email Address",
    "Division",
    "Assigned Skills",
    "Assigned Queues"
];

#[derive(Debug, Clone, Deserialize)]
pub struct EntityRef {
    pub id: String
}

/// User element as returned by the `users` listing endpoint.
#[derive(Debug, Clone, Deserialize)]
pub struct UserEntity {
    pub id: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub division: Option<EntityRef>,
    #[serde(default)]
    pub skills: Vec<EntityRef>,
    #[serde(default)]
    pub queues: Vec<EntityRef>
}

/// A user exactly as the platform describes it: references by identifier only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub division_id: Option<String>,
    pub skill_ids: Vec<String>,
    pub queue_ids: Vec<String>
}

impl From<UserEntity> for RawUser {
    fn from(entity: UserEntity) -> Self {
        Self {
            id: entity.id,
            name: entity.name.unwrap_or_default(),
            email: entity.email.unwrap_or_default(),
            division_id: entity.division.map(|d| d.id),
            skill_ids: entity.skills.into_iter().map(|s| s.id).collect(),
            queue_ids: entity.queues.into_iter().map(|q| q.id).collect()
        }
    }
}

/// A [`RawUser`] with every reference replaced by its display name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichedUser {
    pub id: String,
    pub name: String,
    pub email: String,
    pub division: String,
    pub skills: Vec<String>,
    pub queues: Vec<String>
}

/// One write-ready line of the export file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExportRow {
    #[serde(rename = "User Name")]
    pub user_name: String,
    #[serde(rename = "Email Address")]
    pub email_address: String,
    #[serde(rename = "Division")]
    pub division: String,
    #[serde(rename = "Assigned Skills")]
    pub assigned_skills: String,
    #[serde(rename = "Assigned Queues")]
    pub assigned_queues: String
}

impl ExportRow {
    pub fn fields(&self) -> [&str; 5] {
        [
            &self.user_name,
            &self.email_address,
            &self.division,
            &self.assigned_skills,
            &self.assigned_queues
        ]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_entity_with_all_references() {
        let entity: UserEntity = serde_json::from_value(serde_json::json!({
            "id": "u1",
            "name": "Ada",
            "email": "ada@example.com",
            "division": { "id": "d1", "name": "ignored" },
            "skills": [{ "id": "s1", "proficiency": 3.0 }, { "id": "s2" }],
            "queues": [{ "id": "q1" }],
            "state": "active"
        }))
        .unwrap();

        let raw = RawUser::from(entity);
        assert_eq!(raw.division_id.as_deref(), Some("d1"));
        assert_eq!(raw.skill_ids, vec!["s1", "s2"]);
        assert_eq!(raw.queue_ids, vec!["q1"]);
    }

    #[test]
    fn test_user_entity_with_missing_fields() {
        let entity: UserEntity =
            serde_json::from_value(serde_json::json!({ "id": "u2" })).unwrap();

        let raw = RawUser::from(entity);
        assert_eq!(raw.name, "");
        assert_eq!(raw.email, "");
        assert!(raw.division_id.is_none());
        assert!(raw.skill_ids.is_empty());
        assert!(raw.queue_ids.is_empty());
    }

    #[test]
    fn test_row_fields_follow_header_order() {
        let row = ExportRow {
            user_name: "A".to_string(),
            email_address: "a@x.com".to_string(),
            division: "Sales".to_string(),
            assigned_skills: "Billing".to_string(),
            assigned_queues: "Support".to_string()
        };
        assert_eq!(row.fields(), ["A", "a@x.com", "Sales", "Billing", "Support"]);
        assert_eq!(EXPORT_HEADERS[3], "Assigned Skills");
    }
}
