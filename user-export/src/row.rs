use crate::model::{EnrichedUser, ExportRow};

/// Separator between names in the skills and queues columns.
pub const LIST_DELIMITER: &str = ", ";

/// Flattens an enriched user into the fixed five-column schema.
///
/// An empty list joins to an empty string, which keeps "no skills" distinct
/// from a single unresolved skill.
pub fn build_row(user: &EnrichedUser) -> ExportRow {
    ExportRow {
        user_name: user.name.clone(),
        email_address: user.email.clone(),
        division: user.division.clone(),
        assigned_skills: user.skills.join(LIST_DELIMITER),
        assigned_queues: user.queues.join(LIST_DELIMITER)
    }
}

pub fn build_rows(users: &[EnrichedUser]) -> Vec<ExportRow> {
    users.iter().map(build_row).collect()
}
