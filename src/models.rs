use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: i64,
    pub user_id: String,
    pub date: String, // YYYY-MM-DD
    pub content: String,
    pub completed: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rule {
    pub id: i64,
    pub user_id: String,
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub id: i64,
    pub user_id: String,
    pub date: String, // YYYY-MM-DD
    pub content: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MonthGoal {
    pub id: i64,
    pub user_id: String,
    pub month: String, // YYYY-MM
    pub content: String,
}

/// Validated body of a task create. Owner and timestamps are set server-side.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewTask {
    pub date: String,
    pub content: String,
    #[serde(default)]
    pub completed: bool,
}

impl NewTask {
    pub fn new(date: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            date: date.into(),
            content: content.into(),
            completed: false,
        }
    }
}

/// Partial update of a task; absent fields are left as stored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TaskPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed: Option<bool>,
}

impl TaskPatch {
    pub fn is_empty(&self) -> bool {
        self.date.is_none() && self.content.is_none() && self.completed.is_none()
    }

    pub fn apply_to(&self, task: &mut Task) {
        if let Some(date) = &self.date {
            task.date = date.clone();
        }
        if let Some(content) = &self.content {
            task.content = content.clone();
        }
        if let Some(completed) = self.completed {
            task.completed = completed;
        }
    }
}

/// Body shared by rule creates and note/goal upserts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ContentBody {
    pub content: String,
}

/// Inclusive date range filter for task listing.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TaskFilter {
    pub start: Option<String>,
    pub end: Option<String>,
}

impl TaskFilter {
    pub fn between(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start: Some(start.into()),
            end: Some(end.into()),
        }
    }

    /// Both bounds, or nothing: a single bound does not filter.
    pub fn bounds(&self) -> Option<(&str, &str)> {
        match (&self.start, &self.end) {
            (Some(start), Some(end)) => Some((start.as_str(), end.as_str())),
            _ => None,
        }
    }
}

/// The authenticated caller attached to a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    pub id: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Session {
    pub token: String,
    pub user_id: String,
    pub created_at: String,
    pub expires_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn task_serializes_camel_case() {
        let task = Task {
            id: 7,
            user_id: "u1".to_string(),
            date: "2026-03-10".to_string(),
            content: "Write report".to_string(),
            completed: false,
            created_at: "2026-03-01T10:00:00Z".to_string(),
        };
        let value = serde_json::to_value(&task).unwrap();
        assert_eq!(value["userId"], "u1");
        assert_eq!(value["createdAt"], "2026-03-01T10:00:00Z");
        assert!(value.get("user_id").is_none());
    }

    #[test]
    fn patch_applies_only_present_fields() {
        let mut task = Task {
            id: 1,
            user_id: "u1".to_string(),
            date: "2026-03-10".to_string(),
            content: "old".to_string(),
            completed: false,
            created_at: String::new(),
        };
        let patch = TaskPatch {
            completed: Some(true),
            ..TaskPatch::default()
        };
        patch.apply_to(&mut task);
        assert!(task.completed);
        assert_eq!(task.content, "old");
        assert_eq!(task.date, "2026-03-10");
    }

    #[test]
    fn filter_needs_both_bounds() {
        let one_sided = TaskFilter {
            start: Some("2026-01-01".to_string()),
            end: None,
        };
        assert!(one_sided.bounds().is_none());
        assert_eq!(
            TaskFilter::between("2026-01-01", "2026-01-31").bounds(),
            Some(("2026-01-01", "2026-01-31"))
        );
    }
}
