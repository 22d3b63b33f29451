// Persisted shape of a task record

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

use crate::models::{Category, Priority, Task};

/// One task as stored in the slot blob
///
/// `priorityColors` and `categoryColor` are derived from priority and category
/// on every write. Whatever the blob holds for them is ignored on read.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskRecord {
    pub id: i64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub priority_colors: String,
    #[serde(default)]
    pub category_color: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        deserialize_with = "deserialize_due_date"
    )]
    pub due_date: Option<NaiveDate>,
}

impl From<Task> for TaskRecord {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            priority_colors: priority_colors(task.priority).to_string(),
            category_color: category_color(task.category).to_string(),
            title: task.title,
            description: task.description,
            priority: task.priority,
            category: task.category,
            completed: task.completed,
            due_date: task.due_date,
        }
    }
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id,
            title: record.title,
            description: record.description,
            priority: record.priority,
            category: record.category,
            completed: record.completed,
            due_date: record.due_date,
        }
    }
}

/// Badge classes for a priority, as the web front end styles them
pub fn priority_colors(priority: Priority) -> &'static str {
    match priority {
        Priority::Low => "bg-[#1A263B] text-[#5586E8] border-[#22334E]",
        Priority::Medium => "bg-[#36301A] text-[#F3A530] border-[#484022]",
        Priority::High => "bg-[#362121] text-[#EF5C5D] border-[#482828]",
    }
}

/// Dot class for a category, as the web front end styles it
pub fn category_color(category: Category) -> &'static str {
    match category {
        Category::Work => "bg-blue-400",
        Category::Personal => "bg-purple-400",
        Category::Health => "bg-pink-400",
        Category::Shopping => "bg-green-400",
    }
}

// Edit forms have been known to store "" for "no due date"
fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    match raw.as_deref().map(str::trim) {
        None | Some("") => Ok(None),
        Some(s) => NaiveDate::parse_from_str(s, "%Y-%m-%d")
            .map(Some)
            .map_err(serde::de::Error::custom),
    }
}
