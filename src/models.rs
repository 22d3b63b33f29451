// Data models for todoit

use chrono::NaiveDate;
use eyre::{Result, eyre};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::record::TaskRecord;

/// A single to-do item
///
/// Serialized through [`TaskRecord`], which adds the derived color fields of
/// the persisted layout.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(into = "TaskRecord", from = "TaskRecord")]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub completed: bool,
    pub due_date: Option<NaiveDate>,
}

impl Task {
    /// Overwrite every editable field; the completion flag is left alone
    pub fn apply(&mut self, data: TaskData) {
        self.title = data.title;
        self.description = data.description;
        self.priority = data.priority;
        self.category = data.category;
        self.due_date = data.due_date;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Priority {
    #[default]
    Low,
    Medium,
    High,
}

impl Priority {
    pub const ALL: [Priority; 3] = [Priority::Low, Priority::Medium, Priority::High];

    /// Label used by the form's picker
    pub fn short_label(self) -> &'static str {
        match self {
            Priority::Low => "Low",
            Priority::Medium => "Med",
            Priority::High => "High",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Priority::Low => write!(f, "Low"),
            Priority::Medium => write!(f, "Medium"),
            Priority::High => write!(f, "High"),
        }
    }
}

impl FromStr for Priority {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "low" => Ok(Priority::Low),
            "med" | "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(eyre!("Unknown priority: {} (expected low, med, medium or high)", other)),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    #[default]
    Work,
    Personal,
    Health,
    Shopping,
}

impl Category {
    pub const ALL: [Category; 4] = [Category::Work, Category::Personal, Category::Health, Category::Shopping];
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Category::Work => write!(f, "Work"),
            Category::Personal => write!(f, "Personal"),
            Category::Health => write!(f, "Health"),
            Category::Shopping => write!(f, "Shopping"),
        }
    }
}

impl FromStr for Category {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "health" => Ok(Category::Health),
            "shopping" => Ok(Category::Shopping),
            other => Err(eyre!(
                "Unknown category: {} (expected work, personal, health or shopping)",
                other
            )),
        }
    }
}

/// Editable fields of a task, validated on construction
///
/// Title and description are trimmed; a blank title is rejected so the store
/// never sees one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskData {
    title: String,
    description: String,
    priority: Priority,
    category: Category,
    due_date: Option<NaiveDate>,
}

impl TaskData {
    pub fn new(title: &str, description: &str, priority: Priority, category: Category) -> Result<Self> {
        let title = title.trim();
        if title.is_empty() {
            return Err(eyre!("Task title cannot be empty or whitespace-only"));
        }

        Ok(Self {
            title: title.to_string(),
            description: description.trim().to_string(),
            priority,
            category,
            due_date: None,
        })
    }

    pub fn with_due_date(mut self, due_date: Option<NaiveDate>) -> Self {
        self.due_date = due_date;
        self
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn priority(&self) -> Priority {
        self.priority
    }

    pub fn category(&self) -> Category {
        self.category
    }

    pub fn due_date(&self) -> Option<NaiveDate> {
        self.due_date
    }

    pub(crate) fn into_task(self, id: i64) -> Task {
        Task {
            id,
            title: self.title,
            description: self.description,
            priority: self.priority,
            category: self.category,
            completed: false,
            due_date: self.due_date,
        }
    }
}

/// Counters derived from the whole collection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Stats {
    pub completed: usize,
    pub total: usize,
    /// 0-100, rounded half up; 0 when there are no tasks
    pub completion_percentage: u8,
    pub high_priority_pending: usize,
}

impl Stats {
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> Self {
        let mut stats = Stats::default();
        for task in tasks {
            stats.total += 1;
            if task.completed {
                stats.completed += 1;
            } else if task.priority == Priority::High {
                stats.high_priority_pending += 1;
            }
        }
        stats.completion_percentage = percentage(stats.completed, stats.total);
        stats
    }

    pub fn pending(&self) -> usize {
        self.total - self.completed
    }
}

fn percentage(part: usize, whole: usize) -> u8 {
    if whole == 0 {
        return 0;
    }
    // round(100 * part / whole) with halves rounded up
    ((200 * part + whole) / (2 * whole)) as u8
}

/// Parse a `YYYY-MM-DD` due date
pub fn parse_due_date(s: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d").map_err(|e| eyre!("Invalid due date {:?}: {} (expected YYYY-MM-DD)", s, e))
}

/// Helper function to get current timestamp in milliseconds
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn task(id: i64, priority: Priority, completed: bool) -> Task {
        Task {
            id,
            title: format!("Task {}", id),
            description: String::new(),
            priority,
            category: Category::Work,
            completed,
            due_date: None,
        }
    }

    #[test]
    fn test_now_ms() {
        let ts = now_ms();
        assert!(ts > 0);
        // Should be reasonable timestamp (after year 2020)
        assert!(ts > 1_600_000_000_000);
    }

    #[test]
    fn test_priority_parse() {
        assert_eq!("low".parse::<Priority>().unwrap(), Priority::Low);
        assert_eq!("Med".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!("MEDIUM".parse::<Priority>().unwrap(), Priority::Medium);
        assert_eq!(" high ".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }

    #[test]
    fn test_category_parse_and_display() {
        for category in Category::ALL {
            assert_eq!(category.to_string().parse::<Category>().unwrap(), category);
        }
        assert!("errands".parse::<Category>().is_err());
    }

    #[test]
    fn test_priority_serialization() {
        assert_eq!(serde_json::to_string(&Priority::Medium).unwrap(), "\"Medium\"");
        assert_eq!(serde_json::to_string(&Category::Shopping).unwrap(), "\"Shopping\"");
    }

    #[test]
    fn test_task_data_trims_and_rejects_blank_title() {
        let data = TaskData::new("  Buy milk ", " 2 liters\n", Priority::Low, Category::Shopping).unwrap();
        assert_eq!(data.title(), "Buy milk");
        assert_eq!(data.description(), "2 liters");

        assert!(TaskData::new("", "desc", Priority::Low, Category::Work).is_err());
        assert!(TaskData::new("   \t", "desc", Priority::Low, Category::Work).is_err());
    }

    #[test]
    fn test_apply_keeps_completion() {
        let mut t = task(1, Priority::Low, true);
        let due = NaiveDate::from_ymd_opt(2026, 3, 1);
        let data = TaskData::new("Renamed", "", Priority::High, Category::Health)
            .unwrap()
            .with_due_date(due);
        t.apply(data);

        assert_eq!(t.title, "Renamed");
        assert_eq!(t.priority, Priority::High);
        assert_eq!(t.category, Category::Health);
        assert_eq!(t.due_date, due);
        assert!(t.completed);
    }

    #[test]
    fn test_stats_empty() {
        let stats = Stats::from_tasks(&Vec::<Task>::new());
        assert_eq!(stats.total, 0);
        assert_eq!(stats.completion_percentage, 0);
    }

    #[test]
    fn test_stats_high_priority_pending() {
        let tasks = vec![task(1, Priority::High, false), task(2, Priority::High, true)];
        let stats = Stats::from_tasks(&tasks);
        assert_eq!(stats.high_priority_pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total, 2);
        assert_eq!(stats.completion_percentage, 50);
        assert_eq!(stats.pending(), 1);
    }

    #[test]
    fn test_percentage_rounding() {
        assert_eq!(percentage(1, 3), 33);
        assert_eq!(percentage(2, 3), 67);
        assert_eq!(percentage(1, 8), 13); // 12.5 rounds up
        assert_eq!(percentage(3, 3), 100);
        assert_eq!(percentage(0, 5), 0);
    }

    #[test]
    fn test_parse_due_date() {
        assert_eq!(parse_due_date("2026-10-19").unwrap(), NaiveDate::from_ymd_opt(2026, 10, 19).unwrap());
        assert!(parse_due_date("19/10/2026").is_err());
    }
}
