// Query filtering for tasks

use crate::models::{Category, Priority, Task};

/// Predicate for querying tasks
///
/// Every criterion that is set must match. The text criterion is a
/// case-insensitive substring match against the title or the description.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Filter {
    text: String,
    completed: Option<bool>,
    category: Option<Category>,
    priority: Option<Priority>,
}

impl Filter {
    /// A filter that matches every task
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, text: &str) -> Self {
        self.text = text.to_lowercase();
        self
    }

    pub fn completed(mut self, completed: impl Into<Option<bool>>) -> Self {
        self.completed = completed.into();
        self
    }

    pub fn category(mut self, category: impl Into<Option<Category>>) -> Self {
        self.category = category.into();
        self
    }

    pub fn priority(mut self, priority: impl Into<Option<Priority>>) -> Self {
        self.priority = priority.into();
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if self.completed.is_some_and(|c| c != task.completed) {
            return false;
        }
        if self.category.is_some_and(|c| c != task.category) {
            return false;
        }
        if self.priority.is_some_and(|p| p != task.priority) {
            return false;
        }
        self.matches_text(task)
    }

    fn matches_text(&self, task: &Task) -> bool {
        if self.text.is_empty() {
            return true;
        }
        task.title.to_lowercase().contains(&self.text) || task.description.to_lowercase().contains(&self.text)
    }
}
