// Editor state for creating and editing a task

use chrono::NaiveDate;

use crate::models::{Category, Priority, Task, TaskData};

/// What the host should do when the user asks to close the form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CloseAction {
    Close,
    /// A new task has unsaved input; ask before throwing it away
    ConfirmDiscard,
}

/// Whether a reply to a yes/no prompt confirms it
pub fn confirms(answer: &str) -> bool {
    matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
}

/// Fields of the create/edit form
///
/// The host calls [`TaskForm::reset`] whenever the editing target changes;
/// nothing is re-synced implicitly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskForm {
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub category: Category,
    pub due_date: Option<NaiveDate>,
    editing: Option<i64>,
}

impl TaskForm {
    /// Blank form for a new task
    pub fn new(default_category: Category) -> Self {
        Self {
            title: String::new(),
            description: String::new(),
            priority: Priority::Low,
            category: default_category,
            due_date: None,
            editing: None,
        }
    }

    /// Form pre-filled from an existing task
    pub fn edit(task: &Task) -> Self {
        let mut form = Self::new(task.category);
        form.reset(Some(task), task.category);
        form
    }

    /// Re-initialize for a new editing target, or blank for a new task
    pub fn reset(&mut self, editing: Option<&Task>, default_category: Category) {
        match editing {
            Some(task) => {
                self.title = task.title.clone();
                self.description = task.description.clone();
                self.priority = task.priority;
                self.category = task.category;
                self.due_date = task.due_date;
                self.editing = Some(task.id);
            }
            None => *self = Self::new(default_category),
        }
    }

    /// Id of the task being edited, `None` when creating
    pub fn editing(&self) -> Option<i64> {
        self.editing
    }

    pub fn has_unsaved_changes(&self) -> bool {
        !self.title.trim().is_empty() || !self.description.trim().is_empty() || self.due_date.is_some()
    }

    pub fn request_close(&self) -> CloseAction {
        if self.editing.is_none() && self.has_unsaved_changes() {
            CloseAction::ConfirmDiscard
        } else {
            CloseAction::Close
        }
    }

    /// Whether the save button is enabled
    pub fn can_submit(&self) -> bool {
        !self.title.trim().is_empty()
    }

    /// Validated data for the store, `None` while the title is blank
    pub fn submit(&self) -> Option<TaskData> {
        TaskData::new(&self.title, &self.description, self.priority, self.category)
            .ok()
            .map(|data| data.with_due_date(self.due_date))
    }
}
