// Navigation views over the task list

use eyre::{Result, eyre};
use std::fmt;
use std::str::FromStr;

use crate::filter::Filter;
use crate::models::Category;

/// A sidebar entry: which subset of tasks is on screen
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum View {
    #[default]
    All,
    Pending,
    Completed,
    Category(Category),
}

impl View {
    /// Every view in sidebar order
    pub fn all() -> Vec<View> {
        let mut views = vec![View::All, View::Pending, View::Completed];
        views.extend(Category::ALL.into_iter().map(View::Category));
        views
    }

    /// Filter selecting this view's tasks, narrowed by a search text
    pub fn filter(self, search: &str) -> Filter {
        let filter = Filter::new().text(search);
        match self {
            View::All => filter,
            View::Pending => filter.completed(false),
            View::Completed => filter.completed(true),
            View::Category(category) => filter.category(category),
        }
    }

    pub fn title(self) -> String {
        match self {
            View::All => "All Tasks".to_string(),
            View::Pending => "Pending Tasks".to_string(),
            View::Completed => "Completed Tasks".to_string(),
            View::Category(category) => format!("{} Tasks", category),
        }
    }

    /// Message shown when the view has nothing to list
    pub fn empty_message(self, store_is_empty: bool) -> &'static str {
        if !store_is_empty {
            return "No matching tasks found";
        }
        match self {
            View::Completed => "No task confirmed",
            _ => "No tasks yet",
        }
    }
}

impl fmt::Display for View {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            View::All => write!(f, "all"),
            View::Pending => write!(f, "pending"),
            View::Completed => write!(f, "completed"),
            View::Category(category) => write!(f, "{}", category.to_string().to_lowercase()),
        }
    }
}

impl FromStr for View {
    type Err = eyre::Report;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(View::All),
            "pending" => Ok(View::Pending),
            "completed" | "done" => Ok(View::Completed),
            other => other
                .parse::<Category>()
                .map(View::Category)
                .map_err(|_| eyre!("Unknown view: {} (expected all, pending, completed or a category)", other)),
        }
    }
}
