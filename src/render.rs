// Terminal rendering of tasks and stats

use chrono::NaiveDate;
use colored::{Color, ColoredString, Colorize};

use crate::models::{Category, Priority, Stats, Task};

pub fn priority_color(priority: Priority) -> Color {
    match priority {
        Priority::Low => Color::Blue,
        Priority::Medium => Color::Yellow,
        Priority::High => Color::Red,
    }
}

pub fn category_color(category: Category) -> Color {
    match category {
        Category::Work => Color::Blue,
        Category::Personal => Color::Magenta,
        Category::Health => Color::BrightMagenta,
        Category::Shopping => Color::Green,
    }
}

/// `Jan 5, 2026`
pub fn format_due_date(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

fn priority_badge(task: &Task) -> ColoredString {
    if task.completed {
        "Done".green()
    } else {
        task.priority.to_string().color(priority_color(task.priority))
    }
}

/// One list line: checkbox, title, badges, due date and id
pub fn task_line(task: &Task) -> String {
    let checkbox = if task.completed { "[x]" } else { "[ ]" };
    let title = if task.completed {
        task.title.dimmed().strikethrough()
    } else {
        task.title.bold()
    };

    let mut line = format!(
        "{} {}  {}  {} {}",
        checkbox,
        title,
        priority_badge(task),
        "●".color(category_color(task.category)),
        task.category
    );

    if let Some(due) = task.due_date {
        line.push_str(&format!("  due {}", format_due_date(due)));
    }
    line.push_str(&format!("  {}", format!("#{}", task.id).dimmed()));

    if !task.description.is_empty() {
        line.push_str(&format!("\n    {}", task.description.dimmed()));
    }

    line
}

pub fn stats_summary(stats: &Stats) -> String {
    format!(
        "{} of {} tasks completed ({}%)\n{} high priority pending",
        stats.completed,
        stats.total,
        stats.completion_percentage.to_string().blue(),
        stats.high_priority_pending.to_string().color(priority_color(Priority::High))
    )
}
