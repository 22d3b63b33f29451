use clap::{Parser, Subcommand};
use eyre::{Result, eyre};
use std::io::{self, Write};
use std::path::PathBuf;
use todoit::form::confirms;
use todoit::models::parse_due_date;
use todoit::{Backend, Config, TaskForm, TaskStore, View, render};
use tracing::Level;

#[derive(Parser)]
#[command(name = "todoit")]
#[command(about = "todoit - tasks with priorities, categories and due dates")]
#[command(version)]
struct Cli {
    /// Config file (default: <config dir>/todoit/config.yml)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory holding the task data
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Storage backend
    #[arg(long, value_enum)]
    backend: Option<Backend>,

    /// Log debug output to stderr
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a task
    Add {
        title: String,

        #[arg(short, long, default_value = "")]
        description: String,

        /// low, med, medium or high
        #[arg(short, long, default_value = "low")]
        priority: String,

        /// work, personal, health or shopping (default from config)
        #[arg(short, long)]
        category: Option<String>,

        /// Due date, YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
    },

    /// Edit a task's fields
    Edit {
        id: i64,

        #[arg(long)]
        title: Option<String>,

        #[arg(short, long)]
        description: Option<String>,

        #[arg(short, long)]
        priority: Option<String>,

        #[arg(short, long)]
        category: Option<String>,

        /// Due date, YYYY-MM-DD
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<String>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Mark a task done, or pending again
    Toggle { id: i64 },

    /// Delete a task
    Rm {
        id: i64,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// List tasks
    List {
        /// all, pending, completed, work, personal, health or shopping
        #[arg(default_value = "all")]
        view: String,

        /// Only tasks whose title or description contains this text
        #[arg(short, long, default_value = "")]
        search: String,
    },

    /// Show completion statistics
    Stats,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    // Setup tracing
    let level = if cli.verbose { Level::DEBUG } else { Level::WARN };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .init();

    let config = Config::load(cli.config.as_deref())?.with_overrides(cli.data_dir, cli.backend);
    let mut store = TaskStore::open(config.open_slot()?)?;

    match cli.command {
        Commands::Add {
            title,
            description,
            priority,
            category,
            due,
        } => {
            let mut form = TaskForm::new(config.default_category);
            form.title = title;
            form.description = description;
            form.priority = priority.parse()?;
            if let Some(category) = category {
                form.category = category.parse()?;
            }
            form.due_date = due.as_deref().map(parse_due_date).transpose()?;

            let data = form.submit().ok_or_else(|| eyre!("Title is required to create a task"))?;
            let task = store.create(data)?;
            println!("Added task #{}", task.id);
            println!("{}", render::task_line(&task));
        }
        Commands::Edit {
            id,
            title,
            description,
            priority,
            category,
            due,
            clear_due,
        } => {
            let task = store.get(id).ok_or_else(|| eyre!("Task {} not found", id))?;
            let mut form = TaskForm::edit(task);
            if let Some(title) = title {
                form.title = title;
            }
            if let Some(description) = description {
                form.description = description;
            }
            if let Some(priority) = priority {
                form.priority = priority.parse()?;
            }
            if let Some(category) = category {
                form.category = category.parse()?;
            }
            if let Some(due) = due {
                form.due_date = Some(parse_due_date(&due)?);
            }
            if clear_due {
                form.due_date = None;
            }

            let data = form.submit().ok_or_else(|| eyre!("Task title cannot be empty"))?;
            store.update(id, data)?;
            if let Some(task) = store.get(id) {
                println!("{}", render::task_line(task));
            }
        }
        Commands::Toggle { id } => {
            if !store.toggle_completion(id)? {
                return Err(eyre!("Task {} not found", id));
            }
            if let Some(task) = store.get(id) {
                println!("{}", render::task_line(task));
            }
        }
        Commands::Rm { id, yes } => {
            if store.get(id).is_none() {
                return Err(eyre!("Task {} not found", id));
            }
            if !yes {
                eprint!("Delete task? This action cannot be undone. [y/N] ");
                io::stderr().flush()?;
                let mut answer = String::new();
                io::stdin().read_line(&mut answer)?;
                if !confirms(&answer) {
                    println!("Cancelled");
                    return Ok(());
                }
            }
            if !store.delete(id)? {
                return Err(eyre!("Task {} not found", id));
            }
            println!("Deleted task #{}", id);
        }
        Commands::List { view, search } => {
            let view: View = view.parse()?;
            println!("{}\n", view.title());

            let mut query = store.query_with(view.filter(&search)).peekable();
            if query.peek().is_none() {
                println!("{}", view.empty_message(store.is_empty()));
            }
            for task in query {
                println!("{}", render::task_line(task));
            }
        }
        Commands::Stats => {
            println!("{}", render::stats_summary(&store.stats()));
        }
    }

    Ok(())
}
