use anyhow::Context;
use clap::{Parser, Subcommand, ValueEnum};
use std::net::SocketAddr;
use todo_rest_api::api::{self, AppState};
use todo_rest_api::client::{self, StatusFilter, TaskFilter, TaskForm, TaskUpdate};
use todo_rest_api::store::{MemoryTaskStore, PgTaskStore};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the API server
    Serve {
        /// The address to bind to
        #[arg(short, long, default_value = "127.0.0.1:37240")]
        addr: SocketAddr,
        /// Keep tasks in memory instead of PostgreSQL (DATABASE_URL)
        #[arg(long)]
        memory: bool,
    },
    /// Client commands
    Client {
        /// The base URL of the API
        #[arg(long, default_value = todo_rest_api::BASE_URL)]
        url: String,
        #[command(subcommand)]
        command: ClientCommands,
    },
}

#[derive(Subcommand)]
enum ClientCommands {
    /// Task related commands
    Tasks {
        #[command(subcommand)]
        command: TaskCommands,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Status {
    All,
    Completed,
    Pending,
    Overdue,
}

impl From<Status> for StatusFilter {
    fn from(status: Status) -> Self {
        match status {
            Status::All => StatusFilter::All,
            Status::Completed => StatusFilter::Completed,
            Status::Pending => StatusFilter::Pending,
            Status::Overdue => StatusFilter::Overdue,
        }
    }
}

#[derive(Subcommand)]
enum TaskCommands {
    /// List tasks, filtered and sorted
    List {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        #[arg(long, value_enum, default_value_t = Status::All)]
        status: Status,
        /// Case-sensitive substring of the title
        #[arg(long)]
        search: Option<String>,
    },
    /// Show a single task
    Get { id: i32 },
    /// Add a new task
    Add {
        title: String,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Due date as YYYY-MM-DD
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        tags: Option<String>,
    },
    /// Edit an existing task
    Edit {
        id: i32,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        priority: Option<String>,
        /// Due date as YYYY-MM-DD, empty to clear
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        tags: Option<String>,
        #[arg(long)]
        completed: Option<bool>,
    },
    /// Flip a task between pending and completed
    Toggle { id: i32 },
    /// Delete a task
    Delete { id: i32 },
    /// Show completion statistics and the 7-day productivity series
    Stats,
}

async fn serve(addr: SocketAddr, memory: bool) -> anyhow::Result<()> {
    let state = if memory {
        info!("using in-memory task store");
        AppState::new(MemoryTaskStore::new())
    } else {
        let database_url =
            std::env::var("DATABASE_URL").context("DATABASE_URL must be set in .env file")?;
        AppState::new(PgTaskStore::connect(&database_url).context("Failed to create pool")?)
    };

    let app = api::create_router(state);

    info!("Starting server on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {addr}"))?;
    axum::serve(listener, app).await?;
    Ok(())
}

async fn run_client(url: &str, command: TaskCommands) -> Result<(), client::TaskError> {
    match command {
        TaskCommands::List {
            category,
            priority,
            status,
            search,
        } => {
            let filter = TaskFilter {
                category,
                priority,
                status: status.into(),
                search,
            };
            for task in client::fetch_tasks(url, &filter).await? {
                let mark = if task.completed { "x" } else { " " };
                let due = task
                    .due_date
                    .map(|due| due.to_string())
                    .unwrap_or_else(|| "-".to_string());
                println!(
                    "[{}] {:>4}  {:<6}  {:<10}  {:<12}  {}",
                    mark, task.id, task.priority, due, task.category, task.title
                );
            }
        }
        TaskCommands::Get { id } => {
            let task = client::fetch_task(url, id).await?;
            println!("{}", serde_json::to_string_pretty(&task).unwrap_or_default());
        }
        TaskCommands::Add {
            title,
            description,
            category,
            priority,
            due,
            tags,
        } => {
            let form = TaskForm {
                title,
                description,
                category,
                priority,
                due_date: due,
                tags,
            };
            let task = client::create_task(url, form).await?;
            println!("Created task {}", task.id);
        }
        TaskCommands::Edit {
            id,
            title,
            description,
            category,
            priority,
            due,
            tags,
            completed,
        } => {
            let update = TaskUpdate {
                title,
                description,
                completed,
                category,
                priority,
                due_date: due,
                tags,
            };
            let task = client::update_task(url, id, update).await?;
            println!("Updated task {}", task.id);
        }
        TaskCommands::Toggle { id } => {
            let task = client::toggle_task(url, id).await?;
            let state = if task.completed { "completed" } else { "pending" };
            println!("Task {} is now {}", task.id, state);
        }
        TaskCommands::Delete { id } => {
            client::delete_task(url, id).await?;
            println!("Task {} deleted successfully", id);
        }
        TaskCommands::Stats => {
            let stats = client::fetch_stats(url).await?;
            println!("{}", serde_json::to_string_pretty(&stats).unwrap_or_default());
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Serve { addr, memory } => serve(addr, memory).await,
        Commands::Client { url, command } => match command {
            ClientCommands::Tasks { command } => match run_client(&url, command).await {
                Ok(()) => Ok(()),
                Err(client::TaskError::NotFound(id)) => {
                    eprintln!("Error: Task with id {} not found", id);
                    std::process::exit(1);
                }
                Err(e) => {
                    eprintln!("Error: {}", e);
                    std::process::exit(1);
                }
            },
        },
    }
}
