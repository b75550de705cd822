use crate::catalog::SortKey;
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Admin console for a REST book catalog.
#[derive(Parser, Debug, Clone)]
#[command(name = "shelfdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to config file.
    #[arg(short, long, env = "SHELFDESK_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Override the API base URL.
    #[arg(long, env = "SHELFDESK_API_URL", global = true)]
    pub api_url: Option<String>,

    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Create a default config file.
    Init {
        /// Force overwrite existing config.
        #[arg(short, long)]
        force: bool,
    },

    /// Log in to the backend.
    Login {
        /// Account email.
        email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
        /// Keep the session after this command exits.
        #[arg(short, long)]
        remember: bool,
    },

    /// Forget the stored session.
    Logout,

    /// Create an account and log in.
    Register {
        /// Display name.
        name: String,
        /// Account email.
        email: String,
        /// Password (will prompt if not provided).
        #[arg(short, long)]
        password: Option<String>,
    },

    /// Show the logged-in account.
    Whoami,

    /// Book catalog commands.
    Books {
        /// Books subcommand action.
        #[command(subcommand)]
        action: BooksCommand,
    },
}

/// Book catalog subcommands.
#[derive(Subcommand, Debug, Clone)]
pub enum BooksCommand {
    /// List one page of books.
    List {
        /// Page number (1-based).
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Rows per page (10, 20 or 50).
        #[arg(long)]
        page_size: Option<u32>,
        /// Free-text search.
        #[arg(short, long)]
        search: Option<String>,
        /// Genre filter.
        #[arg(long)]
        genre: Option<String>,
        /// Author filter.
        #[arg(long)]
        author: Option<String>,
        /// Publisher filter.
        #[arg(long)]
        publisher: Option<String>,
        /// Availability filter.
        #[arg(long)]
        available: Option<bool>,
        /// Sort keys, e.g. `rating:desc,title`.
        #[arg(long, value_delimiter = ',')]
        sort: Vec<SortKey>,
        /// Print JSON instead of a table.
        #[arg(long)]
        json: bool,
    },

    /// Show one book.
    Get {
        /// Book id.
        id: String,
    },

    /// Create a book.
    Create {
        /// Title.
        #[arg(long)]
        title: String,
        /// Author.
        #[arg(long)]
        author: String,
        /// Four-digit publication year.
        #[arg(long)]
        year: Option<String>,
        /// ISBN.
        #[arg(long)]
        isbn: Option<String>,
        /// Description.
        #[arg(long)]
        description: Option<String>,
        /// Cover URL.
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Edit a book; omitted fields keep their value.
    Update {
        /// Book id.
        id: String,
        /// Title.
        #[arg(long)]
        title: Option<String>,
        /// Author.
        #[arg(long)]
        author: Option<String>,
        /// Four-digit publication year.
        #[arg(long)]
        year: Option<String>,
        /// ISBN.
        #[arg(long)]
        isbn: Option<String>,
        /// Description.
        #[arg(long)]
        description: Option<String>,
        /// Cover URL.
        #[arg(long)]
        image_url: Option<String>,
    },

    /// Mark a book as available or lent out.
    SetAvailable {
        /// Book id.
        id: String,
        /// `true` or `false`.
        #[arg(action = clap::ArgAction::Set)]
        available: bool,
    },

    /// Download the catalog as CSV.
    Export {
        /// Output file.
        #[arg(short, long, default_value = "books.csv")]
        output: PathBuf,
        /// Free-text search.
        #[arg(short, long)]
        search: Option<String>,
        /// Sort keys, e.g. `title:asc`.
        #[arg(long, value_delimiter = ',')]
        sort: Vec<SortKey>,
    },

    /// Show author, publisher and genre option lists.
    Metadata,
}

/// Main configuration from TOML file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Backend configuration.
    #[serde(default)]
    pub api: ApiConfig,

    /// Session persistence configuration.
    #[serde(default)]
    pub session: SessionConfig,

    /// Book list configuration.
    #[serde(default)]
    pub list: ListConfig,
}

/// Backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Base URL of the REST API.
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:3000/api".to_string()
}

/// Session persistence configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// File holding the durable ("remember me") session.
    #[serde(default = "default_session_path")]
    pub path: PathBuf,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            path: default_session_path(),
        }
    }
}

fn default_session_path() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("shelfdesk").join("session.json"))
        .unwrap_or_else(|| PathBuf::from("data/session.json"))
}

/// Book list configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ListConfig {
    /// Default rows per page.
    #[serde(default = "default_page_size")]
    pub page_size: u32,

    /// Idle gap before search text takes effect, in milliseconds.
    #[serde(default = "default_search_debounce_ms")]
    pub search_debounce_ms: u64,

    /// Rows sampled to build filter option lists.
    #[serde(default = "default_metadata_sample_size")]
    pub metadata_sample_size: u32,
}

impl Default for ListConfig {
    fn default() -> Self {
        Self {
            page_size: default_page_size(),
            search_debounce_ms: default_search_debounce_ms(),
            metadata_sample_size: default_metadata_sample_size(),
        }
    }
}

fn default_page_size() -> u32 {
    10
}

fn default_search_debounce_ms() -> u64 {
    350
}

fn default_metadata_sample_size() -> u32 {
    200
}

impl Config {
    /// Load configuration from file.
    pub fn load(path: &PathBuf) -> crate::error::Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to read config file: {}", e))
        })?;

        Self::parse(&content)
    }

    /// Parse configuration from TOML text.
    pub fn parse(content: &str) -> crate::error::Result<Self> {
        let config: Config = toml::from_str(content).map_err(|e| {
            crate::error::AppError::Config(format!("Failed to parse config file: {}", e))
        })?;

        if !crate::catalog::PAGE_SIZE_OPTIONS.contains(&config.list.page_size) {
            return Err(crate::error::AppError::Config(format!(
                "list.page_size must be one of {:?}",
                crate::catalog::PAGE_SIZE_OPTIONS
            )));
        }

        Ok(config)
    }

    /// Find config file in default locations.
    pub fn find_config_file() -> Option<PathBuf> {
        let candidates = [
            PathBuf::from("shelfdesk.toml"),
            dirs::config_dir()
                .map(|p| p.join("shelfdesk").join("config.toml"))
                .unwrap_or_default(),
        ];

        candidates.into_iter().find(|p| p.exists())
    }

    /// Generate default config file content.
    pub fn generate_default() -> String {
        r#"# shelfdesk configuration

[api]
base_url = "http://localhost:3000/api"

[session]
# File for sessions created with --remember
# path = "/home/me/.local/share/shelfdesk/session.json"

[list]
# Rows per page: 10, 20 or 50
page_size = 10
# Idle gap before search text is sent, in milliseconds
search_debounce_ms = 350
# Rows sampled to build author/publisher/genre option lists
metadata_sample_size = 200
"#
        .to_string()
    }
}
