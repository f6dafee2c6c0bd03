use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::types::{AppView, Board, LanguagePreference, TaskCategory};

#[derive(Parser, Debug, Clone)]
#[command(name = PKG_NAME)]
#[command(version = PKG_VERSION)]
#[command(about = PKG_DESCRIPTION, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Defaults to the interactive menu
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Gemini API key (API_KEY is also read)
    #[arg(long, env = "GEMINI_API_KEY", hide_env_values = true, global = true)]
    pub api_key: Option<String>,

    /// Model name used for generation
    #[arg(long, env = "MAKERFORGE_MODEL", global = true)]
    pub model: Option<String>,

    /// Base URL of the generative language API
    #[arg(long, env = "MAKERFORGE_ENDPOINT", global = true)]
    pub endpoint: Option<String>,

    /// Directory holding settings and saved projects (default ~/.makerforge)
    #[arg(long, env = "MAKERFORGE_DATA_DIR", global = true)]
    pub data_dir: Option<PathBuf>,

    /// Keep saved projects in memory only
    #[arg(long, global = true, default_value_t = false)]
    pub ephemeral: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Menu-driven session (the default)
    Interactive,
    /// Generate a guide and print it
    Generate(GenerateArgs),
    /// Print the instructions and prompt that would be sent, without sending
    Prompt(SelectionArgs),
    /// List boards and the languages each one supports
    Boards,
    /// List the preset topics of a tab
    Presets {
        #[arg(long, value_enum, default_value_t = AppView::Sensors)]
        tab: AppView,
    },
    /// Manage saved projects
    #[command(subcommand)]
    Projects(ProjectsCommand),
    /// Open an interactive editor for settings.json
    Config,
    /// Print version information
    Version,
}

/// Board, tab and topic of a single generation.
#[derive(Args, Debug, Clone)]
pub struct SelectionArgs {
    /// Board id or display name (e.g. esp32, "Raspberry Pi Pico W")
    #[arg(long, short)]
    pub board: Option<Board>,

    /// Tab the topic belongs to
    #[arg(long, value_enum, conflicts_with = "category")]
    pub tab: Option<AppView>,

    /// Task category, an alternative to --tab
    #[arg(long, value_enum)]
    pub category: Option<TaskCategory>,

    /// Free-form topic
    #[arg(long, short, conflicts_with = "preset")]
    pub topic: Option<String>,

    /// One of the tab's preset topics (see `presets`)
    #[arg(long, short)]
    pub preset: Option<String>,

    /// Code dialect to ask for
    #[arg(long, short, value_enum)]
    pub language: Option<LanguagePreference>,
}

#[derive(Args, Debug, Clone)]
pub struct GenerateArgs {
    #[command(flatten)]
    pub selection: SelectionArgs,

    /// Save the guide as a project afterwards
    #[arg(long, default_value_t = false)]
    pub save: bool,

    /// Project title when saving (defaults to the topic)
    #[arg(long, requires = "save")]
    pub title: Option<String>,

    /// Print the markdown as received
    #[arg(long, default_value_t = false)]
    pub raw: bool,
}

#[derive(Subcommand, Debug, Clone)]
pub enum ProjectsCommand {
    /// List saved projects, newest first
    List,
    /// Print a saved project's guide
    Show {
        id: String,
        /// Print only the fenced code blocks
        #[arg(long, default_value_t = false)]
        code: bool,
        /// Print the markdown as stored
        #[arg(long, default_value_t = false, conflicts_with = "code")]
        raw: bool,
    },
    /// Delete a saved project
    Delete { id: String },
}
