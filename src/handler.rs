//! Command dispatch: turns parsed arguments into sessions, store calls and
//! printed output.

use colored::Colorize;

use crate::cli::{Cli, Command, GenerateArgs, GlobalArgs, ProjectsCommand, SelectionArgs};
use crate::client::CompletionClient;
use crate::compat;
use crate::config::{self, AppConfig, Settings};
use crate::error::{ServiceError, ServiceResult};
use crate::interactive;
use crate::metadata::{PKG_DESCRIPTION, PKG_NAME, PKG_VERSION};
use crate::projects::ProjectStore;
use crate::prompts;
use crate::render;
use crate::session::Session;
use crate::state::{Action, MISSING_TOPIC, ViewState};
use crate::storage::FileStore;
use crate::types::{AppView, Board, GenerationRequest, LanguagePreference, SavedProject};

pub async fn run(cli: Cli) -> ServiceResult<()> {
    let command = cli.command.unwrap_or(Command::Interactive);
    tracing::debug!(?command, "dispatching command");

    match command {
        Command::Version => {
            println!("{PKG_NAME} {PKG_VERSION}");
            println!("{PKG_DESCRIPTION}");
            Ok(())
        }
        Command::Boards => {
            print_boards();
            Ok(())
        }
        Command::Presets { tab } => {
            print_presets(tab);
            Ok(())
        }
        Command::Config => edit_config(&cli.global),
        Command::Prompt(selection) => {
            let config = AppConfig::resolve(&cli.global)?;
            let state = selection_state(&config, &selection)?;
            print_prompt(&state)
        }
        Command::Generate(args) => {
            let config = AppConfig::resolve(&cli.global)?;
            generate(&config, &args).await
        }
        Command::Projects(sub) => {
            let config = AppConfig::resolve(&cli.global)?;
            let mut store = ProjectStore::load(config.store.clone());
            projects(&mut store, sub)
        }
        Command::Interactive => {
            let config = AppConfig::resolve(&cli.global)?;
            let client = CompletionClient::gemini(config.gemini.clone())?;
            let state = ViewState {
                board: config.default_board,
                language: config.default_language,
                ..ViewState::default()
            };
            let mut session = Session::new(state, ProjectStore::load(config.store.clone()), client);
            interactive::run(&mut session).await
        }
    }
}

/// Build the form state a one-shot command describes. Bad input is
/// reported here, before any client is built.
fn selection_state(config: &AppConfig, args: &SelectionArgs) -> ServiceResult<ViewState> {
    let board = args.board.unwrap_or(config.default_board);
    let language = match args.language {
        Some(language) if !compat::is_supported(board, language) => {
            return Err(ServiceError::Input(format!(
                "{} is not available on {}. Supported: {}",
                language.label(),
                board.display_name(),
                language_ids(board)
            )));
        }
        Some(language) => language,
        None if compat::is_supported(board, config.default_language) => config.default_language,
        None => LanguagePreference::Default,
    };

    let tab = args
        .tab
        .or(args.category.map(AppView::from))
        .or_else(|| args.preset.as_deref().and_then(tab_for_preset))
        .unwrap_or_default();
    if !tab.is_generator() {
        return Err(ServiceError::Input(format!(
            "The {} tab has no generator; pick another --tab.",
            tab.title()
        )));
    }

    let mut state = ViewState {
        tab,
        board,
        language,
        ..ViewState::default()
    };
    if let Some(preset) = &args.preset {
        let canonical = tab
            .presets()
            .iter()
            .find(|p| p.eq_ignore_ascii_case(preset.trim()))
            .ok_or_else(|| {
                ServiceError::Input(format!(
                    "\"{preset}\" is not a preset of {}. See `{PKG_NAME} presets --tab {tab}`.",
                    tab.title()
                ))
            })?;
        state = state.reduce(Action::SelectPreset(canonical.to_string())).0;
    }
    if let Some(topic) = &args.topic {
        state = state.reduce(Action::EnterCustomTopic(topic.clone())).0;
    }
    if state.topic().is_none() {
        return Err(ServiceError::Input(MISSING_TOPIC.to_string()));
    }
    Ok(state)
}

fn tab_for_preset(preset: &str) -> Option<AppView> {
    AppView::ALL.into_iter().find(|tab| {
        tab.presets()
            .iter()
            .any(|p| p.eq_ignore_ascii_case(preset.trim()))
    })
}

fn request_for(state: &ViewState) -> ServiceResult<GenerationRequest> {
    let topic = state
        .topic()
        .ok_or_else(|| ServiceError::Input(MISSING_TOPIC.to_string()))?;
    Ok(GenerationRequest {
        board: state.board,
        topic: topic.to_string(),
        category: state.tab.category(),
        language: state.language,
    })
}

fn print_prompt(state: &ViewState) -> ServiceResult<()> {
    let built = prompts::build_for_request(&request_for(state)?)?;
    println!("{}", "# Instructions".bold());
    println!("{}", built.instructions);
    println!();
    println!("{}", "# Prompt".bold());
    println!("{}", built.prompt);
    Ok(())
}

async fn generate(config: &AppConfig, args: &GenerateArgs) -> ServiceResult<()> {
    let state = selection_state(config, &args.selection)?;
    let client = CompletionClient::gemini(config.gemini.clone())?;
    let mut session = Session::new(state, ProjectStore::load(config.store.clone()), client);

    eprintln!(
        "{}",
        format!(
            "Generating \"{}\" for {}...",
            session.state().topic().unwrap_or_default(),
            session.state().board.display_name()
        )
        .dimmed()
    );
    session.dispatch(Action::Generate).await;
    if let Some(error) = &session.state().error {
        return Err(ServiceError::Input(error.clone()));
    }

    let content = session.state().content.clone().unwrap_or_default();
    if args.raw {
        println!("{content}");
    } else {
        print!("{}", render::render_markdown(&content));
    }

    if args.save {
        session
            .dispatch(Action::Save {
                title: args.title.clone(),
            })
            .await;
        if let Some(error) = &session.state().error {
            return Err(ServiceError::FromString(error.clone()));
        }
        if let Some(id) = &session.state().loaded_project {
            eprintln!("{} {}", "Saved project".green().bold(), id);
        }
    }
    Ok(())
}

fn projects(store: &mut ProjectStore, command: ProjectsCommand) -> ServiceResult<()> {
    match command {
        ProjectsCommand::List => {
            if store.is_empty() {
                println!("{}", "No saved projects yet.".dimmed());
                return Ok(());
            }
            for project in store.projects() {
                println!("{}", project_line(project));
            }
            Ok(())
        }
        ProjectsCommand::Show { id, code, raw } => {
            let project = store.get(&id).ok_or_else(|| unknown_project(&id))?;
            if code {
                for block in render::code_blocks(&project.content) {
                    print!("{}", block.code);
                    println!();
                }
            } else if raw {
                println!("{}", project.content);
            } else {
                println!("{}", project_line(project));
                println!();
                print!("{}", render::render_markdown(&project.content));
            }
            Ok(())
        }
        ProjectsCommand::Delete { id } => {
            if !store.delete(&id)? {
                return Err(unknown_project(&id));
            }
            println!("Deleted {id}");
            Ok(())
        }
    }
}

fn unknown_project(id: &str) -> ServiceError {
    ServiceError::Input(format!("No saved project with id {id}"))
}

fn project_line(project: &SavedProject) -> String {
    let date = project
        .created_at()
        .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_else(|| "-".to_string());
    format!(
        "{}  {}  {:<20} {:<9} {}",
        project.id.dimmed(),
        date,
        project.board.display_name(),
        project.view.as_str(),
        project.title.bold()
    )
}

fn language_ids(board: Board) -> String {
    compat::supported_languages(board)
        .iter()
        .map(|l| l.id())
        .collect::<Vec<_>>()
        .join(", ")
}

fn print_boards() {
    for board in Board::ALL {
        println!(
            "{:<13} {:<20} {}",
            board.id().bold(),
            board.display_name(),
            board.description().dimmed()
        );
        println!("{:<13} {}", "", language_ids(board).cyan());
    }
}

fn print_presets(tab: AppView) {
    println!("{} ({})", tab.title().bold(), tab.preset_label().dimmed());
    if tab.presets().is_empty() {
        println!("  {}", "No presets here; pass --topic instead.".dimmed());
    }
    for preset in tab.presets() {
        println!("  {preset}");
    }
}

/// Settings are edited even when the current file is unreadable, so a bad
/// file can be fixed from here.
fn edit_config(global: &GlobalArgs) -> ServiceResult<()> {
    let data_dir = global
        .data_dir
        .clone()
        .unwrap_or_else(FileStore::default_root);
    let store = FileStore::new(&data_dir);
    let current = Settings::load(&store).unwrap_or_else(|e| {
        tracing::warn!(error = %e, "starting from default settings");
        Settings::default()
    });
    let edited = config::edit_interactively(&current)?;
    edited.save(&store)?;
    println!(
        "{} {}",
        "Settings saved to".green(),
        data_dir.join("settings.json").display()
    );
    Ok(())
}
