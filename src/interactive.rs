//! Terminal front end for a `Session`: the tab, board, topic and language
//! pickers plus generate/save/load/delete, one menu at a time.

use colored::Colorize;
use dialoguer::{Confirm, Input, Select, theme::ColorfulTheme};

use crate::compat;
use crate::error::ServiceResult;
use crate::render;
use crate::session::Session;
use crate::state::{Action, ViewState};
use crate::types::{AppView, Board};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum MenuItem {
    Generate,
    Preset,
    CustomTopic,
    Board,
    Language,
    Tab,
    ShowGuide,
    Save,
    OpenProject,
    DeleteProject,
    Quit,
}

impl MenuItem {
    fn label(&self, state: &ViewState) -> String {
        match self {
            MenuItem::Generate => match state.topic() {
                Some(topic) => format!("Generate guide: {topic}"),
                None => "Generate guide".to_string(),
            },
            MenuItem::Preset => state.tab.preset_label().to_string(),
            MenuItem::CustomTopic => "Enter a custom topic".to_string(),
            MenuItem::Board => format!("Change board ({})", state.board.display_name()),
            MenuItem::Language => format!("Change language ({})", state.language.label()),
            MenuItem::Tab => format!("Switch tab ({})", state.tab.title()),
            MenuItem::ShowGuide => "Show current guide".to_string(),
            MenuItem::Save => {
                if state.saved {
                    "Saved!".to_string()
                } else {
                    "Save project".to_string()
                }
            }
            MenuItem::OpenProject => "Open a saved project".to_string(),
            MenuItem::DeleteProject => "Delete a saved project".to_string(),
            MenuItem::Quit => "Quit".to_string(),
        }
    }
}

fn menu(state: &ViewState, has_projects: bool) -> Vec<MenuItem> {
    let mut items = Vec::new();
    if state.tab.is_generator() {
        if state.can_generate() {
            items.push(MenuItem::Generate);
        }
        if !state.tab.presets().is_empty() {
            items.push(MenuItem::Preset);
        }
        items.push(MenuItem::CustomTopic);
        items.push(MenuItem::Board);
        items.push(MenuItem::Language);
    }
    if state.content.is_some() {
        items.push(MenuItem::ShowGuide);
        // Stays up as "Saved!" until the flag expires.
        if state.loaded_project.is_none() || state.saved {
            items.push(MenuItem::Save);
        }
    }
    if has_projects {
        items.push(MenuItem::OpenProject);
        items.push(MenuItem::DeleteProject);
    }
    items.push(MenuItem::Tab);
    items.push(MenuItem::Quit);
    items
}

fn print_status(state: &ViewState) {
    println!();
    println!(
        "{} {} {} {}",
        state.tab.title().bold().cyan(),
        "·".dimmed(),
        state.board.display_name().bold(),
        format!("({})", state.language.id()).dimmed()
    );
    if let Some(topic) = state.topic() {
        println!("  {} {}", "topic:".dimmed(), topic);
    }
    if let Some(notice) = &state.notice {
        println!("  {} {}", "note:".yellow().bold(), notice);
    }
    if let Some(error) = &state.error {
        println!("  {} {}", "error:".red().bold(), error);
    }
}

fn print_guide(state: &ViewState) {
    if let Some(content) = &state.content {
        println!();
        print!("{}", render::render_markdown(content));
    }
}

/// Run the menu loop until the user quits or presses Escape.
///
/// dialoguer prompts block the calling worker. Needs the multi-threaded
/// runtime so spawned timers keep firing while a prompt is open.
pub async fn run(session: &mut Session) -> ServiceResult<()> {
    let theme = ColorfulTheme::default();
    println!(
        "{} {}",
        "MakerForge".bold().cyan(),
        "AI guides for your maker boards".dimmed()
    );

    loop {
        session.drain_background();
        print_status(session.state());
        if session.state().notice.is_some() {
            session.dispatch(Action::DismissNotice).await;
        }

        let items = menu(session.state(), !session.projects().is_empty());
        let labels: Vec<String> = items.iter().map(|i| i.label(session.state())).collect();
        let Some(choice) = Select::with_theme(&theme)
            .with_prompt("What next?")
            .items(&labels)
            .default(0)
            .interact_opt()?
        else {
            break;
        };

        match items[choice] {
            MenuItem::Quit => break,
            MenuItem::Generate => {
                let state = session.state();
                println!(
                    "{}",
                    format!(
                        "Asking the AI about {} on {}...",
                        state.topic().unwrap_or_default(),
                        state.board.display_name()
                    )
                    .dimmed()
                );
                session.dispatch(Action::Generate).await;
                print_guide(session.state());
            }
            MenuItem::Preset => {
                let presets = session.state().tab.presets();
                if let Some(index) = Select::with_theme(&theme)
                    .with_prompt(session.state().tab.preset_label())
                    .items(presets)
                    .default(0)
                    .interact_opt()?
                {
                    session
                        .dispatch(Action::SelectPreset(presets[index].to_string()))
                        .await;
                }
            }
            MenuItem::CustomTopic => {
                let text: String = Input::with_theme(&theme)
                    .with_prompt("Topic")
                    .allow_empty(true)
                    .interact_text()?;
                session.dispatch(Action::EnterCustomTopic(text)).await;
            }
            MenuItem::Board => {
                let labels: Vec<String> = Board::ALL
                    .iter()
                    .map(|b| format!("{:<22} {}", b.display_name(), b.description().dimmed()))
                    .collect();
                let current = Board::ALL
                    .iter()
                    .position(|b| *b == session.state().board)
                    .unwrap_or(0);
                if let Some(index) = Select::with_theme(&theme)
                    .with_prompt("Board")
                    .items(&labels)
                    .default(current)
                    .interact_opt()?
                {
                    session.dispatch(Action::SelectBoard(Board::ALL[index])).await;
                }
            }
            MenuItem::Language => {
                let languages = compat::supported_languages(session.state().board);
                let labels: Vec<&str> = languages.iter().map(|l| l.label()).collect();
                if let Some(index) = Select::with_theme(&theme)
                    .with_prompt("Language")
                    .items(&labels)
                    .default(0)
                    .interact_opt()?
                {
                    session.dispatch(Action::SelectLanguage(languages[index])).await;
                }
            }
            MenuItem::Tab => {
                let labels: Vec<&str> = AppView::ALL.iter().map(|v| v.title()).collect();
                if let Some(index) = Select::with_theme(&theme)
                    .with_prompt("Tab")
                    .items(&labels)
                    .default(0)
                    .interact_opt()?
                {
                    session.dispatch(Action::SelectTab(AppView::ALL[index])).await;
                }
            }
            MenuItem::ShowGuide => print_guide(session.state()),
            MenuItem::Save if session.state().saved => {
                println!("{}", "Already saved.".dimmed());
            }
            MenuItem::Save => {
                let default_title = session.state().topic().unwrap_or_default().to_string();
                let title: String = Input::with_theme(&theme)
                    .with_prompt("Project title")
                    .default(default_title)
                    .interact_text()?;
                session.dispatch(Action::Save { title: Some(title) }).await;
                if session.state().saved {
                    println!("{}", "Saved!".green().bold());
                }
            }
            MenuItem::OpenProject => {
                if let Some(project) = pick_project(&theme, session, "Open")? {
                    session.dispatch(Action::Load(project)).await;
                    print_guide(session.state());
                }
            }
            MenuItem::DeleteProject => {
                if let Some(project) = pick_project(&theme, session, "Delete")? {
                    let confirmed = Confirm::with_theme(&theme)
                        .with_prompt(format!("Delete \"{}\"?", project.title))
                        .default(false)
                        .interact()?;
                    if confirmed {
                        session.dispatch(Action::Delete(project.id)).await;
                    }
                }
            }
        }
    }
    Ok(())
}

fn pick_project(
    theme: &ColorfulTheme,
    session: &Session,
    verb: &str,
) -> ServiceResult<Option<crate::types::SavedProject>> {
    let projects = session.projects().projects();
    let labels: Vec<String> = projects
        .iter()
        .map(|p| {
            let date = p
                .created_at()
                .map(|d| d.format("%Y-%m-%d %H:%M").to_string())
                .unwrap_or_default();
            format!("{}  {}  {}", p.title, p.board.display_name().dimmed(), date.dimmed())
        })
        .collect();
    let choice = Select::with_theme(theme)
        .with_prompt(format!("{verb} which project?"))
        .items(&labels)
        .default(0)
        .interact_opt()?;
    Ok(choice.map(|index| projects[index].clone()))
}
