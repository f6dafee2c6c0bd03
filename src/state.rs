//! UI state and its transitions.
//!
//! `ViewState::reduce` is pure: it returns the next state plus, at most, one
//! effect for the session to carry out (a completion call or a store write).
//! The results come back in as actions.

use crate::compat;
use crate::projects::UNTITLED;
use crate::types::{
    AppView, Board, GenerationRequest, LanguagePreference, ProjectDraft, SavedProject,
};

pub const MISSING_TOPIC: &str = "Please select an option or enter a custom topic.";

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ViewState {
    pub tab: AppView,
    pub board: Board,
    pub language: LanguagePreference,
    pub preset: Option<String>,
    pub custom_topic: String,
    /// A generation is in flight; further `Generate` actions are ignored.
    pub pending: bool,
    pub error: Option<String>,
    pub content: Option<String>,
    pub loaded_project: Option<String>,
    /// Transient "Saved!" confirmation.
    pub saved: bool,
    /// Told to the user when a board change discarded their language.
    pub notice: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Action {
    SelectTab(AppView),
    SelectBoard(Board),
    SelectLanguage(LanguagePreference),
    SelectPreset(String),
    EnterCustomTopic(String),
    Generate,
    GenerationFinished(String),
    GenerationFailed(String),
    Save { title: Option<String> },
    Saved(SavedProject),
    StoreFailed(String),
    SavedFlagExpired,
    Load(SavedProject),
    Delete(String),
    Deleted(String),
    DismissNotice,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Effect {
    Generate(GenerationRequest),
    Save(ProjectDraft),
    Delete(String),
}

impl ViewState {
    /// Custom text wins over the preset; at most one of them is set.
    pub fn topic(&self) -> Option<&str> {
        let custom = self.custom_topic.trim();
        if !custom.is_empty() {
            return Some(custom);
        }
        self.preset.as_deref().filter(|p| !p.trim().is_empty())
    }

    pub fn can_generate(&self) -> bool {
        !self.pending && self.topic().is_some()
    }

    fn reset_language_for(&mut self, board: Board) {
        if self.language != LanguagePreference::Default {
            self.notice = Some(format!(
                "{} was reset to the default language for {}.",
                self.language.label(),
                board.display_name()
            ));
        }
        self.language = LanguagePreference::Default;
    }

    pub fn reduce(mut self, action: Action) -> (ViewState, Option<Effect>) {
        match action {
            Action::SelectTab(tab) => {
                if tab != self.tab && tab.is_generator() {
                    self.preset = None;
                }
                self.tab = tab;
                self.error = None;
                (self, None)
            }
            Action::SelectBoard(board) => {
                if board != self.board {
                    self.reset_language_for(board);
                }
                self.board = board;
                self.error = None;
                (self, None)
            }
            Action::SelectLanguage(language) => {
                if compat::is_supported(self.board, language) {
                    self.language = language;
                    self.error = None;
                    self.notice = None;
                } else {
                    self.error = Some(format!(
                        "{} is not available on {}.",
                        language.label(),
                        self.board.display_name()
                    ));
                }
                (self, None)
            }
            Action::SelectPreset(preset) => {
                self.preset = Some(preset);
                self.custom_topic.clear();
                (self, None)
            }
            Action::EnterCustomTopic(text) => {
                self.custom_topic = text;
                self.preset = None;
                (self, None)
            }
            Action::Generate => {
                if self.pending {
                    return (self, None);
                }
                let Some(topic) = self.topic().map(str::to_string) else {
                    self.error = Some(MISSING_TOPIC.to_string());
                    return (self, None);
                };
                let request = GenerationRequest {
                    board: self.board,
                    topic,
                    category: self.tab.category(),
                    language: self.language,
                };
                self.pending = true;
                self.error = None;
                self.content = None;
                self.saved = false;
                self.loaded_project = None;
                (self, Some(Effect::Generate(request)))
            }
            Action::GenerationFinished(content) => {
                self.pending = false;
                self.content = Some(content);
                (self, None)
            }
            Action::Save { title } => {
                let Some(content) = self.content.clone() else {
                    return (self, None);
                };
                let topic = self.topic().unwrap_or(UNTITLED).to_string();
                let title = title
                    .map(|t| t.trim().to_string())
                    .filter(|t| !t.is_empty())
                    .unwrap_or_else(|| topic.clone());
                let draft = ProjectDraft {
                    title,
                    board: self.board,
                    view: self.tab,
                    topic,
                    content,
                };
                (self, Some(Effect::Save(draft)))
            }
            Action::Saved(project) => {
                self.saved = true;
                self.error = None;
                self.loaded_project = Some(project.id);
                (self, None)
            }
            Action::GenerationFailed(message) => {
                self.pending = false;
                self.error = Some(message);
                (self, None)
            }
            Action::StoreFailed(message) => {
                self.saved = false;
                self.error = Some(message);
                (self, None)
            }
            Action::SavedFlagExpired => {
                self.saved = false;
                (self, None)
            }
            Action::Load(project) => {
                self.reset_language_for(project.board);
                self.board = project.board;
                self.tab = project.view;
                self.content = Some(project.content);
                self.custom_topic = project.topic;
                self.preset = None;
                self.loaded_project = Some(project.id);
                self.error = None;
                self.saved = false;
                (self, None)
            }
            Action::Delete(id) => (self, Some(Effect::Delete(id))),
            Action::Deleted(id) => {
                if self.loaded_project.as_deref() == Some(id.as_str()) {
                    self.loaded_project = None;
                    self.content = None;
                }
                (self, None)
            }
            Action::DismissNotice => {
                self.notice = None;
                (self, None)
            }
        }
    }
}
