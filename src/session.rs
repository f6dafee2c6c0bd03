use std::time::Duration;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};

use crate::client::CompletionClient;
use crate::projects::ProjectStore;
use crate::prompts;
use crate::state::{Action, Effect, ViewState};

/// How long the "Saved!" confirmation stays up.
pub const SAVED_FLAG_DURATION: Duration = Duration::from_secs(3);

/// Owns the UI state and carries out the effects the reducer asks for.
pub struct Session {
    state: ViewState,
    projects: ProjectStore,
    client: CompletionClient,
    background_tx: UnboundedSender<Action>,
    background_rx: UnboundedReceiver<Action>,
    saved_flag_duration: Duration,
}

impl Session {
    pub fn new(state: ViewState, projects: ProjectStore, client: CompletionClient) -> Self {
        let (background_tx, background_rx) = unbounded_channel();
        Self {
            state,
            projects,
            client,
            background_tx,
            background_rx,
            saved_flag_duration: SAVED_FLAG_DURATION,
        }
    }

    pub fn with_saved_flag_duration(mut self, duration: Duration) -> Self {
        self.saved_flag_duration = duration;
        self
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn projects(&self) -> &ProjectStore {
        &self.projects
    }

    fn apply(&mut self, action: Action) -> Option<Effect> {
        let (state, effect) = std::mem::take(&mut self.state).reduce(action);
        self.state = state;
        effect
    }

    /// Apply `action` and every follow-up it causes. Returns once the state
    /// is settled; a generation is awaited here, so nothing else can start
    /// one meanwhile.
    pub async fn dispatch(&mut self, action: Action) {
        let mut next = Some(action);
        while let Some(action) = next.take() {
            if let Some(effect) = self.apply(action) {
                next = Some(self.run_effect(effect).await);
            }
        }
    }

    async fn run_effect(&mut self, effect: Effect) -> Action {
        match effect {
            Effect::Generate(request) => {
                let built = match prompts::build_for_request(&request) {
                    Ok(built) => built,
                    Err(e) => return Action::GenerationFailed(e.to_string()),
                };
                tracing::info!(
                    board = request.board.id(),
                    category = %request.category,
                    language = %request.language,
                    "generating guide"
                );
                let content = self.client.generate(built.instructions, built.prompt).await;
                Action::GenerationFinished(content)
            }
            Effect::Save(draft) => match self.projects.save(draft) {
                Ok(project) => {
                    self.schedule_saved_flag_reset();
                    Action::Saved(project)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "saving project failed");
                    Action::StoreFailed(e.to_string())
                }
            },
            Effect::Delete(id) => match self.projects.delete(&id) {
                Ok(removed) => {
                    if !removed {
                        tracing::debug!(id, "delete of unknown project ignored");
                    }
                    Action::Deleted(id)
                }
                Err(e) => {
                    tracing::warn!(error = %e, "deleting project failed");
                    Action::StoreFailed(e.to_string())
                }
            },
        }
    }

    /// Fire-and-forget; a late expiry only clears the flag.
    fn schedule_saved_flag_reset(&self) {
        let tx = self.background_tx.clone();
        let duration = self.saved_flag_duration;
        tokio::spawn(async move {
            tokio::time::sleep(duration).await;
            let _ = tx.send(Action::SavedFlagExpired);
        });
    }

    /// Apply whatever background tasks have posted so far.
    pub fn drain_background(&mut self) {
        while let Ok(action) = self.background_rx.try_recv() {
            let _ = self.apply(action);
        }
    }

    /// Wait for the next background action and apply it.
    pub async fn next_background(&mut self) {
        if let Some(action) = self.background_rx.recv().await {
            let _ = self.apply(action);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::CompletionBackend;
    use crate::error::{ServiceError, ServiceResult};
    use crate::projects::PROJECTS_KEY;
    use crate::storage::{KeyValueStore, MemoryStore};
    use crate::types::{AppView, Board};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    #[derive(Default)]
    struct RecordingBackend {
        calls: AtomicUsize,
        last: Mutex<Option<(String, String)>>,
    }

    impl CompletionBackend for RecordingBackend {
        fn complete(&self, instructions: &str, prompt: &str) -> ServiceResult<Option<String>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last.lock().unwrap() = Some((instructions.to_string(), prompt.to_string()));
            Ok(Some(format!("# Guide\n{prompt}")))
        }
    }

    struct BrokenBackend;

    impl CompletionBackend for BrokenBackend {
        fn complete(&self, _: &str, _: &str) -> ServiceResult<Option<String>> {
            Err(ServiceError::NetworkError("dns lookup failed".into()))
        }
    }

    fn session(backend: Arc<dyn CompletionBackend>) -> (Arc<MemoryStore>, Session) {
        let kv = Arc::new(MemoryStore::new());
        let projects = ProjectStore::load(kv.clone());
        let session = Session::new(
            ViewState::default(),
            projects,
            CompletionClient::new(backend),
        )
        .with_saved_flag_duration(Duration::from_millis(10));
        (kv, session)
    }

    #[tokio::test]
    async fn empty_topic_never_reaches_backend() {
        let backend = Arc::new(RecordingBackend::default());
        let (_kv, mut session) = session(backend.clone());

        session.dispatch(Action::Generate).await;
        assert_eq!(backend.calls.load(Ordering::SeqCst), 0);
        assert!(session.state().error.is_some());
        assert!(!session.state().pending);
    }

    #[tokio::test]
    async fn generate_then_save_persists_project() {
        let backend = Arc::new(RecordingBackend::default());
        let (kv, mut session) = session(backend.clone());

        session.dispatch(Action::SelectTab(AppView::Games)).await;
        session.dispatch(Action::SelectBoard(Board::PicoW)).await;
        session.dispatch(Action::SelectPreset("Pong".into())).await;
        session.dispatch(Action::Generate).await;

        assert_eq!(backend.calls.load(Ordering::SeqCst), 1);
        let (instructions, prompt) = backend.last.lock().unwrap().clone().unwrap();
        assert!(instructions.contains("retro gaming"));
        assert!(prompt.contains("\"Pong\" on a Raspberry Pi Pico W"));
        assert!(!session.state().pending);
        assert!(session.state().content.as_deref().unwrap().starts_with("# Guide"));

        session.dispatch(Action::Save { title: None }).await;
        assert!(session.state().saved);
        let saved = &session.projects().projects()[0];
        assert_eq!(saved.title, "Pong");
        assert_eq!(saved.view, AppView::Games);
        assert_eq!(session.state().loaded_project.as_deref(), Some(saved.id.as_str()));
        assert!(kv.get(PROJECTS_KEY).unwrap().unwrap().contains("\"Pong\""));

        tokio::time::timeout(Duration::from_secs(2), session.next_background())
            .await
            .unwrap();
        assert!(!session.state().saved);
    }

    #[tokio::test]
    async fn transport_failure_is_shown_as_content() {
        let (_kv, mut session) = session(Arc::new(BrokenBackend));
        session.dispatch(Action::EnterCustomTopic("Blink LED".into())).await;
        session.dispatch(Action::Generate).await;

        let content = session.state().content.clone().unwrap();
        assert!(content.contains("AI Connection Error"));
        assert!(content.contains("dns lookup failed"));
        assert_eq!(session.state().error, None);
    }

    #[tokio::test]
    async fn deleting_loaded_project_clears_content() {
        let backend = Arc::new(RecordingBackend::default());
        let (_kv, mut session) = session(backend);
        session.dispatch(Action::EnterCustomTopic("Servo sweep".into())).await;
        session.dispatch(Action::Generate).await;
        session.dispatch(Action::Save { title: Some("Servo".into()) }).await;

        let id = session.projects().projects()[0].id.clone();
        session.dispatch(Action::Delete(id)).await;
        assert!(session.projects().is_empty());
        assert_eq!(session.state().content, None);

        session.dispatch(Action::Delete("missing".into())).await;
        assert_eq!(session.state().error, None);
    }
}
