use crate::client::ClientId;
use crate::models::{CopyTarget, GeneratedPrompts};
use crate::services::llm::{GenerateError, PromptGenerator};
use serde::Serialize;
use std::collections::HashMap;
use std::error::Error as _;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

pub const VALIDATION_MESSAGE: &str = "Por favor, insira um tema para gerar os prompts.";

/// How long a panel stays marked as copied.
pub const COPY_ACK: Duration = Duration::from_secs(2);

/// Sessions untouched for this long are dropped.
pub const SESSION_IDLE: Duration = Duration::from_secs(30 * 60);
pub const MAX_SESSIONS: usize = 1024;

// Tickets are unique across sessions, so a session that was evicted and
// recreated never accepts a result addressed to its predecessor.
static NEXT_TICKET: AtomicU64 = AtomicU64::new(1);

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct GenerationState {
    pub prompts: Option<GeneratedPrompts>,
    pub is_loading: bool,
    pub error: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Idle,
    Loading,
    Success,
    Error,
}

impl GenerationState {
    pub fn phase(&self) -> Phase {
        if self.is_loading {
            Phase::Loading
        } else if self.error.is_some() {
            Phase::Error
        } else if self.prompts.is_some() {
            Phase::Success
        } else {
            Phase::Idle
        }
    }
}

/// Identifies one submission; only the latest one may complete.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Ticket(u64);

#[derive(Debug, Clone, Copy)]
struct CopyAck {
    target: CopyTarget,
    at: Instant,
}

#[derive(Debug, Default)]
pub struct Session {
    state: GenerationState,
    latest: Option<Ticket>,
    copied: Option<CopyAck>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionView {
    pub phase: Phase,
    #[serde(flatten)]
    pub state: GenerationState,
    pub formatted_json: Option<String>,
    pub copied: Option<CopyTarget>,
}

impl Session {
    pub fn state(&self) -> &GenerationState {
        &self.state
    }

    /// Starts a generation for `theme`, or records a validation error and
    /// leaves the rest of the state untouched when the theme is blank.
    pub fn submit(&mut self, theme: &str) -> Option<Ticket> {
        if theme.trim().is_empty() {
            self.state.error = Some(VALIDATION_MESSAGE.to_string());
            return None;
        }

        let ticket = Ticket(NEXT_TICKET.fetch_add(1, Ordering::Relaxed));
        self.latest = Some(ticket);
        self.state.is_loading = true;
        self.state.error = None;
        self.state.prompts = None;
        self.copied = None;
        Some(ticket)
    }

    /// Applies the outcome of `ticket`. Returns false when a newer
    /// submission has superseded it, in which case nothing changes.
    /// Failures are logged either way.
    pub fn complete(
        &mut self,
        ticket: Ticket,
        outcome: &Result<GeneratedPrompts, GenerateError>,
    ) -> bool {
        let stale = self.latest != Some(ticket);

        if let Err(err) = outcome {
            tracing::error!(
                error = %err,
                cause = ?err.source(),
                stale,
                "prompt generation failed"
            );
        }

        if stale {
            tracing::debug!(ticket = ticket.0, "discarding stale generation result");
            return false;
        }

        self.state.is_loading = false;
        match outcome {
            Ok(prompts) => {
                self.state.prompts = Some(prompts.clone());
                self.state.error = None;
            }
            Err(err) => {
                self.state.prompts = None;
                self.state.error = Some(format!("Erro ao gerar prompts: {err}"));
            }
        }
        true
    }

    /// Returns the text to place on the clipboard for `target` and starts
    /// its acknowledgment. Nothing is copied when no prompts are loaded.
    pub fn mark_copied(&mut self, target: CopyTarget, now: Instant) -> Option<String> {
        let text = self.state.prompts.as_ref()?.copy_text(target);
        self.copied = Some(CopyAck { target, at: now });
        Some(text)
    }

    pub fn copied(&self, now: Instant) -> Option<CopyTarget> {
        self.copied
            .filter(|ack| now.saturating_duration_since(ack.at) < COPY_ACK)
            .map(|ack| ack.target)
    }

    pub fn view(&self, now: Instant) -> SessionView {
        SessionView {
            phase: self.state().phase(),
            state: self.state().clone(),
            formatted_json: self.state().prompts.as_ref().map(GeneratedPrompts::formatted_json),
            copied: self.copied(now),
        }
    }
}

/// Result of one trip through [`Studio::generate`].
#[derive(Debug)]
pub enum Outcome {
    Invalid,
    Generated(GeneratedPrompts),
    Failed(GenerateError),
    Superseded,
}

struct Entry {
    session: Session,
    touched: Instant,
}

/// One session per client plus the generator that feeds them.
pub struct Studio {
    generator: Arc<dyn PromptGenerator>,
    sessions: Mutex<HashMap<ClientId, Entry>>,
    max_sessions: usize,
}

impl Studio {
    pub fn new(generator: Arc<dyn PromptGenerator>) -> Self {
        Studio {
            generator,
            sessions: Mutex::new(HashMap::new()),
            max_sessions: MAX_SESSIONS,
        }
    }

    #[cfg(test)]
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions.max(1);
        self
    }

    async fn with_session<T>(
        &self,
        client: ClientId,
        f: impl FnOnce(&mut Session, Instant) -> T,
    ) -> T {
        let now = Instant::now();
        let mut sessions = self.sessions.lock().await;
        if !sessions.contains_key(&client) {
            evict(&mut sessions, now, self.max_sessions);
        }
        let entry = sessions.entry(client).or_insert_with(|| Entry {
            session: Session::default(),
            touched: now,
        });
        entry.touched = now;
        f(&mut entry.session, now)
    }

    pub async fn generate(&self, client: ClientId, theme: &str) -> Outcome {
        let Some(ticket) = self
            .with_session(client, |session, _| session.submit(theme))
            .await
        else {
            return Outcome::Invalid;
        };

        // No lock is held while the provider call is pending.
        let result = self.generator.generate(theme.trim()).await;

        let applied = self
            .with_session(client, |session, _| session.complete(ticket, &result))
            .await;
        match (applied, result) {
            (false, _) => Outcome::Superseded,
            (true, Ok(prompts)) => Outcome::Generated(prompts),
            (true, Err(err)) => Outcome::Failed(err),
        }
    }

    pub async fn copy(&self, client: ClientId, target: CopyTarget) -> Option<String> {
        self.with_session(client, |session, now| session.mark_copied(target, now))
            .await
    }

    pub async fn view(&self, client: ClientId) -> SessionView {
        self.with_session(client, |session, now| session.view(now))
            .await
    }

    #[cfg(test)]
    pub async fn session_count(&self) -> usize {
        self.sessions.lock().await.len()
    }
}

/// Drops idle sessions, then the least recently used ones until there is
/// room for one more.
fn evict(sessions: &mut HashMap<ClientId, Entry>, now: Instant, max_sessions: usize) {
    sessions.retain(|_, entry| now.saturating_duration_since(entry.touched) < SESSION_IDLE);
    while sessions.len() >= max_sessions {
        let Some(oldest) = sessions
            .iter()
            .min_by_key(|(_, entry)| entry.touched)
            .map(|(id, _)| *id)
        else {
            break;
        };
        sessions.remove(&oldest);
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::models::sample_prompts;
    use crate::services::llm::ProviderFault;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Generator returning a canned outcome and counting calls.
    pub(crate) struct Canned {
        pub fail: bool,
        pub calls: AtomicUsize,
    }

    impl Canned {
        pub(crate) fn ok() -> Arc<Self> {
            Arc::new(Canned {
                fail: false,
                calls: AtomicUsize::new(0),
            })
        }

        pub(crate) fn failing() -> Arc<Self> {
            Arc::new(Canned {
                fail: true,
                calls: AtomicUsize::new(0),
            })
        }
    }

    #[async_trait]
    impl PromptGenerator for Canned {
        async fn generate(&self, _theme: &str) -> Result<GeneratedPrompts, GenerateError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                Err(communication_failure())
            } else {
                Ok(sample_prompts())
            }
        }
    }

    fn communication_failure() -> GenerateError {
        GenerateError::Communication(ProviderFault::Status {
            status: 500,
            message: "boom".to_string(),
        })
    }

    #[test]
    fn blank_theme_sets_validation_error_without_ticket() {
        let mut session = Session::default();

        assert!(session.submit("   \n\t").is_none());
        assert_eq!(session.state().error.as_deref(), Some(VALIDATION_MESSAGE));
        assert!(!session.state().is_loading);
        assert_eq!(session.state().phase(), Phase::Error);
    }

    #[test]
    fn blank_theme_keeps_existing_result() {
        let mut session = Session::default();
        let ticket = session.submit("tema").unwrap();
        session.complete(ticket, &Ok(sample_prompts()));

        assert!(session.submit("").is_none());
        assert_eq!(session.state().prompts, Some(sample_prompts()));
        assert_eq!(session.state().error.as_deref(), Some(VALIDATION_MESSAGE));
    }

    #[test]
    fn success_clears_prior_error() {
        let mut session = Session::default();
        session.submit(" ");

        let ticket = session.submit("Um robô solitário em Marte").unwrap();
        assert_eq!(session.state().phase(), Phase::Loading);
        assert!(session.state().error.is_none());
        assert!(session.state().prompts.is_none());

        assert!(session.complete(ticket, &Ok(sample_prompts())));
        assert_eq!(
            session.state(),
            &GenerationState {
                prompts: Some(sample_prompts()),
                is_loading: false,
                error: None,
            }
        );
        assert_eq!(session.state().phase(), Phase::Success);
    }

    #[test]
    fn failure_clears_previous_result() {
        let mut session = Session::default();
        let first = session.submit("tema").unwrap();
        session.complete(first, &Ok(sample_prompts()));

        let second = session.submit("tema").unwrap();
        assert!(session.complete(second, &Err(communication_failure())));

        let state = session.state();
        assert!(state.prompts.is_none());
        assert!(!state.is_loading);
        assert_eq!(
            state.error.as_deref(),
            Some(
                "Erro ao gerar prompts: Não foi possível comunicar com a API Gemini. Verifique o console para mais detalhes."
            )
        );
    }

    #[test]
    fn stale_result_is_discarded() {
        let mut session = Session::default();
        let older = session.submit("primeiro").unwrap();
        let newer = session.submit("segundo").unwrap();

        let mut newer_prompts = sample_prompts();
        newer_prompts.prompt_json.title = "Segundo".to_string();

        assert!(session.complete(newer, &Ok(newer_prompts.clone())));
        assert!(!session.complete(older, &Err(communication_failure())));
        assert_eq!(session.state().prompts, Some(newer_prompts));
        assert!(session.state().error.is_none());
    }

    #[test]
    fn stale_result_does_not_end_loading() {
        let mut session = Session::default();
        let older = session.submit("primeiro").unwrap();
        let _newer = session.submit("segundo").unwrap();

        assert!(!session.complete(older, &Ok(sample_prompts())));
        assert!(session.state().is_loading);
        assert!(session.state().prompts.is_none());
    }

    #[test]
    fn copy_ack_reverts_after_timeout() {
        let mut session = Session::default();
        let start = Instant::now();
        assert!(session.mark_copied(CopyTarget::Pt, start).is_none());
        assert!(session.copied(start).is_none());

        let ticket = session.submit("tema").unwrap();
        session.complete(ticket, &Ok(sample_prompts()));

        let text = session.mark_copied(CopyTarget::Json, start).unwrap();
        assert_eq!(text, sample_prompts().formatted_json());
        assert_eq!(session.copied(start + Duration::from_millis(1999)), Some(CopyTarget::Json));
        assert_eq!(session.copied(start + COPY_ACK), None);
    }

    #[test]
    fn later_copy_replaces_ack() {
        let mut session = Session::default();
        let ticket = session.submit("tema").unwrap();
        session.complete(ticket, &Ok(sample_prompts()));

        let start = Instant::now();
        session.mark_copied(CopyTarget::Pt, start);
        let text = session.mark_copied(CopyTarget::En, start + Duration::from_secs(1));

        assert_eq!(text, Some(sample_prompts().prompt_en));
        assert_eq!(session.copied(start + Duration::from_millis(2500)), Some(CopyTarget::En));
    }

    #[test]
    fn new_submission_clears_copy_ack() {
        let mut session = Session::default();
        let ticket = session.submit("tema").unwrap();
        session.complete(ticket, &Ok(sample_prompts()));
        let now = Instant::now();
        session.mark_copied(CopyTarget::Pt, now);

        session.submit("outro").unwrap();
        assert!(session.copied(now).is_none());
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<std::sync::Mutex<Vec<u8>>>);

    impl std::io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> std::io::Result<()> {
            Ok(())
        }
    }

    #[test]
    fn stale_failure_is_still_logged() {
        let mut session = Session::default();
        let older = session.submit("primeiro").unwrap();
        let _newer = session.submit("segundo").unwrap();

        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_writer(move || writer.clone())
            .with_ansi(false)
            .finish();
        let applied = tracing::subscriber::with_default(subscriber, || {
            session.complete(older, &Err(communication_failure()))
        });

        assert!(!applied);
        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        assert!(output.contains("prompt generation failed"));
        assert!(output.contains("stale=true"));
        assert!(output.contains("boom"));
    }

    /// Generator whose Portuguese prompt is the theme itself.
    struct Echo;

    #[async_trait]
    impl PromptGenerator for Echo {
        async fn generate(&self, theme: &str) -> Result<GeneratedPrompts, GenerateError> {
            let mut prompts = sample_prompts();
            prompts.prompt_pt = theme.to_string();
            Ok(prompts)
        }
    }

    fn client() -> ClientId {
        ClientId::new()
    }

    #[tokio::test]
    async fn studio_skips_generator_for_blank_theme() {
        let generator = Canned::ok();
        let studio = Studio::new(generator.clone());
        let id = client();

        assert!(matches!(studio.generate(id, "  ").await, Outcome::Invalid));
        assert_eq!(generator.calls.load(Ordering::SeqCst), 0);
        assert_eq!(
            studio.view(id).await.state.error.as_deref(),
            Some(VALIDATION_MESSAGE)
        );
    }

    #[tokio::test]
    async fn studio_reports_success_and_failure() {
        let studio = Studio::new(Canned::ok());
        let id = client();
        let outcome = studio.generate(id, "Um robô solitário em Marte").await;
        assert!(matches!(outcome, Outcome::Generated(ref p) if *p == sample_prompts()));

        let view = studio.view(id).await;
        assert_eq!(view.phase, Phase::Success);
        assert_eq!(view.formatted_json, Some(sample_prompts().formatted_json()));

        let studio = Studio::new(Canned::failing());
        assert!(matches!(studio.generate(id, "tema").await, Outcome::Failed(_)));
        let view = studio.view(id).await;
        assert_eq!(view.phase, Phase::Error);
        assert!(view.state.prompts.is_none());
        assert!(!view.state.is_loading);
    }

    #[tokio::test]
    async fn clients_keep_separate_sessions() {
        let studio = Studio::new(Arc::new(Echo));
        let (a, b) = (client(), client());

        studio.generate(a, "tema do usuário A").await;
        studio.generate(b, "tema do usuário B").await;

        assert_eq!(
            studio.copy(a, CopyTarget::Pt).await.as_deref(),
            Some("tema do usuário A")
        );
        assert_eq!(
            studio.copy(b, CopyTarget::Pt).await.as_deref(),
            Some("tema do usuário B")
        );
        assert_eq!(studio.view(a).await.copied, Some(CopyTarget::Pt));
    }

    #[tokio::test]
    async fn submission_in_one_session_does_not_supersede_another() {
        let studio = Studio::new(Arc::new(Echo));
        let (a, b) = (client(), client());

        // A starts a generation whose ticket is then outlived by B's.
        let ticket = studio
            .with_session(a, |session, _| session.submit("A"))
            .await
            .unwrap();
        assert!(matches!(studio.generate(b, "B").await, Outcome::Generated(_)));

        let applied = studio
            .with_session(a, |session, _| session.complete(ticket, &Ok(sample_prompts())))
            .await;
        assert!(applied);
    }

    #[tokio::test]
    async fn least_recently_used_session_is_evicted() {
        let studio = Studio::new(Arc::new(Echo)).with_max_sessions(2);
        let (a, b, c) = (client(), client(), client());

        studio.generate(a, "A").await;
        studio.generate(b, "B").await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        studio.view(a).await;
        tokio::time::sleep(Duration::from_millis(2)).await;
        studio.generate(c, "C").await;

        assert_eq!(studio.session_count().await, 2);
        assert_eq!(studio.copy(a, CopyTarget::Pt).await.as_deref(), Some("A"));
        // B was evicted, so it comes back as a fresh session with nothing loaded.
        assert!(studio.copy(b, CopyTarget::Pt).await.is_none());
    }

    #[test]
    fn idle_sessions_are_dropped() {
        let start = Instant::now();
        let mut sessions = HashMap::new();
        sessions.insert(
            client(),
            Entry {
                session: Session::default(),
                touched: start,
            },
        );

        evict(&mut sessions, start + SESSION_IDLE, MAX_SESSIONS);
        assert!(sessions.is_empty());
    }
}
