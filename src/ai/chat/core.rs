use std::future::Future;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::{Duration, Instant};

use anyhow::Result;
use thiserror::Error;
use tokio::sync::broadcast;
use uuid::Uuid;

use super::models::{AttachedImage, Role, Transcript, TranscriptEntry};
use crate::ai::encoder::{ImageBlob, encode};
use crate::ai::gateway::{BoxedGateway, ContextMessage};
use crate::ai::prompt::{
    CHAT_APOLOGY, IMAGE_ANALYSIS_APOLOGY, IMAGE_ANALYSIS_INSTRUCTION, IMAGE_CAPTION,
};
use crate::openai::GatewayError;

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(60);

/// Why a user action was not accepted. A rejected action leaves the
/// transcript untouched.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SubmitError {
    #[error("A request is already in flight for this session")]
    Busy,

    #[error("Message is empty")]
    EmptyMessage,
}

// Held for as long as an accepted action is in flight. Dropping it
// clears the pending flag. An action dropped before `resolve` still gets
// its assistant entry: the apology is appended on the way out.
struct PendingGuard<'a> {
    session: &'a Session,
    apology: &'static str,
    resolved: bool,
}

impl PendingGuard<'_> {
    fn resolve(mut self, reply: &str) -> TranscriptEntry {
        self.resolved = true;
        self.session.transcript.append(Role::Assistant, reply, None)
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        if !self.resolved {
            tracing::warn!(session_id = %self.session.id, "Request cancelled before a reply");
            self.session
                .transcript
                .append(Role::Assistant, self.apology, None);
        }
        self.session.touch();
        self.session.pending.store(false, Ordering::Release);
    }
}

/// A single recipe chat session.
///
/// Each accepted action appends the user's entry right away, makes one
/// gateway call and then appends exactly one assistant entry, either
/// the model's reply or a fixed apology. Only one action can be in
/// flight at a time; anything submitted meanwhile is rejected with
/// `SubmitError::Busy`. Dropping a submission before it completes
/// appends the apology in place of the reply.
///
/// Use `SessionBuilder` to construct a `Session`.
pub struct Session {
    pub id: String,
    gateway: BoxedGateway,
    transcript: Transcript,
    pending: AtomicBool,
    timeout: Duration,
    last_active: Mutex<Instant>,
}

impl Session {
    pub fn transcript(&self) -> Vec<TranscriptEntry> {
        self.transcript.all()
    }

    pub fn entry(&self, id: u64) -> Option<TranscriptEntry> {
        self.transcript.get(id)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }

    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEntry> {
        self.transcript.subscribe()
    }

    /// Mark the session as used just now.
    pub fn touch(&self) {
        *self.last_active.lock().expect("Unable to lock session") = Instant::now();
    }

    /// Time since the session was last used.
    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .expect("Unable to lock session")
            .elapsed()
    }

    fn begin(&self, apology: &'static str) -> Result<PendingGuard<'_>, SubmitError> {
        self.pending
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| SubmitError::Busy)?;
        self.touch();
        Ok(PendingGuard {
            session: self,
            apology,
            resolved: false,
        })
    }

    /// Ask for recipes from an image of ingredients. Returns the
    /// assistant entry that resolved the request.
    pub async fn submit_image(&self, image: AttachedImage) -> Result<TranscriptEntry, SubmitError> {
        let pending = self.begin(IMAGE_ANALYSIS_APOLOGY)?;

        let blob = image.blob.clone();
        self.transcript.append(Role::User, IMAGE_CAPTION, Some(image));

        let reply = match self.analyze(&blob).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!("Image analysis failed: {}. Root cause: {}", e, e.root_cause());
                IMAGE_ANALYSIS_APOLOGY.to_string()
            }
        };

        Ok(pending.resolve(&reply))
    }

    /// Send a follow-up message. The transcript as it was before this
    /// message is replayed as context.
    pub async fn submit_text(&self, text: &str) -> Result<TranscriptEntry, SubmitError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(SubmitError::EmptyMessage);
        }
        let pending = self.begin(CHAT_APOLOGY)?;

        let history: Vec<ContextMessage> = self
            .transcript
            .all()
            .iter()
            .map(ContextMessage::from)
            .collect();
        self.transcript.append(Role::User, text, None);

        let reply = match self.bounded(self.gateway.chat(text, &history)).await {
            Ok(reply) => reply,
            Err(e) => {
                tracing::error!(
                    cause = e.cause(),
                    status = ?e.status(),
                    "Chat request failed: {}",
                    e
                );
                CHAT_APOLOGY.to_string()
            }
        };

        Ok(pending.resolve(&reply))
    }

    async fn analyze(&self, blob: &ImageBlob) -> Result<String> {
        let encoded = encode(blob).await?;
        let request = self
            .gateway
            .analyze_image(&encoded, IMAGE_ANALYSIS_INSTRUCTION);
        let reply = self.bounded(request).await?;
        Ok(reply)
    }

    // The gateway call may not hold the session pending forever
    async fn bounded<F>(&self, request: F) -> Result<String, GatewayError>
    where
        F: Future<Output = Result<String, GatewayError>>,
    {
        tokio::time::timeout(self.timeout, request)
            .await
            .unwrap_or(Err(GatewayError::Timeout))
    }
}

pub struct SessionBuilder {
    gateway: BoxedGateway,
    session_id: Option<String>,
    timeout: Duration,
}

impl SessionBuilder {
    pub fn new(gateway: BoxedGateway) -> Self {
        Self {
            gateway,
            session_id: None,
            timeout: DEFAULT_TIMEOUT,
        }
    }

    pub fn build(self) -> Session {
        Session {
            id: self
                .session_id
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            gateway: self.gateway,
            transcript: Transcript::new(),
            pending: AtomicBool::new(false),
            timeout: self.timeout,
            last_active: Mutex::new(Instant::now()),
        }
    }

    pub fn session_id(mut self, id: &str) -> Self {
        self.session_id = Some(id.to_string());
        self
    }

    /// Upper bound on how long a single gateway call may take.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}
