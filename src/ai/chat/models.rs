//! The core models for a single recipe chat session: transcript
//! entries and the append-only store that holds them.
use std::path::PathBuf;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use crate::ai::encoder::{ImageBlob, media_type_for_path};
use crate::ai::gateway::ContextMessage;

// Subscribers that fall further behind than this miss entries and can
// re-read the full transcript.
const SUBSCRIBER_CAPACITY: usize = 64;

#[derive(Clone, Copy, Serialize, Deserialize, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl Role {
    /// Role tag used when replaying history to the gateway.
    pub fn tag(&self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Assistant => "bot",
        }
    }
}

/// Metadata for the image behind an image analysis request. The bytes
/// stay server side.
#[derive(Clone, Serialize, Debug)]
pub struct AttachedImage {
    pub file_name: Option<String>,
    pub media_type: String,
    #[serde(skip)]
    pub blob: ImageBlob,
}

impl AttachedImage {
    pub fn from_upload(file_name: Option<String>, media_type: &str, bytes: Vec<u8>) -> Self {
        Self {
            file_name,
            media_type: media_type.to_string(),
            blob: ImageBlob::from_bytes(bytes),
        }
    }

    /// An image on local disk. It is not read until the session encodes
    /// it.
    pub fn from_path(path: PathBuf) -> Self {
        let file_name = path
            .file_name()
            .map(|name| name.to_string_lossy().to_string());
        let media_type = media_type_for_path(&path).to_string();
        Self {
            file_name,
            media_type,
            blob: ImageBlob::File(path),
        }
    }
}

#[derive(Clone, Serialize, Debug)]
pub struct TranscriptEntry {
    pub id: u64,
    pub role: Role,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub attached_image: Option<AttachedImage>,
    pub created_at: DateTime<Utc>,
}

impl From<&TranscriptEntry> for ContextMessage {
    fn from(entry: &TranscriptEntry) -> Self {
        ContextMessage::new(entry.role.tag(), &entry.text)
    }
}

/// Ordered, append-only log of a session's entries. Entries can't be
/// edited or removed once appended; callers only ever get copies.
pub struct Transcript {
    entries: RwLock<Vec<TranscriptEntry>>,
    tx: broadcast::Sender<TranscriptEntry>,
}

impl Default for Transcript {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcript {
    pub fn new() -> Self {
        let (tx, _rx) = broadcast::channel(SUBSCRIBER_CAPACITY);
        Self {
            entries: RwLock::new(Vec::new()),
            tx,
        }
    }

    /// Append a new entry and notify subscribers. Ids start at 1 and
    /// follow append order.
    pub fn append(
        &self,
        role: Role,
        text: &str,
        attached_image: Option<AttachedImage>,
    ) -> TranscriptEntry {
        let mut entries = self.entries.write().expect("Unable to write transcript");
        let entry = TranscriptEntry {
            id: entries.len() as u64 + 1,
            role,
            text: text.to_string(),
            attached_image,
            created_at: Utc::now(),
        };
        entries.push(entry.clone());

        // Sending while holding the lock keeps notifications in append
        // order. An error only means nobody is subscribed.
        let _ = self.tx.send(entry.clone());

        entry
    }

    pub fn all(&self) -> Vec<TranscriptEntry> {
        self.entries
            .read()
            .expect("Unable to read transcript")
            .clone()
    }

    pub fn get(&self, id: u64) -> Option<TranscriptEntry> {
        self.entries
            .read()
            .expect("Unable to read transcript")
            .iter()
            .find(|entry| entry.id == id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        self.entries.read().expect("Unable to read transcript").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Receive every entry appended from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<TranscriptEntry> {
        self.tx.subscribe()
    }
}
