use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Correlation id for one textual segment of the outgoing stream.
///
/// Upstream SDKs hand out plain string ids (`"text-0"`, `"msg_abc"`,
/// ...), so this is a string newtype rather than a UUID. Consecutive
/// `text-start`/`text-delta`/`text-end` events that share a segment
/// must share one `SegmentId`; chunks arriving without an id are
/// assigned [`SegmentId::text_fallback`] so their deltas still coalesce
/// into one visual segment on the client.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(String);

impl SegmentId {
    /// Creates a segment id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The fixed placeholder id used when textual chunks arrive without
    /// an explicit id.
    pub fn text_fallback() -> Self {
        Self("text-0".to_string())
    }

    /// The fixed id carried by the layout hint event.
    pub fn layout_hint() -> Self {
        Self("layout-1".to_string())
    }

    /// View the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SegmentId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for SegmentId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<String> for SegmentId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

/// Identifier for one relay turn (one request/response cycle).
///
/// A newtype is used to prevent mixing it with other id values. Stamped
/// once per incoming request and threaded through log output so the
/// events of concurrent turns can be told apart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TurnId(Uuid);

impl TurnId {
    /// Creates a new random turn id.
    pub fn random() -> Self {
        Self(Uuid::new_v4())
    }
}

impl From<Uuid> for TurnId {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

impl From<TurnId> for Uuid {
    fn from(id: TurnId) -> Self {
        id.0
    }
}

impl std::fmt::Display for TurnId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
