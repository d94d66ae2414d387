//! Per-turn run context.
//!
//! One [`RunContext`] is created for each incoming request and handed
//! to both the chunk source and the relay. It carries cooperative
//! cancellation (client disconnects must stop chunk consumption
//! promptly) and the turn id used to correlate log lines.

use tokio_util::sync::CancellationToken;
use uistream_core::TurnId;

/// Context shared by one relay turn.
///
/// Cheap to clone (`Arc` internally); clones observe the same
/// cancellation state.
///
/// # Cancellation
///
/// Cancellation is cooperative. Long waits should race against it:
///
/// ```rust,ignore
/// tokio::select! {
///     _ = ctx.cancelled() => { /* stop consuming chunks */ }
///     chunk = chunks.next() => { /* process */ }
/// }
/// ```
#[derive(Clone)]
pub struct RunContext {
    cancellation: CancellationToken,
    turn_id: TurnId,
}

impl RunContext {
    /// Create a context with a fresh turn id and its own cancellation
    /// token.
    #[must_use]
    pub fn new() -> Self {
        Self {
            cancellation: CancellationToken::new(),
            turn_id: TurnId::random(),
        }
    }

    /// Create a context driven by an externally owned token, so the
    /// caller can cancel the turn (e.g. when the HTTP connection drops).
    #[must_use]
    pub fn with_token(cancellation: CancellationToken) -> Self {
        Self {
            cancellation,
            turn_id: TurnId::random(),
        }
    }

    /// The id of this turn.
    #[must_use]
    pub fn turn_id(&self) -> TurnId {
        self.turn_id
    }

    /// Returns a future that completes when cancellation is requested.
    pub fn cancelled(&self) -> tokio_util::sync::WaitForCancellationFuture<'_> {
        self.cancellation.cancelled()
    }

    /// Request cancellation of the turn.
    pub fn cancel(&self) {
        self.cancellation.cancel();
    }

    /// Check if cancellation has been requested.
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancellation.is_cancelled()
    }

    /// Create a child token that is cancelled with this turn but can
    /// also be cancelled independently.
    #[must_use]
    pub fn child_token(&self) -> CancellationToken {
        self.cancellation.child_token()
    }
}

impl std::fmt::Debug for RunContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RunContext")
            .field("turn_id", &self.turn_id)
            .field("is_cancelled", &self.is_cancelled())
            .finish()
    }
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}
