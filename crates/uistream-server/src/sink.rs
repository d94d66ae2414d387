//! Outgoing event sink abstraction.
//!
//! A sink is the write-append half of a turn: ordered, not buffered
//! beyond delivery needs. A failed write is either transient
//! ([`SinkError::Rejected`] - the relay logs and keeps going) or
//! permanent ([`SinkError::Closed`] - the relay stops early, which is
//! how client disconnects propagate back into chunk consumption).

use crate::error::SinkError;
use async_trait::async_trait;
use tokio::sync::mpsc;
use uistream_core::UiEvent;

/// Write-append interface for one turn's outgoing events.
#[async_trait]
pub trait EventSink: Send {
    /// Append one event to the stream.
    async fn send(&mut self, event: UiEvent) -> Result<(), SinkError>;
}

/// Sink backed by a bounded tokio channel.
///
/// The receiving half typically feeds an HTTP response body; when the
/// receiver is dropped (client gone) every further send reports
/// [`SinkError::Closed`].
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: mpsc::Sender<UiEvent>,
}

impl ChannelSink {
    /// Wrap a channel sender.
    #[must_use]
    pub fn new(tx: mpsc::Sender<UiEvent>) -> Self {
        Self { tx }
    }

    /// Create a sink together with its receiving half.
    #[must_use]
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<UiEvent>) {
        let (tx, rx) = mpsc::channel(capacity);
        (Self::new(tx), rx)
    }
}

#[async_trait]
impl EventSink for ChannelSink {
    async fn send(&mut self, event: UiEvent) -> Result<(), SinkError> {
        self.tx.send(event).await.map_err(|_| SinkError::Closed)
    }
}

/// Sink that collects events in memory.
///
/// Useful for tests and for callers that want a whole turn's events as
/// a batch rather than a stream.
#[derive(Debug, Default)]
pub struct BufferSink {
    events: Vec<UiEvent>,
}

impl BufferSink {
    /// Create an empty buffer sink.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The events collected so far, in write order.
    #[must_use]
    pub fn events(&self) -> &[UiEvent] {
        &self.events
    }

    /// Consume the sink, returning the collected events.
    #[must_use]
    pub fn into_events(self) -> Vec<UiEvent> {
        self.events
    }
}

#[async_trait]
impl EventSink for BufferSink {
    async fn send(&mut self, event: UiEvent) -> Result<(), SinkError> {
        self.events.push(event);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;
    use uistream_core::{SegmentId, StatusPhase};

    #[tokio::test]
    async fn channel_sink_delivers_in_order() {
        let (mut sink, mut rx) = ChannelSink::channel(4);

        sink.send(UiEvent::TextStart {
            id: SegmentId::new("a"),
        })
        .await
        .expect("send");
        sink.send(UiEvent::TextEnd {
            id: SegmentId::new("a"),
        })
        .await
        .expect("send");
        drop(sink);

        assert_matches!(rx.recv().await, Some(UiEvent::TextStart { .. }));
        assert_matches!(rx.recv().await, Some(UiEvent::TextEnd { .. }));
        assert_matches!(rx.recv().await, None);
    }

    #[tokio::test]
    async fn dropped_receiver_reports_closed() {
        let (mut sink, rx) = ChannelSink::channel(1);
        drop(rx);

        let err = sink
            .send(UiEvent::status(StatusPhase::Complete, "done"))
            .await
            .expect_err("receiver is gone");
        assert_matches!(err, SinkError::Closed);
    }

    #[tokio::test]
    async fn buffer_sink_collects_events() {
        let mut sink = BufferSink::new();
        sink.send(UiEvent::status(StatusPhase::Starting, "warming up"))
            .await
            .expect("send");

        assert_eq!(sink.events().len(), 1);
        let events = sink.into_events();
        assert_matches!(&events[0], UiEvent::Status { data } if data.phase == StatusPhase::Starting);
    }
}
