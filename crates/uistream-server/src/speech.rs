//! Speech-synthesis collaborator.
//!
//! The voice route forwards a synthesizer's audio bytes to the client;
//! synthesis itself (model, codec, encoding) stays behind this trait.

use crate::error::SourceResult;
use async_trait::async_trait;
use bytes::Bytes;
use futures::stream::BoxStream;

/// A finite stream of encoded audio bytes (`audio/mpeg` on the wire).
pub type AudioStream = BoxStream<'static, SourceResult<Bytes>>;

/// Turns text into an encoded audio byte stream.
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    /// Synthesize speech for the given text.
    ///
    /// # Errors
    ///
    /// Fails when the backing voice service cannot start a synthesis -
    /// surfaced to the client as a JSON error response, never a stream.
    async fn speak(&self, text: &str) -> SourceResult<AudioStream>;

    /// Synthesizer name for logging.
    fn name(&self) -> &'static str {
        "speech"
    }
}

#[async_trait]
impl<T: SpeechSynthesizer + ?Sized> SpeechSynthesizer for std::sync::Arc<T> {
    async fn speak(&self, text: &str) -> SourceResult<AudioStream> {
        (**self).speak(text).await
    }

    fn name(&self) -> &'static str {
        (**self).name()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use futures::{stream, StreamExt};

    struct CannedSpeech;

    #[async_trait]
    impl SpeechSynthesizer for CannedSpeech {
        async fn speak(&self, _text: &str) -> SourceResult<AudioStream> {
            Ok(Box::pin(stream::iter(vec![
                Ok(Bytes::from_static(b"ID3")),
                Ok(Bytes::from_static(b"frames")),
            ])))
        }
    }

    #[tokio::test]
    async fn canned_synthesizer_streams_bytes() {
        let synth = CannedSpeech;
        let audio = synth.speak("hello").await.expect("speak");
        let chunks: Vec<_> = audio.collect().await;
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].as_ref().expect("bytes"), &Bytes::from_static(b"ID3"));
    }
}
