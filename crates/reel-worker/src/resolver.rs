//! Transcript resolution: platform captions first, local ASR fallback.

use std::path::Path;

use tracing::{info, warn};

use reel_models::{TranscriptSegment, TranscriptSource};

use crate::collab::{CaptionProvider, Transcriber};
use crate::config::PipelineConfig;
use crate::error::{PipelineError, PipelineResult};

/// Resolve a transcript for a job.
///
/// Platform captions win when present; only when they are absent, empty,
/// or the fetch errors does local transcription run. Exactly one source
/// produces the returned segments, and the tag records which.
pub async fn resolve_transcript(
    caption_provider: &dyn CaptionProvider,
    transcriber: &dyn Transcriber,
    url: &str,
    wav: &Path,
    workdir: &Path,
    config: &PipelineConfig,
) -> PipelineResult<(Vec<TranscriptSegment>, TranscriptSource)> {
    match caption_provider
        .fetch_captions(url, &config.language, workdir)
        .await
    {
        Ok(Some(segments)) => {
            info!(url = %url, segments = segments.len(), "Using platform captions");
            return Ok((segments, TranscriptSource::PlatformCaptions));
        }
        Ok(None) => {
            info!(url = %url, "No platform captions, falling back to local transcription");
        }
        Err(e) => {
            warn!(url = %url, error = %e, "Platform caption fetch failed, falling back to local transcription");
        }
    }

    let segments = transcriber
        .transcribe(wav, &config.whisper_model, &config.language, workdir)
        .await
        .map_err(|e| PipelineError::transcript_unavailable(e.to_string()))?;

    if segments.is_empty() {
        return Err(PipelineError::transcript_unavailable(
            "local transcription produced no segments",
        ));
    }

    info!(url = %url, segments = segments.len(), "Using local transcription");
    Ok((segments, TranscriptSource::LocalTranscription))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use reel_media::MediaResult;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct FakeCaptions {
        result: Option<Vec<TranscriptSegment>>,
        fail: bool,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl CaptionProvider for FakeCaptions {
        async fn fetch_captions(
            &self,
            _url: &str,
            _lang: &str,
            _workdir: &Path,
        ) -> MediaResult<Option<Vec<TranscriptSegment>>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(reel_media::MediaError::download_failed("boom"));
            }
            Ok(self.result.clone())
        }
    }

    struct FakeTranscriber {
        segments: Vec<TranscriptSegment>,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl Transcriber for FakeTranscriber {
        async fn transcribe(
            &self,
            _wav: &Path,
            _model: &str,
            _language: &str,
            _workdir: &Path,
        ) -> MediaResult<Vec<TranscriptSegment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(self.segments.clone())
        }
    }

    fn segs() -> Vec<TranscriptSegment> {
        vec![TranscriptSegment::new(0.0, 1.0, "hello")]
    }

    #[tokio::test]
    async fn test_platform_captions_win_and_transcriber_not_called() {
        let captions = FakeCaptions {
            result: Some(segs()),
            fail: false,
            calls: AtomicUsize::new(0),
        };
        let transcriber = FakeTranscriber {
            segments: segs(),
            calls: AtomicUsize::new(0),
        };

        let (_, source) = resolve_transcript(
            &captions,
            &transcriber,
            "https://youtu.be/abc123def45",
            Path::new("/tmp/a.wav"),
            Path::new("/tmp"),
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(source, TranscriptSource::PlatformCaptions);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_fallback_when_no_captions() {
        let captions = FakeCaptions {
            result: None,
            fail: false,
            calls: AtomicUsize::new(0),
        };
        let transcriber = FakeTranscriber {
            segments: segs(),
            calls: AtomicUsize::new(0),
        };

        let (_, source) = resolve_transcript(
            &captions,
            &transcriber,
            "https://youtu.be/abc123def45",
            Path::new("/tmp/a.wav"),
            Path::new("/tmp"),
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(source, TranscriptSource::LocalTranscription);
        assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_fallback_when_caption_fetch_errors() {
        let captions = FakeCaptions {
            result: None,
            fail: true,
            calls: AtomicUsize::new(0),
        };
        let transcriber = FakeTranscriber {
            segments: segs(),
            calls: AtomicUsize::new(0),
        };

        let (_, source) = resolve_transcript(
            &captions,
            &transcriber,
            "https://youtu.be/abc123def45",
            Path::new("/tmp/a.wav"),
            Path::new("/tmp"),
            &PipelineConfig::default(),
        )
        .await
        .unwrap();

        assert_eq!(source, TranscriptSource::LocalTranscription);
    }

    #[tokio::test]
    async fn test_unavailable_when_both_paths_empty() {
        let captions = FakeCaptions {
            result: None,
            fail: false,
            calls: AtomicUsize::new(0),
        };
        let transcriber = FakeTranscriber {
            segments: vec![],
            calls: AtomicUsize::new(0),
        };

        let result = resolve_transcript(
            &captions,
            &transcriber,
            "https://youtu.be/abc123def45",
            Path::new("/tmp/a.wav"),
            Path::new("/tmp"),
            &PipelineConfig::default(),
        )
        .await;

        assert!(matches!(
            result,
            Err(PipelineError::TranscriptUnavailable(_))
        ));
    }
}
