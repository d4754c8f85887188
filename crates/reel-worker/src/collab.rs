//! Collaborator seams around external tooling.
//!
//! Each stage talks to its tool through a trait so tests can substitute
//! fakes and the runner stays a pure state machine. Production impls
//! shell out via `reel-media`.

use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::OnceCell;
use tracing::warn;

use reel_media::{MediaError, MediaResult};
use reel_models::{EncoderPath, RawWordTiming, TranscriptSegment, VideoMetadata};

/// Fetches the source video, the audio track for ASR, and metadata.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Download the video at `url` to `video_dest`, extract its audio as a
    /// mono wav at `sample_rate` to `audio_dest`, and report metadata.
    async fn fetch(
        &self,
        url: &str,
        video_dest: &Path,
        audio_dest: &Path,
        sample_rate: u32,
    ) -> MediaResult<VideoMetadata>;
}

/// Fetches platform-supplied captions, when the platform has them.
#[async_trait]
pub trait CaptionProvider: Send + Sync {
    /// `Ok(None)` means the platform has no captions in this language;
    /// that is a normal outcome, not an error.
    async fn fetch_captions(
        &self,
        url: &str,
        lang: &str,
        workdir: &Path,
    ) -> MediaResult<Option<Vec<TranscriptSegment>>>;
}

/// Local speech-to-text fallback.
#[async_trait]
pub trait Transcriber: Send + Sync {
    async fn transcribe(
        &self,
        wav: &Path,
        model: &str,
        language: &str,
        workdir: &Path,
    ) -> MediaResult<Vec<TranscriptSegment>>;
}

/// Word-level alignment of a transcript against audio.
#[async_trait]
pub trait Aligner: Send + Sync {
    async fn align(
        &self,
        wav: &Path,
        segments: &[TranscriptSegment],
        language: &str,
        workdir: &Path,
    ) -> MediaResult<Vec<RawWordTiming>>;
}

/// Encoder selection and final rendering.
#[async_trait]
pub trait Encoder: Send + Sync {
    /// Which encoder path to use. Probed once per run and cached.
    async fn detect(&self, workdir: &Path) -> EncoderPath;

    async fn render(
        &self,
        input: &Path,
        captions: &Path,
        output: &Path,
        path: EncoderPath,
    ) -> MediaResult<()>;
}

/// The full set of collaborators a runner needs.
#[derive(Clone)]
pub struct Collaborators {
    pub downloader: Arc<dyn Downloader>,
    pub caption_provider: Arc<dyn CaptionProvider>,
    pub transcriber: Arc<dyn Transcriber>,
    pub aligner: Arc<dyn Aligner>,
    pub encoder: Arc<dyn Encoder>,
}

impl Collaborators {
    /// Production wiring: yt-dlp, whisper, whisperx, ffmpeg.
    pub fn production(caption_timeout_secs: u64) -> Self {
        Self {
            downloader: Arc::new(YtDlpDownloader),
            caption_provider: Arc::new(YtDlpCaptionProvider {
                timeout_secs: caption_timeout_secs,
            }),
            transcriber: Arc::new(WhisperTranscriber),
            aligner: Arc::new(WhisperXAligner),
            encoder: Arc::new(FfmpegEncoder::new()),
        }
    }
}

/// yt-dlp download plus ffmpeg audio extraction.
pub struct YtDlpDownloader;

#[async_trait]
impl Downloader for YtDlpDownloader {
    async fn fetch(
        &self,
        url: &str,
        video_dest: &Path,
        audio_dest: &Path,
        sample_rate: u32,
    ) -> MediaResult<VideoMetadata> {
        let metadata = reel_media::download::fetch_metadata(url).await?;
        reel_media::download::download_video(url, video_dest).await?;

        // Lossless m4a intermediate, then the mono wav speech models want.
        let m4a = audio_dest.with_extension("m4a");
        reel_media::audio::extract_audio(video_dest, &m4a).await?;
        reel_media::audio::convert_to_wav(&m4a, audio_dest, sample_rate).await?;
        let _ = tokio::fs::remove_file(&m4a).await;

        Ok(metadata)
    }
}

/// yt-dlp subtitle fetch with a hard timeout.
pub struct YtDlpCaptionProvider {
    pub timeout_secs: u64,
}

#[async_trait]
impl CaptionProvider for YtDlpCaptionProvider {
    async fn fetch_captions(
        &self,
        url: &str,
        lang: &str,
        workdir: &Path,
    ) -> MediaResult<Option<Vec<TranscriptSegment>>> {
        let fetch = reel_media::download::download_captions_vtt(url, lang, workdir);
        let vtt_path = match tokio::time::timeout(
            std::time::Duration::from_secs(self.timeout_secs),
            fetch,
        )
        .await
        {
            Ok(result) => result?,
            Err(_) => return Err(MediaError::Timeout(self.timeout_secs)),
        };

        let Some(vtt_path) = vtt_path else {
            return Ok(None);
        };

        let content = tokio::fs::read_to_string(&vtt_path).await?;
        let segments = reel_media::parse_vtt(&content)?;
        if segments.is_empty() {
            warn!(url = %url, "Platform caption track parsed to zero segments");
            return Ok(None);
        }
        Ok(Some(segments))
    }
}

/// whisper CLI transcriber.
pub struct WhisperTranscriber;

#[async_trait]
impl Transcriber for WhisperTranscriber {
    async fn transcribe(
        &self,
        wav: &Path,
        model: &str,
        language: &str,
        workdir: &Path,
    ) -> MediaResult<Vec<TranscriptSegment>> {
        reel_media::asr::run_whisper(wav, model, language, workdir).await
    }
}

/// whisperx CLI aligner.
pub struct WhisperXAligner;

#[async_trait]
impl Aligner for WhisperXAligner {
    async fn align(
        &self,
        wav: &Path,
        segments: &[TranscriptSegment],
        language: &str,
        workdir: &Path,
    ) -> MediaResult<Vec<RawWordTiming>> {
        reel_media::asr::run_whisperx_align(wav, segments, language, workdir).await
    }
}

/// ffmpeg encoder with a cached hardware probe.
pub struct FfmpegEncoder {
    probed: OnceCell<EncoderPath>,
}

impl FfmpegEncoder {
    pub fn new() -> Self {
        Self {
            probed: OnceCell::new(),
        }
    }
}

impl Default for FfmpegEncoder {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Encoder for FfmpegEncoder {
    async fn detect(&self, workdir: &Path) -> EncoderPath {
        *self
            .probed
            .get_or_init(|| reel_media::detect_encoder(workdir.to_path_buf()))
            .await
    }

    async fn render(
        &self,
        input: &Path,
        captions: &Path,
        output: &Path,
        path: EncoderPath,
    ) -> MediaResult<()> {
        reel_media::render_vertical(input, captions, output, path).await
    }
}
