//! End-to-end pipeline tests with fake collaborators.

use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use tempfile::TempDir;
use tokio::sync::watch;

use reel_media::MediaResult;
use reel_models::{
    EncoderPath, JobRecord, JobStatus, RawWordTiming, Stage, TranscriptSegment, TranscriptSource,
    VideoMetadata,
};
use reel_store::ArtifactStore;
use reel_worker::{
    Aligner, BatchDriver, CaptionProvider, Collaborators, Downloader, Encoder, JobRunner,
    PipelineConfig, PipelineError, StatusRegistry, Transcriber,
};

const URL: &str = "https://youtu.be/abc123def45";

struct FakeDownloader {
    calls: AtomicUsize,
    fail_for: Option<String>,
}

impl FakeDownloader {
    fn new() -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_for: None,
        }
    }

    fn failing_for(url: &str) -> Self {
        Self {
            calls: AtomicUsize::new(0),
            fail_for: Some(url.to_string()),
        }
    }
}

#[async_trait]
impl Downloader for FakeDownloader {
    async fn fetch(
        &self,
        url: &str,
        video_dest: &Path,
        audio_dest: &Path,
        _sample_rate: u32,
    ) -> MediaResult<VideoMetadata> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_for.as_deref() == Some(url) {
            return Err(reel_media::MediaError::download_failed("404 not found"));
        }
        tokio::fs::write(video_dest, b"fake video").await?;
        tokio::fs::write(audio_dest, b"fake audio").await?;
        Ok(VideoMetadata {
            title: Some("Test Clip".to_string()),
            duration: Some(12.0),
        })
    }
}

struct FakeCaptionProvider {
    segments: Option<Vec<TranscriptSegment>>,
    calls: AtomicUsize,
}

#[async_trait]
impl CaptionProvider for FakeCaptionProvider {
    async fn fetch_captions(
        &self,
        _url: &str,
        _lang: &str,
        _workdir: &Path,
    ) -> MediaResult<Option<Vec<TranscriptSegment>>> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.segments.clone())
    }
}

struct FakeTranscriber {
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
        Ok(segments())
    }
}

struct FakeAligner;

#[async_trait]
impl Aligner for FakeAligner {
    async fn align(
        &self,
        _wav: &Path,
        _segments: &[TranscriptSegment],
        _language: &str,
        _workdir: &Path,
    ) -> MediaResult<Vec<RawWordTiming>> {
        Ok(vec![
            RawWordTiming::placed("hello", 0.0, 0.4),
            RawWordTiming::placed("there", 0.5, 0.9),
            RawWordTiming::placed("friends", 1.0, 1.5),
        ])
    }
}

struct FakeEncoder {
    detect_as: EncoderPath,
    fail_hardware: bool,
    renders: AtomicUsize,
}

impl FakeEncoder {
    fn software() -> Self {
        Self {
            detect_as: EncoderPath::Software,
            fail_hardware: false,
            renders: AtomicUsize::new(0),
        }
    }

    fn flaky_hardware() -> Self {
        Self {
            detect_as: EncoderPath::Hardware,
            fail_hardware: true,
            renders: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl Encoder for FakeEncoder {
    async fn detect(&self, _workdir: &Path) -> EncoderPath {
        self.detect_as
    }

    async fn render(
        &self,
        _input: &Path,
        _captions: &Path,
        output: &Path,
        path: EncoderPath,
    ) -> MediaResult<()> {
        self.renders.fetch_add(1, Ordering::SeqCst);
        if self.fail_hardware && path == EncoderPath::Hardware {
            return Err(reel_media::MediaError::ffmpeg_failed(
                "FFmpeg exited with non-zero status",
                Some("Cannot load libnvidia-encode.so".to_string()),
                Some(1),
            ));
        }
        tokio::fs::write(output, b"fake rendered clip").await?;
        Ok(())
    }
}

fn segments() -> Vec<TranscriptSegment> {
    vec![TranscriptSegment::new(0.0, 1.5, "hello there friends")]
}

struct Harness {
    _dir: TempDir,
    store: ArtifactStore,
    config: PipelineConfig,
    status: StatusRegistry,
    cancel_tx: watch::Sender<bool>,
    cancel_rx: watch::Receiver<bool>,
}

impl Harness {
    async fn new() -> Self {
        let dir = TempDir::new().unwrap();
        let store = ArtifactStore::new(dir.path());
        store.init().await.unwrap();
        let config = PipelineConfig {
            data_dir: dir.path().to_path_buf(),
            ..PipelineConfig::default()
        };
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            _dir: dir,
            store,
            config,
            status: StatusRegistry::new(),
            cancel_tx,
            cancel_rx,
        }
    }

    fn runner(&self, collab: Collaborators) -> JobRunner {
        JobRunner::new(
            self.store.clone(),
            self.config.clone(),
            collab,
            self.status.clone(),
            self.cancel_rx.clone(),
        )
    }

    fn driver(&self, collab: Collaborators) -> BatchDriver {
        BatchDriver::new(
            self.store.clone(),
            self.config.clone(),
            collab,
            self.status.clone(),
            self.cancel_rx.clone(),
        )
    }
}

fn collab_with(
    downloader: FakeDownloader,
    captions: Option<Vec<TranscriptSegment>>,
    encoder: FakeEncoder,
) -> (
    Collaborators,
    Arc<FakeDownloader>,
    Arc<FakeCaptionProvider>,
    Arc<FakeTranscriber>,
    Arc<FakeEncoder>,
) {
    let downloader = Arc::new(downloader);
    let caption_provider = Arc::new(FakeCaptionProvider {
        segments: captions,
        calls: AtomicUsize::new(0),
    });
    let transcriber = Arc::new(FakeTranscriber {
        calls: AtomicUsize::new(0),
    });
    let encoder = Arc::new(encoder);
    let collab = Collaborators {
        downloader: downloader.clone(),
        caption_provider: caption_provider.clone(),
        transcriber: transcriber.clone(),
        aligner: Arc::new(FakeAligner),
        encoder: encoder.clone(),
    };
    (collab, downloader, caption_provider, transcriber, encoder)
}

#[tokio::test]
async fn full_pipeline_produces_all_artifacts_in_order() {
    let harness = Harness::new().await;
    let (collab, _, _, transcriber, _) = collab_with(
        FakeDownloader::new(),
        Some(segments()),
        FakeEncoder::software(),
    );

    let mut record = JobRecord::new(URL);
    harness.runner(collab).run(&mut record).await.unwrap();

    assert_eq!(record.status, JobStatus::Succeeded);
    assert_eq!(record.stage, Stage::Done);

    let id = &record.id;
    assert!(harness.store.video_path(id).exists());
    assert!(harness.store.audio_path(id).exists());
    assert!(harness.store.meta_path(id).exists());
    assert!(harness.store.segments_path(id).exists());
    assert!(harness.store.transcript_source_path(id).exists());
    assert!(harness.store.words_path(id).exists());
    assert!(harness.store.captions_path(id).exists());
    assert!(harness.store.output_path(id).exists());

    // Platform captions won, so the local transcriber never ran.
    let source: TranscriptSource = harness
        .store
        .read_json(&harness.store.transcript_source_path(id))
        .await
        .unwrap();
    assert_eq!(source, TranscriptSource::PlatformCaptions);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 0);

    // The caption artifact is a karaoke ASS document.
    let ass = tokio::fs::read_to_string(harness.store.captions_path(id))
        .await
        .unwrap();
    assert!(ass.contains("[Events]"));
    assert!(ass.contains("{\\k"));
}

#[tokio::test]
async fn rerun_skips_completed_stages() {
    let harness = Harness::new().await;
    let (collab, downloader, _, _, encoder) = collab_with(
        FakeDownloader::new(),
        Some(segments()),
        FakeEncoder::software(),
    );

    let runner = harness.runner(collab);

    let mut first = JobRecord::new(URL);
    runner.run(&mut first).await.unwrap();
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(encoder.renders.load(Ordering::SeqCst), 1);

    let mut second = JobRecord::new(URL);
    runner.run(&mut second).await.unwrap();
    assert_eq!(second.status, JobStatus::Succeeded);

    // Everything skipped: no tool ran again.
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 1);
    assert_eq!(encoder.renders.load(Ordering::SeqCst), 1);
    assert!(second
        .log
        .iter()
        .any(|l| l.message.contains("skipped, artifacts exist")));
}

#[tokio::test]
async fn force_reruns_every_stage() {
    let harness = Harness::new().await;
    let (collab, downloader, _, _, _) = collab_with(
        FakeDownloader::new(),
        Some(segments()),
        FakeEncoder::software(),
    );

    let mut config = harness.config.clone();
    config.force = true;
    let runner = JobRunner::new(
        harness.store.clone(),
        config,
        collab,
        harness.status.clone(),
        harness.cancel_rx.clone(),
    );

    let mut first = JobRecord::new(URL);
    runner.run(&mut first).await.unwrap();
    let mut second = JobRecord::new(URL);
    runner.run(&mut second).await.unwrap();

    assert_eq!(downloader.calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn transcript_falls_back_to_local_transcription() {
    let harness = Harness::new().await;
    let (collab, _, captions, transcriber, _) =
        collab_with(FakeDownloader::new(), None, FakeEncoder::software());

    let mut record = JobRecord::new(URL);
    harness.runner(collab).run(&mut record).await.unwrap();

    assert_eq!(captions.calls.load(Ordering::SeqCst), 1);
    assert_eq!(transcriber.calls.load(Ordering::SeqCst), 1);

    let source: TranscriptSource = harness
        .store
        .read_json(&harness.store.transcript_source_path(&record.id))
        .await
        .unwrap();
    assert_eq!(source, TranscriptSource::LocalTranscription);
}

#[tokio::test]
async fn hardware_encode_failure_falls_back_to_software() {
    let harness = Harness::new().await;
    let (collab, _, _, _, encoder) = collab_with(
        FakeDownloader::new(),
        Some(segments()),
        FakeEncoder::flaky_hardware(),
    );

    let mut record = JobRecord::new(URL);
    harness.runner(collab).run(&mut record).await.unwrap();

    assert_eq!(record.status, JobStatus::Succeeded);
    // Hardware attempt plus the software retry.
    assert_eq!(encoder.renders.load(Ordering::SeqCst), 2);
    assert!(harness.store.output_path(&record.id).exists());
}

#[tokio::test]
async fn fetch_failure_stops_job_with_stage_error() {
    let harness = Harness::new().await;
    let (collab, _, _, _, _) = collab_with(
        FakeDownloader::failing_for(URL),
        Some(segments()),
        FakeEncoder::software(),
    );

    let mut record = JobRecord::new(URL);
    let result = harness.runner(collab).run(&mut record).await;

    assert!(matches!(result, Err(PipelineError::Fetch(_))));
    assert_eq!(record.status, JobStatus::Failed);
    let error = record.error.as_deref().unwrap();
    assert!(error.starts_with("fetch:"));
    assert!(error.contains("404 not found"));

    // Nothing downstream was produced.
    assert!(!harness.store.segments_path(&record.id).exists());
    assert!(!harness.store.output_path(&record.id).exists());
}

#[tokio::test]
async fn batch_isolates_failures_and_counts_results() {
    let harness = Harness::new().await;
    let bad_url = "https://youtu.be/badbadbad11";
    let (collab, _, _, _, _) = collab_with(
        FakeDownloader::failing_for(bad_url),
        Some(segments()),
        FakeEncoder::software(),
    );

    let urls = vec![
        "https://youtu.be/abc123def45".to_string(),
        bad_url.to_string(),
        "https://youtu.be/xyz987wvu21".to_string(),
    ];
    let report = harness.driver(collab).run(urls).await.unwrap();

    assert_eq!(report.jobs.len(), 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let failed: Vec<_> = report
        .jobs
        .iter()
        .filter(|j| j.status == JobStatus::Failed)
        .collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].source_url, bad_url);

    // Successful jobs landed in the manifest, one whole JSON record per
    // line even with jobs finishing concurrently.
    let manifest = tokio::fs::read_to_string(harness.store.manifest_path())
        .await
        .unwrap();
    assert_eq!(manifest.lines().count(), 2);
    assert!(manifest.contains("abc123def45"));
    assert!(!manifest.contains("badbadbad11"));
    for line in manifest.lines() {
        let record: serde_json::Value = serde_json::from_str(line).unwrap();
        assert!(record.get("job_id").is_some());
        assert!(record.get("output").is_some());
    }
}

#[tokio::test]
async fn cancellation_stops_jobs_at_stage_boundary() {
    let harness = Harness::new().await;
    let (collab, downloader, _, _, _) = collab_with(
        FakeDownloader::new(),
        Some(segments()),
        FakeEncoder::software(),
    );

    harness.cancel_tx.send(true).unwrap();

    let mut record = JobRecord::new(URL);
    let result = harness.runner(collab).run(&mut record).await;

    assert!(matches!(result, Err(PipelineError::Cancelled)));
    assert_eq!(record.status, JobStatus::Failed);
    assert!(record.error.as_deref().unwrap().contains("cancelled"));
    assert_eq!(downloader.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn status_registry_tracks_stage_progress() {
    let harness = Harness::new().await;
    let (collab, _, _, _, _) = collab_with(
        FakeDownloader::new(),
        Some(segments()),
        FakeEncoder::software(),
    );

    let mut record = JobRecord::new(URL);
    harness.runner(collab).run(&mut record).await.unwrap();

    let snapshot = harness.status.get(&record.id).await.unwrap();
    assert_eq!(snapshot.status, JobStatus::Succeeded);
    assert_eq!(snapshot.stage, Stage::Done);
    assert_eq!(snapshot.outputs, vec![harness.store.output_path(&record.id)]);
    assert!(!snapshot.log_tail.is_empty());
}
