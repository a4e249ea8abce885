//! Concurrent tile pyramid generation.
//!
//! # Architecture
//!
//! - A feeder on a blocking thread walks the region and sends tiles through
//!   a bounded channel, so sparse polygons never stall the async runtime.
//! - The dispatcher (the `generate` future) pulls from that channel and keeps
//!   at most N blocking render tasks in flight with a `FuturesUnordered`
//!   sliding window.
//! - Each task renders one tile, hands non-empty bytes to the writer and
//!   bumps the shared counters.
//! - Before starting a tile the dispatcher waits on the job's pause gate and
//!   checks its cancellation token. Tiles already in flight always finish.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use futures::stream::{FuturesUnordered, StreamExt};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use super::context::{JobContext, ProgressSink, ProgressTracker, DEFAULT_PROGRESS_INTERVAL};
use super::options::{GenerationOptions, GenerationResult, Region};
use super::GenerationError;
use crate::coord::TileIndex;
use crate::output::{create_writer, TileWriter, TilesetInfo, WriterError};
use crate::render::{RenderError, RendererFactory, TileRenderer};

/// Service-level tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationSettings {
    /// Completions between progress reports.
    pub progress_interval: u64,
}

impl Default for GenerationSettings {
    fn default() -> Self {
        Self {
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
        }
    }
}

/// Why a single tile failed.
#[derive(Debug, Error)]
enum TileFailure {
    #[error("render failed: {0}")]
    Render(#[from] RenderError),
    #[error("write failed: {0}")]
    Write(#[from] WriterError),
}

/// Runs generation jobs, one at a time.
pub struct TileGenerationService {
    factory: Arc<dyn RendererFactory>,
    settings: GenerationSettings,
    active: Mutex<Option<JobContext>>,
}

/// Clears the active job slot when the run ends, however it ends.
struct ActiveJob<'a> {
    slot: &'a Mutex<Option<JobContext>>,
}

impl Drop for ActiveJob<'_> {
    fn drop(&mut self) {
        *self.slot.lock() = None;
    }
}

impl TileGenerationService {
    pub fn new(factory: Arc<dyn RendererFactory>) -> Self {
        Self {
            factory,
            settings: GenerationSettings::default(),
            active: Mutex::new(None),
        }
    }

    pub fn with_settings(mut self, settings: GenerationSettings) -> Self {
        self.settings = settings;
        self
    }

    /// Stop starting new tiles. No-op when no job is running.
    pub fn pause(&self) {
        match self.active.lock().as_ref() {
            Some(ctx) => {
                ctx.pause();
                info!("Generation paused");
            }
            None => debug!("Pause requested with no job running"),
        }
    }

    /// Let a paused job continue. No-op when no job is running.
    pub fn resume(&self) {
        match self.active.lock().as_ref() {
            Some(ctx) => {
                ctx.resume();
                info!("Generation resumed");
            }
            None => debug!("Resume requested with no job running"),
        }
    }

    pub fn is_running(&self) -> bool {
        self.active.lock().is_some()
    }

    pub fn is_paused(&self) -> bool {
        self.active.lock().as_ref().is_some_and(JobContext::is_paused)
    }

    /// Render and store every tile described by `options`.
    ///
    /// Per-tile failures are counted, not raised. When `cancellation` fires,
    /// in-flight tiles drain, the writer is finalized and
    /// [`GenerationError::Cancelled`] is returned.
    pub async fn generate(
        &self,
        options: GenerationOptions,
        progress: Option<Arc<dyn ProgressSink>>,
        cancellation: CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        options.validate()?;

        let target = options.format.resolve_path(&options.output);
        if !options.overwrite && output_in_use(&target) {
            return Err(GenerationError::OutputExists(target));
        }

        let info = TilesetInfo {
            bounds: options.region.bounds(),
            min_zoom: Some(options.min_zoom),
            max_zoom: Some(options.max_zoom),
            ..TilesetInfo::default()
        };
        let writer = create_writer(options.format, info);
        self.run_job(options, writer, progress, cancellation).await
    }

    /// Drive a validated job into `writer`.
    async fn run_job(
        &self,
        options: GenerationOptions,
        mut writer: Box<dyn TileWriter>,
        progress: Option<Arc<dyn ProgressSink>>,
        cancellation: CancellationToken,
    ) -> Result<GenerationResult, GenerationError> {
        let ctx = JobContext::new(cancellation);
        let _active = self.claim(ctx.clone())?;

        let renderer = self.factory.create(&options.layers)?;
        let region = Arc::new(options.region.clone());
        let counted =
            count_total(&region, options.min_zoom, options.max_zoom, ctx.cancellation()).await?;
        let total = counted.unwrap_or_else(|| {
            info!("Cancelled while counting tiles");
            0
        });

        writer
            .initialize(&options.output)
            .map_err(GenerationError::WriterInit)?;
        let writer: Arc<dyn TileWriter> = Arc::from(writer);

        let workers = options.worker_count();
        info!(
            total,
            workers,
            format = %options.format,
            min_zoom = options.min_zoom,
            max_zoom = options.max_zoom,
            layers = options.layers.len(),
            output = %options.format.resolve_path(&options.output).display(),
            "Starting tile generation"
        );

        let started = Instant::now();
        let tracker = Arc::new(ProgressTracker::new(
            total,
            self.settings.progress_interval,
            progress,
        ));

        let (tile_tx, mut tile_rx) = mpsc::channel(workers * 2);
        let feeder = spawn_feeder(
            region,
            options.min_zoom,
            options.max_zoom,
            ctx.cancellation().clone(),
            tile_tx,
        );
        let mut pending = FuturesUnordered::new();
        let mut cancelled = false;

        'dispatch: loop {
            // Top up the window
            while pending.len() < workers {
                if !ctx.wait_until_runnable().await {
                    cancelled = true;
                    break 'dispatch;
                }
                let next = tokio::select! {
                    biased;

                    _ = ctx.cancellation().cancelled() => {
                        cancelled = true;
                        break 'dispatch;
                    }

                    next = tile_rx.recv() => next,
                };
                let Some(tile) = next else {
                    break;
                };
                pending.push(spawn_tile(
                    tile,
                    Arc::clone(&renderer),
                    Arc::clone(&writer),
                    Arc::clone(&tracker),
                ));
            }

            if pending.is_empty() {
                break;
            }

            tokio::select! {
                biased;

                _ = ctx.cancellation().cancelled() => {
                    cancelled = true;
                    break 'dispatch;
                }

                Some(joined) = pending.next() => {
                    handle_join(joined, &tracker);
                }
            }
        }

        // Unblocks a feeder parked on a full channel
        drop(tile_rx);
        if let Err(e) = feeder.await {
            warn!(error = %e, "Tile feeder aborted");
        }

        if cancelled {
            info!(
                in_flight = pending.len(),
                completed = tracker.completed(),
                "Generation cancelled, draining in-flight tiles"
            );
        }
        while let Some(joined) = pending.next().await {
            handle_join(joined, &tracker);
        }

        tracker.report_final();
        let duration = started.elapsed();

        if let Err(e) = writer.finalize() {
            error!(error = %e, "Failed to finalize output");
            return Err(GenerationError::Finalize(e));
        }

        let completed = tracker.completed();
        let failed = tracker.failed();

        if cancelled {
            return Err(GenerationError::Cancelled { completed, failed });
        }

        info!(
            total,
            completed,
            failed,
            elapsed_ms = duration.as_millis() as u64,
            "Tile generation complete"
        );

        Ok(GenerationResult {
            success: true,
            total_tiles: total,
            completed_tiles: completed,
            failed_tiles: failed,
            duration,
        })
    }

    fn claim(&self, ctx: JobContext) -> Result<ActiveJob<'_>, GenerationError> {
        let mut slot = self.active.lock();
        if slot.is_some() {
            return Err(GenerationError::AlreadyRunning);
        }
        *slot = Some(ctx);
        Ok(ActiveJob { slot: &self.active })
    }
}

/// True when `path` is a file or a non-empty directory.
fn output_in_use(path: &Path) -> bool {
    if path.is_dir() {
        return std::fs::read_dir(path)
            .map(|mut entries| entries.next().is_some())
            .unwrap_or(false);
    }
    path.exists()
}

/// Tile total for progress reporting, or `None` if the job was cancelled first.
async fn count_total(
    region: &Arc<Region>,
    min_zoom: u8,
    max_zoom: u8,
    cancellation: &CancellationToken,
) -> Result<Option<u64>, GenerationError> {
    if let Region::Bbox(_) = region.as_ref() {
        return Ok(Some(region.tile_count(min_zoom, max_zoom)));
    }

    let counting = {
        let region = Arc::clone(region);
        let token = cancellation.clone();
        tokio::task::spawn_blocking(move || {
            region.tile_count_until(min_zoom, max_zoom, || token.is_cancelled())
        })
    };

    tokio::select! {
        biased;

        _ = cancellation.cancelled() => Ok(None),

        joined = counting => joined.map_err(|e| GenerationError::Worker(e.to_string())),
    }
}

/// Walk the region on a blocking thread and send its tiles to `tx`.
///
/// Cancellation is checked before every candidate tile. Returns when the
/// walk ends, the job is cancelled or the receiver is dropped.
fn spawn_feeder(
    region: Arc<Region>,
    min_zoom: u8,
    max_zoom: u8,
    cancellation: CancellationToken,
    tx: mpsc::Sender<TileIndex>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || {
        for zoom in min_zoom..=max_zoom {
            for tile in region.candidates(zoom) {
                if cancellation.is_cancelled() {
                    return;
                }
                if region.covers(tile) && tx.blocking_send(tile).is_err() {
                    return;
                }
            }
        }
    })
}

fn spawn_tile(
    tile: TileIndex,
    renderer: Arc<dyn TileRenderer>,
    writer: Arc<dyn TileWriter>,
    tracker: Arc<ProgressTracker>,
) -> JoinHandle<()> {
    tokio::task::spawn_blocking(move || match process_tile(tile, &*renderer, &*writer) {
        Ok(written) => {
            debug!(tile = %tile, written, "Tile processed");
            tracker.record_success();
        }
        Err(e) => {
            warn!(tile = %tile, error = %e, "Tile failed");
            tracker.record_failure();
        }
    })
}

/// Render one tile and store it when there is something to store.
fn process_tile(
    tile: TileIndex,
    renderer: &dyn TileRenderer,
    writer: &dyn TileWriter,
) -> Result<bool, TileFailure> {
    match renderer.render(tile)? {
        Some(data) if !data.is_empty() => {
            writer.write_tile(tile, &data)?;
            Ok(true)
        }
        _ => Ok(false),
    }
}

fn handle_join(joined: Result<(), tokio::task::JoinError>, tracker: &ProgressTracker) {
    if let Err(e) = joined {
        // The task panicked before it could record its outcome
        warn!(error = %e, "Tile task aborted");
        tracker.record_failure();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::coord::BoundingBox;
    use crate::generation::GenerationProgress;
    use crate::output::OutputFormat;
    use crate::style::LayerConfig;
    use geo::{polygon, MultiPolygon};
    use std::collections::HashSet;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    /// Renderer with a fixed delay that fails on selected tiles.
    struct MockRenderer {
        delay: Duration,
        fail: HashSet<TileIndex>,
        empty: HashSet<TileIndex>,
        blank: HashSet<TileIndex>,
    }

    impl MockRenderer {
        fn new() -> Self {
            Self {
                delay: Duration::ZERO,
                fail: HashSet::new(),
                empty: HashSet::new(),
                blank: HashSet::new(),
            }
        }
    }

    impl TileRenderer for MockRenderer {
        fn render(&self, tile: TileIndex) -> Result<Option<Vec<u8>>, RenderError> {
            if !self.delay.is_zero() {
                std::thread::sleep(self.delay);
            }
            if self.fail.contains(&tile) {
                return Err(RenderError::Failed(format!("boom at {tile}")));
            }
            if self.empty.contains(&tile) {
                return Ok(None);
            }
            if self.blank.contains(&tile) {
                return Ok(Some(Vec::new()));
            }
            Ok(Some(tile.to_string().into_bytes()))
        }
    }

    struct MockFactory {
        renderer: Arc<MockRenderer>,
    }

    impl RendererFactory for MockFactory {
        fn create(&self, _layers: &[LayerConfig]) -> Result<Arc<dyn TileRenderer>, RenderError> {
            Ok(self.renderer.clone())
        }
    }

    /// Writer that only records what reaches it.
    #[derive(Default)]
    struct CountingWriter {
        written: Arc<Mutex<Vec<TileIndex>>>,
        finalized: Arc<AtomicBool>,
    }

    impl TileWriter for CountingWriter {
        fn initialize(&mut self, _output: &Path) -> Result<(), WriterError> {
            Ok(())
        }

        fn write_tile(&self, tile: TileIndex, _data: &[u8]) -> Result<(), WriterError> {
            self.written.lock().push(tile);
            Ok(())
        }

        fn finalize(&self) -> Result<(), WriterError> {
            self.finalized.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Two specks in opposite corners of the world: the envelope spans
    /// every tile while almost none intersect.
    fn sparse_corners() -> Region {
        Region::Polygon(MultiPolygon(vec![
            polygon![
                (x: -179.9, y: -84.9),
                (x: -179.8, y: -84.9),
                (x: -179.8, y: -84.8),
                (x: -179.9, y: -84.9),
            ],
            polygon![
                (x: 179.8, y: 84.8),
                (x: 179.9, y: 84.8),
                (x: 179.9, y: 84.9),
                (x: 179.8, y: 84.8),
            ],
        ]))
    }

    fn service(renderer: MockRenderer) -> TileGenerationService {
        TileGenerationService::new(Arc::new(MockFactory {
            renderer: Arc::new(renderer),
        }))
    }

    fn world(dir: &TempDir, max_zoom: u8) -> GenerationOptions {
        GenerationOptions::new(
            dir.path().join("tiles"),
            Region::Bbox(BoundingBox::new(-180.0, -85.0, 180.0, 85.0)),
        )
        .with_zoom_range(0, max_zoom)
        .with_threads(4)
    }

    #[tokio::test]
    async fn test_generates_every_tile() {
        let dir = TempDir::new().unwrap();
        let result = service(MockRenderer::new())
            .generate(world(&dir, 2), None, CancellationToken::new())
            .await
            .unwrap();

        assert!(result.success);
        assert_eq!(result.total_tiles, 21);
        assert_eq!(result.completed_tiles, 21);
        assert_eq!(result.failed_tiles, 0);
        assert_eq!(
            std::fs::read(dir.path().join("tiles/2/3/1.png")).unwrap(),
            b"2/3/1"
        );
    }

    #[tokio::test]
    async fn test_failures_counted_and_empty_tiles_skipped() {
        let dir = TempDir::new().unwrap();
        let mut renderer = MockRenderer::new();
        renderer.fail.insert(TileIndex::new(1, 0, 0));
        renderer.fail.insert(TileIndex::new(1, 1, 1));
        renderer.empty.insert(TileIndex::new(0, 0, 0));

        let result = service(renderer)
            .generate(world(&dir, 1), None, CancellationToken::new())
            .await
            .unwrap();

        assert_eq!(result.total_tiles, 5);
        assert_eq!(result.completed_tiles, 3);
        assert_eq!(result.failed_tiles, 2);
        assert!(!dir.path().join("tiles/0/0/0.png").exists());
        assert!(!dir.path().join("tiles/1/0/0.png").exists());
        assert!(dir.path().join("tiles/1/1/0.png").exists());
    }

    #[tokio::test]
    async fn test_empty_tiles_complete_without_reaching_writer() {
        let dir = TempDir::new().unwrap();
        let mut renderer = MockRenderer::new();
        renderer.empty.insert(TileIndex::new(0, 0, 0));
        renderer.empty.insert(TileIndex::new(1, 0, 1));
        renderer.blank.insert(TileIndex::new(1, 1, 0));

        let writer = CountingWriter::default();
        let written = Arc::clone(&writer.written);
        let finalized = Arc::clone(&writer.finalized);

        let result = service(renderer)
            .run_job(
                world(&dir, 1),
                Box::new(writer),
                None,
                CancellationToken::new(),
            )
            .await
            .unwrap();

        assert_eq!(result.total_tiles, 5);
        assert_eq!(result.completed_tiles, 5);
        assert_eq!(result.failed_tiles, 0);

        let mut written = written.lock().clone();
        written.sort_by_key(|t| (t.z, t.x, t.y));
        assert_eq!(
            written,
            vec![TileIndex::new(1, 0, 0), TileIndex::new(1, 1, 1)]
        );
        assert!(finalized.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_cancel_during_polygon_count() {
        let dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        let cancel_later = token.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(20)).await;
            cancel_later.cancel();
        });

        // Billions of candidates at z16, far more than finishes in the timeout
        let options = GenerationOptions::new(dir.path().join("tiles"), sparse_corners())
            .with_zoom_range(0, 16)
            .with_threads(2);
        let svc = service(MockRenderer::new());

        let err = tokio::time::timeout(Duration::from_secs(5), svc.generate(options, None, token))
            .await
            .expect("count ignored cancellation")
            .unwrap_err();

        assert!(matches!(
            err,
            GenerationError::Cancelled {
                completed: 0,
                failed: 0
            }
        ));
        assert!(!svc.is_running());
    }

    #[tokio::test]
    async fn test_feeder_stops_mid_scan_on_cancel() {
        let token = CancellationToken::new();
        let (tx, mut rx) = mpsc::channel(4);
        let feeder = spawn_feeder(Arc::new(sparse_corners()), 0, 16, token.clone(), tx);

        // Both specks share the single z0 tile
        assert_eq!(rx.recv().await, Some(TileIndex::new(0, 0, 0)));

        // Deep zooms scan millions of empty candidates between the two hits
        tokio::time::sleep(Duration::from_millis(20)).await;
        token.cancel();

        let drained = tokio::time::timeout(Duration::from_secs(5), async {
            let mut rest = Vec::new();
            while let Some(tile) = rx.recv().await {
                rest.push(tile);
            }
            rest
        })
        .await
        .expect("feeder ignored cancellation");

        let region = sparse_corners();
        assert!(drained.iter().all(|t| region.covers(*t)));
        feeder.await.unwrap();
    }

    #[tokio::test]
    async fn test_cancel_before_start() {
        let dir = TempDir::new().unwrap();
        let token = CancellationToken::new();
        token.cancel();

        let options = GenerationOptions::new(
            dir.path().join("out"),
            Region::Bbox(BoundingBox::new(124.0, 33.0, 132.0, 43.0)),
        )
        .with_zoom_range(0, 2)
        .with_format(OutputFormat::Mbtiles);

        let svc = service(MockRenderer::new());
        let err = svc.generate(options, None, token).await.unwrap_err();

        assert!(matches!(
            err,
            GenerationError::Cancelled {
                completed: 0,
                failed: 0
            }
        ));
        // Writer was still finalized
        assert!(dir.path().join("out.mbtiles").exists());
        assert!(!svc.is_running());
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_cancel_mid_job_drains_in_flight() {
        let dir = TempDir::new().unwrap();
        let mut renderer = MockRenderer::new();
        renderer.delay = Duration::from_millis(5);

        let token = CancellationToken::new();
        let cancel_at = token.clone();
        let sink: Arc<dyn ProgressSink> = Arc::new(move |p: GenerationProgress| {
            if p.completed >= 10 {
                cancel_at.cancel();
            }
        });

        let err = service(renderer)
            .generate(world(&dir, 4).with_threads(2), Some(sink), token)
            .await
            .unwrap_err();

        let GenerationError::Cancelled { completed, failed } = err else {
            panic!("expected cancellation, got {err:?}");
        };
        assert!(completed >= 10);
        assert!(completed < 341);
        assert_eq!(failed, 0);

        let written = walk_png_count(&dir.path().join("tiles"));
        assert_eq!(written as u64, completed);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_pause_freezes_progress_until_resume() {
        let dir = TempDir::new().unwrap();
        let mut renderer = MockRenderer::new();
        renderer.delay = Duration::from_millis(10);

        let svc = Arc::new(
            service(renderer).with_settings(GenerationSettings {
                progress_interval: 1,
            }),
        );
        let latest = Arc::new(Mutex::new(0u64));
        let sink_latest = Arc::clone(&latest);
        let sink: Arc<dyn ProgressSink> =
            Arc::new(move |p: GenerationProgress| *sink_latest.lock() = p.completed);

        let job = {
            let svc = Arc::clone(&svc);
            let options = world(&dir, 3).with_threads(1);
            tokio::spawn(async move {
                svc.generate(options, Some(sink), CancellationToken::new())
                    .await
            })
        };

        while *latest.lock() < 3 {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
        svc.pause();
        assert!(svc.is_paused());

        // Let the in-flight tile finish, then the count must hold still
        tokio::time::sleep(Duration::from_millis(50)).await;
        let frozen = *latest.lock();
        tokio::time::sleep(Duration::from_millis(100)).await;
        assert_eq!(*latest.lock(), frozen);
        assert!(frozen < 85);

        svc.resume();
        let result = job.await.unwrap().unwrap();
        assert_eq!(result.completed_tiles, 85);
        assert!(!svc.is_running());
    }

    #[tokio::test]
    async fn test_pause_without_job_is_noop() {
        let svc = service(MockRenderer::new());
        svc.pause();
        svc.resume();
        assert!(!svc.is_running());
        assert!(!svc.is_paused());

        // A later job starts with an open gate
        let dir = TempDir::new().unwrap();
        let result = svc
            .generate(world(&dir, 0), None, CancellationToken::new())
            .await
            .unwrap();
        assert_eq!(result.completed_tiles, 1);
    }

    #[tokio::test]
    async fn test_existing_output_requires_overwrite() {
        let dir = TempDir::new().unwrap();
        let svc = service(MockRenderer::new());

        svc.generate(world(&dir, 0), None, CancellationToken::new())
            .await
            .unwrap();

        let err = svc
            .generate(world(&dir, 0), None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::OutputExists(_)));

        let result = svc
            .generate(
                world(&dir, 0).with_overwrite(true),
                None,
                CancellationToken::new(),
            )
            .await
            .unwrap();
        assert_eq!(result.completed_tiles, 1);
    }

    #[tokio::test]
    async fn test_invalid_options_rejected_before_output_touched() {
        let dir = TempDir::new().unwrap();
        let options = world(&dir, 2).with_zoom_range(3, 1);

        let err = service(MockRenderer::new())
            .generate(options, None, CancellationToken::new())
            .await
            .unwrap_err();
        assert!(matches!(err, GenerationError::InvalidOptions(_)));
        assert!(!dir.path().join("tiles").exists());
    }

    #[tokio::test]
    async fn test_final_report_always_sent() {
        let dir = TempDir::new().unwrap();
        let reports = Arc::new(Mutex::new(Vec::new()));
        let sink_reports = Arc::clone(&reports);
        let sink: Arc<dyn ProgressSink> =
            Arc::new(move |p: GenerationProgress| sink_reports.lock().push(p));

        let mut renderer = MockRenderer::new();
        renderer.fail.insert(TileIndex::new(0, 0, 0));

        service(renderer)
            .generate(world(&dir, 0), Some(sink), CancellationToken::new())
            .await
            .unwrap();

        let reports = reports.lock();
        let last = reports.last().unwrap();
        assert_eq!(last.completed, 0);
        assert_eq!(last.failed, 1);
        assert_eq!(last.total, 1);
    }

    fn walk_png_count(root: &Path) -> usize {
        let mut count = 0;
        let mut stack = vec![root.to_path_buf()];
        while let Some(dir) = stack.pop() {
            for entry in std::fs::read_dir(dir).unwrap() {
                let path = entry.unwrap().path();
                if path.is_dir() {
                    stack.push(path);
                } else if path.extension().is_some_and(|e| e == "png") {
                    count += 1;
                }
            }
        }
        count
    }
}
