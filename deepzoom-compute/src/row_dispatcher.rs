//! Row-granular work distribution across a fixed pool of worker threads.
//!
//! Workers claim rows from a shared counter under one mutex, render each row
//! into a private scratch buffer and send it back over a channel. The owner
//! drains finished rows into its `PixelBuffer`, so pixel memory is never
//! shared between threads.

use deepzoom_core::{EngineError, PixelBuffer, BYTES_PER_PIXEL};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};

/// Renders a single image row. Shared read-only by every worker.
pub trait RowSource: Send + Sync + 'static {
    /// Fill `out` (`width * 4` bytes, RGBA8) with row `y` of a `width x height` image.
    fn render_row(&self, y: u32, width: u32, height: u32, out: &mut [u8]);
}

/// A finished row sent from a worker to the dispatcher owner.
#[derive(Debug)]
pub struct RowResult {
    pub y: u32,
    pub pixels: Vec<u8>,
}

/// Snapshot returned by progress polling.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RenderProgress {
    pub done: bool,
    /// Fraction of rows claimed, in `0.0..=1.0`.
    pub progress: f64,
}

impl RenderProgress {
    pub const IDLE: RenderProgress = RenderProgress {
        done: false,
        progress: 0.0,
    };
}

#[derive(Debug, Default)]
struct RowClaims {
    next_row: u32,
    cancelled: bool,
}

/// Shared state of one dispatch session.
struct RenderJob<S> {
    claims: Mutex<RowClaims>,
    source: S,
    width: u32,
    height: u32,
    thread_count: u32,
}

impl<S> RenderJob<S> {
    /// Claim the next row, reading the cancel flag under the same lock.
    ///
    /// Every call advances `next_row`, including the final one each worker
    /// makes on its way out.
    fn claim(&self) -> (u32, bool) {
        let mut claims = self.claims.lock().unwrap_or_else(PoisonError::into_inner);
        let row = claims.next_row;
        claims.next_row = claims.next_row.saturating_add(1);
        (row, claims.cancelled)
    }

    fn next_row(&self) -> u32 {
        self.claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .next_row
    }
}

fn worker_loop<S: RowSource>(job: Arc<RenderJob<S>>, tx: Sender<RowResult>) {
    let stride = job.width as usize * BYTES_PER_PIXEL;
    loop {
        let (y, cancelled) = job.claim();
        if cancelled || y >= job.height {
            break;
        }
        let mut pixels = vec![0u8; stride];
        job.source.render_row(y, job.width, job.height, &mut pixels);
        if tx.send(RowResult { y, pixels }).is_err() {
            break;
        }
    }
}

/// One running dispatch session.
///
/// Dropping the dispatcher cancels it and joins every worker.
pub struct RowDispatcher<S: RowSource> {
    job: Arc<RenderJob<S>>,
    workers: Vec<JoinHandle<()>>,
    rows: Receiver<RowResult>,
}

impl<S: RowSource> RowDispatcher<S> {
    /// Spawn `thread_count` workers (at least one) over a `width x height` image.
    pub fn start(source: S, width: u32, height: u32, thread_count: u32) -> Result<Self, EngineError> {
        let thread_count = thread_count.max(1);
        let job = Arc::new(RenderJob {
            claims: Mutex::new(RowClaims::default()),
            source,
            width,
            height,
            thread_count,
        });
        let (tx, rows) = mpsc::channel();

        let mut dispatcher = Self {
            job,
            workers: Vec::with_capacity(thread_count as usize),
            rows,
        };

        for i in 0..thread_count {
            let job = Arc::clone(&dispatcher.job);
            let tx = tx.clone();
            let spawned = thread::Builder::new()
                .name(format!("deepzoom-row-{}", i))
                .spawn(move || worker_loop(job, tx));
            match spawned {
                Ok(handle) => dispatcher.workers.push(handle),
                Err(e) => {
                    log::error!("Failed to spawn render worker {}: {}", i, e);
                    // Drop cancels and joins whatever did start
                    return Err(EngineError::Spawn(e));
                }
            }
        }

        log::debug!(
            "Dispatching {} rows of {} px to {} workers",
            height,
            width,
            thread_count
        );
        Ok(dispatcher)
    }

    pub fn width(&self) -> u32 {
        self.job.width
    }

    pub fn height(&self) -> u32 {
        self.job.height
    }

    pub fn thread_count(&self) -> u32 {
        self.job.thread_count
    }

    /// True once every worker has made its final, empty claim.
    pub fn is_done(&self) -> bool {
        self.job.next_row() == self.job.height.saturating_add(self.job.thread_count)
    }

    pub fn progress(&self) -> RenderProgress {
        let next_row = self.job.next_row();
        let done = next_row == self.job.height.saturating_add(self.job.thread_count);
        let progress = if self.job.height == 0 {
            1.0
        } else {
            (next_row as f64 / self.job.height as f64).min(1.0)
        };
        RenderProgress { done, progress }
    }

    /// Ask workers to stop at their next claim.
    ///
    /// Returns the number of rows claimed before cancellation; rows at or past
    /// that index are never rendered.
    pub fn cancel(&self) -> u32 {
        let mut claims = self
            .job
            .claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        claims.cancelled = true;
        claims.next_row.min(self.job.height)
    }

    pub fn is_cancelled(&self) -> bool {
        self.job
            .claims
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .cancelled
    }

    /// True when no worker thread is still running.
    pub fn workers_exited(&self) -> bool {
        self.workers.iter().all(|handle| handle.is_finished())
    }

    /// Copy every row received so far into `buffer`. Returns the row count.
    pub fn drain_into(&self, buffer: &mut PixelBuffer) -> usize {
        let mut count = 0;
        for row in self.rows.try_iter() {
            if row.y < buffer.height() && row.pixels.len() == buffer.row_stride() {
                buffer.write_row(row.y, &row.pixels);
                count += 1;
            }
        }
        count
    }

    /// Block until every worker has exited.
    pub fn join(&mut self) -> Result<(), EngineError> {
        let mut panicked = false;
        for handle in self.workers.drain(..) {
            if handle.join().is_err() {
                panicked = true;
            }
        }
        if panicked {
            log::error!("A render worker panicked");
            return Err(EngineError::WorkerPanicked);
        }
        Ok(())
    }
}

impl<S: RowSource> Drop for RowDispatcher<S> {
    fn drop(&mut self) {
        if self.workers.is_empty() {
            return;
        }
        self.cancel();
        if let Err(e) = self.join() {
            log::warn!("Render session dropped with error: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use deepzoom_core::Rgba;
    use std::sync::atomic::{AtomicU32, Ordering};
    use std::time::Duration;

    const MAGENTA: Rgba = [255, 0, 255, 255];
    const WHITE: Rgba = [255, 255, 255, 255];

    /// Paints rows white and counts how often each row was rendered.
    struct CountingSource {
        calls: Arc<Vec<AtomicU32>>,
        delay: Duration,
    }

    impl CountingSource {
        fn new(height: u32, delay: Duration) -> (Self, Arc<Vec<AtomicU32>>) {
            let calls: Arc<Vec<AtomicU32>> =
                Arc::new((0..height).map(|_| AtomicU32::new(0)).collect());
            (
                Self {
                    calls: Arc::clone(&calls),
                    delay,
                },
                calls,
            )
        }
    }

    impl RowSource for CountingSource {
        fn render_row(&self, y: u32, _width: u32, _height: u32, out: &mut [u8]) {
            if !self.delay.is_zero() {
                thread::sleep(self.delay);
            }
            self.calls[y as usize].fetch_add(1, Ordering::SeqCst);
            for px in out.chunks_exact_mut(BYTES_PER_PIXEL) {
                px.copy_from_slice(&WHITE);
            }
        }
    }

    struct PanickingSource;

    impl RowSource for PanickingSource {
        fn render_row(&self, y: u32, _width: u32, _height: u32, _out: &mut [u8]) {
            if y == 3 {
                panic!("row 3 is cursed");
            }
        }
    }

    fn wait_until_done<S: RowSource>(dispatcher: &RowDispatcher<S>, buffer: &mut PixelBuffer) {
        while !dispatcher.is_done() {
            dispatcher.drain_into(buffer);
            thread::sleep(Duration::from_millis(1));
        }
        dispatcher.drain_into(buffer);
    }

    #[test]
    fn every_row_rendered_exactly_once() {
        let (width, height) = (16, 97);
        let (source, calls) = CountingSource::new(height, Duration::ZERO);
        let mut buffer = PixelBuffer::new(width, height, MAGENTA).unwrap();
        let mut dispatcher = RowDispatcher::start(source, width, height, 4).unwrap();

        wait_until_done(&dispatcher, &mut buffer);
        dispatcher.join().unwrap();
        dispatcher.drain_into(&mut buffer);

        for (y, count) in calls.iter().enumerate() {
            assert_eq!(count.load(Ordering::SeqCst), 1, "row {} rendered", y);
        }
        assert!(buffer.as_bytes().chunks(4).all(|px| px == WHITE));
    }

    #[test]
    fn done_waits_for_every_worker_claim() {
        let (source, _calls) = CountingSource::new(10, Duration::ZERO);
        let mut buffer = PixelBuffer::new(4, 10, MAGENTA).unwrap();
        let mut dispatcher = RowDispatcher::start(source, 4, 10, 3).unwrap();

        wait_until_done(&dispatcher, &mut buffer);
        assert_eq!(dispatcher.job.next_row(), 10 + 3);
        dispatcher.join().unwrap();
        assert!(dispatcher.workers_exited());
    }

    #[test]
    fn cancel_leaves_unclaimed_rows_untouched() {
        let (width, height) = (100, 100);
        let (source, calls) = CountingSource::new(height, Duration::from_millis(10));
        let mut buffer = PixelBuffer::new(width, height, MAGENTA).unwrap();
        let mut dispatcher = RowDispatcher::start(source, width, height, 2).unwrap();

        while dispatcher.progress().progress < 0.5 {
            thread::sleep(Duration::from_millis(1));
        }
        let claimed = dispatcher.cancel();
        dispatcher.join().unwrap();
        dispatcher.drain_into(&mut buffer);

        assert!(claimed >= 50);
        assert!(claimed < height, "render finished before cancel");
        assert!(!dispatcher.is_done());
        for y in claimed..height {
            assert_eq!(calls[y as usize].load(Ordering::SeqCst), 0);
            assert!(
                buffer.row(y).chunks(4).all(|px| px == MAGENTA),
                "row {} was written after cancel",
                y
            );
        }
    }

    #[test]
    fn progress_is_monotonic_and_ends_at_one() {
        let (source, _calls) = CountingSource::new(40, Duration::from_millis(1));
        let mut buffer = PixelBuffer::new(8, 40, MAGENTA).unwrap();
        let dispatcher = RowDispatcher::start(source, 8, 40, 3).unwrap();

        let mut last = 0.0;
        loop {
            let progress = dispatcher.progress();
            assert!(progress.progress >= last);
            assert!(progress.progress <= 1.0);
            last = progress.progress;
            dispatcher.drain_into(&mut buffer);
            if progress.done {
                assert_eq!(progress.progress, 1.0);
                break;
            }
            thread::sleep(Duration::from_millis(1));
        }
    }

    #[test]
    fn zero_height_finishes_immediately() {
        let (source, _calls) = CountingSource::new(0, Duration::ZERO);
        let mut buffer = PixelBuffer::new(5, 0, MAGENTA).unwrap();
        let mut dispatcher = RowDispatcher::start(source, 5, 0, 4).unwrap();

        wait_until_done(&dispatcher, &mut buffer);
        assert_eq!(dispatcher.progress().progress, 1.0);
        dispatcher.join().unwrap();
    }

    #[test]
    fn zero_threads_runs_one_worker() {
        let (source, calls) = CountingSource::new(6, Duration::ZERO);
        let mut buffer = PixelBuffer::new(2, 6, MAGENTA).unwrap();
        let dispatcher = RowDispatcher::start(source, 2, 6, 0).unwrap();
        assert_eq!(dispatcher.thread_count(), 1);

        wait_until_done(&dispatcher, &mut buffer);
        assert!(calls.iter().all(|c| c.load(Ordering::SeqCst) == 1));
    }

    #[test]
    fn worker_panic_is_reported_on_join() {
        let mut dispatcher = RowDispatcher::start(PanickingSource, 1, 8, 1).unwrap();
        while !dispatcher.workers_exited() {
            thread::sleep(Duration::from_millis(1));
        }
        assert!(!dispatcher.is_done());
        assert!(matches!(dispatcher.join(), Err(EngineError::WorkerPanicked)));
    }

    #[test]
    fn drop_after_worker_panic_does_not_propagate() {
        let dispatcher = RowDispatcher::start(PanickingSource, 1, 8, 2).unwrap();
        while !dispatcher.workers_exited() {
            thread::sleep(Duration::from_millis(1));
        }
        let outcome = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| drop(dispatcher)));
        assert!(outcome.is_ok());
    }

    #[test]
    fn drop_cancels_running_session() {
        let (source, calls) = CountingSource::new(1000, Duration::from_millis(2));
        let dispatcher = RowDispatcher::start(source, 1, 1000, 2).unwrap();
        thread::sleep(Duration::from_millis(10));
        drop(dispatcher);

        let rendered: u32 = calls.iter().map(|c| c.load(Ordering::SeqCst)).sum();
        assert!(rendered < 1000);
        thread::sleep(Duration::from_millis(10));
        let after: u32 = calls.iter().map(|c| c.load(Ordering::SeqCst)).sum();
        assert_eq!(rendered, after);
    }
}
