//! Background retrieval of segment metadata for the current query window.
//!
//! Metadata lives in the source file and is expensive to parse, so it is retrieved on a separate thread.
//! Each window gets its own task, and scheduling a new window cancels the previous task.
//! The results go to a cache shared with the owner of the fetcher.

use crate::subgraph::SegmentMetadata;

use rustc_hash::FxHashMap;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};

use log::{debug, warn};

//-----------------------------------------------------------------------------

/// A source of segment metadata, usually a parser over the source file.
pub trait MetadataSource: Send + Sync {
    /// Returns the metadata for the given node.
    ///
    /// # Arguments
    ///
    /// * `node`: Global node identifier.
    /// * `file_offset`: Byte offset of the node in the source file, as stored in the [`crate::CompactGraph`].
    ///
    /// # Errors
    ///
    /// Returns an error message if the metadata cannot be retrieved or parsed.
    fn segment_metadata(&self, node: usize, file_offset: Option<u64>) -> Result<SegmentMetadata, String>;
}

/// Metadata cache shared between a [`MetadataFetcher`] and its tasks.
pub type MetadataCache = Arc<Mutex<FxHashMap<usize, SegmentMetadata>>>;

/// Statistics for a finished retrieval task.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct FetchSummary {
    /// Nodes retrieved and inserted into the cache.
    pub fetched: usize,
    /// Nodes that were already in the cache.
    pub skipped: usize,
    /// Nodes for which retrieval failed.
    pub failed: usize,
    /// The task was cancelled before it processed every node.
    pub cancelled: bool,
}

struct FetchTask {
    cancel: Arc<AtomicBool>,
    handle: JoinHandle<FetchSummary>,
}

//-----------------------------------------------------------------------------

/// Cancellable background retrieval of segment metadata.
///
/// Failures for individual nodes are logged and skipped; the affected nodes simply stay absent from the cache.
///
/// # Examples
///
/// ```
/// use seqgraph_view::metadata::{MetadataFetcher, MetadataSource};
/// use seqgraph_view::subgraph::SegmentMetadata;
/// use std::collections::BTreeSet;
/// use std::sync::Arc;
///
/// struct Everyone;
///
/// impl MetadataSource for Everyone {
///     fn segment_metadata(&self, _: usize, _: Option<u64>) -> Result<SegmentMetadata, String> {
///         Ok(SegmentMetadata::new(BTreeSet::from([String::from("GRCh38")])))
///     }
/// }
///
/// let mut fetcher = MetadataFetcher::new(Arc::new(Everyone));
/// fetcher.schedule(vec![(1, Some(0)), (2, Some(100))]);
/// let summary = fetcher.wait().unwrap();
/// assert_eq!(summary.fetched, 2);
/// assert_eq!(fetcher.get(2).unwrap().genome_count(), 1);
/// ```
pub struct MetadataFetcher {
    source: Arc<dyn MetadataSource>,
    cache: MetadataCache,
    current: Option<FetchTask>,
}

impl MetadataFetcher {
    /// Creates a fetcher with an empty cache.
    pub fn new(source: Arc<dyn MetadataSource>) -> Self {
        MetadataFetcher {
            source,
            cache: Arc::new(Mutex::new(FxHashMap::default())),
            current: None,
        }
    }

    /// Starts retrieving metadata for the given `(node, file offset)` pairs.
    ///
    /// Cancels the previous task without waiting for it.
    /// Nodes that are already in the cache are skipped.
    pub fn schedule(&mut self, nodes: Vec<(usize, Option<u64>)>) {
        self.cancel();
        let cancel = Arc::new(AtomicBool::new(false));
        let flag = cancel.clone();
        let source = self.source.clone();
        let cache = self.cache.clone();
        let handle = thread::spawn(move || {
            let mut summary = FetchSummary::default();
            for (node, file_offset) in nodes {
                if flag.load(Ordering::Relaxed) {
                    summary.cancelled = true;
                    break;
                }
                if lock(&cache).contains_key(&node) {
                    summary.skipped += 1;
                    continue;
                }
                match source.segment_metadata(node, file_offset) {
                    Ok(metadata) => {
                        lock(&cache).insert(node, metadata);
                        summary.fetched += 1;
                    },
                    Err(message) => {
                        warn!("Failed to retrieve metadata for node {}: {}", node, message);
                        summary.failed += 1;
                    },
                }
            }
            debug!(
                "Metadata task: {} fetched, {} skipped, {} failed{}",
                summary.fetched, summary.skipped, summary.failed, if summary.cancelled { ", cancelled" } else { "" }
            );
            summary
        });
        self.current = Some(FetchTask { cancel, handle });
    }

    /// Cancels the current task, if any.
    pub fn cancel(&mut self) {
        if let Some(task) = self.current.take() {
            task.cancel.store(true, Ordering::Relaxed);
        }
    }

    /// Waits for the current task to finish and returns its summary.
    ///
    /// Returns [`None`] if there is no task or the task panicked.
    pub fn wait(&mut self) -> Option<FetchSummary> {
        let task = self.current.take()?;
        task.handle.join().ok()
    }

    /// Returns `true` if a task has been scheduled and it is still running.
    pub fn is_running(&self) -> bool {
        self.current.as_ref().is_some_and(|task| !task.handle.is_finished())
    }

    /// Returns the cached metadata for the node.
    pub fn get(&self, node: usize) -> Option<SegmentMetadata> {
        lock(&self.cache).get(&node).cloned()
    }

    /// Returns the number of nodes in the cache.
    pub fn cached_count(&self) -> usize {
        lock(&self.cache).len()
    }

    /// Returns a handle to the shared cache.
    pub fn cache(&self) -> MetadataCache {
        self.cache.clone()
    }
}

impl Drop for MetadataFetcher {
    fn drop(&mut self) {
        self.cancel();
    }
}

// A panicking source cannot leave the map in an inconsistent state.
fn lock(cache: &MetadataCache) -> MutexGuard<'_, FxHashMap<usize, SegmentMetadata>> {
    cache.lock().unwrap_or_else(PoisonError::into_inner)
}

//-----------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    use crate::internal;

    use std::sync::atomic::AtomicUsize;
    use std::sync::mpsc;
    use std::time::Duration;

    // Returns genome `G<node>` for every node, except that odd offsets fail.
    struct TestSource {
        calls: AtomicUsize,
    }

    impl MetadataSource for TestSource {
        fn segment_metadata(&self, node: usize, file_offset: Option<u64>) -> Result<SegmentMetadata, String> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            match file_offset {
                Some(offset) if offset % 2 == 1 => Err(format!("Invalid record at offset {}", offset)),
                _ => Ok(internal::metadata(&[format!("G{}", node).as_str()])),
            }
        }
    }

    // Blocks on every call until the test releases it.
    struct BlockingSource {
        release: Mutex<mpsc::Receiver<()>>,
    }

    impl MetadataSource for BlockingSource {
        fn segment_metadata(&self, node: usize, _: Option<u64>) -> Result<SegmentMetadata, String> {
            let _ = lock_receiver(&self.release).recv_timeout(Duration::from_secs(5));
            Ok(internal::metadata(&[format!("G{}", node).as_str()]))
        }
    }

    fn lock_receiver(receiver: &Mutex<mpsc::Receiver<()>>) -> MutexGuard<'_, mpsc::Receiver<()>> {
        receiver.lock().unwrap()
    }

    #[test]
    fn fetch_and_skip() {
        internal::init_logger();
        let source = Arc::new(TestSource { calls: AtomicUsize::new(0) });
        let mut fetcher = MetadataFetcher::new(source.clone());
        fetcher.schedule(vec![(1, Some(0)), (2, Some(2))]);
        let summary = fetcher.wait();
        assert_eq!(summary, Some(FetchSummary { fetched: 2, ..FetchSummary::default() }), "Wrong summary for the first window");

        // Node 2 is already cached.
        fetcher.schedule(vec![(2, Some(2)), (3, Some(4))]);
        let summary = fetcher.wait();
        assert_eq!(summary, Some(FetchSummary { fetched: 1, skipped: 1, ..FetchSummary::default() }), "Wrong summary for the second window");
        assert_eq!(source.calls.load(Ordering::SeqCst), 3, "Cached node was retrieved again");
        assert_eq!(fetcher.cached_count(), 3, "Wrong number of cached nodes");
        assert_eq!(fetcher.get(3), Some(internal::metadata(&["G3"])), "Wrong metadata for node 3");
    }

    #[test]
    fn failures_are_skipped() {
        internal::init_logger();
        let source = Arc::new(TestSource { calls: AtomicUsize::new(0) });
        let mut fetcher = MetadataFetcher::new(source);
        fetcher.schedule(vec![(1, Some(0)), (2, Some(3)), (3, Some(4))]);
        let summary = fetcher.wait().unwrap();
        assert_eq!(summary.failed, 1, "Wrong number of failures");
        assert_eq!(summary.fetched, 2, "A failure stopped the task");
        assert!(fetcher.get(2).is_none(), "Failed node has metadata");
        assert!(fetcher.get(3).is_some(), "Node after the failure has no metadata");
    }

    #[test]
    fn new_window_cancels_previous() {
        let (release, receiver) = mpsc::channel();
        let source = Arc::new(BlockingSource { release: Mutex::new(receiver) });
        let mut fetcher = MetadataFetcher::new(source);
        fetcher.schedule((1..=100).map(|node| (node, None)).collect());

        // The first task is blocked in its first call; cancel it and release it.
        fetcher.schedule(vec![(1000, None)]);
        for _ in 0..2 {
            let _ = release.send(());
        }
        let summary = fetcher.wait();
        assert!(summary.is_some(), "The second task did not finish");
        assert!(fetcher.get(1000).is_some(), "The second window was not fetched");

        // Further calls return immediately, so a task that ignored cancellation would fill the cache.
        drop(release);
        thread::sleep(Duration::from_millis(50));
        assert!(fetcher.cached_count() <= 2, "The cancelled task kept fetching");
        assert!(!fetcher.is_running(), "A task is still registered");
    }
}

//-----------------------------------------------------------------------------
