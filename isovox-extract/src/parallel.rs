//! Thread pool management for slab-parallel extraction and slicing
//!
//! Work is split along one grid axis and each chunk is handed to a shared
//! rayon pool. Results are always collected in input order, so parallel and
//! serial runs produce identical output.

use isovox_core::{Error, Result};
use rayon::prelude::*;
use rayon::{ThreadPool, ThreadPoolBuilder};
use std::sync::{Arc, Mutex, OnceLock};

static GLOBAL_THREAD_POOL: OnceLock<Option<Arc<ThreadPool>>> = OnceLock::new();
static THREAD_POOL_CONFIG: Mutex<ThreadPoolConfig> = Mutex::new(ThreadPoolConfig::new());

const DEFAULT_STACK_SIZE: usize = 8 * 1024 * 1024;
const DEFAULT_THREAD_PREFIX: &str = "isovox";

/// Thread pool configuration for parallel processing
#[derive(Debug, Clone)]
pub struct ThreadPoolConfig {
    /// Number of threads to use (None = one per available core)
    pub num_threads: Option<usize>,
    /// Thread stack size in bytes
    pub stack_size: Option<usize>,
    /// Thread name prefix
    pub thread_name_prefix: String,
    /// Enable parallel processing (can be disabled for debugging)
    pub enabled: bool,
    /// Inputs shorter than this run on the calling thread
    pub min_parallel_len: usize,
}

impl ThreadPoolConfig {
    const fn new() -> Self {
        Self {
            num_threads: None,
            stack_size: None,
            thread_name_prefix: String::new(),
            enabled: true,
            min_parallel_len: 2,
        }
    }

    /// Set number of threads
    pub fn with_threads(mut self, num_threads: usize) -> Self {
        self.num_threads = Some(num_threads);
        self
    }

    /// Set stack size
    pub fn with_stack_size(mut self, stack_size: usize) -> Self {
        self.stack_size = Some(stack_size);
        self
    }

    /// Enable or disable parallel processing
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    pub fn with_min_parallel_len(mut self, len: usize) -> Self {
        self.min_parallel_len = len;
        self
    }
}

impl Default for ThreadPoolConfig {
    fn default() -> Self {
        Self {
            stack_size: Some(DEFAULT_STACK_SIZE),
            thread_name_prefix: DEFAULT_THREAD_PREFIX.to_string(),
            ..Self::new()
        }
    }
}

fn build_pool(config: &ThreadPoolConfig) -> Result<ThreadPool> {
    let mut builder = ThreadPoolBuilder::new();

    if let Some(num_threads) = config.num_threads {
        builder = builder.num_threads(num_threads);
    }

    if let Some(stack_size) = config.stack_size {
        builder = builder.stack_size(stack_size);
    }

    if !config.thread_name_prefix.is_empty() {
        let prefix = config.thread_name_prefix.clone();
        builder = builder.thread_name(move |index| format!("{}-{}", prefix, index));
    }

    builder
        .build()
        .map_err(|e| Error::Algorithm(format!("Failed to create thread pool: {}", e)))
}

/// Initialize the global thread pool with custom configuration
///
/// The pool itself can only be built once. Later calls still update the
/// `enabled` switch and the serial threshold.
pub fn init_thread_pool(config: ThreadPoolConfig) -> Result<()> {
    let mut result = Ok(());
    let mut fresh = false;

    GLOBAL_THREAD_POOL.get_or_init(|| {
        fresh = true;
        match build_pool(&config) {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                result = Err(e);
                None
            }
        }
    });

    if !fresh {
        log::warn!("Thread pool already initialized; only the enabled flag and threshold apply");
    }

    if let Ok(mut global_config) = THREAD_POOL_CONFIG.lock() {
        *global_config = config;
    }

    result
}

/// Get the global thread pool, building a default one on first use
///
/// Returns `None` when the pool could not be created; callers then run serially.
pub fn get_thread_pool() -> Option<Arc<ThreadPool>> {
    GLOBAL_THREAD_POOL
        .get_or_init(|| match build_pool(&ThreadPoolConfig::default()) {
            Ok(pool) => Some(Arc::new(pool)),
            Err(e) => {
                log::warn!("{}; falling back to serial execution", e);
                None
            }
        })
        .clone()
}

/// Get current thread pool configuration
pub fn get_config() -> ThreadPoolConfig {
    THREAD_POOL_CONFIG
        .lock()
        .map(|config| config.clone())
        .unwrap_or_else(|_| ThreadPoolConfig::default())
}

/// Check if parallel processing is enabled
pub fn is_parallel_enabled() -> bool {
    get_config().enabled
}

/// Number of worker threads a parallel call would use
pub fn current_num_threads() -> usize {
    match get_thread_pool() {
        Some(pool) if is_parallel_enabled() => pool.current_num_threads(),
        _ => 1,
    }
}

/// Execute a parallel operation with the global thread pool
pub fn execute_parallel<F, R>(op: F) -> R
where
    F: FnOnce() -> R + Send,
    R: Send,
{
    match get_thread_pool() {
        Some(pool) if is_parallel_enabled() => pool.install(op),
        _ => op(),
    }
}

/// Order-preserving parallel map over `0..len`
pub fn parallel_map_range<U, F>(len: usize, f: F) -> Vec<U>
where
    U: Send,
    F: Fn(usize) -> U + Sync + Send,
{
    if !is_parallel_enabled() || len < get_config().min_parallel_len {
        return (0..len).map(f).collect();
    }

    execute_parallel(|| (0..len).into_par_iter().map(f).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_builders() {
        let config = ThreadPoolConfig::default()
            .with_threads(3)
            .with_stack_size(1 << 20)
            .with_enabled(false)
            .with_min_parallel_len(16);

        assert_eq!(config.num_threads, Some(3));
        assert_eq!(config.stack_size, Some(1 << 20));
        assert!(!config.enabled);
        assert_eq!(config.min_parallel_len, 16);
        assert_eq!(config.thread_name_prefix, "isovox");
    }

    #[test]
    fn test_parallel_map_range_preserves_order() {
        let squares = parallel_map_range(1000, |i| i * i);

        assert_eq!(squares.len(), 1000);
        for (i, value) in squares.iter().enumerate() {
            assert_eq!(*value, i * i);
        }
    }

    #[test]
    fn test_parallel_map_range_matches_serial() {
        let parallel = parallel_map_range(257, |i| i as u64 * 3);
        let serial: Vec<u64> = (0..257).map(|i| i as u64 * 3).collect();
        assert_eq!(parallel, serial);
        assert!(parallel_map_range(0, |i| i).is_empty());
    }

    #[test]
    fn test_thread_pool_is_available() {
        assert!(get_thread_pool().is_some());
        assert!(current_num_threads() >= 1);
    }
}
