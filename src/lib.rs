//! Desktop image processor: load a JPEG or PNG and apply classic vision
//! operations (grayscale, Canny edges, Haar face detection, Gaussian blur,
//! binary threshold, Harris corners).
//!
//! The crates are re-exported so the whole pipeline is reachable from one
//! dependency.

pub use cv_core as core;
pub use cv_features as features;
pub use cv_imgproc as imgproc;
pub use cv_objdetect as objdetect;
pub use cv_session as session;
pub use cv_viewer as viewer;

/// Initialize a single global Rayon thread pool for all CPU-parallel routines.
///
/// Call this once at application startup before running any operation.
/// Repeated calls are idempotent and return the first initialization result.
///
/// Priority order:
/// 1. explicit `num_threads`
/// 2. `RUSTCV_CPU_THREADS` env var
/// 3. Rayon default
pub fn init_thread_pool(num_threads: Option<usize>) -> cv_core::Result<usize> {
    cv_core::init_global_thread_pool(num_threads)
}
