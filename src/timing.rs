//! Wall-clock instrumentation for pipeline steps.

use std::time::Instant;

use tracing::info;

/// Run `f`, log how long it took under `label`, and return its output along
/// with the elapsed seconds.
pub fn timed<T, F>(label: &str, f: F) -> (T, f64)
where
    F: FnOnce() -> T,
{
    let start = Instant::now();
    let out = f();
    let secs = start.elapsed().as_secs_f64();
    info!("{} finished in {:.3} s", label, secs);
    (out, secs)
}
