use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::OnceLock;
use std::time::Instant;

static VERBOSE: AtomicBool = AtomicBool::new(false);
static STARTED: OnceLock<Instant> = OnceLock::new();

pub fn set(enabled: bool) {
    STARTED.get_or_init(Instant::now);
    VERBOSE.store(enabled, Ordering::Relaxed);
}

pub fn enabled() -> bool {
    VERBOSE.load(Ordering::Relaxed)
}

/// Seconds since `set` was first called.
pub fn elapsed() -> f64 {
    STARTED.get_or_init(Instant::now).elapsed().as_secs_f64()
}

// Visible crate-wide through `#[macro_use] mod verbose;` in main.rs.
macro_rules! vprintln {
    ($($arg:tt)*) => {{
        if crate::verbose::enabled() {
            eprintln!("[{:>8.3}s] {}", crate::verbose::elapsed(), format_args!($($arg)*));
        }
    }}
}
