//! Integration test crate for Loopscope.
//!
//! This crate exists solely to hold cross-crate integration tests.
//! It drives the display engine through its wire messages the way a
//! timeline view would.

#[cfg(test)]
mod display;



/// Install a fmt subscriber for test logs. Safe to call more than once.
#[cfg(test)]
pub(crate) fn init_tracing() {
    use tracing_subscriber::EnvFilter;

    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
