//! Integration test crate for clipmark.
//!
//! This crate exists solely to hold cross-crate scenario tests.
//! It depends on both clipmark crates to verify they work together.

#[cfg(test)]
mod clip_workflow;

#[cfg(test)]
mod crop_scenarios;

#[cfg(test)]
mod markers_file;

/// Install a test-writer subscriber once; later calls are no-ops.
#[cfg(test)]
pub(crate) fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}
