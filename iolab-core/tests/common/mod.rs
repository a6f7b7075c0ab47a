//! Common test utilities for integration tests
//!
//! This module provides:
//! - Payload encoders that produce exactly what the remote puts on the wire
//! - Scenario helpers that stream frames through a configured remote
//! - A temporary directory layout for calibration and export files

#![allow(dead_code)]

pub mod generators;
pub mod scenarios;

use iolab_core::RemoteContext;
use tempfile::TempDir;

/// Hardware ID used by tests that need calibration files
pub const TEST_HARDWARE_ID: u32 = 0x0001a3;

/// A context whose calibration and export directories live in a temp dir
///
/// Keep the returned [`TempDir`] alive for as long as the files are needed.
pub fn temp_context(hardware_id: u32) -> (TempDir, RemoteContext) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let ctx = RemoteContext::new(hardware_id)
        .calibration_dir(dir.path().join("Calibration").join("CalData"))
        .data_dir(dir.path().join("IOLabData"));
    (dir, ctx)
}

/// Assert two floats agree within `tol`
pub fn assert_close(got: f64, want: f64, tol: f64) {
    assert!(
        (got - want).abs() <= tol,
        "expected {want} ± {tol}, got {got}"
    );
}
