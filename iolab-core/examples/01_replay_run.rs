//! Example 01: Replaying a Recorded Run
//!
//! This example demonstrates how to:
//! - Load a remote context from a JSON file (or use the defaults)
//! - Configure a remote and stream frames through it
//! - Watch live averages while the run is in progress
//! - Recalibrate with the measured sample rate and export the history
//!
//! Usage: `cargo run --example 01_replay_run -- [context.json]`

use iolab_core::time::FixedTime;
use iolab_core::{ExportFormat, Frame, IolabResult, Remote, RemoteContext, SensorKind, Selector};

/// Mini-motion configuration: accelerometer, wheel and force probe
const CONFIGURATION: u8 = 4;
/// Five seconds of frames
const FRAMES: usize = 500;

fn main() {
    println!("=== IOLab Replay Example ===\n");

    if let Err(e) = run() {
        println!("replay failed: {e}");
        std::process::exit(1);
    }
}

fn run() -> IolabResult<()> {
    let ctx = match std::env::args().nth(1) {
        Some(path) => RemoteContext::load(path)?,
        None => RemoteContext::new(0x0001a3),
    };
    println!("Remote 0x{:06x}, exports to {}", ctx.hardware_id, ctx.data_dir.display());

    let mut remote = Remote::new(ctx);
    remote.configure(CONFIGURATION)?;
    let sensors: Vec<String> = remote.sensors().map(|s| s.to_string()).collect();
    println!("Configured: {}\n", sensors.join(", "));

    let clock = FixedTime::new(0);
    for i in 0..FRAMES {
        let frame = replay_frame(i);
        remote.ingest(&frame, &clock);
        clock.advance(10);

        if i % 100 == 99 {
            print_live(&remote, i + 1);
        }
    }

    println!("\nRecalibrating...");
    let done = remote.recalibrate_all();
    println!("  {done} channels recalibrated");
    for kind in remote.sensors() {
        if let Some(handle) = remote.channel(kind) {
            handle.with(|ch| {
                println!(
                    "  {:<14} {:>5} samples at {:8.3} Hz",
                    kind.name(),
                    ch.len(),
                    ch.samples_per_second()
                )
            });
        }
    }

    let paths = remote.export_all("replay", ExportFormat::Csv)?;
    println!("\nExported:");
    for path in paths {
        println!("  {}", path.display());
    }
    Ok(())
}

fn words(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|w| w.to_be_bytes()).collect()
}

/// A cart rolling down a ramp with a steady push on the force probe
fn replay_frame(i: usize) -> Frame {
    let t = i as f64 / 100.0;
    // wheel counts per 10 ms at 0.5 m/s² with 1000 counts/m
    let delta = (500.0 * t * 0.01) as i16;

    Frame::new((i % 256) as u8, 180)
        // rotated layout: words (y, -x, z)
        .with_payload(
            SensorKind::Accelerometer.code(),
            words(&[0, -400, 8100, 0, -400, 8100]),
        )
        .with_payload(SensorKind::Wheel.code(), words(&[delta]))
        .with_payload(SensorKind::Force.code(), words(&[1927, 1927]))
}

fn print_live(remote: &Remote, frames: usize) {
    let Some(wheel) = remote.channel(SensorKind::Wheel) else {
        return;
    };
    let Some(force) = remote.channel(SensorKind::Force) else {
        return;
    };

    let v = wheel.with(|ch| ch.time_average(ch.n_average(), Selector::cal().only_axis(1), 0));
    let f = force.with(|ch| ch.time_average(ch.n_average(), Selector::cal(), 0));
    println!(
        "  frame {frames:>4}: v = {:6.3} ± {:.3} m/s, F = {:6.3} N",
        v.cal[1].mean, v.cal[1].sigma, f.cal[0].mean
    );
}
