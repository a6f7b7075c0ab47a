//! Benchmarks for the ingest and recalibration pipeline.

use criterion::{black_box, criterion_group, criterion_main, Criterion};

use iolab_core::time::FixedTime;
use iolab_core::{Frame, FrameDecoder, Remote, RemoteContext, SensorKind, Selector};

fn words(values: &[i16]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_be_bytes()).collect()
}

/// Motion configuration frame: 2 accelerometer, 2 gyroscope, 1 wheel, 2 force samples
fn motion_frame(frame_number: u8) -> Frame {
    let phase = f64::from(frame_number) * 0.05;
    let a = (phase.sin() * 4000.0) as i16;
    Frame::new(frame_number, 200)
        .with_payload(SensorKind::Accelerometer.code(), words(&[a, -a, 8100, a, -a, 8100]))
        .with_payload(SensorKind::Gyroscope.code(), words(&[10, 20, 30, 11, 21, 31]))
        .with_payload(SensorKind::Wheel.code(), words(&[(phase.cos() * 40.0) as i16]))
        .with_payload(SensorKind::Force.code(), words(&[1900, 1910]))
}

fn motion_remote() -> Remote {
    let mut remote = Remote::new(RemoteContext::default());
    remote.configure(35).expect("motion configuration");
    remote
}

fn filled_remote(frames: usize) -> Remote {
    let remote = motion_remote();
    let clock = FixedTime::new(0);
    for i in 0..frames {
        remote.ingest(&motion_frame((i % 256) as u8), &clock);
        clock.advance(10);
    }
    remote
}

fn benchmark_decode(c: &mut Criterion) {
    let accel = words(&[123; 3 * 40]);
    let wheel = words(&[7; 40]);

    c.bench_function("decode_accelerometer_40", |b| {
        let mut decoder = FrameDecoder::new(SensorKind::Accelerometer);
        b.iter(|| decoder.decode(black_box(&accel)))
    });

    c.bench_function("decode_wheel_40", |b| {
        let mut decoder = FrameDecoder::new(SensorKind::Wheel);
        b.iter(|| decoder.decode(black_box(&wheel)))
    });
}

fn benchmark_ingest(c: &mut Criterion) {
    let frames: Vec<Frame> = (0..=255u8).map(motion_frame).collect();

    c.bench_function("ingest_1000_motion_frames", |b| {
        b.iter(|| {
            let remote = motion_remote();
            let clock = FixedTime::new(0);
            for frame in frames.iter().cycle().take(1000) {
                remote.ingest(black_box(frame), &clock);
                clock.advance(10);
            }
        })
    });
}

fn benchmark_recalibrate(c: &mut Criterion) {
    let remote = filled_remote(2000);

    c.bench_function("recalibrate_2000_motion_frames", |b| {
        b.iter(|| black_box(remote.recalibrate_all()))
    });

    let accel = remote.channel(SensorKind::Accelerometer).cloned();
    c.bench_function("time_average_400", |b| {
        b.iter(|| {
            accel.as_ref().map(|h| {
                h.with(|ch| ch.time_average(black_box(400), Selector::raw_cal(), 1000))
            })
        })
    });
}

criterion_group!(
    benches,
    benchmark_decode,
    benchmark_ingest,
    benchmark_recalibrate
);
criterion_main!(benches);
