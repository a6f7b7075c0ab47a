//! End-to-end runs through a configured remote
//!
//! Frames are built with the wire encoders in `common::generators` and
//! streamed on a deterministic clock, then the history is recalibrated and
//! exported the way a finished run would be.

mod common;

use std::fs;
use std::thread;

use iolab_core::barometer::BarometerRegisters;
use iolab_core::calibration::{
    AxisCalibration, Measurements, Orientation, OrientationReadings, PROCEDURE_AVERAGE,
};
use iolab_core::time::FixedTime;
use iolab_core::{ExportFormat, Frame, IolabError, Remote, SensorChannel, SensorKind, Selector};

use common::generators::{
    encode_barometer, encode_rotated, encode_thermometer, encode_words, repeat,
};
use common::scenarios::{single_payload, stream, FRAME_MS};
use common::{assert_close, temp_context, TEST_HARDWARE_ID};

/// One mini-motion frame: 2 accelerometer, 2 force and 1 wheel sample
fn mini_motion_frame(frame_number: u8) -> Frame {
    Frame::new(frame_number, 190)
        // 1 g on z with the built-in constants
        .with_payload(
            SensorKind::Accelerometer.code(),
            repeat(&encode_rotated(38, 0, 8109), 2),
        )
        // 2 N
        .with_payload(SensorKind::Force.code(), encode_words(&[1807, 1807]))
        .with_payload(SensorKind::Wheel.code(), encode_words(&[10]))
}

fn mini_motion_remote() -> (tempfile::TempDir, Remote) {
    let (dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut remote = Remote::new(ctx);
    remote.configure(4).unwrap();
    (dir, remote)
}

#[test]
fn mini_motion_run_recalibrates_and_exports() {
    let (_dir, remote) = mini_motion_remote();
    let clock = FixedTime::new(0);

    // rssi + 2 + 2 + 1 per frame
    assert_eq!(stream(&remote, &clock, 100, mini_motion_frame), 600);
    assert_eq!(remote.recalibrate_all(), 4);

    let accel = remote.channel(SensorKind::Accelerometer).unwrap();
    accel.with(|ch| {
        assert_eq!(ch.len(), 200);
        assert_close(ch.samples_per_second(), 200.0, 1e-9);
        let last = ch.store().last().unwrap();
        assert_close(last.time, 199.0 / 200.0, 1e-12);
        assert_close(last.cal[2], 1.0, 1e-12);
        assert_close(last.ave[2], 1.0, 1e-12);
        assert_close(last.cal[0], 0.0, 1e-12);
    });

    let force = remote.channel(SensorKind::Force).unwrap();
    force.with(|ch| {
        let stats = ch.time_average(10, Selector::cal(), 0);
        assert_close(stats.cal[0].mean, 2.0, 1e-12);
        assert_close(stats.cal[0].sigma, 0.0, 1e-12);
    });

    let wheel = remote.channel(SensorKind::Wheel).unwrap();
    wheel.with(|ch| {
        assert_eq!(ch.len(), 100);
        assert_close(ch.samples_per_second(), 100.0, 1e-9);
        for (i, sample) in ch.store().iter().enumerate() {
            assert_close(sample.cal[0], 10.0 * (i + 1) as f64 / 1000.0, 1e-12);
            assert_close(sample.cal[1], 1.0, 1e-12);
            assert_close(sample.cal[2], 0.0, 1e-6);
        }
    });

    let paths = remote.export_all("run1", ExportFormat::Csv).unwrap();
    assert_eq!(paths.len(), 4);

    let accel_csv = remote.context().data_dir.join("Accelerometer_run1.csv");
    let text = fs::read_to_string(&accel_csv).unwrap();
    let mut lines = text.lines();
    assert_eq!(
        lines.next(),
        Some("index, time, rawX, rawY, rawZ, calX, calY, calZ, aveX(3), aveY(3), aveZ(3)")
    );
    assert_eq!(
        lines.next(),
        Some("0, 0.0000, 38, 0, 8109, 0.0000, 0.0000, 1.0000, 0.0000, 0.0000, 1.0000")
    );
    assert_eq!(text.lines().count(), 201);

    let wheel_csv = fs::read_to_string(remote.context().data_dir.join("Wheel_run1.csv")).unwrap();
    assert!(wheel_csv.starts_with("index, time, rawR, rawV, rawA, calR, calV, calA"));
}

#[test]
fn frame_timing_survives_frames_without_samples() {
    let (_dir, remote) = mini_motion_remote();
    let clock = FixedTime::new(0);

    // the force probe only reports on even frames, four samples at a time
    stream(&remote, &clock, 50, |n| {
        let frame = Frame::new(n, 200);
        if n % 2 == 0 {
            frame.with_payload(SensorKind::Force.code(), encode_words(&[2047; 4]))
        } else {
            frame
        }
    });

    let force = remote.channel(SensorKind::Force).unwrap();
    force.with(|ch| {
        assert_eq!(ch.timing().total_frames(), 50);
        assert_eq!(ch.len(), 100);
    });
    assert_eq!(remote.recalibrate_all(), 2);
    force.with(|ch| assert_close(ch.samples_per_second(), 200.0, 1e-9));
}

#[test]
fn elapsed_time_timing_when_frame_timing_is_off() {
    let (_dir, mut ctx) = temp_context(TEST_HARDWARE_ID);
    ctx.use_frame_timing = false;
    let mut remote = Remote::new(ctx);
    remote.configure(2).unwrap();

    let clock = FixedTime::new(0);
    // frames arrive every 10 ms but carry 5 samples: 500 Hz
    for n in 0..40u8 {
        clock.advance(FRAME_MS);
        let payload = repeat(&encode_rotated(0, 0, 0), 5);
        remote.ingest(&single_payload(n, SensorKind::Accelerometer, payload), &clock);
    }
    remote.recalibrate_all();

    let accel = remote.channel(SensorKind::Accelerometer).unwrap();
    accel.with(|ch| assert_close(ch.samples_per_second(), 500.0, 1e-9));
}

#[test]
fn microphone_export_writes_matlab_text_and_binary() {
    let (_dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut remote = Remote::new(ctx);
    remote.configure(9).unwrap();
    let clock = FixedTime::new(0);

    stream(&remote, &clock, 10, |n| {
        single_payload(n, SensorKind::Microphone, encode_words(&[-300; 24]))
    });

    let paths = remote.export_all("take", ExportFormat::Matlab).unwrap();
    let data_dir = &remote.context().data_dir;
    assert!(paths.contains(&data_dir.join("Microphone_take.mat")));
    assert!(paths.contains(&data_dir.join("RSSI_take.mat")));

    let text = fs::read_to_string(data_dir.join("Microphone_take.mat")).unwrap();
    assert_eq!(text.lines().next(), Some("index time raw cal ave(1)"));
    assert_eq!(text.lines().count(), 241);

    let bin = fs::read(data_dir.join("Microphone_take.bin")).unwrap();
    assert_eq!(bin.len(), 480);
    assert_eq!(&bin[..2], &(-300i16).to_le_bytes());
}

#[test]
fn reversed_y_negates_force_and_wheel() {
    let (_dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut remote = Remote::new(ctx.reverse_y(true));
    remote.configure(4).unwrap();
    let clock = FixedTime::new(0);

    stream(&remote, &clock, 20, mini_motion_frame);
    remote.recalibrate_all();

    let force = remote.channel(SensorKind::Force).unwrap();
    force.with(|ch| assert_close(ch.store().last().unwrap().cal[0], -2.0, 1e-12));

    let accel = remote.channel(SensorKind::Accelerometer).unwrap();
    // z is not a reversed axis
    accel.with(|ch| assert_close(ch.store().last().unwrap().cal[2], 1.0, 1e-12));

    let wheel = remote.channel(SensorKind::Wheel).unwrap();
    wheel.with(|ch| {
        let last = ch.store().last().unwrap();
        assert_close(last.cal[0], -0.2, 1e-12);
        assert_close(last.cal[1], -1.0, 1e-12);
    });
}

#[test]
fn capped_channels_keep_counting_samples() {
    let (_dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut remote = Remote::new(ctx.max_samples(50));
    remote.configure(2).unwrap();
    let clock = FixedTime::new(0);

    stream(&remote, &clock, 100, |n| {
        single_payload(n, SensorKind::Accelerometer, repeat(&encode_rotated(0, 0, 0), 4))
    });

    let accel = remote.channel(SensorKind::Accelerometer).unwrap();
    accel.with(|ch| {
        assert_eq!(ch.len(), 50);
        assert_eq!(ch.timing().total_samples(), 400);
    });
    remote.recalibrate_all();
    accel.with(|ch| assert_close(ch.samples_per_second(), 400.0, 1e-9));
}

#[test]
fn orientation_procedure_from_measured_readings() {
    let (_dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut channel = SensorChannel::new(SensorKind::Accelerometer, 400.0, &ctx);
    let raw = [
        (8244, 5, 7),
        (-8168, 9, 3),
        (1, 8116, 2),
        (4, -8116, 6),
        (0, 0, 8109),
        (0, 0, -8215),
    ];

    let mut readings = OrientationReadings::new();
    for (orientation, (x, y, z)) in Orientation::ALL.into_iter().zip(raw) {
        channel.clear();
        let payload = repeat(&encode_rotated(x, y, z), PROCEDURE_AVERAGE + 10);
        channel.ingest(&payload, 0, 0, &ctx);
        readings.record(orientation, channel.measure(PROCEDURE_AVERAGE).unwrap());
    }

    let saved = channel
        .apply_procedure(&Measurements::Orientations(readings), &ctx)
        .unwrap();
    assert!(saved);

    let reloaded = SensorChannel::new(SensorKind::Accelerometer, 400.0, &ctx);
    let axes = reloaded.model().linear().unwrap().axes().to_vec();
    assert_eq!(
        axes,
        vec![
            AxisCalibration::new(8206.0, 38.0),
            AxisCalibration::new(8116.0, 0.0),
            AxisCalibration::new(8162.0, -53.0),
        ]
    );
}

#[test]
fn measuring_needs_three_samples() {
    let (_dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut channel = SensorChannel::new(SensorKind::Gyroscope, 380.0, &ctx);
    channel.ingest(&repeat(&encode_rotated(1, 2, 3), 2), 0, 0, &ctx);

    assert!(matches!(
        channel.measure(PROCEDURE_AVERAGE),
        Err(IolabError::InsufficientHistory {
            required: 3,
            available: 2
        })
    ));
}

#[test]
fn channels_ingest_from_several_threads() {
    let (_dir, remote) = mini_motion_remote();

    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let clock = FixedTime::new(0);
                stream(&remote, &clock, 25, mini_motion_frame);
            });
        }
        scope.spawn(|| {
            for _ in 0..10 {
                remote.recalibrate_all();
            }
        });
    });

    let counts: Vec<usize> = [
        SensorKind::Rssi,
        SensorKind::Accelerometer,
        SensorKind::Force,
        SensorKind::Wheel,
    ]
    .into_iter()
    .map(|kind| remote.channel(kind).unwrap().with(|ch| ch.len()))
    .collect();
    assert_eq!(counts, vec![100, 200, 200, 100]);
}

#[test]
fn device_registers_change_ambient_calibration() {
    let (_dir, ctx) = temp_context(TEST_HARDWARE_ID);
    let mut remote = Remote::new(ctx);
    remote.configure(6).unwrap();
    let clock = FixedTime::new(0);

    let ambient = |n: u8| {
        Frame::new(n, 200)
            .with_payload(SensorKind::Barometer.code(), encode_barometer(500, 600))
            // 50 Hz of a 400 Hz accumulator: 2041 counts, 30 °C
            .with_payload(SensorKind::Thermometer.code(), encode_thermometer(8 * 2041))
    };
    stream(&remote, &clock, 5, ambient);

    let barometer = remote.channel(SensorKind::Barometer).unwrap();
    let thermometer = remote.channel(SensorKind::Thermometer).unwrap();
    barometer.with(|ch| {
        let last = ch.store().last().unwrap();
        assert_close(last.cal[0], 83.59248193944072, 1e-9);
        assert_close(last.cal[1], 1.074766355140187, 1e-12);
    });
    thermometer.with(|ch| assert_close(ch.store().last().unwrap().cal[0], 30.0, 1e-12));

    let registers = BarometerRegisters {
        a0: 0x4000,
        ..BarometerRegisters::default()
    };
    assert!(barometer.with(|ch| ch.set_barometer_registers(registers)));
    assert!(thermometer.with(|ch| ch.set_thermometer_references(2000.0, 2400.0)));
    remote
        .channel(SensorKind::Light)
        .unwrap()
        .with(|ch| assert!(!ch.set_thermometer_references(1.0, 2.0)));

    remote.recalibrate_all();
    barometer.with(|ch| {
        let cal = ch.store().last().unwrap().cal[0];
        assert!((cal - 83.59248193944072).abs() > 1e-3);
    });
    thermometer.with(|ch| {
        // 30 + 41 * 55 / 400
        assert_close(ch.store().last().unwrap().cal[0], 35.6375, 1e-12);
    });
}

#[test]
fn custom_actions_zero_force_and_wheel() {
    let (_dir, remote) = mini_motion_remote();
    let clock = FixedTime::new(0);
    stream(&remote, &clock, 30, mini_motion_frame);

    let force = remote.channel(SensorKind::Force).unwrap();
    force.with(|ch| {
        ch.custom_action().unwrap();
        let axis = ch.model().linear().unwrap().axes()[0];
        assert_close(axis.counts_offset, 1807.0 - 2047.0, 1e-12);
    });

    let wheel = remote.channel(SensorKind::Wheel).unwrap();
    wheel.with(|ch| ch.custom_action().unwrap());
    stream(&remote, &clock, 1, mini_motion_frame);
    wheel.with(|ch| assert_eq!(ch.store().last().unwrap().raw[0], 10.0));

    let accel = remote.channel(SensorKind::Accelerometer).unwrap();
    assert!(matches!(
        accel.with(|ch| ch.custom_action()),
        Err(IolabError::Unsupported { .. })
    ));
}
