// SPDX-License-Identifier: MPL-2.0

//! Integration tests for the capture loop, driven by a mock device

use dayafterday::backends::camera::{
    CaptureLoop, FrameReceiver, FrameSource, PixelFormat, RawFrame, RetryPolicy,
};
use dayafterday::{CameraError, Frame};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

const WAIT: Duration = Duration::from_secs(5);

/// Shared view of what the capture thread did to the mock device
#[derive(Clone, Default)]
struct DeviceProbe {
    reads: Arc<AtomicUsize>,
    released: Arc<AtomicBool>,
}

impl DeviceProbe {
    fn reads(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    fn released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }
}

/// Mock camera delivering 2x1 BGR frames, failing the first `fail_first` reads
struct MockCamera {
    probe: DeviceProbe,
    fail_first: usize,
    format: PixelFormat,
}

impl FrameSource for MockCamera {
    fn read_frame(&mut self) -> Result<RawFrame, CameraError> {
        let n = self.probe.reads.fetch_add(1, Ordering::SeqCst);
        std::thread::sleep(Duration::from_millis(1));

        if n < self.fail_first {
            return Err(CameraError::TransientReadFailure(format!("read {}", n)));
        }
        Ok(RawFrame {
            width: 2,
            height: 1,
            stride: 6,
            format: self.format,
            data: vec![30, 20, 10, 60, 50, 40],
        })
    }

    fn release(&mut self) {
        self.probe.released.store(true, Ordering::SeqCst);
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        initial_backoff: Duration::from_millis(1),
        max_backoff: Duration::from_millis(5),
        log_interval: 30,
    }
}

fn start_mock(fail_first: usize, format: PixelFormat) -> (CaptureLoop, FrameReceiver, DeviceProbe) {
    let probe = DeviceProbe::default();
    let camera = MockCamera {
        probe: probe.clone(),
        fail_first,
        format,
    };
    let (capture, frames) =
        CaptureLoop::start("mock-capture", move || Ok(camera), fast_policy()).unwrap();
    (capture, frames, probe)
}

fn wait_for_frame(frames: &mut FrameReceiver) -> Option<Frame> {
    let start = Instant::now();
    while start.elapsed() < WAIT {
        if let Some(frame) = frames.latest() {
            return Some(frame);
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    None
}

#[test]
fn test_open_failure_is_device_unavailable() {
    let result = CaptureLoop::start(
        "mock-capture",
        || -> Result<MockCamera, CameraError> {
            Err(CameraError::DeviceUnavailable("no camera".into()))
        },
        fast_policy(),
    );

    match result {
        Err(CameraError::DeviceUnavailable(msg)) => assert_eq!(msg, "no camera"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("open failure should be reported"),
    }
}

#[test]
fn test_unsupported_format_on_open_is_passed_through() {
    let result = CaptureLoop::start(
        "mock-capture",
        || -> Result<MockCamera, CameraError> {
            Err(CameraError::UnsupportedFormat("H264".into()))
        },
        fast_policy(),
    );

    match result {
        Err(CameraError::UnsupportedFormat(fourcc)) => assert_eq!(fourcc, "H264"),
        Err(e) => panic!("unexpected error: {}", e),
        Ok(_) => panic!("open failure should be reported"),
    }
}

#[test]
fn test_frames_are_converted_to_rgb() {
    let (mut capture, mut frames, _probe) = start_mock(0, PixelFormat::BGR24);

    let frame = wait_for_frame(&mut frames).expect("a frame should arrive");
    assert_eq!((frame.width, frame.height), (2, 1));
    assert_eq!(frame.data(), &[10, 20, 30, 40, 50, 60]);

    capture.stop();
}

#[test]
fn test_transient_failures_are_retried() {
    let (mut capture, mut frames, probe) = start_mock(5, PixelFormat::RGB24);

    let frame = wait_for_frame(&mut frames).expect("loop should recover");
    assert_eq!(frame.data(), &[30, 20, 10, 60, 50, 40]);
    assert!(probe.reads() > 5);
    assert!(capture.is_running());

    capture.stop();
}

#[test]
fn test_unconvertible_frames_are_skipped() {
    // Garbage MJPEG never decodes; the loop keeps going without publishing
    let probe = DeviceProbe::default();
    let camera = MockCamera {
        probe: probe.clone(),
        fail_first: 0,
        format: PixelFormat::MJPEG,
    };
    let (mut capture, mut frames) =
        CaptureLoop::start("mock-capture", move || Ok(camera), fast_policy()).unwrap();

    std::thread::sleep(Duration::from_millis(50));
    assert!(frames.latest().is_none());
    assert!(capture.is_running());
    assert!(probe.reads() > 1);

    capture.stop();
    assert!(probe.released());
}

#[test]
fn test_stop_releases_device_and_ends_delivery() {
    let (mut capture, mut frames, probe) = start_mock(0, PixelFormat::RGB24);
    wait_for_frame(&mut frames).expect("a frame should arrive");

    capture.stop();
    assert!(probe.released(), "device should be released on stop");
    assert!(!capture.is_running());

    let reads_after_stop = probe.reads();
    std::thread::sleep(Duration::from_millis(30));
    assert_eq!(probe.reads(), reads_after_stop, "no reads after stop");

    assert!(frames.is_closed());
    assert!(frames.latest().is_none(), "no frames after stop");
}

#[test]
fn test_stop_interrupts_backoff() {
    let probe = DeviceProbe::default();
    let camera = MockCamera {
        probe: probe.clone(),
        fail_first: usize::MAX,
        format: PixelFormat::RGB24,
    };
    let slow = RetryPolicy {
        initial_backoff: Duration::from_secs(30),
        max_backoff: Duration::from_secs(30),
        log_interval: 30,
    };
    let (mut capture, _frames) =
        CaptureLoop::start("mock-capture", move || Ok(camera), slow).unwrap();

    while probe.reads() == 0 {
        std::thread::sleep(Duration::from_millis(1));
    }

    let start = Instant::now();
    capture.stop();
    assert!(start.elapsed() < Duration::from_secs(5));
    assert!(probe.released());
}

#[test]
fn test_drop_stops_loop() {
    let (capture, _frames, probe) = start_mock(0, PixelFormat::RGB24);
    drop(capture);
    assert!(probe.released());
}

#[test]
fn test_dropping_receiver_stops_loop() {
    let (capture, frames, probe) = start_mock(0, PixelFormat::RGB24);
    drop(frames);

    let start = Instant::now();
    while capture.is_running() && start.elapsed() < WAIT {
        std::thread::sleep(Duration::from_millis(2));
    }
    assert!(!capture.is_running());
    assert!(probe.released());
}
