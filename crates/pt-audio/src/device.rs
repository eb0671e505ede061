//! OSS-style audio device abstraction: a capability interface with named
//! operations rather than a callback table, grounded in the donor's
//! function-pointer `GaimMediaDeviceHandle` (device.h).

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::Result;
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::StreamConfig;
use tracing::{info, warn};

pub const DEVICE_SAMPLE_RATE: u32 = 8_000;
pub const DEVICE_CHANNELS: u16 = 1;

/// Playback/capture direction, as the device's `open(direction)` operation expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Capture,
    Playback,
}

/// Named-operation capability interface replacing a C function-pointer table:
/// `{read, write, set_format, pause, ref, unref}`.
pub trait AudioDevice: Send + Sync {
    /// Blocking read of one device-native frame of PCM samples.
    fn read(&self, buf: &mut [i16]) -> Result<usize>;
    /// Enqueue one frame for asynchronous playback.
    fn write(&self, frame: &[i16]) -> Result<()>;
    /// Apply (or re-apply) the fixed device format.
    fn set_format(&self) -> Result<()>;
    /// Toggle the device's pause flag without tearing down the stream.
    fn pause(&self, paused: bool);
    /// Increment the shared reference count.
    fn device_ref(&self) -> usize;
    /// Decrement the shared reference count; returns the count after the decrement.
    fn unref(&self) -> usize;
}

struct RefCounted<T> {
    inner: T,
    count: AtomicUsize,
}

/// A playback device: `enqueue` appends to an unbounded FIFO drained by a
/// dedicated worker thread that writes to the driver in non-blocking mode.
#[derive(Clone)]
pub struct PlaybackDevice {
    shared: Arc<RefCounted<PlaybackShared>>,
}

struct PlaybackShared {
    queue: Arc<Mutex<std::collections::VecDeque<i16>>>,
    paused: Arc<std::sync::atomic::AtomicBool>,
    #[allow(dead_code)] // keeps the cpal stream alive for the worker thread's lifetime
    stream: cpal::Stream,
}

// cpal::Stream is not Send/Sync by default on some platforms; we never touch
// it except to keep it alive, so forwarding is safe here.
unsafe impl Send for PlaybackShared {}
unsafe impl Sync for PlaybackShared {}

impl PlaybackDevice {
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let device = select_device(Direction::Playback, device_name)?;
        let config = StreamConfig {
            channels: DEVICE_CHANNELS,
            sample_rate: cpal::SampleRate(DEVICE_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let queue = Arc::new(Mutex::new(std::collections::VecDeque::<i16>::new()));
        let paused = Arc::new(std::sync::atomic::AtomicBool::new(false));
        let queue_cb = queue.clone();
        let paused_cb = paused.clone();

        let stream = device.build_output_stream(
            &config,
            move |data: &mut [i16], _: &cpal::OutputCallbackInfo| {
                if paused_cb.load(Ordering::Relaxed) {
                    data.fill(0);
                    return;
                }
                let mut q = queue_cb.lock().unwrap();
                for sample in data.iter_mut() {
                    *sample = q.pop_front().unwrap_or(0);
                }
            },
            |err| tracing::error!("playback stream error: {err}"),
            None,
        )?;
        stream.play()?;

        let shared = PlaybackShared { queue, paused, stream };

        info!("playback device opened at {DEVICE_SAMPLE_RATE}Hz mono");
        Ok(Self { shared: Arc::new(RefCounted { inner: shared, count: AtomicUsize::new(1) }) })
    }
}

impl AudioDevice for PlaybackDevice {
    fn read(&self, _buf: &mut [i16]) -> Result<usize> {
        anyhow::bail!("playback device does not support read")
    }

    fn write(&self, frame: &[i16]) -> Result<()> {
        let mut q = self.shared.inner.queue.lock().unwrap();
        q.extend(frame.iter().copied());
        Ok(())
    }

    fn set_format(&self) -> Result<()> {
        Ok(())
    }

    fn pause(&self, paused: bool) {
        self.shared.inner.paused.store(paused, Ordering::Relaxed);
    }

    fn device_ref(&self) -> usize {
        self.shared.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn unref(&self) -> usize {
        self.shared.count.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

/// A capture device: `read` blocks until one device-native frame is available.
pub struct CaptureDevice {
    consumer: Mutex<std::sync::mpsc::Receiver<i16>>,
    #[allow(dead_code)]
    stream: cpal::Stream,
    count: AtomicUsize,
}

unsafe impl Send for CaptureDevice {}
unsafe impl Sync for CaptureDevice {}

impl CaptureDevice {
    pub fn open(device_name: Option<&str>) -> Result<Self> {
        let device = select_device(Direction::Capture, device_name)?;
        let config = StreamConfig {
            channels: DEVICE_CHANNELS,
            sample_rate: cpal::SampleRate(DEVICE_SAMPLE_RATE),
            buffer_size: cpal::BufferSize::Default,
        };

        let (tx, rx) = std::sync::mpsc::channel();
        let stream = device.build_input_stream(
            &config,
            move |data: &[i16], _: &cpal::InputCallbackInfo| {
                for &sample in data {
                    let _ = tx.send(sample);
                }
            },
            |err| tracing::error!("capture stream error: {err}"),
            None,
        )?;
        stream.play()?;

        info!("capture device opened at {DEVICE_SAMPLE_RATE}Hz mono");
        Ok(Self { consumer: Mutex::new(rx), stream, count: AtomicUsize::new(1) })
    }
}

impl AudioDevice for CaptureDevice {
    fn read(&self, buf: &mut [i16]) -> Result<usize> {
        let rx = self.consumer.lock().unwrap();
        for slot in buf.iter_mut() {
            match rx.recv() {
                Ok(sample) => *slot = sample,
                Err(_) => anyhow::bail!("capture device disconnected"),
            }
        }
        Ok(buf.len())
    }

    fn write(&self, _frame: &[i16]) -> Result<()> {
        anyhow::bail!("capture device does not support write")
    }

    fn set_format(&self) -> Result<()> {
        Ok(())
    }

    fn pause(&self, _paused: bool) {}

    fn device_ref(&self) -> usize {
        self.count.fetch_add(1, Ordering::SeqCst) + 1
    }

    fn unref(&self) -> usize {
        self.count.fetch_sub(1, Ordering::SeqCst) - 1
    }
}

/// Probes the host for a device matching `name`, falling back to the
/// platform default — stands in for the source's fixed ordered list of
/// OSS device paths (`/dev/dsp`, `/dev/dsp0`, …) on a host with no such
/// device-path convention.
fn select_device(direction: Direction, name: Option<&str>) -> Result<cpal::Device> {
    let host = cpal::default_host();
    let mut devices = match direction {
        Direction::Capture => host.input_devices()?,
        Direction::Playback => host.output_devices()?,
    };

    if let Some(name) = name {
        if let Some(found) = devices.find(|d| d.name().ok().as_deref() == Some(name)) {
            return Ok(found);
        }
        warn!("audio device '{name}' not found, falling back to default");
    }

    match direction {
        Direction::Capture => host
            .default_input_device()
            .ok_or_else(|| anyhow::anyhow!("no capture device available")),
        Direction::Playback => host
            .default_output_device()
            .ok_or_else(|| anyhow::anyhow!("no playback device available")),
    }
}
