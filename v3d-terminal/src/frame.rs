/// Cooperative, cancellable frame scheduler
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::debug;

/// Cloneable handle that stops a [`FrameLoop`] before its next frame
#[derive(Debug, Clone, Default)]
pub struct StopHandle(Arc<AtomicBool>);

impl StopHandle {
    pub fn stop(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_stopped(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }
}

/// Set by input handlers when the viewport changes size, consumed once per frame
#[derive(Debug, Clone, Default)]
pub struct ResizeFlag(Arc<AtomicBool>);

impl ResizeFlag {
    pub fn set(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    /// Read and clear the flag
    pub fn take(&self) -> bool {
        self.0.swap(false, Ordering::SeqCst)
    }
}

/// State handed to each frame callback
#[derive(Debug, Clone, Copy)]
pub struct Frame {
    pub index: u64,
    /// The viewport was resized since the previous frame
    pub resized: bool,
    /// Time since the previous frame started
    pub delta: Duration,
}

/// Runs one callback per tick until stopped or the callback fails.
///
/// Each frame runs to completion before the next is scheduled; nothing runs
/// once the stop handle has been triggered.
pub struct FrameLoop {
    interval: Duration,
    stop: StopHandle,
    resize: ResizeFlag,
}

impl FrameLoop {
    pub fn new(fps: u32) -> Self {
        Self {
            interval: Duration::from_secs(1) / fps.max(1),
            stop: StopHandle::default(),
            resize: ResizeFlag::default(),
        }
    }

    pub fn stop_handle(&self) -> StopHandle {
        self.stop.clone()
    }

    pub fn resize_flag(&self) -> ResizeFlag {
        self.resize.clone()
    }

    /// Drive `frame` until stopped. Returns the number of frames run.
    pub fn run<F>(&mut self, mut frame: F) -> io::Result<u64>
    where
        F: FnMut(Frame) -> io::Result<()>,
    {
        let mut index = 0;
        let mut last = Instant::now();

        while !self.stop.is_stopped() {
            let start = Instant::now();
            frame(Frame {
                index,
                resized: self.resize.take(),
                delta: start - last,
            })?;
            index += 1;
            last = start;

            if self.stop.is_stopped() {
                break;
            }
            let elapsed = start.elapsed();
            if elapsed < self.interval {
                std::thread::sleep(self.interval - elapsed);
            }
        }

        debug!("frame loop stopped after {} frames", index);
        Ok(index)
    }
}
