//! Background wall-clock timers.
//!
//! Each timer owns one thread. The thread sleeps on its control channel with a deadline, so
//! pause, resume and stop wake it immediately. Cancellation is an `AtomicBool` checked right
//! before every invocation. A stop issued while a callback is running lets that callback finish,
//! and no further invocation happens.
//!
//! ```text
//!  main thread                         timer thread
//!  TimerHandle::pause  ── Pause  ──▶   freeze remaining delay, block on channel
//!  TimerHandle::resume ── Resume ──▶   re-arm deadline with remaining delay
//!  TimerHandle::stop / drop ─ Stop ─▶  exit
//!                                      callback(&TimerControl) may call control.stop()
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::{Duration, Instant};

use bevy::prelude::*;
use crossbeam_channel::{Receiver, RecvTimeoutError, Sender, unbounded};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Signal {
    Pause,
    Resume,
    Stop,
}

/// Cancellation flag shared between a handle, its thread, and its callback.
#[derive(Debug, Clone, Default)]
pub struct TimerControl {
    stopped: Arc<AtomicBool>,
}

impl TimerControl {
    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

/// Owner of a running timer. Dropping it stops the timer.
#[derive(Debug)]
pub struct TimerHandle {
    name: String,
    control: TimerControl,
    signals: Sender<Signal>,
}

impl TimerHandle {
    /// Fire `callback` after `delay`, then every `interval`, until stopped.
    pub fn recurring<F>(
        name: impl Into<String>,
        delay: Duration,
        interval: Duration,
        callback: F,
    ) -> std::io::Result<Self>
    where
        F: FnMut(&TimerControl) + Send + 'static,
    {
        Self::start(name.into(), delay, Some(interval), callback)
    }

    /// Fire `callback` once after `delay`. The timer reports stopped once it has fired.
    pub fn once<F>(name: impl Into<String>, delay: Duration, callback: F) -> std::io::Result<Self>
    where
        F: FnOnce() + Send + 'static,
    {
        let mut callback = Some(callback);
        Self::start(name.into(), delay, None, move |_: &TimerControl| {
            if let Some(callback) = callback.take() {
                callback();
            }
        })
    }

    fn start<F>(
        name: String,
        delay: Duration,
        interval: Option<Duration>,
        callback: F,
    ) -> std::io::Result<Self>
    where
        F: FnMut(&TimerControl) + Send + 'static,
    {
        let (signals, rx) = unbounded();
        let control = TimerControl::default();
        let worker_control = control.clone();

        thread::Builder::new()
            .name(name.clone())
            .spawn(move || run(rx, worker_control, delay, interval, callback))?;

        debug!("timer {name} started");
        Ok(Self {
            name,
            control,
            signals,
        })
    }

    pub fn pause(&self) {
        let _ = self.signals.send(Signal::Pause);
    }

    pub fn resume(&self) {
        let _ = self.signals.send(Signal::Resume);
    }

    pub fn stop(&self) {
        self.control.stop();
        let _ = self.signals.send(Signal::Stop);
    }

    pub fn is_stopped(&self) -> bool {
        self.control.is_stopped()
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for TimerHandle {
    fn drop(&mut self) {
        if !self.is_stopped() {
            debug!("timer {} stopped", self.name);
        }
        self.stop();
    }
}

fn run<F>(
    signals: Receiver<Signal>,
    control: TimerControl,
    delay: Duration,
    interval: Option<Duration>,
    mut callback: F,
) where
    F: FnMut(&TimerControl),
{
    let mut deadline = Instant::now() + delay;
    let mut paused: Option<Duration> = None;

    loop {
        if control.is_stopped() {
            return;
        }

        if let Some(remaining) = paused {
            match signals.recv() {
                Ok(Signal::Resume) => {
                    deadline = Instant::now() + remaining;
                    paused = None;
                }
                Ok(Signal::Pause) => {}
                Ok(Signal::Stop) | Err(_) => return,
            }
            continue;
        }

        let wait = deadline.saturating_duration_since(Instant::now());
        match signals.recv_timeout(wait) {
            Ok(Signal::Pause) => {
                paused = Some(deadline.saturating_duration_since(Instant::now()));
            }
            Ok(Signal::Resume) => {}
            Ok(Signal::Stop) | Err(RecvTimeoutError::Disconnected) => return,
            Err(RecvTimeoutError::Timeout) => {
                if control.is_stopped() {
                    return;
                }
                callback(&control);
                match interval {
                    Some(interval) => deadline += interval,
                    None => {
                        control.stop();
                        return;
                    }
                }
            }
        }
    }
}
