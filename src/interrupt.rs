//! Cooperative cancellation for long scans.
//!
//! Scans never block on the probe: they poll it once every `interval`
//! iterations through an [`InterruptCheck`] and bail out with
//! [`SamplingError::Cancelled`] as soon as it fires.

use crate::error::{Result, SamplingError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// Default number of iterations between two probe polls.
pub const DEFAULT_CHECK_INTERVAL: usize = 10_000;

/// Something a scan can ask whether the user wants it to stop.
pub trait Interrupt {
    fn is_interrupted(&self) -> bool;
}

/// A probe that never fires.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverInterrupt;

impl Interrupt for NeverInterrupt {
    fn is_interrupted(&self) -> bool {
        false
    }
}

impl<F: Fn() -> bool> Interrupt for F {
    fn is_interrupted(&self) -> bool {
        self()
    }
}

/// A flag shared with whoever may cancel the scan.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }
}

impl Interrupt for CancelFlag {
    fn is_interrupted(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Fires once a wall-clock deadline has passed.
#[derive(Debug, Clone, Copy)]
pub struct Deadline(pub Instant);

impl Interrupt for Deadline {
    fn is_interrupted(&self) -> bool {
        Instant::now() >= self.0
    }
}

/// Polls an [`Interrupt`] at a fixed cadence.
pub struct InterruptCheck<'a> {
    probe: &'a dyn Interrupt,
    interval: usize,
    counter: usize,
}

impl<'a> InterruptCheck<'a> {
    pub fn new(probe: &'a dyn Interrupt, interval: usize) -> Self {
        Self { probe, interval: interval.max(1), counter: 0 }
    }

    /// Counts one iteration; every `interval` iterations the probe is polled.
    #[inline(always)]
    pub fn tick(&mut self) -> Result<()> {
        self.counter += 1;
        if self.counter >= self.interval {
            self.counter = 0;
            if self.probe.is_interrupted() {
                log::debug!("Interrupt probe fired, aborting scan.");
                return Err(SamplingError::Cancelled);
            }
        }
        Ok(())
    }
}
