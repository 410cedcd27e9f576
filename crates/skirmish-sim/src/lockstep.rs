//! Leading/trailing instance pair used to verify determinism at runtime.
//!
//! Both instances are built from the same config and fed the same commands.
//! The trailing instance runs a fixed number of frames behind; each time it
//! steps, its hash is compared with the one the leading instance recorded for
//! that frame. The instances share nothing: the only link between them is the
//! `(frame, hash)` history kept here.

use std::collections::VecDeque;

use thiserror::Error;
use tracing::{error, trace};

use skirmish_core::commands::Command;
use skirmish_core::state::TickReport;

use crate::engine::{SimConfig, Simulation};
use crate::queue::QueueError;

/// The trailing instance disagreed with the leading one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("desync at frame {frame}: leading {leading:016x}, trailing {trailing:016x}")]
pub struct Desync {
    pub frame: u64,
    pub leading: u64,
    pub trailing: u64,
}

pub struct TrailingPair {
    leading: Simulation,
    trailing: Simulation,
    delay: u64,
    /// Leading hashes not yet checked by the trailing instance.
    history: VecDeque<(u64, u64)>,
}

impl TrailingPair {
    pub fn new(config: SimConfig, delay: u64) -> Self {
        Self {
            leading: Simulation::new(config.clone()),
            trailing: Simulation::new(config),
            delay,
            history: VecDeque::new(),
        }
    }

    /// Queue a command on both instances. The leading instance decides
    /// staleness; the trailing one is always further behind.
    pub fn enqueue(&mut self, command: Command) -> Result<(), QueueError> {
        self.leading.enqueue(command.clone())?;
        self.trailing.enqueue(command)
    }

    /// Step the leading instance once, then let the trailing instance catch up
    /// to `delay` frames behind.
    pub fn step(&mut self) -> Result<TickReport, Desync> {
        let report = self.leading.tick();
        self.history.push_back((report.frame, report.hash));
        while self.leading.frame() - self.trailing.frame() > self.delay {
            self.step_trailing()?;
        }
        Ok(report)
    }

    /// Bring the trailing instance level with the leading one, checking every
    /// remaining frame.
    pub fn finish(&mut self) -> Result<(), Desync> {
        while self.trailing.frame() < self.leading.frame() {
            self.step_trailing()?;
        }
        Ok(())
    }

    fn step_trailing(&mut self) -> Result<(), Desync> {
        let report = self.trailing.tick();
        let Some((frame, leading)) = self.history.pop_front() else {
            error!(frame = report.frame, "trailing instance ran ahead of history");
            debug_assert!(false, "trailing instance ran ahead of history");
            return Ok(());
        };
        debug_assert_eq!(frame, report.frame);
        if leading != report.hash {
            error!(
                frame,
                leading = format_args!("{leading:016x}"),
                trailing = format_args!("{:016x}", report.hash),
                "desync"
            );
            return Err(Desync {
                frame,
                leading,
                trailing: report.hash,
            });
        }
        trace!(frame, "frame verified");
        Ok(())
    }

    pub fn leading(&self) -> &Simulation {
        &self.leading
    }

    pub fn trailing(&self) -> &Simulation {
        &self.trailing
    }

    #[cfg(test)]
    pub(crate) fn trailing_mut(&mut self) -> &mut Simulation {
        &mut self.trailing
    }

    pub fn delay(&self) -> u64 {
        self.delay
    }
}
