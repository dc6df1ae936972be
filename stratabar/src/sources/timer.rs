// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Non-blocking timerfd wrapper.

use std::io;
use std::os::fd::OwnedFd;
use std::rc::Rc;
use std::time::Duration;

use rustix::io::Errno;
use rustix::time::{
    Itimerspec, TimerfdClockId, TimerfdFlags, TimerfdTimerFlags, Timespec, timerfd_create,
    timerfd_settime,
};

fn timespec(duration: Duration) -> Timespec {
    Timespec {
        tv_sec: duration.as_secs().try_into().unwrap_or(i64::MAX),
        tv_nsec: duration.subsec_nanos().into(),
    }
}

/// A monotonic interval timer exposed as a pollable fd.
#[derive(Debug)]
pub(crate) struct Timer {
    fd: Rc<OwnedFd>,
}

impl Timer {
    /// Arms a timer that first fires after `initial` and then every
    /// `interval`. `initial` must be non-zero; a zero initial expiry would
    /// leave the timer disarmed.
    pub(crate) fn new(initial: Duration, interval: Duration) -> io::Result<Self> {
        let fd = timerfd_create(
            TimerfdClockId::Monotonic,
            TimerfdFlags::CLOEXEC | TimerfdFlags::NONBLOCK,
        )
        .map_err(io::Error::from)?;
        timerfd_settime(
            &fd,
            TimerfdTimerFlags::empty(),
            &Itimerspec {
                it_interval: timespec(interval),
                it_value: timespec(initial),
            },
        )
        .map_err(io::Error::from)?;
        Ok(Self { fd: Rc::new(fd) })
    }

    /// Shared fd handle for reactor registration.
    pub(crate) fn fd(&self) -> Rc<OwnedFd> {
        Rc::clone(&self.fd)
    }

    /// Consumes pending expirations; false when none were due (spurious
    /// wakeup).
    pub(crate) fn tick(&self) -> io::Result<bool> {
        let mut buf = [0_u8; 8];
        match rustix::io::read(self.fd.as_ref(), &mut buf) {
            Ok(_) => Ok(true),
            Err(Errno::AGAIN) => Ok(false),
            Err(errno) => Err(errno.into()),
        }
    }
}
