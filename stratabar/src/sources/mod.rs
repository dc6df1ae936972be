// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Source producers: timer-driven readers that publish into [`Sources`].
//!
//! Each producer owns a timerfd, implements
//! [`IoHandler`](stratabar_core::reactor::IoHandler), and on every expiry
//! samples the outside world and publishes. The registry decides dirtiness by
//! value comparison, so a producer that keeps reading the same state causes
//! no redraws.
//!
//! [`Sources`]: stratabar_core::source::Sources

use std::path::Path;

use rustix::fs::{Mode, OFlags, open};
use rustix::io::Errno;
use tracing::{debug, warn};

pub(crate) mod datetime;
pub(crate) mod network;
pub(crate) mod power;
pub(crate) mod timer;

/// Upper bound for one sysfs value; real entries are a few bytes.
const SYSFS_READ_MAX: usize = 512;

/// Reads a small sysfs attribute without ever blocking the reactor.
///
/// Returns the trimmed content, or `None` when the attribute is absent or
/// unreadable; a machine without a battery simply has no such files.
pub(crate) fn read_sysfs(path: &Path) -> Option<String> {
    let fd = match open(path, OFlags::RDONLY | OFlags::NONBLOCK | OFlags::CLOEXEC, Mode::empty()) {
        Ok(fd) => fd,
        Err(errno) => {
            debug!(path = %path.display(), %errno, "sysfs attribute not readable");
            return None;
        }
    };
    let mut buf = [0_u8; SYSFS_READ_MAX];
    let len = match rustix::io::read(&fd, &mut buf) {
        Ok(len) => len,
        Err(Errno::AGAIN) => {
            warn!(path = %path.display(), "sysfs read would block, skipping");
            return None;
        }
        Err(errno) => {
            warn!(path = %path.display(), %errno, "sysfs read failed");
            return None;
        }
    };
    if len == SYSFS_READ_MAX {
        warn!(path = %path.display(), "sysfs value exceeds read buffer, skipping");
        return None;
    }
    match std::str::from_utf8(&buf[..len]) {
        Ok(text) => Some(text.trim().to_owned()),
        Err(_) => {
            warn!(path = %path.display(), "sysfs value is not utf-8");
            None
        }
    }
}
