// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Power-supply source reading `/sys/class/power_supply`.
//!
//! Samples once a second after startup and every thirty seconds thereafter;
//! capacity moves slowly and the registry drops unchanged samples anyway. A
//! machine without the battery attributes publishes nothing, which leaves
//! battery widgets empty rather than wrong.

use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use stratabar_core::reactor::IoHandler;
use stratabar_core::source::{SourceValue, Sources};

use crate::sources::{read_sysfs, timer::Timer};

const AC_ONLINE: &str = "/sys/class/power_supply/AC/online";
const BATTERY_CAPACITY: &str = "/sys/class/power_supply/BAT0/capacity";
const BATTERY_STATUS: &str = "/sys/class/power_supply/BAT0/status";

fn parse_online(text: &str) -> bool {
    text == "1"
}

fn parse_capacity(text: &str) -> Option<u8> {
    text.parse::<u8>().ok().map(|value| value.min(100))
}

fn parse_charging(text: &str) -> bool {
    text == "Charging"
}

fn sample() -> Option<SourceValue> {
    let capacity = read_sysfs(Path::new(BATTERY_CAPACITY)).and_then(|text| parse_capacity(&text));
    let status = read_sysfs(Path::new(BATTERY_STATUS));
    let online = read_sysfs(Path::new(AC_ONLINE));
    // No battery capacity attribute: nothing meaningful to report.
    let capacity = capacity?;
    Some(SourceValue::Power {
        plugged: online.as_deref().is_some_and(parse_online),
        charging: status.as_deref().is_some_and(parse_charging),
        capacity,
    })
}

pub(crate) struct PowerSource {
    timer: Timer,
    sources: Rc<RefCell<Sources>>,
}

impl PowerSource {
    pub(crate) fn new(sources: Rc<RefCell<Sources>>) -> io::Result<Self> {
        let source = Self {
            timer: Timer::new(Duration::from_secs(1), Duration::from_secs(30))?,
            sources,
        };
        if let Some(value) = sample() {
            source.sources.borrow_mut().publish("power", value);
        }
        Ok(source)
    }

    pub(crate) fn timer_fd(&self) -> Rc<std::os::fd::OwnedFd> {
        self.timer.fd()
    }
}

impl IoHandler for PowerSource {
    fn on_read(&mut self) -> io::Result<bool> {
        if !self.timer.tick()? {
            return Ok(false);
        }
        match sample() {
            Some(value) => Ok(self.sources.borrow_mut().publish("power", value)),
            None => Ok(false),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn capacity_parses_and_clamps() {
        assert_eq!(parse_capacity("87"), Some(87));
        assert_eq!(parse_capacity("100"), Some(100));
        assert_eq!(parse_capacity("0"), Some(0));
        assert_eq!(parse_capacity("103"), Some(100), "kernel can overshoot");
        assert_eq!(parse_capacity(""), None, "empty attribute");
        assert_eq!(parse_capacity("8x"), None, "garbage attribute");
    }

    #[test]
    fn online_and_status_parse_strictly() {
        assert!(parse_online("1"));
        assert!(!parse_online("0"));
        assert!(!parse_online("yes"), "only the kernel's 0/1 form");

        assert!(parse_charging("Charging"));
        assert!(!parse_charging("Discharging"));
        assert!(!parse_charging("Full"));
    }
}
