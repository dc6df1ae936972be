// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Network source scanning `/sys/class/net` for interfaces that are up.

use std::cell::RefCell;
use std::io;
use std::path::Path;
use std::rc::Rc;
use std::time::Duration;

use stratabar_core::reactor::IoHandler;
use stratabar_core::source::{SourceValue, Sources};

use crate::sources::{read_sysfs, timer::Timer};

const NET_CLASS: &str = "/sys/class/net";

fn is_active(name: &str, operstate: Option<&str>) -> bool {
    name != "lo" && operstate == Some("up")
}

fn scan() -> Vec<String> {
    let Ok(entries) = std::fs::read_dir(NET_CLASS) else {
        return Vec::new();
    };
    let mut active: Vec<String> = entries
        .filter_map(|entry| {
            let entry = entry.ok()?;
            let name = entry.file_name().into_string().ok()?;
            let operstate = read_sysfs(&Path::new(NET_CLASS).join(&name).join("operstate"));
            is_active(&name, operstate.as_deref()).then_some(name)
        })
        .collect();
    // Directory order is arbitrary; sort so equal interface sets compare
    // equal in the registry.
    active.sort();
    active
}

pub(crate) struct NetworkSource {
    timer: Timer,
    sources: Rc<RefCell<Sources>>,
}

impl NetworkSource {
    pub(crate) fn new(sources: Rc<RefCell<Sources>>) -> io::Result<Self> {
        let source = Self {
            timer: Timer::new(Duration::from_secs(1), Duration::from_secs(10))?,
            sources,
        };
        source
            .sources
            .borrow_mut()
            .publish("network", SourceValue::Networks(scan()));
        Ok(source)
    }

    pub(crate) fn timer_fd(&self) -> Rc<std::os::fd::OwnedFd> {
        self.timer.fd()
    }
}

impl IoHandler for NetworkSource {
    fn on_read(&mut self) -> io::Result<bool> {
        if !self.timer.tick()? {
            return Ok(false);
        }
        Ok(self
            .sources
            .borrow_mut()
            .publish("network", SourceValue::Networks(scan())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loopback_and_down_interfaces_are_filtered() {
        assert!(is_active("wlan0", Some("up")));
        assert!(!is_active("lo", Some("up")), "loopback excluded");
        assert!(!is_active("eth0", Some("down")), "down link excluded");
        assert!(
            !is_active("eth0", Some("unknown")),
            "indeterminate state excluded"
        );
        assert!(!is_active("eth0", None), "missing operstate excluded");
    }
}
