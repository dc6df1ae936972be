// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wall-clock source publishing `time` and `date`.
//!
//! Samples every second but formats to minute precision, so the registry's
//! value comparison suppresses 59 of every 60 ticks.

use std::cell::RefCell;
use std::io;
use std::rc::Rc;
use std::time::Duration;

use chrono::Local;

use stratabar_core::reactor::IoHandler;
use stratabar_core::source::{SourceValue, Sources};

use crate::sources::timer::Timer;

const TIME_FORMAT: &str = "%H:%M";
const DATE_FORMAT: &str = "%a %d %b";

pub(crate) struct ClockSource {
    timer: Timer,
    sources: Rc<RefCell<Sources>>,
}

impl ClockSource {
    pub(crate) fn new(sources: Rc<RefCell<Sources>>) -> io::Result<Self> {
        let source = Self {
            timer: Timer::new(Duration::from_millis(1), Duration::from_secs(1))?,
            sources,
        };
        // Publish immediately so the first frame shows a clock, not a blank.
        source.publish();
        Ok(source)
    }

    pub(crate) fn timer_fd(&self) -> Rc<std::os::fd::OwnedFd> {
        self.timer.fd()
    }

    fn publish(&self) -> bool {
        let now = Local::now();
        let mut sources = self.sources.borrow_mut();
        let time_changed = sources.publish(
            "time",
            SourceValue::Text(now.format(TIME_FORMAT).to_string()),
        );
        let date_changed = sources.publish(
            "date",
            SourceValue::Text(now.format(DATE_FORMAT).to_string()),
        );
        time_changed || date_changed
    }
}

impl IoHandler for ClockSource {
    fn on_read(&mut self) -> io::Result<bool> {
        if !self.timer.tick()? {
            return Ok(false);
        }
        Ok(self.publish())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn initial_publish_populates_time_and_date() {
        let sources = Rc::new(RefCell::new(Sources::new()));
        let _clock = ClockSource::new(Rc::clone(&sources)).expect("timerfd");

        let sources = sources.borrow();
        assert!(
            matches!(sources.get("time"), Some(SourceValue::Text(_))),
            "time published at construction"
        );
        assert!(
            matches!(sources.get("date"), Some(SourceValue::Text(_))),
            "date published at construction"
        );
    }

    #[test]
    fn unchanged_minute_does_not_dirty() {
        let sources = Rc::new(RefCell::new(Sources::new()));
        let clock = ClockSource::new(Rc::clone(&sources)).expect("timerfd");
        let _ = clock.publish();
        let _ = sources.borrow_mut().take_dirty();

        // Re-sampling within the same minute publishes identical text.
        assert!(!clock.publish(), "same formatted value is not a change");
        assert!(sources.borrow_mut().take_dirty().is_empty(), "no dirty names");
    }
}
