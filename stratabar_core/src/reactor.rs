// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Event reactor: fd multiplexing with batch-completion notification.
//!
//! The reactor blocks in `poll(2)` with no timeout, services every fd the OS
//! reports ready, and only then — if at least one handler reported a
//! user-visible change — runs each registered batch handler exactly once.
//! This is the core efficiency property of the daemon: a timer tick and a
//! socket event arriving in the same wakeup cause one redraw pass, not two.
//!
//! # Ownership
//!
//! The component that creates a handler owns it; the reactor keeps only a
//! [`Weak`] back-reference plus a shared [`OwnedFd`] handle. A handler may
//! deregister itself mid-cycle simply by being dropped: the failed upgrade is
//! observed after dispatch and the registration pruned, and the descriptor
//! closes once the last `Rc<OwnedFd>` clone goes away. Nothing is closed
//! while dispatch is still walking the ready set.

use std::cell::RefCell;
use std::io;
use std::os::fd::{AsRawFd, OwnedFd, RawFd};
use std::rc::{Rc, Weak};

use rustix::event::{PollFd, PollFlags, poll};
use tracing::{debug, warn};

/// A readable-interest fd handler.
///
/// `on_read` drains the descriptor (reads must be non-blocking; a would-block
/// result is "no data yet", not an error) and reports whether the read
/// produced a user-visible change — i.e. whether a source became dirty.
pub trait IoHandler {
    /// Services one readiness notification.
    fn on_read(&mut self) -> io::Result<bool>;
}

/// A handler invoked at most once per wakeup, after all ready fds have been
/// serviced, and only when at least one [`IoHandler::on_read`] returned true.
pub trait BatchHandler {
    /// Runs the coalesced post-drain work for this wakeup.
    fn on_batch_processed(&mut self);
}

/// Reactor registration or dispatch failure.
#[derive(Debug, thiserror::Error)]
pub enum ReactorError {
    /// The fd is already registered with another handler.
    #[error("descriptor {0} is already registered")]
    DuplicateFd(RawFd),
    /// The OS readiness wait failed.
    #[error("poll failed")]
    Poll(#[source] io::Error),
}

struct IoRegistration {
    fd: Rc<OwnedFd>,
    name: String,
    handler: Weak<RefCell<dyn IoHandler>>,
}

/// Single-threaded poll-based event reactor.
#[derive(Default)]
pub struct Reactor {
    io: Vec<IoRegistration>,
    batch: Vec<Weak<RefCell<dyn BatchHandler>>>,
}

impl std::fmt::Debug for Reactor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reactor")
            .field("io_handlers", &self.io.len())
            .field("batch_handlers", &self.batch.len())
            .finish()
    }
}

impl Reactor {
    /// Creates an empty reactor.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `handler` for readable interest on `fd`.
    ///
    /// The caller keeps ownership of the handler; registration is dropped
    /// automatically once the owning [`Rc`] is gone. Registering the same
    /// descriptor twice is rejected.
    pub fn register(
        &mut self,
        fd: Rc<OwnedFd>,
        name: impl Into<String>,
        handler: Weak<RefCell<dyn IoHandler>>,
    ) -> Result<(), ReactorError> {
        let raw = fd.as_raw_fd();
        if self.io.iter().any(|reg| reg.fd.as_raw_fd() == raw) {
            return Err(ReactorError::DuplicateFd(raw));
        }
        let name = name.into();
        debug!(fd = raw, %name, "registered i/o handler");
        self.io.push(IoRegistration { fd, name, handler });
        Ok(())
    }

    /// Registers a batch handler, invoked once per wakeup after all ready
    /// fds have been drained.
    pub fn register_batch(&mut self, handler: Weak<RefCell<dyn BatchHandler>>) {
        self.batch.push(handler);
    }

    /// Number of live i/o registrations.
    #[must_use]
    pub fn io_handler_count(&self) -> usize {
        self.io.len()
    }

    /// Blocks until at least one fd is ready, services the whole ready set,
    /// then runs batch handlers once if any handler reported a change.
    ///
    /// Returns whether the batch handlers ran. A handler that fails with an
    /// I/O error is logged and deregistered; it never takes down the loop.
    pub fn turn(&mut self) -> Result<bool, ReactorError> {
        // Clone the fd handles so handler dispatch below can't invalidate
        // what poll borrowed.
        let fds: Vec<Rc<OwnedFd>> = self.io.iter().map(|reg| Rc::clone(&reg.fd)).collect();
        let mut poll_fds: Vec<PollFd<'_>> = fds
            .iter()
            .map(|fd| PollFd::new(fd.as_ref(), PollFlags::IN))
            .collect();
        poll(&mut poll_fds, None).map_err(|errno| ReactorError::Poll(errno.into()))?;

        let mut changed = false;
        let mut dead = Vec::new();
        for (index, poll_fd) in poll_fds.iter().enumerate() {
            // Error and hangup conditions are serviced like readable ones;
            // the handler's read surfaces the failure.
            if poll_fd.revents().is_empty() {
                continue;
            }
            let registration = &self.io[index];
            let Some(handler) = registration.handler.upgrade() else {
                dead.push(index);
                continue;
            };
            match handler.borrow_mut().on_read() {
                Ok(dirty) => changed |= dirty,
                Err(error) => {
                    warn!(name = %registration.name, %error, "i/o handler failed, deregistering");
                    dead.push(index);
                }
            }
        }
        drop(poll_fds);

        for index in dead.into_iter().rev() {
            let registration = self.io.remove(index);
            debug!(name = %registration.name, "removed i/o handler");
        }

        if changed {
            self.batch.retain(|weak| match weak.upgrade() {
                Some(handler) => {
                    handler.borrow_mut().on_batch_processed();
                    true
                }
                None => false,
            });
        }
        Ok(changed)
    }

    /// Runs the reactor until a poll failure.
    pub fn run(&mut self) -> Result<(), ReactorError> {
        loop {
            self.turn()?;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rustix::pipe::{PipeFlags, pipe_with};

    struct PipeHandler {
        fd: Rc<OwnedFd>,
        reads: usize,
        report_change: bool,
        fail: bool,
    }

    impl PipeHandler {
        fn new(fd: Rc<OwnedFd>, report_change: bool) -> Rc<RefCell<Self>> {
            Rc::new(RefCell::new(Self {
                fd,
                reads: 0,
                report_change,
                fail: false,
            }))
        }
    }

    impl IoHandler for PipeHandler {
        fn on_read(&mut self) -> io::Result<bool> {
            if self.fail {
                return Err(io::Error::other("boom"));
            }
            let mut buf = [0_u8; 16];
            let _ = rustix::io::read(self.fd.as_ref(), &mut buf);
            self.reads += 1;
            Ok(self.report_change)
        }
    }

    struct CountingBatch {
        runs: usize,
    }

    impl BatchHandler for CountingBatch {
        fn on_batch_processed(&mut self) {
            self.runs += 1;
        }
    }

    fn nonblocking_pipe() -> (Rc<OwnedFd>, OwnedFd) {
        let (read_end, write_end) =
            pipe_with(PipeFlags::CLOEXEC | PipeFlags::NONBLOCK).expect("pipe_with");
        (Rc::new(read_end), write_end)
    }

    fn write_byte(fd: &OwnedFd) {
        rustix::io::write(fd, &[1_u8]).expect("pipe write");
    }

    #[test]
    fn batch_runs_once_when_multiple_handlers_change_in_one_wakeup() {
        let mut reactor = Reactor::new();
        let (read_a, write_a) = nonblocking_pipe();
        let (read_b, write_b) = nonblocking_pipe();
        let handler_a = PipeHandler::new(Rc::clone(&read_a), true);
        let handler_b = PipeHandler::new(Rc::clone(&read_b), true);
        reactor
            .register(read_a, "a", Rc::<RefCell<PipeHandler>>::downgrade(&handler_a))
            .expect("register a");
        reactor
            .register(read_b, "b", Rc::<RefCell<PipeHandler>>::downgrade(&handler_b))
            .expect("register b");
        let batch = Rc::new(RefCell::new(CountingBatch { runs: 0 }));
        reactor.register_batch(Rc::<RefCell<CountingBatch>>::downgrade(&batch));

        write_byte(&write_a);
        write_byte(&write_b);
        let ran = reactor.turn().expect("turn");

        assert!(ran, "batch should have run");
        assert_eq!(handler_a.borrow().reads, 1, "handler a serviced once");
        assert_eq!(handler_b.borrow().reads, 1, "handler b serviced once");
        assert_eq!(
            batch.borrow().runs,
            1,
            "two simultaneous changes coalesce into one batch"
        );
    }

    #[test]
    fn no_batch_when_every_ready_handler_reports_no_change() {
        let mut reactor = Reactor::new();
        let (read_end, write_end) = nonblocking_pipe();
        let handler = PipeHandler::new(Rc::clone(&read_end), false);
        reactor
            .register(read_end, "quiet", Rc::<RefCell<PipeHandler>>::downgrade(&handler))
            .expect("register");
        let batch = Rc::new(RefCell::new(CountingBatch { runs: 0 }));
        reactor.register_batch(Rc::<RefCell<CountingBatch>>::downgrade(&batch));

        write_byte(&write_end);
        let ran = reactor.turn().expect("turn");

        assert!(!ran, "no handler changed state");
        assert_eq!(handler.borrow().reads, 1, "handler still serviced");
        assert_eq!(batch.borrow().runs, 0, "batch must not fire");
    }

    #[test]
    fn unchanged_handler_coexists_with_changed_one() {
        let mut reactor = Reactor::new();
        let (read_a, write_a) = nonblocking_pipe();
        let (read_b, write_b) = nonblocking_pipe();
        let quiet = PipeHandler::new(Rc::clone(&read_a), false);
        let noisy = PipeHandler::new(Rc::clone(&read_b), true);
        reactor
            .register(read_a, "quiet", Rc::<RefCell<PipeHandler>>::downgrade(&quiet))
            .expect("register quiet");
        reactor
            .register(read_b, "noisy", Rc::<RefCell<PipeHandler>>::downgrade(&noisy))
            .expect("register noisy");
        let batch = Rc::new(RefCell::new(CountingBatch { runs: 0 }));
        reactor.register_batch(Rc::<RefCell<CountingBatch>>::downgrade(&batch));

        write_byte(&write_a);
        write_byte(&write_b);
        reactor.turn().expect("turn");

        assert_eq!(batch.borrow().runs, 1, "batch fires once if any changed");
    }

    #[test]
    fn duplicate_descriptor_registration_is_rejected() {
        let mut reactor = Reactor::new();
        let (read_end, _write_end) = nonblocking_pipe();
        let handler = PipeHandler::new(Rc::clone(&read_end), true);
        reactor
            .register(Rc::clone(&read_end), "first", Rc::<RefCell<PipeHandler>>::downgrade(&handler))
            .expect("first registration");

        let result = reactor.register(read_end, "second", Rc::<RefCell<PipeHandler>>::downgrade(&handler));
        assert!(
            matches!(result, Err(ReactorError::DuplicateFd(_))),
            "second registration on the same fd must fail"
        );
        assert_eq!(reactor.io_handler_count(), 1, "only one registration kept");
    }

    #[test]
    fn failing_handler_is_deregistered_without_stopping_the_loop() {
        let mut reactor = Reactor::new();
        let (read_end, write_end) = nonblocking_pipe();
        let handler = PipeHandler::new(Rc::clone(&read_end), true);
        handler.borrow_mut().fail = true;
        reactor
            .register(read_end, "flaky", Rc::<RefCell<PipeHandler>>::downgrade(&handler))
            .expect("register");

        write_byte(&write_end);
        let ran = reactor.turn().expect("turn survives handler error");

        assert!(!ran, "failed handler reports no change");
        assert_eq!(reactor.io_handler_count(), 0, "handler removed after error");
    }

    #[test]
    fn dropped_handler_is_pruned_after_dispatch() {
        let mut reactor = Reactor::new();
        let (read_end, write_end) = nonblocking_pipe();
        let handler = PipeHandler::new(Rc::clone(&read_end), true);
        reactor
            .register(read_end, "gone", Rc::<RefCell<PipeHandler>>::downgrade(&handler))
            .expect("register");
        drop(handler);

        write_byte(&write_end);
        reactor.turn().expect("turn");

        assert_eq!(reactor.io_handler_count(), 0, "dead registration pruned");
    }
}
