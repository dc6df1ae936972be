// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Reactor adapter for the Wayland socket.

use std::cell::RefCell;
use std::io;
use std::os::fd::OwnedFd;
use std::rc::Rc;

use wayland_client::{Connection, EventQueue};

use stratabar_core::reactor::IoHandler;

use crate::shell::Shell;

/// Drives the Wayland event queue from reactor readiness.
///
/// `on_read` reads and dispatches whatever the socket has, then reports
/// whether any handler flagged a state change, which is what makes the
/// reactor run its batch phase.
pub struct WaylandSource {
    conn: Connection,
    queue: EventQueue<Shell>,
    shell: Rc<RefCell<Shell>>,
}

impl std::fmt::Debug for WaylandSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WaylandSource").finish_non_exhaustive()
    }
}

impl WaylandSource {
    pub(crate) fn new(
        conn: Connection,
        queue: EventQueue<Shell>,
        shell: Rc<RefCell<Shell>>,
    ) -> Self {
        Self { conn, queue, shell }
    }

    /// A pollable duplicate of the connection's socket fd.
    pub fn fd(&self) -> io::Result<OwnedFd> {
        self.conn
            .backend()
            .poll_fd()
            .try_clone_to_owned()
            .map_err(io::Error::from)
    }
}

impl IoHandler for WaylandSource {
    fn on_read(&mut self) -> io::Result<bool> {
        // prepare_read fails when events are already queued; that is not an
        // error, they just need dispatching below.
        if let Some(guard) = self.queue.prepare_read() {
            match guard.read() {
                Ok(_) => {}
                // Another reader drained the socket first.
                Err(wayland_client::backend::WaylandError::Io(error))
                    if error.kind() == io::ErrorKind::WouldBlock => {}
                Err(error) => return Err(io::Error::other(error)),
            }
        }
        let mut shell = self.shell.borrow_mut();
        self.queue
            .dispatch_pending(&mut shell)
            .map_err(io::Error::other)?;
        // Dispatch may have queued requests (acks, binds); push them out so
        // the compositor is not left waiting on our next wakeup.
        self.queue.flush().map_err(io::Error::other)?;
        Ok(shell.take_changed())
    }
}
