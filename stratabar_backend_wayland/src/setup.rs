// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Connection bring-up.
//!
//! Connecting is the one synchronous part of the daemon: two blocking
//! roundtrips settle the registry and the output names, the required globals
//! are checked, and the buffer pool is allocated. Everything after
//! [`connect`] returns is event-driven.

use std::cell::RefCell;
use std::rc::Rc;

use tracing::info;
use wayland_client::{ConnectError, Connection, DispatchError};

use crate::shell::Shell;
use crate::shm::{ShmError, ShmPool};
use crate::source::WaylandSource;

/// Buffer pool geometry, decided by configuration.
#[derive(Clone, Copy, Debug)]
pub struct PoolOptions {
    /// Number of slots shared by all panels on all outputs.
    pub buffers: usize,
    /// Slot width in pixels.
    pub width: u32,
    /// Slot height in pixels.
    pub height: u32,
}

/// Connection bring-up failure.
#[derive(Debug, thiserror::Error)]
pub enum SetupError {
    /// No usable Wayland socket in the environment.
    #[error("connecting to the wayland display failed")]
    Connect(#[from] ConnectError),
    /// The initial roundtrips failed.
    #[error("initial roundtrip failed")]
    Roundtrip(#[source] DispatchError),
    /// The compositor does not speak a protocol the daemon requires.
    #[error("compositor is missing the {0} global")]
    MissingGlobal(&'static str),
    /// The shared-memory pool could not be allocated.
    #[error(transparent)]
    Shm(#[from] ShmError),
}

/// Connects to the compositor and prepares the shell for the reactor.
///
/// On return all required globals are bound, every output advertised at
/// startup is already named, and the pool is allocated. The shell handle is
/// shared with the returned source; the caller keeps the other reference.
pub fn connect(pool: PoolOptions) -> Result<(Rc<RefCell<Shell>>, WaylandSource), SetupError> {
    let conn = Connection::connect_to_env()?;
    let mut queue = conn.new_event_queue();
    let qh = queue.handle();
    let mut shell = Shell::new(&conn, qh.clone());

    // First roundtrip delivers the globals; the second delivers the name
    // events for the outputs the first one bound.
    queue.roundtrip(&mut shell).map_err(SetupError::Roundtrip)?;
    queue.roundtrip(&mut shell).map_err(SetupError::Roundtrip)?;

    if let Some(interface) = shell.missing_global() {
        return Err(SetupError::MissingGlobal(interface));
    }
    let shm = shell
        .shm()
        .cloned()
        .ok_or(SetupError::MissingGlobal("wl_shm"))?;
    shell.install_pool(ShmPool::new(
        &shm,
        &qh,
        pool.buffers,
        pool.width,
        pool.height,
    )?);
    info!(
        outputs = ?shell.output_names(),
        buffers = pool.buffers,
        "connected to the compositor"
    );

    // Startup naming already happened inside the roundtrips; the manager
    // reads the initial output set directly, so the queued added events and
    // the changed flag would only double-report it.
    let _ = shell.drain_added();
    let _ = shell.take_changed();

    let shell = Rc::new(RefCell::new(shell));
    let source = WaylandSource::new(conn, queue, Rc::clone(&shell));
    Ok((shell, source))
}
