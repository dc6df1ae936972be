// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland layer-shell status panel daemon.
//!
//! Startup is synchronous: load configuration, connect to the compositor
//! (two roundtrips settle globals and output names), allocate the buffer
//! pool, arm the source timers, and show the panels. Everything after that
//! is one poll loop: ready fds are drained, sources publish, and a single
//! batch pass turns whatever went dirty into draws.

use std::cell::RefCell;
use std::path::PathBuf;
use std::rc::Rc;

use anyhow::Context as _;
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use stratabar_backend_wayland::WaylandSource;
use stratabar_backend_wayland::setup::{self, PoolOptions};
use stratabar_core::reactor::Reactor;
use stratabar_core::source::Sources;

mod config;
mod control;
mod manager;
mod render;
mod sources;

use control::ControlSocket;
use manager::Manager;
use sources::datetime::ClockSource;
use sources::network::NetworkSource;
use sources::power::PowerSource;

#[derive(Debug, Parser)]
#[command(version, about = "Wayland layer-shell status panel daemon")]
struct Args {
    /// Configuration file; defaults to $XDG_CONFIG_HOME/stratabar/config.toml.
    #[arg(long)]
    config: Option<PathBuf>,
    /// Start with panels unmapped; send `show` to the control socket later.
    #[arg(long)]
    start_hidden: bool,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();
    let args = Args::parse();

    let config = config::load(args.config.as_deref()).context("loading configuration")?;
    let panels = config::build_panels(&config).context("building panels")?;

    let (shell, wayland) = setup::connect(PoolOptions {
        buffers: config.pool.buffers,
        width: config.pool.width,
        height: config.pool.height,
    })
    .context("connecting to the compositor")?;

    let sources = Rc::new(RefCell::new(Sources::new()));
    let mut reactor = Reactor::new();

    let wayland_fd = Rc::new(wayland.fd().context("cloning the wayland socket fd")?);
    let wayland = Rc::new(RefCell::new(wayland));
    reactor.register(
        wayland_fd,
        "wayland",
        Rc::<RefCell<WaylandSource>>::downgrade(&wayland),
    )?;

    let clock = Rc::new(RefCell::new(
        ClockSource::new(Rc::clone(&sources)).context("arming the clock timer")?,
    ));
    reactor.register(
        clock.borrow().timer_fd(),
        "clock",
        Rc::<RefCell<ClockSource>>::downgrade(&clock),
    )?;

    let power = Rc::new(RefCell::new(
        PowerSource::new(Rc::clone(&sources)).context("arming the power timer")?,
    ));
    reactor.register(
        power.borrow().timer_fd(),
        "power",
        Rc::<RefCell<PowerSource>>::downgrade(&power),
    )?;

    let network = Rc::new(RefCell::new(
        NetworkSource::new(Rc::clone(&sources)).context("arming the network timer")?,
    ));
    reactor.register(
        network.borrow().timer_fd(),
        "network",
        Rc::<RefCell<NetworkSource>>::downgrade(&network),
    )?;

    let manager = Rc::new(RefCell::new(Manager::new(shell, sources, panels)));
    reactor.register_batch(Rc::<RefCell<Manager>>::downgrade(&manager));

    // Visibility control is best-effort; the daemon is useful without it.
    let control = match ControlSocket::bind(Rc::clone(&manager)) {
        Ok(control) => {
            let control = Rc::new(RefCell::new(control));
            let fd = control.borrow().fd().context("cloning the control fd")?;
            reactor.register(
                Rc::new(fd),
                "control",
                Rc::<RefCell<ControlSocket>>::downgrade(&control),
            )?;
            Some(control)
        }
        Err(error) => {
            warn!(%error, "control socket unavailable");
            None
        }
    };

    if !args.start_hidden {
        manager.borrow_mut().show();
    }

    let result = reactor.run().context("event loop failed");
    drop(control);
    result
}
