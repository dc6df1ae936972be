// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Datagram control socket for `show`/`hide`/`toggle`.
//!
//! The daemon listens on `$XDG_RUNTIME_DIR/stratabar.sock`; anything that can
//! write a datagram can drive visibility, e.g.
//! `echo toggle | socat - UNIX-SENDTO:$XDG_RUNTIME_DIR/stratabar.sock`.
//! A stale socket from a previous run is unlinked at bind time.

use std::cell::RefCell;
use std::io;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixDatagram;
use std::path::PathBuf;
use std::rc::Rc;

use tracing::{info, warn};

use stratabar_core::reactor::IoHandler;

use crate::manager::Manager;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Command {
    Show,
    Hide,
    Toggle,
}

impl Command {
    pub(crate) fn parse(bytes: &[u8]) -> Option<Self> {
        match std::str::from_utf8(bytes).ok()?.trim() {
            "show" => Some(Self::Show),
            "hide" => Some(Self::Hide),
            "toggle" => Some(Self::Toggle),
            _ => None,
        }
    }
}

fn socket_path() -> PathBuf {
    let base = std::env::var_os("XDG_RUNTIME_DIR")
        .map(PathBuf::from)
        .unwrap_or_else(std::env::temp_dir);
    base.join("stratabar.sock")
}

/// Visibility control endpoint, serviced by the reactor.
pub(crate) struct ControlSocket {
    socket: UnixDatagram,
    path: PathBuf,
    manager: Rc<RefCell<Manager>>,
}

impl ControlSocket {
    pub(crate) fn bind(manager: Rc<RefCell<Manager>>) -> io::Result<Self> {
        let path = socket_path();
        match std::fs::remove_file(&path) {
            Ok(()) => warn!(path = %path.display(), "unlinked stale control socket"),
            Err(error) if error.kind() == io::ErrorKind::NotFound => {}
            Err(error) => return Err(error),
        }
        let socket = UnixDatagram::bind(&path)?;
        socket.set_nonblocking(true)?;
        info!(path = %path.display(), "control socket ready");
        Ok(Self {
            socket,
            path,
            manager,
        })
    }

    /// A pollable duplicate of the socket fd.
    pub(crate) fn fd(&self) -> io::Result<OwnedFd> {
        self.socket.try_clone().map(OwnedFd::from)
    }

    fn apply(&self, command: Command) {
        let mut manager = self.manager.borrow_mut();
        match command {
            Command::Show => manager.show(),
            Command::Hide => manager.hide(),
            Command::Toggle => manager.toggle(),
        }
    }
}

impl IoHandler for ControlSocket {
    fn on_read(&mut self) -> io::Result<bool> {
        let mut buf = [0_u8; 64];
        loop {
            match self.socket.recv(&mut buf) {
                Ok(len) => match Command::parse(&buf[..len]) {
                    Some(command) => {
                        info!(?command, "control command");
                        self.apply(command);
                    }
                    None => warn!("ignoring malformed control datagram"),
                },
                Err(error) if error.kind() == io::ErrorKind::WouldBlock => break,
                Err(error) => return Err(error),
            }
        }
        // Visibility commands draw and flush synchronously; no batch needed.
        Ok(false)
    }
}

impl Drop for ControlSocket {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.path);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_parse_with_surrounding_whitespace() {
        assert_eq!(Command::parse(b"show"), Some(Command::Show));
        assert_eq!(Command::parse(b"hide\n"), Some(Command::Hide));
        assert_eq!(Command::parse(b"  toggle  "), Some(Command::Toggle));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(Command::parse(b"raise"), None, "unknown verb");
        assert_eq!(Command::parse(b""), None, "empty datagram");
        assert_eq!(Command::parse(&[0xff, 0xfe]), None, "not utf-8");
    }
}
