// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Wayland backend for stratabar.
//!
//! This crate owns every Wayland protocol object the daemon touches:
//!
//! - Registry binding and output hotplug ([`setup`], [`Shell`])
//! - `wl_shm` buffer pool slots carved out of one memfd
//! - One `zwlr_layer_surface_v1` per (panel, output) pair
//! - A reactor [`IoHandler`](stratabar_core::reactor::IoHandler) adapter for
//!   the connection socket ([`WaylandSource`])
//!
//! Events mutate state; the batch phase draws. The protocol-free state
//! machines these objects feed live in `stratabar_core`.

#![expect(
    unsafe_code,
    reason = "mapping the wl_shm pool memfd requires an unsafe mmap"
)]

mod shell;
mod shm;
mod source;
mod surface;

pub mod setup;

pub use shell::Shell;
pub use shm::ShmError;
pub use source::WaylandSource;
pub use surface::SurfaceKey;
