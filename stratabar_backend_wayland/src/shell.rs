// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Compositor-facing protocol state.
//!
//! [`Shell`] is the single dispatch target for every Wayland event the daemon
//! handles: registry globals coming and going, output naming, buffer
//! releases, and layer-surface configures. Protocol events only mutate state
//! and set a per-batch `changed` flag; actual drawing happens later, from the
//! batch phase, through the imperative methods ([`present`](Shell::present),
//! [`hide_all`](Shell::hide_all) and friends).

use std::collections::HashMap;

use tracing::{debug, info, warn};
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_output::{self, WlOutput};
use wayland_client::protocol::wl_registry::{self, WlRegistry};
use wayland_client::protocol::wl_shm::WlShm;
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Connection, Dispatch, Proxy, QueueHandle, delegate_noop};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::ZwlrLayerShellV1;
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_surface_v1::{
    self, ZwlrLayerSurfaceV1,
};

use stratabar_core::output::{NameOutcome, OutputDirectory};
use stratabar_core::paint::{DrawContext, Size};
use stratabar_core::panel::Anchor;
use stratabar_core::pool::SlotId;

use crate::shm::ShmPool;
use crate::surface::{Frame, PanelSurface, SurfaceKey};

/// One output's protocol handle and its per-panel surface cache.
#[derive(Debug)]
struct OutputSlot {
    wl_output: WlOutput,
    surfaces: HashMap<usize, PanelSurface>,
}

/// All Wayland-side state, and the dispatch target for the event queue.
#[derive(Debug)]
pub struct Shell {
    qh: QueueHandle<Self>,
    conn: Connection,
    compositor: Option<WlCompositor>,
    shm: Option<WlShm>,
    layer_shell: Option<ZwlrLayerShellV1>,
    outputs: OutputDirectory<OutputSlot>,
    pool: Option<ShmPool>,
    added: Vec<String>,
    removed: Vec<String>,
    changed: bool,
}

impl Shell {
    /// Creates the shell and solicits the initial globals.
    ///
    /// The caller must roundtrip (twice: once for globals, once for the
    /// output name events the first batch of binds solicits) before checking
    /// [`missing_global`](Self::missing_global).
    #[must_use]
    pub fn new(conn: &Connection, qh: QueueHandle<Self>) -> Self {
        conn.display().get_registry(&qh, ());
        Self {
            qh,
            conn: conn.clone(),
            compositor: None,
            shm: None,
            layer_shell: None,
            outputs: OutputDirectory::new(),
            pool: None,
            added: Vec::new(),
            removed: Vec::new(),
            changed: false,
        }
    }

    /// The first required global the compositor failed to advertise, if any.
    #[must_use]
    pub fn missing_global(&self) -> Option<&'static str> {
        if self.compositor.is_none() {
            Some("wl_compositor")
        } else if self.shm.is_none() {
            Some("wl_shm")
        } else if self.layer_shell.is_none() {
            Some("zwlr_layer_shell_v1")
        } else {
            None
        }
    }

    /// The bound `wl_shm` global, once the registry roundtrip has run.
    pub(crate) fn shm(&self) -> Option<&WlShm> {
        self.shm.as_ref()
    }

    /// Installs the shared-memory pool the draws will use.
    pub(crate) fn install_pool(&mut self, pool: ShmPool) {
        self.pool = Some(pool);
    }

    /// Takes and resets the "something changed this dispatch" flag.
    pub fn take_changed(&mut self) -> bool {
        std::mem::take(&mut self.changed)
    }

    /// Outputs that became named since the last drain.
    pub fn drain_added(&mut self) -> Vec<String> {
        std::mem::take(&mut self.added)
    }

    /// Named outputs that were removed since the last drain.
    pub fn drain_removed(&mut self) -> Vec<String> {
        std::mem::take(&mut self.removed)
    }

    /// Names of all currently named outputs.
    #[must_use]
    pub fn output_names(&self) -> Vec<String> {
        self.outputs.names()
    }

    /// Whether a named output is still present.
    #[must_use]
    pub fn has_output(&self, name: &str) -> bool {
        self.outputs.contains_name(name)
    }

    /// Claims a free buffer slot, if any.
    pub fn acquire(&mut self) -> Option<SlotId> {
        self.pool.as_mut()?.acquire()
    }

    /// Returns a slot to the free set.
    pub fn release(&mut self, slot: SlotId) {
        if let Some(pool) = &mut self.pool
            && !pool.release(slot)
        {
            warn!(?slot, "released a slot that was not in use");
        }
    }

    /// Drawing context over a claimed slot's pixels.
    pub fn canvas(&mut self, slot: SlotId) -> Option<DrawContext<'_>> {
        self.pool.as_mut()?.canvas(slot)
    }

    /// Pixel geometry shared by every slot.
    #[must_use]
    pub fn slot_size(&self) -> Option<Size> {
        self.pool.as_ref().map(ShmPool::slot_size)
    }

    /// Attaches a drawn slot to the panel's surface on the named output,
    /// creating the surface on first use.
    ///
    /// Returns false when the output is gone or the globals are incomplete;
    /// the caller keeps ownership of the slot in that case and must release
    /// it. On success the slot stays busy until the compositor releases its
    /// buffer (or until the stashed frame is displaced, which releases it
    /// here directly).
    pub fn present(
        &mut self,
        slot: SlotId,
        panel: usize,
        anchor: Anchor,
        output_name: &str,
        size: Size,
    ) -> bool {
        let Some(buffer) = self
            .pool
            .as_ref()
            .and_then(|pool| pool.buffer(slot))
            .cloned()
        else {
            return false;
        };
        let (Some(compositor), Some(layer_shell)) =
            (self.compositor.clone(), self.layer_shell.clone())
        else {
            return false;
        };
        let qh = self.qh.clone();
        let Some((global, entry)) = self.outputs.find_by_name_mut(output_name) else {
            return false;
        };
        let wl_output = entry.wl_output.clone();
        let surface = entry.surfaces.entry(panel).or_insert_with(|| {
            PanelSurface::create(
                &compositor,
                &layer_shell,
                &wl_output,
                anchor,
                size,
                &qh,
                SurfaceKey {
                    output: global,
                    panel,
                },
            )
        });
        let displaced = surface.present(Frame { slot, buffer, size });
        if let Some(old) = displaced {
            self.release(old);
        }
        true
    }

    /// Unmaps every surface on every output.
    pub fn hide_all(&mut self) {
        let mut displaced = Vec::new();
        for (_, entry) in self.outputs.named_mut() {
            for surface in entry.surfaces.values_mut() {
                displaced.extend(surface.hide());
            }
        }
        for slot in displaced {
            self.release(slot);
        }
    }

    /// Flushes buffered requests to the compositor.
    pub fn flush(&self) {
        if let Err(error) = self.conn.flush() {
            warn!(%error, "flushing the wayland connection failed");
        }
    }

    fn remove_output(&mut self, global: u32) {
        let Some((name, mut slot)) = self.outputs.remove(global) else {
            return;
        };
        let mut displaced = Vec::new();
        for (_, surface) in slot.surfaces.drain() {
            displaced.extend(surface.destroy());
        }
        for freed in displaced {
            self.release(freed);
        }
        if slot.wl_output.version() >= 3 {
            slot.wl_output.release();
        }
        match name {
            Some(name) => {
                info!(global, %name, "output removed");
                self.removed.push(name);
                self.changed = true;
            }
            None => debug!(global, "unnamed output removed"),
        }
    }
}

impl Dispatch<WlRegistry, ()> for Shell {
    fn event(
        state: &mut Self,
        registry: &WlRegistry,
        event: wl_registry::Event,
        _: &(),
        _: &Connection,
        qh: &QueueHandle<Self>,
    ) {
        match event {
            wl_registry::Event::Global {
                name,
                interface,
                version,
            } => match interface.as_str() {
                "wl_compositor" => {
                    state.compositor =
                        Some(registry.bind(name, version.min(4), qh, ()));
                }
                "wl_shm" => {
                    state.shm = Some(registry.bind(name, 1, qh, ()));
                }
                "zwlr_layer_shell_v1" => {
                    state.layer_shell = Some(registry.bind(name, version.min(4), qh, ()));
                }
                "wl_output" => {
                    if version < 4 {
                        // The name event arrived in wl_output v4; an output
                        // we cannot name is useless for panel placement.
                        warn!(global = name, version, "ignoring pre-v4 wl_output");
                        return;
                    }
                    let wl_output: WlOutput = registry.bind(name, version.min(4), qh, name);
                    if !state.outputs.insert(
                        name,
                        OutputSlot {
                            wl_output,
                            surfaces: HashMap::new(),
                        },
                    ) {
                        warn!(global = name, "compositor re-advertised a live output global");
                    }
                }
                _ => {}
            },
            wl_registry::Event::GlobalRemove { name } => state.remove_output(name),
            _ => {}
        }
    }
}

impl Dispatch<WlOutput, u32> for Shell {
    fn event(
        state: &mut Self,
        _: &WlOutput,
        event: wl_output::Event,
        global: &u32,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wl_output::Event::Name { name } = event {
            match state.outputs.assign_name(*global, name.as_str()) {
                NameOutcome::Named => {
                    info!(global, %name, "output named");
                    state.added.push(name);
                    state.changed = true;
                }
                NameOutcome::AlreadyNamed => {
                    debug!(global, %name, "ignoring repeat name event");
                }
                NameOutcome::Unknown => {
                    warn!(global, %name, "name event for an unknown output");
                }
            }
        }
    }
}

impl Dispatch<WlBuffer, SlotId> for Shell {
    fn event(
        state: &mut Self,
        _: &WlBuffer,
        event: wayland_client::protocol::wl_buffer::Event,
        slot: &SlotId,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        if let wayland_client::protocol::wl_buffer::Event::Release = event {
            state.release(*slot);
        }
    }
}

impl Dispatch<ZwlrLayerSurfaceV1, SurfaceKey> for Shell {
    fn event(
        state: &mut Self,
        _: &ZwlrLayerSurfaceV1,
        event: zwlr_layer_surface_v1::Event,
        key: &SurfaceKey,
        _: &Connection,
        _: &QueueHandle<Self>,
    ) {
        match event {
            zwlr_layer_surface_v1::Event::Configure { serial, .. } => {
                if let Some(entry) = state.outputs.get_mut(key.output)
                    && let Some(surface) = entry.surfaces.get_mut(&key.panel)
                {
                    surface.on_configure(serial);
                }
            }
            zwlr_layer_surface_v1::Event::Closed => {
                debug!(output = key.output, panel = key.panel, "layer surface closed");
                let displaced = state
                    .outputs
                    .get_mut(key.output)
                    .and_then(|entry| entry.surfaces.remove(&key.panel))
                    .and_then(PanelSurface::destroy);
                if let Some(slot) = displaced {
                    state.release(slot);
                }
            }
            _ => {}
        }
    }
}

delegate_noop!(Shell: ignore WlCompositor);
delegate_noop!(Shell: ignore WlShm);
delegate_noop!(Shell: ignore WlShmPool);
delegate_noop!(Shell: ignore WlSurface);
delegate_noop!(Shell: ignore ZwlrLayerShellV1);
