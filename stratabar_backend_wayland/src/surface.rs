// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Per-(panel, output) layer-shell surfaces.
//!
//! A [`PanelSurface`] is created lazily the first time a panel draws on an
//! output and cached for reuse. Layer-shell surfaces may not have a buffer
//! attached before their first `configure`; a frame that arrives early is
//! stashed and attached from the configure handler. Unmapping (attaching a
//! null buffer on hide) resets that state, so the next present goes through
//! a fresh configure cycle.

use tracing::trace;
use wayland_client::Proxy;
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_compositor::WlCompositor;
use wayland_client::protocol::wl_output::WlOutput;
use wayland_client::protocol::wl_surface::WlSurface;
use wayland_client::{Dispatch, QueueHandle};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_shell_v1::{
    Layer, ZwlrLayerShellV1,
};
use wayland_protocols_wlr::layer_shell::v1::client::zwlr_layer_surface_v1::{
    Anchor as WlrAnchor, ZwlrLayerSurfaceV1,
};

use stratabar_core::paint::Size;
use stratabar_core::panel::Anchor;
use stratabar_core::pool::SlotId;

/// Routes layer-surface events back to their cache entry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SurfaceKey {
    /// Registry global of the output the surface sits on.
    pub output: u32,
    /// Panel index within the configuration.
    pub panel: usize,
}

/// A drawn frame waiting to be attached.
#[derive(Debug)]
pub(crate) struct Frame {
    pub(crate) slot: SlotId,
    pub(crate) buffer: WlBuffer,
    pub(crate) size: Size,
}

pub(crate) fn wlr_anchor(anchor: Anchor) -> WlrAnchor {
    match anchor {
        Anchor::Top => WlrAnchor::Top,
        Anchor::Bottom => WlrAnchor::Bottom,
        Anchor::Left => WlrAnchor::Left,
        Anchor::Right => WlrAnchor::Right,
    }
}

/// The panel's thickness along the axis it occupies, used for the exclusive
/// zone so maximized windows make room for it.
pub(crate) fn exclusive_thickness(anchor: Anchor, size: Size) -> i32 {
    let thickness = match anchor {
        Anchor::Top | Anchor::Bottom => size.height,
        Anchor::Left | Anchor::Right => size.width,
    };
    i32::try_from(thickness).unwrap_or(i32::MAX)
}

/// One cached on-screen placement object.
#[derive(Debug)]
pub(crate) struct PanelSurface {
    surface: WlSurface,
    layer_surface: ZwlrLayerSurfaceV1,
    anchor: Anchor,
    configured: bool,
    committed_size: Size,
    pending: Option<Frame>,
}

impl PanelSurface {
    /// Creates the surface and solicits the initial configure.
    pub(crate) fn create<D>(
        compositor: &WlCompositor,
        layer_shell: &ZwlrLayerShellV1,
        output: &WlOutput,
        anchor: Anchor,
        size: Size,
        qh: &QueueHandle<D>,
        key: SurfaceKey,
    ) -> Self
    where
        D: Dispatch<WlSurface, ()> + Dispatch<ZwlrLayerSurfaceV1, SurfaceKey> + 'static,
    {
        let surface = compositor.create_surface(qh, ());
        let layer_surface = layer_shell.get_layer_surface(
            &surface,
            Some(output),
            Layer::Top,
            "stratabar".to_owned(),
            qh,
            key,
        );
        layer_surface.set_anchor(wlr_anchor(anchor));
        layer_surface.set_size(size.width, size.height);
        layer_surface.set_exclusive_zone(exclusive_thickness(anchor, size));
        // Commit without a buffer to trigger the first configure.
        surface.commit();
        Self {
            surface,
            layer_surface,
            anchor,
            configured: false,
            committed_size: size,
            pending: None,
        }
    }

    /// Presents a drawn frame.
    ///
    /// Before the first configure (or after a hide) the frame is stashed and
    /// a configure solicited; the displaced previously-stashed frame, if any,
    /// is returned so its pool slot can be freed — its buffer was never
    /// attached, so no compositor release will ever arrive for it.
    pub(crate) fn present(&mut self, frame: Frame) -> Option<SlotId> {
        if frame.size != self.committed_size {
            self.layer_surface.set_size(frame.size.width, frame.size.height);
            self.layer_surface
                .set_exclusive_zone(exclusive_thickness(self.anchor, frame.size));
            self.committed_size = frame.size;
        }
        if self.configured {
            self.attach(&frame);
            None
        } else {
            trace!(id = ?self.surface.id(), "stashing frame until configure");
            let displaced = self.pending.replace(frame);
            self.surface.commit();
            displaced.map(|old| old.slot)
        }
    }

    /// Handles a configure event: acks and attaches any stashed frame.
    pub(crate) fn on_configure(&mut self, serial: u32) {
        self.layer_surface.ack_configure(serial);
        self.configured = true;
        if let Some(frame) = self.pending.take() {
            self.attach(&frame);
        }
    }

    /// Unmaps the surface without destroying it; returns the slot of a
    /// never-attached pending frame so it can be freed.
    pub(crate) fn hide(&mut self) -> Option<SlotId> {
        let displaced = self.pending.take().map(|frame| frame.slot);
        self.surface.attach(None, 0, 0);
        self.surface.commit();
        // Unmapping voids the configured state per the layer-shell protocol.
        self.configured = false;
        displaced
    }

    /// Destroys the protocol objects; returns a pending frame's slot.
    pub(crate) fn destroy(mut self) -> Option<SlotId> {
        let displaced = self.pending.take().map(|frame| frame.slot);
        self.layer_surface.destroy();
        self.surface.destroy();
        displaced
    }

    fn attach(&self, frame: &Frame) {
        self.surface.attach(Some(&frame.buffer), 0, 0);
        // damage_buffer needs wl_surface v4.
        if self.surface.version() >= 4 {
            self.surface.damage_buffer(0, 0, i32::MAX, i32::MAX);
        } else {
            self.surface.damage(0, 0, i32::MAX, i32::MAX);
        }
        self.surface.commit();
    }
}
