// Copyright 2026 the Stratabar Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Shared-memory buffer pool backing.
//!
//! One memfd holds `count` fixed-size ARGB8888 slots back to back; each slot
//! gets its own `wl_buffer` carved out of a single `wl_shm_pool`. Busy/free
//! bookkeeping lives in [`BufferPool`]; this module only supplies the memory
//! and the protocol objects. Any allocation failure fails the whole pool —
//! partial pools are never retained.

use std::fs::File;
use std::io;
use std::os::fd::AsFd;

use memmap2::MmapMut;
use rustix::fs::{MemfdFlags, memfd_create};
use wayland_client::protocol::wl_buffer::WlBuffer;
use wayland_client::protocol::wl_shm::{self, WlShm};
use wayland_client::protocol::wl_shm_pool::WlShmPool;
use wayland_client::{Dispatch, QueueHandle};

use stratabar_core::paint::{DrawContext, Size};
use stratabar_core::pool::{BufferPool, SlotId};

const BYTES_PER_PIXEL: u32 = 4;

/// Shared-memory pool creation failure.
#[derive(Debug, thiserror::Error)]
pub enum ShmError {
    /// The requested geometry does not fit the protocol's `i32` sizes.
    #[error("pool geometry {count}x{width}x{height} is too large")]
    TooLarge {
        /// Requested slot count.
        count: usize,
        /// Requested slot width.
        width: u32,
        /// Requested slot height.
        height: u32,
    },
    /// A zero-sized pool is useless and almost certainly a config mistake.
    #[error("pool must have at least one buffer and a non-empty size")]
    Empty,
    /// Creating or sizing the memfd failed.
    #[error("shared memory allocation failed")]
    Allocate(#[source] io::Error),
    /// Mapping the memfd failed.
    #[error("shared memory mapping failed")]
    Map(#[source] io::Error),
}

/// Byte stride of one pixel row; [`None`] when it does not fit.
pub(crate) fn stride(width: u32) -> Option<u32> {
    width.checked_mul(BYTES_PER_PIXEL)
}

/// Byte length of one slot; [`None`] when it does not fit.
pub(crate) fn slot_len(width: u32, height: u32) -> Option<usize> {
    usize::try_from(stride(width)?)
        .ok()?
        .checked_mul(height as usize)
}

/// One slot's protocol handle and geometry.
#[derive(Debug)]
pub(crate) struct ShmBuffer {
    buffer: WlBuffer,
    offset: usize,
}

impl ShmBuffer {
    pub(crate) fn buffer(&self) -> &WlBuffer {
        &self.buffer
    }
}

/// Fixed pool of shared-memory drawing buffers.
#[derive(Debug)]
pub(crate) struct ShmPool {
    map: MmapMut,
    // Keeps the memfd alive for the lifetime of the mapping and the
    // compositor-side pool.
    _file: File,
    pool: WlShmPool,
    slots: BufferPool<ShmBuffer>,
    slot_size: Size,
    slot_bytes: usize,
}

impl ShmPool {
    /// Allocates `count` slots of `width × height` pixels.
    pub(crate) fn new<D>(
        shm: &WlShm,
        qh: &QueueHandle<D>,
        count: usize,
        width: u32,
        height: u32,
    ) -> Result<Self, ShmError>
    where
        D: Dispatch<WlShmPool, ()> + Dispatch<WlBuffer, SlotId> + 'static,
    {
        if count == 0 || width == 0 || height == 0 {
            return Err(ShmError::Empty);
        }
        // All geometry math stays checked until the i32 protocol bound is
        // established; a huge configured width must fail closed, not wrap.
        let too_large = ShmError::TooLarge {
            count,
            width,
            height,
        };
        let Some(stride_bytes) = stride(width) else {
            return Err(too_large);
        };
        let Some(slot_bytes) = slot_len(width, height) else {
            return Err(too_large);
        };
        let total_bytes = slot_bytes
            .checked_mul(count)
            .filter(|total| i32::try_from(*total).is_ok())
            .ok_or(too_large)?;

        let fd = memfd_create("stratabar-shm", MemfdFlags::CLOEXEC)
            .map_err(|errno| ShmError::Allocate(errno.into()))?;
        let file = File::from(fd);
        file.set_len(total_bytes as u64)
            .map_err(ShmError::Allocate)?;
        // SAFETY: the memfd is created and owned here, sized before mapping,
        // and never truncated or remapped for the lifetime of `map`.
        let map = unsafe { MmapMut::map_mut(&file) }.map_err(ShmError::Map)?;

        #[expect(
            clippy::cast_possible_truncation,
            reason = "total and per-slot byte counts were checked against i32 above"
        )]
        let pool = shm.create_pool(file.as_fd(), total_bytes as i32, qh, ());
        let slots = BufferPool::from_fn(count, |id| {
            let offset = id.index() * slot_bytes;
            #[expect(
                clippy::cast_possible_truncation,
                reason = "offset and geometry fit i32, checked at pool sizing"
            )]
            let buffer = pool.create_buffer(
                offset as i32,
                width as i32,
                height as i32,
                stride_bytes as i32,
                wl_shm::Format::Argb8888,
                qh,
                id,
            );
            ShmBuffer { buffer, offset }
        });

        Ok(Self {
            map,
            _file: file,
            pool,
            slots,
            slot_size: Size::new(width, height),
            slot_bytes,
        })
    }

    /// Slot pixel dimensions; every slot has the same geometry.
    pub(crate) fn slot_size(&self) -> Size {
        self.slot_size
    }

    pub(crate) fn acquire(&mut self) -> Option<SlotId> {
        self.slots.acquire()
    }

    pub(crate) fn release(&mut self, id: SlotId) -> bool {
        self.slots.release(id)
    }

    /// The protocol buffer for a slot.
    pub(crate) fn buffer(&self, id: SlotId) -> Option<&WlBuffer> {
        self.slots.payload(id).map(ShmBuffer::buffer)
    }

    /// Drawing context over a slot's pixels.
    pub(crate) fn canvas(&mut self, id: SlotId) -> Option<DrawContext<'_>> {
        let offset = self.slots.payload(id)?.offset;
        let pixels = &mut self.map[offset..offset + self.slot_bytes];
        Some(DrawContext::new(
            pixels,
            self.slot_size.width,
            self.slot_size.height,
        ))
    }
}

impl Drop for ShmPool {
    fn drop(&mut self) {
        self.pool.destroy();
    }
}

#[cfg(test)]
mod tests {
    use super::{slot_len, stride};

    #[test]
    fn slot_geometry_is_tightly_packed_argb() {
        assert_eq!(stride(1920), Some(1920 * 4), "four bytes per pixel");
        assert_eq!(
            slot_len(1920, 48),
            Some(1920 * 4 * 48),
            "stride times rows"
        );
    }

    #[test]
    fn slot_offsets_do_not_overlap() {
        let len = slot_len(640, 32).expect("geometry fits");
        let offsets: Vec<usize> = (0..3).map(|index| index * len).collect();
        assert_eq!(offsets, vec![0, len, 2 * len], "slots are back to back");
    }

    #[test]
    fn oversized_geometry_is_rejected_before_any_narrowing() {
        // A misconfigured width must fail closed, never wrap the stride.
        assert_eq!(stride(1_200_000_000), None, "stride would overflow u32");
        assert_eq!(
            slot_len(1_200_000_000, 48),
            None,
            "slot length follows the stride failure"
        );
    }
}
