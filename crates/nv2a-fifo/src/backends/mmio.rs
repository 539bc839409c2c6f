//! Hardware register bus — the 16 MB NV2A aperture mapped from `/dev/mem`.
//!
//! MMIO registers are uncached by the mapping (`O_SYNC`) and accessed with
//! volatile 32-bit loads/stores, so every access reaches the device. The
//! write-combine flush barrier matches what the GPU requires before a
//! doorbell write: CPU store fence first, then the PFB flush handshake.

// MMIO registers are naturally aligned by hardware, so pointer casts are safe
#![allow(clippy::cast_ptr_alignment)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_possible_wrap)]

use crate::bus::RegisterBus;
use crate::error::{FifoError, Result};
use nv2a_chip::{blocks, pfb};
use rustix::fs::OFlags;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::fs::OpenOptionsExt;
use std::os::unix::io::AsFd;
use std::ptr::NonNull;

/// Iterations of the flush-in-progress poll before the flush is declared a
/// hardware fault. The handshake normally completes within a handful of
/// reads; the guard only exists so a dead device cannot spin us forever.
const DEFAULT_FLUSH_GUARD: u32 = 0x0010_0000;

/// The real register aperture.
pub struct MmioBus {
    ptr: NonNull<u8>,
    size: usize,
    _file: File,
    flush_guard: u32,
}

impl std::fmt::Debug for MmioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmioBus")
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("size", &self.size)
            .finish()
    }
}

// SAFETY: Send - MmioBus owns the mapping exclusively; mmap'd memory is
// process-wide and moving the handle between threads does not invalidate it.
unsafe impl Send for MmioBus {}

impl MmioBus {
    /// Map the NV2A register aperture at its fixed physical address.
    ///
    /// # Errors
    ///
    /// Returns an error if `/dev/mem` cannot be opened (needs root) or the
    /// aperture cannot be mapped.
    pub fn map() -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .custom_flags(OFlags::SYNC.bits() as i32) // uncached device access
            .open("/dev/mem")
            .map_err(|e| FifoError::map_failed(format!("Cannot open /dev/mem: {e}")))?;

        // SAFETY: mmap necessary for MMIO - maps the GPU aperture into the
        // process. Invariants: (1) file is a freshly opened /dev/mem fd;
        // (2) MMIO_BASE/MMIO_SIZE are the fixed hardware aperture, page
        // aligned; (3) mapping is SHARED so stores reach the device;
        // (4) rustix returns a valid pointer or Err.
        let ptr = unsafe {
            mmap(
                std::ptr::null_mut(),
                blocks::MMIO_SIZE,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                blocks::MMIO_BASE,
            )
            .map_err(|e| FifoError::map_failed(format!("mmap of GPU aperture failed: {e}")))?
        };

        tracing::info!(
            "Mapped NV2A aperture at {ptr:p} ({} MB)",
            blocks::MMIO_SIZE / (1024 * 1024)
        );

        Ok(Self {
            ptr: NonNull::new(ptr.cast()).expect("rustix mmap returns non-null on success"),
            size: blocks::MMIO_SIZE,
            _file: file,
            flush_guard: DEFAULT_FLUSH_GUARD,
        })
    }

    /// Override the flush-poll guard.
    #[must_use]
    pub fn with_flush_guard(mut self, guard: u32) -> Self {
        self.flush_guard = guard;
        self
    }
}

/// Fence all prior CPU stores before the device is signaled.
#[inline]
fn store_fence() {
    // SAFETY: sfence has no preconditions; it only orders prior stores.
    #[cfg(target_arch = "x86_64")]
    unsafe {
        core::arch::x86_64::_mm_sfence();
    }
    // SAFETY: as above.
    #[cfg(target_arch = "x86")]
    unsafe {
        core::arch::x86::_mm_sfence();
    }
    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64")))]
    std::sync::atomic::fence(std::sync::atomic::Ordering::SeqCst);
}

impl RegisterBus for MmioBus {
    fn read32(&mut self, offset: usize) -> u32 {
        assert!(offset + 4 <= self.size, "Register offset out of bounds");
        // SAFETY: read_volatile necessary for MMIO - hardware can change the
        // value. Invariants: (1) ptr from mmap in map(), valid for
        // self.size; (2) offset+4 <= size; (3) registers are u32 aligned.
        unsafe { self.ptr.as_ptr().add(offset).cast::<u32>().read_volatile() }
    }

    fn write32(&mut self, offset: usize, value: u32) {
        assert!(offset + 4 <= self.size, "Register offset out of bounds");
        // SAFETY: write_volatile necessary for MMIO - triggers hardware side
        // effects. Invariants: (1) ptr from mmap; (2) offset+4 <= size;
        // (3) registers are u32 aligned.
        unsafe {
            self.ptr
                .as_ptr()
                .add(offset)
                .cast::<u32>()
                .write_volatile(value);
        }
    }

    fn flush_wc(&mut self) {
        store_fence();

        let ctrl = self.read32(pfb::WC_CACHE);
        self.write32(pfb::WC_CACHE, ctrl | pfb::wc_cache::FLUSH_TRIGGER);

        let mut i = 0;
        while self.read32(pfb::WC_CACHE) & pfb::wc_cache::FLUSH_IN_PROGRESS != 0 {
            i += 1;
            assert!(
                i < self.flush_guard,
                "WC cache flush stuck after {i} polls: hardware fault"
            );
        }
    }
}

impl Drop for MmioBus {
    fn drop(&mut self) {
        // SAFETY: munmap with the exact ptr/size pair produced by mmap in
        // map(); Drop runs at most once and no references remain.
        unsafe {
            let _ = munmap(self.ptr.as_ptr().cast(), self.size);
        }
        tracing::debug!("Unmapped NV2A aperture");
    }
}
