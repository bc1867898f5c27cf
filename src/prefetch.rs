//! Software prefetch hints.
//!
//! Hints never change results. On targets without a known prefetch
//! instruction they compile to nothing.

/// Requests that `values[idx]` be pulled into L1. Out-of-range indices are ignored.
#[inline]
pub(crate) fn prefetch_index(values: &[i64], idx: usize) {
    if idx < values.len() {
        // SAFETY: idx is bounds-checked above.
        let ptr = unsafe { values.as_ptr().add(idx) };
        prefetch_read(ptr);
    }
}

#[inline]
fn prefetch_read(ptr: *const i64) {
    #[cfg(target_arch = "x86_64")]
    unsafe {
        std::arch::x86_64::_mm_prefetch(ptr as *const i8, std::arch::x86_64::_MM_HINT_T0);
    }

    #[cfg(target_arch = "x86")]
    unsafe {
        std::arch::x86::_mm_prefetch(ptr as *const i8, std::arch::x86::_MM_HINT_T0);
    }

    #[cfg(target_arch = "aarch64")]
    unsafe {
        core::arch::asm!(
            "prfm pldl1keep, [{ptr}]",
            ptr = in(reg) ptr,
            options(nostack, preserves_flags, readonly)
        );
    }

    #[cfg(not(any(target_arch = "x86", target_arch = "x86_64", target_arch = "aarch64")))]
    {
        let _ = ptr;
    }
}
