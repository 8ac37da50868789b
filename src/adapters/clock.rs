//! Monotonic millisecond clock.
//!
//! - **`target_os = "espidf"`** wraps `esp_timer_get_time()`.
//! - **`not(target_os = "espidf")`** uses `std::time::Instant` for host-side
//!   runs.
//!
//! The services take `now_ms: u32` and only ever compare with
//! `wrapping_sub`, so the ~49 day wrap is harmless.

pub struct Clock {
    #[cfg(not(target_os = "espidf"))]
    start: std::time::Instant,
}

impl Default for Clock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock {
    pub fn new() -> Self {
        Self {
            #[cfg(not(target_os = "espidf"))]
            start: std::time::Instant::now(),
        }
    }

    /// Milliseconds since boot, wrapping at `u32::MAX`.
    #[cfg(target_os = "espidf")]
    pub fn now_ms(&self) -> u32 {
        // SAFETY: esp_timer_get_time is a read of the free-running timer.
        ((unsafe { esp_idf_svc::sys::esp_timer_get_time() }) / 1000) as u32
    }

    /// Milliseconds since construction, wrapping at `u32::MAX`.
    #[cfg(not(target_os = "espidf"))]
    pub fn now_ms(&self) -> u32 {
        self.start.elapsed().as_millis() as u32
    }
}
