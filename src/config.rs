//! Node configuration parameters
//!
//! All tunable parameters for a grid node. Values can be overridden via
//! NVS (non-volatile storage); see [`ConfigPort`](crate::app::ports::ConfigPort).

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;

/// Core node configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeConfig {
    // --- Potentiometer ---
    /// EMA smoothing constant applied to raw ADC samples (0 < α ≤ 1)
    pub pot_ema_alpha: f32,
    /// Minimum change of the filtered raw value that counts as a change event
    pub pot_noise_threshold: f32,
    /// Minimum interval between two ADC samples (milliseconds)
    pub pot_min_sample_interval_ms: u32,
    /// Full-scale value of a raw analog sample
    pub adc_full_scale: u16,

    // --- Rotary encoder ---
    pub encoder_default_min: f32,
    pub encoder_default_max: f32,
    pub encoder_default_step: f32,

    // --- Link layer ---
    /// Divisor byte for the CRC-8 on the host serial link
    pub crc_polynomial: u8,
    /// Bus id of the master node
    pub master_id: u8,
    /// Bus id that every node accepts
    pub broadcast_id: u8,

    // --- Discovery timing ---
    /// Time a direction line is held low before the id packet goes out (ms)
    pub probe_settle_ms: u32,
    /// How long the master waits for a new neighbour to answer (ms)
    pub probe_reply_timeout_ms: u32,

    // --- Timing ---
    /// Main loop period (milliseconds)
    pub loop_interval_ms: u32,
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            // Potentiometer
            pot_ema_alpha: 0.24,
            pot_noise_threshold: 3.0,
            pot_min_sample_interval_ms: 10, // ADS1115 at 128 SPS
            adc_full_scale: 1023,

            // Rotary encoder
            encoder_default_min: 0.0,
            encoder_default_max: 100.0,
            encoder_default_step: 1.0,

            // Link layer
            crc_polynomial: 0x07,
            master_id: 0,
            broadcast_id: 0xFF,

            // Discovery
            probe_settle_ms: 20,
            probe_reply_timeout_ms: 250,

            // Timing
            loop_interval_ms: 5, // 200 Hz polling
        }
    }
}

/// Range-check every field before it is persisted or applied.
pub fn validate_config(cfg: &NodeConfig) -> Result<(), ConfigError> {
    if !(cfg.pot_ema_alpha > 0.0 && cfg.pot_ema_alpha <= 1.0) {
        return Err(ConfigError::ValidationFailed(
            "pot_ema_alpha must be in (0, 1]",
        ));
    }
    if !(0.0..=64.0).contains(&cfg.pot_noise_threshold) {
        return Err(ConfigError::ValidationFailed(
            "pot_noise_threshold must be 0–64",
        ));
    }
    if cfg.pot_min_sample_interval_ms > 1000 {
        return Err(ConfigError::ValidationFailed(
            "pot_min_sample_interval_ms must be ≤ 1000",
        ));
    }
    if cfg.adc_full_scale == 0 {
        return Err(ConfigError::ValidationFailed("adc_full_scale must be > 0"));
    }
    if cfg.encoder_default_min >= cfg.encoder_default_max {
        return Err(ConfigError::ValidationFailed(
            "encoder_default_min must be < encoder_default_max",
        ));
    }
    if cfg.encoder_default_step <= 0.0 {
        return Err(ConfigError::ValidationFailed(
            "encoder_default_step must be > 0",
        ));
    }
    if cfg.master_id == cfg.broadcast_id {
        return Err(ConfigError::ValidationFailed(
            "master_id must differ from broadcast_id",
        ));
    }
    if cfg.probe_settle_ms >= cfg.probe_reply_timeout_ms {
        return Err(ConfigError::ValidationFailed(
            "probe_settle_ms must be < probe_reply_timeout_ms",
        ));
    }
    if !(1..=100).contains(&cfg.loop_interval_ms) {
        return Err(ConfigError::ValidationFailed(
            "loop_interval_ms must be 1–100",
        ));
    }
    Ok(())
}
