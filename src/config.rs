//! Runtime-tunable options for the POR search, modeled on loom's
//! [`Builder`](https://docs.rs/loom/latest/loom/model/struct.Builder.html):
//! every field has an environment-variable default that a host can override
//! programmatically before driving a search.

use std::env;

const DEFAULT_MAX_CSD: u32 = 10;

/// Options consumed by [`crate::node`] and [`crate::fingerprint`] while
/// exploring a configuration.
#[derive(Debug, Clone)]
#[non_exhaustive]
pub struct Options {
    /// Enables state pruning when a repeated fingerprint is observed.
    ///
    /// Defaults to the `POR_CUTOFF_EVENTS` environment variable.
    pub cutoff_events: bool,

    /// Logs fingerprint/cutoff decisions via `tracing`.
    ///
    /// Defaults to the `POR_DEBUG_CUTOFF_EVENTS` environment variable.
    pub debug_cutoff_events: bool,

    /// Context-switch-degree budget: alternatives whose schedule would
    /// exceed this many thread swaps are not explored. `0` disables the
    /// bound.
    ///
    /// Defaults to the `POR_MAX_CSD` environment variable, or 10.
    pub max_csd: u32,

    /// Dumps byte-level write fragments when stringifying a fingerprint.
    ///
    /// Defaults to the `POR_VERIFIED_FINGERPRINTS_SHOW_MEMORY` environment
    /// variable.
    pub verified_fingerprints_show_memory: bool,
}

impl Options {
    /// Reads defaults from the environment, the same way loom's `Builder`
    /// seeds itself from `LOOM_*`.
    pub fn from_env() -> Options {
        Options {
            cutoff_events: env_bool("POR_CUTOFF_EVENTS", true),
            debug_cutoff_events: env_bool("POR_DEBUG_CUTOFF_EVENTS", false),
            max_csd: env::var("POR_MAX_CSD")
                .ok()
                .and_then(|v| v.parse().ok())
                .unwrap_or(DEFAULT_MAX_CSD),
            verified_fingerprints_show_memory: env_bool(
                "POR_VERIFIED_FINGERPRINTS_SHOW_MEMORY",
                false,
            ),
        }
    }

    /// Returns `true` if `csd` is within the configured bound (`0` means
    /// unbounded).
    pub fn within_csd_bound(&self, csd: u32) -> bool {
        self.max_csd == 0 || csd <= self.max_csd
    }
}

impl Default for Options {
    fn default() -> Options {
        Options {
            cutoff_events: true,
            debug_cutoff_events: false,
            max_csd: DEFAULT_MAX_CSD,
            verified_fingerprints_show_memory: false,
        }
    }
}

fn env_bool(key: &str, default: bool) -> bool {
    match env::var(key) {
        Ok(v) => !matches!(v.as_str(), "0" | "false" | "off" | ""),
        Err(_) => default,
    }
}
