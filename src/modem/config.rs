//! Driver configuration.
//!
//! Every field has a default, so a JSON document only needs the values that
//! differ:
//!
//! ```
//! use simsms::modem::config::Config;
//!
//! let config = Config::from_json(r#"{"baud_rate":57600,"power_key":true}"#).unwrap();
//! assert_eq!(config.baud_rate, 57600);
//! assert!(config.power_key);
//! assert_eq!(config.command_timeout_ms, 4000);
//! ```

use serde::{Deserialize, Serialize};

use super::power::{DEFAULT_POWER_STEPS_MS, POWER_STEPS};

/// Tunables of a [`Modem`](super::Modem).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Link speed, also programmed into the modem with `AT+IPR`
    pub baud_rate: u32,
    /// A power key line is wired and must be sequenced before opening
    pub power_key: bool,
    /// Power key is active at the high level
    pub power_key_active_high: bool,
    /// Power key step durations, zero terminated
    pub power_steps_ms: [u32; POWER_STEPS],
    /// Default answer timeout
    pub command_timeout_ms: u32,
    /// Wait for the PDU line following `+CMT:`
    pub sms_body_timeout_ms: u32,
    /// Wait for `+CMGS:` after the PDU is sent
    pub sms_send_timeout_ms: u32,
    /// Wait for the `>` prompt after `AT+CMGS`
    pub prompt_timeout_ms: u32,
    /// Wait for `AT+CMGD` to complete
    pub delete_timeout_ms: u32,
    /// Set the platform clock from `*PSUTTZ:` pushes
    pub network_time: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            baud_rate: 115_200,
            power_key: false,
            power_key_active_high: true,
            power_steps_ms: DEFAULT_POWER_STEPS_MS,
            command_timeout_ms: 4000,
            sms_body_timeout_ms: 2000,
            sms_send_timeout_ms: 60_000,
            prompt_timeout_ms: 10_000,
            delete_timeout_ms: 20_000,
            network_time: false,
        }
    }
}

impl Config {
    /// Parse a JSON document, missing fields taking their default.
    pub fn from_json(json: &str) -> Result<Self, serde_json_core::de::Error> {
        serde_json_core::from_str(json).map(|(config, _)| config)
    }

    /// Serialize into `buf`, returning the number of bytes written.
    pub fn to_json(&self, buf: &mut [u8]) -> Result<usize, serde_json_core::ser::Error> {
        serde_json_core::to_slice(self, buf)
    }
}
