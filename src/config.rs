// SPDX-License-Identifier: MIT
//! Decoder configuration

use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecoderConfig {
    /// Check the whole buffer for an outer zstd envelope before parsing entries
    pub unwrap_envelope: bool,
    /// Transcode WebP images to PNG before materialization
    pub transcode_webp: bool,
    /// Upper bound on the declared entry count
    pub max_entries: u16,
}

impl DecoderConfig {
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            unwrap_envelope: env_bool("NITRO_UNWRAP_ENVELOPE").unwrap_or(defaults.unwrap_envelope),
            transcode_webp: env_bool("NITRO_TRANSCODE_WEBP").unwrap_or(defaults.transcode_webp),
            max_entries: std::env::var("NITRO_MAX_ENTRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.max_entries),
        }
    }

    /// Replace only the settings present in `overrides`
    pub fn with_overrides(self, overrides: ConfigOverrides) -> Self {
        Self {
            unwrap_envelope: overrides.unwrap_envelope.unwrap_or(self.unwrap_envelope),
            transcode_webp: overrides.transcode_webp.unwrap_or(self.transcode_webp),
            max_entries: overrides.max_entries.unwrap_or(self.max_entries),
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.max_entries == 0 {
            return Err("NITRO_MAX_ENTRIES must be at least 1".to_string());
        }

        Ok(())
    }
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            unwrap_envelope: true,
            transcode_webp: true,
            max_entries: u16::MAX,
        }
    }
}

/// Settings read from a TOML file; absent keys keep their current value
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfigOverrides {
    pub unwrap_envelope: Option<bool>,
    pub transcode_webp: Option<bool>,
    pub max_entries: Option<u16>,
}

fn env_bool(key: &str) -> Option<bool> {
    std::env::var(key)
        .ok()
        .and_then(|s| match s.trim().to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" | "on" => Some(true),
            "0" | "false" | "no" | "off" => Some(false),
            _ => None,
        })
}
