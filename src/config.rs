//! Match configuration.
//!
//! Holds the constants a match is built from. Values can come from a JSON
//! document or be changed one at a time through `setoption`.

use serde::{Deserialize, Serialize};

use crate::board::Parity;
use crate::error::ConfigError;

/// Default score at which a player wins: one point per captured piece,
/// twelve pieces per side on the standard board.
pub const DEFAULT_SCORE_THRESHOLD: u32 = 12;

/// Largest accepted board width or height.
pub const MAX_DIMENSION: usize = 64;

/// Settings used when creating a match.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MatchConfig {
    pub width: usize,
    pub height: usize,
    /// Rows filled with pieces for each side at setup.
    pub rows_per_side: usize,
    pub parity: Parity,
    pub score_threshold: u32,
    /// Re-check relayed board updates against the authoritative engine.
    pub verify_relays: bool,
}

impl Default for MatchConfig {
    fn default() -> Self {
        MatchConfig {
            width: 8,
            height: 8,
            rows_per_side: 3,
            parity: Parity::Even,
            score_threshold: DEFAULT_SCORE_THRESHOLD,
            verify_relays: true,
        }
    }
}

impl MatchConfig {
    /// Parses and validates a JSON config. Missing fields take defaults.
    pub fn from_json(s: &str) -> Result<Self, ConfigError> {
        let config: MatchConfig = serde_json::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that the values describe a playable board.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width < 2 || self.height < 2 {
            return Err(ConfigError::Validation(
                "board must be at least 2x2".into(),
            ));
        }
        if self.width > MAX_DIMENSION || self.height > MAX_DIMENSION {
            return Err(ConfigError::Validation(format!(
                "board must be at most {0}x{0}",
                MAX_DIMENSION
            )));
        }
        if self.rows_per_side * 2 >= self.height {
            return Err(ConfigError::Validation(
                "rowsPerSide must leave at least one empty row between the sides".into(),
            ));
        }
        if self.score_threshold == 0 {
            return Err(ConfigError::Validation(
                "scoreThreshold must be > 0".into(),
            ));
        }
        Ok(())
    }

    /// Applies a single named option, as sent by `setoption`.
    ///
    /// The config is left unchanged if the result would not validate.
    pub fn set_option(&mut self, name: &str, value: &str) -> Result<(), ConfigError> {
        let invalid = || ConfigError::InvalidValue {
            name: name.to_string(),
            value: value.to_string(),
        };
        let mut next = self.clone();
        match name {
            "Width" => next.width = value.parse().map_err(|_| invalid())?,
            "Height" => next.height = value.parse().map_err(|_| invalid())?,
            "Rows" => next.rows_per_side = value.parse().map_err(|_| invalid())?,
            "ScoreThreshold" => next.score_threshold = value.parse().map_err(|_| invalid())?,
            "Parity" => next.parity = Parity::from_name(value).ok_or_else(invalid)?,
            "VerifyRelays" => next.verify_relays = value.parse().map_err(|_| invalid())?,
            other => return Err(ConfigError::UnknownOption(other.to_string())),
        }
        next.validate()?;
        *self = next;
        Ok(())
    }
}
