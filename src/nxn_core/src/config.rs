use std::{fs, path::Path};

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Could not read the configuration: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Which sequence fixes a flipped dedge (OLL parity).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParityAlgorithm {
    /// `r2 B2 U2 l U2 r' U2 r U2 F2 r F2 l' B2 r2`, turned with M slices.
    #[default]
    Standard,
    /// `r' U2 l F2 l' F2 r2 U2 r U2 r' U2 F2 r2 F2`, turned with inner r/l
    /// layers.
    Advanced,
}

/// Solver settings, loadable from TOML. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SolverConfig {
    /// Undo the setup turns of center commutators, for when edges and corners
    /// are solved before the centers.
    pub preserve_cage: bool,
    pub parity_algorithm: ParityAlgorithm,
    /// Upper bound on 3×3 solve attempts, each of which may end in a parity
    /// fix.
    pub max_solve_attempts: usize,
    /// Track the stickers every center commutator moves and check they land
    /// where they were sent.
    pub verify_commutators: bool,
}

impl Default for SolverConfig {
    fn default() -> Self {
        SolverConfig {
            preserve_cage: false,
            parity_algorithm: ParityAlgorithm::Standard,
            max_solve_attempts: 3,
            verify_commutators: false,
        }
    }
}

impl SolverConfig {
    /// # Errors
    ///
    /// Fails if the text is not a valid configuration.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// # Errors
    ///
    /// Fails if the file cannot be read or is not a valid configuration.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Self::from_toml_str(&fs::read_to_string(path)?)
    }
}
