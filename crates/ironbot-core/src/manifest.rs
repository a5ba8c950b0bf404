//! Build manifest produced by the package selection stage.
//!
//! The manifest lists which sub-units changed and must be rebuilt. It is
//! only known once the run has started, so it is read from the worker at
//! execution time rather than at configuration time.

use crate::ids::UnitId;
use crate::{Error, Result};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// File name the selection stage writes into the build directory.
pub const MANIFEST_FILENAME: &str = "channels.json";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Manifest {
    /// Units published to the stable channel. Carried through untouched.
    pub stable: Vec<UnitId>,
    /// Units to build in this run, listed dependents first.
    pub unstable: Vec<UnitId>,
}

impl Manifest {
    /// Decode manifest content.
    ///
    /// Decoding is strict UTF-8 JSON. Both `stable` and `unstable` must be
    /// present; unknown keys are ignored.
    pub fn parse(content: &[u8]) -> Result<Self> {
        serde_json::from_slice(content).map_err(|e| Error::ManifestMalformed(e.to_string()))
    }

    /// Decode content that may be absent. Absence yields an empty manifest.
    pub fn from_content(content: Option<&[u8]>) -> Result<Self> {
        match content {
            Some(bytes) => Self::parse(bytes),
            None => Ok(Self::default()),
        }
    }

    /// Units in build order: dependencies before their dependents.
    pub fn build_order(&self) -> impl Iterator<Item = &UnitId> {
        self.unstable.iter().rev()
    }

    pub fn is_empty(&self) -> bool {
        self.stable.is_empty() && self.unstable.is_empty()
    }
}
