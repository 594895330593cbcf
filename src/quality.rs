//! Current quality tier, shared between the HTTP layer and the supervisor.

use deskcast_av::QualityPreset;
use parking_lot::RwLock;
use std::sync::Arc;

#[derive(Debug, Clone, Default)]
pub struct QualityController {
    current: Arc<RwLock<QualityPreset>>,
}

impl QualityController {
    pub fn new(initial: QualityPreset) -> Self {
        Self {
            current: Arc::new(RwLock::new(initial)),
        }
    }

    pub fn current(&self) -> QualityPreset {
        *self.current.read()
    }

    /// Select a tier by name. Returns whether the selection changed.
    ///
    /// Unknown names fail with `InvalidPreset` and leave the selection as is.
    pub fn set(&self, name: &str) -> deskcast_common::Result<bool> {
        let preset: QualityPreset = name.parse()?;
        let mut current = self.current.write();
        if *current == preset {
            return Ok(false);
        }
        *current = preset;
        Ok(true)
    }
}
