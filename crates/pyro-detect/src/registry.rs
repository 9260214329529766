//! The configured set of detectors.

use std::collections::HashMap;
use std::sync::Arc;

use tracing::{info, warn};

use pyro_imaging::Frame;
use pyro_models::{DetectionResult, DetectorConfig, DetectorKind};

use crate::adapter::DetectorAdapter;
use crate::error::{ConfigError, ConfigResult, InferenceResult};

/// One registered detector: its static config plus its adapter.
pub struct DetectorEntry {
    config: DetectorConfig,
    adapter: DetectorAdapter,
}

impl DetectorEntry {
    pub fn config(&self) -> &DetectorConfig {
        &self.config
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Invoke this detector on a frame.
    ///
    /// Concurrency is adapter-specific: the ONNX backends serialize
    /// invocations behind their session mutex, so concurrent calls against
    /// the same entry are safe but queue.
    pub async fn infer(&self, frame: &Arc<Frame>) -> InferenceResult<DetectionResult> {
        self.adapter.infer(frame, &self.config).await
    }
}

/// Ordered, immutable set of registered detectors with O(1) name lookup.
///
/// Built once at startup from explicit configuration; adding, removing, or
/// re-thresholding a detector means rebuilding the registry.
pub struct DetectorRegistry {
    entries: Vec<Arc<DetectorEntry>>,
    by_name: HashMap<String, usize>,
}

impl std::fmt::Debug for DetectorRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DetectorRegistry")
            .field(
                "entries",
                &self.entries.iter().map(|e| e.name()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl DetectorRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::default()
    }

    pub fn get(&self, name: &str) -> Option<&Arc<DetectorEntry>> {
        self.by_name.get(name).map(|&i| &self.entries[i])
    }

    /// Entries in registration order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<DetectorEntry>> {
        self.entries.iter()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Registered hazard names in registration order.
    pub fn names(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|e| e.config.name.clone())
            .collect()
    }
}

/// Builder validating the detector set before it goes live.
#[derive(Default)]
pub struct RegistryBuilder {
    pending: Vec<(DetectorConfig, DetectorAdapter)>,
}

impl RegistryBuilder {
    pub fn register(mut self, config: DetectorConfig, adapter: DetectorAdapter) -> Self {
        self.pending.push((config, adapter));
        self
    }

    pub fn build(self) -> ConfigResult<DetectorRegistry> {
        if self.pending.is_empty() {
            return Err(ConfigError::NoDetectors);
        }

        let mut entries = Vec::with_capacity(self.pending.len());
        let mut by_name = HashMap::with_capacity(self.pending.len());

        for (config, adapter) in self.pending {
            validate(&config, &adapter)?;

            if by_name.contains_key(&config.name) {
                return Err(ConfigError::DuplicateDetector(config.name));
            }

            info!(
                detector = %config.name,
                kind = %config.kind,
                backend = adapter.backend_name(),
                threshold = config.threshold,
                polarity_flip = config.normalization.polarity_flip,
                "Registered detector"
            );

            by_name.insert(config.name.clone(), entries.len());
            entries.push(Arc::new(DetectorEntry { config, adapter }));
        }

        Ok(DetectorRegistry { entries, by_name })
    }
}

fn validate(config: &DetectorConfig, adapter: &DetectorAdapter) -> ConfigResult<()> {
    if config.name.trim().is_empty() {
        return Err(ConfigError::EmptyName);
    }

    if !(0.0..=1.0).contains(&config.threshold) {
        return Err(ConfigError::InvalidThreshold {
            name: config.name.clone(),
            value: config.threshold,
        });
    }

    // A zero dimension would reach the resize step and, for box detectors,
    // poison the coordinate rescale with infinite scale factors.
    if config.target_size.width == 0 || config.target_size.height == 0 {
        return Err(ConfigError::InvalidTargetSize {
            name: config.name.clone(),
            width: config.target_size.width,
            height: config.target_size.height,
        });
    }

    if config.kind != adapter.kind() {
        return Err(ConfigError::KindMismatch {
            name: config.name.clone(),
            configured: config.kind.to_string(),
            adapter: adapter.kind().to_string(),
        });
    }

    match config.kind {
        DetectorKind::BoxDetector => {
            if config.box_floor > config.threshold {
                return Err(ConfigError::BoxFloorAboveThreshold {
                    name: config.name.clone(),
                    floor: config.box_floor,
                    threshold: config.threshold,
                });
            }
            if config.normalization.polarity_flip {
                // Polarity applies to scalar classifier output only.
                warn!(
                    detector = %config.name,
                    "polarity_flip set on a box detector; flag is ignored"
                );
            }
        }
        DetectorKind::Classifier => {}
    }

    Ok(())
}
