//! Detector manifest loading.
//!
//! The detector set is declared in an explicit JSON file read once at
//! startup — no implicit discovery. Each entry pairs the static
//! `DetectorConfig` with the deployment wiring (model path, output tensor
//! name, class channel) needed to construct its ONNX backend.

use std::path::Path;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;

use pyro_models::{DetectorConfig, DetectorKind};

use crate::adapter::DetectorAdapter;
use crate::error::ConfigResult;
use crate::onnx::{OnnxBoxDetector, OnnxClassifier};
use crate::registry::DetectorRegistry;

fn default_output_name() -> String {
    "output0".to_string()
}

fn default_num_classes() -> usize {
    80
}

/// One detector declaration in the manifest file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestEntry {
    /// Path to the trained ONNX artifact.
    pub model_path: String,
    /// Name of the model's output tensor.
    #[serde(default = "default_output_name")]
    pub output_name: String,
    /// Class channel read by box detectors (0 = person for COCO models).
    #[serde(default)]
    pub class_id: usize,
    /// Number of class channels in the box-detector output head.
    #[serde(default = "default_num_classes")]
    pub num_classes: usize,
    #[serde(flatten)]
    pub config: DetectorConfig,
}

impl ManifestEntry {
    /// Construct the backend adapter this entry declares.
    pub fn build_adapter(&self) -> ConfigResult<DetectorAdapter> {
        match self.config.kind {
            DetectorKind::Classifier => {
                let backend = OnnxClassifier::load(&self.model_path, &self.output_name)?;
                Ok(DetectorAdapter::Classifier(Arc::new(backend)))
            }
            DetectorKind::BoxDetector => {
                let backend = OnnxBoxDetector::load(
                    &self.model_path,
                    &self.output_name,
                    self.class_id,
                    self.num_classes,
                    // YOLO models take square input; width carries the side.
                    self.config.target_size.width,
                )?;
                Ok(DetectorAdapter::BoxDetector(Arc::new(backend)))
            }
        }
    }
}

/// Parse a manifest file into its entries.
pub fn load_manifest(path: &Path) -> ConfigResult<Vec<ManifestEntry>> {
    let raw = std::fs::read_to_string(path)?;
    let entries: Vec<ManifestEntry> = serde_json::from_str(&raw)?;
    info!(
        path = %path.display(),
        detectors = entries.len(),
        "Loaded detector manifest"
    );
    Ok(entries)
}

/// Load the manifest and build the validated registry in one step.
///
/// Any failure here is fatal: the process must not start serving with a
/// missing model or an invalid detector set.
pub fn registry_from_file(path: &Path) -> ConfigResult<DetectorRegistry> {
    let entries = load_manifest(path)?;

    let mut builder = DetectorRegistry::builder();
    for entry in entries {
        let adapter = entry.build_adapter()?;
        builder = builder.register(entry.config, adapter);
    }
    builder.build()
}
