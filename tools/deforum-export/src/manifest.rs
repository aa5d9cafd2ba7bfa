//! export.toml manifest parsing
//!
//! Holds the settings a user would otherwise pick in the exporter's panel:
//! frame range, translation scale, camera selection and output toggles.
//! Command-line flags are applied on top with [`ExportManifest::apply`].

use anyhow::{Context, Result};
use deforum_core::{DEFAULT_TRANSLATION_SCALE, FrameRange, OutputOptions};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// export.toml manifest structure
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportManifest {
    #[serde(default)]
    pub range: RangeSection,
    #[serde(default)]
    pub export: ExportSection,
    #[serde(default)]
    pub output: OutputSection,
}

/// Frame range section
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RangeSection {
    /// First frame (reference pose, not emitted itself)
    #[serde(default = "default_start")]
    pub start: i32,
    /// End frame (exclusive)
    #[serde(default = "default_end")]
    pub end: i32,
}

fn default_start() -> i32 {
    1
}

fn default_end() -> i32 {
    250
}

impl Default for RangeSection {
    fn default() -> Self {
        Self {
            start: default_start(),
            end: default_end(),
        }
    }
}

/// Extraction settings
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ExportSection {
    /// Scene units to Deforum translation units.
    /// Default: 50.0
    #[serde(default = "default_translation_scale")]
    pub translation_scale: f64,

    /// Objects to export. Empty means every recorded object.
    #[serde(default)]
    pub cameras: Vec<String>,
}

fn default_translation_scale() -> f64 {
    DEFAULT_TRANSLATION_SCALE
}

impl Default for ExportSection {
    fn default() -> Self {
        Self {
            translation_scale: default_translation_scale(),
            cameras: Vec::new(),
        }
    }
}

/// Output toggles and destination
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OutputSection {
    #[serde(default = "default_true")]
    pub camcode: bool,
    #[serde(default)]
    pub json: bool,
    #[serde(default)]
    pub raw_frames: bool,
    /// Output file (relative paths resolve against the manifest directory)
    #[serde(default)]
    pub path: Option<PathBuf>,
}

fn default_true() -> bool {
    true
}

impl Default for OutputSection {
    fn default() -> Self {
        Self {
            camcode: true,
            json: false,
            raw_frames: false,
            path: None,
        }
    }
}

/// Command-line values that take precedence over the manifest
#[derive(Debug, Default)]
pub struct Overrides {
    pub start: Option<i32>,
    pub end: Option<i32>,
    pub scale: Option<f64>,
    pub cameras: Vec<String>,
    pub camcode: Option<bool>,
    pub json: bool,
    pub raw_frames: bool,
    pub output: Option<PathBuf>,
}

impl ExportManifest {
    /// Parse manifest text
    pub fn parse(content: &str) -> Result<Self> {
        toml::from_str(content).context("Failed to parse export manifest")
    }

    /// Load a manifest file, resolving `output.path` against its directory
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read manifest: {:?}", path))?;
        let mut manifest =
            Self::parse(&content).with_context(|| format!("Invalid manifest: {:?}", path))?;

        if let (Some(output), Some(dir)) = (manifest.output.path.as_mut(), path.parent()) {
            if output.is_relative() {
                *output = dir.join(&*output);
            }
        }
        Ok(manifest)
    }

    /// Load `path` if given, otherwise use defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }

    /// Layer command-line overrides on top of the manifest
    pub fn apply(mut self, overrides: Overrides) -> Self {
        if let Some(start) = overrides.start {
            self.range.start = start;
        }
        if let Some(end) = overrides.end {
            self.range.end = end;
        }
        if let Some(scale) = overrides.scale {
            self.export.translation_scale = scale;
        }
        if !overrides.cameras.is_empty() {
            self.export.cameras = overrides.cameras;
        }
        if let Some(camcode) = overrides.camcode {
            self.output.camcode = camcode;
        }
        self.output.json |= overrides.json;
        self.output.raw_frames |= overrides.raw_frames;
        if overrides.output.is_some() {
            self.output.path = overrides.output;
        }
        self
    }

    /// Validated frame range
    pub fn frame_range(&self) -> Result<FrameRange> {
        Ok(FrameRange::new(self.range.start, self.range.end)?)
    }

    pub fn output_options(&self) -> OutputOptions {
        OutputOptions {
            camcode: self.output.camcode,
            json: self.output.json,
            raw_frames: self.output.raw_frames,
        }
    }

    /// Cameras to export: the configured list, or every object in the scene
    pub fn camera_selection(&self, scene_objects: Vec<String>) -> Vec<String> {
        if self.export.cameras.is_empty() {
            scene_objects
        } else {
            self.export.cameras.clone()
        }
    }
}
