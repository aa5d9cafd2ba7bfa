//! deforum-export - Deforum camera export tool
//!
//! Converts recorded camera poses (.json scene dumps) into Deforum keyframe
//! schedules and writes them to a text file.

mod manifest;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use deforum_core::{
    Axis, RecordedScene, Scene, export_cameras, export_document, extract_deltas, keyframe,
    schedule_mismatch,
};
use std::path::{Path, PathBuf};

use manifest::{ExportManifest, Overrides};

#[derive(Parser)]
#[command(name = "deforum-export")]
#[command(about = "Export camera animation as Deforum keyframe strings")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Export camera deltas to a text file
    Export {
        /// Recorded scene (.json)
        scene: PathBuf,

        /// Output text file (default: scene path with .txt extension)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        settings: SettingsArgs,

        /// Also print the export to stdout
        #[arg(long)]
        print: bool,
    },

    /// List objects in a recorded scene
    List {
        /// Recorded scene (.json)
        scene: PathBuf,
    },

    /// Validate settings and verify that every schedule decodes back
    Check {
        /// Recorded scene (.json)
        scene: PathBuf,

        #[command(flatten)]
        settings: SettingsArgs,
    },
}

#[derive(Args)]
struct SettingsArgs {
    /// Path to export.toml manifest
    #[arg(short, long)]
    manifest: Option<PathBuf>,

    /// First frame of the range
    #[arg(long)]
    start: Option<i32>,

    /// End frame of the range (exclusive)
    #[arg(long)]
    end: Option<i32>,

    /// Translation scale (scene units to Deforum units)
    #[arg(long)]
    scale: Option<f64>,

    /// Camera to export (repeatable; default: all recorded objects)
    #[arg(short, long = "camera")]
    cameras: Vec<String>,

    /// Include the cam_code tuple
    #[arg(long, overrides_with = "no_camcode")]
    camcode: bool,

    /// Omit the cam_code tuple
    #[arg(long, overrides_with = "camcode")]
    no_camcode: bool,

    /// Include the unencoded series as JSON
    #[arg(long)]
    json: bool,

    /// Write raw frames instead of per-axis schedules
    #[arg(long)]
    raw_frames: bool,
}

impl SettingsArgs {
    fn resolve(self, output: Option<PathBuf>) -> Result<ExportManifest> {
        let manifest = ExportManifest::load_or_default(self.manifest.as_deref())?;
        let camcode = match (self.camcode, self.no_camcode) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        Ok(manifest.apply(Overrides {
            start: self.start,
            end: self.end,
            scale: self.scale,
            cameras: self.cameras,
            camcode,
            json: self.json,
            raw_frames: self.raw_frames,
            output,
        }))
    }
}

fn load_scene(path: &Path) -> Result<RecordedScene> {
    let json = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read scene: {:?}", path))?;
    RecordedScene::from_json(&json).with_context(|| format!("Invalid scene file: {:?}", path))
}

fn run_export(scene_path: &Path, settings: ExportManifest, print: bool) -> Result<()> {
    let mut scene = load_scene(scene_path)?;
    let range = settings.frame_range()?;
    let cameras = settings.camera_selection(scene.object_names());
    let output = settings
        .output
        .path
        .clone()
        .unwrap_or_else(|| scene_path.with_extension("txt"));

    tracing::info!(
        "Exporting {} camera(s), frames {} - {} -> {:?}",
        cameras.len(),
        range.start(),
        range.end(),
        output
    );

    let payload = export_cameras(
        &mut scene,
        range,
        &cameras,
        settings.export.translation_scale,
        &settings.output_options(),
    )?;
    if payload.is_empty_selection() {
        tracing::warn!("No cameras selected, writing notice only");
    }

    let document = export_document(range, &payload);
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create output directory: {:?}", parent))?;
    }
    std::fs::write(&output, &document)
        .with_context(|| format!("Failed to write output: {:?}", output))?;

    if print {
        println!("{document}");
    }
    Ok(())
}

fn list_objects(scene_path: &Path) -> Result<()> {
    let scene = load_scene(scene_path)?;
    if scene.objects.is_empty() {
        tracing::info!("No objects found in {:?}", scene_path);
        return Ok(());
    }

    tracing::info!("Objects in {:?} (current frame {}):", scene_path, scene.frame_current);
    for (i, object) in scene.objects.iter().enumerate() {
        match object.end_frame() {
            Some(end) => tracing::info!(
                "  [{}] '{}': frames {} - {} ({} poses)",
                i,
                object.name,
                object.start_frame,
                end,
                object.poses.len()
            ),
            None => tracing::info!("  [{}] '{}': no poses", i, object.name),
        }
    }
    Ok(())
}

fn check_export(scene_path: &Path, settings: ExportManifest) -> Result<()> {
    let mut scene = load_scene(scene_path)?;
    let range = settings.frame_range()?;
    let cameras = settings.camera_selection(scene.object_names());
    if cameras.is_empty() {
        anyhow::bail!("No cameras selected for export");
    }

    let deltas = extract_deltas(
        &mut scene,
        range,
        &cameras,
        settings.export.translation_scale,
    )?;

    for camera in &deltas {
        for axis in Axis::ALL {
            let series = camera.series(axis);
            let schedule = keyframe::keyframe_string(series);
            if let Some(index) = schedule_mismatch(series, &schedule)? {
                anyhow::bail!(
                    "'{}' {} does not round-trip at index {}: sample {} in \"{}\"",
                    camera.name,
                    axis.name(),
                    index,
                    series[index],
                    schedule
                );
            }

            let kept = keyframe::encode_keyframes(series).len();
            tracing::debug!(
                "'{}' {}: {} of {} samples kept",
                camera.name,
                axis.name(),
                kept,
                series.len()
            );
        }
        tracing::info!("'{}': {} transitions OK", camera.name, camera.len());
    }

    tracing::info!("Export settings are valid!");
    Ok(())
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Export {
            scene,
            output,
            settings,
            print,
        } => {
            let settings = settings.resolve(output)?;
            run_export(&scene, settings, print)?;
            tracing::info!("Done!");
        }

        Commands::List { scene } => {
            list_objects(&scene)?;
        }

        Commands::Check { scene, settings } => {
            let settings = settings.resolve(None)?;
            check_export(&scene, settings)?;
        }
    }

    Ok(())
}
