//! Export payload assembly
//!
//! Renders extracted deltas in the text forms Deforum users paste into their
//! notebooks: per-axis parameter lines, a one-line `cam_code` tuple, a JSON
//! dump of the unencoded series, and raw-frames blocks.

use std::io;

use serde::Serialize;
use serde_json::ser::Formatter;

use crate::delta::{Axis, CameraDeltas, extract_deltas};
use crate::error::ExportError;
use crate::keyframe::{format_float, keyframe_string, raw_frames_string};
use crate::scene::{FrameRange, Scene};

/// Text written instead of keyframes when nothing was selected
pub const NOTHING_SELECTED: &str = "No Cameras selected for export";

/// One rendering of a camera's series
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputFormat {
    /// `translation_x = "..." #@param {type:"string"}` lines
    PerAxis,
    /// Single `cam_code` tuple assignment
    CamCode,
    /// Unencoded series as a JSON object
    Json,
    /// Run-start encoding of every axis, one block each
    RawFrames,
}

/// Output toggles as exposed to users
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OutputOptions {
    pub camcode: bool,
    pub json: bool,
    pub raw_frames: bool,
}

impl Default for OutputOptions {
    fn default() -> Self {
        Self {
            camcode: true,
            json: false,
            raw_frames: false,
        }
    }
}

impl OutputOptions {
    /// Formats to render, in output order
    ///
    /// Raw frames replace the per-axis block; every other toggle is independent.
    pub fn formats(&self) -> Vec<OutputFormat> {
        let mut formats = Vec::with_capacity(4);
        if !self.raw_frames {
            formats.push(OutputFormat::PerAxis);
        }
        if self.camcode {
            formats.push(OutputFormat::CamCode);
        }
        if self.json {
            formats.push(OutputFormat::Json);
        }
        if self.raw_frames {
            formats.push(OutputFormat::RawFrames);
        }
        formats
    }
}

/// Result of an export run
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ExportPayload {
    /// Rendered blocks for every selected camera
    Cameras(String),
    /// Selection was empty; no keyframes were produced
    NothingSelected,
}

impl ExportPayload {
    pub fn is_empty_selection(&self) -> bool {
        matches!(self, ExportPayload::NothingSelected)
    }

    pub fn as_text(&self) -> &str {
        match self {
            ExportPayload::Cameras(text) => text,
            ExportPayload::NothingSelected => NOTHING_SELECTED,
        }
    }
}

/// Python `json.dumps` layout: `", "` and `": "` separators, floats in the
/// same notation as the schedules
struct NotebookFormatter;

impl Formatter for NotebookFormatter {
    fn begin_array_value<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_key<W>(&mut self, writer: &mut W, first: bool) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        if first {
            Ok(())
        } else {
            writer.write_all(b", ")
        }
    }

    fn begin_object_value<W>(&mut self, writer: &mut W) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(b": ")
    }

    fn write_f64<W>(&mut self, writer: &mut W, value: f64) -> io::Result<()>
    where
        W: ?Sized + io::Write,
    {
        writer.write_all(format_float(value).as_bytes())
    }
}

fn notebook_json(deltas: &CameraDeltas) -> Result<String, ExportError> {
    let mut buf = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buf, NotebookFormatter);
    deltas.serialize(&mut serializer)?;
    Ok(String::from_utf8_lossy(&buf).into_owned())
}

fn render_format(
    out: &mut String,
    deltas: &CameraDeltas,
    format: OutputFormat,
) -> Result<(), ExportError> {
    match format {
        OutputFormat::PerAxis => {
            out.push_str(&format!("\nCamera Export: {}\n", deltas.name));
            for axis in Axis::ALL {
                out.push_str(&format!(
                    "{} = \"{}\" #@param {{type:\"string\"}}\n",
                    axis.name(),
                    keyframe_string(deltas.series(axis))
                ));
            }
        }
        OutputFormat::CamCode => {
            let names: Vec<_> = Axis::ALL.iter().map(|a| a.name()).collect();
            let strings: Vec<_> = Axis::ALL
                .iter()
                .map(|&a| format!("\"{}\"", keyframe_string(deltas.series(a))))
                .collect();
            out.push_str(&format!(
                "cam_code:\n({}) = ({})\n",
                names.join(","),
                strings.join(", ")
            ));
        }
        OutputFormat::Json => {
            out.push_str(&format!("JSON:\n {}\n", notebook_json(deltas)?));
        }
        OutputFormat::RawFrames => {
            for axis in Axis::ALL {
                out.push_str(&format!(
                    "\nRaw frames for {}:\n{}\n",
                    axis.name(),
                    raw_frames_string(deltas.series(axis))
                ));
            }
        }
    }
    Ok(())
}

/// Render one block per camera, in input order
pub fn render_cameras(
    cameras: &[CameraDeltas],
    options: &OutputOptions,
) -> Result<String, ExportError> {
    let formats = options.formats();
    let mut out = String::new();
    for deltas in cameras {
        for &format in &formats {
            render_format(&mut out, deltas, format)?;
        }
        out.push('\n');
    }
    Ok(out)
}

/// Extract and render the named cameras
///
/// An empty selection yields [`ExportPayload::NothingSelected`] rather than an
/// error; every other failure is returned as-is.
pub fn export_cameras<S, N>(
    scene: &mut S,
    range: FrameRange,
    cameras: &[N],
    translation_scale: f64,
    options: &OutputOptions,
) -> Result<ExportPayload, ExportError>
where
    S: Scene + ?Sized,
    N: AsRef<str>,
{
    match extract_deltas(scene, range, cameras, translation_scale) {
        Ok(deltas) => Ok(ExportPayload::Cameras(render_cameras(&deltas, options)?)),
        Err(ExportError::NoObjects) => {
            tracing::warn!("Nothing selected for export");
            Ok(ExportPayload::NothingSelected)
        }
        Err(e) => Err(e),
    }
}

/// Full document text: header line followed by the payload
pub fn export_document(range: FrameRange, payload: &ExportPayload) -> String {
    format!(
        "Export frames {} - {}\n{}",
        range.start(),
        range.end(),
        payload.as_text()
    )
}
