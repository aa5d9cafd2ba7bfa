//! Camera delta extraction
//!
//! Samples world transforms frame by frame and turns them into the six
//! frame-to-frame series Deforum consumes. Translation deltas are measured in
//! the camera's local space at the *destination* frame, rotation deltas are
//! the relative rotation between consecutive frames.

use glam::{DMat4, DQuat, DVec3, EulerRot};
use serde::Serialize;

use crate::error::ExportError;
use crate::scene::{FrameCursor, FrameRange, Scene};

/// Default scale from scene units to Deforum translation units
pub const DEFAULT_TRANSLATION_SCALE: f64 = 50.0;

/// One of the six tracked degrees of freedom
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Axis {
    TranslationX,
    TranslationY,
    TranslationZ,
    RotationX,
    RotationY,
    RotationZ,
}

impl Axis {
    /// All axes in export order
    pub const ALL: [Axis; 6] = [
        Axis::TranslationX,
        Axis::TranslationY,
        Axis::TranslationZ,
        Axis::RotationX,
        Axis::RotationY,
        Axis::RotationZ,
    ];

    /// Deforum parameter name
    pub fn name(self) -> &'static str {
        match self {
            Axis::TranslationX => "translation_x",
            Axis::TranslationY => "translation_y",
            Axis::TranslationZ => "translation_z",
            Axis::RotationX => "rotation_3d_x",
            Axis::RotationY => "rotation_3d_y",
            Axis::RotationZ => "rotation_3d_z",
        }
    }
}

/// Six per-transition series for one object
///
/// Field order is the serialized key order.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct CameraDeltas {
    #[serde(skip)]
    pub name: String,
    pub translation_x: Vec<f64>,
    pub translation_y: Vec<f64>,
    pub translation_z: Vec<f64>,
    pub rotation_3d_x: Vec<f64>,
    pub rotation_3d_y: Vec<f64>,
    pub rotation_3d_z: Vec<f64>,
}

impl CameraDeltas {
    fn with_capacity(name: &str, capacity: usize) -> Self {
        Self {
            name: name.to_string(),
            translation_x: Vec::with_capacity(capacity),
            translation_y: Vec::with_capacity(capacity),
            translation_z: Vec::with_capacity(capacity),
            rotation_3d_x: Vec::with_capacity(capacity),
            rotation_3d_y: Vec::with_capacity(capacity),
            rotation_3d_z: Vec::with_capacity(capacity),
        }
    }

    pub fn series(&self, axis: Axis) -> &[f64] {
        match axis {
            Axis::TranslationX => &self.translation_x,
            Axis::TranslationY => &self.translation_y,
            Axis::TranslationZ => &self.translation_z,
            Axis::RotationX => &self.rotation_3d_x,
            Axis::RotationY => &self.rotation_3d_y,
            Axis::RotationZ => &self.rotation_3d_z,
        }
    }

    /// Number of samples per series
    pub fn len(&self) -> usize {
        self.translation_x.len()
    }

    pub fn is_empty(&self) -> bool {
        self.translation_x.is_empty()
    }
}

/// Rotation and translation of a world matrix, scale discarded
fn decompose(matrix: &DMat4) -> (DQuat, DVec3) {
    let (_, rotation, translation) = matrix.to_scale_rotation_translation();
    (rotation, translation)
}

/// Delta between two consecutive world poses
///
/// Returns `(translation, rotation_degrees)` already converted to Deforum's
/// axis conventions (Z translation, Y and Z rotation flipped).
pub fn pose_delta(
    previous: &DMat4,
    current: &DMat4,
    translation_scale: f64,
) -> ([f64; 3], [f64; 3]) {
    let (old_rot, old_pos) = decompose(previous);
    let (new_rot, new_pos) = decompose(current);

    // World-to-local of the destination frame
    let (world_to_local, _) = decompose(&current.inverse());
    let local = world_to_local * (new_pos - old_pos);

    // Blender "XYZ" Euler: X applied first, then Y, then Z
    let (z, y, x) = (old_rot.inverse() * new_rot).to_euler(EulerRot::ZYX);

    (
        [
            translation_scale * local.x,
            translation_scale * local.y,
            -translation_scale * local.z,
        ],
        [x.to_degrees(), (-y).to_degrees(), (-z).to_degrees()],
    )
}

/// Extract the six delta series for every named object
///
/// The scene cursor is restored to its prior frame on return, whether or not
/// extraction succeeded.
///
/// # Errors
///
/// - [`ExportError::NoObjects`] if `objects` is empty
/// - [`ExportError::InvalidScale`] if `translation_scale` is not positive
/// - [`ExportError::UnknownObject`] if the scene cannot resolve a name
pub fn extract_deltas<S, N>(
    scene: &mut S,
    range: FrameRange,
    objects: &[N],
    translation_scale: f64,
) -> Result<Vec<CameraDeltas>, ExportError>
where
    S: Scene + ?Sized,
    N: AsRef<str>,
{
    if objects.is_empty() {
        return Err(ExportError::NoObjects);
    }
    if !(translation_scale.is_finite() && translation_scale > 0.0) {
        return Err(ExportError::InvalidScale(translation_scale));
    }

    let mut cursor = FrameCursor::new(scene);
    objects
        .iter()
        .map(|name| extract_object(&mut cursor, range, name.as_ref(), translation_scale))
        .collect()
}

fn extract_object<S: Scene + ?Sized>(
    cursor: &mut FrameCursor<'_, S>,
    range: FrameRange,
    name: &str,
    translation_scale: f64,
) -> Result<CameraDeltas, ExportError> {
    let mut deltas = CameraDeltas::with_capacity(name, range.transitions());
    let mut previous = cursor.sample(name, range.start())?;

    for frame in range.sample_frames() {
        let current = cursor.sample(name, frame)?;
        let (translation, rotation) = pose_delta(&previous, &current, translation_scale);

        deltas.translation_x.push(translation[0]);
        deltas.translation_y.push(translation[1]);
        deltas.translation_z.push(translation[2]);
        deltas.rotation_3d_x.push(rotation[0]);
        deltas.rotation_3d_y.push(rotation[1]);
        deltas.rotation_3d_z.push(rotation[2]);

        previous = current;
    }

    tracing::debug!(
        "Extracted '{}': {} transitions over frames {} - {}",
        name,
        deltas.len(),
        range.start(),
        range.end()
    );

    Ok(deltas)
}
