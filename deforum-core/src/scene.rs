//! Scene cursor access
//!
//! The host scene owns a single "current frame". Extraction seeks that cursor
//! frame by frame, so every access goes through [`FrameCursor`], which puts the
//! cursor back where it found it when dropped.

use std::ops::{Deref, DerefMut, Range};

use glam::DMat4;

use crate::error::ExportError;

/// Lowest frame a range may start at
pub const MIN_FRAME: i32 = 0;

/// Highest frame a range may end at
pub const MAX_FRAME: i32 = 1_048_574;

/// Host scene model queried for per-frame world transforms
pub trait Scene {
    /// Frame the scene is currently evaluated at
    fn current_frame(&self) -> i32;

    /// Move the scene cursor and re-evaluate object transforms
    fn set_frame(&mut self, frame: i32);

    /// World transform of the named object at the current frame
    fn world_matrix(&self, object: &str) -> Result<DMat4, ExportError>;

    /// Names of all objects the scene can sample, in scene order
    fn object_names(&self) -> Vec<String>;
}

/// Scoped hold on a scene's frame cursor
///
/// Restores the frame that was current at creation when dropped, including
/// when the holder bails out early with `?`.
pub struct FrameCursor<'a, S: Scene + ?Sized> {
    scene: &'a mut S,
    saved_frame: i32,
}

impl<'a, S: Scene + ?Sized> FrameCursor<'a, S> {
    pub fn new(scene: &'a mut S) -> Self {
        let saved_frame = scene.current_frame();
        Self { scene, saved_frame }
    }

    /// Frame that will be restored on drop
    pub fn saved_frame(&self) -> i32 {
        self.saved_frame
    }

    /// Seek to `frame` and read the object's world transform there
    pub fn sample(&mut self, object: &str, frame: i32) -> Result<DMat4, ExportError> {
        self.scene.set_frame(frame);
        self.scene.world_matrix(object)
    }
}

impl<S: Scene + ?Sized> Deref for FrameCursor<'_, S> {
    type Target = S;

    fn deref(&self) -> &S {
        self.scene
    }
}

impl<S: Scene + ?Sized> DerefMut for FrameCursor<'_, S> {
    fn deref_mut(&mut self) -> &mut S {
        self.scene
    }
}

impl<S: Scene + ?Sized> Drop for FrameCursor<'_, S> {
    fn drop(&mut self) {
        self.scene.set_frame(self.saved_frame);
    }
}

/// Half-open frame range `[start, end)` to export
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameRange {
    start: i32,
    end: i32,
}

impl FrameRange {
    /// Validate and build a range
    ///
    /// # Errors
    ///
    /// Returns [`ExportError::InvalidFrameRange`] if `end <= start` or either
    /// bound falls outside `MIN_FRAME..=MAX_FRAME`.
    pub fn new(start: i32, end: i32) -> Result<Self, ExportError> {
        if end <= start || start < MIN_FRAME || end > MAX_FRAME {
            return Err(ExportError::InvalidFrameRange { start, end });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> i32 {
        self.start
    }

    pub fn end(&self) -> i32 {
        self.end
    }

    /// Number of frame transitions sampled (length of every axis series)
    pub fn transitions(&self) -> usize {
        (self.end - self.start - 1) as usize
    }

    /// Frames visited after the reference frame; `end` itself is never sampled
    pub fn sample_frames(&self) -> Range<i32> {
        (self.start + 1)..self.end
    }
}
