//! Recorded scene loaded from a JSON pose dump
//!
//! Stands in for a live host scene: each object carries one pose per frame
//! starting at its `start_frame`. Frames before or after the recording hold
//! the nearest recorded pose.

use glam::{DMat4, DQuat, DVec3};
use serde::{Deserialize, Serialize};

use crate::error::ExportError;
use crate::scene::Scene;

/// World pose of one object at one frame (scale is not recorded)
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedPose {
    /// World position
    #[serde(default)]
    pub position: [f64; 3],
    /// World rotation quaternion [x, y, z, w]
    #[serde(default = "identity_rotation")]
    pub rotation: [f64; 4],
}

fn identity_rotation() -> [f64; 4] {
    [0.0, 0.0, 0.0, 1.0]
}

impl Default for RecordedPose {
    fn default() -> Self {
        Self {
            position: [0.0; 3],
            rotation: identity_rotation(),
        }
    }
}

impl RecordedPose {
    pub fn new(position: DVec3, rotation: DQuat) -> Self {
        Self {
            position: position.to_array(),
            rotation: rotation.to_array(),
        }
    }

    /// Rigid world matrix for this pose
    ///
    /// The stored quaternion is normalized first; a zero quaternion falls back
    /// to identity.
    pub fn to_matrix(&self) -> DMat4 {
        let rotation = DQuat::from_array(self.rotation);
        let rotation = if rotation.length_squared() > 0.0 {
            rotation.normalize()
        } else {
            DQuat::IDENTITY
        };
        DMat4::from_rotation_translation(rotation, DVec3::from_array(self.position))
    }
}

/// One animated object and its per-frame poses
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RecordedObject {
    pub name: String,
    /// Frame the first pose belongs to
    #[serde(default)]
    pub start_frame: i32,
    pub poses: Vec<RecordedPose>,
}

impl RecordedObject {
    /// Last frame with a recorded pose, if any
    ///
    /// Computed in `i64`: a recording may run past `i32::MAX`.
    pub fn end_frame(&self) -> Option<i64> {
        let count = i64::try_from(self.poses.len()).ok()?;
        (count > 0).then(|| i64::from(self.start_frame) + count - 1)
    }

    /// Pose at `frame`, holding the first/last pose outside the recording
    pub fn pose_at(&self, frame: i32) -> RecordedPose {
        if self.poses.is_empty() {
            return RecordedPose::default();
        }
        let last = self.poses.len() as i64 - 1;
        let index = (frame as i64 - self.start_frame as i64).clamp(0, last);
        self.poses[index as usize]
    }
}

/// In-memory scene with a frame cursor
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RecordedScene {
    #[serde(default)]
    pub frame_current: i32,
    #[serde(default)]
    pub objects: Vec<RecordedObject>,
}

impl RecordedScene {
    /// Parse a scene from its JSON form
    pub fn from_json(json: &str) -> Result<Self, ExportError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Serialize the scene to pretty JSON
    pub fn to_json(&self) -> Result<String, ExportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn object(&self, name: &str) -> Option<&RecordedObject> {
        self.objects.iter().find(|o| o.name == name)
    }
}

impl Scene for RecordedScene {
    fn current_frame(&self) -> i32 {
        self.frame_current
    }

    fn set_frame(&mut self, frame: i32) {
        self.frame_current = frame;
    }

    fn world_matrix(&self, object: &str) -> Result<DMat4, ExportError> {
        self.object(object)
            .map(|o| o.pose_at(self.frame_current).to_matrix())
            .ok_or_else(|| ExportError::UnknownObject(object.to_string()))
    }

    fn object_names(&self) -> Vec<String> {
        self.objects.iter().map(|o| o.name.clone()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dolly() -> RecordedObject {
        RecordedObject {
            name: "Dolly".to_string(),
            start_frame: 10,
            poses: (0..3)
                .map(|i| RecordedPose::new(DVec3::new(i as f64, 0.0, 0.0), DQuat::IDENTITY))
                .collect(),
        }
    }

    #[test]
    fn test_pose_holds_outside_recording() {
        let object = dolly();
        assert_eq!(object.end_frame(), Some(12));
        assert_eq!(object.pose_at(5).position, [0.0, 0.0, 0.0]);
        assert_eq!(object.pose_at(11).position, [1.0, 0.0, 0.0]);
        assert_eq!(object.pose_at(400).position, [2.0, 0.0, 0.0]);
    }

    #[test]
    fn test_end_frame_near_frame_limit() {
        let object = RecordedObject {
            name: "Late".to_string(),
            start_frame: i32::MAX,
            poses: vec![RecordedPose::default(); 3],
        };
        assert_eq!(object.end_frame(), Some(i64::from(i32::MAX) + 2));
        assert_eq!(object.pose_at(i32::MAX).position, [0.0, 0.0, 0.0]);

        let empty = RecordedObject {
            name: "Empty".to_string(),
            start_frame: i32::MAX,
            poses: Vec::new(),
        };
        assert_eq!(empty.end_frame(), None);
    }

    #[test]
    fn test_world_matrix_follows_cursor() {
        let mut scene = RecordedScene {
            frame_current: 10,
            objects: vec![dolly()],
        };
        scene.set_frame(12);
        let matrix = scene.world_matrix("Dolly").unwrap();
        assert_eq!(matrix.w_axis.truncate(), DVec3::new(2.0, 0.0, 0.0));
        assert!(matches!(
            scene.world_matrix("Missing"),
            Err(ExportError::UnknownObject(_))
        ));
    }

    #[test]
    fn test_parse_json_with_defaults() {
        let scene = RecordedScene::from_json(
            r#"{
                "frame_current": 3,
                "objects": [
                    { "name": "Camera", "poses": [ { "position": [1, 2, 3] }, {} ] }
                ]
            }"#,
        )
        .unwrap();

        assert_eq!(scene.frame_current, 3);
        assert_eq!(scene.object_names(), vec!["Camera".to_string()]);
        let camera = scene.object("Camera").unwrap();
        assert_eq!(camera.start_frame, 0);
        assert_eq!(camera.poses[0].rotation, [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(camera.poses[1].position, [0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_zero_quaternion_is_identity() {
        let pose = RecordedPose {
            position: [0.0; 3],
            rotation: [0.0; 4],
        };
        assert_eq!(pose.to_matrix(), DMat4::IDENTITY);
    }

    #[test]
    fn test_json_roundtrip() {
        let scene = RecordedScene {
            frame_current: 1,
            objects: vec![dolly()],
        };
        let parsed = RecordedScene::from_json(&scene.to_json().unwrap()).unwrap();
        assert_eq!(parsed, scene);
    }
}
