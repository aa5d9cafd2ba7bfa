//! Recorded scene generators for integration tests

use serde_json::{Value, json};
use std::path::Path;

/// Camera dollying forward 0.125 units per frame along world -Z, no rotation
pub fn dolly_scene(frames: usize) -> Value {
    let poses: Vec<Value> = (0..frames)
        .map(|i| {
            json!({ "position": [0.0, 1.0, -0.125 * i as f64], "rotation": [0.0, 0.0, 0.0, 1.0] })
        })
        .collect();
    json!({
        "frame_current": 3,
        "objects": [ { "name": "Dolly", "start_frame": 1, "poses": poses } ]
    })
}

/// Two cameras: one panning 2 degrees per frame about Y, one standing still
pub fn pan_and_still_scene(frames: usize) -> Value {
    let pan: Vec<Value> = (0..frames)
        .map(|i| {
            let half = (2.0 * i as f64).to_radians() / 2.0;
            json!({ "position": [0.0, 0.0, 0.0], "rotation": [0.0, half.sin(), 0.0, half.cos()] })
        })
        .collect();
    json!({
        "frame_current": 1,
        "objects": [
            { "name": "Pan", "start_frame": 1, "poses": pan },
            { "name": "Still", "start_frame": 1, "poses": [ { "position": [5.0, 5.0, 5.0] } ] }
        ]
    })
}

pub fn write_scene(path: &Path, scene: &Value) -> std::io::Result<()> {
    std::fs::write(path, serde_json::to_string_pretty(scene).expect("scene serializes"))
}
