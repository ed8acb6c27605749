//! Landmark to pixel keypoint extraction.

use crate::error::{Error, Result};
use crate::types::{Joint, KeypointSet, LandmarkPoint, PixelPoint};

/// Scales normalized detector landmarks into the pixel keypoints the
/// pose rules work with.
#[derive(Debug, Clone, Copy, Default)]
pub struct KeypointExtractor;

impl KeypointExtractor {
    pub fn new() -> Self {
        Self
    }

    /// Extract the 12 evaluation joints from a detector frame
    ///
    /// x is scaled by the camera width and y by the frame height, each
    /// rounded to the nearest pixel. Returns an empty set if any joint's
    /// landmark index is missing from the frame.
    pub fn extract(
        &self,
        landmarks: &[LandmarkPoint],
        camera_width: u32,
        frame_height: u32,
    ) -> KeypointSet {
        self.try_extract(landmarks, camera_width, frame_height)
            .unwrap_or_else(|_| KeypointSet::empty())
    }

    /// Like [`extract`](Self::extract), but reports a truncated frame as
    /// [`Error::MissingLandmarks`].
    pub fn try_extract(
        &self,
        landmarks: &[LandmarkPoint],
        camera_width: u32,
        frame_height: u32,
    ) -> Result<KeypointSet> {
        let width = camera_width as f64;
        let height = frame_height as f64;

        let mut set = KeypointSet::empty();
        for joint in Joint::ALL {
            let Some(lm) = joint.landmark().in_frame(landmarks) else {
                return Err(Error::MissingLandmarks {
                    required: Self::required_landmarks(),
                    available: landmarks.len(),
                });
            };
            let point = PixelPoint::new(
                (lm.x * width).round() as i32,
                (lm.y * height).round() as i32,
                lm.visibility(),
            );
            set = set.with(joint, point);
        }
        Ok(set)
    }

    /// Minimum frame length that covers every evaluation joint
    pub fn required_landmarks() -> usize {
        Joint::ALL
            .iter()
            .map(|joint| joint.landmark().index() + 1)
            .max()
            .unwrap_or(0)
    }
}
