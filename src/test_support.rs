//! Shared test support utilities
//!
//! Stub classifiers and image fixtures for unit and integration tests.

use std::io::Cursor;
use std::sync::atomic::{AtomicUsize, Ordering};

use image::{ImageFormat, Rgb, RgbImage};

use crate::error::CapabilityError;
use crate::port::{Detection, GenericVision, ModelInput, TrainedModel};

/// Encode a solid-colour PNG.
pub fn png_bytes(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let image = RgbImage::from_pixel(width, height, Rgb(rgb));
    let mut buffer = Vec::new();
    image
        .write_to(&mut Cursor::new(&mut buffer), ImageFormat::Png)
        .unwrap();
    buffer
}

/// Trained model returning a fixed probability vector.
pub struct StubTrainedModel {
    probabilities: Vec<f32>,
    calls: AtomicUsize,
}

impl StubTrainedModel {
    pub fn new(probabilities: Vec<f32>) -> Self {
        Self {
            probabilities,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl TrainedModel for StubTrainedModel {
    fn predict(&self, _input: &ModelInput) -> Result<Vec<f32>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.probabilities.clone())
    }
}

/// Trained model that always fails.
pub struct FailingModel;

impl TrainedModel for FailingModel {
    fn predict(&self, _input: &ModelInput) -> Result<Vec<f32>, CapabilityError> {
        Err(CapabilityError::Inference("stub failure".into()))
    }
}

/// Trained model that panics mid-inference.
pub struct PanickingModel;

impl TrainedModel for PanickingModel {
    fn predict(&self, _input: &ModelInput) -> Result<Vec<f32>, CapabilityError> {
        panic!("stub model panicked");
    }
}

/// Generic vision returning fixed detections.
pub struct StubVision {
    detections: Vec<Detection>,
    calls: AtomicUsize,
}

impl StubVision {
    pub fn new(detections: Vec<Detection>) -> Self {
        Self {
            detections,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl GenericVision for StubVision {
    fn predict(&self, input: &ModelInput) -> Result<Vec<Detection>, CapabilityError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        // symmetric scaling is applied before this point
        if input.tensor.iter().any(|v| *v < -1.0 || *v > 1.0) {
            return Err(CapabilityError::Input("tensor outside [-1, 1]".into()));
        }
        Ok(self.detections.clone())
    }

    fn name(&self) -> &str {
        "stub-vision"
    }
}

/// Generic vision that sleeps before answering, for boundary timeout tests.
pub struct SlowVision {
    pub delay: std::time::Duration,
}

impl GenericVision for SlowVision {
    fn predict(&self, _input: &ModelInput) -> Result<Vec<Detection>, CapabilityError> {
        std::thread::sleep(self.delay);
        Ok(vec![Detection {
            label: "bottle".into(),
            score: 0.9,
        }])
    }

    fn name(&self) -> &str {
        "slow-vision"
    }
}
