use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::errors::{PneumoniaError, Result};
use crate::preprocess::TENSOR_SHAPE;
use crate::traits::{ModelProvider, ProbabilityModel};
use ndarray::prelude::*;

/// Stub model that returns a fixed probability.
#[derive(Debug)]
pub struct MockProbabilityModel {
    pub probability: f32,
    pub input_shape: [usize; 4],
    released: Arc<AtomicUsize>,
}

impl ProbabilityModel for MockProbabilityModel {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<f32> {
        if tensor.shape() != &self.input_shape[..] {
            return Err(PneumoniaError::model(
                "mock prediction",
                format!("unexpected tensor shape {:?}", tensor.shape()),
            ));
        }
        Ok(self.probability)
    }
}

impl Drop for MockProbabilityModel {
    fn drop(&mut self) {
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

/// Provider for `MockProbabilityModel` that counts opened and released instances.
#[derive(Debug, Clone)]
pub struct MockModelProvider {
    pub probability: f32,
    pub input_shape: [usize; 4],
    opened: Arc<AtomicUsize>,
    released: Arc<AtomicUsize>,
}

impl MockModelProvider {
    pub fn new(probability: f32) -> Self {
        Self {
            probability,
            input_shape: TENSOR_SHAPE,
            opened: Arc::new(AtomicUsize::new(0)),
            released: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn with_input_shape(mut self, input_shape: [usize; 4]) -> Self {
        self.input_shape = input_shape;
        self
    }

    pub fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }
}

impl ModelProvider for MockModelProvider {
    type Model = MockProbabilityModel;

    fn open(&self) -> Result<MockProbabilityModel> {
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MockProbabilityModel {
            probability: self.probability,
            input_shape: self.input_shape,
            released: Arc::clone(&self.released),
        })
    }
}

/// Provider whose model can never be loaded.
#[derive(Debug, Clone, Default)]
pub struct FailingModelProvider;

impl ModelProvider for FailingModelProvider {
    type Model = MockProbabilityModel;

    fn open(&self) -> Result<MockProbabilityModel> {
        Err(PneumoniaError::model("model load", "model artifact unavailable"))
    }
}
