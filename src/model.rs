use std::path::{Path, PathBuf};

use crate::{
    errors::{PneumoniaError, Result},
    preprocess::TENSOR_SHAPE,
    traits::{ModelProvider, ProbabilityModel},
};
use ndarray::prelude::*;
use ort::value::TensorRef;
use ort::{
    execution_providers::{CUDAExecutionProvider, TensorRTExecutionProvider},
    session::{builder::SessionBuilder, Session},
};
use parking_lot::Mutex;

/// The chest X-ray classifier loaded into ONNX Runtime.
pub struct OnnxModel {
    session: Mutex<Session>,
    input_name: String,
    output_name: String,
    input_shape: [usize; 4],
}

impl OnnxModel {
    pub fn new(model_path: &Path, device_id: i32) -> Result<Self> {
        let session = SessionBuilder::new()
            .map_err(|e| PneumoniaError::Model {
                operation: "session builder init".to_string(),
                source: Box::new(e),
            })?
            .with_execution_providers([
                TensorRTExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
                CUDAExecutionProvider::default()
                    .with_device_id(device_id)
                    .build(),
            ])
            .map_err(|e| PneumoniaError::Model {
                operation: "execution provider setup".to_string(),
                source: Box::new(e),
            })?
            .commit_from_file(model_path)
            .map_err(|e| PneumoniaError::Model {
                operation: format!("load model file {}", model_path.display()),
                source: Box::new(e),
            })?;

        let input = session
            .inputs
            .first()
            .ok_or_else(|| PneumoniaError::model("model input lookup", "model has no inputs"))?;
        let dims: Vec<i64> = input
            .input_type
            .tensor_shape()
            .ok_or_else(|| {
                PneumoniaError::model("model input lookup", "first input is not a tensor")
            })?
            .iter()
            .copied()
            .collect();
        tracing::debug!(input = %input.name, shape = ?dims, "model expects input shape");
        let input_shape = validate_input_shape(&dims)?;
        let input_name = input.name.clone();

        let output_name = session
            .outputs
            .first()
            .map(|o| o.name.clone())
            .ok_or_else(|| PneumoniaError::model("model output lookup", "model has no outputs"))?;

        Ok(Self {
            session: Mutex::new(session),
            input_name,
            output_name,
            input_shape,
        })
    }
}

impl ProbabilityModel for OnnxModel {
    fn input_shape(&self) -> [usize; 4] {
        self.input_shape
    }

    fn predict(&self, tensor: ArrayView4<f32>) -> Result<f32> {
        let mut binding = self.session.lock();
        let outputs = binding.run(ort::inputs![
            self.input_name.as_str() => TensorRef::from_array_view(&tensor.as_standard_layout())?
        ])?;
        let probabilities = outputs[self.output_name.as_str()].try_extract_array::<f32>()?;
        let probability = probabilities.iter().next().copied().ok_or_else(|| {
            PneumoniaError::model("model output extraction", "output tensor is empty")
        })?;
        Ok(probability)
    }
}

/// Accepts `[N, 150, 150, 1]` where `N` is 1 or dynamic (negative).
pub fn validate_input_shape(dims: &[i64]) -> Result<[usize; 4]> {
    let expected = TENSOR_SHAPE.map(|d| d as i64);
    let matches = dims.len() == 4
        && (dims[0] == expected[0] || dims[0] < 0)
        && dims[1..] == expected[1..];
    if !matches {
        return Err(PneumoniaError::model(
            "model input validation",
            format!("expected input shape {expected:?}, model declares {dims:?}"),
        ));
    }
    Ok(TENSOR_SHAPE)
}

/// Opens the ONNX model file once per classification.
#[derive(Debug, Clone)]
pub struct OnnxModelProvider {
    model_path: PathBuf,
    device_id: i32,
}

impl OnnxModelProvider {
    pub fn new(model_path: impl Into<PathBuf>, device_id: i32) -> Self {
        Self {
            model_path: model_path.into(),
            device_id,
        }
    }

    pub fn model_path(&self) -> &Path {
        &self.model_path
    }
}

impl ModelProvider for OnnxModelProvider {
    type Model = OnnxModel;

    fn open(&self) -> Result<OnnxModel> {
        OnnxModel::new(&self.model_path, self.device_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_fixed_and_dynamic_batch() -> Result<()> {
        assert_eq!(validate_input_shape(&[1, 150, 150, 1])?, [1, 150, 150, 1]);
        assert_eq!(validate_input_shape(&[-1, 150, 150, 1])?, [1, 150, 150, 1]);
        Ok(())
    }

    #[test]
    fn test_rejects_other_layouts() {
        for dims in [
            vec![1, 1, 150, 150],
            vec![1, 224, 224, 3],
            vec![150, 150, 1],
            vec![2, 150, 150, 1],
        ] {
            assert!(
                matches!(validate_input_shape(&dims), Err(PneumoniaError::Model { .. })),
                "{dims:?}"
            );
        }
    }

    #[test]
    fn test_missing_model_file_fails_to_open() {
        let provider = OnnxModelProvider::new("/nonexistent/chestXray_model.onnx", 0);
        assert!(matches!(
            provider.open(),
            Err(PneumoniaError::Model { .. })
        ));
    }
}
