use std::path::Path;

use ndarray::{Array4, ArrayD, CowArray};
use ort::execution_providers::CPUExecutionProvider;
use ort::session::builder::{GraphOptimizationLevel, SessionBuilder};
use ort::session::Session;
use ort::value::ValueType;
use tracing::debug;

use crate::error::{DetectError, DetectResult};

const DEFAULT_INPUT_SIZE: u32 = 640;

/// The loaded ONNX detector. Read-only after construction.
#[derive(Debug)]
pub struct UnitModel {
    session: Session,
}

impl UnitModel {
    /// Loads the model artifact and builds a CPU inference session.
    pub fn load(path: &Path) -> DetectResult<Self> {
        if !path.exists() {
            return Err(DetectError::NotFound(path.to_path_buf()));
        }
        let session = SessionBuilder::new()?
            .with_execution_providers([CPUExecutionProvider::default().build()])?
            .with_optimization_level(GraphOptimizationLevel::Level3)?
            .commit_from_file(path)?;
        debug!("model loaded from {}", path.display());
        Ok(Self { session })
    }

    /// Square input side declared by the model ([1, 3, H, W]); a dynamic
    /// spatial axis falls back to 640.
    pub fn input_size(&self) -> u32 {
        match self.session.inputs.first().map(|input| &input.input_type) {
            Some(ValueType::Tensor { dimensions, .. }) => dimensions
                .get(2)
                .copied()
                .filter(|&dim| dim > 0)
                .map(|dim| dim as u32)
                .unwrap_or(DEFAULT_INPUT_SIZE),
            _ => DEFAULT_INPUT_SIZE,
        }
    }

    /// Class count from the declared output shape [1, 4+C, N], when static.
    pub fn num_classes(&self) -> Option<usize> {
        match self.session.outputs.first().map(|output| &output.output_type) {
            Some(ValueType::Tensor { dimensions, .. }) => dimensions
                .get(1)
                .copied()
                .filter(|&dim| dim > 4)
                .map(|dim| dim as usize - 4),
            _ => None,
        }
    }

    /// One forward pass; returns the first output as an owned f32 tensor.
    pub fn run(&self, input: Array4<f32>) -> DetectResult<ArrayD<f32>> {
        let input = CowArray::from(input.into_dyn());
        let outputs = self.session.run(ort::inputs![input.view()]?)?;
        let (_name, value) = outputs
            .iter()
            .next()
            .ok_or_else(|| DetectError::Inference("model produced no outputs".into()))?;
        Ok(value.try_extract_tensor::<f32>()?.into_owned())
    }
}
