//! ONNX Runtime estimator for the exported regression model

use anyhow::{Context, Result};
use ort::session::Session;
use ort::value::Tensor;
use std::sync::Mutex;
use tracing::debug;

use crate::models::{lock_model, Estimator};

/// Loaded ONNX regression model.
///
/// `Session::run` needs exclusive access, so the session sits behind a
/// mutex; concurrent requests queue on it.
pub struct OnnxEstimator {
    /// Model name
    name: String,
    /// ONNX Runtime session
    session: Mutex<Session>,
    /// Input name for the model
    input_name: String,
    /// Output name for the prediction
    output_name: String,
    /// Trailing input dimension, when the model declares a fixed one
    input_width: Option<usize>,
}

impl OnnxEstimator {
    pub fn new(name: &str, session: Session) -> Self {
        let input_name = session
            .inputs
            .first()
            .map(|i| i.name.clone())
            .unwrap_or_else(|| "float_input".to_string());

        // skl2onnx names the regressor output "variable"
        let output_name = session
            .outputs
            .iter()
            .find(|o| o.name.contains("variable") || o.name.contains("output"))
            .or_else(|| session.outputs.first())
            .map(|o| o.name.clone())
            .unwrap_or_else(|| "variable".to_string());

        // Input is [batch, features]; a dynamic width is reported as -1
        let input_width = session
            .inputs
            .first()
            .and_then(|i| i.input_type.tensor_shape())
            .and_then(|shape| shape.last().copied())
            .filter(|&width| width > 0)
            .map(|width| width as usize);

        Self {
            name: name.to_string(),
            input_width,
            session: Mutex::new(session),
            input_name,
            output_name,
        }
    }

    pub fn input_name(&self) -> &str {
        &self.input_name
    }

    pub fn output_name(&self) -> &str {
        &self.output_name
    }

    /// Read the single regression value from the output tensor
    fn extract_prediction(&self, outputs: &ort::session::SessionOutputs) -> Result<f64> {
        let output = outputs
            .get(self.output_name.as_str())
            .with_context(|| format!("Model output '{}' missing", self.output_name))?;

        if let Ok((_, data)) = output.try_extract_tensor::<f32>() {
            return data
                .first()
                .map(|&v| v as f64)
                .context("Model returned an empty tensor");
        }

        let (_, data) = output
            .try_extract_tensor::<f64>()
            .context("Model output is not a float tensor")?;
        data.first().copied().context("Model returned an empty tensor")
    }
}

impl Estimator for OnnxEstimator {
    fn name(&self) -> &str {
        &self.name
    }

    fn expected_features(&self) -> Option<usize> {
        self.input_width
    }

    fn predict(&self, features: &[f32]) -> Result<f64> {
        // Prepare input tensor - shape [1, num_features]
        let shape = vec![1_i64, features.len() as i64];
        let input_tensor = Tensor::from_array((shape, features.to_vec()))
            .context("Failed to create input tensor")?;

        let mut session = lock_model(&self.session);

        let outputs = session.run(ort::inputs![self.input_name.as_str() => input_tensor])?;
        let prediction = self.extract_prediction(&outputs)?;

        debug!(model = %self.name, prediction, "ONNX inference complete");
        Ok(prediction)
    }
}
