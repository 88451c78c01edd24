//! Model identity records shared between the parameter snapshot and the
//! generated graph.
//!
//! Field names and serde values are part of the wire contract with the
//! inference engine and must not be renamed.

use serde::{Deserialize, Serialize};

/// Runtime family of a model. The `Onnx` family routes to alternate
/// loader/denoise/decode node types in the assembled graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelType {
    Main,
    Onnx,
}

/// Base architecture a model was trained against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BaseModel {
    #[serde(rename = "sd-1")]
    Sd1,
    #[serde(rename = "sd-2")]
    Sd2,
    #[serde(rename = "sdxl")]
    Sdxl,
    #[serde(rename = "sdxl-refiner")]
    SdxlRefiner,
}

/// Identity of a main (pipeline) model as the engine expects it inside a
/// model-loader node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelIdentity {
    pub model_name: String,
    pub base_model: BaseModel,
    pub model_type: ModelType,
}

impl ModelIdentity {
    /// Whether this model belongs to the alternate onnx runtime family.
    pub fn is_onnx(&self) -> bool {
        self.model_type == ModelType::Onnx
    }
}

/// Identity of a standalone VAE model used for the VAE-override step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaeIdentity {
    pub model_name: String,
    pub base_model: BaseModel,
}

/// Identity of a LoRA model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoraIdentity {
    pub model_name: String,
    pub base_model: BaseModel,
}

/// Identity of a ControlNet model.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ControlNetIdentity {
    pub model_name: String,
    pub base_model: BaseModel,
}
