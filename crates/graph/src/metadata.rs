//! Provenance metadata embedded in the assembled graph.
//!
//! A snapshot of the generation parameters is attached to the final
//! decode node so the engine can record how the image was produced.
//! Field names are part of the wire contract.

use serde::{Deserialize, Serialize};

use igen_core::model::ModelIdentity;
use igen_core::params::GenerationParams;
use igen_core::scheduler::Scheduler;

/// Generation mode recorded for linear text-to-image graphs.
pub const GENERATION_MODE_TXT2IMG: &str = "txt2img";

/// Provenance record carried on the graph's output node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoreMetadata {
    pub generation_mode: String,
    pub cfg_scale: f64,
    pub cfg_rescale_multiplier: f64,
    pub width: u32,
    pub height: u32,
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub model: ModelIdentity,
    pub seed: u64,
    pub steps: u32,
    /// Device the initial noise was generated on (`cpu` or `cuda`).
    pub rand_device: String,
    pub scheduler: Scheduler,
}

impl CoreMetadata {
    /// Capture provenance for a text-to-image request.
    ///
    /// `model` is passed separately because the caller has already
    /// unwrapped the snapshot's optional model.
    pub fn for_txt2img(params: &GenerationParams, model: &ModelIdentity) -> Self {
        Self {
            generation_mode: GENERATION_MODE_TXT2IMG.to_string(),
            cfg_scale: params.cfg_scale,
            cfg_rescale_multiplier: params.cfg_rescale_multiplier,
            width: params.width,
            height: params.height,
            positive_prompt: params.positive_prompt.clone(),
            negative_prompt: params.negative_prompt.clone(),
            model: model.clone(),
            seed: params.seed,
            steps: params.steps,
            rand_device: if params.use_cpu_noise {
                "cpu".to_string()
            } else {
                "cuda".to_string()
            },
            scheduler: params.scheduler,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use igen_core::model::{BaseModel, ModelType};

    fn test_model() -> ModelIdentity {
        ModelIdentity {
            model_name: "stable-diffusion-v1-5".to_string(),
            base_model: BaseModel::Sd1,
            model_type: ModelType::Main,
        }
    }

    #[test]
    fn metadata_captures_snapshot_fields() {
        let params = GenerationParams {
            model: Some(test_model()),
            positive_prompt: "a lighthouse at dusk".to_string(),
            negative_prompt: "blurry".to_string(),
            steps: 20,
            seed: 42,
            ..Default::default()
        };
        let metadata = CoreMetadata::for_txt2img(&params, &test_model());

        assert_eq!(metadata.generation_mode, GENERATION_MODE_TXT2IMG);
        assert_eq!(metadata.positive_prompt, "a lighthouse at dusk");
        assert_eq!(metadata.negative_prompt, "blurry");
        assert_eq!(metadata.steps, 20);
        assert_eq!(metadata.seed, 42);
        assert_eq!(metadata.rand_device, "cpu");
    }

    #[test]
    fn rand_device_reflects_noise_source() {
        let params = GenerationParams {
            model: Some(test_model()),
            use_cpu_noise: false,
            ..Default::default()
        };
        let metadata = CoreMetadata::for_txt2img(&params, &test_model());
        assert_eq!(metadata.rand_device, "cuda");
    }

    #[test]
    fn metadata_serializes_wire_field_names() {
        let params = GenerationParams {
            model: Some(test_model()),
            ..Default::default()
        };
        let json =
            serde_json::to_value(CoreMetadata::for_txt2img(&params, &test_model())).unwrap();
        for field in [
            "generation_mode",
            "cfg_scale",
            "cfg_rescale_multiplier",
            "positive_prompt",
            "negative_prompt",
            "rand_device",
            "scheduler",
        ] {
            assert!(json.get(field).is_some(), "missing field {field}");
        }
    }
}
