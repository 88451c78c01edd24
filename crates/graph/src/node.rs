//! Typed processing-stage nodes.
//!
//! Every stage kind the engine understands is a variant of [`Node`],
//! deserialized/serialized via the internally-tagged `"type"` field. The
//! closed enum replaces a stringly-keyed defaults map: an unknown stage
//! kind is a compile error here, not an `undefined` at submission time.
//!
//! Field names inside each variant are the engine wire contract and must
//! be reproduced exactly.

use serde::{Deserialize, Serialize};

use igen_core::model::{ControlNetIdentity, LoraIdentity, ModelIdentity, VaeIdentity};
use igen_core::params::{ControlMode, HrfMethod, ImageReference, ResizeMode};
use igen_core::scheduler::Scheduler;

use crate::metadata::CoreMetadata;

/// One processing stage in the generation graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Node {
    /// Load a main-family pipeline model (unet, clip, vae outputs).
    #[serde(rename = "main_model_loader")]
    MainModelLoader(ModelLoaderNode),

    /// Load an onnx-family pipeline model.
    #[serde(rename = "onnx_model_loader")]
    OnnxModelLoader(ModelLoaderNode),

    /// Text conditioning for the main family.
    #[serde(rename = "compel")]
    Compel(PromptNode),

    /// Text conditioning for the onnx family.
    #[serde(rename = "prompt_onnx")]
    PromptOnnx(PromptNode),

    /// Initial latent noise.
    #[serde(rename = "noise")]
    Noise(NoiseNode),

    /// Main-family denoise stage.
    #[serde(rename = "denoise_latents")]
    DenoiseLatents(DenoiseNode),

    /// Onnx-family denoise stage.
    #[serde(rename = "t2l_onnx")]
    TextToLatentsOnnx(OnnxDenoiseNode),

    /// Main-family latent-to-image decode.
    #[serde(rename = "l2i")]
    LatentsToImage(DecodeNode),

    /// Onnx-family latent-to-image decode.
    #[serde(rename = "l2i_onnx")]
    LatentsToImageOnnx(OnnxDecodeNode),

    /// Seamless-tiling transform applied to the loaded model.
    #[serde(rename = "seamless")]
    Seamless(SeamlessNode),

    /// Standalone VAE override loader.
    #[serde(rename = "vae_loader")]
    VaeLoader(VaeLoaderNode),

    /// LoRA weights spliced into the unet/clip paths.
    #[serde(rename = "lora_loader")]
    LoraLoader(LoraLoaderNode),

    /// ControlNet conditioning input.
    #[serde(rename = "controlnet")]
    ControlNet(ControlNetNode),

    /// Fan-in of multiple control inputs into one collection.
    #[serde(rename = "collect")]
    Collect(CollectNode),

    /// Latent-space resize (high-res fix upscale).
    #[serde(rename = "lresize")]
    ResizeLatents(ResizeLatentsNode),

    /// Safety-checker post-process.
    #[serde(rename = "img_nsfw")]
    ImageNsfw(ImageNsfwNode),

    /// Invisible-watermark post-process.
    #[serde(rename = "img_watermark")]
    ImageWatermark(ImageWatermarkNode),
}

impl Node {
    /// The node's unique identifier within a graph.
    pub fn id(&self) -> &str {
        match self {
            Node::MainModelLoader(n) | Node::OnnxModelLoader(n) => &n.id,
            Node::Compel(n) | Node::PromptOnnx(n) => &n.id,
            Node::Noise(n) => &n.id,
            Node::DenoiseLatents(n) => &n.id,
            Node::TextToLatentsOnnx(n) => &n.id,
            Node::LatentsToImage(n) => &n.id,
            Node::LatentsToImageOnnx(n) => &n.id,
            Node::Seamless(n) => &n.id,
            Node::VaeLoader(n) => &n.id,
            Node::LoraLoader(n) => &n.id,
            Node::ControlNet(n) => &n.id,
            Node::Collect(n) => &n.id,
            Node::ResizeLatents(n) => &n.id,
            Node::ImageNsfw(n) => &n.id,
            Node::ImageWatermark(n) => &n.id,
        }
    }

    /// Whether the node's output is an intermediate (not surfaced to the
    /// user as a final result).
    pub fn is_intermediate(&self) -> bool {
        match self {
            Node::MainModelLoader(n) | Node::OnnxModelLoader(n) => n.is_intermediate,
            Node::Compel(n) | Node::PromptOnnx(n) => n.is_intermediate,
            Node::Noise(n) => n.is_intermediate,
            Node::DenoiseLatents(n) => n.is_intermediate,
            Node::TextToLatentsOnnx(n) => n.is_intermediate,
            Node::LatentsToImage(n) => n.is_intermediate,
            Node::LatentsToImageOnnx(n) => n.is_intermediate,
            Node::Seamless(n) => n.is_intermediate,
            Node::VaeLoader(n) => n.is_intermediate,
            Node::LoraLoader(n) => n.is_intermediate,
            Node::ControlNet(n) => n.is_intermediate,
            Node::Collect(n) => n.is_intermediate,
            Node::ResizeLatents(n) => n.is_intermediate,
            Node::ImageNsfw(n) => n.is_intermediate,
            Node::ImageWatermark(n) => n.is_intermediate,
        }
    }

    /// Set the intermediate flag (used when a post-process step
    /// supersedes the previous output node).
    pub fn set_intermediate(&mut self, is_intermediate: bool) {
        match self {
            Node::MainModelLoader(n) | Node::OnnxModelLoader(n) => {
                n.is_intermediate = is_intermediate;
            }
            Node::Compel(n) | Node::PromptOnnx(n) => n.is_intermediate = is_intermediate,
            Node::Noise(n) => n.is_intermediate = is_intermediate,
            Node::DenoiseLatents(n) => n.is_intermediate = is_intermediate,
            Node::TextToLatentsOnnx(n) => n.is_intermediate = is_intermediate,
            Node::LatentsToImage(n) => n.is_intermediate = is_intermediate,
            Node::LatentsToImageOnnx(n) => n.is_intermediate = is_intermediate,
            Node::Seamless(n) => n.is_intermediate = is_intermediate,
            Node::VaeLoader(n) => n.is_intermediate = is_intermediate,
            Node::LoraLoader(n) => n.is_intermediate = is_intermediate,
            Node::ControlNet(n) => n.is_intermediate = is_intermediate,
            Node::Collect(n) => n.is_intermediate = is_intermediate,
            Node::ResizeLatents(n) => n.is_intermediate = is_intermediate,
            Node::ImageNsfw(n) => n.is_intermediate = is_intermediate,
            Node::ImageWatermark(n) => n.is_intermediate = is_intermediate,
        }
    }
}

/// Shared shape of the main/onnx model loader stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelLoaderNode {
    pub id: String,
    pub is_intermediate: bool,
    pub model: ModelIdentity,
}

/// Shared shape of the main/onnx text-conditioning stages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PromptNode {
    pub id: String,
    pub is_intermediate: bool,
    pub prompt: String,
}

/// Initial noise source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NoiseNode {
    pub id: String,
    pub is_intermediate: bool,
    pub seed: u64,
    pub width: u32,
    pub height: u32,
    pub use_cpu: bool,
}

/// Main-family denoise stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DenoiseNode {
    pub id: String,
    pub is_intermediate: bool,
    pub cfg_scale: f64,
    pub cfg_rescale_multiplier: f64,
    pub scheduler: Scheduler,
    pub steps: u32,
    pub denoising_start: f64,
    pub denoising_end: f64,
}

/// Onnx-family denoise stage. Narrower than [`DenoiseNode`]: the onnx
/// runtime exposes neither rescale nor partial-denoise windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxDenoiseNode {
    pub id: String,
    pub is_intermediate: bool,
    pub cfg_scale: f64,
    pub scheduler: Scheduler,
    pub steps: u32,
}

/// Main-family latent decode. Carries the provenance metadata payload
/// when it is the graph's output stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DecodeNode {
    pub id: String,
    pub is_intermediate: bool,
    pub fp32: bool,
    pub use_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CoreMetadata>,
}

/// Onnx-family latent decode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OnnxDecodeNode {
    pub id: String,
    pub is_intermediate: bool,
    pub use_cache: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<CoreMetadata>,
}

/// Seamless-tiling transform over the loaded unet/vae.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeamlessNode {
    pub id: String,
    pub is_intermediate: bool,
    pub seamless_x: bool,
    pub seamless_y: bool,
}

/// Standalone VAE loader for the override step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaeLoaderNode {
    pub id: String,
    pub is_intermediate: bool,
    pub vae_model: VaeIdentity,
}

/// One LoRA loader in the spliced chain.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraLoaderNode {
    pub id: String,
    pub is_intermediate: bool,
    pub lora: LoraIdentity,
    pub weight: f64,
}

/// One ControlNet conditioning input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetNode {
    pub id: String,
    pub is_intermediate: bool,
    pub control_model: ControlNetIdentity,
    pub control_weight: f64,
    pub begin_step_percent: f64,
    pub end_step_percent: f64,
    pub control_mode: ControlMode,
    pub resize_mode: ResizeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageReference>,
}

/// Fan-in collection node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CollectNode {
    pub id: String,
    pub is_intermediate: bool,
}

/// Latent resize used by the high-res fix.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResizeLatentsNode {
    pub id: String,
    pub is_intermediate: bool,
    pub width: u32,
    pub height: u32,
    pub mode: HrfMethod,
    pub antialias: bool,
}

/// Safety-checker stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageNsfwNode {
    pub id: String,
    pub is_intermediate: bool,
}

/// Invisible-watermark stage.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageWatermarkNode {
    pub id: String,
    pub is_intermediate: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    use igen_core::model::{BaseModel, ModelType};

    #[test]
    fn node_serializes_with_type_tag() {
        let node = Node::MainModelLoader(ModelLoaderNode {
            id: "main_model_loader".to_string(),
            is_intermediate: true,
            model: ModelIdentity {
                model_name: "stable-diffusion-v1-5".to_string(),
                base_model: BaseModel::Sd1,
                model_type: ModelType::Main,
            },
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "main_model_loader");
        assert_eq!(json["id"], "main_model_loader");
        assert_eq!(json["is_intermediate"], true);
        assert_eq!(json["model"]["base_model"], "sd-1");
    }

    #[test]
    fn denoise_node_wire_fields() {
        let node = Node::DenoiseLatents(DenoiseNode {
            id: "denoise_latents".to_string(),
            is_intermediate: true,
            cfg_scale: 7.5,
            cfg_rescale_multiplier: 0.0,
            scheduler: Scheduler::Euler,
            steps: 20,
            denoising_start: 0.0,
            denoising_end: 1.0,
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "denoise_latents");
        assert_eq!(json["cfg_scale"], 7.5);
        assert_eq!(json["scheduler"], "euler");
        assert_eq!(json["steps"], 20);
        assert_eq!(json["denoising_start"], 0.0);
        assert_eq!(json["denoising_end"], 1.0);
    }

    #[test]
    fn decode_node_omits_absent_metadata() {
        let node = Node::LatentsToImage(DecodeNode {
            id: "latents_to_image".to_string(),
            is_intermediate: false,
            fp32: false,
            use_cache: false,
            metadata: None,
        });
        let json = serde_json::to_value(&node).unwrap();
        assert_eq!(json["type"], "l2i");
        assert_eq!(json["use_cache"], false);
        assert!(json.get("metadata").is_none());
    }

    #[test]
    fn intermediate_flag_round_trips_through_setter() {
        let mut node = Node::ImageNsfw(ImageNsfwNode {
            id: "nsfw_checker".to_string(),
            is_intermediate: true,
        });
        assert!(node.is_intermediate());
        node.set_intermediate(false);
        assert!(!node.is_intermediate());
        assert_eq!(node.id(), "nsfw_checker");
    }

    #[test]
    fn node_deserializes_from_type_tag() {
        let json = r#"{"type":"noise","id":"noise","is_intermediate":true,"seed":42,"width":512,"height":512,"use_cpu":true}"#;
        let node: Node = serde_json::from_str(json).unwrap();
        match node {
            Node::Noise(n) => {
                assert_eq!(n.seed, 42);
                assert_eq!(n.width, 512);
                assert!(n.use_cpu);
            }
            other => panic!("Expected Noise, got {other:?}"),
        }
    }

    #[test]
    fn unknown_node_type_rejected() {
        let json = r#"{"type":"teleport","id":"x","is_intermediate":true}"#;
        let result: Result<Node, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }
}
