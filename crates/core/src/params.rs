//! The generation parameter snapshot: one immutable read of the user's
//! selections for a single image-generation request.
//!
//! The snapshot is produced by the surrounding application and consumed
//! read-only by the graph assembler. Optional features are `Option`s,
//! empty `Vec`s, or `false` toggles; absent features leave the assembled
//! graph untouched.

use serde::{Deserialize, Serialize};

use crate::model::{ControlNetIdentity, LoraIdentity, ModelIdentity, VaeIdentity};
use crate::scheduler::Scheduler;

/// Numeric precision used by the latent decode stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum VaePrecision {
    #[serde(rename = "fp16")]
    Fp16,
    #[serde(rename = "fp32")]
    Fp32,
}

impl VaePrecision {
    pub fn is_fp32(self) -> bool {
        self == VaePrecision::Fp32
    }
}

/// Latent interpolation mode for the high-res-fix upscale stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum HrfMethod {
    #[serde(rename = "bilinear")]
    Bilinear,
    #[serde(rename = "nearest")]
    Nearest,
}

/// High-resolution-fix settings: a second denoise pass after upscaling
/// the first pass's latents to the requested resolution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HighResFix {
    /// Denoising strength of the second pass, in `[0, 1]`. The second
    /// denoise starts at `1 - strength`.
    pub strength: f64,
    pub method: HrfMethod,
}

/// One LoRA to splice into the unet/clip paths.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoraConfig {
    pub lora: LoraIdentity,
    pub weight: f64,
}

/// How ControlNet conditioning is balanced against the prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlMode {
    #[serde(rename = "balanced")]
    Balanced,
    #[serde(rename = "more_prompt")]
    MorePrompt,
    #[serde(rename = "more_control")]
    MoreControl,
    #[serde(rename = "unbalanced")]
    Unbalanced,
}

/// How a control image is fitted to the generation resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeMode {
    #[serde(rename = "just_resize")]
    JustResize,
    #[serde(rename = "crop_resize")]
    CropResize,
    #[serde(rename = "fill_resize")]
    FillResize,
}

/// Reference to an image already known to the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageReference {
    pub image_name: String,
}

/// One ControlNet conditioning input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ControlNetConfig {
    pub control_model: ControlNetIdentity,
    pub control_weight: f64,
    pub begin_step_percent: f64,
    pub end_step_percent: f64,
    pub control_mode: ControlMode,
    pub resize_mode: ResizeMode,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<ImageReference>,
}

/// Refiner settings. Carried on the snapshot for completeness; the
/// linear text-to-image assembler does not consume it (refiner graphs
/// are a separate pipeline family).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefinerConfig {
    pub model: ModelIdentity,
}

/// Immutable snapshot of user-configured generation parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenerationParams {
    /// Selected main model. `None` is a fatal precondition failure for
    /// graph assembly.
    pub model: Option<ModelIdentity>,
    pub positive_prompt: String,
    pub negative_prompt: String,
    pub scheduler: Scheduler,
    pub steps: u32,
    pub cfg_scale: f64,
    pub cfg_rescale_multiplier: f64,
    pub width: u32,
    pub height: u32,
    pub seed: u64,
    /// Generate initial noise on the CPU rather than the device, for
    /// reproducibility across hardware.
    pub use_cpu_noise: bool,
    pub vae_precision: VaePrecision,

    // Optional features. Each maps to one assembler extension step.
    pub seamless_x_axis: bool,
    pub seamless_y_axis: bool,
    pub hrf: Option<HighResFix>,
    pub vae: Option<VaeIdentity>,
    pub loras: Vec<LoraConfig>,
    pub controlnets: Vec<ControlNetConfig>,
    pub refiner: Option<RefinerConfig>,
    pub use_nsfw_checker: bool,
    pub use_watermarker: bool,
}

impl Default for GenerationParams {
    fn default() -> Self {
        Self {
            model: None,
            positive_prompt: String::new(),
            negative_prompt: String::new(),
            scheduler: Scheduler::default(),
            steps: 30,
            cfg_scale: 7.5,
            cfg_rescale_multiplier: 0.0,
            width: 512,
            height: 512,
            seed: 0,
            use_cpu_noise: true,
            vae_precision: VaePrecision::Fp16,
            seamless_x_axis: false,
            seamless_y_axis: false,
            hrf: None,
            vae: None,
            loras: Vec::new(),
            controlnets: Vec::new(),
            refiner: None,
            use_nsfw_checker: false,
            use_watermarker: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_params_have_no_optional_features() {
        let params = GenerationParams::default();
        assert!(params.model.is_none());
        assert!(!params.seamless_x_axis);
        assert!(!params.seamless_y_axis);
        assert!(params.hrf.is_none());
        assert!(params.vae.is_none());
        assert!(params.loras.is_empty());
        assert!(params.controlnets.is_empty());
        assert!(params.refiner.is_none());
        assert!(!params.use_nsfw_checker);
        assert!(!params.use_watermarker);
    }

    #[test]
    fn vae_precision_wire_names() {
        assert_eq!(
            serde_json::to_string(&VaePrecision::Fp16).unwrap(),
            r#""fp16""#
        );
        assert_eq!(
            serde_json::to_string(&VaePrecision::Fp32).unwrap(),
            r#""fp32""#
        );
        assert!(VaePrecision::Fp32.is_fp32());
        assert!(!VaePrecision::Fp16.is_fp32());
    }

    #[test]
    fn control_mode_wire_names() {
        assert_eq!(
            serde_json::to_string(&ControlMode::MorePrompt).unwrap(),
            r#""more_prompt""#
        );
        assert_eq!(
            serde_json::to_string(&ResizeMode::JustResize).unwrap(),
            r#""just_resize""#
        );
    }

    #[test]
    fn controlnet_config_omits_absent_image() {
        let config = ControlNetConfig {
            control_model: crate::model::ControlNetIdentity {
                model_name: "canny".to_string(),
                base_model: crate::model::BaseModel::Sd1,
            },
            control_weight: 1.0,
            begin_step_percent: 0.0,
            end_step_percent: 1.0,
            control_mode: ControlMode::Balanced,
            resize_mode: ResizeMode::JustResize,
            image: None,
        };
        let json = serde_json::to_value(&config).unwrap();
        assert!(json.get("image").is_none());
    }
}
