//! Well-known node and graph identifiers.
//!
//! Fixed-topology nodes use stable ids so extension steps can locate and
//! rewire them; per-instance nodes (LoRA loaders, ControlNets) derive
//! their ids from the configuration.

/// Graph id for the linear text-to-image pipeline.
pub const TEXT_TO_IMAGE_GRAPH: &str = "text_to_image_graph";

pub const MAIN_MODEL_LOADER: &str = "main_model_loader";
pub const ONNX_MODEL_LOADER: &str = "onnx_model_loader";
pub const POSITIVE_CONDITIONING: &str = "positive_conditioning";
pub const NEGATIVE_CONDITIONING: &str = "negative_conditioning";
pub const NOISE: &str = "noise";
pub const DENOISE_LATENTS: &str = "denoise_latents";
pub const LATENTS_TO_IMAGE: &str = "latents_to_image";

pub const SEAMLESS: &str = "seamless";
pub const VAE_LOADER: &str = "vae_loader";
pub const CONTROL_NET_COLLECT: &str = "control_net_collect";
pub const NOISE_HRF: &str = "noise_hrf";
pub const RESIZE_HRF: &str = "resize_hrf";
pub const DENOISE_LATENTS_HRF: &str = "denoise_latents_hrf";
pub const NSFW_CHECKER: &str = "nsfw_checker";
pub const WATERMARKER: &str = "watermarker";

/// Id for the LoRA loader spliced in for a given LoRA model.
pub fn lora_loader_id(model_name: &str) -> String {
    format!("lora_loader_{model_name}")
}

/// Id for the nth ControlNet node.
pub fn control_net_id(index: usize) -> String {
    format!("control_net_{index}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_ids_are_stable() {
        assert_eq!(lora_loader_id("detail-tweaker"), "lora_loader_detail-tweaker");
        assert_eq!(control_net_id(0), "control_net_0");
        assert_eq!(control_net_id(3), "control_net_3");
    }
}
