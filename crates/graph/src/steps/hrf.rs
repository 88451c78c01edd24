//! High-resolution fix: run the base pass at a reduced resolution, then
//! upscale the latents and denoise a second time at the requested
//! resolution.
//!
//! Not supported for the onnx runtime family; the step logs and leaves
//! the graph untouched in that case.

use igen_core::model::ModelIdentity;
use igen_core::params::{GenerationParams, HrfMethod};
use igen_core::validation;

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::node::{DenoiseNode, Node, NoiseNode, ResizeLatentsNode};

use super::GraphHeads;

/// Latent-native pixel area the first pass is scaled down to.
const NATIVE_AREA: f64 = 512.0 * 512.0;

/// Denoise inputs the second pass shares with the first.
const SHARED_DENOISE_FIELDS: &[&str] = &["unet", "positive_conditioning", "negative_conditioning"];

/// Resolution for the first pass: scale the requested dimensions down to
/// roughly the model-native area, preserving aspect ratio, floored to a
/// multiple of 8. Dimensions already at or below the native area are
/// kept as-is.
fn initial_resolution(width: u32, height: u32) -> (u32, u32) {
    let w = f64::from(width);
    let h = f64::from(height);
    let scale = (NATIVE_AREA / (w * h)).sqrt();
    if scale >= 1.0 {
        return (width, height);
    }
    let floor8 = |v: f64| ((v / 8.0).floor() as u32 * 8).max(64);
    (floor8(w * scale), floor8(h * scale))
}

pub(crate) fn add_high_res_fix(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
    model: &ModelIdentity,
) -> Result<GraphHeads, GraphError> {
    let Some(hrf) = &params.hrf else {
        return Ok(heads);
    };
    if model.is_onnx() {
        tracing::warn!(
            model = %model.model_name,
            "High-res fix is not supported for the onnx runtime family, skipping"
        );
        return Ok(heads);
    }
    validation::validate_denoising_strength(hrf.strength)?;

    // Retarget the first pass to the reduced resolution.
    let (init_width, init_height) = initial_resolution(params.width, params.height);
    match graph.node_mut(ids::NOISE) {
        Some(Node::Noise(noise)) => {
            noise.width = init_width;
            noise.height = init_height;
        }
        _ => return Err(GraphError::UnknownNode(ids::NOISE.to_string())),
    }

    graph.add_node(Node::Noise(NoiseNode {
        id: ids::NOISE_HRF.to_string(),
        is_intermediate: true,
        seed: params.seed,
        width: params.width,
        height: params.height,
        use_cpu: params.use_cpu_noise,
    }))?;
    graph.add_node(Node::ResizeLatents(ResizeLatentsNode {
        id: ids::RESIZE_HRF.to_string(),
        is_intermediate: true,
        width: params.width,
        height: params.height,
        mode: hrf.method,
        antialias: hrf.method == HrfMethod::Bilinear,
    }))?;
    graph.add_node(Node::DenoiseLatents(DenoiseNode {
        id: ids::DENOISE_LATENTS_HRF.to_string(),
        is_intermediate: true,
        cfg_scale: params.cfg_scale,
        cfg_rescale_multiplier: params.cfg_rescale_multiplier,
        scheduler: params.scheduler,
        steps: params.steps,
        denoising_start: 1.0 - hrf.strength,
        denoising_end: 1.0,
    }))?;

    // The second pass reuses the first pass's model and conditioning
    // wiring, whatever nodes those edges currently come from (loader,
    // seamless, or the end of a LoRA chain).
    for &field in SHARED_DENOISE_FIELDS {
        for edge in graph.edges_into(ids::DENOISE_LATENTS, field) {
            graph.add_edge(
                &edge.source.node_id,
                &edge.source.field,
                ids::DENOISE_LATENTS_HRF,
                field,
            )?;
        }
    }

    // Splice the upscale chain between the first pass and the decode.
    let decode_inputs = graph.remove_edges_into(&heads.output_id, "latents");
    for edge in &decode_inputs {
        graph.add_edge(
            &edge.source.node_id,
            &edge.source.field,
            ids::RESIZE_HRF,
            "latents",
        )?;
    }
    graph.add_edge(ids::RESIZE_HRF, "latents", ids::DENOISE_LATENTS_HRF, "latents")?;
    graph.add_edge(ids::NOISE_HRF, "noise", ids::DENOISE_LATENTS_HRF, "noise")?;
    graph.add_edge(ids::DENOISE_LATENTS_HRF, "latents", &heads.output_id, "latents")?;

    Ok(heads)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn native_resolution_kept_as_is() {
        assert_eq!(initial_resolution(512, 512), (512, 512));
    }

    #[test]
    fn smaller_than_native_kept_as_is() {
        assert_eq!(initial_resolution(384, 384), (384, 384));
    }

    #[test]
    fn square_upscale_target_halved() {
        assert_eq!(initial_resolution(1024, 1024), (512, 512));
    }

    #[test]
    fn aspect_ratio_preserved_and_floored_to_multiple_of_eight() {
        let (w, h) = initial_resolution(1536, 768);
        assert_eq!((w, h), (720, 360));
        assert_eq!(w % 8, 0);
        assert_eq!(h % 8, 0);
        // 2:1 aspect preserved
        assert_eq!(w, h * 2);
    }
}
