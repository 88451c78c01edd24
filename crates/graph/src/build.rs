//! The linear text-to-image graph assembler.
//!
//! Builds the fixed base topology from the parameter snapshot, then
//! applies the optional extension steps in a fixed, order-significant
//! sequence. Later steps rely on the attachment points earlier steps
//! leave in the `GraphHeads` accumulator: seamless must
//! run before the VAE wiring so the override attaches to the
//! post-seamless loader, and the safety-checker/watermark pair must come
//! last, in that order.

use igen_core::params::GenerationParams;
use igen_core::validation;

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::metadata::CoreMetadata;
use crate::node::{
    DecodeNode, DenoiseNode, ModelLoaderNode, Node, NoiseNode, OnnxDecodeNode, OnnxDenoiseNode,
    PromptNode,
};
use crate::steps::{self, GraphHeads};

/// Assemble the graph for one text-to-image request.
///
/// Fails synchronously with [`GraphError::NoModel`] when no model is
/// selected, or [`GraphError::InvalidParams`] for out-of-range snapshot
/// fields. The returned graph satisfies [`Graph::validate`]; no graph is
/// produced on error.
pub fn build_text_to_image_graph(params: &GenerationParams) -> Result<Graph, GraphError> {
    let model = params.model.as_ref().ok_or(GraphError::NoModel)?;

    validation::validate_dimension("width", params.width)?;
    validation::validate_dimension("height", params.height)?;
    validation::validate_steps(params.steps)?;
    validation::validate_cfg_scale(params.cfg_scale)?;

    let is_onnx = model.is_onnx();
    let loader_id = if is_onnx {
        ids::ONNX_MODEL_LOADER
    } else {
        ids::MAIN_MODEL_LOADER
    };

    let mut graph = Graph::new(ids::TEXT_TO_IMAGE_GRAPH);

    // -- Base nodes ---------------------------------------------------------

    let loader = ModelLoaderNode {
        id: loader_id.to_string(),
        is_intermediate: true,
        model: model.clone(),
    };
    graph.add_node(if is_onnx {
        Node::OnnxModelLoader(loader)
    } else {
        Node::MainModelLoader(loader)
    })?;

    for (id, prompt) in [
        (ids::POSITIVE_CONDITIONING, &params.positive_prompt),
        (ids::NEGATIVE_CONDITIONING, &params.negative_prompt),
    ] {
        let node = PromptNode {
            id: id.to_string(),
            is_intermediate: true,
            prompt: prompt.clone(),
        };
        graph.add_node(if is_onnx {
            Node::PromptOnnx(node)
        } else {
            Node::Compel(node)
        })?;
    }

    graph.add_node(Node::Noise(NoiseNode {
        id: ids::NOISE.to_string(),
        is_intermediate: true,
        seed: params.seed,
        width: params.width,
        height: params.height,
        use_cpu: params.use_cpu_noise,
    }))?;

    graph.add_node(if is_onnx {
        Node::TextToLatentsOnnx(OnnxDenoiseNode {
            id: ids::DENOISE_LATENTS.to_string(),
            is_intermediate: true,
            cfg_scale: params.cfg_scale,
            scheduler: params.scheduler,
            steps: params.steps,
        })
    } else {
        Node::DenoiseLatents(DenoiseNode {
            id: ids::DENOISE_LATENTS.to_string(),
            is_intermediate: true,
            cfg_scale: params.cfg_scale,
            cfg_rescale_multiplier: params.cfg_rescale_multiplier,
            scheduler: params.scheduler,
            steps: params.steps,
            denoising_start: 0.0,
            denoising_end: 1.0,
        })
    })?;

    // Provenance rides on the decode stage.
    let metadata = Some(CoreMetadata::for_txt2img(params, model));
    graph.add_node(if is_onnx {
        Node::LatentsToImageOnnx(OnnxDecodeNode {
            id: ids::LATENTS_TO_IMAGE.to_string(),
            is_intermediate: true,
            use_cache: false,
            metadata,
        })
    } else {
        Node::LatentsToImage(DecodeNode {
            id: ids::LATENTS_TO_IMAGE.to_string(),
            is_intermediate: true,
            fp32: params.vae_precision.is_fp32(),
            use_cache: false,
            metadata,
        })
    })?;

    // -- Base edges ---------------------------------------------------------

    graph.add_edge(loader_id, "unet", ids::DENOISE_LATENTS, "unet")?;
    graph.add_edge(loader_id, "clip", ids::POSITIVE_CONDITIONING, "clip")?;
    graph.add_edge(loader_id, "clip", ids::NEGATIVE_CONDITIONING, "clip")?;
    graph.add_edge(
        ids::POSITIVE_CONDITIONING,
        "conditioning",
        ids::DENOISE_LATENTS,
        "positive_conditioning",
    )?;
    graph.add_edge(
        ids::NEGATIVE_CONDITIONING,
        "conditioning",
        ids::DENOISE_LATENTS,
        "negative_conditioning",
    )?;
    graph.add_edge(ids::NOISE, "noise", ids::DENOISE_LATENTS, "noise")?;
    graph.add_edge(ids::DENOISE_LATENTS, "latents", ids::LATENTS_TO_IMAGE, "latents")?;

    // -- Optional steps (order-significant) ---------------------------------

    let mut heads = GraphHeads {
        base_loader_id: loader_id.to_string(),
        loader_id: loader_id.to_string(),
        output_id: ids::LATENTS_TO_IMAGE.to_string(),
    };
    heads = steps::seamless::add_seamless(&mut graph, heads, params)?;
    heads = steps::vae::add_vae(&mut graph, heads, params)?;
    heads = steps::lora::add_loras(&mut graph, heads, params, model)?;
    heads = steps::controlnet::add_controlnets(&mut graph, heads, params, model)?;
    heads = steps::hrf::add_high_res_fix(&mut graph, heads, params, model)?;
    heads = steps::postprocess::add_nsfw_checker(&mut graph, heads, params)?;
    heads = steps::postprocess::add_watermarker(&mut graph, heads, params)?;

    if params.refiner.is_some() {
        tracing::debug!(
            model = %model.model_name,
            "Refiner configured but not applicable to the linear text-to-image graph, ignoring"
        );
    }

    // Exactly one node surfaces its result.
    graph.set_intermediate(&heads.output_id, false)?;

    graph.validate()?;
    Ok(graph)
}
