//! LoRA step: splices a chain of `lora_loader` nodes into the unet and
//! clip paths, in declaration order.

use igen_core::model::ModelIdentity;
use igen_core::params::GenerationParams;

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::node::{LoraLoaderNode, Node};

use super::GraphHeads;

pub(crate) fn add_loras(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
    model: &ModelIdentity,
) -> Result<GraphHeads, GraphError> {
    if params.loras.is_empty() {
        return Ok(heads);
    }
    if model.is_onnx() {
        tracing::warn!(
            model = %model.model_name,
            lora_count = params.loras.len(),
            "LoRA is not supported for the onnx runtime family, skipping"
        );
        return Ok(heads);
    }

    // Detach the current consumers; the chain ends will be reconnected
    // to them below. The unet path may start at the seamless node, the
    // clip path always starts at the base loader.
    let unet_consumers = graph.remove_edges_from(&heads.loader_id, "unet");
    let clip_consumers = graph.remove_edges_from(&heads.base_loader_id, "clip");

    let mut unet_source = heads.loader_id.clone();
    let mut clip_source = heads.base_loader_id.clone();
    for config in &params.loras {
        let id = ids::lora_loader_id(&config.lora.model_name);
        graph.add_node(Node::LoraLoader(LoraLoaderNode {
            id: id.clone(),
            is_intermediate: true,
            lora: config.lora.clone(),
            weight: config.weight,
        }))?;
        graph.add_edge(&unet_source, "unet", &id, "unet")?;
        graph.add_edge(&clip_source, "clip", &id, "clip")?;
        unet_source = id.clone();
        clip_source = id;
    }

    for edge in unet_consumers {
        graph.add_edge(
            &unet_source,
            "unet",
            &edge.destination.node_id,
            &edge.destination.field,
        )?;
    }
    for edge in clip_consumers {
        graph.add_edge(
            &clip_source,
            "clip",
            &edge.destination.node_id,
            &edge.destination.field,
        )?;
    }

    Ok(heads)
}
