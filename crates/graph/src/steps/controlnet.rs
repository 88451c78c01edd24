//! ControlNet step: attaches conditioning inputs to the denoise stage.
//!
//! A single config wires its `control` output straight into the denoise
//! node; multiple configs fan in through a `collect` node.

use igen_core::model::ModelIdentity;
use igen_core::params::{ControlNetConfig, GenerationParams};

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::node::{CollectNode, ControlNetNode, Node};

use super::GraphHeads;

fn control_net_node(index: usize, config: &ControlNetConfig) -> Node {
    Node::ControlNet(ControlNetNode {
        id: ids::control_net_id(index),
        is_intermediate: true,
        control_model: config.control_model.clone(),
        control_weight: config.control_weight,
        begin_step_percent: config.begin_step_percent,
        end_step_percent: config.end_step_percent,
        control_mode: config.control_mode,
        resize_mode: config.resize_mode,
        image: config.image.clone(),
    })
}

pub(crate) fn add_controlnets(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
    model: &ModelIdentity,
) -> Result<GraphHeads, GraphError> {
    if params.controlnets.is_empty() {
        return Ok(heads);
    }
    if model.is_onnx() {
        tracing::warn!(
            model = %model.model_name,
            controlnet_count = params.controlnets.len(),
            "ControlNet is not supported for the onnx runtime family, skipping"
        );
        return Ok(heads);
    }

    if let [config] = params.controlnets.as_slice() {
        let id = ids::control_net_id(0);
        graph.add_node(control_net_node(0, config))?;
        graph.add_edge(&id, "control", ids::DENOISE_LATENTS, "control")?;
        return Ok(heads);
    }

    graph.add_node(Node::Collect(CollectNode {
        id: ids::CONTROL_NET_COLLECT.to_string(),
        is_intermediate: true,
    }))?;
    for (index, config) in params.controlnets.iter().enumerate() {
        let id = ids::control_net_id(index);
        graph.add_node(control_net_node(index, config))?;
        graph.add_edge(&id, "control", ids::CONTROL_NET_COLLECT, "item")?;
    }
    graph.add_edge(
        ids::CONTROL_NET_COLLECT,
        "collection",
        ids::DENOISE_LATENTS,
        "control",
    )?;

    Ok(heads)
}
