//! Safety-checker and watermark post-process steps.
//!
//! These must be the last steps applied, in this relative order: each
//! consumes the current output node's image and becomes the new output,
//! so the watermark always stamps the safety-checked image.

use igen_core::params::GenerationParams;

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::node::{ImageNsfwNode, ImageWatermarkNode, Node};

use super::GraphHeads;

pub(crate) fn add_nsfw_checker(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
) -> Result<GraphHeads, GraphError> {
    if !params.use_nsfw_checker {
        return Ok(heads);
    }

    graph.add_node(Node::ImageNsfw(ImageNsfwNode {
        id: ids::NSFW_CHECKER.to_string(),
        is_intermediate: true,
    }))?;
    graph.add_edge(&heads.output_id, "image", ids::NSFW_CHECKER, "image")?;

    Ok(GraphHeads {
        output_id: ids::NSFW_CHECKER.to_string(),
        ..heads
    })
}

pub(crate) fn add_watermarker(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
) -> Result<GraphHeads, GraphError> {
    if !params.use_watermarker {
        return Ok(heads);
    }

    graph.add_node(Node::ImageWatermark(ImageWatermarkNode {
        id: ids::WATERMARKER.to_string(),
        is_intermediate: true,
    }))?;
    graph.add_edge(&heads.output_id, "image", ids::WATERMARKER, "image")?;

    Ok(GraphHeads {
        output_id: ids::WATERMARKER.to_string(),
        ..heads
    })
}
