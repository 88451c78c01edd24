//! Seamless-tiling step: splices a `seamless` node between the model
//! loader and its unet/vae consumers.

use igen_core::params::GenerationParams;

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::node::{Node, SeamlessNode};

use super::GraphHeads;

/// Loader outputs the seamless stage re-exposes. Consumers of these are
/// redirected through it; conditioning keeps drawing `clip` straight
/// from the loader, which the seamless stage does not carry.
const SEAMLESS_FIELDS: &[&str] = &["unet", "vae"];

pub(crate) fn add_seamless(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
) -> Result<GraphHeads, GraphError> {
    if !params.seamless_x_axis && !params.seamless_y_axis {
        return Ok(heads);
    }

    graph.add_node(Node::Seamless(SeamlessNode {
        id: ids::SEAMLESS.to_string(),
        is_intermediate: true,
        seamless_x: params.seamless_x_axis,
        seamless_y: params.seamless_y_axis,
    }))?;

    // Existing consumers of the loader's unet/vae now read from the
    // seamless node; the loader feeds it instead.
    graph.redirect_sources(&heads.loader_id, ids::SEAMLESS, SEAMLESS_FIELDS);
    graph.add_edge(&heads.loader_id, "unet", ids::SEAMLESS, "unet")?;
    graph.add_edge(&heads.loader_id, "vae", ids::SEAMLESS, "vae")?;

    Ok(GraphHeads {
        loader_id: ids::SEAMLESS.to_string(),
        ..heads
    })
}
