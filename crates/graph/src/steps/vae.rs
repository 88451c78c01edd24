//! VAE wiring step.
//!
//! Always runs: the decode stage needs a `vae` input either way. With an
//! override configured, a standalone `vae_loader` provides it; otherwise
//! the current loader head does (post-seamless when that step ran —
//! which is why this step must come after seamless).

use igen_core::params::GenerationParams;

use crate::graph::{Graph, GraphError};
use crate::ids;
use crate::node::{Node, VaeLoaderNode};

use super::GraphHeads;

pub(crate) fn add_vae(
    graph: &mut Graph,
    heads: GraphHeads,
    params: &GenerationParams,
) -> Result<GraphHeads, GraphError> {
    let vae_source = match &params.vae {
        Some(vae) => {
            graph.add_node(Node::VaeLoader(VaeLoaderNode {
                id: ids::VAE_LOADER.to_string(),
                is_intermediate: true,
                vae_model: vae.clone(),
            }))?;
            ids::VAE_LOADER.to_string()
        }
        None => heads.loader_id.clone(),
    };

    graph.add_edge(&vae_source, "vae", &heads.output_id, "vae")?;
    Ok(heads)
}
