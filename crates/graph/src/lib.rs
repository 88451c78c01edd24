//! Node-graph assembly for text-to-image generation requests.
//!
//! Translates a [`igen_core::params::GenerationParams`] snapshot into a
//! directed acyclic graph of typed processing nodes, ready to be
//! serialized as the request body for the inference engine. Assembly is
//! pure, synchronous data transformation: no I/O, no execution, and no
//! shared state across invocations.

pub mod build;
pub mod graph;
pub mod ids;
pub mod metadata;
pub mod node;

mod steps;

pub use build::build_text_to_image_graph;
pub use graph::{Edge, EdgeEndpoint, Graph, GraphError};
pub use metadata::CoreMetadata;
pub use node::Node;
