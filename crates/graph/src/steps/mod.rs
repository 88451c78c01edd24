//! Optional graph-extension steps.
//!
//! Each step inspects the parameter snapshot and either leaves the graph
//! untouched or splices nodes/edges into it. The attachment points a
//! later step depends on (current unet/vae provider, current output
//! node) are threaded through [`GraphHeads`] explicitly: every step
//! takes the accumulator by value and returns the version the next step
//! must use, making the order dependency a data-flow rather than a
//! convention.

pub(crate) mod controlnet;
pub(crate) mod hrf;
pub(crate) mod lora;
pub(crate) mod postprocess;
pub(crate) mod seamless;
pub(crate) mod vae;

/// Current attachment points threaded through the optional steps.
#[derive(Debug, Clone)]
pub(crate) struct GraphHeads {
    /// The model-loader node id. Conditioning always draws `clip` from
    /// here, even after seamless splicing.
    pub base_loader_id: String,
    /// Current unet/vae provider: the loader, or the seamless node once
    /// it has been spliced in.
    pub loader_id: String,
    /// Current image-producing node; post-process steps supersede it.
    pub output_id: String,
}
