pub mod generation_ctx;
pub mod generation_flow;

pub use generation_ctx::CategoryCtx;
pub use generation_flow::{FlowStage, GenerationFlow};
