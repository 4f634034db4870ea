pub mod export;
pub mod extraction;
pub mod gateway;
pub mod normalize;
pub mod pipeline;
pub mod prompts;
pub mod tagging;
pub mod workflow;
