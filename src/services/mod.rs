pub mod llm;
pub mod personalization;
pub mod reasoning;
pub mod semantic;

pub use llm::{LlmClient, LlmError};
pub use personalization::PersonalizationClient;
pub use reasoning::ReasoningClient;
pub use semantic::{SemanticClient, SemanticVerdict};
