pub mod llm_dispatcher;

pub use llm_dispatcher::{LlmDispatcher, ProviderFamily, ResolvedProfile};
