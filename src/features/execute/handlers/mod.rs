pub mod execute_handler;

pub use execute_handler::{execute_prompt, ExecuteState};
