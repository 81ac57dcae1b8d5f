pub mod prompt_handler;

pub use prompt_handler::{
    create_prompt, create_version, delete_prompt, delete_version, get_prompt, list_prompts,
    set_active_version, update_prompt, update_version,
};
