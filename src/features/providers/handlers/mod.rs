pub mod provider_handler;

pub use provider_handler::{
    create_model, create_provider, delete_model, delete_provider, get_provider, list_providers,
    update_provider,
};
