use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::features::execute::{dtos as execute_dtos, handlers as execute_handlers};
use crate::features::prompts::{dtos as prompts_dtos, handlers as prompts_handlers};
use crate::features::providers::{dtos as providers_dtos, handlers as providers_handlers};
use crate::shared::types::{ApiResponse, Meta};

#[derive(OpenApi)]
#[openapi(
    paths(
        // Prompts
        prompts_handlers::prompt_handler::create_prompt,
        prompts_handlers::prompt_handler::list_prompts,
        prompts_handlers::prompt_handler::get_prompt,
        prompts_handlers::prompt_handler::update_prompt,
        prompts_handlers::prompt_handler::delete_prompt,
        prompts_handlers::prompt_handler::create_version,
        prompts_handlers::prompt_handler::set_active_version,
        prompts_handlers::prompt_handler::update_version,
        prompts_handlers::prompt_handler::delete_version,
        // Providers
        providers_handlers::provider_handler::list_providers,
        providers_handlers::provider_handler::create_provider,
        providers_handlers::provider_handler::get_provider,
        providers_handlers::provider_handler::update_provider,
        providers_handlers::provider_handler::delete_provider,
        providers_handlers::provider_handler::create_model,
        providers_handlers::provider_handler::delete_model,
        // Execute
        execute_handlers::execute_handler::execute_prompt,
    ),
    components(
        schemas(
            // Shared
            Meta,
            // Prompts
            prompts_dtos::SortDirection,
            prompts_dtos::CreatePromptDto,
            prompts_dtos::UpdatePromptDto,
            prompts_dtos::CreatePromptVersionDto,
            prompts_dtos::UpdatePromptVersionDto,
            prompts_dtos::PromptResponseDto,
            prompts_dtos::PromptVersionResponseDto,
            prompts_dtos::PromptDetailDto,
            prompts_dtos::PromptPageDto,
            ApiResponse<prompts_dtos::PromptDetailDto>,
            ApiResponse<prompts_dtos::PromptPageDto>,
            ApiResponse<prompts_dtos::PromptVersionResponseDto>,
            // Providers
            providers_dtos::CreateProviderDto,
            providers_dtos::UpdateProviderDto,
            providers_dtos::CreateProviderModelDto,
            providers_dtos::ProviderResponseDto,
            providers_dtos::ProviderModelResponseDto,
            ApiResponse<providers_dtos::ProviderResponseDto>,
            ApiResponse<Vec<providers_dtos::ProviderResponseDto>>,
            ApiResponse<providers_dtos::ProviderModelResponseDto>,
            // Execute
            execute_dtos::ExecuteRequestDto,
            execute_dtos::ExecuteResponseDto,
            ApiResponse<execute_dtos::ExecuteResponseDto>,
        )
    ),
    tags(
        (name = "prompts", description = "Prompt templates and their versions"),
        (name = "providers", description = "LLM provider connection profiles and models"),
        (name = "execute", description = "Prompt execution against LLM providers"),
    ),
    modifiers(&SecurityAddon),
    info(
        title = "PromptHub API",
        version = "0.1.0",
        description = "API for managing and executing LLM prompts",
    )
)]
pub struct ApiDoc;

/// Adds the bearer security scheme to the OpenAPI spec
struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(HttpBuilder::new().scheme(HttpAuthScheme::Bearer).build()),
            );
        }
    }
}

/// Modifier to override OpenAPI info from config
pub struct SwaggerInfoModifier {
    pub title: String,
    pub version: String,
    pub description: String,
}

impl Modify for SwaggerInfoModifier {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        openapi.info.title = self.title.clone();
        openapi.info.version = self.version.clone();
        openapi.info.description = Some(self.description.clone());
    }
}
