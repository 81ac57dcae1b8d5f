pub mod provider_dto;

pub use provider_dto::{
    CreateProviderDto, CreateProviderModelDto, ProviderModelResponseDto, ProviderResponseDto,
    UpdateProviderDto,
};
