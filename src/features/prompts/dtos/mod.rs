pub mod prompt_dto;

pub use prompt_dto::{
    CreatePromptDto, CreatePromptVersionDto, PromptDetailDto, PromptPageDto, PromptQueryParams,
    PromptResponseDto, PromptVersionResponseDto, SortDirection, UpdatePromptDto,
    UpdatePromptVersionDto,
};
