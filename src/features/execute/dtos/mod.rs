pub mod execute_dto;

pub use execute_dto::{ExecuteRequestDto, ExecuteResponseDto};
