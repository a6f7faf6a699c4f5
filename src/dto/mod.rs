pub mod attempt_dto;
pub mod generation_dto;
pub mod quiz_dto;
