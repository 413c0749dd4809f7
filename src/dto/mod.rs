pub mod evaluation_dto;
