pub mod study_update_dto;
pub mod sync_config_dto;
