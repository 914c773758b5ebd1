pub mod notification_dto;
