pub mod authorize;
pub mod codes;
pub mod domains;
pub mod engine_error;
pub mod events;
pub mod password;
pub mod phone;
