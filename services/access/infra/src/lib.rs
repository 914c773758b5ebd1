pub mod bans;
pub mod events;
pub mod identity;
pub mod notifications;
pub mod sweepers;
pub mod visits;
