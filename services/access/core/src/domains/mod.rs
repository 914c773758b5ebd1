pub mod bans;
pub mod identity;
pub mod notifications;
pub mod visits;
