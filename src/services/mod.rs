pub mod auth;
pub mod availability;
pub mod business;
pub mod scheduling;
pub mod slug;
