pub mod notify;
pub mod providers;
