pub mod agent;
pub mod flow;
pub mod profile;
