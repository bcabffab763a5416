pub mod editor;
pub mod generator;
pub mod session;
