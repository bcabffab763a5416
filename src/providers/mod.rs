pub mod elevenlabs;
pub mod extractor;
pub mod memory;
pub mod openai;
pub mod rest_store;
