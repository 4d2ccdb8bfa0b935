pub mod chat;
pub mod encoder;
pub mod gateway;
pub mod prompt;
