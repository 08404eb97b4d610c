// Arwi - Tamil to Arwi transliteration service
// Library exports

pub mod config;
pub mod data;
pub mod errors;
pub mod logging;
pub mod pipeline;
pub mod prompt;
pub mod providers;
pub mod server;

pub use errors::TransliterationError;
pub use pipeline::Transliterator;
