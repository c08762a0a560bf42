pub mod client;
pub mod text;
pub mod types;

pub use text::GeminiTextBackend;
