pub mod client;
pub mod imagen;
pub mod types;

pub use imagen::ImagenBackend;
