pub mod gcs;
pub mod gemini;

pub use gcs::GcsClient;
pub use gemini::GeminiClient;
