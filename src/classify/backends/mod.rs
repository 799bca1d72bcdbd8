pub mod fallback;
pub mod http;
pub mod scripted;

pub use fallback::FallbackSampler;
pub use http::HttpClassifier;
pub use scripted::ScriptedClassifier;
