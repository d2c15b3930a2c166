//! These models represent the objects passed between agents, the orchestrator and model backends
//!
//! Messages use our own role vocabulary (instruction / self / other) and are only mapped onto a
//! backend's roles at the provider boundary. Model responses arrive in several shapes depending
//! on the backend, so they are captured as a tagged union and flattened to text by the normalizer.
pub mod message;
pub mod response;
pub mod transcript;
