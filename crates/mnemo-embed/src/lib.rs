//! Text embedding providers for mnemo.
//!
//! The memory index treats embedding as an opaque, deterministic function
//! from text to a fixed-length vector. This crate supplies that function
//! behind the [`Embedder`] trait so the index never depends on a concrete
//! provider.
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Embedder trait                         │
//! │  - embed(text) -> Vec<f32>              │
//! │  - dimensions() -> D                    │
//! └─────────────────────────────────────────┘
//!                    │
//!          ┌─────────┴─────────┐
//!          ▼                   ▼
//!     ┌─────────┐        ┌──────────┐
//!     │  Mock   │        │  OpenAI  │
//!     └─────────┘        └──────────┘
//! ```

pub mod embeddings;
pub mod error;

pub use embeddings::{
    DEFAULT_MOCK_DIMENSIONS, Embedder, EmbedderSpec, MockEmbedder, OpenAiEmbedder,
    OpenAiEmbedderConfig, SharedEmbedder, build_embedder,
};
pub use error::{EmbedError, Result};
