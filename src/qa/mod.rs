//! Extractive question answering and topic coverage analysis.
//!
//! Everything in this module is derived purely from retrieved text: answers are verbatim
//! sentence spans, confidence is a function of retrieval scores, and coverage is a substring
//! heuristic over concatenated chunk content. No generative model is involved.

pub mod answer;
pub mod coverage;
mod service;
pub mod types;

pub use answer::NO_INFORMATION_ANSWER;
pub use coverage::AspectCatalog;
pub use service::{ChunkRetriever, QaApi, QaService};
pub use types::{AnswerResponse, CompletenessResponse, CompletenessResult};
