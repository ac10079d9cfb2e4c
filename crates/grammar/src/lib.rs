//! CNtube Grammar Retrieval
//!
//! Parses the level-tagged grammar corpus, embeds the rules through the
//! configured LLM backend and serves cosine-similarity retrieval filtered
//! by learner level.

mod corpus;
mod engine;
mod similarity;
mod types;

pub use corpus::{load_corpus, parse_corpus};
pub use engine::{GrammarSearchEngine, RETRIEVAL_TOP_K};
pub use similarity::cosine_similarity;
pub use types::{GrammarIndex, GrammarRule, IndexedRule, SearchHit};
