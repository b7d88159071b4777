//! Constants used throughout the HarmoniFace core crate.
//!
//! Defaults for runtime configuration and the fixed parameters of the in-memory index live here
//! so that binaries, tests and the config layer agree on them.

/// Default number of context chunks returned per retrieval.
pub const DEFAULT_TOP_K: usize = 5;

/// Upper bound accepted for `top_k`.
pub const MAX_TOP_K: usize = 100;

/// Default budget for a single field-extractor call, in milliseconds.
pub const DEFAULT_EXTRACTION_TIMEOUT_MS: u64 = 5_000;

/// Default budget for a single context-index call, in milliseconds.
pub const DEFAULT_RETRIEVAL_TIMEOUT_MS: u64 = 5_000;

/// Dimensionality of the feature-hashed embedding vectors.
pub const EMBEDDING_DIM: usize = 256;

/// Soft upper bound on the size of a knowledge chunk, in characters.
pub const MAX_CHUNK_CHARS: usize = 1_200;

/// File extensions loaded from a knowledge directory.
pub const KNOWLEDGE_FILE_EXTENSIONS: &[&str] = &["md", "txt"];

/// Path appended to a remote index base URL for searches.
pub const REMOTE_SEARCH_PATH: &str = "search";

/// Largest age accepted by the rule-based extractor.
pub const MAX_PLAUSIBLE_AGE: u32 = 130;
