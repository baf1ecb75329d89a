//! Common constants used throughout amem-core.

// ============================================================================
// Directory Names
// ============================================================================

/// The name of the global configuration directory, `~/.amem/`.
pub const AMEM_HOME_DIR: &str = ".amem";

/// Config file inside [`AMEM_HOME_DIR`].
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Default data root for per-agent collections, relative to [`AMEM_HOME_DIR`].
pub const DB_DIR: &str = "db";

// ============================================================================
// Pipeline Defaults
// ============================================================================

/// Neighbors fetched for linking and evolution during `add_memory`.
pub const DEFAULT_NEIGHBOR_K: usize = 3;

/// Results returned by `retrieve_default`.
pub const DEFAULT_RETRIEVE_K: usize = 5;

/// Characters of content used as the context when analysis fails.
pub const CONTEXT_FALLBACK_CHARS: usize = 50;

/// Characters of raw completion output included in parse warnings.
pub const PARSE_LOG_PREVIEW_CHARS: usize = 50;

/// System role for every analysis prompt. Never the agent persona.
pub const ANALYSIS_SYSTEM_PROMPT: &str =
    "You are a helpful AI assistant specialized in text analysis and JSON generation.";

// ============================================================================
// Metadata Keys
// ============================================================================

/// Metadata key for the one-sentence summary.
pub const META_CONTEXT: &str = "context";

/// Metadata key for the salient keywords.
pub const META_KEYWORDS: &str = "keywords";

/// Metadata key for the categorical tags.
pub const META_TAGS: &str = "tags";

/// Metadata key for ids of linked notes.
pub const META_LINKED_IDS: &str = "linked_ids";

/// Metadata key for the creation time (seconds since epoch).
pub const META_TIMESTAMP: &str = "timestamp";
