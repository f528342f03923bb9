//! Centralized limits and thresholds.
//!
//! Recursion limits guard the recursive-descent parser and the attribution
//! walk against pathological input; the retry limit bounds the analyze loop.

// =============================================================================
// Recursion Depth Limits
// =============================================================================

/// Maximum nesting depth the parser follows before reporting and giving up on
/// the current construct.
///
/// ```java
/// int x = ((((((((((((((((((1))))))))))))))))));   // ... 1000 levels
/// ```
pub const MAX_PARSER_RECURSION_DEPTH: u32 = 1_000;

/// Maximum expression depth attributed by the checker. Deeper expressions are
/// left unattributed (their bindings resolve as recovered).
pub const MAX_ATTRIBUTION_DEPTH: u32 = 500;

/// Maximum tree depth the AST converter descends. Deeper subtrees fail the
/// conversion of their unit.
pub const MAX_CONVERSION_DEPTH: u32 = 2_000;

/// Maximum supertype chain walked when looking up members or checking
/// overrides. Guards against cyclic `extends` clauses.
pub const MAX_SUPERTYPE_DEPTH: u32 = 64;

// =============================================================================
// Operation Counts
// =============================================================================

/// Maximum number of analyze passes the resolution driver runs for one batch.
///
/// An analyze pass may fail part-way (a classpath entry that cannot be read,
/// for instance). The driver retries the class that failed; the retry gets
/// further because the class it could not load is now an erroneous
/// placeholder. When this many passes have failed the driver stops and
/// reports `ResolveError::Analyze(AnalyzeError::RetryLimit { .. })`.
pub const MAX_ANALYZE_ATTEMPTS: u32 = 16;

// =============================================================================
// Capacity Limits
// =============================================================================

/// Classpath source files larger than this are not completed.
pub const MAX_CLASSPATH_FILE_SIZE: u64 = 8 * 1024 * 1024;
