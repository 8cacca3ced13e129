pub mod rewriter;
pub mod time_refs;
