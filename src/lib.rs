//! # StackReference Translator
//!
//! Rewrites TypeScript infrastructure programs that consume other stacks
//! through `StackReference` so they use the mjus `Remote` / `Offer` model.
//!
//! ## Pipeline
//!
//! 1. **Parse** (`oxc_adapter`): oxc parses the file and the result is flattened
//!    into a plain [`SourceModel`]. Nothing past this point touches the AST.
//! 2. **Match** (`matcher`): `new StackReference(arg)` declarations, plus a
//!    `new <alias>.Config()` that may be reused.
//! 3. **Classify** (`classify`): every reference of a declaration is either an
//!    accessor call (`getOutput('x')`, `getProvider('x')`, ...) or an advisory.
//! 4. **Rewrite** (`rewrite`): text edits against the original source,
//!    collected in a [`patch::SourcePatch`] and applied in one pass.
//! 5. **Drive** (`discovery`): walk a directory tree and write changed files.
//!
//! ## Output Guarantees
//!
//! - Text outside the edited ranges is preserved byte for byte.
//! - Synthesized names never shadow a name the file already binds.
//! - Running the rewrite twice is the same as running it once.

mod classify;
mod diagnostics;
mod discovery;
mod imports;
mod matcher;
mod options;
mod oxc_adapter;
mod patch;
mod rewrite;
mod scope;
mod source_model;


pub use diagnostics::{Advisory, AdvisoryKind, RewriteError};
pub use discovery::{translate_file, translate_tree, FileFailure, RunReport};
pub use options::RewriteOptions;
pub use oxc_adapter::parse_source;
pub use rewrite::{rewrite_model, rewrite_source, FileRewrite};
pub use source_model::SourceModel;
