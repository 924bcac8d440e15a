use crate::source_model::{ItemKind, SourceModel};

/// Namespace aliases already bound by the leading import block.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportAliases {
    /// `import * as <alias> from '<source module>'`
    pub source: Option<String>,
    /// `import * as <alias> from '<core module>'`
    pub core: Option<String>,
}

/// Alias of the first namespace import of `module` among the leading imports
/// (before the first statement that is neither an import nor a comment).
pub fn leading_namespace_import(model: &SourceModel, module: &str) -> Option<String> {
    model.items[..model.after_imports_index()]
        .iter()
        .find_map(|item| match &item.kind {
            ItemKind::Import(import) if import.module == module => import.namespace.clone(),
            _ => None,
        })
}

pub fn resolve_imports(model: &SourceModel, source_module: &str, core_module: &str) -> ImportAliases {
    ImportAliases {
        source: leading_namespace_import(model, source_module),
        core: leading_namespace_import(model, core_module),
    }
}
