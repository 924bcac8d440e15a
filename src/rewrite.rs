//! Rewriter
//!
//! Turns `StackReference` declarations into `Remote` declarations, their
//! accessor calls into `wishes` / `wishesSync` / `providers` accesses, publishes
//! the module's exports through an `Offer`, and patches the import prologue so
//! the rewritten file stays self-consistent.
//!
//! All edits are made against the original text; nothing is written here.

use crate::classify::{classify_usages, Usage};
use crate::diagnostics::{Advisory, RewriteError};
use crate::imports::{resolve_imports, ImportAliases};
use crate::matcher::{find_declarations, find_reusable_config, DeclarationOfInterest};
use crate::options::RewriteOptions;
use crate::oxc_adapter::parse_source;
use crate::patch::SourcePatch;
use crate::scope::IdentifierAllocator;
use crate::source_model::{end_of_line, slice, Callee, ItemKind, LineIndex, SourceModel};
use oxc_span::Span;
use serde::Serialize;

/// Result of rewriting one file in memory.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileRewrite {
    pub path: String,
    #[serde(skip)]
    pub output: String,
    pub changed: bool,
    pub declarations: usize,
    pub usages: usize,
    pub published: bool,
    pub advisories: Vec<Advisory>,
}

pub fn rewrite_source(
    path: &str,
    text: &str,
    options: &RewriteOptions,
) -> Result<FileRewrite, RewriteError> {
    let model = parse_source(path, text)?;
    rewrite_model(&model, options)
}

/// Names the rewritten file refers to.
#[derive(Debug, Clone)]
struct Bindings {
    existing: ImportAliases,
    core: String,
    source: String,
    config: String,
    reuse_config: bool,
}

pub fn rewrite_model(
    model: &SourceModel,
    options: &RewriteOptions,
) -> Result<FileRewrite, RewriteError> {
    let mut advisories = Vec::new();
    let mut names = IdentifierAllocator::new(model.bound_identifiers.clone());

    let existing = resolve_imports(model, &options.source_module, &options.core_module);
    let core = match &existing.core {
        Some(alias) => alias.clone(),
        None => names.allocate(&options.core_alias),
    };
    let source = match &existing.source {
        Some(alias) => alias.clone(),
        None => names.allocate(&options.source_alias),
    };

    let declarations = find_declarations(model, &source, options, &mut advisories);
    let reusable = find_reusable_config(model, &source, options, &declarations);
    let config = match reusable {
        Some(site) => site.name.clone(),
        None => names.allocate(&options.config_name),
    };
    let bindings = Bindings {
        existing,
        core,
        source,
        config,
        reuse_config: reusable.is_some(),
    };

    let usages: Vec<Vec<Usage>> = declarations
        .iter()
        .map(|decl| {
            classify_usages(
                &model.path,
                decl.name(),
                &decl.site.references,
                &mut advisories,
            )
        })
        .collect();

    let mut patch = SourcePatch::new(&model.text);

    // Usages first: a usage inside another declaration's constructor argument
    // is folded into that argument below.
    let mut accesses: Vec<(&Usage, &str)> = declarations
        .iter()
        .zip(&usages)
        .flat_map(|(decl, decl_usages)| decl_usages.iter().map(move |usage| (usage, decl.name())))
        .collect();
    // Innermost first, so a call whose ignored extra arguments hold another
    // usage drops that usage's edit along with them
    accesses.sort_by_key(|(usage, _)| usage.call_span.end - usage.call_span.start);
    for (usage, name) in accesses {
        patch.discard_within(usage.call_span);
        patch.replace(usage.call_span, usage.access_text(name));
    }
    for (decl, decl_usages) in declarations.iter().zip(&usages) {
        rewrite_declaration(&mut patch, model, options, &bindings, decl, decl_usages)?;
    }

    let published = !model.exports.is_empty() && !is_published(model, &bindings.core);
    if published || !declarations.is_empty() {
        insert_prologue(&mut patch, model, options, &bindings);
    }
    if published {
        insert_offer(&mut patch, model, options, &bindings);
    }

    let output = if patch.is_empty() {
        model.text.clone()
    } else {
        patch.apply()?
    };
    Ok(FileRewrite {
        path: model.path.clone(),
        changed: output != model.text,
        output,
        declarations: declarations.len(),
        usages: usages.iter().map(Vec::len).sum(),
        published,
        advisories,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// TEXT FRAGMENTS
// ═══════════════════════════════════════════════════════════════════════════════

/// `{ ... }` body: inline below the threshold, one entry per line otherwise.
fn layout_list(entries: &[String], indent: &str, threshold: usize) -> String {
    if entries.is_empty() {
        " ".to_string()
    } else if entries.len() < threshold {
        format!(" {} ", entries.join(", "))
    } else {
        format!("{}{} ", indent, entries.join(&format!(",{}", indent)))
    }
}

fn connection_literal(options: &RewriteOptions, config: &str) -> String {
    format!(
        "{{ host: {config}.require('{}'), port: {config}.require('{}') }}",
        options.host_key,
        options.port_key,
        config = config
    )
}

fn remote_text(
    options: &RewriteOptions,
    bindings: &Bindings,
    usages: &[Usage],
    argument: &str,
    indent: &str,
) -> String {
    let mut keys: Vec<&str> = Vec::new();
    for usage in usages {
        if !keys.contains(&usage.type_key.as_str()) {
            keys.push(&usage.type_key);
        }
    }
    let entries: Vec<String> = keys.iter().map(|key| format!("{}: any", key)).collect();

    format!(
        "new {}.Remote<{{{}}}>({},{}{})",
        bindings.core,
        layout_list(&entries, indent, options.multiline_threshold),
        argument,
        indent,
        connection_literal(options, &bindings.config)
    )
}

// ═══════════════════════════════════════════════════════════════════════════════
// DECLARATIONS
// ═══════════════════════════════════════════════════════════════════════════════

fn rewrite_declaration(
    patch: &mut SourcePatch,
    model: &SourceModel,
    options: &RewriteOptions,
    bindings: &Bindings,
    decl: &DeclarationOfInterest,
    usages: &[Usage],
) -> Result<(), RewriteError> {
    let argument = patch.absorb(decl.argument.span)?;
    // Whatever sat in the ignored extra arguments goes away with them
    patch.discard_within(decl.constructor.span);

    let indent = format!("{}{}", model.line_ending.as_str(), decl.site.indentation);
    patch.replace(
        decl.constructor.span,
        remote_text(options, bindings, usages, &argument, &indent),
    );
    Ok(())
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

/// True when a top-level `new <core>.Offer(...)` statement already exists.
fn is_published(model: &SourceModel, core: &str) -> bool {
    model.items.iter().any(|item| {
        matches!(
            &item.kind,
            ItemKind::Statement {
                constructs: Some(Callee::Member { object, property }),
            } if object == core && property == "Offer"
        )
    })
}

fn insert_offer(
    patch: &mut SourcePatch,
    model: &SourceModel,
    options: &RewriteOptions,
    bindings: &Bindings,
) {
    let nl = model.line_ending.as_str();
    let indentation = model
        .top_level_variables()
        .next()
        .map(|site| site.indentation.as_str())
        .unwrap_or("  ");
    let indent = format!("{}{}", nl, indentation);

    let fields: Vec<String> = model.exports.iter().map(|name| name.field()).collect();
    let offer = format!(
        "new {core}.Offer({indent}new {core}.RemoteConnection('connection', {connection}),{indent}'offer', {{{fields}}})",
        core = bindings.core,
        indent = indent,
        connection = connection_literal(options, &bindings.config),
        fields = layout_list(&fields, &indent, options.multiline_threshold),
    );

    // Goes after the last statement, ahead of any comment-only tail
    let anchor = model
        .items
        .iter()
        .rev()
        .find(|item| !item.is_comment())
        .map(|item| end_of_line(&model.text, item.extent_end));

    match anchor {
        Some(Some(offset)) => patch.insert(offset, format!("{nl}{offer}{nl}", nl = nl, offer = offer)),
        Some(None) => patch.insert(
            model.text.len() as u32,
            format!("{nl}{nl}{offer}", nl = nl, offer = offer),
        ),
        None => patch.insert(0, format!("{}{}", offer, nl)),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// PROLOGUE
// ═══════════════════════════════════════════════════════════════════════════════

fn insert_prologue(
    patch: &mut SourcePatch,
    model: &SourceModel,
    options: &RewriteOptions,
    bindings: &Bindings,
) {
    let nl = model.line_ending.as_str();

    let mut imports = String::new();
    if bindings.existing.source.is_none() {
        imports.push_str(&format!(
            "import * as {} from '{}'{}",
            bindings.source, options.source_module, nl
        ));
    }
    if bindings.existing.core.is_none() {
        imports.push_str(&format!(
            "import * as {} from '{}'{}",
            bindings.core, options.core_module, nl
        ));
    }
    let config = (!bindings.reuse_config).then(|| {
        format!(
            "const {} = new {}.{}()",
            bindings.config, bindings.source, options.config_constructor
        )
    });

    let after = model.after_imports_index();
    let mut block = String::new();
    let anchor = if after == 0 {
        // No import block: open one at the top, separated from the code
        block.push_str(&imports);
        if let Some(config) = &config {
            block.push_str(nl);
            block.push_str(config);
            block.push_str(nl);
        }
        block.push_str(nl);

        let lines = LineIndex::new(&model.text);
        model
            .items
            .first()
            .map_or(0, |item| lines.line_start(item.span.start))
    } else {
        let previous = &model.items[after - 1];
        let line_end = end_of_line(&model.text, previous.extent_end);
        // The first statement may share the last import's line
        let next_on_line = model
            .items
            .get(after)
            .filter(|next| line_end.map_or(true, |end| next.span.start < end));

        if imports.is_empty() && config.is_none() {
            return;
        }
        if line_end.is_none() || next_on_line.is_some() {
            block.push_str(nl);
        }
        block.push_str(&imports);
        if let Some(config) = &config {
            // A blank line here would separate the comment from its statement
            if !previous.trailing_comment {
                block.push_str(nl);
            }
            block.push_str(config);
            block.push_str(nl);
        }

        if let Some(next) = next_on_line {
            let gap = Span::new(previous.extent_end, next.span.start);
            if slice(&model.text, gap).trim().is_empty() {
                patch.replace(gap, block);
            } else {
                patch.insert(previous.extent_end, block);
            }
            return;
        }
        line_end.unwrap_or(model.text.len() as u32)
    };

    if !block.is_empty() {
        patch.insert(anchor, block);
    }
}
