//! Source Model Adapter built on oxc
//!
//! Parses a TypeScript module with `oxc_parser`, resolves references with
//! `oxc_semantic`, and lowers the result into an owned [`SourceModel`].
//! The arena and the AST never leave this module.

use crate::diagnostics::RewriteError;
use crate::scope::NameCollector;
use crate::source_model::{
    indentation_at, slice, ArgumentSite, Callee, ExportedName, ImportSite, ItemKind, LineEnding,
    LineIndex, MethodCallSite, NewSite, ReferenceShape, ReferenceSite, SourceModel, TopLevelItem,
    VariableSite,
};
use oxc_allocator::Allocator;
use oxc_ast::ast::*;
use oxc_ast_visit::{walk, Visit};
use oxc_parser::Parser;
use oxc_semantic::{Semantic, SemanticBuilder};
use oxc_span::{GetSpan, SourceType, Span};
use std::collections::{HashMap, HashSet};

/// Parses `text` and builds its source model. Any syntax error fails the file.
pub fn parse_source(path: &str, text: &str) -> Result<SourceModel, RewriteError> {
    let allocator = Allocator::default();
    let source_type = SourceType::default()
        .with_typescript(true)
        .with_module(true);
    let ret = Parser::new(&allocator, text, source_type).parse();

    if ret.panicked || !ret.errors.is_empty() {
        return Err(RewriteError::Parse {
            file: path.to_string(),
            messages: ret.errors.iter().map(|e| e.to_string()).collect(),
        });
    }

    let program = ret.program;
    let semantic = SemanticBuilder::new().build(&program).semantic;
    let lines = LineIndex::new(text);

    let mut calls = MethodCallCollector {
        text,
        lines: &lines,
        sites: HashMap::new(),
    };
    calls.visit_program(&program);

    let mut declarators = DeclaratorCollector {
        text,
        lines: &lines,
        semantic: &semantic,
        call_sites: &calls.sites,
        top_level: top_level_declarators(&program),
        sites: Vec::new(),
    };
    declarators.visit_program(&program);

    let mut bound_identifiers = HashSet::new();
    NameCollector {
        names: &mut bound_identifiers,
    }
    .visit_program(&program);

    Ok(SourceModel {
        path: path.to_string(),
        text: text.to_string(),
        line_ending: LineEnding::detect(text),
        items: top_level_items(&program, text, &lines),
        variables: declarators.sites,
        exports: exported_names(&program),
        bound_identifiers,
    })
}

// ═══════════════════════════════════════════════════════════════════════════════
// SHAPES
// ═══════════════════════════════════════════════════════════════════════════════

fn callee_shape(expr: &Expression, text: &str) -> Callee {
    match expr {
        Expression::Identifier(id) => Callee::Identifier(id.name.to_string()),
        Expression::StaticMemberExpression(member) => Callee::Member {
            object: slice(text, member.object.span()).to_string(),
            property: member.property.name.to_string(),
        },
        _ => Callee::Other,
    }
}

fn argument_site(arg: &Argument, text: &str, lines: &LineIndex) -> ArgumentSite {
    let span = arg.span();
    let literal = match arg {
        Argument::StringLiteral(lit) => Some(lit.value.to_string()),
        Argument::TemplateLiteral(tpl) if tpl.expressions.is_empty() => {
            tpl.quasis.first().map(|quasi| {
                quasi
                    .value
                    .cooked
                    .as_ref()
                    .unwrap_or(&quasi.value.raw)
                    .to_string()
            })
        }
        _ => None,
    };

    ArgumentSite {
        span,
        line: lines.line_of(span.start),
        text: slice(text, span).to_string(),
        literal,
        template: matches!(arg, Argument::TemplateLiteral(_)),
    }
}

fn type_argument_count(args: &Option<oxc_allocator::Box<TSTypeParameterInstantiation>>) -> usize {
    args.as_ref().map_or(0, |instantiation| instantiation.params.len())
}

fn new_site(new_expr: &NewExpression, text: &str, lines: &LineIndex) -> NewSite {
    NewSite {
        span: new_expr.span,
        callee: callee_shape(&new_expr.callee, text),
        type_argument_count: type_argument_count(&new_expr.type_arguments),
        arguments: new_expr
            .arguments
            .iter()
            .map(|arg| argument_site(arg, text, lines))
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// METHOD CALLS ON IDENTIFIERS
// ═══════════════════════════════════════════════════════════════════════════════

/// Indexes every `<identifier>.<method>(...)` call by the span of the identifier.
struct MethodCallCollector<'s> {
    text: &'s str,
    lines: &'s LineIndex,
    sites: HashMap<Span, MethodCallSite>,
}

impl<'a, 's> Visit<'a> for MethodCallCollector<'s> {
    fn visit_call_expression(&mut self, call: &CallExpression<'a>) {
        if let Expression::StaticMemberExpression(member) = &call.callee {
            if let Expression::Identifier(object) = &member.object {
                self.sites.insert(
                    object.span,
                    MethodCallSite {
                        span: call.span,
                        line: self.lines.line_of(call.span.start),
                        method: member.property.name.to_string(),
                        type_argument_count: type_argument_count(&call.type_arguments),
                        arguments: call
                            .arguments
                            .iter()
                            .map(|arg| argument_site(arg, self.text, self.lines))
                            .collect(),
                    },
                );
            }
        }
        walk::walk_call_expression(self, call);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// VARIABLE DECLARATORS
// ═══════════════════════════════════════════════════════════════════════════════

fn top_level_declarators(program: &Program) -> HashSet<u32> {
    let mut starts = HashSet::new();
    for stmt in &program.body {
        let var_decl = match stmt {
            Statement::VariableDeclaration(var_decl) => var_decl,
            Statement::ExportNamedDeclaration(export) => match &export.declaration {
                Some(Declaration::VariableDeclaration(var_decl)) => var_decl,
                _ => continue,
            },
            _ => continue,
        };
        for decl in &var_decl.declarations {
            starts.insert(decl.span.start);
        }
    }
    starts
}

struct DeclaratorCollector<'s, 'a> {
    text: &'s str,
    lines: &'s LineIndex,
    semantic: &'s Semantic<'a>,
    call_sites: &'s HashMap<Span, MethodCallSite>,
    top_level: HashSet<u32>,
    sites: Vec<VariableSite>,
}

impl<'s, 'a> DeclaratorCollector<'s, 'a> {
    fn references(&self, id: &BindingIdentifier) -> Vec<ReferenceSite> {
        let Some(symbol_id) = id.symbol_id.get() else {
            return Vec::new();
        };

        let mut references: Vec<ReferenceSite> = self
            .semantic
            .symbol_references(symbol_id)
            .map(|reference| {
                let span = self
                    .semantic
                    .nodes()
                    .get_node(reference.node_id())
                    .kind()
                    .span();
                let shape = match self.call_sites.get(&span) {
                    Some(call) => ReferenceShape::MethodCall(call.clone()),
                    None => ReferenceShape::Other,
                };
                ReferenceSite {
                    span,
                    line: self.lines.line_of(span.start),
                    shape,
                }
            })
            .collect();
        references.sort_by_key(|r| r.span.start);
        references
    }
}

impl<'s, 'a> Visit<'a> for DeclaratorCollector<'s, 'a> {
    fn visit_variable_declarator(&mut self, decl: &VariableDeclarator<'a>) {
        if let BindingPattern::BindingIdentifier(id) = &decl.id {
            let initializer = match &decl.init {
                Some(Expression::NewExpression(new_expr)) => {
                    Some(new_site(new_expr, self.text, self.lines))
                }
                _ => None,
            };
            // Only `new` initializers can match, skip resolving the rest
            let references = if initializer.is_some() {
                self.references(id)
            } else {
                Vec::new()
            };

            self.sites.push(VariableSite {
                name: id.name.to_string(),
                span: decl.span,
                line: self.lines.line_of(decl.span.start),
                indentation: indentation_at(self.text, self.lines, decl.span.start),
                top_level: self.top_level.contains(&decl.span.start),
                initializer,
                references,
            });
        }
        walk::walk_variable_declarator(self, decl);
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// TOP-LEVEL ITEMS
// ═══════════════════════════════════════════════════════════════════════════════

fn statement_kind(stmt: &Statement, text: &str) -> ItemKind {
    match stmt {
        Statement::ImportDeclaration(import) => {
            let namespace = import.specifiers.as_ref().and_then(|specifiers| {
                specifiers.iter().find_map(|specifier| match specifier {
                    ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => {
                        Some(ns.local.name.to_string())
                    }
                    _ => None,
                })
            });
            ItemKind::Import(ImportSite {
                module: import.source.value.to_string(),
                namespace,
            })
        }
        Statement::ExpressionStatement(expr_stmt) => match &expr_stmt.expression {
            Expression::NewExpression(new_expr) => ItemKind::Statement {
                constructs: Some(callee_shape(&new_expr.callee, text)),
            },
            _ => ItemKind::Statement { constructs: None },
        },
        _ => ItemKind::Statement { constructs: None },
    }
}

/// Top-level statements interleaved with comment-only statements. A comment
/// starting on the line where the previous item ends is attached to it as a
/// trailing comment instead.
fn top_level_items(program: &Program, text: &str, lines: &LineIndex) -> Vec<TopLevelItem> {
    let mut statements: Vec<TopLevelItem> = program
        .directives
        .iter()
        .map(|d| TopLevelItem::new(d.span, ItemKind::Statement { constructs: None }))
        .chain(
            program
                .body
                .iter()
                .map(|stmt| TopLevelItem::new(stmt.span(), statement_kind(stmt, text))),
        )
        .collect();
    statements.sort_by_key(|item| item.span.start);

    let mut comments: Vec<Span> = program.comments.iter().map(|c| c.span).collect();
    comments.sort_by_key(|span| span.start);
    let mut comments = comments.into_iter().peekable();

    let mut items: Vec<TopLevelItem> = Vec::new();
    for statement in statements {
        while let Some(comment) = comments.next_if(|c| c.start < statement.span.start) {
            push_comment(&mut items, comment, lines);
        }
        // Comments inside the statement belong to it
        while comments.next_if(|c| c.start < statement.span.end).is_some() {}
        items.push(statement);
    }
    for comment in comments {
        push_comment(&mut items, comment, lines);
    }
    items
}

fn push_comment(items: &mut Vec<TopLevelItem>, comment: Span, lines: &LineIndex) {
    if let Some(previous) = items.last_mut() {
        if lines.line_of(previous.extent_end) == lines.line_of(comment.start) {
            previous.trailing_comment = true;
            previous.extent_end = previous.extent_end.max(comment.end);
            return;
        }
    }
    items.push(TopLevelItem::new(comment, ItemKind::Comment));
}

// ═══════════════════════════════════════════════════════════════════════════════
// EXPORTS
// ═══════════════════════════════════════════════════════════════════════════════

fn module_export_name(name: &ModuleExportName) -> String {
    match name {
        ModuleExportName::IdentifierName(id) => id.name.to_string(),
        ModuleExportName::IdentifierReference(id) => id.name.to_string(),
        ModuleExportName::StringLiteral(s) => s.value.to_string(),
    }
}

fn collect_binding_pattern(pattern: &BindingPattern, names: &mut Vec<String>) {
    match pattern {
        BindingPattern::BindingIdentifier(id) => names.push(id.name.to_string()),
        BindingPattern::ObjectPattern(obj) => {
            for prop in &obj.properties {
                collect_binding_pattern(&prop.value, names);
            }
            if let Some(rest) = &obj.rest {
                collect_binding_pattern(&rest.argument, names);
            }
        }
        BindingPattern::ArrayPattern(arr) => {
            for pattern in arr.elements.iter().flatten() {
                collect_binding_pattern(pattern, names);
            }
            if let Some(rest) = &arr.rest {
                collect_binding_pattern(&rest.argument, names);
            }
        }
        BindingPattern::AssignmentPattern(assign) => collect_binding_pattern(&assign.left, names),
    }
}

/// Value names exported from this module's own bindings.
fn exported_names(program: &Program) -> Vec<ExportedName> {
    let mut exports: Vec<ExportedName> = Vec::new();
    let mut push = |exported: String, local: String| {
        if !exports.iter().any(|e| e.exported == exported) {
            exports.push(ExportedName { exported, local });
        }
    };

    for stmt in &program.body {
        let Statement::ExportNamedDeclaration(export) = stmt else {
            continue;
        };
        if export.export_kind.is_type() {
            continue;
        }

        let mut declared = Vec::new();
        match &export.declaration {
            Some(Declaration::VariableDeclaration(var_decl)) if !var_decl.declare => {
                for decl in &var_decl.declarations {
                    collect_binding_pattern(&decl.id, &mut declared);
                }
            }
            Some(Declaration::FunctionDeclaration(func)) if !func.declare => {
                if let Some(id) = &func.id {
                    declared.push(id.name.to_string());
                }
            }
            Some(Declaration::ClassDeclaration(class)) if !class.declare => {
                if let Some(id) = &class.id {
                    declared.push(id.name.to_string());
                }
            }
            Some(Declaration::TSEnumDeclaration(decl)) if !decl.declare => {
                declared.push(decl.id.name.to_string());
            }
            _ => {}
        }
        for name in declared {
            push(name.clone(), name);
        }

        if export.source.is_some() {
            continue;
        }
        for specifier in &export.specifiers {
            if specifier.export_kind.is_type() {
                continue;
            }
            let exported = module_export_name(&specifier.exported);
            if crate::classify::is_plain_identifier(&exported) {
                push(exported, module_export_name(&specifier.local));
            }
        }
    }

    exports
}

#[cfg(test)]
mod tests {
    use super::*;

    fn model(code: &str) -> SourceModel {
        parse_source("test.ts", code).expect("source should parse")
    }

    #[test]
    fn test_parse_error_fails_file() {
        let err = parse_source("broken.ts", "const = ;").unwrap_err();
        assert!(matches!(err, RewriteError::Parse { ref file, .. } if file == "broken.ts"));
    }

    #[test]
    fn test_items_with_comments() {
        let code = "// header\nimport * as pulumi from '@pulumi/pulumi' // main\n\n/* doc */\nconst a = 1\n// tail\n";
        let m = model(code);
        assert_eq!(m.items.len(), 5);
        assert!(m.items[0].is_comment());
        assert_eq!(
            m.items[1].kind,
            ItemKind::Import(ImportSite {
                module: "@pulumi/pulumi".to_string(),
                namespace: Some("pulumi".to_string()),
            })
        );
        assert!(m.items[1].trailing_comment);
        assert!(m.items[2].is_comment());
        assert!(!m.items[3].is_prologue());
        assert!(m.items[4].is_comment());
        assert_eq!(m.after_imports_index(), 3);
    }

    #[test]
    fn test_comments_inside_statements_are_not_items() {
        let m = model("function f() {\n  // inner\n  return 1\n}\n");
        assert_eq!(m.items.len(), 1);
    }

    #[test]
    fn test_new_initializer_shape() {
        let m = model(
            "import * as pulumi from '@pulumi/pulumi'\nconst net = new pulumi.StackReference(`net`, { x: 1 })\n",
        );
        let net = &m.variables[0];
        assert_eq!(net.name, "net");
        assert!(net.top_level);
        assert_eq!(net.line, 2);
        let init = net.initializer.as_ref().unwrap();
        assert_eq!(
            init.callee,
            Callee::Member {
                object: "pulumi".to_string(),
                property: "StackReference".to_string(),
            }
        );
        assert_eq!(init.type_argument_count, 0);
        assert_eq!(init.arguments.len(), 2);
        assert_eq!(init.arguments[0].text, "`net`");
        assert_eq!(init.arguments[0].literal.as_deref(), Some("net"));
        assert_eq!(init.arguments[1].literal, None);
        assert!(init.arguments[0].is_template());
        assert!(!init.arguments[1].is_template());
    }

    #[test]
    fn test_template_flag_comes_from_the_node() {
        let m = model("const a = new StackReference(`x`)\nconst b = new StackReference(('y'))\nconst c = new StackReference(tag`z`)\n");
        let flags: Vec<bool> = m
            .variables
            .iter()
            .map(|v| v.initializer.as_ref().unwrap().arguments[0].is_template())
            .collect();
        assert_eq!(flags, vec![true, false, false]);
    }

    #[test]
    fn test_references_are_resolved_semantically() {
        let code = r#"
const net = new StackReference('net')
const id = net.getOutput('vpcId')
function shadow(net: any) { return net.getOutput('other') }
console.log(net)
"#;
        let m = model(code);
        let net = m.variables.iter().find(|v| v.name == "net").unwrap();
        assert_eq!(net.references.len(), 2);

        match &net.references[0].shape {
            ReferenceShape::MethodCall(call) => {
                assert_eq!(call.method, "getOutput");
                assert_eq!(call.arguments[0].literal.as_deref(), Some("vpcId"));
                assert_eq!(slice(code, call.span), "net.getOutput('vpcId')");
            }
            other => panic!("expected method call, got {:?}", other),
        }
        assert_eq!(net.references[1].shape, ReferenceShape::Other);
        assert_eq!(net.references[1].line, 5);
    }

    #[test]
    fn test_nested_declarators_are_not_top_level() {
        let m = model("const a = 1\nfunction f() { const b = new Thing('x') }\n");
        assert!(m.variables[0].top_level);
        assert!(!m.variables[1].top_level);
        assert!(m.variables[1].initializer.is_some());
    }

    #[test]
    fn test_exported_names() {
        let code = r#"
const a = 1, b = 2
export const x = 1, { y, z: [w] } = load()
export function f() {}
export class C {}
export enum E { A }
export interface I {}
export type T = string
export declare const ambient: number
export { a, b as bee }
export { other } from './other'
export * from './all'
export default a
"#;
        let m = model(code);
        let fields: Vec<String> = m.exports.iter().map(|e| e.field()).collect();
        assert_eq!(fields, vec!["x", "y", "w", "f", "C", "E", "a", "bee: b"]);
    }

    #[test]
    fn test_bound_identifiers_include_globals() {
        let m = model("import * as pulumi from '@pulumi/pulumi'\nconsole.log(config)\n");
        assert!(m.bound_identifiers.contains("pulumi"));
        assert!(m.bound_identifiers.contains("config"));
    }
}
