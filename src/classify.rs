//! Usage Classifier
//!
//! Resolves what each reference to a `StackReference` declaration does with it.
//! Only `<decl>.<accessor>('literal')` calls from the accessor grammar are
//! accepted; anything else is reported and left alone.

use crate::diagnostics::Advisory;
use crate::source_model::{ArgumentSite, MethodCallSite, ReferenceShape, ReferenceSite};
use lazy_static::lazy_static;
use oxc_span::Span;
use regex::Regex;
use std::collections::HashSet;

lazy_static! {
    static ref PLAIN_IDENTIFIER: Regex = Regex::new(r"^[$A-Za-z_][0-9A-Za-z_$]*$").unwrap();

    pub static ref RESERVED_WORDS: HashSet<&'static str> = [
        "do", "if", "in", "for", "let", "new", "try", "var", "case", "else", "enum", "eval",
        "false", "null", "this", "true", "void", "with", "break", "catch", "class", "const",
        "super", "throw", "while", "yield", "delete", "export", "import", "public", "return",
        "static", "switch", "typeof", "default", "extends", "finally", "package", "private",
        "continue", "debugger", "function", "arguments", "interface", "protected",
        "implements", "instanceof",
    ]
    .into_iter()
    .collect();
}

/// True when `name` can be written after a dot: identifier characters only,
/// and not a reserved word.
pub fn is_plain_identifier(name: &str) -> bool {
    PLAIN_IDENTIFIER.is_match(name) && !RESERVED_WORDS.contains(name)
}

// ═══════════════════════════════════════════════════════════════════════════════
// ACCESSOR GRAMMAR
// ═══════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessCategory {
    Wishes,
    WishesSync,
    Providers,
}

impl AccessCategory {
    pub fn as_str(self) -> &'static str {
        match self {
            AccessCategory::Wishes => "wishes",
            AccessCategory::WishesSync => "wishesSync",
            AccessCategory::Providers => "providers",
        }
    }
}

pub const ACCESSOR_GRAMMAR: &[(&str, AccessCategory)] = &[
    ("getOutput", AccessCategory::Wishes),
    ("getOutputSync", AccessCategory::WishesSync),
    ("getOutputValue", AccessCategory::Wishes),
    ("requireOutput", AccessCategory::Wishes),
    ("requireOutputSync", AccessCategory::WishesSync),
    ("getProvider", AccessCategory::Providers),
];

pub fn accessor_category(method: &str) -> Option<AccessCategory> {
    ACCESSOR_GRAMMAR
        .iter()
        .find(|(name, _)| *name == method)
        .map(|(_, category)| *category)
}

/// What a single reference turned out to be.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UsageShape<'m> {
    Accessor {
        call: &'m MethodCallSite,
        category: AccessCategory,
        argument: &'m ArgumentSite,
        value: &'m str,
    },
    Unsupported,
}

pub fn recognize(reference: &ReferenceSite) -> UsageShape<'_> {
    let ReferenceShape::MethodCall(call) = &reference.shape else {
        return UsageShape::Unsupported;
    };
    if call.type_argument_count != 0 {
        return UsageShape::Unsupported;
    }
    let Some(category) = accessor_category(&call.method) else {
        return UsageShape::Unsupported;
    };
    let Some(argument) = call.arguments.first() else {
        return UsageShape::Unsupported;
    };
    match &argument.literal {
        Some(value) => UsageShape::Accessor {
            call,
            category,
            argument,
            value,
        },
        None => UsageShape::Unsupported,
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// USAGE RECORDS
// ═══════════════════════════════════════════════════════════════════════════════

/// How a wish is addressed in the rewritten access.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WishKey {
    /// `decl.wishes.name`
    Property(String),
    /// `decl.wishes['na-me']`, holding the argument's source text
    Index(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub call_span: Span,
    pub accessor: String,
    pub category: AccessCategory,
    pub key: WishKey,
    /// Property key used for this wish in the `Remote<{ ... }>` annotation.
    pub type_key: String,
}

impl Usage {
    pub fn access_text(&self, declaration: &str) -> String {
        match &self.key {
            WishKey::Property(name) => {
                format!("{}.{}.{}", declaration, self.category.as_str(), name)
            }
            WishKey::Index(text) => {
                format!("{}.{}[{}]", declaration, self.category.as_str(), text)
            }
        }
    }
}

fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\\', "\\\\").replace('\'', "\\'"))
}

fn usage_record(call: &MethodCallSite, category: AccessCategory, argument: &ArgumentSite, value: &str) -> Usage {
    let (key, type_key) = if is_plain_identifier(value) {
        (WishKey::Property(value.to_string()), value.to_string())
    } else if argument.is_template() {
        (WishKey::Index(argument.text.clone()), quote(value))
    } else {
        (WishKey::Index(argument.text.clone()), argument.text.clone())
    };

    Usage {
        call_span: call.span,
        accessor: call.method.clone(),
        category,
        key,
        type_key,
    }
}

/// Classifies every reference of `declaration`, in source order.
pub fn classify_usages(
    file: &str,
    declaration: &str,
    references: &[ReferenceSite],
    advisories: &mut Vec<Advisory>,
) -> Vec<Usage> {
    let mut usages = Vec::new();
    for reference in references {
        match recognize(reference) {
            UsageShape::Accessor {
                call,
                category,
                argument,
                value,
            } => {
                if call.arguments.len() > 1 {
                    advisories.push(Advisory::extra_arguments(file, argument.line, &call.method));
                }
                usages.push(usage_record(call, category, argument, value));
            }
            UsageShape::Unsupported => {
                advisories.push(Advisory::unexpected_usage(file, reference.line, declaration));
            }
        }
    }
    usages
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::AdvisoryKind;

    fn literal(text: &str, value: Option<&str>) -> ArgumentSite {
        ArgumentSite {
            span: Span::new(20, 20 + text.len() as u32),
            line: 3,
            text: text.to_string(),
            literal: value.map(|v| v.to_string()),
            template: text.starts_with('`'),
        }
    }

    fn call(method: &str, arguments: Vec<ArgumentSite>, type_arguments: usize) -> ReferenceSite {
        ReferenceSite {
            span: Span::new(0, 3),
            line: 3,
            shape: ReferenceShape::MethodCall(MethodCallSite {
                span: Span::new(0, 30),
                line: 3,
                method: method.to_string(),
                type_argument_count: type_arguments,
                arguments,
            }),
        }
    }

    #[test]
    fn test_grammar_categories() {
        let expected = [
            ("getOutput", "wishes"),
            ("getOutputSync", "wishesSync"),
            ("getOutputValue", "wishes"),
            ("requireOutput", "wishes"),
            ("requireOutputSync", "wishesSync"),
            ("getProvider", "providers"),
        ];
        for (method, category) in expected {
            let mut advisories = Vec::new();
            let reference = call(method, vec![literal("'vpcId'", Some("vpcId"))], 0);
            let usages = classify_usages("a.ts", "net", &[reference], &mut advisories);
            assert_eq!(usages.len(), 1, "{} should be accepted", method);
            assert_eq!(usages[0].category.as_str(), category);
            assert!(advisories.is_empty());
        }
    }

    #[test]
    fn test_rejected_shapes_emit_one_advisory_each() {
        let rejected = vec![
            call("getStack", vec![literal("'a'", Some("a"))], 0),
            call("getOutput", vec![], 0),
            call("getOutput", vec![literal("name", None)], 0),
            call("getOutput", vec![literal("'a'", Some("a"))], 1),
            ReferenceSite {
                span: Span::new(0, 3),
                line: 7,
                shape: ReferenceShape::Other,
            },
        ];
        let mut advisories = Vec::new();
        let usages = classify_usages("a.ts", "net", &rejected, &mut advisories);
        assert!(usages.is_empty());
        assert_eq!(advisories.len(), 5);
        assert!(advisories
            .iter()
            .all(|a| a.kind == AdvisoryKind::UnexpectedUsage));
        assert_eq!(advisories[4].to_string(), "[a.ts:7] Unexpected usage net ignored");
    }

    #[test]
    fn test_extra_arguments_are_ignored_with_advisory() {
        let reference = call(
            "getOutput",
            vec![literal("'a'", Some("a")), literal("opts", None)],
            0,
        );
        let mut advisories = Vec::new();
        let usages = classify_usages("a.ts", "net", &[reference], &mut advisories);
        assert_eq!(usages.len(), 1);
        assert_eq!(advisories.len(), 1);
        assert_eq!(
            advisories[0].to_string(),
            "[a.ts:3] Additional arguments to getOutput ignored"
        );
    }

    #[test]
    fn test_identifier_vs_index_access() {
        let mut advisories = Vec::new();
        let references = vec![
            call("getOutput", vec![literal("'foo'", Some("foo"))], 0),
            call("getOutput", vec![literal("'foo-bar'", Some("foo-bar"))], 0),
            call("getOutput", vec![literal("\"class\"", Some("class"))], 0),
            call("getProvider", vec![literal("`a b`", Some("a b"))], 0),
        ];
        let usages = classify_usages("a.ts", "name", &references, &mut advisories);
        let rendered: Vec<String> = usages.iter().map(|u| u.access_text("name")).collect();
        assert_eq!(
            rendered,
            vec![
                "name.wishes.foo",
                "name.wishes['foo-bar']",
                "name.wishes[\"class\"]",
                "name.providers[`a b`]",
            ]
        );
        assert_eq!(usages[1].type_key, "'foo-bar'");
        assert_eq!(usages[3].type_key, "'a b'");
    }

    #[test]
    fn test_plain_identifier() {
        assert!(is_plain_identifier("vpcId"));
        assert!(is_plain_identifier("$private_1"));
        assert!(!is_plain_identifier("1st"));
        assert!(!is_plain_identifier("foo-bar"));
        assert!(!is_plain_identifier("class"));
        assert!(!is_plain_identifier(""));
    }
}
