//! Pattern Matcher
//!
//! Finds `new StackReference(...)` / `new <alias>.StackReference(...)`
//! declarations and the `new <alias>.Config()` declaration that may be reused.

use crate::diagnostics::Advisory;
use crate::options::RewriteOptions;
use crate::source_model::{ArgumentSite, Callee, NewSite, SourceModel, VariableSite};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstructorShape {
    /// The recognized reference constructor with at least one argument.
    Reference,
    /// `<alias>.Config(...)`
    Config,
    Unrecognized,
}

pub fn constructor_shape(site: &NewSite, alias: &str, options: &RewriteOptions) -> ConstructorShape {
    if site.type_argument_count != 0 {
        return ConstructorShape::Unrecognized;
    }

    match &site.callee {
        Callee::Identifier(name)
            if *name == options.reference_constructor && !site.arguments.is_empty() =>
        {
            ConstructorShape::Reference
        }
        Callee::Member { object, property } if object == alias => {
            if *property == options.reference_constructor && !site.arguments.is_empty() {
                ConstructorShape::Reference
            } else if *property == options.config_constructor {
                ConstructorShape::Config
            } else {
                ConstructorShape::Unrecognized
            }
        }
        _ => ConstructorShape::Unrecognized,
    }
}

/// A declaration bound to a recognized `StackReference` construction.
#[derive(Debug, Clone, Copy)]
pub struct DeclarationOfInterest<'m> {
    pub site: &'m VariableSite,
    pub constructor: &'m NewSite,
    /// The first constructor argument; any others are dropped.
    pub argument: &'m ArgumentSite,
}

impl<'m> DeclarationOfInterest<'m> {
    pub fn name(&self) -> &'m str {
        &self.site.name
    }
}

/// All matching declarations, in source order, nested ones included.
pub fn find_declarations<'m>(
    model: &'m SourceModel,
    alias: &str,
    options: &RewriteOptions,
    advisories: &mut Vec<Advisory>,
) -> Vec<DeclarationOfInterest<'m>> {
    let mut found = Vec::new();
    for site in &model.variables {
        let Some(constructor) = &site.initializer else {
            continue;
        };
        if constructor_shape(constructor, alias, options) != ConstructorShape::Reference {
            continue;
        }

        let argument = &constructor.arguments[0];
        if constructor.arguments.len() > 1 {
            advisories.push(Advisory::extra_arguments(
                &model.path,
                argument.line,
                &options.reference_constructor,
            ));
        }
        found.push(DeclarationOfInterest {
            site,
            constructor,
            argument,
        });
    }
    found
}

/// The first top-level `new <alias>.Config()` declaration, provided it comes
/// before the first declaration of interest.
pub fn find_reusable_config<'m>(
    model: &'m SourceModel,
    alias: &str,
    options: &RewriteOptions,
    declarations: &[DeclarationOfInterest<'m>],
) -> Option<&'m VariableSite> {
    let first = declarations.first()?;
    let config = model.top_level_variables().find(|site| {
        site.initializer
            .as_ref()
            .is_some_and(|init| constructor_shape(init, alias, options) == ConstructorShape::Config)
    })?;

    (config.span.start < first.site.span.start).then_some(config)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostics::AdvisoryKind;
    use crate::oxc_adapter::parse_source;
    use oxc_span::Span;
    use std::collections::HashSet;

    fn new_site(callee: Callee, arguments: usize, type_arguments: usize) -> NewSite {
        NewSite {
            span: Span::new(0, 10),
            callee,
            type_argument_count: type_arguments,
            arguments: (0..arguments)
                .map(|i| ArgumentSite {
                    span: Span::new(i as u32, i as u32 + 1),
                    line: 1,
                    text: format!("'{}'", i),
                    literal: Some(i.to_string()),
                    template: false,
                })
                .collect(),
        }
    }

    fn member(object: &str, property: &str) -> Callee {
        Callee::Member {
            object: object.to_string(),
            property: property.to_string(),
        }
    }

    #[test]
    fn test_constructor_shapes() {
        let options = RewriteOptions::default();
        let bare = Callee::Identifier("StackReference".to_string());
        let cases = [
            (new_site(bare.clone(), 1, 0), ConstructorShape::Reference),
            (new_site(bare.clone(), 0, 0), ConstructorShape::Unrecognized),
            (new_site(bare, 1, 1), ConstructorShape::Unrecognized),
            (
                new_site(member("pulumi", "StackReference"), 2, 0),
                ConstructorShape::Reference,
            ),
            (
                new_site(member("other", "StackReference"), 1, 0),
                ConstructorShape::Unrecognized,
            ),
            (new_site(member("pulumi", "Config"), 0, 0), ConstructorShape::Config),
            (new_site(member("pulumi", "Config"), 0, 1), ConstructorShape::Unrecognized),
            (
                new_site(Callee::Identifier("Config".to_string()), 0, 0),
                ConstructorShape::Unrecognized,
            ),
            (new_site(Callee::Other, 1, 0), ConstructorShape::Unrecognized),
        ];
        for (site, expected) in cases {
            assert_eq!(constructor_shape(&site, "pulumi", &options), expected, "{:?}", site.callee);
        }
    }

    #[test]
    fn test_hand_built_model_matches() {
        let options = RewriteOptions::default();
        let site = VariableSite {
            name: "net".to_string(),
            span: Span::new(6, 40),
            line: 1,
            indentation: String::new(),
            top_level: true,
            initializer: Some(new_site(member("pulumi", "StackReference"), 1, 0)),
            references: vec![],
        };
        let model = SourceModel {
            path: "fake.ts".to_string(),
            text: String::new(),
            line_ending: crate::source_model::LineEnding::Lf,
            items: vec![],
            variables: vec![site],
            exports: vec![],
            bound_identifiers: HashSet::new(),
        };
        let mut advisories = Vec::new();
        let found = find_declarations(&model, "pulumi", &options, &mut advisories);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].name(), "net");
        assert!(advisories.is_empty());
    }

    #[test]
    fn test_finds_declarations_in_source_order() {
        let code = r#"import * as pulumi from '@pulumi/pulumi'
const a = new pulumi.StackReference('a', { extra: true })
function f() {
    const b = new StackReference('b')
}
const c = new Other('c')
const d = new pulumi.StackReference<any>('d')
"#;
        let model = parse_source("src/index.ts", code).unwrap();
        let options = RewriteOptions::default();
        let mut advisories = Vec::new();
        let found = find_declarations(&model, "pulumi", &options, &mut advisories);

        let names: Vec<&str> = found.iter().map(|d| d.name()).collect();
        assert_eq!(names, vec!["a", "b"]);
        assert_eq!(found[0].argument.text, "'a'");
        assert_eq!(advisories.len(), 1);
        assert_eq!(advisories[0].kind, AdvisoryKind::ExtraArguments);
        assert_eq!(
            advisories[0].to_string(),
            "[src/index.ts:2] Additional arguments to StackReference ignored"
        );
    }

    #[test]
    fn test_config_reused_only_before_first_declaration() {
        let options = RewriteOptions::default();
        let before = r#"import * as pulumi from '@pulumi/pulumi'
const settings = new pulumi.Config()
const net = new pulumi.StackReference('net')
"#;
        let model = parse_source("a.ts", before).unwrap();
        let found = find_declarations(&model, "pulumi", &options, &mut Vec::new());
        let config = find_reusable_config(&model, "pulumi", &options, &found);
        assert_eq!(config.map(|c| c.name.as_str()), Some("settings"));

        let after = r#"import * as pulumi from '@pulumi/pulumi'
const net = new pulumi.StackReference('net')
const settings = new pulumi.Config()
"#;
        let model = parse_source("a.ts", after).unwrap();
        let found = find_declarations(&model, "pulumi", &options, &mut Vec::new());
        assert!(find_reusable_config(&model, "pulumi", &options, &found).is_none());

        let without_references = r#"import * as pulumi from '@pulumi/pulumi'
const settings = new pulumi.Config()
export const a = 1
"#;
        let model = parse_source("a.ts", without_references).unwrap();
        let found = find_declarations(&model, "pulumi", &options, &mut Vec::new());
        assert!(find_reusable_config(&model, "pulumi", &options, &found).is_none());
    }
}
