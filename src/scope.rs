use oxc_ast::ast::{BindingIdentifier, IdentifierReference};
use oxc_ast_visit::Visit;
use std::collections::HashSet;

// ═══════════════════════════════════════════════════════════════════════════════
// BINDING REGISTRY
// ═══════════════════════════════════════════════════════════════════════════════

/// Collects every name a synthesized binding could collide with: declared
/// variables, parameters, imported names, functions, classes, type names, and
/// any free identifier the file references (globals included).
pub struct NameCollector<'r> {
    pub names: &'r mut HashSet<String>,
}

impl<'a, 'r> Visit<'a> for NameCollector<'r> {
    fn visit_binding_identifier(&mut self, ident: &BindingIdentifier<'a>) {
        self.names.insert(ident.name.to_string());
    }

    fn visit_identifier_reference(&mut self, ident: &IdentifierReference<'a>) {
        self.names.insert(ident.name.to_string());
    }
}

// ═══════════════════════════════════════════════════════════════════════════════
// IDENTIFIER ALLOCATOR
// ═══════════════════════════════════════════════════════════════════════════════

/// Hands out names absent from the registry: `base`, then `base2`, `base3`, ...
/// Allocated names join the registry, so two allocations never collide.
#[derive(Debug, Clone, Default)]
pub struct IdentifierAllocator {
    taken: HashSet<String>,
}

impl IdentifierAllocator {
    pub fn new(taken: HashSet<String>) -> Self {
        Self { taken }
    }

    pub fn allocate(&mut self, base: &str) -> String {
        let mut candidate = base.to_string();
        let mut index = 2;
        while self.taken.contains(&candidate) {
            candidate = format!("{}{}", base, index);
            index += 1;
        }
        self.taken.insert(candidate.clone());
        candidate
    }
}
