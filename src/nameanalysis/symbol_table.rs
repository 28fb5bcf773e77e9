//! The process-local symbol table built by the name analyzer and frozen
//! (read-only) once name analysis finishes. Grounded on the frame/lookup
//! shape of `why_lib::typechecker::scope::Scope`, generalized from a
//! mutable variable-slot stack into flat, by-`Identifier` relation tables.

use std::collections::HashMap;

use super::symbolic_ast::{Identifier, Type};

#[derive(Debug, Clone)]
pub struct FunSig {
    pub arg_types: Vec<Type>,
    pub ret: Type,
    pub owner: Identifier,
}

#[derive(Debug, Clone)]
pub struct ConstrSig {
    pub arg_types: Vec<Type>,
    pub parent: Identifier,
    /// Zero-based declaration order among the siblings sharing `parent`;
    /// used verbatim as the constructor's runtime tag.
    pub index: usize,
}

/// A process-local registry of everything name analysis resolved: modules,
/// types (abstract + case classes), constructors, and functions, all keyed
/// by [`Identifier`]. Built up across the 3 passes of
/// [`super::NameAnalyzer`] and never mutated again afterwards.
#[derive(Debug, Clone, Default)]
pub struct SymbolTable {
    pub module_names: HashMap<Identifier, String>,
    /// type id -> owning module id (both abstract classes and case classes)
    pub type_owners: HashMap<Identifier, Identifier>,
    pub functions: HashMap<Identifier, FunSig>,
    pub constructors: HashMap<Identifier, ConstrSig>,
    /// abstract class id -> constructor ids, in declaration order
    pub children_of: HashMap<Identifier, Vec<Identifier>>,
    /// declared types of function parameters and `val` bindings, keyed by
    /// the identifier bound to that occurrence. Pattern binders are absent
    /// here, since their type is only known once the type checker unifies
    /// them against the scrutinee.
    pub local_types: HashMap<Identifier, Type>,
    function_names: HashMap<Identifier, String>,

    modules_by_name: HashMap<String, Identifier>,
    types_by_name: HashMap<(Identifier, String), Identifier>,
    functions_by_name: HashMap<(Identifier, String), Identifier>,
    constructors_by_name: HashMap<(Identifier, String), Identifier>,
    frozen: bool,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn assert_mutable(&self) {
        assert!(!self.frozen, "attempted to mutate a frozen symbol table");
    }

    pub fn freeze(&mut self) {
        self.frozen = true;
    }

    pub fn register_module(&mut self, id: Identifier, name: &str) {
        self.assert_mutable();
        self.module_names.insert(id, name.to_string());
        self.modules_by_name.insert(name.to_string(), id);
    }

    pub fn module_by_name(&self, name: &str) -> Option<Identifier> {
        self.modules_by_name.get(name).copied()
    }

    pub fn register_abstract(&mut self, id: Identifier, module: Identifier, name: &str) {
        self.assert_mutable();
        self.type_owners.insert(id, module);
        self.types_by_name.insert((module, name.to_string()), id);
        self.children_of.entry(id).or_default();
    }

    pub fn register_case_class(
        &mut self,
        id: Identifier,
        module: Identifier,
        name: &str,
        sig: ConstrSig,
    ) {
        self.assert_mutable();
        self.type_owners.insert(id, module);
        self.types_by_name.insert((module, name.to_string()), id);
        self.children_of.entry(sig.parent).or_default().push(id);
        self.constructors_by_name
            .insert((module, name.to_string()), id);
        self.constructors.insert(id, sig);
    }

    pub fn register_function(&mut self, id: Identifier, module: Identifier, name: &str, sig: FunSig) {
        self.assert_mutable();
        self.functions_by_name
            .insert((module, name.to_string()), id);
        let module_name = self.module_names.get(&module).cloned().unwrap_or_default();
        self.function_names
            .insert(id, format!("{module_name}_{name}"));
        self.functions.insert(id, sig);
    }

    /// The `<Module>_<func>` label codegen uses to name this function's
    /// emitted WAT `func`.
    pub fn function_label(&self, id: Identifier) -> String {
        self.function_names
            .get(&id)
            .cloned()
            .unwrap_or_else(|| format!("fn{}", id.index()))
    }

    pub fn type_in_module(&self, module: Identifier, name: &str) -> Option<Identifier> {
        self.types_by_name.get(&(module, name.to_string())).copied()
    }

    pub fn function_in_module(&self, module: Identifier, name: &str) -> Option<Identifier> {
        self.functions_by_name
            .get(&(module, name.to_string()))
            .copied()
    }

    pub fn constructor_in_module(&self, module: Identifier, name: &str) -> Option<Identifier> {
        self.constructors_by_name
            .get(&(module, name.to_string()))
            .copied()
    }

    /// Resolve `name` as either a function or a constructor visible
    /// unqualified inside `module`, functions checked first, matching the
    /// name analyzer's pass order.
    pub fn resolve_callable(&self, module: Identifier, name: &str) -> Option<Identifier> {
        self.function_in_module(module, name)
            .or_else(|| self.constructor_in_module(module, name))
    }

    pub fn is_abstract(&self, id: Identifier) -> bool {
        self.children_of.contains_key(&id)
    }

    pub fn bind_local_type(&mut self, id: Identifier, ty: Type) {
        self.assert_mutable();
        self.local_types.insert(id, ty);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolves_callable_prefers_function_over_constructor() {
        let mut table = SymbolTable::new();
        let module = Identifier(0);
        table.register_module(module, "M");
        table.register_function(
            Identifier(1),
            module,
            "f",
            FunSig {
                arg_types: vec![],
                ret: Type::UnitType,
                owner: module,
            },
        );
        assert_eq!(table.resolve_callable(module, "f"), Some(Identifier(1)));
    }

    #[test]
    #[should_panic(expected = "frozen")]
    fn mutating_after_freeze_panics() {
        let mut table = SymbolTable::new();
        table.freeze();
        table.register_module(Identifier(0), "M");
    }

    #[test]
    fn constructor_index_is_sibling_declaration_order() {
        let mut table = SymbolTable::new();
        let module = Identifier(0);
        let parent = Identifier(1);
        table.register_module(module, "M");
        table.register_abstract(parent, module, "L");
        table.register_case_class(
            Identifier(2),
            module,
            "N",
            ConstrSig {
                arg_types: vec![],
                parent,
                index: 0,
            },
        );
        table.register_case_class(
            Identifier(3),
            module,
            "C",
            ConstrSig {
                arg_types: vec![Type::IntType],
                parent,
                index: 1,
            },
        );
        assert_eq!(table.children_of[&parent], vec![Identifier(2), Identifier(3)]);
    }
}
