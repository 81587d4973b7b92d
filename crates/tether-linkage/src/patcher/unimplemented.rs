//! Synthetic members for abstract callables that a non-abstract class no
//! longer implements.

use super::PartiallyLinkedTreePatcher;
use crate::case::LinkageCase;
use crate::location::declaration_location;
use indexmap::IndexSet;
use rustc_hash::{FxHashMap, FxHashSet};
use smol_str::SmolStr;
use tether_ir::{
    Body, ClassKind, DeclId, DeclKind, DeclOrigin, Declaration, FunctionDecl, Modality, Module, Parent,
    Signature, Statement, SymbolId, SymbolKind, Type, TypeArgument, ValueParameterDecl,
};

impl PartiallyLinkedTreePatcher<'_> {
    /// Add a member with a throwing body to `class` for every abstract
    /// function it inherits but neither it nor any ancestor implements.
    pub(super) fn synthesize_unimplemented_members(&mut self, class: DeclId) {
        if !self.synthesized_for.insert(class) || !is_concrete_class(self.module, class) {
            return;
        }
        let ancestors = ancestors(self.module, class);
        // Concrete ancestors first: what they are given counts as implemented
        // here.
        for &ancestor in &ancestors {
            self.synthesize_unimplemented_members(ancestor);
        }

        let mut covered = FxHashSet::default();
        let mut implemented = FxHashSet::default();
        for owner in std::iter::once(class).chain(ancestors.iter().copied()) {
            for member in member_functions(self.module, owner) {
                let declaration = &self.module.declarations[member];
                collect_overridden(self.module, declaration.overridden(), &mut covered);
                if declaration.modality() != Some(Modality::Abstract) {
                    implemented.insert(signature_key(self.module, member));
                }
            }
        }

        let mut unimplemented = Vec::new();
        for &ancestor in &ancestors {
            for member in member_functions(self.module, ancestor) {
                let declaration = &self.module.declarations[member];
                if declaration.modality() == Some(Modality::Abstract)
                    && declaration.origin == DeclOrigin::Defined
                    && !covered.contains(&declaration.symbol)
                    && !implemented.contains(&signature_key(self.module, member))
                {
                    unimplemented.push(member);
                }
            }
        }

        for member in unimplemented {
            let synthesized = synthesize_member(self.module, class, member);
            tracing::debug!(
                class = %self.module.declarations[class].name,
                member = %self.module.declarations[synthesized].name,
                "synthesized unimplemented abstract member"
            );
            self.summary.synthesized_members += 1;
            self.throw_from_synthesized(synthesized);
        }
    }

    fn throw_from_synthesized(&mut self, member: DeclId) {
        let case = LinkageCase::UnimplementedAbstractCallable { member };
        let span = self.module.declarations[member].span;
        let location = declaration_location(self.module, member);
        let call = self.throw_linkage_error(&case, span, location);
        let call = self.module.add_expression(call);
        if let Some(f) = self.module.declarations[member].as_function_mut() {
            f.body = Some(Body::new(vec![Statement::Expression(call)]));
        }
        self.summary.rewritten_declarations += 1;
    }
}

fn is_concrete_class(module: &Module, class: DeclId) -> bool {
    let declaration = &module.declarations[class];
    let Some(c) = declaration.as_class() else {
        return false;
    };
    declaration.origin == DeclOrigin::Defined
        && matches!(
            c.class_kind,
            ClassKind::Class | ClassKind::Object | ClassKind::EnumEntry
        )
        && matches!(c.modality, Modality::Final | Modality::Open)
}

/// Every class reachable through supertypes, nearest first, without
/// duplicates. Missing classifiers are skipped.
fn ancestors(module: &Module, class: DeclId) -> IndexSet<DeclId> {
    let mut out = IndexSet::new();
    let mut queue = vec![class];
    let mut next = 0;
    while next < queue.len() {
        let current = queue[next];
        next += 1;
        let Some(c) = module.declarations[current].as_class() else {
            continue;
        };
        for super_type in &c.super_types {
            let symbol = match super_type {
                Type::Simple { classifier, .. } => *classifier,
                Type::Marker(_) => continue,
            };
            if module.is_missing(symbol) {
                continue;
            }
            let Some(owner) = module.symbols[symbol].owner else {
                continue;
            };
            if owner != class && module.declarations[owner].as_class().is_some() && out.insert(owner)
            {
                queue.push(owner);
            }
        }
    }
    out
}

/// Plain member functions: no constructors, no property accessors.
fn member_functions(module: &Module, class: DeclId) -> Vec<DeclId> {
    let Some(c) = module.declarations[class].as_class() else {
        return Vec::new();
    };
    c.declarations
        .iter()
        .copied()
        .filter(|&member| {
            let declaration = &module.declarations[member];
            module.symbols[declaration.symbol].kind == SymbolKind::Function
                && declaration
                    .as_function()
                    .map_or(false, |f| f.corresponding_property.is_none())
        })
        .collect()
}

/// Name and arity: what identifies an override when the overridden links
/// themselves are stale.
fn signature_key(module: &Module, function: DeclId) -> (SmolStr, usize) {
    let declaration = &module.declarations[function];
    let arity = declaration
        .as_function()
        .map_or(0, |f| f.value_parameters.len());
    (declaration.name.clone(), arity)
}

fn collect_overridden(module: &Module, overridden: &[SymbolId], out: &mut FxHashSet<SymbolId>) {
    for &symbol in overridden {
        if out.insert(symbol) {
            if let Some(owner) = module.owner(symbol) {
                collect_overridden(module, owner.overridden(), out);
            }
        }
    }
}

/// Copy the signature of `abstract_member` into a new member of `class`.
fn synthesize_member(module: &mut Module, class: DeclId, abstract_member: DeclId) -> DeclId {
    let class_declaration = &module.declarations[class];
    let class_symbol = class_declaration.symbol;
    let span = class_declaration.span;
    let source = module.declarations[abstract_member].clone();
    let Some(source_function) = source.as_function().cloned() else {
        return abstract_member;
    };

    let signature = match &module.symbols[class_symbol].signature {
        Some(Signature::Public {
            package,
            declaration,
            ..
        }) => Some(Signature::public(
            package.clone(),
            format!("{}.{}", declaration, source.name),
        )),
        _ => None,
    };
    let symbol = module.add_symbol(SymbolKind::Function, signature);
    let function = module.add_declaration(Declaration {
        symbol,
        name: source.name.clone(),
        origin: DeclOrigin::UnimplementedAbstractCallableMember,
        parent: None,
        span,
        kind: DeclKind::Function(FunctionDecl {
            modality: Modality::Open,
            visibility: source_function.visibility,
            type_parameters: Vec::new(),
            dispatch_receiver: None,
            extension_receiver: None,
            value_parameters: Vec::new(),
            return_type: source_function.return_type.clone(),
            body: None,
            overridden: vec![source.symbol],
            corresponding_property: None,
        }),
    });
    module.attach(Parent::Declaration(class), function);

    let mut substitution = FxHashMap::default();
    let mut type_parameters = Vec::new();
    for &param in &source_function.type_parameters {
        let param_declaration = module.declarations[param].clone();
        let new_symbol = module.add_symbol(SymbolKind::TypeParameter, None);
        substitution.insert(param_declaration.symbol, new_symbol);
        let new_param = module.add_declaration(Declaration {
            symbol: new_symbol,
            parent: Some(Parent::Declaration(function)),
            ..param_declaration
        });
        type_parameters.push(new_param);
    }
    for &param in &type_parameters {
        if let Some(tp) = module.declarations[param].as_type_parameter_mut() {
            tp.super_types = tp
                .super_types
                .iter()
                .map(|bound| substitute(bound, &substitution))
                .collect();
        }
    }

    let extension_receiver = source_function
        .extension_receiver
        .map(|param| copy_parameter(module, function, param, &substitution));
    let value_parameters = source_function
        .value_parameters
        .iter()
        .map(|&param| copy_parameter(module, function, param, &substitution))
        .collect();
    let dispatch_receiver = {
        let ty = Type::simple(class_symbol);
        let receiver_symbol = module.add_symbol(SymbolKind::ValueParameter, None);
        module.add_declaration(Declaration {
            symbol: receiver_symbol,
            name: SmolStr::new("<this>"),
            origin: DeclOrigin::Defined,
            parent: Some(Parent::Declaration(function)),
            span,
            kind: DeclKind::ValueParameter(ValueParameterDecl {
                ty,
                vararg_element_type: None,
                default_value: None,
            }),
        })
    };

    if let Some(f) = module.declarations[function].as_function_mut() {
        f.return_type = substitute(&f.return_type, &substitution);
        f.type_parameters = type_parameters;
        f.extension_receiver = extension_receiver;
        f.value_parameters = value_parameters;
        f.dispatch_receiver = Some(dispatch_receiver);
    }
    function
}

fn copy_parameter(
    module: &mut Module,
    function: DeclId,
    param: DeclId,
    substitution: &FxHashMap<SymbolId, SymbolId>,
) -> DeclId {
    let source = module.declarations[param].clone();
    let kind = match &source.kind {
        DeclKind::ValueParameter(p) => DeclKind::ValueParameter(ValueParameterDecl {
            ty: substitute(&p.ty, substitution),
            vararg_element_type: p
                .vararg_element_type
                .as_ref()
                .map(|ty| substitute(ty, substitution)),
            default_value: None,
        }),
        other => other.clone(),
    };
    let symbol = module.add_symbol(SymbolKind::ValueParameter, None);
    module.add_declaration(Declaration {
        symbol,
        name: source.name,
        origin: DeclOrigin::Defined,
        parent: Some(Parent::Declaration(function)),
        span: source.span,
        kind,
    })
}

/// `ty` with type parameter classifiers replaced per `substitution`.
fn substitute(ty: &Type, substitution: &FxHashMap<SymbolId, SymbolId>) -> Type {
    match ty {
        Type::Simple {
            classifier,
            arguments,
            nullable,
        } => Type::Simple {
            classifier: substitution.get(classifier).copied().unwrap_or(*classifier),
            arguments: arguments
                .iter()
                .map(|argument| match argument {
                    TypeArgument::Star => TypeArgument::Star,
                    TypeArgument::Projection(ty) => {
                        TypeArgument::Projection(substitute(ty, substitution))
                    }
                })
                .collect(),
            nullable: *nullable,
        },
        marker @ Type::Marker(_) => marker.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartialLinkageConfig;
    use crate::logger::CollectingLogger;
    use crate::patcher::Root;
    use tether_ir::{Builtins, IrBuilder};

    #[test]
    fn test_implemented_member_is_not_synthesized() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("I.kt", "");
        let i = ir.class(Parent::File(file), "I", ClassKind::Interface);
        let g = ir.function(Parent::Declaration(i), "g", builtins.unit_type());
        let c = ir.class(Parent::File(file), "C", ClassKind::Class);
        let i_type = ir.type_of(i);
        ir.add_super_type(c, i_type);
        let c_g = ir.function(Parent::Declaration(c), "g", builtins.unit_type());
        let g_symbol = ir.symbol_of(g);
        {
            let module = ir.module();
            if let Some(f) = module.declarations[g].as_function_mut() {
                f.modality = Modality::Abstract;
                f.body = None;
            }
            if let Some(f) = module.declarations[c_g].as_function_mut() {
                f.overridden = vec![g_symbol];
            }
        }

        let mut logger = CollectingLogger::new();
        let config = PartialLinkageConfig::default();
        let summary = PartiallyLinkedTreePatcher::new(&mut module, &builtins, &config, &mut logger)
            .patch(&[Root::File(file)]);

        assert_eq!(summary.synthesized_members, 0);
        assert!(logger.reports.is_empty());
    }

    #[test]
    fn test_subclass_visited_first_inherits_synthesized_member() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("C.kt", "");
        let i = ir.class(Parent::File(file), "I", ClassKind::Interface);
        let g = ir.function(Parent::Declaration(i), "g", builtins.unit_type());
        // D comes before its superclass in the file.
        let d = ir.class(Parent::File(file), "D", ClassKind::Class);
        let c = ir.class(Parent::File(file), "C", ClassKind::Class);
        let i_type = ir.type_of(i);
        let c_type = ir.type_of(c);
        ir.add_super_type(c, i_type);
        ir.add_super_type(d, c_type);
        {
            let module = ir.module();
            if let Some(f) = module.declarations[g].as_function_mut() {
                f.modality = Modality::Abstract;
                f.body = None;
            }
            if let Some(class) = module.declarations[c].as_class_mut() {
                class.modality = Modality::Open;
            }
        }
        let g_symbol = ir.symbol_of(g);

        let mut logger = CollectingLogger::new();
        let config = PartialLinkageConfig::default();
        let summary = PartiallyLinkedTreePatcher::new(&mut module, &builtins, &config, &mut logger)
            .patch(&[Root::File(file)]);

        let synthesized_in = |class: DeclId| -> Vec<DeclId> {
            module.declarations[class]
                .as_class()
                .unwrap()
                .declarations
                .iter()
                .copied()
                .filter(|&member| {
                    module.declarations[member].origin
                        == DeclOrigin::UnimplementedAbstractCallableMember
                })
                .collect()
        };
        assert!(synthesized_in(d).is_empty());
        let in_c = synthesized_in(c);
        assert_eq!(in_c.len(), 1);
        assert_eq!(module.declarations[in_c[0]].overridden(), &[g_symbol]);
        assert!(module.declarations[in_c[0]]
            .as_function()
            .unwrap()
            .body
            .is_some());
        assert_eq!(summary.synthesized_members, 1);
        assert_eq!(
            logger.messages().collect::<Vec<_>>(),
            vec!["Abstract function g is not implemented in non-abstract class C"]
        );
    }

    #[test]
    fn test_generic_member_copies_type_parameters() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("I.kt", "");
        let i = ir.class(Parent::File(file), "I", ClassKind::Interface);
        let g = ir.function(Parent::Declaration(i), "g", builtins.unit_type());
        let t = ir.type_parameter(g, "T", vec![builtins.any_type()]);
        let t_type = ir.type_of(t);
        ir.value_parameter(g, "value", t_type);
        let c = ir.class(Parent::File(file), "C", ClassKind::Class);
        let i_type = ir.type_of(i);
        ir.add_super_type(c, i_type);
        if let Some(f) = ir.module().declarations[g].as_function_mut() {
            f.modality = Modality::Abstract;
        }
        let t_symbol = ir.symbol_of(t);

        let synthesized = synthesize_member(&mut module, c, g);
        let f = module.declarations[synthesized].as_function().unwrap();
        assert_eq!(f.type_parameters.len(), 1);
        let new_t = module.declarations[f.type_parameters[0]].symbol;
        assert_ne!(new_t, t_symbol);
        let value = module.declarations[f.value_parameters[0]]
            .as_value_parameter()
            .unwrap();
        assert_eq!(value.ty, Type::simple(new_t));
        assert_eq!(
            module.declarations[synthesized].parent,
            Some(Parent::Declaration(c))
        );
    }
}
