//! Sweep 1: declarations.

use super::{PartiallyLinkedTreePatcher, Root};
use crate::case::LinkageCase;
use crate::explorer::Partially;
use crate::location::declaration_location;
use crate::marker::to_marker_type_or_none;
use std::rc::Rc;
use tether_ir::{Body, DeclId, DeclKind, DeclOrigin, Node, Statement, SymbolId, Type, Visibility};

impl PartiallyLinkedTreePatcher<'_> {
    pub(super) fn sweep_declarations(&mut self, root: Root) {
        match root {
            Root::File(file) => {
                let declarations = self.module.files[file].declarations.clone();
                for decl in declarations {
                    self.visit_declaration(decl);
                }
            }
            Root::Declaration(decl) => self.visit_declaration(decl),
        }
    }

    fn visit_declaration(&mut self, decl: DeclId) {
        let descend = match self.module.declarations[decl].kind {
            DeclKind::Class(_) => {
                self.patch_class(decl);
                true
            }
            DeclKind::Function(_) => self.patch_function(decl),
            DeclKind::Property(_) => {
                self.filter_overridden(decl);
                true
            }
            DeclKind::Field(_) | DeclKind::Variable(_) => self.patch_value_type(decl),
            DeclKind::ValueParameter(_)
            | DeclKind::TypeParameter(_)
            | DeclKind::EnumEntry(_)
            | DeclKind::AnonymousInitializer(_) => true,
        };
        if descend {
            self.visit_children(decl);
        }
    }

    fn visit_children(&mut self, decl: DeclId) {
        for child in self.module.declaration_children(decl) {
            self.visit_node(child);
        }
    }

    /// Declarations nested in bodies (local classes, functions, variables)
    /// are reached through the expressions holding them.
    fn visit_node(&mut self, node: Node) {
        match node {
            Node::Declaration(decl) => self.visit_declaration(decl),
            Node::Expression(expr) => {
                for child in self.module.expression_children(expr) {
                    self.visit_node(child);
                }
            }
        }
    }

    fn patch_class(&mut self, class: DeclId) {
        let symbol = self.module.declarations[class].symbol;
        let type_parameters = self.module.declarations[class]
            .as_class()
            .map(|c| c.type_parameters.clone())
            .unwrap_or_default();
        let bound_cause = self.collapse_type_parameter_bounds(&type_parameters);

        let case = match self
            .explorer
            .explore_symbol(self.module, symbol)
            .into_partially()
        {
            Some(cause) => Some(match &*cause {
                Partially::MissingClassifier(_) => LinkageCase::MissingDeclaration { symbol },
                Partially::MissingEnclosingClass(_) => LinkageCase::MissingEnclosingClass { class },
                Partially::DueToOtherClassifier { root_cause, .. } => {
                    LinkageCase::DeclarationUsesPartiallyLinkedSymbol {
                        declaration: class,
                        cause: root_cause.clone(),
                    }
                }
            }),
            None => bound_cause.map(|cause| LinkageCase::DeclarationUsesPartiallyLinkedSymbol {
                declaration: class,
                cause,
            }),
        };

        if let Some(case) = case {
            let initializer = self.anonymous_initializer(class);
            let span = self.module.declarations[initializer].span;
            let location = declaration_location(self.module, initializer);
            let call = self.throw_linkage_error(&case, span, location);
            let call = self.module.add_expression(call);
            if let DeclKind::AnonymousInitializer(init) =
                &mut self.module.declarations[initializer].kind
            {
                init.body = Body::new(vec![Statement::Expression(call)]);
            }

            self.drop_partially_linked_super_types(class);
            self.summary.rewritten_declarations += 1;
        }

        self.synthesize_unimplemented_members(class);
    }

    /// The class's first anonymous initializer, or a new one.
    fn anonymous_initializer(&mut self, class: DeclId) -> DeclId {
        let existing = self.module.declarations[class].as_class().and_then(|c| {
            c.declarations.iter().copied().find(|&member| {
                matches!(
                    self.module.declarations[member].kind,
                    DeclKind::AnonymousInitializer(_)
                )
            })
        });
        existing.unwrap_or_else(|| {
            self.builtins.create_anonymous_initializer(
                self.module,
                class,
                DeclOrigin::MissingDeclaration,
            )
        })
    }

    fn drop_partially_linked_super_types(&mut self, class: DeclId) {
        let super_types = match self.module.declarations[class].as_class() {
            Some(c) => c.super_types.clone(),
            None => return,
        };
        let kept: Vec<Type> = super_types
            .into_iter()
            .filter(|ty| self.explorer.explore_type(self.module, ty).is_fully())
            .collect();
        if let Some(c) = self.module.declarations[class].as_class_mut() {
            c.super_types = kept;
        }
    }

    /// Returns whether to descend into the function.
    fn patch_function(&mut self, function: DeclId) -> bool {
        self.filter_overridden(function);

        // Types are rewritten even when the cause ends up unused.
        let signature_cause = self.rewrite_signature_types(function);

        let declaration = &self.module.declarations[function];
        let case = match declaration.origin {
            // Given its throwing body when synthesized.
            DeclOrigin::UnimplementedAbstractCallableMember => None,
            DeclOrigin::MissingDeclaration => Some(LinkageCase::MissingDeclaration {
                symbol: declaration.symbol,
            }),
            DeclOrigin::Defined => {
                signature_cause.map(|cause| LinkageCase::DeclarationUsesPartiallyLinkedSymbol {
                    declaration: function,
                    cause,
                })
            }
        };
        let Some(case) = case else {
            return true;
        };

        let span = self.module.declarations[function].span;
        let location = declaration_location(self.module, function);
        let call = self.throw_linkage_error(&case, span, location);
        let call = self.module.add_expression(call);
        if let Some(f) = self.module.declarations[function].as_function_mut() {
            f.body = Some(Body::new(vec![Statement::Expression(call)]));
        }
        self.summary.rewritten_declarations += 1;
        false
    }

    /// Replace every broken type of the signature with a marker and return
    /// the first cause, in this order: extension receiver, value
    /// parameters, return type, type parameter bounds, dispatch receiver.
    fn rewrite_signature_types(&mut self, function: DeclId) -> Option<Rc<Partially>> {
        let f = self.module.declarations[function].as_function()?;
        let extension_receiver = f.extension_receiver;
        let value_parameters = f.value_parameters.clone();
        let return_type = f.return_type.clone();
        let type_parameters = f.type_parameters.clone();
        let dispatch_receiver = f.dispatch_receiver;

        let mut first: Option<Rc<Partially>> = None;
        let mut record = |cause: Option<Rc<Partially>>| {
            if first.is_none() {
                first = cause;
            }
        };

        if let Some(receiver) = extension_receiver {
            record(self.fix_parameter_type(receiver));
        }
        for param in value_parameters {
            record(self.fix_parameter_type(param));
        }

        if let Some((marker, cause)) =
            to_marker_type_or_none(&mut self.explorer, self.module, self.builtins, &return_type)
        {
            if let Some(f) = self.module.declarations[function].as_function_mut() {
                f.return_type = marker;
            }
            record(Some(cause));
        }

        record(self.collapse_type_parameter_bounds(&type_parameters));

        if let Some(receiver) = dispatch_receiver {
            record(self.fix_parameter_type(receiver));
        }

        first
    }

    /// Collapse the bounds of every type parameter with a broken bound to the
    /// single marker type, returning the first cause.
    fn collapse_type_parameter_bounds(&mut self, params: &[DeclId]) -> Option<Rc<Partially>> {
        let mut first = None;
        for &param in params {
            // Explored through its symbol so that uses of the parameter keep
            // the cause after the bounds are gone.
            let symbol = self.module.declarations[param].symbol;
            let Some(cause) = self.explorer.explore_symbol(self.module, symbol).into_partially()
            else {
                continue;
            };
            let marker = self.builtins.marker_type(cause.symbol());
            if let Some(tp) = self.module.declarations[param].as_type_parameter_mut() {
                tp.super_types = vec![marker];
            }
            first.get_or_insert(cause);
        }
        first
    }

    /// Marker-ize a parameter whose type (or vararg element type) is broken,
    /// dropping its default value.
    fn fix_parameter_type(&mut self, param: DeclId) -> Option<Rc<Partially>> {
        let p = self.module.declarations[param].as_value_parameter()?;
        let ty = p.ty.clone();
        let element = p.vararg_element_type.clone();

        let (marker, cause) =
            to_marker_type_or_none(&mut self.explorer, self.module, self.builtins, &ty).or_else(
                || {
                    element.as_ref().and_then(|element| {
                        to_marker_type_or_none(&mut self.explorer, self.module, self.builtins, element)
                    })
                },
            )?;

        let p = self.module.declarations[param].as_value_parameter_mut()?;
        p.ty = marker.clone();
        p.default_value = None;
        if p.vararg_element_type.is_some() {
            p.vararg_element_type = Some(marker);
        }
        Some(cause)
    }

    /// Returns whether to descend into the field or variable.
    fn patch_value_type(&mut self, decl: DeclId) -> bool {
        let Some(ty) = self.module.declarations[decl].value_type().cloned() else {
            return true;
        };
        let Some((marker, _)) =
            to_marker_type_or_none(&mut self.explorer, self.module, self.builtins, &ty)
        else {
            return true;
        };

        match &mut self.module.declarations[decl].kind {
            DeclKind::Field(field) => {
                field.ty = marker;
                field.initializer = None;
            }
            DeclKind::Variable(variable) => {
                variable.ty = marker;
                variable.initializer = None;
            }
            _ => {}
        }
        false
    }

    /// Drop overridden symbols that point at missing or private
    /// declarations. The list is left untouched when nothing goes.
    fn filter_overridden(&mut self, decl: DeclId) {
        let overridden = self.module.declarations[decl].overridden();
        if overridden.iter().all(|&symbol| self.is_overridable(symbol)) {
            return;
        }
        let kept: Vec<SymbolId> = overridden
            .iter()
            .copied()
            .filter(|&symbol| self.is_overridable(symbol))
            .collect();
        match &mut self.module.declarations[decl].kind {
            DeclKind::Function(function) => function.overridden = kept,
            DeclKind::Property(property) => property.overridden = kept,
            _ => {}
        }
    }

    fn is_overridable(&self, symbol: SymbolId) -> bool {
        if self.module.is_missing(symbol) {
            return false;
        }
        self.module
            .owner(symbol)
            .and_then(|owner| owner.visibility())
            .map_or(true, |visibility| visibility != Visibility::Private)
    }
}

#[cfg(test)]
mod tests {
    use crate::config::PartialLinkageConfig;
    use crate::logger::CollectingLogger;
    use crate::patcher::{PartiallyLinkedTreePatcher, Root};
    use tether_ir::{
        Builtins, ClassKind, Constant, DeclKind, ExprKind, IrBuilder, Module, Parent, Statement,
        SymbolKind, Type, Visibility,
    };

    #[test]
    fn test_field_with_missing_type() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let gone = ir.missing_symbol(SymbolKind::Class, "Gone");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        let field = ir.field(Parent::Declaration(a), "x", Type::simple(gone));
        let init = ir.constant(Constant::Null, Type::simple(gone));
        if let DeclKind::Field(f) = &mut ir.module().declarations[field].kind {
            f.initializer = Some(init);
        }

        let mut logger = CollectingLogger::new();
        let config = PartialLinkageConfig::default();
        PartiallyLinkedTreePatcher::new(&mut module, &builtins, &config, &mut logger)
            .patch(&[Root::File(file)]);

        match &module.declarations[field].kind {
            DeclKind::Field(f) => {
                assert!(f.ty.is_marker());
                assert_eq!(f.initializer, None);
            }
            other => panic!("unexpected kind {:?}", other),
        }
        assert!(logger.reports.is_empty());
    }

    #[test]
    fn test_override_filtering() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let base = ir.class(Parent::File(file), "Base", ClassKind::Class);
        let kept = ir.function(Parent::Declaration(base), "kept", builtins.unit_type());
        let hidden = ir.function(Parent::Declaration(base), "hidden", builtins.unit_type());
        let gone = ir.missing_symbol(SymbolKind::Function, "Base.gone");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        let f = ir.function(Parent::Declaration(a), "f", builtins.unit_type());
        let g = ir.function(Parent::Declaration(a), "g", builtins.unit_type());
        let kept_symbol = ir.symbol_of(kept);
        let hidden_symbol = ir.symbol_of(hidden);
        {
            let module = ir.module();
            if let Some(function) = module.declarations[hidden].as_function_mut() {
                function.visibility = Visibility::Private;
            }
            if let Some(function) = module.declarations[f].as_function_mut() {
                function.overridden = vec![kept_symbol, hidden_symbol, gone];
            }
            if let Some(function) = module.declarations[g].as_function_mut() {
                function.overridden = vec![kept_symbol];
            }
        }

        let mut logger = CollectingLogger::new();
        let config = PartialLinkageConfig::default();
        PartiallyLinkedTreePatcher::new(&mut module, &builtins, &config, &mut logger)
            .patch(&[Root::File(file)]);

        assert_eq!(module.declarations[f].overridden(), &[kept_symbol]);
        assert_eq!(module.declarations[g].overridden(), &[kept_symbol]);
    }

    #[test]
    fn test_property_override_filtering() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let base = ir.class(Parent::File(file), "Base", ClassKind::Class);
        let kept = ir.property(Parent::Declaration(base), "kept", builtins.any_type(), false);
        let hidden = ir.property(Parent::Declaration(base), "hidden", builtins.any_type(), false);
        let gone = ir.missing_symbol(SymbolKind::Property, "Base.gone");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        let p = ir.property(Parent::Declaration(a), "p", builtins.any_type(), false);
        let q = ir.property(Parent::Declaration(a), "q", builtins.any_type(), false);
        let kept_symbol = ir.symbol_of(kept);
        let hidden_symbol = ir.symbol_of(hidden);
        {
            let module = ir.module();
            if let DeclKind::Property(property) = &mut module.declarations[hidden].kind {
                property.visibility = Visibility::Private;
            }
            if let DeclKind::Property(property) = &mut module.declarations[p].kind {
                property.overridden = vec![gone, hidden_symbol, kept_symbol];
            }
            if let DeclKind::Property(property) = &mut module.declarations[q].kind {
                property.overridden = vec![kept_symbol];
            }
        }

        let mut logger = CollectingLogger::new();
        let config = PartialLinkageConfig::default();
        let summary = PartiallyLinkedTreePatcher::new(&mut module, &builtins, &config, &mut logger)
            .patch(&[Root::File(file)]);

        assert_eq!(module.declarations[p].overridden(), &[kept_symbol]);
        assert_eq!(module.declarations[q].overridden(), &[kept_symbol]);
        assert!(summary.is_empty());
        assert!(logger.reports.is_empty());
    }

    #[test]
    fn test_inner_class_without_enclosing_class() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("Inner.kt", "");
        let inner = ir.class(Parent::File(file), "Inner", ClassKind::Class);
        if let Some(class) = ir.module().declarations[inner].as_class_mut() {
            class.is_inner = true;
        }
        let inner_symbol = ir.symbol_of(inner);
        let inner_type = ir.type_of(inner);
        let f = ir.function(Parent::File(file), "f", builtins.unit_type());
        let reference = ir.expr(
            ExprKind::ClassReference {
                symbol: inner_symbol,
                class_type: inner_type,
            },
            builtins.any_type(),
        );
        ir.set_body(f, vec![Statement::Expression(reference)]);

        let mut logger = CollectingLogger::new();
        let config = PartialLinkageConfig::default();
        let summary = PartiallyLinkedTreePatcher::new(&mut module, &builtins, &config, &mut logger)
            .patch(&[Root::File(file)]);

        assert_eq!(summary.rewritten_declarations, 1);
        assert_eq!(summary.rewritten_expressions, 1);
        assert!(builtins.is_linkage_error_call(&module.expressions[reference]));
        assert_eq!(
            logger.messages().collect::<Vec<_>>(),
            vec![
                "class Inner is expected to have enclosing class which is missing",
                "reference to class Inner can not be evaluated because it uses class Inner without expected enclosing class",
            ]
        );
    }
}
