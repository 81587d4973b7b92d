//! Sweep 2: expressions.

use super::{PartiallyLinkedTreePatcher, Root};
use crate::case::LinkageCase;
use crate::explorer::{ClassifierExplorer, Partially};
use crate::location::expression_location;
use crate::marker::precalculated_cause;
use std::rc::Rc;
use tether_ir::{
    DeclId, DeclKind, ExprId, ExprKind, FileId, MemberAccess, Module, Node, SymbolId, Type,
};

impl PartiallyLinkedTreePatcher<'_> {
    pub(super) fn sweep_expressions(&mut self, root: Root) {
        match root {
            Root::File(file) => {
                let declarations = self.module.files[file].declarations.clone();
                for decl in declarations {
                    self.visit(Node::Declaration(decl), Some(file));
                }
            }
            Root::Declaration(decl) => {
                let file = self.module.file_of(decl);
                self.visit(Node::Declaration(decl), file);
            }
        }
    }

    fn visit(&mut self, node: Node, file: Option<FileId>) {
        let children = match node {
            Node::Declaration(decl) => self.module.declaration_children(decl),
            Node::Expression(expr) => {
                let case = ExpressionChecker {
                    explorer: &mut self.explorer,
                    module: self.module,
                    expr,
                }
                .check();
                if let Some(case) = case {
                    self.replace_expression(expr, &case, file);
                    return;
                }
                self.module.expression_children(expr)
            }
        };
        for child in children {
            self.visit(child, file);
        }
    }

    /// Overwrite `expr` in place with a linkage-error call. Its former
    /// children become unreachable.
    fn replace_expression(&mut self, expr: ExprId, case: &LinkageCase, file: Option<FileId>) {
        let span = self.module.expressions[expr].span;
        let location = expression_location(self.module, file, expr);
        let call = self.throw_linkage_error(case, span, location);
        self.module.expressions[expr] = call;
        self.summary.rewritten_expressions += 1;
    }
}

/// Finds the first problem of one expression.
struct ExpressionChecker<'a> {
    explorer: &'a mut ClassifierExplorer,
    module: &'a Module,
    expr: ExprId,
}

impl ExpressionChecker<'_> {
    fn check(mut self) -> Option<LinkageCase> {
        let module = self.module;
        let expression = &module.expressions[self.expr];
        let ty = &expression.ty;

        match &expression.kind {
            ExprKind::Return { target, .. } => self.symbol(Some(*target)),
            ExprKind::Block {
                inlined_function, ..
            } => self.symbol(*inlined_function),
            ExprKind::TypeOperator { operand_type, .. } => self
                .ty(ty)
                .or_else(|| self.ty(operand_type)),
            ExprKind::Vararg { element_type, .. } => {
                self.ty(ty).or_else(|| self.ty(element_type))
            }
            ExprKind::ClassReference { symbol, class_type } => self
                .ty(ty)
                .or_else(|| self.ty(class_type))
                .or_else(|| self.symbol(Some(*symbol))),
            ExprKind::Call {
                access,
                super_qualifier,
            } => self
                .symbol(*super_qualifier)
                .or_else(|| self.member_access(ty, access))
                .or_else(|| self.symbol(Some(access.symbol))),
            ExprKind::ConstructorCall(access)
            | ExprKind::DelegatingConstructorCall(access)
            | ExprKind::EnumConstructorCall(access) => self
                .member_access(ty, access)
                .or_else(|| self.symbol(Some(access.symbol))),
            ExprKind::FunctionReference(access) => self
                .symbol(Some(access.symbol))
                .or_else(|| self.member_access(ty, access)),
            ExprKind::PropertyReference {
                access,
                field,
                getter,
                setter,
            } => self
                .symbol(*field)
                .or_else(|| self.symbol(*getter))
                .or_else(|| self.symbol(*setter))
                .or_else(|| self.member_access(ty, access))
                .or_else(|| self.symbol(Some(access.symbol))),
            ExprKind::InstanceInitializerCall { class } => self.symbol(Some(*class)),
            ExprKind::GetValue { symbol }
            | ExprKind::SetValue { symbol, .. }
            | ExprKind::GetField { symbol, .. }
            | ExprKind::SetField { symbol, .. }
            | ExprKind::GetObject { symbol }
            | ExprKind::GetEnumValue { symbol } => self.symbol(Some(*symbol)),
            ExprKind::Const(_) | ExprKind::When { .. } | ExprKind::Throw { .. } => None,
        }
        .or_else(|| self.ty(ty))
    }

    fn partially_linked(&self, cause: Rc<Partially>) -> LinkageCase {
        LinkageCase::ExpressionUsesPartiallyLinkedSymbol {
            expression: self.expr,
            cause,
        }
    }

    fn ty(&mut self, ty: &Type) -> Option<LinkageCase> {
        let cause = self.explorer.explore_type(self.module, ty).into_partially()?;
        Some(self.partially_linked(cause))
    }

    /// The expression's type, then its explicit type arguments in index
    /// order.
    fn member_access(&mut self, ty: &Type, access: &MemberAccess) -> Option<LinkageCase> {
        self.ty(ty).or_else(|| {
            access
                .type_arguments
                .iter()
                .flatten()
                .find_map(|argument| self.ty(argument))
        })
    }

    fn symbol(&mut self, symbol: Option<SymbolId>) -> Option<LinkageCase> {
        let symbol = symbol?;
        let module = self.module;
        if module.is_missing(symbol) {
            return Some(LinkageCase::ExpressionUsesMissingDeclaration {
                expression: self.expr,
                symbol,
            });
        }
        let owner = module.symbols[symbol].owner?;

        let declaration = match &module.declarations[owner].kind {
            DeclKind::Class(_) | DeclKind::TypeParameter(_) => {
                let cause = self.explorer.explore_symbol(module, symbol).into_partially()?;
                return Some(self.partially_linked(cause));
            }
            DeclKind::EnumEntry(entry) => {
                let class = entry
                    .corresponding_class
                    .or_else(|| module.parent_declaration(owner))?;
                let class_symbol = module.declarations[class].symbol;
                let cause = self
                    .explorer
                    .explore_symbol(module, class_symbol)
                    .into_partially()?;
                return Some(self.partially_linked(cause));
            }
            DeclKind::Function(_) => self.function_cause(owner).map(|cause| (owner, cause)),
            DeclKind::Property(property) => property
                .backing_field
                .and_then(|field| self.value_cause(field))
                .or_else(|| property.getter.and_then(|getter| self.function_cause(getter)))
                .or_else(|| property.setter.and_then(|setter| self.function_cause(setter)))
                .map(|cause| (owner, cause)),
            DeclKind::Field(_) | DeclKind::Variable(_) | DeclKind::ValueParameter(_) => {
                self.value_cause(owner).map(|cause| (owner, cause))
            }
            DeclKind::AnonymousInitializer(_) => None,
        };

        let (declaration, cause) = declaration?;
        Some(LinkageCase::ExpressionUsesDeclarationThatUsesPartiallyLinkedSymbol {
            expression: self.expr,
            declaration,
            cause,
        })
    }

    fn value_cause(&mut self, decl: DeclId) -> Option<Rc<Partially>> {
        let ty = self.module.declarations[decl].value_type()?;
        precalculated_cause(self.explorer, self.module, ty)
    }

    /// First broken type of a function signature, in declaration order:
    /// extension receiver, value parameters, return type, type parameter
    /// bounds, dispatch receiver.
    fn function_cause(&mut self, function: DeclId) -> Option<Rc<Partially>> {
        let module = self.module;
        let f = module.declarations[function].as_function()?;

        let parameter = |this: &mut Self, param: DeclId| {
            let p = module.declarations[param].as_value_parameter()?;
            precalculated_cause(this.explorer, module, &p.ty).or_else(|| {
                p.vararg_element_type
                    .as_ref()
                    .and_then(|element| precalculated_cause(this.explorer, module, element))
            })
        };

        f.extension_receiver
            .and_then(|receiver| parameter(self, receiver))
            .or_else(|| {
                f.value_parameters
                    .iter()
                    .find_map(|&param| parameter(self, param))
            })
            .or_else(|| precalculated_cause(self.explorer, module, &f.return_type))
            .or_else(|| {
                f.type_parameters.iter().find_map(|&param| {
                    match &module.declarations[param].kind {
                        DeclKind::TypeParameter(tp) => tp
                            .super_types
                            .iter()
                            .find_map(|bound| precalculated_cause(self.explorer, module, bound)),
                        _ => None,
                    }
                })
            })
            .or_else(|| {
                f.dispatch_receiver
                    .and_then(|receiver| parameter(self, receiver))
            })
    }
}
