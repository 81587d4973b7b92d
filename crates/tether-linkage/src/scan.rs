//! Discovery of unlinked symbols without touching the tree.

use crate::patcher::Root;
use indexmap::IndexSet;
use tether_ir::{
    DeclId, DeclKind, DeclOrigin, ExprId, ExprKind, MemberAccess, Module, Node, SymbolId, Type,
    TypeArgument,
};

/// Every missing symbol referenced from `roots`, in first-reference order.
pub fn find_unlinked_symbols(module: &Module, roots: &[Root]) -> IndexSet<SymbolId> {
    let mut scanner = Scanner {
        module,
        found: IndexSet::new(),
    };
    for &root in roots {
        match root {
            Root::File(file) => {
                for &decl in &module.files[file].declarations {
                    scanner.declaration(decl);
                }
            }
            Root::Declaration(decl) => scanner.declaration(decl),
        }
    }
    scanner.found
}

struct Scanner<'m> {
    module: &'m Module,
    found: IndexSet<SymbolId>,
}

impl Scanner<'_> {
    fn symbol(&mut self, symbol: SymbolId) {
        if self.module.is_missing(symbol) {
            self.found.insert(symbol);
        }
    }

    fn ty(&mut self, ty: &Type) {
        match ty {
            Type::Simple {
                classifier,
                arguments,
                ..
            } => {
                self.symbol(*classifier);
                for argument in arguments {
                    if let TypeArgument::Projection(argument) = argument {
                        self.ty(argument);
                    }
                }
            }
            Type::Marker(_) => {}
        }
    }

    fn node(&mut self, node: Node) {
        match node {
            Node::Declaration(decl) => self.declaration(decl),
            Node::Expression(expr) => self.expression(expr),
        }
    }

    fn declaration(&mut self, decl: DeclId) {
        let module = self.module;
        let declaration = &module.declarations[decl];
        // An initializer carrying a class's linkage error is not a stub.
        if declaration.origin == DeclOrigin::MissingDeclaration
            && !matches!(declaration.kind, DeclKind::AnonymousInitializer(_))
        {
            self.symbol(declaration.symbol);
        }
        match &declaration.kind {
            DeclKind::Class(class) => class.super_types.iter().for_each(|ty| self.ty(ty)),
            DeclKind::Function(function) => {
                self.ty(&function.return_type);
                function
                    .overridden
                    .iter()
                    .for_each(|&symbol| self.symbol(symbol));
            }
            DeclKind::Property(property) => property
                .overridden
                .iter()
                .for_each(|&symbol| self.symbol(symbol)),
            DeclKind::Field(field) => self.ty(&field.ty),
            DeclKind::Variable(variable) => self.ty(&variable.ty),
            DeclKind::ValueParameter(param) => {
                self.ty(&param.ty);
                if let Some(element) = &param.vararg_element_type {
                    self.ty(element);
                }
            }
            DeclKind::TypeParameter(param) => param.super_types.iter().for_each(|ty| self.ty(ty)),
            DeclKind::EnumEntry(_) | DeclKind::AnonymousInitializer(_) => {}
        }
        for child in module.declaration_children(decl) {
            self.node(child);
        }
    }

    fn member_access(&mut self, access: &MemberAccess) {
        self.symbol(access.symbol);
        for argument in access.type_arguments.iter().flatten() {
            self.ty(argument);
        }
    }

    fn expression(&mut self, expr: ExprId) {
        let module = self.module;
        let expression = &module.expressions[expr];
        self.ty(&expression.ty);
        match &expression.kind {
            ExprKind::Return { target, .. } => self.symbol(*target),
            ExprKind::Block {
                inlined_function, ..
            } => {
                if let Some(function) = inlined_function {
                    self.symbol(*function);
                }
            }
            ExprKind::TypeOperator { operand_type, .. } => self.ty(operand_type),
            ExprKind::Vararg { element_type, .. } => self.ty(element_type),
            ExprKind::GetValue { symbol }
            | ExprKind::SetValue { symbol, .. }
            | ExprKind::GetField { symbol, .. }
            | ExprKind::SetField { symbol, .. }
            | ExprKind::GetObject { symbol }
            | ExprKind::GetEnumValue { symbol } => self.symbol(*symbol),
            ExprKind::Call {
                access,
                super_qualifier,
            } => {
                if let Some(qualifier) = super_qualifier {
                    self.symbol(*qualifier);
                }
                self.member_access(access);
            }
            ExprKind::ConstructorCall(access)
            | ExprKind::DelegatingConstructorCall(access)
            | ExprKind::EnumConstructorCall(access)
            | ExprKind::FunctionReference(access) => self.member_access(access),
            ExprKind::PropertyReference {
                access,
                field,
                getter,
                setter,
            } => {
                for symbol in [field, getter, setter].into_iter().flatten() {
                    self.symbol(*symbol);
                }
                self.member_access(access);
            }
            ExprKind::ClassReference { symbol, class_type } => {
                self.symbol(*symbol);
                self.ty(class_type);
            }
            ExprKind::InstanceInitializerCall { class } => self.symbol(*class),
            ExprKind::Const(_) | ExprKind::When { .. } | ExprKind::Throw { .. } => {}
        }
        for child in module.expression_children(expr) {
            self.node(child);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tether_ir::{Builtins, ClassKind, IrBuilder, Parent, Statement, SymbolKind};

    #[test]
    fn test_collects_each_symbol_once() {
        let mut module = Module::new("lib");
        let builtins = Builtins::install(&mut module);
        let mut ir = IrBuilder::new(&mut module, "pkg");
        let file = ir.file("A.kt", "");
        let b = ir.missing_symbol(SymbolKind::Class, "B");
        let bar = ir.missing_symbol(SymbolKind::Function, "Foo.bar");
        let a = ir.class(Parent::File(file), "A", ClassKind::Class);
        ir.add_super_type(a, Type::simple(b));
        let f = ir.function(Parent::File(file), "f", Type::simple(b));
        let call = ir.expr(
            ExprKind::Call {
                access: MemberAccess::new(bar),
                super_qualifier: None,
            },
            builtins.unit_type(),
        );
        ir.set_body(f, vec![Statement::Expression(call)]);
        let before = module.clone();

        let found = find_unlinked_symbols(&module, &[Root::File(file)]);
        assert_eq!(found.into_iter().collect::<Vec<_>>(), vec![b, bar]);
        assert_eq!(module.declarations[f], before.declarations[f]);
    }
}
