//! Convenience construction of IR trees.
//!
//! Deserializers and tests build declarations through [`IrBuilder`], which
//! keeps symbols bound to their owners, parent links consistent and assigns
//! public signatures from the enclosing declarations' names.

use crate::{
    Body, ClassDecl, ClassKind, Constant, DeclId, DeclKind, DeclOrigin, Declaration,
    EnumEntryDecl, ExprId, ExprKind, Expression, FieldDecl, FileEntry, FileId, FunctionDecl,
    Modality, Module, Parent, PropertyDecl, Signature, Span, Statement, SymbolId, SymbolKind,
    Type, TypeParameterDecl, ValueParameterDecl, VariableDecl, Visibility,
};
use smol_str::SmolStr;

pub struct IrBuilder<'m> {
    module: &'m mut Module,
    package: SmolStr,
}

impl<'m> IrBuilder<'m> {
    pub fn new(module: &'m mut Module, package: impl Into<SmolStr>) -> Self {
        Self {
            module,
            package: package.into(),
        }
    }

    pub fn module(&mut self) -> &mut Module {
        self.module
    }

    pub fn symbol_of(&self, decl: DeclId) -> SymbolId {
        self.module.declarations[decl].symbol
    }

    /// Type naming the class `decl`.
    pub fn type_of(&self, decl: DeclId) -> Type {
        Type::simple(self.symbol_of(decl))
    }

    pub fn file(&mut self, path: &str, source: &str) -> FileId {
        self.module
            .add_file(FileEntry::new(path, source), self.package.clone())
    }

    /// Dotted name of `name` nested in `parent`.
    fn qualified_name(&self, parent: Parent, name: &str) -> SmolStr {
        let mut segments = vec![name.to_string()];
        let mut current = parent;
        while let Parent::Declaration(decl) = current {
            let decl = &self.module.declarations[decl];
            segments.push(decl.name.to_string());
            match decl.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
        segments.reverse();
        SmolStr::new(segments.join("."))
    }

    fn declare(
        &mut self,
        parent: Parent,
        symbol_kind: SymbolKind,
        name: &str,
        origin: DeclOrigin,
        kind: DeclKind,
    ) -> DeclId {
        let signature = Signature::public(self.package.clone(), self.qualified_name(parent, name));
        let symbol = self.module.add_symbol(symbol_kind, Some(signature));
        let decl = self.module.add_declaration(Declaration {
            symbol,
            name: SmolStr::new(name),
            origin,
            parent: Some(parent),
            span: Span::UNDEFINED,
            kind,
        });

        let is_member = match parent {
            Parent::File(_) => true,
            Parent::Declaration(owner) => self.module.declarations[owner].as_class().is_some(),
        };
        if is_member {
            self.module.attach(parent, decl);
        }
        decl
    }

    /// Declare a value that has no public signature (parameters, locals).
    fn declare_local(
        &mut self,
        parent: DeclId,
        symbol_kind: SymbolKind,
        name: &str,
        kind: DeclKind,
    ) -> DeclId {
        let symbol = self.module.add_symbol(symbol_kind, None);
        self.module.add_declaration(Declaration {
            symbol,
            name: SmolStr::new(name),
            origin: DeclOrigin::Defined,
            parent: Some(Parent::Declaration(parent)),
            span: Span::UNDEFINED,
            kind,
        })
    }

    pub fn class(&mut self, parent: Parent, name: &str, class_kind: ClassKind) -> DeclId {
        let modality = match class_kind {
            ClassKind::Interface => Modality::Abstract,
            _ => Modality::Final,
        };
        self.declare(
            parent,
            SymbolKind::Class,
            name,
            DeclOrigin::Defined,
            DeclKind::Class(ClassDecl {
                class_kind,
                modality,
                ..ClassDecl::default()
            }),
        )
    }

    pub fn add_super_type(&mut self, class: DeclId, super_type: Type) {
        if let Some(class) = self.module.declarations[class].as_class_mut() {
            class.super_types.push(super_type);
        }
    }

    fn function_decl(return_type: Type) -> FunctionDecl {
        FunctionDecl {
            modality: Modality::Final,
            visibility: Visibility::Public,
            type_parameters: Vec::new(),
            dispatch_receiver: None,
            extension_receiver: None,
            value_parameters: Vec::new(),
            return_type,
            body: Some(Body::default()),
            overridden: Vec::new(),
            corresponding_property: None,
        }
    }

    pub fn function(&mut self, parent: Parent, name: &str, return_type: Type) -> DeclId {
        self.declare(
            parent,
            SymbolKind::Function,
            name,
            DeclOrigin::Defined,
            DeclKind::Function(Self::function_decl(return_type)),
        )
    }

    /// Primary constructor of `class`.
    pub fn constructor(&mut self, class: DeclId) -> DeclId {
        let return_type = self.type_of(class);
        self.declare(
            Parent::Declaration(class),
            SymbolKind::Constructor,
            "<init>",
            DeclOrigin::Defined,
            DeclKind::Function(Self::function_decl(return_type)),
        )
    }

    pub fn value_parameter(&mut self, function: DeclId, name: &str, ty: Type) -> DeclId {
        let param = self.declare_local(
            function,
            SymbolKind::ValueParameter,
            name,
            DeclKind::ValueParameter(ValueParameterDecl {
                ty,
                vararg_element_type: None,
                default_value: None,
            }),
        );
        if let Some(function) = self.module.declarations[function].as_function_mut() {
            function.value_parameters.push(param);
        }
        param
    }

    pub fn extension_receiver(&mut self, function: DeclId, ty: Type) -> DeclId {
        let param = self.declare_local(
            function,
            SymbolKind::ValueParameter,
            "<this>",
            DeclKind::ValueParameter(ValueParameterDecl {
                ty,
                vararg_element_type: None,
                default_value: None,
            }),
        );
        if let Some(function) = self.module.declarations[function].as_function_mut() {
            function.extension_receiver = Some(param);
        }
        param
    }

    pub fn dispatch_receiver(&mut self, function: DeclId, ty: Type) -> DeclId {
        let param = self.declare_local(
            function,
            SymbolKind::ValueParameter,
            "<this>",
            DeclKind::ValueParameter(ValueParameterDecl {
                ty,
                vararg_element_type: None,
                default_value: None,
            }),
        );
        if let Some(function) = self.module.declarations[function].as_function_mut() {
            function.dispatch_receiver = Some(param);
        }
        param
    }

    /// Type parameter of a class or function.
    pub fn type_parameter(&mut self, owner: DeclId, name: &str, bounds: Vec<Type>) -> DeclId {
        let param = self.declare_local(
            owner,
            SymbolKind::TypeParameter,
            name,
            DeclKind::TypeParameter(TypeParameterDecl {
                super_types: bounds,
            }),
        );
        match &mut self.module.declarations[owner].kind {
            DeclKind::Class(class) => class.type_parameters.push(param),
            DeclKind::Function(function) => function.type_parameters.push(param),
            _ => {}
        }
        param
    }

    pub fn field(&mut self, parent: Parent, name: &str, ty: Type) -> DeclId {
        self.declare(
            parent,
            SymbolKind::Field,
            name,
            DeclOrigin::Defined,
            DeclKind::Field(FieldDecl {
                visibility: Visibility::Private,
                ty,
                initializer: None,
                corresponding_property: None,
            }),
        )
    }

    /// Property with a backing field and a getter.
    pub fn property(&mut self, parent: Parent, name: &str, ty: Type, is_var: bool) -> DeclId {
        let property = self.declare(
            parent,
            SymbolKind::Property,
            name,
            DeclOrigin::Defined,
            DeclKind::Property(PropertyDecl {
                is_var,
                ..PropertyDecl::default()
            }),
        );
        let property_symbol = self.symbol_of(property);
        let property_signature = self.module.symbols[property_symbol].signature.clone();

        let field_symbol = self.module.add_symbol(SymbolKind::Field, None);
        let field = self.module.add_declaration(Declaration {
            symbol: field_symbol,
            name: SmolStr::new(name),
            origin: DeclOrigin::Defined,
            parent: Some(Parent::Declaration(property)),
            span: Span::UNDEFINED,
            kind: DeclKind::Field(FieldDecl {
                visibility: Visibility::Private,
                ty: ty.clone(),
                initializer: None,
                corresponding_property: Some(property_symbol),
            }),
        });

        let getter_name = format!("<get-{}>", name);
        let getter_signature = property_signature.map(|property_signature| {
            let accessor = Signature::public(
                self.package.clone(),
                self.qualified_name(Parent::Declaration(property), &getter_name),
            );
            Signature::accessor(property_signature, accessor)
        });
        let getter_symbol = self.module.add_symbol(SymbolKind::Function, getter_signature);
        let getter = self.module.add_declaration(Declaration {
            symbol: getter_symbol,
            name: SmolStr::new(getter_name),
            origin: DeclOrigin::Defined,
            parent: Some(Parent::Declaration(property)),
            span: Span::UNDEFINED,
            kind: DeclKind::Function(FunctionDecl {
                corresponding_property: Some(property_symbol),
                ..Self::function_decl(ty)
            }),
        });

        if let DeclKind::Property(decl) = &mut self.module.declarations[property].kind {
            decl.backing_field = Some(field);
            decl.getter = Some(getter);
        }
        property
    }

    /// Entry of an enum class.
    pub fn enum_entry(&mut self, enum_class: DeclId, name: &str) -> DeclId {
        self.declare(
            Parent::Declaration(enum_class),
            SymbolKind::EnumEntry,
            name,
            DeclOrigin::Defined,
            DeclKind::EnumEntry(EnumEntryDecl::default()),
        )
    }

    /// Local variable of `function`. The caller places it in a body.
    pub fn local_variable(
        &mut self,
        function: DeclId,
        name: &str,
        ty: Type,
        initializer: Option<ExprId>,
    ) -> DeclId {
        self.declare_local(
            function,
            SymbolKind::Variable,
            name,
            DeclKind::Variable(VariableDecl {
                is_var: false,
                ty,
                initializer,
            }),
        )
    }

    /// A symbol whose declaration the linked libraries do not provide.
    pub fn missing_symbol(&mut self, kind: SymbolKind, qualified_name: &str) -> SymbolId {
        let signature = Signature::public(self.package.clone(), qualified_name);
        self.module.add_symbol(kind, Some(signature))
    }

    /// A synthetic stub standing in for a missing function.
    pub fn missing_declaration_stub(
        &mut self,
        parent: Parent,
        kind: SymbolKind,
        name: &str,
        return_type: Type,
    ) -> DeclId {
        let mut function = Self::function_decl(return_type);
        function.body = None;
        self.declare(
            parent,
            kind,
            name,
            DeclOrigin::MissingDeclaration,
            DeclKind::Function(function),
        )
    }

    pub fn expr(&mut self, kind: ExprKind, ty: Type) -> ExprId {
        self.module.add_expression(Expression {
            kind,
            ty,
            span: Span::UNDEFINED,
            origin: None,
        })
    }

    pub fn constant(&mut self, constant: Constant, ty: Type) -> ExprId {
        self.expr(ExprKind::Const(constant), ty)
    }

    /// Replace the body of `function` with `statements`.
    pub fn set_body(&mut self, function: DeclId, statements: Vec<Statement>) {
        if let Some(function) = self.module.declarations[function].as_function_mut() {
            function.body = Some(Body::new(statements));
        }
    }
}
