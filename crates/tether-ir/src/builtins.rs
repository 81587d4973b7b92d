//! Well-known declarations every linked module relies on.

use crate::{
    AnonymousInitializerDecl, Body, ClassDecl, Constant, DeclId, DeclKind, DeclOrigin,
    Declaration, ExprKind, Expression, FileEntry, FileId, FunctionDecl, MarkerType,
    MemberAccess, Modality, Module, Parent, Signature, Span, StatementOrigin, SymbolId,
    SymbolKind, Type, ValueParameterDecl, Visibility,
};
use smol_str::SmolStr;

const BUILTINS_PACKAGE: &str = "builtins";

/// Handles to the built-in classes and the linkage-error intrinsic, plus
/// factories for the nodes partial linkage synthesizes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Builtins {
    pub file: FileId,
    /// Universal top type.
    pub any_class: SymbolId,
    /// Bottom type.
    pub nothing_class: SymbolId,
    pub string_class: SymbolId,
    pub unit_class: SymbolId,
    /// `throwLinkageError(message: String): Nothing`
    pub linkage_error: SymbolId,
}

impl Builtins {
    /// Add the built-ins file to `module` and return handles to its contents.
    pub fn install(module: &mut Module) -> Self {
        let file = module.add_file(FileEntry::new("<builtins>", ""), BUILTINS_PACKAGE);

        let any_class = Self::add_class(module, file, "Any");
        let nothing_class = Self::add_class(module, file, "Nothing");
        let string_class = Self::add_class(module, file, "String");
        let unit_class = Self::add_class(module, file, "Unit");

        let linkage_error = module.add_symbol(
            SymbolKind::Function,
            Some(Signature::public(BUILTINS_PACKAGE, "throwLinkageError")),
        );
        let function = module.add_declaration(Declaration {
            symbol: linkage_error,
            name: SmolStr::new("throwLinkageError"),
            origin: DeclOrigin::Defined,
            parent: None,
            span: Span::UNDEFINED,
            kind: DeclKind::Function(FunctionDecl {
                modality: Modality::Final,
                visibility: Visibility::Public,
                type_parameters: Vec::new(),
                dispatch_receiver: None,
                extension_receiver: None,
                value_parameters: Vec::new(),
                return_type: Type::simple(nothing_class),
                body: None,
                overridden: Vec::new(),
                corresponding_property: None,
            }),
        });
        module.attach(Parent::File(file), function);

        let message_symbol = module.add_symbol(SymbolKind::ValueParameter, None);
        let message = module.add_declaration(Declaration {
            symbol: message_symbol,
            name: SmolStr::new("message"),
            origin: DeclOrigin::Defined,
            parent: Some(Parent::Declaration(function)),
            span: Span::UNDEFINED,
            kind: DeclKind::ValueParameter(ValueParameterDecl {
                ty: Type::simple(string_class),
                vararg_element_type: None,
                default_value: None,
            }),
        });
        if let Some(function) = module.declarations[function].as_function_mut() {
            function.value_parameters.push(message);
        }

        Self {
            file,
            any_class,
            nothing_class,
            string_class,
            unit_class,
            linkage_error,
        }
    }

    fn add_class(module: &mut Module, file: FileId, name: &str) -> SymbolId {
        let symbol = module.add_symbol(
            SymbolKind::Class,
            Some(Signature::public(BUILTINS_PACKAGE, name)),
        );
        let class = module.add_declaration(Declaration {
            symbol,
            name: SmolStr::new(name),
            origin: DeclOrigin::Defined,
            parent: None,
            span: Span::UNDEFINED,
            kind: DeclKind::Class(ClassDecl {
                modality: if name == "Any" {
                    Modality::Open
                } else {
                    Modality::Final
                },
                ..ClassDecl::default()
            }),
        });
        module.attach(Parent::File(file), class);
        symbol
    }

    pub fn any_type(&self) -> Type {
        Type::simple(self.any_class)
    }

    pub fn nothing_type(&self) -> Type {
        Type::simple(self.nothing_class)
    }

    pub fn string_type(&self) -> Type {
        Type::simple(self.string_class)
    }

    pub fn unit_type(&self) -> Type {
        Type::simple(self.unit_class)
    }

    /// The marker type standing in for a type broken by `unlinked`.
    pub fn marker_type(&self, unlinked: SymbolId) -> Type {
        Type::Marker(MarkerType {
            erased_to: self.any_class,
            unlinked,
        })
    }

    /// Create an empty anonymous initializer as the last member of `class`.
    pub fn create_anonymous_initializer(
        &self,
        module: &mut Module,
        class: DeclId,
        origin: DeclOrigin,
    ) -> DeclId {
        let span = module.declarations[class].span;
        let symbol = module.add_symbol(SymbolKind::AnonymousInitializer, None);
        let init = module.add_declaration(Declaration {
            symbol,
            name: SmolStr::new("<anonymous-init>"),
            origin,
            parent: None,
            span,
            kind: DeclKind::AnonymousInitializer(AnonymousInitializerDecl {
                body: Body::default(),
            }),
        });
        module.attach(Parent::Declaration(class), init);
        init
    }

    /// Build a call to the linkage-error intrinsic carrying `message`.
    ///
    /// The call has no type arguments, one string-literal argument and the
    /// bottom type. Only the argument is allocated; the call itself is
    /// returned so that it can replace an existing node in place.
    pub fn linkage_error_call(
        &self,
        module: &mut Module,
        span: Span,
        message: impl Into<SmolStr>,
    ) -> Expression {
        let argument = module.add_expression(Expression {
            kind: ExprKind::Const(Constant::String(message.into())),
            ty: self.string_type(),
            span,
            origin: None,
        });

        Expression {
            kind: ExprKind::Call {
                access: MemberAccess::new(self.linkage_error).with_arguments(vec![argument]),
                super_qualifier: None,
            },
            ty: self.nothing_type(),
            span,
            origin: Some(StatementOrigin::PartialLinkageRuntimeError),
        }
    }

    /// Whether `expr` is a call produced by [`Builtins::linkage_error_call`].
    pub fn is_linkage_error_call(&self, expr: &Expression) -> bool {
        matches!(
            &expr.kind,
            ExprKind::Call { access, .. } if access.symbol == self.linkage_error
        )
    }
}
