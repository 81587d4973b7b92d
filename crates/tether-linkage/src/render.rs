//! Error message rendering.
//!
//! Messages name declarations the way a user would recognize them in source
//! code (`function foo`, `backing field of property bar`) without access to
//! the source text. Rendering never fails: unknown names and signatures
//! degrade to placeholders.

use crate::case::LinkageCase;
use crate::explorer::Partially;
use std::fmt;
use tether_ir::{ClassKind, DeclKind, ExprId, ExprKind, Module, SymbolId, SymbolKind};

const UNKNOWN_NAME: &str = "<unknown name>";
const UNKNOWN_SYMBOL: &str = "<unknown symbol>";

/// How a declaration is called in messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DeclarationKind {
    Class,
    Interface,
    EnumClass,
    EnumEntry,
    AnnotationClass,
    Object,
    AnonymousObject,
    CompanionObject,
    MutableVariable,
    ImmutableVariable,
    ValueParameter,
    Field,
    FieldOfProperty,
    Property,
    PropertyAccessor,
    Function,
    Constructor,
    OtherDeclaration,
}

impl DeclarationKind {
    pub fn display_name(self) -> &'static str {
        match self {
            DeclarationKind::Class => "class",
            DeclarationKind::Interface => "interface",
            DeclarationKind::EnumClass => "enum class",
            DeclarationKind::EnumEntry => "enum entry",
            DeclarationKind::AnnotationClass => "annotation class",
            DeclarationKind::Object => "object",
            DeclarationKind::AnonymousObject => "anonymous object",
            DeclarationKind::CompanionObject => "companion object",
            DeclarationKind::MutableVariable => "var",
            DeclarationKind::ImmutableVariable => "val",
            DeclarationKind::ValueParameter => "value parameter",
            DeclarationKind::Field => "field",
            DeclarationKind::FieldOfProperty => "backing field of property",
            DeclarationKind::Property => "property",
            DeclarationKind::PropertyAccessor => "property accessor",
            DeclarationKind::Function => "function",
            DeclarationKind::Constructor => "constructor",
            DeclarationKind::OtherDeclaration => "declaration",
        }
    }
}

impl fmt::Display for DeclarationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// What an expression does with the declaration it references.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ExpressionKind {
    Reference,
    Calling,
    CallingInstanceInitializer,
    Reading,
    Writing,
    GettingInstance,
    OtherExpression,
}

impl ExpressionKind {
    /// Leading phrase, if the kind has one.
    pub fn display_name(self) -> Option<&'static str> {
        match self {
            ExpressionKind::Reference => Some("reference to"),
            ExpressionKind::CallingInstanceInitializer => Some("instance initializer of"),
            ExpressionKind::OtherExpression => Some("expression"),
            ExpressionKind::Calling
            | ExpressionKind::Reading
            | ExpressionKind::Writing
            | ExpressionKind::GettingInstance => None,
        }
    }

    /// Past participle completing "can not be ...".
    pub fn verb(self) -> &'static str {
        match self {
            ExpressionKind::Reference | ExpressionKind::OtherExpression => "evaluated",
            ExpressionKind::Calling | ExpressionKind::CallingInstanceInitializer => "called",
            ExpressionKind::Reading => "read",
            ExpressionKind::Writing => "written",
            ExpressionKind::GettingInstance => "gotten",
        }
    }
}

/// Kind of the declaration a symbol refers to. Unbound symbols are judged by
/// their symbol kind alone.
pub fn declaration_kind(module: &Module, symbol: SymbolId) -> DeclarationKind {
    let owner = module.owner(symbol);
    match module.symbols[symbol].kind {
        SymbolKind::Class => match owner.and_then(|owner| owner.as_class()) {
            None => DeclarationKind::Class,
            Some(class) => match class.class_kind {
                ClassKind::Class if class.is_anonymous => DeclarationKind::AnonymousObject,
                ClassKind::Class => DeclarationKind::Class,
                ClassKind::Interface => DeclarationKind::Interface,
                ClassKind::EnumClass => DeclarationKind::EnumClass,
                ClassKind::EnumEntry => DeclarationKind::EnumEntry,
                ClassKind::AnnotationClass => DeclarationKind::AnnotationClass,
                ClassKind::Object if class.is_companion => DeclarationKind::CompanionObject,
                ClassKind::Object => DeclarationKind::Object,
            },
        },
        SymbolKind::EnumEntry => DeclarationKind::EnumEntry,
        SymbolKind::Variable => match owner.map(|owner| &owner.kind) {
            Some(DeclKind::Variable(variable)) if variable.is_var => {
                DeclarationKind::MutableVariable
            }
            _ => DeclarationKind::ImmutableVariable,
        },
        SymbolKind::ValueParameter => DeclarationKind::ValueParameter,
        SymbolKind::Field => match owner.map(|owner| &owner.kind) {
            Some(DeclKind::Field(field)) if field.corresponding_property.is_some() => {
                DeclarationKind::FieldOfProperty
            }
            _ => DeclarationKind::Field,
        },
        SymbolKind::Property => DeclarationKind::Property,
        SymbolKind::Function => {
            let is_accessor = match owner.and_then(|owner| owner.as_function()) {
                Some(function) => function.corresponding_property.is_some(),
                None => module.symbols[symbol]
                    .signature
                    .as_ref()
                    .map_or(false, |signature| signature.is_accessor()),
            };
            if is_accessor {
                DeclarationKind::PropertyAccessor
            } else {
                DeclarationKind::Function
            }
        }
        SymbolKind::Constructor => DeclarationKind::Constructor,
        SymbolKind::TypeParameter | SymbolKind::AnonymousInitializer => {
            DeclarationKind::OtherDeclaration
        }
    }
}

/// Name of the declaration behind `symbol`: the owner's name, otherwise a
/// guess from the signature.
fn declaration_name(module: &Module, symbol: SymbolId) -> Option<String> {
    if let Some(owner) = module.owner(symbol) {
        if !owner.name.is_empty() {
            return Some(owner.name.to_string());
        }
    }
    let data = &module.symbols[symbol];
    let signature = data.signature.as_ref()?;
    let segments = if signature.is_accessor() || data.kind == SymbolKind::Constructor {
        2
    } else {
        1
    };
    signature.guess_name(segments)
}

/// Expression kind, plus the symbol the expression references if it
/// references one.
fn describe_expression(module: &Module, expr: ExprId) -> (ExpressionKind, Option<SymbolId>) {
    match &module.expressions[expr].kind {
        ExprKind::FunctionReference(access) | ExprKind::PropertyReference { access, .. } => {
            (ExpressionKind::Reference, Some(access.symbol))
        }
        ExprKind::ClassReference { symbol, .. } => (ExpressionKind::Reference, Some(*symbol)),
        ExprKind::Call { access, .. }
        | ExprKind::ConstructorCall(access)
        | ExprKind::DelegatingConstructorCall(access)
        | ExprKind::EnumConstructorCall(access) => (ExpressionKind::Calling, Some(access.symbol)),
        ExprKind::GetField { symbol, .. } | ExprKind::GetValue { symbol } => {
            (ExpressionKind::Reading, Some(*symbol))
        }
        ExprKind::SetField { symbol, .. } | ExprKind::SetValue { symbol, .. } => {
            (ExpressionKind::Writing, Some(*symbol))
        }
        ExprKind::GetObject { symbol } | ExprKind::GetEnumValue { symbol } => {
            (ExpressionKind::GettingInstance, Some(*symbol))
        }
        ExprKind::InstanceInitializerCall { class } => {
            (ExpressionKind::CallingInstanceInitializer, Some(*class))
        }
        ExprKind::Const(_)
        | ExprKind::Block { .. }
        | ExprKind::Return { .. }
        | ExprKind::TypeOperator { .. }
        | ExprKind::Vararg { .. }
        | ExprKind::When { .. }
        | ExprKind::Throw { .. } => (ExpressionKind::OtherExpression, None),
    }
}

struct Renderer<'m> {
    module: &'m Module,
    out: String,
}

impl<'m> Renderer<'m> {
    fn push(&mut self, text: &str) -> &mut Self {
        self.out.push_str(text);
        self
    }

    fn signature(&mut self, symbol: SymbolId) -> &mut Self {
        let module = self.module;
        match &module.symbols[symbol].signature {
            Some(signature) => self.push(&signature.to_string()),
            None => self.push(UNKNOWN_SYMBOL),
        }
    }

    fn declaration(&mut self, symbol: SymbolId) -> &mut Self {
        let kind = declaration_kind(self.module, symbol);
        self.push(kind.display_name());
        if kind != DeclarationKind::AnonymousObject {
            let name = declaration_name(self.module, symbol);
            self.push(" ").push(name.as_deref().unwrap_or(UNKNOWN_NAME));
        }
        self
    }

    fn expression(&mut self, expr: ExprId) -> &mut Self {
        let (kind, referenced) = describe_expression(self.module, expr);
        if let Some(phrase) = kind.display_name() {
            self.push(phrase);
        }
        if let Some(symbol) = referenced {
            if !self.out.is_empty() {
                self.push(" ");
            }
            self.declaration(symbol);
        }
        self.push(" can not be ").push(kind.verb())
    }

    fn cause(&mut self, cause: &Partially) -> &mut Self {
        match cause {
            Partially::MissingClassifier(symbol) => self.push("unlinked symbol ").signature(*symbol),
            Partially::MissingEnclosingClass(symbol) => self
                .declaration(*symbol)
                .push(" without expected enclosing class"),
            Partially::DueToOtherClassifier { symbol, root_cause } => self
                .push("partially linked symbol ")
                .signature(*symbol)
                .push(" (the root cause is ")
                .cause(root_cause)
                .push(")"),
        }
    }
}

/// Render the message carried by the linkage error for `case`.
pub fn render(module: &Module, case: &LinkageCase) -> String {
    let mut r = Renderer {
        module,
        out: String::new(),
    };
    match case {
        LinkageCase::MissingDeclaration { symbol } => {
            let kind = declaration_kind(module, *symbol);
            r.push("No ")
                .push(kind.display_name())
                .push(" found for signature ")
                .signature(*symbol);
        }
        LinkageCase::MissingEnclosingClass { class } => {
            r.declaration(module.declarations[*class].symbol)
                .push(" is expected to have enclosing class which is missing");
        }
        LinkageCase::DeclarationUsesPartiallyLinkedSymbol { declaration, cause } => {
            r.push("The signature of ")
                .declaration(module.declarations[*declaration].symbol)
                .push(" uses ")
                .cause(cause);
        }
        LinkageCase::ExpressionUsesMissingDeclaration { expression, symbol } => {
            r.expression(*expression)
                .push(" because it uses unlinked symbol ")
                .signature(*symbol);
        }
        LinkageCase::ExpressionUsesPartiallyLinkedSymbol { expression, cause } => {
            r.expression(*expression).push(" because it uses ").cause(cause);
        }
        LinkageCase::ExpressionUsesDeclarationThatUsesPartiallyLinkedSymbol {
            expression,
            declaration,
            cause,
        } => {
            r.expression(*expression)
                .push(" because it uses ")
                .declaration(module.declarations[*declaration].symbol)
                .push(" whose signature uses ")
                .cause(cause);
        }
        LinkageCase::UnimplementedAbstractCallable { member } => {
            r.push("Abstract ")
                .declaration(module.declarations[*member].symbol)
                .push(" is not implemented in non-abstract ");
            match module.parent_declaration(*member) {
                Some(class) if module.declarations[class].as_class().is_some() => {
                    r.declaration(module.declarations[class].symbol);
                }
                parent => {
                    let name = parent
                        .map(|parent| module.declarations[parent].name.as_str())
                        .filter(|name| !name.is_empty());
                    r.push(DeclarationKind::OtherDeclaration.display_name())
                        .push(" ")
                        .push(name.unwrap_or(UNKNOWN_NAME));
                }
            }
        }
    }
    r.out
}
