//! Expression nodes.

use crate::{DeclId, Span, SymbolId, Type};
use la_arena::Idx;
use smol_str::SmolStr;

pub type ExprId = Idx<Expression>;

/// An IR expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Expression {
    pub kind: ExprKind,
    pub ty: Type,
    /// Source span for error reporting.
    pub span: Span,
    pub origin: Option<StatementOrigin>,
}

/// Statements of a body or block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Statement {
    /// Local declaration (variable, local function, local class).
    Declaration(DeclId),
    Expression(ExprId),
}

/// Why the compiler produced a statement.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum StatementOrigin {
    /// Call to the linkage-error intrinsic installed by partial linkage.
    PartialLinkageRuntimeError,
}

/// Compile-time constants.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum Constant {
    Null,
    Boolean(bool),
    Int(i64),
    String(SmolStr),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum TypeOperator {
    Cast,
    SafeCast,
    InstanceOf,
    NotInstanceOf,
    ImplicitCoercionToUnit,
}

/// Shared shape of calls and callable references.
#[derive(Debug, Clone, PartialEq)]
pub struct MemberAccess {
    pub symbol: SymbolId,
    /// Explicit type arguments; `None` where inference left a hole.
    pub type_arguments: Vec<Option<Type>>,
    pub dispatch_receiver: Option<ExprId>,
    pub extension_receiver: Option<ExprId>,
    /// Value arguments; `None` when the default value is used.
    pub arguments: Vec<Option<ExprId>>,
}

impl MemberAccess {
    pub fn new(symbol: SymbolId) -> Self {
        Self {
            symbol,
            type_arguments: Vec::new(),
            dispatch_receiver: None,
            extension_receiver: None,
            arguments: Vec::new(),
        }
    }

    pub fn with_arguments(mut self, arguments: Vec<ExprId>) -> Self {
        self.arguments = arguments.into_iter().map(Some).collect();
        self
    }

    pub fn with_type_arguments(mut self, type_arguments: Vec<Type>) -> Self {
        self.type_arguments = type_arguments.into_iter().map(Some).collect();
        self
    }

    pub fn with_dispatch_receiver(mut self, receiver: ExprId) -> Self {
        self.dispatch_receiver = Some(receiver);
        self
    }

    fn children(&self, out: &mut Vec<ExprId>) {
        out.extend(self.dispatch_receiver);
        out.extend(self.extension_receiver);
        out.extend(self.arguments.iter().flatten().copied());
    }
}

/// A `when` branch: `condition -> result`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WhenBranch {
    pub condition: ExprId,
    pub result: ExprId,
}

/// Expression kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum ExprKind {
    Const(Constant),
    /// Block; a returnable block carries the symbol of the inlined function.
    Block {
        statements: Vec<Statement>,
        inlined_function: Option<SymbolId>,
    },
    Return {
        target: SymbolId,
        value: ExprId,
    },
    TypeOperator {
        operator: TypeOperator,
        operand_type: Type,
        argument: ExprId,
    },
    Vararg {
        element_type: Type,
        elements: Vec<ExprId>,
    },
    /// Read of a variable or value parameter.
    GetValue {
        symbol: SymbolId,
    },
    SetValue {
        symbol: SymbolId,
        value: ExprId,
    },
    GetField {
        symbol: SymbolId,
        receiver: Option<ExprId>,
    },
    SetField {
        symbol: SymbolId,
        receiver: Option<ExprId>,
        value: ExprId,
    },
    /// Instance of an `object`.
    GetObject {
        symbol: SymbolId,
    },
    GetEnumValue {
        symbol: SymbolId,
    },
    Call {
        access: MemberAccess,
        /// `super<T>.f()` qualifier.
        super_qualifier: Option<SymbolId>,
    },
    ConstructorCall(MemberAccess),
    DelegatingConstructorCall(MemberAccess),
    EnumConstructorCall(MemberAccess),
    FunctionReference(MemberAccess),
    PropertyReference {
        access: MemberAccess,
        field: Option<SymbolId>,
        getter: Option<SymbolId>,
        setter: Option<SymbolId>,
    },
    ClassReference {
        symbol: SymbolId,
        class_type: Type,
    },
    InstanceInitializerCall {
        class: SymbolId,
    },
    When {
        branches: Vec<WhenBranch>,
    },
    Throw {
        value: ExprId,
    },
}

impl ExprKind {
    /// Direct child expressions, in evaluation order.
    pub fn child_expressions(&self) -> Vec<ExprId> {
        let mut out = Vec::new();
        match self {
            ExprKind::Const(_)
            | ExprKind::GetValue { .. }
            | ExprKind::GetObject { .. }
            | ExprKind::GetEnumValue { .. }
            | ExprKind::ClassReference { .. }
            | ExprKind::InstanceInitializerCall { .. } => {}
            ExprKind::Block { statements, .. } => {
                out.extend(statements.iter().filter_map(|stmt| match stmt {
                    Statement::Expression(expr) => Some(*expr),
                    Statement::Declaration(_) => None,
                }));
            }
            ExprKind::Return { value, .. }
            | ExprKind::SetValue { value, .. }
            | ExprKind::Throw { value } => out.push(*value),
            ExprKind::TypeOperator { argument, .. } => out.push(*argument),
            ExprKind::Vararg { elements, .. } => out.extend(elements.iter().copied()),
            ExprKind::GetField { receiver, .. } => out.extend(*receiver),
            ExprKind::SetField {
                receiver, value, ..
            } => {
                out.extend(*receiver);
                out.push(*value);
            }
            ExprKind::Call { access, .. }
            | ExprKind::ConstructorCall(access)
            | ExprKind::DelegatingConstructorCall(access)
            | ExprKind::EnumConstructorCall(access)
            | ExprKind::FunctionReference(access)
            | ExprKind::PropertyReference { access, .. } => access.children(&mut out),
            ExprKind::When { branches } => {
                for branch in branches {
                    out.push(branch.condition);
                    out.push(branch.result);
                }
            }
        }
        out
    }
}
