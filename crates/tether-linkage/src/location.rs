//! Source locations for linkage diagnostics.

use crate::logger::{Location, UNDEFINED_COLUMN, UNDEFINED_LINE};
use tether_ir::{DeclId, ExprId, FileId, Module, Parent};

/// Start offset of the nearest declaration that exists in source code,
/// walking up from `decl` past nodes synthesized by partial linkage.
pub fn denotable_start_offset(module: &Module, mut decl: DeclId) -> Option<u32> {
    loop {
        let declaration = &module.declarations[decl];
        if !declaration.origin.is_partial_linkage() {
            return declaration.span.start_offset();
        }
        match declaration.parent? {
            Parent::Declaration(parent) => decl = parent,
            Parent::File(_) => return None,
        }
    }
}

/// Location of `offset` in `file`, rendered as `<module> @ <path>` with
/// 1-based line and column.
pub fn file_location(module: &Module, file: FileId, offset: Option<u32>) -> Location {
    let entry = &module.files[file].entry;
    let (line, column) = match offset {
        Some(offset) => (
            entry.line_number(offset) as i32 + 1,
            entry.column_number(offset) as i32 + 1,
        ),
        None => (UNDEFINED_LINE, UNDEFINED_COLUMN),
    };
    Location::new(format!("{} @ {}", module.name, entry.path), line, column)
}

/// Location of a declaration, if it belongs to a file.
pub fn declaration_location(module: &Module, decl: DeclId) -> Option<Location> {
    let file = module.file_of(decl)?;
    Some(file_location(
        module,
        file,
        denotable_start_offset(module, decl),
    ))
}

/// Location of an expression inside `file`.
pub fn expression_location(module: &Module, file: Option<FileId>, expr: ExprId) -> Option<Location> {
    let offset = module.expressions[expr].span.start_offset();
    Some(file_location(module, file?, offset))
}
