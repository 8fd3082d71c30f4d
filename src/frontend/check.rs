//! 语义检查。

use std::collections::HashSet;

use crate::error::CompileError;
use crate::frontend::ast;
use crate::utils::Span;

/// A failed check, anchored at the offending construct.
#[derive(Debug, Clone, PartialEq)]
pub struct CheckError<'a> {
    /// 错误
    pub error: CompileError,
    /// Where it was found.
    pub span: Span<'a, ()>,
}

impl<'a> CheckError<'a> {
    /// Render the error with the source lines it points at.
    pub fn to_snippet(&self) -> String {
        self.error.to_snippet(&self.span)
    }
}

/// 规则名不能重复
///
/// `defined` reports names introduced by previously added modules.
pub fn check_rule_names<'a>(
    module: &ast::Module<'a>,
    defined: impl Fn(&str) -> bool,
) -> Result<(), CheckError<'a>> {
    let mut names = HashSet::new();
    for rule in &module.rules {
        let name: &str = &rule.name;
        if defined(name) || !names.insert(name) {
            return Err(CheckError {
                error: CompileError::DuplicateRule {
                    name: name.to_string(),
                },
                span: rule.name.clone().map(|_| ()),
            });
        }
    }
    Ok(())
}

/// 检查整个模块
pub fn check_module<'a>(
    module: &ast::Module<'a>,
    defined: impl Fn(&str) -> bool,
) -> Result<(), CheckError<'a>> {
    check_rule_names(module, defined)
}
