//! Integer constant folding, enough for array lengths and `iota` sequences.

use gs_core::ast::*;

use crate::typing::scope::{ObjectKind, ScopeId};
use crate::Checker;

/// Parse a Go integer literal: decimal, `0x`, `0o`, legacy octal, `0b`, with `_` separators.
pub(crate) fn parse_int(literal: &str) -> Option<i128> {
    let digits: String = literal.chars().filter(|c| *c != '_').collect();
    let lower = digits.to_ascii_lowercase();
    let (radix, body) = if let Some(rest) = lower.strip_prefix("0x") {
        (16, rest)
    } else if let Some(rest) = lower.strip_prefix("0b") {
        (2, rest)
    } else if let Some(rest) = lower.strip_prefix("0o") {
        (8, rest)
    } else if lower.len() > 1 && lower.starts_with('0') {
        (8, &lower[1..])
    } else {
        (10, lower.as_str())
    };
    i128::from_str_radix(body, radix).ok()
}

/// Value of a rune literal such as `'a'`, `'\n'` or `'\x41'`.
pub(crate) fn parse_char(literal: &str) -> Option<i128> {
    let inner = literal.strip_prefix('\'')?.strip_suffix('\'')?;
    let mut chars = inner.chars();
    let first = chars.next()?;
    if first != '\\' {
        return Some(first as i128);
    }
    let escape = chars.next()?;
    let rest: String = chars.collect();
    Some(match escape {
        'a' => 7,
        'b' => 8,
        'f' => 12,
        'n' => 10,
        'r' => 13,
        't' => 9,
        'v' => 11,
        '\\' => '\\' as i128,
        '\'' => '\'' as i128,
        '"' => '"' as i128,
        'x' | 'u' | 'U' => i128::from_str_radix(&rest, 16).ok()?,
        digit @ '0'..='7' => i128::from_str_radix(&format!("{digit}{rest}"), 8).ok()?,
        _ => return None,
    })
}

impl<'c, 'e> Checker<'c, 'e> {
    /// Integer value of a constant expression whose operands were already
    /// resolved, or `None` when it is not an integer constant.
    pub(crate) fn const_int(&self, expr: &Expr, scope: ScopeId) -> Option<i128> {
        match &expr.kind {
            ExprKind::BasicLit(lit) => match lit.kind {
                LitKind::Int => parse_int(&lit.value),
                LitKind::Char => parse_char(&lit.value),
                _ => None,
            },
            ExprKind::Paren(inner) => self.const_int(inner, scope),
            ExprKind::Ident(ident) => {
                let (_, id) = self.tree().lookup_parent(scope, &ident.name)?;
                match self.tree().object(id).kind {
                    ObjectKind::Const { value } => value,
                    ObjectKind::Iota => self.iota,
                    _ => None,
                }
            }
            ExprKind::Selector(selector) => {
                let package = selector.x.as_ident()?;
                let (_, id) = self.tree().lookup_parent(scope, &package.name)?;
                let ObjectKind::PkgName { scope, .. } = self.tree().object(id).kind else {
                    return None;
                };
                let id = self.tree().lookup(scope, &selector.sel.name)?;
                match self.tree().object(id).kind {
                    ObjectKind::Const { value } => value,
                    _ => None,
                }
            }
            ExprKind::Unary(unary) => {
                let x = self.const_int(&unary.x, scope)?;
                match unary.op {
                    UnaryOp::Pos => Some(x),
                    UnaryOp::Neg => x.checked_neg(),
                    UnaryOp::Xor => Some(!x),
                    _ => None,
                }
            }
            ExprKind::Binary(binary) => {
                let x = self.const_int(&binary.x, scope)?;
                let y = self.const_int(&binary.y, scope)?;
                match binary.op {
                    BinaryOp::Add => x.checked_add(y),
                    BinaryOp::Sub => x.checked_sub(y),
                    BinaryOp::Mul => x.checked_mul(y),
                    BinaryOp::Quo => x.checked_div(y),
                    BinaryOp::Rem => x.checked_rem(y),
                    BinaryOp::And => Some(x & y),
                    BinaryOp::Or => Some(x | y),
                    BinaryOp::Xor => Some(x ^ y),
                    BinaryOp::AndNot => Some(x & !y),
                    BinaryOp::Shl => u32::try_from(y).ok().and_then(|y| x.checked_shl(y)),
                    BinaryOp::Shr => u32::try_from(y).ok().and_then(|y| x.checked_shr(y)),
                    _ => None,
                }
            }
            // Conversions such as `Duration(5)` keep the value.
            ExprKind::Call(call) if call.args.len() == 1 => self.const_int(&call.args[0], scope),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literals_in_every_base() {
        assert_eq!(parse_int("42"), Some(42));
        assert_eq!(parse_int("0x2A"), Some(42));
        assert_eq!(parse_int("0o52"), Some(42));
        assert_eq!(parse_int("052"), Some(42));
        assert_eq!(parse_int("0b101010"), Some(42));
        assert_eq!(parse_int("1_000"), Some(1000));
        assert_eq!(parse_int("0"), Some(0));
    }

    #[test]
    fn rune_literals() {
        assert_eq!(parse_char("'a'"), Some(97));
        assert_eq!(parse_char("'\\n'"), Some(10));
        assert_eq!(parse_char("'\\x41'"), Some(65));
        assert_eq!(parse_char("'\\101'"), Some(65));
        assert_eq!(parse_char("'é'"), Some(233));
    }
}
