use std::fmt;

use crate::types::{FieldIndex, value::{FieldType, Value}};

/// Comparison opcodes. Negated forms are expressed as `Expr::Not`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CompareOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
    Like,
    In,
    IsNull,
}

impl CompareOp {
    /// Operations allowed on STRING fields.
    pub fn accepts_string(&self) -> bool {
        matches!(
            self,
            CompareOp::Eq | CompareOp::Ne | CompareOp::Like | CompareOp::In | CompareOp::IsNull
        )
    }
}

impl fmt::Display for CompareOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Like => "LIKE",
            CompareOp::In => "IN",
            CompareOp::IsNull => "IS NULL",
        };
        f.write_str(text)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Operand {
    None,
    Value(Value),
    List(Vec<Value>),
}

/// A comparison of one record field against the compiled operand.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldOp {
    pub field_index: FieldIndex,
    pub field_name: String,
    pub field_type: FieldType,
    pub op: CompareOp,
    pub operand: Operand,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    Field(FieldOp),
}

impl Expr {
    pub fn and(left: Expr, right: Expr) -> Self {
        Expr::And(Box::new(left), Box::new(right))
    }

    pub fn or(left: Expr, right: Expr) -> Self {
        Expr::Or(Box::new(left), Box::new(right))
    }

    pub fn negate(expr: Expr) -> Self {
        Expr::Not(Box::new(expr))
    }

    pub fn is_logical(&self) -> bool {
        !matches!(self, Expr::Field(_))
    }

    /// Indices of every field referenced by the tree, in visit order.
    pub fn referenced_fields(&self) -> Vec<FieldIndex> {
        let mut out = Vec::new();
        self.collect_fields(&mut out);
        out
    }

    fn collect_fields(&self, out: &mut Vec<FieldIndex>) {
        match self {
            Expr::And(l, r) | Expr::Or(l, r) => {
                l.collect_fields(out);
                r.collect_fields(out);
            }
            Expr::Not(inner) => inner.collect_fields(out),
            Expr::Field(op) => {
                if !out.contains(&op.field_index) {
                    out.push(op.field_index);
                }
            }
        }
    }

    fn dump(&self, f: &mut fmt::Formatter<'_>, depth: usize) -> fmt::Result {
        let indent = "  ".repeat(depth);
        match self {
            Expr::And(l, r) | Expr::Or(l, r) => {
                let name = if matches!(self, Expr::And(..)) { "AND" } else { "OR" };
                writeln!(f, "{}{}", indent, name)?;
                l.dump(f, depth + 1)?;
                r.dump(f, depth + 1)
            }
            Expr::Not(inner) => {
                writeln!(f, "{}NOT", indent)?;
                inner.dump(f, depth + 1)
            }
            Expr::Field(op) => {
                write!(
                    f,
                    "{}Field {} ({}, {}) {}",
                    indent, op.field_index, op.field_name, op.field_type, op.op
                )?;
                match &op.operand {
                    Operand::None => writeln!(f),
                    Operand::Value(v) => writeln!(f, " {}", quoted(v)),
                    Operand::List(items) => {
                        let items: Vec<String> = items.iter().map(quoted).collect();
                        writeln!(f, " ({})", items.join(", "))
                    }
                }
            }
        }
    }
}

fn quoted(value: &Value) -> String {
    match value {
        Value::String(s) => format!("\"{}\"", s),
        other => other.to_string(),
    }
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.dump(f, 0)
    }
}
