use log::trace;

use crate::{
    planner::{
        error::{Result, SqlError},
        expression::{CompareOp, Expr, FieldOp, Operand},
        token::{Token, TokenCursor, tokenize},
        types::FieldList,
    },
    types::value::{FieldType, Value},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Chain {
    And,
    Or,
}

/// Compiles a WHERE clause against `fields`.
///
/// Evaluation order is strictly left to right: there is no precedence
/// between AND and OR, and an un-bracketed chain must use one of them
/// throughout. `NOT` applies to the rest of the chain it starts.
pub fn compile_where(text: &str, fields: &FieldList) -> Result<Expr> {
    let tokens = tokenize(text)?;
    compile_tokens(&tokens, fields)
}

pub fn compile_tokens(tokens: &[Token], fields: &FieldList) -> Result<Expr> {
    if tokens.is_empty() {
        return Err(SqlError::EmptyExpression);
    }

    let mut compiler = Compiler {
        cursor: TokenCursor::new(tokens),
        fields,
    };
    let expr = compiler.parse_chain()?;
    if !compiler.cursor.is_at_end() {
        return Err(SqlError::ExtraTokens(compiler.cursor.remaining()));
    }
    Ok(expr)
}

struct Compiler<'a> {
    cursor: TokenCursor<'a>,
    fields: &'a FieldList,
}

fn is_punct(token: &Token, text: &str) -> bool {
    !token.is_literal && token.text == text
}

fn is_comparison_word(token: &Token) -> bool {
    if token.is_literal {
        return false;
    }
    matches!(token.text.as_str(), "=" | "==" | "!=" | "<>" | "<" | "<=" | ">" | ">=")
        || ["LIKE", "IN", "IS"].iter().any(|k| token.is_keyword(k))
}

/// Numeric literals must start like a number.
fn looks_numeric(text: &str) -> bool {
    text.chars()
        .next()
        .is_some_and(|c| c.is_ascii_digit() || matches!(c, '-' | '+' | '.'))
}

impl<'a> Compiler<'a> {
    /// operand (AND operand)* | operand (OR operand)*, folded right-leaning.
    fn parse_chain(&mut self) -> Result<Expr> {
        let mut operands = vec![self.parse_operand()?];
        let mut chain: Option<Chain> = None;

        while let Some(token) = self.cursor.peek() {
            if is_punct(token, ")") {
                break;
            }

            let kind = if token.is_keyword("AND") {
                Chain::And
            } else if token.is_keyword("OR") {
                Chain::Or
            } else if is_comparison_word(token) {
                return Err(SqlError::LogicalWithNonLogicalOperand);
            } else {
                return Err(SqlError::UnknownOperation(token.text.clone()));
            };

            match chain {
                None => chain = Some(kind),
                Some(existing) if existing != kind => {
                    return Err(SqlError::MixedLogicalChain(token.text.clone()));
                }
                Some(_) => {}
            }
            trace!("Chaining {:?} at token {}", kind, self.cursor.position());
            self.cursor.advance();
            operands.push(self.parse_operand()?);
        }

        let mut folded = operands.pop().ok_or(SqlError::NotEnoughTokens)?;
        while let Some(left) = operands.pop() {
            folded = match chain {
                Some(Chain::Or) => Expr::or(left, folded),
                _ => Expr::and(left, folded),
            };
        }
        Ok(folded)
    }

    /// `( chain )`, `NOT chain` or a single field comparison.
    fn parse_operand(&mut self) -> Result<Expr> {
        let token = self.cursor.expect_any()?;

        if is_punct(token, "(") {
            let inner = self.parse_chain()?;
            return match self.cursor.advance() {
                Some(t) if is_punct(t, ")") => Ok(inner),
                _ => Err(SqlError::UnclosedBrackets),
            };
        }

        if token.is_keyword("NOT") {
            let inner = self.parse_chain()?;
            return Ok(Expr::negate(inner));
        }

        self.parse_comparison(token)
    }

    fn parse_comparison(&mut self, field_token: &Token) -> Result<Expr> {
        let field_index = self
            .fields
            .find(&field_token.text)
            .ok_or_else(|| SqlError::UnknownField(field_token.text.clone()))?;
        let (field_name, field_type) = match self.fields.get(field_index) {
            Some(def) => (def.name.clone(), def.field_type),
            None => return Err(SqlError::UnknownField(field_token.text.clone())),
        };

        let (op, negated, op_text) = self.parse_operator()?;
        trace!("Field {} ({}) {}", field_name, field_type, op_text);

        if field_type == FieldType::String && !op.accepts_string() {
            return Err(SqlError::TypeMismatch {
                field: field_name,
                field_type,
                operation: op_text,
            });
        }
        if field_type.is_numeric() && op == CompareOp::Like {
            return Err(SqlError::TypeMismatch {
                field: field_name,
                field_type,
                operation: op_text,
            });
        }

        let operand = match op {
            CompareOp::IsNull => Operand::None,
            CompareOp::In => Operand::List(self.parse_in_list(&field_name, field_type)?),
            _ => {
                let literal = self.cursor.expect_any()?;
                Operand::Value(Self::convert_literal(&field_name, field_type, literal)?)
            }
        };

        let expr = Expr::Field(FieldOp {
            field_index,
            field_name,
            field_type,
            op,
            operand,
        });
        Ok(if negated { Expr::negate(expr) } else { expr })
    }

    /// Returns the positive opcode, whether it was negated, and the
    /// operator text for messages.
    fn parse_operator(&mut self) -> Result<(CompareOp, bool, String)> {
        let token = self.cursor.expect_any()?;

        if token.is_keyword("NOT") {
            let next = self.cursor.expect_any()?;
            return if next.is_keyword("LIKE") {
                Ok((CompareOp::Like, true, "NOT LIKE".to_string()))
            } else if next.is_keyword("IN") {
                Ok((CompareOp::In, true, "NOT IN".to_string()))
            } else {
                Err(SqlError::UnknownOperation(format!("NOT {}", next.text)))
            };
        }

        if token.is_keyword("IS") {
            let negated = self.cursor.eat_keyword("NOT");
            let next = self.cursor.expect_any()?;
            if !next.is_keyword("NULL") {
                return Err(SqlError::UnknownOperation(format!("IS {}", next.text)));
            }
            let text = if negated { "IS NOT NULL" } else { "IS NULL" };
            return Ok((CompareOp::IsNull, negated, text.to_string()));
        }

        if token.is_keyword("LIKE") {
            return Ok((CompareOp::Like, false, "LIKE".to_string()));
        }
        if token.is_keyword("IN") {
            return Ok((CompareOp::In, false, "IN".to_string()));
        }

        let op = match (token.is_literal, token.text.as_str()) {
            (false, "=") | (false, "==") => CompareOp::Eq,
            (false, "!=") | (false, "<>") => CompareOp::Ne,
            (false, "<") => CompareOp::Lt,
            (false, "<=") => CompareOp::Le,
            (false, ">") => CompareOp::Gt,
            (false, ">=") => CompareOp::Ge,
            _ => return Err(SqlError::UnknownOperation(token.text.clone())),
        };
        Ok((op, false, token.text.clone()))
    }

    fn parse_in_list(&mut self, field_name: &str, field_type: FieldType) -> Result<Vec<Value>> {
        match self.cursor.advance() {
            Some(t) if is_punct(t, "(") => {}
            _ => return Err(SqlError::InList("IN argument doesn't start with '('.".to_string())),
        }

        let mut items = Vec::new();
        loop {
            let item = self
                .cursor
                .advance()
                .ok_or_else(|| SqlError::InList("Missing ')' to close IN list.".to_string()))?;
            if is_punct(item, ")") {
                if items.is_empty() {
                    return Err(SqlError::InList("Empty IN list.".to_string()));
                }
                return Err(SqlError::InList(
                    "Missing value after ',' in IN list.".to_string(),
                ));
            }
            items.push(Self::convert_literal(field_name, field_type, item)?);

            match self.cursor.advance() {
                Some(t) if is_punct(t, ",") => continue,
                Some(t) if is_punct(t, ")") => break,
                Some(t) => {
                    return Err(SqlError::InList(format!(
                        "Missing ',' or ')' after IN list item, got `{}'.",
                        t.text
                    )));
                }
                None => {
                    return Err(SqlError::InList("Missing ')' to close IN list.".to_string()));
                }
            }
        }
        Ok(items)
    }

    fn convert_literal(field_name: &str, field_type: FieldType, literal: &Token) -> Result<Value> {
        if field_type.is_numeric() && !looks_numeric(&literal.text) {
            return Err(SqlError::NonNumericLiteral {
                field: field_name.to_string(),
                literal: literal.text.clone(),
            });
        }
        Ok(Value::from_literal(&literal.text, field_type))
    }
}
