use std::fmt;

use log::debug;

use crate::{
    executor::summary::ColumnSummary,
    planner::{
        compiler::compile_where,
        error::{Result, SqlError},
        expression::Expr,
        token::{Token, TokenCursor, tokenize},
        types::{ColumnDef, ColumnFunc, FieldList, OrderDef, ParseFlags, QueryMode},
    },
    types::value::FieldType,
};

/// A SELECT statement, first checked structurally by `preparse` and then
/// resolved against a field list by `parse`.
#[derive(Debug, Clone)]
pub struct SelectStatement {
    pub raw_select: String,
    pub columns: Vec<ColumnDef>,
    pub table_name: String,
    pub where_clause: Option<String>,
    pub where_expr: Option<Expr>,
    pub order_defs: Vec<OrderDef>,
    pub query_mode: QueryMode,
    pub(crate) summaries: Vec<ColumnSummary>,
    parsed: bool,
}

fn is_punct(token: &Token, text: &str) -> bool {
    !token.is_literal && token.text == text
}

impl SelectStatement {
    /// Splits `SELECT cols FROM table [WHERE ...] [ORDER BY ...]` without
    /// needing the schema.
    pub fn preparse(sql: &str) -> Result<Self> {
        let tokens = tokenize(sql)?;
        let mut cursor = TokenCursor::new(&tokens);

        if !cursor.eat_keyword("SELECT") {
            return Err(SqlError::MissingSelect);
        }

        let mut columns: Vec<ColumnDef> = Vec::new();
        loop {
            match cursor.peek() {
                None => return Err(SqlError::MissingFrom),
                Some(t) if t.is_keyword("FROM") => break,
                Some(_) => {}
            }

            if let Some(last) = columns.last() {
                match cursor.peek() {
                    Some(t) if is_punct(t, ",") => {
                        cursor.advance();
                    }
                    _ => return Err(SqlError::MissingComma(last.field_name.clone())),
                }
            }

            columns.push(Self::preparse_column(&mut cursor)?);
        }

        if columns.is_empty() {
            return Err(SqlError::NoColumns);
        }
        cursor.advance(); // FROM

        let table_name = match cursor.advance() {
            Some(t) => t.text.clone(),
            None => return Err(SqlError::MissingTableName),
        };

        let mut where_clause = None;
        if cursor.eat_keyword("WHERE") {
            let start = cursor.peek().map(|t| t.offset).ok_or(SqlError::EmptyExpression)?;
            while let Some(t) = cursor.peek() {
                if t.is_keyword("ORDER") {
                    break;
                }
                cursor.advance();
            }
            let end = cursor.peek().map_or(sql.len(), |t| t.offset);
            let text = sql[start..end].trim();
            if text.is_empty() {
                return Err(SqlError::EmptyExpression);
            }
            where_clause = Some(text.to_string());
        }

        let mut order_defs = Vec::new();
        if cursor.eat_keyword("ORDER") {
            if !cursor.eat_keyword("BY") {
                return Err(SqlError::MissingOrderBy);
            }
            loop {
                let field = cursor.expect_any()?;
                let mut ascending = true;
                if cursor.eat_keyword("DESC") {
                    ascending = false;
                } else {
                    cursor.eat_keyword("ASC");
                }
                order_defs.push(OrderDef {
                    field_name: field.text.clone(),
                    field_index: None,
                    ascending,
                });

                match cursor.peek() {
                    Some(t) if is_punct(t, ",") => {
                        cursor.advance();
                    }
                    _ => break,
                }
            }
        }

        if let Some(extra) = cursor.peek() {
            return Err(SqlError::ExtraInput(extra.text.clone()));
        }

        Ok(Self {
            raw_select: sql.to_string(),
            columns,
            table_name,
            where_clause,
            where_expr: None,
            order_defs,
            query_mode: QueryMode::Recordset,
            summaries: Vec::new(),
            parsed: false,
        })
    }

    /// `FUNC([DISTINCT] field)`, `DISTINCT field` or `field`.
    fn preparse_column(cursor: &mut TokenCursor<'_>) -> Result<ColumnDef> {
        let token = cursor.expect_any()?;

        if !token.is_literal && cursor.peek().is_some_and(|t| is_punct(t, "(")) {
            cursor.advance();
            let distinct = cursor.eat_keyword("DISTINCT");
            let field = cursor.advance().ok_or(SqlError::MissingFunctionBracket)?;
            match cursor.advance() {
                Some(t) if is_punct(t, ")") => {}
                _ => return Err(SqlError::MissingFunctionBracket),
            }

            let mut column = ColumnDef::new(field.text.clone());
            column.func_name = Some(token.text.clone());
            column.distinct = distinct;
            return Ok(column);
        }

        if token.is_keyword("DISTINCT") {
            let field = cursor.advance().ok_or(SqlError::MissingFrom)?;
            let mut column = ColumnDef::new(field.text.clone());
            column.distinct = true;
            return Ok(column);
        }

        Ok(ColumnDef::new(token.text.clone()))
    }

    /// Resolves columns, functions and ORDER BY keys against `fields`,
    /// settles the query mode and compiles the WHERE clause.
    pub fn parse(&mut self, fields: &FieldList, flags: ParseFlags) -> Result<()> {
        self.expand_star(fields);

        for column in self.columns.iter_mut() {
            let field_index = fields.find(&column.field_name);
            column.field_index = field_index;
            column.field_type = field_index
                .and_then(|i| fields.get(i))
                .map_or(FieldType::Integer, |def| def.field_type);

            column.func = match &column.func_name {
                None => None,
                Some(name) => {
                    let func = ColumnFunc::from_name(name);
                    if func.is_custom() && !flags.contains(ParseFlags::ALLOW_UNDEFINED_COL_FUNCS) {
                        return Err(SqlError::UnknownFunction(name.clone()));
                    }
                    if func.requires_numeric() && column.field_type == FieldType::String {
                        return Err(SqlError::StringFieldFunction {
                            func: name.clone(),
                            field: column.field_name.clone(),
                        });
                    }
                    Some(func)
                }
            };

            if field_index.is_none() && column.func != Some(ColumnFunc::Count) {
                return Err(SqlError::UnknownColumn(column.field_name.clone()));
            }
        }

        self.query_mode = self.resolve_query_mode()?;
        if self.query_mode == QueryMode::DistinctList && self.columns.len() > 1 {
            return Err(SqlError::MultipleDistinct);
        }

        for order in self.order_defs.iter_mut() {
            order.field_index = Some(
                fields
                    .find(&order.field_name)
                    .ok_or_else(|| SqlError::UnknownOrderField(order.field_name.clone()))?,
            );
        }
        if self.query_mode == QueryMode::DistinctList {
            self.check_distinct_order()?;
        }

        self.where_expr = match &self.where_clause {
            Some(text) => Some(compile_where(text, fields)?),
            None => None,
        };

        self.summaries.clear();
        self.parsed = true;
        debug!(
            "Parsed SELECT on {} with {} columns in {} mode",
            self.table_name,
            self.columns.len(),
            self.query_mode
        );
        Ok(())
    }

    fn expand_star(&mut self, fields: &FieldList) {
        let is_star = self.columns.len() == 1
            && self.columns[0].field_name == "*"
            && self.columns[0].func_name.is_none()
            && !self.columns[0].distinct;
        if is_star {
            self.columns = fields.iter().map(|f| ColumnDef::new(f.name.clone())).collect();
        }
    }

    /// Custom functions do not vote; everything else must agree.
    fn resolve_query_mode(&self) -> Result<QueryMode> {
        let mut mode: Option<QueryMode> = None;
        for column in &self.columns {
            let this_mode = match &column.func {
                Some(ColumnFunc::Custom(_)) => continue,
                Some(_) => QueryMode::Summary,
                None if column.distinct => QueryMode::DistinctList,
                None => QueryMode::Recordset,
            };
            match mode {
                Some(existing) if existing != this_mode => return Err(SqlError::MixedQueryMode),
                _ => mode = Some(this_mode),
            }
        }
        Ok(mode.unwrap_or(QueryMode::Recordset))
    }

    pub(crate) fn check_distinct_order(&self) -> Result<()> {
        if self.order_defs.is_empty() {
            return Ok(());
        }
        if self.order_defs.len() > 1 {
            return Err(SqlError::DistinctOrderByMultipleKeys);
        }
        let selected = self.columns.first().and_then(|c| c.field_index);
        if self.order_defs[0].field_index != selected {
            return Err(SqlError::DistinctOrderByField);
        }
        Ok(())
    }

    pub fn is_parsed(&self) -> bool {
        self.parsed
    }

    pub fn column_count(&self) -> usize {
        self.columns.len()
    }
}

impl fmt::Display for SelectStatement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "SELECT ({} mode)", self.query_mode)?;
        for (i, column) in self.columns.iter().enumerate() {
            let index = column
                .field_index
                .map_or_else(|| "-".to_string(), |idx| idx.to_string());
            writeln!(f, "  column {}: {} [field {}, {}]", i, column, index, column.field_type)?;
        }
        writeln!(f, "FROM {}", self.table_name)?;
        if let Some(expr) = &self.where_expr {
            writeln!(f, "WHERE")?;
            write!(f, "{}", expr)?;
        } else if let Some(text) = &self.where_clause {
            writeln!(f, "WHERE {}", text)?;
        }
        for order in &self.order_defs {
            writeln!(
                f,
                "ORDER BY {} {}",
                order.field_name,
                if order.ascending { "ASC" } else { "DESC" }
            )?;
        }
        Ok(())
    }
}
