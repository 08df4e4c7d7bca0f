use crate::types::value::FieldType;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SqlError {
    #[error("Not enough tokens to complete expression.")]
    NotEnoughTokens,
    #[error("Empty WHERE expression.")]
    EmptyExpression,
    #[error("Failed to identify field:{0}")]
    UnknownField(String),
    #[error("Failed to identify operation:{0}")]
    UnknownOperation(String),
    #[error("Used logical operation with non-logical operand.")]
    LogicalWithNonLogicalOperand,
    #[error("Attempt to use {field_type} field `{field}' with operation `{operation}'.")]
    TypeMismatch {
        field: String,
        field_type: FieldType,
        operation: String,
    },
    #[error("Attempt to compare numeric field `{field}' to non-numeric value `{literal}' is illegal.")]
    NonNumericLiteral { field: String, literal: String },
    #[error("{0}")]
    InList(String),
    #[error("Unclosed brackets, or incomplete expression.")]
    UnclosedBrackets,
    #[error("Mixed AND/OR operators without brackets at `{0}'; use brackets to make precedence explicit.")]
    MixedLogicalChain(String),
    #[error("Syntax error, {0} extra tokens")]
    ExtraTokens(usize),
    #[error("Unterminated string literal starting at offset {0}.")]
    UnterminatedString(usize),

    #[error("Missing keyword SELECT")]
    MissingSelect,
    #[error("Missing comma after column {0} in SELECT statement.")]
    MissingComma(String),
    #[error("Missing closing bracket in field function.")]
    MissingFunctionBracket,
    #[error("Missing FROM clause in SELECT statement.")]
    MissingFrom,
    #[error("Missing table name in FROM clause.")]
    MissingTableName,
    #[error("ORDER BY clause missing BY keyword.")]
    MissingOrderBy,
    #[error("Failed to parse SELECT statement, extra input at {0} token.")]
    ExtraInput(String),
    #[error("SELECT statement has no columns.")]
    NoColumns,

    #[error("Unrecognised field function {0}.")]
    UnknownFunction(String),
    #[error("Use of field function {func}() on string field {field} illegal.")]
    StringFieldFunction { func: String, field: String },
    #[error("Unrecognised field name {0}.")]
    UnknownColumn(String),
    #[error("Unrecognised field name {0} in ORDER BY.")]
    UnknownOrderField(String),
    #[error("Field list implies mixture of regular recordset mode, summary mode or distinct field list mode.")]
    MixedQueryMode,
    #[error("SELECTing more than one DISTINCT field is a query not supported.")]
    MultipleDistinct,
    #[error("Can't ORDER BY a DISTINCT list by more than one key.")]
    DistinctOrderByMultipleKeys,
    #[error("Only selected DISTINCT field can be used for ORDER BY.")]
    DistinctOrderByField,

    #[error("Column index {0} out of range.")]
    ColumnOutOfRange(usize),
    #[error("Cannot summarize custom field function {0}.")]
    CustomFunctionSummary(String),
    #[error("Statement has not been parsed against a field list.")]
    NotParsed,
}

pub type Result<T> = std::result::Result<T, SqlError>;
