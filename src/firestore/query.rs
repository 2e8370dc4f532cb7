//! Structured query clauses and compiler
//!
//! A query is a list of [`QueryClause`] tokens built with [`where_`],
//! [`order_by`], [`start`], [`end`], [`limit`] and [`offset`]. [`compile`]
//! folds them into one [`StructuredQuery`] ready for `:runQuery`.
//!
//! # REST Reference
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/StructuredQuery`
//! - `https://cloud.google.com/firestore/docs/reference/rest/v1/Cursor`

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::codec::encode;
use super::field_value::Value;
use super::native_value::NativeValue;
use crate::error::FirestoreError;

/// Field filter operator
///
/// Parsed from the symbols `==`, `!=`, `<`, `<=`, `>`, `>=`,
/// `array-contains`, `in` and `not-in`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Operator {
    /// `==`
    Equal,
    /// `!=`
    NotEqual,
    /// `<`
    LessThan,
    /// `<=`
    LessThanOrEqual,
    /// `>`
    GreaterThan,
    /// `>=`
    GreaterThanOrEqual,
    /// `array-contains`
    ArrayContains,
    /// `in`
    In,
    /// `not-in`
    NotIn,
}

impl Operator {
    /// Symbol this operator is written with
    pub fn symbol(&self) -> &'static str {
        match self {
            Operator::Equal => "==",
            Operator::NotEqual => "!=",
            Operator::LessThan => "<",
            Operator::LessThanOrEqual => "<=",
            Operator::GreaterThan => ">",
            Operator::GreaterThanOrEqual => ">=",
            Operator::ArrayContains => "array-contains",
            Operator::In => "in",
            Operator::NotIn => "not-in",
        }
    }
}

impl FromStr for Operator {
    type Err = FirestoreError;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        match symbol {
            "==" => Ok(Operator::Equal),
            "!=" => Ok(Operator::NotEqual),
            "<" => Ok(Operator::LessThan),
            "<=" => Ok(Operator::LessThanOrEqual),
            ">" => Ok(Operator::GreaterThan),
            ">=" => Ok(Operator::GreaterThanOrEqual),
            "array-contains" => Ok(Operator::ArrayContains),
            "in" => Ok(Operator::In),
            "not-in" => Ok(Operator::NotIn),
            other => Err(FirestoreError::InvalidArgument(format!(
                "unknown query operator: {}",
                other
            ))),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.symbol())
    }
}

/// Sort direction, `asc` or `desc`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Direction {
    /// `asc`
    #[default]
    Ascending,
    /// `desc`
    Descending,
}

impl FromStr for Direction {
    type Err = FirestoreError;

    fn from_str(symbol: &str) -> Result<Self, Self::Err> {
        match symbol {
            "asc" => Ok(Direction::Ascending),
            "desc" => Ok(Direction::Descending),
            other => Err(FirestoreError::InvalidArgument(format!(
                "unknown sort direction: {}",
                other
            ))),
        }
    }
}

/// Where a start cursor sits relative to the matching document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartMode {
    /// Include the matching document
    From,
    /// Skip past the matching document
    After,
}

/// Where an end cursor sits relative to the matching document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EndMode {
    /// Include the matching document
    To,
    /// Stop before the matching document
    Before,
}

/// `{"fieldPath": "a.b"}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FieldReference {
    /// Dotted field path
    pub field_path: String,
}

impl FieldReference {
    /// Reference a field by path
    pub fn new(field_path: impl Into<String>) -> Self {
        Self {
            field_path: field_path.into(),
        }
    }
}

/// Fields returned by a query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Projection {
    /// Selected fields; empty selects only document names
    #[serde(default)]
    pub fields: Vec<FieldReference>,
}

/// Collection a query reads from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CollectionSelector {
    /// Last segment of the collection path
    pub collection_id: String,
    /// Match every collection with this id, not only direct children of the parent
    pub all_descendants: bool,
}

/// Filter on a single field
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldFilter {
    /// Field to compare
    pub field: FieldReference,
    /// Comparison
    pub op: Operator,
    /// Right-hand side
    pub value: Value,
}

/// Operator joining composite filters
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum CompositeOperator {
    /// All filters must match
    And,
}

/// Several filters joined by one operator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompositeFilter {
    /// Join operator
    pub op: CompositeOperator,
    /// Joined filters
    pub filters: Vec<Filter>,
}

/// Query filter: a single field filter or a composite
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Filter {
    /// `{"fieldFilter": {...}}`
    #[serde(rename = "fieldFilter")]
    Field(FieldFilter),
    /// `{"compositeFilter": {...}}`
    #[serde(rename = "compositeFilter")]
    Composite(CompositeFilter),
}

/// One sort key
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Order {
    /// Field to sort on
    pub field: FieldReference,
    /// Sort direction
    pub direction: Direction,
}

/// Position in the result set
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Cursor {
    /// Values matched against the query's order-by fields
    #[serde(default)]
    pub values: Vec<Value>,
    /// Whether the position is just before the matching document
    #[serde(default)]
    pub before: bool,
}

/// Compiled query
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StructuredQuery {
    /// Projection, present only when fields were picked
    #[serde(skip_serializing_if = "Option::is_none")]
    pub select: Option<Projection>,

    /// Source collection
    pub from: Vec<CollectionSelector>,

    /// Filter, absent when no `where` clause was given
    #[serde(rename = "where", skip_serializing_if = "Option::is_none")]
    pub filter: Option<Filter>,

    /// Sort keys in the order given
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub order_by: Vec<Order>,

    /// Start cursor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_at: Option<Cursor>,

    /// End cursor
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end_at: Option<Cursor>,

    /// Maximum number of results
    #[serde(skip_serializing_if = "Option::is_none")]
    pub limit: Option<i32>,

    /// Number of results to skip
    #[serde(skip_serializing_if = "Option::is_none")]
    pub offset: Option<i32>,
}

/// Body of a `:runQuery` request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunQueryRequest {
    /// Query to run
    pub structured_query: StructuredQuery,
}

/// One query clause token
#[derive(Debug, Clone, PartialEq)]
pub enum QueryClause {
    /// Field filter; several are joined with `AND`
    Where(FieldFilter),
    /// Sort key; several sort in the order given
    OrderBy(Order),
    /// Start cursor, at most once per query
    StartAt(Cursor),
    /// End cursor, at most once per query
    EndAt(Cursor),
    /// Result limit; the last one given wins
    Limit(i32),
    /// Result offset; the last one given wins
    Offset(i32),
}

/// How repeated clauses of one kind combine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClausePolicy {
    /// Every occurrence is kept, in order
    Accumulate,
    /// The last occurrence replaces earlier ones
    Overwrite,
    /// A second occurrence is a validation error
    RejectDuplicate,
}

impl QueryClause {
    /// Name used in validation messages
    pub fn name(&self) -> &'static str {
        match self {
            QueryClause::Where(_) => "where",
            QueryClause::OrderBy(_) => "orderBy",
            QueryClause::StartAt(_) => "start",
            QueryClause::EndAt(_) => "end",
            QueryClause::Limit(_) => "limit",
            QueryClause::Offset(_) => "offset",
        }
    }

    /// Combination policy for this clause kind
    pub fn policy(&self) -> ClausePolicy {
        match self {
            QueryClause::Where(_) | QueryClause::OrderBy(_) => ClausePolicy::Accumulate,
            QueryClause::Limit(_) | QueryClause::Offset(_) => ClausePolicy::Overwrite,
            QueryClause::StartAt(_) | QueryClause::EndAt(_) => ClausePolicy::RejectDuplicate,
        }
    }
}

/// Filter documents where `field op value` holds
///
/// `where` is a keyword, hence the trailing underscore.
pub fn where_(field: impl Into<String>, op: Operator, value: impl Into<NativeValue>) -> QueryClause {
    QueryClause::Where(FieldFilter {
        field: FieldReference::new(field),
        op,
        value: encode(&value.into()),
    })
}

/// Sort ascending on `field`
pub fn order_by(field: impl Into<String>) -> QueryClause {
    order_by_direction(field, Direction::default())
}

/// Sort on `field` in the given direction
pub fn order_by_direction(field: impl Into<String>, direction: Direction) -> QueryClause {
    QueryClause::OrderBy(Order {
        field: FieldReference::new(field),
        direction,
    })
}

/// Start the results at (`From`) or after (`After`) the given order-by values
pub fn start<I, V>(mode: StartMode, values: I) -> QueryClause
where
    I: IntoIterator<Item = V>,
    V: Into<NativeValue>,
{
    QueryClause::StartAt(Cursor {
        values: encode_cursor_values(values),
        before: mode == StartMode::From,
    })
}

/// End the results at (`To`) or before (`Before`) the given order-by values
pub fn end<I, V>(mode: EndMode, values: I) -> QueryClause
where
    I: IntoIterator<Item = V>,
    V: Into<NativeValue>,
{
    QueryClause::EndAt(Cursor {
        values: encode_cursor_values(values),
        before: mode == EndMode::Before,
    })
}

/// Return at most `count` results
pub fn limit(count: i32) -> QueryClause {
    QueryClause::Limit(count)
}

/// Skip the first `count` results
pub fn offset(count: i32) -> QueryClause {
    QueryClause::Offset(count)
}

fn encode_cursor_values<I, V>(values: I) -> Vec<Value>
where
    I: IntoIterator<Item = V>,
    V: Into<NativeValue>,
{
    values.into_iter().map(|v| encode(&v.into())).collect()
}

/// Compile clause tokens into a `:runQuery` body
///
/// `source_path` is the collection path; its last segment becomes the
/// `from` collection id. `picks` becomes the projection. Fails with
/// [`FirestoreError::DuplicateClause`] on a repeated `start` or `end`.
pub fn compile<I>(
    source_path: &str,
    clauses: I,
    picks: Option<&[String]>,
    all_descendants: bool,
) -> Result<RunQueryRequest, FirestoreError>
where
    I: IntoIterator<Item = QueryClause>,
{
    let mut query = StructuredQuery::default();
    let mut filters = Vec::new();

    for clause in clauses {
        let policy = clause.policy();
        let name = clause.name();
        match clause {
            QueryClause::Where(filter) => filters.push(Filter::Field(filter)),
            QueryClause::OrderBy(order) => query.order_by.push(order),
            QueryClause::Limit(count) => place(&mut query.limit, count, policy, name)?,
            QueryClause::Offset(count) => place(&mut query.offset, count, policy, name)?,
            QueryClause::StartAt(cursor) => place(&mut query.start_at, cursor, policy, name)?,
            QueryClause::EndAt(cursor) => place(&mut query.end_at, cursor, policy, name)?,
        }
    }

    query.from = vec![CollectionSelector {
        collection_id: collection_id(source_path).to_string(),
        all_descendants,
    }];

    query.select = picks.map(|fields| Projection {
        fields: fields.iter().map(FieldReference::new).collect(),
    });

    query.filter = match filters.len() {
        0 => None,
        1 => filters.pop(),
        _ => Some(Filter::Composite(CompositeFilter {
            op: CompositeOperator::And,
            filters,
        })),
    };

    Ok(RunQueryRequest {
        structured_query: query,
    })
}

/// Fill a single-valued slot according to the clause policy
fn place<T>(
    slot: &mut Option<T>,
    value: T,
    policy: ClausePolicy,
    clause: &'static str,
) -> Result<(), FirestoreError> {
    // Reject before overwriting (error cases first)
    if policy == ClausePolicy::RejectDuplicate && slot.is_some() {
        return Err(FirestoreError::DuplicateClause { clause });
    }

    *slot = Some(value);
    Ok(())
}

fn collection_id(source_path: &str) -> &str {
    source_path
        .trim_end_matches('/')
        .rsplit('/')
        .next()
        .unwrap_or(source_path)
}
