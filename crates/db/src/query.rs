//! Collection queries and their composition from typed filters.
//!
//! A [`CollectionQuery`] names one collection, a column projection and a list
//! of predicates that the store combines with logical AND. Filters turn into
//! queries through [`ToQuery`]; each set field contributes one equality
//! predicate and unset fields contribute nothing.

use crate::error::{StoreError, StoreResult};
use crate::models::{ParticipantFilter, PoiFilter, RouteFilter};
use crate::schema;

/// A value that can be compared against a column in the store.
pub trait FilterLiteral {
    /// Render the value the way the store expects it in a predicate.
    fn to_literal(&self) -> String;
}

impl FilterLiteral for str {
    fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl FilterLiteral for String {
    fn to_literal(&self) -> String {
        self.clone()
    }
}

impl FilterLiteral for bool {
    fn to_literal(&self) -> String {
        // Lowercase word form, as the store parses booleans.
        self.to_string()
    }
}

impl FilterLiteral for i64 {
    fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl FilterLiteral for i32 {
    fn to_literal(&self) -> String {
        self.to_string()
    }
}

impl<T: FilterLiteral + ?Sized> FilterLiteral for &T {
    fn to_literal(&self) -> String {
        (**self).to_literal()
    }
}

/// A single condition on a column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Predicate {
    Eq { column: String, literal: String },
    In { column: String, literals: Vec<String> },
}

impl Predicate {
    /// Column the predicate constrains.
    pub fn column(&self) -> &str {
        match self {
            Predicate::Eq { column, .. } | Predicate::In { column, .. } => column,
        }
    }

    fn to_param(&self) -> (String, String) {
        match self {
            Predicate::Eq { column, literal } => (column.clone(), format!("eq.{}", literal)),
            Predicate::In { column, literals } => {
                let list = literals
                    .iter()
                    .map(|literal| quote_list_item(literal))
                    .collect::<Vec<_>>()
                    .join(",");
                (column.clone(), format!("in.({})", list))
            }
        }
    }
}

/// How many rows the caller expects back.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cardinality {
    Many,
    /// Exactly one row; anything else is an error.
    Single,
}

/// A filtered read against one named collection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CollectionQuery {
    collection: String,
    columns: Vec<String>,
    predicates: Vec<Predicate>,
    cardinality: Cardinality,
}

impl CollectionQuery {
    /// Start a query that selects every column of `collection`.
    pub fn from(collection: &str) -> Self {
        Self {
            collection: collection.to_string(),
            columns: Vec::new(),
            predicates: Vec::new(),
            cardinality: Cardinality::Many,
        }
    }

    /// Project only the given columns.
    pub fn select(mut self, columns: &[&str]) -> Self {
        self.columns = columns.iter().map(|c| c.to_string()).collect();
        self
    }

    /// Require `column` to equal `value`.
    pub fn eq<V: FilterLiteral>(mut self, column: &str, value: V) -> Self {
        self.predicates.push(Predicate::Eq {
            column: column.to_string(),
            literal: value.to_literal(),
        });
        self
    }

    /// Require `column` to equal `value` when a value is present.
    pub fn eq_opt<V: FilterLiteral>(self, column: &str, value: Option<V>) -> Self {
        match value {
            Some(value) => self.eq(column, value),
            None => self,
        }
    }

    /// Require `column` to be one of `values`.
    ///
    /// An empty list produces a query the store rejects; callers must
    /// short-circuit before executing one.
    pub fn is_in<I>(mut self, column: &str, values: I) -> Self
    where
        I: IntoIterator,
        I::Item: FilterLiteral,
    {
        self.predicates.push(Predicate::In {
            column: column.to_string(),
            literals: values.into_iter().map(|v| v.to_literal()).collect(),
        });
        self
    }

    /// Expect exactly one row.
    pub fn single(mut self) -> Self {
        self.cardinality = Cardinality::Single;
        self
    }

    pub fn collection(&self) -> &str {
        &self.collection
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn predicates(&self) -> &[Predicate] {
        &self.predicates
    }

    pub fn cardinality(&self) -> Cardinality {
        self.cardinality
    }

    /// Check the query can be sent to the store.
    pub fn validate(&self) -> StoreResult<()> {
        for predicate in &self.predicates {
            if let Predicate::In { column, literals } = predicate {
                if literals.is_empty() {
                    return Err(StoreError::InvalidQuery {
                        collection: self.collection.clone(),
                        reason: format!("empty `in` list for column `{}`", column),
                    });
                }
            }
        }
        Ok(())
    }

    /// Render the query as REST query parameters.
    ///
    /// Single-row queries ask for two rows so the caller can tell "one" from
    /// "more than one" without fetching the whole collection.
    pub fn to_params(&self) -> Vec<(String, String)> {
        let select = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns.join(",")
        };

        let mut params = vec![("select".to_string(), select)];
        params.extend(self.predicates.iter().map(Predicate::to_param));
        if self.cardinality == Cardinality::Single {
            params.push(("limit".to_string(), "2".to_string()));
        }
        params
    }
}

// List items containing reserved characters must be double-quoted.
fn quote_list_item(literal: &str) -> String {
    if literal.contains([',', '(', ')', '"', '\\', ' ']) {
        let escaped = literal.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        literal.to_string()
    }
}

/// Conversion of a typed filter into a query over its collection.
pub trait ToQuery {
    fn to_query(&self) -> CollectionQuery;
}

impl ToQuery for RouteFilter {
    fn to_query(&self) -> CollectionQuery {
        CollectionQuery::from(schema::ROUTES)
            .eq_opt("country", self.country.as_ref())
            .eq_opt("transport", self.transport.as_ref())
            .eq_opt("is_global", self.is_global)
    }
}

impl ToQuery for PoiFilter {
    fn to_query(&self) -> CollectionQuery {
        CollectionQuery::from(schema::POI)
            .eq_opt("type", self.poi_type.as_ref())
            .eq_opt("is_living_place", self.is_living_place)
    }
}

impl ToQuery for ParticipantFilter {
    fn to_query(&self) -> CollectionQuery {
        CollectionQuery::from(schema::PARTICIPANTS)
            .eq_opt("country", self.country.as_ref())
            .eq_opt("role", self.role.as_ref())
    }
}
