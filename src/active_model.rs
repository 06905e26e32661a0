//! ActiveModel trait for model persistence
//!
//! Every [`Model`] can be inserted, updated, saved and deleted through
//! [`ActiveModelTrait`]. Rows are identified by the schema's primary key
//! columns; each write runs inside its own logical transaction scope on the
//! session, so it joins any scope the caller already has open.

use crate::error::QueryError;
use crate::model::Model;
use crate::query::{Filterable, Operator, Query, QueryContext, QueryStatement};
use crate::raw_sql;
use crate::session::Session;
use crate::value::{is_null, Cast};
use sea_query::Value;

/// What [`ActiveModelTrait::save`] did
#[derive(Debug, Clone, PartialEq)]
pub enum SaveOutcome {
    /// Row inserted; carries the generated id
    Inserted(Value),
    /// Row updated; carries the affected row count
    Updated(u64),
}

fn missing_identity<M: Model>() -> QueryError {
    QueryError::MissingIdentity {
        table: M::schema().name.clone(),
    }
}

/// Query matching the row `model` identifies
fn identity_query<M: Model>(model: &M) -> Result<Query<M>, QueryError> {
    let identity = model.identity().ok_or_else(missing_identity::<M>)?;
    Ok(identity
        .into_iter()
        .fold(Query::<M>::new(), |query, (column, value)| {
            query.filter_op(column, Operator::Equal, value)
        }))
}

/// Persistence operations, implemented for every [`Model`]
///
/// # Example
///
/// ```no_run
/// use lifeguard_query::{ActiveModelTrait, ConnectionRegistry, MockConnection, Session};
/// # use lifeguard_query::{Attributes, Model, QueryError, TableSchema};
/// # struct User;
/// # impl Model for User {
/// #     fn schema() -> &'static TableSchema { todo!() }
/// #     fn hydrate(_: Attributes) -> Result<Self, QueryError> { todo!() }
/// #     fn attributes(&self) -> Attributes { todo!() }
/// # }
/// # fn main() -> Result<(), QueryError> {
/// # let user = User;
/// let conn = MockConnection::new();
/// let registry = ConnectionRegistry::new();
/// let session = Session::new(&conn, &registry);
///
/// let id = user.insert(&session)?;
/// user.delete(&session)?;
/// # Ok(())
/// # }
/// ```
pub trait ActiveModelTrait: Model {
    /// Render the `INSERT` for this record
    ///
    /// Primary key columns that are unset or NULL are left out so the
    /// database can generate them.
    fn build_insert(&self, ctx: &QueryContext<'_>) -> Result<QueryStatement, QueryError> {
        let schema = Self::schema();
        let grammar = ctx.grammar();
        let attributes = self.attributes();

        let mut columns = Vec::new();
        let mut values = Vec::new();
        for column in &schema.columns {
            let Some(value) = attributes.get_attribute(&column.name) else {
                continue;
            };
            if column.primary_key && is_null(value) {
                continue;
            }
            let value = match column.cast {
                Some(cast) => cast.to_db(value.clone())?,
                None => value.clone(),
            };
            columns.push(grammar.quote_column(&column.name));
            values.push(value);
        }

        let mut statement = QueryStatement::from_sql(format!(
            "INSERT INTO {} ({}) VALUES (",
            grammar.quote_table(&schema.name),
            columns.join(", ")
        ));
        statement.push_values(values).push_sql(")");
        Ok(statement)
    }

    /// Insert this record and return the id the database generated
    fn insert(&self, session: &Session<'_>) -> Result<Value, QueryError> {
        session.transaction(|s| {
            let connection = s.connection();
            let statement = self.build_insert(&QueryContext::for_connection(connection))?;
            raw_sql::execute(connection, &statement)?;
            Ok(connection.last_insert_id()?)
        })
    }

    /// Update every non-key column of the row this record identifies
    ///
    /// # Errors
    ///
    /// Returns `QueryError::MissingIdentity` if a primary key value is unset.
    fn update(&self, session: &Session<'_>) -> Result<u64, QueryError> {
        let query = identity_query(self)?;
        let attributes = self.attributes();
        let assignments: Vec<(String, Value)> = Self::schema()
            .columns
            .iter()
            .filter(|column| !column.primary_key)
            .filter_map(|column| {
                attributes
                    .get_attribute(&column.name)
                    .map(|value| (column.name.clone(), value.clone()))
            })
            .collect();
        session.transaction(|s| query.update(s.connection(), assignments))
    }

    /// Insert when the primary key is unset, update otherwise
    ///
    /// # Errors
    ///
    /// Returns `QueryError::MissingIdentity` if the table declares no primary
    /// key, since there is no way to tell a new record from a stored one.
    fn save(&self, session: &Session<'_>) -> Result<SaveOutcome, QueryError> {
        if Self::schema().primary_keys().next().is_none() {
            return Err(missing_identity::<Self>());
        }
        match self.identity() {
            Some(_) => self.update(session).map(SaveOutcome::Updated),
            None => self.insert(session).map(SaveOutcome::Inserted),
        }
    }

    /// Delete the row this record identifies
    ///
    /// # Errors
    ///
    /// Returns `QueryError::MissingIdentity` if a primary key value is unset.
    fn delete(&self, session: &Session<'_>) -> Result<u64, QueryError> {
        let query = identity_query(self)?;
        session.transaction(|s| query.delete(s.connection()))
    }
}

impl<M: Model> ActiveModelTrait for M {}
