//! Query building, rendering and execution.
//!
//! - **`Query`** - builder for rows of one model
//! - **`JointQuery`** - builder for rows spanning several joined models
//! - **`Filterable`** - fluent condition API shared by both and by nested scopes
//! - **`QueryCondition`** - condition tree the filters build
//! - **`Expression`** - columns, raw SQL, functions and aliased selections
//! - **`QueryStatement`** - SQL text plus bound values
//! - **`QueryContext`** - connection, grammar, schemas and finalizer of one build
//! - **`ModelFinalizer`** - turns result rows into models

pub mod condition;
pub mod context;
pub mod execution;
pub mod expression;
pub mod filter;
pub mod filter_service;
pub mod finalizer;
pub mod grammar;
pub mod joint;
pub mod select;
pub mod statement;
pub mod table;

pub use condition::{
    JoinType, LogicalCondition, NegatedCondition, Negation, Operand, Operator, QueryCondition,
    SpecificCondition, SubQuery,
};
pub use context::QueryContext;
pub use execution::{ModelRows, RecordRows, Rows};
pub use expression::{col, func, raw, Argument, Expression};
pub use filter::{comparison, implicit_comparison, scoped, ConditionScope, Filterable};
pub use filter_service::{FilterMode, FilterPlan, FilterService, FirstResultLimit};
pub use finalizer::{
    DefaultFinalizer, Hydrated, JointFinalizer, JointRecord, JointTable, ModelFinalizer,
    SelectionTracker,
};
pub use grammar::{Grammar, SqlGrammar, DEFAULT_GRAMMAR};
pub use joint::{JoinKind, JointQuery};
pub use select::{Order, Query};
pub use statement::QueryStatement;
pub use table::{ColumnSchema, TableSchema};
