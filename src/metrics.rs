//! Statement and transaction instrumentation.
//!
//! With the `metrics` feature, counters and histograms are registered on the
//! global OpenTelemetry meter; exporting them is left to the application.
//! With the `tracing` feature, [`tracing_helpers`] provides the spans the
//! statement and transaction paths enter.

#[cfg(feature = "metrics")]
use once_cell::sync::Lazy;
#[cfg(feature = "metrics")]
use opentelemetry::{
    global,
    metrics::{Counter, Histogram},
};

#[cfg(feature = "metrics")]
pub static METRICS: Lazy<QueryMetrics> = Lazy::new(QueryMetrics::init);

#[cfg(feature = "metrics")]
pub struct QueryMetrics {
    pub statements_total: Counter<u64>,
    pub statement_errors_total: Counter<u64>,
    pub statement_duration: Histogram<f64>,
    pub transactions_committed: Counter<u64>,
    pub transactions_rolled_back: Counter<u64>,
}

#[cfg(feature = "metrics")]
impl QueryMetrics {
    pub fn init() -> Self {
        let meter = global::meter("lifeguard_query");

        let statements_total = meter
            .u64_counter("lifeguard_query_statements_total")
            .with_description("Total statements prepared and run")
            .build();

        let statement_errors_total = meter
            .u64_counter("lifeguard_query_statement_errors_total")
            .with_description("Statements that failed to prepare, bind or run")
            .build();

        let statement_duration = meter
            .f64_histogram("lifeguard_query_statement_duration_seconds")
            .with_description("Duration of statement preparation and execution")
            .build();

        let transactions_committed = meter
            .u64_counter("lifeguard_query_transactions_committed_total")
            .with_description("Physical transactions committed")
            .build();

        let transactions_rolled_back = meter
            .u64_counter("lifeguard_query_transactions_rolled_back_total")
            .with_description("Physical transactions rolled back")
            .build();

        Self {
            statements_total,
            statement_errors_total,
            statement_duration,
            transactions_committed,
            transactions_rolled_back,
        }
    }

    pub fn record_statement(&self, elapsed: std::time::Duration) {
        self.statements_total.add(1, &[]);
        self.statement_duration.record(elapsed.as_secs_f64(), &[]);
    }

    pub fn record_statement_error(&self) {
        self.statement_errors_total.add(1, &[]);
    }

    pub fn record_transaction(&self, committed: bool) {
        if committed {
            self.transactions_committed.add(1, &[]);
        } else {
            self.transactions_rolled_back.add(1, &[]);
        }
    }
}

#[cfg(feature = "tracing")]
pub mod tracing_helpers {
    use tracing::Span;

    pub fn prepare_statement_span(sql: &str) -> Span {
        tracing::debug_span!("lifeguard_query.prepare_statement", sql = %sql)
    }

    pub fn begin_transaction_span() -> Span {
        tracing::debug_span!("lifeguard_query.begin_transaction")
    }

    pub fn commit_transaction_span() -> Span {
        tracing::debug_span!("lifeguard_query.commit_transaction")
    }

    pub fn rollback_transaction_span() -> Span {
        tracing::debug_span!("lifeguard_query.rollback_transaction")
    }
}
