//! Metrics sink boundary.
//!
//! Core DB logic MUST NOT depend on obs::metrics directly.
//! All instrumentation flows through MetricsEvent and MetricsSink.
use crate::obs::metrics;
use std::{cell::RefCell, rc::Rc, time::Instant};

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<Rc<dyn MetricsSink>>> = const { RefCell::new(None) };
}

///
/// ExecKind
///

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
#[remain::sorted]
pub enum ExecKind {
    Find,
    Get,
    Insert,
    Related,
}

///
/// MetricsEvent
///

#[derive(Clone, Copy, Debug)]
pub enum MetricsEvent<'a> {
    ExecStart {
        kind: ExecKind,
        entity: &'a str,
    },
    ExecFinish {
        kind: ExecKind,
        entity: &'a str,
        rows_touched: u64,
        elapsed_us: u64,
    },
    RowsScanned {
        entity: &'a str,
        rows_scanned: u64,
    },
    RelationLookup {
        entity: &'a str,
        lookups: u64,
    },
    EdgesWritten {
        entity: &'a str,
        edges: u64,
    },
    Populated {
        entity: &'a str,
        links: u64,
    },
    UniqueViolation {
        entity: &'a str,
    },
}

///
/// MetricsSink
///

pub trait MetricsSink {
    fn record(&self, event: MetricsEvent<'_>);
}

///
/// GlobalMetricsSink
/// Default process-local sink that writes into global metrics state.
/// Acts as the concrete sink when no scoped override is installed.
///

pub(crate) struct GlobalMetricsSink;

impl MetricsSink for GlobalMetricsSink {
    fn record(&self, event: MetricsEvent<'_>) {
        match event {
            MetricsEvent::ExecStart { kind, entity } => {
                metrics::with_state_mut(|m| {
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    match kind {
                        ExecKind::Find => {
                            m.ops.find_calls = m.ops.find_calls.saturating_add(1);
                            entry.find_calls = entry.find_calls.saturating_add(1);
                        }
                        ExecKind::Get => {
                            m.ops.get_calls = m.ops.get_calls.saturating_add(1);
                            entry.get_calls = entry.get_calls.saturating_add(1);
                        }
                        ExecKind::Insert => {
                            m.ops.insert_calls = m.ops.insert_calls.saturating_add(1);
                            entry.insert_calls = entry.insert_calls.saturating_add(1);
                        }
                        ExecKind::Related => {
                            m.ops.related_calls = m.ops.related_calls.saturating_add(1);
                            entry.related_calls = entry.related_calls.saturating_add(1);
                        }
                    }
                });
            }

            MetricsEvent::ExecFinish {
                kind,
                entity,
                rows_touched,
                elapsed_us,
            } => {
                metrics::with_state_mut(|m| {
                    metrics::add_elapsed(&mut m.perf, kind, elapsed_us);

                    let entry = m.entities.entry(entity.to_string()).or_default();
                    match kind {
                        ExecKind::Find | ExecKind::Get | ExecKind::Related => {
                            m.ops.rows_returned = m.ops.rows_returned.saturating_add(rows_touched);
                            entry.rows_returned = entry.rows_returned.saturating_add(rows_touched);
                        }
                        ExecKind::Insert => {
                            m.ops.rows_inserted = m.ops.rows_inserted.saturating_add(rows_touched);
                            entry.rows_inserted = entry.rows_inserted.saturating_add(rows_touched);
                        }
                    }
                });
            }

            MetricsEvent::RowsScanned {
                entity,
                rows_scanned,
            } => {
                metrics::with_state_mut(|m| {
                    m.ops.rows_scanned = m.ops.rows_scanned.saturating_add(rows_scanned);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.rows_scanned = entry.rows_scanned.saturating_add(rows_scanned);
                });
            }

            MetricsEvent::RelationLookup { entity, lookups } => {
                metrics::with_state_mut(|m| {
                    m.ops.relation_lookups = m.ops.relation_lookups.saturating_add(lookups);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.relation_lookups = entry.relation_lookups.saturating_add(lookups);
                });
            }

            MetricsEvent::EdgesWritten { entity, edges } => {
                metrics::with_state_mut(|m| {
                    m.ops.edges_written = m.ops.edges_written.saturating_add(edges);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.edges_written = entry.edges_written.saturating_add(edges);
                });
            }

            MetricsEvent::Populated { entity, links } => {
                metrics::with_state_mut(|m| {
                    m.ops.populated_links = m.ops.populated_links.saturating_add(links);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.populated_links = entry.populated_links.saturating_add(links);
                });
            }

            MetricsEvent::UniqueViolation { entity } => {
                metrics::with_state_mut(|m| {
                    m.ops.unique_violations = m.ops.unique_violations.saturating_add(1);
                    let entry = m.entities.entry(entity.to_string()).or_default();
                    entry.unique_violations = entry.unique_violations.saturating_add(1);
                });
            }
        }
    }
}

///
/// NoopMetricsSink
/// Discards every event; installed for sessions with metrics disabled.
///

pub(crate) struct NoopMetricsSink;

impl MetricsSink for NoopMetricsSink {
    fn record(&self, _event: MetricsEvent<'_>) {}
}

pub(crate) const GLOBAL_METRICS_SINK: GlobalMetricsSink = GlobalMetricsSink;

pub(crate) fn record(event: MetricsEvent<'_>) {
    // Clone out of the slot so a sink may itself install an override.
    let sink = SINK_OVERRIDE.with(|cell| cell.borrow().clone());
    match sink {
        Some(sink) => sink.record(event),
        None => GLOBAL_METRICS_SINK.record(event),
    }
}

/// Snapshot the current metrics state.
#[must_use]
pub fn metrics_report() -> metrics::EventReport {
    metrics::report()
}

/// Reset all metrics state (counters + perf).
pub fn metrics_reset_all() {
    metrics::reset_all();
}

/// Run a closure with a temporary metrics sink override.
pub(crate) fn with_metrics_sink<T>(sink: Rc<dyn MetricsSink>, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<Rc<dyn MetricsSink>>);

    impl Drop for Guard {
        fn drop(&mut self) {
            let prev = self.0.take();
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = prev;
            });
        }
    }

    let prev = SINK_OVERRIDE.with(|cell| cell.borrow_mut().replace(sink));
    let _guard = Guard(prev);

    f()
}

///
/// Span
/// RAII guard that emits start/finish metrics events for one session call.
/// Ensures finish accounting happens even on early return.
///

pub(crate) struct Span<'a> {
    kind: ExecKind,
    entity: &'a str,
    start: Instant,
    rows: u64,
}

impl<'a> Span<'a> {
    #[must_use]
    pub(crate) fn new(kind: ExecKind, entity: &'a str) -> Self {
        record(MetricsEvent::ExecStart { kind, entity });

        Self {
            kind,
            entity,
            start: Instant::now(),
            rows: 0,
        }
    }

    pub(crate) const fn set_rows(&mut self, rows: u64) {
        self.rows = rows;
    }
}

impl Drop for Span<'_> {
    fn drop(&mut self) {
        let elapsed_us = u64::try_from(self.start.elapsed().as_micros()).unwrap_or(u64::MAX);

        record(MetricsEvent::ExecFinish {
            kind: self.kind,
            entity: self.entity,
            rows_touched: self.rows,
            elapsed_us,
        });
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[derive(Default)]
    struct CountingSink {
        events: Cell<u32>,
    }

    impl MetricsSink for CountingSink {
        fn record(&self, _event: MetricsEvent<'_>) {
            self.events.set(self.events.get() + 1);
        }
    }

    #[test]
    fn override_captures_events_and_restores_global_sink() {
        metrics_reset_all();
        let sink = Rc::new(CountingSink::default());

        with_metrics_sink(sink.clone(), || {
            record(MetricsEvent::RowsScanned {
                entity: "Book",
                rows_scanned: 3,
            });
        });
        record(MetricsEvent::RowsScanned {
            entity: "Book",
            rows_scanned: 2,
        });

        assert_eq!(sink.events.get(), 1);
        let report = metrics_report();
        assert_eq!(report.counters.map(|state| state.ops.rows_scanned), Some(2));
    }

    #[test]
    fn span_records_start_and_finish() {
        let sink = Rc::new(CountingSink::default());

        with_metrics_sink(sink.clone(), || {
            let mut span = Span::new(ExecKind::Find, "Book");
            span.set_rows(2);
        });

        assert_eq!(sink.events.get(), 2);
    }

    #[test]
    fn nested_overrides_unwind_in_order() {
        let outer = Rc::new(CountingSink::default());
        let inner = Rc::new(CountingSink::default());

        with_metrics_sink(outer.clone(), || {
            with_metrics_sink(inner.clone(), || {
                record(MetricsEvent::UniqueViolation { entity: "Author" });
            });
            record(MetricsEvent::UniqueViolation { entity: "Author" });
        });

        assert_eq!(inner.events.get(), 1);
        assert_eq!(outer.events.get(), 1);
    }
}
