use crate::obs::sink::ExecKind;
use serde::{Deserialize, Serialize};
use std::{cell::RefCell, collections::BTreeMap};

///
/// EventState
/// Ephemeral, in-memory counters and simple perf totals for operations.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventState {
    pub ops: EventOps,
    pub perf: EventPerf,
    pub entities: BTreeMap<String, EntityCounters>,
}

///
/// EventOps
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventOps {
    // Session entrypoints
    pub find_calls: u64,
    pub get_calls: u64,
    pub insert_calls: u64,
    pub related_calls: u64,

    // Rows touched
    pub rows_inserted: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,

    // Relationship traffic
    pub relation_lookups: u64,
    pub edges_written: u64,
    pub populated_links: u64,

    pub unique_violations: u64,
}

///
/// EntityCounters
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntityCounters {
    pub find_calls: u64,
    pub get_calls: u64,
    pub insert_calls: u64,
    pub related_calls: u64,
    pub rows_inserted: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub relation_lookups: u64,
    pub edges_written: u64,
    pub populated_links: u64,
    pub unique_violations: u64,
}

///
/// EventPerf
/// Wall-clock totals per entrypoint, in microseconds.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventPerf {
    pub find_us_total: u128,
    pub get_us_total: u128,
    pub insert_us_total: u128,
    pub related_us_total: u128,

    pub find_us_max: u64,
    pub get_us_max: u64,
    pub insert_us_max: u64,
    pub related_us_max: u64,
}

thread_local! {
    static EVENT_STATE: RefCell<EventState> = RefCell::new(EventState::default());
}

/// Borrow metrics immutably.
pub(crate) fn with_state<R>(f: impl FnOnce(&EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&m.borrow()))
}

/// Borrow metrics mutably.
pub(crate) fn with_state_mut<R>(f: impl FnOnce(&mut EventState) -> R) -> R {
    EVENT_STATE.with(|m| f(&mut m.borrow_mut()))
}

/// Reset all event state: counters and perf.
pub(crate) fn reset_all() {
    with_state_mut(|m| *m = EventState::default());
}

/// Accumulate elapsed time for one entrypoint and track a max.
pub(crate) fn add_elapsed(perf: &mut EventPerf, kind: ExecKind, elapsed_us: u64) {
    let (total, max) = match kind {
        ExecKind::Find => (&mut perf.find_us_total, &mut perf.find_us_max),
        ExecKind::Get => (&mut perf.get_us_total, &mut perf.get_us_max),
        ExecKind::Insert => (&mut perf.insert_us_total, &mut perf.insert_us_max),
        ExecKind::Related => (&mut perf.related_us_total, &mut perf.related_us_max),
    };

    *total = total.saturating_add(u128::from(elapsed_us));
    if elapsed_us > *max {
        *max = elapsed_us;
    }
}

///
/// EventReport
/// Event/counter report.
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EventReport {
    /// Ephemeral runtime counters since the last reset.
    pub counters: Option<EventState>,
    /// Per-entity counters and averages.
    pub entity_counters: Vec<EntitySummary>,
}

///
/// EntitySummary
///

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct EntitySummary {
    pub kind: String,
    pub find_calls: u64,
    pub insert_calls: u64,
    pub rows_inserted: u64,
    pub rows_returned: u64,
    pub rows_scanned: u64,
    pub avg_rows_per_find: f64,
    pub avg_rows_scanned_per_find: f64,
    pub relation_lookups: u64,
    pub edges_written: u64,
    pub populated_links: u64,
    pub unique_violations: u64,
}

/// Build a metrics report by inspecting in-memory counters only.
#[must_use]
#[expect(clippy::cast_precision_loss)]
pub(crate) fn report() -> EventReport {
    let snap = with_state(Clone::clone);

    let mut entity_counters: Vec<EntitySummary> = snap
        .entities
        .iter()
        .map(|(kind, ops)| {
            let per_find = |n: u64| {
                if ops.find_calls > 0 {
                    n as f64 / ops.find_calls as f64
                } else {
                    0.0
                }
            };

            EntitySummary {
                kind: kind.clone(),
                find_calls: ops.find_calls,
                insert_calls: ops.insert_calls,
                rows_inserted: ops.rows_inserted,
                rows_returned: ops.rows_returned,
                rows_scanned: ops.rows_scanned,
                avg_rows_per_find: per_find(ops.rows_returned),
                avg_rows_scanned_per_find: per_find(ops.rows_scanned),
                relation_lookups: ops.relation_lookups,
                edges_written: ops.edges_written,
                populated_links: ops.populated_links,
                unique_violations: ops.unique_violations,
            }
        })
        .collect();

    // busiest kinds first, then by name
    entity_counters.sort_by(|a, b| {
        b.rows_scanned
            .cmp(&a.rows_scanned)
            .then_with(|| a.kind.cmp(&b.kind))
    });

    EventReport {
        counters: Some(snap),
        entity_counters,
    }
}
