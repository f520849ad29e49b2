//! Property-Based Tests for Monitoring Tables
//!
//! Generated monitoring cores are queried through the concrete tables.
//! Visit order, early stop, composed columns and authorization delegation
//! must hold for every generated core and identity.

use livequery_core::{
    Authorized, Count, Identity, Inspect, Row, ServiceAuthorization, Table, Value,
};
use livequery_monitor::{Authorizer, Comment};
use livequery_tables::{CommentsTable, DowntimesTable, HostsTable, ServicesTable};
use livequery_test_utils::generators::{arb_core_plan, arb_identity};
use proptest::prelude::*;
use std::sync::Arc;

// ============================================================================
// HELPERS
// ============================================================================

fn mode(strict: bool) -> ServiceAuthorization {
    if strict {
        ServiceAuthorization::Strict
    } else {
        ServiceAuthorization::Loose
    }
}

// ============================================================================
// PROPERTIES
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Comments are visited once each, by ascending id.
    #[test]
    fn prop_comments_visit_every_entity_in_order(plan in arb_core_plan()) {
        let core = plan.build().unwrap();
        let table = CommentsTable::new(Arc::clone(&core), Authorizer::default()).unwrap();

        let mut visited = Vec::new();
        let mut inspect = Inspect::new(|row: Row<'_>| {
            if let Some(comment) = row.raw_data::<Comment>() {
                visited.push(comment.id);
            }
        });
        table.answer_query(&mut inspect).unwrap();

        let expected: Vec<i64> = core.read().unwrap().comments().map(|c| c.id).collect();
        prop_assert!(visited.windows(2).all(|pair| pair[0] < pair[1]));
        prop_assert_eq!(visited, expected);
    }

    /// Stopping after N visits exactly min(N, len) entities.
    #[test]
    fn prop_stop_after_n(plan in arb_core_plan(), n in 1usize..25) {
        let core = plan.build().unwrap();
        let total = core.read().unwrap().comments().count();
        let table = CommentsTable::new(core, Authorizer::default()).unwrap();

        let mut count = Count::stop_after(n);
        table.answer_query(&mut count).unwrap();
        prop_assert_eq!(count.rows(), n.min(total));
    }

    /// Every `host_*` and `service_*` column of a comment row reads the same
    /// value as the host or service table does on the related entity, and
    /// the empty value when there is no service.
    #[test]
    fn prop_comment_composition_matches_direct_read(plan in arb_core_plan()) {
        let core = plan.build().unwrap();
        let table = CommentsTable::new(Arc::clone(&core), Authorizer::default()).unwrap();
        let hosts = HostsTable::column_set().unwrap();
        let services = ServicesTable::column_set(false).unwrap();

        let state = core.read().unwrap();
        for comment in state.comments() {
            let row = Row::new(comment);
            for column in hosts.iter() {
                let composed = table.find_column(&format!("host_{}", column.name())).unwrap();
                prop_assert_eq!(composed.value(row), column.value(Row::new(&*comment.host)));
            }
            for column in services.iter() {
                let composed = table.find_column(&format!("service_{}", column.name())).unwrap();
                let expected = match comment.service.as_deref() {
                    Some(service) => column.value(Row::new(service)),
                    None => Value::empty(column.column_type()),
                };
                prop_assert_eq!(composed.value(row), expected);
            }
        }
    }

    /// A comment follows its service's rule when it has one, its host's
    /// rule otherwise.
    #[test]
    fn prop_comment_authorization_delegates(
        plan in arb_core_plan(),
        identity in arb_identity(),
        strict in any::<bool>(),
    ) {
        let core = plan.build().unwrap();
        let authorizer = Authorizer::new(mode(strict));
        let table = CommentsTable::new(Arc::clone(&core), authorizer).unwrap();

        let state = core.read().unwrap();
        for comment in state.comments() {
            let expected = match comment.service.as_deref() {
                Some(service) => authorizer.service_visible(&identity, service),
                None => authorizer.host_visible(&identity, &comment.host),
            };
            prop_assert_eq!(table.is_authorized(Row::new(comment), &identity), expected);
        }
    }

    /// Downtimes delegate exactly like comments.
    #[test]
    fn prop_downtime_authorization_delegates(
        plan in arb_core_plan(),
        identity in arb_identity(),
        strict in any::<bool>(),
    ) {
        let core = plan.build().unwrap();
        let authorizer = Authorizer::new(mode(strict));
        let table = DowntimesTable::new(Arc::clone(&core), authorizer).unwrap();

        let state = core.read().unwrap();
        for downtime in state.downtimes() {
            let expected = match downtime.service.as_deref() {
                Some(service) => authorizer.service_visible(&identity, service),
                None => authorizer.host_visible(&identity, &downtime.host),
            };
            prop_assert_eq!(table.is_authorized(Row::new(downtime), &identity), expected);
        }
    }

    /// Forwarded and withheld rows add up to the collection size, and an
    /// unrestricted identity is never denied.
    #[test]
    fn prop_authorized_partitions_rows(plan in arb_core_plan(), identity in arb_identity()) {
        let core = plan.build().unwrap();
        let total = core.read().unwrap().comments().count();
        let table = CommentsTable::new(core, Authorizer::default()).unwrap();

        let mut authorized = Authorized::new(&table, &identity, Count::new());
        table.answer_query(&mut authorized).unwrap();
        let denied = authorized.denied();
        let forwarded = authorized.into_inner().rows();
        prop_assert_eq!(forwarded + denied, total);
        if identity == Identity::Unrestricted {
            prop_assert_eq!(denied, 0);
        }
    }
}
