//! End-to-end queries against the default table registry.

use livequery_core::{
    Collect, Count, EngineConfig, Identity, Inspect, Limit, Row, ServiceAuthorization, Table,
    Value, COLUMNS_TABLE,
};
use livequery_monitor::{Comment, MonitoringCore};
use livequery_tables::{default_registry, Engine};
use livequery_test_utils::{assertions, fixtures, init_tracing};
use std::collections::HashSet;
use std::sync::Arc;
use std::thread;

fn engine(core: Arc<MonitoringCore>, mode: ServiceAuthorization) -> Engine {
    let config = EngineConfig {
        service_authorization: mode,
    };
    Engine::new(core, &config).unwrap()
}

fn comment_ids(engine: &Engine, user: Option<&str>) -> Vec<i64> {
    let table = engine.registry().require("comments").unwrap();
    let mut collect = Collect::new(table.as_ref(), &["id"]).unwrap();
    engine.answer_query("comments", user, &mut collect).unwrap();
    collect
        .into_rows()
        .into_iter()
        .filter_map(|row| row[0].as_int())
        .collect()
}

#[test]
fn test_registry_tables_and_order() {
    init_tracing();
    let core = fixtures::sample_core().unwrap();
    let registry = default_registry(core, &EngineConfig::default()).unwrap();
    let names: Vec<&str> = registry.names().collect();
    assert_eq!(
        names,
        vec!["hosts", "services", "comments", "downtimes", "contacts", "columns"]
    );
}

#[test]
fn test_column_names_unique_in_every_table() {
    let registry = default_registry(fixtures::sample_core().unwrap(), &EngineConfig::default()).unwrap();
    for table in registry.tables() {
        let mut seen = HashSet::new();
        for column in table.columns() {
            assert!(
                seen.insert(column.name()),
                "duplicate column {} in {}",
                column.name(),
                table.name()
            );
        }
    }
}

#[test]
fn test_single_host_comment_scenario() {
    init_tracing();
    let core = fixtures::single_host_comment().unwrap();
    let engine = engine(core, ServiceAuthorization::Loose);
    let comments = engine.registry().require("comments").unwrap();

    let mut collect = Collect::all(comments.as_ref());
    let denied = engine.answer_query("comments", None, &mut collect).unwrap();
    assert_eq!(denied, 0);

    let header = collect.header().into_iter().map(str::to_string).collect::<Vec<_>>();
    let rows = collect.into_rows();
    assert_eq!(rows.len(), 1);
    let row = &rows[0];
    let value = |name: &str| {
        let position = header.iter().position(|h| h == name).unwrap();
        row[position].clone()
    };

    assert_eq!(value("author"), Value::String("alice".into()));
    assert_eq!(value("id"), Value::Int(7));
    assert_eq!(value("is_service"), Value::Bool(false));
    assert_eq!(value("host_name"), Value::String("web01".into()));
    assert_eq!(value("host_address"), Value::String("192.0.2.10".into()));

    let service_values: Vec<Value<'static>> = header
        .iter()
        .zip(row.iter())
        .filter(|(name, _)| name.starts_with("service_"))
        .map(|(_, value)| value.clone())
        .collect();
    assert!(!service_values.is_empty());
    assertions::assert_all_empty(&service_values);
}

#[test]
fn test_comments_visit_in_id_order() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Loose);
    assert_eq!(comment_ids(&engine, None), vec![1, 2, 3, 4]);
}

#[test]
fn test_stop_after_n_visits_exactly_n() {
    let core = fixtures::sample_core().unwrap();
    let registry = default_registry(core, &EngineConfig::default()).unwrap();
    let comments = registry.require("comments").unwrap();

    let mut count = Count::stop_after(3);
    comments.answer_query(&mut count).unwrap();
    assert_eq!(count.rows(), 3);

    let mut seen = Vec::new();
    let mut inspect = Inspect::new(|row: Row<'_>| {
        if let Some(comment) = row.raw_data::<Comment>() {
            seen.push(comment.id);
        }
    });
    let mut limited = Limit::new(&mut inspect, 2);
    comments.answer_query(&mut limited).unwrap();
    assert_eq!(seen, vec![1, 2]);
}

#[test]
fn test_loose_authorization_grants_host_contacts() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Loose);
    // alice is a contact of web01 and sees both of its services' comments.
    assert_eq!(comment_ids(&engine, Some("alice")), vec![1, 2, 3]);
    // dave sees db01 through the dba group, and MySQL through its host.
    assert_eq!(comment_ids(&engine, Some("dave")), vec![4]);
}

#[test]
fn test_strict_authorization_uses_service_contacts_only() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Strict);
    assert_eq!(comment_ids(&engine, Some("alice")), vec![1]);
    // bob is a direct contact of HTTP and a web group member for HTTPS.
    assert_eq!(comment_ids(&engine, Some("bob")), vec![2, 3]);
    assert!(comment_ids(&engine, Some("dave")).is_empty());
}

#[test]
fn test_unknown_user_sees_nothing() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Loose);
    assert!(comment_ids(&engine, Some("mallory")).is_empty());

    let mut count = Count::new();
    let denied = engine.answer_query("hosts", Some("mallory"), &mut count).unwrap();
    assert_eq!(count.rows(), 0);
    assert_eq!(denied, 2);
}

#[test]
fn test_denied_rows_do_not_count_against_limit() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Strict);
    let mut limit = Limit::new(Count::new(), 2);
    let denied = engine.answer_query("comments", Some("bob"), &mut limit).unwrap();
    assert_eq!(limit.into_inner().rows(), 2);
    assert_eq!(denied, 1);
}

#[test]
fn test_downtime_authorization_matches_comments() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Strict);
    let downtimes = engine.registry().require("downtimes").unwrap();
    let mut collect = Collect::new(downtimes.as_ref(), &["id", "host_name", "service_description"]).unwrap();
    engine.answer_query("downtimes", Some("carol"), &mut collect).unwrap();
    assert_eq!(
        collect.rows(),
        &[vec![
            Value::Int(2),
            Value::String("web01".into()),
            Value::String("HTTPS".into()),
        ]]
    );
}

#[test]
fn test_columns_table_describes_every_column() {
    let registry = default_registry(fixtures::sample_core().unwrap(), &EngineConfig::default()).unwrap();
    let total: usize = registry.tables().map(|table| table.columns().len()).sum();

    let columns = registry.require(COLUMNS_TABLE).unwrap();
    let mut collect = Collect::new(columns.as_ref(), &["table", "name", "type"]).unwrap();
    registry
        .answer_query(COLUMNS_TABLE, &Identity::unknown("mallory"), &mut collect)
        .unwrap();
    let rows = collect.into_rows();
    assert_eq!(rows.len(), total);
    assert!(rows.contains(&vec![
        Value::String("comments".into()),
        Value::String("service_description".into()),
        Value::String("string".into()),
    ]));
    assert!(rows.contains(&vec![
        Value::String("hosts".into()),
        Value::String("last_check".into()),
        Value::String("time".into()),
    ]));
    for (table, column) in [
        ("comments", "persistent"),
        ("comments", "expires"),
        ("downtimes", "fixed"),
    ] {
        assert!(
            rows.contains(&vec![
                Value::String(table.into()),
                Value::String(column.into()),
                Value::String("int".into()),
            ]),
            "{table}.{column} should be an int column"
        );
    }
}

#[test]
fn test_unknown_table_is_a_schema_error() {
    let engine = engine(fixtures::sample_core().unwrap(), ServiceAuthorization::Loose);
    let mut count = Count::new();
    assertions::assert_schema_error(&engine.answer_query("hostgroups", None, &mut count));
}

#[test]
fn test_rendered_rows_serialize_to_json() {
    let engine = engine(fixtures::single_host_comment().unwrap(), ServiceAuthorization::Loose);
    let comments = engine.registry().require("comments").unwrap();
    let mut collect = Collect::new(comments.as_ref(), &["author", "id", "entry_time", "host_contacts"]).unwrap();
    engine.answer_query("comments", None, &mut collect).unwrap();
    let json = serde_json::to_string(collect.rows()).unwrap();
    assert_eq!(json, r#"[["alice",7,1700000000,["alice"]]]"#);
}

#[test]
fn test_deletion_during_queries_is_never_half_seen() {
    init_tracing();
    let core = Arc::new(MonitoringCore::new());
    let host = core
        .add_host(livequery_monitor::Host::new("web01").with_contact("alice"))
        .unwrap();
    for id in 1..=200 {
        core.add_comment(Comment::for_host(id, &host, "alice", "load test"))
            .unwrap();
    }
    let engine = Arc::new(engine(Arc::clone(&core), ServiceAuthorization::Loose));

    let writer = {
        let core = Arc::clone(&core);
        thread::spawn(move || {
            for id in (1..=200).rev() {
                core.remove_comment(id).unwrap();
            }
        })
    };
    let readers: Vec<_> = (0..4)
        .map(|_| {
            let engine = Arc::clone(&engine);
            thread::spawn(move || {
                for _ in 0..50 {
                    let table = engine.registry().require("comments").unwrap();
                    let mut collect = Collect::new(table.as_ref(), &["id", "host_name"]).unwrap();
                    engine.answer_query("comments", Some("alice"), &mut collect).unwrap();
                    let rows = collect.into_rows();
                    // Removal runs from the highest id down, so every pass
                    // sees a contiguous prefix 1..=n.
                    for (expected, row) in (1i64..).zip(&rows) {
                        assert_eq!(row[0], Value::Int(expected));
                        assert_eq!(row[1], Value::String("web01".into()));
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
    assert_eq!(core.read().unwrap().comments().count(), 0);
}
