mod common;

use common::*;
use schemasync::catalog::{Catalog, SqliteCatalog, SyncStatus};
use schemasync::introspect::{LiveDatabase, LiveSchemaSnapshot, LiveTable, StaticIntrospector};
use schemasync::sync::{Reconciler, SyncOptions};

#[test]
fn test_catalog_is_read_once_per_run() {
    let reconciler = Reconciler::new(RecordingCatalog::new());
    let prod = instance(1, "prod");

    reconciler
        .apply_at(&prod, &snapshot(&[("orders", &["items"]), ("billing", &[])]), 100)
        .unwrap();

    let ops = reconciler.catalog().ops();
    assert_eq!(ops[0], Op::FindDatabases);
    assert_eq!(reconciler.catalog().count(Op::FindDatabases), 1);
}

#[test]
fn test_every_live_entity_is_ok_after_run() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    let live = snapshot(&[("orders", &["items", "customers"]), ("billing", &["invoices"])]);

    reconciler.apply_at(&prod, &live, 100).unwrap();
    reconciler.apply_at(&prod, &live, 200).unwrap();

    for db in databases(reconciler.catalog(), &prod) {
        assert_eq!(db.sync_status, SyncStatus::Ok);
        assert_eq!(db.last_successful_sync_ts, 200);
        for table in tables(reconciler.catalog(), &db) {
            assert_eq!(table.sync_status, SyncStatus::Ok);
            assert_eq!(table.last_successful_sync_ts, 200);
        }
    }
}

#[test]
fn test_repeat_run_only_patches() {
    let reconciler = Reconciler::new(RecordingCatalog::new());
    let prod = instance(1, "prod");
    let live = snapshot(&[("orders", &["items", "customers"]), ("billing", &[])]);

    reconciler.apply_at(&prod, &live, 100).unwrap();
    let before = databases(reconciler.catalog().inner(), &prod);
    reconciler.catalog().clear_ops();

    let summary = reconciler.apply_at(&prod, &live, 100).unwrap();
    let catalog = reconciler.catalog();

    assert_eq!(catalog.count(Op::CreateDatabase), 0);
    assert_eq!(catalog.count(Op::CreateTable), 0);
    assert_eq!(catalog.count(Op::PatchDatabase), 2);
    assert_eq!(catalog.count(Op::PatchTable), 2);
    assert_eq!(summary.tables_refreshed, 2);

    let after = databases(catalog.inner(), &prod);
    assert_eq!(
        before.iter().map(|db| (&db.name, db.id, db.sync_status)).collect::<Vec<_>>(),
        after.iter().map(|db| (&db.name, db.id, db.sync_status)).collect::<Vec<_>>()
    );
}

#[test]
fn test_repeated_table_names_write_once() {
    let reconciler = Reconciler::new(RecordingCatalog::new());
    let prod = instance(1, "prod");
    let live = snapshot(&[("orders", &["items", "items", "customers"])]);

    reconciler.apply_at(&prod, &live, 100).unwrap();
    assert_eq!(reconciler.catalog().count(Op::CreateTable), 2);

    reconciler.catalog().clear_ops();
    reconciler.apply_at(&prod, &live, 200).unwrap();
    assert_eq!(reconciler.catalog().count(Op::CreateTable), 0);
    assert_eq!(reconciler.catalog().count(Op::PatchTable), 2);

    let orders = database(reconciler.catalog().inner(), &prod, "orders");
    let names: Vec<_> = tables(reconciler.catalog().inner(), &orders)
        .into_iter()
        .map(|t| t.name)
        .collect();
    assert_eq!(names.len(), 2);
    assert!(names.contains(&"items".to_string()));
}

#[test]
fn test_reappearing_database_returns_to_ok() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    let live = snapshot(&[("orders", &["items"])]);

    reconciler.apply_at(&prod, &live, 100).unwrap();
    reconciler
        .apply_at(&prod, &LiveSchemaSnapshot::default(), 200)
        .unwrap();
    assert_eq!(
        database(reconciler.catalog(), &prod, "orders").sync_status,
        SyncStatus::NotFound
    );

    let summary = reconciler.apply_at(&prod, &live, 300).unwrap();
    assert_eq!(summary.databases_created, 0);
    assert_eq!(summary.databases_refreshed, 1);

    let orders = database(reconciler.catalog(), &prod, "orders");
    assert_eq!(orders.sync_status, SyncStatus::Ok);
    assert_eq!(orders.last_successful_sync_ts, 300);
    assert_eq!(tables(reconciler.catalog(), &orders).len(), 1);
}

#[test]
fn test_reserved_database_is_never_touched() {
    let reconciler = Reconciler::new(RecordingCatalog::new());
    let prod = instance(1, "prod");
    let internal = seed_database(reconciler.catalog().inner(), &prod, "SchemaSync", 50);

    let live = snapshot(&[("schemasync", &["migration_history"]), ("orders", &[])]);
    let summary = reconciler.apply_at(&prod, &live, 100).unwrap();

    assert_eq!(summary.reserved_skipped, 1);
    assert_eq!(summary.databases_created, 1);
    assert_eq!(summary.databases_missing, 0);

    let stored = database(reconciler.catalog().inner(), &prod, "SchemaSync");
    assert_eq!(stored.sync_status, SyncStatus::Ok);
    assert_eq!(stored.last_successful_sync_ts, 50);
    assert!(tables(reconciler.catalog().inner(), &internal).is_empty());
}

#[test]
fn test_reserved_name_is_configurable() {
    let options = SyncOptions {
        reserved_database: "ops_meta".to_string(),
        ..SyncOptions::default()
    };
    let reconciler = Reconciler::with_options(SqliteCatalog::open_in_memory().unwrap(), options);
    let prod = instance(1, "prod");

    reconciler
        .apply_at(&prod, &snapshot(&[("OPS_META", &[]), ("schemasync", &[])]), 100)
        .unwrap();

    let names: Vec<_> = databases(reconciler.catalog(), &prod)
        .into_iter()
        .map(|db| db.name)
        .collect();
    assert_eq!(names, vec!["schemasync"]);
}

#[test]
fn test_names_match_exactly() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    seed_database(reconciler.catalog(), &prod, "orders", 50);

    let summary = reconciler
        .apply_at(&prod, &snapshot(&[("Orders", &[])]), 100)
        .unwrap();

    assert_eq!(summary.databases_created, 1);
    assert_eq!(summary.databases_missing, 1);
    assert_eq!(
        database(reconciler.catalog(), &prod, "orders").sync_status,
        SyncStatus::NotFound
    );
    assert_eq!(
        database(reconciler.catalog(), &prod, "Orders").sync_status,
        SyncStatus::Ok
    );
}

#[test]
fn test_other_instances_are_untouched() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    let staging = instance(2, "staging");
    reconciler
        .apply_at(&staging, &snapshot(&[("orders", &["items"])]), 50)
        .unwrap();

    reconciler
        .apply_at(&prod, &LiveSchemaSnapshot::default(), 100)
        .unwrap();

    let orders = database(reconciler.catalog(), &staging, "orders");
    assert_eq!(orders.sync_status, SyncStatus::Ok);
    assert_eq!(orders.last_successful_sync_ts, 50);
}

#[test]
fn test_sync_timestamp_never_moves_backwards() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    let live = snapshot(&[("orders", &["items"])]);

    reconciler.apply_at(&prod, &live, 200).unwrap();
    reconciler.apply_at(&prod, &live, 150).unwrap();

    let orders = database(reconciler.catalog(), &prod, "orders");
    assert_eq!(orders.last_successful_sync_ts, 200);
    assert_eq!(tables(reconciler.catalog(), &orders)[0].last_successful_sync_ts, 200);
}

#[test]
fn test_live_attributes_are_recorded_on_create() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    let live = LiveSchemaSnapshot::new(vec![LiveDatabase::new("orders")
        .with_charset("latin1", "latin1_swedish_ci")
        .with_table(LiveTable {
            engine: "InnoDB".to_string(),
            row_count: 42,
            data_size: 16384,
            comment: "line items".to_string(),
            ..LiveTable::new("items")
        })]);

    reconciler.apply_at(&prod, &live, 100).unwrap();

    let orders = database(reconciler.catalog(), &prod, "orders");
    assert_eq!(orders.character_set, "latin1");
    assert_eq!(orders.collation, "latin1_swedish_ci");
    let items = &tables(reconciler.catalog(), &orders)[0];
    assert_eq!(items.table_type, "BASE TABLE");
    assert_eq!(items.engine, "InnoDB");
    assert_eq!(items.row_count, 42);
    assert_eq!(items.data_size, 16384);
    assert_eq!(items.comment, "line items");
}

#[test]
fn test_catalog_only_tables_are_left_alone() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    reconciler
        .apply_at(&prod, &snapshot(&[("orders", &["items", "legacy"])]), 100)
        .unwrap();

    reconciler
        .apply_at(&prod, &snapshot(&[("orders", &["items"])]), 200)
        .unwrap();

    let orders = database(reconciler.catalog(), &prod, "orders");
    let legacy = tables(reconciler.catalog(), &orders)
        .into_iter()
        .find(|t| t.name == "legacy")
        .unwrap();
    assert_eq!(legacy.sync_status, SyncStatus::Ok);
    assert_eq!(legacy.last_successful_sync_ts, 100);
}

#[tokio::test]
async fn test_synchronize_through_introspector() {
    let reconciler = Reconciler::new(SqliteCatalog::open_in_memory().unwrap());
    let prod = instance(1, "prod");
    let introspector = StaticIntrospector::new(snapshot(&[("orders", &["items"])]));

    let summary = reconciler
        .try_synchronize(&prod, &introspector)
        .await
        .unwrap();
    assert_eq!(summary.databases_created, 1);
    assert_eq!(summary.tables_created, 1);

    let orders = database(reconciler.catalog(), &prod, "orders");
    assert!(orders.last_successful_sync_ts > 0);
    assert_eq!(
        reconciler
            .catalog()
            .find_tables(&schemasync::catalog::TableFind::by_database(orders.id))
            .unwrap()[0]
            .last_successful_sync_ts,
        orders.last_successful_sync_ts
    );
}
