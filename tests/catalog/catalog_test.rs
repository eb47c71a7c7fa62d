use schemasync::catalog::{
    ActorId, Catalog, CatalogError, DatabaseCreate, DatabaseFind, DatabaseId, DatabasePatch,
    EntityKind, InstanceId, SqliteCatalog, SyncStatus, TableCreate, TableFind, DEFAULT_PROJECT,
    SYSTEM_ACTOR,
};
use schemasync::config::ConnectionConfig;
use schemasync::introspect::{LiveDatabase, LiveSchemaSnapshot, LiveTable};
use schemasync::sync::{Instance, Reconciler};

fn orders(instance_id: i64) -> DatabaseCreate {
    DatabaseCreate {
        creator_id: SYSTEM_ACTOR,
        project_id: DEFAULT_PROJECT,
        instance_id: InstanceId::new(instance_id),
        name: "orders".to_string(),
        character_set: "utf8mb4".to_string(),
        collation: "utf8mb4_general_ci".to_string(),
        sync_ts: 100,
    }
}

fn items(database_id: DatabaseId) -> TableCreate {
    TableCreate {
        creator_id: SYSTEM_ACTOR,
        database_id,
        name: "items".to_string(),
        table_type: "BASE TABLE".to_string(),
        engine: "InnoDB".to_string(),
        collation: "utf8mb4_general_ci".to_string(),
        row_count: 10,
        data_size: 16384,
        index_size: 0,
        data_free: 0,
        create_options: String::new(),
        comment: String::new(),
        sync_ts: 100,
    }
}

#[test]
fn test_catalog_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("nested").join("catalog.db");

    {
        let catalog = SqliteCatalog::open(&path).unwrap();
        let db = catalog.create_database(&orders(1)).unwrap();
        catalog.create_table(&items(db.id)).unwrap();
    }

    let catalog = SqliteCatalog::open(&path).unwrap();
    let databases = catalog
        .find_databases(&DatabaseFind::by_instance(InstanceId::new(1)))
        .unwrap();
    assert_eq!(databases.len(), 1);
    assert_eq!(databases[0].name, "orders");

    let tables = catalog
        .find_tables(&TableFind::by_database(databases[0].id))
        .unwrap();
    assert_eq!(tables.len(), 1);
    assert_eq!(tables[0].row_count, 10);
}

#[test]
fn test_audit_columns() {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    let created = catalog.create_database(&orders(1)).unwrap();
    assert_eq!(created.creator_id, SYSTEM_ACTOR);
    assert_eq!(created.updater_id, SYSTEM_ACTOR);
    assert!(created.created_ts > 0);
    assert_eq!(created.project_id, DEFAULT_PROJECT);

    let operator = ActorId::new(42);
    let patched = catalog
        .patch_database(&DatabasePatch {
            id: created.id,
            updater_id: operator,
            sync_status: Some(SyncStatus::NotFound),
            last_successful_sync_ts: Some(200),
        })
        .unwrap();
    assert_eq!(patched.creator_id, SYSTEM_ACTOR);
    assert_eq!(patched.updater_id, operator);
    assert_eq!(patched.created_ts, created.created_ts);
    assert!(patched.updated_ts >= created.updated_ts);
    assert_eq!(patched.sync_status, SyncStatus::NotFound);
}

#[test]
fn test_uniqueness_is_scoped() {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    let first = catalog.create_database(&orders(1)).unwrap();
    let other_instance = catalog.create_database(&orders(2)).unwrap();
    assert_ne!(first.id, other_instance.id);

    let err = catalog.create_database(&orders(1)).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::Conflict {
            entity: EntityKind::Database,
            ..
        }
    ));

    catalog.create_table(&items(first.id)).unwrap();
    catalog.create_table(&items(other_instance.id)).unwrap();
    let err = catalog.create_table(&items(first.id)).unwrap_err();
    assert!(err.is_conflict());
    assert_eq!(err.to_string(), "table name already exists: items");
}

#[test]
fn test_find_filters_combine() {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    catalog.create_database(&orders(1)).unwrap();
    catalog
        .create_database(&DatabaseCreate {
            name: "billing".to_string(),
            ..orders(1)
        })
        .unwrap();
    catalog.create_database(&orders(2)).unwrap();

    let named = catalog
        .find_databases(&DatabaseFind {
            instance_id: Some(InstanceId::new(1)),
            name: Some("billing".to_string()),
            ..DatabaseFind::default()
        })
        .unwrap();
    assert_eq!(named.len(), 1);
    assert_eq!(named[0].name, "billing");

    let everything = catalog.find_databases(&DatabaseFind::default()).unwrap();
    assert_eq!(everything.len(), 3);
    assert!(everything.windows(2).all(|w| w[0].id < w[1].id));
}

#[test]
fn test_table_requires_existing_database() {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    let err = catalog.create_table(&items(DatabaseId::new(99))).unwrap_err();
    assert!(matches!(
        err,
        CatalogError::NotFound {
            entity: EntityKind::Database,
            id: 99
        }
    ));
}

#[test]
fn test_find_table_by_name() {
    let catalog = SqliteCatalog::open_in_memory().unwrap();
    let db = catalog.create_database(&orders(1)).unwrap();
    catalog.create_table(&items(db.id)).unwrap();

    assert!(catalog
        .find_table(&TableFind::by_name(db.id, "items"))
        .unwrap()
        .is_some());
    assert!(catalog
        .find_table(&TableFind::by_name(db.id, "Items"))
        .unwrap()
        .is_none());
}

#[test]
fn test_reconciled_state_survives_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("catalog.db");
    let prod = Instance {
        id: InstanceId::new(1),
        name: "prod".to_string(),
        connection: ConnectionConfig::mysql("localhost", "root", ""),
    };
    let live = LiveSchemaSnapshot::new(vec![
        LiveDatabase::new("orders").with_table(LiveTable::new("items"))
    ]);

    Reconciler::new(SqliteCatalog::open(&path).unwrap())
        .apply_at(&prod, &live, 100)
        .unwrap();

    let reconciler = Reconciler::new(SqliteCatalog::open(&path).unwrap());
    let summary = reconciler
        .apply_at(&prod, &LiveSchemaSnapshot::default(), 200)
        .unwrap();
    assert_eq!(summary.databases_missing, 1);

    let stored = reconciler
        .catalog()
        .find_databases(&DatabaseFind::by_instance(prod.id))
        .unwrap();
    assert_eq!(stored[0].sync_status, SyncStatus::NotFound);
    assert_eq!(stored[0].last_successful_sync_ts, 200);
}
