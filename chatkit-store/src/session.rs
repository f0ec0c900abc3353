//! The storage session: one SQLite connection plus the identity cache.
//!
//! A session owns the tables of every kind in its [`EntityRegistry`] and
//! exposes the primitives the lifecycle manager builds on: insert-or-replace,
//! update and delete by row id, and filtered selects.

use chatkit_model::{Entity, EntityRegistry, EntitySchema, ROW_ID, Record, Row};
use chatkit_types::{RowId, Value};
use lru::LruCache;
use rusqlite::types::{ToSqlOutput, Type, ValueRef};
use rusqlite::{Connection, ToSql, params, params_from_iter};
use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::{DatabaseTarget, SessionConfig};
use crate::error::{StoreError, StoreResult};
use crate::query::{Filter, QueryBuilder};

type CacheKey = (&'static str, RowId);

/// Counters describing the work a session has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// SQL statements executed, schema creation included.
    pub statements: u64,
    /// Rows served from the identity cache instead of SQLite.
    pub cache_hits: u64,
    /// Times the identity cache was cleared.
    pub cache_clears: u64,
}

#[derive(Default)]
struct Counters {
    statements: AtomicU64,
    cache_hits: AtomicU64,
    cache_clears: AtomicU64,
}

struct SessionInner {
    conn: Mutex<Connection>,
    cache: Mutex<LruCache<CacheKey, Row>>,
    registry: EntityRegistry,
    config: SessionConfig,
    counters: Counters,
}

/// Explicit handle to the backing store.
///
/// Cloning is cheap and shares the connection. Calls are synchronous and
/// serialized on the connection; nothing here spans more than one statement
/// or coordinates concurrent writers.
#[derive(Clone)]
pub struct Session {
    inner: Arc<SessionInner>,
}

impl Session {
    /// Opens the configured database and creates tables for every registered kind.
    pub fn open(config: SessionConfig, registry: EntityRegistry) -> StoreResult<Self> {
        config.validate()?;
        let capacity = NonZeroUsize::new(config.identity_cache_capacity)
            .ok_or_else(|| StoreError::Config("identity cache capacity is zero".into()))?;

        let conn = match &config.database {
            DatabaseTarget::InMemory => Connection::open_in_memory()?,
            DatabaseTarget::File { path } => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                Connection::open(path)?
            }
        };
        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;

        let session = Self {
            inner: Arc::new(SessionInner {
                conn: Mutex::new(conn),
                cache: Mutex::new(LruCache::new(capacity)),
                registry,
                config,
                counters: Counters::default(),
            }),
        };
        session.init_schema()?;
        debug!(database = ?session.inner.config.database, "Session opened");
        Ok(session)
    }

    /// Opens an in-memory session (for testing).
    pub fn open_in_memory(registry: EntityRegistry) -> StoreResult<Self> {
        Self::open(SessionConfig::in_memory(), registry)
    }

    /// Closes the connection. Fails if other handles still share the session.
    pub fn close(self) -> StoreResult<()> {
        let inner = Arc::try_unwrap(self.inner)
            .map_err(|shared| StoreError::SessionInUse(Arc::strong_count(&shared) - 1))?;
        let conn = inner
            .conn
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        conn.close().map_err(|(_, e)| StoreError::Database(e))?;
        debug!("Session closed");
        Ok(())
    }

    #[must_use]
    pub fn registry(&self) -> &EntityRegistry {
        &self.inner.registry
    }

    #[must_use]
    pub fn config(&self) -> &SessionConfig {
        &self.inner.config
    }

    #[must_use]
    pub fn stats(&self) -> SessionStats {
        let counters = &self.inner.counters;
        SessionStats {
            statements: counters.statements.load(Ordering::Relaxed),
            cache_hits: counters.cache_hits.load(Ordering::Relaxed),
            cache_clears: counters.cache_clears.load(Ordering::Relaxed),
        }
    }

    /// Starts a query over `T`.
    #[must_use]
    pub fn query<T: Record>(&self) -> QueryBuilder<'_, T> {
        QueryBuilder::new(self)
    }

    /// Loads one entity by its internal identifier.
    pub fn load<T: Record>(&self, id: RowId) -> StoreResult<Option<T>> {
        self.load_row(T::SCHEMA, id)?
            .map(|row| T::from_row(&row))
            .transpose()
            .map_err(Into::into)
    }

    // ── Writes ───────────────────────────────────────────────────

    /// Inserts the entity, replacing any row with the same row id.
    ///
    /// Assigns the row id on first insert.
    pub fn insert_or_replace<E: Entity + ?Sized>(&self, entity: &mut E) -> StoreResult<RowId> {
        let schema = self.registered(entity.schema())?;
        let row = entity.to_row();
        let columns = column_list(schema);
        let placeholders = vec!["?"; schema.properties.len()].join(", ");
        let sql = format!(
            "INSERT OR REPLACE INTO {} ({columns}) VALUES ({placeholders})",
            quoted(schema.table)
        );

        let id = {
            let conn = self.conn();
            self.count_statement();
            conn.execute(&sql, params_from_iter(row.values().iter().map(Bind)))?;
            RowId::new(conn.last_insert_rowid())
        };
        entity.set_row_id(Some(id));
        self.remember(schema, id, entity.to_row());
        Ok(id)
    }

    /// Updates the row matching the entity's row id.
    ///
    /// Returns `false` without writing anything when the entity was never
    /// inserted or its row no longer exists.
    pub fn update<E: Entity + ?Sized>(&self, entity: &E) -> StoreResult<bool> {
        let schema = self.registered(entity.schema())?;
        let Some(id) = entity.row_id() else {
            return Ok(false);
        };
        let row = entity.to_row();
        let assignments = schema.properties[1..]
            .iter()
            .map(|p| format!("{} = ?", quoted(p.column)))
            .collect::<Vec<_>>()
            .join(", ");
        let sql = format!(
            "UPDATE {} SET {assignments} WHERE {} = ?",
            quoted(schema.table),
            quoted(ROW_ID.column)
        );

        let changed = {
            let conn = self.conn();
            self.count_statement();
            let id_value = Value::from(id);
            let values = row.values()[1..].iter().chain(std::iter::once(&id_value));
            conn.execute(&sql, params_from_iter(values.map(Bind)))?
        };
        if changed > 0 {
            self.remember(schema, id, row);
        }
        Ok(changed > 0)
    }

    /// Deletes the row matching the entity's row id, then clears the identity cache.
    ///
    /// The cache is cleared even when the entity was never inserted.
    pub fn delete<E: Entity + ?Sized>(&self, entity: &E) -> StoreResult<bool> {
        let schema = self.registered(entity.schema())?;
        let changed = match entity.row_id() {
            Some(id) => {
                let sql = format!(
                    "DELETE FROM {} WHERE {} = ?1",
                    quoted(schema.table),
                    quoted(ROW_ID.column)
                );
                let conn = self.conn();
                self.count_statement();
                conn.execute(&sql, params![id.get()])?
            }
            None => 0,
        };
        self.clear();
        Ok(changed > 0)
    }

    /// Drops every cached row.
    pub fn clear(&self) {
        self.cache().clear();
        self.inner.counters.cache_clears.fetch_add(1, Ordering::Relaxed);
    }

    // ── Reads ────────────────────────────────────────────────────

    /// Rows matching `filter`, in the order SQLite returns them.
    pub(crate) fn select_rows(
        &self,
        schema: &'static EntitySchema,
        filter: &Filter,
    ) -> StoreResult<Vec<Row>> {
        let schema = self.registered(schema)?;
        let sql = filter.to_sql(schema, &column_list(schema));
        let rows = {
            let conn = self.conn();
            self.count_statement();
            let mut stmt = conn.prepare(&sql)?;
            let width = schema.properties.len();
            stmt.query_map(params_from_iter(filter.params().map(Bind)), |r| read_row(r, width))?
                .collect::<Result<Vec<_>, _>>()?
        };
        for row in &rows {
            if let Some(id) = row.values().first().and_then(Value::as_i64) {
                self.remember(schema, RowId::new(id), row.clone());
            }
        }
        Ok(rows)
    }

    /// Row ids matching `filter`, honoring its order and limit.
    pub(crate) fn select_ids(
        &self,
        schema: &'static EntitySchema,
        filter: &Filter,
    ) -> StoreResult<Vec<RowId>> {
        let schema = self.registered(schema)?;
        let sql = filter.to_sql(schema, &quoted(ROW_ID.column));
        let conn = self.conn();
        self.count_statement();
        let mut stmt = conn.prepare(&sql)?;
        let ids = stmt
            .query_map(params_from_iter(filter.params().map(Bind)), |r| {
                r.get::<_, i64>(0).map(RowId::new)
            })?
            .collect::<Result<Vec<_>, _>>()?;
        Ok(ids)
    }

    pub(crate) fn count_rows(
        &self,
        schema: &'static EntitySchema,
        filter: &Filter,
    ) -> StoreResult<u64> {
        let schema = self.registered(schema)?;
        let sql = filter.to_sql(schema, "COUNT(*)");
        let conn = self.conn();
        self.count_statement();
        let count: i64 =
            conn.query_row(&sql, params_from_iter(filter.params().map(Bind)), |r| r.get(0))?;
        Ok(u64::try_from(count).unwrap_or_default())
    }

    /// One row by id, served from the identity cache when possible.
    pub(crate) fn load_row(
        &self,
        schema: &'static EntitySchema,
        id: RowId,
    ) -> StoreResult<Option<Row>> {
        let schema = self.registered(schema)?;
        if let Some(row) = self.cache().get(&(schema.table, id)).cloned() {
            self.inner.counters.cache_hits.fetch_add(1, Ordering::Relaxed);
            return Ok(Some(row));
        }

        let sql = format!(
            "SELECT {} FROM {} WHERE {} = ?1",
            column_list(schema),
            quoted(schema.table),
            quoted(ROW_ID.column)
        );
        let row = {
            let conn = self.conn();
            self.count_statement();
            let mut stmt = conn.prepare(&sql)?;
            let width = schema.properties.len();
            let mut rows = stmt.query_map(params![id.get()], |r| read_row(r, width))?;
            rows.next().transpose()?
        };
        if let Some(row) = &row {
            self.remember(schema, id, row.clone());
        }
        Ok(row)
    }

    // ── Internals ────────────────────────────────────────────────

    fn init_schema(&self) -> StoreResult<()> {
        let conn = self.conn();
        for schema in self.inner.registry.schemas() {
            let columns = schema
                .properties
                .iter()
                .map(|p| {
                    if p.is_primary_key() {
                        format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quoted(p.column))
                    } else if p.nullable {
                        format!("{} {}", quoted(p.column), p.value_type.sql_type())
                    } else {
                        format!("{} {} NOT NULL", quoted(p.column), p.value_type.sql_type())
                    }
                })
                .collect::<Vec<_>>()
                .join(", ");
            let external = schema.external_id_property().column;
            let ddl = format!(
                "CREATE TABLE IF NOT EXISTS {table} ({columns});
                 CREATE INDEX IF NOT EXISTS {index} ON {table} ({external});",
                table = quoted(schema.table),
                index = quoted(&format!("IDX_{}_{}", schema.table, external)),
                external = quoted(external),
            );
            self.count_statement();
            conn.execute_batch(&ddl)?;
            debug!(kind = %schema.kind, table = schema.table, "Table ready");
        }
        Ok(())
    }

    /// Returns the session's copy of `schema`, failing if the kind has no table here.
    fn registered(&self, schema: &'static EntitySchema) -> StoreResult<&'static EntitySchema> {
        match self.inner.registry.schema(schema.kind.as_str()) {
            Some(known) if known == schema => Ok(known),
            _ => Err(StoreError::UnregisteredKind(schema.kind)),
        }
    }

    fn remember(&self, schema: &'static EntitySchema, id: RowId, row: Row) {
        self.cache().put((schema.table, id), row);
    }

    fn count_statement(&self) {
        self.inner.counters.statements.fetch_add(1, Ordering::Relaxed);
    }

    fn conn(&self) -> MutexGuard<'_, Connection> {
        acquire_lock(&self.inner.conn)
    }

    fn cache(&self) -> MutexGuard<'_, LruCache<CacheKey, Row>> {
        acquire_lock(&self.inner.cache)
    }
}

impl std::fmt::Debug for Session {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("database", &self.inner.config.database)
            .field("registry", &self.inner.registry)
            .finish_non_exhaustive()
    }
}

/// Acquires a mutex, recovering the guard if a previous holder panicked.
fn acquire_lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| {
        warn!("Session mutex was poisoned, recovering");
        poisoned.into_inner()
    })
}

pub(crate) fn quoted(identifier: &str) -> String {
    format!("\"{}\"", identifier.replace('"', "\"\""))
}

fn column_list(schema: &EntitySchema) -> String {
    schema.columns().map(quoted).collect::<Vec<_>>().join(", ")
}

fn read_row(row: &rusqlite::Row<'_>, width: usize) -> rusqlite::Result<Row> {
    let mut values = Vec::with_capacity(width);
    for idx in 0..width {
        let value = match row.get_ref(idx)? {
            ValueRef::Null => Value::Null,
            ValueRef::Integer(i) => Value::Integer(i),
            ValueRef::Real(f) => Value::Real(f),
            ValueRef::Text(t) => {
                let text = std::str::from_utf8(t).map_err(|e| {
                    rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e))
                })?;
                Value::Text(text.to_owned())
            }
            ValueRef::Blob(_) => {
                let name = row.as_ref().column_name(idx)?.to_owned();
                return Err(rusqlite::Error::InvalidColumnType(idx, name, Type::Blob));
            }
        };
        values.push(value);
    }
    Ok(Row::new(values))
}

/// Binds a [`Value`] as a statement parameter.
pub(crate) struct Bind<'a>(pub(crate) &'a Value);

impl ToSql for Bind<'_> {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self.0 {
            Value::Null => ToSqlOutput::Owned(Sql::Null),
            Value::Integer(i) => ToSqlOutput::Owned(Sql::Integer(*i)),
            Value::Real(f) => ToSqlOutput::Owned(Sql::Real(*f)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bool(b) => ToSqlOutput::Owned(Sql::Integer(i64::from(*b))),
        })
    }
}
