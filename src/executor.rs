use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, InterruptHandle, OpenFlags};
use serde_json::Value;
use tracing::debug;

use crate::error::{Error, Result};

pub type QueryRow = serde_json::Map<String, Value>;

#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    fn check(&self) -> Result<()> {
        if self.is_aborted() {
            Err(Error::Aborted)
        } else {
            Ok(())
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct QueryOptions {
    pub abort: Option<AbortSignal>,
}

impl QueryOptions {
    pub fn with_abort(signal: AbortSignal) -> Self {
        Self {
            abort: Some(signal),
        }
    }

    pub fn check_abort(&self) -> Result<()> {
        match self.abort.as_ref() {
            Some(signal) => signal.check(),
            None => Ok(()),
        }
    }
}

pub trait QueryExecutor {
    fn execute(&self, query: &str, options: &QueryOptions) -> Result<Vec<QueryRow>>;
}

pub struct SqliteExecutor {
    conn: Mutex<Connection>,
    interrupt: InterruptHandle,
}

impl SqliteExecutor {
    pub fn new(conn: Connection) -> Self {
        let interrupt = conn.get_interrupt_handle();
        Self {
            conn: Mutex::new(conn),
            interrupt,
        }
    }

    pub fn open_readonly(path: &Path) -> Result<Self> {
        let conn = Connection::open_with_flags(path, OpenFlags::SQLITE_OPEN_READ_ONLY)?;
        apply_read_pragmas(&conn)?;
        Ok(Self::new(conn))
    }

    pub fn interrupt(&self) {
        self.interrupt.interrupt();
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| Error::Query("sqlite connection lock poisoned".to_string()))
    }
}

fn apply_read_pragmas(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        "
        PRAGMA query_only = ON;
        PRAGMA temp_store = MEMORY;
        ",
    )?;
    Ok(())
}

impl QueryExecutor for SqliteExecutor {
    fn execute(&self, query: &str, options: &QueryOptions) -> Result<Vec<QueryRow>> {
        options.check_abort()?;
        let conn = self.lock()?;
        let rows = run_query(&conn, query).map_err(map_sqlite_error)?;
        // A result that arrives after the request was superseded is stale.
        options.check_abort()?;
        debug!(rows = rows.len(), "sqlite query finished");
        Ok(rows)
    }
}

fn run_query(conn: &Connection, query: &str) -> rusqlite::Result<Vec<QueryRow>> {
    let mut stmt = conn.prepare(query)?;
    let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut record = QueryRow::new();
        for (idx, name) in names.iter().enumerate() {
            record.insert(name.clone(), json_value(row.get_ref(idx)?));
        }
        out.push(record);
    }
    Ok(out)
}

fn json_value(value: ValueRef<'_>) -> Value {
    match value {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(int) => Value::from(int),
        ValueRef::Real(real) => serde_json::Number::from_f64(real)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        ValueRef::Text(text) => Value::String(String::from_utf8_lossy(text).into_owned()),
        ValueRef::Blob(_) => Value::Null,
    }
}

fn map_sqlite_error(err: rusqlite::Error) -> Error {
    match &err {
        rusqlite::Error::SqliteFailure(failure, _)
            if failure.code == ErrorCode::OperationInterrupted =>
        {
            Error::Aborted
        }
        _ => Error::Sqlite(err),
    }
}
