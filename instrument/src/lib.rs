//! Session recording for balance analysis.
//!
//! A `tracing` subscriber turns every structured event into a row of the
//! table named after the event's target. Columns appear the first time a
//! field is seen; rows that lack a field get the column's zero value.
//!
//! ```ignore
//! // In game code:
//! tracing::info!(target: "sale", clock_ms, faction = ?faction, proceeds);
//!
//! // In a test:
//! let log = tracing::subscriber::with_default(instrument::EventSubscriber, || {
//!     // ... play ...
//!     instrument::take()
//! });
//! let sales = log.table("sale").unwrap().to_dataframe()?;
//! ```

use std::cell::RefCell;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use tracing::field::{Field, Visit};
use tracing::span::{Attributes, Record};
use tracing::{Event, Id, Metadata, Subscriber};

// ============================================================================
// Values and columns
// ============================================================================

/// One recorded field value
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    U64(u64),
    I64(i64),
    F64(f64),
    Bool(bool),
    Str(String),
}

/// A column of values sharing one type.
#[derive(Debug, Clone, PartialEq)]
pub enum TypedColumn {
    U64(Vec<u64>),
    I64(Vec<i64>),
    F64(Vec<f64>),
    Bool(Vec<bool>),
    Str(Vec<String>),
}

impl TypedColumn {
    /// Column typed after `value`, holding `rows` zero values
    fn backfilled(value: &Value, rows: usize) -> Self {
        match value {
            Value::U64(_) => TypedColumn::U64(vec![0; rows]),
            Value::I64(_) => TypedColumn::I64(vec![0; rows]),
            Value::F64(_) => TypedColumn::F64(vec![0.0; rows]),
            Value::Bool(_) => TypedColumn::Bool(vec![false; rows]),
            Value::Str(_) => TypedColumn::Str(vec![String::new(); rows]),
        }
    }

    /// Append a value. Integers widen into float columns; any other
    /// mismatch is stored as the zero value.
    fn push(&mut self, value: Value) {
        match (self, value) {
            (TypedColumn::U64(v), Value::U64(x)) => v.push(x),
            (TypedColumn::I64(v), Value::I64(x)) => v.push(x),
            (TypedColumn::I64(v), Value::U64(x)) => v.push(i64::try_from(x).unwrap_or(i64::MAX)),
            (TypedColumn::F64(v), Value::F64(x)) => v.push(x),
            (TypedColumn::F64(v), Value::U64(x)) => v.push(x as f64),
            (TypedColumn::F64(v), Value::I64(x)) => v.push(x as f64),
            (TypedColumn::Bool(v), Value::Bool(x)) => v.push(x),
            (TypedColumn::Str(v), Value::Str(x)) => v.push(x),
            (column, _) => column.push_zero(),
        }
    }

    fn push_zero(&mut self) {
        match self {
            TypedColumn::U64(v) => v.push(0),
            TypedColumn::I64(v) => v.push(0),
            TypedColumn::F64(v) => v.push(0.0),
            TypedColumn::Bool(v) => v.push(false),
            TypedColumn::Str(v) => v.push(String::new()),
        }
    }

    pub fn len(&self) -> usize {
        match self {
            TypedColumn::U64(v) => v.len(),
            TypedColumn::I64(v) => v.len(),
            TypedColumn::F64(v) => v.len(),
            TypedColumn::Bool(v) => v.len(),
            TypedColumn::Str(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

// ============================================================================
// Tables - one per tracing target
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventTable {
    columns: BTreeMap<&'static str, TypedColumn>,
    rows: usize,
}

impl EventTable {
    /// Append one row. Every column ends up exactly `rows` long.
    pub fn push_row(&mut self, fields: Vec<(&'static str, Value)>) {
        for (name, value) in fields {
            let rows = self.rows;
            let column = self
                .columns
                .entry(name)
                .or_insert_with(|| TypedColumn::backfilled(&value, rows));
            // A field repeated within one event keeps its first value
            if column.len() == rows {
                column.push(value);
            }
        }
        self.rows += 1;
        for column in self.columns.values_mut() {
            if column.len() < self.rows {
                column.push_zero();
            }
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn column(&self, name: &str) -> Option<&TypedColumn> {
        self.columns.get(name)
    }

    pub fn column_names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.columns.keys().copied()
    }

    /// Numeric column as floats, whatever integer type it was recorded as
    pub fn f64_values(&self, name: &str) -> Option<Vec<f64>> {
        match self.columns.get(name)? {
            TypedColumn::U64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TypedColumn::I64(v) => Some(v.iter().map(|&x| x as f64).collect()),
            TypedColumn::F64(v) => Some(v.clone()),
            TypedColumn::Bool(_) | TypedColumn::Str(_) => None,
        }
    }

    pub fn str_values(&self, name: &str) -> Option<&[String]> {
        match self.columns.get(name)? {
            TypedColumn::Str(v) => Some(v),
            _ => None,
        }
    }
}

/// Every table recorded in a session, keyed by tracing target
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EventLog {
    tables: BTreeMap<String, EventTable>,
}

impl EventLog {
    pub fn table(&self, target: &str) -> Option<&EventTable> {
        self.tables.get(target)
    }

    pub fn targets(&self) -> impl Iterator<Item = &str> {
        self.tables.keys().map(String::as_str)
    }

    /// Rows recorded under `target`, zero if it never fired
    pub fn count(&self, target: &str) -> usize {
        self.tables.get(target).map_or(0, EventTable::rows)
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }

    fn record(&mut self, target: &str, fields: Vec<(&'static str, Value)>) {
        if let Some(table) = self.tables.get_mut(target) {
            table.push_row(fields);
        } else {
            let mut table = EventTable::default();
            table.push_row(fields);
            self.tables.insert(target.to_string(), table);
        }
    }
}

thread_local! {
    static LOG: RefCell<EventLog> = RefCell::default();
}

/// Take everything recorded on this thread so far
pub fn take() -> EventLog {
    LOG.with(|log| std::mem::take(&mut *log.borrow_mut()))
}

/// Discard everything recorded on this thread so far
pub fn reset() {
    LOG.with(|log| *log.borrow_mut() = EventLog::default());
}

// ============================================================================
// Subscriber
// ============================================================================

#[derive(Default)]
struct RowVisitor {
    fields: Vec<(&'static str, Value)>,
}

impl Visit for RowVisitor {
    fn record_u64(&mut self, field: &Field, value: u64) {
        self.fields.push((field.name(), Value::U64(value)));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.fields.push((field.name(), Value::I64(value)));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.fields.push((field.name(), Value::F64(value)));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.fields.push((field.name(), Value::Bool(value)));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.fields.push((field.name(), Value::Str(value.to_string())));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        self.fields.push((field.name(), Value::Str(format!("{value:?}"))));
    }
}

/// Subscriber that records info-level events into this thread's event log.
/// Spans are ignored.
pub struct EventSubscriber;

impl Subscriber for EventSubscriber {
    fn enabled(&self, metadata: &Metadata<'_>) -> bool {
        metadata.is_event() && *metadata.level() <= tracing::Level::INFO
    }

    fn new_span(&self, _span: &Attributes<'_>) -> Id {
        Id::from_u64(1)
    }

    fn record(&self, _span: &Id, _values: &Record<'_>) {}

    fn record_follows_from(&self, _span: &Id, _follows: &Id) {}

    fn event(&self, event: &Event<'_>) {
        let mut visitor = RowVisitor::default();
        event.record(&mut visitor);
        let target = event.metadata().target();
        LOG.with(|log| log.borrow_mut().record(target, visitor.fields));
    }

    fn enter(&self, _span: &Id) {}

    fn exit(&self, _span: &Id) {}
}

/// Install the subscriber for the whole process. Later calls are ignored.
pub fn install_subscriber() {
    let _ = tracing::subscriber::set_global_default(EventSubscriber);
}

// ============================================================================
// Polars integration
// ============================================================================

use polars::prelude::*;

impl EventTable {
    pub fn to_dataframe(&self) -> PolarsResult<DataFrame> {
        let columns = self
            .columns
            .iter()
            .map(|(&name, column)| match column {
                TypedColumn::U64(v) => Column::new(name.into(), v),
                TypedColumn::I64(v) => Column::new(name.into(), v),
                TypedColumn::F64(v) => Column::new(name.into(), v),
                TypedColumn::Bool(v) => Column::new(name.into(), v),
                TypedColumn::Str(v) => Column::new(name.into(), v),
            })
            .collect();
        DataFrame::new(columns)
    }
}

impl EventLog {
    pub fn to_dataframes(&self) -> PolarsResult<BTreeMap<String, DataFrame>> {
        self.tables
            .iter()
            .map(|(target, table)| Ok((target.clone(), table.to_dataframe()?)))
            .collect()
    }
}

fn io_error(error: std::io::Error) -> PolarsError {
    PolarsError::IO {
        error: error.into(),
        msg: None,
    }
}

/// Write each frame as `{dir}/{target}.parquet`
pub fn save_parquet(frames: &mut BTreeMap<String, DataFrame>, dir: &Path) -> PolarsResult<()> {
    std::fs::create_dir_all(dir).map_err(io_error)?;
    for (target, frame) in frames.iter_mut() {
        let file = std::fs::File::create(dir.join(format!("{target}.parquet"))).map_err(io_error)?;
        ParquetWriter::new(file).finish(frame)?;
    }
    Ok(())
}

/// Keep letters and digits, replace the rest with `_`
fn session_slug(name: &str) -> String {
    name.chars()
        .take(60)
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}

/// Records one play session and writes it out as parquet when dropped.
///
/// Creating the recorder discards anything previously recorded on this
/// thread. Output goes to `{parent}/{unix_seconds}_{name}/`, followed by an
/// empty `_ready` file once every table is written.
pub struct SessionRecorder {
    dir: PathBuf,
    log: Option<EventLog>,
}

impl SessionRecorder {
    pub fn new(parent: impl Into<PathBuf>, name: &str) -> Self {
        let started = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_secs();
        reset();
        install_subscriber();
        Self {
            dir: parent.into().join(format!("{started}_{}", session_slug(name))),
            log: None,
        }
    }

    /// Everything recorded so far. The first call takes the thread's log;
    /// later calls return the same data.
    pub fn log(&mut self) -> &EventLog {
        self.log.get_or_insert_with(take)
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn write(&self, log: &EventLog) -> PolarsResult<usize> {
        let mut frames = log.to_dataframes()?;
        save_parquet(&mut frames, &self.dir)?;
        std::fs::File::create(self.dir.join("_ready")).map_err(io_error)?;
        Ok(frames.len())
    }
}

impl Drop for SessionRecorder {
    fn drop(&mut self) {
        let log = self.log.take().unwrap_or_else(take);
        if log.is_empty() {
            return;
        }
        match self.write(&log) {
            Ok(tables) => eprintln!("SessionRecorder: wrote {tables} tables to {}", self.dir.display()),
            Err(e) => eprintln!("SessionRecorder({}): {e}", self.dir.display()),
        }
    }
}
