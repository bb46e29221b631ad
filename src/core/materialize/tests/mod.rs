
use crate::core::query::{ClassQuery, QueryTable, compile};
use crate::core::result::FieldValue;
use crate::core::session::fixture::FixtureRow;

pub(super) fn process_rows() -> Vec<FixtureRow> {
    vec![
        vec![("Name", "a.exe".into()), ("ProcessId", FieldValue::Int(10))],
        vec![("Name", "b.exe".into()), ("ProcessId", FieldValue::Int(20))],
    ]
}

pub(super) fn table(classes: &[ClassQuery]) -> QueryTable {
    compile(classes)
}

pub(super) const PROCESS_QUERY: &str = "SELECT Name,ProcessId FROM Win32_Process";
