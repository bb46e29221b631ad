use tracing::debug;

use super::error::{CollectError, ProviderError};
use super::query::{CompiledQuery, QueryTable};
use super::result::{ClassResult, CycleResult, ResultRow};
use super::session::{Provider, Session};

/// Runs every compiled query through `session` and shapes the rows.
///
/// Fails fast: the first query, count, row or field failure aborts the whole
/// cycle and nothing collected so far is returned.
pub fn materialize<S: Session>(
    session: &mut S,
    queries: &QueryTable,
) -> Result<CycleResult, CollectError> {
    let mut cycle = CycleResult::default();
    for query in queries.iter() {
        let result = materialize_class(session, query)?;
        debug!(
            "Class {} returned {} row(s)",
            query.class_name,
            result.len()
        );
        cycle.insert(&query.class_name, result);
    }
    Ok(cycle)
}

fn materialize_class<S: Session>(
    session: &mut S,
    query: &CompiledQuery,
) -> Result<ClassResult, CollectError> {
    let class = query.class_name.as_str();
    let wrap = |e: ProviderError| CollectError::in_query(e, class, &query.text);

    let results = session.execute(&query.text).map_err(wrap)?;
    let count = session.count(&results).map_err(wrap)?;

    let title_field = query.title_field.as_deref();
    let mut class_result = ClassResult::for_title(title_field);

    for index in 0..count {
        let handle = session.row_at(&results, index).map_err(wrap)?;
        let mut row = ResultRow::default();
        for field in &query.fields {
            let value = session
                .field(&handle, field)
                .map_err(|e| CollectError::in_row(e, class, &query.text, index))?;
            row.insert(field, value);
        }

        match &mut class_result {
            ClassResult::Keyed(map) => {
                let key = title_field
                    .and_then(|t| row.get(t))
                    .and_then(|v| v.as_title())
                    .map(str::to_string)
                    .unwrap_or_else(|| index.to_string());
                map.insert(key, row);
            }
            ClassResult::Listed(rows) => rows.push(row),
        }
    }

    Ok(class_result)
}

/// One provider round trip: open a session, materialize, release.
/// The session is dropped before the outcome is returned.
pub fn collect<P: Provider>(provider: &P, queries: &QueryTable) -> Result<CycleResult, CollectError> {
    let mut session = provider.open().map_err(CollectError::on_open)?;
    let outcome = materialize(&mut session, queries);
    drop(session);
    outcome
}

#[cfg(test)]
mod tests;
