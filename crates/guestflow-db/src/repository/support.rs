//! Helpers shared by the repository implementations: id decoding,
//! count rows and classification of failed statements.

use surrealdb::IndexedResults as Response;
use surrealdb_types::SurrealValue;
use uuid::Uuid;

use crate::error::{ABORT_MARKER, DbError};

/// Row struct for count queries.
#[derive(Debug, SurrealValue)]
pub(crate) struct CountRow {
    pub total: u64,
}

pub(crate) fn parse_uuid(what: &str, raw: &str) -> Result<Uuid, DbError> {
    Uuid::parse_str(raw).map_err(|e| DbError::Decode(format!("invalid {what} UUID: {e}")))
}

pub(crate) fn parse_opt_uuid(what: &str, raw: Option<&str>) -> Result<Option<Uuid>, DbError> {
    raw.map(|s| parse_uuid(what, s)).transpose()
}

/// Check a single-statement response, mapping unique-index violations
/// on `entity` to [`DbError::Duplicate`].
pub(crate) fn checked(response: Response, entity: &str) -> Result<Response, DbError> {
    response.check().map_err(|e| classify(entity, e))
}

/// Settle a `BEGIN ... COMMIT` response.
///
/// When a transaction aborts, every statement reports a failure but only
/// the one that raised carries the reason, so all errors are inspected
/// and a repository `THROW` takes precedence over the generic ones.
pub(crate) fn settle(mut response: Response, entity: &str) -> Result<Response, DbError> {
    let mut errors: Vec<(usize, surrealdb::Error)> = response.take_errors().into_iter().collect();
    if errors.is_empty() {
        return Ok(response);
    }
    errors.sort_by_key(|(index, _)| *index);

    if let Some(pos) = errors
        .iter()
        .position(|(_, e)| e.to_string().contains(ABORT_MARKER))
    {
        let (_, error) = errors.swap_remove(pos);
        return Err(classify(entity, error));
    }
    let (_, first) = errors.remove(0);
    Err(classify(entity, first))
}

fn classify(entity: &str, error: surrealdb::Error) -> DbError {
    let message = error.to_string();
    if let Some(abort) = parse_abort(&message) {
        return abort;
    }
    if message.contains("already contains") {
        return DbError::Duplicate {
            entity: entity.into(),
            reason: message,
        };
    }
    DbError::Surreal(error)
}

/// Decode `gf:<kind>[:<detail>]` raised by a repository transaction.
fn parse_abort(message: &str) -> Option<DbError> {
    let start = message.find(ABORT_MARKER)?;
    let payload = message[start + ABORT_MARKER.len()..]
        .trim_end_matches(|c: char| c == '\'' || c == '"' || c == '`' || c.is_whitespace());
    let (kind, rest) = payload.split_once(':').unwrap_or((payload, ""));
    let mut parts = rest.splitn(2, ':');
    let first = parts.next().unwrap_or_default().to_string();
    let second = parts.next().unwrap_or_default().to_string();

    match kind {
        "not_found" => Some(DbError::NotFound {
            entity: first,
            id: second,
        }),
        "invalid_reference" => Some(DbError::InvalidReference {
            entity: first,
            id: second,
        }),
        "invalid_transition" => Some(DbError::InvalidTransition {
            from: first,
            action: second,
        }),
        "table_conflict" => Some(DbError::TableConflict { table_id: first }),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_thrown_transition() {
        let err = parse_abort("An error occurred: gf:invalid_transition:completed:cancel").unwrap();
        match err {
            DbError::InvalidTransition { from, action } => {
                assert_eq!(from, "completed");
                assert_eq!(action, "cancel");
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn parses_thrown_conflict_with_uuid() {
        let id = Uuid::new_v4().to_string();
        let msg = format!("An error occurred: gf:table_conflict:{id}");
        match parse_abort(&msg).unwrap() {
            DbError::TableConflict { table_id } => assert_eq!(table_id, id),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn ignores_foreign_messages() {
        assert!(parse_abort("The query was not executed due to a failed transaction").is_none());
    }
}
