//! Toggle-relationship engine.
//!
//! One relationship row may exist per (subject, object) pair; toggling
//! creates the row when absent and removes it when present. The unique
//! constraint at the storage layer is the authority for the pair
//! invariant. An insert that loses a race to a concurrent toggle is
//! treated as "already present" and the engine reports the actual
//! resulting state instead of surfacing the conflict.

use serde::Serialize;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

/// Static description of one relationship kind
#[derive(Debug, Clone, Copy)]
pub struct RelationSpec {
    pub table: &'static str,
    pub subject_col: &'static str,
    pub object_col: &'static str,
    pub object_table: &'static str,
    pub object_name: &'static str,
    pub forbid_self: bool,
}

/// follower -> followed; the only kind where subject and object share a
/// table, so self-pairs are a domain error
pub const FOLLOWS: RelationSpec = RelationSpec {
    table: "follows",
    subject_col: "follower_id",
    object_col: "followed_id",
    object_table: "users",
    object_name: "User",
    forbid_self: true,
};

pub const FAVOURITES: RelationSpec = RelationSpec {
    table: "favourites",
    subject_col: "user_id",
    object_col: "series_id",
    object_table: "series",
    object_name: "Series",
    forbid_self: false,
};

pub const TRACKINGS: RelationSpec = RelationSpec {
    table: "trackings",
    subject_col: "user_id",
    object_col: "series_id",
    object_table: "series",
    object_name: "Series",
    forbid_self: false,
};

pub const LIST_ENTRIES: RelationSpec = RelationSpec {
    table: "list_entries",
    subject_col: "list_id",
    object_col: "series_id",
    object_table: "series",
    object_name: "Series",
    forbid_self: false,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ToggleAction {
    Added,
    Removed,
}

impl ToggleAction {
    /// Classify the toggle from its row effects. A delete that removed a
    /// row means the pair existed; otherwise the insert either created
    /// the row or lost the race to a concurrent create, and both leave
    /// the pair present.
    fn from_effects(deleted_rows: u64, inserted_rows: u64) -> ToggleAction {
        if deleted_rows > 0 {
            ToggleAction::Removed
        } else {
            if inserted_rows == 0 {
                tracing::debug!("Toggle insert lost a concurrent race; reporting resulting state");
            }
            ToggleAction::Added
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ToggleOutcome {
    pub action: ToggleAction,
    pub subject_id: Uuid,
    pub object_id: Uuid,
}

#[derive(Debug, thiserror::Error)]
pub enum RelationError {
    #[error("relationship subject and object coincide")]
    SelfReference,
    #[error("{0} does not exist")]
    ObjectMissing(&'static str),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

fn exists_sql(spec: &RelationSpec) -> String {
    format!("SELECT 1 FROM \"{}\" WHERE id = $1", spec.object_table)
}

fn delete_sql(spec: &RelationSpec) -> String {
    format!(
        "DELETE FROM \"{}\" WHERE \"{}\" = $1 AND \"{}\" = $2",
        spec.table, spec.subject_col, spec.object_col
    )
}

fn insert_sql(spec: &RelationSpec) -> String {
    format!(
        "INSERT INTO \"{t}\" (\"{s}\", \"{o}\") VALUES ($1, $2) ON CONFLICT (\"{s}\", \"{o}\") DO NOTHING",
        t = spec.table,
        s = spec.subject_col,
        o = spec.object_col
    )
}

/// Toggle a relationship in its own transaction
pub async fn toggle(
    pool: &PgPool,
    spec: &RelationSpec,
    subject_id: Uuid,
    object_id: Uuid,
) -> Result<ToggleOutcome, RelationError> {
    let mut tx = pool.begin().await?;
    let outcome = toggle_tx(&mut tx, spec, subject_id, object_id).await?;
    tx.commit().await?;
    Ok(outcome)
}

/// Toggle inside a caller-supplied transaction, for operations that
/// attach further writes (e.g. a follow notification) atomically.
pub async fn toggle_tx(
    tx: &mut Transaction<'_, Postgres>,
    spec: &RelationSpec,
    subject_id: Uuid,
    object_id: Uuid,
) -> Result<ToggleOutcome, RelationError> {
    // Domain precondition, not a storage concern
    if spec.forbid_self && subject_id == object_id {
        return Err(RelationError::SelfReference);
    }

    // Foreign-key existence resolved before the create/delete branch
    let object_present = sqlx::query(&exists_sql(spec))
        .bind(object_id)
        .fetch_optional(&mut **tx)
        .await?
        .is_some();
    if !object_present {
        return Err(RelationError::ObjectMissing(spec.object_name));
    }

    let deleted = sqlx::query(&delete_sql(spec))
        .bind(subject_id)
        .bind(object_id)
        .execute(&mut **tx)
        .await?
        .rows_affected();

    let inserted = if deleted == 0 {
        sqlx::query(&insert_sql(spec))
            .bind(subject_id)
            .bind(object_id)
            .execute(&mut **tx)
            .await?
            .rows_affected()
    } else {
        0
    };

    Ok(ToggleOutcome {
        action: ToggleAction::from_effects(deleted, inserted),
        subject_id,
        object_id,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn delete_hit_means_removed() {
        assert_eq!(ToggleAction::from_effects(1, 0), ToggleAction::Removed);
    }

    #[test]
    fn clean_insert_means_added() {
        assert_eq!(ToggleAction::from_effects(0, 1), ToggleAction::Added);
    }

    #[test]
    fn lost_insert_race_reports_resulting_state() {
        // A concurrent toggle inserted first; the row exists, so the
        // caller is told "added" rather than seeing a conflict
        assert_eq!(ToggleAction::from_effects(0, 0), ToggleAction::Added);
    }

    #[test]
    fn consecutive_toggles_invert() {
        // Simulate the persisted pair through two sequential toggles
        let mut present = false;

        let first = if present {
            present = false;
            ToggleAction::from_effects(1, 0)
        } else {
            present = true;
            ToggleAction::from_effects(0, 1)
        };
        assert_eq!(first, ToggleAction::Added);
        assert!(present);

        let second = if present {
            present = false;
            ToggleAction::from_effects(1, 0)
        } else {
            present = true;
            ToggleAction::from_effects(0, 1)
        };
        assert_eq!(second, ToggleAction::Removed);
        assert!(!present, "two toggles return the pair to its original state");
    }

    #[test]
    fn insert_statement_defers_to_unique_constraint() {
        let sql = insert_sql(&FOLLOWS);
        assert!(sql.contains("ON CONFLICT (\"follower_id\", \"followed_id\") DO NOTHING"));
    }

    #[test]
    fn statements_address_the_spec_tables() {
        assert_eq!(
            delete_sql(&FAVOURITES),
            "DELETE FROM \"favourites\" WHERE \"user_id\" = $1 AND \"series_id\" = $2"
        );
        assert_eq!(exists_sql(&TRACKINGS), "SELECT 1 FROM \"series\" WHERE id = $1");
    }

    #[test]
    fn only_follows_forbid_self_pairs() {
        assert!(FOLLOWS.forbid_self);
        assert!(!FAVOURITES.forbid_self);
        assert!(!TRACKINGS.forbid_self);
        assert!(!LIST_ENTRIES.forbid_self);
    }

    #[test]
    fn action_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&ToggleAction::Added).unwrap(), "\"added\"");
        assert_eq!(serde_json::to_string(&ToggleAction::Removed).unwrap(), "\"removed\"");
    }
}
