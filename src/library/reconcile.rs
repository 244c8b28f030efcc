//! Map one scan record onto the catalog: skip, insert or update.

use sqlx::SqlitePool;

use crate::db::{self, SongFlags};
use crate::error::Result;
use crate::model::ScanRecord;

/// Why an existing row was left alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Soft-deleted by an admin
    Deleted,
    /// Lyrics and cover already resolved
    Collected,
}

/// What the reconciler did with a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reconciled {
    Skipped(SkipReason),
    Inserted(i64),
    Updated,
    /// Insert lost a race on the unique path; the row is already there
    AlreadyExists,
}

impl Reconciled {
    /// The row was written (or found freshly written) this pass.
    pub fn is_touched(self) -> bool {
        !matches!(self, Self::Skipped(_))
    }
}

/// Whether the scanner must leave an existing row alone.
pub fn skip_reason(flags: Option<SongFlags>) -> Option<SkipReason> {
    let flags = flags?;
    if flags.is_deleted {
        Some(SkipReason::Deleted)
    } else if flags.is_collect {
        Some(SkipReason::Collected)
    } else {
        None
    }
}

/// Write `record` according to the row's current flags.
///
/// `flags` is `None` when no row exists for the path. A unique violation on
/// insert comes back as [`Reconciled::AlreadyExists`], never as an error.
pub async fn reconcile(
    pool: &SqlitePool,
    record: &ScanRecord,
    flags: Option<SongFlags>,
) -> Result<Reconciled> {
    if let Some(reason) = skip_reason(flags) {
        return Ok(Reconciled::Skipped(reason));
    }

    if flags.is_some() {
        db::update_song(pool, record).await?;
        tracing::debug!(target: "library", path = %record.rel_path, "Updated song");
        return Ok(Reconciled::Updated);
    }

    match db::insert_song(pool, record).await {
        Ok(id) => {
            tracing::debug!(target: "library", path = %record.rel_path, id, "Inserted song");
            Ok(Reconciled::Inserted(id))
        }
        Err(e) if is_unique_violation(&e) => {
            tracing::debug!(target: "library", path = %record.rel_path, "Song already exists");
            Ok(Reconciled::AlreadyExists)
        }
        Err(e) => Err(e.into()),
    }
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    err.as_database_error()
        .is_some_and(|e| e.is_unique_violation())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::{mock_scan_record, temp_db};

    #[test]
    fn test_skip_reason() {
        assert_eq!(skip_reason(None), None);
        assert_eq!(
            skip_reason(Some(SongFlags {
                is_collect: false,
                is_deleted: false
            })),
            None
        );
        assert_eq!(
            skip_reason(Some(SongFlags {
                is_collect: true,
                is_deleted: true
            })),
            Some(SkipReason::Deleted)
        );
        assert_eq!(
            skip_reason(Some(SongFlags {
                is_collect: true,
                is_deleted: false
            })),
            Some(SkipReason::Collected)
        );
    }

    #[tokio::test]
    async fn test_insert_then_update() {
        let (pool, _dir) = temp_db().await;
        let mut record = mock_scan_record("a.mp3");

        let first = reconcile(&pool, &record, None).await.unwrap();
        assert!(matches!(first, Reconciled::Inserted(_)));

        record.title = "Retitled".to_string();
        let flags = db::get_song_flags(&pool, "a.mp3").await.unwrap();
        assert_eq!(reconcile(&pool, &record, flags).await.unwrap(), Reconciled::Updated);

        let song = db::get_song_by_path(&pool, "a.mp3").await.unwrap().unwrap();
        assert_eq!(song.title, "Retitled");
    }

    #[tokio::test]
    async fn test_stale_flags_insert_is_already_exists() {
        let (pool, _dir) = temp_db().await;
        let record = mock_scan_record("race.mp3");

        reconcile(&pool, &record, None).await.unwrap();
        // Flags looked up before the other writer committed
        let again = reconcile(&pool, &record, None).await.unwrap();

        assert_eq!(again, Reconciled::AlreadyExists);
        assert_eq!(db::count_by_path(&pool, "race.mp3").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_concurrent_inserts_leave_one_row() {
        let (pool, _dir) = temp_db().await;
        let record = mock_scan_record("twice.mp3");

        let (a, b) = tokio::join!(
            reconcile(&pool, &record, None),
            reconcile(&pool, &record, None)
        );
        let outcomes = [a.unwrap(), b.unwrap()];

        assert_eq!(
            outcomes
                .iter()
                .filter(|o| matches!(o, Reconciled::Inserted(_)))
                .count(),
            1
        );
        assert!(outcomes.contains(&Reconciled::AlreadyExists));
        assert_eq!(db::count_by_path(&pool, "twice.mp3").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_deleted_row_is_never_written() {
        let (pool, _dir) = temp_db().await;
        let record = mock_scan_record("gone.mp3");
        let Reconciled::Inserted(id) = reconcile(&pool, &record, None).await.unwrap() else {
            panic!("expected insert");
        };
        db::soft_delete_songs(&pool, &[id]).await.unwrap();

        let mut changed = record.clone();
        changed.title = "Should not land".to_string();
        let flags = db::get_song_flags(&pool, "gone.mp3").await.unwrap();

        assert_eq!(
            reconcile(&pool, &changed, flags).await.unwrap(),
            Reconciled::Skipped(SkipReason::Deleted)
        );
        let song = db::get_song_by_id(&pool, id).await.unwrap().unwrap();
        assert_eq!(song.title, "Test Song");
    }

    #[tokio::test]
    async fn test_update_never_clears_cover() {
        let (pool, _dir) = temp_db().await;
        let mut record = mock_scan_record("c.mp3");
        record.cover_path = "c.jpg".to_string();
        reconcile(&pool, &record, None).await.unwrap();

        record.cover_path.clear();
        let flags = db::get_song_flags(&pool, "c.mp3").await.unwrap();
        reconcile(&pool, &record, flags).await.unwrap();

        let song = db::get_song_by_path(&pool, "c.mp3").await.unwrap().unwrap();
        assert_eq!(song.cover_image.as_deref(), Some("c.jpg"));
        assert!(!song.is_collect);
    }

    #[tokio::test]
    async fn test_collected_on_insert() {
        let (pool, _dir) = temp_db().await;
        let mut record = mock_scan_record("full.mp3");
        record.lyrics_path = "full.lrc".to_string();
        record.cover_path = "full.jpg".to_string();

        reconcile(&pool, &record, None).await.unwrap();

        let flags = db::get_song_flags(&pool, "full.mp3").await.unwrap();
        assert_eq!(skip_reason(flags), Some(SkipReason::Collected));
    }
}
