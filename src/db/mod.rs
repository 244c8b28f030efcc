//! Database module for the song catalog.
//!
//! Uses SQLx with SQLite for lightweight, embedded database storage.
//! Every write here is a single statement; a pass that dies half-way leaves
//! some rows updated and others not, which the next pass picks up.
//!
//! # Example
//!
//! ```ignore
//! use melody_keeper::db::{init_db, list_songs};
//!
//! let pool = init_db("sqlite:melody_keeper.db", 5).await?;
//! let songs = list_songs(&pool).await?;
//! ```

use crate::model::{ScanRecord, Song, SongEdit, SongSummary};
use sqlx::migrate::MigrateDatabase;
use sqlx::sqlite::{SqlitePool, SqlitePoolOptions};

/// Build a SQLite database URL from a file path.
pub fn db_url(path: &std::path::Path) -> String {
    format!("sqlite:{}", path.display())
}

/// Initialize the database connection pool and run migrations.
///
/// Creates the database file if it doesn't exist.
///
/// # Errors
///
/// Returns an error if:
/// - Database creation fails
/// - Connection cannot be established
/// - Migration fails
pub async fn init_db(db_url: &str, max_connections: u32) -> Result<SqlitePool, sqlx::Error> {
    if !sqlx::Sqlite::database_exists(db_url).await.unwrap_or(false) {
        sqlx::Sqlite::create_database(db_url).await?;
    }

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections.max(1))
        .connect(db_url)
        .await?;

    sqlx::migrate!("./migrations").run(&pool).await?;

    Ok(pool)
}

// ============================================================================
// Scanner writes
// ============================================================================

/// Flags that decide whether the scanner may touch an existing row.
#[derive(Debug, Clone, Copy, PartialEq, Eq, sqlx::FromRow)]
pub struct SongFlags {
    pub is_collect: bool,
    pub is_deleted: bool,
}

/// Look up the scan flags for a relative path.
///
/// Returns `None` when no row exists yet.
pub async fn get_song_flags(pool: &SqlitePool, file_path: &str) -> sqlx::Result<Option<SongFlags>> {
    sqlx::query_as::<_, SongFlags>("SELECT is_collect, is_deleted FROM songs WHERE file_path = ?")
        .bind(file_path)
        .fetch_optional(pool)
        .await
}

/// Insert a new song from a scan record.
///
/// `play_count` and `is_deleted` take their column defaults. A unique
/// violation on `file_path` is returned as-is; callers decide what it means.
pub async fn insert_song(pool: &SqlitePool, record: &ScanRecord) -> sqlx::Result<i64> {
    let result = sqlx::query(
        r#"
        INSERT INTO songs (
            title, artist, album, duration, file_path,
            lyrics_path, cover_image, is_collect, created_at, updated_at
        )
        VALUES (?, ?, ?, ?, ?, NULLIF(?, ''), NULLIF(?, ''), ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(&record.title)
    .bind(&record.artist)
    .bind(&record.album)
    .bind(record.duration as i64)
    .bind(&record.rel_path)
    .bind(&record.lyrics_path)
    .bind(&record.cover_path)
    .bind(record.is_collect())
    .execute(pool)
    .await?;

    Ok(result.last_insert_rowid())
}

/// Overwrite a song's scanned fields.
///
/// The cover is only replaced when the record resolved one, so a known
/// cover is never cleared. `play_count` is not part of the statement.
///
/// Returns the number of rows touched (0 or 1).
pub async fn update_song(pool: &SqlitePool, record: &ScanRecord) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET title = ?, artist = ?, album = ?, duration = ?, lyrics_path = NULLIF(?, ''),
            cover_image = CASE WHEN ? = '' THEN cover_image ELSE ? END,
            is_collect = ?, updated_at = CURRENT_TIMESTAMP
        WHERE file_path = ?
        "#,
    )
    .bind(&record.title)
    .bind(&record.artist)
    .bind(&record.album)
    .bind(record.duration as i64)
    .bind(&record.lyrics_path)
    .bind(&record.cover_path)
    .bind(&record.cover_path)
    .bind(record.is_collect())
    .bind(&record.rel_path)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Record freshly resolved sidecar paths for a song by relative path.
///
/// Used after enrichment. Empty paths leave the stored value alone and
/// `is_collect` is recomputed from what ends up stored.
pub async fn update_sidecars(
    pool: &SqlitePool,
    file_path: &str,
    lyrics_path: &str,
    cover_path: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET lyrics_path = CASE WHEN ?1 = '' THEN lyrics_path ELSE ?1 END,
            cover_image = CASE WHEN ?2 = '' THEN cover_image ELSE ?2 END,
            is_collect = (
                COALESCE(CASE WHEN ?1 = '' THEN lyrics_path ELSE ?1 END, '') <> ''
                AND COALESCE(CASE WHEN ?2 = '' THEN cover_image ELSE ?2 END, '') <> ''
            ),
            updated_at = CURRENT_TIMESTAMP
        WHERE file_path = ?3
        "#,
    )
    .bind(lyrics_path)
    .bind(cover_path)
    .bind(file_path)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Same as [`update_sidecars`] but addressed by song ID.
pub async fn update_sidecars_by_id(
    pool: &SqlitePool,
    id: i64,
    lyrics_path: &str,
    cover_path: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET lyrics_path = CASE WHEN ?1 = '' THEN lyrics_path ELSE ?1 END,
            cover_image = CASE WHEN ?2 = '' THEN cover_image ELSE ?2 END,
            is_collect = (
                COALESCE(CASE WHEN ?1 = '' THEN lyrics_path ELSE ?1 END, '') <> ''
                AND COALESCE(CASE WHEN ?2 = '' THEN cover_image ELSE ?2 END, '') <> ''
            ),
            updated_at = CURRENT_TIMESTAMP
        WHERE id = ?3
        "#,
    )
    .bind(lyrics_path)
    .bind(cover_path)
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

// ============================================================================
// Admin writes
// ============================================================================

/// Overwrite the descriptive fields of a song.
pub async fn apply_song_edit(pool: &SqlitePool, id: i64, edit: &SongEdit) -> sqlx::Result<u64> {
    let result = sqlx::query(
        r#"
        UPDATE songs
        SET title = ?, artist = ?, album = ?, duration = ?, updated_at = CURRENT_TIMESTAMP
        WHERE id = ?
        "#,
    )
    .bind(&edit.title)
    .bind(&edit.artist)
    .bind(&edit.album)
    .bind(edit.duration.max(0))
    .bind(id)
    .execute(pool)
    .await?;

    Ok(result.rows_affected())
}

/// Soft-delete songs. Returns how many rows were flagged.
pub async fn soft_delete_songs(pool: &SqlitePool, ids: &[i64]) -> sqlx::Result<u64> {
    if ids.is_empty() {
        return Ok(0);
    }

    let placeholders = vec!["?"; ids.len()].join(", ");
    let sql = format!("UPDATE songs SET is_deleted = 1 WHERE id IN ({placeholders})");

    let mut query = sqlx::query(&sql);
    for id in ids {
        query = query.bind(*id);
    }

    Ok(query.execute(pool).await?.rows_affected())
}

/// Clear the soft-delete flag so the scanner picks the file up again.
pub async fn restore_song(pool: &SqlitePool, id: i64) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE songs SET is_deleted = 0 WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected())
}

// ============================================================================
// Reads
// ============================================================================

const SONG_COLUMNS: &str = "id, title, artist, album, duration, file_path, cover_image, \
     lyrics_path, play_count, is_collect, is_deleted, created_at, updated_at";

const SUMMARY_COLUMNS: &str =
    "id, title, artist, album, duration, cover_image, is_deleted, updated_at";

/// Get all non-deleted songs, newest first.
pub async fn list_songs(pool: &SqlitePool) -> sqlx::Result<Vec<SongSummary>> {
    let sql = format!(
        "SELECT {SUMMARY_COLUMNS} FROM songs WHERE is_deleted = 0 ORDER BY created_at DESC, id DESC"
    );
    sqlx::query_as::<_, SongSummary>(&sql).fetch_all(pool).await
}

/// Get a song by its database ID, deleted or not.
pub async fn get_song_by_id(pool: &SqlitePool, id: i64) -> sqlx::Result<Option<Song>> {
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE id = ?");
    sqlx::query_as::<_, Song>(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
}

/// Get a song by its relative path, deleted or not.
pub async fn get_song_by_path(pool: &SqlitePool, file_path: &str) -> sqlx::Result<Option<Song>> {
    let sql = format!("SELECT {SONG_COLUMNS} FROM songs WHERE file_path = ?");
    sqlx::query_as::<_, Song>(&sql)
        .bind(file_path)
        .fetch_optional(pool)
        .await
}

/// Substring search over title, artist and album, excluding deleted songs.
pub async fn search_songs(pool: &SqlitePool, query: &str) -> sqlx::Result<Vec<SongSummary>> {
    let pattern = format!("%{}%", query);
    let sql = format!(
        r#"
        SELECT {SUMMARY_COLUMNS}
        FROM songs
        WHERE (title LIKE ?1 OR artist LIKE ?1 OR album LIKE ?1) AND is_deleted = 0
        ORDER BY created_at DESC, id DESC
        "#
    );
    sqlx::query_as::<_, SongSummary>(&sql)
        .bind(&pattern)
        .fetch_all(pool)
        .await
}

/// One page of non-deleted songs plus the total count.
///
/// `page` is 1-based; values below 1 are treated as 1.
pub async fn list_songs_page(
    pool: &SqlitePool,
    page: u32,
    page_size: u32,
) -> sqlx::Result<(Vec<Song>, i64)> {
    let (total,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM songs WHERE is_deleted = 0")
        .fetch_one(pool)
        .await?;

    let page_size = page_size.max(1) as i64;
    let offset = (page.max(1) as i64 - 1) * page_size;

    let sql = format!(
        "SELECT {SONG_COLUMNS} FROM songs WHERE is_deleted = 0 \
         ORDER BY created_at DESC, id DESC LIMIT ? OFFSET ?"
    );
    let songs = sqlx::query_as::<_, Song>(&sql)
        .bind(page_size)
        .bind(offset)
        .fetch_all(pool)
        .await?;

    Ok((songs, total))
}

/// Count all rows for a relative path. Used to check uniqueness.
pub async fn count_by_path(pool: &SqlitePool, file_path: &str) -> sqlx::Result<i64> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(*) FROM songs WHERE file_path = ?")
        .bind(file_path)
        .fetch_one(pool)
        .await?;
    Ok(count)
}
