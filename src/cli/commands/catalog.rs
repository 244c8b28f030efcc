//! Catalog reads and admin commands.

use anyhow::bail;
use tokio::runtime::Runtime;

use super::{build_enrichment, open_pool};
use crate::config::Config;
use crate::db;
use crate::library::Catalog;
use crate::model::{Song, SongEdit, SongSummary};

fn format_duration(seconds: i64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

fn print_summary(song: &SongSummary) {
    println!(
        "{:>6}  {} - {} ({}) [{}]{}",
        song.id,
        song.artist,
        song.title,
        song.album,
        format_duration(song.duration),
        if song.cover_image.is_some() { "" } else { "  (no cover)" }
    );
}

fn print_song(song: &Song) {
    println!("ID:        {}", song.id);
    println!("Title:     {}", song.title);
    println!("Artist:    {}", song.artist);
    println!("Album:     {}", song.album);
    println!("Duration:  {}", format_duration(song.duration));
    println!("File:      {}", song.file_path);
    println!("Lyrics:    {}", song.lyrics_path.as_deref().unwrap_or("-"));
    println!("Cover:     {}", song.cover_image.as_deref().unwrap_or("-"));
    println!("Plays:     {}", song.play_count);
    println!("Complete:  {}", if song.is_collect { "yes" } else { "no" });
    if song.is_deleted {
        println!("Deleted:   yes");
    }
    println!("Added:     {}", song.created_at);
    println!("Updated:   {}", song.updated_at);
}

/// List all songs in the catalog
pub fn cmd_list(rt: &Runtime, config: &Config) -> anyhow::Result<()> {
    rt.block_on(async {
        let catalog = Catalog::new(open_pool(config).await?);
        let songs = catalog.list_songs().await?;
        for song in &songs {
            print_summary(song);
        }
        println!("{} songs", songs.len());
        Ok(())
    })
}

/// Search by title, artist or album
pub fn cmd_search(rt: &Runtime, config: &Config, query: &str) -> anyhow::Result<()> {
    rt.block_on(async {
        let catalog = Catalog::new(open_pool(config).await?);
        let songs = catalog.search_songs(query).await?;
        if songs.is_empty() {
            println!("No songs match {query:?}");
        }
        for song in &songs {
            print_summary(song);
        }
        Ok(())
    })
}

/// Show one song
pub fn cmd_show(rt: &Runtime, config: &Config, id: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let catalog = Catalog::new(open_pool(config).await?);
        print_song(&catalog.get_song(id).await?);
        Ok(())
    })
}

/// Edit a song and re-resolve its lyrics and cover
pub fn cmd_edit(
    rt: &Runtime,
    config: &Config,
    id: i64,
    title: &str,
    artist: &str,
    album: Option<&str>,
    duration: Option<i64>,
) -> anyhow::Result<()> {
    if title.trim().is_empty() || artist.trim().is_empty() {
        bail!("Title and artist must not be empty");
    }
    if duration.is_some_and(|d| d < 0) {
        bail!("Duration must not be negative");
    }

    rt.block_on(async {
        let pool = open_pool(config).await?;
        let current = Catalog::new(pool.clone()).get_song(id).await?;

        let edit = SongEdit {
            title: title.trim().to_string(),
            artist: artist.trim().to_string(),
            album: album.map_or(current.album, |a| a.trim().to_string()),
            duration: duration.unwrap_or(current.duration),
        };

        match build_enrichment(config)? {
            Some(service) => {
                let resolved = service.refresh_song(&pool, id, &edit).await?;
                println!(
                    "Updated song {id}; lyrics {}, cover {}",
                    if resolved.lyrics_path.is_empty() { "not found" } else { "refreshed" },
                    if resolved.cover_path.is_empty() { "not found" } else { "refreshed" },
                );
            }
            None => {
                db::apply_song_edit(&pool, id, &edit).await?;
                println!("Updated song {id}");
            }
        }
        Ok(())
    })
}

/// Soft-delete songs
pub fn cmd_delete(rt: &Runtime, config: &Config, ids: &[i64]) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_pool(config).await?;
        let count = db::soft_delete_songs(&pool, ids).await?;
        println!("Deleted {count} of {} songs", ids.len());
        Ok(())
    })
}

/// Clear the delete flag
pub fn cmd_restore(rt: &Runtime, config: &Config, id: i64) -> anyhow::Result<()> {
    rt.block_on(async {
        let pool = open_pool(config).await?;
        if db::restore_song(&pool, id).await? == 0 {
            bail!("Song not found: {id}");
        }
        println!("Restored song {id}; it will be picked up by the next scan");
        Ok(())
    })
}
