use sea_orm::{entity::prelude::Date, FromQueryResult};
use serde::Serialize;
use uuid::Uuid;

use crate::entity::song;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SongPage {
    pub songs: Vec<song::Model>,
    pub total: u64,
    pub total_pages: u64,
    pub current_page: u64,
    pub limit: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_songs: u64,
    pub total_artists: u64,
    pub total_albums: u64,
    pub total_genres: u64,
    pub songs_by_genre: Vec<GenreStat>,
    pub songs_by_artist: Vec<ArtistStat>,
    pub songs_by_album: Vec<AlbumStat>,
    pub top_artists: Vec<TopArtist>,
    pub latest_songs: Vec<LatestSong>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GenreStat {
    pub id: Uuid,
    pub name: String,
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtistStat {
    pub id: Uuid,
    pub name: String,
    pub songs: u64,
    pub albums: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AlbumStat {
    pub id: Uuid,
    pub name: String,
    pub count: u64,
    pub artist: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TopArtist {
    pub id: Uuid,
    pub name: String,
    pub song_count: u64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, FromQueryResult)]
#[serde(rename_all = "camelCase")]
pub struct LatestSong {
    pub title: String,
    pub artist: String,
    pub album: String,
    pub release_date: Date,
}

// raw rows as they come out of the GROUP BY statements

#[derive(Debug, Default, FromQueryResult)]
pub(crate) struct Totals {
    pub(crate) total_songs: i64,
    pub(crate) total_artists: i64,
    pub(crate) total_albums: i64,
    pub(crate) total_genres: i64,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct GenreRow {
    pub(crate) name: String,
    pub(crate) count: i64,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct ArtistRow {
    pub(crate) name: String,
    pub(crate) songs: i64,
    pub(crate) albums: i64,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct AlbumRow {
    pub(crate) name: String,
    pub(crate) count: i64,
    pub(crate) artist: String,
}

#[derive(Debug, FromQueryResult)]
pub(crate) struct TopArtistRow {
    pub(crate) name: String,
    pub(crate) song_count: i64,
}

/// Row keys are derived from the group they describe, so the same group gets
/// the same key on every call. They never coincide with a song id.
fn row_id(kind: &str, name: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_OID, format!("songy:{kind}:{name}").as_bytes())
}

fn count(n: i64) -> u64 {
    n.max(0) as u64
}

impl From<GenreRow> for GenreStat {
    fn from(row: GenreRow) -> Self {
        GenreStat {
            id: row_id("genre", &row.name),
            count: count(row.count),
            name: row.name,
        }
    }
}

impl From<ArtistRow> for ArtistStat {
    fn from(row: ArtistRow) -> Self {
        ArtistStat {
            id: row_id("artist", &row.name),
            songs: count(row.songs),
            albums: count(row.albums),
            name: row.name,
        }
    }
}

impl From<AlbumRow> for AlbumStat {
    fn from(row: AlbumRow) -> Self {
        AlbumStat {
            id: row_id("album", &row.name),
            count: count(row.count),
            name: row.name,
            artist: row.artist,
        }
    }
}

impl From<TopArtistRow> for TopArtist {
    fn from(row: TopArtistRow) -> Self {
        TopArtist {
            id: row_id("top-artist", &row.name),
            song_count: count(row.song_count),
            name: row.name,
        }
    }
}
