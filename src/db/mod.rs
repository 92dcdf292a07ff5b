use sea_orm::{
    ActiveModelTrait, ActiveValue as AV, ConnectOptions, Database, DatabaseConnection, DbErr,
    EntityTrait, PaginatorTrait, QuerySelect,
};
use sea_orm_migration::MigratorTrait;
use thiserror::Error;
use tracing::{debug, trace, warn};
use uuid::Uuid;

use crate::{
    config::Store as StoreConfig,
    entity::song,
    query::{
        self,
        types::{AlbumRow, ArtistRow, GenreRow, SongPage, Statistics, TopArtistRow, Totals},
        Pagination,
    },
    repository::SongRepository,
    validate::{NewSong, SongPatch},
};

mod migration;

pub use migration::Migrator;

#[derive(Debug, Error)]
pub enum Error {
    #[error("database error: {0}")]
    DbErr(#[from] DbErr),
}

#[derive(Debug, Clone)]
pub struct DB {
    connection: DatabaseConnection,
}

impl DB {
    pub async fn connect(config: &StoreConfig) -> Result<Self, Error> {
        debug!("database URL: {}", config.url);
        let mut opts = ConnectOptions::new(config.url.clone());
        opts.sqlx_logging(config.sqlx_logging)
            .sqlx_logging_level(config.sqlx_log_level());

        // every connection to an in-memory sqlite database gets its own empty database
        if config.url.contains(":memory:") {
            opts.max_connections(1).min_connections(1);
        } else if let Some(max) = config.max_connections {
            opts.max_connections(max);
        }

        let connection = Database::connect(opts).await?;
        Migrator::up(&connection, None).await?;

        Ok(Self { connection })
    }

    pub fn connection(&self) -> &DatabaseConnection {
        &self.connection
    }
}

#[async_trait::async_trait]
impl SongRepository for DB {
    async fn create(&self, new: NewSong) -> Result<song::Model, Error> {
        let song = song::ActiveModel {
            id: AV::Set(Uuid::new_v4()),
            title: AV::Set(new.title),
            artist: AV::Set(new.artist),
            album: AV::Set(new.album),
            genre: AV::Set(new.genre),
            release_date: AV::Set(new.release_date),
            ..Default::default()
        };
        let song = song.insert(&self.connection).await?;
        trace!("inserted {} - {}", song.artist, song.title);
        Ok(song)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<song::Model>, Error> {
        Ok(song::Entity::find_by_id(id).one(&self.connection).await?)
    }

    async fn find_all(&self, page: Pagination, genre: Option<&str>) -> Result<SongPage, Error> {
        let select = query::list(genre);
        let (songs, total) = tokio::try_join!(
            select
                .clone()
                .offset(page.offset())
                .limit(page.limit)
                .all(&self.connection),
            select.count(&self.connection),
        )?;

        Ok(SongPage {
            songs,
            total,
            total_pages: page.total_pages(total),
            current_page: page.page,
            limit: page.limit,
        })
    }

    async fn search(&self, needle: &str) -> Result<Vec<song::Model>, Error> {
        Ok(query::search(needle).all(&self.connection).await?)
    }

    async fn update(&self, id: Uuid, patch: SongPatch) -> Result<Option<song::Model>, Error> {
        let Some(existing) = song::Entity::find_by_id(id).one(&self.connection).await? else {
            return Ok(None);
        };
        if patch.is_empty() {
            return Ok(Some(existing));
        }

        let mut song: song::ActiveModel = existing.into();
        if let Some(title) = patch.title {
            song.title = AV::Set(title);
        }
        if let Some(artist) = patch.artist {
            song.artist = AV::Set(artist);
        }
        if let Some(album) = patch.album {
            song.album = AV::Set(album);
        }
        if let Some(genre) = patch.genre {
            song.genre = AV::Set(genre);
        }
        if let Some(release_date) = patch.release_date {
            song.release_date = AV::Set(release_date);
        }

        match song.update(&self.connection).await {
            Ok(song) => Ok(Some(song)),
            // deleted between the lookup and the write
            Err(DbErr::RecordNotUpdated) => {
                warn!("song {id} vanished during update");
                Ok(None)
            }
            Err(e) => Err(e.into()),
        }
    }

    async fn delete(&self, id: Uuid) -> Result<bool, Error> {
        let res = song::Entity::delete_by_id(id)
            .exec(&self.connection)
            .await?;
        Ok(res.rows_affected > 0)
    }

    async fn statistics(&self) -> Result<Statistics, Error> {
        let db = &self.connection;
        let (totals, by_genre, by_artist, by_album, top_artists, latest_songs) = tokio::try_join!(
            query::totals().into_model::<Totals>().one(db),
            query::songs_by_genre().into_model::<GenreRow>().all(db),
            query::songs_by_artist().into_model::<ArtistRow>().all(db),
            query::songs_by_album().into_model::<AlbumRow>().all(db),
            query::top_artists().into_model::<TopArtistRow>().all(db),
            query::latest_songs()
                .into_model::<query::types::LatestSong>()
                .all(db),
        )?;
        let totals = totals.unwrap_or_default();

        Ok(Statistics {
            total_songs: totals.total_songs.max(0) as u64,
            total_artists: totals.total_artists.max(0) as u64,
            total_albums: totals.total_albums.max(0) as u64,
            total_genres: totals.total_genres.max(0) as u64,
            songs_by_genre: by_genre.into_iter().map(Into::into).collect(),
            songs_by_artist: by_artist.into_iter().map(Into::into).collect(),
            songs_by_album: by_album.into_iter().map(Into::into).collect(),
            top_artists: top_artists.into_iter().map(Into::into).collect(),
            latest_songs,
        })
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::{
        entity::song::Genre,
        validate::{validate_new, validate_patch},
    };

    async fn memory_db() -> DB {
        DB::connect(&StoreConfig::memory()).await.unwrap()
    }

    async fn add(db: &DB, title: &str, artist: &str, album: &str, genre: &str, date: &str) -> song::Model {
        let song = validate_new(&json!({
            "title": title,
            "artist": artist,
            "album": album,
            "genre": genre,
            "releaseDate": date,
        }))
        .unwrap();
        db.create(song).await.unwrap()
    }

    async fn seed(db: &DB) {
        add(db, "Imagine", "John Lennon", "Imagine", "Rock", "1971-10-11").await;
        add(db, "Jealous Guy", "John Lennon", "Imagine", "Rock", "1971-09-09").await;
        add(db, "Woman", "John Lennon", "Double Fantasy", "Pop", "1980-11-17").await;
        add(db, "So What", "Miles Davis", "Kind of Blue", "Jazz", "1959-08-17").await;
        add(db, "Juicy", "The Notorious B.I.G.", "Ready to Die", "Hip Hop", "1994-08-09").await;
        add(db, "Blue in Green", "Miles Davis", "Kind of Blue", "Jazz", "1959-08-17").await;
    }

    #[tokio::test]
    async fn create_assigns_fresh_ids() {
        let db = memory_db().await;
        let a = add(&db, "Imagine", "John Lennon", "Imagine", "Rock", "1971-10-11").await;
        let b = add(&db, "Imagine", "John Lennon", "Imagine", "Rock", "1971-10-11").await;

        assert!(!a.id.is_nil());
        assert_ne!(a.id, b.id);
        assert_eq!(a.title, "Imagine");
        assert_eq!(a.genre, Genre::Rock);
        assert_eq!(a.release_date.to_string(), "1971-10-11");

        let found = db.find_by_id(a.id).await.unwrap();
        assert_eq!(found, Some(a));
    }

    #[tokio::test]
    async fn missing_ids_are_not_errors() {
        let db = memory_db().await;
        let id = Uuid::new_v4();
        assert_eq!(db.find_by_id(id).await.unwrap(), None);
        assert!(!db.delete(id).await.unwrap());
        let patch = validate_patch(&json!({ "title": "x" })).unwrap();
        assert_eq!(db.update(id, patch).await.unwrap(), None);
    }

    #[tokio::test]
    async fn paging_reports_totals() {
        let db = memory_db().await;
        seed(&db).await;

        let page = db.find_all(Pagination::new(Some(2), Some(4)), None).await.unwrap();
        assert_eq!(page.total, 6);
        assert_eq!(page.total_pages, 2);
        assert_eq!(page.current_page, 2);
        assert_eq!(page.limit, 4);
        assert_eq!(page.songs.len(), 2);

        let first = db.find_all(Pagination::new(Some(1), Some(4)), None).await.unwrap();
        assert_eq!(first.songs[0].title, "Imagine");
        assert_eq!(first.songs.len(), 4);

        let beyond = db.find_all(Pagination::new(Some(9), Some(4)), None).await.unwrap();
        assert!(beyond.songs.is_empty());
        assert_eq!(beyond.total_pages, 2);
    }

    #[tokio::test]
    async fn genre_filter_restricts_page_and_total() {
        let db = memory_db().await;
        seed(&db).await;

        let page = db.find_all(Pagination::default(), Some("Jazz")).await.unwrap();
        assert_eq!(page.total, 2);
        assert!(page.songs.iter().all(|s| s.genre == Genre::Jazz));

        let none = db.find_all(Pagination::default(), Some("Polka")).await.unwrap();
        assert_eq!(none.total, 0);
        assert_eq!(none.total_pages, 0);
    }

    #[tokio::test]
    async fn search_is_case_insensitive_and_capped() {
        let db = memory_db().await;
        seed(&db).await;

        let hits = db.search("lennon").await.unwrap();
        assert_eq!(hits.len(), 3);
        assert!(hits.iter().all(|s| s.artist == "John Lennon"));

        let by_genre = db.search("HIP").await.unwrap();
        assert_eq!(by_genre.len(), 1);
        assert_eq!(by_genre[0].title, "Juicy");

        assert!(db.search("%").await.unwrap().is_empty());

        for n in 0..12 {
            add(&db, &format!("Lennon tribute {n}"), "Various", "Tributes", "Pop", "2000-01-01").await;
        }
        assert_eq!(db.search("lennon").await.unwrap().len(), 10);
    }

    #[tokio::test]
    async fn search_folds_non_ascii_case() {
        let db = memory_db().await;
        let song = add(&db, "La Vie en rose", "ÉDITH PIAF", "Chansons Parisiennes", "Pop", "1947-01-01").await;
        assert_eq!(song.search_artist, "édith piaf");

        let hits = db.search("édith").await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].artist, "ÉDITH PIAF");
        assert_eq!(db.search("ÉDITH").await.unwrap().len(), 1);

        let patch = validate_patch(&json!({ "album": "ÇA IRA" })).unwrap();
        db.update(song.id, patch).await.unwrap();
        assert_eq!(db.search("ça ira").await.unwrap().len(), 1);
        assert!(db.search("parisiennes").await.unwrap().is_empty());
        assert_eq!(db.search("piaf").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn update_applies_only_supplied_fields() {
        let db = memory_db().await;
        let song = add(&db, "Imagine", "John Lennon", "Imagine", "Rock", "1971-10-11").await;

        let patch = validate_patch(&json!({ "title": "Imagine (Remastered)", "genre": "Pop" })).unwrap();
        let updated = db.update(song.id, patch).await.unwrap().unwrap();
        assert_eq!(updated.id, song.id);
        assert_eq!(updated.title, "Imagine (Remastered)");
        assert_eq!(updated.genre, Genre::Pop);
        assert_eq!(updated.artist, song.artist);
        assert_eq!(updated.release_date, song.release_date);

        let unchanged = db.update(song.id, SongPatch::default()).await.unwrap();
        assert_eq!(unchanged, Some(updated));
    }

    #[tokio::test]
    async fn delete_is_hard() {
        let db = memory_db().await;
        let song = add(&db, "Imagine", "John Lennon", "Imagine", "Rock", "1971-10-11").await;
        assert!(db.delete(song.id).await.unwrap());
        assert_eq!(db.find_by_id(song.id).await.unwrap(), None);
        assert!(!db.delete(song.id).await.unwrap());
    }

    #[tokio::test]
    async fn statistics_summarise_the_catalog() {
        let db = memory_db().await;
        seed(&db).await;

        let stats = db.statistics().await.unwrap();
        assert_eq!(stats.total_songs, 6);
        assert_eq!(stats.total_artists, 3);
        assert_eq!(stats.total_albums, 4);
        assert_eq!(stats.total_genres, 4);
        assert_eq!(
            stats.songs_by_genre.iter().map(|g| g.count).sum::<u64>(),
            stats.total_songs
        );

        let lennon = stats
            .songs_by_artist
            .iter()
            .find(|a| a.name == "John Lennon")
            .unwrap();
        assert_eq!((lennon.songs, lennon.albums), (3, 2));

        let kind_of_blue = stats
            .songs_by_album
            .iter()
            .find(|a| a.name == "Kind of Blue")
            .unwrap();
        assert_eq!(kind_of_blue.count, 2);
        assert_eq!(kind_of_blue.artist, "Miles Davis");

        let top: Vec<_> = stats
            .top_artists
            .iter()
            .map(|a| (a.name.as_str(), a.song_count))
            .collect();
        assert_eq!(
            top,
            [("John Lennon", 3), ("Miles Davis", 2), ("The Notorious B.I.G.", 1)]
        );

        assert_eq!(stats.latest_songs.len(), 5);
        assert_eq!(stats.latest_songs[0].title, "Juicy");
        assert_eq!(stats.latest_songs[1].title, "Woman");

        let again = db.statistics().await.unwrap();
        assert_eq!(again.songs_by_genre, stats.songs_by_genre);
    }

    #[tokio::test]
    async fn statistics_of_an_empty_catalog() {
        let db = memory_db().await;
        let stats = db.statistics().await.unwrap();
        assert_eq!(stats.total_songs, 0);
        assert!(stats.songs_by_genre.is_empty());
        assert!(stats.top_artists.is_empty());
        assert!(stats.latest_songs.is_empty());
    }
}
