use uuid::Uuid;

use crate::{
    db::Error,
    entity::song,
    query::{
        types::{SongPage, Statistics},
        Pagination,
    },
    validate::{NewSong, SongPatch},
};

/// Absent songs are `Ok(None)` / `Ok(false)`, never an error.
#[async_trait::async_trait]
pub trait SongRepository: Send + Sync {
    async fn create(&self, song: NewSong) -> Result<song::Model, Error>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<song::Model>, Error>;

    async fn find_all(&self, page: Pagination, genre: Option<&str>) -> Result<SongPage, Error>;

    async fn search(&self, query: &str) -> Result<Vec<song::Model>, Error>;

    async fn update(&self, id: Uuid, patch: SongPatch) -> Result<Option<song::Model>, Error>;

    async fn delete(&self, id: Uuid) -> Result<bool, Error>;

    async fn statistics(&self) -> Result<Statistics, Error>;
}
