use serde_json::Value;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::{
    db,
    entity::song,
    query::{
        types::{SongPage, Statistics},
        Pagination,
    },
    repository::SongRepository,
    validate::{validate_new, validate_patch, ValidationIssues},
};

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Validation(#[from] ValidationIssues),
    #[error(transparent)]
    Store(#[from] db::Error),
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ListParams {
    pub page: Option<u64>,
    pub limit: Option<u64>,
    pub genre: Option<String>,
}

pub async fn create_song(repo: &dyn SongRepository, payload: &Value) -> Result<song::Model, Error> {
    let song = validate_new(payload)?;
    Ok(repo.create(song).await?)
}

pub async fn get_song(repo: &dyn SongRepository, id: Uuid) -> Result<Option<song::Model>, Error> {
    Ok(repo.find_by_id(id).await?)
}

pub async fn list_songs(repo: &dyn SongRepository, params: &ListParams) -> Result<SongPage, Error> {
    let page = Pagination::new(params.page, params.limit);
    let genre = params.genre.as_deref().filter(|g| !g.is_empty());
    Ok(repo.find_all(page, genre).await?)
}

pub async fn search_songs(repo: &dyn SongRepository, query: &str) -> Result<Vec<song::Model>, Error> {
    // blank matches nothing rather than everything
    if query.trim().is_empty() {
        debug!("blank search query");
        return Ok(vec![]);
    }
    Ok(repo.search(query).await?)
}

pub async fn update_song(
    repo: &dyn SongRepository,
    id: Uuid,
    payload: &Value,
) -> Result<Option<song::Model>, Error> {
    let patch = validate_patch(payload)?;
    Ok(repo.update(id, patch).await?)
}

pub async fn delete_song(repo: &dyn SongRepository, id: Uuid) -> Result<bool, Error> {
    Ok(repo.delete(id).await?)
}

pub async fn get_statistics(repo: &dyn SongRepository) -> Result<Statistics, Error> {
    Ok(repo.statistics().await?)
}
