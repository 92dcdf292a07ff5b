use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Song::Table)
                    .if_not_exists()
                    .col(pk_uuid(Song::Id))
                    .col(string_len(Song::Title, 100))
                    .col(string_len(Song::Artist, 50))
                    .col(string_len(Song::Album, 100))
                    .col(string(Song::Genre))
                    .col(date(Song::ReleaseDate))
                    .col(string(Song::SearchTitle))
                    .col(string(Song::SearchArtist))
                    .col(string(Song::SearchAlbum))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_song_genre")
                    .table(Song::Table)
                    .col(Song::Genre)
                    .if_not_exists()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_song_release_date")
                    .table(Song::Table)
                    .col(Song::ReleaseDate)
                    .if_not_exists()
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Song::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum Song {
    Table,
    Id,
    Title,
    Artist,
    Album,
    Genre,
    ReleaseDate,
    SearchTitle,
    SearchArtist,
    SearchAlbum,
}
