use std::{fmt, str::FromStr};

use sea_orm::{entity::prelude::*, ActiveValue};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "song")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub id: Uuid,
    pub title: String,
    pub artist: String,
    pub album: String,
    pub genre: Genre,
    pub release_date: Date,
    #[serde(skip)]
    pub search_title: String,
    #[serde(skip)]
    pub search_artist: String,
    #[serde(skip)]
    pub search_album: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

/// Case folding used for the `search_*` columns and for search queries.
pub fn fold_case(text: &str) -> String {
    text.to_lowercase()
}

fn refold(source: &ActiveValue<String>, target: &mut ActiveValue<String>) {
    if let ActiveValue::Set(text) = source {
        *target = ActiveValue::Set(fold_case(text));
    }
}

#[async_trait::async_trait]
impl ActiveModelBehavior for ActiveModel {
    async fn before_save<C>(mut self, _db: &C, _insert: bool) -> Result<Self, DbErr>
    where
        C: ConnectionTrait,
    {
        refold(&self.title, &mut self.search_title);
        refold(&self.artist, &mut self.search_artist);
        refold(&self.album, &mut self.search_album);
        Ok(self)
    }
}

#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize,
)]
#[sea_orm(rs_type = "String", db_type = "String(StringLen::None)")]
pub enum Genre {
    #[sea_orm(string_value = "Rock")]
    Rock,
    #[sea_orm(string_value = "Pop")]
    Pop,
    #[sea_orm(string_value = "Hip Hop")]
    #[serde(rename = "Hip Hop")]
    HipHop,
    #[sea_orm(string_value = "Jazz")]
    Jazz,
    #[sea_orm(string_value = "Classical")]
    Classical,
    #[sea_orm(string_value = "Electronic")]
    Electronic,
    #[sea_orm(string_value = "R&B")]
    #[serde(rename = "R&B")]
    RnB,
    #[sea_orm(string_value = "Country")]
    Country,
    #[sea_orm(string_value = "Blues")]
    Blues,
    #[sea_orm(string_value = "Reggae")]
    Reggae,
}

impl Genre {
    pub const ALL: [Genre; 10] = [
        Genre::Rock,
        Genre::Pop,
        Genre::HipHop,
        Genre::Jazz,
        Genre::Classical,
        Genre::Electronic,
        Genre::RnB,
        Genre::Country,
        Genre::Blues,
        Genre::Reggae,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Rock => "Rock",
            Genre::Pop => "Pop",
            Genre::HipHop => "Hip Hop",
            Genre::Jazz => "Jazz",
            Genre::Classical => "Classical",
            Genre::Electronic => "Electronic",
            Genre::RnB => "R&B",
            Genre::Country => "Country",
            Genre::Blues => "Blues",
            Genre::Reggae => "Reggae",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown genre: {0}")]
pub struct UnknownGenre(pub String);

impl FromStr for Genre {
    type Err = UnknownGenre;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Genre::ALL
            .into_iter()
            .find(|genre| genre.as_str() == s)
            .ok_or_else(|| UnknownGenre(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn genre_names_round_trip() {
        for genre in Genre::ALL {
            assert_eq!(genre.as_str().parse::<Genre>(), Ok(genre));
        }
    }

    #[test]
    fn genre_lookup_is_exact() {
        assert!("rock".parse::<Genre>().is_err());
        assert!("HipHop".parse::<Genre>().is_err());
        assert_eq!("R&B".parse::<Genre>(), Ok(Genre::RnB));
    }

    #[test]
    fn search_columns_stay_off_the_wire() {
        let song = Model {
            id: Uuid::nil(),
            title: "La Vie en rose".into(),
            artist: "ÉDITH PIAF".into(),
            album: "Chansons Parisiennes".into(),
            genre: Genre::Pop,
            release_date: Date::from_ymd_opt(1947, 1, 1).unwrap(),
            search_title: "la vie en rose".into(),
            search_artist: "édith piaf".into(),
            search_album: "chansons parisiennes".into(),
        };
        let json = serde_json::to_value(&song).unwrap();
        assert_eq!(json["artist"], "ÉDITH PIAF");
        assert!(json.get("searchArtist").is_none());
        assert_eq!(fold_case(&song.artist), song.search_artist);
    }

    #[test]
    fn genre_serializes_as_display_name() {
        assert_eq!(
            serde_json::to_value(Genre::HipHop).unwrap(),
            serde_json::json!("Hip Hop")
        );
    }
}
