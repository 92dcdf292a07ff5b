use sea_orm::{
    sea_query::{Expr, Func, LikeExpr},
    ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, QuerySelect, QueryTrait, Select,
};

use crate::entity::song;

pub mod types;

pub const DEFAULT_LIMIT: u64 = 10;
pub const SEARCH_LIMIT: u64 = 10;
pub const TOP_ARTISTS: u64 = 5;
pub const LATEST_SONGS: u64 = 5;

// sqlite binds LIMIT/OFFSET as i64
const MAX_ROWS: u64 = i64::MAX as u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pagination {
    pub page: u64,
    pub limit: u64,
}

impl Pagination {
    pub fn new(page: Option<u64>, limit: Option<u64>) -> Self {
        Pagination {
            page: page.filter(|p| *p >= 1).unwrap_or(1).min(MAX_ROWS),
            limit: limit.filter(|l| *l >= 1).unwrap_or(DEFAULT_LIMIT).min(MAX_ROWS),
        }
    }

    pub fn offset(&self) -> u64 {
        (self.page - 1)
            .checked_mul(self.limit)
            .map_or(MAX_ROWS, |offset| offset.min(MAX_ROWS))
    }

    pub fn total_pages(&self, total: u64) -> u64 {
        total.div_ceil(self.limit)
    }
}

impl Default for Pagination {
    fn default() -> Self {
        Pagination::new(None, None)
    }
}

pub fn list(genre: Option<&str>) -> Select<song::Entity> {
    song::Entity::find()
        .apply_if(genre, |query, genre| {
            query.filter(song::Column::Genre.eq(genre))
        })
        .order_by_asc(Expr::cust("rowid"))
}

pub fn search(query: &str) -> Select<song::Entity> {
    song::Entity::find()
        .filter(search_condition(query))
        .order_by_asc(Expr::cust("rowid"))
        .limit(SEARCH_LIMIT)
}

// sqlite's LOWER() only folds ASCII, so text fields are matched against
// their folded copies; genre names are ASCII.
pub fn search_condition(query: &str) -> Condition {
    let pattern = format!("%{}%", escape_like(&song::fold_case(query)));
    let like = || LikeExpr::new(pattern.clone()).escape('\\');
    [
        song::Column::SearchTitle,
        song::Column::SearchArtist,
        song::Column::SearchAlbum,
    ]
    .into_iter()
    .fold(Condition::any(), |condition, column| {
        condition.add(Expr::col(column).like(like()))
    })
    .add(Expr::expr(Func::lower(Expr::col(song::Column::Genre))).like(like()))
}

fn escape_like(raw: &str) -> String {
    let mut escaped = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn count_distinct(column: &str) -> sea_orm::sea_query::SimpleExpr {
    Expr::cust(format!("COUNT(DISTINCT \"{column}\")"))
}

pub fn totals() -> Select<song::Entity> {
    song::Entity::find()
        .select_only()
        .column_as(song::Column::Id.count(), "total_songs")
        .column_as(count_distinct("artist"), "total_artists")
        .column_as(count_distinct("album"), "total_albums")
        .column_as(count_distinct("genre"), "total_genres")
}

pub fn songs_by_genre() -> Select<song::Entity> {
    song::Entity::find()
        .select_only()
        .column_as(song::Column::Genre, "name")
        .column_as(song::Column::Id.count(), "count")
        .group_by(song::Column::Genre)
        .order_by_asc(song::Column::Genre)
}

pub fn songs_by_artist() -> Select<song::Entity> {
    song::Entity::find()
        .select_only()
        .column_as(song::Column::Artist, "name")
        .column_as(song::Column::Id.count(), "songs")
        .column_as(count_distinct("album"), "albums")
        .group_by(song::Column::Artist)
        .order_by_asc(song::Column::Artist)
}

/// Albums with the artist of their first stored song. SQLite fills a bare
/// column from the row that satisfied `MIN()`, which is the earliest rowid.
pub fn songs_by_album() -> Select<song::Entity> {
    song::Entity::find()
        .select_only()
        .column_as(song::Column::Album, "name")
        .column_as(song::Column::Id.count(), "count")
        .column(song::Column::Artist)
        .column_as(Expr::cust("MIN(rowid)"), "first_seen")
        .group_by(song::Column::Album)
        .order_by_asc(song::Column::Album)
}

pub fn top_artists() -> Select<song::Entity> {
    song::Entity::find()
        .select_only()
        .column_as(song::Column::Artist, "name")
        .column_as(song::Column::Id.count(), "song_count")
        .group_by(song::Column::Artist)
        .order_by_desc(song::Column::Id.count())
        .order_by_asc(song::Column::Artist)
        .limit(TOP_ARTISTS)
}

pub fn latest_songs() -> Select<song::Entity> {
    song::Entity::find()
        .select_only()
        .columns([
            song::Column::Title,
            song::Column::Artist,
            song::Column::Album,
            song::Column::ReleaseDate,
        ])
        .order_by_desc(song::Column::ReleaseDate)
        .limit(LATEST_SONGS)
}

#[cfg(test)]
mod tests {
    use sea_orm::DbBackend;

    use super::*;

    fn sql(select: Select<song::Entity>) -> String {
        select.build(DbBackend::Sqlite).to_string()
    }

    #[test]
    fn pagination_defaults_and_offsets() {
        let p = Pagination::default();
        assert_eq!((p.page, p.limit), (1, DEFAULT_LIMIT));
        assert_eq!(p.offset(), 0);

        let p = Pagination::new(Some(3), Some(25));
        assert_eq!(p.offset(), 50);

        let p = Pagination::new(Some(0), Some(0));
        assert_eq!((p.page, p.limit), (1, DEFAULT_LIMIT));
    }

    #[test]
    fn huge_pages_stay_bindable() {
        let max = i64::MAX as u64;

        let p = Pagination::new(Some(10_000_000_000_000_000_000), Some(10));
        assert_eq!(p.page, max);
        assert_eq!(p.offset(), max);

        let p = Pagination::new(None, Some(u64::MAX));
        assert_eq!(p.limit, max);
        assert_eq!(p.offset(), 0);
        assert_eq!(p.total_pages(3), 1);

        let p = Pagination::new(Some(3), Some(max));
        assert_eq!(p.offset(), max);
    }

    #[test]
    fn total_pages_rounds_up() {
        let p = Pagination::new(Some(1), Some(10));
        assert_eq!(p.total_pages(0), 0);
        assert_eq!(p.total_pages(10), 1);
        assert_eq!(p.total_pages(11), 2);
        assert_eq!(Pagination::new(None, Some(3)).total_pages(7), 3);
    }

    #[test]
    fn list_filters_by_genre_only_when_asked() {
        assert!(!sql(list(None)).contains("WHERE"));
        let filtered = sql(list(Some("Hip Hop")));
        assert!(filtered.contains(r#""song"."genre" = 'Hip Hop'"#), "{filtered}");
    }

    #[test]
    fn search_matches_every_text_field() {
        let sql = sql(search("Lennon"));
        for column in ["search_title", "search_artist", "search_album"] {
            assert!(sql.contains(&format!(r#""{column}" LIKE '%lennon%'"#)), "{sql}");
        }
        assert!(sql.contains(r#"LOWER("genre") LIKE '%lennon%'"#), "{sql}");
        assert!(sql.contains(" OR "), "{sql}");
        assert!(sql.ends_with("LIMIT 10"), "{sql}");
    }

    #[test]
    fn search_folds_non_ascii_queries() {
        let sql = sql(search("ÉDITH"));
        assert!(sql.contains("'%édith%'"), "{sql}");
    }

    #[test]
    fn search_treats_wildcards_literally() {
        assert_eq!(escape_like("100%_a\\b"), "100\\%\\_a\\\\b");
    }

    #[test]
    fn top_artists_rank_by_count() {
        let sql = sql(top_artists());
        assert!(sql.contains("GROUP BY \"song\".\"artist\""), "{sql}");
        assert!(sql.contains("ORDER BY COUNT(\"song\".\"id\") DESC"), "{sql}");
        assert!(sql.ends_with("LIMIT 5"), "{sql}");
    }
}
