use sea_orm::{
    ActiveModelTrait, ColumnTrait, DatabaseConnection, DbErr, EntityTrait, QueryFilter, QueryOrder,
    Set, SqlErr, sea_query::Expr,
};
use tracing::debug;

use crate::{
    entities::movie,
    models::{Movie, NewMovie, RatingRanking},
};

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("a movie titled {0:?} already exists")]
    DuplicateTitle(String),
    #[error("movie {0} not found")]
    NotFound(i32),
    #[error(transparent)]
    Db(#[from] DbErr),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Clone)]
pub struct MovieStore {
    db: DatabaseConnection,
}

impl MovieStore {
    pub fn new(db: DatabaseConnection) -> Self {
        Self { db }
    }

    pub async fn list_all_by_ranking(&self) -> StoreResult<Vec<Movie>> {
        let movies = movie::Entity::find()
            .order_by_asc(movie::Column::Ranking)
            .order_by_asc(movie::Column::Id)
            .all(&self.db)
            .await?;
        Ok(movies)
    }

    pub async fn get_by_id(&self, id: i32) -> StoreResult<Option<Movie>> {
        Ok(movie::Entity::find_by_id(id).one(&self.db).await?)
    }

    pub async fn insert(&self, new: NewMovie) -> StoreResult<Movie> {
        let title = new.title.clone();
        let model = movie::ActiveModel {
            id: Default::default(),
            title: Set(new.title),
            year: Set(new.year),
            description: Set(new.description),
            rating: Set(new.rating),
            ranking: Set(new.ranking),
            image: Set(new.image),
        };

        match model.insert(&self.db).await {
            Ok(movie) => Ok(movie),
            Err(err) if matches!(err.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => {
                debug!(%title, "rejected duplicate title");
                Err(StoreError::DuplicateTitle(title))
            },
            Err(err) => Err(err.into()),
        }
    }

    // Last writer wins.
    pub async fn update_rating_ranking(&self, id: i32, values: RatingRanking) -> StoreResult<()> {
        let result = movie::Entity::update_many()
            .col_expr(movie::Column::Rating, Expr::value(values.rating))
            .col_expr(movie::Column::Ranking, Expr::value(values.ranking))
            .filter(movie::Column::Id.eq(id))
            .exec(&self.db)
            .await?;

        if result.rows_affected == 0 {
            return Err(StoreError::NotFound(id));
        }
        Ok(())
    }

    pub async fn delete_by_id(&self, id: i32) -> StoreResult<u64> {
        let result = movie::Entity::delete_by_id(id).exec(&self.db).await?;
        Ok(result.rows_affected)
    }

    pub async fn close(self) -> StoreResult<()> {
        self.db.close().await?;
        Ok(())
    }
}
