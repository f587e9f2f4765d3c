pub use crate::entities::movie::Model as Movie;

#[derive(Clone, Debug, PartialEq)]
pub struct NewMovie {
    pub title: String,
    pub year: i32,
    pub description: String,
    pub rating: f64,
    pub ranking: i32,
    pub image: String,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RatingRanking {
    pub rating: f64,
    pub ranking: i32,
}
