use std::collections::BTreeMap;

use serde::{Deserialize, Deserializer};
use validator::{Validate, ValidationErrors};

use crate::models::{Movie, NewMovie, RatingRanking};

const INVALID_YEAR: &str = "Invalid Year!";
const INVALID_FLOAT: &str = "Not a valid float value.";
const INVALID_INTEGER: &str = "Not a valid integer value.";
const INVALID_URL: &str = "Invalid";

#[derive(Clone, Debug, Default, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn single(field: &str, message: &str) -> Self {
        let mut errors = Self::default();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: &str) {
        self.0.entry(field.to_string()).or_default().push(message.to_string());
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| error.code.to_string());
                out.add(&field, &message);
            }
        }
        out
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct AddMovieForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Title Required!"),
        length(max = 150, message = "Name limit reached!")
    )]
    pub title: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "Year Required!"))]
    pub year: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Description Required!"),
        length(max = 500, message = "Description too long!")
    )]
    pub description: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "Rating Required!"))]
    pub rating: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "Rank Required!"))]
    pub ranking: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(
        required(message = "Image Required!"),
        url(message = "Invalid"),
        length(max = 600, message = "URL too long!")
    )]
    pub image: Option<String>,

    #[serde(default)]
    pub csrf_token: String,
}

impl AddMovieForm {
    pub fn parse(&self) -> Result<NewMovie, FieldErrors> {
        let mut errors = validated(self);
        let year = check(&mut errors, "year", &self.year, parse_year);
        let rating = check(&mut errors, "rating", &self.rating, parse_rating);
        let ranking = check(&mut errors, "ranking", &self.ranking, parse_ranking);
        if let Some(image) = &self.image {
            if errors.get("image").is_empty() && !is_web_url(image) {
                errors.add("image", INVALID_URL);
            }
        }

        match (&self.title, year, &self.description, rating, ranking, &self.image) {
            (Some(title), Some(year), Some(description), Some(rating), Some(ranking), Some(image))
                if errors.is_empty() =>
            {
                Ok(NewMovie {
                    title: title.clone(),
                    year,
                    description: description.clone(),
                    rating,
                    ranking,
                    image: image.clone(),
                })
            },
            _ => Err(errors),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Validate)]
pub struct EditMovieForm {
    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "New Rating Required!"))]
    pub rating: Option<String>,

    #[serde(default, deserialize_with = "blank_as_none")]
    #[validate(required(message = "Ranking Required!"))]
    pub ranking: Option<String>,

    #[serde(default)]
    pub csrf_token: String,
}

impl EditMovieForm {
    pub fn from_movie(movie: &Movie) -> Self {
        Self {
            rating: Some(movie.rating.to_string()),
            ranking: Some(movie.ranking.to_string()),
            csrf_token: String::new(),
        }
    }

    pub fn parse(&self) -> Result<RatingRanking, FieldErrors> {
        let mut errors = validated(self);
        let rating = check(&mut errors, "rating", &self.rating, parse_rating);
        let ranking = check(&mut errors, "ranking", &self.ranking, parse_ranking);

        match (rating, ranking) {
            (Some(rating), Some(ranking)) if errors.is_empty() => Ok(RatingRanking { rating, ranking }),
            _ => Err(errors),
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct DeleteForm {
    #[serde(default)]
    pub csrf_token: String,
}

fn blank_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<String>::deserialize(deserializer)?;
    Ok(value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty()))
}

fn validated<T: Validate>(form: &T) -> FieldErrors {
    form.validate().err().map(FieldErrors::from).unwrap_or_default()
}

// Absent fields were already reported by `required`.
fn check<T>(
    errors: &mut FieldErrors,
    field: &str,
    value: &Option<String>,
    parse: fn(&str) -> Result<T, &'static str>,
) -> Option<T> {
    match parse(value.as_deref()?) {
        Ok(parsed) => Some(parsed),
        Err(message) => {
            errors.add(field, message);
            None
        },
    }
}

// Four characters, as the form has always required; digits because the column is an integer.
fn parse_year(year: &str) -> Result<i32, &'static str> {
    if year.len() != 4 || !year.bytes().all(|b| b.is_ascii_digit()) {
        return Err(INVALID_YEAR);
    }
    year.parse().map_err(|_| INVALID_YEAR)
}

fn parse_rating(rating: &str) -> Result<f64, &'static str> {
    match rating.parse::<f64>() {
        Ok(r) if r.is_finite() => Ok(r),
        _ => Err(INVALID_FLOAT),
    }
}

fn parse_ranking(ranking: &str) -> Result<i32, &'static str> {
    ranking.parse().map_err(|_| INVALID_INTEGER)
}

// `url` accepts any scheme; posters must be http(s) with a dotted host name.
fn is_web_url(url: &str) -> bool {
    let lower = url.to_ascii_lowercase();
    let Some(rest) = lower.strip_prefix("https://").or_else(|| lower.strip_prefix("http://")) else {
        return false;
    };
    let authority = rest.split(['/', '?', '#']).next().unwrap_or_default();
    let host_port = authority.rsplit('@').next().unwrap_or_default();
    let host = host_port.split(':').next().unwrap_or_default();

    host.contains('.') && host.split('.').all(|label| !label.is_empty())
}
