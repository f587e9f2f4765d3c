use axum::{
    Router,
    extract::{Form, Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use axum_extra::extract::cookie::SignedCookieJar;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

use crate::{
    AppState, csrf,
    error::{AppError, AppResult},
    forms::{AddMovieForm, DeleteForm, EditMovieForm, FieldErrors},
    models::Movie,
    store::StoreError,
    templates,
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(list))
        .route("/add", get(add_form).post(add))
        .route("/edit/{id}", get(edit_form).post(edit))
        .route("/delete/{id}", post(delete))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

pub async fn list(
    State(state): State<AppState>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let movies = state.store.list_all_by_ranking().await?;
    let (jar, token) = csrf::ensure_token(jar);
    Ok((jar, Html(templates::list_page(&movies, &token))))
}

pub async fn add_form(jar: SignedCookieJar) -> (SignedCookieJar, Html<String>) {
    let (jar, token) = csrf::ensure_token(jar);
    let body = templates::add_page(&AddMovieForm::default(), &FieldErrors::default(), &token);
    (jar, Html(body))
}

pub async fn add(
    State(state): State<AppState>,
    jar: SignedCookieJar,
    Form(form): Form<AddMovieForm>,
) -> AppResult<Response> {
    csrf::verify(&jar, &form.csrf_token)?;

    let new_movie = match form.parse() {
        Ok(new_movie) => new_movie,
        Err(errors) => {
            debug!(fields = ?errors.fields().collect::<Vec<_>>(), "add form rejected");
            return Ok(rejected(templates::add_page(&form, &errors, &form.csrf_token)));
        },
    };

    match state.store.insert(new_movie).await {
        Ok(movie) => {
            info!(id = movie.id, title = %movie.title, ranking = movie.ranking, "movie added");
            Ok(redirect_home())
        },
        Err(StoreError::DuplicateTitle(_)) => {
            let errors = FieldErrors::single("title", "A movie with this title already exists!");
            Ok(rejected(templates::add_page(&form, &errors, &form.csrf_token)))
        },
        Err(err) => Err(err.into()),
    }
}

pub async fn edit_form(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
) -> AppResult<(SignedCookieJar, Html<String>)> {
    let movie = find_movie(&state, id).await?;
    let (jar, token) = csrf::ensure_token(jar);
    let body = templates::edit_page(
        &movie,
        &EditMovieForm::from_movie(&movie),
        &FieldErrors::default(),
        &token,
    );
    Ok((jar, Html(body)))
}

pub async fn edit(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
    Form(form): Form<EditMovieForm>,
) -> AppResult<Response> {
    csrf::verify(&jar, &form.csrf_token)?;

    let values = match form.parse() {
        Ok(values) => values,
        Err(errors) => {
            debug!(id, fields = ?errors.fields().collect::<Vec<_>>(), "edit form rejected");
            let movie = find_movie(&state, id).await?;
            return Ok(rejected(templates::edit_page(&movie, &form, &errors, &form.csrf_token)));
        },
    };

    state.store.update_rating_ranking(id, values).await?;
    info!(id, rating = values.rating, ranking = values.ranking, "movie updated");
    Ok(redirect_home())
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    jar: SignedCookieJar,
    Form(form): Form<DeleteForm>,
) -> AppResult<Response> {
    csrf::verify(&jar, &form.csrf_token)?;

    let removed = state.store.delete_by_id(id).await?;
    info!(id, removed, "movie deleted");
    Ok(redirect_home())
}

async fn find_movie(state: &AppState, id: i32) -> AppResult<Movie> {
    state
        .store
        .get_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("There is no movie with id {id}.")))
}

fn redirect_home() -> Response {
    (StatusCode::FOUND, [(header::LOCATION, "/")]).into_response()
}

fn rejected(body: String) -> Response {
    (StatusCode::UNPROCESSABLE_ENTITY, Html(body)).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{db, models::NewMovie, store::MovieStore};
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    const INCEPTION: &str = "title=Inception&year=2010&description=A+thief...&rating=8.8&ranking=1&image=https%3A%2F%2Fexample.com%2Fp.jpg";

    async fn app() -> (Router, MovieStore) {
        let store = MovieStore::new(db::in_memory().await);
        (router(AppState::new(store.clone(), "")), store)
    }

    async fn send(app: &Router, request: Request<Body>) -> Response {
        app.clone().oneshot(request).await.unwrap()
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_request(uri: &str, cookie: &str, body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/x-www-form-urlencoded")
            .header(header::COOKIE, cookie)
            .body(Body::from(body))
            .unwrap()
    }

    async fn body_text(response: Response) -> String {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    async fn session(app: &Router) -> (String, String) {
        let response = send(app, get_request("/add")).await;
        let cookie = response
            .headers()
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .expect("csrf cookie")
            .to_string();

        let body = body_text(response).await;
        let marker = r#"name="csrf_token" value=""#;
        let start = body.find(marker).expect("token field") + marker.len();
        let token = body[start..].split('"').next().unwrap().to_string();
        (cookie, token)
    }

    async fn seed(store: &MovieStore, title: &str, ranking: i32) -> Movie {
        store
            .insert(NewMovie {
                title: title.to_string(),
                year: 1979,
                description: "In space no one can hear you scream.".to_string(),
                rating: 8.5,
                ranking,
                image: "https://example.com/alien.jpg".to_string(),
            })
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn list_starts_empty_and_issues_a_token() {
        let (app, _) = app().await;
        let response = send(&app, get_request("/")).await;

        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().contains_key(header::SET_COOKIE));
        assert!(body_text(response).await.contains("No movies yet."));
    }

    #[tokio::test]
    async fn add_persists_and_redirects_home() {
        let (app, store) = app().await;
        let (cookie, token) = session(&app).await;

        let response =
            send(&app, post_request("/add", &cookie, format!("{INCEPTION}&csrf_token={token}")))
                .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(response.headers()[header::LOCATION], "/");

        let movies = store.list_all_by_ranking().await.unwrap();
        assert_eq!(movies.len(), 1);
        assert_eq!(movies[0].title, "Inception");
        assert_eq!(movies[0].description, "A thief...");
        assert_eq!(movies[0].image, "https://example.com/p.jpg");

        let list = body_text(send(&app, get_request("/")).await).await;
        assert!(list.contains("Inception"));
    }

    #[tokio::test]
    async fn add_with_empty_title_is_rejected() {
        let (app, store) = app().await;
        let (cookie, token) = session(&app).await;
        let body = INCEPTION.replace("title=Inception", "title=");

        let response =
            send(&app, post_request("/add", &cookie, format!("{body}&csrf_token={token}"))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("Title Required!"));
        assert!(store.list_all_by_ranking().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_with_bad_image_url_is_rejected() {
        let (app, store) = app().await;
        let (cookie, token) = session(&app).await;
        let body = INCEPTION.replace("https%3A%2F%2Fexample.com%2Fp.jpg", "not-a-url");

        let response =
            send(&app, post_request("/add", &cookie, format!("{body}&csrf_token={token}"))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let html = body_text(response).await;
        assert!(html.contains("Invalid"));
        assert!(html.contains(r#"value="Inception""#));

        let body = INCEPTION.replace("https%3A%2F%2Fexample.com%2Fp.jpg", "javascript%3Aalert(1)");
        let response =
            send(&app, post_request("/add", &cookie, format!("{body}&csrf_token={token}"))).await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(store.list_all_by_ranking().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn add_with_duplicate_title_shows_message() {
        let (app, store) = app().await;
        seed(&store, "Inception", 4).await;
        let (cookie, token) = session(&app).await;

        let response =
            send(&app, post_request("/add", &cookie, format!("{INCEPTION}&csrf_token={token}")))
                .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("A movie with this title already exists!"));
        assert_eq!(store.list_all_by_ranking().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn post_without_token_is_forbidden() {
        let (app, store) = app().await;
        let (cookie, _) = session(&app).await;

        let response = send(&app, post_request("/add", &cookie, INCEPTION.to_string())).await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);

        let response = send(
            &app,
            post_request("/add", "", format!("{INCEPTION}&csrf_token=guessed")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
        assert!(store.list_all_by_ranking().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_form_is_prefilled() {
        let (app, store) = app().await;
        let movie = seed(&store, "Alien", 3).await;

        let response = send(&app, get_request(&format!("/edit/{}", movie.id))).await;
        assert_eq!(response.status(), StatusCode::OK);
        let html = body_text(response).await;
        assert!(html.contains("Alien"));
        assert!(html.contains(r#"value="8.5""#));
    }

    #[tokio::test]
    async fn edit_form_for_unknown_id_is_not_found() {
        let (app, _) = app().await;
        let response = send(&app, get_request("/edit/404")).await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        assert!(body_text(response).await.contains("There is no movie with id 404."));
    }

    #[tokio::test]
    async fn non_numeric_id_is_a_bad_request() {
        let (app, _) = app().await;
        let response = send(&app, get_request("/edit/abc")).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn edit_updates_rating_and_ranking_only() {
        let (app, store) = app().await;
        let before = seed(&store, "Alien", 3).await;
        let (cookie, token) = session(&app).await;

        let response = send(
            &app,
            post_request(
                &format!("/edit/{}", before.id),
                &cookie,
                format!("rating=9.0&ranking=2&csrf_token={token}"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);

        let after = store.get_by_id(before.id).await.unwrap().unwrap();
        assert_eq!((after.rating, after.ranking), (9.0, 2));
        assert_eq!(after.title, before.title);
        assert_eq!(after.year, before.year);
        assert_eq!(after.description, before.description);
        assert_eq!(after.image, before.image);
    }

    #[tokio::test]
    async fn edit_with_missing_rating_rerenders_form() {
        let (app, store) = app().await;
        let movie = seed(&store, "Alien", 3).await;
        let (cookie, token) = session(&app).await;

        let response = send(
            &app,
            post_request(
                &format!("/edit/{}", movie.id),
                &cookie,
                format!("rating=&ranking=7&csrf_token={token}"),
            ),
        )
        .await;
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(body_text(response).await.contains("New Rating Required!"));
        assert_eq!(store.get_by_id(movie.id).await.unwrap().unwrap().ranking, 3);
    }

    #[tokio::test]
    async fn edit_of_unknown_id_is_not_found() {
        let (app, _) = app().await;
        let (cookie, token) = session(&app).await;

        let response = send(
            &app,
            post_request("/edit/77", &cookie, format!("rating=9.0&ranking=2&csrf_token={token}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn delete_removes_one_row_and_tolerates_missing_ids() {
        let (app, store) = app().await;
        let keep = seed(&store, "Heat", 1).await;
        let gone = seed(&store, "Alien", 2).await;
        let (cookie, token) = session(&app).await;

        let response = send(
            &app,
            post_request(&format!("/delete/{}", gone.id), &cookie, format!("csrf_token={token}")),
        )
        .await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(store.list_all_by_ranking().await.unwrap(), vec![keep]);

        let response =
            send(&app, post_request("/delete/999", &cookie, format!("csrf_token={token}"))).await;
        assert_eq!(response.status(), StatusCode::FOUND);
        assert_eq!(store.list_all_by_ranking().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn delete_is_not_reachable_with_get() {
        let (app, store) = app().await;
        let movie = seed(&store, "Heat", 1).await;

        let response = send(&app, get_request(&format!("/delete/{}", movie.id))).await;
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
        assert!(store.get_by_id(movie.id).await.unwrap().is_some());
    }
}
