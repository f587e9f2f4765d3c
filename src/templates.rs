use axum::http::StatusCode;
use maud::{DOCTYPE, Markup, html};

use crate::{
    csrf::CSRF_FIELD,
    forms::{AddMovieForm, EditMovieForm, FieldErrors},
    models::Movie,
};

const TAILWIND_CDN: &str = "https://cdn.tailwindcss.com";

const INPUT_CLASS: &str = "mt-2 w-full rounded-md border border-gray-300 px-3 py-2 focus:border-blue-500 focus:outline-none focus:ring-1 focus:ring-blue-500";
const BUTTON_CLASS: &str =
    "w-full rounded-md bg-blue-600 px-4 py-2 font-semibold text-white hover:bg-blue-700";

pub fn list_page(movies: &[Movie], csrf_token: &str) -> String {
    page(
        "My Top Movies",
        html! {
            div class="min-h-screen bg-gray-50" {
                div class="max-w-4xl mx-auto px-6 py-10" {
                    div class="flex items-start justify-between gap-6" {
                        div {
                            h1 class="text-3xl font-bold text-gray-900" { "My Top Movies" }
                            p class="mt-2 text-gray-600" { "These are my all-time favourite movies." }
                        }
                        a class="rounded-md bg-blue-600 px-4 py-2 text-sm font-semibold text-white hover:bg-blue-700" href="/add" { "Add Movie" }
                    }

                    @if movies.is_empty() {
                        div class="mt-10 bg-white shadow rounded-lg p-8" {
                            p class="text-gray-600" { "No movies yet." }
                        }
                    } @else {
                        div class="mt-10 space-y-4" {
                            @for movie in movies {
                                (movie_card(movie, csrf_token))
                            }
                        }
                    }
                }
            }
        },
    )
}

pub fn add_page(form: &AddMovieForm, errors: &FieldErrors, csrf_token: &str) -> String {
    page(
        "Add Movie",
        form_shell(
            "Add a Movie",
            None,
            html! {
                form class="mt-8 space-y-6" method="post" action="/add" novalidate {
                    (csrf_input(csrf_token))
                    (text_field("Movie Title", "title", "text", form.title.as_deref(), errors))
                    (text_field("Year", "year", "text", form.year.as_deref(), errors))
                    (text_field("Description", "description", "text", form.description.as_deref(), errors))
                    (text_field("Rating", "rating", "text", form.rating.as_deref(), errors))
                    (text_field("Ranking", "ranking", "text", form.ranking.as_deref(), errors))
                    (text_field("Poster", "image", "url", form.image.as_deref(), errors))
                    button class=(BUTTON_CLASS) type="submit" { "Submit" }
                }
            },
        ),
    )
}

pub fn edit_page(
    movie: &Movie,
    form: &EditMovieForm,
    errors: &FieldErrors,
    csrf_token: &str,
) -> String {
    let current =
        format!("{} · currently {} / 10, ranked #{}", movie.year, rating(movie.rating), movie.ranking);

    page(
        "Edit Movie",
        form_shell(
            &movie.title,
            Some(current.as_str()),
            html! {
                form class="mt-8 space-y-6" method="post" action=(format!("/edit/{}", movie.id)) novalidate {
                    (csrf_input(csrf_token))
                    (text_field("Your Rating Out of 10 e.g. 7.5", "rating", "text", form.rating.as_deref(), errors))
                    (text_field("Ranking", "ranking", "text", form.ranking.as_deref(), errors))
                    button class=(BUTTON_CLASS) type="submit" { "Done" }
                }
            },
        ),
    )
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    page(
        "Error",
        html! {
            div class="min-h-screen bg-gray-50 flex items-center justify-center" {
                div class="max-w-xl w-full px-6" {
                    div class="bg-white shadow rounded-lg p-8" {
                        h1 class="text-2xl font-bold text-gray-900" {
                            (status.as_u16()) " " (status.canonical_reason().unwrap_or("Error"))
                        }
                        p class="mt-4 text-gray-700" { (message) }
                        a class="mt-6 inline-block text-blue-600 hover:text-blue-800" href="/" { "Back" }
                    }
                }
            }
        },
    )
}

fn page(title: &str, body: Markup) -> String {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src=(TAILWIND_CDN) {}
            }
            body { (body) }
        }
    }
    .into_string()
}

fn form_shell(heading: &str, subheading: Option<&str>, form: Markup) -> Markup {
    html! {
        div class="min-h-screen bg-gray-50" {
            div class="max-w-2xl mx-auto px-6 py-12" {
                div class="bg-white shadow rounded-lg p-8" {
                    h1 class="text-3xl font-bold text-gray-900" { (heading) }
                    @if let Some(sub) = subheading {
                        p class="mt-2 text-gray-600" { (sub) }
                    }
                    (form)
                    a class="mt-6 inline-block text-sm text-blue-600 hover:text-blue-800" href="/" { "Back to list" }
                }
            }
        }
    }
}

fn csrf_input(token: &str) -> Markup {
    html! { input type="hidden" name=(CSRF_FIELD) value=(token); }
}

fn text_field(
    label: &str,
    name: &str,
    kind: &str,
    value: Option<&str>,
    errors: &FieldErrors,
) -> Markup {
    html! {
        div {
            label class="block text-sm font-medium text-gray-700" for=(name) { (label) }
            input class=(INPUT_CLASS) type=(kind) name=(name) id=(name) value=[value];
            @for message in errors.get(name) {
                p class="mt-2 text-sm text-red-600" { (message) }
            }
        }
    }
}

fn movie_card(movie: &Movie, csrf_token: &str) -> Markup {
    html! {
        div class="bg-white shadow rounded-lg p-6 flex gap-6" {
            img class="h-40 w-28 flex-none rounded object-cover" src=(movie.image) alt=(movie.title);
            div class="flex-1" {
                div class="flex items-start justify-between gap-4" {
                    h2 class="text-xl font-semibold text-gray-900" {
                        span class="mr-2 text-gray-400" { "#" (movie.ranking) }
                        (movie.title)
                        span class="ml-2 font-normal text-gray-500" { "(" (movie.year) ")" }
                    }
                    span class="text-lg font-semibold text-gray-900" { (rating(movie.rating)) " / 10" }
                }
                p class="mt-3 text-gray-700" { (movie.description) }
                div class="mt-4 flex items-center gap-4" {
                    a class="text-sm text-blue-600 hover:text-blue-800" href=(format!("/edit/{}", movie.id)) { "Update" }
                    form method="post" action=(format!("/delete/{}", movie.id)) {
                        (csrf_input(csrf_token))
                        button class="text-sm text-red-600 hover:text-red-800" type="submit" { "Delete" }
                    }
                }
            }
        }
    }
}

fn rating(value: f64) -> String {
    format!("{value:.1}")
}
