use axum::{
    Form,
    extract::State,
    response::{Html, Redirect},
};
use axum_extra::extract::cookie::PrivateCookieJar;
use chrono::{Datelike, Local};
use serde::Deserialize;
use tracing::{error, info};

use crate::error::FolioError;
use crate::middleware::{FlashLevel, push_flash, take_flashes};
use crate::router::FolioState;
use crate::views;

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub message: String,
}

/// GET / -> landing page with the contact form.
pub async fn home(
    State(state): State<FolioState>,
    jar: PrivateCookieJar,
) -> (PrivateCookieJar, Html<String>) {
    let (flashes, jar) = take_flashes(jar);
    let page = views::public::home_page(&state.config.site_title, Local::now().year(), &flashes);
    (jar, Html(page))
}

/// POST /contact -> stores the message and redirects back to the form.
pub async fn contact(
    State(state): State<FolioState>,
    jar: PrivateCookieJar,
    Form(form): Form<ContactForm>,
) -> (PrivateCookieJar, Redirect) {
    let jar = match state
        .feedback
        .submit(&form.name, &form.email, &form.message)
        .await
    {
        Ok(record) => {
            info!(id = record.id, "feedback received");
            push_flash(
                jar,
                &state.cookies,
                FlashLevel::Success,
                "Thanks for reaching out! I'll get back to you shortly.",
            )
        }
        Err(FolioError::Validation(msg)) => push_flash(jar, &state.cookies, FlashLevel::Danger, msg),
        Err(e) => {
            error!(error = %e, "failed to store feedback");
            push_flash(
                jar,
                &state.cookies,
                FlashLevel::Warning,
                "Your message could not be saved. Please try again later.",
            )
        }
    };
    (jar, Redirect::to("/#contact"))
}
