use url::form_urlencoded;

use crate::middleware::Flash;
use crate::service::credentials::MIN_PASSWORD_LEN;
use crate::service::feedback::FeedbackPage;
use crate::views::{flash_list, html_escape, layout};

pub const FEEDBACK_PATH: &str = "/admin/feedback";
pub const EXPORT_PATH: &str = "/admin/feedback/export/pdf";

/// Listing URL for `page`, keeping the active search.
pub fn feedback_url(page: u32, search: Option<&str>) -> String {
    let mut query = form_urlencoded::Serializer::new(String::new());
    query.append_pair("page", &page.to_string());
    if let Some(term) = search {
        query.append_pair("search", term);
    }
    format!("{FEEDBACK_PATH}?{}", query.finish())
}

pub fn export_url(search: Option<&str>) -> String {
    match search {
        Some(term) => {
            let query = form_urlencoded::Serializer::new(String::new())
                .append_pair("search", term)
                .finish();
            format!("{EXPORT_PATH}?{query}")
        }
        None => EXPORT_PATH.to_string(),
    }
}

pub fn login_page(flashes: &[Flash]) -> String {
    let content = format!(
        r##"<main class="narrow">
    <h1>Admin login</h1>
    {flashes}
    <form method="post" action="/admin/login" class="stacked">
        <label for="username">Username</label>
        <input id="username" name="username" type="text" autocomplete="username" required>
        <label for="password">Password</label>
        <input id="password" name="password" type="password" autocomplete="current-password" required>
        <button type="submit" class="button">Log in</button>
    </form>
    <p><a href="/">Back to the site</a></p>
</main>"##,
        flashes = flash_list(flashes),
    );
    layout("Admin login", "admin", &content)
}

pub fn force_change_page(username: &str, flashes: &[Flash]) -> String {
    let content = format!(
        r##"<main class="narrow">
    <h1>Choose a new password</h1>
    <p>The account <strong>{username}</strong> must set a new password before continuing.</p>
    {flashes}
    <form method="post" action="/admin/force-change" class="stacked">
        <label for="new_password">New password</label>
        <input id="new_password" name="new_password" type="password" minlength="{min}" autocomplete="new-password" required>
        <label for="confirm_password">Confirm password</label>
        <input id="confirm_password" name="confirm_password" type="password" minlength="{min}" autocomplete="new-password" required>
        <button type="submit" class="button">Update password</button>
    </form>
    <p><a href="/admin/logout">Log out</a></p>
</main>"##,
        username = html_escape(username),
        flashes = flash_list(flashes),
        min = MIN_PASSWORD_LEN,
    );
    layout("Change password", "admin", &content)
}

pub fn feedback_page(username: &str, listing: &FeedbackPage, flashes: &[Flash]) -> String {
    let search = listing.search.as_deref();
    let search_value = html_escape(search.unwrap_or(""));

    let rows = if listing.items.is_empty() {
        r#"<tr><td colspan="6" class="empty">No feedback found.</td></tr>"#.to_string()
    } else {
        listing
            .items
            .iter()
            .map(|f| {
                format!(
                    r##"<tr>
    <td>{id}</td>
    <td>{name}</td>
    <td><a href="mailto:{email}">{email}</a></td>
    <td class="message">{message}</td>
    <td class="nowrap">{date}</td>
    <td>
        <form method="post" action="/delete_feedback/{id}" onsubmit="return confirm('Delete this feedback?');">
            <input type="hidden" name="page" value="{page}">
            <input type="hidden" name="search" value="{search}">
            <button type="submit" class="button danger small">Delete</button>
        </form>
    </td>
</tr>"##,
                    id = f.id,
                    name = html_escape(&f.name),
                    email = html_escape(&f.email),
                    message = html_escape(&f.message),
                    date = f.created_at.format("%Y-%m-%d %H:%M"),
                    page = listing.page,
                    search = search_value,
                )
            })
            .collect::<Vec<_>>()
            .join("\n")
    };

    let content = format!(
        r##"<header class="admin-header">
    <h1>Feedback</h1>
    <p>Logged in as <strong>{username}</strong> &middot; <a href="/admin/logout">Log out</a></p>
</header>
<main class="wide">
    {flashes}
    <div class="toolbar">
        <form method="get" action="{feedback_path}" class="inline">
            <input name="search" type="search" placeholder="Search name, email or message" value="{search_value}">
            <button type="submit" class="button">Search</button>
            {clear}
        </form>
        <a class="button secondary" href="{export}">Export PDF</a>
    </div>
    <p class="summary">{total} result(s)</p>
    <table class="feedback">
        <thead>
            <tr><th>ID</th><th>Name</th><th>Email</th><th>Message</th><th>Date</th><th></th></tr>
        </thead>
        <tbody>
{rows}
        </tbody>
    </table>
    {pagination}
</main>"##,
        username = html_escape(username),
        flashes = flash_list(flashes),
        feedback_path = FEEDBACK_PATH,
        search_value = search_value,
        clear = if search.is_some() {
            format!(r#"<a href="{FEEDBACK_PATH}">Clear</a>"#)
        } else {
            String::new()
        },
        export = html_escape(&export_url(search)),
        total = listing.total,
        rows = rows,
        pagination = pagination(listing),
    );
    layout("Feedback", "admin", &content)
}

fn pagination(listing: &FeedbackPage) -> String {
    if listing.total_pages <= 1 {
        return String::new();
    }
    let search = listing.search.as_deref();
    let prev = if listing.has_prev() {
        format!(
            r#"<a href="{}">&laquo; Previous</a>"#,
            html_escape(&feedback_url(listing.page - 1, search))
        )
    } else {
        r#"<span class="disabled">&laquo; Previous</span>"#.to_string()
    };
    let next = if listing.has_next() {
        format!(
            r#"<a href="{}">Next &raquo;</a>"#,
            html_escape(&feedback_url(listing.page + 1, search))
        )
    } else {
        r#"<span class="disabled">Next &raquo;</span>"#.to_string()
    };
    format!(
        r#"<nav class="pagination">{prev} <span>Page {page} of {pages}</span> {next}</nav>"#,
        page = listing.page,
        pages = listing.total_pages,
    )
}
