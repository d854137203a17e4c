//! HTML views, rendered with plain string templates.
//!
//! Every user-supplied value goes through [`html_escape`] before it lands in
//! markup.

pub mod admin;
pub mod public;

use axum::http::StatusCode;

use crate::middleware::Flash;

/// Base HTML layout wrapper.
pub fn layout(title: &str, body_class: &str, content: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title}</title>
    <link rel="stylesheet" href="/static/css/site.css">
</head>
<body class="{body_class}">
{content}
</body>
</html>"##,
        title = html_escape(title),
        body_class = body_class,
        content = content,
    )
}

/// Flash messages as dismissible alert boxes. Empty when there are none.
pub fn flash_list(flashes: &[Flash]) -> String {
    if flashes.is_empty() {
        return String::new();
    }
    let items: String = flashes
        .iter()
        .map(|f| {
            format!(
                r#"<div class="alert alert-{level}" role="alert">{message}</div>"#,
                level = f.level.as_str(),
                message = html_escape(&f.message),
            )
        })
        .collect::<Vec<_>>()
        .join("\n");
    format!(r#"<div class="flashes">{items}</div>"#)
}

pub fn error_page(status: StatusCode, message: &str) -> String {
    let content = format!(
        r##"<main class="narrow">
    <h1>{code}</h1>
    <p>{message}</p>
    <p><a href="/">Back to the home page</a></p>
</main>"##,
        code = status.as_u16(),
        message = html_escape(message),
    );
    layout(
        status.canonical_reason().unwrap_or("Error"),
        "error",
        &content,
    )
}

/// Simple HTML escape function
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::middleware::FlashLevel;

    #[test]
    fn escapes_markup() {
        assert_eq!(
            html_escape(r#"<script>alert("x") & 'y'</script>"#),
            "&lt;script&gt;alert(&quot;x&quot;) &amp; &#x27;y&#x27;&lt;/script&gt;"
        );
    }

    #[test]
    fn flashes_render_with_level_class() {
        let html = flash_list(&[Flash {
            level: FlashLevel::Danger,
            message: "Please fill in all fields.".to_string(),
        }]);
        assert!(html.contains(r#"class="alert alert-danger""#));
        assert!(html.contains("Please fill in all fields."));
        assert_eq!(flash_list(&[]), "");
    }
}
