// src/response.rs

use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use maud::{DOCTYPE, Markup, PreEscaped, html};

// W trakcie żądania htmx spinner zastępuje etykietę przycisku
const SUBMIT_BUTTON_CSS: &str = ".submit-spinner { display: none; } \
.htmx-request .submit-spinner { display: block; } \
.htmx-request .submit-label { display: none; }";

/// Pełny dokument HTML z htmx, SweetAlert2 i skryptem panelu.
fn render_shell_maud(title: &str, content: Markup) -> Markup {
    html! {
        (DOCTYPE)
        html lang="en" {
            head {
                meta charset="utf-8";
                meta name="viewport" content="width=device-width, initial-scale=1";
                title { (title) }
                script src="https://cdn.tailwindcss.com" {}
                script src="https://unpkg.com/htmx.org@2.0.4" {}
                script src="https://cdn.jsdelivr.net/npm/sweetalert2@11" {}
                script src="/static/admin.js" defer {}
                style { (PreEscaped(SUBMIT_BUTTON_CSS)) }
            }
            body class="bg-gray-50" {
                main #admin-content {
                    (content)
                }
            }
        }
    }
}

/// Dla żądań htmx zwraca tylko fragment, przy pełnym odświeżeniu (F5) całą stronę.
pub fn build_response(headers: &HeaderMap, title: &str, page_content: Markup) -> Response {
    if headers.contains_key("HX-Request") {
        page_content.into_response()
    } else {
        render_shell_maud(title, page_content).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    async fn body_of(response: Response) -> String {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        String::from_utf8(bytes.to_vec()).unwrap()
    }

    #[tokio::test]
    async fn htmx_request_gets_fragment_only() {
        let mut headers = HeaderMap::new();
        headers.insert("HX-Request", "true".parse().unwrap());
        let body = body_of(build_response(&headers, "Add", html! { p { "x" } })).await;
        assert_eq!(body, "<p>x</p>");
    }

    #[tokio::test]
    async fn full_load_gets_shell() {
        let body = body_of(build_response(&HeaderMap::new(), "Add", html! { p { "x" } })).await;
        assert!(body.starts_with("<!DOCTYPE html>"));
        assert!(body.contains("<main id=\"admin-content\"><p>x</p></main>"));
        assert!(body.contains("/static/admin.js"));
        assert!(body.contains(".htmx-request .submit-label { display: none; }"));
    }
}
