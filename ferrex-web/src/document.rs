use crate::{
    theme::Theme,
    view::{HeadMeta, View, escape_html, render_html},
};

/// Full HTML document: head metadata, the composed shell, and the payload
/// script the client hydrates from.
pub fn render_document(body: &View, head: &HeadMeta, theme: Theme, payload_script: &str) -> String {
    let description = head
        .description
        .as_deref()
        .map(|text| format!(r#"<meta name="description" content="{}">"#, escape_html(text)))
        .unwrap_or_default();

    format!(
        concat!(
            "<!DOCTYPE html>",
            r#"<html lang="en" data-theme="{theme}">"#,
            "<head>",
            r#"<meta charset="utf-8">"#,
            r#"<meta name="viewport" content="width=device-width, initial-scale=1">"#,
            r#"<meta name="color-scheme" content="{theme}">"#,
            "<title>{title}</title>",
            "{description}",
            "</head>",
            r#"<body><div id="__ferrex">{body}</div>{payload}</body>"#,
            "</html>",
        ),
        theme = theme,
        title = escape_html(&head.title),
        description = description,
        body = render_html(body),
        payload = payload_script,
    )
}
