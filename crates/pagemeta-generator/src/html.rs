//! HTML tag serialization.
//!
//! Small helpers shared by the head tag renderers. Attributes with no value
//! are dropped; all values are escaped.

/// Escape text for use in HTML attribute values and text nodes.
pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#039;"),
            _ => out.push(c),
        }
    }
    out
}

fn attributes(attrs: &[(&str, Option<&str>)]) -> String {
    attrs
        .iter()
        .filter_map(|(name, value)| value.map(|v| format!(r#" {name}="{}""#, escape_html(v))))
        .collect()
}

/// A void element such as `<meta>` or `<link>`.
pub fn void_tag(name: &str, attrs: &[(&str, Option<&str>)]) -> String {
    format!("<{name}{}>", attributes(attrs))
}

/// `<meta name=… content=…>`.
pub fn meta_name(name: &str, content: &str) -> String {
    void_tag("meta", &[("name", Some(name)), ("content", Some(content))])
}

/// `<meta property=… content=…>`.
pub fn meta_property(property: &str, content: &str) -> String {
    void_tag(
        "meta",
        &[("property", Some(property)), ("content", Some(content))],
    )
}

/// `<script src=… type="module"></script>`.
pub fn module_script(src: &str) -> String {
    format!(
        "<script{}></script>",
        attributes(&[("src", Some(src)), ("type", Some("module"))])
    )
}

/// `<link href=… rel="stylesheet">`.
pub fn stylesheet(href: &str) -> String {
    void_tag("link", &[("href", Some(href)), ("rel", Some("stylesheet"))])
}

/// Join tags one per line, with a trailing newline.
pub fn lines(tags: &[String]) -> String {
    let mut out = tags.join("\n");
    out.push('\n');
    out
}
