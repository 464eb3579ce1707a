//! Small text helpers shared by the generator and the renderers.

/// Escapes text for use inside HTML element content or a double-quoted attribute.
pub fn escape_html(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Turns a document filename into a display title.
///
/// `literature_review-notes.html` becomes `Literature Review Notes`.
pub fn format_filename(filename: &str) -> String {
    filename
        .replacen(".html", "", 1)
        .replace(['_', '-'], " ")
        .split(' ')
        .map(capitalize)
        .collect::<Vec<_>>()
        .join(" ")
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_filenames_into_titles() {
        assert_eq!(format_filename("index.html"), "Index");
        assert_eq!(
            format_filename("literature_review-notes.html"),
            "Literature Review Notes"
        );
        assert_eq!(format_filename("week-01_reflection.html"), "Week 01 Reflection");
    }

    #[test]
    fn keeps_repeated_separators_as_empty_words() {
        assert_eq!(format_filename("a__b.html"), "A  B");
    }

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(
            escape_html(r#"<a href="x">Tom & Jerry's</a>"#),
            "&lt;a href=&quot;x&quot;&gt;Tom &amp; Jerry&#39;s&lt;/a&gt;"
        );
    }
}
