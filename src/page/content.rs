//! Content-file handling: pick the main body out of a document and point
//! its relative links at the phase folder.

use std::sync::LazyLock;

use regex::{Captures, Regex};

static ARTICLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<article\b[^>]*>(.*?)</article>").expect("valid article regex"));
static MAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<main\b[^>]*>(.*?)</main>").expect("valid main regex"));
static BODY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?is)<body\b[^>]*>(.*)</body>").expect("valid body regex"));
static HREF_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<a\b[^>]*?\shref\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid href regex")
});
static SRC_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)(<img\b[^>]*?\ssrc\s*=\s*)(?:"([^"]*)"|'([^']*)')"#).expect("valid src regex")
});

/// Inner HTML of the first `<article>`, else the first `<main>`, else
/// `<body>`, else the input.
pub fn extract_main_content(html: &str) -> &str {
    [&*ARTICLE_RE, &*MAIN_RE, &*BODY_RE]
        .into_iter()
        .find_map(|re| re.captures(html).and_then(|caps| caps.get(1)))
        .map(|m| m.as_str())
        .unwrap_or(html)
}

/// Prefixes relative link targets and image sources with `base`.
///
/// Links starting with `http`, `#` or `/` and images starting with `http`
/// or `/` are left alone.
pub fn fix_relative_links(html: &str, base: &str) -> String {
    let links = rewrite_attr(&HREF_RE, html, base, |v| {
        v.starts_with("http") || v.starts_with('#') || v.starts_with('/')
    });
    rewrite_attr(&SRC_RE, &links, base, |v| {
        v.starts_with("http") || v.starts_with('/')
    })
}

fn rewrite_attr(re: &Regex, html: &str, base: &str, keep: impl Fn(&str) -> bool) -> String {
    re.replace_all(html, |caps: &Captures| {
        let (value, quote) = match caps.get(2) {
            Some(m) => (m.as_str(), '"'),
            None => (caps.get(3).map_or("", |m| m.as_str()), '\''),
        };
        let value = if value.is_empty() || keep(value) {
            value.to_string()
        } else {
            format!("{base}{value}")
        };
        format!("{}{quote}{value}{quote}", &caps[1])
    })
    .into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prefers_article_then_main_then_body() {
        let doc = "<body><main><article class=\"x\"><p>A</p></article></main></body>";
        assert_eq!(extract_main_content(doc), "<p>A</p>");
        assert_eq!(
            extract_main_content("<body><main>\n<p>M</p>\n</main></body>"),
            "\n<p>M</p>\n"
        );
        assert_eq!(extract_main_content("<BODY class=\"b\"><p>B</p></BODY>"), "<p>B</p>");
        assert_eq!(extract_main_content("<p>bare</p>"), "<p>bare</p>");
    }

    #[test]
    fn rewrites_only_relative_targets() {
        let html = concat!(
            r##"<a href="notes.html">n</a> <a href="https://x.org">x</a> <a href="#top">t</a> "##,
            r#"<a class='c' href='/abs.html'>a</a> <img src="fig/1.png"> <img alt="y" src='http://i/2.png'>"#
        );
        let fixed = fix_relative_links(html, "thesis_html/3_literature_review/");

        assert!(fixed.contains(r#"<a href="thesis_html/3_literature_review/notes.html">"#));
        assert!(fixed.contains(r#"<a href="https://x.org">"#));
        assert!(fixed.contains(r##"<a href="#top">"##));
        assert!(fixed.contains("<a class='c' href='/abs.html'>"));
        assert!(fixed.contains(r#"<img src="thesis_html/3_literature_review/fig/1.png">"#));
        assert!(fixed.contains("<img alt=\"y\" src='http://i/2.png'>"));
    }

    #[test]
    fn image_fragments_are_rewritten_unlike_links() {
        let fixed = fix_relative_links(r##"<img src="#x"><a href="#x">"##, "base/");
        assert!(fixed.contains(r##"<img src="base/#x">"##));
        assert!(fixed.contains(r##"<a href="#x">"##));
    }

    #[test]
    fn takes_only_the_first_sibling_article() {
        let doc = "<body><article><p>A</p></article><aside>x</aside><article><p>B</p></article></body>";
        assert_eq!(extract_main_content(doc), "<p>A</p>");

        let doc = "<body><main>one</main><main>two</main></body>";
        assert_eq!(extract_main_content(doc), "one");
    }

    #[test]
    fn data_attributes_are_not_mistaken_for_targets() {
        let fixed = fix_relative_links(
            r#"<a data-href="x.html" href="y.html">y</a><img data-src="lazy.png" src="real.png">"#,
            "base/",
        );
        assert_eq!(
            fixed,
            r#"<a data-href="x.html" href="base/y.html">y</a><img data-src="lazy.png" src="base/real.png">"#
        );
    }
}
