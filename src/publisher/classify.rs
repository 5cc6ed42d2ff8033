use std::fmt;

/// Role of the page the browser is currently on. The automation loop is a
/// state machine over these roles; `Unknown` is a safe absorbing state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Page {
    DraftList,
    EditPage,
    ArticlePage,
    Unknown,
}

impl fmt::Display for Page {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Page::DraftList => "draft list",
            Page::EditPage => "edit page",
            Page::ArticlePage => "article page",
            Page::Unknown => "unknown page",
        };
        f.write_str(name)
    }
}

/// Classify a URL into a page role.
///
/// Purely pattern-based on hostname, path, and query substrings; page content
/// is never inspected here.
pub fn classify(url: &str) -> Page {
    let host = host_of(url).unwrap_or("");

    if url.contains("/notes") && url.contains("status=draft") {
        Page::DraftList
    } else if host == "editor.note.com" && url.contains("/edit") {
        Page::EditPage
    } else if url.contains("/n/") && url.contains("/edit") {
        Page::EditPage
    } else if url.contains("/n/") {
        Page::ArticlePage
    } else {
        Page::Unknown
    }
}

/// Extract the hostname from a URL, without ports.
fn host_of(url: &str) -> Option<&str> {
    let rest = url.split("://").nth(1)?;
    let authority = rest.split(['/', '?', '#']).next()?;
    authority.rsplit('@').next()?.split(':').next()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn draft_list_url_with_draft_filter() {
        assert_eq!(
            classify("https://note.com/notes?status=draft"),
            Page::DraftList
        );
    }

    #[test]
    fn notes_url_without_draft_filter_is_unknown() {
        assert_eq!(classify("https://note.com/notes"), Page::Unknown);
    }

    #[test]
    fn editor_host_with_edit_path() {
        assert_eq!(
            classify("https://editor.note.com/notes/n1234abcd/edit/"),
            Page::EditPage
        );
    }

    #[test]
    fn article_url_with_edit_suffix_is_edit_page() {
        assert_eq!(
            classify("https://note.com/someone/n/n1234abcd/edit"),
            Page::EditPage
        );
    }

    #[test]
    fn published_article_url() {
        assert_eq!(
            classify("https://note.com/someone/n/n1234abcd"),
            Page::ArticlePage
        );
    }

    #[test]
    fn unrelated_urls_are_unknown() {
        assert_eq!(classify("https://note.com/"), Page::Unknown);
        assert_eq!(classify("https://example.com/n-something"), Page::Unknown);
        assert_eq!(classify("about:blank"), Page::Unknown);
        assert_eq!(classify(""), Page::Unknown);
    }

    #[test]
    fn host_extraction_ignores_port_and_path() {
        assert_eq!(host_of("https://editor.note.com:443/x/edit"), Some("editor.note.com"));
        assert_eq!(host_of("https://note.com?x=1"), Some("note.com"));
        assert_eq!(host_of("no-scheme"), None);
    }
}
