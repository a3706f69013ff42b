/// Shell-wide preferences consulted by the tab state machine.
///
/// These mirror what the settings surface can change at runtime: the search
/// engine used for non-URL omnibox input, the page a fresh tab opens on,
/// and the favicons used for ordinary and internal pages.
#[derive(Debug, Clone)]
pub struct ShellConfig {
    /// Search URL prefix; the raw query is appended verbatim.
    pub search_url_template: String,
    /// URL a freshly created tab points at when no URL is supplied.
    pub default_url: String,
    /// Favicon recorded for ordinary pages that never reported one.
    pub default_favicon: String,
    /// Favicon forced onto internal (`tabshell://`) pages.
    pub internal_favicon: String,
    pub homepage: String,
    pub pdf_viewer: String,
    pub lang: String,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            search_url_template: "https://www.google.com/search?q=".to_string(),
            default_url: format!("{}{}", INTERNAL_SCHEME, "newtab"),
            default_favicon: "tabshell://favicon/document".to_string(),
            internal_favicon: "tabshell://favicon/internal".to_string(),
            homepage: "https://example.com".to_string(),
            pdf_viewer: "pdf-viewer".to_string(),
            lang: "en".to_string(),
        }
    }
}

/// Scheme prefix of internal shell pages.
pub const INTERNAL_SCHEME: &str = "tabshell://";
/// Scheme prefix of extension-served internal pages.
pub const INTERNAL_EXTENSION_SCHEME: &str = "tabshell-extension://";

/// Which internal scheme family a URL belongs to, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InternalUrl {
    /// `tabshell://…` shell pages.
    Shell,
    /// `tabshell-extension://…` extension pages.
    Extension,
}

/// Classifies a URL against the reserved internal scheme family.
/// A bare scheme with nothing after it does not count.
pub fn classify_internal(url: &str) -> Option<InternalUrl> {
    if let Some(rest) = url.strip_prefix(INTERNAL_SCHEME) {
        (!rest.is_empty()).then_some(InternalUrl::Shell)
    } else if let Some(rest) = url.strip_prefix(INTERNAL_EXTENSION_SCHEME) {
        (!rest.is_empty()).then_some(InternalUrl::Extension)
    } else {
        None
    }
}

/// Synthesizes the `host : fragment` display title of an internal shell
/// page, e.g. `tabshell://settings#/history` becomes `settings : history`.
/// Pages without a fragment display as `host : about`.
pub fn internal_page_title(url: &str) -> String {
    let rest = url.strip_prefix(INTERNAL_SCHEME).unwrap_or(url);
    let host = rest.split(['/', '#', '?']).next().unwrap_or("");
    let fragment = url
        .split_once('#')
        .map(|(_, f)| f.trim_start_matches('/'))
        .unwrap_or("");
    let section = if fragment.is_empty() { "about" } else { fragment };
    format!("{} : {}", host, section)
}
