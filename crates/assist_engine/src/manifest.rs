use url::Url;

/// A Chrome extension match pattern: `<scheme>://<host><path>`.
///
/// `*` as scheme matches http and https; a host of `*.example.com` matches
/// the domain and its subdomains; `*` in the path matches any run of characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchPattern {
    raw: String,
    scheme: String,
    host: String,
    path: String,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid match pattern {pattern:?}: {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: &'static str,
}

impl MatchPattern {
    pub fn parse(raw: &str) -> Result<Self, PatternError> {
        let invalid = |reason| PatternError {
            pattern: raw.to_string(),
            reason,
        };
        let (scheme, rest) = raw.split_once("://").ok_or_else(|| invalid("missing ://"))?;
        if !matches!(scheme, "*" | "http" | "https") {
            return Err(invalid("unsupported scheme"));
        }
        let slash = rest.find('/').ok_or_else(|| invalid("missing path"))?;
        let (host, path) = rest.split_at(slash);
        if host.is_empty() {
            return Err(invalid("missing host"));
        }
        if host.chars().skip(1).any(|c| c == '*') {
            return Err(invalid("wildcard only allowed as host prefix"));
        }
        Ok(Self {
            raw: raw.to_string(),
            scheme: scheme.to_string(),
            host: host.to_ascii_lowercase(),
            path: path.to_string(),
        })
    }

    pub fn as_str(&self) -> &str {
        &self.raw
    }

    pub fn matches(&self, url: &Url) -> bool {
        let scheme_ok = match self.scheme.as_str() {
            "*" => matches!(url.scheme(), "http" | "https"),
            scheme => url.scheme() == scheme,
        };
        if !scheme_ok {
            return false;
        }

        let host = url.host_str().unwrap_or_default().to_ascii_lowercase();
        let host_ok = match self.host.strip_prefix("*.") {
            _ if self.host == "*" => true,
            Some(domain) => host == domain || host.ends_with(&format!(".{domain}")),
            None => host == self.host,
        };
        if !host_ok {
            return false;
        }

        let mut path = url.path().to_string();
        if let Some(query) = url.query() {
            path.push('?');
            path.push_str(query);
        }
        glob_matches(&self.path, &path)
    }
}

/// `*` matches any (possibly empty) run of characters; everything else is literal.
fn glob_matches(pattern: &str, text: &str) -> bool {
    let mut parts = pattern.split('*');
    let Some(first) = parts.next() else {
        return text.is_empty();
    };
    let Some(mut rest) = text.strip_prefix(first) else {
        return false;
    };
    let parts: Vec<&str> = parts.collect();
    let Some((last, middle)) = parts.split_last() else {
        return rest.is_empty();
    };
    for part in middle {
        match rest.find(part) {
            Some(index) => rest = &rest[index + part.len()..],
            None => return false,
        }
    }
    rest.ends_with(last)
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentScriptRule {
    pub matches: Vec<MatchPattern>,
    pub script: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ContextMenuItem {
    pub id: &'static str,
    pub title: &'static str,
}

pub const SAVE_JOB_MENU_ITEM: ContextMenuItem = ContextMenuItem {
    id: "save-job-to-tracker",
    title: "Save job to tracker",
};

/// Static extension wiring: where content scripts run and which menu items exist.
#[derive(Debug, Clone)]
pub struct Manifest {
    pub content_scripts: Vec<ContentScriptRule>,
    pub context_menu: Vec<ContextMenuItem>,
}

impl Manifest {
    pub fn job_assist() -> Result<Self, PatternError> {
        let matches = ["https://*.linkedin.com/jobs/*", "https://*.indeed.com/*"]
            .into_iter()
            .map(MatchPattern::parse)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            content_scripts: vec![ContentScriptRule {
                matches,
                script: "content.js",
            }],
            context_menu: vec![SAVE_JOB_MENU_ITEM],
        })
    }

    /// Whether a tab showing `url` gets a content script.
    pub fn content_script_matches(&self, url: &str) -> bool {
        let Ok(url) = Url::parse(url) else {
            return false;
        };
        self.content_scripts
            .iter()
            .flat_map(|rule| rule.matches.iter())
            .any(|pattern| pattern.matches(&url))
    }
}
