use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
}

/// A browser cookie change notification.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CookieChange {
    pub cookie: Cookie,
    pub removed: bool,
}

/// Which cookies signal a logged-in session on the web app.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthCookiePolicy {
    pub domain: String,
    pub cookie_names: Vec<String>,
}

impl Default for AuthCookiePolicy {
    fn default() -> Self {
        Self {
            domain: "resume-builder.app".to_string(),
            cookie_names: vec!["__session".to_string(), "firebase-auth-token".to_string()],
        }
    }
}

impl AuthCookiePolicy {
    /// True if the change concerns one of the watched cookies on the app domain.
    pub fn watches(&self, change: &CookieChange) -> bool {
        self.is_watched(&change.cookie)
    }

    /// Session presence: any watched cookie with a non-empty value.
    pub fn is_authenticated<'a>(&self, cookies: impl IntoIterator<Item = &'a Cookie>) -> bool {
        cookies
            .into_iter()
            .any(|cookie| self.is_watched(cookie) && !cookie.value.trim().is_empty())
    }

    fn is_watched(&self, cookie: &Cookie) -> bool {
        self.cookie_names.iter().any(|name| *name == cookie.name) && self.domain_matches(&cookie.domain)
    }

    fn domain_matches(&self, cookie_domain: &str) -> bool {
        let cookie_domain = cookie_domain.trim_start_matches('.').to_ascii_lowercase();
        let domain = self.domain.trim_start_matches('.').to_ascii_lowercase();
        cookie_domain == domain || cookie_domain.ends_with(&format!(".{domain}"))
    }
}
