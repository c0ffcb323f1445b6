//! Redirect rules for requests no page answered.
//!
//! Rules are tried in order. Patterns use named placeholders such as
//! `blog/(:any)`; captured segments fill `$1`, `$2`, ... in the target. Once
//! any rule is configured, a path that matches none resolves to the error
//! page.

use std::{fmt, sync::Arc};

use pagemeta_core::Config;
use regex::Regex;
use thiserror::Error;
use tracing::{debug, warn};

/// Redirect errors.
#[derive(Debug, Error)]
pub enum RedirectError {
    /// A rule pattern does not compile.
    #[error("invalid redirect pattern `{pattern}`: {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    /// A callback target refused to produce a location.
    #[error("redirect target failed: {0}")]
    Target(String),
}

/// Computes a target from the captured segments.
pub type RedirectCallback =
    Arc<dyn Fn(&[String]) -> std::result::Result<String, RedirectError> + Send + Sync>;

/// Where a rule sends the request.
#[derive(Clone)]
pub enum RedirectTarget {
    /// A path or URL, possibly with `$N` placeholders.
    Template(String),
    /// Computed target; placeholders in the result are filled too.
    Callback(RedirectCallback),
}

impl RedirectTarget {
    pub fn callback<F>(f: F) -> Self
    where
        F: Fn(&[String]) -> std::result::Result<String, RedirectError> + Send + Sync + 'static,
    {
        Self::Callback(Arc::new(f))
    }
}

impl fmt::Debug for RedirectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Template(target) => f.debug_tuple("Template").field(target).finish(),
            Self::Callback(_) => f.write_str("Callback(..)"),
        }
    }
}

impl From<&str> for RedirectTarget {
    fn from(target: &str) -> Self {
        Self::Template(target.to_string())
    }
}

impl From<String> for RedirectTarget {
    fn from(target: String) -> Self {
        Self::Template(target)
    }
}

/// Outcome of matching a request path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    /// No rules configured; let the request continue.
    Pass,
    /// Send a temporary redirect to this absolute URL.
    Redirect(String),
    /// Rules exist but none produced a target.
    ErrorPage,
}

const PLACEHOLDERS: [(&str, &str); 5] = [
    ("(:num)", r"(-?[0-9]+)"),
    ("(:alpha)", r"([a-zA-Z]+)"),
    ("(:alphanum)", r"([a-zA-Z0-9]+)"),
    ("(:any)", r"([a-zA-Z0-9\.\-_%= \+\@\(\)]+)"),
    ("(:all)", r"(.*)"),
];

/// Translate a rule pattern into an anchored regex.
fn compile(pattern: &str) -> std::result::Result<Regex, RedirectError> {
    let mut source = pattern.trim_matches('/').to_string();
    for (placeholder, regex) in PLACEHOLDERS {
        source = source.replace(placeholder, regex);
    }
    Regex::new(&format!("^{source}$")).map_err(|source| RedirectError::Pattern {
        pattern: pattern.to_string(),
        source,
    })
}

/// Replace `$N` with the N-th capture, highest index first so `$1` never
/// clobbers the prefix of `$10`.
fn fill(target: &str, captures: &[String]) -> String {
    let mut out = target.to_string();
    for (i, capture) in captures.iter().enumerate().rev() {
        out = out.replace(&format!("${}", i + 1), capture);
    }
    out
}

#[derive(Debug)]
struct RedirectRule {
    pattern: String,
    regex: Regex,
    target: RedirectTarget,
}

/// Ordered redirect rules.
#[derive(Debug, Default)]
pub struct RedirectRouter {
    rules: Vec<RedirectRule>,
    site_url: String,
}

impl RedirectRouter {
    /// An empty router; targets are made absolute against `site_url`.
    pub fn new(site_url: &str) -> Self {
        Self {
            rules: Vec::new(),
            site_url: site_url.trim_end_matches('/').to_string(),
        }
    }

    /// Compile the configured `[[redirects]]` rules.
    pub fn from_config(config: &Config) -> std::result::Result<Self, RedirectError> {
        let mut router = Self::new(&config.site.url);
        for rule in &config.redirects {
            router.add(&rule.from, rule.to.as_str())?;
        }
        Ok(router)
    }

    /// Append a rule.
    pub fn add(
        &mut self,
        from: &str,
        to: impl Into<RedirectTarget>,
    ) -> std::result::Result<(), RedirectError> {
        let regex = compile(from)?;
        self.rules.push(RedirectRule {
            pattern: from.to_string(),
            regex,
            target: to.into(),
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Match a request path.
    ///
    /// Only `GET` and `HEAD` requests are redirected; other methods reach the
    /// error page once rules exist.
    pub fn resolve(&self, path: &str, method: &str) -> Resolution {
        if self.rules.is_empty() {
            return Resolution::Pass;
        }

        if !method.eq_ignore_ascii_case("GET") && !method.eq_ignore_ascii_case("HEAD") {
            return Resolution::ErrorPage;
        }

        let path = path.trim_matches('/');
        for rule in &self.rules {
            let Some(caps) = rule.regex.captures(path) else {
                continue;
            };
            let captures: Vec<String> = caps
                .iter()
                .skip(1)
                .map(|m| m.map(|m| m.as_str().to_string()).unwrap_or_default())
                .collect();

            let target = match &rule.target {
                RedirectTarget::Template(target) => target.clone(),
                RedirectTarget::Callback(callback) => match callback(&captures) {
                    Ok(target) => target,
                    Err(e) => {
                        warn!(pattern = %rule.pattern, error = %e, "redirect callback failed");
                        return Resolution::ErrorPage;
                    }
                },
            };

            let location = self.absolute(&fill(&target, &captures));
            debug!(path, pattern = %rule.pattern, %location, "redirecting");
            return Resolution::Redirect(location);
        }

        debug!(path, "no redirect rule matched");
        Resolution::ErrorPage
    }

    fn absolute(&self, target: &str) -> String {
        if target.contains("://") || target.starts_with("//") {
            return target.to_string();
        }
        format!("{}/{}", self.site_url, target.trim_start_matches('/'))
    }
}
