//! Tracer identifiers.
//!
//! A live tracer is selected either by a plain name such as `firehose` or by a
//! URL such as `firehose://localhost:8080?buffer=4096`. The URL form lets a
//! tracer receive its own configuration through the authority, path and query
//! components; only the tracer factory interprets them.
//!
//! The selector, the key looked up in the registry, is the URL scheme when one
//! is present. A plain name has no scheme under URL rules and lands in the path
//! component, so for those the path is the selector.

use std::borrow::Cow;
use std::fmt;
use std::str::FromStr;

use url::{ParseError, Url, form_urlencoded};

use crate::error::TracerError;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TracerIdentifier {
    raw: String,
    selector: String,
    kind: IdentifierKind,
}

#[derive(Clone, Debug, PartialEq, Eq)]
enum IdentifierKind {
    /// `<scheme>:<rest>`, selected by the scheme.
    Url(Url),
    /// A bare token, selected by its path.
    Bare {
        path: String,
        query: Option<String>,
        fragment: Option<String>,
    },
}

impl TracerIdentifier {
    pub fn parse(raw: &str) -> Result<Self, TracerError> {
        match Url::parse(raw) {
            Ok(url) => Ok(Self {
                raw: raw.to_owned(),
                selector: url.scheme().to_owned(),
                kind: IdentifierKind::Url(url),
            }),
            Err(ParseError::RelativeUrlWithoutBase) => Self::parse_bare(raw),
            Err(err) => Err(TracerError::InvalidIdentifier {
                raw: raw.to_owned(),
                reason: err.to_string(),
                source: Some(err),
            }),
        }
    }

    fn parse_bare(raw: &str) -> Result<Self, TracerError> {
        let (rest, fragment) = match raw.split_once('#') {
            Some((rest, fragment)) => (rest, Some(fragment.to_owned())),
            None => (raw, None),
        };
        let (path, query) = match rest.split_once('?') {
            Some((path, query)) => (path, Some(query.to_owned())),
            None => (rest, None),
        };

        // `//host/path`: an authority without a scheme never selects by path.
        if path.starts_with("//") {
            return Err(TracerError::MissingSelector {
                raw: raw.to_owned(),
            });
        }
        if let Some(invalid) = raw.chars().find(|c| c.is_whitespace() || c.is_control()) {
            return Err(TracerError::InvalidIdentifier {
                raw: raw.to_owned(),
                reason: format!("invalid character {invalid:?}"),
                source: None,
            });
        }
        if path.contains(':') {
            return Err(TracerError::InvalidIdentifier {
                raw: raw.to_owned(),
                reason: "missing protocol scheme".to_owned(),
                source: None,
            });
        }
        if path.is_empty() {
            return Err(TracerError::MissingSelector {
                raw: raw.to_owned(),
            });
        }

        Ok(Self {
            raw: raw.to_owned(),
            selector: path.to_owned(),
            kind: IdentifierKind::Bare {
                path: path.to_owned(),
                query,
                fragment,
            },
        })
    }

    /// The string the identifier was parsed from.
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// The registry key: the scheme for URLs, the path for bare tokens.
    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn scheme(&self) -> Option<&str> {
        match &self.kind {
            IdentifierKind::Url(url) => Some(url.scheme()),
            IdentifierKind::Bare { .. } => None,
        }
    }

    pub fn host(&self) -> Option<&str> {
        match &self.kind {
            IdentifierKind::Url(url) => url.host_str(),
            IdentifierKind::Bare { .. } => None,
        }
    }

    pub fn port(&self) -> Option<u16> {
        match &self.kind {
            IdentifierKind::Url(url) => url.port(),
            IdentifierKind::Bare { .. } => None,
        }
    }

    pub fn path(&self) -> &str {
        match &self.kind {
            IdentifierKind::Url(url) => url.path(),
            IdentifierKind::Bare { path, .. } => path,
        }
    }

    pub fn query(&self) -> Option<&str> {
        match &self.kind {
            IdentifierKind::Url(url) => url.query(),
            IdentifierKind::Bare { query, .. } => query.as_deref(),
        }
    }

    pub fn fragment(&self) -> Option<&str> {
        match &self.kind {
            IdentifierKind::Url(url) => url.fragment(),
            IdentifierKind::Bare { fragment, .. } => fragment.as_deref(),
        }
    }

    /// Decoded `key=value` pairs of the query component, in order.
    pub fn query_pairs(&self) -> impl Iterator<Item = (Cow<'_, str>, Cow<'_, str>)> {
        form_urlencoded::parse(self.query().unwrap_or_default().as_bytes())
    }

    /// First value of the query parameter `key`.
    pub fn query_param(&self, key: &str) -> Option<String> {
        self.query_pairs()
            .find(|(name, _)| name == key)
            .map(|(_, value)| value.into_owned())
    }

    /// Everything after the selector: for URLs the normalized text following
    /// `<scheme>:`, for bare tokens the `?query#fragment` suffix.
    pub fn remainder(&self) -> &str {
        match &self.kind {
            IdentifierKind::Url(url) => url
                .as_str()
                .get(url.scheme().len() + 1..)
                .unwrap_or_default(),
            IdentifierKind::Bare { path, .. } => {
                self.raw.get(path.len()..).unwrap_or_default()
            }
        }
    }

    /// The parsed URL, when the identifier carries a scheme.
    pub fn url(&self) -> Option<&Url> {
        match &self.kind {
            IdentifierKind::Url(url) => Some(url),
            IdentifierKind::Bare { .. } => None,
        }
    }
}

impl FromStr for TracerIdentifier {
    type Err = TracerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl fmt::Display for TracerIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.raw)
    }
}
