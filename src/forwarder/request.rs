//! The encrypt request and upstream URL construction.

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use url::{form_urlencoded, Url};

use crate::forwarder::error::{ForwardError, SetupError};

/// Query parameter carrying the user identifier.
pub const PARAM_USR: &str = "usr";
/// Query parameter carrying the p29 token.
pub const PARAM_P29: &str = "p29";

/// Characters left literal in query values: the unreserved marks of
/// `encodeURIComponent` minus the apostrophe, which `url` escapes in
/// http(s) queries anyway. A space becomes `%20`, never `+`.
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'(')
    .remove(b')');

/// A validated pair of encrypt parameters. Both values are non-empty.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptRequest {
    usr: String,
    p29: String,
}

impl EncryptRequest {
    pub fn new(usr: impl Into<String>, p29: impl Into<String>) -> Result<Self, ForwardError> {
        let usr = usr.into();
        let p29 = p29.into();
        if usr.is_empty() {
            return Err(ForwardError::MissingParameter(PARAM_USR));
        }
        if p29.is_empty() {
            return Err(ForwardError::MissingParameter(PARAM_P29));
        }
        Ok(Self { usr, p29 })
    }

    /// Parse from a raw query string. The first occurrence of each
    /// parameter wins; unrelated parameters are ignored.
    pub fn from_query(query: Option<&str>) -> Result<Self, ForwardError> {
        let mut usr = None;
        let mut p29 = None;
        for (key, value) in form_urlencoded::parse(query.unwrap_or_default().as_bytes()) {
            match &*key {
                PARAM_USR if usr.is_none() => usr = Some(value.into_owned()),
                PARAM_P29 if p29.is_none() => p29 = Some(value.into_owned()),
                _ => {}
            }
        }
        Self::new(usr.unwrap_or_default(), p29.unwrap_or_default())
    }

    pub fn usr(&self) -> &str {
        &self.usr
    }

    pub fn p29(&self) -> &str {
        &self.p29
    }

    /// `usr=<enc>&p29=<enc>` with both values percent-encoded.
    pub fn query_string(&self) -> String {
        format!(
            "{}={}&{}={}",
            PARAM_USR,
            utf8_percent_encode(&self.usr, QUERY_VALUE),
            PARAM_P29,
            utf8_percent_encode(&self.p29, QUERY_VALUE)
        )
    }
}

/// The upstream encrypt endpoint, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Endpoint {
    base: Url,
}

impl Endpoint {
    /// Join `base_url` and `encrypt_path`, keeping any path prefix on the base.
    /// A base carrying a query or fragment is rejected, since the path would
    /// land inside it.
    pub fn new(base_url: &str, encrypt_path: &str) -> Result<Self, SetupError> {
        let parsed = Url::parse(base_url.trim()).map_err(|source| SetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        if parsed.query().is_some() || parsed.fragment().is_some() {
            return Err(SetupError::BaseUrlHasQuery(base_url.to_string()));
        }

        let joined = format!(
            "{}/{}",
            base_url.trim().trim_end_matches('/'),
            encrypt_path.trim().trim_start_matches('/')
        );
        let mut base = Url::parse(&joined).map_err(|source| SetupError::InvalidBaseUrl {
            url: base_url.to_string(),
            source,
        })?;
        base.set_query(None);
        base.set_fragment(None);
        Ok(Self { base })
    }

    /// Full upstream URL for one request, parameters percent-encoded.
    pub fn url_for(&self, request: &EncryptRequest) -> Url {
        let mut url = self.base.clone();
        url.set_query(Some(&request.query_string()));
        url
    }

    pub fn base(&self) -> &Url {
        &self.base
    }
}
