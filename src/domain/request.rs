use url::Url;

use crate::domain::errors::ClientError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Delete,
}

impl HttpMethod {
    pub fn as_str(self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Delete => "DELETE",
        }
    }
}

/// Immutable request descriptor produced by [`RequestSpec::build`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    method: HttpMethod,
    url: Url,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl HttpRequest {
    pub fn method(&self) -> HttpMethod {
        self.method
    }

    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    // Case-insensitive header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn query(&self, name: &str) -> Option<String> {
        self.url
            .query_pairs()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.into_owned())
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }
}

/// Structured request parameters. Nothing is validated until [`RequestSpec::build`].
#[derive(Debug, Clone)]
pub struct RequestSpec {
    scheme: String,
    host: String,
    path: String,
    segments: Vec<String>,
    method: HttpMethod,
    query: Vec<(String, String)>,
    headers: Vec<(String, String)>,
    body: Option<Vec<u8>>,
}

impl RequestSpec {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: "https".to_string(),
            host: host.into(),
            path: path.into(),
            segments: Vec::new(),
            method: HttpMethod::Get,
            query: Vec::new(),
            headers: Vec::new(),
            body: None,
        }
    }

    pub fn scheme(mut self, scheme: impl Into<String>) -> Self {
        self.scheme = scheme.into();
        self
    }

    // Append one percent-encoded segment after `path`; `/` inside it is escaped.
    pub fn segment(mut self, segment: impl Into<String>) -> Self {
        self.segments.push(segment.into());
        self
    }

    pub fn method(mut self, method: HttpMethod) -> Self {
        self.method = method;
        self
    }

    pub fn query(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((name.into(), value.into()));
        self
    }

    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    pub fn bearer(self, token: &str) -> Self {
        self.header("Authorization", format!("Bearer {token}"))
    }

    pub fn body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = Some(body.into());
        self
    }

    pub fn build(self) -> Result<HttpRequest, ClientError> {
        let invalid = |reason: &str| {
            ClientError::InvalidRequest(format!("{reason}: {}://{}{}", self.scheme, self.host, self.path))
        };

        if self.host.is_empty() {
            return Err(invalid("empty host"));
        }
        if !self.path.starts_with('/') {
            return Err(invalid("path must start with '/'"));
        }
        if self
            .segments
            .iter()
            .any(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(invalid("empty or relative path segment"));
        }

        // The host may carry a port; anything past the authority is rejected.
        let mut url = Url::parse(&format!("{}://{}", self.scheme, self.host))
            .map_err(|err| invalid(&err.to_string()))?;
        if url.cannot_be_a_base()
            || url.host_str().is_none()
            || url.path() != "/"
            || url.query().is_some()
            || url.fragment().is_some()
            || !url.username().is_empty()
        {
            return Err(invalid("malformed host"));
        }

        url.set_path(&self.path);
        if !self.segments.is_empty() {
            url.path_segments_mut()
                .map_err(|()| invalid("url cannot take path segments"))?
                .pop_if_empty()
                .extend(&self.segments);
        }
        if !self.query.is_empty() {
            url.query_pairs_mut().extend_pairs(self.query.iter());
        }

        Ok(HttpRequest {
            method: self.method,
            url,
            headers: self.headers,
            body: self.body,
        })
    }
}
