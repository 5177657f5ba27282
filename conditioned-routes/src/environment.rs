// Copyright 2024 Wladimir Palant
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
// http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Extraction of the request attributes route conditions are evaluated against.

use http::header::HOST;
use http::request::Parts;
use http::uri::{PathAndQuery, Uri};
use http::{HeaderMap, Request};
use log::trace;
use std::borrow::Cow;
use std::fmt::{Display, Formatter};

/// A request attribute that can be looked up in a [`RequestEnvironment`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Attribute {
    /// HTTP method, reserved for the router's own method matching
    Method,
    /// First label of the host name
    Subdomain,
    /// Full host name without the port
    Hostname,
    /// Full absolute URL
    Url,
    /// Path and query of the URL
    RelativeUrl,
}

impl Attribute {
    /// Attributes that route conditions are allowed to compare against
    pub const CRITERIA: [Attribute; 4] = [
        Attribute::Subdomain,
        Attribute::Hostname,
        Attribute::Url,
        Attribute::RelativeUrl,
    ];

    /// Name of the attribute as used in configuration files
    pub fn name(&self) -> &'static str {
        match self {
            Self::Method => "method",
            Self::Subdomain => "subdomain",
            Self::Hostname => "hostname",
            Self::Url => "url",
            Self::RelativeUrl => "relative_url",
        }
    }
}

impl Display for Attribute {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// Request data exposed to route conditions
///
/// A router needs to implement this trait for its request type if it isn't one of the `http`
/// crate types supported out of the box.
pub trait RequestInfo {
    /// HTTP method token of the request
    fn method(&self) -> &str;

    /// Host name of the request without the port, empty if unknown
    fn host(&self) -> Cow<'_, str>;

    /// Full absolute URL of the request
    fn url(&self) -> Cow<'_, str>;
}

fn strip_port(host: &str) -> &str {
    if host.starts_with('[') {
        // IPv6 address, the port can only follow the closing bracket
        host.find(']').map_or(host, |end| &host[..=end])
    } else {
        host.split_once(':').map_or(host, |(host, _)| host)
    }
}

fn request_host<'a>(uri: &'a Uri, headers: &'a HeaderMap) -> Cow<'a, str> {
    if let Some(host) = uri.host() {
        Cow::Borrowed(host)
    } else {
        headers
            .get(HOST)
            .map(|host| String::from_utf8_lossy(host.as_bytes()))
            .map(|host| match host {
                Cow::Borrowed(host) => Cow::Borrowed(strip_port(host)),
                Cow::Owned(host) => Cow::Owned(strip_port(&host).to_owned()),
            })
            .unwrap_or_default()
    }
}

fn request_url<'a>(uri: &'a Uri, headers: &HeaderMap) -> Cow<'a, str> {
    if uri.scheme().is_some() && uri.authority().is_some() {
        return Cow::Owned(uri.to_string());
    }

    // Origin-form request target, the host has to come from the headers
    let host = headers
        .get(HOST)
        .map(|host| String::from_utf8_lossy(host.as_bytes()))
        .unwrap_or_default();
    let scheme = uri.scheme_str().unwrap_or("http");
    let path = uri.path_and_query().map_or("/", PathAndQuery::as_str);
    Cow::Owned(format!("{scheme}://{host}{path}"))
}

impl RequestInfo for Parts {
    fn method(&self) -> &str {
        self.method.as_str()
    }

    fn host(&self) -> Cow<'_, str> {
        request_host(&self.uri, &self.headers)
    }

    fn url(&self) -> Cow<'_, str> {
        request_url(&self.uri, &self.headers)
    }
}

impl<B> RequestInfo for Request<B> {
    fn method(&self) -> &str {
        Request::method(self).as_str()
    }

    fn host(&self) -> Cow<'_, str> {
        request_host(self.uri(), self.headers())
    }

    fn url(&self) -> Cow<'_, str> {
        request_url(self.uri(), self.headers())
    }
}

/// Removes scheme and authority from a URL, keeping path and query.
fn relative_url(url: &str) -> String {
    if let Ok(uri) = url.parse::<Uri>() {
        let path_and_query = uri.path_and_query().map_or("/", PathAndQuery::as_str);
        return if path_and_query.starts_with('?') {
            format!("/{path_and_query}")
        } else {
            path_and_query.to_owned()
        };
    }

    trace!("URL {url:?} could not be parsed, splitting it manually");
    let without_fragment = url.split_once('#').map_or(url, |(url, _)| url);
    match without_fragment.split_once("://") {
        Some((_, rest)) => match rest.find(['/', '?']) {
            Some(index) if rest[index..].starts_with('?') => format!("/{}", &rest[index..]),
            Some(index) => rest[index..].to_owned(),
            None => "/".to_owned(),
        },
        None => without_fragment.to_owned(),
    }
}

/// Attributes of a single request, produced once per request before route resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestEnvironment {
    method: String,
    subdomain: String,
    hostname: String,
    url: String,
    relative_url: String,
}

impl RequestEnvironment {
    /// Derives the environment from method, host name and full URL of a request.
    pub fn new(method: &str, hostname: &str, url: &str) -> Self {
        let subdomain = hostname
            .split_once('.')
            .map_or(hostname, |(subdomain, _)| subdomain);
        Self {
            method: method.to_owned(),
            subdomain: subdomain.to_owned(),
            hostname: hostname.to_owned(),
            url: url.to_owned(),
            relative_url: relative_url(url),
        }
    }

    /// Extracts the environment from a request.
    pub fn extract(request: &impl RequestInfo) -> Self {
        let env = Self::new(request.method(), &request.host(), &request.url());
        trace!("Extracted request environment: {env:?}");
        env
    }

    /// Looks up the value of an attribute
    pub fn get(&self, attribute: Attribute) -> &str {
        match attribute {
            Attribute::Method => &self.method,
            Attribute::Subdomain => &self.subdomain,
            Attribute::Hostname => &self.hostname,
            Attribute::Url => &self.url,
            Attribute::RelativeUrl => &self.relative_url,
        }
    }

    /// HTTP method of the request
    pub fn method(&self) -> &str {
        &self.method
    }

    /// First label of the host name, the entire host name if it has only one label
    pub fn subdomain(&self) -> &str {
        &self.subdomain
    }

    /// Host name of the request
    pub fn hostname(&self) -> &str {
        &self.hostname
    }

    /// Full request URL
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Path and query of the request URL
    pub fn relative_url(&self) -> &str {
        &self.relative_url
    }

    /// Path of the request URL without the query
    pub fn path(&self) -> &str {
        self.relative_url
            .split_once('?')
            .map_or(self.relative_url.as_str(), |(path, _)| path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use test_log::test;

    #[test]
    fn subdomain() {
        let env = RequestEnvironment::new("GET", "tv.example.com", "http://tv.example.com/");
        assert_eq!(env.subdomain(), "tv");
        assert_eq!(env.hostname(), "tv.example.com");

        let env = RequestEnvironment::new("GET", "a.b.c.example.com", "http://a.b.c.example.com/");
        assert_eq!(env.subdomain(), "a");

        let env = RequestEnvironment::new("GET", "localhost", "http://localhost/");
        assert_eq!(env.subdomain(), "localhost");

        let env = RequestEnvironment::new("GET", "", "/");
        assert_eq!(env.subdomain(), "");
    }

    #[test]
    fn relative_url_stripping() {
        assert_eq!(relative_url("http://example.com/pages/detail/9"), "/pages/detail/9");
        assert_eq!(relative_url("https://example.com:8443/a/b?c=d"), "/a/b?c=d");
        assert_eq!(relative_url("http://example.com"), "/");
        assert_eq!(relative_url("http://example.com?x=1"), "/?x=1");
        assert_eq!(relative_url("/already/relative?q"), "/already/relative?q");
    }

    #[test]
    fn relative_url_fallback() {
        // Not accepted by `Uri`, split manually
        assert_eq!(relative_url("http://example.com/a b?c"), "/a b?c");
        assert_eq!(relative_url("http://example.com/a b#frag"), "/a b");
        assert_eq!(relative_url("http://exa mple.com"), "/");
    }

    #[test]
    fn path() {
        let env = RequestEnvironment::new("GET", "example.com", "http://example.com/a/b?c=d");
        assert_eq!(env.relative_url(), "/a/b?c=d");
        assert_eq!(env.path(), "/a/b");
    }

    #[test]
    fn lookup() {
        let env = RequestEnvironment::new("POST", "www.example.com", "http://www.example.com/x?y");
        assert_eq!(env.get(Attribute::Method), "POST");
        assert_eq!(env.get(Attribute::Subdomain), "www");
        assert_eq!(env.get(Attribute::Hostname), "www.example.com");
        assert_eq!(env.get(Attribute::Url), "http://www.example.com/x?y");
        assert_eq!(env.get(Attribute::RelativeUrl), "/x?y");
    }

    #[test]
    fn absolute_form_request() {
        let request = Request::builder()
            .method("PUT")
            .uri("https://tv.example.com:8443/shows?page=2")
            .body(())
            .unwrap();
        let env = RequestEnvironment::extract(&request);
        assert_eq!(env.method(), "PUT");
        assert_eq!(env.hostname(), "tv.example.com");
        assert_eq!(env.subdomain(), "tv");
        assert_eq!(env.url(), "https://tv.example.com:8443/shows?page=2");
        assert_eq!(env.relative_url(), "/shows?page=2");
    }

    #[test]
    fn origin_form_request() {
        let request = Request::builder()
            .uri("/shows?page=2")
            .header("Host", "tv.example.com:8080")
            .body(())
            .unwrap();
        let env = RequestEnvironment::extract(&request);
        assert_eq!(env.method(), "GET");
        assert_eq!(env.hostname(), "tv.example.com");
        assert_eq!(env.url(), "http://tv.example.com:8080/shows?page=2");
        assert_eq!(env.relative_url(), "/shows?page=2");

        let (parts, _) = request.into_parts();
        assert_eq!(RequestEnvironment::extract(&parts), env);
    }

    #[test]
    fn ipv6_host() {
        let request = Request::builder()
            .uri("/")
            .header("Host", "[::1]:8080")
            .body(())
            .unwrap();
        let env = RequestEnvironment::extract(&request);
        assert_eq!(env.hostname(), "[::1]");
        assert_eq!(env.url(), "http://[::1]:8080/");
    }

    #[test]
    fn missing_host() {
        let request = Request::builder().uri("/path").body(()).unwrap();
        let env = RequestEnvironment::extract(&request);
        assert_eq!(env.hostname(), "");
        assert_eq!(env.subdomain(), "");
        assert_eq!(env.relative_url(), "/path");
    }
}
