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

//! A simple ordered route set evaluating route conditions.
//!
//! As far as path matching is concerned, a path is a list of file/directory names separated by
//! slashes. The number of separating slashes is irrelevant, so that `/dir`, `/dir/` and `//dir/`
//! are all equivalent. A route can require an exact path match or accept any path within its
//! directory. Note that `/dirabc` never matches a route defined for `/dir/*`, only `/dir/abc` does.
//!
//! Routes are considered in the order they were added, the first route whose method, path and
//! condition all match the request wins.

use log::{debug, trace};
use serde::Deserialize;
use std::fmt::{Debug, Formatter};

use crate::condition::Condition;
use crate::configuration::{RouteConf, RoutesConf};
use crate::environment::{RequestEnvironment, RequestInfo};
use crate::error::ConfigError;

const SEPARATOR: char = '/';

/// Removes unnecessary separators from a path
fn normalize(path: &str) -> String {
    let mut had_separator = true;
    let mut result: String = path
        .chars()
        .filter(|c| {
            if *c == SEPARATOR {
                if had_separator {
                    false
                } else {
                    had_separator = true;
                    true
                }
            } else {
                had_separator = false;
                true
            }
        })
        .collect();

    if result.ends_with(SEPARATOR) {
        result.pop();
    }
    result
}

/// A path matcher, applying either to a single path or to a directory
#[derive(Clone, PartialEq, Eq, Deserialize)]
#[serde(from = "String")]
pub struct PathMatcher {
    /// Normalized path without leading and trailing separators
    path: String,

    /// If `true`, only exact path matches are accepted, otherwise both exact and prefix matches.
    exact: bool,
}

impl PathMatcher {
    /// A matcher that matches every path, equivalent to `/*`
    pub fn any() -> Self {
        Self {
            path: String::new(),
            exact: false,
        }
    }

    /// Checks whether the given request path is matched.
    pub fn matches(&self, path: &str) -> bool {
        let path = normalize(path);
        if path == self.path {
            return true;
        }

        !self.exact
            && (self.path.is_empty()
                || path
                    .strip_prefix(&self.path)
                    .is_some_and(|rest| rest.starts_with(SEPARATOR)))
    }
}

impl Debug for PathMatcher {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "/{}", self.path)?;
        if !self.exact {
            if !self.path.is_empty() {
                f.write_str("/")?;
            }
            f.write_str("*")?;
        }
        Ok(())
    }
}

impl From<&str> for PathMatcher {
    /// Converts a string like `/subdir/*` into a path matcher. The following input types are
    /// supported:
    ///
    /// * `/path`: Applies to only the given path
    /// * `/path/*`: Applies to the given path and any paths within this directory
    fn from(path: &str) -> Self {
        let (path, exact) = if let Some(path) = path.strip_suffix("/*") {
            (path, false)
        } else if path == "*" {
            ("", false)
        } else {
            (path, true)
        };

        Self {
            path: normalize(path),
            exact,
        }
    }
}

impl From<String> for PathMatcher {
    fn from(value: String) -> Self {
        value.as_str().into()
    }
}

#[derive(Debug)]
struct Route<T> {
    name: String,
    method: Option<String>,
    path: PathMatcher,
    condition: Condition,
    target: T,
}

impl<T> Route<T> {
    fn matches(&self, env: &RequestEnvironment) -> bool {
        if let Some(method) = &self.method {
            if !method.eq_ignore_ascii_case(env.method()) {
                return false;
            }
        }

        self.path.matches(env.path()) && self.condition.evaluate(env)
    }
}

/// A route selected for a request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RouteMatch<'a, T> {
    /// Name of the route
    pub name: &'a str,
    /// Value associated with the route
    pub target: &'a T,
}

/// An ordered set of routes with conditions
///
/// A new instance can be created by calling [`RouteSet::builder`]. Each route is validated when
/// it is added, a route with invalid conditions is rejected:
///
/// ```rust
/// use conditioned_routes::{ConditionConf, RouteConf, RouteSet};
///
/// let mut builder = RouteSet::builder();
///
/// let mut tv = RouteConf::new("tv", "/*");
/// tv.conditions = ConditionConf {
///     subdomain: Some("tv".into()),
///     ..Default::default()
/// };
/// builder.push(tv, "tv handler").unwrap();
/// builder.push(RouteConf::new("fallback", "/*"), "default handler").unwrap();
///
/// let routes = builder.build();
///
/// let request = http::Request::get("https://tv.example.com/shows").body(()).unwrap();
/// assert_eq!(routes.recognize(&request).map(|m| *m.target), Some("tv handler"));
///
/// let request = http::Request::get("https://www.example.com/shows").body(()).unwrap();
/// assert_eq!(routes.recognize(&request).map(|m| *m.target), Some("default handler"));
/// ```
#[derive(Debug)]
pub struct RouteSet<T> {
    routes: Vec<Route<T>>,
}

impl<T> RouteSet<T> {
    /// Returns a builder instance that can be used to set up a route set.
    pub fn builder() -> RouteSetBuilder<T> {
        RouteSetBuilder { routes: Vec::new() }
    }

    /// Number of routes in the set
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    /// Checks whether the route set is empty.
    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Selects the route for a request.
    pub fn recognize(&self, request: &impl RequestInfo) -> Option<RouteMatch<'_, T>> {
        self.recognize_environment(&RequestEnvironment::extract(request))
    }

    /// Selects the route for a previously extracted request environment.
    pub fn recognize_environment(&self, env: &RequestEnvironment) -> Option<RouteMatch<'_, T>> {
        let result = self
            .routes
            .iter()
            .find(|route| route.matches(env))
            .map(|route| RouteMatch {
                name: &route.name,
                target: &route.target,
            });

        match &result {
            Some(result) => trace!(
                "Request {} {} matched route {}",
                env.method(),
                env.url(),
                result.name
            ),
            None => trace!("No route matched request {} {}", env.method(), env.url()),
        }
        result
    }
}

/// Route set builder
#[derive(Debug)]
pub struct RouteSetBuilder<T> {
    routes: Vec<Route<T>>,
}

impl<T> RouteSetBuilder<T> {
    /// Registers a route, validating its conditions.
    ///
    /// If validation fails the route isn't added and the error names the route.
    pub fn push(&mut self, conf: RouteConf, target: T) -> Result<(), ConfigError> {
        let condition =
            Condition::validate(&conf.conditions).map_err(|err| err.in_route(&conf.name))?;
        debug!(
            "Registered route {} for {:?} {:?}",
            conf.name, conf.method, conf.path
        );

        self.routes.push(Route {
            name: conf.name,
            method: conf.method,
            path: conf.path,
            condition,
            target,
        });
        Ok(())
    }

    /// Finalizes the route set.
    pub fn build(self) -> RouteSet<T> {
        RouteSet {
            routes: self.routes,
        }
    }
}

impl TryFrom<RoutesConf> for RouteSet<String> {
    type Error = ConfigError;

    /// Builds a route set with route names as targets.
    fn try_from(conf: RoutesConf) -> Result<Self, Self::Error> {
        debug!("Route configuration received: {conf:#?}");

        let mut builder = Self::builder();
        for route in conf.routes {
            let name = route.name.clone();
            builder.push(route, name)?;
        }
        Ok(builder.build())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::configuration::{ConditionConf, CriterionValue};
    use http::Request;
    use test_log::test;

    #[test]
    fn path_normalization() {
        assert_eq!(normalize("/"), "");
        assert_eq!(normalize("//dir//file/"), "dir/file");
        assert_eq!(normalize("dir"), "dir");
        assert_eq!(normalize(""), "");
    }

    #[test]
    fn exact_path() {
        let matcher = PathMatcher::from("/dir/file");
        assert!(matcher.matches("/dir/file"));
        assert!(matcher.matches("//dir/file/"));
        assert!(!matcher.matches("/dir"));
        assert!(!matcher.matches("/dir/file/x"));
        assert!(!matcher.matches("/dir/filex"));

        let matcher = PathMatcher::from("/");
        assert!(matcher.matches("/"));
        assert!(matcher.matches(""));
        assert!(!matcher.matches("/x"));
    }

    #[test]
    fn prefix_path() {
        let matcher = PathMatcher::from("/dir/*");
        assert!(matcher.matches("/dir"));
        assert!(matcher.matches("/dir/"));
        assert!(matcher.matches("/dir/file"));
        assert!(matcher.matches("//dir///sub/file"));
        assert!(!matcher.matches("/dirx"));
        assert!(!matcher.matches("/"));

        let matcher = PathMatcher::from("/*");
        assert_eq!(matcher, PathMatcher::any());
        assert!(matcher.matches("/"));
        assert!(matcher.matches("/anything/at/all"));
    }

    #[test]
    fn path_debug() {
        assert_eq!(format!("{:?}", PathMatcher::from("/dir/*")), "/dir/*");
        assert_eq!(format!("{:?}", PathMatcher::from("/dir")), "/dir");
        assert_eq!(format!("{:?}", PathMatcher::any()), "/*");
        assert_eq!(format!("{:?}", PathMatcher::from("/")), "/");
    }

    fn route(name: &str, path: &str, conditions: ConditionConf) -> RouteConf {
        RouteConf {
            conditions,
            ..RouteConf::new(name, path)
        }
    }

    fn request(method: &str, url: &str) -> Request<()> {
        Request::builder().method(method).uri(url).body(()).unwrap()
    }

    #[test]
    fn declaration_order() {
        let mut builder = RouteSet::builder();
        builder
            .push(
                route(
                    "tv",
                    "/*",
                    ConditionConf {
                        subdomain: Some("tv".into()),
                        ..Default::default()
                    },
                ),
                1,
            )
            .unwrap();
        builder
            .push(
                route(
                    "detail",
                    "/pages/*",
                    ConditionConf {
                        relative_url: Some(CriterionValue::regex("(?i)detail")),
                        ..Default::default()
                    },
                ),
                2,
            )
            .unwrap();
        builder.push(RouteConf::new("pages", "/pages/*"), 3).unwrap();
        let routes = builder.build();
        assert_eq!(routes.len(), 3);

        let result = routes.recognize(&request("GET", "http://tv.example.com/pages/Detail"));
        assert_eq!(result.map(|m| (m.name, *m.target)), Some(("tv", 1)));

        let result = routes.recognize(&request("GET", "http://www.example.com/pages/Detail"));
        assert_eq!(result.map(|m| (m.name, *m.target)), Some(("detail", 2)));

        let result = routes.recognize(&request("GET", "http://www.example.com/pages/list"));
        assert_eq!(result.map(|m| (m.name, *m.target)), Some(("pages", 3)));

        assert!(routes
            .recognize(&request("GET", "http://www.example.com/other"))
            .is_none());
    }

    #[test]
    fn method() {
        let mut builder = RouteSet::builder();
        builder
            .push(
                RouteConf {
                    method: Some("post".to_owned()),
                    ..RouteConf::new("create", "/items")
                },
                (),
            )
            .unwrap();
        let routes = builder.build();

        assert!(routes
            .recognize(&request("POST", "http://example.com/items"))
            .is_some());
        assert!(routes
            .recognize(&request("GET", "http://example.com/items"))
            .is_none());
    }

    #[test]
    fn query_ignored_for_path() {
        let mut builder = RouteSet::builder();
        builder
            .push(
                route(
                    "search",
                    "/search",
                    ConditionConf {
                        relative_url: Some("q=".into()),
                        comparator: Some("contains".into()),
                        ..Default::default()
                    },
                ),
                (),
            )
            .unwrap();
        let routes = builder.build();

        assert!(routes
            .recognize(&request("GET", "http://example.com/search?q=rust"))
            .is_some());
        assert!(routes
            .recognize(&request("GET", "http://example.com/search"))
            .is_none());
    }

    #[test]
    fn rejected_route() {
        let mut builder = RouteSet::builder();
        let err = builder
            .push(
                route(
                    "ambiguous",
                    "/*",
                    ConditionConf {
                        hostname: Some("example.com".into()),
                        url: Some("http://example.com/".into()),
                        ..Default::default()
                    },
                ),
                (),
            )
            .unwrap_err();
        assert!(matches!(
            err,
            ConfigError::Route { ref route, ref source }
                if route == "ambiguous"
                    && matches!(**source, ConfigError::MultipleCriteriaNotAllowed { .. })
        ));

        // The route must not be registered
        assert!(builder.build().is_empty());
    }
}
