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

//! # Conditioned Routes
//!
//! This crate adds request conditions to path-based routing. Beyond matching the path and method,
//! a route can require that the subdomain, the host name, the full URL or the path and query of
//! the request satisfy a comparison. For example:
//!
//! ```yaml
//! routes:
//! - name: tv
//!   path: /*
//!   conditions:
//!     subdomain: tv
//! - name: naitazi
//!   path: /*
//!   conditions:
//!     hostname: naitazi.com
//!     comparator: ends_with
//! - name: detail
//!   path: /pages/*
//!   conditions:
//!     relative_url:
//!       regex: "(?i)detail"
//!     comparator: regex
//! ```
//!
//! ## Conditions
//!
//! A route may declare at most one of the following request attributes to compare against:
//!
//! * `subdomain`: the first label of the host name, e.g. `tv` for `tv.example.com`. If the host
//!   name has no dots, this is the entire host name.
//! * `hostname`: the host name without the port
//! * `url`: the full request URL, e.g. `http://tv.example.com/shows?page=2`
//! * `relative_url`: path and query of the request URL, e.g. `/shows?page=2`
//!
//! Declaring two or more of these is a configuration error, reported when the route is
//! registered. The value is either a string or a map like `{regex: "^tv$"}`, regular expression
//! flags can be given inline like `(?i)^tv$`.
//!
//! The `comparator` setting determines how the value is compared:
//!
//! * `direct_match` (default): string values have to be equal, regular expressions have to match
//! * `starts_with`: the attribute starts with the value
//! * `ends_with`: the attribute ends with the value
//! * `contains`: the value occurs anywhere within the attribute
//! * `regex` or `match`: the attribute is matched by the value taken as a regular expression
//!
//! Comparator names are case-insensitive. Unknown comparator names are treated like
//! `direct_match`.
//!
//! ## Code example
//!
//! A router keeps a [`Condition`] per route, created once via [`Condition::validate`]. For each
//! request it extracts the [`RequestEnvironment`] once and calls [`Condition::evaluate`] for every
//! candidate route. [`RouteSet`] does exactly that for a list of routes:
//!
//! ```rust
//! use conditioned_routes::{FromYaml, RouteSet, RoutesConf};
//!
//! let conf = RoutesConf::from_yaml(r#"
//!     routes:
//!     - name: tv
//!       path: /*
//!       conditions:
//!         subdomain: tv
//!     - name: default
//!       path: /*
//! "#).unwrap();
//! let routes: RouteSet<String> = conf.try_into().unwrap();
//!
//! let request = http::Request::get("http://tv.example.com/").body(()).unwrap();
//! assert_eq!(routes.recognize(&request).map(|m| m.name), Some("tv"));
//! ```

pub mod comparator;
pub mod condition;
pub mod configuration;
mod deserialize;
pub mod environment;
mod error;
pub mod router;

pub use comparator::Comparator;
pub use condition::Condition;
pub use configuration::{ConditionConf, CriterionValue, RouteConf, RoutesConf};
pub use deserialize::{FromYaml, OneOrMany};
pub use environment::{Attribute, RequestEnvironment, RequestInfo};
pub use error::ConfigError;
pub use router::{PathMatcher, RouteMatch, RouteSet, RouteSetBuilder};
