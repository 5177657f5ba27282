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

use std::path::PathBuf;
use thiserror::Error;

use crate::environment::Attribute;

fn attribute_list(attributes: &[Attribute]) -> String {
    attributes
        .iter()
        .map(Attribute::name)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Errors produced while loading configuration or registering routes
///
/// All of these are configuration bugs, request processing never fails.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A route conditions on more than one request attribute.
    #[error(
        "only one of subdomain, hostname, url, relative_url is allowed per route, got: {}",
        attribute_list(.attributes)
    )]
    MultipleCriteriaNotAllowed {
        /// The attributes declared by the route
        attributes: Vec<Attribute>,
    },

    /// The regular expression configured for an attribute cannot be compiled.
    #[error("invalid regular expression for {attribute}: {source}")]
    InvalidRegex {
        /// Attribute the regular expression was configured for
        attribute: Attribute,
        /// Compilation error
        source: regex::Error,
    },

    /// Registration of a particular route failed.
    #[error("failed registering route {route:?}: {source}")]
    Route {
        /// Name of the route
        route: String,
        /// The reason registration failed
        source: Box<ConfigError>,
    },

    /// A configuration file could not be opened.
    #[error("failed opening configuration file {}: {source}", .path.display())]
    FileOpen {
        /// Path of the configuration file
        path: PathBuf,
        /// I/O error
        source: std::io::Error,
    },

    /// Configuration could not be deserialized.
    #[error("failed reading configuration: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

impl ConfigError {
    /// Attaches the name of the route being registered to the error.
    pub fn in_route(self, route: impl Into<String>) -> Self {
        Self::Route {
            route: route.into(),
            source: Box::new(self),
        }
    }
}
