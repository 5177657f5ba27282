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

//! Structures required to deserialize route configuration from YAML configuration files.

use serde::Deserialize;
use std::path::Path;

use crate::deserialize::{FromYaml, OneOrMany};
use crate::environment::Attribute;
use crate::error::ConfigError;
use crate::router::PathMatcher;

/// The value a request attribute is compared against
///
/// In configuration files this is either a plain string or a map with a `regex` key. Regular
/// expression flags are set inline, e.g. `(?i)^tv$` for a case-insensitive match.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum CriterionValue {
    /// A literal string
    Literal(String),
    /// A regular expression
    Regex {
        /// Regular expression syntax as accepted by the `regex` crate
        regex: String,
    },
}

impl CriterionValue {
    /// Creates a regular expression criterion.
    pub fn regex(pattern: impl Into<String>) -> Self {
        Self::Regex {
            regex: pattern.into(),
        }
    }
}

impl From<&str> for CriterionValue {
    fn from(value: &str) -> Self {
        Self::Literal(value.to_owned())
    }
}

impl From<String> for CriterionValue {
    fn from(value: String) -> Self {
        Self::Literal(value)
    }
}

/// Conditions of a route as declared by the route author
///
/// At most one of `subdomain`, `hostname`, `url` and `relative_url` may be set, this is verified
/// when the route is registered.
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConditionConf {
    /// Compare against the first label of the host name, e.g. `tv` for `tv.example.com`
    pub subdomain: Option<CriterionValue>,

    /// Compare against the host name without the port
    pub hostname: Option<CriterionValue>,

    /// Compare against the full request URL
    pub url: Option<CriterionValue>,

    /// Compare against path and query of the request URL
    pub relative_url: Option<CriterionValue>,

    /// Comparison to apply, one of `direct_match` (default), `starts_with`, `ends_with`,
    /// `contains`, `match` or `regex`. Names are case-insensitive, unknown names are treated as
    /// `direct_match`.
    pub comparator: Option<String>,
}

impl ConditionConf {
    /// Returns the configured value for an attribute. `method` never has a value.
    pub fn criterion(&self, attribute: Attribute) -> Option<&CriterionValue> {
        match attribute {
            Attribute::Method => None,
            Attribute::Subdomain => self.subdomain.as_ref(),
            Attribute::Hostname => self.hostname.as_ref(),
            Attribute::Url => self.url.as_ref(),
            Attribute::RelativeUrl => self.relative_url.as_ref(),
        }
    }

    /// Lists all attributes the route declares a criterion for
    pub fn criteria(&self) -> Vec<(Attribute, &CriterionValue)> {
        Attribute::CRITERIA
            .into_iter()
            .filter_map(|attribute| self.criterion(attribute).map(|value| (attribute, value)))
            .collect()
    }
}

/// A route declaration
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RouteConf {
    /// Name identifying the route, used in error messages and match results
    pub name: String,

    /// Path the route applies to
    ///
    /// By default, an exact path match is required. A value like `/path/*` indicates a prefix
    /// match, both `/path` and `/path/subdir/file.txt` will be matched but not `/path_file`.
    #[serde(default = "PathMatcher::any")]
    pub path: PathMatcher,

    /// HTTP method the route is restricted to, any method if missing
    #[serde(default)]
    pub method: Option<String>,

    /// Additional conditions on the request
    #[serde(default)]
    pub conditions: ConditionConf,
}

impl RouteConf {
    /// Creates an unconditional route declaration for the given path.
    pub fn new(name: impl Into<String>, path: &str) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            method: None,
            conditions: ConditionConf::default(),
        }
    }
}

/// Configuration file settings of a route set
#[derive(Debug, Default, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RoutesConf {
    /// Route declarations in order of precedence
    pub routes: OneOrMany<RouteConf>,
}

impl RoutesConf {
    /// Loads configuration from multiple files, routes of later files are appended to those of
    /// earlier files.
    pub fn load_from_files<P>(paths: &[P]) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
    {
        let mut conf = Self::default();
        for path in paths {
            conf.routes
                .extend(Self::load_from_yaml(path)?.routes.into_inner());
        }
        Ok(conf)
    }
}
