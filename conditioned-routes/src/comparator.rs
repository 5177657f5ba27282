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

//! The fixed set of comparison operations available to route conditions.

use regex::Regex;
use std::fmt::{Display, Formatter};

/// Comparison operation applied between the actual attribute value and the configured value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Comparator {
    /// Exact equality for strings, a regular expression match for patterns
    #[default]
    DirectMatch,
    /// The value starts with the configured value
    StartsWith,
    /// The value ends with the configured value
    EndsWith,
    /// The configured value occurs anywhere in the value
    Contains,
    /// The value is matched by the configured regular expression, also known as `match`
    Regex,
}

impl Comparator {
    /// All comparators with their configuration names, aliases included
    pub const NAMES: [(&'static str, Comparator); 6] = [
        ("direct_match", Comparator::DirectMatch),
        ("starts_with", Comparator::StartsWith),
        ("ends_with", Comparator::EndsWith),
        ("contains", Comparator::Contains),
        ("match", Comparator::Regex),
        ("regex", Comparator::Regex),
    ];

    /// Looks up a comparator by its name, ignoring case. Returns `None` for unknown names.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::NAMES
            .iter()
            .find(|(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, comparator)| *comparator)
    }

    /// Resolves the comparator a route declares. Missing or unknown names resolve to
    /// [`Comparator::DirectMatch`].
    pub fn resolve(name: Option<&str>) -> Self {
        name.and_then(Self::from_name).unwrap_or_default()
    }

    /// Canonical configuration name of the comparator
    pub fn name(&self) -> &'static str {
        match self {
            Self::DirectMatch => "direct_match",
            Self::StartsWith => "starts_with",
            Self::EndsWith => "ends_with",
            Self::Contains => "contains",
            Self::Regex => "regex",
        }
    }

    /// Compiles a regular expression for this comparator, anchoring it where the comparison
    /// requires.
    pub(crate) fn compile_pattern(&self, pattern: &str) -> Result<Regex, regex::Error> {
        // Errors refer to the configured pattern, not the anchored one
        let regex = Regex::new(pattern)?;
        match self {
            Self::StartsWith => Regex::new(&format!(r"\A(?:{pattern})")),
            Self::EndsWith => Regex::new(&format!(r"(?:{pattern})\z")),
            Self::DirectMatch | Self::Contains | Self::Regex => Ok(regex),
        }
    }

    /// Compares the actual value with the expected value.
    pub fn compare(&self, actual: &str, expected: &Criterion) -> bool {
        match expected {
            Criterion::Pattern(regex) => regex.is_match(actual),
            Criterion::Literal(expected) => match self {
                Self::DirectMatch => actual == expected,
                Self::StartsWith => actual.starts_with(expected.as_str()),
                Self::EndsWith => actual.ends_with(expected.as_str()),
                Self::Contains => actual.contains(expected.as_str()),
                // Literals are compiled into patterns for this comparator
                Self::Regex => actual == expected,
            },
        }
    }
}

impl Display for Comparator {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// A compiled criterion value, ready to be compared against request attributes
#[derive(Debug, Clone)]
pub enum Criterion {
    /// A literal string
    Literal(String),
    /// A regular expression
    Pattern(Regex),
}

impl PartialEq for Criterion {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Literal(a), Self::Literal(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl Eq for Criterion {}
