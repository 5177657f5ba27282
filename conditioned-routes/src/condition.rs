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

//! Validation of route conditions at registration time and their evaluation per request.

use log::{debug, trace};

use crate::comparator::{Comparator, Criterion};
use crate::configuration::{ConditionConf, CriterionValue};
use crate::environment::{Attribute, RequestEnvironment};
use crate::error::ConfigError;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Rule {
    attribute: Attribute,
    comparator: Comparator,
    expected: Criterion,
}

/// A validated and compiled route condition
///
/// Conditions are immutable once created and can be evaluated concurrently.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Condition {
    rule: Option<Rule>,
}

impl Condition {
    /// A condition satisfied by every request
    pub const ALWAYS: Condition = Condition { rule: None };

    /// Validates the declared conditions of a route and compiles them.
    ///
    /// Fails if more than one criterion attribute is declared or if a regular expression is
    /// invalid. An unknown comparator name is not an error, [`Comparator::DirectMatch`] is used
    /// then.
    pub fn validate(conf: &ConditionConf) -> Result<Self, ConfigError> {
        let (attribute, value) = match conf.criteria().as_slice() {
            [] => return Ok(Self::ALWAYS),
            [(attribute, value)] => (*attribute, *value),
            criteria => {
                return Err(ConfigError::MultipleCriteriaNotAllowed {
                    attributes: criteria.iter().map(|(attribute, _)| *attribute).collect(),
                })
            }
        };

        let comparator = Comparator::resolve(conf.comparator.as_deref());
        if let Some(name) = &conf.comparator {
            if Comparator::from_name(name).is_none() {
                debug!("Unknown comparator {name:?} for {attribute}, using {comparator}");
            }
        }

        let expected = match (value, comparator) {
            (CriterionValue::Literal(pattern), Comparator::Regex)
            | (CriterionValue::Regex { regex: pattern }, _) => Criterion::Pattern(
                comparator
                    .compile_pattern(pattern)
                    .map_err(|source| ConfigError::InvalidRegex { attribute, source })?,
            ),
            (CriterionValue::Literal(literal), _) => Criterion::Literal(literal.clone()),
        };

        debug!("Compiled condition: {attribute} {comparator} {expected:?}");
        Ok(Self {
            rule: Some(Rule {
                attribute,
                comparator,
                expected,
            }),
        })
    }

    /// Checks whether the request satisfies the condition.
    pub fn evaluate(&self, env: &RequestEnvironment) -> bool {
        let Some(rule) = &self.rule else {
            return true;
        };

        let actual = env.get(rule.attribute);
        let result = rule.comparator.compare(actual, &rule.expected);
        trace!(
            "Condition {} {} {:?} on {actual:?}: {result}",
            rule.attribute,
            rule.comparator,
            rule.expected
        );
        result
    }

    /// Returns `true` if the condition doesn't restrict requests.
    pub fn is_always(&self) -> bool {
        self.rule.is_none()
    }

    /// The attribute the condition compares against, if any
    pub fn attribute(&self) -> Option<Attribute> {
        self.rule.as_ref().map(|rule| rule.attribute)
    }

    /// The comparator the condition applies, if any
    pub fn comparator(&self) -> Option<Comparator> {
        self.rule.as_ref().map(|rule| rule.comparator)
    }
}

impl TryFrom<&ConditionConf> for Condition {
    type Error = ConfigError;

    fn try_from(conf: &ConditionConf) -> Result<Self, Self::Error> {
        Self::validate(conf)
    }
}

impl TryFrom<ConditionConf> for Condition {
    type Error = ConfigError;

    fn try_from(conf: ConditionConf) -> Result<Self, Self::Error> {
        Self::validate(&conf)
    }
}
