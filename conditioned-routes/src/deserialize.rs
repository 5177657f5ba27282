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

//! Deserialization helpers for route configuration files

use log::trace;
use serde::de::value::MapAccessDeserializer;
use serde::de::{Deserialize, DeserializeOwned, Deserializer, MapAccess, SeqAccess, Visitor};
use std::fmt::Debug;
use std::fs::File;
use std::io::BufReader;
use std::ops::Deref;
use std::path::Path;

use crate::error::ConfigError;

/// Trait for configuration structures that can be loaded from YAML. This trait has a blanket
/// implementation for any structure implementing [`serde::Deserialize`].
pub trait FromYaml {
    /// Deserializes configuration from a YAML string.
    fn from_yaml<S>(yaml: S) -> Result<Self, ConfigError>
    where
        S: AsRef<str>,
        Self: Sized;

    /// Loads configuration from a YAML file.
    fn load_from_yaml<P>(path: P) -> Result<Self, ConfigError>
    where
        P: AsRef<Path>,
        Self: Sized;
}

impl<D> FromYaml for D
where
    D: DeserializeOwned + Debug + ?Sized,
{
    fn from_yaml<S: AsRef<str>>(yaml: S) -> Result<Self, ConfigError> {
        let conf = serde_yaml::from_str(yaml.as_ref())?;
        trace!("Loaded configuration: {conf:#?}");
        Ok(conf)
    }

    fn load_from_yaml<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let file = File::open(path.as_ref()).map_err(|source| ConfigError::FileOpen {
            path: path.as_ref().to_owned(),
            source,
        })?;
        let reader = BufReader::new(file);

        let conf = serde_yaml::from_reader(reader)?;
        trace!("Loaded configuration file: {conf:#?}");

        Ok(conf)
    }
}

/// A wrapper around the `Vec` type allowing more comfortable deserialization.
///
/// If a list is encountered in the configuration file, it is deserialized into `Vec` directly.
/// A map value is deserialized as a `Vec` instance with one element instead.
#[derive(Clone, PartialEq, Eq)]
pub struct OneOrMany<T> {
    inner: Vec<T>,
}

impl<T> OneOrMany<T> {
    /// Unwraps the inner `Vec` type
    pub fn into_inner(self) -> Vec<T> {
        self.inner
    }
}

impl<T: Debug> Debug for OneOrMany<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.inner.fmt(f)
    }
}

// Deriving `Default` would unnecessarily require `T` to implement `Default`
impl<T> Default for OneOrMany<T> {
    fn default() -> Self {
        Self { inner: Vec::new() }
    }
}

impl<T> Deref for OneOrMany<T> {
    type Target = Vec<T>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl<T> From<Vec<T>> for OneOrMany<T> {
    fn from(value: Vec<T>) -> Self {
        Self { inner: value }
    }
}

impl<T> Extend<T> for OneOrMany<T> {
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        self.inner.extend(iter)
    }
}

impl<'a, T> IntoIterator for &'a OneOrMany<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.iter()
    }
}

impl<T> IntoIterator for OneOrMany<T> {
    type Item = T;
    type IntoIter = std::vec::IntoIter<T>;
    fn into_iter(self) -> Self::IntoIter {
        self.inner.into_iter()
    }
}

impl<'de, T> Deserialize<'de> for OneOrMany<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct ListVisitor<T> {
            list: Vec<T>,
        }

        impl<'de, T: Deserialize<'de>> Visitor<'de> for ListVisitor<T> {
            type Value = OneOrMany<T>;

            fn expecting(&self, formatter: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                formatter.write_str("T or Vec<T>")
            }

            fn visit_seq<A>(mut self, mut seq: A) -> Result<Self::Value, A::Error>
            where
                A: SeqAccess<'de>,
            {
                while let Some(entry) = seq.next_element()? {
                    self.list.push(entry);
                }
                Ok(self.list.into())
            }

            fn visit_map<A>(mut self, map: A) -> Result<Self::Value, A::Error>
            where
                A: MapAccess<'de>,
            {
                self.list
                    .push(T::deserialize(MapAccessDeserializer::new(map))?);
                Ok(self.list.into())
            }

            fn visit_unit<E>(self) -> Result<Self::Value, E>
            where
                E: serde::de::Error,
            {
                Ok(self.list.into())
            }
        }

        deserializer.deserialize_any(ListVisitor { list: Vec::new() })
    }
}
