//! Object names
//!
//! An object name is a domain followed by one or more key properties:
//!
//! ```text
//! net.pool:type=WorkerPool,instance=ingest
//! ```
//!
//! Two names are equal when their canonical forms are equal. The canonical
//! form lists the key properties sorted by key, so `d:b=2,a=1` and
//! `d:a=1,b=2` name the same object.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::str::FromStr;

use rustc_hash::FxHashSet;

use crate::error::NameError;

/// Characters that may not appear in a domain, key, or value
const RESERVED: [char; 6] = [':', '=', ',', '"', '*', '?'];

/// A validated object name.
#[derive(Clone)]
pub struct ObjectName {
    domain: String,
    /// Key properties in the order they were given
    properties: Vec<(String, String)>,
    canonical: String,
}

impl ObjectName {
    /// Build a name from a domain and key properties.
    pub fn new<K, V>(
        domain: impl Into<String>,
        properties: impl IntoIterator<Item = (K, V)>,
    ) -> Result<Self, NameError>
    where
        K: Into<String>,
        V: Into<String>,
    {
        let domain = domain.into();
        let properties: Vec<(String, String)> = properties
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();

        let display = render(&domain, &properties);
        if domain.is_empty() {
            return Err(NameError::EmptyDomain(display));
        }
        check_part(&domain)?;
        if properties.is_empty() {
            return Err(NameError::NoProperties(display));
        }

        let mut seen = FxHashSet::default();
        for (key, value) in &properties {
            if key.is_empty() || value.is_empty() {
                return Err(NameError::MalformedProperty {
                    name: display,
                    property: format!("{}={}", key, value),
                });
            }
            check_part(key)?;
            check_part(value)?;
            if !seen.insert(key.as_str()) {
                return Err(NameError::DuplicateKey {
                    name: display,
                    key: key.clone(),
                });
            }
        }

        let mut sorted = properties.clone();
        sorted.sort_by(|a, b| a.0.cmp(&b.0));
        let canonical = render(&domain, &sorted);

        Ok(ObjectName {
            domain,
            properties,
            canonical,
        })
    }

    /// `<domain>:type=<type_name>`
    pub fn of_type(domain: impl Into<String>, type_name: impl Into<String>) -> Result<Self, NameError> {
        let type_name: String = type_name.into();
        Self::new(domain, [("type", type_name)])
    }

    /// Parse `domain:key=value[,key=value]*`
    pub fn parse(name: &str) -> Result<Self, NameError> {
        let (domain, rest) = name
            .split_once(':')
            .ok_or_else(|| NameError::MissingSeparator(name.to_string()))?;
        if rest.is_empty() {
            return Err(NameError::NoProperties(name.to_string()));
        }

        let properties = rest
            .split(',')
            .map(|property| {
                property
                    .split_once('=')
                    .ok_or_else(|| NameError::MalformedProperty {
                        name: name.to_string(),
                        property: property.to_string(),
                    })
            })
            .collect::<Result<Vec<_>, _>>()?;

        Self::new(domain, properties)
    }

    /// Domain part
    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Value of a key property
    pub fn key(&self, key: &str) -> Option<&str> {
        self.properties
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }

    /// Key properties in the order they were given
    pub fn properties(&self) -> &[(String, String)] {
        &self.properties
    }

    /// Canonical form, keys sorted
    pub fn canonical(&self) -> &str {
        &self.canonical
    }
}

fn render(domain: &str, properties: &[(String, String)]) -> String {
    let props: Vec<String> = properties
        .iter()
        .map(|(k, v)| format!("{}={}", k, v))
        .collect();
    format!("{}:{}", domain, props.join(","))
}

fn check_part(part: &str) -> Result<(), NameError> {
    match part.chars().find(|c| RESERVED.contains(c) || c.is_control()) {
        Some(character) => Err(NameError::InvalidCharacter {
            part: part.to_string(),
            character,
        }),
        None => Ok(()),
    }
}

impl PartialEq for ObjectName {
    fn eq(&self, other: &Self) -> bool {
        self.canonical == other.canonical
    }
}

impl Eq for ObjectName {}

impl Hash for ObjectName {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.canonical.hash(state);
    }
}

impl fmt::Display for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(&self.domain, &self.properties))
    }
}

impl fmt::Debug for ObjectName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ObjectName({})", self)
    }
}

impl FromStr for ObjectName {
    type Err = NameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}
