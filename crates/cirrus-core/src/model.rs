//! Typed description of cloud resources
//!
//! A [`ResourceSpec`] describes a single provider-managed resource:
//! what kind it is, where it lives, its provider-specific properties,
//! and which other resources must exist before it can be created.
//! Specs are immutable once submitted to a [`SpecSet`].

use crate::error::{GraphError, Result};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Kind of cloud resource
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResourceKind {
    /// Virtual network
    Network,
    /// Public IP address
    PublicIp,
    /// Internet-facing load balancer
    LoadBalancer,
    /// Virtual machine scale set
    ScaleSet,
    /// Single virtual machine
    Vm,
    /// Attached disk
    Disk,
    /// DNS record
    Dns,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResourceKind::Network => write!(f, "network"),
            ResourceKind::PublicIp => write!(f, "public-ip"),
            ResourceKind::LoadBalancer => write!(f, "load-balancer"),
            ResourceKind::ScaleSet => write!(f, "scale-set"),
            ResourceKind::Vm => write!(f, "vm"),
            ResourceKind::Disk => write!(f, "disk"),
            ResourceKind::Dns => write!(f, "dns"),
        }
    }
}

/// Declarative description of a single cloud resource
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResourceSpec {
    /// Unique identifier within the spec set
    pub id: String,

    /// Resource kind
    pub kind: ResourceKind,

    /// Provider region (e.g., "eastus")
    pub region: String,

    /// Provider-specific configuration
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,

    /// Ids of resources that must be ready before this one is created
    #[serde(default)]
    pub depends_on: BTreeSet<String>,
}

impl ResourceSpec {
    pub fn new(id: impl Into<String>, kind: ResourceKind, region: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind,
            region: region.into(),
            properties: BTreeMap::new(),
            depends_on: BTreeSet::new(),
        }
    }

    pub fn with_property(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.properties.insert(key.into(), value);
        self
    }

    pub fn with_dependency(mut self, id: impl Into<String>) -> Self {
        self.depends_on.insert(id.into());
        self
    }

    /// Get a property value as a specific type
    pub fn get_property<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        self.properties
            .get(key)
            .and_then(|v| serde_json::from_value(v.clone()).ok())
    }
}

/// Validated, immutable set of resource specs for one session
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SpecSet {
    specs: BTreeMap<String, ResourceSpec>,
}

impl SpecSet {
    /// Build a spec set, rejecting duplicate ids and dangling
    /// `depends_on` references up front.
    pub fn new(specs: impl IntoIterator<Item = ResourceSpec>) -> Result<Self> {
        let mut map = BTreeMap::new();
        for spec in specs {
            if map.contains_key(&spec.id) {
                return Err(GraphError::DuplicateId(spec.id));
            }
            map.insert(spec.id.clone(), spec);
        }

        for spec in map.values() {
            for dep in &spec.depends_on {
                if !map.contains_key(dep) {
                    return Err(GraphError::UnknownDependency {
                        id: spec.id.clone(),
                        dependency: dep.clone(),
                    });
                }
            }
        }

        Ok(Self { specs: map })
    }

    pub fn get(&self, id: &str) -> Option<&ResourceSpec> {
        self.specs.get(id)
    }

    pub fn ids(&self) -> impl Iterator<Item = &String> {
        self.specs.keys()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ResourceSpec> {
        self.specs.values()
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}
