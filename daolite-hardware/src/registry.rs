// Copyright (c) 2026 Graphcore Ltd. All rights reserved.

//! Named compute resources.
//!
//! A [`HardwareRegistry`] is created explicitly and handed to whatever needs
//! to look resources up by name, so tests and tools can use their own
//! catalogue.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::path::Path;
use std::sync::Arc;

use daolite_engine::invalid_config;
use daolite_engine::types::{LatencyError, LatencyResult};

use crate::types::HardwareConfig;
use crate::{ComputeResource, catalog, default_resource};

/// Raised when a resource lookup had to fall back to the default resource.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum ResourceWarning {
    UnknownResource { name: String },
}

impl fmt::Display for ResourceWarning {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ResourceWarning::UnknownResource { name } => {
                write!(f, "Unknown resource '{name}', using the default resource")
            }
        }
    }
}

/// Result of [`HardwareRegistry::resolve`].
#[derive(Clone, Debug)]
pub struct Resolved {
    pub resource: Arc<ComputeResource>,
    pub warning: Option<ResourceWarning>,
}

#[derive(Clone, Debug)]
pub struct HardwareRegistry {
    resources: BTreeMap<String, Arc<ComputeResource>>,
    default: Arc<ComputeResource>,
}

impl Default for HardwareRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl HardwareRegistry {
    /// Create an empty registry which resolves everything to the
    /// [`default_resource`].
    #[must_use]
    pub fn new() -> Self {
        Self {
            resources: BTreeMap::new(),
            default: Arc::new(default_resource()),
        }
    }

    /// Create a registry holding the built-in [`catalog`].
    pub fn builtin() -> LatencyResult<Self> {
        let mut registry = Self::new();
        for resource in catalog::builtin_resources()? {
            registry.add(resource);
        }
        Ok(registry)
    }

    /// Add a resource, returning any resource of the same name it replaced.
    pub fn add(&mut self, resource: ComputeResource) -> Option<Arc<ComputeResource>> {
        self.resources
            .insert(resource.name().to_string(), Arc::new(resource))
    }

    /// Add all the resources from a hardware file.
    ///
    /// Returns the names of the resources added.
    pub fn add_from_file(&mut self, hardware_path: &Path) -> LatencyResult<Vec<String>> {
        let s = std::fs::read_to_string(hardware_path).map_err(|e| {
            LatencyError::Parse(format!("Unable to read {}: {e}", hardware_path.display()))
        })?;
        self.add_from_str(&s)
    }

    /// Add all the resources from the contents of a hardware file.
    ///
    /// Resources in the file replace existing resources of the same name, but
    /// a name may only appear once in the file. Nothing is added if any
    /// resource is invalid.
    pub fn add_from_str(&mut self, hardware_config: &str) -> LatencyResult<Vec<String>> {
        let cfg: HardwareConfig = serde_yaml::from_str(hardware_config)
            .map_err(|e| LatencyError::Parse(format!("serde_yaml::from_str failed: {e}")))?;

        let mut seen = HashSet::new();
        let mut resources = Vec::with_capacity(cfg.resources.len());
        for section in &cfg.resources {
            if !seen.insert(section.name.as_str()) {
                return invalid_config!("Duplicate resource name '{}'", section.name);
            }
            resources.push(section.build()?);
        }

        let names = resources.iter().map(|r| r.name().to_string()).collect();
        for resource in resources {
            self.add(resource);
        }
        Ok(names)
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<Arc<ComputeResource>> {
        self.resources.get(name).cloned()
    }

    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.resources.contains_key(name)
    }

    /// Find the resource for a component.
    ///
    /// No name means the default resource. A name that is not known also
    /// gives the default resource, along with a warning.
    #[must_use]
    pub fn resolve(&self, name: Option<&str>) -> Resolved {
        match name {
            None => Resolved {
                resource: self.default.clone(),
                warning: None,
            },
            Some(name) => match self.get(name) {
                Some(resource) => Resolved {
                    resource,
                    warning: None,
                },
                None => Resolved {
                    resource: self.default.clone(),
                    warning: Some(ResourceWarning::UnknownResource {
                        name: name.to_string(),
                    }),
                },
            },
        }
    }

    #[must_use]
    pub fn default_resource(&self) -> &Arc<ComputeResource> {
        &self.default
    }

    /// Replace the resource used when a name cannot be resolved.
    pub fn set_default(&mut self, resource: ComputeResource) {
        self.default = Arc::new(resource);
    }

    /// Names of all resources, in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.resources.keys().map(String::as_str)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}
