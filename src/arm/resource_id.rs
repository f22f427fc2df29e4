//! Azure Resource Manager resource identifiers

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{AcctctlError, Result};

/// A parsed ARM resource id such as
/// `/subscriptions/{sub}/resourceGroups/{rg}/providers/Microsoft.Storage/storageAccounts/{name}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ResourceId {
    subscription_id: String,
    resource_group: Option<String>,
    provider_namespace: Option<String>,
    /// (type, name) pairs below the provider, outermost first
    resources: Vec<(String, String)>,
}

impl ResourceId {
    pub fn subscription(subscription_id: impl Into<String>) -> Self {
        Self {
            subscription_id: subscription_id.into(),
            resource_group: None,
            provider_namespace: None,
            resources: Vec::new(),
        }
    }

    pub fn resource_group(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
    ) -> Self {
        Self {
            resource_group: Some(resource_group.into()),
            ..Self::subscription(subscription_id)
        }
    }

    /// Id of a top-level resource inside a resource group
    pub fn resource(
        subscription_id: impl Into<String>,
        resource_group: impl Into<String>,
        provider_namespace: impl Into<String>,
        resource_type: impl Into<String>,
        name: impl Into<String>,
    ) -> Self {
        Self {
            provider_namespace: Some(provider_namespace.into()),
            resources: vec![(resource_type.into(), name.into())],
            ..Self::resource_group(subscription_id, resource_group)
        }
    }

    pub fn parse(id: &str) -> Result<Self> {
        let malformed = |why: &str| {
            AcctctlError::invalid_argument(format!("Malformed resource id '{id}': {why}"))
        };

        let segments: Vec<&str> = id.trim_matches('/').split('/').collect();
        if segments.len() < 2
            || !segments[0].eq_ignore_ascii_case("subscriptions")
            || segments[1].is_empty()
        {
            return Err(malformed("expected '/subscriptions/{id}' prefix"));
        }

        let mut parsed = Self::subscription(segments[1]);
        let mut rest = &segments[2..];

        if let Some(key) = rest.first() {
            if key.eq_ignore_ascii_case("resourceGroups") {
                let rg = rest
                    .get(1)
                    .filter(|s| !s.is_empty())
                    .ok_or_else(|| malformed("missing resource group name"))?;
                parsed.resource_group = Some(rg.to_string());
                rest = &rest[2..];
            }
        }

        if let Some(key) = rest.first() {
            if !key.eq_ignore_ascii_case("providers") {
                return Err(malformed(&format!("unexpected segment '{key}'")));
            }
            let namespace = rest
                .get(1)
                .filter(|s| !s.is_empty())
                .ok_or_else(|| malformed("missing provider namespace"))?;
            parsed.provider_namespace = Some(namespace.to_string());
            rest = &rest[2..];

            if rest.len() % 2 != 0 {
                return Err(malformed("resource type without a name"));
            }
            for pair in rest.chunks(2) {
                if pair[0].is_empty() || pair[1].is_empty() {
                    return Err(malformed("empty resource type or name"));
                }
                parsed.resources.push((pair[0].to_string(), pair[1].to_string()));
            }
        }

        Ok(parsed)
    }

    pub fn subscription_id(&self) -> &str {
        &self.subscription_id
    }

    pub fn resource_group_name(&self) -> Option<&str> {
        self.resource_group.as_deref()
    }

    pub fn provider_namespace(&self) -> Option<&str> {
        self.provider_namespace.as_deref()
    }

    /// Full resource type, e.g. `Microsoft.Storage/storageAccounts`
    pub fn resource_type(&self) -> Option<String> {
        let namespace = self.provider_namespace.as_ref()?;
        if self.resources.is_empty() {
            return None;
        }
        let types: Vec<&str> = self.resources.iter().map(|(t, _)| t.as_str()).collect();
        Some(format!("{}/{}", namespace, types.join("/")))
    }

    /// The last name in the id
    pub fn name(&self) -> &str {
        if let Some((_, name)) = self.resources.last() {
            return name;
        }
        self.resource_group
            .as_deref()
            .unwrap_or(&self.subscription_id)
    }
}

impl fmt::Display for ResourceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/subscriptions/{}", self.subscription_id)?;
        if let Some(rg) = &self.resource_group {
            write!(f, "/resourceGroups/{}", rg)?;
        }
        if let Some(namespace) = &self.provider_namespace {
            write!(f, "/providers/{}", namespace)?;
            for (resource_type, name) in &self.resources {
                write!(f, "/{}/{}", resource_type, name)?;
            }
        }
        Ok(())
    }
}

impl FromStr for ResourceId {
    type Err = AcctctlError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<String> for ResourceId {
    type Error = AcctctlError;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl From<ResourceId> for String {
    fn from(id: ResourceId) -> Self {
        id.to_string()
    }
}
