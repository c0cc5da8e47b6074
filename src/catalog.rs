//! Priority attribute allow-list
//!
//! Services expose dozens of attributes; only a handful drive the price.
//! These are the ones offered by default, everything else is left to the
//! advanced view.

use std::collections::HashSet;

/// Attribute that carries the region; always permitted as a selection
pub const LOCATION_ATTRIBUTE: &str = "location";

/// Built-in allow-list of commonly user-relevant attributes
pub const PRIORITY_ATTRIBUTES: &[&str] = &[
    "instanceType",
    "operatingSystem",
    "databaseEngine",
    "databaseEdition",
    "engineCode",
    "deploymentOption",
    "storageClass",
    "volumeType",
    "cacheNodeType",
    "tenancy",
    "licenseModel",
];

/// Allow-list used to derive a line item's smart attributes
#[derive(Debug, Clone)]
pub struct PriorityAttributes {
    names: HashSet<String>,
}

impl Default for PriorityAttributes {
    fn default() -> Self {
        Self {
            names: PRIORITY_ATTRIBUTES.iter().map(|s| s.to_string()).collect(),
        }
    }
}

impl PriorityAttributes {
    /// Built-in list extended with extra names (e.g. from config)
    pub fn with_extra<I, S>(extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut list = Self::default();
        for name in extra {
            let name = name.into();
            if !name.trim().is_empty() {
                list.names.insert(name.trim().to_string());
            }
        }
        list
    }

    pub fn contains(&self, attribute: &str) -> bool {
        self.names.contains(attribute)
    }

    /// Filter a service's attribute list down to the allow-listed ones,
    /// keeping the service's order and dropping duplicates
    pub fn smart_attributes(&self, all: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        all.iter()
            .filter(|attr| self.contains(attr))
            .filter(|attr| seen.insert(attr.as_str()))
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_smart_attributes_filters_unknown() {
        let list = PriorityAttributes::default();
        let all = names(&["instanceType", "foo", "operatingSystem"]);
        assert_eq!(
            list.smart_attributes(&all),
            names(&["instanceType", "operatingSystem"])
        );
    }

    #[test]
    fn test_smart_attributes_preserves_service_order() {
        let list = PriorityAttributes::default();
        let all = names(&["volumeType", "location", "instanceType", "volumeType"]);
        assert_eq!(list.smart_attributes(&all), names(&["volumeType", "instanceType"]));
    }

    #[test]
    fn test_location_is_not_a_smart_attribute() {
        assert!(!PriorityAttributes::default().contains(LOCATION_ATTRIBUTE));
    }

    #[test]
    fn test_with_extra_extends_list() {
        let list = PriorityAttributes::with_extra(["usagetype", "  ", " memory "]);
        assert!(list.contains("usagetype"));
        assert!(list.contains("memory"));
        assert!(list.contains("instanceType"));
        assert!(!list.contains(""));
    }
}
