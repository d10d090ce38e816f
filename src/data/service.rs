//! Arranges the catalog for display: key vitals in two columns, the rest below.

use serde::Serialize;
use tracing::warn;

use super::domain::FeatureCatalog;

/// Display grouping of the catalog. Every catalog name appears exactly once.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct FeatureLayout {
    pub vitals_left: Vec<String>,
    pub vitals_right: Vec<String>,
    pub other: Vec<String>,
}

impl FeatureLayout {
    /// Key vitals keep their configured order; the first half (rounded down)
    /// goes to the left column. Configured names missing from the catalog are
    /// dropped before the split, so the halves are taken over the vitals that
    /// are actually shown rather than over the configured list. A dataset
    /// lacking some vitals therefore still gets balanced columns.
    pub fn build(catalog: &FeatureCatalog, key_vitals: &[String]) -> Self {
        let mut vitals: Vec<String> = Vec::with_capacity(key_vitals.len());
        for name in key_vitals {
            if !catalog.contains(name) {
                warn!(feature = %name, "key vital not present in dataset, skipping");
                continue;
            }
            if !vitals.contains(name) {
                vitals.push(name.clone());
            }
        }

        let other = catalog
            .iter()
            .filter(|name| !vitals.iter().any(|v| v.as_str() == *name))
            .map(str::to_string)
            .collect();

        let vitals_right = vitals.split_off(vitals.len() / 2);
        Self {
            vitals_left: vitals,
            vitals_right,
            other,
        }
    }

    pub fn vitals(&self) -> impl Iterator<Item = &str> {
        self.vitals_left
            .iter()
            .chain(self.vitals_right.iter())
            .map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn names(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn vitals_split_in_half_and_rest_follows_catalog() {
        let catalog = FeatureCatalog::new(names(&["Age", "HR", "Temp", "SBP", "Gender"])).unwrap();
        let layout = FeatureLayout::build(&catalog, &names(&["HR", "SBP", "Temp"]));
        assert_eq!(layout.vitals_left, ["HR"]);
        assert_eq!(layout.vitals_right, ["SBP", "Temp"]);
        assert_eq!(layout.other, ["Age", "Gender"]);
    }

    #[test]
    fn unknown_and_repeated_vitals_are_dropped() {
        let catalog = FeatureCatalog::new(names(&["HR", "Temp"])).unwrap();
        let layout = FeatureLayout::build(&catalog, &names(&["Lactate", "HR", "HR"]));
        assert_eq!(layout.vitals().collect::<Vec<_>>(), ["HR"]);
        assert_eq!(layout.other, ["Temp"]);
    }

    #[test]
    fn every_feature_appears_once() {
        let catalog = FeatureCatalog::new(names(&["a", "b", "c", "d"])).unwrap();
        let layout = FeatureLayout::build(&catalog, &names(&["d", "b"]));
        let mut all: Vec<&str> = layout.vitals().collect();
        all.extend(layout.other.iter().map(String::as_str));
        all.sort_unstable();
        assert_eq!(all, ["a", "b", "c", "d"]);
    }
}
