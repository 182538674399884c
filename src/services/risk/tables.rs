// Actuarial Reference Tables
// Disease catalog with average treatment cost and age-banded annual hospitalization prevalence

use std::collections::HashMap;
use std::sync::OnceLock;

pub const MIN_AGE: u32 = 18;
pub const MAX_AGE: u32 = 80;

/// Cover amounts offered to the user, in rupees
pub const SUM_INSURED_TIERS: [f64; 7] = [
    200_000.0, 300_000.0, 500_000.0, 1_000_000.0, 1_500_000.0, 2_500_000.0, 5_000_000.0,
];

/// Inclusive upper age of each prevalence band; the last band is open-ended
pub const AGE_BAND_UPPER: [u32; 4] = [25, 35, 45, 55];

/// Prevalence used for diseases outside the catalog
pub const DEFAULT_PREVALENCE: [f64; 5] = [0.05, 0.08, 0.12, 0.18, 0.25];

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DiseaseEntry {
    pub name: &'static str,
    pub treatment_cost: f64,
    pub prevalence: [f64; 5],
}

pub const DISEASE_CATALOG: [DiseaseEntry; 10] = [
    DiseaseEntry { name: "Diabetes", treatment_cost: 85_000.0, prevalence: [0.04, 0.10, 0.18, 0.28, 0.38] },
    DiseaseEntry { name: "Hypertension", treatment_cost: 65_000.0, prevalence: [0.05, 0.12, 0.22, 0.35, 0.48] },
    DiseaseEntry { name: "Heart Disease", treatment_cost: 350_000.0, prevalence: [0.02, 0.06, 0.14, 0.25, 0.40] },
    DiseaseEntry { name: "Thyroid Disorders", treatment_cost: 70_000.0, prevalence: [0.03, 0.07, 0.12, 0.16, 0.20] },
    DiseaseEntry { name: "Dental Treatment", treatment_cost: 45_000.0, prevalence: [0.15, 0.20, 0.25, 0.30, 0.35] },
    DiseaseEntry { name: "Cancer", treatment_cost: 600_000.0, prevalence: [0.01, 0.02, 0.05, 0.09, 0.14] },
    DiseaseEntry { name: "Kidney Disease", treatment_cost: 400_000.0, prevalence: [0.01, 0.03, 0.07, 0.12, 0.18] },
    DiseaseEntry { name: "Orthopedic Surgery", treatment_cost: 200_000.0, prevalence: [0.03, 0.06, 0.10, 0.18, 0.28] },
    DiseaseEntry { name: "Maternity", treatment_cost: 120_000.0, prevalence: [0.10, 0.20, 0.05, 0.00, 0.00] },
    DiseaseEntry { name: "Cataract", treatment_cost: 55_000.0, prevalence: [0.00, 0.01, 0.05, 0.15, 0.35] },
];

// Lowercased name -> catalog entry, built once and never mutated.
fn catalog_index() -> &'static HashMap<String, &'static DiseaseEntry> {
    static INDEX: OnceLock<HashMap<String, &'static DiseaseEntry>> = OnceLock::new();
    INDEX.get_or_init(|| {
        DISEASE_CATALOG
            .iter()
            .map(|entry| (entry.name.to_lowercase(), entry))
            .collect()
    })
}

/// Catalog entry for a disease name, case-insensitive
pub fn lookup_disease(name: &str) -> Option<&'static DiseaseEntry> {
    catalog_index().get(&name.trim().to_lowercase()).copied()
}

/// Catalog name for free text: an exact case-insensitive match, else the
/// first catalog disease whose name appears inside the text
pub fn canonical_disease_name(text: &str) -> Option<&'static str> {
    if let Some(entry) = lookup_disease(text) {
        return Some(entry.name);
    }
    let lower = text.to_lowercase();
    DISEASE_CATALOG
        .iter()
        .find(|entry| lower.contains(&entry.name.to_lowercase()))
        .map(|entry| entry.name)
}

pub fn age_band_index(age: u32) -> usize {
    AGE_BAND_UPPER
        .iter()
        .position(|upper| age <= *upper)
        .unwrap_or(AGE_BAND_UPPER.len())
}

/// Annual hospitalization probability for a disease at a given age
pub fn disease_probability(age: u32, disease: &str) -> f64 {
    let band = age_band_index(age);
    lookup_disease(disease)
        .map(|entry| entry.prevalence[band])
        .unwrap_or(DEFAULT_PREVALENCE[band])
}

/// Average treatment cost, or `default_cost` for diseases outside the catalog
pub fn treatment_cost(disease: &str, default_cost: f64) -> f64 {
    lookup_disease(disease)
        .map(|entry| entry.treatment_cost)
        .unwrap_or(default_cost)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_age_bands() {
        assert_eq!(age_band_index(18), 0);
        assert_eq!(age_band_index(25), 0);
        assert_eq!(age_band_index(26), 1);
        assert_eq!(age_band_index(35), 1);
        assert_eq!(age_band_index(55), 3);
        assert_eq!(age_band_index(56), 4);
        assert_eq!(age_band_index(80), 4);
    }

    #[test]
    fn test_probability_lookup() {
        assert_eq!(disease_probability(35, "Diabetes"), 0.10);
        assert_eq!(disease_probability(60, "cataract"), 0.35);
        assert_eq!(disease_probability(40, "Rare Syndrome"), 0.12);
    }

    #[test]
    fn test_treatment_cost_lookup() {
        assert_eq!(treatment_cost("Cancer", 100_000.0), 600_000.0);
        assert_eq!(treatment_cost("Rare Syndrome", 100_000.0), 100_000.0);
    }

    #[test]
    fn test_canonical_names() {
        assert_eq!(canonical_disease_name("heart disease"), Some("Heart Disease"));
        assert_eq!(
            canonical_disease_name("Pre-existing Diabetes and related complications"),
            Some("Diabetes")
        );
        assert_eq!(canonical_disease_name("Bariatric surgery"), None);
    }
}
