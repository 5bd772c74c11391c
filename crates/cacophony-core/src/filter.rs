//! Filter set and predicates
//!
//! A filter is a named predicate drawn from a fixed vocabulary: one of the
//! sound types, one of the genders, or an age-range label. A record passes a
//! [`FilterSet`] only when it satisfies *every* active filter, so two sound
//! types active at once match nothing.

use crate::dataset::{ClipRecord, Gender, SoundType};

/// Prefix carried by age-range labels in the vocabulary
pub const AGE_PREFIX: &str = "Age: ";

/// Inclusive age bucket
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AgeRange {
    pub label: &'static str,
    pub min: f64,
    pub max: f64,
}

impl AgeRange {
    /// NaN never falls in a range
    #[inline]
    pub fn contains(&self, age: f64) -> bool {
        age >= self.min && age <= self.max
    }
}

/// Age buckets in display order (upper bounds inclusive, last one unbounded)
pub static AGE_RANGES: [AgeRange; 6] = [
    AgeRange { label: "18–24", min: 18.0, max: 24.0 },
    AgeRange { label: "25–34", min: 25.0, max: 34.0 },
    AgeRange { label: "35–44", min: 35.0, max: 44.0 },
    AgeRange { label: "45–54", min: 45.0, max: 54.0 },
    AgeRange { label: "55–64", min: 55.0, max: 64.0 },
    AgeRange { label: "65+", min: 65.0, max: f64::INFINITY },
];

/// First age bucket containing `age`
pub fn age_range_for(age: f64) -> Option<&'static AgeRange> {
    AGE_RANGES.iter().find(|r| r.contains(age))
}

/// Resolved meaning of a filter name
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FilterPredicate {
    Gender(Gender),
    SoundType(SoundType),
    Age(&'static AgeRange),
    /// Name outside the vocabulary; never matches
    Unknown,
}

impl FilterPredicate {
    /// Resolve a filter name
    ///
    /// Genders match exactly, sound types case-insensitively, and age labels
    /// with or without the `Age: ` prefix.
    pub fn parse(name: &str) -> Self {
        if let Some(gender) = Gender::from_name(name) {
            return FilterPredicate::Gender(gender);
        }
        if let Some(sound_type) = SoundType::from_name(name) {
            return FilterPredicate::SoundType(sound_type);
        }
        let label = name.strip_prefix(AGE_PREFIX).unwrap_or(name);
        AGE_RANGES
            .iter()
            .find(|r| r.label == label)
            .map(FilterPredicate::Age)
            .unwrap_or(FilterPredicate::Unknown)
    }

    pub fn matches(&self, record: &ClipRecord) -> bool {
        match self {
            FilterPredicate::Gender(g) => record.gender == *g,
            FilterPredicate::SoundType(s) => record.sound_type == *s,
            FilterPredicate::Age(range) => range.contains(record.age),
            FilterPredicate::Unknown => false,
        }
    }
}

/// One entry of the filter set
#[derive(Debug, Clone, PartialEq)]
pub struct Filter {
    pub name: String,
    pub active: bool,
}

/// User-controlled list of named filters, unique by name
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterSet {
    filters: Vec<Filter>,
}

impl FilterSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `{name, active}` pairs, dropping later duplicates
    pub fn from_filters(filters: impl IntoIterator<Item = Filter>) -> Self {
        let mut set = Self::new();
        for filter in filters {
            if !set.contains(&filter.name) {
                set.filters.push(filter);
            }
        }
        set
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn contains(&self, name: &str) -> bool {
        self.filters.iter().any(|f| f.name == name)
    }

    /// Add a new active filter; returns false if the name is already present
    pub fn add(&mut self, name: impl Into<String>) -> bool {
        let name = name.into();
        if self.contains(&name) {
            return false;
        }
        self.filters.push(Filter { name, active: true });
        true
    }

    /// Flip a filter's active state; returns the new state
    pub fn toggle(&mut self, name: &str) -> Option<bool> {
        let filter = self.filters.iter_mut().find(|f| f.name == name)?;
        filter.active = !filter.active;
        Some(filter.active)
    }

    pub fn remove(&mut self, name: &str) -> bool {
        let before = self.filters.len();
        self.filters.retain(|f| f.name != name);
        self.filters.len() != before
    }

    pub fn active_names(&self) -> impl Iterator<Item = &str> {
        self.filters
            .iter()
            .filter(|f| f.active)
            .map(|f| f.name.as_str())
    }

    /// True when no filter is active (everything passes)
    pub fn is_empty(&self) -> bool {
        !self.filters.iter().any(|f| f.active)
    }

    /// Resolve the active filters once for repeated matching
    pub fn compile(&self) -> CompiledFilters {
        CompiledFilters {
            predicates: self.active_names().map(FilterPredicate::parse).collect(),
        }
    }
}

/// Active filters resolved to predicates
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompiledFilters {
    predicates: Vec<FilterPredicate>,
}

impl CompiledFilters {
    pub fn is_empty(&self) -> bool {
        self.predicates.is_empty()
    }

    /// Same rule as [`check_filters`]
    pub fn matches(&self, record: Option<&ClipRecord>) -> bool {
        if self.predicates.is_empty() {
            return true;
        }
        match record {
            Some(record) => self.predicates.iter().all(|p| p.matches(record)),
            None => false,
        }
    }
}

/// Whether a cell's record passes the filter set
///
/// No active filters passes everything; otherwise a missing record fails.
pub fn check_filters(record: Option<&ClipRecord>, filters: &FilterSet) -> bool {
    if filters.is_empty() {
        return true;
    }
    let Some(record) = record else {
        return false;
    };
    filters
        .active_names()
        .all(|name| FilterPredicate::parse(name).matches(record))
}

/// Every filter name the search widget can offer
pub fn vocabulary() -> Vec<String> {
    SoundType::ALL
        .iter()
        .map(|s| s.name().to_string())
        .chain(Gender::ALL.iter().map(|g| g.name().to_string()))
        .chain(AGE_RANGES.iter().map(|r| format!("{}{}", AGE_PREFIX, r.label)))
        .collect()
}

/// Vocabulary entries matching a free-text query
///
/// Substring match ignoring case, plus age entries whose range contains the
/// query when it reads as a number.
pub fn suggest(query: &str) -> Vec<String> {
    let query = query.trim();
    if query.is_empty() {
        return Vec::new();
    }
    let needle = query.to_lowercase();
    let age = query
        .parse::<f64>()
        .ok()
        .filter(|a| a.is_finite())
        .unwrap_or(f64::NAN);

    vocabulary()
        .into_iter()
        .filter(|entry| {
            if entry.to_lowercase().contains(&needle) {
                return true;
            }
            match FilterPredicate::parse(entry) {
                FilterPredicate::Age(range) => range.contains(age),
                _ => false,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::tests::record;

    fn set(names: &[&str]) -> FilterSet {
        let mut set = FilterSet::new();
        for name in names {
            set.add(*name);
        }
        set
    }

    #[test]
    fn test_empty_set_passes_everything() {
        let filters = FilterSet::new();
        assert!(check_filters(None, &filters));
        let r = record("a", 30.0, Gender::Male, SoundType::Cough);
        assert!(check_filters(Some(&r), &filters));
    }

    #[test]
    fn test_missing_record_fails_active_filters() {
        assert!(!check_filters(None, &set(&["Cough"])));
    }

    #[test]
    fn test_filters_are_conjunctive() {
        let filters = set(&["Cough", "Male"]);
        let both = record("a", 30.0, Gender::Male, SoundType::Cough);
        let sound_only = record("b", 30.0, Gender::Female, SoundType::Cough);
        let gender_only = record("c", 30.0, Gender::Male, SoundType::Sigh);
        assert!(check_filters(Some(&both), &filters));
        assert!(!check_filters(Some(&sound_only), &filters));
        assert!(!check_filters(Some(&gender_only), &filters));
    }

    #[test]
    fn test_two_sound_types_match_nothing() {
        let filters = set(&["Cough", "Sigh"]);
        let r = record("a", 30.0, Gender::Male, SoundType::Cough);
        assert!(!check_filters(Some(&r), &filters));
    }

    #[test]
    fn test_inactive_filters_are_ignored() {
        let mut filters = set(&["Cough"]);
        filters.toggle("Cough");
        assert!(filters.is_empty());
        let r = record("a", 30.0, Gender::Male, SoundType::Sigh);
        assert!(check_filters(Some(&r), &filters));
    }

    #[test]
    fn test_predicate_parsing() {
        assert_eq!(
            FilterPredicate::parse("Female"),
            FilterPredicate::Gender(Gender::Female)
        );
        assert_eq!(FilterPredicate::parse("female"), FilterPredicate::Unknown);
        assert_eq!(
            FilterPredicate::parse("laughter"),
            FilterPredicate::SoundType(SoundType::Laughter)
        );
        assert_eq!(
            FilterPredicate::parse("Age: 25–34"),
            FilterPredicate::Age(&AGE_RANGES[1])
        );
        assert_eq!(FilterPredicate::parse("65+"), FilterPredicate::Age(&AGE_RANGES[5]));
        assert_eq!(FilterPredicate::parse("Age: 25-34"), FilterPredicate::Unknown);
    }

    #[test]
    fn test_age_bounds_inclusive_and_nan() {
        let filters = set(&["Age: 25–34"]);
        for (age, expected) in [(24.0, false), (25.0, true), (34.0, true), (34.5, false)] {
            let r = record("a", age, Gender::Other, SoundType::Sniff);
            assert_eq!(check_filters(Some(&r), &filters), expected, "age {}", age);
        }
        let r = record("a", f64::NAN, Gender::Other, SoundType::Sniff);
        assert!(!check_filters(Some(&r), &filters));

        let old = record("b", 97.0, Gender::Other, SoundType::Sniff);
        assert!(check_filters(Some(&old), &set(&["Age: 65+"])));
    }

    #[test]
    fn test_compiled_filters_agree() {
        let filters = set(&["Female", "Age: 18–24"]);
        let compiled = filters.compile();
        let records = [
            record("a", 20.0, Gender::Female, SoundType::Sigh),
            record("b", 20.0, Gender::Male, SoundType::Sigh),
            record("c", 40.0, Gender::Female, SoundType::Sigh),
        ];
        for r in &records {
            assert_eq!(compiled.matches(Some(r)), check_filters(Some(r), &filters));
        }
        assert!(!compiled.matches(None));
        assert!(FilterSet::new().compile().matches(None));
    }

    #[test]
    fn test_filter_set_editing() {
        let mut filters = FilterSet::new();
        assert!(filters.add("Sneeze"));
        assert!(!filters.add("Sneeze"));
        assert_eq!(filters.filters().len(), 1);
        assert_eq!(filters.toggle("Sneeze"), Some(false));
        assert_eq!(filters.toggle("missing"), None);
        assert!(filters.remove("Sneeze"));
        assert!(!filters.remove("Sneeze"));
        assert!(filters.filters().is_empty());
    }

    #[test]
    fn test_from_filters_dedupes() {
        let filters = FilterSet::from_filters([
            Filter { name: "Male".into(), active: false },
            Filter { name: "Male".into(), active: true },
        ]);
        assert_eq!(filters.filters().len(), 1);
        assert!(filters.is_empty());
    }

    #[test]
    fn test_vocabulary_and_suggest() {
        assert_eq!(vocabulary().len(), 15);
        assert_eq!(suggest("sn"), vec!["Sniff".to_string(), "Sneeze".to_string()]);
        assert_eq!(suggest("40"), vec!["Age: 35–44".to_string()]);
        assert_eq!(suggest("70"), vec!["Age: 65+".to_string()]);
        assert!(suggest("nan").is_empty());
        assert!(suggest("   ").is_empty());
    }
}
