//! Facet fan-out for working around the per-query result ceiling.
//!
//! Each facet is one independent sub-query capped at 1000 results; running
//! many facets and merging them with [`dedup_staff`] recovers more of a
//! large company than any single query can.

use std::collections::HashSet;

use crate::models::Staff;

/// One (search term, location) partition.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct Facet {
    pub term: Option<String>,
    pub location: Option<String>,
}

/// Provenance label: non-empty parts of company, term and location
/// joined by " - ".
pub fn provenance(company: &str, term: Option<&str>, location: Option<&str>) -> String {
    [Some(company), term, location]
        .into_iter()
        .flatten()
        .map(str::trim)
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" - ")
}

/// Cartesian product of terms and locations. An empty side contributes a
/// single unfiltered slot, so no inputs yields one unfiltered facet.
pub fn fan_out(terms: &[String], locations: &[String]) -> Vec<Facet> {
    let terms: Vec<Option<&String>> = if terms.is_empty() {
        vec![None]
    } else {
        terms.iter().map(Some).collect()
    };
    let locations: Vec<Option<&String>> = if locations.is_empty() {
        vec![None]
    } else {
        locations.iter().map(Some).collect()
    };

    let mut seen = HashSet::new();
    terms
        .iter()
        .flat_map(|term| {
            locations.iter().map(move |location| Facet {
                term: term.cloned(),
                location: location.cloned(),
            })
        })
        .filter(|facet| seen.insert(facet.clone()))
        .collect()
}

/// Merge facet results, keeping the first row seen for each identity.
/// Rows with neither an id nor a urn cannot be matched and are all kept.
pub fn dedup_staff(staff: impl IntoIterator<Item = Staff>) -> Vec<Staff> {
    let mut seen = HashSet::new();
    staff
        .into_iter()
        .filter(|s| match s.key() {
            Some(key) => seen.insert(key.to_string()),
            None => true,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_fan_out_product() {
        let facets = fan_out(&strings(&["engineer", "sales"]), &strings(&["Berlin", "Austin"]));
        assert_eq!(facets.len(), 4);
        assert_eq!(facets[1].term.as_deref(), Some("engineer"));
        assert_eq!(facets[1].location.as_deref(), Some("Austin"));
    }

    #[test]
    fn test_fan_out_empty_sides() {
        assert_eq!(fan_out(&[], &[]), vec![Facet::default()]);

        let facets = fan_out(&[], &strings(&["Berlin"]));
        assert_eq!(facets.len(), 1);
        assert!(facets[0].term.is_none());
    }

    #[test]
    fn test_fan_out_drops_duplicates() {
        assert_eq!(fan_out(&strings(&["hr", "hr"]), &[]).len(), 1);
    }

    #[test]
    fn test_provenance() {
        assert_eq!(provenance("acme", None, None), "acme");
        assert_eq!(provenance("acme", Some("engineer"), Some("Berlin")), "acme - engineer - Berlin");
        assert_eq!(provenance("acme", Some(""), Some("Berlin")), "acme - Berlin");
    }

    #[test]
    fn test_dedup_keeps_first() {
        let mut hidden = Staff::new("", "LinkedIn Member", "acme");
        hidden.urn = None;
        let merged = dedup_staff(vec![
            Staff::new("A", "Ada", "acme - engineer"),
            Staff::new("B", "Bob", "acme - engineer"),
            Staff::new("A", "Ada", "acme - Berlin"),
            hidden.clone(),
            hidden,
        ]);

        assert_eq!(merged.len(), 4);
        assert_eq!(merged[0].search_term, "acme - engineer");
    }
}
