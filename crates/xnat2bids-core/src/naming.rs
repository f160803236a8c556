use crate::archive::NamingRuleRecord;
use crate::catalog::Scan;
use std::collections::HashMap;
use tracing::debug;

/// A validated label → name rule. Wire rows missing either field never
/// become rules.
#[derive(Debug, Clone)]
pub struct NamingRule {
    pub label: String,
    pub name: String,
}

impl NamingRule {
    pub fn from_record(record: NamingRuleRecord) -> Option<NamingRule> {
        match (record.series_description, record.bidsname) {
            (Some(label), Some(name)) => Some(NamingRule { label, name }),
            _ => None,
        }
    }
}

/// The resolved output name for one scan, before the layout prefix is
/// applied.
#[derive(Debug, Clone)]
pub struct NameAssignment {
    pub scan_id: String,
    pub output_name: String,
}

/// Fold project-scope rules, then site-scope rules, into one
/// case-insensitive map. The first occurrence of a (lowercased) label wins,
/// so site entries lose to project entries on conflict and a later
/// duplicate within one scope is ignored.
pub fn build_name_map(
    project_rules: Vec<NamingRule>,
    site_rules: Vec<NamingRule>,
) -> HashMap<String, String> {
    let mut map: HashMap<String, String> = HashMap::new();
    for rule in project_rules.into_iter().chain(site_rules) {
        map.entry(rule.label.to_lowercase()).or_insert(rule.name);
    }
    map
}

/// Resolve a series label through the map. Unmapped labels fall back to
/// their own lowercased form so unmapped series are still exported.
pub fn resolve_name(map: &HashMap<String, String>, label: &str) -> String {
    let key = label.to_lowercase();
    match map.get(&key) {
        Some(name) => {
            debug!("Series '{}' matched naming rule '{}'", label, name);
            name.clone()
        }
        None => {
            debug!("Series '{}' not found in naming map", label);
            key
        }
    }
}

/// Count resolved names occurring more than once. The counter is consumed
/// destructively as collisions are resolved in processing order.
pub fn build_collision_counter(resolved: &[String]) -> HashMap<String, u32> {
    let mut counts: HashMap<String, u32> = HashMap::new();
    for name in resolved {
        *counts.entry(name.clone()).or_insert(0) += 1;
    }
    counts.retain(|_, count| *count > 1);
    counts
}

/// Insert a `run-NN` marker immediately before the final
/// underscore-delimited component of a resolved name.
fn insert_run_marker(name: &str, run: u32) -> String {
    match name.rfind('_') {
        Some(idx) => format!("{}_run-{:02}{}", &name[..idx], run, &name[idx..]),
        None => format!("run-{:02}_{}", run, name),
    }
}

/// Assign each scan its final resolved name. `scans` must already be in
/// processing order (the reversed catalog). The first-processed scan of a
/// colliding name receives the highest run number; once the remaining
/// count reaches 1 the bare name is used. The descending direction is
/// deliberate — it compensates for the catalog reversal.
pub fn assign_names(scans: &[Scan], map: &HashMap<String, String>) -> Vec<NameAssignment> {
    let resolved: Vec<String> = scans
        .iter()
        .map(|scan| resolve_name(map, &scan.label))
        .collect();
    let mut collisions = build_collision_counter(&resolved);

    scans
        .iter()
        .zip(resolved)
        .map(|(scan, name)| {
            let output_name = match collisions.get_mut(&name) {
                Some(remaining) if *remaining > 1 => {
                    let marked = insert_run_marker(&name, *remaining);
                    *remaining -= 1;
                    marked
                }
                _ => name,
            };
            NameAssignment {
                scan_id: scan.id.clone(),
                output_name,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rule(label: &str, name: &str) -> NamingRule {
        NamingRule {
            label: label.to_string(),
            name: name.to_string(),
        }
    }

    fn scan(id: &str, label: &str) -> Scan {
        Scan {
            id: id.to_string(),
            label: label.to_string(),
        }
    }

    #[test]
    fn test_project_rule_wins_on_conflict() {
        let map = build_name_map(vec![rule("x", "A")], vec![rule("x", "B")]);
        assert_eq!(map.get("x"), Some(&"A".to_string()));
    }

    #[test]
    fn test_first_occurrence_wins_within_one_scope() {
        let map = build_name_map(vec![rule("x", "A"), rule("x", "C")], vec![]);
        assert_eq!(map.get("x"), Some(&"A".to_string()));
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let map = build_name_map(vec![rule("REST Scan", "task-rest_bold")], vec![]);
        assert_eq!(resolve_name(&map, "rest scan"), "task-rest_bold");
        assert_eq!(resolve_name(&map, "REST SCAN"), "task-rest_bold");
    }

    #[test]
    fn test_unmapped_label_falls_back_to_lowercase() {
        let map = HashMap::new();
        assert_eq!(resolve_name(&map, "MPRAGE"), "mprage");
    }

    #[test]
    fn test_malformed_records_are_dropped() {
        let record = NamingRuleRecord {
            series_description: Some("x".to_string()),
            bidsname: None,
        };
        assert!(NamingRule::from_record(record).is_none());

        let record = NamingRuleRecord {
            series_description: None,
            bidsname: Some("y".to_string()),
        };
        assert!(NamingRule::from_record(record).is_none());
    }

    #[test]
    fn test_collision_counter_counts_only_multiples() {
        let resolved = vec![
            "task-rest_bold".to_string(),
            "task-rest_bold".to_string(),
            "mprage".to_string(),
        ];
        let counter = build_collision_counter(&resolved);
        assert_eq!(counter.get("task-rest_bold"), Some(&2));
        assert!(!counter.contains_key("mprage"));
    }

    #[test]
    fn test_run_marker_inserted_before_final_component() {
        assert_eq!(insert_run_marker("task-rest_bold", 2), "task-rest_run-02_bold");
        assert_eq!(insert_run_marker("a_b_c", 11), "a_b_run-11_c");
        assert_eq!(insert_run_marker("bold", 3), "run-03_bold");
    }

    #[test]
    fn test_descending_run_numbers_on_collision() {
        let map = build_name_map(vec![rule("rest", "task-rest_bold")], vec![]);
        let scans = vec![scan("1", "rest"), scan("2", "rest"), scan("3", "rest")];
        let assignments = assign_names(&scans, &map);

        let names: Vec<&str> = assignments
            .iter()
            .map(|assignment| assignment.output_name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["task-rest_run-03_bold", "task-rest_run-02_bold", "task-rest_bold"]
        );
    }

    #[test]
    fn test_non_colliding_names_are_unmodified() {
        let map = HashMap::new();
        let scans = vec![scan("1", "MPRAGE"), scan("2", "rest")];
        let assignments = assign_names(&scans, &map);
        assert_eq!(assignments[0].output_name, "mprage");
        assert_eq!(assignments[1].output_name, "rest");
    }

    #[test]
    fn test_fallback_names_participate_in_collision_counting() {
        // Two unmapped scans sharing a label still collide on the
        // lowercased fallback name.
        let map = HashMap::new();
        let scans = vec![scan("1", "Localizer"), scan("2", "Localizer")];
        let assignments = assign_names(&scans, &map);
        assert_eq!(assignments[0].output_name, "run-02_localizer");
        assert_eq!(assignments[1].output_name, "localizer");
    }
}
