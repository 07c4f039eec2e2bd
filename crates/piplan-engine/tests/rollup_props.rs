use piplan_engine::{HierarchyBuilder, Scope};
use piplan_model::{FieldSchema, RawIssue, NO_SPRINT};
use piplan_test_utils::IssueBuilder;
use proptest::prelude::*;

const FV: &str = "PI_25w10";

#[derive(Debug, Clone)]
struct ChildSpec {
    parent: usize,
    points: Option<u8>,
    declares_fv: bool,
    sprints: Vec<(bool, u8)>,
    via_link: bool,
}

fn child_spec() -> impl Strategy<Value = ChildSpec> {
    (
        0..6usize,
        proptest::option::of(0u8..21),
        any::<bool>(),
        prop::collection::vec((any::<bool>(), 0u8..8), 0..4),
        any::<bool>(),
    )
        .prop_map(|(parent, points, declares_fv, sprints, via_link)| ChildSpec {
            parent,
            points,
            declares_fv,
            sprints,
            via_link,
        })
}

fn issues(parents: usize, children: &[ChildSpec]) -> Vec<RawIssue> {
    let mut issues: Vec<RawIssue> = (0..parents)
        .map(|i| IssueBuilder::feature(&format!("FEAT-{i}")).fix_version(FV).build())
        .collect();

    for (i, spec) in children.iter().enumerate() {
        let parent = format!("FEAT-{}", spec.parent);
        let mut child = IssueBuilder::story(&format!("STORY-{i}"));
        child = if spec.via_link {
            child.link(&parent, "Feature")
        } else {
            child.epic_link(&parent)
        };
        if let Some(points) = spec.points {
            child = child.story_points(f64::from(points));
        }
        if spec.declares_fv {
            child = child.fix_version(FV);
        }
        for (in_pi, number) in &spec.sprints {
            let pi = if *in_pi { "25w10" } else { "25w23" };
            child = child.sprint_named(&format!("PI{pi} Sprint {number}"));
        }
        issues.push(child.build());
    }
    issues
}

fn assemble(schema: &FieldSchema, scope: Scope, issues: &[RawIssue]) -> piplan_engine::Hierarchy {
    let mut builder = HierarchyBuilder::new(schema, scope);
    builder.seed_all(issues);
    builder.plan_children(issues);
    while !builder.resolve_round().is_empty() {}
    builder.attach_pending();
    builder.recanonicalize();
    builder.finish(false, false)
}

proptest! {
    #[test]
    fn sum_equals_detail_points(
        parents in 1..6usize,
        children in prop::collection::vec(child_spec(), 0..24),
    ) {
        let schema = FieldSchema::default();
        let hierarchy = assemble(&schema, Scope::interval(FV), &issues(parents, &children));

        for row in hierarchy.rows.values() {
            let detail: f64 = row.stories_detail.iter().map(|d| d.story_points).sum();
            prop_assert!((row.sum_story_points - detail).abs() < 1e-9);
        }
    }

    #[test]
    fn every_attached_child_is_bucketed_once_per_bucket(
        parents in 1..6usize,
        children in prop::collection::vec(child_spec(), 0..24),
    ) {
        let schema = FieldSchema::default();
        let hierarchy = assemble(&schema, Scope::interval(FV), &issues(parents, &children));

        for row in hierarchy.rows.values() {
            for detail in &row.stories_detail {
                let hits = row.sprints.values().filter(|keys| keys.contains(&detail.key)).count();
                prop_assert!(hits >= 1);
                let in_no_sprint = row.sprints.get(NO_SPRINT).is_some_and(|k| k.contains(&detail.key));
                prop_assert!(!in_no_sprint || hits == 1);
            }
            for keys in row.sprints.values() {
                let mut sorted = keys.clone();
                sorted.sort();
                sorted.dedup();
                prop_assert_eq!(sorted.len(), keys.len());
            }
        }
    }

    #[test]
    fn children_are_attached_at_most_once(
        parents in 1..6usize,
        children in prop::collection::vec(child_spec(), 0..24),
    ) {
        let schema = FieldSchema::default();
        let hierarchy = assemble(&schema, Scope::AllIntervals, &issues(parents, &children));

        let attached: usize = hierarchy.rows.values().map(|r| r.stories_detail.len()).sum();
        prop_assert_eq!(attached + hierarchy.unattached.len(), children.len());
    }

    #[test]
    fn only_interval_sprints_become_buckets(
        parents in 1..6usize,
        children in prop::collection::vec(child_spec(), 0..24),
    ) {
        let schema = FieldSchema::default();
        let specs = children.clone();
        let hierarchy = assemble(&schema, Scope::interval(FV), &issues(parents, &children));

        for row in hierarchy.rows.values() {
            for (label, keys) in &row.sprints {
                if label == NO_SPRINT {
                    continue;
                }
                for key in keys {
                    let index: usize = key.trim_start_matches("STORY-").parse().unwrap();
                    let expected = specs[index]
                        .sprints
                        .iter()
                        .any(|(in_pi, n)| *in_pi && label == &format!("Sprint {n}"));
                    prop_assert!(expected, "{key} misplaced in {label}");
                }
            }
        }
    }
}
