use piplan_engine::{AggregationEngine, EngineConfig, EngineError};
use piplan_model::{FieldSchema, RawIssue, StoryDetail, NO_SPRINT};
use piplan_test_utils::{InMemorySource, IssueBuilder, FEATURE_TYPE_ID};
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::Duration;

const WG: &str = "ART - BSW";
const FV: &str = "PI_25w10";

fn engine(source: &Arc<InMemorySource>, config: EngineConfig) -> AggregationEngine {
    AggregationEngine::new(source.clone(), FieldSchema::default(), config)
}

fn keys(items: &[&str]) -> Vec<String> {
    items.iter().map(|k| (*k).to_string()).collect()
}

#[tokio::test]
async fn feature_with_one_story() {
    let source = Arc::new(InMemorySource::new().on_any_query(vec![
        IssueBuilder::feature("FEAT-1").fix_version(FV).build(),
        IssueBuilder::story("STORY-1")
            .epic_link("FEAT-1")
            .story_points(3.0)
            .assignee("Dana Lee")
            .status("In Progress")
            .sprint("com.atlassian.greenhopper.service.sprint.Sprint@9[id=3,name=Sprint 25w10 - Sprint 2,state=ACTIVE]")
            .build(),
    ]));

    let hierarchy = engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();
    let row = hierarchy.row("FEAT-1").unwrap();

    assert_eq!(row.sum_story_points, 3.0);
    assert_eq!(row.sprints.len(), 1);
    assert_eq!(row.sprints["Sprint 2"], keys(&["STORY-1"]));
    assert_eq!(
        row.stories_detail,
        vec![StoryDetail {
            key: "STORY-1".into(),
            story_points: 3.0,
            assignee: "Dana Lee".into(),
            status: "In Progress".into(),
        }]
    );
    assert_eq!(hierarchy.fix_version.as_deref(), Some(FV));
    assert!(!hierarchy.is_incomplete());
    assert!(source.fetched_keys().is_empty());
}

#[tokio::test]
async fn query_is_scoped_to_work_group() {
    let source = Arc::new(InMemorySource::new());
    engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();

    let searches = source.searches();
    assert_eq!(searches.len(), 1);
    assert!(searches[0].jql.contains("\"Leading Work Group\" = \"ART - BSW\""));
    assert!(searches[0].fields.contains(&"customfield_10105".to_string()));
}

#[tokio::test]
async fn epic_link_outranks_relationship_link() {
    let source = Arc::new(InMemorySource::new().on_any_query(vec![
        IssueBuilder::epic("EPIC-1").fix_version(FV).build(),
        IssueBuilder::feature("FEAT-2").fix_version(FV).build(),
        IssueBuilder::story("STORY-1")
            .epic_link("EPIC-1")
            .link("FEAT-2", "Feature")
            .fix_version(FV)
            .story_points(2.0)
            .build(),
    ]));

    let hierarchy = engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();

    assert_eq!(hierarchy.row("EPIC-1").unwrap().sum_story_points, 2.0);
    assert!(hierarchy.row("FEAT-2").unwrap().stories_detail.is_empty());
}

#[tokio::test]
async fn parent_outside_result_set_is_side_loaded() {
    let source = Arc::new(
        InMemorySource::new()
            .on_any_query(vec![
                IssueBuilder::story("STORY-1").epic_link("EPIC-7").fix_version(FV).story_points(5.0).build(),
                IssueBuilder::story("STORY-2").epic_link("EPIC-7").fix_version(FV).story_points(1.0).build(),
                IssueBuilder::story("STORY-3").epic_link("STORY-9").fix_version(FV).build(),
            ])
            .with_issue(IssueBuilder::epic("EPIC-7").summary("Other team's epic").build())
            .with_issue(IssueBuilder::story("STORY-9").build()),
    );

    let hierarchy = engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();
    let row = hierarchy.row("EPIC-7").unwrap();

    assert_eq!(row.summary, "Other team's epic");
    assert_eq!(row.sum_story_points, 6.0);
    assert_eq!(row.sprints[NO_SPRINT], keys(&["STORY-1", "STORY-2"]));
    assert!(hierarchy.row("STORY-9").is_none());
    assert_eq!(hierarchy.unattached, keys(&["STORY-3"]));
    let mut fetched = source.fetched_keys();
    fetched.sort();
    assert_eq!(fetched, keys(&["EPIC-7", "STORY-9"]));
}

#[tokio::test]
async fn failed_side_load_leaves_child_unattached() {
    let source = Arc::new(
        InMemorySource::new()
            .on_any_query(vec![IssueBuilder::story("STORY-1").epic_link("EPIC-7").fix_version(FV).build()])
            .failing_fetch("EPIC-7"),
    );

    let hierarchy = engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();

    assert!(hierarchy.rows.is_empty());
    assert_eq!(hierarchy.unattached, keys(&["STORY-1"]));
}

#[tokio::test]
async fn link_prefers_parent_side_loaded_for_earlier_child() {
    let source = Arc::new(
        InMemorySource::new()
            .on_any_query(vec![
                IssueBuilder::story("STORY-1").epic_link("EPIC-7").fix_version(FV).story_points(1.0).build(),
                IssueBuilder::story("STORY-2")
                    .link("FEAT-X", "Feature")
                    .link("EPIC-7", "Epic")
                    .fix_version(FV)
                    .story_points(5.0)
                    .build(),
            ])
            .with_issue(IssueBuilder::epic("EPIC-7").build())
            .with_issue(IssueBuilder::feature("FEAT-X").build()),
    );

    let hierarchy = engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();
    let row = hierarchy.row("EPIC-7").unwrap();

    assert_eq!(row.sum_story_points, 6.0);
    assert_eq!(
        row.stories_detail.iter().map(|d| d.key.clone()).collect::<Vec<_>>(),
        keys(&["STORY-1", "STORY-2"])
    );
    assert!(hierarchy.row("FEAT-X").is_none());
    assert_eq!(source.fetched_keys(), keys(&["EPIC-7"]));
}

#[tokio::test]
async fn side_loads_keep_request_order_under_concurrency() {
    let stories: Vec<RawIssue> = (0..12)
        .map(|i| {
            IssueBuilder::story(&format!("S-{i}"))
                .epic_link(&format!("EPIC-{i}"))
                .fix_version(FV)
                .build()
        })
        .collect();
    let source = (0..12).fold(InMemorySource::new().on_any_query(stories), |source, i| {
        source.with_issue(IssueBuilder::epic(&format!("EPIC-{i}")).build())
    });
    let source = Arc::new(source.with_delay(Duration::from_millis(5)));

    let config = EngineConfig::default().with_max_concurrent_fetches(4);
    let hierarchy = engine(&source, config).build(WG, FV).await.unwrap();

    let expected: Vec<String> = (0..12).map(|i| format!("EPIC-{i}")).collect();
    assert_eq!(hierarchy.rows.keys().cloned().collect::<Vec<_>>(), expected);
}

#[tokio::test]
async fn duplicate_pages_seed_once() {
    let feature = IssueBuilder::feature("FEAT-1").fix_version(FV).story_points(13.0).build();
    let story = IssueBuilder::story("STORY-1").epic_link("FEAT-1").fix_version(FV).story_points(3.0).build();
    let source = Arc::new(InMemorySource::new().on_any_query(vec![
        feature.clone(),
        story.clone(),
        feature,
        story,
    ]));

    let config = EngineConfig::default().with_page_size(2);
    let hierarchy = engine(&source, config).build(WG, FV).await.unwrap();
    let row = hierarchy.row("FEAT-1").unwrap();

    assert_eq!(hierarchy.rows.len(), 1);
    assert_eq!(row.story_points, 13.0);
    assert_eq!(row.sum_story_points, 3.0);
    assert_eq!(row.stories_detail.len(), 1);
    assert_eq!(source.search_count(), 2);
}

#[tokio::test]
async fn hard_cap_sets_truncated() {
    let issues: Vec<RawIssue> = (0..30)
        .map(|i| IssueBuilder::feature(&format!("FEAT-{i}")).fix_version(FV).build())
        .collect();
    let source = Arc::new(InMemorySource::new().on_any_query(issues));

    let config = EngineConfig::default().with_page_size(10).with_hard_cap(25);
    let hierarchy = engine(&source, config).build(WG, FV).await.unwrap();

    assert!(hierarchy.truncated);
    assert_eq!(hierarchy.rows.len(), 25);
}

#[tokio::test]
async fn failed_page_yields_partial_view() {
    let issues: Vec<RawIssue> = (0..15)
        .map(|i| IssueBuilder::feature(&format!("FEAT-{i}")).fix_version(FV).build())
        .collect();
    let source = Arc::new(InMemorySource::new().on_any_query(issues).failing_page(10));

    let config = EngineConfig::default().with_page_size(10);
    let hierarchy = engine(&source, config).build(WG, FV).await.unwrap();

    assert!(hierarchy.partial);
    assert!(!hierarchy.truncated);
    assert_eq!(hierarchy.rows.len(), 10);
}

#[tokio::test]
async fn capability_summaries_are_fetched_once_per_key() {
    let source = Arc::new(
        InMemorySource::new()
            .on_any_query(vec![
                IssueBuilder::feature("FEAT-1").fix_version(FV).capability_link("CAP-1").build(),
                IssueBuilder::feature("FEAT-2").fix_version(FV).capability_link("CAP-1").build(),
                IssueBuilder::feature("FEAT-3").fix_version(FV).capability_link("CAP-404").build(),
            ])
            .with_issue(IssueBuilder::capability("CAP-1").summary("Secure boot").build()),
    );

    let hierarchy = engine(&source, EngineConfig::default()).build(WG, FV).await.unwrap();

    assert_eq!(hierarchy.row("FEAT-1").unwrap().parent_summary.as_deref(), Some("Secure boot"));
    assert_eq!(hierarchy.row("FEAT-2").unwrap().parent_summary.as_deref(), Some("Secure boot"));
    assert_eq!(hierarchy.row("FEAT-3").unwrap().parent_summary, None);
    let mut fetched = source.fetched_keys();
    fetched.sort();
    assert_eq!(fetched, keys(&["CAP-1", "CAP-404"]));
}

#[tokio::test]
async fn backlog_spans_intervals() {
    let source = Arc::new(InMemorySource::new().on_any_query(vec![
        IssueBuilder::feature("FEAT-1").fix_version("PI_25w10").build(),
        IssueBuilder::epic("EPIC-2").build(),
        IssueBuilder::story("S-1").epic_link("EPIC-2").sprint_named("PI25w23 Sprint 4").story_points(2.0).build(),
    ]));

    let hierarchy = engine(&source, EngineConfig::default()).build_backlog(WG).await.unwrap();

    assert_eq!(hierarchy.fix_version, None);
    assert_eq!(hierarchy.rows.keys().cloned().collect::<Vec<_>>(), keys(&["FEAT-1", "EPIC-2"]));
    assert_eq!(hierarchy.row("EPIC-2").unwrap().sprints["Sprint 4"], keys(&["S-1"]));
}

#[tokio::test]
async fn blank_arguments_are_rejected_without_backend_calls() {
    let source = Arc::new(InMemorySource::new());
    let engine = engine(&source, EngineConfig::default());

    assert_eq!(engine.build(" ", FV).await.unwrap_err(), EngineError::InvalidInput("work_group"));
    assert_eq!(engine.build(WG, "").await.unwrap_err(), EngineError::InvalidInput("fix_version"));
    assert_eq!(engine.build_backlog("").await.unwrap_err(), EngineError::InvalidInput("work_group"));
    assert_eq!(source.search_count(), 0);
}

#[tokio::test(start_paused = true)]
async fn deadline_cancels_slow_backend() {
    let source = Arc::new(
        InMemorySource::new()
            .on_any_query(vec![IssueBuilder::feature("FEAT-1").fix_version(FV).build()])
            .with_delay(Duration::from_secs(30)),
    );
    let config = EngineConfig::default().with_call_timeout(Duration::from_secs(1));

    let err = engine(&source, config).build(WG, FV).await.unwrap_err();
    assert_eq!(err, EngineError::Timeout(Duration::from_secs(1)));
}

#[tokio::test]
async fn statistics_count_label_classes() {
    let source = Arc::new(InMemorySource::new().on_query(
        "Fault Report",
        vec![
            IssueBuilder::fault_report("FR-1")
                .labels(&["BuildIssue", "Internal_Dev", "buildissue_sw_core", "timing"])
                .link_with_type_id("FEAT-1", "Feature", FEATURE_TYPE_ID)
                .link_with_type_id("STORY-1", "Story", "10001")
                .build(),
            IssueBuilder::fault_report("FR-2")
                .labels(&["BuildIssue", "Internla_Dev", "buildissue_sw_tools"])
                .build(),
        ],
    ));
    let config = EngineConfig::default().with_browse_url("https://tracker.example/browse/");
    let engine = engine(&source, config);

    let issues = engine.list_issues(WG, FV).await.unwrap();
    assert_eq!(issues[0].classes, keys(&["buildissue_sw", "timing"]));
    assert_eq!(issues[0].linked_features, keys(&["https://tracker.example/browse/FEAT-1"]));

    let stats = engine.get_statistics(WG, FV).await.unwrap();
    assert_eq!(stats.get("buildissue_sw"), Some(&2));
    assert_eq!(stats.get("timing"), Some(&1));
    for excluded in ["buildissue", "internal_dev", "internla_dev"] {
        assert!(!stats.contains_key(excluded));
    }

    let jql = &source.searches()[0].jql;
    assert!(jql.starts_with("type = \"Fault Report\""));
    assert!(jql.contains("fixVersion = \"PI_25w10\""));
    assert!(jql.contains("labels = \"BuildIssue\" AND labels = \"Internal_Dev\""));
}
