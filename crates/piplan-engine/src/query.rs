//! JQL text for the engine's searches

use piplan_model::FieldSchema;

/// Quote a JQL string literal
#[must_use]
pub fn quote(value: &str) -> String {
    format!("\"{}\"", value.replace('\\', "\\\\").replace('"', "\\\""))
}

/// Every issue owned by a work group
#[must_use]
pub fn hierarchy_query(schema: &FieldSchema, work_group: &str) -> String {
    format!(
        "{} = {} ORDER BY key ASC",
        quote(&schema.work_group_clause),
        quote(work_group)
    )
}

/// Fault reports of a work group in one interval carrying every statistics label
#[must_use]
pub fn listing_query(
    schema: &FieldSchema,
    work_group: &str,
    fix_version: &str,
    labels: &[String],
) -> String {
    let mut jql = format!(
        "type = \"Fault Report\" AND {} = {} AND fixVersion = {}",
        quote(&schema.work_group_clause),
        quote(work_group),
        quote(fix_version)
    );
    for label in labels {
        jql.push_str(" AND labels = ");
        jql.push_str(&quote(label));
    }
    jql
}
