//! End-to-end tests for abbreviation assignment and catalog construction.
//!
//! Each test exercises: SourceInputs -> assign -> EntityCatalog::build.

use std::collections::BTreeSet;

use emoji_algebra::{assign, AssignPolicy, EntityCatalog, NameEntry, RankingRecord, SkipReason, SourceInputs};
use pretty_assertions::assert_eq;

// ============================================================================
// Helper: inputs where every glyph has a small embedding.
// ============================================================================

fn inputs(names: &[(&str, &str)], ranking: &[&str]) -> SourceInputs {
    let entries = names.iter().map(|(g, n)| NameEntry::new(*g, *n)).collect();
    let ranking: Vec<RankingRecord> = ranking
        .iter()
        .map(|g| RankingRecord { id: format!("{:X}", g.chars().next().unwrap() as u32), char: None })
        .collect();
    let vecs: Vec<(String, Vec<f32>)> = names
        .iter()
        .enumerate()
        .map(|(i, (g, _))| (g.to_string(), vec![0.5 + i as f32, -0.25]))
        .collect();
    SourceInputs::new(entries, &ranking, vecs).unwrap()
}

// ============================================================================
// 1. cat_face and cat do not collide
// ============================================================================

#[test]
fn test_cat_face_and_cat_do_not_collide() {
    let src = inputs(&[("😺", "cat_face"), ("🐈", "cat")], &["🐈", "😺"]);
    let out = assign(&src, &AssignPolicy::default()).unwrap();
    assert_eq!(out.table.abbr_of("cat"), Some("c"));
    assert_eq!(out.table.abbr_of("cat_face"), Some("cf"));

    let reversed = inputs(&[("😺", "cat_face"), ("🐈", "cat")], &["😺", "🐈"]);
    let again = assign(&reversed, &AssignPolicy::default()).unwrap();
    assert_eq!(again.table.abbr_of("cat_face"), Some("cf"));
    assert_eq!(again.table.abbr_of("cat"), Some("c"));
}

// ============================================================================
// 2. Rank order decides contested candidates
// ============================================================================

#[test]
fn test_reversing_rank_order_changes_the_table() {
    let names = [("🐈", "cat"), ("🚕", "cab")];
    let forward = assign(&inputs(&names, &["🐈", "🚕"]), &AssignPolicy::default()).unwrap();
    let backward = assign(&inputs(&names, &["🚕", "🐈"]), &AssignPolicy::default()).unwrap();

    assert_eq!(forward.table.abbr_of("cat"), Some("c"));
    assert_eq!(forward.table.abbr_of("cab"), Some("ca"));
    assert_eq!(backward.table.abbr_of("cab"), Some("c"));
    assert_eq!(backward.table.abbr_of("cat"), Some("ca"));
    assert_ne!(forward.table, backward.table);
}

// ============================================================================
// 3. Skip-set names never reach table or catalog
// ============================================================================

#[test]
fn test_skip_set_entity_is_absent_everywhere() {
    let src = inputs(&[("🈂", "sa"), ("☀", "sunny")], &["🈂", "☀"]);
    let policy = AssignPolicy::emoji();
    let build = EntityCatalog::build(&src, &policy).unwrap();

    assert_eq!(build.assignment.skip_reason("sa"), Some(SkipReason::SkipSet));
    assert_eq!(build.assignment.table.abbr_of("sa"), None);
    assert!(build.catalog.iter().all(|r| r.name() != "sa"));
    assert!(build.catalog.by_glyph("🈂").is_none());
    assert_eq!(build.catalog.len(), 1);
}

// ============================================================================
// 4. Bijection over a realistic name list
// ============================================================================

#[test]
fn test_assignment_is_a_bijection() {
    let names = [
        ("😀", "grinning"),
        ("😂", "joy"),
        ("😍", "heart_eyes"),
        ("😇", "innocent"),
        ("😺", "smiley_cat"),
        ("🐈", "cat"),
        ("🐕", "dog"),
        ("🕐", "clock1"),
        ("🕙", "clock10"),
        ("🕜", "clock130"),
        ("🇫", "flag_fr"),
        ("🌞", "sun_with_face"),
        ("🌝", "full_moon_with_face"),
        ("🌚", "new_moon_with_face"),
    ];
    let glyphs: Vec<&str> = names.iter().map(|(g, _)| *g).collect();
    let out = assign(&inputs(&names, &glyphs), &AssignPolicy::emoji()).unwrap();

    let abbrs: BTreeSet<&str> = out.table.iter().map(|(_, a)| a).collect();
    let named: BTreeSet<&str> = out.table.iter().map(|(n, _)| n).collect();
    assert_eq!(abbrs.len(), out.table.len());
    assert_eq!(named.len(), out.table.len());
    for (name, abbr) in out.table.iter() {
        assert_eq!(out.table.name_of(abbr), Some(name));
    }
    assert_eq!(out.table.abbr_of("clock10"), Some("c10"));
    assert_eq!(out.table.abbr_of("clock130"), Some("c13"));
    assert_eq!(out.table.abbr_of("flag_fr"), Some("flfr"));
}

// ============================================================================
// 5. Entities without embeddings are skipped, not fatal
// ============================================================================

#[test]
fn test_missing_embedding_is_skipped() {
    let entries = vec![NameEntry::new("🐈", "cat"), NameEntry::new("🐕", "dog")];
    let vecs = vec![("🐈".to_string(), vec![1.0, 2.0])];
    let src = SourceInputs::new(entries, &[], vecs).unwrap();
    let build = EntityCatalog::build(&src, &AssignPolicy::default()).unwrap();

    assert_eq!(build.assignment.skip_reason("dog"), Some(SkipReason::MissingEmbedding));
    assert_eq!(build.catalog.len(), 1);
    assert_eq!(build.catalog.get("c").map(|r| r.name()), Some("cat"));
}

// ============================================================================
// 6. Zero components are reported as suspicious
// ============================================================================

#[test]
fn test_zero_component_is_reported() {
    let entries = vec![NameEntry::new("🐈", "cat")];
    let vecs = vec![("🐈".to_string(), vec![0.0, 2.0])];
    let src = SourceInputs::new(entries, &[], vecs).unwrap();
    let build = EntityCatalog::build(&src, &AssignPolicy::default()).unwrap();

    assert_eq!(build.zero_components.len(), 1);
    assert_eq!(build.zero_components[0].name, "cat");
    assert_eq!(build.zero_components[0].index, 0);
    assert_eq!(build.value_range, Some((0.0, 2.0)));
}
