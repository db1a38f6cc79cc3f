//! End-to-end builds of the checked-in fixture site.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tabula::generate::generate;
use tabula::scan::{ScanError, scan};
use tabula::verify::{ProblemKind, verify};
use tempfile::TempDir;
use walkdir::WalkDir;

fn fixture_copy() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/content");
    for entry in WalkDir::new(&fixtures) {
        let entry = entry.unwrap();
        let dest = tmp.path().join("content").join(entry.path().strip_prefix(&fixtures).unwrap());
        if entry.file_type().is_dir() {
            fs::create_dir_all(&dest).unwrap();
        } else {
            fs::copy(entry.path(), &dest).unwrap();
        }
    }
    tmp
}

fn content(tmp: &TempDir) -> PathBuf {
    tmp.path().join("content")
}

fn build(tmp: &TempDir, out: &str) -> PathBuf {
    let manifest = scan(&content(tmp)).unwrap();
    let output = tmp.path().join(out);
    generate(&manifest, &output).unwrap();
    output
}

fn read(output: &Path, rel: &str) -> String {
    fs::read_to_string(output.join(rel)).unwrap_or_else(|e| panic!("{rel}: {e}"))
}

/// Every file in `root` keyed by its relative path.
fn snapshot(root: &Path) -> BTreeMap<String, Vec<u8>> {
    WalkDir::new(root)
        .into_iter()
        .map(|e| e.unwrap())
        .filter(|e| e.file_type().is_file())
        .map(|e| {
            let rel = e.path().strip_prefix(root).unwrap().to_string_lossy().into_owned();
            (rel, fs::read(e.path()).unwrap())
        })
        .collect()
}

fn all_html(output: &Path) -> String {
    snapshot(output)
        .into_iter()
        .filter(|(rel, _)| rel.ends_with(".html"))
        .map(|(_, bytes)| String::from_utf8(bytes).unwrap())
        .collect()
}

#[test]
fn fixture_site_has_no_broken_links() {
    let tmp = fixture_copy();
    let manifest = scan(&content(&tmp)).unwrap();
    let output = tmp.path().join("site");
    generate(&manifest, &output).unwrap();

    let report = verify(&output, &manifest.config.forbidden_link_targets).unwrap();
    assert!(report.is_clean(), "problems: {:#?}", report.problems);
    assert_eq!(report.documents, 11);
}

#[test]
fn building_twice_is_byte_identical() {
    let tmp = fixture_copy();
    let first = snapshot(&build(&tmp, "site-a"));
    let second = snapshot(&build(&tmp, "site-b"));
    assert_eq!(
        first.keys().collect::<Vec<_>>(),
        second.keys().collect::<Vec<_>>()
    );
    assert!(first == second, "builds differ");
}

#[test]
fn rebuilding_into_same_output_is_identical() {
    let tmp = fixture_copy();
    let first = snapshot(&build(&tmp, "site"));
    let second = snapshot(&build(&tmp, "site"));
    assert!(first == second);
}

#[test]
fn drafts_never_reach_the_output() {
    let tmp = fixture_copy();
    let output = build(&tmp, "site");
    assert!(!output.join("secret").exists());
    let html = all_html(&output);
    assert!(!html.contains("Unfinished history"));
    assert!(!html.contains("Hidden plans"));
    assert!(!html.contains(">Secret<"));
}

#[test]
fn table_post_shadows_legacy_file() {
    let tmp = fixture_copy();
    let output = build(&tmp, "site");
    let post = read(&output, "blog/first-light/index.html");
    assert!(post.contains("First Light"));
    assert!(post.contains("2024-03-01"));
    assert!(post.contains("replicated on the new substrate"));
    assert!(!post.contains("Old first light"));

    let blog = read(&output, "blog/index.html");
    let newest = blog.find("First Light").unwrap();
    let older = blog.find("Field notes").unwrap();
    assert!(newest < older, "posts are listed newest first");
    assert!(!blog.contains("Missing Post"));
}

#[test]
fn incomplete_digests_are_dropped() {
    let tmp = fixture_copy();
    let output = build(&tmp, "site");
    let issue = read(&output, "digest/2024-05/index.html");
    assert!(issue.contains("May Issue"));
    assert!(issue.contains("2024-05-01"));
    assert!(issue.contains("<h2>Highlights</h2>") || issue.contains("<h3>Highlights</h3>"));
    assert!(output.join("digest/2024-03/index.html").is_file());
    assert!(!output.join("digest/2024-04").exists());
}

#[test]
fn root_shows_welcome_hero_before_research() {
    let tmp = fixture_copy();
    let output = build(&tmp, "site");
    let home = read(&output, "index.html");
    let welcome = home.find("<h1>Welcome</h1>").expect("hero heading");
    let research = home.find("<h2>Research</h2>").expect("research section");
    assert!(welcome < research);
    assert!(home.contains(r#"<a class="active" href="./">Home</a>"#));
    assert!(home.contains(r#"<a href="research/">Research</a>"#));
    assert!(home.contains("Latest digests"), "show_digest_home keeps the digest list");
}

#[test]
fn unknown_layout_variant_builds_standard() {
    let tmp = fixture_copy();
    let site_json = content(&tmp).join("site.json");
    let mut config: serde_json::Value = serde_json::from_str(&fs::read_to_string(&site_json).unwrap()).unwrap();
    config["layout_variant"] = "galaxy".into();
    fs::write(&site_json, config.to_string()).unwrap();

    let output = build(&tmp, "site");
    let home = read(&output, "index.html");
    assert!(home.contains("hero-inner"));
    assert!(home.contains(r#"id="overview""#));
    assert!(!home.contains("mescia-landing"));
    assert!(!output.join("assets/js/landing.js").exists());
}

#[test]
fn landing_variant_builds_without_broken_links() {
    let tmp = fixture_copy();
    let site_json = content(&tmp).join("site.json");
    let mut config: serde_json::Value = serde_json::from_str(&fs::read_to_string(&site_json).unwrap()).unwrap();
    config["layout_variant"] = "mescia_landing".into();
    fs::write(&site_json, config.to_string()).unwrap();

    let output = build(&tmp, "site");
    assert!(read(&output, "index.html").contains("mescia-canvas"));
    let report = verify(&output, &[]).unwrap();
    assert!(report.is_clean(), "problems: {:#?}", report.problems);
}

#[test]
fn forbidden_target_is_reported() {
    let tmp = fixture_copy();
    let links = content(&tmp).join("links.csv");
    let mut table = fs::read_to_string(&links).unwrap();
    table.push_str("Helpdesk,https://helpdesk.example.invalid/new,,30\n");
    fs::write(&links, table).unwrap();

    let manifest = scan(&content(&tmp)).unwrap();
    let output = tmp.path().join("site");
    generate(&manifest, &output).unwrap();
    let report = verify(&output, &manifest.config.forbidden_link_targets).unwrap();

    assert!(!report.is_clean());
    assert!(report.problems.iter().all(|p| matches!(
        &p.kind,
        ProblemKind::Forbidden(target) if target == "helpdesk.example.invalid"
    )));
}

#[test]
fn escaping_block_aborts_before_output() {
    let tmp = fixture_copy();
    let control = content(&tmp).join("control.csv");
    let mut table = fs::read_to_string(&control).unwrap();
    table.push_str("about,section,live,Leak,99,,../../outside.md,,,,,\n");
    fs::write(&control, table).unwrap();

    let err = scan(&content(&tmp)).unwrap_err();
    assert!(matches!(err, ScanError::Block(_)));
    assert!(!tmp.path().join("site").exists());
}

#[test]
fn escaping_page_slug_aborts_before_output() {
    let tmp = fixture_copy();
    let control = content(&tmp).join("control.csv");
    let mut table = fs::read_to_string(&control).unwrap();
    table.push_str("../../pwned,section,live,X,1,,,,,,,\n");
    fs::write(&control, table).unwrap();

    let err = scan(&content(&tmp)).unwrap_err();
    assert!(matches!(err, ScanError::InvalidSlug { ref slug, .. } if slug == "../../pwned"));
    assert!(!tmp.path().join("site").exists());
    assert!(!tmp.path().join("pwned").exists());
}
