use std::path::Path;

use predicates::prelude::*;

mod scrape_stub;

use scrape_stub::{ScrapeStub, TITLE_LINK};

fn shelf_cmd(store: &Path, stub: &ScrapeStub) -> assert_cmd::Command {
    let mut cmd = assert_cmd::cargo::cargo_bin_cmd!("manhuwa-shelf");
    cmd.env_remove("MANHUWA_SHELF_STORE")
        .env_remove("MANHUWA_SHELF_API_URL")
        .args(["--store", store.to_str().unwrap(), "--api-url", &stub.base_url]);
    cmd
}

#[test]
fn register_search_bookmark_and_read() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let stub = ScrapeStub::spawn();

    shelf_cmd(&store, &stub)
        .args(["site", "add", "--url", "https://example.com"])
        .assert()
        .success()
        .stdout("added site 0: Example (https://example.com)\n");

    shelf_cmd(&store, &stub)
        .args(["title", "search", "--name", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!(
            "  Foo\t{TITLE_LINK}\thttps://x/1.jpg"
        )));

    shelf_cmd(&store, &stub)
        .args([
            "title",
            "add",
            "--link",
            TITLE_LINK,
            "--name",
            "Foo",
            "--src",
            "https://x/1.jpg",
            "--source-site",
            "Example",
        ])
        .assert()
        .success()
        .stdout("added \"Foo\"\n");

    shelf_cmd(&store, &stub)
        .args(["title", "add", "--link", TITLE_LINK, "--name", "Foo"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("\"Foo\" is already added"));

    shelf_cmd(&store, &stub)
        .args(["title", "search", "--name", "foo"])
        .assert()
        .success()
        .stdout(predicate::str::contains(format!("* Foo\t{TITLE_LINK}")));

    shelf_cmd(&store, &stub)
        .args(["chapter", "list", "--link", TITLE_LINK])
        .assert()
        .success()
        .stdout(format!(
            "0\tChapter 2\t{TITLE_LINK}/c2\n1\tChapter 1\t{TITLE_LINK}/c1\n"
        ));

    // Cached now; listing again must not hit the api.
    shelf_cmd(&store, &stub)
        .args(["chapter", "list", "--link", TITLE_LINK])
        .assert()
        .success();
    assert_eq!(stub.count("/api/chapter-links"), 1);

    shelf_cmd(&store, &stub)
        .args(["chapter", "select", "--link", TITLE_LINK, "--text", "chapter 1"])
        .assert()
        .success()
        .stdout(format!("selected Chapter 1 ({TITLE_LINK}/c1)\n"));

    shelf_cmd(&store, &stub)
        .args(["read", "--link", TITLE_LINK])
        .assert()
        .success()
        .stdout(format!(
            "Foo / Chapter 1\nurl: {TITLE_LINK}/c1\nposition: 2/2 (chapter-1)\nhttps://img.example/1-1.jpg\nhttps://img.example/1-2.jpg\n"
        ));

    shelf_cmd(&store, &stub)
        .args(["read", "--link", TITLE_LINK])
        .assert()
        .success();
    assert_eq!(stub.count("/api/images"), 1);

    shelf_cmd(&store, &stub)
        .args(["read", "--link", TITLE_LINK, "--go", "previous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("already at the first chapter"));

    shelf_cmd(&store, &stub)
        .args(["read", "--link", TITLE_LINK, "--go", "next"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Foo / Chapter 2\n"))
        .stdout(predicate::str::contains("https://img.example/2-1.jpg"));

    shelf_cmd(&store, &stub)
        .args(["title", "remove", "--link", TITLE_LINK])
        .assert()
        .success()
        .stdout(format!("removed {TITLE_LINK} (2 image caches)\n"));

    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&store)?)?;
    let keys: Vec<&str> = document
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(keys, vec!["manhuwas", "selectedChapter", "sites"]);

    Ok(())
}

#[test]
fn site_add_rejects_invalid_url_and_reports_network_errors() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let stub = ScrapeStub::spawn();

    shelf_cmd(&store, &stub)
        .args(["site", "add", "--url", "example dot com"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("invalid site url"));

    shelf_cmd(&store, &stub)
        .args(["site", "add", "--url", "https://down.example"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("500"));

    assert!(stub.requests().iter().all(|r| !r.contains("example dot com")));

    shelf_cmd(&store, &stub)
        .args(["site", "list"])
        .assert()
        .success()
        .stdout("");
    Ok(())
}

#[test]
fn site_ids_are_not_reused_below_the_max() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let stub = ScrapeStub::spawn();

    for url in ["https://a.example", "https://b.example", "https://c.example"] {
        shelf_cmd(&store, &stub)
            .args(["site", "add", "--url", url])
            .assert()
            .success();
    }
    shelf_cmd(&store, &stub)
        .args(["site", "remove", "--id", "1"])
        .assert()
        .success()
        .stdout("removed site 1\n");
    shelf_cmd(&store, &stub)
        .args(["site", "add", "--url", "https://d.example"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("added site 3:"));

    shelf_cmd(&store, &stub)
        .args(["site", "list"])
        .assert()
        .success()
        .stdout(predicate::str::contains("0\tExample\thttps://a.example"))
        .stdout(predicate::str::contains("1\t").not())
        .stdout(predicate::str::contains("3\tExample\thttps://d.example"));
    Ok(())
}

#[test]
fn read_without_images_hints_at_login_or_reports_error() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let backup = temp.path().join("backup.json");
    let stub = ScrapeStub::spawn();
    let other = "https://example.com/t/2";

    std::fs::write(
        &backup,
        serde_json::json!({
            "manhuwas": [{ "link": other, "name": "Bar", "src": "", "sourceSite": "Example" }],
            "chapters_https%3A%2F%2Fexample.com%2Ft%2F2": [
                { "href": format!("{other}/empty"), "text": "Chapter 4" },
                { "href": format!("{other}/c3"), "text": "Chapter 3" },
            ],
        })
        .to_string(),
    )?;
    shelf_cmd(&store, &stub)
        .args(["store", "import", "--input", backup.to_str().unwrap()])
        .assert()
        .success();

    shelf_cmd(&store, &stub)
        .args(["read", "--link", other])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no chapter selected"));

    shelf_cmd(&store, &stub)
        .args(["chapter", "select", "--link", other, "--text", "Chapter 4"])
        .assert()
        .success();
    shelf_cmd(&store, &stub)
        .args(["read", "--link", other])
        .assert()
        .success()
        .stdout(predicate::str::contains("may require you to be logged in"));

    shelf_cmd(&store, &stub)
        .args(["read", "--link", other, "--go", "previous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("images not found"));
    Ok(())
}

#[test]
fn chapter_list_for_unknown_source_is_empty() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let stub = ScrapeStub::spawn();
    let other = "https://example.com/t/2";

    shelf_cmd(&store, &stub)
        .args(["title", "add", "--link", other, "--name", "Bar"])
        .assert()
        .success();
    // The stub reports failure for chapter links of unknown titles.
    shelf_cmd(&store, &stub)
        .args(["chapter", "list", "--link", other])
        .assert()
        .success()
        .stdout("no chapters available\n");

    shelf_cmd(&store, &stub)
        .args(["chapter", "list", "--link", "https://example.com/t/9"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not bookmarked"));
    Ok(())
}

#[test]
fn title_search_can_bookmark_a_result() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let stub = ScrapeStub::spawn();

    shelf_cmd(&store, &stub)
        .args(["site", "add", "--url", "https://example.com"])
        .assert()
        .success();

    shelf_cmd(&store, &stub)
        .args(["title", "search", "--name", "foo", "--add", TITLE_LINK])
        .assert()
        .success()
        .stdout(predicate::str::ends_with("added \"Foo\"\n"));

    shelf_cmd(&store, &stub)
        .args(["title", "list"])
        .assert()
        .success()
        .stdout(format!("Foo\t{TITLE_LINK}\tExample\n"));

    shelf_cmd(&store, &stub)
        .args(["title", "search", "--name", "foo", "--add", TITLE_LINK])
        .assert()
        .failure()
        .stdout(predicate::str::contains(format!("* Foo\t{TITLE_LINK}")))
        .stderr(predicate::str::contains("\"Foo\" is already added"));

    shelf_cmd(&store, &stub)
        .args([
            "title",
            "search",
            "--name",
            "foo",
            "--add",
            "https://example.com/t/9",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("no search result with link"));

    shelf_cmd(&store, &stub)
        .args(["title", "list"])
        .assert()
        .success()
        .stdout(format!("Foo\t{TITLE_LINK}\tExample\n"));
    Ok(())
}

#[test]
fn read_rejects_a_chapter_selected_in_another_title() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let backup = temp.path().join("backup.json");
    let stub = ScrapeStub::spawn();
    let other = "https://example.com/t/2";

    std::fs::write(
        &backup,
        serde_json::json!({
            "manhuwas": [
                { "link": TITLE_LINK, "name": "Foo", "src": "", "sourceSite": "Example" },
                { "link": other, "name": "Bar", "src": "", "sourceSite": "Example" },
            ],
            "chapters_https%3A%2F%2Fexample.com%2Ft%2F1": [
                { "href": format!("{TITLE_LINK}/c1"), "text": "Chapter 1" },
            ],
            "chapters_https%3A%2F%2Fexample.com%2Ft%2F2": [
                { "href": format!("{other}/c2"), "text": "Chapter 2" },
                { "href": format!("{other}/c1"), "text": "Chapter 1" },
            ],
        })
        .to_string(),
    )?;
    shelf_cmd(&store, &stub)
        .args(["store", "import", "--input", backup.to_str().unwrap()])
        .assert()
        .success();
    shelf_cmd(&store, &stub)
        .args(["chapter", "select", "--link", TITLE_LINK, "--text", "Chapter 1"])
        .assert()
        .success();

    shelf_cmd(&store, &stub)
        .args(["read", "--link", other])
        .assert()
        .failure()
        .stdout("")
        .stderr(predicate::str::contains(format!(
            "selected chapter does not belong to {other}"
        )));
    shelf_cmd(&store, &stub)
        .args(["read", "--link", other, "--go", "previous"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("does not belong to"))
        .stderr(predicate::str::contains("already at").not());
    assert_eq!(stub.count("/api/images"), 0);

    shelf_cmd(&store, &stub)
        .args(["read", "--link", TITLE_LINK])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Foo / Chapter 1\n"));
    Ok(())
}

#[test]
fn chapter_remove_drops_one_chapter_of_a_bookmarked_title() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let stub = ScrapeStub::spawn();
    let unknown = "https://example.com/t/9";

    shelf_cmd(&store, &stub)
        .args(["title", "add", "--link", TITLE_LINK, "--name", "Foo"])
        .assert()
        .success();
    shelf_cmd(&store, &stub)
        .args(["chapter", "list", "--link", TITLE_LINK])
        .assert()
        .success();

    let c1 = format!("{TITLE_LINK}/c1");
    shelf_cmd(&store, &stub)
        .args(["chapter", "remove", "--link", TITLE_LINK, "--href", &c1])
        .assert()
        .success()
        .stdout(format!("removed chapter {c1}\n"));
    shelf_cmd(&store, &stub)
        .args(["chapter", "list", "--link", TITLE_LINK])
        .assert()
        .success()
        .stdout(format!("0\tChapter 2\t{TITLE_LINK}/c2\n"));

    shelf_cmd(&store, &stub)
        .args(["chapter", "remove", "--link", TITLE_LINK, "--href", &c1])
        .assert()
        .failure()
        .stderr(predicate::str::contains("chapter not found"));
    shelf_cmd(&store, &stub)
        .args(["chapter", "remove", "--link", unknown, "--href", &c1])
        .assert()
        .failure()
        .stderr(predicate::str::contains("not bookmarked"));

    let document: serde_json::Value = serde_json::from_str(&std::fs::read_to_string(&store)?)?;
    let keys: Vec<&str> = document
        .as_object()
        .unwrap()
        .keys()
        .map(String::as_str)
        .collect();
    assert_eq!(
        keys,
        vec!["chapters_https%3A%2F%2Fexample.com%2Ft%2F1", "manhuwas"]
    );
    Ok(())
}

#[test]
fn store_export_import_round_trip() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let store = temp.path().join("store.json");
    let restored = temp.path().join("restored.json");
    let backup = temp.path().join("backup.json");
    let stub = ScrapeStub::spawn();

    shelf_cmd(&store, &stub)
        .args(["title", "add", "--link", TITLE_LINK, "--name", "Foo"])
        .assert()
        .success();
    shelf_cmd(&store, &stub)
        .args(["store", "export", "--out", backup.to_str().unwrap()])
        .assert()
        .success();
    shelf_cmd(&store, &stub)
        .args(["store", "export", "--out", backup.to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("open export output"));

    shelf_cmd(&restored, &stub)
        .args(["site", "add", "--url", "https://a.example"])
        .assert()
        .success();
    shelf_cmd(&restored, &stub)
        .args(["store", "import", "--input", backup.to_str().unwrap()])
        .assert()
        .success()
        .stdout("imported 1 entries (0 failed)\n");

    shelf_cmd(&restored, &stub)
        .args(["title", "list"])
        .assert()
        .success()
        .stdout(format!("Foo\t{TITLE_LINK}\t\n"));
    shelf_cmd(&restored, &stub)
        .args(["site", "list"])
        .assert()
        .success()
        .stdout("");

    shelf_cmd(&restored, &stub)
        .args(["store", "list"])
        .assert()
        .success()
        .stdout(predicate::str::starts_with("manhuwas\ttitles\t"));
    shelf_cmd(&restored, &stub)
        .args(["store", "remove", "--key", "manhuwas"])
        .assert()
        .success()
        .stdout("removed manhuwas\n");
    shelf_cmd(&restored, &stub)
        .args(["store", "list"])
        .assert()
        .success()
        .stdout("store is empty\n");
    Ok(())
}

#[test]
fn rust_log_debug_emits_debug_line_to_stderr() -> anyhow::Result<()> {
    let temp = tempfile::TempDir::new()?;
    let stub = ScrapeStub::spawn();
    shelf_cmd(&temp.path().join("store.json"), &stub)
        .env("RUST_LOG", "debug")
        .args(["site", "list"])
        .assert()
        .success()
        .stderr(predicate::str::contains("parsed cli"));
    Ok(())
}
