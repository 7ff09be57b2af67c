//! End-to-end tests for the conversion pipeline.
//!
//! Each test writes its appcast into its own temp directory and serves
//! release notes from a wiremock server.

use std::path::PathBuf;

use pretty_assertions::assert_eq;
use serde_json::Value;
use sparkle_json::content::FailurePolicy;
use sparkle_json::feed::ReleaseItem;
use sparkle_json::{convert, FailureKind, Settings};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn test_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("sparkle_json_it_{}", name));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

fn appcast(items: &str) -> String {
    format!(
        r#"<?xml version="1.0" encoding="utf-8"?>
<rss version="2.0" xmlns:sparkle="http://www.andymatuschak.org/xml-namespaces/sparkle">
  <channel>
    <title>Mercury</title>
{}
  </channel>
</rss>"#,
        items
    )
}

fn item_xml(title: &str, short_version: &str, description: &str, link: &str) -> String {
    let link = if link.is_empty() {
        String::new()
    } else {
        format!("<sparkle:releaseNotesLink>{}</sparkle:releaseNotesLink>", link)
    };
    format!(
        r#"    <item>
      <title>{title}</title>
      <sparkle:version>{short_version}00</sparkle:version>
      <sparkle:shortVersionString>{short_version}</sparkle:shortVersionString>
      <description><![CDATA[{description}]]></description>
      <enclosure url="https://example.com/{title}.zip" length="10" type="application/octet-stream" sparkle:edSignature="sig"/>
      {link}
    </item>"#
    )
}

fn read_output(settings: &Settings) -> Vec<ReleaseItem> {
    let bytes = std::fs::read(&settings.output).expect("output written");
    serde_json::from_slice(&bytes).expect("output is a JSON item array")
}

#[tokio::test]
async fn test_convert_sorts_and_enriches() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/2"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<p>Two</p>"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/10b"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&server)
        .await;

    let dir = test_dir("sorts_and_enriches");
    let feed_path = dir.join("appcast.xml");
    let items = [
        item_xml("ten-a", "10", "", ""),
        item_xml("two", "2", "", &format!("{}/notes/2", server.uri())),
        item_xml("letters", "abc", "", ""),
        item_xml(
            "ten-b",
            "10",
            "inline",
            &format!("{}/notes/10b", server.uri()),
        ),
    ]
    .join("\n");
    std::fs::write(&feed_path, appcast(&items)).unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("mercury.json");

    let summary = convert(&settings).await.unwrap();
    assert_eq!(summary.feed_title, "Mercury");
    assert_eq!(summary.items, 4);
    assert_eq!(summary.enrichment.fetched, 1);

    let output = read_output(&settings);
    let titles: Vec<_> = output.iter().map(|i| i.title.as_str()).collect();
    assert_eq!(titles, vec!["ten-a", "ten-b", "two", "letters"]);

    assert_eq!(output[0].description, "");
    assert_eq!(output[1].description, "inline");
    assert_eq!(output[2].description, "<p>Two</p>");
    assert_eq!(output[3].description, "");
    assert_eq!(output[2].enclosure.url, "https://example.com/two.zip");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_output_format() {
    let dir = test_dir("output_format");
    let feed_path = dir.join("appcast.xml");
    std::fs::write(
        &feed_path,
        appcast(&item_xml("one", "1", "<b>bold</b>", "")),
    )
    .unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("out.json");
    convert(&settings).await.unwrap();

    let text = std::fs::read_to_string(&settings.output).unwrap();
    assert!(text.starts_with("[\n  {\n    \"Title\": \"one\",\n"));
    assert!(text.ends_with("\n]\n"));
    assert!(text.contains("\\u003cb\\u003ebold\\u003c/b\\u003e"));
    assert!(!text.contains("Deltas"));

    let value: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(value[0]["Enclosure"]["EdSignature"], "sig");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_blank_description_and_localized_links() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/notes/blank"))
        .respond_with(ResponseTemplate::new(200).set_body_string("never"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/en"))
        .respond_with(ResponseTemplate::new(200).set_body_string("english"))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/notes/de"))
        .respond_with(ResponseTemplate::new(200).set_body_string("deutsch"))
        .expect(1)
        .mount(&server)
        .await;

    let dir = test_dir("blank_and_localized");
    let feed_path = dir.join("appcast.xml");
    let items = format!(
        r#"    <item>
      <title>blank</title>
      <sparkle:shortVersionString>2</sparkle:shortVersionString>
      <description>
      </description>
      <sparkle:releaseNotesLink>{uri}/notes/blank</sparkle:releaseNotesLink>
    </item>
    <item>
      <title>localized</title>
      <sparkle:shortVersionString>1</sparkle:shortVersionString>
      <sparkle:releaseNotesLink>{uri}/notes/en</sparkle:releaseNotesLink>
      <sparkle:releaseNotesLink xml:lang="de">{uri}/notes/de</sparkle:releaseNotesLink>
    </item>"#,
        uri = server.uri()
    );
    std::fs::write(&feed_path, appcast(&items)).unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("mercury.json");

    let summary = convert(&settings).await.unwrap();
    assert_eq!(summary.enrichment.fetched, 1);

    let output = read_output(&settings);
    assert_eq!(output[0].description, "\n      ");
    assert_eq!(output[1].description, "deutsch");
    assert_eq!(output[1].release_notes_link, format!("{}/notes/de", server.uri()));

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_unreachable_link_writes_nothing() {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let port = listener.local_addr().unwrap().port();
    drop(listener);

    let dir = test_dir("unreachable");
    let feed_path = dir.join("appcast.xml");
    std::fs::write(
        &feed_path,
        appcast(&item_xml(
            "one",
            "1",
            "",
            &format!("http://127.0.0.1:{}/notes", port),
        )),
    )
    .unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("mercury.json");

    let err = convert(&settings).await.unwrap_err();
    assert_eq!(FailureKind::of(&err), FailureKind::Network);
    assert!(!settings.output.exists());

    settings.failure_policy = FailurePolicy::Continue;
    let summary = convert(&settings).await.unwrap();
    assert_eq!(summary.enrichment.failures.len(), 1);
    assert_eq!(read_output(&settings)[0].description, "");

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_missing_feed_file() {
    let dir = test_dir("missing_feed");
    let mut settings = Settings::new(dir.join("nope.xml"));
    settings.output = dir.join("mercury.json");

    let err = convert(&settings).await.unwrap_err();
    assert_eq!(FailureKind::of(&err), FailureKind::FileOpen);
    assert!(!settings.output.exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_malformed_feed() {
    let dir = test_dir("malformed_feed");
    let feed_path = dir.join("appcast.xml");
    std::fs::write(&feed_path, "<rss><channel><item></channel>").unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("mercury.json");

    let err = convert(&settings).await.unwrap_err();
    assert_eq!(FailureKind::of(&err), FailureKind::Parse);
    assert!(!settings.output.exists());

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_unwritable_output() {
    let dir = test_dir("unwritable_output");
    let feed_path = dir.join("appcast.xml");
    std::fs::write(&feed_path, appcast(&item_xml("one", "1", "x", ""))).unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("missing").join("mercury.json");

    let err = convert(&settings).await.unwrap_err();
    assert_eq!(FailureKind::of(&err), FailureKind::Write);

    std::fs::remove_dir_all(&dir).ok();
}

#[tokio::test]
async fn test_include_deltas() {
    let dir = test_dir("include_deltas");
    let feed_path = dir.join("appcast.xml");
    let item = r#"    <item>
      <title>three</title>
      <sparkle:shortVersionString>3</sparkle:shortVersionString>
      <description>notes</description>
      <sparkle:deltas>
        <enclosure url="https://example.com/2-3.delta" sparkle:deltaFrom="2" length="5" type="application/octet-stream" sparkle:edSignature="a"/>
        <enclosure url="https://example.com/1-3.delta" sparkle:deltaFrom="1" length="9" type="application/octet-stream" sparkle:edSignature="b"/>
      </sparkle:deltas>
    </item>"#;
    std::fs::write(&feed_path, appcast(item)).unwrap();

    let mut settings = Settings::new(&feed_path);
    settings.output = dir.join("mercury.json");
    settings.include_deltas = true;
    convert(&settings).await.unwrap();

    let value: Value =
        serde_json::from_slice(&std::fs::read(&settings.output).unwrap()).unwrap();
    let deltas = value[0]["Deltas"].as_array().unwrap();
    let from: Vec<_> = deltas.iter().map(|d| d["DeltaFrom"].as_str().unwrap()).collect();
    assert_eq!(from, vec!["2", "1"]);

    std::fs::remove_dir_all(&dir).ok();
}
