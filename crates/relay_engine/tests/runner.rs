use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, Once};
use std::time::Duration;

use chrono::{DateTime, TimeZone, Utc};
use pretty_assertions::assert_eq;
use relay_core::{DedupeField, FetchedFeed, FuturePolicy, RawItem, RawLink, RunState};
use relay_engine::{
    EventSink, FailureKind, FeedConfig, FeedSource, FetchError, FetchSettings, MediaId,
    MediaResolver, Platform, PlatformError, PostDelay, PostId, RunEvent, RunOptions, Runner,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(relay_logging::initialize_for_tests);
}

#[derive(Default)]
struct FakeFeeds {
    feeds: HashMap<String, Result<FetchedFeed, FetchError>>,
}

impl FakeFeeds {
    fn with(mut self, url: &str, feed: Result<FetchedFeed, FetchError>) -> Self {
        self.feeds.insert(url.to_string(), feed);
        self
    }
}

#[async_trait::async_trait]
impl FeedSource for FakeFeeds {
    async fn fetch(&self, url: &str) -> Result<FetchedFeed, FetchError> {
        self.feeds.get(url).cloned().unwrap_or_else(|| {
            Err(FetchError {
                kind: FailureKind::HttpStatus(404),
                message: "unknown feed".into(),
            })
        })
    }
}

#[derive(Default)]
struct FakePlatform {
    calls: AtomicUsize,
    posts: Mutex<Vec<String>>,
    uploads: Mutex<Vec<Vec<u8>>>,
    /// Attachment count of each successful post.
    attachments: Mutex<Vec<usize>>,
    fail_on: Option<&'static str>,
}

#[async_trait::async_trait]
impl Platform for FakePlatform {
    async fn upload_media(&self, bytes: Vec<u8>, _: &str) -> Result<MediaId, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.uploads.lock().unwrap().push(bytes);
        Ok(MediaId("m".into()))
    }

    async fn post(&self, text: &str, media: &[MediaId]) -> Result<PostId, PlatformError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail_on.is_some_and(|needle| text.contains(needle)) {
            return Err(PlatformError::Status {
                code: 503,
                body: "unavailable".into(),
            });
        }
        self.attachments.lock().unwrap().push(media.len());
        let mut posts = self.posts.lock().unwrap();
        posts.push(text.to_string());
        Ok(PostId(posts.len().to_string()))
    }
}

#[derive(Default)]
struct RecordingSink {
    events: Mutex<Vec<RunEvent>>,
}

impl RecordingSink {
    fn take(&self) -> Vec<RunEvent> {
        self.events.lock().unwrap().drain(..).collect()
    }
}

impl EventSink for RecordingSink {
    fn emit(&self, event: RunEvent) {
        self.events.lock().unwrap().push(event);
    }
}

fn at(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 6, day, hour, 0, 0).unwrap()
}

fn item(id: &str, title: &str, updated: DateTime<Utc>) -> RawItem {
    RawItem {
        id: id.to_string(),
        title: Some(title.to_string()),
        links: vec![RawLink {
            href: id.to_string(),
            rel: Some("alternate".into()),
            media_type: None,
        }],
        updated: Some(updated.to_rfc3339()),
        ..RawItem::default()
    }
}

fn feed(items: Vec<RawItem>) -> Result<FetchedFeed, FetchError> {
    Ok(FetchedFeed {
        generator: None,
        items,
    })
}

fn config(url: &str) -> FeedConfig {
    FeedConfig {
        url: url.to_string(),
        template: "{title} {url}".into(),
        include_images: false,
        generator: None,
    }
}

fn now() -> DateTime<Utc> {
    at(30, 0)
}

#[tokio::test]
async fn trial_run_renders_without_touching_platform_or_state() {
    init_logging();
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![
            item("https://a.example/3", "Three", at(3, 0)),
            item("https://a.example/1", "One", at(1, 0)),
            item("https://a.example/2", "Two", at(2, 0)),
        ]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let options = RunOptions {
        trial: true,
        dedupe: Some(DedupeField::Url),
        ..RunOptions::default()
    };
    let mut state = RunState::default();
    let before = state.clone();

    let report = Runner::new(&feeds, &platform, &sink, options)
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    let rendered: Vec<String> = sink
        .take()
        .into_iter()
        .filter_map(|event| match event {
            RunEvent::Rendered {
                text, trial: true, ..
            } => Some(text),
            _ => None,
        })
        .collect();
    assert_eq!(
        rendered,
        vec![
            "One https://a.example/1",
            "Two https://a.example/2",
            "Three https://a.example/3",
        ]
    );
    assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
    assert_eq!(state, before);
    assert_eq!(report.processed, 3);
    assert!(!report.should_persist());
}

#[tokio::test]
async fn publishes_oldest_first_and_advances_watermark() {
    init_logging();
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![
            item("https://a.example/new", "New", at(5, 0)),
            item("https://a.example/old", "Old", at(4, 0)),
            item("https://a.example/seen", "Seen", at(2, 0)),
        ]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let mut state = RunState::new(Some(at(3, 0)), Vec::new());

    let report = Runner::new(&feeds, &platform, &sink, RunOptions::default())
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(
        *platform.posts.lock().unwrap(),
        vec!["Old https://a.example/old", "New https://a.example/new"]
    );
    assert_eq!(report.published, 2);
    assert_eq!(report.newest, Some(at(5, 0)));
    assert!(report.should_persist());
    assert_eq!(state.watermark(), at(5, 0));
    assert!(state.dedupe().is_empty());
}

#[tokio::test]
async fn failing_feed_does_not_stop_healthy_one() {
    init_logging();
    let broken = Err(FetchError {
        kind: FailureKind::Timeout,
        message: "timed out".into(),
    });
    let feeds = FakeFeeds::default()
        .with("https://broken.example/feed", broken.clone())
        .with(
            "https://ok.example/feed",
            feed(vec![item("https://ok.example/1", "Fine", at(7, 0))]),
        );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let mut state = RunState::new(Some(at(1, 0)), Vec::new());

    let report = Runner::new(&feeds, &platform, &sink, RunOptions::default())
        .run_at(
            &[
                config("https://broken.example/feed"),
                config("https://ok.example/feed"),
            ],
            &mut state,
            now(),
        )
        .await;

    assert_eq!(report.feeds_failed, 1);
    assert_eq!(report.published, 1);
    assert_eq!(state.watermark(), at(7, 0));

    let events = sink.take();
    assert_eq!(
        events[0],
        RunEvent::FeedFailed {
            feed_url: "https://broken.example/feed".into(),
            error: broken.unwrap_err(),
        }
    );
}

#[tokio::test]
async fn duplicates_are_skipped_but_still_move_watermark() {
    init_logging();
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![
            item("https://a.example/dup", "Dup", at(8, 0)),
            item("https://a.example/fresh", "Fresh", at(9, 0)),
        ]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let options = RunOptions {
        dedupe: Some(DedupeField::Url),
        ..RunOptions::default()
    };
    let mut state = RunState::new(None, vec!["https://a.example/dup".into()]);

    let report = Runner::new(&feeds, &platform, &sink, options)
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.duplicates, 1);
    assert_eq!(report.published, 1);
    assert_eq!(
        *platform.posts.lock().unwrap(),
        vec!["Fresh https://a.example/fresh"]
    );
    assert!(sink.take().contains(&RunEvent::DuplicateSkipped {
        url: "https://a.example/dup".into(),
        key: "https://a.example/dup".into(),
    }));
    let keys: Vec<&str> = state.dedupe().keys().collect();
    assert_eq!(keys, vec!["https://a.example/dup", "https://a.example/fresh"]);
    assert_eq!(state.watermark(), at(9, 0));
}

#[tokio::test]
async fn failed_post_records_no_dedupe_key() {
    init_logging();
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![
            item("https://a.example/1", "Broken", at(10, 0)),
            item("https://a.example/2", "Works", at(11, 0)),
        ]),
    );
    let platform = FakePlatform {
        fail_on: Some("Broken"),
        ..FakePlatform::default()
    };
    let sink = RecordingSink::default();
    let options = RunOptions {
        dedupe: Some(DedupeField::Title),
        ..RunOptions::default()
    };
    let mut state = RunState::default();

    let report = Runner::new(&feeds, &platform, &sink, options)
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.failed, 1);
    assert_eq!(report.published, 1);
    let keys: Vec<&str> = state.dedupe().keys().collect();
    assert_eq!(keys, vec!["Works"]);
    assert!(sink
        .take()
        .iter()
        .any(|event| matches!(event, RunEvent::PublishFailed { url, .. } if url == "https://a.example/1")));
    assert_eq!(state.watermark(), at(11, 0));
}

#[tokio::test]
async fn unparseable_timestamps_are_rejected_and_future_entries_can_wait() {
    init_logging();
    let mut undated = item("https://a.example/undated", "Undated", at(1, 0));
    undated.updated = Some("someday".into());
    let future = Utc.with_ymd_and_hms(2030, 1, 1, 0, 0, 0).unwrap();
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![
            undated,
            item("https://a.example/future", "Future", future),
            item("https://a.example/now", "Now", at(12, 0)),
        ]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let options = RunOptions {
        future: FuturePolicy::Skip,
        ..RunOptions::default()
    };
    let mut state = RunState::default();

    let report = Runner::new(&feeds, &platform, &sink, options)
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.processed, 1);
    assert_eq!(*platform.posts.lock().unwrap(), vec!["Now https://a.example/now"]);
    assert_eq!(state.watermark(), at(12, 0));
    let events = sink.take();
    assert!(events.contains(&RunEvent::FeedFetched {
        feed_url: "https://a.example/feed".into(),
        items: 3,
        selected: 1,
    }));
    assert!(events.iter().any(|event| matches!(
        event,
        RunEvent::EntryRejected { id, .. } if id == "https://a.example/undated"
    )));
}

#[tokio::test]
async fn empty_run_leaves_state_alone() {
    init_logging();
    let feeds = FakeFeeds::default().with("https://a.example/feed", feed(Vec::new()));
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let mut state = RunState::new(Some(at(1, 0)), Vec::new());

    let report = Runner::new(&feeds, &platform, &sink, RunOptions::default())
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.processed, 0);
    assert!(!report.should_persist());
    assert_eq!(state.watermark(), at(1, 0));
}

async fn image_server(routes: &[&str]) -> MockServer {
    let server = MockServer::start().await;
    for route in routes {
        Mock::given(method("GET"))
            .and(path(*route))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw(route.as_bytes().to_vec(), "image/png"),
            )
            .mount(&server)
            .await;
    }
    server
}

fn illustrated(id: &str, title: &str, updated: DateTime<Utc>, image_url: String) -> RawItem {
    RawItem {
        summary: Some(format!(r#"<p>{title}</p><img src="{image_url}">"#)),
        ..item(id, title, updated)
    }
}

fn config_with_images(url: &str) -> FeedConfig {
    FeedConfig {
        include_images: true,
        ..config(url)
    }
}

#[tokio::test]
async fn images_travel_from_markup_to_upload() {
    init_logging();
    let server = image_server(&["/one.png"]).await;
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![illustrated(
            "https://a.example/1",
            "Pictured",
            at(13, 0),
            format!("{}/one.png", server.uri()),
        )]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let resolver = MediaResolver::new(FetchSettings::default()).expect("resolver");
    let mut state = RunState::default();

    let report = Runner::new(&feeds, &platform, &sink, RunOptions::default())
        .with_media(&resolver)
        .run_at(&[config_with_images("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.published, 1);
    assert_eq!(*platform.uploads.lock().unwrap(), vec![b"/one.png".to_vec()]);
    assert_eq!(*platform.attachments.lock().unwrap(), vec![1]);
    assert!(sink.take().contains(&RunEvent::Published {
        url: "https://a.example/1".into(),
        post_id: "1".into(),
        media: 1,
    }));
}

#[tokio::test]
async fn feeds_without_image_flag_fetch_no_media() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8], "image/png"))
        .expect(0)
        .mount(&server)
        .await;
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![illustrated(
            "https://a.example/1",
            "Plain",
            at(13, 0),
            format!("{}/one.png", server.uri()),
        )]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let resolver = MediaResolver::new(FetchSettings::default()).expect("resolver");
    let mut state = RunState::default();

    Runner::new(&feeds, &platform, &sink, RunOptions::default())
        .with_media(&resolver)
        .run_at(&[config("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(*platform.attachments.lock().unwrap(), vec![0]);
}

#[tokio::test]
async fn duplicate_with_images_downloads_and_uploads_nothing() {
    init_logging();
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/dup.png"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(vec![1u8], "image/png"))
        .expect(0)
        .mount(&server)
        .await;
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![illustrated(
            "https://a.example/dup",
            "Again",
            at(14, 0),
            format!("{}/dup.png", server.uri()),
        )]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    let resolver = MediaResolver::new(FetchSettings::default()).expect("resolver");
    let options = RunOptions {
        dedupe: Some(DedupeField::Url),
        ..RunOptions::default()
    };
    let mut state = RunState::new(None, vec!["https://a.example/dup".into()]);

    let report = Runner::new(&feeds, &platform, &sink, options)
        .with_media(&resolver)
        .run_at(&[config_with_images("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.duplicates, 1);
    assert_eq!(platform.calls.load(Ordering::SeqCst), 0);
    assert!(platform.uploads.lock().unwrap().is_empty());
}

#[tokio::test]
async fn delayed_post_keeps_its_attachment() {
    init_logging();
    let server = image_server(&["/first.png", "/second.png"]).await;
    let feeds = FakeFeeds::default().with(
        "https://a.example/feed",
        feed(vec![
            illustrated(
                "https://a.example/1",
                "First",
                at(15, 0),
                format!("{}/first.png", server.uri()),
            ),
            illustrated(
                "https://a.example/2",
                "Second",
                at(16, 0),
                format!("{}/second.png", server.uri()),
            ),
        ]),
    );
    let platform = FakePlatform::default();
    let sink = RecordingSink::default();
    // The pause is longer than the request timeout.
    let settings = FetchSettings {
        request_timeout: Duration::from_secs(1),
        ..FetchSettings::default()
    };
    let resolver = MediaResolver::new(settings).expect("resolver");
    let pause = Duration::from_millis(1500);
    let options = RunOptions {
        delay: Some(PostDelay {
            min: pause,
            max: pause,
        }),
        ..RunOptions::default()
    };
    let mut state = RunState::default();

    let report = Runner::new(&feeds, &platform, &sink, options)
        .with_media(&resolver)
        .run_at(&[config_with_images("https://a.example/feed")], &mut state, now())
        .await;

    assert_eq!(report.published, 2);
    assert_eq!(*platform.attachments.lock().unwrap(), vec![1, 1]);
    assert_eq!(
        *platform.uploads.lock().unwrap(),
        vec![b"/first.png".to_vec(), b"/second.png".to_vec()]
    );
}

#[test]
fn fixed_delay_picks_its_bound() {
    let pause = Duration::from_secs(3);
    assert_eq!(PostDelay { min: pause, max: pause }.pick(), pause);

    let default = PostDelay::default();
    let picked = default.pick();
    assert!(picked >= Duration::from_secs(10) && picked <= Duration::from_secs(30));
}
