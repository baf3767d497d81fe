// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Batch and command behaviour with in-memory collaborators.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use gilbert_descramble::command::PlatformError;
use gilbert_descramble::pipeline::ItemError;
use gilbert_descramble::{
    gilbert2d, process_batch, scramble, ChatPlatform, Config, DescrambleCommand, FetchError, ForwardNode, ImageCodec,
    ImageFetcher, ImageOutcome, ImageRsCodec, IncomingMessage, Limits, PixelGrid, Reply, Segment, Stage,
};

const POISON: &[u8] = b"poison";

/// PNG codec whose decoder panics on a poison body.
struct PanickingCodec;

impl ImageCodec for PanickingCodec {
    fn dimensions(&self, bytes: &[u8]) -> gilbert_descramble::Result<(u32, u32)> {
        if bytes == POISON {
            return Ok((1, 1));
        }
        ImageRsCodec::png().dimensions(bytes)
    }

    fn decode(&self, bytes: &[u8]) -> gilbert_descramble::Result<PixelGrid> {
        assert_ne!(bytes, POISON, "decoder hit a poison body");
        ImageRsCodec::png().decode(bytes)
    }

    fn encode(&self, grid: &PixelGrid) -> gilbert_descramble::Result<Vec<u8>> {
        ImageRsCodec::png().encode(grid)
    }
}

/// Serves fixed bodies by URL; unknown URLs fail like a 404.
#[derive(Default)]
struct MapFetcher {
    bodies: HashMap<String, Vec<u8>>,
    calls: AtomicUsize,
}

impl MapFetcher {
    fn with(mut self, url: &str, body: Vec<u8>) -> Self {
        self.bodies.insert(url.to_string(), body);
        self
    }
}

impl ImageFetcher for MapFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.bodies.get(url).cloned().ok_or(FetchError::Status(404))
    }
}

#[derive(Default)]
struct RecordingPlatform {
    sent: Mutex<Vec<(String, Vec<ForwardNode>)>>,
    fail_login: bool,
    panic_on_send: bool,
}

impl ChatPlatform for RecordingPlatform {
    fn login_user_id(&self) -> Result<String, PlatformError> {
        if self.fail_login {
            return Err(PlatformError::Call { action: "get_login_info", reason: "offline".into() });
        }
        Ok("10001".to_string())
    }

    fn send_private_forward(&self, user_id: &str, nodes: &[ForwardNode]) -> Result<(), PlatformError> {
        if self.panic_on_send {
            panic!("platform adapter crashed");
        }
        self.sent.lock().unwrap().push((user_id.to_string(), nodes.to_vec()));
        Ok(())
    }
}

fn original(seed: u8) -> PixelGrid {
    PixelGrid::from_fn(24, 16, |x, y| [x as u8 * 10, y as u8 * 15, seed])
}

fn scrambled_png(seed: u8) -> Vec<u8> {
    let grid = original(seed);
    ImageRsCodec::png().encode(&scramble(&grid, &gilbert2d(24, 16))).unwrap()
}

fn png_config() -> Config {
    Config::from_toml_str("[output]\nformat = \"png\"\n").unwrap()
}

fn image(url: &str) -> Segment {
    Segment::Image { url: Some(url.to_string()) }
}

fn private(segments: Vec<Segment>) -> IncomingMessage {
    IncomingMessage { sender_id: "42".into(), group_id: None, segments }
}

// ---------------------------------------------------------------------------
// Batch
// ---------------------------------------------------------------------------

#[test]
fn failed_download_is_skipped() {
    let fetcher = MapFetcher::default()
        .with("http://img/1", scrambled_png(1))
        .with("http://img/3", scrambled_png(3));
    let codec = ImageRsCodec::png();
    let urls: Vec<String> = ["http://img/1", "http://img/2", "http://img/3"].map(String::from).to_vec();

    let outcomes = process_batch(&urls, &fetcher, &codec, &Limits::default());

    assert_eq!(outcomes.len(), 3);
    assert_eq!(outcomes[1].stage(), Some(Stage::Download));
    let restored: Vec<PixelGrid> = outcomes
        .iter()
        .filter_map(ImageOutcome::bytes)
        .map(|b| codec.decode(b).unwrap())
        .collect();
    assert_eq!(restored, vec![original(1), original(3)]);
    assert_eq!(outcomes[0].source(), "http://img/1");
    assert_eq!(outcomes[2].source(), "http://img/3");
}

#[test]
fn undecodable_image_is_skipped() {
    let fetcher = MapFetcher::default()
        .with("a", b"not an image".to_vec())
        .with("b", scrambled_png(2));
    let urls = vec!["a".to_string(), "b".to_string()];
    let outcomes = process_batch(&urls, &fetcher, &ImageRsCodec::png(), &Limits::default());
    assert_eq!(outcomes[0].stage(), Some(Stage::Decode));
    assert!(outcomes[1].is_success());
}

#[test]
fn oversized_image_fails_at_decode_stage() {
    let fetcher = MapFetcher::default().with("big", scrambled_png(0));
    let limits = Limits { max_dimension: 16, max_pixels: 1_000_000 };
    let outcomes = process_batch(&["big".to_string()], &fetcher, &ImageRsCodec::png(), &limits);
    assert_eq!(outcomes[0].stage(), Some(Stage::Decode));
}

#[test]
fn panicking_decoder_only_fails_its_image() {
    let fetcher = MapFetcher::default()
        .with("1", scrambled_png(1))
        .with("2", POISON.to_vec())
        .with("3", scrambled_png(3));
    let urls: Vec<String> = ["1", "2", "3"].map(String::from).to_vec();

    let outcomes = process_batch(&urls, &fetcher, &PanickingCodec, &Limits::default());

    assert!(outcomes[0].is_success());
    assert!(outcomes[2].is_success());
    match &outcomes[1] {
        ImageOutcome::Failed { stage: Stage::Decode, error: ItemError::Panicked(msg), .. } => {
            assert!(msg.contains("poison"), "{msg}");
        }
        other => panic!("expected a decode panic, got {other:?}"),
    }
}

// ---------------------------------------------------------------------------
// Command
// ---------------------------------------------------------------------------

#[test]
fn group_message_is_ignored_without_work() {
    let fetcher = MapFetcher::default().with("http://img/1", scrambled_png(1));
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let msg = IncomingMessage {
        sender_id: "42".into(),
        group_id: Some("777".into()),
        segments: vec![Segment::Text("解混淆".into()), image("http://img/1")],
    };
    assert_eq!(cmd.handle(&msg), Reply::Ignored);
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
    assert!(platform.sent.lock().unwrap().is_empty());
}

#[test]
fn blank_group_id_is_handled_as_private() {
    let fetcher = MapFetcher::default().with("http://img/1", scrambled_png(1));
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let msg = IncomingMessage {
        sender_id: "42".into(),
        group_id: Some(String::new()),
        segments: vec![Segment::Text("解混淆".into()), image("http://img/1")],
    };
    assert_eq!(cmd.handle(&msg), Reply::Forwarded { images: 1 });
}

#[test]
fn panicking_decoder_does_not_lose_the_batch() {
    let fetcher = MapFetcher::default()
        .with("1", scrambled_png(1))
        .with("2", POISON.to_vec())
        .with("3", scrambled_png(3));
    let platform = RecordingPlatform::default();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &PanickingCodec, &platform);

    let msg = private(vec![Segment::Text("解混淆".into()), image("1"), image("2"), image("3")]);
    assert_eq!(cmd.handle(&msg), Reply::Forwarded { images: 2 });
    assert_eq!(platform.sent.lock().unwrap()[0].1[0].image_count(), 2);
}

#[test]
fn partial_batch_is_forwarded() {
    let fetcher = MapFetcher::default()
        .with("http://img/1", scrambled_png(1))
        .with("http://img/3", scrambled_png(3));
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let msg = private(vec![
        Segment::Text("deconfuse".into()),
        image("http://img/1"),
        image("http://img/2"),
        image("http://img/3"),
    ]);
    assert_eq!(cmd.dispatch(&msg), Some(Reply::Forwarded { images: 2 }));

    let sent = platform.sent.lock().unwrap();
    assert_eq!(sent.len(), 1);
    let (user, nodes) = &sent[0];
    assert_eq!(user, "42");
    assert_eq!(nodes.len(), 1);
    assert_eq!(nodes[0].user_id(), "10001");
    assert_eq!(nodes[0].nickname(), "318891403");
    let images: Vec<PixelGrid> = nodes[0].images().iter().map(|b| codec.decode(b).unwrap()).collect();
    assert_eq!(images, vec![original(1), original(3)]);
}

#[test]
fn quoted_message_images_are_used() {
    let fetcher = MapFetcher::default().with("q", scrambled_png(5));
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let msg = private(vec![Segment::Reply { chain: vec![image("q")] }, Segment::Text("解密图片".into())]);
    assert_eq!(cmd.handle(&msg), Reply::Forwarded { images: 1 });
}

#[test]
fn notices_for_missing_input() {
    let fetcher = MapFetcher::default();
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let no_image = private(vec![Segment::Text("解混淆".into())]);
    assert_eq!(cmd.handle(&no_image), Reply::Text(config.notices.no_image.clone()));

    let no_url = private(vec![Segment::Image { url: None }, Segment::Image { url: Some(String::new()) }]);
    assert_eq!(cmd.handle(&no_url), Reply::Text(config.notices.no_url.clone()));
    assert_eq!(fetcher.calls.load(Ordering::SeqCst), 0);
}

#[test]
fn download_and_total_failures_have_distinct_notices() {
    let fetcher = MapFetcher::default().with("broken", b"garbage".to_vec());
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let all_missing = private(vec![image("gone-1"), image("gone-2")]);
    assert_eq!(cmd.handle(&all_missing), Reply::Text(config.notices.download_failed.clone()));

    let undecodable = private(vec![image("gone-1"), image("broken")]);
    assert_eq!(cmd.handle(&undecodable), Reply::Text(config.notices.all_failed.clone()));
    assert!(platform.sent.lock().unwrap().is_empty());
}

#[test]
fn platform_failure_becomes_generic_notice() {
    let fetcher = MapFetcher::default().with("ok", scrambled_png(9));
    let platform = RecordingPlatform { fail_login: true, ..Default::default() };
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let reply = cmd.handle(&private(vec![image("ok")]));
    assert_eq!(reply, Reply::Text(config.notices.generic_error.clone()));
}

#[test]
fn platform_panic_becomes_generic_notice() {
    let fetcher = MapFetcher::default().with("ok", scrambled_png(9));
    let platform = RecordingPlatform { panic_on_send: true, ..Default::default() };
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    let reply = cmd.handle(&private(vec![image("ok")]));
    assert_eq!(reply, Reply::Text(config.notices.generic_error.clone()));
}

#[test]
fn other_commands_are_not_dispatched() {
    let fetcher = MapFetcher::default();
    let platform = RecordingPlatform::default();
    let codec = ImageRsCodec::png();
    let config = png_config();
    let cmd = DescrambleCommand::new(&config, &fetcher, &codec, &platform);

    assert_eq!(cmd.dispatch(&private(vec![Segment::Text("/help".into())])), None);
}
