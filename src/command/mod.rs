// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Chat command surface.
//!
//! A private message starting with the command word (or one of its
//! aliases) asks the bot to descramble the images it carries, or the images
//! of the message it quotes. Results are sent back as one forwarded
//! message. Group conversations are ignored outright.
//!
//! Every collaborator (fetcher, codec, platform) is passed in, so the
//! handler holds no global state and can be driven entirely from tests.

pub mod forward;

use std::panic::{catch_unwind, AssertUnwindSafe};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::codec::ImageCodec;
use crate::config::{CommandConfig, Config, Notices};
use crate::fetch::ImageFetcher;
use crate::pipeline::{panic_message, process_batch, ImageOutcome, Limits, Stage};

pub use forward::{ChatPlatform, ForwardNode, PlatformError};

/// Command word plus aliases.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommandSpec {
    name: String,
    aliases: Vec<String>,
}

impl CommandSpec {
    pub fn new(name: impl Into<String>, aliases: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self {
            name: name.into(),
            aliases: aliases.into_iter().map(Into::into).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn aliases(&self) -> &[String] {
        &self.aliases
    }

    /// True if `text` starts with the command word or an alias, optionally
    /// prefixed by `/`, followed by whitespace or the end of the text.
    pub fn matches(&self, text: &str) -> bool {
        let text = text.trim_start();
        let text = text.strip_prefix('/').unwrap_or(text);
        let word = text.split_whitespace().next().unwrap_or("");
        !word.is_empty() && (word == self.name || self.aliases.iter().any(|a| a == word))
    }
}

impl From<&CommandConfig> for CommandSpec {
    fn from(cfg: &CommandConfig) -> Self {
        Self::new(cfg.name.clone(), cfg.aliases.iter().cloned())
    }
}

/// One segment of an incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment {
    Text(String),
    /// An image; the platform may omit the URL.
    Image { url: Option<String> },
    /// A quote of an earlier message, with that message's segments.
    Reply { chain: Vec<Segment> },
    Other,
}

/// An incoming chat message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncomingMessage {
    pub sender_id: String,
    /// Set for group conversations. Some platforms send an empty id for
    /// private chats.
    pub group_id: Option<String>,
    pub segments: Vec<Segment>,
}

impl IncomingMessage {
    /// Group id, if this is a group conversation. Blank ids count as private.
    pub fn group(&self) -> Option<&str> {
        self.group_id.as_deref().map(str::trim).filter(|id| !id.is_empty())
    }

    /// Concatenated text segments.
    pub fn text(&self) -> String {
        self.segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Text(t) => Some(t.as_str()),
                _ => None,
            })
            .collect()
    }

    /// Image segments of the message itself or, if it has none, of the
    /// first quoted message.
    pub fn image_segments(&self) -> Vec<&Segment> {
        let direct: Vec<&Segment> = images_in(&self.segments).collect();
        if !direct.is_empty() {
            return direct;
        }
        self.segments
            .iter()
            .find_map(|seg| match seg {
                Segment::Reply { chain } => Some(images_in(chain).collect()),
                _ => None,
            })
            .unwrap_or_default()
    }
}

fn images_in(segments: &[Segment]) -> impl Iterator<Item = &Segment> {
    segments.iter().filter(|seg| matches!(seg, Segment::Image { .. }))
}

/// What the handler did with a message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    /// The message was not processed (group conversation).
    Ignored,
    /// A plain-text notice for the sender.
    Text(String),
    /// Results were forwarded to the sender.
    Forwarded { images: usize },
}

/// Handles the descramble command with injected collaborators.
pub struct DescrambleCommand<'a> {
    spec: CommandSpec,
    notices: Notices,
    sender_nickname: String,
    limits: Limits,
    fetcher: &'a dyn ImageFetcher,
    codec: &'a dyn ImageCodec,
    platform: &'a dyn ChatPlatform,
}

impl<'a> DescrambleCommand<'a> {
    pub fn new(
        config: &Config,
        fetcher: &'a dyn ImageFetcher,
        codec: &'a dyn ImageCodec,
        platform: &'a dyn ChatPlatform,
    ) -> Self {
        Self {
            spec: CommandSpec::from(&config.command),
            notices: config.notices.clone(),
            sender_nickname: config.forward.sender_nickname.clone(),
            limits: config.limits,
            fetcher,
            codec,
            platform,
        }
    }

    pub fn spec(&self) -> &CommandSpec {
        &self.spec
    }

    /// Handle a message already routed to this command.
    ///
    /// Never panics: a panic escaping a collaborator is logged and answered
    /// with the generic notice.
    pub fn handle(&self, msg: &IncomingMessage) -> Reply {
        catch_unwind(AssertUnwindSafe(|| self.run(msg))).unwrap_or_else(|payload| {
            tracing::error!(
                sender = %msg.sender_id,
                panic = %panic_message(payload.as_ref()),
                "descramble command panicked"
            );
            Reply::Text(self.notices.generic_error.clone())
        })
    }

    fn run(&self, msg: &IncomingMessage) -> Reply {
        if let Some(group) = msg.group() {
            tracing::info!(group = %group, "group message, skipping descramble");
            return Reply::Ignored;
        }

        let segments = msg.image_segments();
        if segments.is_empty() {
            return Reply::Text(self.notices.no_image.clone());
        }
        let urls: Vec<String> = segments
            .iter()
            .filter_map(|seg| match seg {
                Segment::Image { url: Some(url) } if !url.is_empty() => Some(url.clone()),
                _ => None,
            })
            .collect();
        if urls.is_empty() {
            return Reply::Text(self.notices.no_url.clone());
        }

        tracing::info!(sender = %msg.sender_id, images = urls.len(), "descrambling images");
        let outcomes = process_batch(&urls, self.fetcher, self.codec, &self.limits);

        if outcomes.iter().all(|o| o.stage() == Some(Stage::Download)) {
            return Reply::Text(self.notices.download_failed.clone());
        }
        let images: Vec<&[u8]> = outcomes.iter().filter_map(ImageOutcome::bytes).collect();
        if images.is_empty() {
            return Reply::Text(self.notices.all_failed.clone());
        }

        match self.forward(&msg.sender_id, &images) {
            Ok(()) => {
                tracing::info!(sender = %msg.sender_id, images = images.len(), "forwarded descrambled images");
                Reply::Forwarded { images: images.len() }
            }
            Err(err) => {
                tracing::error!(sender = %msg.sender_id, error = ?err, "descramble command failed");
                Reply::Text(self.notices.generic_error.clone())
            }
        }
    }

    /// Handle an arbitrary message: `None` if it is not this command.
    pub fn dispatch(&self, msg: &IncomingMessage) -> Option<Reply> {
        self.spec.matches(&msg.text()).then(|| self.handle(msg))
    }

    fn forward(&self, sender_id: &str, images: &[&[u8]]) -> Result<(), PlatformError> {
        let bot_id = self.platform.login_user_id()?;
        let node = ForwardNode::with_images(bot_id, self.sender_nickname.clone(), unix_now(), images.iter().copied());
        self.platform.send_private_forward(sender_id, &[node])
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
