// Copyright (c) 2026 Christoph Gaffga
// SPDX-License-Identifier: GPL-3.0-only
// https://github.com/cgaffga/phasmcore

//! Forwarded-message payloads and the chat platform boundary.
//!
//! Results go back to the requester as a single forwarded message ("node")
//! holding every descrambled image. The JSON shape follows the OneBot
//! `send_private_forward_msg` convention: images are inlined as
//! `base64://` files.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use serde::Serialize;

/// Error reported by a [`ChatPlatform`] call.
#[derive(Debug, thiserror::Error)]
pub enum PlatformError {
    #[error("platform call `{action}` failed: {reason}")]
    Call { action: &'static str, reason: String },
}

/// Outbound side of the chat platform.
pub trait ChatPlatform: Send + Sync {
    /// User id of the bot account itself.
    fn login_user_id(&self) -> Result<String, PlatformError>;

    /// Send forward nodes to a user in a private conversation.
    fn send_private_forward(&self, user_id: &str, nodes: &[ForwardNode]) -> Result<(), PlatformError>;
}

/// One forwarded message node.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ForwardNode {
    #[serde(rename = "type")]
    kind: &'static str,
    data: NodeData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct NodeData {
    user_id: String,
    nickname: String,
    time: u64,
    content: Vec<ContentSegment>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ContentSegment {
    #[serde(rename = "type")]
    kind: &'static str,
    data: ImageData,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
struct ImageData {
    file: String,
}

impl ForwardNode {
    /// Build a node sent "from" `user_id` that carries `images` in order.
    pub fn with_images<'a>(
        user_id: impl Into<String>,
        nickname: impl Into<String>,
        time: u64,
        images: impl IntoIterator<Item = &'a [u8]>,
    ) -> Self {
        let content = images
            .into_iter()
            .map(|bytes| ContentSegment {
                kind: "image",
                data: ImageData {
                    file: format!("base64://{}", BASE64.encode(bytes)),
                },
            })
            .collect();
        Self {
            kind: "node",
            data: NodeData {
                user_id: user_id.into(),
                nickname: nickname.into(),
                time,
                content,
            },
        }
    }

    pub fn user_id(&self) -> &str {
        &self.data.user_id
    }

    pub fn nickname(&self) -> &str {
        &self.data.nickname
    }

    pub fn time(&self) -> u64 {
        self.data.time
    }

    pub fn image_count(&self) -> usize {
        self.data.content.len()
    }

    /// Decoded bytes of every image in the node.
    pub fn images(&self) -> Vec<Vec<u8>> {
        self.data
            .content
            .iter()
            .filter_map(|seg| seg.data.file.strip_prefix("base64://"))
            .filter_map(|b64| BASE64.decode(b64).ok())
            .collect()
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serializes_onebot_shape() {
        let node = ForwardNode::with_images("10001", "318891403", 1_700_000_000, [&b"abc"[..]]);
        let json = node.to_json();
        assert_eq!(json["type"], "node");
        assert_eq!(json["data"]["user_id"], "10001");
        assert_eq!(json["data"]["nickname"], "318891403");
        assert_eq!(json["data"]["time"], 1_700_000_000u64);
        assert_eq!(json["data"]["content"][0]["type"], "image");
        assert_eq!(json["data"]["content"][0]["data"]["file"], "base64://YWJj");
    }

    #[test]
    fn images_roundtrip_through_base64() {
        let images: Vec<Vec<u8>> = vec![vec![0xFF, 0xD8, 1, 2], vec![9; 40]];
        let node = ForwardNode::with_images("1", "n", 0, images.iter().map(Vec::as_slice));
        assert_eq!(node.image_count(), 2);
        assert_eq!(node.images(), images);
    }
}
