//! Object and communication diagram elements.
//!
//! Objects reuse the container weighting of classes and own attributes and methods of
//! the same kinds. Communication links additionally carry messages whose direction is
//! relative to the link's source and target.

use super::similarity::{self, Depth, endpoint_similarity};
use super::{ElementKind, ElementRef};

pub const COMMUNICATION_ENDPOINT_WEIGHT: f64 = 0.25;
pub const COMMUNICATION_MESSAGES_WEIGHT: f64 = 0.5;

/// Direction of a message along a communication link.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageDirection {
    /// From the link's source to its target.
    Forward,
    /// From the link's target to its source.
    Backward,
}

impl MessageDirection {
    pub fn reversed(self) -> Self {
        match self {
            MessageDirection::Forward => MessageDirection::Backward,
            MessageDirection::Backward => MessageDirection::Forward,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Message {
    pub name: String,
    pub direction: MessageDirection,
}

impl Message {
    pub fn new(name: impl Into<String>, direction: MessageDirection) -> Self {
        Self {
            name: name.into(),
            direction,
        }
    }
}

pub fn communication_link_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>, depth: Depth) -> f64 {
    let (
        ElementKind::CommunicationLink { messages: ma, .. },
        ElementKind::CommunicationLink { messages: mb, .. },
    ) = (a.kind(), b.kind())
    else {
        return 0.0;
    };

    similarity::best_orientation(a, b, |a_source, a_target, b_first, b_second, reversed| {
        COMMUNICATION_ENDPOINT_WEIGHT * endpoint_similarity(a, a_source, b, b_first, depth)
            + COMMUNICATION_ENDPOINT_WEIGHT * endpoint_similarity(a, a_target, b, b_second, depth)
            + COMMUNICATION_MESSAGES_WEIGHT * message_overlap(ma, mb, reversed)
    })
}

/// Share of messages present on both links, matched one-to-one by name and direction.
///
/// With `reversed` the directions of `b` are read against the flipped link.
fn message_overlap(a: &[Message], b: &[Message], reversed: bool) -> f64 {
    let longest = a.len().max(b.len());
    if longest == 0 {
        return 1.0;
    }

    let mut unmatched: Vec<(String, MessageDirection)> = b
        .iter()
        .map(|m| {
            let direction = if reversed { m.direction.reversed() } else { m.direction };
            (m.name.clone(), direction)
        })
        .collect();

    let mut matched = 0;
    for message in a {
        if let Some(pos) = unmatched.iter().position(|(name, direction)| {
            *direction == message.direction && similarity::equals_ignore_case(name, &message.name)
        }) {
            unmatched.swap_remove(pos);
            matched += 1;
        }
    }

    matched as f64 / longest as f64
}
