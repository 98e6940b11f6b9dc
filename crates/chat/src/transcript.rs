//! Chat transcript parser.
//!
//! A transcript is the plain-text chat buffer:
//!
//! ```text
//! >>> system
//!
//! You are a general assistant.
//!
//! >>> user
//!
//! translate to human language
//!
//! >>> include
//!
//! notes/*.md
//!
//! <<< assistant
//!
//! it already is in human language
//! ```
//!
//! Lines are split into marker-delimited segments, then folded into
//! messages: consecutive segments of the same role share one message,
//! `thinking` segments are dropped, and `include` segments are resolved
//! into content parts of the surrounding user message.

use std::sync::LazyLock;

use regex_lite::Regex;
use tracing::debug;
use vimai_core::{ContentPart, Message, Role};

use crate::include::IncludeResolver;

static MARKER: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^(>>>|<<<) (\w+)\s*$").ok());

/// Which side of the conversation a marker belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// `>>>`: text sent to the model.
    Outbound,
    /// `<<<`: text received from the model.
    Inbound,
}

/// Roles a segment can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentRole {
    User,
    System,
    Include,
    Assistant,
    Thinking,
}

impl SegmentRole {
    /// Role for a marker token, `None` when the token is unknown for that direction.
    fn from_marker(direction: Direction, token: &str) -> Option<Self> {
        match (direction, token) {
            (Direction::Outbound, "user") => Some(Self::User),
            (Direction::Outbound, "system") => Some(Self::System),
            (Direction::Outbound, "include") => Some(Self::Include),
            (Direction::Inbound, "assistant") => Some(Self::Assistant),
            (Direction::Inbound, "thinking") => Some(Self::Thinking),
            _ => None,
        }
    }

    /// The message role this segment folds into.
    fn message_role(self) -> Option<Role> {
        match self {
            Self::User | Self::Include => Some(Role::User),
            Self::System => Some(Role::System),
            Self::Assistant => Some(Role::Assistant),
            Self::Thinking => None,
        }
    }
}

/// A marker-delimited chunk of a transcript.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    pub direction: Direction,
    pub role: SegmentRole,
    /// Body with leading and trailing blank lines removed.
    pub body: String,
}

fn parse_marker(line: &str) -> Option<(Direction, SegmentRole)> {
    let caps = MARKER.as_ref()?.captures(line)?;
    let direction = match &caps[1] {
        ">>>" => Direction::Outbound,
        _ => Direction::Inbound,
    };
    SegmentRole::from_marker(direction, &caps[2]).map(|role| (direction, role))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ScanState {
    /// Before the first marker or content line.
    Start,
    /// After a marker, skipping blank lines.
    InSegmentHeader,
    InSegmentBody,
}

struct OpenSegment<'a> {
    direction: Direction,
    role: SegmentRole,
    lines: Vec<&'a str>,
}

impl OpenSegment<'_> {
    fn close(mut self) -> Segment {
        while self.lines.last().is_some_and(|line| line.trim().is_empty()) {
            self.lines.pop();
        }
        Segment {
            direction: self.direction,
            role: self.role,
            body: self.lines.join("\n"),
        }
    }
}

/// Split a transcript into segments.
///
/// Content before the first marker becomes an implicit `>>> user` segment.
/// Marker lines with unknown role tokens are kept as body text.
pub fn split_segments(transcript: &str) -> Vec<Segment> {
    let mut segments = Vec::new();
    let mut state = ScanState::Start;
    let mut open: Option<OpenSegment> = None;

    for line in transcript.lines() {
        if let Some((direction, role)) = parse_marker(line) {
            segments.extend(open.take().map(OpenSegment::close));
            open = Some(OpenSegment {
                direction,
                role,
                lines: Vec::new(),
            });
            state = ScanState::InSegmentHeader;
            continue;
        }

        let blank = line.trim().is_empty();
        match state {
            ScanState::Start if blank => {}
            ScanState::Start => {
                open = Some(OpenSegment {
                    direction: Direction::Outbound,
                    role: SegmentRole::User,
                    lines: vec![line],
                });
                state = ScanState::InSegmentBody;
            }
            ScanState::InSegmentHeader if blank => {}
            ScanState::InSegmentHeader | ScanState::InSegmentBody => {
                if let Some(segment) = open.as_mut() {
                    segment.lines.push(line);
                }
                state = ScanState::InSegmentBody;
            }
        }
    }

    segments.extend(open.map(OpenSegment::close));
    segments
}

/// Parses transcripts into message lists, resolving includes on the way.
#[derive(Debug, Clone)]
pub struct TranscriptParser {
    resolver: IncludeResolver,
}

impl TranscriptParser {
    pub fn new(resolver: IncludeResolver) -> Self {
        Self { resolver }
    }

    pub fn resolver(&self) -> &IncludeResolver {
        &self.resolver
    }

    /// Parse a transcript into messages.
    ///
    /// Adjacent messages never share a role and no message is empty.
    pub fn parse(&self, transcript: &str) -> Vec<Message> {
        let segments = split_segments(transcript);
        let mut messages: Vec<Message> = Vec::new();

        for segment in &segments {
            let parts = match segment.role {
                SegmentRole::Thinking => continue,
                SegmentRole::Include => self.resolver.resolve_block(&segment.body),
                _ if segment.body.trim().is_empty() => continue,
                _ => vec![ContentPart::text(segment.body.as_str())],
            };
            if parts.is_empty() {
                continue;
            }
            let Some(role) = segment.role.message_role() else {
                continue;
            };

            match messages.last_mut() {
                Some(last) if last.role == role => last.content.extend(parts),
                _ => messages.push(Message::new(role, parts)),
            }
        }

        debug!(
            segments = segments.len(),
            messages = messages.len(),
            "Parsed chat transcript"
        );
        messages
    }
}

impl Default for TranscriptParser {
    fn default() -> Self {
        Self::new(IncludeResolver::from_current_dir())
    }
}

/// Parse a transcript with includes resolved against the working directory.
pub fn parse_chat_messages(transcript: &str) -> Vec<Message> {
    TranscriptParser::default().parse(transcript)
}
