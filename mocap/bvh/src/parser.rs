//! BVH text parser.
//!
//! Parses the whitespace-token BVH grammar into a [`Node`] tree and streams
//! motion data through a [`BvhSink`]. The hierarchy section is fully built
//! before `on_hierarchy` fires; the motion header is delivered before any
//! frame row; frame rows are delivered in file order.

use std::io::BufRead;

use nalgebra::Vector3;

use crate::error::{BvhError, Result};
use crate::types::{Channel, Node};

/// Receiver for parse events, in guaranteed order: one `on_hierarchy`, one
/// `on_motion`, then one `on_frame` per data row.
///
/// All methods default to no-ops so sinks only implement what they consume.
pub trait BvhSink {
    /// The joint hierarchy has been fully parsed.
    fn on_hierarchy(&mut self, _root: &Node) -> Result<()> {
        Ok(())
    }

    /// The motion header has been parsed: declared frame count and sample
    /// interval in seconds.
    fn on_motion(&mut self, _frames: usize, _dt: f64) -> Result<()> {
        Ok(())
    }

    /// One frame row of raw channel values, length equal to the hierarchy's
    /// total channel count.
    fn on_frame(&mut self, _values: &[f64]) -> Result<()> {
        Ok(())
    }
}

/// Sink that discards all events; parse for the tree alone.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl BvhSink for NullSink {}

/// Parse a BVH document from a string.
///
/// Returns the owned root node after the whole document (hierarchy and
/// motion) has been consumed.
pub fn parse_bvh_str(text: &str, sink: &mut dyn BvhSink) -> Result<Node> {
    parse_bvh_reader(text.as_bytes(), sink)
}

/// Parse a BVH document from any buffered reader.
pub fn parse_bvh_reader<R: BufRead>(reader: R, sink: &mut dyn BvhSink) -> Result<Node> {
    let mut tokens = Tokenizer::new(reader);

    tokens.expect_keyword("HIERARCHY")?;
    tokens.expect_keyword("ROOT")?;
    let root = parse_joint(&mut tokens)?;
    sink.on_hierarchy(&root)?;

    tokens.expect_keyword("MOTION")?;
    tokens.expect_keyword("Frames:")?;
    let frames = tokens.next_usize("frame count")?;
    tokens.expect_keyword("Frame")?;
    tokens.expect_keyword("Time:")?;
    let dt = tokens.next_f64("frame time")?;
    sink.on_motion(frames, dt)?;

    let expected = root.channel_count();
    let mut frame = 0usize;
    while let Some(values) = tokens.next_value_row()? {
        if values.len() != expected {
            return Err(BvhError::FrameLengthMismatch {
                expected,
                got: values.len(),
                frame,
            });
        }
        if frame >= frames {
            return Err(BvhError::ExtraFrames { declared: frames });
        }
        sink.on_frame(&values)?;
        frame += 1;
    }

    Ok(root)
}

/// Parse one joint block after its `ROOT`/`JOINT` keyword.
fn parse_joint(tokens: &mut Tokenizer<impl BufRead>) -> Result<Node> {
    let name = tokens.next_token("joint name")?;
    let mut node = Node::new(name);
    tokens.expect_keyword("{")?;

    node.offset = parse_offset(tokens)?;
    node.channels = parse_channels(tokens)?;

    loop {
        let token = tokens.next_token("JOINT, End Site, or }")?;
        if token == "}" {
            break;
        } else if token.eq_ignore_ascii_case("JOINT") {
            node.children.push(parse_joint(tokens)?);
        } else if token.eq_ignore_ascii_case("End") {
            tokens.expect_keyword("Site")?;
            tokens.expect_keyword("{")?;
            let offset = parse_offset(tokens)?;
            tokens.expect_keyword("}")?;
            node.children.push(Node::end_site(offset));
        } else {
            return Err(tokens.unexpected("JOINT, End Site, or }", &token));
        }
    }

    Ok(node)
}

fn parse_offset(tokens: &mut Tokenizer<impl BufRead>) -> Result<Vector3<f64>> {
    tokens.expect_keyword("OFFSET")?;
    let x = tokens.next_f64("offset x")?;
    let y = tokens.next_f64("offset y")?;
    let z = tokens.next_f64("offset z")?;
    Ok(Vector3::new(x, y, z))
}

fn parse_channels(tokens: &mut Tokenizer<impl BufRead>) -> Result<Vec<Channel>> {
    tokens.expect_keyword("CHANNELS")?;
    let count = tokens.next_usize("channel count")?;
    let mut channels = Vec::with_capacity(count);
    for _ in 0..count {
        let label = tokens.next_token("channel label")?;
        let channel =
            Channel::from_label(&label).ok_or_else(|| BvhError::InvalidChannel(label.clone()))?;
        channels.push(channel);
    }
    Ok(channels)
}

// ============================================================================
// Tokenizer
// ============================================================================

/// Whitespace tokenizer with line tracking over a buffered reader.
struct Tokenizer<R: BufRead> {
    reader: R,
    current: Vec<String>,
    pos: usize,
    line: usize,
}

impl<R: BufRead> Tokenizer<R> {
    fn new(reader: R) -> Self {
        Self {
            reader,
            current: Vec::new(),
            pos: 0,
            line: 0,
        }
    }

    /// Read lines until one carries at least one token. Returns false at EOF.
    fn refill(&mut self) -> Result<bool> {
        loop {
            if self.pos < self.current.len() {
                return Ok(true);
            }
            let mut line = String::new();
            if self.reader.read_line(&mut line)? == 0 {
                return Ok(false);
            }
            self.line += 1;
            self.current = line.split_whitespace().map(str::to_string).collect();
            self.pos = 0;
        }
    }

    fn next_token(&mut self, expected: &'static str) -> Result<String> {
        if !self.refill()? {
            return Err(BvhError::UnexpectedEof { expected });
        }
        let token = self.current[self.pos].clone();
        self.pos += 1;
        Ok(token)
    }

    fn expect_keyword(&mut self, keyword: &'static str) -> Result<()> {
        let token = self.next_token(keyword)?;
        if token.eq_ignore_ascii_case(keyword) {
            Ok(())
        } else {
            Err(self.unexpected(keyword, &token))
        }
    }

    fn next_f64(&mut self, expected: &'static str) -> Result<f64> {
        let token = self.next_token(expected)?;
        token
            .parse::<f64>()
            .map_err(|_| self.unexpected(expected, &token))
    }

    fn next_usize(&mut self, expected: &'static str) -> Result<usize> {
        let token = self.next_token(expected)?;
        token
            .parse::<usize>()
            .map_err(|_| self.unexpected(expected, &token))
    }

    /// Next non-empty line parsed entirely as floats, or None at EOF.
    ///
    /// Frame rows are line-delimited in the motion section, so a short or
    /// long row is detectable per line.
    fn next_value_row(&mut self) -> Result<Option<Vec<f64>>> {
        if !self.refill()? {
            return Ok(None);
        }
        let mut values = Vec::with_capacity(self.current.len() - self.pos);
        while self.pos < self.current.len() {
            let token = &self.current[self.pos];
            let value = token
                .parse::<f64>()
                .map_err(|_| BvhError::syntax(self.line, format!("expected number, got \"{token}\"")))?;
            values.push(value);
            self.pos += 1;
        }
        Ok(Some(values))
    }

    fn unexpected(&self, expected: &'static str, found: &str) -> BvhError {
        BvhError::syntax(self.line, format!("expected {expected}, got \"{found}\""))
    }
}
