//! Streaming decoder driving the grammars.
//!
//! Bytes can be fed in fragments of any size. Nested messages are decoded
//! by pushing a frame for the child grammar on an explicit stack instead of
//! recursing, and every constructed element opens a scope that tracks how
//! many of its declared octets are still expected.

use super::grammar::{Frame, Step};
use super::tlv::{Tlv, TlvReader};
use crate::core::messages::{Message, MessageType};
use crate::error::{Error, ProtocolError, Result};
use log::{debug, error};
use std::io::{ErrorKind, Read};

const DEFAULT_MAX_PDU_SIZE: usize = 1024 * 1024;
const DEFAULT_MAX_DEPTH: usize = 32;
const DEFAULT_READ_CHUNK_SIZE: usize = 4096;

#[derive(Clone, Debug)]
pub struct DecoderConfig {
    pub max_pdu_size: usize,
    pub max_depth: usize,
    pub read_chunk_size: usize,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        return Self {
            max_pdu_size: DEFAULT_MAX_PDU_SIZE,
            max_depth: DEFAULT_MAX_DEPTH,
            read_chunk_size: DEFAULT_READ_CHUNK_SIZE,
        };
    }
}

impl DecoderConfig {
    pub fn max_pdu_size(mut self, max_pdu_size: usize) -> Self {
        self.max_pdu_size = max_pdu_size;
        return self;
    }

    pub fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        return self;
    }

    pub fn read_chunk_size(mut self, read_chunk_size: usize) -> Self {
        self.read_chunk_size = read_chunk_size.max(1);
        return self;
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum ScopeKind {
    /// Explicit tag, holds exactly one element.
    Explicit,
    /// SEQUENCE or SEQUENCE OF, holds any number of elements.
    Constructed,
}

#[derive(Debug)]
struct Scope {
    kind: ScopeKind,
    remaining: usize,
}

struct FrameSlot {
    frame: Box<dyn Frame>,
    /// Number of open scopes when the frame started. The frame is complete
    /// when the stack shrinks back to this size.
    base: usize,
}

enum Phase {
    Header,
    Value { remaining: usize, value: Vec<u8> },
    Skip { remaining: usize },
    Done(Option<Message>),
    Failed,
}

pub struct Asn1Decoder {
    config: DecoderConfig,
    message_type: MessageType,
    reader: TlvReader,
    frames: Vec<FrameSlot>,
    scopes: Vec<Scope>,
    phase: Phase,
    consumed: usize,
    /// Total length of the message, known once its outer header is read.
    total: Option<usize>,
}

impl Asn1Decoder {
    pub fn new(message_type: MessageType) -> Self {
        return Self::with_config(message_type, DecoderConfig::default());
    }

    pub fn with_config(message_type: MessageType, config: DecoderConfig) -> Self {
        return Self {
            config,
            message_type,
            reader: TlvReader::new(),
            frames: vec![FrameSlot {
                frame: message_type.new_frame(),
                base: 0,
            }],
            scopes: Vec::new(),
            phase: Phase::Header,
            consumed: 0,
            total: None,
        };
    }

    /// Number of bytes consumed so far.
    pub fn consumed(&self) -> usize {
        return self.consumed;
    }

    /// Bytes still missing from the message, once its outer header has been
    /// read. Feeding no more than this never consumes past the message.
    pub fn remaining(&self) -> Option<usize> {
        return self.total.map(|total| total.saturating_sub(self.consumed));
    }

    pub fn is_complete(&self) -> bool {
        if let Phase::Done(_) = self.phase {
            return true;
        }
        return false;
    }

    /// Feeds the next fragment. Returns the message once its last byte has
    /// been consumed. Any error aborts the decode and drops every partially
    /// decoded value.
    pub fn feed(&mut self, chunk: &[u8]) -> Result<Option<Message>> {
        match self.process(chunk) {
            Ok(()) => {}
            Err(err) => {
                self.abort();
                return Err(err);
            }
        }

        if let Phase::Done(message) = &mut self.phase {
            return Ok(message.take());
        }
        return Ok(None);
    }

    /// Signals the end of the stream.
    pub fn finish(&mut self) -> Result<()> {
        match self.phase {
            Phase::Done(_) => return Ok(()),
            Phase::Failed => return Err(ProtocolError::Aborted)?,
            _ => {
                self.abort();
                return Err(ProtocolError::Truncated)?;
            }
        }
    }

    fn abort(&mut self) {
        self.frames.clear();
        self.scopes.clear();
        self.phase = Phase::Failed;
    }

    fn process(&mut self, chunk: &[u8]) -> Result<()> {
        let mut input = chunk;

        while !input.is_empty() {
            match &mut self.phase {
                Phase::Header => {
                    let octet = input[0];
                    input = &input[1..];
                    self.consumed += 1;
                    if let Some(tlv) = self.reader.push(octet)? {
                        self.on_header(tlv)?;
                    }
                }
                Phase::Value { remaining, value } => {
                    let taken = (*remaining).min(input.len());
                    value.extend_from_slice(&input[..taken]);
                    *remaining -= taken;
                    input = &input[taken..];
                    self.consumed += taken;
                    if *remaining == 0 {
                        let value = std::mem::take(value);
                        self.phase = Phase::Header;
                        self.top_frame()?.store(&value)?;
                        self.element_done()?;
                    }
                }
                Phase::Skip { remaining } => {
                    let taken = (*remaining).min(input.len());
                    *remaining -= taken;
                    input = &input[taken..];
                    self.consumed += taken;
                    if *remaining == 0 {
                        self.phase = Phase::Header;
                        self.element_done()?;
                    }
                }
                Phase::Done(_) => {
                    return Err(ProtocolError::TrailingBytes(input.len()))?;
                }
                Phase::Failed => {
                    return Err(ProtocolError::Aborted)?;
                }
            }
        }

        return Ok(());
    }

    fn top_frame(&mut self) -> Result<&mut Box<dyn Frame>> {
        return self
            .frames
            .last_mut()
            .map(|slot| &mut slot.frame)
            .ok_or(Error::from(ProtocolError::Aborted));
    }

    fn on_header(&mut self, tlv: Tlv) -> Result<()> {
        self.account(&tlv)?;

        let step = self.resolve(&tlv)?;
        let allow_empty = match step {
            Step::Explicit { allow_empty }
            | Step::Constructed { allow_empty }
            | Step::Primitive { allow_empty } => allow_empty,
            Step::Skip => true,
            Step::Nested(_) => false,
        };

        if tlv.length == 0 && !allow_empty {
            error!("Zero length TLV for {}", tlv.tag);
            return Err(ProtocolError::ZeroLength(tlv.tag))?;
        }

        match step {
            Step::Explicit { .. } | Step::Constructed { .. } => {
                if tlv.length == 0 {
                    self.top_frame()?.scope_closed();
                    return self.element_done();
                }
                if self.scopes.len() >= self.config.max_depth {
                    return Err(ProtocolError::TooDeep(self.config.max_depth))?;
                }
                let kind = if let Step::Explicit { .. } = step {
                    ScopeKind::Explicit
                } else {
                    ScopeKind::Constructed
                };
                self.scopes.push(Scope {
                    kind,
                    remaining: tlv.length,
                });
            }
            Step::Primitive { .. } => {
                if tlv.length == 0 {
                    self.top_frame()?.store(&[])?;
                    return self.element_done();
                }
                self.phase = Phase::Value {
                    remaining: tlv.length,
                    value: Vec::with_capacity(tlv.length.min(DEFAULT_READ_CHUNK_SIZE)),
                };
            }
            Step::Skip => {
                if tlv.length == 0 {
                    return self.element_done();
                }
                self.phase = Phase::Skip {
                    remaining: tlv.length,
                };
            }
            Step::Nested(_) => {
                return Err(ProtocolError::invalid(
                    "grammar",
                    "nested message cannot start with a nested message",
                ))?;
            }
        }

        return Ok(());
    }

    /// Charges the whole TLV to the innermost open scope. A TLV larger than
    /// what remains of its scope is an over-read.
    fn account(&mut self, tlv: &Tlv) -> Result<()> {
        let total = tlv.total_length();
        match self.scopes.last_mut() {
            Some(scope) => {
                if total > scope.remaining {
                    error!(
                        "{} of {} bytes overruns its enclosing scope of {} bytes",
                        tlv.tag, total, scope.remaining
                    );
                    return Err(ProtocolError::LengthMismatch {
                        expected: scope.remaining,
                        actual: total,
                    })?;
                }
                scope.remaining -= total;
            }
            None => {
                if total > self.config.max_pdu_size {
                    return Err(ProtocolError::TooLarge(total))?;
                }
                self.total = Some(total);
            }
        }
        return Ok(());
    }

    /// Runs the grammar of the top frame for the tag. When the tag starts a
    /// nested message, a child frame is pushed and the same tag is replayed
    /// on the child grammar, since it is the first tag of the child.
    fn resolve(&mut self, tlv: &Tlv) -> Result<Step> {
        let step = self.top_frame()?.transit(tlv.tag)?;

        if let Step::Nested(message_type) = step {
            if self.frames.len() >= self.config.max_depth {
                return Err(ProtocolError::TooDeep(self.config.max_depth))?;
            }
            let mut child = message_type.new_frame();
            let child_step = child.transit(tlv.tag)?;
            self.frames.push(FrameSlot {
                frame: child,
                base: self.scopes.len(),
            });
            return Ok(child_step);
        }

        return Ok(step);
    }

    /// Called each time an element has been fully consumed. Closes the
    /// scopes and frames that end with it.
    fn element_done(&mut self) -> Result<()> {
        loop {
            let base = match self.frames.last() {
                Some(slot) => slot.base,
                None => return Err(ProtocolError::Aborted)?,
            };

            if self.scopes.len() == base {
                let slot = match self.frames.pop() {
                    Some(slot) => slot,
                    None => return Err(ProtocolError::Aborted)?,
                };
                let message = slot.frame.finish()?;

                match self.frames.last_mut() {
                    Some(parent) => {
                        debug!("Decoded nested {}", message.name());
                        parent.frame.merge(message)?;
                        continue;
                    }
                    None => {
                        debug!(
                            "Decoded {} of {} bytes",
                            self.message_type.name(),
                            self.consumed
                        );
                        self.phase = Phase::Done(Some(message));
                        return Ok(());
                    }
                }
            }

            let scope = match self.scopes.last() {
                Some(scope) => scope,
                None => return Err(ProtocolError::Aborted)?,
            };

            if scope.remaining > 0 {
                if scope.kind == ScopeKind::Explicit {
                    error!(
                        "{} bytes left after the element of an explicit tag",
                        scope.remaining
                    );
                    return Err(ProtocolError::LengthMismatch {
                        expected: 0,
                        actual: scope.remaining,
                    })?;
                }
                return Ok(());
            }

            self.scopes.pop();
            self.top_frame()?.scope_closed();
        }
    }
}

/// Decodes one message reading the stream until it is complete.
///
/// Reads stop at the last byte of the message, so further messages on the
/// same stream are left unread. The outer header is read one byte at a
/// time, wrap slow streams in a `BufReader`.
pub fn decode<R: Read>(message_type: MessageType, stream: R) -> Result<Message> {
    return decode_with_config(message_type, stream, DecoderConfig::default());
}

/// Like [`decode`], reading at most `read_chunk_size` bytes per call.
pub fn decode_with_config<R: Read>(
    message_type: MessageType,
    mut stream: R,
    config: DecoderConfig,
) -> Result<Message> {
    let mut buffer = vec![0u8; config.read_chunk_size];
    let mut decoder = Asn1Decoder::with_config(message_type, config);

    loop {
        let wanted = match decoder.remaining() {
            Some(remaining) => remaining.min(buffer.len()),
            None => 1,
        };
        let read = match stream.read(&mut buffer[..wanted]) {
            Ok(read) => read,
            Err(err) if err.kind() == ErrorKind::Interrupted => continue,
            Err(err) => return Err(("Error reading message stream", err))?,
        };

        if read == 0 {
            decoder.finish()?;
            return Err(ProtocolError::Truncated)?;
        }

        if let Some(message) = decoder.feed(&buffer[..read])? {
            return Ok(message);
        }
    }
}

/// Decodes a buffer holding exactly one message.
pub fn decode_slice(message_type: MessageType, raw: &[u8]) -> Result<Message> {
    let mut decoder = Asn1Decoder::new(message_type);
    if let Some(message) = decoder.feed(raw)? {
        return Ok(message);
    }
    decoder.finish()?;
    return Err(ProtocolError::Truncated)?;
}
