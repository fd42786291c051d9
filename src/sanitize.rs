//! Terminal control sequence removal.
//!
//! The supervised process runs inside a pseudo-terminal, so its output is
//! full of color codes, cursor movement and title updates. Everything here
//! turns that into plain text suitable for display and for pattern matching.
//!
//! Chunked reads routinely split escape sequences (and UTF-8 characters) in
//! two. [`ChunkDecoder`] holds back an incomplete tail until the next chunk
//! arrives; [`sanitize`] itself tolerates whatever fragments still slip
//! through.

use regex::Regex;
use std::sync::LazyLock;

/// `ESC [`, parameter bytes (`0-9 ; < = > ?`), intermediate bytes
/// (space to `/`), one final byte. Covers private modes like `?25l` and
/// `>0c` and cursor-style sequences like `ESC [ space q`.
static CSI_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\x1b\[[0-?]*[ -/]*[@-~]").expect("Invalid CSI regex"));

/// Operating system commands (window title etc.), BEL or ST terminated.
static OSC_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b\][^\x07\x1b]*(?:\x07|\x1b\\)").expect("Invalid OSC regex")
});

/// Two-character escapes and charset designations (`ESC ( B`, `ESC =`, ...).
static SHORT_ESCAPE_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\x1b(?:[()][0-9A-Za-z]|[=>78@-Z\\^_])").expect("Invalid escape regex")
});

/// C0 and C1 controls other than tab and newline. Includes any ESC left
/// over from a sequence the patterns above did not recognize.
static CONTROL_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[\x00-\x08\x0B-\x1F\x7F-\x{9F}]").expect("Invalid control regex")
});

/// Longest incomplete escape tail [`ChunkDecoder`] will hold back.
const MAX_ESCAPE_CARRY: usize = 32;

/// Strip terminal control sequences from `input`.
///
/// Printable text, newlines and tabs survive; everything else that looks
/// like terminal control is removed. Never fails on malformed input.
///
/// Escape sequences go first, then every remaining control character
/// (stray ESCs included), and last the bracket remnants whose ESC was lost
/// (`[33m`, `[K`). Nothing the last step keeps can form a new sequence, so
/// the result is idempotent.
///
/// ```
/// use mcpanel::sanitize::sanitize;
///
/// assert_eq!(sanitize("\x1b[32mHello\x1b[0m\n"), "Hello\n");
/// assert_eq!(sanitize("[33mWarn[m"), "Warn");
/// ```
pub fn sanitize(input: &str) -> String {
    let text = CSI_REGEX.replace_all(input, "");
    let text = OSC_REGEX.replace_all(&text, "");
    let text = SHORT_ESCAPE_REGEX.replace_all(&text, "");
    let text = CONTROL_REGEX.replace_all(&text, "");
    strip_bare_remnants(&text)
}

/// An unclosed `[` in the output, followed only by digits and semicolons.
struct OpenBracket {
    at: usize,
    semicolon: bool,
}

/// Remove `[` + digits/semicolons + `m` color remnants and `[` + digits +
/// `K J H A B C D` cursor remnants.
///
/// Works as a bracket stack in one pass: removing a remnant can splice its
/// neighbours into another one (`"[[33mm"` becomes `"[m"`), and the stack
/// removes that too without rescanning.
fn strip_bare_remnants(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    let mut open: Vec<OpenBracket> = Vec::new();

    for c in input.chars() {
        let closes = match c {
            'm' => !open.is_empty(),
            'K' | 'J' | 'H' | 'A' | 'B' | 'C' | 'D' => open.last().is_some_and(|o| !o.semicolon),
            _ => false,
        };
        if closes {
            if let Some(bracket) = open.pop() {
                out.truncate(bracket.at);
            }
            continue;
        }

        match c {
            '[' => open.push(OpenBracket {
                at: out.len(),
                semicolon: false,
            }),
            '0'..='9' => {}
            ';' => {
                if let Some(top) = open.last_mut() {
                    top.semicolon = true;
                }
            }
            _ => open.clear(),
        }
        out.push(c);
    }
    out
}

/// Incremental bytes-to-text decoder for chunked process output.
///
/// Carries two kinds of incomplete tail across chunk boundaries:
/// a partial UTF-8 character, and a partial escape sequence
/// (`ESC`, `ESC [`, `ESC [ 3 8 ;` ...).
#[derive(Debug, Default)]
pub struct ChunkDecoder {
    pending: Vec<u8>,
}

impl ChunkDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode the next chunk, returning the text that is safe to emit now.
    pub fn decode(&mut self, chunk: &[u8]) -> String {
        self.pending.extend_from_slice(chunk);
        let bytes = std::mem::take(&mut self.pending);

        let (mut text, rest) = decode_utf8_prefix(&bytes);
        self.pending = rest;

        if let Some(start) = incomplete_escape_start(&text) {
            let tail = text.split_off(start);
            let mut carried = tail.into_bytes();
            carried.extend_from_slice(&self.pending);
            self.pending = carried;
        }
        text
    }

    /// Emit whatever is still held back, e.g. when the stream ends.
    pub fn flush(&mut self) -> String {
        let bytes = std::mem::take(&mut self.pending);
        String::from_utf8_lossy(&bytes).into_owned()
    }
}

/// Split `bytes` into the longest decodable prefix and an incomplete
/// trailing character. Invalid sequences in the middle become U+FFFD.
fn decode_utf8_prefix(bytes: &[u8]) -> (String, Vec<u8>) {
    let mut out = String::with_capacity(bytes.len());
    let mut rest = bytes;
    loop {
        match std::str::from_utf8(rest) {
            Ok(valid) => {
                out.push_str(valid);
                return (out, Vec::new());
            }
            Err(err) => {
                let (valid, after) = rest.split_at(err.valid_up_to());
                // Safe: `valid_up_to` marks a UTF-8 boundary.
                out.push_str(std::str::from_utf8(valid).unwrap_or_default());
                match err.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        rest = &after[len..];
                    }
                    None => return (out, after.to_vec()),
                }
            }
        }
    }
}

/// Byte offset of an unterminated escape sequence at the end of `text`.
fn incomplete_escape_start(text: &str) -> Option<usize> {
    let start = text.rfind('\x1b')?;
    let tail = &text[start..];
    if tail.len() > MAX_ESCAPE_CARRY {
        return None;
    }
    let body = &tail[1..];
    let incomplete = match body.strip_prefix('[') {
        // Parameter and intermediate bytes only, no final byte yet.
        Some(params) => params.chars().all(|c| (' '..='?').contains(&c)),
        None => body.is_empty() || body == "(" || body == ")",
    };
    incomplete.then_some(start)
}
