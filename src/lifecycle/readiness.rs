//! Readiness detection over sanitized output.
//!
//! Readiness is a heuristic: the server prints a well-known banner once it
//! has finished loading. Seeing it does not prove the process is healthy,
//! and nothing times out if it never appears.

/// Decides whether a sanitized output line means the process is ready.
pub trait ReadinessProbe: Send + Sync {
    fn is_ready(&self, line: &str) -> bool;
}

/// Ready when every configured marker appears in the same line.
#[derive(Debug, Clone)]
pub struct MarkerProbe {
    markers: Vec<String>,
}

impl MarkerProbe {
    /// An empty marker list never matches.
    pub fn new(markers: Vec<String>) -> Self {
        Self { markers }
    }

    pub fn markers(&self) -> &[String] {
        &self.markers
    }
}

impl ReadinessProbe for MarkerProbe {
    fn is_ready(&self, line: &str) -> bool {
        !self.markers.is_empty() && self.markers.iter().all(|m| line.contains(m.as_str()))
    }
}

/// Cap on the partial line kept between chunks.
const MAX_PARTIAL_LINE: usize = 8 * 1024;

/// Reassembles lines from arbitrary text chunks and runs a probe on them.
///
/// The trailing partial line is probed as well, because a prompt-style
/// banner may arrive without its newline for a while.
#[derive(Debug, Default)]
pub struct LineScanner {
    partial: String,
}

impl LineScanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a sanitized chunk. Returns true if any line in it (including
    /// the pending partial line) satisfies `probe`.
    pub fn feed(&mut self, chunk: &str, probe: &dyn ReadinessProbe) -> bool {
        self.partial.push_str(chunk);
        let mut ready = false;

        while let Some(pos) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=pos).collect();
            ready |= probe.is_ready(line.trim_end_matches('\n'));
        }

        if !self.partial.is_empty() {
            ready |= probe.is_ready(&self.partial);
        }
        if self.partial.len() > MAX_PARTIAL_LINE {
            let mut cut = self.partial.len() - MAX_PARTIAL_LINE;
            while !self.partial.is_char_boundary(cut) {
                cut += 1;
            }
            self.partial.drain(..cut);
        }
        ready
    }
}
