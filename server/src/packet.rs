/// Sequential reader over one relay frame.
///
/// Strings on the wire are raw bytes terminated by a single NUL. The reader
/// never looks past the end of the supplied slice; a truncated frame is an
/// expected failure, reported as `None` from the read methods.
pub struct PacketReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PacketReader<'a> {
    pub fn new(buf: &'a [u8]) -> Self {
        PacketReader { buf, pos: 0 }
    }

    /// Consume and return the next byte, or `None` when the frame is
    /// exhausted. Exhaustion is a decode failure, not a zero-fill.
    pub fn read_u8(&mut self) -> Option<u8> {
        let b = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(b)
    }

    /// Consume bytes up to and including the next NUL and return the string
    /// without the terminator. Returns `None` without advancing when no
    /// terminator exists before the end of the frame.
    pub fn try_read_string(&mut self) -> Option<String> {
        let rest = &self.buf[self.pos..];
        let nul = rest.iter().position(|&b| b == 0)?;
        let s = String::from_utf8_lossy(&rest[..nul]).into_owned();
        self.pos += nul + 1;
        Some(s)
    }

    /// Bytes left in the frame.
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }
}

/// Accumulates one outbound frame. Single-use: construct, populate, `build`.
#[derive(Default)]
pub struct PacketBuilder {
    buf: Vec<u8>,
}

impl PacketBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_u8(&mut self, b: u8) {
        self.buf.push(b);
    }

    /// Append the string's bytes followed by one NUL terminator.
    pub fn write_cstring(&mut self, s: &str) {
        self.buf.extend_from_slice(s.as_bytes());
        self.buf.push(0);
    }

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}
