//! The memcached `stats` text protocol.
//!
//! A command line is sent, then the server replies with `STAT <key> <value>`
//! lines terminated by a line `END`:
//!
//! ```text
//! > stats
//! < STAT pid 1162
//! < STAT curr_connections 5
//! < END
//! ```

use std::io::{self, BufRead, BufReader, Read, Write};

use tracing::trace;

use crate::collector::CollectError;

/// Terminator line of a stats response.
pub const END_LINE: &str = "END";

/// Marker token of a stats line.
pub const STAT_TAG: &str = "STAT";

/// Ordered key/value pairs as received.
pub type RawSample = Vec<(String, String)>;

/// Parses a single response line.
///
/// Returns `Ok(None)` for lines that are not tagged `STAT`; a `STAT` line
/// without both a key and a value is a [`CollectError::MalformedLine`].
/// Fields are separated by single spaces, anything after the value is ignored.
pub fn parse_stat_line(line: &str) -> Result<Option<(String, String)>, CollectError> {
    let mut fields = line.split(' ');
    if fields.next() != Some(STAT_TAG) {
        return Ok(None);
    }
    match (fields.next(), fields.next()) {
        (Some(key), Some(value)) => Ok(Some((key.to_string(), value.to_string()))),
        _ => Err(CollectError::MalformedLine(line.to_string())),
    }
}

/// Reads one stats response up to and including the `END` line.
///
/// Running out of input before `END` means the peer went away mid-response
/// and is reported as a [`CollectError::StreamError`].
pub fn read_stats<R: BufRead>(reader: &mut R) -> Result<RawSample, CollectError> {
    let mut sample = RawSample::new();
    let mut buf = String::new();

    loop {
        buf.clear();
        let n = reader
            .read_line(&mut buf)
            .map_err(CollectError::StreamError)?;
        if n == 0 {
            return Err(CollectError::StreamError(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "connection closed before END",
            )));
        }

        let line = buf.trim_end_matches(['\r', '\n']);
        if line == END_LINE {
            return Ok(sample);
        }
        if let Some(pair) = parse_stat_line(line)? {
            sample.push(pair);
        }
    }
}

/// Request/response client over one connection.
///
/// Commands are issued strictly one after another on the same stream.
pub struct StatsClient<S: Read + Write> {
    reader: BufReader<S>,
}

impl<S: Read + Write> StatsClient<S> {
    pub fn new(stream: S) -> Self {
        Self {
            reader: BufReader::new(stream),
        }
    }

    /// Sends `command` and reads its stats response.
    pub fn request(&mut self, command: &str) -> Result<RawSample, CollectError> {
        trace!("sending {:?}", command);
        write_command(self.reader.get_mut(), command).map_err(CollectError::StreamError)?;

        let sample = read_stats(&mut self.reader)?;
        trace!("{:?} returned {} stats", command, sample.len());
        Ok(sample)
    }
}

fn write_command<W: Write>(stream: &mut W, command: &str) -> io::Result<()> {
    stream.write_all(command.as_bytes())?;
    stream.write_all(b"\n")?;
    stream.flush()
}
