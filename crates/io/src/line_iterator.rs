use std::io;
use std::io::BufRead;
use std::io::BufReader;
use std::io::Read;

use log::warn;
use streaming_iterator::StreamingIterator;

/// Iterates over the lines of a reader without allocating a new string for
/// every line. The line terminator (`\n` or `\r\n`) is removed.
///
/// Note that the reader is buffered internally using a `BufReader`. An I/O
/// error ends the iteration, and can be retrieved with [LineIterator::take_error].
pub struct LineIterator<T: Read> {
    reader: BufReader<T>,
    line: String,
    end: bool,
    error: Option<io::Error>,
}

impl<T: Read> LineIterator<T> {
    pub fn new(reader: T) -> LineIterator<T> {
        LineIterator {
            reader: BufReader::new(reader),
            line: String::new(),
            end: false,
            error: None,
        }
    }

    /// Returns the I/O error that ended the iteration, if any.
    pub fn take_error(&mut self) -> Option<io::Error> {
        self.error.take()
    }
}

impl<T: Read> StreamingIterator for LineIterator<T> {
    type Item = String;

    fn advance(&mut self) {
        self.line.clear();

        match self.reader.read_line(&mut self.line) {
            Ok(0) => {
                self.end = true;
            }
            Ok(_) => {
                let trimmed = self.line.trim_end_matches(['\n', '\r']).len();
                self.line.truncate(trimmed);
            }
            Err(error) => {
                warn!("Reading stopped due to {error}");
                self.error = Some(error);
                self.end = true;
            }
        }
    }

    fn get(&self) -> Option<&Self::Item> {
        if self.end { None } else { Some(&self.line) }
    }
}
