//! Streaming input reader
//!
//! The input is one JSON array of record objects. Elements are scanned one at
//! a time on a blocking thread and handed to the async side over a bounded
//! channel, so memory stays flat regardless of input size. The reader only
//! enforces the outer framing and JSON syntax; each element is passed through
//! as unparsed [`RawValue`] text, so a value that is well-formed but not
//! representable (such as `1e400`) fails its own record in the decoder
//! instead of the whole run.

use serde::de::{self, Deserializer as _, SeqAccess, Visitor};
use serde_json::value::RawValue;
use std::fmt;
use std::io::{BufReader, Read};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// One array element exactly as it appeared in the input
pub type RawRecord = Box<RawValue>;

/// Default number of parsed records buffered ahead of the reconciler
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

struct RecordVisitor<'a> {
    tx: &'a mpsc::Sender<RawRecord>,
}

impl<'de, 'a> Visitor<'de> for RecordVisitor<'a> {
    type Value = usize;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a JSON array of records")
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<usize, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut count = 0;
        while let Some(record) = seq.next_element::<RawRecord>()? {
            if self.tx.blocking_send(record).is_err() {
                return Err(de::Error::custom("record consumer stopped"));
            }
            count += 1;
        }
        Ok(count)
    }
}

/// Parse `input` and send each array element to `tx`
///
/// Blocks the calling thread. Returns the number of records sent. Errors on
/// a non-array top level, malformed JSON anywhere in the stream, trailing
/// content after the array, or a closed receiver.
pub fn read_records<R: Read>(
    input: R,
    tx: mpsc::Sender<RawRecord>,
) -> Result<usize, serde_json::Error> {
    let mut de = serde_json::Deserializer::from_reader(BufReader::new(input));
    let count = (&mut de).deserialize_seq(RecordVisitor { tx: &tx })?;
    de.end()?;
    Ok(count)
}

/// Start [`read_records`] on the blocking pool
///
/// Records arrive on the receiver in input order. The receiver closes when
/// the reader finishes; the handle then yields the record count or the parse
/// error that stopped it.
pub fn spawn_record_reader<R>(
    input: R,
    capacity: usize,
) -> (
    mpsc::Receiver<RawRecord>,
    JoinHandle<Result<usize, serde_json::Error>>,
)
where
    R: Read + Send + 'static,
{
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let handle = tokio::task::spawn_blocking(move || read_records(input, tx));
    (rx, handle)
}
