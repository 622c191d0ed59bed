//! A positioned big-endian cursor over a PGDF buffer
use crate::error::{Error, ErrorKind, Result};
use binrw::io::{self, Cursor, Read, Seek};
use binrw::{BinRead, BinResult, Endian};

/// A 16-bit length-prefixed UTF-8 string
///
/// PAMGuard writes strings with Java's `writeUTF` convention: an `i16`
/// length followed by that many bytes. A length of zero or less is an
/// empty string and only the length field is consumed.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct JavaString(pub String);

impl JavaString {
    /// The number of bytes this string occupies in the file
    pub fn encoded_len(&self) -> usize {
        2 + self.0.len()
    }

    /// Unwrap the decoded string
    pub fn into_string(self) -> String {
        self.0
    }
}

impl BinRead for JavaString {
    type Args<'a> = ();

    fn read_options<R: Read + Seek>(
        reader: &mut R,
        endian: Endian,
        _args: Self::Args<'_>,
    ) -> BinResult<Self> {
        let pos = reader.stream_position()?;
        let length = i16::read_options(reader, endian, ())?;
        if length <= 0 {
            return Ok(JavaString(String::new()));
        }
        let mut buf = vec![0; length as usize];
        reader.read_exact(&mut buf)?;
        String::from_utf8(buf)
            .map(JavaString)
            .map_err(|e| binrw::Error::Custom {
                pos,
                err: Box::new(e),
            })
    }
}

/// Read a count field that may be negative as a collection length
pub(crate) fn to_len(n: impl Into<i64>) -> usize {
    usize::try_from(n.into()).unwrap_or(0)
}

/// Record the stream position without consuming any bytes
pub(crate) fn stream_position<R: Read + Seek>(
    reader: &mut R,
    _endian: Endian,
    _args: (),
) -> BinResult<u64> {
    Ok(reader.stream_position()?)
}

/// A cursor over an in-memory PGDF buffer
///
/// Every read is big-endian. Failures carry the offset at which the read
/// started.
#[derive(Debug, Clone)]
pub struct Reader<'a> {
    cursor: Cursor<&'a [u8]>,
}

impl<'a> Reader<'a> {
    /// Create a reader positioned at the start of `buf`
    pub fn new(buf: &'a [u8]) -> Self {
        Reader {
            cursor: Cursor::new(buf),
        }
    }

    /// The current offset into the buffer
    pub fn position(&self) -> u64 {
        self.cursor.position()
    }

    /// The total length of the buffer
    pub fn len(&self) -> u64 {
        self.cursor.get_ref().len() as u64
    }

    /// Whether the buffer is empty
    pub fn is_empty(&self) -> bool {
        self.cursor.get_ref().is_empty()
    }

    /// Bytes left between the cursor and the end of the buffer
    pub fn remaining(&self) -> u64 {
        self.len().saturating_sub(self.position())
    }

    /// Whether the cursor has reached the end of the buffer
    pub fn is_at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// Move the cursor to an absolute offset
    ///
    /// Seeking to the end of the buffer is allowed, seeking past it fails
    /// with [`ErrorKind::TruncatedRecord`].
    pub fn seek(&mut self, offset: u64) -> Result<()> {
        if offset > self.len() {
            return Err(Error::new(self.position(), ErrorKind::TruncatedRecord));
        }
        self.cursor.set_position(offset);
        Ok(())
    }

    /// Read any big-endian binrw type that takes no arguments
    pub fn read<T>(&mut self) -> Result<T>
    where
        T: for<'b> BinRead<Args<'b> = ()>,
    {
        self.read_args(())
    }

    /// Read a big-endian binrw type with arguments
    pub fn read_args<T: BinRead>(&mut self, args: T::Args<'_>) -> Result<T> {
        let pos = self.position();
        T::read_options(&mut self.cursor, Endian::Big, args).map_err(|e| {
            // leave the cursor where the failed read began
            self.cursor.set_position(pos);
            Error::from_binrw(e, pos)
        })
    }

    /// Read a signed byte
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read()
    }

    /// Read an unsigned byte
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read()
    }

    /// Read a byte as a boolean, any non-zero value is `true`
    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.read_u8()? != 0)
    }

    /// Read a big-endian `i16`
    pub fn read_i16(&mut self) -> Result<i16> {
        self.read()
    }

    /// Read a big-endian `i32`
    pub fn read_i32(&mut self) -> Result<i32> {
        self.read()
    }

    /// Read a big-endian `i64`
    pub fn read_i64(&mut self) -> Result<i64> {
        self.read()
    }

    /// Read a big-endian `f32`
    pub fn read_f32(&mut self) -> Result<f32> {
        self.read()
    }

    /// Read a big-endian `f64`
    pub fn read_f64(&mut self) -> Result<f64> {
        self.read()
    }

    /// Read `n` raw bytes
    pub fn read_bytes(&mut self, n: usize) -> Result<Vec<u8>> {
        let pos = self.position();
        if (n as u64) > self.remaining() {
            return Err(Error::new(pos, ErrorKind::TruncatedRecord));
        }
        let mut buf = vec![0; n];
        io::Read::read_exact(&mut self.cursor, &mut buf)
            .map_err(|e| Error::from_binrw(e.into(), pos))?;
        Ok(buf)
    }

    /// Read exactly `n` bytes as a UTF-8 string
    pub fn read_fixed_string(&mut self, n: usize) -> Result<String> {
        let pos = self.position();
        let bytes = self.read_bytes(n)?;
        String::from_utf8(bytes)
            .map_err(|e| Error::new(pos, ErrorKind::Malformed(e.to_string())))
    }

    /// Read a 16-bit length-prefixed string
    ///
    /// Returns the string and the number of bytes consumed, which is always
    /// the two length bytes plus the string bytes.
    pub fn read_java_string(&mut self) -> Result<(String, usize)> {
        let s: JavaString = self.read()?;
        let consumed = s.encoded_len();
        Ok((s.into_string(), consumed))
    }
}
