//! Binary streams of numbers with a selectable byte order.

use std::io::{Read, Write};

use byteorder::{BigEndian, LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::errors::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Endianness {
    Little,
    Big,
}

impl Default for Endianness {
    fn default() -> Self {
        Endianness::Little
    }
}

impl Endianness {
    /// The byte order of the target.
    pub fn native() -> Self {
        if cfg!(target_endian = "big") {
            Endianness::Big
        } else {
            Endianness::Little
        }
    }
}

/// Writes numbers into a `Write` in the byte order it was created with.
#[derive(Debug)]
pub struct DataWriter<W: Write> {
    writer: W,
    endianness: Endianness,
    written: usize,
}

impl<W: Write> DataWriter<W> {
    pub fn new(writer: W, endianness: Endianness) -> Self {
        DataWriter {
            writer,
            endianness,
            written: 0,
        }
    }

    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    #[inline]
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Number of bytes written so far.
    #[inline]
    pub fn written(&self) -> usize {
        self.written
    }

    #[inline]
    pub fn get_ref(&self) -> &W {
        &self.writer
    }

    #[inline]
    pub fn into_inner(self) -> W {
        self.writer
    }

    pub fn write_u8(&mut self, v: u8) -> Result<()> {
        self.writer.write_u8(v)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_i8(&mut self, v: i8) -> Result<()> {
        self.writer.write_i8(v)?;
        self.written += 1;
        Ok(())
    }

    pub fn write_bytes(&mut self, v: &[u8]) -> Result<()> {
        self.writer.write_all(v)?;
        self.written += v.len();
        Ok(())
    }

    /// Writes a string as its length in bytes (`u32`) followed by its UTF-8
    /// encoding.
    pub fn write_string(&mut self, v: &str) -> Result<()> {
        self.write_u32(v.len() as u32)?;
        self.write_bytes(v.as_bytes())
    }

    pub fn flush(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}

macro_rules! impl_write {
    ($($write:ident, $write_slice:ident, $ty:ty;)*) => {
        impl<W: Write> DataWriter<W> {
            $(
                pub fn $write(&mut self, v: $ty) -> Result<()> {
                    match self.endianness {
                        Endianness::Little => self.writer.$write::<LittleEndian>(v)?,
                        Endianness::Big => self.writer.$write::<BigEndian>(v)?,
                    }

                    self.written += ::std::mem::size_of::<$ty>();
                    Ok(())
                }

                pub fn $write_slice(&mut self, v: &[$ty]) -> Result<()> {
                    for &item in v {
                        self.$write(item)?;
                    }

                    Ok(())
                }
            )*
        }
    };
}

impl_write!(
    write_u16, write_u16_slice, u16;
    write_i16, write_i16_slice, i16;
    write_u32, write_u32_slice, u32;
    write_i32, write_i32_slice, i32;
    write_u64, write_u64_slice, u64;
    write_i64, write_i64_slice, i64;
    write_f32, write_f32_slice, f32;
    write_f64, write_f64_slice, f64;
);

/// Reads numbers from a `Read` in the byte order it was created with.
#[derive(Debug)]
pub struct DataReader<R: Read> {
    reader: R,
    endianness: Endianness,
    read: usize,
}

impl<R: Read> DataReader<R> {
    pub fn new(reader: R, endianness: Endianness) -> Self {
        DataReader {
            reader,
            endianness,
            read: 0,
        }
    }

    #[inline]
    pub fn endianness(&self) -> Endianness {
        self.endianness
    }

    #[inline]
    pub fn set_endianness(&mut self, endianness: Endianness) {
        self.endianness = endianness;
    }

    /// Number of bytes read so far.
    #[inline]
    pub fn bytes_read(&self) -> usize {
        self.read
    }

    #[inline]
    pub fn into_inner(self) -> R {
        self.reader
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        let v = self.reader.read_u8()?;
        self.read += 1;
        Ok(v)
    }

    pub fn read_i8(&mut self) -> Result<i8> {
        let v = self.reader.read_i8()?;
        self.read += 1;
        Ok(v)
    }

    pub fn read_bytes(&mut self, out: &mut [u8]) -> Result<()> {
        self.reader.read_exact(out)?;
        self.read += out.len();
        Ok(())
    }

    /// Reads a string written by `DataWriter::write_string`. The buffer grows
    /// with the bytes actually read, never with the declared length.
    pub fn read_string(&mut self) -> Result<String> {
        let len = self.read_u32()?;

        let mut bytes = Vec::new();
        let n = (&mut self.reader).take(u64::from(len)).read_to_end(&mut bytes)?;
        self.read += n;

        if n != len as usize {
            return Err(Error::Serialization(format!(
                "String of {} bytes ends after {} bytes.",
                len, n
            )));
        }

        String::from_utf8(bytes).map_err(|err| Error::Serialization(format!("{}", err)))
    }
}

macro_rules! impl_read {
    ($($read:ident, $read_slice:ident, $ty:ty;)*) => {
        impl<R: Read> DataReader<R> {
            $(
                pub fn $read(&mut self) -> Result<$ty> {
                    let v = match self.endianness {
                        Endianness::Little => self.reader.$read::<LittleEndian>()?,
                        Endianness::Big => self.reader.$read::<BigEndian>()?,
                    };

                    self.read += ::std::mem::size_of::<$ty>();
                    Ok(v)
                }

                /// Fills `out` completely.
                pub fn $read_slice(&mut self, out: &mut [$ty]) -> Result<()> {
                    for item in out.iter_mut() {
                        *item = self.$read()?;
                    }

                    Ok(())
                }
            )*
        }
    };
}

impl_read!(
    read_u16, read_u16_slice, u16;
    read_i16, read_i16_slice, i16;
    read_u32, read_u32_slice, u32;
    read_i32, read_i32_slice, i32;
    read_u64, read_u64_slice, u64;
    read_i64, read_i64_slice, i64;
    read_f32, read_f32_slice, f32;
    read_f64, read_f64_slice, f64;
);
