//! 16-bit PCM WAV codec
//!
//! Reads and writes the canonical 44-byte RIFF/WAVE header followed by
//! little-endian signed 16-bit samples.
//!
//! Decoding keeps each sample's raw integer magnitude. The sample count comes
//! from the RIFF chunk size and is truncated to whole seconds:
//! `floor(floor(chunk_size / bytes_per_sample) / sample_rate) * sample_rate`.
//! Encoding divides by the signal peak (floored at 1.0) and scales by
//! 32768 before truncating to `i16`.

use crate::{utils::normalization_peak, AudioError, AudioResult, Sample, Signal, SAMPLE_RATE};
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt, WriteBytesExt};
use std::fs::File;
use std::io::{self, BufWriter, Read, Write};
use std::path::Path;
use tracing::{debug, warn};

/// Size of the canonical header in bytes.
pub const HEADER_LEN: usize = 44;

/// Bits per encoded sample.
pub const BITS_PER_SAMPLE: u16 = 16;

/// Scale between `[-1, 1]` and the 16-bit integer range.
pub const MAX_SHORT_VALUE: Sample = 32768.0;

const BYTES_PER_SAMPLE: u16 = BITS_PER_SAMPLE / 8;
const FMT_CHUNK_SIZE: u32 = 16;
const PCM_FORMAT: u16 = 1;

/// Parsed or to-be-written WAV header.
///
/// Chunk identifiers are implied; every other field of the 44-byte layout
/// is kept as read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WavHeader {
    /// RIFF form size, `36 + data_size` for a canonical file.
    pub chunk_size: u32,
    /// Size of the `fmt ` chunk body (16 for PCM).
    pub fmt_chunk_size: u32,
    /// Format tag, 1 for PCM.
    pub audio_format: u16,
    /// Channel count.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// `sample_rate * block_align`
    pub byte_rate: u32,
    /// `channels * bytes_per_sample`
    pub block_align: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// Size of the `data` chunk in bytes.
    pub data_size: u32,
}

impl WavHeader {
    /// Canonical 16-bit PCM header at [`SAMPLE_RATE`] for `sample_count` samples.
    ///
    /// # Errors
    /// Fails with [`io::ErrorKind::InvalidInput`] when the data chunk would not
    /// fit the 32-bit RIFF size field.
    pub fn pcm16(channels: u16, sample_count: usize) -> io::Result<Self> {
        let data_size = sample_count
            .checked_mul(usize::from(BYTES_PER_SAMPLE))
            .and_then(|bytes| u32::try_from(bytes).ok())
            .filter(|&bytes| bytes <= u32::MAX - 36)
            .ok_or_else(|| {
                io::Error::new(
                    io::ErrorKind::InvalidInput,
                    format!("{sample_count} samples exceed the WAV size limit"),
                )
            })?;
        let block_align = channels.saturating_mul(BYTES_PER_SAMPLE);

        Ok(Self {
            chunk_size: 36 + data_size,
            fmt_chunk_size: FMT_CHUNK_SIZE,
            audio_format: PCM_FORMAT,
            channels,
            sample_rate: SAMPLE_RATE,
            byte_rate: SAMPLE_RATE * u32::from(block_align),
            block_align,
            bits_per_sample: BITS_PER_SAMPLE,
            data_size,
        })
    }

    /// Read the 44-byte header from a stream.
    ///
    /// Chunk identifiers are read but not enforced; a mismatch is logged.
    pub fn read_from<R: Read>(reader: &mut R) -> io::Result<Self> {
        let riff = read_tag(reader)?;
        let chunk_size = read_u32_le(reader)?;
        let wave = read_tag(reader)?;
        let fmt = read_tag(reader)?;
        let fmt_chunk_size = read_u32_le(reader)?;
        let audio_format = read_u16_le(reader)?;
        let channels = read_u16_le(reader)?;
        let sample_rate = read_u32_le(reader)?;
        let byte_rate = read_u32_le(reader)?;
        let block_align = read_u16_le(reader)?;
        let bits_per_sample = read_u16_le(reader)?;
        let data = read_tag(reader)?;
        let data_size = read_u32_le(reader)?;

        if &riff != b"RIFF" || &wave != b"WAVE" || &fmt != b"fmt " || &data != b"data" {
            warn!("non-canonical WAV chunk identifiers, reading fields positionally");
        }

        Ok(Self {
            chunk_size,
            fmt_chunk_size,
            audio_format,
            channels,
            sample_rate,
            byte_rate,
            block_align,
            bits_per_sample,
            data_size,
        })
    }

    /// Write the 44-byte header to a stream.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        writer.write_all(b"RIFF")?;
        write_u32_le(writer, self.chunk_size)?;
        writer.write_all(b"WAVE")?;
        writer.write_all(b"fmt ")?;
        write_u32_le(writer, self.fmt_chunk_size)?;
        write_u16_le(writer, self.audio_format)?;
        write_u16_le(writer, self.channels)?;
        write_u32_le(writer, self.sample_rate)?;
        write_u32_le(writer, self.byte_rate)?;
        write_u16_le(writer, self.block_align)?;
        write_u16_le(writer, self.bits_per_sample)?;
        writer.write_all(b"data")?;
        write_u32_le(writer, self.data_size)
    }

    /// Samples to decode, truncated to whole seconds.
    ///
    /// `None` when the sample rate is zero or a sample is narrower than a
    /// byte.
    pub fn sample_count(&self) -> Option<usize> {
        let bytes_per_sample = u32::from(self.bits_per_sample / 8);
        if bytes_per_sample == 0 || self.sample_rate == 0 {
            return None;
        }
        let samples = self.chunk_size / bytes_per_sample;
        let seconds = samples / self.sample_rate;
        Some((seconds * self.sample_rate) as usize)
    }
}

/// Write a 4-byte integer in little-endian order.
pub fn write_u32_le<W: Write>(writer: &mut W, value: u32) -> io::Result<()> {
    writer.write_u32::<LittleEndian>(value)
}

/// Read a 4-byte little-endian integer.
pub fn read_u32_le<R: Read>(reader: &mut R) -> io::Result<u32> {
    reader.read_u32::<LittleEndian>()
}

/// Write a 2-byte integer in little-endian order.
pub fn write_u16_le<W: Write>(writer: &mut W, value: u16) -> io::Result<()> {
    writer.write_u16::<LittleEndian>(value)
}

/// Read a 2-byte little-endian integer.
pub fn read_u16_le<R: Read>(reader: &mut R) -> io::Result<u16> {
    reader.read_u16::<LittleEndian>()
}

fn read_tag<R: Read>(reader: &mut R) -> io::Result<[u8; 4]> {
    let mut tag = [0u8; 4];
    reader.read_exact(&mut tag)?;
    Ok(tag)
}

/// Read and parse the header of a WAV file.
pub fn read_header(path: impl AsRef<Path>) -> AudioResult<WavHeader> {
    let path = path.as_ref();
    let file = open(path)?;
    let bytes = read_bytes(file, HEADER_LEN, path)?;
    let header = WavHeader::read_from(&mut bytes.as_slice()).map_err(|source| {
        AudioError::ReadFailure {
            path: path.to_path_buf(),
            source,
        }
    })?;
    debug!(path = %path.display(), ?header, "parsed WAV header");
    Ok(header)
}

/// Channel count and sample count of a WAV file.
///
/// The sample count is truncated to whole seconds (see [`WavHeader::sample_count`]).
pub fn decode_header(path: impl AsRef<Path>) -> AudioResult<(u16, usize)> {
    let path = path.as_ref();
    let header = read_header(path)?;
    Ok((header.channels, whole_second_count(&header, path)?))
}

fn whole_second_count(header: &WavHeader, path: &Path) -> AudioResult<usize> {
    let sample_count = header
        .sample_count()
        .ok_or_else(|| AudioError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!(
                "sample rate {} Hz with {} bits per sample",
                header.sample_rate, header.bits_per_sample
            ),
        })?;

    let declared = header.data_size as usize / usize::from(header.bits_per_sample / 8);
    if sample_count < declared {
        warn!(
            path = %path.display(),
            dropped = declared - sample_count,
            "truncating to whole seconds, trailing samples dropped"
        );
    }

    Ok(sample_count)
}

/// Read `sample_count` 16-bit samples following the header.
///
/// Samples are widened without rescaling.
pub fn decode_samples(path: impl AsRef<Path>, sample_count: usize) -> AudioResult<Signal> {
    let path = path.as_ref();
    let mut file = open(path)?;
    read_bytes(&mut file, HEADER_LEN, path)?;

    let len = sample_count
        .checked_mul(usize::from(BYTES_PER_SAMPLE))
        .ok_or_else(|| AudioError::InvalidHeader {
            path: path.to_path_buf(),
            reason: format!("{sample_count} samples overflow the addressable size"),
        })?;
    let bytes = read_bytes(&mut file, len, path)?;
    let mut raw = vec![0i16; sample_count];
    LittleEndian::read_i16_into(&bytes, &mut raw);

    Ok(Signal::mono(raw.into_iter().map(Sample::from).collect()))
}

/// Decode a whole WAV file.
///
/// # Example
///
/// ```rust,no_run
/// let dry = wavconvolve::wav::read_signal("dry.wav").unwrap();
/// println!("{} samples", dry.len());
/// ```
pub fn read_signal(path: impl AsRef<Path>) -> AudioResult<Signal> {
    let path = path.as_ref();
    let header = read_header(path)?;
    let sample_count = whole_second_count(&header, path)?;
    if header.sample_rate != SAMPLE_RATE {
        warn!(
            path = %path.display(),
            sample_rate = header.sample_rate,
            "sample rate differs from {} Hz",
            SAMPLE_RATE
        );
    }
    if header.channels != 1 {
        warn!(
            path = %path.display(),
            channels = header.channels,
            "multi-channel data is decoded as one interleaved stream"
        );
    }

    let samples = decode_samples(path, sample_count)?.into_samples();
    Ok(Signal::new(samples, header.channels, header.sample_rate))
}

/// Rescale samples to 16-bit integers.
///
/// Every sample is divided by the buffer peak (never by less than 1.0),
/// multiplied by 32768 and truncated toward zero. The conversion saturates,
/// so a sample equal to the peak becomes `32767`.
pub fn quantize(samples: &[Sample]) -> Vec<i16> {
    let peak = normalization_peak(samples);
    samples
        .iter()
        .map(|&sample| ((sample / peak) * MAX_SHORT_VALUE) as i16)
        .collect()
}

/// Encode samples as a 16-bit PCM WAV file.
///
/// All samples are quantized before the file is opened, so a failure to
/// create the destination leaves nothing behind.
///
/// `channels` only sets the header fields. Samples are written in the order
/// given, so anything other than 1 declares an interleaving the caller must
/// have produced.
pub fn encode(samples: &[Sample], channels: u16, path: impl AsRef<Path>) -> AudioResult<()> {
    let path = path.as_ref();
    if channels != 1 {
        warn!(
            path = %path.display(),
            channels,
            "writing a multi-channel header over a single sample stream"
        );
    }
    let write_failure = |source: io::Error| AudioError::WriteFailure {
        path: path.to_path_buf(),
        source,
    };

    let quantized = quantize(samples);
    let header = WavHeader::pcm16(channels, quantized.len()).map_err(write_failure)?;

    let file = File::create(path).map_err(write_failure)?;
    let mut writer = BufWriter::new(file);
    write_pcm(&mut writer, &header, &quantized).map_err(write_failure)?;

    debug!(path = %path.display(), samples = quantized.len(), "wrote WAV file");
    Ok(())
}

/// Encode a signal with its own channel count.
pub fn write_signal(signal: &Signal, path: impl AsRef<Path>) -> AudioResult<()> {
    encode(signal.samples(), signal.channels(), path)
}

fn write_pcm<W: Write>(writer: &mut W, header: &WavHeader, samples: &[i16]) -> io::Result<()> {
    header.write_to(writer)?;
    for &sample in samples {
        writer.write_i16::<LittleEndian>(sample)?;
    }
    writer.flush()
}

fn open(path: &Path) -> AudioResult<File> {
    File::open(path).map_err(|source| AudioError::FileNotFound {
        path: path.to_path_buf(),
        source,
    })
}

fn read_bytes<R: Read>(reader: R, len: usize, path: &Path) -> AudioResult<Vec<u8>> {
    let mut bytes = Vec::new();
    reader
        .take(len as u64)
        .read_to_end(&mut bytes)
        .map_err(|source| AudioError::ReadFailure {
            path: path.to_path_buf(),
            source,
        })?;

    if bytes.len() < len {
        return Err(AudioError::TruncatedRead {
            path: path.to_path_buf(),
            expected: len,
            actual: bytes.len(),
        });
    }
    Ok(bytes)
}
