//! # Vector Space
//!
//! String-keyed dense embeddings loaded from the word2vec binary layout:
//!
//! ```text
//! header  := ASCII decimal <vocab_size> ' ' ASCII decimal <dims> '\n'
//! record  := <key bytes, no ' '> ' ' <dims × f32 little-endian> ['\n']
//! file    := header record{vocab_size} [whitespace]
//! ```
//!
//! Loading is all-or-nothing: a file either parses completely or yields a
//! `FileFormat` error carrying the byte offset of the first problem.

use std::fs;
use std::io::Write;
use std::path::Path;

use bytes::{Buf, BufMut};
use hashbrown::HashMap;
use tracing::info;

use crate::distance::DistanceMetric;
use crate::model::{DenseMatrix, Precision, Scalar};
use crate::{Error, Result};

// ============================================================================
// Storage
// ============================================================================

/// Embedding rows at the precision chosen at load time.
#[derive(Debug, Clone, PartialEq)]
pub enum VectorStorage {
    Fp32(DenseMatrix<f32>),
    Fp64(DenseMatrix<f64>),
}

impl VectorStorage {
    pub fn precision(&self) -> Precision {
        match self {
            VectorStorage::Fp32(_) => Precision::Fp32,
            VectorStorage::Fp64(_) => Precision::Fp64,
        }
    }

    pub fn dims(&self) -> usize {
        match self {
            VectorStorage::Fp32(m) => m.cols(),
            VectorStorage::Fp64(m) => m.cols(),
        }
    }
}

/// A loaded vocabulary with one embedding row per key.
#[derive(Debug, Clone)]
pub struct VectorSpace {
    keys: Vec<String>,
    index: HashMap<String, usize>,
    storage: VectorStorage,
}

impl VectorSpace {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Read and parse a word2vec binary file.
    pub fn load(path: impl AsRef<Path>, precision: Precision) -> Result<Self> {
        let path = path.as_ref();
        let data = fs::read(path)?;
        let space = Self::from_bytes(&data, precision)?;
        info!(
            path = %path.display(),
            vocabulary = space.len(),
            dims = space.dims(),
            precision = %precision,
            "vector space loaded"
        );
        Ok(space)
    }

    /// Parse an in-memory word2vec binary image.
    pub fn from_bytes(data: &[u8], precision: Precision) -> Result<Self> {
        match precision {
            Precision::Fp32 => parse::<f32>(data).map(|(keys, index, m)| Self {
                keys,
                index,
                storage: VectorStorage::Fp32(m),
            }),
            Precision::Fp64 => parse::<f64>(data).map(|(keys, index, m)| Self {
                keys,
                index,
                storage: VectorStorage::Fp64(m),
            }),
        }
    }

    /// Build a space from `(key, vector)` pairs.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>, precision: Precision) -> Result<Self>
    where
        K: Into<String>,
        V: AsRef<[f64]>,
    {
        let mut keys = Vec::new();
        let mut index = HashMap::new();
        let mut values = Vec::new();
        let mut dims = None;

        for (key, vector) in entries {
            let key = key.into();
            validate_key(&key)?;
            let vector = vector.as_ref();
            let expected = *dims.get_or_insert(vector.len());
            if expected == 0 {
                return Err(Error::InvalidArgument("embedding dimensionality must be positive".into()));
            }
            if vector.len() != expected {
                return Err(Error::DimensionMismatch { expected, got: vector.len() });
            }
            if index.insert(key.clone(), keys.len()).is_some() {
                return Err(Error::InvalidArgument(format!("duplicate key {key:?}")));
            }
            keys.push(key);
            values.extend_from_slice(vector);
        }

        let dims = dims.ok_or_else(|| Error::InvalidArgument("vector space has no entries".into()))?;
        let rows = keys.len();
        let mismatch = || Error::DimensionMismatch { expected: rows * dims, got: values.len() };
        let storage = match precision {
            Precision::Fp32 => VectorStorage::Fp32(DenseMatrix::from_f64_slice(rows, dims, &values).ok_or_else(mismatch)?),
            Precision::Fp64 => VectorStorage::Fp64(DenseMatrix::from_f64_slice(rows, dims, &values).ok_or_else(mismatch)?),
        };
        Ok(Self { keys, index, storage })
    }

    // ========================================================================
    // Serialization
    // ========================================================================

    /// Serialize in the word2vec binary layout, values as `f32`.
    pub fn write_to(&self, writer: &mut dyn Write) -> Result<()> {
        let mut out = Vec::with_capacity(self.len() * (self.dims() * 4 + 16) + 32);
        put_header(&mut out, self.len(), self.dims());
        for (row, key) in self.keys.iter().enumerate() {
            put_record(&mut out, key, self.vector(row).iter().copied());
        }
        writer.write_all(&out)?;
        Ok(())
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let mut file = fs::File::create(path)?;
        self.write_to(&mut file)
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn dims(&self) -> usize {
        self.storage.dims()
    }

    pub fn precision(&self) -> Precision {
        self.storage.precision()
    }

    pub fn storage(&self) -> &VectorStorage {
        &self.storage
    }

    pub fn keys(&self) -> &[String] {
        &self.keys
    }

    pub fn row_of(&self, key: &str) -> Option<usize> {
        self.index.get(key).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    /// Row `row` widened to `f64`.
    pub fn vector(&self, row: usize) -> Vec<f64> {
        match &self.storage {
            VectorStorage::Fp32(m) => m.row(row).iter().map(|v| v.to_f64()).collect(),
            VectorStorage::Fp64(m) => m.row(row).to_vec(),
        }
    }

    /// Closest other vocabulary entry to `key` under `metric`.
    pub fn nearest(&self, key: &str, metric: &DistanceMetric) -> Result<(String, f64)> {
        let row = self
            .row_of(key)
            .ok_or_else(|| Error::Unresolvable(format!("key {key:?} not in vocabulary")))?;
        let best = match &self.storage {
            VectorStorage::Fp32(m) => nearest_row(m, row, metric),
            VectorStorage::Fp64(m) => nearest_row(m, row, metric),
        };
        best.map(|(other, d)| (self.keys[other].clone(), d))
            .ok_or_else(|| Error::Unresolvable(format!("no neighbour for {key:?}")))
    }
}

fn nearest_row<T: Scalar>(m: &DenseMatrix<T>, row: usize, metric: &DistanceMetric) -> Option<(usize, f64)> {
    let target = m.row(row);
    (0..m.rows())
        .filter(|&other| other != row)
        .map(|other| (other, metric.distance(target, m.row(other))))
        .filter(|(_, d)| !d.is_nan())
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

/// Serialize `(key, vector)` pairs in the word2vec binary layout.
pub fn write_entries<K, V>(writer: &mut dyn Write, entries: &[(K, V)]) -> Result<()>
where
    K: AsRef<str>,
    V: AsRef<[f64]>,
{
    let dims = entries.first().map_or(0, |(_, v)| v.as_ref().len());
    let mut out = Vec::new();
    put_header(&mut out, entries.len(), dims);
    for (key, vector) in entries {
        let key = key.as_ref();
        validate_key(key)?;
        let vector = vector.as_ref();
        if vector.len() != dims {
            return Err(Error::DimensionMismatch { expected: dims, got: vector.len() });
        }
        put_record(&mut out, key, vector.iter().copied());
    }
    writer.write_all(&out)?;
    Ok(())
}

fn validate_key(key: &str) -> Result<()> {
    if key.is_empty() || key.bytes().any(|b| b.is_ascii_whitespace()) {
        return Err(Error::InvalidArgument(format!("invalid vocabulary key {key:?}")));
    }
    Ok(())
}

fn put_header(out: &mut Vec<u8>, vocab: usize, dims: usize) {
    out.put_slice(format!("{vocab} {dims}\n").as_bytes());
}

fn put_record(out: &mut Vec<u8>, key: &str, values: impl Iterator<Item = f64>) {
    out.put_slice(key.as_bytes());
    out.put_u8(b' ');
    for v in values {
        out.put_f32_le(v as f32);
    }
    out.put_u8(b'\n');
}

// ============================================================================
// Parser
// ============================================================================

type Parsed<T> = (Vec<String>, HashMap<String, usize>, DenseMatrix<T>);

struct Cursor<'a> {
    buf: &'a [u8],
    total: usize,
}

impl<'a> Cursor<'a> {
    fn offset(&self) -> usize {
        self.total - self.buf.remaining()
    }

    fn error(&self, message: impl Into<String>) -> Error {
        Error::FileFormat { offset: self.offset(), message: message.into() }
    }

    /// Bytes before the next `delim`; the delimiter is consumed.
    fn take_until(&mut self, delim: u8) -> Option<&'a [u8]> {
        let buf: &'a [u8] = self.buf;
        let pos = buf.iter().position(|&b| b == delim)?;
        self.buf.advance(pos + 1);
        Some(&buf[..pos])
    }

    fn skip_whitespace(&mut self) {
        let n = self.buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
        self.buf.advance(n);
    }
}

fn parse<T: Scalar>(data: &[u8]) -> Result<Parsed<T>> {
    let mut cur = Cursor { buf: data, total: data.len() };

    let header = cur.take_until(b'\n').ok_or_else(|| cur.error("missing header line"))?;
    let header = std::str::from_utf8(header).map_err(|_| Error::FileFormat {
        offset: 0,
        message: "header is not ASCII".into(),
    })?;
    let mut fields = header.split_ascii_whitespace().map(str::parse::<usize>);
    let (vocab, dims) = match (fields.next(), fields.next(), fields.next()) {
        (Some(Ok(v)), Some(Ok(d)), None) => (v, d),
        _ => {
            return Err(Error::FileFormat {
                offset: 0,
                message: format!("malformed header {header:?}"),
            });
        }
    };
    if dims == 0 {
        return Err(Error::FileFormat { offset: 0, message: "zero dimensionality".into() });
    }
    let record_bytes = dims
        .checked_mul(4)
        .ok_or_else(|| Error::FileFormat { offset: 0, message: "dimensionality overflows".into() })?;
    if vocab.checked_mul(record_bytes).is_none_or(|need| need > cur.buf.remaining()) {
        return Err(cur.error(format!("truncated: header declares {vocab} records of {dims} values")));
    }

    let mut keys = Vec::with_capacity(vocab);
    let mut index = HashMap::with_capacity(vocab);
    let mut values = Vec::with_capacity(vocab * dims);

    for record in 0..vocab {
        cur.skip_whitespace();
        let key_offset = cur.offset();
        let key = cur
            .take_until(b' ')
            .ok_or_else(|| cur.error(format!("truncated key in record {record}")))?;
        if key.is_empty() {
            return Err(Error::FileFormat { offset: key_offset, message: format!("empty key in record {record}") });
        }
        let key = std::str::from_utf8(key)
            .map_err(|_| Error::FileFormat { offset: key_offset, message: format!("key in record {record} is not UTF-8") })?
            .to_owned();

        if cur.buf.remaining() < record_bytes {
            return Err(cur.error(format!("truncated vector for key {key:?}")));
        }
        for _ in 0..dims {
            values.push(T::from_f64(cur.buf.get_f32_le() as f64));
        }

        if index.insert(key.clone(), keys.len()).is_some() {
            return Err(Error::FileFormat { offset: key_offset, message: format!("duplicate key {key:?}") });
        }
        keys.push(key);
    }

    if cur.buf.iter().any(|b| !b.is_ascii_whitespace()) {
        cur.skip_whitespace();
        return Err(cur.error(format!("trailing data after {vocab} records")));
    }

    let matrix = DenseMatrix::from_vec(vocab, dims, values).ok_or_else(|| cur.error("record count mismatch"))?;
    Ok((keys, index, matrix))
}
