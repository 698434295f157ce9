use std::io::{BufReader, BufWriter, ErrorKind, Read, Write};

use crate::error::VecError;
use crate::flat::{FlatIndex, FlatInner};

pub(crate) const FLAT_MAGIC: [u8; 4] = [b'F', b'I', b'D', b'X'];
pub(crate) const FLAT_VERSION: u32 = 1;

/// Size in bytes of the file header.
pub const HEADER_LEN: usize = 12;

/// Size in bytes of one record for vectors of dimension `dim`.
pub fn record_len(dim: usize) -> usize {
    8 + dim * 4
}

/// Summary of a successful [`load`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadReport {
    /// Number of complete records read.
    pub records: usize,
    /// Bytes of a trailing partial record that were discarded.
    pub dropped_bytes: usize,
}

/// Save serializes the index to a writer.
///
/// ```text
/// [4B magic "FIDX"] [4B version=1] [4B dim]
/// For each row, in insertion order:
///   [8B id(uint64)] [dim x 4B float32 vector]
/// ```
///
/// All multi-byte values are little-endian. There is no record count in
/// the header, so new rows can be appended to an existing file without
/// rewriting it.
pub fn save(idx: &FlatIndex, w: &mut dyn Write) -> Result<(), VecError> {
    let inner = idx.read_inner();
    write_rows(w, inner.dim, inner.rows())
}

/// Write a header for `dim` followed by `rows`, then flush.
pub(crate) fn write_rows<'a>(
    w: &mut dyn Write,
    dim: usize,
    rows: impl Iterator<Item = (u64, &'a [f32])>,
) -> Result<(), VecError> {
    let mut bw = BufWriter::new(w);
    write_header(&mut bw, dim)?;
    for (id, vector) in rows {
        write_record(&mut bw, id, vector)?;
    }
    bw.flush()?;
    Ok(())
}

pub(crate) fn write_header(w: &mut dyn Write, dim: usize) -> Result<(), VecError> {
    w.write_all(&FLAT_MAGIC)?;
    w.write_all(&FLAT_VERSION.to_le_bytes())?;
    w.write_all(&(dim as u32).to_le_bytes())?;
    Ok(())
}

pub(crate) fn write_record(w: &mut dyn Write, id: u64, vector: &[f32]) -> Result<(), VecError> {
    w.write_all(&id.to_le_bytes())?;
    for &v in vector {
        w.write_all(&v.to_le_bytes())?;
    }
    Ok(())
}

/// Load deserializes an index of dimension `dim` from a reader.
///
/// The header's dimension is checked before any record buffer is
/// allocated; a mismatch is [`VecError::DimensionMismatch`]. A trailing
/// partial record, left behind by an interrupted append, is discarded and
/// reported in [`LoadReport::dropped_bytes`]. Any other malformation is an
/// error.
pub fn load(r: &mut dyn Read, dim: usize) -> Result<(FlatIndex, LoadReport), VecError> {
    let mut br = BufReader::new(r);

    let mut header = [0u8; HEADER_LEN];
    let n = read_full(&mut br, &mut header)?;
    if n < HEADER_LEN {
        return Err(VecError::InvalidFormat(format!(
            "truncated header ({n} of {HEADER_LEN} bytes)"
        )));
    }

    if header[0..4] != FLAT_MAGIC {
        return Err(VecError::InvalidFormat(format!(
            "invalid magic {:?}",
            &header[0..4]
        )));
    }

    let version = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
    if version != FLAT_VERSION {
        return Err(VecError::InvalidFormat(format!(
            "unsupported version {version} (want {FLAT_VERSION})"
        )));
    }

    let stored = u32::from_le_bytes([header[8], header[9], header[10], header[11]]) as usize;
    if stored == 0 {
        return Err(VecError::InvalidFormat("invalid dimension 0".into()));
    }
    if stored != dim {
        return Err(VecError::DimensionMismatch { got: stored, want: dim });
    }

    let mut ids = Vec::new();
    let mut vectors = Vec::new();
    let mut record = vec![0u8; record_len(dim)];
    let mut dropped_bytes = 0;

    loop {
        let n = read_full(&mut br, &mut record)?;
        if n == 0 {
            break;
        }
        if n < record.len() {
            dropped_bytes = n;
            break;
        }

        let mut id_bytes = [0u8; 8];
        id_bytes.copy_from_slice(&record[0..8]);
        ids.push(u64::from_le_bytes(id_bytes));
        vectors.extend(
            record[8..]
                .chunks_exact(4)
                .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]])),
        );
    }

    let report = LoadReport {
        records: ids.len(),
        dropped_bytes,
    };
    Ok((FlatIndex::from_inner(FlatInner { dim, ids, vectors }), report))
}

/// Read until `buf` is full or the stream ends. Returns the byte count.
fn read_full(r: &mut dyn Read, buf: &mut [u8]) -> Result<usize, VecError> {
    let mut filled = 0;
    while filled < buf.len() {
        match r.read(&mut buf[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e.into()),
        }
    }
    Ok(filled)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::vecstore::VecIndex;

    const DIM: usize = 4;

    #[test]
    fn test_save_load() {
        let idx = FlatIndex::new(4);
        idx.insert(0, &[1.0, 0.0, 0.0, 0.0]).unwrap();
        idx.insert(1, &[0.0, 1.0, 0.0, 0.0]).unwrap();
        idx.insert(9, &[0.0, 0.0, 1.0, 0.5]).unwrap();

        let mut buf = Vec::new();
        save(&idx, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN + 3 * record_len(4));

        let (idx2, report) = load(&mut buf.as_slice(), DIM).unwrap();
        assert_eq!(report, LoadReport { records: 3, dropped_bytes: 0 });
        assert_eq!(idx2.len(), 3);
        assert_eq!(idx2.dim(), 4);

        let query = [0.0f32, 0.0, 1.0, 0.5];
        let m1 = idx.search(&query, 3).unwrap();
        let m2 = idx2.search(&query, 3).unwrap();
        assert_eq!(m1, m2);
        assert_eq!(m2[0].id, 9);

        // Can insert into loaded index.
        idx2.insert(10, &[0.0, 0.0, 0.0, 1.0]).unwrap();
        assert_eq!(idx2.len(), 4);
    }

    #[test]
    fn test_save_load_empty() {
        let idx = FlatIndex::new(4);

        let mut buf = Vec::new();
        save(&idx, &mut buf).unwrap();
        assert_eq!(buf.len(), HEADER_LEN);

        let (idx2, report) = load(&mut buf.as_slice(), DIM).unwrap();
        assert_eq!(idx2.len(), 0);
        assert_eq!(report.records, 0);
    }

    #[test]
    fn test_appended_records_load() {
        let idx = FlatIndex::new(2);
        idx.insert(0, &[1.0, 2.0]).unwrap();

        let mut buf = Vec::new();
        save(&idx, &mut buf).unwrap();
        write_record(&mut buf, 1, &[3.0, 4.0]).unwrap();

        let (idx2, _) = load(&mut buf.as_slice(), 2).unwrap();
        assert_eq!(idx2.len(), 2);
        assert_eq!(idx2.search(&[3.0, 4.0], 1).unwrap()[0].id, 1);
    }

    #[test]
    fn test_torn_tail_is_dropped() {
        let idx = FlatIndex::new(2);
        idx.insert(0, &[1.0, 2.0]).unwrap();
        idx.insert(1, &[3.0, 4.0]).unwrap();

        let mut buf = Vec::new();
        save(&idx, &mut buf).unwrap();
        buf.truncate(buf.len() - 3);

        let (idx2, report) = load(&mut buf.as_slice(), 2).unwrap();
        assert_eq!(idx2.len(), 1);
        assert_eq!(report.dropped_bytes, record_len(2) - 3);
    }

    #[test]
    fn test_load_invalid_magic() {
        let bad = b"NOPE\x01\x00\x00\x00\x04\x00\x00\x00";
        assert!(matches!(
            load(&mut bad.as_slice(), 4),
            Err(VecError::InvalidFormat(_))
        ));
    }

    #[test]
    fn test_load_unsupported_version() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FLAT_MAGIC);
        buf.extend_from_slice(&7u32.to_le_bytes());
        buf.extend_from_slice(&4u32.to_le_bytes());
        assert!(load(&mut buf.as_slice(), DIM).is_err());
    }

    #[test]
    fn test_load_truncated_header() {
        assert!(load(&mut &b"FID"[..], 4).is_err());
        assert!(load(&mut &b""[..], 4).is_err());
    }

    #[test]
    fn test_load_zero_dim() {
        let mut buf = Vec::new();
        write_header(&mut buf, 0).unwrap();
        assert!(load(&mut buf.as_slice(), DIM).is_err());
    }

    #[test]
    fn test_load_rejects_dimension_before_reading_records() {
        let mut buf = Vec::new();
        buf.extend_from_slice(&FLAT_MAGIC);
        buf.extend_from_slice(&FLAT_VERSION.to_le_bytes());
        buf.extend_from_slice(&u32::MAX.to_le_bytes());
        assert!(matches!(
            load(&mut buf.as_slice(), 512),
            Err(VecError::DimensionMismatch { got, want: 512 }) if got == u32::MAX as usize
        ));

        let idx = FlatIndex::new(2);
        let mut buf = Vec::new();
        save(&idx, &mut buf).unwrap();
        assert!(matches!(
            load(&mut buf.as_slice(), DIM),
            Err(VecError::DimensionMismatch { got: 2, want: 4 })
        ));
    }
}
