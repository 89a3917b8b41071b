//! Thumbnail bundles.
//!
//! The server answers a thumbnail request for several albums with one body:
//! for every requested album a big-endian `u32` length followed by that many
//! bytes of JPEG. A zero length marks an album without a thumbnail so that
//! the records stay aligned with the requested ids.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::clients::errors::{Error, Result};

/// Size of the length prefix in front of every record.
pub const LENGTH_PREFIX_SIZE: usize = 4;

/// Split a bundle into its records, in order. Empty records come back as `None`.
///
/// Blobs share the bundle's buffer. A header or body that runs past the end of
/// the buffer fails the whole bundle.
pub fn decode_bundle(bundle: &Bytes) -> Result<Vec<Option<Bytes>>> {
    let mut buf = bundle.clone();
    let mut records = Vec::new();

    while buf.has_remaining() {
        let offset = bundle.len() - buf.remaining();
        if buf.remaining() < LENGTH_PREFIX_SIZE {
            return Err(Error::TruncatedBundle {
                offset,
                needed: LENGTH_PREFIX_SIZE,
                available: buf.remaining(),
            });
        }

        let length = buf.get_u32() as usize;
        if buf.remaining() < length {
            return Err(Error::TruncatedBundle {
                offset: offset + LENGTH_PREFIX_SIZE,
                needed: length,
                available: buf.remaining(),
            });
        }

        let blob = buf.split_to(length);
        records.push((length > 0).then_some(blob));
    }

    Ok(records)
}

/// Pack records the way the server does; `None` becomes a zero-length record.
pub fn encode_bundle<B: AsRef<[u8]>>(records: &[Option<B>]) -> Bytes {
    let size = records
        .iter()
        .map(|r| LENGTH_PREFIX_SIZE + r.as_ref().map_or(0, |b| b.as_ref().len()))
        .sum();
    let mut out = BytesMut::with_capacity(size);

    for record in records {
        let data: &[u8] = record.as_ref().map_or(&[][..], |b| b.as_ref());
        // Server-side lengths are u32; larger blobs cannot be framed.
        #[allow(clippy::cast_possible_truncation)]
        out.put_u32(data.len() as u32);
        out.put_slice(data);
    }

    out.freeze()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bundle_has_no_records() {
        assert!(decode_bundle(&Bytes::new()).unwrap().is_empty());
    }

    #[test]
    fn zero_length_records_keep_their_position() {
        let bundle = Bytes::from_static(&[
            0, 0, 0, 3, 0xff, 0xd8, 0xff, // first album
            0, 0, 0, 0, // second album has no thumbnail
            0, 0, 0, 2, 0xff, 0xd9, // third album
        ]);

        let records = decode_bundle(&bundle).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].as_deref(), Some(&[0xff, 0xd8, 0xff][..]));
        assert_eq!(records[1], None);
        assert_eq!(records[2].as_deref(), Some(&[0xff, 0xd9][..]));
    }

    #[test]
    fn length_prefix_is_big_endian() {
        let mut raw = vec![0, 0, 1, 0];
        raw.extend(std::iter::repeat_n(7u8, 256));
        let records = decode_bundle(&Bytes::from(raw)).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].as_ref().map(Bytes::len), Some(256));
    }

    #[test]
    fn truncated_header_is_an_error() {
        let bundle = Bytes::from_static(&[0, 0, 0, 1, 9, 0, 0]);
        match decode_bundle(&bundle) {
            Err(Error::TruncatedBundle {
                offset,
                needed,
                available,
            }) => {
                assert_eq!((offset, needed, available), (5, 4, 2));
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn truncated_body_is_an_error() {
        let bundle = Bytes::from_static(&[0, 0, 0, 5, 1, 2]);
        match decode_bundle(&bundle) {
            Err(Error::TruncatedBundle {
                offset,
                needed,
                available,
            }) => {
                assert_eq!((offset, needed, available), (4, 5, 2));
            }
            other => panic!("expected truncation, got {other:?}"),
        }
    }

    #[test]
    fn encoded_bundle_decodes_to_the_same_records() {
        let records = vec![Some(b"jpeg-one".to_vec()), None, Some(b"two".to_vec())];
        let bundle = encode_bundle(&records);
        assert_eq!(bundle.len(), 3 * LENGTH_PREFIX_SIZE + 8 + 3);

        let decoded = decode_bundle(&bundle).unwrap();
        let decoded: Vec<_> = decoded.into_iter().map(|r| r.map(|b| b.to_vec())).collect();
        assert_eq!(decoded, records);
    }
}
