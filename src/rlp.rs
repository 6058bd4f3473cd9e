//! Recursive Length Prefix (RLP) Encoding
//!
//! Canonical Ethereum RLP over a tree of byte strings and lists.
//! Reference: https://ethereum.org/en/developers/docs/data-structures-and-encoding/rlp/
//!
//! Encoding rules:
//! - a single byte below `0x80` is its own encoding
//! - a string of 0..=55 bytes gets the prefix `0x80 + len`
//! - longer strings get `0xb7 + len(len)` followed by the big-endian length
//! - lists use the same scheme with base `0xc0` / `0xf7` over the concatenated item encodings
//!
//! The decoder accepts only the canonical form of each item, so
//! `encode(decode(x)) == x` for every input it accepts.

/// Lists nested deeper than this are rejected by the decoder
pub const MAX_DEPTH: usize = 64;

const STRING_OFFSET: u8 = 0x80;
const LIST_OFFSET: u8 = 0xc0;
const SHORT_LIMIT: usize = 55;

/// Errors produced while decoding RLP
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RlpError {
    #[error("input ended before the item was complete")]
    UnexpectedEnd,

    #[error("{0} trailing bytes after the top-level item")]
    TrailingBytes(usize),

    #[error("single byte below 0x80 must not carry a length prefix")]
    NonCanonicalSingleByte,

    #[error("long-form length used for a payload of {0} bytes")]
    NonCanonicalLength(usize),

    #[error("length field has a leading zero byte")]
    LeadingZeroInLength,

    #[error("length field does not fit in usize")]
    LengthOverflow,

    #[error("nesting exceeds {MAX_DEPTH} levels")]
    DepthExceeded,

    #[error("expected a byte string, found a list")]
    ExpectedBytes,

    #[error("expected a list, found a byte string")]
    ExpectedList,
}

/// A decoded or to-be-encoded RLP value
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RlpItem {
    Bytes(Vec<u8>),
    List(Vec<RlpItem>),
}

impl RlpItem {
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        RlpItem::Bytes(data.into())
    }

    pub fn list(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }

    /// The empty string, which is also the canonical encoding of integer zero
    pub fn empty() -> Self {
        RlpItem::Bytes(Vec::new())
    }

    pub fn as_bytes(&self) -> Result<&[u8], RlpError> {
        match self {
            RlpItem::Bytes(b) => Ok(b),
            RlpItem::List(_) => Err(RlpError::ExpectedBytes),
        }
    }

    pub fn as_list(&self) -> Result<&[RlpItem], RlpError> {
        match self {
            RlpItem::List(items) => Ok(items),
            RlpItem::Bytes(_) => Err(RlpError::ExpectedList),
        }
    }

    pub fn is_list(&self) -> bool {
        matches!(self, RlpItem::List(_))
    }

    pub fn encode(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.encoded_len());
        self.encode_into(&mut out);
        out
    }

    pub fn encode_into(&self, out: &mut Vec<u8>) {
        match self {
            RlpItem::Bytes(data) => {
                if data.len() == 1 && data[0] < STRING_OFFSET {
                    out.push(data[0]);
                } else {
                    write_header(out, data.len(), STRING_OFFSET);
                    out.extend_from_slice(data);
                }
            }
            RlpItem::List(items) => {
                let payload_len = items.iter().map(RlpItem::encoded_len).sum();
                write_header(out, payload_len, LIST_OFFSET);
                for item in items {
                    item.encode_into(out);
                }
            }
        }
    }

    /// Length of `self.encode()` without allocating
    pub fn encoded_len(&self) -> usize {
        match self {
            RlpItem::Bytes(data) if data.len() == 1 && data[0] < STRING_OFFSET => 1,
            RlpItem::Bytes(data) => header_len(data.len()) + data.len(),
            RlpItem::List(items) => {
                let payload: usize = items.iter().map(RlpItem::encoded_len).sum();
                header_len(payload) + payload
            }
        }
    }
}

impl From<Vec<u8>> for RlpItem {
    fn from(data: Vec<u8>) -> Self {
        RlpItem::Bytes(data)
    }
}

impl From<&[u8]> for RlpItem {
    fn from(data: &[u8]) -> Self {
        RlpItem::Bytes(data.to_vec())
    }
}

impl From<Vec<RlpItem>> for RlpItem {
    fn from(items: Vec<RlpItem>) -> Self {
        RlpItem::List(items)
    }
}

/// Types that have a fixed RLP shape
pub trait ToRlp {
    fn to_rlp(&self) -> RlpItem;

    fn rlp_bytes(&self) -> Vec<u8> {
        self.to_rlp().encode()
    }
}

/// Encode a single item
pub fn encode(item: &RlpItem) -> Vec<u8> {
    item.encode()
}

/// Decode exactly one item, rejecting trailing bytes
pub fn decode_exact(input: &[u8]) -> Result<RlpItem, RlpError> {
    let (item, rest) = decode(input)?;
    if !rest.is_empty() {
        return Err(RlpError::TrailingBytes(rest.len()));
    }
    Ok(item)
}

/// Decode the first item of `input`, returning it and the unread remainder
pub fn decode(input: &[u8]) -> Result<(RlpItem, &[u8]), RlpError> {
    let (item, consumed) = decode_item(input, 0)?;
    Ok((item, &input[consumed..]))
}

fn decode_item(input: &[u8], depth: usize) -> Result<(RlpItem, usize), RlpError> {
    let prefix = *input.first().ok_or(RlpError::UnexpectedEnd)?;

    match prefix {
        0x00..=0x7f => Ok((RlpItem::Bytes(vec![prefix]), 1)),
        0x80..=0xb7 => {
            let len = (prefix - STRING_OFFSET) as usize;
            let body = slice(input, 1, len)?;
            if len == 1 && body[0] < STRING_OFFSET {
                return Err(RlpError::NonCanonicalSingleByte);
            }
            Ok((RlpItem::Bytes(body.to_vec()), 1 + len))
        }
        0xb8..=0xbf => {
            let len_of_len = (prefix - 0xb7) as usize;
            let len = read_long_length(&input[1..], len_of_len)?;
            let body = slice(input, 1 + len_of_len, len)?;
            Ok((RlpItem::Bytes(body.to_vec()), 1 + len_of_len + len))
        }
        0xc0..=0xf7 => {
            let len = (prefix - LIST_OFFSET) as usize;
            let payload = slice(input, 1, len)?;
            Ok((RlpItem::List(decode_list_payload(payload, depth)?), 1 + len))
        }
        0xf8..=0xff => {
            let len_of_len = (prefix - 0xf7) as usize;
            let len = read_long_length(&input[1..], len_of_len)?;
            let payload = slice(input, 1 + len_of_len, len)?;
            Ok((RlpItem::List(decode_list_payload(payload, depth)?), 1 + len_of_len + len))
        }
    }
}

fn decode_list_payload(mut payload: &[u8], depth: usize) -> Result<Vec<RlpItem>, RlpError> {
    if depth >= MAX_DEPTH {
        return Err(RlpError::DepthExceeded);
    }

    let mut items = Vec::new();
    while !payload.is_empty() {
        let (item, used) = decode_item(payload, depth + 1)?;
        items.push(item);
        payload = &payload[used..];
    }
    Ok(items)
}

fn slice(input: &[u8], start: usize, len: usize) -> Result<&[u8], RlpError> {
    let end = start.checked_add(len).ok_or(RlpError::LengthOverflow)?;
    input.get(start..end).ok_or(RlpError::UnexpectedEnd)
}

fn read_long_length(buf: &[u8], len_of_len: usize) -> Result<usize, RlpError> {
    let bytes = buf.get(..len_of_len).ok_or(RlpError::UnexpectedEnd)?;
    if bytes[0] == 0 {
        return Err(RlpError::LeadingZeroInLength);
    }
    if len_of_len > std::mem::size_of::<usize>() {
        return Err(RlpError::LengthOverflow);
    }

    let len = bytes.iter().fold(0usize, |acc, &b| (acc << 8) | b as usize);
    if len <= SHORT_LIMIT {
        return Err(RlpError::NonCanonicalLength(len));
    }
    Ok(len)
}

fn write_header(out: &mut Vec<u8>, len: usize, offset: u8) {
    if len <= SHORT_LIMIT {
        out.push(offset + len as u8);
    } else {
        let len_bytes = length_bytes(len);
        out.push(offset + SHORT_LIMIT as u8 + len_bytes.len() as u8);
        out.extend_from_slice(&len_bytes);
    }
}

fn header_len(len: usize) -> usize {
    if len <= SHORT_LIMIT {
        1
    } else {
        1 + length_bytes(len).len()
    }
}

fn length_bytes(len: usize) -> Vec<u8> {
    let bytes = len.to_be_bytes();
    let start = bytes.iter().position(|&b| b != 0).unwrap_or(bytes.len() - 1);
    bytes[start..].to_vec()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hex_encode(item: &RlpItem) -> String {
        hex::encode(item.encode())
    }

    #[test]
    fn test_reference_strings() {
        assert_eq!(hex_encode(&RlpItem::bytes(b"dog".to_vec())), "83646f67");
        assert_eq!(hex_encode(&RlpItem::empty()), "80");
        assert_eq!(hex_encode(&RlpItem::bytes(vec![0x00])), "00");
        assert_eq!(hex_encode(&RlpItem::bytes(vec![0x0f])), "0f");
        assert_eq!(hex_encode(&RlpItem::bytes(vec![0x04, 0x00])), "820400");
        assert_eq!(hex_encode(&RlpItem::bytes(vec![0x80])), "8180");
    }

    #[test]
    fn test_reference_lists() {
        let cat_dog = RlpItem::list(vec![
            RlpItem::bytes(b"cat".to_vec()),
            RlpItem::bytes(b"dog".to_vec()),
        ]);
        assert_eq!(hex_encode(&cat_dog), "c88363617483646f67");
        assert_eq!(hex_encode(&RlpItem::list(vec![])), "c0");

        // Set-theoretic representation of three: [ [], [[]], [ [], [[]] ] ]
        let three = RlpItem::list(vec![
            RlpItem::list(vec![]),
            RlpItem::list(vec![RlpItem::list(vec![])]),
            RlpItem::list(vec![
                RlpItem::list(vec![]),
                RlpItem::list(vec![RlpItem::list(vec![])]),
            ]),
        ]);
        assert_eq!(hex_encode(&three), "c7c0c1c0c3c0c1c0");
    }

    #[test]
    fn test_long_string_boundary() {
        let short = RlpItem::bytes(vec![0xaa; 55]);
        let encoded = short.encode();
        assert_eq!(encoded[0], 0x80 + 55);
        assert_eq!(encoded.len(), 56);

        let long = RlpItem::bytes(vec![0xaa; 56]);
        let encoded = long.encode();
        assert_eq!(&encoded[..2], &[0xb8, 56]);
        assert_eq!(encoded.len(), 58);

        let lorem = b"Lorem ipsum dolor sit amet, consectetur adipisicing elit".to_vec();
        let encoded = RlpItem::bytes(lorem.clone()).encode();
        assert_eq!(&encoded[..2], &[0xb8, 0x38]);
        assert_eq!(&encoded[2..], &lorem[..]);
    }

    #[test]
    fn test_long_list_header() {
        let items = (0..30).map(|_| RlpItem::bytes(vec![0x11, 0x22])).collect();
        let encoded = RlpItem::list(items).encode();
        // 30 items * 3 bytes = 90 byte payload
        assert_eq!(&encoded[..2], &[0xf8, 90]);
        assert_eq!(encoded.len(), 92);
    }

    #[test]
    fn test_two_byte_length() {
        let item = RlpItem::bytes(vec![0x01; 1024]);
        let encoded = item.encode();
        assert_eq!(&encoded[..3], &[0xb9, 0x04, 0x00]);
        assert_eq!(item.encoded_len(), encoded.len());
        assert_eq!(decode_exact(&encoded).unwrap(), item);
    }

    #[test]
    fn test_decode_nested() {
        let bytes = hex::decode("c7c0c1c0c3c0c1c0").unwrap();
        let item = decode_exact(&bytes).unwrap();
        let outer = item.as_list().unwrap();
        assert_eq!(outer.len(), 3);
        assert_eq!(outer[2].as_list().unwrap().len(), 2);
        assert_eq!(item.encode(), bytes);
    }

    #[test]
    fn test_decode_returns_remainder() {
        let (item, rest) = decode(&[0x83, b'c', b'a', b't', 0x01]).unwrap();
        assert_eq!(item, RlpItem::bytes(b"cat".to_vec()));
        assert_eq!(rest, &[0x01]);
    }

    #[test]
    fn test_reject_trailing_bytes() {
        assert_eq!(decode_exact(&[0x80, 0x80]), Err(RlpError::TrailingBytes(1)));
    }

    #[test]
    fn test_reject_truncated() {
        assert_eq!(decode_exact(&[]), Err(RlpError::UnexpectedEnd));
        assert_eq!(decode_exact(&[0x83, b'd', b'o']), Err(RlpError::UnexpectedEnd));
        assert_eq!(decode_exact(&[0xb8]), Err(RlpError::UnexpectedEnd));
        assert_eq!(decode_exact(&[0xc2, 0x80]), Err(RlpError::UnexpectedEnd));
    }

    #[test]
    fn test_reject_non_canonical_single_byte() {
        assert_eq!(decode_exact(&[0x81, 0x05]), Err(RlpError::NonCanonicalSingleByte));
        // 0x80 itself does need the prefix
        assert!(decode_exact(&[0x81, 0x80]).is_ok());
    }

    #[test]
    fn test_reject_non_canonical_long_form() {
        let mut bytes = vec![0xb8, 0x03];
        bytes.extend_from_slice(b"dog");
        assert_eq!(decode_exact(&bytes), Err(RlpError::NonCanonicalLength(3)));

        assert_eq!(decode_exact(&[0xf8, 0x00]), Err(RlpError::LeadingZeroInLength));
    }

    #[test]
    fn test_reject_huge_length() {
        let bytes = [0xbf, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff];
        assert!(decode_exact(&bytes).is_err());
    }

    #[test]
    fn test_reject_excessive_depth() {
        let mut item = RlpItem::list(vec![]);
        for _ in 0..MAX_DEPTH + 1 {
            item = RlpItem::list(vec![item]);
        }
        assert_eq!(decode_exact(&item.encode()), Err(RlpError::DepthExceeded));
    }

    #[test]
    fn test_item_accessors() {
        let item = RlpItem::list(vec![RlpItem::bytes(vec![1])]);
        assert!(item.is_list());
        assert_eq!(item.as_bytes(), Err(RlpError::ExpectedBytes));
        assert_eq!(RlpItem::empty().as_list(), Err(RlpError::ExpectedList));
    }
}
