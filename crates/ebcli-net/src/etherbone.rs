//! Etherbone packet encoding.
//!
//! Only the subset LiteX uses is implemented: one record per packet, 32-bit
//! addresses and data, all byte lanes enabled. All fields are big endian.
//!
//! ```text
//! packet header  | 4e 6f | ver/flags | addr/port size | 00 00 00 00 |
//! record header  | flags | byte enable | wcount | rcount |
//! record body    | base address | wcount write words | rcount read addresses |
//! ```

use ebcli_types::error::{EbError, Result};

/// Packet magic.
pub const MAGIC: u16 = 0x4e6f;
/// Protocol version, stored in the high nibble of header byte 2.
pub const VERSION: u8 = 1;
/// 32-bit address and port widths (4 bytes each, one nibble each).
const SIZES: u8 = 0x44;
/// All four byte lanes.
const BYTE_ENABLE: u8 = 0x0f;

pub const HEADER_LEN: usize = 8;
pub const RECORD_HEADER_LEN: usize = 4;

/// Most words a single record can carry (`wcount`/`rcount` are one byte).
pub const MAX_RECORD_WORDS: usize = 255;

fn push_header(buf: &mut Vec<u8>) {
    buf.extend_from_slice(&MAGIC.to_be_bytes());
    buf.push(VERSION << 4);
    buf.push(SIZES);
    buf.extend_from_slice(&[0; 4]);
}

fn check_count(count: usize) -> Result<u8> {
    u8::try_from(count)
        .ok()
        .filter(|&c| c > 0)
        .ok_or_else(|| {
            EbError::Transport(format!(
                "etherbone record must carry 1..={MAX_RECORD_WORDS} words, got {count}"
            ))
        })
}

/// Build a read request for `addrs`. Replies come back as a write record.
pub fn encode_reads(addrs: &[u32]) -> Result<Vec<u8>> {
    let rcount = check_count(addrs.len())?;
    let mut buf = Vec::with_capacity(HEADER_LEN + RECORD_HEADER_LEN + 4 * (addrs.len() + 1));
    push_header(&mut buf);
    buf.extend_from_slice(&[0, BYTE_ENABLE, 0, rcount]);
    // Base return address: where the reply's write record lands.
    buf.extend_from_slice(&0u32.to_be_bytes());
    for addr in addrs {
        buf.extend_from_slice(&addr.to_be_bytes());
    }
    Ok(buf)
}

/// Build a write request storing `datas` at consecutive words from `base`.
pub fn encode_writes(base: u32, datas: &[u32]) -> Result<Vec<u8>> {
    let wcount = check_count(datas.len())?;
    let mut buf = Vec::with_capacity(HEADER_LEN + RECORD_HEADER_LEN + 4 * (datas.len() + 1));
    push_header(&mut buf);
    buf.extend_from_slice(&[0, BYTE_ENABLE, wcount, 0]);
    buf.extend_from_slice(&base.to_be_bytes());
    for data in datas {
        buf.extend_from_slice(&data.to_be_bytes());
    }
    Ok(buf)
}

fn be_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}

/// Extract the data words from a read reply.
pub fn decode_read_reply(packet: &[u8]) -> Result<Vec<u32>> {
    let malformed = |what: &str| EbError::Transport(format!("malformed etherbone reply: {what}"));

    if packet.len() < HEADER_LEN + RECORD_HEADER_LEN + 4 {
        return Err(malformed("too short"));
    }
    let magic = u16::from_be_bytes([packet[0], packet[1]]);
    if magic != MAGIC {
        return Err(malformed(&format!("bad magic 0x{magic:04x}")));
    }
    if packet[2] >> 4 != VERSION {
        return Err(malformed(&format!("unsupported version {}", packet[2] >> 4)));
    }
    let record = &packet[HEADER_LEN..];
    let wcount = usize::from(record[2]);
    if wcount == 0 {
        return Err(malformed("no data words"));
    }
    // Skip record header and base write address.
    let body = RECORD_HEADER_LEN + 4;
    if record.len() < body + 4 * wcount {
        return Err(malformed("truncated data"));
    }
    Ok((0..wcount).map(|i| be_u32(record, body + 4 * i)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Reply as the device would send it for the given data words.
    fn reply(datas: &[u32]) -> Vec<u8> {
        encode_writes(0, datas).unwrap()
    }

    #[test]
    fn read_request_layout() {
        let pkt = encode_reads(&[0xf000_0800]).unwrap();
        assert_eq!(
            pkt,
            [
                0x4e, 0x6f, 0x10, 0x44, 0, 0, 0, 0, // header
                0x00, 0x0f, 0x00, 0x01, // record: rcount = 1
                0, 0, 0, 0, // base return address
                0xf0, 0x00, 0x08, 0x00, // read address
            ]
        );
    }

    #[test]
    fn write_request_layout() {
        let pkt = encode_writes(0x1000, &[0xc0a8_0132]).unwrap();
        assert_eq!(&pkt[..HEADER_LEN], &[0x4e, 0x6f, 0x10, 0x44, 0, 0, 0, 0]);
        assert_eq!(&pkt[8..12], &[0x00, 0x0f, 0x01, 0x00]);
        assert_eq!(&pkt[12..16], &[0x00, 0x00, 0x10, 0x00]);
        assert_eq!(&pkt[16..20], &[0xc0, 0xa8, 0x01, 0x32]);
        assert_eq!(pkt.len(), 20);
    }

    #[test]
    fn multi_word_read_request() {
        let pkt = encode_reads(&[0x10, 0x14, 0x18]).unwrap();
        assert_eq!(pkt[11], 3);
        assert_eq!(pkt.len(), HEADER_LEN + RECORD_HEADER_LEN + 4 + 12);
    }

    #[test]
    fn empty_and_oversized_records_rejected() {
        assert!(encode_reads(&[]).is_err());
        assert!(encode_writes(0, &[]).is_err());
        assert!(encode_reads(&vec![0; MAX_RECORD_WORDS + 1]).is_err());
        assert!(encode_reads(&vec![0; MAX_RECORD_WORDS]).is_ok());
    }

    #[test]
    fn decode_reply_words() {
        assert_eq!(decode_read_reply(&reply(&[7])).unwrap(), vec![7]);
        assert_eq!(
            decode_read_reply(&reply(&[1, 0xffff_ffff])).unwrap(),
            vec![1, 0xffff_ffff]
        );
    }

    #[test]
    fn decode_rejects_bad_magic() {
        let mut pkt = reply(&[1]);
        pkt[0] = 0;
        let err = decode_read_reply(&pkt).unwrap_err();
        assert!(format!("{err}").contains("bad magic"));
    }

    #[test]
    fn decode_rejects_truncated() {
        let pkt = reply(&[1, 2]);
        assert!(decode_read_reply(&pkt[..pkt.len() - 2]).is_err());
        assert!(decode_read_reply(&pkt[..10]).is_err());
    }

    #[test]
    fn decode_rejects_read_record() {
        // A request echoed back carries no write words.
        let pkt = encode_reads(&[0]).unwrap();
        assert!(decode_read_reply(&pkt).is_err());
    }
}
