//! Format detection: extension first, magic bytes as a fallback, extended
//! with the ebook-specific signatures.

use std::io::Read;

use bookmover_model::FormatTag;

const MOBI_MAGIC_OFFSET: usize = 0x3C;
const MOBI_MAGIC: &[u8] = b"BOOKMOBI";
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const PDF_MAGIC: &[u8] = b"%PDF";
const RAR_MAGIC: &[u8] = b"Rar!\x1a\x07";
const FICTIONBOOK_NEEDLE: &[u8] = b"<FictionBook";
const SNIFF_LEN: usize = 512;

/// Matches by extension (case-insensitive), falling back to the first
/// `SNIFF_LEN` bytes of `reader` when the extension is absent or
/// unrecognized. Never reads more than `SNIFF_LEN` bytes, so it tolerates
/// arbitrarily large files without buffering them.
pub fn detect_format(extension: Option<&str>, reader: &mut impl Read) -> FormatTag {
    if let Some(ext) = extension {
        if let Some(tag) = FormatTag::from_extension(ext) {
            return tag;
        }
    }

    let mut buf = [0u8; SNIFF_LEN];
    let n = read_up_to(reader, &mut buf);
    detect_from_bytes(&buf[..n])
}

fn read_up_to(reader: &mut impl Read, buf: &mut [u8]) -> usize {
    let mut total = 0;
    while total < buf.len() {
        match reader.read(&mut buf[total..]) {
            Ok(0) => break,
            Ok(n) => total += n,
            Err(_) => break,
        }
    }
    total
}

fn detect_from_bytes(data: &[u8]) -> FormatTag {
    if data.len() > MOBI_MAGIC_OFFSET + MOBI_MAGIC.len()
        && &data[MOBI_MAGIC_OFFSET..MOBI_MAGIC_OFFSET + MOBI_MAGIC.len()] == MOBI_MAGIC
    {
        return FormatTag::Mobi;
    }
    if data.starts_with(ZIP_MAGIC) {
        return FormatTag::Epub;
    }
    if data.starts_with(PDF_MAGIC) {
        return FormatTag::Pdf;
    }
    if data.starts_with(RAR_MAGIC) {
        return FormatTag::Cbr;
    }
    if contains(data, FICTIONBOOK_NEEDLE) {
        return FormatTag::Fb2;
    }
    FormatTag::Unknown
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}
