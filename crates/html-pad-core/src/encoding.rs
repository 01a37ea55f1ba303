/// Encoding detection and conversion for HTML file I/O.
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

/// How many leading bytes are scanned for a `<meta charset>` declaration.
const META_PRESCAN_BYTES: usize = 1024;

/// Supported text encodings.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TextEncoding {
    #[default]
    Utf8,
    Utf8Bom,
    Utf16Le,
    Utf16Be,
    /// A named encoding from `encoding_rs` (e.g., "windows-1252").
    Legacy(&'static str),
}

impl std::fmt::Display for TextEncoding {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Utf8 => write!(f, "UTF-8"),
            Self::Utf8Bom => write!(f, "UTF-8 BOM"),
            Self::Utf16Le => write!(f, "UTF-16 LE"),
            Self::Utf16Be => write!(f, "UTF-16 BE"),
            Self::Legacy(name) => write!(f, "{name}"),
        }
    }
}

impl TextEncoding {
    fn from_encoding_rs(encoding: &'static encoding_rs::Encoding) -> Self {
        if encoding == encoding_rs::UTF_8 {
            Self::Utf8
        } else {
            Self::Legacy(encoding.name())
        }
    }
}

/// Detects the encoding of raw HTML bytes.
///
/// A byte order mark wins, then a `<meta charset>` declaration near the
/// start of the file, then UTF-8 validity, then `chardetng`'s guess.
pub fn detect_encoding(bytes: &[u8]) -> TextEncoding {
    if bytes.starts_with(&[0xEF, 0xBB, 0xBF]) {
        return TextEncoding::Utf8Bom;
    }
    if bytes.starts_with(&[0xFF, 0xFE]) {
        return TextEncoding::Utf16Le;
    }
    if bytes.starts_with(&[0xFE, 0xFF]) {
        return TextEncoding::Utf16Be;
    }

    if let Some(encoding) = sniff_meta_charset(bytes) {
        return TextEncoding::from_encoding_rs(encoding);
    }

    if std::str::from_utf8(bytes).is_ok() {
        return TextEncoding::Utf8;
    }

    let mut detector = chardetng::EncodingDetector::new();
    detector.feed(bytes, true);
    TextEncoding::from_encoding_rs(detector.guess(None, true))
}

/// Finds a `charset=` declaration in the first bytes of the document.
///
/// Covers both `<meta charset="...">` and the `http-equiv` content form.
/// A declared UTF-16 is treated as UTF-8, since an ASCII-readable
/// declaration cannot be UTF-16 encoded.
pub fn sniff_meta_charset(bytes: &[u8]) -> Option<&'static encoding_rs::Encoding> {
    let head = &bytes[..bytes.len().min(META_PRESCAN_BYTES)];
    let head = String::from_utf8_lossy(head).to_ascii_lowercase();

    let mut search = head.as_str();
    while let Some(meta) = search.find("<meta") {
        let tag = &search[meta..];
        let tag = &tag[..tag.find('>').unwrap_or(tag.len())];
        if let Some(label) = charset_label(tag) {
            let encoding = encoding_rs::Encoding::for_label(label.as_bytes())?;
            if encoding == encoding_rs::UTF_16LE || encoding == encoding_rs::UTF_16BE {
                return Some(encoding_rs::UTF_8);
            }
            return Some(encoding);
        }
        search = &search[meta + 5..];
    }
    None
}

fn charset_label(tag: &str) -> Option<&str> {
    let start = tag.find("charset")? + "charset".len();
    let value = tag[start..].trim_start().strip_prefix('=')?.trim_start();
    let value = value.trim_start_matches(['"', '\'']);
    let end = value
        .find(|c: char| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | ':' | '.')))
        .unwrap_or(value.len());
    (end > 0).then(|| &value[..end])
}

/// Decodes raw bytes into a String using the specified encoding.
///
/// # Errors
///
/// Returns an error if decoding fails.
pub fn decode_bytes(bytes: &[u8], encoding: TextEncoding) -> Result<String> {
    match encoding {
        TextEncoding::Utf8 => String::from_utf8(bytes.to_vec()).context("invalid UTF-8 content"),
        TextEncoding::Utf8Bom => {
            let content = bytes.strip_prefix(&[0xEF, 0xBB, 0xBF]).unwrap_or(bytes);
            String::from_utf8(content.to_vec()).context("invalid UTF-8 BOM content")
        }
        TextEncoding::Utf16Le => {
            let (decoded, _, had_errors) = encoding_rs::UTF_16LE.decode(bytes);
            if had_errors {
                anyhow::bail!("invalid UTF-16 LE content");
            }
            Ok(decoded.into_owned())
        }
        TextEncoding::Utf16Be => {
            let (decoded, _, had_errors) = encoding_rs::UTF_16BE.decode(bytes);
            if had_errors {
                anyhow::bail!("invalid UTF-16 BE content");
            }
            Ok(decoded.into_owned())
        }
        TextEncoding::Legacy(name) => {
            let encoding = encoding_rs::Encoding::for_label(name.as_bytes())
                .context(format!("unknown encoding: {name}"))?;
            let (decoded, _, had_errors) = encoding.decode(bytes);
            if had_errors {
                anyhow::bail!("encoding errors while decoding as {name}");
            }
            Ok(decoded.into_owned())
        }
    }
}

/// Encodes a string into bytes using the specified encoding.
///
/// UTF-16 output always carries a byte order mark.
///
/// # Errors
///
/// Returns an error if the text cannot be represented in `encoding`.
pub fn encode_string(text: &str, encoding: TextEncoding) -> Result<Vec<u8>> {
    match encoding {
        TextEncoding::Utf8 => Ok(text.as_bytes().to_vec()),
        TextEncoding::Utf8Bom => {
            let mut bytes = vec![0xEF, 0xBB, 0xBF];
            bytes.extend_from_slice(text.as_bytes());
            Ok(bytes)
        }
        TextEncoding::Utf16Le => {
            let mut bytes = vec![0xFF, 0xFE];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_le_bytes());
            }
            Ok(bytes)
        }
        TextEncoding::Utf16Be => {
            let mut bytes = vec![0xFE, 0xFF];
            for unit in text.encode_utf16() {
                bytes.extend_from_slice(&unit.to_be_bytes());
            }
            Ok(bytes)
        }
        TextEncoding::Legacy(name) => {
            let encoding = encoding_rs::Encoding::for_label(name.as_bytes())
                .context(format!("unknown encoding: {name}"))?;
            let (encoded, _, had_errors) = encoding.encode(text);
            if had_errors {
                anyhow::bail!("text cannot be represented as {name}");
            }
            Ok(encoded.into_owned())
        }
    }
}
