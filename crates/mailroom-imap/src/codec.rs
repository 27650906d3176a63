//! Mailbox name encoding.
//!
//! IMAP transmits mailbox names in modified UTF-7 (RFC 3501 §5.1.3): printable
//! ASCII stands for itself, `&` opens a shifted run of modified base64 over
//! UTF-16BE that is closed by `-`, `&-` is a literal ampersand, and `,`
//! replaces `/` in the base64 alphabet. There is no padding.
//!
//! Decoding here is best-effort. A malformed run is dropped and the result is
//! flagged as lossy instead of failing, so one broken name can never abort a
//! whole directory listing.

use base64::Engine;
use base64::alphabet::IMAP_MUTF7;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};

/// Shift character opening a base64 run.
const SHIFT: char = '&';
/// Terminator of a base64 run.
const UNSHIFT: char = '-';
/// Hierarchy separator as it appears on the wire.
const WIRE_SEPARATOR: char = ',';
/// Hierarchy separator shown to callers.
pub const DISPLAY_SEPARATOR: char = '/';

const MUTF7: GeneralPurpose = GeneralPurpose::new(
    &IMAP_MUTF7,
    GeneralPurposeConfig::new()
        .with_encode_padding(false)
        .with_decode_padding_mode(DecodePaddingMode::Indifferent)
        .with_decode_allow_trailing_bits(true),
);

/// A decoded mailbox name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedName {
    /// The name as UTF-8, with `/` as hierarchy separator.
    pub name: String,
    /// True if some input could not be decoded and was dropped.
    pub lossy: bool,
}

impl DecodedName {
    fn exact(name: String) -> Self {
        Self { name, lossy: false }
    }

    /// Returns true if part of the input was dropped.
    #[must_use]
    pub const fn is_lossy(&self) -> bool {
        self.lossy
    }
}

/// Decodes a listed mailbox name into its short display form.
///
/// `namespace` is stripped from the front when present.
#[must_use]
pub fn decode_listed_name(raw: &str, namespace: &str) -> DecodedName {
    let short = raw.strip_prefix(namespace).unwrap_or(raw);
    decode_mailbox_name(short)
}

/// Decodes a modified UTF-7 mailbox name.
///
/// Plain ASCII without `&` or `,` comes back unchanged. Text that already
/// contains non-ASCII characters is taken to be UTF-8 sent by a server that
/// skips the encoding, and only has its separators normalised.
#[must_use]
pub fn decode_mailbox_name(text: &str) -> DecodedName {
    if !text.is_ascii() {
        return DecodedName::exact(text.replace(WIRE_SEPARATOR, "/"));
    }

    let mut name = String::with_capacity(text.len());
    let mut lossy = false;
    let mut rest = text;

    while let Some(pos) = rest.find([SHIFT, WIRE_SEPARATOR]) {
        name.push_str(&rest[..pos]);
        if rest[pos..].starts_with(WIRE_SEPARATOR) {
            name.push(DISPLAY_SEPARATOR);
            rest = &rest[pos + 1..];
            continue;
        }

        let run_start = pos + 1;
        let Some(len) = rest[run_start..].find(UNSHIFT) else {
            // Unterminated run: nothing after it can be trusted.
            lossy = true;
            rest = "";
            break;
        };
        let run = &rest[run_start..run_start + len];
        if run.is_empty() {
            name.push(SHIFT);
        } else if !decode_run(run, &mut name) {
            lossy = true;
        }
        rest = &rest[run_start + len + 1..];
    }
    name.push_str(rest);

    DecodedName { name, lossy }
}

/// Decodes one base64 run into `out`. Returns false if anything was dropped.
fn decode_run(run: &str, out: &mut String) -> bool {
    let Ok(bytes) = MUTF7.decode(run) else {
        return false;
    };

    let mut exact = bytes.len() % 2 == 0;
    let units = bytes
        .chunks_exact(2)
        .map(|pair| u16::from_be_bytes([pair[0], pair[1]]));
    for decoded in char::decode_utf16(units) {
        match decoded {
            Ok(c) => out.push(c),
            Err(_) => exact = false,
        }
    }
    exact
}

/// Encodes a display name into modified UTF-7 for use on the wire.
///
/// `/` becomes the wire separator `,`, so decoding the result gives back the
/// input for any name without a literal comma.
#[must_use]
pub fn encode_mailbox_name(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut pending: Vec<u16> = Vec::new();

    for c in name.chars() {
        if is_direct(c) {
            flush_run(&mut pending, &mut out);
            match c {
                SHIFT => out.push_str("&-"),
                DISPLAY_SEPARATOR => out.push(WIRE_SEPARATOR),
                _ => out.push(c),
            }
        } else {
            let mut buf = [0u16; 2];
            pending.extend_from_slice(c.encode_utf16(&mut buf));
        }
    }
    flush_run(&mut pending, &mut out);
    out
}

const fn is_direct(c: char) -> bool {
    matches!(c, ' '..='~')
}

fn flush_run(pending: &mut Vec<u16>, out: &mut String) {
    if pending.is_empty() {
        return;
    }
    let bytes: Vec<u8> = pending.iter().flat_map(|u| u.to_be_bytes()).collect();
    out.push(SHIFT);
    out.push_str(&MUTF7.encode(bytes));
    out.push(UNSHIFT);
    pending.clear();
}
