use bytes_utils::Str;

pub(crate) const LF: u8 = b'\n';
pub(crate) const CR: u8 = b'\r';

const BOM_CHAR: char = '\u{FEFF}';
const BOM_LEN: usize = BOM_CHAR.len_utf8();
// bom           = %xFEFF ; U+FEFF BYTE ORDER MARK
pub(crate) const BOM: &[u8; BOM_LEN] = &{
    let mut buf = [0u8; BOM_LEN];
    BOM_CHAR.encode_utf8(&mut buf);
    buf
};

pub(crate) const MESSAGE_STR: Str = Str::from_static("message");

pub(crate) const EVENT_STREAM_MIME: &str = "text/event-stream";
pub(crate) const JSON_MIME: &str = "application/json";

/// How much of a failed response body we read before classifying it
pub(crate) const ERROR_BODY_LIMIT: usize = 8 * 1024;

pub(crate) const UNKNOWN_ERROR: &str = "Unknown error";
