pub mod drain;
pub mod stub;

use bytes::Bytes;
use http_body_util::Full;

#[inline]
#[must_use]
pub fn empty_body() -> Full<Bytes> {
    Full::new(Bytes::new())
}
