//! Component A: the wire codec.
//!
//! Every message body has a statically known layout. `WireEncode::encode`
//! writes exactly `Self::SIZE` bytes; `WireDecode::decode` is its inverse and
//! rejects any buffer whose length doesn't match. Integers are big-endian,
//! strings are fixed-width and null-padded, enums serialize as their
//! discriminant byte, bools as a single 0/1 byte.

use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};

use byteorder::{BigEndian, ByteOrder};

use crate::error::CodecError;

/// A type with a fixed-size, big-endian wire representation.
pub trait WireEncode {
    const SIZE: usize;

    /// Appends exactly `Self::SIZE` bytes to `buf`.
    fn encode(&self, buf: &mut Vec<u8>);
}

/// The inverse of [`WireEncode`].
pub trait WireDecode: Sized {
    /// Decodes from a buffer of exactly `Self::SIZE` bytes. Callers are
    /// expected to have already checked the length; implementations may
    /// assume `buf.len() == Self::SIZE`.
    fn decode(buf: &[u8]) -> Result<Self, CodecError>;
}

/// Decodes `T` from `buf`, enforcing the exact-length contract `WireEncode`
/// promises.
pub fn decode_exact<T: WireDecode + WireEncode>(buf: &[u8]) -> Result<T, CodecError> {
    if buf.len() != T::SIZE {
        return Err(CodecError::WrongSize {
            expected: T::SIZE,
            actual: buf.len(),
        });
    }
    T::decode(buf)
}

macro_rules! impl_wire_int {
    ($ty:ty, $size:expr, $write:ident, $read:ident) => {
        impl WireEncode for $ty {
            const SIZE: usize = $size;

            fn encode(&self, buf: &mut Vec<u8>) {
                let mut tmp = [0u8; $size];
                BigEndian::$write(&mut tmp, *self);
                buf.extend_from_slice(&tmp);
            }
        }

        impl WireDecode for $ty {
            fn decode(buf: &[u8]) -> Result<Self, CodecError> {
                Ok(BigEndian::$read(buf))
            }
        }
    };
}

impl_wire_int!(u16, 2, write_u16, read_u16);
impl_wire_int!(u32, 4, write_u32, read_u32);
impl_wire_int!(i64, 8, write_i64, read_i64);

impl WireEncode for u8 {
    const SIZE: usize = 1;

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(*self);
    }
}

impl WireDecode for u8 {
    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        Ok(buf[0])
    }
}

impl WireEncode for bool {
    const SIZE: usize = 1;

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.push(u8::from(*self));
    }
}

impl WireDecode for bool {
    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        match buf[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(CodecError::InvalidEnumValue(other)),
        }
    }
}

/// A fixed-width, null-padded string field. `N` is the on-wire byte width.
/// Decoding trims trailing nulls; encoding truncates (rather than panics) a
/// too-long value so a handler can't be crashed by client input, though
/// callers are expected to validate length themselves before it matters.
#[derive(Clone, Eq, PartialEq, Debug, Default)]
pub struct FixedStr<const N: usize>(pub String);

impl<const N: usize> FixedStr<N> {
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }
}

impl<const N: usize> WireEncode for FixedStr<N> {
    const SIZE: usize = N;

    fn encode(&self, buf: &mut Vec<u8>) {
        let bytes = self.0.as_bytes();
        let take = bytes.len().min(N);
        buf.extend_from_slice(&bytes[..take]);
        buf.extend(std::iter::repeat(0u8).take(N - take));
    }
}

impl<const N: usize> WireDecode for FixedStr<N> {
    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let end = buf.iter().position(|&b| b == 0).unwrap_or(buf.len());
        let s = std::str::from_utf8(&buf[..end]).map_err(|_| CodecError::InvalidUtf8)?;
        Ok(Self(s.to_owned()))
    }
}

/// 16-byte IPv6 address + 2-byte port, per §6. IPv4 addresses are stored as
/// IPv4-mapped IPv6 (`::ffff:a.b.c.d`).
#[derive(Copy, Clone, Eq, PartialEq, Debug)]
pub struct WireEndpoint {
    pub ip: Ipv6Addr,
    pub port: u16,
}

impl WireEndpoint {
    pub fn with_port(addr: IpAddr, port: u16) -> Self {
        let ip = match addr {
            IpAddr::V4(v4) => v4.to_ipv6_mapped(),
            IpAddr::V6(v6) => v6,
        };
        Self { ip, port }
    }
}

impl From<SocketAddr> for WireEndpoint {
    fn from(addr: SocketAddr) -> Self {
        Self::with_port(addr.ip(), addr.port())
    }
}

impl WireEncode for WireEndpoint {
    const SIZE: usize = 18;

    fn encode(&self, buf: &mut Vec<u8>) {
        buf.extend_from_slice(&self.ip.octets());
        self.port.encode(buf);
    }
}

impl WireDecode for WireEndpoint {
    fn decode(buf: &[u8]) -> Result<Self, CodecError> {
        let mut octets = [0u8; 16];
        octets.copy_from_slice(&buf[..16]);
        let port = u16::decode(&buf[16..18])?;
        Ok(Self {
            ip: Ipv6Addr::from(octets),
            port,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_str_round_trip_pads_and_trims() {
        let s = FixedStr::<8>::new("abc");
        let mut buf = Vec::new();
        s.encode(&mut buf);
        assert_eq!(buf, b"abc\0\0\0\0\0");
        assert_eq!(FixedStr::<8>::decode(&buf).unwrap(), s);
    }

    #[test]
    fn fixed_str_truncates_overlong_input_on_encode() {
        let s = FixedStr::<4>::new("abcdef");
        let mut buf = Vec::new();
        s.encode(&mut buf);
        assert_eq!(buf, b"abcd");
    }

    #[test]
    fn integers_round_trip_big_endian() {
        let mut buf = Vec::new();
        42u32.encode(&mut buf);
        assert_eq!(buf, [0, 0, 0, 42]);
        assert_eq!(u32::decode(&buf).unwrap(), 42);
    }

    #[test]
    fn endpoint_maps_ipv4_into_ipv6() {
        let addr: SocketAddr = "192.0.2.1:50000".parse().unwrap();
        let endpoint = WireEndpoint::from(addr);
        let mut buf = Vec::new();
        endpoint.encode(&mut buf);
        assert_eq!(&buf[0..10], &[0u8; 10]);
        assert_eq!(&buf[10..12], &[0xff, 0xff]);
        assert_eq!(&buf[12..16], &[192, 0, 2, 1]);
        assert_eq!(decode_exact::<WireEndpoint>(&buf).unwrap(), endpoint);
    }

    #[test]
    fn decode_exact_rejects_wrong_length() {
        let buf = [0u8; 3];
        let err = decode_exact::<u32>(&buf).unwrap_err();
        assert_eq!(
            err,
            CodecError::WrongSize {
                expected: 4,
                actual: 3
            }
        );
    }
}
