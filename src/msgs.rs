//! Wire parsers for the ROS1 message payloads this pipeline consumes.
//!
//! ROS1 serializes messages little-endian with length-prefixed strings and
//! arrays; `std_msgs/Header` is `seq (u32) + stamp (2x u32) + frame_id
//! (string)`.

use anyhow::{anyhow, Result};

struct Cursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, len: usize, what: &str) -> Result<&'a [u8]> {
        if self.pos + len > self.buf.len() {
            return Err(anyhow!("payload too short for {what}"));
        }
        let slice = &self.buf[self.pos..self.pos + len];
        self.pos += len;
        Ok(slice)
    }

    fn u32(&mut self, what: &str) -> Result<u32> {
        Ok(u32::from_le_bytes(self.take(4, what)?.try_into().unwrap()))
    }

    fn f64(&mut self, what: &str) -> Result<f64> {
        Ok(f64::from_le_bytes(self.take(8, what)?.try_into().unwrap()))
    }

    fn i8(&mut self, what: &str) -> Result<i8> {
        Ok(self.take(1, what)?[0] as i8)
    }

    fn string(&mut self, what: &str) -> Result<String> {
        let len = self.u32(what)? as usize;
        Ok(String::from_utf8_lossy(self.take(len, what)?).into_owned())
    }

    fn skip_header(&mut self) -> Result<()> {
        self.take(12, "header seq/stamp")?;
        self.string("header frame_id")?;
        Ok(())
    }
}

/// A decoded `sensor_msgs/Image` payload; `data` borrows from the message.
#[derive(Debug)]
pub struct ImageMsg<'a> {
    pub height: usize,
    pub width: usize,
    pub encoding: String,
    pub data: &'a [u8],
}

pub fn parse_image(payload: &[u8]) -> Result<ImageMsg<'_>> {
    let mut cur = Cursor::new(payload);
    cur.skip_header()?;
    let height = cur.u32("height")? as usize;
    let width = cur.u32("width")? as usize;
    let encoding = cur.string("encoding")?;
    cur.take(1, "is_bigendian")?;
    cur.take(4, "step")?;
    let data_len = cur.u32("data length")? as usize;
    let data = cur.take(data_len, "data")?;

    if height == 0 || width == 0 || height > 10_000 || width > 10_000 {
        return Err(anyhow!("invalid image dimensions: {width}x{height}"));
    }
    Ok(ImageMsg { height, width, encoding, data })
}

/// A decoded `sensor_msgs/NavSatFix` payload.
#[derive(Debug, Clone, Copy)]
pub struct NavSatFixMsg {
    /// `NavSatStatus.status`; negative means no fix.
    pub status: i8,
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: f64,
}

pub fn parse_navsatfix(payload: &[u8]) -> Result<NavSatFixMsg> {
    let mut cur = Cursor::new(payload);
    cur.skip_header()?;
    let status = cur.i8("status")?;
    cur.take(2, "service")?;
    Ok(NavSatFixMsg {
        status,
        latitude: cur.f64("latitude")?,
        longitude: cur.f64("longitude")?,
        altitude: cur.f64("altitude")?,
    })
}

/// A `std_msgs/Float64` payload (exposure-time streams).
pub fn parse_float64(payload: &[u8]) -> Result<f64> {
    Cursor::new(payload).f64("data")
}
