//! Google encoded-polyline codec.
//! https://developers.google.com/maps/documentation/utilities/polylinealgorithm

use thiserror::Error;

use crate::models::driver::GeoPoint;

#[derive(Debug, Error, PartialEq)]
pub enum PolylineError {
    #[error("unterminated chunk at byte {0}")]
    Unterminated(usize),
}

pub fn decode(encoded: &str) -> Result<Vec<GeoPoint>, PolylineError> {
    let bytes = encoded.as_bytes();
    let mut points = Vec::new();
    let mut index = 0;
    let mut lat: i64 = 0;
    let mut lng: i64 = 0;

    while index < bytes.len() {
        let (delta_lat, next) = decode_value(bytes, index)?;
        let (delta_lng, next) = decode_value(bytes, next)?;
        index = next;

        lat += delta_lat;
        lng += delta_lng;

        points.push(GeoPoint {
            lat: lat as f64 / 1e5,
            lng: lng as f64 / 1e5,
        });
    }

    Ok(points)
}

pub fn encode(points: &[GeoPoint]) -> String {
    let mut out = String::new();
    let mut prev_lat: i64 = 0;
    let mut prev_lng: i64 = 0;

    for point in points {
        let lat = (point.lat * 1e5).round() as i64;
        let lng = (point.lng * 1e5).round() as i64;

        encode_value(lat - prev_lat, &mut out);
        encode_value(lng - prev_lng, &mut out);

        prev_lat = lat;
        prev_lng = lng;
    }

    out
}

fn decode_value(bytes: &[u8], start: usize) -> Result<(i64, usize), PolylineError> {
    let mut index = start;
    let mut shift = 0;
    let mut accum: i64 = 0;

    loop {
        let Some(&byte) = bytes.get(index) else {
            return Err(PolylineError::Unterminated(start));
        };
        index += 1;

        let chunk = i64::from(byte) - 63;
        accum |= (chunk & 0x1f) << shift;
        shift += 5;

        if chunk < 0x20 {
            break;
        }
    }

    let value = if accum & 1 != 0 {
        !(accum >> 1)
    } else {
        accum >> 1
    };

    Ok((value, index))
}

fn encode_value(value: i64, out: &mut String) {
    let mut accum = if value < 0 { !(value << 1) } else { value << 1 };

    while accum >= 0x20 {
        out.push((((accum & 0x1f) | 0x20) + 63) as u8 as char);
        accum >>= 5;
    }
    out.push((accum + 63) as u8 as char);
}
