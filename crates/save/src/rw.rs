//! Little-endian wire primitives shared by every codec layer. Integers and
//! floats go through `byteorder`; these helpers add the format's one-byte
//! bools and i32-length-prefixed UTF-8 strings with strict validation.

use std::io::{Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};

use crate::error::WorldError;

/// Strings longer than this are treated as corruption, not data.
const MAX_STRING_LEN: i32 = 1 << 20;

pub fn read_bool(r: &mut impl Read) -> Result<bool, WorldError> {
    match r.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        b => Err(WorldError::Format(format!("invalid bool byte {b:#04x}"))),
    }
}

pub fn write_bool(w: &mut impl Write, value: bool) -> Result<(), WorldError> {
    w.write_u8(u8::from(value))?;
    Ok(())
}

pub fn read_string(r: &mut impl Read) -> Result<String, WorldError> {
    let len = r.read_i32::<LittleEndian>()?;
    if len < 0 {
        return Err(WorldError::Format(format!("negative string length {len}")));
    }
    if len > MAX_STRING_LEN {
        return Err(WorldError::Format(format!(
            "string length {len} exceeds the {MAX_STRING_LEN} byte limit"
        )));
    }
    let mut bytes = vec![0u8; len as usize];
    r.read_exact(&mut bytes)?;
    String::from_utf8(bytes)
        .map_err(|e| WorldError::Format(format!("string is not valid UTF-8: {e}")))
}

pub fn write_string(w: &mut impl Write, value: &str) -> Result<(), WorldError> {
    if value.len() > MAX_STRING_LEN as usize {
        return Err(WorldError::Format(format!(
            "string of {} bytes exceeds the {MAX_STRING_LEN} byte limit",
            value.len()
        )));
    }
    w.write_i32::<LittleEndian>(value.len() as i32)?;
    w.write_all(value.as_bytes())?;
    Ok(())
}
