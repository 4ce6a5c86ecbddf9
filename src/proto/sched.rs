//! Scheduler parameters: a named field with a six-armed tagged union
//! value.
//!
//! The same structure is both the wire form and the type handed to the
//! hypervisor collaborator, so an unknown value type cannot appear between
//! decode and invocation; only the decoder can meet one, and it rejects it.

use std::io::{Cursor, Write};

use byteorder::{BigEndian, ReadBytesExt, WriteBytesExt};

use crate::{
    limits::SCHED_FIELD_LENGTH,
    wire::{read_bounded_string, write_string},
    Error,
};

const TYPE_INT: i32 = 1;
const TYPE_UINT: i32 = 2;
const TYPE_LLONG: i32 = 3;
const TYPE_ULLONG: i32 = 4;
const TYPE_DOUBLE: i32 = 5;
const TYPE_BOOLEAN: i32 = 6;

/// The value arm of a scheduler parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SchedValue {
    /// Signed 32-bit value.
    Int(i32),
    /// Unsigned 32-bit value.
    Uint(u32),
    /// Signed 64-bit value.
    Llong(i64),
    /// Unsigned 64-bit value.
    Ullong(u64),
    /// Floating point value.
    Double(f64),
    /// Boolean value.
    Boolean(bool),
}

impl SchedValue {
    /// Constructs a new `SchedValue` by parsing the wire format read from
    /// `r`: a discriminant integer followed by the selected arm.
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let value = match r.read_i32::<BigEndian>()? {
            TYPE_INT => SchedValue::Int(r.read_i32::<BigEndian>()?),
            TYPE_UINT => SchedValue::Uint(r.read_u32::<BigEndian>()?),
            TYPE_LLONG => SchedValue::Llong(r.read_i64::<BigEndian>()?),
            TYPE_ULLONG => SchedValue::Ullong(r.read_u64::<BigEndian>()?),
            TYPE_DOUBLE => SchedValue::Double(r.read_f64::<BigEndian>()?),
            TYPE_BOOLEAN => SchedValue::Boolean(r.read_i32::<BigEndian>()? != 0),
            v => {
                return Err(Error::InvalidDiscriminant {
                    union: "sched_param_value",
                    value: v,
                })
            }
        };

        Ok(value)
    }

    /// Serialises this `SchedValue` into `buf`.
    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        match *self {
            SchedValue::Int(v) => {
                buf.write_i32::<BigEndian>(TYPE_INT)?;
                buf.write_i32::<BigEndian>(v)
            }
            SchedValue::Uint(v) => {
                buf.write_i32::<BigEndian>(TYPE_UINT)?;
                buf.write_u32::<BigEndian>(v)
            }
            SchedValue::Llong(v) => {
                buf.write_i32::<BigEndian>(TYPE_LLONG)?;
                buf.write_i64::<BigEndian>(v)
            }
            SchedValue::Ullong(v) => {
                buf.write_i32::<BigEndian>(TYPE_ULLONG)?;
                buf.write_u64::<BigEndian>(v)
            }
            SchedValue::Double(v) => {
                buf.write_i32::<BigEndian>(TYPE_DOUBLE)?;
                buf.write_f64::<BigEndian>(v)
            }
            SchedValue::Boolean(v) => {
                buf.write_i32::<BigEndian>(TYPE_BOOLEAN)?;
                buf.write_i32::<BigEndian>(i32::from(v))
            }
        }
    }
}

/// One scheduler parameter.
#[derive(Debug, Clone, PartialEq)]
pub struct SchedParam {
    /// Parameter name, at most `SCHED_FIELD_LENGTH` bytes.
    pub field: String,

    /// Parameter value.
    pub value: SchedValue,
}

impl SchedParam {
    /// Constructs a new `SchedParam` by parsing the wire format read from
    /// `r`.
    pub fn from_cursor(r: &mut Cursor<&[u8]>) -> Result<Self, Error> {
        let field = read_bounded_string(
            r,
            SCHED_FIELD_LENGTH as u32,
            "field",
            "SCHED_FIELD_LENGTH",
        )?
        .to_owned();

        Ok(SchedParam {
            field,
            value: SchedValue::from_cursor(r)?,
        })
    }

    /// Serialises this `SchedParam` into `buf`.
    pub fn serialise_into<W: Write>(&self, buf: &mut W) -> Result<(), std::io::Error> {
        write_string(buf, &self.field)?;
        self.value.serialise_into(buf)
    }
}
