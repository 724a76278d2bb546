//! Calibration field convention.
//!
//! The calibration tool (xCal/YACP) addresses block data purely by field
//! name, with the unit and tooltip text attached to each field.  Every
//! Inputs, Outputs and Config record therefore carries a static descriptor
//! table and name-based accessors.  Records are declared with
//! [`block_record!`](crate::block_record), which derives both from the
//! field list so the names can never drift from the struct.
//!
//! A `bool` field is presented to tooling as a single unsigned byte.

use core::fmt;

use crate::error::FieldError;

// `bool` must stay binary-compatible with `u8` for the calibration tool.
const _: () = assert!(core::mem::size_of::<bool>() == 1);

/// Scalar types a record field may have.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    Bool,
    U8,
    U16,
    U32,
    I8,
    I16,
    I32,
    F32,
}

impl FieldType {
    /// Width in bytes as seen by the calibration tool.
    pub const fn width(self) -> usize {
        match self {
            Self::Bool | Self::U8 | Self::I8 => 1,
            Self::U16 | Self::I16 => 2,
            Self::U32 | Self::I32 | Self::F32 => 4,
        }
    }

    /// C type name used by the calibration tool's field scraper.
    pub const fn c_name(self) -> &'static str {
        match self {
            // Tooling treats bool as uint8.
            Self::Bool | Self::U8 => "uint8_t",
            Self::U16 => "uint16_t",
            Self::U32 => "uint32_t",
            Self::I8 => "int8_t",
            Self::I16 => "int16_t",
            Self::I32 => "int32_t",
            Self::F32 => "float",
        }
    }
}

/// A typed field value.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    U8(u8),
    U16(u16),
    U32(u32),
    I8(i8),
    I16(i16),
    I32(i32),
    F32(f32),
}

impl FieldValue {
    pub const fn field_type(self) -> FieldType {
        match self {
            Self::Bool(_) => FieldType::Bool,
            Self::U8(_) => FieldType::U8,
            Self::U16(_) => FieldType::U16,
            Self::U32(_) => FieldType::U32,
            Self::I8(_) => FieldType::I8,
            Self::I16(_) => FieldType::I16,
            Self::I32(_) => FieldType::I32,
            Self::F32(_) => FieldType::F32,
        }
    }

    /// Lossy numeric view, used for logging and link diagnostics.
    pub fn as_f64(self) -> f64 {
        match self {
            Self::Bool(v) => f64::from(u8::from(v)),
            Self::U8(v) => f64::from(v),
            Self::U16(v) => f64::from(v),
            Self::U32(v) => f64::from(v),
            Self::I8(v) => f64::from(v),
            Self::I16(v) => f64::from(v),
            Self::I32(v) => f64::from(v),
            Self::F32(v) => f64::from(v),
        }
    }
}

impl fmt::Display for FieldValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{}", u8::from(*v)),
            Self::U8(v) => write!(f, "{v}"),
            Self::U16(v) => write!(f, "{v}"),
            Self::U32(v) => write!(f, "{v}"),
            Self::I8(v) => write!(f, "{v}"),
            Self::I16(v) => write!(f, "{v}"),
            Self::I32(v) => write!(f, "{v}"),
            Self::F32(v) => write!(f, "{v}"),
        }
    }
}

/// Rust scalar types that map one-to-one onto a [`FieldType`].
pub trait Scalar: Copy {
    const TYPE: FieldType;

    fn into_value(self) -> FieldValue;

    fn from_value(value: FieldValue) -> Option<Self>;
}

macro_rules! impl_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Scalar for $ty {
                const TYPE: FieldType = FieldType::$variant;

                fn into_value(self) -> FieldValue {
                    FieldValue::$variant(self)
                }

                fn from_value(value: FieldValue) -> Option<Self> {
                    match value {
                        FieldValue::$variant(v) => Some(v),
                        _ => None,
                    }
                }
            }
        )*
    };
}

impl_scalar! {
    bool => Bool,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    f32 => F32,
}

/// Static description of one record field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub name: &'static str,
    pub ty: FieldType,
    /// Engineering unit, e.g. `"RPM"`.
    pub unit: Option<&'static str>,
    /// Tooltip text shown by the calibration tool.
    pub note: Option<&'static str>,
}

/// A record whose fields are addressable by name.
pub trait Record {
    /// Every field, in declaration order.
    const FIELDS: &'static [FieldDescriptor];

    fn get(&self, name: &str) -> Option<FieldValue>;

    fn set(&mut self, name: &str, value: FieldValue) -> Result<(), FieldError>;

    fn descriptor(name: &str) -> Option<&'static FieldDescriptor> {
        Self::FIELDS.iter().find(|d| d.name == name)
    }
}

#[doc(hidden)]
pub const fn __opt(s: &'static str) -> Option<&'static str> {
    if s.is_empty() { None } else { Some(s) }
}

/// Declare a block record.
///
/// Adds `#[repr(C)]` and a [`Record`] implementation.  Derives are up to the
/// caller.  A field may carry a unit and an optional tooltip:
///
/// ```
/// use xvcu_block::block_record;
/// use xvcu_block::block::fields::Record;
///
/// block_record! {
///     #[derive(Debug, Default, Clone, Copy)]
///     pub struct MotorInputs {
///         pub enabled: bool,
///         pub speed: f32 ("RPM", "Measured shaft speed"),
///         pub temp: i16 ("degC"),
///     }
/// }
///
/// let d = MotorInputs::descriptor("speed").unwrap();
/// assert_eq!(d.unit, Some("RPM"));
/// ```
#[macro_export]
macro_rules! block_record {
    (@unit) => { None };
    (@unit $unit:literal) => { $crate::block::fields::__opt($unit) };
    (@note) => { None };
    (@note $note:literal) => { Some($note) };
    (
        $(#[$meta:meta])*
        $vis:vis struct $name:ident {
            $(
                $(#[$fmeta:meta])*
                $fvis:vis $field:ident : $ty:ident $( ( $unit:literal $(, $note:literal)? ) )?
            ),* $(,)?
        }
    ) => {
        $(#[$meta])*
        #[repr(C)]
        $vis struct $name {
            $(
                $(#[$fmeta])*
                $fvis $field: $ty,
            )*
        }

        impl $crate::block::fields::Record for $name {
            const FIELDS: &'static [$crate::block::fields::FieldDescriptor] = &[
                $(
                    $crate::block::fields::FieldDescriptor {
                        name: stringify!($field),
                        ty: <$ty as $crate::block::fields::Scalar>::TYPE,
                        unit: $crate::block_record!(@unit $( $unit )?),
                        note: $crate::block_record!(@note $( $( $note )? )?),
                    },
                )*
            ];

            fn get(&self, name: &str) -> Option<$crate::block::fields::FieldValue> {
                match name {
                    $(
                        stringify!($field) => Some(
                            $crate::block::fields::Scalar::into_value(self.$field)
                        ),
                    )*
                    _ => None,
                }
            }

            fn set(
                &mut self,
                name: &str,
                value: $crate::block::fields::FieldValue,
            ) -> ::core::result::Result<(), $crate::error::FieldError> {
                match name {
                    $(
                        stringify!($field) => {
                            self.$field = <$ty as $crate::block::fields::Scalar>::from_value(value)
                                .ok_or($crate::error::FieldError::TypeMismatch)?;
                            Ok(())
                        }
                    )*
                    _ => Err($crate::error::FieldError::UnknownField),
                }
            }
        }
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    crate::block_record! {
        #[derive(Debug, Default, Clone, Copy, PartialEq)]
        struct Sample {
            flag: bool,
            count: u16 ("", "Samples since boot"),
            speed: f32 ("RPM", "Notes show up as tooltips"),
            trim: i8,
        }
    }

    #[test]
    fn descriptors_follow_declaration_order() {
        let names: Vec<_> = Sample::FIELDS.iter().map(|d| d.name).collect();
        assert_eq!(names, ["flag", "count", "speed", "trim"]);
        assert_eq!(Sample::FIELDS[1].ty, FieldType::U16);
        assert_eq!(Sample::FIELDS[1].unit, None);
        assert_eq!(Sample::FIELDS[1].note, Some("Samples since boot"));
        assert_eq!(Sample::FIELDS[2].unit, Some("RPM"));
        assert_eq!(Sample::FIELDS[3].note, None);
    }

    #[test]
    fn bool_is_reported_as_one_byte() {
        let d = Sample::descriptor("flag").unwrap();
        assert_eq!(d.ty.width(), 1);
        assert_eq!(d.ty.c_name(), "uint8_t");
        assert_eq!(core::mem::size_of::<bool>(), core::mem::size_of::<u8>());
    }

    #[test]
    fn get_and_set_by_name() {
        let mut p = Sample::default();
        p.set("count", FieldValue::U16(42)).unwrap();
        p.set("flag", FieldValue::Bool(true)).unwrap();
        assert_eq!(p.get("count"), Some(FieldValue::U16(42)));
        assert_eq!(p.get("flag"), Some(FieldValue::Bool(true)));
        assert_eq!(p.get("missing"), None);
    }

    #[test]
    fn set_rejects_wrong_type_and_unknown_name() {
        let mut p = Sample::default();
        assert_eq!(p.set("count", FieldValue::U8(1)), Err(FieldError::TypeMismatch));
        assert_eq!(p.set("nope", FieldValue::U8(1)), Err(FieldError::UnknownField));
        assert_eq!(p, Sample::default());
    }

    #[test]
    fn bool_displays_as_byte() {
        assert_eq!(FieldValue::Bool(true).to_string(), "1");
        assert!((FieldValue::I8(-3).as_f64() + 3.0).abs() < f64::EPSILON);
    }
}
