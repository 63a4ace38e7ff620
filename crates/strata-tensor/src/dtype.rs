use std::fmt::{self, Debug, Display};
use std::hash::Hash;

use num_traits::{
    Num, NumCast, PrimInt, ToPrimitive, Unsigned, WrappingAdd, WrappingMul, WrappingSub,
};

/// Runtime tag for the element type stored in a tensor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DType {
    I8,
    I16,
    I32,
    I64,
    Isize,
    U8,
    U16,
    U32,
    U64,
    Usize,
    F32,
    F64,
}

impl DType {
    /// Returns true for floating-point types, the only ones that can hold NaN or
    /// infinities.
    pub fn is_float(&self) -> bool {
        matches!(self, DType::F32 | DType::F64)
    }
}

impl fmt::Display for DType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DType::I8 => "i8",
            DType::I16 => "i16",
            DType::I32 => "i32",
            DType::I64 => "i64",
            DType::Isize => "isize",
            DType::U8 => "u8",
            DType::U16 => "u16",
            DType::U32 => "u32",
            DType::U64 => "u64",
            DType::Usize => "usize",
            DType::F32 => "f32",
            DType::F64 => "f64",
        };
        write!(f, "{}", name)
    }
}

/// Numeric types a tensor can hold: any signed or unsigned integer, or a float.
///
/// Arithmetic happens in the element type itself, and integer overflow wraps.
/// Kernels combine elements through `wrapping_add`, `wrapping_sub` and
/// `wrapping_mul` rather than the operators. Conversions through `f64`
/// follow `as`-cast semantics: integers truncate toward zero and values that
/// cannot be represented at all (NaN into an integer) become zero.
pub trait Element:
    Num + NumCast + PartialOrd + Copy + Default + Debug + Display + Send + Sync + 'static
{
    const DTYPE: DType;

    fn wrapping_add(self, rhs: Self) -> Self;
    fn wrapping_sub(self, rhs: Self) -> Self;
    fn wrapping_mul(self, rhs: Self) -> Self;

    /// Widen to `f64` for float-only math (sqrt, exp, ln).
    fn as_f64(self) -> f64 {
        ToPrimitive::to_f64(&self).unwrap_or(0.0)
    }

    /// Narrow an `f64` back into this element type.
    fn from_f64(value: f64) -> Self {
        <Self as NumCast>::from(value).unwrap_or_else(Self::zero)
    }

    /// False when the value, read as a float, is NaN or infinite.
    fn is_finite_value(self) -> bool {
        !Self::DTYPE.is_float() || self.as_f64().is_finite()
    }
}

macro_rules! impl_element {
    (int: $($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn wrapping_add(self, rhs: Self) -> Self {
                    WrappingAdd::wrapping_add(&self, &rhs)
                }

                fn wrapping_sub(self, rhs: Self) -> Self {
                    WrappingSub::wrapping_sub(&self, &rhs)
                }

                fn wrapping_mul(self, rhs: Self) -> Self {
                    WrappingMul::wrapping_mul(&self, &rhs)
                }
            }
        )*
    };
    (float: $($ty:ty => $dtype:ident),* $(,)?) => {
        $(
            impl Element for $ty {
                const DTYPE: DType = DType::$dtype;

                fn wrapping_add(self, rhs: Self) -> Self {
                    self + rhs
                }

                fn wrapping_sub(self, rhs: Self) -> Self {
                    self - rhs
                }

                fn wrapping_mul(self, rhs: Self) -> Self {
                    self * rhs
                }
            }
        )*
    };
}

impl_element!(int:
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    isize => Isize,
    u8 => U8,
    u16 => U16,
    u32 => U32,
    u64 => U64,
    usize => Usize,
);

impl_element!(float: f32 => F32, f64 => F64);

/// Unsigned integer types used for shapes, strides and coordinates.
pub trait Dim:
    PrimInt + Unsigned + Hash + Default + Debug + Display + Send + Sync + 'static
{
    /// Convert to `usize` for slice indexing. Saturates on platforms where the
    /// value does not fit.
    fn as_usize(self) -> usize {
        ToPrimitive::to_usize(&self).unwrap_or(usize::MAX)
    }

    /// Convert from `usize`, returning `None` if the value does not fit.
    fn from_usize(n: usize) -> Option<Self> {
        <Self as NumCast>::from(n)
    }
}

impl Dim for u8 {}
impl Dim for u16 {}
impl Dim for u32 {}
impl Dim for u64 {}
impl Dim for usize {}
