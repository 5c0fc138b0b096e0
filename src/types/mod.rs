// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! WebAssembly type definitions.
//!
//! This module contains all the WebAssembly type definitions used for
//! constructing modules: value types, reference and heap types, composite
//! (function/struct/array) types, and the resource-description types for
//! memories, tables, and globals.

mod instr;
pub use instr::*;

use alloc::vec::Vec;

use num_enum::IntoPrimitive;

// Defines a public u32 index newtype without public mutable access to the
// underlying value, along with some convenience trait implementations like
// Deref and From.
macro_rules! newtype {
    (
        $(#[$meta:meta])*
        pub struct $type:ident(u32);
    ) => {
        $(#[$meta])*
        pub struct $type(u32);

        impl $type {
            pub fn new(value: u32) -> Self {
                Self(value)
            }
        }

        impl ::core::ops::Deref for $type {
            type Target = u32;

            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }

        impl From<u32> for $type {
            fn from(value: u32) -> Self {
                Self(value)
            }
        }
    };
}
pub(crate) use newtype;

/// Value types classify the individual values that WebAssembly code can
/// compute with and the values that a variable accepts.
///
/// The discriminants are the binary-format tag bytes and must be preserved
/// exactly.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum ValType {
    /// 32-bit signed integer.
    I32 = 0x7f,
    /// 64-bit signed integer.
    I64 = 0x7e,
    /// 32-bit floating point number.
    F32 = 0x7d,
    /// 64-bit floating point number.
    F64 = 0x7c,
    /// 128-bit SIMD vector.
    V128 = 0x7b,
    /// Function reference.
    FuncRef = 0x70,
    /// External reference.
    ExternRef = 0x6f,
    /// Reference to any internal object.
    AnyRef = 0x6e,
    /// Reference supporting equality comparison.
    EqRef = 0x6d,
    /// Unboxed 31-bit scalar reference.
    I31Ref = 0x6c,
    /// Reference to any struct.
    StructRef = 0x6b,
    /// Reference to any array.
    ArrayRef = 0x6a,
    /// Null function reference (bottom of the func hierarchy).
    NullFuncRef = 0x73,
    /// Null external reference (bottom of the extern hierarchy).
    NullExternRef = 0x72,
    /// Null internal reference (bottom of the any hierarchy).
    NullRef = 0x71,
}

impl ValType {
    /// The canonical short name used by the text format.
    pub const fn name(self) -> &'static str {
        match self {
            ValType::I32 => "i32",
            ValType::I64 => "i64",
            ValType::F32 => "f32",
            ValType::F64 => "f64",
            ValType::V128 => "v128",
            ValType::FuncRef => "funcref",
            ValType::ExternRef => "externref",
            ValType::AnyRef => "anyref",
            ValType::EqRef => "eqref",
            ValType::I31Ref => "i31ref",
            ValType::StructRef => "structref",
            ValType::ArrayRef => "arrayref",
            ValType::NullFuncRef => "nullfuncref",
            ValType::NullExternRef => "nullexternref",
            ValType::NullRef => "nullref",
        }
    }
}

/// Packed storage types, usable only inside the field and element storage
/// types of GC composite types.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum PackedType {
    /// 8-bit packed integer.
    I8 = 0x78,
    /// 16-bit packed integer.
    I16 = 0x77,
}

impl PackedType {
    /// The canonical short name used by the text format.
    pub const fn name(self) -> &'static str {
        match self {
            PackedType::I8 => "i8",
            PackedType::I16 => "i16",
        }
    }
}

/// The storage type of a struct field or array element.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum StorageType {
    /// A full value type.
    Val(ValType),
    /// A packed integer type.
    Packed(PackedType),
}

impl From<ValType> for StorageType {
    fn from(ty: ValType) -> Self {
        StorageType::Val(ty)
    }
}

impl From<PackedType> for StorageType {
    fn from(ty: PackedType) -> Self {
        StorageType::Packed(ty)
    }
}

/// The referent of a reference type: a distinguished abstract type or a
/// concrete entry of the type index space.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum HeapType {
    /// One of the abstract heap types (funcref, externref, anyref, ...),
    /// named by its shorthand value type.
    Abstract(ValType),
    /// A concrete composite type at the given type index.
    Concrete(TypeIdx),
}

/// The type of a reference to an object in the runtime store.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct RefType {
    /// Whether null inhabits the type.
    pub nullable: bool,
    /// The referenced heap type.
    pub heap: HeapType,
}

impl RefType {
    /// The classic `funcref` type.
    pub const FUNCREF: Self = Self::abstract_ref(ValType::FuncRef);

    /// The classic `externref` type.
    pub const EXTERNREF: Self = Self::abstract_ref(ValType::ExternRef);

    /// A nullable reference to an abstract heap type.
    pub const fn abstract_ref(ty: ValType) -> Self {
        Self {
            nullable: true,
            heap: HeapType::Abstract(ty),
        }
    }

    /// A reference to the concrete composite type at `index`.
    pub fn concrete(nullable: bool, index: impl Into<TypeIdx>) -> Self {
        Self {
            nullable,
            heap: HeapType::Concrete(index.into()),
        }
    }
}

/// The signature of a function, mapping parameters to results. Also used to
/// classify the inputs and outputs of blocks through [`BlockType`].
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct FuncType {
    pub params: Vec<ValType>,
    pub results: Vec<ValType>,
}

impl FuncType {
    pub fn new(params: Vec<ValType>, results: Vec<ValType>) -> Self {
        Self { params, results }
    }
}

/// The type of a single struct field or array element, pairing a storage
/// type with its mutability.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct FieldType {
    pub storage: StorageType,
    pub mutability: Mutability,
}

/// An aggregate of fields addressed by position.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StructType {
    pub fields: Vec<FieldType>,
}

/// A homogeneous, dynamically sized aggregate.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct ArrayType {
    pub element: FieldType,
}

/// A type definition occupying one slot of the type index space.
#[derive(Clone, Debug, Eq, PartialEq)]
pub enum CompositeType {
    Func(FuncType),
    Struct(StructType),
    Array(ArrayType),
}

impl From<FuncType> for CompositeType {
    fn from(ty: FuncType) -> Self {
        CompositeType::Func(ty)
    }
}

impl From<StructType> for CompositeType {
    fn from(ty: StructType) -> Self {
        CompositeType::Struct(ty)
    }
}

impl From<ArrayType> for CompositeType {
    fn from(ty: ArrayType) -> Self {
        CompositeType::Array(ty)
    }
}

/// The size range of the resizeable storage associated with memory (# of
/// pages) and table types (# of elements).
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Limits {
    /// Minimum size.
    pub min: u32,
    /// Maximum size, with None indicating that there is no upper limit.
    pub max: Option<u32>,
    /// Whether the storage may be shared between threads. Shared storage
    /// requires a maximum.
    pub shared: bool,
}

impl Limits {
    /// Unshared limits with an optional maximum.
    pub const fn new(min: u32, max: Option<u32>) -> Self {
        Self {
            min,
            max,
            shared: false,
        }
    }

    /// Shared limits. The maximum is mandatory for shared storage.
    pub const fn shared(min: u32, max: u32) -> Self {
        Self {
            min,
            max: Some(max),
            shared: true,
        }
    }
}

/// A linear memory type with its size limits.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct MemType {
    pub limits: Limits,
}

impl MemType {
    /// The WebAssembly page size.
    pub const PAGE_SIZE: usize = 0x1_0000; // 64 KiB

    pub const fn new(limits: Limits) -> Self {
        Self { limits }
    }
}

/// WebAssembly table type.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct TableType {
    /// Type of references stored in the table.
    pub element: RefType,
    /// Table size limits.
    pub limits: Limits,
}

/// The mutability of a global variable or GC field.
#[derive(Clone, Copy, Debug, Eq, PartialEq, IntoPrimitive)]
#[repr(u8)]
pub enum Mutability {
    /// Immutable.
    Const = 0x00,
    /// Mutable.
    Var = 0x01,
}

/// Represents the type of a global variable.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct GlobalType {
    /// The type of the global's value.
    pub val_type: ValType,
    /// The mutability of the global.
    pub mutability: Mutability,
}

newtype!(
    /// An index into the type section.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct TypeIdx(u32);
);

newtype!(
    /// An index into the function index space.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct FuncIdx(u32);
);

newtype!(
    /// An index into the table index space.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct TableIdx(u32);
);

newtype!(
    /// An index into the memory index space.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct MemIdx(u32);
);

newtype!(
    /// An index into the global index space.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct GlobalIdx(u32);
);

newtype!(
    /// An index into a function's local variables.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct LocalIdx(u32);
);

newtype!(
    /// An index referencing structured control instructions inside an
    /// instruction sequence.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct LabelIdx(u32);
);

newtype!(
    /// An index into the fields of a struct type.
    #[derive(Clone, Copy, Debug, Eq, PartialEq)]
    pub struct FieldIdx(u32);
);
