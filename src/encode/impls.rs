// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Encode trait implementations for the type layer.

use alloc::vec::Vec;

use crate::error::Error;
use crate::module::{
    DataMode, DataSegment, ElementMode, ElementSegment, Export, ExportDescriptor, Global, Import,
    ImportDescriptor,
};
use crate::types::{
    ArrayType, CompositeType, FieldType, FuncType, GlobalType, HeapType, Limits, MemType,
    Mutability, PackedType, RefType, StorageType, StructType, TableType, ValType,
};

use super::leb128::{write_signed, write_unsigned};
use super::{Encode, encode_expr, encode_name, encode_vector, heap_type_tag, write_count};

// Composite type kind-prefix bytes.
const FUNC_TYPE_TAG: u8 = 0x60;
const STRUCT_TYPE_TAG: u8 = 0x5f;
const ARRAY_TYPE_TAG: u8 = 0x5e;

// Non-shorthand reference type prefixes: (ref null ht) and (ref ht).
const REF_NULL_PREFIX: u8 = 0x63;
const REF_PREFIX: u8 = 0x64;

impl Encode for ValType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.push(u8::from(*self));
        Ok(())
    }
}

impl Encode for PackedType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.push(u8::from(*self));
        Ok(())
    }
}

impl Encode for StorageType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            StorageType::Val(ty) => ty.encode(out),
            StorageType::Packed(ty) => ty.encode(out),
        }
    }
}

impl Encode for Mutability {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.push(u8::from(*self));
        Ok(())
    }
}

// Appends a heap type: the abstract shorthand tag, or a signed (s33) type
// index.
pub(super) fn encode_heap_type(heap: HeapType, out: &mut Vec<u8>) -> Result<(), Error> {
    match heap {
        HeapType::Abstract(ty) => {
            out.push(heap_type_tag(ty)?);
            Ok(())
        }
        HeapType::Concrete(index) => {
            write_signed(out, i64::from(*index));
            Ok(())
        }
    }
}

impl Encode for RefType {
    // The reference type encoding table: nullable references to abstract
    // heap types collapse to the shorthand tag byte; everything else is a
    // (ref null ht) / (ref ht) prefix followed by the heap type.
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        match (self.nullable, self.heap) {
            (true, HeapType::Abstract(ty)) => {
                out.push(heap_type_tag(ty)?);
                Ok(())
            }
            (true, HeapType::Concrete(_)) => {
                out.push(REF_NULL_PREFIX);
                encode_heap_type(self.heap, out)
            }
            (false, _) => {
                out.push(REF_PREFIX);
                encode_heap_type(self.heap, out)
            }
        }
    }
}

impl Encode for FuncType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.push(FUNC_TYPE_TAG);
        encode_vector(&self.params, out)?;
        encode_vector(&self.results, out)
    }
}

impl Encode for FieldType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        self.storage.encode(out)?;
        self.mutability.encode(out)
    }
}

impl Encode for StructType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.push(STRUCT_TYPE_TAG);
        encode_vector(&self.fields, out)
    }
}

impl Encode for ArrayType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        out.push(ARRAY_TYPE_TAG);
        self.element.encode(out)
    }
}

impl Encode for CompositeType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        match self {
            CompositeType::Func(ty) => ty.encode(out),
            CompositeType::Struct(ty) => ty.encode(out),
            CompositeType::Array(ty) => ty.encode(out),
        }
    }
}

impl Encode for Limits {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        // Shared storage requires a maximum; 0x02 (shared, no max) is not a
        // valid limits shape and is refused rather than emitted.
        let tag = match (self.max, self.shared) {
            (None, false) => 0x00,
            (Some(_), false) => 0x01,
            (Some(_), true) => 0x03,
            (None, true) => {
                return Err(Error::InvalidStructure {
                    what: "shared limits without a maximum",
                });
            }
        };
        out.push(tag);
        write_unsigned(out, u64::from(self.min));
        if let Some(max) = self.max {
            write_unsigned(out, u64::from(max));
        }
        Ok(())
    }
}

impl Encode for MemType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        self.limits.encode(out)
    }
}

impl Encode for TableType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        self.element.encode(out)?;
        self.limits.encode(out)
    }
}

impl Encode for GlobalType {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        self.val_type.encode(out)?;
        self.mutability.encode(out)
    }
}

// All u32 index newtypes encode as plain unsigned LEB128 indices.
macro_rules! impl_encode_for_index {
    ($($type:ident),*) => {
        $(
            impl Encode for crate::types::$type {
                fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
                    write_unsigned(out, u64::from(**self));
                    Ok(())
                }
            }
        )*
    };
}

impl_encode_for_index!(
    TypeIdx, FuncIdx, TableIdx, MemIdx, GlobalIdx, LocalIdx, LabelIdx, FieldIdx
);

impl Encode for Import {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        encode_name(&self.module, out)?;
        encode_name(&self.field, out)?;
        match &self.descriptor {
            ImportDescriptor::Func(index) => {
                out.push(0x00);
                index.encode(out)
            }
            ImportDescriptor::Table(ty) => {
                out.push(0x01);
                ty.encode(out)
            }
            ImportDescriptor::Memory(ty) => {
                out.push(0x02);
                ty.encode(out)
            }
            ImportDescriptor::Global(ty) => {
                out.push(0x03);
                ty.encode(out)
            }
        }
    }
}

impl Encode for Export {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        encode_name(&self.name, out)?;
        match self.descriptor {
            ExportDescriptor::Func(index) => {
                out.push(0x00);
                index.encode(out)
            }
            ExportDescriptor::Table(index) => {
                out.push(0x01);
                index.encode(out)
            }
            ExportDescriptor::Memory(index) => {
                out.push(0x02);
                index.encode(out)
            }
            ExportDescriptor::Global(index) => {
                out.push(0x03);
                index.encode(out)
            }
        }
    }
}

impl Encode for Global {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        self.ty.encode(out)?;
        encode_expr(&self.init, out)
    }
}

impl Encode for ElementSegment {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        match &self.mode {
            ElementMode::Active { offset } => {
                out.push(0x00);
                encode_expr(offset, out)?;
            }
            ElementMode::Passive => {
                out.push(0x01);
                self.ty.encode(out)?;
            }
            ElementMode::Declarative => {
                out.push(0x03);
                self.ty.encode(out)?;
            }
        }
        write_count(out, self.init.len(), "element initializer count")?;
        for expr in &self.init {
            encode_expr(expr, out)?;
        }
        Ok(())
    }
}

impl Encode for DataSegment {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        match &self.mode {
            DataMode::Active { offset } => {
                out.push(0x00);
                encode_expr(offset, out)?;
            }
            DataMode::Passive => out.push(0x01),
        }
        write_count(out, self.init.len(), "data segment size")?;
        out.extend_from_slice(&self.init);
        Ok(())
    }
}
