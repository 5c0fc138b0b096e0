// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! WebAssembly binary format encoding.
//!
//! [`encode_binary`] serializes a fully constructed [`Module`] to the
//! binary format: the `\0asm` preamble, the little-endian version word,
//! then each section framed as `id LEB128-length payload`, in the caller's
//! order. Encoding is a pure traversal; on failure no partial output is
//! returned.

mod expr;
mod impls;
mod leb128;

use alloc::vec::Vec;

use crate::error::Error;
use crate::module::{Module, Section};
use crate::types::ValType;

pub(crate) use expr::encode_expr;

// The `\0asm` preamble identifying a binary module.
const MAGIC: [u8; 4] = [0x00, 0x61, 0x73, 0x6d];

// A trait for things with a context-independent binary encoding.
pub(crate) trait Encode {
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error>;
}

// Appends a u32-checked count in unsigned LEB128 form. All wire-side
// counts (vectors, names, section and body sizes) are u32.
pub(crate) fn write_count(
    out: &mut Vec<u8>,
    count: usize,
    what: &'static str,
) -> Result<(), Error> {
    let count = u32::try_from(count).map_err(|_| Error::overflow(what, count))?;
    leb128::write_unsigned(out, u64::from(count));
    Ok(())
}

// Appends a vector: the element count, then each element's encoding.
pub(crate) fn encode_vector<T: Encode>(items: &[T], out: &mut Vec<u8>) -> Result<(), Error> {
    write_count(out, items.len(), "vector length")?;
    for item in items {
        item.encode(out)?;
    }
    Ok(())
}

// Appends a name: a LEB128 byte-length prefix followed by raw UTF-8.
pub(crate) fn encode_name(name: &str, out: &mut Vec<u8>) -> Result<(), Error> {
    write_count(out, name.len(), "name length")?;
    out.extend_from_slice(name.as_bytes());
    Ok(())
}

/// Encodes a module to its binary form.
pub fn encode_binary(module: &Module) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    out.extend_from_slice(&MAGIC);
    out.extend_from_slice(&module.version.to_le_bytes());
    for section in &module.sections {
        encode_section(section, &mut out)?;
    }
    Ok(out)
}

// Frames one section: ID byte, payload length, payload.
fn encode_section(section: &Section, out: &mut Vec<u8>) -> Result<(), Error> {
    let mut payload = Vec::new();
    encode_section_payload(section, &mut payload)?;
    out.push(u8::from(section.id()));
    write_count(out, payload.len(), "section size")?;
    out.extend_from_slice(&payload);
    Ok(())
}

fn encode_section_payload(section: &Section, out: &mut Vec<u8>) -> Result<(), Error> {
    match section {
        Section::Custom(custom) => {
            encode_name(&custom.name, out)?;
            out.extend_from_slice(&custom.data);
        }
        Section::Type(types) => encode_vector(&types.types, out)?,
        Section::Import(imports) => encode_vector(&imports.imports, out)?,
        Section::Function(functions) => encode_vector(&functions.type_indices, out)?,
        Section::Table(tables) => encode_vector(&tables.tables, out)?,
        Section::Memory(memories) => encode_vector(&memories.memories, out)?,
        Section::Global(globals) => encode_vector(&globals.globals, out)?,
        Section::Export(exports) => encode_vector(&exports.exports, out)?,
        Section::Start(start) => start.func.encode(out)?,
        Section::Element(elements) => encode_vector(&elements.elements, out)?,
        Section::Code(code) => encode_vector(&code.funcs, out)?,
        Section::Data(data) => encode_vector(&data.segments, out)?,
        Section::DataCount(count) => leb128::write_unsigned(out, u64::from(count.count)),
    }
    Ok(())
}

/// Encodes an unsigned integer in (minimal) unsigned LEB128 form.
pub fn encode_uleb128(value: u64) -> Vec<u8> {
    let mut out = Vec::new();
    leb128::write_unsigned(&mut out, value);
    out
}

/// Encodes a signed integer in (minimal) signed LEB128 form.
pub fn encode_sleb128(value: i64) -> Vec<u8> {
    let mut out = Vec::new();
    leb128::write_signed(&mut out, value);
    out
}

/// Encodes an f32 as 4 little-endian IEEE 754 bytes.
pub fn encode_f32(value: f32) -> [u8; 4] {
    value.to_le_bytes()
}

/// Encodes an f64 as 8 little-endian IEEE 754 bytes.
pub fn encode_f64(value: f64) -> [u8; 8] {
    value.to_le_bytes()
}

/// Encodes a string as a LEB128 byte-length prefix followed by its UTF-8
/// bytes, for consumers composing custom section payloads.
pub fn encode_string(value: &str) -> Result<Vec<u8>, Error> {
    let mut out = Vec::new();
    encode_name(value, &mut out)?;
    Ok(out)
}

// A value type used where the binary format expects a heap type. Only the
// reference value types name heap types.
pub(crate) fn heap_type_tag(ty: ValType) -> Result<u8, Error> {
    match ty {
        ValType::I32 | ValType::I64 | ValType::F32 | ValType::F64 | ValType::V128 => {
            Err(Error::InvalidStructure {
                what: "numeric type in heap-type position",
            })
        }
        _ => Ok(u8::from(ty)),
    }
}
