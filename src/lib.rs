// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! WebAssembly module construction and serialization library.
//!
//! Callers assemble a typed in-memory [`Module`] — types, functions,
//! memories, tables, globals, imports, exports, element and data segments,
//! code bodies — and emit either the canonical binary format via
//! [`encode_binary`] or a human-readable text rendering via
//! [`encode_text`]. The library is write-only: it neither decodes nor
//! validates nor executes modules, and encoding is a pure traversal of the
//! caller-owned module value.
//!
//! ```
//! use wasmith::types::{FuncType, Instruction, TypeIdx, ValType};
//! use wasmith::{CodeSection, Func, FunctionSection, Module, Section, TypeSection};
//!
//! let mut module = Module::new();
//! module.add_section(Section::Type(TypeSection {
//!     types: vec![FuncType::new(vec![ValType::I32], vec![ValType::I32]).into()],
//! }));
//! module.add_section(Section::Function(FunctionSection {
//!     type_indices: vec![TypeIdx::new(0)],
//! }));
//! module.add_section(Section::Code(CodeSection {
//!     funcs: vec![Func::new(vec![
//!         Instruction::local_get(0),
//!         Instruction::plain(wasmith::types::Opcode::Return),
//!     ])],
//! }));
//! let bytes = wasmith::encode_binary(&module).unwrap();
//! assert!(bytes.starts_with(b"\0asm"));
//! ```

#![cfg_attr(not(any(test, feature = "std")), no_std)]

extern crate alloc;

pub mod encode;
mod error;
mod module;
pub mod text;
pub mod types;

pub use encode::{
    encode_binary, encode_f32, encode_f64, encode_sleb128, encode_string, encode_uleb128,
};
pub use error::Error;
pub use module::*;
pub use text::encode_text;
