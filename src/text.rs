// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Text rendering of modules.
//!
//! Produces a WAT-style S-expression view of a module for human
//! inspection. The binary output is the authoritative interchange format;
//! this rendering is informational and is not guaranteed to re-parse.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use crate::module::{
    CustomSection, DataMode, DataSegment, ElementMode, ElementSegment, Export, ExportDescriptor,
    Func, Global, Import, ImportDescriptor, Module, Section,
};
use crate::types::{
    BlockType, CompositeType, FieldType, FuncType, GlobalType, HeapType, Instruction, Limits,
    Literal, MemArg, MemType, Mutability, RefType, StorageType, TableType,
};

/// Renders a module as WAT-style text.
pub fn encode_text(module: &Module) -> String {
    let mut out = String::from("(module\n");
    for section in &module.sections {
        write_section(&mut out, section);
    }
    out.push(')');
    out
}

fn indent_line(out: &mut String, level: usize, line: &str) {
    for _ in 0..level {
        out.push_str("  ");
    }
    out.push_str(line);
    out.push('\n');
}

fn storage_name(storage: StorageType) -> &'static str {
    match storage {
        StorageType::Val(ty) => ty.name(),
        StorageType::Packed(ty) => ty.name(),
    }
}

fn format_ref_type(ty: &RefType) -> String {
    let nullable = if ty.nullable { "" } else { "nonnull " };
    match ty.heap {
        HeapType::Abstract(heap) => format!("{nullable}{}", heap.name()),
        HeapType::Concrete(index) => format!("{nullable}(ref {})", *index),
    }
}

fn format_func_type(ty: &FuncType) -> String {
    let mut text = String::from("(func");
    for param in &ty.params {
        text.push_str(&format!(" (param {})", param.name()));
    }
    for result in &ty.results {
        text.push_str(&format!(" (result {})", result.name()));
    }
    text.push(')');
    text
}

// Renders a storage type with its (mut ...) wrapper when mutable.
fn format_field_storage(field: &FieldType) -> String {
    match field.mutability {
        Mutability::Var => format!("(mut {})", storage_name(field.storage)),
        Mutability::Const => String::from(storage_name(field.storage)),
    }
}

fn format_composite_type(ty: &CompositeType) -> String {
    match ty {
        CompositeType::Func(func) => format_func_type(func),
        CompositeType::Struct(ty) => {
            let mut text = String::from("(struct");
            for field in &ty.fields {
                text.push_str(&format!(" (field {})", format_field_storage(field)));
            }
            text.push(')');
            text
        }
        CompositeType::Array(ty) => {
            format!("(array {})", format_field_storage(&ty.element))
        }
    }
}

fn format_limits(limits: &Limits) -> String {
    let shared = if limits.shared { " shared" } else { "" };
    match limits.max {
        Some(max) => format!("{} {max}{shared}", limits.min),
        None => format!("{}{shared}", limits.min),
    }
}

fn format_mem_type(ty: &MemType) -> String {
    format_limits(&ty.limits)
}

fn format_table_type(ty: &TableType) -> String {
    format!("{} {}", format_limits(&ty.limits), format_ref_type(&ty.element))
}

fn format_global_type(ty: &GlobalType) -> String {
    match ty.mutability {
        Mutability::Var => format!("(mut {})", ty.val_type.name()),
        Mutability::Const => String::from(ty.val_type.name()),
    }
}

fn format_literal(literal: Literal) -> String {
    match literal {
        Literal::I32(value) => format!("{value}"),
        Literal::I64(value) => format!("{value}"),
        Literal::F32(value) => format!("{value}"),
        Literal::F64(value) => format!("{value}"),
    }
}

fn format_block_type(block_type: BlockType) -> String {
    match block_type {
        BlockType::Empty => String::new(),
        BlockType::Result(ty) => format!(" (result {})", ty.name()),
        BlockType::TypeIndex(index) => format!(" (type {})", *index),
    }
}

fn format_memarg(memarg: MemArg) -> String {
    let mut text = String::new();
    if memarg.offset != 0 {
        text.push_str(&format!(" offset={}", memarg.offset));
    }
    if memarg.align != 0 {
        text.push_str(&format!(" align={}", 2u64.saturating_pow(memarg.align)));
    }
    text
}

// The one-line rendering of an instruction: mnemonic plus immediates. For
// block-structured instructions this is the header line only.
fn instruction_head(instr: &Instruction) -> String {
    match instr {
        Instruction::Plain(opcode) => String::from(opcode.mnemonic()),
        Instruction::Const(literal) => format!(
            "{} {}",
            literal.opcode().mnemonic(),
            format_literal(*literal)
        ),
        Instruction::Local { opcode, index } => format!("{} {}", opcode.mnemonic(), **index),
        Instruction::Global { opcode, index } => format!("{} {}", opcode.mnemonic(), **index),
        Instruction::Func { opcode, index } => format!("{} {}", opcode.mnemonic(), **index),
        Instruction::CallIndirect { opcode, ty, table } => {
            let mut text = format!("{} {}", opcode.mnemonic(), **ty);
            if **table != 0 {
                text.push_str(&format!(" {}", **table));
            }
            text
        }
        Instruction::Br { opcode, label } => format!("{} {}", opcode.mnemonic(), **label),
        Instruction::BrTable { labels, default } => {
            let mut text = String::from("br_table");
            for label in labels {
                text.push_str(&format!(" {}", **label));
            }
            text.push_str(&format!(" {}", **default));
            text
        }
        Instruction::SelectT { types } => {
            let mut text = String::from("select");
            for ty in types {
                text.push_str(&format!(" (result {})", ty.name()));
            }
            text
        }
        Instruction::Block {
            opcode, block_type, ..
        } => format!("{}{}", opcode.mnemonic(), format_block_type(*block_type)),
        Instruction::If { block_type, .. } => format!("if{}", format_block_type(*block_type)),
        Instruction::Memory { opcode, memarg, .. } => {
            format!("{}{}", opcode.mnemonic(), format_memarg(*memarg))
        }
        Instruction::AtomicMemory { opcode, memarg, .. } => {
            format!("{}{}", opcode.mnemonic(), format_memarg(*memarg))
        }
        Instruction::RefNull(ty) => format!("ref.null {}", format_ref_type(ty)),
        Instruction::RefCast { opcode, ty } => {
            format!("{} {}", opcode.mnemonic(), format_ref_type(ty))
        }
        Instruction::TypeIndexed { opcode, ty } => format!("{} {}", opcode.mnemonic(), **ty),
        Instruction::FieldIndexed { opcode, ty, field } => {
            format!("{} {} {}", opcode.mnemonic(), **ty, **field)
        }
        Instruction::ArrayNewFixed { ty, len } => format!("array.new_fixed {} {len}", **ty),
        Instruction::BrOnCast {
            opcode,
            label,
            from,
            to,
        } => format!(
            "{} {} {} {}",
            opcode.mnemonic(),
            **label,
            format_ref_type(from),
            format_ref_type(to)
        ),
    }
}

// Renders an instruction at the given indent level; block-structured
// instructions render their bodies on subsequent lines with a trailing
// `end`.
fn write_instruction(out: &mut String, instr: &Instruction, level: usize) {
    indent_line(out, level, &instruction_head(instr));
    match instr {
        Instruction::Block { body, .. } => {
            for inner in body {
                write_instruction(out, inner, level + 1);
            }
            indent_line(out, level, "end");
        }
        Instruction::If {
            then_body,
            else_body,
            ..
        } => {
            for inner in then_body {
                write_instruction(out, inner, level + 1);
            }
            if let Some(else_body) = else_body {
                indent_line(out, level, "else");
                for inner in else_body {
                    write_instruction(out, inner, level + 1);
                }
            }
            indent_line(out, level, "end");
        }
        _ => {}
    }
}

// The inline (single-line) rendering of a short expression, used for
// offset expressions.
fn format_expr_inline(instructions: &[Instruction]) -> String {
    let heads: Vec<String> = instructions.iter().map(instruction_head).collect();
    heads.join(" ")
}

fn write_import(out: &mut String, import: &Import) {
    let descriptor = match &import.descriptor {
        ImportDescriptor::Func(index) => format!("(func (type {}))", **index),
        ImportDescriptor::Table(ty) => format!("(table {})", format_table_type(ty)),
        ImportDescriptor::Memory(ty) => format!("(memory {})", format_mem_type(ty)),
        ImportDescriptor::Global(ty) => format!("(global {})", format_global_type(ty)),
    };
    indent_line(
        out,
        1,
        &format!("(import \"{}\" \"{}\" {descriptor})", import.module, import.field),
    );
}

fn write_export(out: &mut String, export: &Export) {
    let descriptor = match export.descriptor {
        ExportDescriptor::Func(index) => format!("(func {})", *index),
        ExportDescriptor::Table(index) => format!("(table {})", *index),
        ExportDescriptor::Memory(index) => format!("(memory {})", *index),
        ExportDescriptor::Global(index) => format!("(global {})", *index),
    };
    indent_line(out, 1, &format!("(export \"{}\" {descriptor})", export.name));
}

fn write_global(out: &mut String, global: &Global) {
    indent_line(
        out,
        1,
        &format!("(global {}", format_global_type(&global.ty)),
    );
    for instr in &global.init {
        write_instruction(out, instr, 2);
    }
    indent_line(out, 1, ")");
}

fn write_element(out: &mut String, segment: &ElementSegment) {
    let mut line = String::from("(elem");
    match &segment.mode {
        ElementMode::Active { offset } => {
            line.push_str(&format!(" (offset {})", format_expr_inline(offset)));
        }
        ElementMode::Declarative => line.push_str(" declare"),
        ElementMode::Passive => {}
    }
    line.push_str(&format!(" {}", format_ref_type(&segment.ty)));
    for init in &segment.init {
        line.push_str(&format!(" (item {})", format_expr_inline(init)));
    }
    line.push(')');
    indent_line(out, 1, &line);
}

fn write_func(out: &mut String, func: &Func) {
    let mut header = String::from("(func");
    for run in &func.locals {
        header.push_str(" (local");
        for _ in 0..run.count {
            header.push_str(&format!(" {}", run.ty.name()));
        }
        header.push(')');
    }
    indent_line(out, 1, &header);
    for instr in &func.body {
        write_instruction(out, instr, 2);
    }
    indent_line(out, 1, ")");
}

fn write_data(out: &mut String, segment: &DataSegment) {
    let mut line = String::from("(data");
    if let DataMode::Active { offset } = &segment.mode {
        line.push_str(&format!(" (offset {})", format_expr_inline(offset)));
    }
    line.push_str(" \"");
    for byte in &segment.init {
        line.push_str(&format!("\\{byte:02x}"));
    }
    line.push_str("\")");
    indent_line(out, 1, &line);
}

fn write_custom(out: &mut String, custom: &CustomSection) {
    indent_line(
        out,
        1,
        &format!(
            ";; custom section \"{}\" ({} bytes)",
            custom.name,
            custom.data.len()
        ),
    );
}

fn write_section(out: &mut String, section: &Section) {
    match section {
        Section::Custom(custom) => write_custom(out, custom),
        Section::Type(types) => {
            if types.types.is_empty() {
                return;
            }
            indent_line(out, 1, "(type");
            for ty in &types.types {
                indent_line(out, 2, &format_composite_type(ty));
            }
            indent_line(out, 1, ")");
        }
        Section::Import(imports) => {
            for import in &imports.imports {
                write_import(out, import);
            }
        }
        Section::Function(functions) => {
            for index in &functions.type_indices {
                indent_line(out, 1, &format!("(func (type {}))", **index));
            }
        }
        Section::Table(tables) => {
            for table in &tables.tables {
                indent_line(out, 1, &format!("(table {})", format_table_type(table)));
            }
        }
        Section::Memory(memories) => {
            for memory in &memories.memories {
                indent_line(out, 1, &format!("(memory {})", format_mem_type(memory)));
            }
        }
        Section::Global(globals) => {
            for global in &globals.globals {
                write_global(out, global);
            }
        }
        Section::Export(exports) => {
            for export in &exports.exports {
                write_export(out, export);
            }
        }
        Section::Start(start) => indent_line(out, 1, &format!("(start {})", *start.func)),
        Section::Element(elements) => {
            for segment in &elements.elements {
                write_element(out, segment);
            }
        }
        Section::Code(code) => {
            for func in &code.funcs {
                write_func(out, func);
            }
        }
        Section::Data(data) => {
            for segment in &data.segments {
                write_data(out, segment);
            }
        }
        Section::DataCount(count) => {
            indent_line(out, 1, &format!(";; data count {}", count.count));
        }
    }
}
