// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Instruction, expression and function-body encoding.

use alloc::vec::Vec;

use crate::error::Error;
use crate::module::{Func, Locals};
use crate::types::{
    AnyOpcode, AtomicOpcode, BlockType, GcOpcode, Instruction, Literal, MemArg, Opcode,
};

use super::impls::encode_heap_type;
use super::leb128::{write_signed, write_unsigned};
use super::{Encode, encode_vector, write_count};

// Opcode-space prefix bytes.
const BULK_PREFIX: u8 = 0xfc;
const ATOMIC_PREFIX: u8 = 0xfe;
const GC_PREFIX: u8 = 0xfb;

// Structured control delimiters.
const ELSE_BYTE: u8 = 0x05;
const END_BYTE: u8 = 0x0b;

// Block type byte for the empty result.
const EMPTY_BLOCK_TYPE: u8 = 0x40;

// Appends a base-space opcode. The two bulk-memory members carry the 0xfc
// prefix in their high byte and serialize as prefix plus LEB sub-opcode;
// everything else is the single low byte.
fn emit_base_opcode(opcode: Opcode, out: &mut Vec<u8>) {
    let value = u16::from(opcode);
    match opcode {
        Opcode::MemoryCopy | Opcode::MemoryFill => {
            out.push(BULK_PREFIX);
            write_unsigned(out, u64::from(value & 0xff));
        }
        _ => out.push(value as u8),
    }
}

fn emit_atomic_opcode(opcode: AtomicOpcode, out: &mut Vec<u8>) {
    out.push(ATOMIC_PREFIX);
    write_unsigned(out, u64::from(u16::from(opcode) & 0xff));
}

fn emit_gc_opcode(opcode: GcOpcode, out: &mut Vec<u8>) {
    out.push(GC_PREFIX);
    write_unsigned(out, u64::from(u16::from(opcode) & 0xff));
}

fn encode_block_type(block_type: BlockType, out: &mut Vec<u8>) {
    match block_type {
        BlockType::Empty => out.push(EMPTY_BLOCK_TYPE),
        BlockType::Result(ty) => out.push(u8::from(ty)),
        // The signed encoding disambiguates small type indices from value
        // type tags.
        BlockType::TypeIndex(index) => write_signed(out, i64::from(*index)),
    }
}

fn encode_memarg(memarg: MemArg, out: &mut Vec<u8>) {
    write_unsigned(out, u64::from(memarg.align));
    write_unsigned(out, u64::from(memarg.offset));
}

pub(crate) fn encode_instruction(instr: &Instruction, out: &mut Vec<u8>) -> Result<(), Error> {
    match instr {
        Instruction::Plain(opcode) => match *opcode {
            AnyOpcode::Base(op) => {
                emit_base_opcode(op, out);
                match op {
                    // Destination and source memory indices; only memory 0
                    // exists.
                    Opcode::MemoryCopy => out.extend_from_slice(&[0x00, 0x00]),
                    Opcode::MemoryFill => out.push(0x00),
                    // memory.size and memory.grow carry a reserved memory
                    // index.
                    Opcode::MemorySize | Opcode::MemoryGrow => out.push(0x00),
                    _ => {}
                }
            }
            AnyOpcode::Atomic(op) => {
                emit_atomic_opcode(op, out);
                // atomic.fence carries a reserved zero byte.
                if op == AtomicOpcode::AtomicFence {
                    out.push(0x00);
                }
            }
            AnyOpcode::Gc(op) => emit_gc_opcode(op, out),
        },
        Instruction::Const(literal) => {
            emit_base_opcode(literal.opcode(), out);
            match *literal {
                Literal::I32(value) => write_signed(out, i64::from(value)),
                Literal::I64(value) => write_signed(out, value),
                Literal::F32(value) => out.extend_from_slice(&value.to_le_bytes()),
                Literal::F64(value) => out.extend_from_slice(&value.to_le_bytes()),
            }
        }
        Instruction::Local { opcode, index } => {
            emit_base_opcode(*opcode, out);
            index.encode(out)?;
        }
        Instruction::Global { opcode, index } => {
            emit_base_opcode(*opcode, out);
            index.encode(out)?;
        }
        Instruction::Func { opcode, index } => {
            emit_base_opcode(*opcode, out);
            index.encode(out)?;
        }
        Instruction::CallIndirect { opcode, ty, table } => {
            emit_base_opcode(*opcode, out);
            ty.encode(out)?;
            table.encode(out)?;
        }
        Instruction::Br { opcode, label } => {
            emit_base_opcode(*opcode, out);
            label.encode(out)?;
        }
        Instruction::BrTable { labels, default } => {
            emit_base_opcode(Opcode::BrTable, out);
            encode_vector(labels, out)?;
            default.encode(out)?;
        }
        Instruction::SelectT { types } => {
            emit_base_opcode(Opcode::SelectT, out);
            encode_vector(types, out)?;
        }
        Instruction::Block {
            opcode,
            block_type,
            body,
        } => {
            emit_base_opcode(*opcode, out);
            encode_block_type(*block_type, out);
            for instr in body {
                encode_instruction(instr, out)?;
            }
            out.push(END_BYTE);
        }
        Instruction::If {
            block_type,
            then_body,
            else_body,
        } => {
            emit_base_opcode(Opcode::If, out);
            encode_block_type(*block_type, out);
            for instr in then_body {
                encode_instruction(instr, out)?;
            }
            if let Some(else_body) = else_body {
                out.push(ELSE_BYTE);
                for instr in else_body {
                    encode_instruction(instr, out)?;
                }
            }
            out.push(END_BYTE);
        }
        Instruction::Memory { opcode, memarg, .. } => {
            emit_base_opcode(*opcode, out);
            encode_memarg(*memarg, out);
        }
        Instruction::AtomicMemory { opcode, memarg, .. } => {
            emit_atomic_opcode(*opcode, out);
            encode_memarg(*memarg, out);
        }
        Instruction::RefNull(ty) => {
            emit_base_opcode(Opcode::RefNull, out);
            // ref.null's immediate is the heap type alone; nullability is
            // implied.
            encode_heap_type(ty.heap, out)?;
        }
        Instruction::RefCast { opcode, ty } => {
            emit_gc_opcode(*opcode, out);
            ty.encode(out)?;
        }
        Instruction::TypeIndexed { opcode, ty } => {
            emit_gc_opcode(*opcode, out);
            ty.encode(out)?;
        }
        Instruction::FieldIndexed { opcode, ty, field } => {
            emit_gc_opcode(*opcode, out);
            ty.encode(out)?;
            field.encode(out)?;
        }
        Instruction::ArrayNewFixed { ty, len } => {
            emit_gc_opcode(GcOpcode::ArrayNewFixed, out);
            ty.encode(out)?;
            write_unsigned(out, u64::from(*len));
        }
        Instruction::BrOnCast {
            opcode,
            label,
            from,
            to,
        } => {
            emit_gc_opcode(*opcode, out);
            // Cast flags: bit 0 is the source nullability, bit 1 the
            // target nullability.
            let flags = u8::from(from.nullable) | (u8::from(to.nullable) << 1);
            out.push(flags);
            label.encode(out)?;
            encode_heap_type(from.heap, out)?;
            encode_heap_type(to.heap, out)?;
        }
    }
    Ok(())
}

/// Appends an expression: each instruction in sequence, then the 0x0b
/// terminator.
pub(crate) fn encode_expr(instructions: &[Instruction], out: &mut Vec<u8>) -> Result<(), Error> {
    for instr in instructions {
        encode_instruction(instr, out)?;
    }
    out.push(END_BYTE);
    Ok(())
}

// Merges adjacent local runs of the same type into single runs.
fn merge_locals(locals: &[Locals]) -> Vec<Locals> {
    let mut merged: Vec<Locals> = Vec::new();
    for &run in locals {
        if let Some(last) = merged.last_mut()
            && last.ty == run.ty
        {
            last.count += run.count;
        } else {
            merged.push(run);
        }
    }
    merged
}

impl Encode for Func {
    // A length-prefixed function body: the locals vector, the instruction
    // sequence, and the terminator, preceded by their total byte count.
    fn encode(&self, out: &mut Vec<u8>) -> Result<(), Error> {
        let mut body = Vec::new();

        let locals = merge_locals(&self.locals);
        write_count(&mut body, locals.len(), "locals run count")?;
        for run in &locals {
            write_unsigned(&mut body, u64::from(run.count));
            run.ty.encode(&mut body)?;
        }

        encode_expr(&self.body, &mut body)?;

        write_count(out, body.len(), "function body size")?;
        out.extend_from_slice(&body);
        Ok(())
    }
}
