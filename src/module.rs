// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! The module aggregate and its sections.
//!
//! A [`Module`] is a version plus an ordered list of sections. Sections are
//! a sum type discriminated by [`SectionId`]; callers append sections (and
//! items within sections) imperatively, and the encoders traverse the
//! result without reordering or cross-checking index references — section
//! order and index validity are the caller's responsibility.

use alloc::string::String;
use alloc::vec::Vec;

use num_enum::IntoPrimitive;

use crate::error::Error;
use crate::types::{
    CompositeType, FuncIdx, GlobalIdx, GlobalType, Instruction, MemIdx, MemType, Mutability,
    RefType, TableIdx, TableType, TypeIdx, ValType,
};

/// Section identifier within a module.
///
/// Non-custom sections must appear in a module at most once and ordered by
/// ID (with `DataCount` preceding `Code`); the encoder trusts the caller
/// to arrange that.
#[derive(Clone, Copy, Debug, Eq, IntoPrimitive, PartialEq)]
#[repr(u8)]
pub enum SectionId {
    /// Custom section with arbitrary data.
    Custom = 0,
    /// Composite type declarations.
    Type = 1,
    /// Import declarations.
    Import = 2,
    /// Function type indices for module functions.
    Function = 3,
    /// Table declarations.
    Table = 4,
    /// Memory declarations.
    Memory = 5,
    /// Global declarations.
    Global = 6,
    /// Export declarations.
    Export = 7,
    /// Start function index.
    Start = 8,
    /// Element segments for table initialization.
    Element = 9,
    /// Function bodies.
    Code = 10,
    /// Data segments for memory initialization.
    Data = 11,
    /// Data segment count (for bulk memory operations).
    DataCount = 12,
}

/// Custom section with arbitrary binary data.
#[derive(Clone, Debug, PartialEq)]
pub struct CustomSection {
    /// Section name.
    pub name: String,
    /// Section content.
    pub data: Vec<u8>,
}

/// Section containing composite type declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TypeSection {
    pub types: Vec<CompositeType>,
}

/// Import descriptor types.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImportDescriptor {
    /// Import a function with the given type index.
    Func(TypeIdx),
    /// Import a table with the given type.
    Table(TableType),
    /// Import a memory with the given type.
    Memory(MemType),
    /// Import a global with the given type.
    Global(GlobalType),
}

/// An import declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Import {
    /// Name of the module to import from.
    pub module: String,
    /// Name of the imported entity.
    pub field: String,
    /// Type of the imported entity.
    pub descriptor: ImportDescriptor,
}

/// Section containing import declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ImportSection {
    pub imports: Vec<Import>,
}

/// Section containing type indices for module-defined functions. Each entry
/// must be matched by a body at the same position in the code section.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct FunctionSection {
    pub type_indices: Vec<TypeIdx>,
}

/// Section containing table type declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TableSection {
    pub tables: Vec<TableType>,
}

/// Section containing linear memory type declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemorySection {
    pub memories: Vec<MemType>,
}

/// A global declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Global {
    /// Global type and mutability.
    pub ty: GlobalType,
    /// Initializer expression. Must be a constant expression; the encoder
    /// does not check.
    pub init: Vec<Instruction>,
}

/// Section containing global variable declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct GlobalSection {
    pub globals: Vec<Global>,
}

/// Describes what kind of entity is being exported.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ExportDescriptor {
    /// Export the function with the given index.
    Func(FuncIdx),
    /// Export the table with the given index.
    Table(TableIdx),
    /// Export the memory with the given index.
    Memory(MemIdx),
    /// Export the global with the given index.
    Global(GlobalIdx),
}

/// An export declaration.
#[derive(Clone, Debug, PartialEq)]
pub struct Export {
    /// Name of the exported entity.
    pub name: String,
    /// Kind and index of the exported entity.
    pub descriptor: ExportDescriptor,
}

/// Section containing export declarations.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ExportSection {
    pub exports: Vec<Export>,
}

/// Holds the index of the start function.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct StartSection {
    pub func: FuncIdx,
}

/// How an element segment should be placed.
#[derive(Clone, Debug, PartialEq)]
pub enum ElementMode {
    /// Available for `table.init`, never placed automatically.
    Passive,
    /// Copied into table 0 at the given offset during instantiation.
    Active {
        /// Expression computing the offset within the table.
        offset: Vec<Instruction>,
    },
    /// Only forward-declares the referenced functions.
    Declarative,
}

/// A WebAssembly element segment.
#[derive(Clone, Debug, PartialEq)]
pub struct ElementSegment {
    /// The type of references this segment contains.
    pub ty: RefType,
    /// The initializer expressions for the segment.
    pub init: Vec<Vec<Instruction>>,
    /// How this segment should be placed.
    pub mode: ElementMode,
}

/// Section containing element segments for table initialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ElementSection {
    pub elements: Vec<ElementSegment>,
}

/// A run of local variables sharing one type, as the binary format counts
/// them.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Locals {
    /// Number of consecutive locals of this type.
    pub count: u32,
    /// The locals' value type.
    pub ty: ValType,
}

impl Locals {
    /// Coalesces a flat per-slot list of local types into runs.
    pub fn coalesce(types: &[ValType]) -> Vec<Locals> {
        let mut runs: Vec<Locals> = Vec::new();
        for &ty in types {
            if let Some(run) = runs.last_mut()
                && run.ty == ty
            {
                run.count += 1;
            } else {
                runs.push(Locals { count: 1, ty });
            }
        }
        runs
    }
}

/// A function body: local variable declarations plus instructions.
#[derive(Clone, Debug, PartialEq)]
pub struct Func {
    /// Local variable runs for this function.
    pub locals: Vec<Locals>,
    /// The function's instructions.
    pub body: Vec<Instruction>,
}

impl Func {
    /// A body with no locals.
    pub fn new(body: Vec<Instruction>) -> Self {
        Self {
            locals: Vec::new(),
            body,
        }
    }

    /// A body whose locals are given as a flat per-slot list.
    pub fn with_locals(types: &[ValType], body: Vec<Instruction>) -> Self {
        Self {
            locals: Locals::coalesce(types),
            body,
        }
    }
}

/// Section containing function bodies.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct CodeSection {
    pub funcs: Vec<Func>,
}

/// The placement mode for a data segment.
#[derive(Clone, Debug, PartialEq)]
pub enum DataMode {
    /// Must be explicitly copied via `memory.init`.
    Passive,
    /// Copied into memory 0 at the given offset during instantiation.
    Active {
        /// Expression computing the offset within the memory.
        offset: Vec<Instruction>,
    },
}

/// A data segment for initializing linear memory.
#[derive(Clone, Debug, PartialEq)]
pub struct DataSegment {
    /// The initial data bytes for this segment.
    pub init: Vec<u8>,
    /// How this segment should be placed.
    pub mode: DataMode,
}

/// Section containing data segments for memory initialization.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DataSection {
    pub segments: Vec<DataSegment>,
}

/// Declares the number of data segments ahead of the code section.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct DataCountSection {
    pub count: u32,
}

/// A top-level, ID-tagged module section.
#[derive(Clone, Debug, PartialEq)]
pub enum Section {
    Custom(CustomSection),
    Type(TypeSection),
    Import(ImportSection),
    Function(FunctionSection),
    Table(TableSection),
    Memory(MemorySection),
    Global(GlobalSection),
    Export(ExportSection),
    Start(StartSection),
    Element(ElementSection),
    Code(CodeSection),
    Data(DataSection),
    DataCount(DataCountSection),
}

impl Section {
    /// The section's identifier byte.
    pub const fn id(&self) -> SectionId {
        match self {
            Section::Custom(_) => SectionId::Custom,
            Section::Type(_) => SectionId::Type,
            Section::Import(_) => SectionId::Import,
            Section::Function(_) => SectionId::Function,
            Section::Table(_) => SectionId::Table,
            Section::Memory(_) => SectionId::Memory,
            Section::Global(_) => SectionId::Global,
            Section::Export(_) => SectionId::Export,
            Section::Start(_) => SectionId::Start,
            Section::Element(_) => SectionId::Element,
            Section::Code(_) => SectionId::Code,
            Section::Data(_) => SectionId::Data,
            Section::DataCount(_) => SectionId::DataCount,
        }
    }
}

// The value-type vocabulary accepted by Module::add_global.
const GLOBAL_VAL_TYPES: [(&str, ValType); 6] = [
    ("i32", ValType::I32),
    ("i64", ValType::I64),
    ("f32", ValType::F32),
    ("f64", ValType::F64),
    ("funcref", ValType::FuncRef),
    ("externref", ValType::ExternRef),
];

/// A WebAssembly module under construction: a version and an ordered list
/// of sections.
#[derive(Clone, Debug, PartialEq)]
pub struct Module {
    /// Binary-format version, encoded as a 4-byte little-endian integer.
    pub version: u32,
    /// Sections in the order they will be emitted.
    pub sections: Vec<Section>,
}

impl Default for Module {
    fn default() -> Self {
        Self::new()
    }
}

impl Module {
    /// An empty module at the current binary-format version.
    pub const fn new() -> Self {
        Self::with_version(1)
    }

    /// An empty module with an explicit version field.
    pub const fn with_version(version: u32) -> Self {
        Self {
            version,
            sections: Vec::new(),
        }
    }

    /// Appends a section. Sections are emitted in insertion order; the
    /// caller is responsible for the binary format's ordering rules.
    pub fn add_section(&mut self, section: Section) {
        self.sections.push(section);
    }

    /// Adds a global variable, creating the global section if absent, and
    /// optionally exports it under `export_as`.
    ///
    /// `mutability` is `"const"` or `"var"`; `val_type` is one of
    /// `i32 i64 f32 f64 funcref externref`. Returns the new global's index.
    pub fn add_global(
        &mut self,
        mutability: &str,
        val_type: &str,
        init: Vec<Instruction>,
        export_as: Option<&str>,
    ) -> Result<GlobalIdx, Error> {
        let mutability = match mutability {
            "const" => Mutability::Const,
            "var" => Mutability::Var,
            other => return Err(Error::invalid_argument("mutability", other)),
        };

        let val_type = GLOBAL_VAL_TYPES
            .iter()
            .find(|(name, _)| *name == val_type)
            .map(|&(_, ty)| ty)
            .ok_or_else(|| Error::invalid_argument("value type", val_type))?;

        let global = Global {
            ty: GlobalType {
                val_type,
                mutability,
            },
            init,
        };

        let globals = self.global_section();
        let index = GlobalIdx::new(globals.globals.len() as u32);
        globals.globals.push(global);

        if let Some(name) = export_as {
            self.export_section().exports.push(Export {
                name: String::from(name),
                descriptor: ExportDescriptor::Global(index),
            });
        }

        Ok(index)
    }

    // Finds the global section, appending an empty one if absent.
    fn global_section(&mut self) -> &mut GlobalSection {
        let position = self
            .sections
            .iter()
            .position(|section| matches!(section, Section::Global(_)));
        let position = position.unwrap_or_else(|| {
            self.sections.push(Section::Global(GlobalSection::default()));
            self.sections.len() - 1
        });
        let Section::Global(section) = &mut self.sections[position] else {
            unreachable!();
        };
        section
    }

    // Finds the export section, appending an empty one if absent.
    fn export_section(&mut self) -> &mut ExportSection {
        let position = self
            .sections
            .iter()
            .position(|section| matches!(section, Section::Export(_)));
        let position = position.unwrap_or_else(|| {
            self.sections.push(Section::Export(ExportSection::default()));
            self.sections.len() - 1
        });
        let Section::Export(section) = &mut self.sections[position] else {
            unreachable!();
        };
        section
    }
}
