// Copyright (c) 2025 Joshua Seaton
//
// Use of this source code is governed by a MIT-style
// license that can be found in the LICENSE file or at
// https://opensource.org/licenses/MIT

//! Binary encoding tests over hand-derived byte images.

use wasmith::types::{
    AtomicOpcode, BlockType, FuncType, GcOpcode, HeapType, Instruction, Limits, MemType, Opcode,
    RefType, TableType, TypeIdx, ValType,
};
use wasmith::{
    CodeSection, CustomSection, DataCountSection, DataMode, DataSection, DataSegment,
    ElementMode, ElementSegment, ElementSection, Error, Export, ExportDescriptor, ExportSection,
    Func, FunctionSection, Import, ImportDescriptor, ImportSection, Module, Section, StartSection,
    TableSection, TypeSection, encode_binary, encode_f32, encode_f64, encode_sleb128,
    encode_string, encode_uleb128,
};

const PREAMBLE: [u8; 8] = [0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00];

// Builds a module whose single function has the given signature and body
// and is exported under `name`.
fn single_function_module(ty: FuncType, name: &str, body: Vec<Instruction>) -> Module {
    let mut module = Module::new();
    module.add_section(Section::Type(TypeSection {
        types: vec![ty.into()],
    }));
    module.add_section(Section::Function(FunctionSection {
        type_indices: vec![TypeIdx::new(0)],
    }));
    module.add_section(Section::Export(ExportSection {
        exports: vec![Export {
            name: name.into(),
            descriptor: ExportDescriptor::Func(0u32.into()),
        }],
    }));
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(body)],
    }));
    module
}

#[test]
fn empty_module_is_the_eight_byte_preamble() {
    assert_eq!(encode_binary(&Module::new()).unwrap(), PREAMBLE);
}

#[test]
fn version_field_is_little_endian() {
    let module = Module::with_version(0x0102_0304);
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
}

#[test]
fn identity_module_byte_image() {
    let module = single_function_module(
        FuncType::new(vec![ValType::I32], vec![ValType::I32]),
        "identity",
        vec![
            Instruction::local_get(0),
            Instruction::plain(Opcode::Return),
        ],
    );
    let bytes = encode_binary(&module).unwrap();

    #[rustfmt::skip]
    let expected = [
        0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00,
        // Type section: (i32) -> (i32).
        0x01, 0x06, 0x01, 0x60, 0x01, 0x7f, 0x01, 0x7f,
        // Function section: one function of type 0.
        0x03, 0x02, 0x01, 0x00,
        // Export section: "identity" -> func 0.
        0x07, 0x0c, 0x01, 0x08, b'i', b'd', b'e', b'n', b't', b'i', b't', b'y', 0x00, 0x00,
        // Code section: local.get 0; return.
        0x0a, 0x07, 0x01, 0x05, 0x00, 0x20, 0x00, 0x0f, 0x0b,
    ];
    assert_eq!(bytes, expected);
    assert!(bytes.len() > 20 && bytes.len() < 100);
}

#[test]
fn add_module_byte_image() {
    let module = single_function_module(
        FuncType::new(vec![ValType::I32, ValType::I32], vec![ValType::I32]),
        "add",
        vec![
            Instruction::local_get(0),
            Instruction::local_get(1),
            Instruction::plain(Opcode::I32Add),
            Instruction::plain(Opcode::Return),
        ],
    );
    let bytes = encode_binary(&module).unwrap();

    #[rustfmt::skip]
    let expected = [
        0x00, 0x61, 0x73, 0x6d, 0x01, 0x00, 0x00, 0x00,
        0x01, 0x07, 0x01, 0x60, 0x02, 0x7f, 0x7f, 0x01, 0x7f,
        0x03, 0x02, 0x01, 0x00,
        0x07, 0x07, 0x01, 0x03, b'a', b'd', b'd', 0x00, 0x00,
        0x0a, 0x0a, 0x01, 0x08, 0x00, 0x20, 0x00, 0x20, 0x01, 0x6a, 0x0f, 0x0b,
    ];
    assert_eq!(bytes, expected);
}

#[test]
fn function_body_length_prefix_counts_locals_and_terminator() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::with_locals(
            &[ValType::I32, ValType::I32, ValType::I64],
            vec![Instruction::i32_const(7)],
        )],
    }));
    let bytes = encode_binary(&module).unwrap();

    // Locals coalesce to (2 x i32, 1 x i64); the length prefix covers the
    // locals vector, the body, and the 0x0b terminator.
    #[rustfmt::skip]
    let expected_section = [
        0x0a, 0x0a, 0x01,
        0x08, // body size
        0x02, 0x02, 0x7f, 0x01, 0x7e, // locals
        0x41, 0x07, // i32.const 7
        0x0b,
    ];
    assert_eq!(&bytes[8..], expected_section);
}

#[test]
fn adjacent_equal_local_runs_are_merged() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func {
            locals: vec![
                wasmith::Locals {
                    count: 1,
                    ty: ValType::I32,
                },
                wasmith::Locals {
                    count: 2,
                    ty: ValType::I32,
                },
            ],
            body: vec![],
        }],
    }));
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(
        &bytes[8..],
        [0x0a, 0x06, 0x01, 0x04, 0x01, 0x03, 0x7f, 0x0b]
    );
}

#[test]
fn counter_module_encodes_global_and_exports() {
    let mut module = Module::new();
    module.add_section(Section::Type(TypeSection {
        types: vec![
            FuncType::new(vec![], vec![ValType::I32]).into(),
            FuncType::new(vec![], vec![]).into(),
            FuncType::new(vec![ValType::I32], vec![]).into(),
        ],
    }));
    module.add_section(Section::Function(FunctionSection {
        type_indices: vec![
            TypeIdx::new(0),
            TypeIdx::new(1),
            TypeIdx::new(2),
            TypeIdx::new(1),
        ],
    }));

    let index = module
        .add_global("var", "i32", vec![Instruction::i32_const(0)], None)
        .unwrap();
    assert_eq!(*index, 0);

    module.add_section(Section::Export(ExportSection {
        exports: vec![
            Export {
                name: "get_counter".into(),
                descriptor: ExportDescriptor::Func(0u32.into()),
            },
            Export {
                name: "increment".into(),
                descriptor: ExportDescriptor::Func(1u32.into()),
            },
            Export {
                name: "add_to_counter".into(),
                descriptor: ExportDescriptor::Func(2u32.into()),
            },
            Export {
                name: "reset".into(),
                descriptor: ExportDescriptor::Func(3u32.into()),
            },
            Export {
                name: "counter".into(),
                descriptor: ExportDescriptor::Global(index),
            },
        ],
    }));
    module.add_section(Section::Code(CodeSection {
        funcs: vec![
            Func::new(vec![Instruction::global_get(0)]),
            Func::new(vec![
                Instruction::global_get(0),
                Instruction::i32_const(1),
                Instruction::plain(Opcode::I32Add),
                Instruction::global_set(0),
            ]),
            Func::new(vec![
                Instruction::global_get(0),
                Instruction::local_get(0),
                Instruction::plain(Opcode::I32Add),
                Instruction::global_set(0),
            ]),
            Func::new(vec![
                Instruction::i32_const(0),
                Instruction::global_set(0),
            ]),
        ],
    }));

    let bytes = encode_binary(&module).unwrap();
    // The global section precedes the export section and carries
    // (mut i32) = i32.const 0.
    let global_section = [0x06, 0x06, 0x01, 0x7f, 0x01, 0x41, 0x00, 0x0b];
    assert!(
        bytes
            .windows(global_section.len())
            .any(|window| window == global_section)
    );
    let ids: Vec<u8> = module.sections.iter().map(|s| u8::from(s.id())).collect();
    assert_eq!(ids, [1, 3, 6, 7, 10]);
}

#[test]
fn factorial_body_encodes_if_else_and_recursion() {
    let module = single_function_module(
        FuncType::new(vec![ValType::I32], vec![ValType::I32]),
        "factorial",
        vec![
            Instruction::local_get(0),
            Instruction::i32_const(2),
            Instruction::plain(Opcode::I32LtS),
            Instruction::If {
                block_type: BlockType::Result(ValType::I32),
                then_body: vec![Instruction::i32_const(1)],
                else_body: Some(vec![
                    Instruction::local_get(0),
                    Instruction::local_get(0),
                    Instruction::i32_const(1),
                    Instruction::plain(Opcode::I32Sub),
                    Instruction::call(0),
                    Instruction::plain(Opcode::I32Mul),
                ]),
            },
        ],
    );
    let bytes = encode_binary(&module).unwrap();

    #[rustfmt::skip]
    let expected_code = [
        0x0a, 0x19, 0x01,
        0x17, // body size
        0x00, // no locals
        0x20, 0x00, 0x41, 0x02, 0x48, // local.get 0; i32.const 2; i32.lt_s
        0x04, 0x7f, // if (result i32)
        0x41, 0x01, // i32.const 1
        0x05, // else
        0x20, 0x00, 0x20, 0x00, 0x41, 0x01, 0x6b, // n, n, 1, i32.sub
        0x10, 0x00, // call 0
        0x6c, // i32.mul
        0x0b, // end if
        0x0b, // end body
    ];
    let code_start = bytes.len() - expected_code.len();
    assert_eq!(&bytes[code_start..], expected_code);
}

#[test]
fn shared_memory_import_byte_image() {
    let mut module = Module::new();
    module.add_section(Section::Import(ImportSection {
        imports: vec![Import {
            module: "env".into(),
            field: "memory".into(),
            descriptor: ImportDescriptor::Memory(MemType::new(Limits::shared(1, 1))),
        }],
    }));
    let bytes = encode_binary(&module).unwrap();

    #[rustfmt::skip]
    let expected = [
        0x02, 0x10, 0x01,
        0x03, b'e', b'n', b'v',
        0x06, b'm', b'e', b'm', b'o', b'r', b'y',
        0x02, // memory import
        0x03, 0x01, 0x01, // shared limits 1..1
    ];
    assert_eq!(&bytes[8..], expected);
}

#[test]
fn atomic_operations_emit_the_fe_prefix() {
    let increment = Func::new(vec![
        Instruction::local_get(0),
        Instruction::i32_const(1),
        Instruction::atomic(AtomicOpcode::I32AtomicRmwAdd, 2, 0),
    ]);
    let compare_exchange = Func::new(vec![
        Instruction::local_get(0),
        Instruction::local_get(1),
        Instruction::local_get(2),
        Instruction::atomic(AtomicOpcode::I32AtomicRmwCmpxchg, 2, 0),
    ]);
    let load = Func::new(vec![
        Instruction::local_get(0),
        Instruction::atomic(AtomicOpcode::I32AtomicLoad, 2, 0),
    ]);

    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![increment, compare_exchange, load],
    }));
    let bytes = encode_binary(&module).unwrap();

    for window in [
        // i32.atomic.rmw.add align=2 offset=0
        &[0xfe, 0x1e, 0x02, 0x00][..],
        // i32.atomic.rmw.cmpxchg align=2 offset=0
        &[0xfe, 0x48, 0x02, 0x00][..],
        // i32.atomic.load align=2 offset=0
        &[0xfe, 0x10, 0x02, 0x00][..],
    ] {
        assert!(bytes.windows(window.len()).any(|w| w == window));
    }
}

#[test]
fn atomic_fence_carries_a_reserved_byte() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![Instruction::plain(
            AtomicOpcode::AtomicFence,
        )])],
    }));
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(
        &bytes[8..],
        [0x0a, 0x07, 0x01, 0x05, 0x00, 0xfe, 0x03, 0x00, 0x0b]
    );
}

#[test]
fn fixed_memory_store_byte_image() {
    let mut module = Module::new();
    module.add_section(Section::Import(ImportSection {
        imports: vec![Import {
            module: "env".into(),
            field: "memory".into(),
            descriptor: ImportDescriptor::Memory(MemType::new(Limits::new(1, Some(1)))),
        }],
    }));
    module.add_section(Section::Type(TypeSection {
        types: vec![FuncType::new(vec![ValType::I32, ValType::I32], vec![]).into()],
    }));
    module.add_section(Section::Function(FunctionSection {
        type_indices: vec![TypeIdx::new(0)],
    }));
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![
            Instruction::local_get(0),
            Instruction::local_get(1),
            Instruction::memory(Opcode::I32Store, 2, 0),
        ])],
    }));
    let bytes = encode_binary(&module).unwrap();

    // Fixed one-page limits...
    assert!(bytes.windows(4).any(|w| w == [0x02, 0x01, 0x01, 0x01]));
    // ... and i32.store align=2 offset=0.
    assert!(bytes.windows(3).any(|w| w == [0x36, 0x02, 0x00]));
}

#[test]
fn bulk_memory_opcodes_emit_the_fc_prefix() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![
            Instruction::plain(Opcode::MemoryCopy),
            Instruction::plain(Opcode::MemoryFill),
        ])],
    }));
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(
        &bytes[8..],
        [
            0x0a, 0x0b, 0x01, 0x09, 0x00, //
            0xfc, 0x0a, 0x00, 0x00, // memory.copy dst=0 src=0
            0xfc, 0x0b, 0x00, // memory.fill mem=0
            0x0b,
        ]
    );
}

#[test]
fn memory_size_and_grow_carry_the_reserved_index() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![
            Instruction::plain(Opcode::MemorySize),
            Instruction::plain(Opcode::MemoryGrow),
        ])],
    }));
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(
        &bytes[8..],
        [0x0a, 0x08, 0x01, 0x06, 0x00, 0x3f, 0x00, 0x40, 0x00, 0x0b]
    );
}

#[test]
fn gc_instructions_emit_the_fb_prefix() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![
            Instruction::TypeIndexed {
                opcode: GcOpcode::StructNew,
                ty: TypeIdx::new(2),
            },
            Instruction::FieldIndexed {
                opcode: GcOpcode::StructGet,
                ty: TypeIdx::new(2),
                field: 1u32.into(),
            },
            Instruction::ArrayNewFixed {
                ty: TypeIdx::new(3),
                len: 4,
            },
            Instruction::plain(GcOpcode::ArrayLen),
        ])],
    }));
    let bytes = encode_binary(&module).unwrap();

    #[rustfmt::skip]
    let expected_body = [
        0x00, // no locals
        0xfb, 0x00, 0x02, // struct.new 2
        0xfb, 0x02, 0x02, 0x01, // struct.get 2 1
        0xfb, 0x08, 0x03, 0x04, // array.new_fixed 3 4
        0xfb, 0x0f, // array.len
        0x0b,
    ];
    let start = bytes.len() - expected_body.len();
    assert_eq!(&bytes[start..], expected_body);
}

#[test]
fn reference_types_follow_the_encoding_table() {
    // Nullable abstract reference: the shorthand tag byte.
    let mut module = Module::new();
    module.add_section(Section::Table(TableSection {
        tables: vec![
            TableType {
                element: RefType::FUNCREF,
                limits: Limits::new(0, None),
            },
            TableType {
                element: RefType::concrete(true, 3u32),
                limits: Limits::new(0, None),
            },
            TableType {
                element: RefType {
                    nullable: false,
                    heap: HeapType::Concrete(TypeIdx::new(5)),
                },
                limits: Limits::new(0, None),
            },
        ],
    }));
    let bytes = encode_binary(&module).unwrap();
    #[rustfmt::skip]
    let expected = [
        0x04, 0x0c, 0x03,
        0x70, 0x00, 0x00, // funcref
        0x63, 0x03, 0x00, 0x00, // (ref null 3)
        0x64, 0x05, 0x00, 0x00, // (ref 5)
    ];
    assert_eq!(&bytes[8..], expected);
}

#[test]
fn ref_null_takes_a_heap_type_immediate() {
    let mut module = Module::new();
    module
        .add_global(
            "const",
            "funcref",
            vec![Instruction::RefNull(RefType::FUNCREF)],
            None,
        )
        .unwrap();
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(
        &bytes[8..],
        [0x06, 0x06, 0x01, 0x70, 0x00, 0xd0, 0x70, 0x0b]
    );
}

#[test]
fn br_on_cast_packs_nullability_into_cast_flags() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![Instruction::BrOnCast {
            opcode: GcOpcode::BrOnCast,
            label: 0u32.into(),
            from: RefType::abstract_ref(ValType::StructRef),
            to: RefType {
                nullable: false,
                heap: HeapType::Concrete(TypeIdx::new(1)),
            },
        }])],
    }));
    let bytes = encode_binary(&module).unwrap();
    // Flags: source nullable (bit 0) only.
    assert_eq!(
        &bytes[8..],
        [0x0a, 0x0a, 0x01, 0x08, 0x00, 0xfb, 0x16, 0x01, 0x00, 0x6b, 0x01, 0x0b]
    );
}

#[test]
fn element_and_data_sections_round_out_the_module_tail() {
    let mut module = Module::new();
    module.add_section(Section::Element(ElementSection {
        elements: vec![ElementSegment {
            ty: RefType::FUNCREF,
            init: vec![vec![Instruction::ref_func(0)]],
            mode: ElementMode::Active {
                offset: vec![Instruction::i32_const(0)],
            },
        }],
    }));
    module.add_section(Section::DataCount(DataCountSection { count: 1 }));
    module.add_section(Section::Data(DataSection {
        segments: vec![DataSegment {
            init: vec![0x01, 0x02],
            mode: DataMode::Active {
                offset: vec![Instruction::i32_const(8)],
            },
        }],
    }));
    let bytes = encode_binary(&module).unwrap();

    #[rustfmt::skip]
    let expected = [
        // Element section: active, offset i32.const 0, one ref.func expr.
        0x09, 0x09, 0x01, 0x00, 0x41, 0x00, 0x0b, 0x01, 0xd2, 0x00, 0x0b,
        // Data count section.
        0x0c, 0x01, 0x01,
        // Data section: active, offset i32.const 8, two bytes.
        0x0b, 0x08, 0x01, 0x00, 0x41, 0x08, 0x0b, 0x02, 0x01, 0x02,
    ];
    assert_eq!(&bytes[8..], expected);
}

#[test]
fn custom_and_start_sections_frame_correctly() {
    let mut module = Module::new();
    module.add_section(Section::Custom(CustomSection {
        name: "meta".into(),
        data: vec![0x01, 0x02, 0x03],
    }));
    module.add_section(Section::Start(StartSection { func: 0u32.into() }));
    let bytes = encode_binary(&module).unwrap();
    assert_eq!(
        &bytes[8..],
        [
            0x00, 0x08, 0x04, b'm', b'e', b't', b'a', 0x01, 0x02, 0x03, //
            0x08, 0x01, 0x00,
        ]
    );
}

#[test]
fn shared_limits_without_a_maximum_are_refused() {
    let mut module = Module::new();
    module.add_section(Section::Import(ImportSection {
        imports: vec![Import {
            module: "env".into(),
            field: "memory".into(),
            descriptor: ImportDescriptor::Memory(MemType::new(Limits {
                min: 1,
                max: None,
                shared: true,
            })),
        }],
    }));
    assert_eq!(
        encode_binary(&module),
        Err(Error::InvalidStructure {
            what: "shared limits without a maximum"
        })
    );
}

#[test]
fn numeric_heap_types_are_refused() {
    let mut module = Module::new();
    module
        .add_global(
            "const",
            "funcref",
            vec![Instruction::RefNull(RefType::abstract_ref(ValType::I32))],
            None,
        )
        .unwrap();
    assert_eq!(
        encode_binary(&module),
        Err(Error::InvalidStructure {
            what: "numeric type in heap-type position"
        })
    );
}

#[test]
fn named_primitives_match_their_specification() {
    assert_eq!(encode_uleb128(0), [0x00]);
    assert_eq!(encode_uleb128(624_485), [0xe5, 0x8e, 0x26]);
    assert_eq!(encode_sleb128(0), [0x00]);
    assert_eq!(encode_sleb128(-1), [0x7f]);
    assert_eq!(encode_sleb128(-123_456), [0xc0, 0xbb, 0x78]);
    assert_eq!(encode_f32(1.5), [0x00, 0x00, 0xc0, 0x3f]);
    assert_eq!(
        encode_f64(1.5),
        [0x00, 0x00, 0x00, 0x00, 0x00, 0x00, 0xf8, 0x3f]
    );
    assert_eq!(encode_string("hi").unwrap(), [0x02, b'h', b'i']);
}

#[test]
fn block_and_loop_bodies_nest() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![Instruction::Block {
            opcode: Opcode::Block,
            block_type: BlockType::Empty,
            body: vec![Instruction::Block {
                opcode: Opcode::Loop,
                block_type: BlockType::Empty,
                body: vec![Instruction::br(1)],
            }],
        }])],
    }));
    let bytes = encode_binary(&module).unwrap();
    #[rustfmt::skip]
    let expected_body = [
        0x00, // no locals
        0x02, 0x40, // block (empty)
        0x03, 0x40, // loop (empty)
        0x0c, 0x01, // br 1
        0x0b, // end loop
        0x0b, // end block
        0x0b, // end body
    ];
    let start = bytes.len() - expected_body.len();
    assert_eq!(&bytes[start..], expected_body);
}

#[test]
fn block_type_indices_use_the_signed_encoding() {
    let mut module = Module::new();
    module.add_section(Section::Code(CodeSection {
        funcs: vec![Func::new(vec![Instruction::Block {
            opcode: Opcode::Block,
            block_type: BlockType::TypeIndex(TypeIdx::new(0)),
            body: vec![],
        }])],
    }));
    let bytes = encode_binary(&module).unwrap();
    // Type index 0 encodes as SLEB 0x00, not the 0x40 empty marker.
    assert!(bytes.windows(3).any(|w| w == [0x02, 0x00, 0x0b]));
}
