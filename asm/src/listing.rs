//! Textual object listing: relocation tables, section dumps, the
//! symbol table and the constant table, in that order.

use crate::assembler::Assembler;
use crate::tables::Relocation;
use indexmap::IndexMap;
use std::io::{self, Write};

pub fn write_listing<W: Write>(asm: &Assembler, out: &mut W) -> io::Result<()> {
    write_relocations(&asm.relocations, out)?;
    write_sections(asm, out)?;
    write_symbols(asm, out)?;
    write_constants(asm, out)
}

/// One block per section holding relocations, groups in
/// first-appearance order, entries in append order.
fn write_relocations<W: Write>(relocations: &[Relocation], out: &mut W) -> io::Result<()> {
    let mut groups: IndexMap<&str, Vec<&Relocation>> = IndexMap::new();
    for reloc in relocations {
        groups.entry(reloc.section.as_str()).or_default().push(reloc);
    }

    for (section, group) in &groups {
        writeln!(out, "#.ret.{section}")?;
        writeln!(out, "#ofset\ttip\t\tvr[.{section}]:\t")?;
        for reloc in group {
            writeln!(out, "0x{:04X}\t{}\t{}", reloc.offset, reloc.kind, reloc.symbol)?;
        }
    }
    Ok(())
}

fn write_sections<W: Write>(asm: &Assembler, out: &mut W) -> io::Result<()> {
    for (name, section) in &asm.sections {
        if section.counter == 0 {
            continue;
        }
        writeln!(out, "#.{} ({})", name, section.counter)?;
        let memdump = section.memdump();
        let mut chars = memdump.chars();
        while let (Some(hi), Some(lo)) = (chars.next(), chars.next()) {
            write!(out, "{hi}{lo} ")?;
        }
        writeln!(out)?;
    }
    Ok(())
}

fn write_symbols<W: Write>(asm: &Assembler, out: &mut W) -> io::Result<()> {
    writeln!(out, "#tabela simbola")?;
    writeln!(out, "#ime\tsek\tvr.\tvid.\tr.b.")?;
    for (index, name, symbol) in asm.symbols.iter() {
        writeln!(
            out,
            "{}\t{}\t{}\t{}\t{}",
            name,
            symbol.section_name(),
            symbol.offset(),
            if symbol.is_local { "local" } else { "global" },
            index
        )?;
    }
    Ok(())
}

fn write_constants<W: Write>(asm: &Assembler, out: &mut W) -> io::Result<()> {
    writeln!(out, "#tabela konstanti")?;
    writeln!(out, "#ime\tvr.\tr.b.")?;
    for (index, name, value) in asm.constants.iter() {
        // The trailing tab matches the reference listings.
        writeln!(out, "{name}\t{value}\t{index}\t")?;
    }
    Ok(())
}
