//! The two-pass engine. Pass 1 walks the parsed lines computing
//! section counters, interning labels/sections/constants and
//! narrowing register-indirect displacements; pass 2 re-walks the
//! stored records and emits bytes, resolving or deferring symbol
//! references.

use crate::error::{AsmError, LineError};
use crate::parser::Parsed;
use crate::section::Section;
use crate::source::{Context, SourceIterator};
use crate::tables::{ConstantTable, RelocKind, Relocation, Symbol, SymbolTable};
use crate::util::{bitsize, sctoi};
use arch::flag::{self, DWORD_SZ, INSTR_SZ, OP_NUM, WORD_SZ};
use arch::op;
use arch::reg::Reg;
use indexmap::IndexMap;
use std::io::BufRead;

#[derive(Debug, Default)]
pub struct Assembler {
    pub symbols: SymbolTable,
    pub constants: ConstantTable,
    pub sections: IndexMap<String, Section>,
    pub relocations: Vec<Relocation>,
    lines: Vec<Context>,
}

impl Assembler {
    /// Runs both passes over `source`. The parsed records are kept
    /// between the passes so pass 2 sees the narrowed addressing
    /// modes.
    pub fn assemble<R: BufRead>(source: R, verbose: bool) -> Result<Self, LineError> {
        let mut asm = Assembler::default();

        if verbose {
            println!("1. First Pass");
        }
        for item in SourceIterator::new(source) {
            let mut ctx = item?;
            let end = ctx.data.iter().any(|datum| datum.flags & flag::END != 0);
            asm.first_line(&mut ctx)
                .map_err(|err| err.at(ctx.line_num, &ctx.line))?;
            if verbose {
                let counter = asm.counter_of(&ctx.section);
                println!("  {}:\t{}\t{}", ctx.section, ctx.line.trim(), counter);
            }
            asm.lines.push(ctx);
            if end {
                break;
            }
        }

        for (_, section) in asm.sections.iter_mut() {
            section.counter = 0;
        }

        if verbose {
            println!("2. Second Pass");
        }
        let lines = std::mem::take(&mut asm.lines);
        for ctx in &lines {
            asm.second_line(ctx)
                .map_err(|err| err.at(ctx.line_num, &ctx.line))?;
        }
        asm.lines = lines;

        Ok(asm)
    }

    fn section_mut(&mut self, name: &str) -> &mut Section {
        self.sections.entry(name.to_string()).or_default()
    }

    fn counter_of(&self, name: &str) -> u32 {
        self.sections.get(name).map_or(0, |section| section.counter)
    }

    fn declare(&mut self, name: &str, symbol: Symbol) -> Result<(), AsmError> {
        if self.symbols.contains(name) || self.constants.contains(name) {
            return Err(AsmError::SymbolRedeclaration(name.to_string()));
        }
        self.symbols.insert(name, symbol);
        Ok(())
    }

    // ------------------------------------------------------------------
    // Pass 1

    fn first_line(&mut self, ctx: &mut Context) -> Result<(), AsmError> {
        let current = ctx.section.clone();
        for datum in ctx.data.iter_mut() {
            let flags = datum.flags;
            if flags & flag::SECTION != 0 {
                let name = datum.values[0].clone();
                self.section_mut(&name);
                let offset = self.counter_of(&current);
                self.declare(&name, Symbol::defined(&name, offset))?;
            } else if flags & flag::LABEL != 0 {
                let name = datum.values[0].clone();
                let offset = self.counter_of(&current);
                self.section_mut(&current);
                self.declare(&name, Symbol::defined(&current, offset))?;
            } else if flags & flag::INSTRUCTION != 0 {
                let bytes = self.size_instruction(datum)?;
                self.section_mut(&current).counter += bytes as u32;
            } else if flags & flag::ALLOC != 0 {
                let width = if datum.values[0] == "byte" {
                    WORD_SZ
                } else {
                    DWORD_SZ
                };
                let count = datum.values.len() - 1;
                self.section_mut(&current).counter += (count * width) as u32;
            } else if flags & flag::ALIGN != 0 {
                let num = sctoi(&datum.values[0])?;
                if !(num as u64).is_power_of_two() {
                    return Err(AsmError::BadAlignment(num));
                }
                let section = self.section_mut(&current);
                section.counter += section.counter % num as u32;
            } else if flags & flag::SKIP != 0 {
                let count = sctoi(&datum.values[0])?;
                self.section_mut(&current).counter += (count as usize * WORD_SZ) as u32;
            } else if flags & flag::EQU != 0 {
                let name = datum.values[0].clone();
                let value = sctoi(&datum.values[1])?;
                if self.constants.contains(&name) || self.symbols.contains(&name) {
                    return Err(AsmError::SymbolRedeclaration(name));
                }
                self.constants.insert(&name, value);
            }
            // RELOC / WORD / END leave the counter alone.
        }
        Ok(())
    }

    /// Byte size of one instruction, narrowing 16-bit register
    /// displacements to 8-bit where the value fits.
    fn size_instruction(&self, datum: &mut Parsed) -> Result<usize, AsmError> {
        let (_, desc) = op::lookup(&datum.values[0])
            .ok_or_else(|| AsmError::UnknownInstruction(datum.values[0].clone()))?;
        let extended = datum.flags & flag::EXTENDED != 0;
        if extended && !desc.is_extensible() {
            return Err(AsmError::FixedSizeViolation(datum.values[0].clone()));
        }
        let op_sz = desc.op_sz(extended);

        let mut bytes = INSTR_SZ;
        let mut cursor = 1usize;
        for i in 1..=OP_NUM {
            if datum.flags & flag::enable(i) == 0 {
                break;
            }
            bytes += 1; // operand descriptor
            let red = datum.flags & flag::reduced(i) != 0;
            if extended && red {
                return Err(AsmError::Syntax(
                    "extended operand size cannot address a half register".to_string(),
                ));
            }
            let mode = flag::mode_mask(datum.flags, i);
            if mode == flag::immed(i) || mode == (flag::immed(i) | flag::symabs(i)) {
                bytes += op_sz;
                cursor += 1;
            } else if mode == (flag::immed(i) | flag::symrel(i))
                || mode == (flag::immed(i) | flag::symadr(i))
            {
                bytes += DWORD_SZ;
                cursor += 1;
            } else if mode == flag::regdir(i) || mode == flag::regind(i) {
                cursor += 1 + red as usize;
            } else if mode == flag::regind16(i) {
                let disp = cursor + 1 + red as usize;
                let value = sctoi(&datum.values[disp])?;
                if bitsize(value as u64) <= (WORD_SZ * 8) as u32 {
                    datum.flags = flag::set_mode(datum.flags, i, flag::regind8(i));
                    bytes += WORD_SZ;
                } else {
                    bytes += DWORD_SZ;
                }
                cursor = disp + 1;
            } else if mode == (flag::regind16(i) | flag::symabs(i)) {
                let disp = cursor + 1 + red as usize;
                match self.constants.get(&datum.values[disp]) {
                    Some(value) if bitsize(value as u64) <= (WORD_SZ * 8) as u32 => {
                        datum.flags = flag::set_mode(datum.flags, i, flag::regind8(i));
                        bytes += WORD_SZ;
                    }
                    _ => bytes += DWORD_SZ,
                }
                cursor = disp + 1;
            } else if mode == flag::mem(i) {
                bytes += DWORD_SZ;
                cursor += 1;
            } else {
                return Err(AsmError::Internal("unhandled addressing mode in pass 1"));
            }
        }
        Ok(bytes)
    }

    // ------------------------------------------------------------------
    // Pass 2

    fn second_line(&mut self, ctx: &Context) -> Result<(), AsmError> {
        let current = ctx.section.as_str();
        for datum in &ctx.data {
            let flags = datum.flags;
            if flags & flag::ALLOC != 0 {
                let width = if datum.values[0] == "byte" {
                    WORD_SZ
                } else {
                    DWORD_SZ
                };
                let mut stream = self.section_mut(current).stream(width)?;
                for value in &datum.values[1..] {
                    stream.emit(sctoi(value)?)?;
                }
            } else if flags & flag::RELOC != 0 {
                for name in &datum.values[1..] {
                    self.symbols.set_global(name);
                }
            } else if flags & flag::SKIP != 0 {
                let count = sctoi(&datum.values[0])?;
                let fill = match datum.values.get(1) {
                    Some(value) => sctoi(value)?,
                    None => 0,
                };
                let section = self.section_mut(current);
                for _ in 0..count {
                    section.bytes(fill)?;
                }
            } else if flags & flag::ALIGN != 0 {
                let num = sctoi(&datum.values[0])? as u32;
                let fill = match datum.values.get(1) {
                    Some(value) => sctoi(value)?,
                    None => 0,
                };
                let section = self.section_mut(current);
                let pad = section.counter % num;
                for _ in 0..pad {
                    section.bytes(fill)?;
                }
            } else if flags & flag::INSTRUCTION != 0 {
                self.emit_instruction(current, datum)?;
            }
            // SECTION / LABEL / EQU / WORD / END emit nothing.
        }
        Ok(())
    }

    fn emit_instruction(&mut self, current: &str, datum: &Parsed) -> Result<(), AsmError> {
        let (opcode, desc) = op::lookup(&datum.values[0])
            .ok_or_else(|| AsmError::UnknownInstruction(datum.values[0].clone()))?;
        let extended = datum.flags & flag::EXTENDED != 0;
        let op_sz = desc.op_sz(extended);

        let mut instr_desc = (opcode as i64) << 3;
        if op_sz == DWORD_SZ {
            instr_desc |= 0x4;
        }
        self.section_mut(current).bytes(instr_desc)?;

        let mut cursor = 1usize;
        for i in 1..=OP_NUM {
            if datum.flags & flag::enable(i) == 0 {
                break;
            }
            let mut op_desc = flag::addr_mask(datum.flags, i) as i64;
            let red = datum.flags & flag::reduced(i) != 0;
            let mode = flag::clear_sym(flag::mode_mask(datum.flags, i), i);
            let reg_mode = mode == flag::regdir(i)
                || mode == flag::regind(i)
                || mode == flag::regind8(i)
                || mode == flag::regind16(i);

            let sym_kind = if datum.flags & flag::symabs(i) != 0 {
                Some(RelocKind::Abs16)
            } else if datum.flags & (flag::symrel(i) | flag::symadr(i)) != 0 {
                Some(RelocKind::Pc16)
            } else {
                None
            };

            let eff_sz = if mode == flag::regind8(i) {
                WORD_SZ
            } else if mode == flag::regind16(i) {
                DWORD_SZ
            } else if datum.flags & (flag::symrel(i) | flag::symadr(i)) != 0 {
                // Pass 1 charged a full dword for these, whatever the
                // instruction's own operand size says.
                DWORD_SZ
            } else {
                op_sz
            };

            // The payload token follows the register (and its half
            // mark) for register modes; otherwise it is the current
            // token.
            let payload = if reg_mode {
                cursor + 1 + red as usize
            } else {
                cursor
            };

            let resolved = match sym_kind {
                Some(kind) => Some(self.resolve_symbol(current, &datum.values[payload], kind, eff_sz)?),
                None => None,
            };

            if reg_mode {
                let token = &datum.values[cursor];
                let reg =
                    Reg::parse(token).map_err(|_| AsmError::BadRegister(token.clone()))?;
                op_desc |= (reg.index() as i64) << 1;
                if red && datum.values[cursor + 1].eq_ignore_ascii_case("h") {
                    op_desc |= 0x1;
                }
            }

            self.section_mut(current).bytes(op_desc)?;

            if mode == flag::immed(i) {
                let value = match resolved {
                    Some(value) => value,
                    None => sctoi(&datum.values[payload])?,
                };
                if bitsize(value as u64) > (8 * eff_sz) as u32 {
                    return Err(AsmError::Syntax(format!(
                        "immediate `{value}` does not fit in {eff_sz} byte operand"
                    )));
                }
                self.section_mut(current).write(value, eff_sz)?;
                cursor = payload + 1;
            } else if mode == flag::regdir(i) || mode == flag::regind(i) {
                cursor += 1 + red as usize;
            } else if mode == flag::regind8(i) {
                let value = match resolved {
                    Some(value) => value,
                    None => sctoi(&datum.values[payload])?,
                };
                self.section_mut(current).words(value)?;
                cursor = payload + 1;
            } else if mode == flag::regind16(i) {
                let value = match resolved {
                    Some(value) => value,
                    None => sctoi(&datum.values[payload])?,
                };
                self.section_mut(current).dwords(value)?;
                cursor = payload + 1;
            } else if mode == flag::mem(i) {
                self.section_mut(current).dwords(sctoi(&datum.values[payload])?)?;
                cursor = payload + 1;
            } else {
                return Err(AsmError::Internal("unhandled addressing mode in pass 2"));
            }
        }
        Ok(())
    }

    /// Turns a symbol token into a concrete value, appending a
    /// relocation when it cannot be known yet. The all-ones sentinel
    /// stands in for deferred payloads.
    fn resolve_symbol(
        &mut self,
        current: &str,
        name: &str,
        kind: RelocKind,
        size: usize,
    ) -> Result<i64, AsmError> {
        if let Some(value) = self.constants.get(name) {
            if kind == RelocKind::Pc16 {
                return Err(AsmError::Syntax(
                    "cannot use relative relocation on absolute data".to_string(),
                ));
            }
            return Ok(value);
        }

        if self.symbols.is_defined(name) {
            let (target, offset) = match self.symbols.get(name) {
                Some(symbol) => (symbol.section_name().to_string(), symbol.offset()),
                None => return Err(AsmError::Internal("defined symbol vanished")),
            };
            match kind {
                RelocKind::Abs16 => {
                    if let Some(value) = self.read_through(&target, offset, size) {
                        return Ok(value);
                    }
                    // Referenced bytes not written yet; defer to the
                    // relocation path below with the existing entry.
                }
                RelocKind::Pc16 => {
                    let counter = self.counter_of(current);
                    return Ok((offset as i64 - counter as i64) & 0xFFFF);
                }
            }
        } else if !self.symbols.contains(name) {
            self.symbols.insert(name, Symbol::undefined());
        }

        let symbol = self
            .symbols
            .index_of(name)
            .ok_or(AsmError::Internal("missing symbol index"))?;
        let offset = self.counter_of(current) + 1;
        self.relocations.push(Relocation {
            section: current.to_string(),
            offset,
            symbol,
            kind,
        });
        Ok((1 << (8 * size)) - 1)
    }

    /// Reads the already-emitted bytes a defined symbol points at,
    /// little-endian. `None` when the target range is not written yet.
    fn read_through(&self, section: &str, offset: u32, size: usize) -> Option<i64> {
        let data = self.sections.get(section)?.data();
        let start = offset as usize;
        if data.len() < start + size {
            return None;
        }
        let mut value = 0i64;
        for (k, byte) in data[start..start + size].iter().enumerate() {
            value |= (*byte as i64) << (8 * k);
        }
        Some(value)
    }

    pub fn lines(&self) -> &[Context] {
        &self.lines
    }
}
