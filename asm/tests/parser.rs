use arch::flag;
use asm::parser::Parsed;
use asm::source::SourceIterator;
use std::io::Cursor;

fn parse_line(src: &str) -> Vec<Parsed> {
    SourceIterator::new(Cursor::new(src))
        .next()
        .expect("line expected")
        .expect("line must parse")
        .data
}

#[test]
fn regdir_both_operands() {
    let data = parse_line("mov ax, bp");
    assert_eq!(data.len(), 1);
    let stmt = &data[0];
    assert_eq!(stmt.values, ["mov", "ax", "bp"]);
    assert_eq!(
        stmt.flags,
        flag::SUCCESS | flag::INSTRUCTION | flag::regdir(1) | flag::regdir(2)
    );
}

#[test]
fn regind_with_symbolic_displacement() {
    let stmt = &parse_line("mov [r7][test]")[0];
    assert_eq!(stmt.values, ["mov", "7", "test"]);
    assert_eq!(
        flag::mode_mask(stmt.flags, 1),
        flag::regind16(1) | flag::symabs(1)
    );
}

#[test]
fn regdir_with_literal_displacement() {
    let stmt = &parse_line("mov r3[44], ax")[0];
    assert_eq!(stmt.values, ["mov", "3", "44", "ax"]);
    assert_eq!(flag::mode_mask(stmt.flags, 1), flag::regind16(1));
    assert_eq!(flag::mode_mask(stmt.flags, 2), flag::regdir(2));
}

#[test]
fn pc_relative_symbol() {
    let stmt = &parse_line("jne $printf")[0];
    assert_eq!(stmt.values, ["jne", "printf"]);
    assert_eq!(
        flag::mode_mask(stmt.flags, 1),
        flag::immed(1) | flag::symrel(1)
    );
}

#[test]
fn address_of_symbol() {
    let stmt = &parse_line("mov ax, &handler")[0];
    assert_eq!(
        flag::mode_mask(stmt.flags, 2),
        flag::immed(2) | flag::symadr(2)
    );
}

#[test]
fn extended_suffix_sets_flag_without_a_token() {
    let stmt = &parse_line("movw ax, 3560")[0];
    assert!(stmt.flags & flag::EXTENDED != 0);
    assert_eq!(stmt.values, ["mov", "ax", "3560"]);
    assert_eq!(flag::mode_mask(stmt.flags, 1), flag::regdir(1));
    assert_eq!(flag::mode_mask(stmt.flags, 2), flag::immed(2));
}

#[test]
fn memory_direct_operand() {
    let stmt = &parse_line("push *1233")[0];
    assert_eq!(stmt.values, ["push", "1233"]);
    assert_eq!(flag::mode_mask(stmt.flags, 1), flag::mem(1));
}

#[test]
fn half_register_mark_is_captured() {
    let stmt = &parse_line("mov axh, 5")[0];
    assert!(stmt.flags & flag::reduced(1) != 0);
    assert_eq!(stmt.values, ["mov", "ax", "h", "5"]);
}

#[test]
fn plain_register_indirect() {
    let stmt = &parse_line("pop [bp]")[0];
    assert_eq!(flag::mode_mask(stmt.flags, 1), flag::regind(1));
    assert_eq!(stmt.values, ["pop", "bp"]);
}

#[test]
fn char_immediate() {
    let stmt = &parse_line("mov ax, 'A'")[0];
    assert_eq!(flag::mode_mask(stmt.flags, 2), flag::immed(2));
    assert_eq!(stmt.values[2], "A");
}

#[test]
fn mnemonic_case_is_irrelevant() {
    let upper = &parse_line("MOV AX, BP")[0];
    let lower = &parse_line("mov ax, bp")[0];
    assert_eq!(upper.flags, lower.flags);
}

#[test]
fn reparsing_reassembled_tokens_reproduces_flags() {
    let first = &parse_line("mov   ax ,  bp")[0];
    let canonical = format!(
        "{} {}, {}",
        first.values[0], first.values[1], first.values[2]
    );
    let second = &parse_line(&canonical)[0];
    assert_eq!(first.flags, second.flags);
}

#[test]
fn end_directive() {
    let stmt = &parse_line(".end")[0];
    assert!(stmt.flags & flag::END != 0);
}
