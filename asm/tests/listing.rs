use asm::assembler::Assembler;
use asm::listing::write_listing;
use std::io::Cursor;

fn listing_of(src: &str) -> String {
    let asm = Assembler::assemble(Cursor::new(src), false).unwrap();
    let mut out = Vec::new();
    write_listing(&asm, &mut out).unwrap();
    String::from_utf8(out).unwrap()
}

#[test]
fn full_listing_output() {
    let listing = listing_of(
        "\
.text
start: mov ax, bp
jmp undef
.global start
.equ answer, 42
.end
",
    );

    let expected = "\
#.ret.text
#ofset\ttip\t\tvr[.text]:\t
0x0005\tR_386_16\t2
#.text (7)
18 20 2A 94 00 FF FF \n\
#tabela simbola
#ime\tsek\tvr.\tvid.\tr.b.
text\ttext\t0\tlocal\t0
start\ttext\t0\tglobal\t1
undef\tRELOC\t65535\tglobal\t2
#tabela konstanti
#ime\tvr.\tr.b.
answer\t42\t0\t
";
    assert_eq!(listing, expected);
}

#[test]
fn empty_sections_are_omitted() {
    let listing = listing_of(".text\n.data\n.byte 1\n");
    assert!(listing.contains("#.data (1)"));
    assert!(!listing.contains("#.text"));
}

#[test]
fn relocation_groups_follow_first_appearance() {
    let listing = listing_of(".text\njmp one\n.data\njmp two\n");
    let text_pos = listing.find("#.ret.text").unwrap();
    let data_pos = listing.find("#.ret.data").unwrap();
    assert!(text_pos < data_pos);
}

#[test]
fn tables_are_printed_even_when_empty() {
    let listing = listing_of(".text\nhalt\n");
    assert!(listing.contains("#tabela simbola"));
    assert!(listing.contains("#tabela konstanti"));
}
