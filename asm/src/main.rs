use asm::assembler::Assembler;
use asm::{listing, msg};
use color_print::cprintln;
use std::fs::File;
use std::io::BufReader;

const HELP_TEMPLATE: &str = "\
{before-help}{bin} {version}
  {author}
  {about}

{usage-heading}
{tab}{usage}

{all-args}{after-help}";

#[derive(Debug, clap::Parser)]
#[clap(author, version, about, help_template = HELP_TEMPLATE)]
struct Args {
    /// Input assembly source
    input: String,

    /// Output listing file
    #[clap(short, long, default_value = "a.o")]
    output: String,

    /// Print per-line pass progress
    #[clap(short, long)]
    verbose: bool,
}

fn main() {
    use clap::Parser;

    let args = Args::parse();

    let file = match File::open(&args.input) {
        Ok(file) => file,
        Err(err) => {
            cprintln!("<red,bold>error</>: cannot open `{}`: {}", args.input, err);
            std::process::exit(1);
        }
    };

    let asm = match Assembler::assemble(BufReader::new(file), args.verbose) {
        Ok(asm) => asm,
        Err(err) => {
            msg::diag(&args.input, &err);
            std::process::exit(1);
        }
    };

    let mut out = match File::create(&args.output) {
        Ok(out) => out,
        Err(err) => {
            cprintln!("<red,bold>error</>: cannot create `{}`: {}", args.output, err);
            std::process::exit(1);
        }
    };
    if let Err(err) = listing::write_listing(&asm, &mut out) {
        cprintln!("<red,bold>error</>: cannot write `{}`: {}", args.output, err);
        std::process::exit(1);
    }

    if args.verbose {
        println!("  > {}", args.output);
    }
}
