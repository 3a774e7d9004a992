use crate::error::LineError;
use color_print::cprintln;

/// Print error with diagnostic information showing the source location
/// and line content
pub fn diag(file: &str, err: &LineError) {
    cprintln!("<red,bold>error</>: {}", err.error);
    cprintln!("     <blue>--></> <underline>{}:{}</>", file, err.line_num);
    cprintln!("      <blue>|</>");
    cprintln!(" <blue>{:>4} |</> {}", err.line_num, err.line);
    cprintln!("      <blue>|</>");
}
