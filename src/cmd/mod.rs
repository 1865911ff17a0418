pub(crate) mod check;
pub(crate) mod export_api_schema;
pub(crate) mod import;


/// Prints `e` and all its causes to stderr, indented by `indent` spaces.
pub(crate) fn print_error(e: &anyhow::Error, indent: usize) {
    let pad = " ".repeat(indent);
    bunt::eprintln!("{}{$red+bold}error:{/$} {[yellow+intense]}", pad, e);
    for cause in e.chain().skip(1) {
        bunt::eprintln!("{}  {$red+italic}caused by:{/$} {}", pad, cause);
    }
}
