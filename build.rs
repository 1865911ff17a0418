fn main() {
    // Gather build information, mostly used to print version info.
    built::write_built_file().expect("Failed to acquire build-time information");
}
