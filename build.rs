fn main() {
    // Exposes version, git hash and build time to `acctctl version`
    built::write_built_file().expect("Failed to acquire build-time information");
}
