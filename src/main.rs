fn main() {
    std::process::exit(matchview::cli::run_cli());
}
