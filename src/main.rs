fn main() {
    let exit_code = flowtag::app::run_from_args();
    std::process::exit(exit_code);
}
