fn main() {
    if let Err(err) = dmw_validator::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
