fn main() {
    if let Err(err) = mortality_pipeline::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
