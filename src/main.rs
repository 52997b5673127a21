// Alchemist command-line shell
fn main() {
    if let Err(e) = alchemist_lib::run() {
        log::error!("{}", e.message());
        eprintln!("error: {}", e.message());
        std::process::exit(1);
    }
}
