fn main() {
    if let Err(err) = city_poster::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
