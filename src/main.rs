fn main() {
    if let Err(err) = csv_to_sql::run() {
        eprintln!("error: {err:#}");
        std::process::exit(1);
    }
}
