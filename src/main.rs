fn main() {
    std::process::exit(sitepulse_lib::run())
}
