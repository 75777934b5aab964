fn main() -> std::process::ExitCode {
    redflag_lib::run()
}
