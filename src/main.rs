fn main() -> std::process::ExitCode {
    presence_lib::run()
}
