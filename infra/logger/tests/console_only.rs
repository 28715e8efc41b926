use iaflat_logger::Logger;

#[test]
fn init_console_only_has_no_guard() {
    let logger = Logger::builder()
        .name("iaflat-console-only")
        .console(true)
        .verbosity(1)
        .init()
        .expect("logger should initialize");

    assert!(logger.guard().is_none(), "console-only logger should not create a file guard");
}
