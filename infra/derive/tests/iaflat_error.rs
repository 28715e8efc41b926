#[test]
fn iaflat_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/iaflat_error_pass.rs");
}
