#[test]
fn keeper_error_ui() {
    let t = trybuild::TestCases::new();
    t.pass("tests/ui/keeper_error_pass.rs");
    t.compile_fail("tests/ui/keeper_error_no_context.rs");
    t.compile_fail("tests/ui/keeper_error_tuple_variant.rs");
}
