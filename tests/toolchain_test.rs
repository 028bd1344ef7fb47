// End-to-end test against the real system toolchain
//
// Ignored by default: it requires a working `gcc` on PATH.  Run with
// `cargo test -- --ignored` on a machine that has one.

use crepl::compile;
use crepl::opts::{build_cc_argv, Config};
use crepl::program::Program;
use crepl::vars::VarTable;

#[test]
#[ignore]
fn test_compile_and_run_a_tracked_declaration() {
    let mut program = Program::new().expect("init");
    let mut table = VarTable::new();

    program.submit("int x = 5;").expect("submit");
    table.find_and_register("int x = 5;");
    let block = table.print_block().to_string();
    program.rebuild(Some(&block)).expect("rebuild");

    let cfg = Config::default();
    let argv = build_cc_argv(&cfg);
    let code = compile::compile_and_run(program.compile.total.as_str(), &argv)
        .expect("toolchain run");
    assert_eq!(code, 0, "the generated program should exit cleanly");

    let _ = std::fs::remove_file(compile::binary_path());
}
