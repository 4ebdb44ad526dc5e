use lc3asm::assemble_program;

#[test]
fn test_multiply_by_six() {
    let program_text = include_str!("../programs/multiply-by-six.asm");
    let assembled = assemble_program(program_text).unwrap();

    insta::assert_yaml_snapshot!(assembled);
}

#[test]
fn test_all_ops() {
    let program_text = include_str!("../programs/all-ops.asm");
    let assembled = assemble_program(program_text).unwrap();

    insta::assert_yaml_snapshot!(assembled);
}
