mod cli {
    use assert_cmd::Command;

    #[test]
    fn runs_a_file() {
        Command::cargo_bin("flint").unwrap()
            .arg("tests/target/cli/hello.flint")
            .assert()
            .stdout("hello from a file\n")
            .success();
    }

    #[test]
    fn too_many_arguments_prints_usage() {
        Command::cargo_bin("flint").unwrap()
            .args(["one.flint", "two.flint"])
            .assert()
            .stdout("Usage: flint [script]\n")
            .code(64);
    }

    #[test]
    fn unreadable_file_reports_and_exits_cleanly() {
        Command::cargo_bin("flint").unwrap()
            .arg("tests/target/cli/missing.flint")
            .assert()
            .stderr("can't open file 'tests/target/cli/missing.flint': No such file or directory (os error 2)\n")
            .success();
    }
}
