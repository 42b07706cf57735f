#[macro_export]
macro_rules! tests {
    ($file:ident in $scope:ident is OK $($expected:expr)*) => {
        #[test]
        fn $file() {
            use flint_lang::flint;

            let mut expected = vec![$($expected),*];

            // if exists, concat expected lines with new lines
            let expected = match expected.len() {
                0 => "".to_string(),
                _ => {
                    // add empty string to end to add new line to end of output
                    expected.push("");
                    expected.join("\n")
                }
            };

            let mut output = Vec::new();
            let mut flint = flint::new(&mut output);

            flint.run_file(format!("tests/target/{}/{}.flint", stringify!($scope), stringify!($file)));

            // drop flint here to release the borrow on the output buffer
            drop(flint);
            assert_eq!(expected, std::str::from_utf8(&output).unwrap());
        }
    };

    ($file:ident in $scope:ident is ERR $($expected:expr)+) => {
        #[test]
        fn $file() {
            use assert_cmd::Command;
            // output concats expected with new line
            let output = vec![$($expected),+].join("\n");
            let file = format!("tests/target/{}/{}.flint", stringify!($scope), stringify!($file));

            // Reported errors do not change the exit status; only the usage
            // error and the exit builtin do.
            Command::cargo_bin("flint").unwrap()
                .arg(file)
                .assert()
                .stderr(format!("{output}\n"))
                .success();
        }
    };
}
