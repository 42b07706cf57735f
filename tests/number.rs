#[macro_use]
mod common;

#[cfg(test)]
mod number {
    tests! {
        integer_format in number is OK
        "4"
        "4"
        "4"
        "0"
    }

    tests! {
        decimal in number is OK
        "2.5"
        "0.75"
    }

    tests! {
        negative in number is OK
        "-4"
        "4"
        "4"
    }

    tests! {
        division_by_zero in number is OK
        "inf"
        "-inf"
    }

    tests! {
        trailing_dot in number is ERR
        "[line 1:9] Error at ';': Expect property name after '.'"
    }
}
