#[macro_use]
mod common;

#[cfg(test)]
mod string {
    tests! {
        concat in string is OK
        "foobar"
    }

    tests! {
        multiline in string is OK
        "line1"
        "line2"
        "after"
    }

    tests! {
        empty_is_falsy in string is OK
        "falsy"
        "fallback"
    }

    tests! {
        equality in string is OK
        "true"
    }

    tests! {
        unterminated in string is ERR
        "[line 1:7] Error: Unterminated string"
    }
}
