#[macro_use]
mod common;

#[cfg(test)]
mod assignment {
    tests! {
        chained in assignment is OK
        "value"
        "value"
    }

    tests! {
        global in assignment is OK
        "after"
    }

    tests! {
        local in assignment is OK
        "after"
    }

    tests! {
        is_expression in assignment is OK
        "2"
        "2"
    }

    tests! {
        grouping_target in assignment is ERR
        "[line 2:5] Error at '=': Invalid assignment target"
    }

    tests! {
        undefined in assignment is ERR
        "[line 1:1] Error at 'a': Undefined variable 'a'"
    }
}
