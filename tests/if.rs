#[macro_use]
mod common;

#[cfg(test)]
mod _if {
    tests! {
        then in if is OK
        "then"
    }

    tests! {
        else_branch in if is OK
        "else"
    }

    tests! {
        truthiness in if is OK
        "zero is truthy"
        "empty string is falsy"
        "nil is falsy"
    }

    tests! {
        dangling_else in if is OK
        "binds to nearest"
    }

    tests! {
        block_branches in if is OK
        "smaller"
    }
}
