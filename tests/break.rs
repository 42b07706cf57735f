#[macro_use]
mod common;

#[cfg(test)]
mod _break {
    tests! {
        inside_while in break is OK
        "0"
        "1"
        "2"
    }

    tests! {
        inside_for in break is OK
        "0"
        "1"
        "2"
    }

    tests! {
        nested in break is OK
        "inside"
        "inside"
        "outside"
    }

    // A break keeps unwinding through calls until a loop consumes it.
    tests! {
        through_call in break is OK
        "once"
        "after"
    }

    tests! {
        at_top_level in break is ERR
        "[line 1:1] Error at 'break': Can't break from top-level code"
    }

    tests! {
        outside_loop in break is ERR
        "[line 1:3] Error at 'break': Can't break outside of a loop"
    }
}
