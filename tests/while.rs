#[macro_use]
mod common;

#[cfg(test)]
mod _while {
    tests! {
        basic in while is OK
        "0"
        "1"
        "2"
    }

    tests! {
        falsy_condition in while is OK
        "done"
    }

    tests! {
        nested in while is OK
        "00"
        "01"
        "10"
        "11"
    }
}
