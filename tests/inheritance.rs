#[macro_use]
mod common;

#[cfg(test)]
mod inheritance {
    tests! {
        inherit_method in inheritance is OK
        "A"
    }

    tests! {
        chain in inheritance is OK
        "A"
    }

    tests! {
        override_method in inheritance is OK
        "B"
    }

    tests! {
        inherited_init in inheritance is OK
        "4"
    }
}
