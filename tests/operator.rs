#[macro_use]
mod common;

#[cfg(test)]
mod operator {
    tests! {
        add in operator is OK
        "3"
        "string"
        "n = 4"
        "pi = 3.5"
    }

    tests! {
        arithmetic in operator is OK
        "5"
        "12"
        "4.5"
        "-1"
    }

    tests! {
        comparison in operator is OK
        "true"
        "false"
        "true"
        "true"
        "false"
        "true"
    }

    tests! {
        equality in operator is OK
        "true"
        "false"
        "true"
        "false"
        "false"
        "false"
        "true"
    }

    tests! {
        add_boolean in operator is ERR
        "[line 1:6] Error at '+': Binary operation '+' is not supported between boolean type and nil type"
    }

    tests! {
        subtract_string in operator is ERR
        "[line 1:5] Error at '-': Binary operation '-' is not supported between string type and number type"
    }

    tests! {
        multiply_nil in operator is ERR
        "[line 1:5] Error at '*': Binary operation '*' is not supported between nil type and number type"
    }

    tests! {
        compare_mixed in operator is ERR
        "[line 1:3] Error at '<': Binary operation '<' is not supported between number type and string type"
    }

    tests! {
        unary_minus_string in operator is ERR
        "[line 1:1] Error at '-': Unary operation '-' is not supported for string type"
    }

    tests! {
        add_native in operator is ERR
        "[line 1:5] Error at '+': Binary operation '+' is not supported between native function type and number type"
    }

    // Concatenation only accepts a number on the right-hand side.
    tests! {
        number_plus_string in operator is ERR
        "[line 1:3] Error at '+': Binary operation '+' is not supported between number type and string type"
    }
}
